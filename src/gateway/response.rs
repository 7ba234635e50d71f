use serde::Serialize;
use serde_json::json;

use super::GatewayResponse;

/// Successful handler result, serialized as the response body
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<u16>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: None,
        }
    }

    pub fn into_gateway(self) -> GatewayResponse {
        let status = self.status_code.unwrap_or(200);

        match serde_json::to_value(&self.data) {
            Ok(value) => GatewayResponse::json(status, &value),
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                GatewayResponse::json(
                    500,
                    &json!({
                        "success": false,
                        "error": "Failed to serialize response data",
                        "code": "INTERNAL_SERVER_ERROR"
                    }),
                )
            }
        }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
