//! HTTP adapter: turns axum requests into gateway events for the router.

use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, DefaultBodyLimit, Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::gateway::{GatewayRequest, GatewayResponse, RequestRouter};

pub fn app(router: Arc<RequestRouter>, max_request_size_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tickets", any(tickets))
        .route("/tickets/:id", any(tickets))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_request_size_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(router)
}

async fn tickets(
    State(router): State<Arc<RequestRouter>>,
    method: Method,
    uri: Uri,
    path: Option<Path<HashMap<String, String>>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> GatewayResponse {
    let body = match read_body(body) {
        Ok(body) => body,
        Err(err) => {
            tracing::debug!(method = %method, path = %uri.path(), "Rejected request body: {}", err);
            return GatewayResponse::from_error(&err);
        }
    };

    let headers = headers
        .iter()
        .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
        .collect();

    let request = GatewayRequest {
        http_method: method.as_str().to_string(),
        path: uri.path().to_string(),
        headers: Some(headers),
        body: Some(body).filter(|b| !b.is_empty()),
        path_parameters: path.map(|Path(params)| params),
    };

    router.handle(request).await
}

/// Body as UTF-8 text; extractor failures keep the JSON error envelope
fn read_body(body: Result<Bytes, BytesRejection>) -> Result<String, ApiError> {
    let bytes = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large("Request body too large")
        } else {
            ApiError::bad_request(rejection.body_text())
        }
    })?;
    String::from_utf8(bytes.to_vec()).map_err(|_| ApiError::invalid_json("Request body must be UTF-8"))
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now()
        }
    }))
}

async fn not_found() -> GatewayResponse {
    GatewayResponse::from_error(&ApiError::not_found("Not Found"))
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!("Dropping invalid response header '{}'", name),
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use axum::body::to_bytes;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app_under_test() -> Router {
        app_with_limit(1024 * 1024)
    }

    fn app_with_limit(max_request_size_bytes: usize) -> Router {
        let harness = Harness::new();
        app(Arc::new(harness.router), max_request_size_bytes)
    }

    fn post_bytes(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/tickets")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app_under_test()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn preflight_has_cors_headers() {
        let response = app_under_test()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/tickets")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(
            response.headers()["access-control-allow-headers"],
            "Content-Type, Authorization"
        );
    }

    #[tokio::test]
    async fn path_id_reaches_router() {
        let response = app_under_test()
            .oneshot(Request::builder().uri("/tickets/does-not-exist").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn unknown_route_gets_envelope() {
        let response = app_under_test()
            .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(body_json(response).await["error"], "Not Found");
    }

    #[tokio::test]
    async fn oversized_body_keeps_envelope() {
        let body = json!({"title": "x".repeat(256)}).to_string().into_bytes();
        let response = app_with_limit(64).oneshot(post_bytes(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(response.headers()["content-type"], "application/json");
        let body = body_json(response).await;
        assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn non_utf8_body_is_invalid_json() {
        let response = app_under_test()
            .oneshot(post_bytes(vec![b'{', 0xff, 0xfe, b'}']))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(body_json(response).await["code"], "INVALID_JSON");
    }
}
