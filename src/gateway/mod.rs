//! Gateway event envelope: the request record handed to the router and the
//! `{statusCode, headers, body}` record it returns.

pub mod response;
pub mod router;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use crate::error::ApiError;

pub use response::{ApiResponse, ApiResult};
pub use router::RequestRouter;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    #[serde(default)]
    pub http_method: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,
}

impl GatewayRequest {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            http_method: method.to_string(),
            path: path.to_string(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_path_param(mut self, name: &str, value: &str) -> Self {
        self.path_parameters
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Header lookup, case-insensitive on the name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Non-empty path parameter
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_parameters
            .as_ref()?
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Body as a JSON object; a missing or blank body reads as `{}`
    pub fn json_body(&self) -> Result<Map<String, Value>, ApiError> {
        let raw = match self.body.as_deref().map(str::trim) {
            None | Some("") => return Ok(Map::new()),
            Some(raw) => raw,
        };
        match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            _ => Err(ApiError::invalid_json("Request body must be a JSON object")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl GatewayResponse {
    pub fn json(status_code: u16, body: &Value) -> Self {
        Self {
            status_code,
            headers: cors_headers(),
            body: body.to_string(),
        }
    }

    /// CORS preflight answer: 200 with an empty body
    pub fn preflight() -> Self {
        Self {
            status_code: 200,
            headers: cors_headers(),
            body: String::new(),
        }
    }

    pub fn from_error(err: &ApiError) -> Self {
        Self::json(err.status_code(), &err.to_json())
    }

    pub fn body_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Headers attached to every response
pub fn cors_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        (
            "Access-Control-Allow-Methods".to_string(),
            "GET, POST, OPTIONS, PUT, DELETE, PATCH".to_string(),
        ),
        (
            "Access-Control-Allow-Headers".to_string(),
            "Content-Type, Authorization".to_string(),
        ),
        ("Content-Type".to_string(), "application/json".to_string()),
    ])
}
