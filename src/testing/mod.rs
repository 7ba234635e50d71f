use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::UnverifiedDecoder;
use crate::config::AppConfig;
use crate::database::MemoryStore;
use crate::gateway::{GatewayRequest, GatewayResponse, RequestRouter};
use crate::queue::MemoryQueue;
use crate::services::Dependencies;
use crate::storage::LocalObjectStore;

/// Bearer credential with the given payload and a junk signature
pub fn unsigned_token(payload: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({"alg": "HS256", "typ": "JWT"}).to_string());
    let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.c2lnbmF0dXJl", header, payload)
}

/// Router wired to in-memory collaborators the test can inspect
pub struct Harness {
    pub router: RequestRouter,
    pub store: Arc<MemoryStore>,
    pub queue: Arc<MemoryQueue>,
}

impl Harness {
    pub fn new() -> Self {
        let config = AppConfig::default();
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(MemoryQueue::new());
        let deps = Dependencies {
            store: store.clone(),
            queue: queue.clone(),
            objects: Arc::new(LocalObjectStore::new(&config.storage.local_endpoint).unwrap()),
            verifier: Arc::new(UnverifiedDecoder),
        };
        let router = RequestRouter::new(deps, &config).unwrap();

        Self { router, store, queue }
    }

    pub fn user_token(&self, email: &str) -> String {
        unsigned_token(json!({"email": email, "cognito:groups": ["Users"]}))
    }

    pub fn admin_token(&self, email: &str) -> String {
        unsigned_token(json!({"email": email, "cognito:groups": ["Admin"]}))
    }

    pub async fn send(&self, method: &str, body: Value, token: Option<&str>) -> GatewayResponse {
        let mut request = GatewayRequest::new(method, "/tickets").with_body(body.to_string());
        if let Some(token) = token {
            request = request.with_header("Authorization", &format!("Bearer {}", token));
        }
        self.router.handle(request).await
    }

    pub async fn post(&self, body: Value, token: Option<&str>) -> GatewayResponse {
        self.send("POST", body, token).await
    }

    pub async fn put(&self, body: Value, token: Option<&str>) -> GatewayResponse {
        self.send("PUT", body, token).await
    }

    pub async fn delete(&self, body: Value, token: Option<&str>) -> GatewayResponse {
        self.send("DELETE", body, token).await
    }

    /// Create a ticket owned by `owner` and return its id
    pub async fn create_ticket(&self, owner: &str) -> String {
        let response = self
            .post(json!({"title": "Test ticket", "user_email": owner}), None)
            .await;
        assert_eq!(response.status_code, 200, "{}", response.body);
        response.body_json().unwrap()["ticket_id"]
            .as_str()
            .unwrap()
            .to_string()
    }
}
