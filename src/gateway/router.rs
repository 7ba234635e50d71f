use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::{ApiResponse, ApiResult, GatewayRequest, GatewayResponse};
use crate::auth::{ClaimsExtractor, Identity};
use crate::config::AppConfig;
use crate::database::models::ticket::NewTicket;
use crate::error::ApiError;
use crate::services::{
    AccountService, Dependencies, LoginRequest, NotificationDispatcher, RegisterRequest, SetupError,
    TicketService, UploadRequest, UploadService,
};

/// `action` values understood on POST
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PostAction {
    Register,
    Login,
    UploadUrl,
    CreateTicket,
}

impl PostAction {
    /// An absent action means ticket creation
    fn parse(action: Option<&Value>) -> Result<Self, ApiError> {
        match action {
            None | Some(Value::Null) => Ok(PostAction::CreateTicket),
            Some(Value::String(name)) => match name.as_str() {
                "register" => Ok(PostAction::Register),
                "login" => Ok(PostAction::Login),
                "get_upload_url" => Ok(PostAction::UploadUrl),
                "create_ticket" | "" => Ok(PostAction::CreateTicket),
                other => Err(ApiError::bad_request(format!("Unknown action: {}", other))),
            },
            Some(other) => Err(ApiError::bad_request(format!("Unknown action: {}", other))),
        }
    }
}

/// What a request path addresses
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Collection,
    Ticket(String),
}

impl Target {
    /// A path parameter names a ticket outright; otherwise only `/tickets`
    /// and `/tickets/{id}` are routable.
    fn resolve(request: &GatewayRequest) -> Result<Self, ApiError> {
        if let Some(id) = path_ticket_id(request) {
            return Ok(Target::Ticket(id.to_string()));
        }

        let path = request.path.trim().trim_end_matches('/');
        match path.strip_prefix(TICKETS_PATH) {
            Some("") => Ok(Target::Collection),
            Some(rest) => match rest.strip_prefix('/') {
                Some(id) if !id.is_empty() && !id.contains('/') => Ok(Target::Ticket(id.to_string())),
                _ => Err(ApiError::not_found("Not Found")),
            },
            None => Err(ApiError::not_found("Not Found")),
        }
    }

    fn ticket_id(&self) -> Option<&str> {
        match self {
            Target::Ticket(id) => Some(id),
            Target::Collection => None,
        }
    }
}

const TICKETS_PATH: &str = "/tickets";

/// Entry point for gateway events: one request in, one response out
pub struct RequestRouter {
    claims: ClaimsExtractor,
    tickets: TicketService,
    accounts: AccountService,
    uploads: UploadService,
}

impl RequestRouter {
    pub fn new(deps: Dependencies, config: &AppConfig) -> Result<Self, SetupError> {
        let dispatcher = NotificationDispatcher::new(
            deps.queue.clone(),
            Duration::from_millis(config.queue.enqueue_timeout_ms),
        );

        let claims = ClaimsExtractor::new(deps.verifier.clone());
        tracing::info!(verifier = claims.verifier_name(), "Request router ready");

        Ok(Self {
            claims,
            tickets: TicketService::new(deps.store.clone(), dispatcher),
            accounts: AccountService::new(deps.store.clone()),
            uploads: UploadService::new(deps.objects.clone(), &config.storage)?,
        })
    }

    pub async fn handle(&self, request: GatewayRequest) -> GatewayResponse {
        let method = request.http_method.trim().to_ascii_uppercase();
        if method == "OPTIONS" {
            return GatewayResponse::preflight();
        }

        let result = match Target::resolve(&request) {
            Ok(target) => self.dispatch(&method, target, &request).await,
            Err(err) => Err(err),
        };

        let response = match result {
            Ok(response) => response.into_gateway(),
            Err(err) => {
                if err.status_code() >= 500 {
                    tracing::error!(method = %method, path = %request.path, "Request failed: {}", err);
                } else {
                    tracing::debug!(method = %method, path = %request.path, "Request rejected: {}", err);
                }
                GatewayResponse::from_error(&err)
            }
        };

        tracing::info!(
            method = %method,
            path = %request.path,
            status = response.status_code,
            "Handled request"
        );
        response
    }

    async fn dispatch(&self, method: &str, target: Target, request: &GatewayRequest) -> ApiResult<Value> {
        let identity = self.claims.extract(request.header("authorization"));

        match (method, &target) {
            ("POST", Target::Collection) => self.post(request).await,
            ("GET", _) => self.get(&target).await,
            ("PUT" | "PATCH", _) => self.update_status(&identity, &target, request).await,
            ("DELETE", _) => self.delete(&identity, &target, request).await,
            _ => Err(ApiError::not_found("Not Found")),
        }
    }

    async fn post(&self, request: &GatewayRequest) -> ApiResult<Value> {
        let body = request.json_body()?;

        match PostAction::parse(body.get("action"))? {
            PostAction::Register => {
                let profile = self.accounts.register(decode::<RegisterRequest>(body)?).await?;
                Ok(ApiResponse::success(json!({
                    "message": "User registered successfully",
                    "email": profile.email
                })))
            }
            PostAction::Login => {
                let profile = self.accounts.login(decode::<LoginRequest>(body)?).await?;
                Ok(ApiResponse::success(json!({
                    "message": "Login successful",
                    "user": profile
                })))
            }
            PostAction::UploadUrl => {
                let slot = self.uploads.issue_upload_slot(decode::<UploadRequest>(body)?).await?;
                Ok(ApiResponse::success(json!(slot)))
            }
            PostAction::CreateTicket => {
                let ticket = self.tickets.create(decode::<NewTicket>(body)?).await?;
                Ok(ApiResponse::success(json!({
                    "message": "Success",
                    "ticket_id": ticket.ticket_id
                })))
            }
        }
    }

    async fn get(&self, target: &Target) -> ApiResult<Value> {
        if let Some(ticket_id) = target.ticket_id() {
            let ticket = self.tickets.get(ticket_id).await?;
            return Ok(ApiResponse::success(json!(ticket)));
        }

        let items = self.tickets.list().await?;
        Ok(ApiResponse::success(json!({
            "count": items.len(),
            "items": items
        })))
    }

    async fn update_status(
        &self,
        identity: &Identity,
        target: &Target,
        request: &GatewayRequest,
    ) -> ApiResult<Value> {
        let body = request.json_body()?;
        let ticket_id = resolve_ticket_id(target, &body)?;
        let status = body.get("status").and_then(Value::as_str);

        let status = self.tickets.update_status(identity, &ticket_id, status).await?;
        Ok(ApiResponse::success(json!({
            "message": "Status updated",
            "ticket_id": ticket_id,
            "status": status
        })))
    }

    async fn delete(&self, identity: &Identity, target: &Target, request: &GatewayRequest) -> ApiResult<Value> {
        let body = request.json_body()?;
        let ticket_id = resolve_ticket_id(target, &body)?;

        self.tickets.delete(identity, &ticket_id).await?;
        Ok(ApiResponse::success(json!({
            "message": "Deleted",
            "ticket_id": ticket_id
        })))
    }
}

impl std::fmt::Debug for RequestRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestRouter")
            .field("claims", &self.claims)
            .field("uploads", &self.uploads)
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(body: Map<String, Value>) -> Result<T, ApiError> {
    Ok(serde_json::from_value(Value::Object(body))?)
}

fn path_ticket_id(request: &GatewayRequest) -> Option<&str> {
    request
        .path_param("id")
        .or_else(|| request.path_param("ticket_id"))
}

/// Id from the path (parameter `id`, then `ticket_id`, then the URL), then the body's `ticket_id`
fn resolve_ticket_id(target: &Target, body: &Map<String, Value>) -> Result<String, ApiError> {
    if let Some(id) = target.ticket_id() {
        return Ok(id.to_string());
    }
    body.get("ticket_id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::missing_field("ticket_id"))
}
