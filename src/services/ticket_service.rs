use serde_json::{json, Map};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::notification::NotificationDispatcher;
use crate::auth::{authorize, Identity};
use crate::database::models::ticket::{NewTicket, Priority, Ticket, TicketStatus, DEFAULT_TITLE};
use crate::database::{RecordStore, Repository, StoreError};
use crate::error::ApiError;
use crate::types::{EntityKind, TicketAction};

/// Ticket lifecycle: creation, listing, status changes and deletion
#[derive(Clone)]
pub struct TicketService {
    tickets: Repository<Ticket>,
    notifications: NotificationDispatcher,
}

impl TicketService {
    pub fn new(store: Arc<dyn RecordStore>, notifications: NotificationDispatcher) -> Self {
        Self {
            tickets: Repository::new(store),
            notifications,
        }
    }

    /// Persist a new Open ticket, then enqueue the owner notification.
    ///
    /// The notification is attempted only after the write succeeded and its
    /// outcome never changes the result.
    pub async fn create(&self, input: NewTicket) -> Result<Ticket, ApiError> {
        let priority = normalize_priority(input.priority.as_deref())?;

        let ticket = Ticket {
            ticket_id: Uuid::new_v4().to_string(),
            title: input
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: input.description.unwrap_or_default(),
            priority,
            status: TicketStatus::Open,
            created_at: chrono::Utc::now().to_rfc3339(),
            owner_email: input.user_email.map(|e| e.trim().to_string()).unwrap_or_default(),
            owner_name: input.user_name.unwrap_or_default(),
            images: input.images.unwrap_or_default(),
            kind: EntityKind::Ticket,
        };

        self.tickets.insert(ticket.clone()).await?;
        tracing::info!(ticket_id = %ticket.ticket_id, "Created ticket");

        if let Some(email) = ticket.owner() {
            self.notifications
                .notify_ticket_created(&ticket.ticket_id, &ticket.title, email)
                .await;
        }

        Ok(ticket)
    }

    /// All tickets, newest first
    pub async fn list(&self) -> Result<Vec<Ticket>, ApiError> {
        let mut tickets = self.tickets.select_all().await?;
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tickets)
    }

    pub async fn get(&self, ticket_id: &str) -> Result<Ticket, ApiError> {
        match self.tickets.select_404(ticket_id).await {
            Ok(ticket) => Ok(ticket),
            Err(StoreError::NotFound(_)) => Err(ticket_not_found(ticket_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Administrator-only. The permission check runs before the status value
    /// is looked at, so a non-admin gets 403 even for a malformed status.
    pub async fn update_status(
        &self,
        identity: &Identity,
        ticket_id: &str,
        status: Option<&str>,
    ) -> Result<TicketStatus, ApiError> {
        authorize(identity, TicketAction::UpdateStatus, None)?;

        let raw = status
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::missing_field("status"))?;
        let status = TicketStatus::parse(raw).ok_or_else(|| invalid_field("status", raw))?;

        let mut changes = Map::new();
        changes.insert("status".to_string(), json!(status.as_str()));

        match self.tickets.update_fields(ticket_id, changes).await {
            Ok(ticket) => {
                tracing::info!(ticket_id, status = %ticket.status, "Updated ticket status");
                Ok(ticket.status)
            }
            Err(StoreError::NotFound(_)) => Err(ticket_not_found(ticket_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Allowed to administrators and to the ticket's owner.
    ///
    /// A record too damaged to read has no provable owner, so only an
    /// administrator can remove it.
    pub async fn delete(&self, identity: &Identity, ticket_id: &str) -> Result<(), ApiError> {
        match self.tickets.select_404(ticket_id).await {
            Ok(ticket) => authorize(identity, TicketAction::Delete, ticket.owner())?,
            Err(StoreError::NotFound(_)) => return Err(ticket_not_found(ticket_id)),
            Err(StoreError::Corrupt { key, reason }) => {
                authorize(identity, TicketAction::Delete, None)?;
                tracing::warn!(ticket_id = %key, "Deleting unreadable ticket: {}", reason);
            }
            Err(e) => return Err(e.into()),
        }

        self.tickets.delete(ticket_id).await?;
        tracing::info!(ticket_id, admin = identity.is_admin(), "Deleted ticket");
        Ok(())
    }
}

fn normalize_priority(priority: Option<&str>) -> Result<String, ApiError> {
    match priority.map(str::trim) {
        None | Some("") => Ok(String::new()),
        Some(raw) => Priority::parse(raw)
            .map(|p| p.as_str().to_string())
            .ok_or_else(|| invalid_field("priority", raw)),
    }
}

fn invalid_field(field: &str, value: &str) -> ApiError {
    let mut field_errors = HashMap::new();
    field_errors.insert(field.to_string(), format!("Unsupported value '{}'", value));
    ApiError::validation_error(format!("Invalid {}: {}", field, value), Some(field_errors))
}

fn ticket_not_found(ticket_id: &str) -> ApiError {
    ApiError::not_found(format!("Ticket not found: {}", ticket_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::queue::MemoryQueue;
    use std::time::Duration;

    struct Fixture {
        service: TicketService,
        store: Arc<MemoryStore>,
        queue: Arc<MemoryQueue>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(MemoryQueue::new());
        let dispatcher = NotificationDispatcher::new(queue.clone(), Duration::from_secs(1));
        Fixture {
            service: TicketService::new(store.clone(), dispatcher),
            store,
            queue,
        }
    }

    fn identity(email: &str, admin: bool) -> Identity {
        let mut identity = Identity::anonymous();
        identity.email = Some(email.to_string());
        if admin {
            identity.roles.insert("Admin".to_string());
        }
        identity
    }

    fn new_ticket(title: &str, email: Option<&str>) -> NewTicket {
        NewTicket {
            title: Some(title.to_string()),
            description: Some("details".to_string()),
            priority: Some("high".to_string()),
            user_email: email.map(str::to_string),
            user_name: Some("Pat".to_string()),
            images: None,
        }
    }

    #[tokio::test]
    async fn create_forces_open_and_notifies_owner() {
        let f = fixture();
        let ticket = f.service.create(new_ticket("Printer jam", Some("pat@example.com"))).await.unwrap();

        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.priority, "High");
        assert!(Uuid::parse_str(&ticket.ticket_id).is_ok());
        assert!(chrono::DateTime::parse_from_rfc3339(&ticket.created_at).is_ok());

        let stored = f.store.get(&ticket.ticket_id).await.unwrap().unwrap();
        assert_eq!(stored["type"], "ticket");
        assert_eq!(stored["owner_email"], "pat@example.com");

        let messages = f.queue.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains(&ticket.ticket_id));
    }

    #[tokio::test]
    async fn create_without_owner_skips_notification() {
        let f = fixture();
        let ticket = f.service.create(NewTicket::default()).await.unwrap();
        assert_eq!(ticket.title, DEFAULT_TITLE);
        assert_eq!(ticket.priority, "");
        assert!(f.queue.messages().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_unknown_priority() {
        let f = fixture();
        let mut input = new_ticket("x", None);
        input.priority = Some("Urgent".to_string());
        let err = f.service.create(input).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn list_excludes_accounts() {
        let f = fixture();
        f.service.create(new_ticket("a", None)).await.unwrap();
        f.service.create(new_ticket("b", None)).await.unwrap();
        f.store
            .put(
                serde_json::json!({"ticket_id": "USER#x@example.com", "type": "user", "password": "pw"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await
            .unwrap();

        let tickets = f.service.list().await.unwrap();
        assert_eq!(tickets.len(), 2);
        assert!(tickets.iter().all(|t| !t.ticket_id.starts_with("USER#")));
    }

    #[tokio::test]
    async fn status_update_is_admin_only() {
        let f = fixture();
        let ticket = f.service.create(new_ticket("a", Some("pat@example.com"))).await.unwrap();

        let owner = identity("pat@example.com", false);
        let err = f.service.update_status(&owner, &ticket.ticket_id, Some("Closed")).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
        // Denied before validation
        let err = f.service.update_status(&owner, &ticket.ticket_id, Some("Bogus")).await.unwrap_err();
        assert_eq!(err.status_code(), 403);

        let admin = identity("root@example.com", true);
        let status = f.service.update_status(&admin, &ticket.ticket_id, Some("In-Progress")).await.unwrap();
        assert_eq!(status, TicketStatus::Processing);
        assert_eq!(f.service.get(&ticket.ticket_id).await.unwrap().status, TicketStatus::Processing);
    }

    #[tokio::test]
    async fn status_update_validates_and_needs_existing_ticket() {
        let f = fixture();
        let admin = identity("root@example.com", true);
        let ticket = f.service.create(new_ticket("a", None)).await.unwrap();

        let err = f.service.update_status(&admin, &ticket.ticket_id, Some("Resolved")).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        let err = f.service.update_status(&admin, &ticket.ticket_id, None).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        let err = f.service.update_status(&admin, "missing", Some("Closed")).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert!(f.store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_allowed_to_owner_and_admin_only() {
        let f = fixture();
        let first = f.service.create(new_ticket("a", Some("pat@example.com"))).await.unwrap();
        let second = f.service.create(new_ticket("b", Some("pat@example.com"))).await.unwrap();

        let stranger = identity("eve@example.com", false);
        let err = f.service.delete(&stranger, &first.ticket_id).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(f.service.get(&first.ticket_id).await.is_ok());

        f.service.delete(&identity("pat@example.com", false), &first.ticket_id).await.unwrap();
        f.service.delete(&identity("root@example.com", true), &second.ticket_id).await.unwrap();
        assert!(f.service.list().await.unwrap().is_empty());

        let err = f.service.delete(&stranger, &first.ticket_id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    fn legacy_item(value: serde_json::Value) -> crate::database::Item {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn legacy_shapes_list_and_delete() {
        let f = fixture();
        f.store
            .put(legacy_item(json!({
                "ticket_id": "legacy-null",
                "title": "Old",
                "description": null,
                "status": "Open",
                "user_email": "old@example.com"
            })))
            .await
            .unwrap();
        f.store
            .put(legacy_item(json!({"ticket_id": "legacy-pending", "title": "Older", "status": "Pending"})))
            .await
            .unwrap();

        let tickets = f.service.list().await.unwrap();
        assert_eq!(tickets.len(), 2);
        let pending = f.service.get("legacy-pending").await.unwrap();
        assert_eq!(pending.status, TicketStatus::Other("Pending".to_string()));
        assert_eq!(f.service.get("legacy-null").await.unwrap().description, "");

        let owner = identity("old@example.com", false);
        f.service.delete(&owner, "legacy-null").await.unwrap();
        let admin = identity("root@example.com", true);
        f.service.delete(&admin, "legacy-pending").await.unwrap();
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn unreadable_ticket_is_deletable_by_admin_only() {
        let f = fixture();
        f.store
            .put(legacy_item(json!({"ticket_id": "broken", "images": {"front": 1}})))
            .await
            .unwrap();

        assert_eq!(f.service.get("broken").await.unwrap_err().status_code(), 500);
        let err = f.service.delete(&identity("pat@example.com", false), "broken").await.unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(f.store.get("broken").await.unwrap().is_some());

        f.service.delete(&identity("root@example.com", true), "broken").await.unwrap();
        assert!(f.store.get("broken").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn anonymous_cannot_delete_ownerless_ticket() {
        let f = fixture();
        let ticket = f.service.create(new_ticket("a", None)).await.unwrap();
        let err = f.service.delete(&Identity::anonymous(), &ticket.ticket_id).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
    }
}
