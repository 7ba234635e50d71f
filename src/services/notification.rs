use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::queue::MessageQueue;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    #[default]
    #[serde(rename = "TICKET_CREATED")]
    TicketCreated,
}

/// Queue message consumed by the notification worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketNotification {
    #[serde(default)]
    pub ticket_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
}

/// What happened to a notification; informational only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Enqueued,
    /// No owner email, nothing to send
    Skipped,
    /// Send failed or timed out and was discarded
    Dropped,
}

/// Best-effort enqueue of ticket notifications.
///
/// Runs after the ticket is committed. Failures and timeouts are logged and
/// discarded; the caller's result never depends on them.
#[derive(Clone)]
pub struct NotificationDispatcher {
    queue: Arc<dyn MessageQueue>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(queue: Arc<dyn MessageQueue>, timeout: Duration) -> Self {
        Self { queue, timeout }
    }

    pub async fn notify_ticket_created(&self, ticket_id: &str, title: &str, email: &str) -> Delivery {
        if email.is_empty() {
            return Delivery::Skipped;
        }

        let event = TicketNotification {
            ticket_id: ticket_id.to_string(),
            title: title.to_string(),
            email: email.to_string(),
            kind: NotificationKind::TicketCreated,
        };
        let body = match serde_json::to_string(&event) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(ticket_id, "Dropping ticket notification, could not serialize: {}", e);
                return Delivery::Dropped;
            }
        };

        match tokio::time::timeout(self.timeout, self.queue.send(body)).await {
            Ok(Ok(())) => {
                tracing::info!(ticket_id, "Queued ticket notification");
                Delivery::Enqueued
            }
            Ok(Err(e)) => {
                tracing::warn!(ticket_id, "Dropping ticket notification: {}", e);
                Delivery::Dropped
            }
            Err(_) => {
                tracing::warn!(
                    ticket_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Dropping ticket notification: queue send timed out"
                );
                Delivery::Dropped
            }
        }
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("timeout", &self.timeout)
            .finish()
    }
}
