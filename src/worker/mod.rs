//! Consumer side of the ticket notification queue.
//!
//! Each queued `TICKET_CREATED` message becomes one published alert. A bad
//! message or a failed publish is logged and skipped so one record never
//! blocks the rest of the batch.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::services::notification::TicketNotification;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("unreadable queue message: {0}")]
    InvalidMessage(#[from] serde_json::Error),
    #[error("publish failed: {0}")]
    PublishFailed(String),
}

/// Outbound alert channel (email/SMS topic)
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotifyError>;
}

/// Writes alerts to the log instead of a real topic
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    topic: Option<String>,
}

impl LogNotifier {
    pub fn new(topic: Option<String>) -> Self {
        Self { topic }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotifyError> {
        tracing::info!(
            topic = self.topic.as_deref().unwrap_or("local"),
            subject,
            "Published alert: {}",
            message.replace('\n', " | ")
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub failed: usize,
}

pub struct NotificationWorker<N: Notifier> {
    notifier: N,
}

impl<N: Notifier> NotificationWorker<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }

    /// Publish one alert per message; failures are counted, not returned
    pub async fn process_batch<I>(&self, bodies: I) -> BatchReport
    where
        I: IntoIterator<Item = String>,
    {
        let mut report = BatchReport::default();
        for body in bodies {
            match self.process_one(&body).await {
                Ok(()) => report.processed += 1,
                Err(e) => {
                    tracing::warn!("Skipping notification message: {}", e);
                    report.failed += 1;
                }
            }
        }
        report
    }

    async fn process_one(&self, body: &str) -> Result<(), NotifyError> {
        let event: TicketNotification = serde_json::from_str(body)?;
        tracing::debug!(ticket_id = %event.ticket_id, "Processing notification message");
        let (subject, message) = render(&event);
        self.notifier.publish(&subject, &message).await
    }

    /// Drain the channel until every sender is gone
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<String>) {
        tracing::info!("Notification worker started");
        while let Some(body) = rx.recv().await {
            self.process_batch(std::iter::once(body)).await;
        }
        tracing::info!("Notification worker stopped, queue closed");
    }
}

/// Alert subject and body for a created ticket
pub fn render(event: &TicketNotification) -> (String, String) {
    let subject = format!("[Alert] New Ticket: {}", event.title);
    let message = format!(
        "New Ticket Created!\nID: {}\nTitle: {}\nPlease check the dashboard.",
        event.ticket_id, event.title
    );
    (subject, message)
}
