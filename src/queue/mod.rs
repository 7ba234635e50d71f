//! Message queue collaborator used for fire-and-forget notification delivery.

use async_trait::async_trait;
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue unavailable: {0}")]
    Unavailable(String),
    #[error("queue is closed")]
    Closed,
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn send(&self, body: String) -> Result<(), QueueError>;
}

/// Collects messages in memory; tests inspect them afterwards
#[derive(Debug, Default)]
pub struct MemoryQueue {
    messages: Mutex<Vec<String>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn send(&self, body: String) -> Result<(), QueueError> {
        self.messages.lock().unwrap_or_else(|e| e.into_inner()).push(body);
        Ok(())
    }
}

/// Hands messages to an in-process consumer over a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelQueue {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl MessageQueue for ChannelQueue {
    async fn send(&self, body: String) -> Result<(), QueueError> {
        self.tx.send(body).map_err(|_| QueueError::Closed)
    }
}
