pub mod account_service;
pub mod notification;
pub mod ticket_service;
pub mod upload_service;

use std::sync::Arc;
use thiserror::Error;

use crate::auth::{verifier_from_config, ClaimsError, TokenVerifier};
use crate::config::AppConfig;
use crate::database::{MemoryStore, RecordStore};
use crate::queue::MessageQueue;
use crate::storage::{LocalObjectStore, ObjectStore, StorageError};

pub use account_service::{AccountProfile, AccountService, LoginRequest, PasswordPolicyError, RegisterRequest};
pub use notification::{Delivery, NotificationDispatcher, NotificationKind, TicketNotification};
pub use ticket_service::TicketService;
pub use upload_service::{UploadRequest, UploadService, UploadSlot};

/// Collaborators injected into the request router
#[derive(Clone)]
pub struct Dependencies {
    pub store: Arc<dyn RecordStore>,
    pub queue: Arc<dyn MessageQueue>,
    pub objects: Arc<dyn ObjectStore>,
    pub verifier: Arc<dyn TokenVerifier>,
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("object storage setup failed: {0}")]
    Storage(#[from] StorageError),
    #[error("credential verifier setup failed: {0}")]
    Claims(#[from] ClaimsError),
}

impl Dependencies {
    /// In-process collaborators: memory record store and local upload endpoint
    pub fn local(config: &AppConfig, queue: Arc<dyn MessageQueue>) -> Result<Self, SetupError> {
        Ok(Self {
            store: Arc::new(MemoryStore::new()),
            queue,
            objects: Arc::new(LocalObjectStore::new(&config.storage.local_endpoint)?),
            verifier: verifier_from_config(&config.security)?,
        })
    }
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependencies")
            .field("verifier", &self.verifier.name())
            .finish_non_exhaustive()
    }
}
