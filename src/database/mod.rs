pub mod memory;
pub mod models;
pub mod record;
pub mod repository;
pub mod store;

pub use memory::MemoryStore;
pub use record::{Entity, StoredEntity};
pub use repository::Repository;
pub use store::{Item, RecordStore, StoreError};
