use serde_json::Value;

use super::models::account::{Account, AccountRecord};
use super::models::ticket::Ticket;
use super::store::{item_key, Item, StoreError};
use crate::types::{EntityKind, USER_KEY_PREFIX};

/// A decoded record from the shared key space
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Ticket(Ticket),
    Account(Account),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Ticket(_) => EntityKind::Ticket,
            Entity::Account(_) => EntityKind::Account,
        }
    }

    pub fn key(&self) -> String {
        match self {
            Entity::Ticket(ticket) => ticket.ticket_id.clone(),
            Entity::Account(account) => account.key(),
        }
    }

    /// Classify an item by key prefix and `type` tag, then decode it
    pub fn from_item(item: Item) -> Result<Self, StoreError> {
        let key = item_key(&item)?.to_string();
        let tag = item.get("type").and_then(Value::as_str);

        match EntityKind::classify(&key, tag) {
            EntityKind::Ticket => serde_json::from_value::<Ticket>(Value::Object(item))
                .map(Entity::Ticket)
                .map_err(|e| corrupt(&key, e)),
            EntityKind::Account => serde_json::from_value::<AccountRecord>(Value::Object(item))
                .map(|record| Entity::Account(record.into()))
                .map_err(|e| corrupt(&key, e)),
        }
    }

    pub fn into_item(self) -> Result<Item, StoreError> {
        let key = self.key();
        let value = match self {
            Entity::Ticket(ticket) => {
                if ticket.ticket_id.starts_with(USER_KEY_PREFIX) {
                    return Err(StoreError::Corrupt {
                        key,
                        reason: format!("ticket keys may not start with '{}'", USER_KEY_PREFIX),
                    });
                }
                serde_json::to_value(&ticket)
            }
            Entity::Account(account) => serde_json::to_value(AccountRecord::from(&account)),
        }
        .map_err(|e| corrupt(&key, e))?;

        match value {
            Value::Object(item) => Ok(item),
            _ => Err(StoreError::Corrupt {
                key,
                reason: "entity did not serialize to an object".to_string(),
            }),
        }
    }
}

fn corrupt(key: &str, err: serde_json::Error) -> StoreError {
    StoreError::Corrupt {
        key: key.to_string(),
        reason: err.to_string(),
    }
}

/// An entity kind that a [`Repository`](super::repository::Repository) can be parametrized by
pub trait StoredEntity: Sized + Send + Sync {
    const KIND: EntityKind;

    fn key(&self) -> String;

    fn into_entity(self) -> Entity;

    fn from_entity(entity: Entity) -> Option<Self>;
}

impl StoredEntity for Ticket {
    const KIND: EntityKind = EntityKind::Ticket;

    fn key(&self) -> String {
        self.ticket_id.clone()
    }

    fn into_entity(self) -> Entity {
        Entity::Ticket(self)
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Ticket(ticket) => Some(ticket),
            Entity::Account(_) => None,
        }
    }
}

impl StoredEntity for Account {
    const KIND: EntityKind = EntityKind::Account;

    fn key(&self) -> String {
        Account::key(self)
    }

    fn into_entity(self) -> Entity {
        Entity::Account(self)
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Account(account) => Some(account),
            Entity::Ticket(_) => None,
        }
    }
}
