/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Primary key attribute shared by every record in the store
pub const KEY_ATTRIBUTE: &str = "ticket_id";

/// Key prefix reserved for account records
pub const USER_KEY_PREFIX: &str = "USER#";

/// Role membership that marks an administrator
pub const ADMIN_ROLE: &str = "Admin";

/// The two record kinds that share the single key space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Ticket,
    #[serde(rename = "user")]
    Account,
}

impl EntityKind {
    /// Value written to the `type` attribute
    pub fn tag(&self) -> &'static str {
        match self {
            EntityKind::Ticket => "ticket",
            EntityKind::Account => "user",
        }
    }

    /// Classify a stored record: the key prefix wins, then the `type` tag.
    /// Untagged legacy records without the account prefix are tickets.
    pub fn classify(key: &str, tag: Option<&str>) -> Self {
        if key.starts_with(USER_KEY_PREFIX) {
            return EntityKind::Account;
        }
        match tag {
            Some("user") => EntityKind::Account,
            _ => EntityKind::Ticket,
        }
    }
}

/// Mutating ticket operations subject to the authorization guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketAction {
    UpdateStatus,
    Delete,
}

impl std::fmt::Display for TicketAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketAction::UpdateStatus => write!(f, "update ticket status"),
            TicketAction::Delete => write!(f, "delete ticket"),
        }
    }
}
