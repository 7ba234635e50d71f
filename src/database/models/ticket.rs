use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::lenient;

use crate::types::EntityKind;

/// Title stored when the creator supplied none
pub const DEFAULT_TITLE: &str = "No Title";

/// Ticket lifecycle: Open → Processing → Closed.
///
/// `Other` keeps a legacy value outside the lifecycle so such tickets still
/// list and can be deleted; it is never produced from client input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum TicketStatus {
    #[default]
    Open,
    Processing,
    Closed,
    Other(String),
}

impl TicketStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::Processing => "Processing",
            TicketStatus::Closed => "Closed",
            TicketStatus::Other(raw) => raw,
        }
    }

    /// Case-insensitive parse; `In-Progress` is accepted for `Processing`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Some(TicketStatus::Open),
            "processing" | "in-progress" | "in_progress" | "inprogress" => Some(TicketStatus::Processing),
            "closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }

    /// Status as read from storage: known values parse, anything else is kept verbatim
    pub fn from_stored(value: &str) -> Self {
        if value.trim().is_empty() {
            return TicketStatus::Open;
        }
        Self::parse(value).unwrap_or_else(|| TicketStatus::Other(value.to_string()))
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TicketStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TicketStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient::string(deserializer).map(|raw| TicketStatus::from_stored(&raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// A support ticket as stored.
///
/// `priority` stays a string so legacy records with free-form values remain
/// listable; new tickets are normalized through [`Priority`] on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: String,
    #[serde(default = "default_title", deserialize_with = "title")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub priority: String,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default, deserialize_with = "lenient::string")]
    pub created_at: String,
    #[serde(default, alias = "user_email", deserialize_with = "lenient::string")]
    pub owner_email: String,
    #[serde(default, alias = "user_name", deserialize_with = "lenient::string")]
    pub owner_name: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub images: Vec<String>,
    #[serde(rename = "type", default = "ticket_kind")]
    pub kind: EntityKind,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn title<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let title = lenient::string(deserializer)?;
    Ok(if title.is_empty() { default_title() } else { title })
}

fn ticket_kind() -> EntityKind {
    EntityKind::Ticket
}

impl Ticket {
    /// Owner email, if the ticket has one
    pub fn owner(&self) -> Option<&str> {
        Some(self.owner_email.as_str()).filter(|e| !e.is_empty())
    }
}

/// Ticket-creation input as sent by clients (`user_email`/`user_name` naming)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTicket {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    #[serde(alias = "owner_email")]
    pub user_email: Option<String>,
    #[serde(alias = "owner_name")]
    pub user_name: Option<String>,
    pub images: Option<Vec<String>>,
}
