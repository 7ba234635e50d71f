use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::lenient;
use crate::types::{EntityKind, USER_KEY_PREFIX};

/// Marker written next to hashed passwords
pub const PASSWORD_FORMAT_SHA256: &str = "sha256";

/// Length of a hex-encoded SHA-256 digest
pub const SHA256_HEX_LEN: usize = 64;

/// Stored password material
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredPassword {
    /// Legacy record holding the raw password
    Plaintext(String),
    /// Hex SHA-256 of `password + lowercase(email)`
    Sha256(String),
}

impl StoredPassword {
    pub fn hash(password: &str, email: &str) -> Self {
        StoredPassword::Sha256(salted_digest(password, email))
    }

    /// Decode a stored value. The `password_format` marker decides when present.
    ///
    /// Unmarked records fall back to the historical length rule: exactly 64
    /// characters means a digest, anything shorter is plaintext. A legacy
    /// plaintext password that is itself 64 characters long is misread as a
    /// digest under this rule; such accounts can only log in after a reset.
    pub fn from_stored(value: String, format: Option<&str>) -> Self {
        match format {
            Some(PASSWORD_FORMAT_SHA256) => StoredPassword::Sha256(value),
            Some(other) => {
                tracing::warn!("Unknown password format '{}', treating as plaintext", other);
                StoredPassword::Plaintext(value)
            }
            None if value.len() == SHA256_HEX_LEN => StoredPassword::Sha256(value),
            None => {
                if value.len() > SHA256_HEX_LEN {
                    tracing::warn!("Unmarked password longer than a digest, treating as plaintext");
                }
                StoredPassword::Plaintext(value)
            }
        }
    }

    /// Compares in constant time; stored digests may be upper-case hex
    pub fn matches(&self, password: &str, email: &str) -> bool {
        let equal = match self {
            StoredPassword::Plaintext(stored) => stored.as_bytes().ct_eq(password.as_bytes()),
            StoredPassword::Sha256(digest) => digest
                .to_ascii_lowercase()
                .as_bytes()
                .ct_eq(salted_digest(password, email).as_bytes()),
        };
        equal.into()
    }

    pub fn format_marker(&self) -> Option<&'static str> {
        match self {
            StoredPassword::Plaintext(_) => None,
            StoredPassword::Sha256(_) => Some(PASSWORD_FORMAT_SHA256),
        }
    }

    pub fn as_stored(&self) -> &str {
        match self {
            StoredPassword::Plaintext(value) | StoredPassword::Sha256(value) => value,
        }
    }
}

fn salted_digest(password: &str, email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(email.to_lowercase().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub email: String,
    pub name: String,
    pub password: StoredPassword,
    pub created_at: String,
}

impl Account {
    /// Store key for an email: prefix + lowercase email
    pub fn key_for(email: &str) -> String {
        format!("{}{}", USER_KEY_PREFIX, email.trim().to_lowercase())
    }

    pub fn key(&self) -> String {
        Self::key_for(&self.email)
    }
}

/// Stored shape of an account, tolerant of legacy field names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AccountRecord {
    pub ticket_id: String,
    #[serde(default, alias = "user_email", deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, alias = "user_name", deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_format: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub created_at: String,
    #[serde(rename = "type", default = "account_kind")]
    pub kind: EntityKind,
}

fn account_kind() -> EntityKind {
    EntityKind::Account
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        let email = if record.email.is_empty() {
            record
                .ticket_id
                .strip_prefix(USER_KEY_PREFIX)
                .unwrap_or(&record.ticket_id)
                .to_string()
        } else {
            record.email
        };
        let password = StoredPassword::from_stored(record.password, record.password_format.as_deref());

        Self {
            email,
            name: record.name,
            password,
            created_at: record.created_at,
        }
    }
}

impl From<&Account> for AccountRecord {
    fn from(account: &Account) -> Self {
        Self {
            ticket_id: account.key(),
            email: account.email.clone(),
            name: account.name.clone(),
            password: account.password.as_stored().to_string(),
            password_format: account.password.format_marker().map(str::to_string),
            created_at: account.created_at.clone(),
            kind: EntityKind::Account,
        }
    }
}
