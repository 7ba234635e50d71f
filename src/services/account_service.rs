use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::database::models::account::{Account, StoredPassword};
use crate::database::{RecordStore, Repository, StoreError};
use crate::error::ApiError;

/// Minimum password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Punctuation accepted as the required password symbol
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?`~";

/// Identical for unknown email and wrong password
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// First password-policy rule a candidate password breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least 8 characters long")]
    TooShort,
    #[error("Password must contain an uppercase letter")]
    MissingUppercase,
    #[error("Password must contain a lowercase letter")]
    MissingLowercase,
    #[error("Password must contain a digit")]
    MissingDigit,
    #[error("Password must contain a symbol")]
    MissingSymbol,
}

/// Checks the rules in order: length, uppercase, lowercase, digit, symbol
pub fn check_password_policy(password: &str) -> Result<(), PasswordPolicyError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooShort);
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(PasswordPolicyError::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(PasswordPolicyError::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordPolicyError::MissingDigit);
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return Err(PasswordPolicyError::MissingSymbol);
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Account fields safe to return to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountProfile {
    pub email: String,
    pub name: String,
}

impl From<Account> for AccountProfile {
    fn from(account: Account) -> Self {
        Self {
            email: account.email,
            name: account.name,
        }
    }
}

/// Registration and login against the shared record store
#[derive(Clone)]
pub struct AccountService {
    accounts: Repository<Account>,
}

impl AccountService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            accounts: Repository::new(store),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AccountProfile, ApiError> {
        let email = required(request.email, "email")?;
        let password = request
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::missing_field("password"))?;
        check_password_policy(&password)?;

        let key = Account::key_for(&email);
        if self.accounts.select_one(&key).await?.is_some() {
            tracing::debug!(key = %key, "Registration rejected, account exists");
            return Err(ApiError::conflict("User already exists"));
        }

        let account = Account {
            password: StoredPassword::hash(&password, &email),
            email,
            name: request.name.map(|n| n.trim().to_string()).unwrap_or_default(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let profile = AccountProfile {
            email: account.email.clone(),
            name: account.name.clone(),
        };

        // A concurrent registration that slipped past the check above lands here
        self.accounts.insert_new(account).await.map_err(|e| match e {
            StoreError::AlreadyExists(_) => ApiError::conflict("User already exists"),
            other => other.into(),
        })?;

        tracing::info!(key = %key, "Registered account");
        Ok(profile)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AccountProfile, ApiError> {
        let email = required(request.email, "email")?;
        let password = request
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::missing_field("password"))?;

        let account = match self.accounts.select_one(&Account::key_for(&email)).await? {
            Some(account) => account,
            None => {
                tracing::debug!("Login failed: unknown account");
                return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
            }
        };

        if !account.password.matches(&password, &email) {
            tracing::debug!("Login failed: password mismatch");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }

        Ok(account.into())
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::missing_field(field))
}
