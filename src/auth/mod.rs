//! Identity handling: bearer credential decoding and the ticket authorization guard.

pub mod claims;
pub mod guard;
pub mod verifier;

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::{SecurityConfig, TokenVerification};
use crate::types::ADMIN_ROLE;

pub use claims::ClaimsExtractor;
pub use guard::{authorize, Denied};
pub use verifier::{ClaimsError, Hs256Verifier, RawClaims, Roles, TokenVerifier, UnverifiedDecoder};

/// Caller identity as read from the request credential
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub email: Option<String>,
    pub roles: BTreeSet<String>,
}

impl Identity {
    /// Identity used when no usable credential was supplied
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(ADMIN_ROLE)
    }

    /// Caller email, if present and non-empty
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.is_empty())
    }

    pub fn is_anonymous(&self) -> bool {
        self.email().is_none() && self.roles.is_empty()
    }
}

impl From<RawClaims> for Identity {
    fn from(claims: RawClaims) -> Self {
        Self {
            email: claims.email.filter(|e| !e.trim().is_empty()),
            roles: claims.groups.map(Roles::into_set).unwrap_or_default(),
        }
    }
}

/// Build the configured credential verification strategy
pub fn verifier_from_config(security: &SecurityConfig) -> Result<Arc<dyn TokenVerifier>, ClaimsError> {
    match security.token_verification {
        TokenVerification::Unverified => Ok(Arc::new(UnverifiedDecoder)),
        TokenVerification::Hs256 => Ok(Arc::new(Hs256Verifier::new(&security.jwt_secret)?)),
    }
}
