use std::sync::Arc;

use super::verifier::{TokenVerifier, UnverifiedDecoder};
use super::Identity;

/// Turns an optional `Authorization` header value into an [`Identity`].
///
/// Never fails: a missing, malformed or rejected credential yields the
/// anonymous identity, and the reason is logged.
#[derive(Clone)]
pub struct ClaimsExtractor {
    verifier: Arc<dyn TokenVerifier>,
}

impl ClaimsExtractor {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }

    /// Extractor backed by [`UnverifiedDecoder`]
    pub fn unverified() -> Self {
        Self::new(Arc::new(UnverifiedDecoder))
    }

    pub fn verifier_name(&self) -> &'static str {
        self.verifier.name()
    }

    pub fn extract(&self, header: Option<&str>) -> Identity {
        let raw = match header.map(str::trim).filter(|h| !h.is_empty()) {
            Some(raw) => raw,
            None => return Identity::anonymous(),
        };
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();

        match self.verifier.verify(token) {
            Ok(claims) => {
                let identity = Identity::from(claims);
                tracing::debug!(
                    email = identity.email().unwrap_or(""),
                    admin = identity.is_admin(),
                    "Resolved caller identity"
                );
                identity
            }
            Err(e) => {
                tracing::warn!(
                    verifier = self.verifier.name(),
                    "Ignoring unreadable bearer credential: {}",
                    e
                );
                Identity::anonymous()
            }
        }
    }
}

impl std::fmt::Debug for ClaimsExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimsExtractor")
            .field("verifier", &self.verifier.name())
            .finish()
    }
}
