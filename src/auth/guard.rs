use thiserror::Error;

use super::Identity;
use crate::types::TicketAction;

/// Authorization denial, reported as 403
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Denied {
    #[error("Only administrators may {0}")]
    AdminOnly(TicketAction),
    #[error("Only administrators or the ticket owner may {0}")]
    NotOwner(TicketAction),
}

/// Decide whether `identity` may perform `action` on a ticket owned by `owner_email`.
///
/// Status updates are administrator-only. Deletion is allowed to administrators
/// and to a caller whose non-empty email equals the owner email exactly.
pub fn authorize(
    identity: &Identity,
    action: TicketAction,
    owner_email: Option<&str>,
) -> Result<(), Denied> {
    if identity.is_admin() {
        return Ok(());
    }

    match action {
        TicketAction::UpdateStatus => Err(Denied::AdminOnly(action)),
        TicketAction::Delete => {
            let owner = owner_email.filter(|o| !o.is_empty());
            match (identity.email(), owner) {
                (Some(caller), Some(owner)) if caller == owner => Ok(()),
                _ => Err(Denied::NotOwner(action)),
            }
        }
    }
}
