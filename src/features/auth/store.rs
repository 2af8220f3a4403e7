//! The session store: the one place that reads and writes the persisted session
//! descriptor. Reads fail closed; anything in the slot that does not decode is
//! treated as "no session".

use super::{
    error::AuthError,
    repository::SessionRepository,
    types::{ROLE_ADMIN, ROLE_EMPLOYEE, SessionDescriptor},
};
use std::rc::Rc;
use tracing::{debug, warn};

/// Single-slot session holder over an injected repository.
#[derive(Clone)]
pub struct SessionStore {
    repository: Rc<dyn SessionRepository>,
}

impl SessionStore {
    #[must_use]
    pub fn new(repository: Rc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    #[must_use]
    pub fn repository(&self) -> &Rc<dyn SessionRepository> {
        &self.repository
    }

    /// Persists `descriptor` as the only active session.
    ///
    /// # Errors
    /// Returns `AuthError::Storage` if the descriptor cannot be serialized or
    /// the repository refuses the write.
    pub fn save(&self, descriptor: &SessionDescriptor) -> Result<(), AuthError> {
        let serialized = serde_json::to_string(descriptor)
            .map_err(|err| AuthError::Storage(format!("failed to encode session: {err}")))?;
        self.repository.store(&serialized)?;
        debug!(roles = descriptor.roles.len(), "session saved");
        Ok(())
    }

    /// The persisted session, or `None` if the slot is empty or undecodable.
    #[must_use]
    pub fn current(&self) -> Option<SessionDescriptor> {
        let serialized = self.repository.load()?;
        match serde_json::from_str(&serialized) {
            Ok(descriptor) => Some(descriptor),
            Err(err) => {
                warn!(error = %err, "ignoring undecodable session slot");
                None
            }
        }
    }

    /// Removes the persisted session.
    ///
    /// # Errors
    /// Returns `AuthError::Storage` if the repository refuses the removal.
    pub fn clear(&self) -> Result<(), AuthError> {
        self.repository.remove()?;
        debug!("session cleared");
        Ok(())
    }

    /// True while a session is present. Expiry is not consulted:
    /// an expired token still routes as signed-in and the server rejects it on
    /// the next privileged call.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// Coarse first-line gate: signed in with an embedded admin or employee role.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.current()
            .is_some_and(|session| session.has_role(ROLE_ADMIN) || session.has_role(ROLE_EMPLOYEE))
    }

    /// Embedded-claims role lookup.
    #[must_use]
    pub fn has_role(&self, name: &str) -> bool {
        self.current().is_some_and(|session| session.has_role(name))
    }
}
