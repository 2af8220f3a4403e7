//! Two-tier role resolution. The embedded tier reads the token's claims
//! synchronously. The remote tier asks the server, which also knows roles
//! inherited through groups, and doubles as a revocation channel: a response
//! carrying `signOutRequired` ends the session before the check resolves.
//!
//! The remote tier never raises: transport failures, bad statuses and bad
//! bodies all resolve as denied, and nothing is retried.

use super::{
    error::AuthError,
    navigation::{Navigator, SIGNIN_PATH},
    store::SessionStore,
    types::{PrivilegeResolution, SessionDescriptor, authority_for},
};
use crate::app_lib::{AppError, AuthApi};
use std::rc::Rc;
use tracing::{debug, error, warn};

/// What the server said about one capability, before policy is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RemoteVerdict {
    Granted,
    Denied,
    SignOutRequired,
}

/// Answers capability checks for the current session.
#[derive(Clone)]
pub struct RoleResolver {
    store: SessionStore,
    api: Rc<dyn AuthApi>,
    navigator: Rc<dyn Navigator>,
}

impl RoleResolver {
    #[must_use]
    pub fn new(store: SessionStore, api: Rc<dyn AuthApi>, navigator: Rc<dyn Navigator>) -> Self {
        Self {
            store,
            api,
            navigator,
        }
    }

    /// Embedded tier.
    #[must_use]
    pub fn has_embedded_role(&self, name: &str) -> bool {
        self.store.has_role(name)
    }

    /// Remote tier only, resolved to `Granted` or `Denied`.
    pub async fn has_remote_role(&self, name: &str) -> PrivilegeResolution {
        PrivilegeResolution::from(self.authorize_remote(&authority_for(name)).await)
    }

    /// Embedded tier first, remote tier as the fallback.
    pub async fn has_async_role(&self, name: &str) -> PrivilegeResolution {
        PrivilegeResolution::from(self.authorize(name).await)
    }

    /// Gate for privileged actions.
    ///
    /// # Errors
    /// Returns `AuthError::AuthorizationDenied` when neither tier grants the
    /// role (including when the server cannot be reached), and
    /// `AuthError::ForcedSignOut` when the server revoked the session.
    pub async fn authorize(&self, name: &str) -> Result<(), AuthError> {
        let authority = authority_for(name);
        if self.store.has_role(&authority) {
            debug!(authority = %authority, "role granted by embedded claims");
            return Ok(());
        }
        self.authorize_remote(&authority).await
    }

    async fn authorize_remote(&self, authority: &str) -> Result<(), AuthError> {
        let Some(session) = self.store.current() else {
            debug!(authority, "no session; remote role check skipped");
            return Err(AuthError::AuthorizationDenied);
        };

        match self.remote_verdict(&session, authority).await {
            Ok(RemoteVerdict::Granted) => {
                debug!(authority, "role granted by server");
                Ok(())
            }
            Ok(RemoteVerdict::Denied) => {
                debug!(authority, "role denied by server");
                Err(AuthError::AuthorizationDenied)
            }
            Ok(RemoteVerdict::SignOutRequired) => {
                self.force_sign_out();
                Err(AuthError::ForcedSignOut)
            }
            Err(err) => {
                warn!(authority, error = %err, "remote role check failed; denying");
                Err(AuthError::AuthorizationDenied)
            }
        }
    }

    async fn remote_verdict(
        &self,
        session: &SessionDescriptor,
        authority: &str,
    ) -> Result<RemoteVerdict, AppError> {
        let check = self
            .api
            .check_role(&session.authorization_header_value, authority)
            .await?;

        // Revocation wins over whatever `hasRole` says.
        Ok(if check.sign_out_required {
            RemoteVerdict::SignOutRequired
        } else if check.has_role {
            RemoteVerdict::Granted
        } else {
            RemoteVerdict::Denied
        })
    }

    fn force_sign_out(&self) {
        warn!("server required sign-out; ending session");
        if let Err(err) = self.store.clear() {
            error!(error = %err, "failed to clear session after forced sign-out");
        }
        self.navigator.navigate(SIGNIN_PATH);
    }
}

#[cfg(test)]
mod tests {
    use super::RoleResolver;
    use crate::app_lib::{AppError, RoleCheck};
    use crate::features::auth::navigation::RecordingNavigator;
    use crate::features::auth::repository::MemoryRepository;
    use crate::features::auth::testing::{ScriptedApi, token_for};
    use crate::features::auth::{
        AuthError, PrivilegeResolution, ROLE_ADMIN, ROLE_EMPLOYEE, SIGNIN_PATH, SessionStore,
        token,
    };
    use std::rc::Rc;

    struct Harness {
        store: SessionStore,
        api: Rc<ScriptedApi>,
        navigator: Rc<RecordingNavigator>,
        resolver: RoleResolver,
    }

    fn harness(api: ScriptedApi, roles: Option<&[&str]>) -> Result<Harness, AuthError> {
        let store = SessionStore::new(Rc::new(MemoryRepository::standalone()));
        if let Some(roles) = roles {
            store.save(&token::decode(&token_for("ana@example.test", roles, 2_000_000_000))?)?;
        }
        let api = Rc::new(api);
        let navigator = Rc::new(RecordingNavigator::new());
        let resolver = RoleResolver::new(store.clone(), api.clone(), navigator.clone());
        Ok(Harness {
            store,
            api,
            navigator,
            resolver,
        })
    }

    fn role_check(has_role: bool, sign_out_required: bool) -> Result<RoleCheck, AppError> {
        Ok(RoleCheck {
            has_role,
            sign_out_required,
        })
    }

    #[tokio::test]
    async fn embedded_role_short_circuits_remote_tier() -> Result<(), AuthError> {
        let h = harness(ScriptedApi::new(), Some(&[ROLE_ADMIN][..]))?;
        assert!(h.resolver.has_embedded_role("ADMIN"));
        assert_eq!(
            h.resolver.has_async_role(ROLE_ADMIN).await,
            PrivilegeResolution::Granted
        );
        assert_eq!(h.api.role_check_calls.get(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn remote_tier_grants_group_inherited_role() -> Result<(), AuthError> {
        let api = ScriptedApi::new().with_role_check(role_check(true, false));
        let h = harness(api, Some(&[ROLE_EMPLOYEE][..]))?;

        assert_eq!(
            h.resolver.has_async_role("ADMIN").await,
            PrivilegeResolution::Granted
        );
        assert_eq!(h.api.last_role_name.borrow().as_deref(), Some(ROLE_ADMIN));
        let expected_header = h.store.current().map(|s| s.authorization_header_value);
        assert_eq!(*h.api.last_authorization.borrow(), expected_header);
        Ok(())
    }

    #[tokio::test]
    async fn remote_denial_keeps_session() -> Result<(), AuthError> {
        let api = ScriptedApi::new().with_role_check(role_check(false, false));
        let h = harness(api, Some(&[ROLE_EMPLOYEE][..]))?;

        assert_eq!(
            h.resolver.authorize(ROLE_ADMIN).await,
            Err(AuthError::AuthorizationDenied)
        );
        assert!(h.store.is_authenticated());
        assert!(h.navigator.locations().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn sign_out_directive_wins_over_has_role() -> Result<(), AuthError> {
        for has_role in [true, false] {
            let api = ScriptedApi::new().with_role_check(role_check(has_role, true));
            let h = harness(api, Some(&[ROLE_EMPLOYEE][..]))?;

            assert_eq!(
                h.resolver.authorize(ROLE_ADMIN).await,
                Err(AuthError::ForcedSignOut)
            );
            assert_eq!(h.store.current(), None);
            assert_eq!(h.navigator.last_location().as_deref(), Some(SIGNIN_PATH));
        }
        Ok(())
    }

    #[tokio::test]
    async fn transport_and_server_failures_resolve_denied() -> Result<(), AuthError> {
        let failures = [
            AppError::Network("connection refused".to_string()),
            AppError::Timeout("Request timed out.".to_string()),
            AppError::Http {
                status: 503,
                message: "unavailable".to_string(),
            },
            AppError::Parse("Failed to decode response".to_string()),
        ];
        for failure in failures {
            let api = ScriptedApi::new().with_role_check(Err(failure));
            let h = harness(api, Some(&[ROLE_EMPLOYEE][..]))?;

            assert_eq!(
                h.resolver.has_remote_role(ROLE_ADMIN).await,
                PrivilegeResolution::Denied
            );
            assert!(h.store.is_authenticated());
            assert_eq!(h.api.role_check_calls.get(), 1);
        }
        Ok(())
    }

    #[tokio::test]
    async fn no_session_denies_without_network() -> Result<(), AuthError> {
        let api = ScriptedApi::new().with_role_check(role_check(true, false));
        let h = harness(api, None)?;

        assert_eq!(
            h.resolver.has_async_role(ROLE_ADMIN).await,
            PrivilegeResolution::Denied
        );
        assert_eq!(h.api.role_check_calls.get(), 0);
        Ok(())
    }
}
