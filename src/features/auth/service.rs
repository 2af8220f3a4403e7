//! The surface the rest of the console uses: session queries, role checks,
//! sign-in through the gate, sign-out, and guard snapshots.

use super::{
    error::AuthError,
    gate::SignInGate,
    guards::{GuardDecision, GuardInput, RouteRequirement, evaluate},
    listener,
    navigation::{Navigator, SIGNIN_PATH},
    repository::SessionRepository,
    roles::RoleResolver,
    store::SessionStore,
    token,
    types::{Credentials, PrivilegeResolution, SessionDescriptor},
};
use crate::app_lib::AuthApi;
use std::rc::Rc;
use tracing::info;

/// Auth core wired to one tab's repository, API client and navigator.
#[derive(Clone)]
pub struct AuthService {
    store: SessionStore,
    resolver: RoleResolver,
    api: Rc<dyn AuthApi>,
    navigator: Rc<dyn Navigator>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        repository: Rc<dyn SessionRepository>,
        api: Rc<dyn AuthApi>,
        navigator: Rc<dyn Navigator>,
    ) -> Self {
        let store = SessionStore::new(repository);
        let resolver = RoleResolver::new(store.clone(), Rc::clone(&api), Rc::clone(&navigator));
        Self {
            store,
            resolver,
            api,
            navigator,
        }
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    #[must_use]
    pub fn resolver(&self) -> &RoleResolver {
        &self.resolver
    }

    /// Reloads this tab whenever another tab changes the session slot.
    pub fn install_cross_tab_listener(&self) {
        listener::install(self.store.repository().as_ref(), Rc::clone(&self.navigator));
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.store.is_authorized()
    }

    #[must_use]
    pub fn has_role(&self, name: &str) -> bool {
        self.resolver.has_embedded_role(name)
    }

    pub async fn has_async_role(&self, name: &str) -> PrivilegeResolution {
        self.resolver.has_async_role(name).await
    }

    /// Gate for privileged actions; see [`RoleResolver::authorize`].
    ///
    /// # Errors
    /// `AuthorizationDenied` or `ForcedSignOut`.
    pub async fn authorize(&self, name: &str) -> Result<(), AuthError> {
        self.resolver.authorize(name).await
    }

    /// Builds the gate for a newly mounted sign-in form.
    pub async fn mount_gate(&self) -> SignInGate {
        SignInGate::mount(self.api.as_ref()).await
    }

    /// Forwards a widget callback to `gate`; see [`SignInGate::on_challenge_response`].
    pub async fn on_challenge_response(&self, gate: &SignInGate, human_key: Option<String>) -> bool {
        gate.on_challenge_response(self.api.as_ref(), human_key).await
    }

    /// Signs in through `gate`, then decodes and persists the returned token.
    ///
    /// # Errors
    /// Gate errors (`ChallengeRequired`, `ChallengeExpired`,
    /// `AuthenticationFailure`, `Transport`), `MalformedToken` if the server's
    /// token cannot be decoded, or `Storage` if it cannot be persisted.
    pub async fn signin(
        &self,
        gate: &SignInGate,
        credentials: &Credentials,
    ) -> Result<SessionDescriptor, AuthError> {
        let raw_token = gate.submit(self.api.as_ref(), credentials).await?;
        let descriptor = token::decode(&raw_token)?;
        self.store.save(&descriptor)?;
        info!(roles = descriptor.roles.len(), "session established");
        Ok(descriptor)
    }

    /// Ends the session and returns to the sign-in view.
    ///
    /// # Errors
    /// Returns `AuthError::Storage` if the slot cannot be cleared.
    pub fn signout(&self) -> Result<(), AuthError> {
        self.store.clear()?;
        info!("signed out");
        self.navigator.navigate(SIGNIN_PATH);
        Ok(())
    }

    /// Snapshot of the session for guard evaluation.
    #[must_use]
    pub fn guard_input(&self, privilege: PrivilegeResolution) -> GuardInput {
        GuardInput::from_store(&self.store, privilege)
    }

    /// Evaluates `requirement` against the current session.
    #[must_use]
    pub fn evaluate(
        &self,
        requirement: &RouteRequirement,
        privilege: PrivilegeResolution,
        intended: &str,
    ) -> GuardDecision {
        evaluate(requirement, &self.guard_input(privilege), intended)
    }
}
