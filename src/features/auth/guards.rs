//! Route access decisions. [`evaluate`] is a pure function of the route's
//! requirement and a snapshot of the session; the Leptos guard components (and
//! any other host) render whatever it returns.
//!
//! UX-only: real access control lives on the API. The guards exist so that
//! users are not shown screens whose every call would be rejected, and so that
//! protected content never flashes while an async check is pending.

use super::{
    navigation::{HOME_PATH, signin_location},
    store::SessionStore,
    types::PrivilegeResolution,
};
use std::cell::Cell;
use tracing::debug;

/// What a route asks of the current session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteRequirement {
    /// Only for signed-out users, e.g. the sign-in page.
    PublicOnly,
    /// Any session.
    Authenticated,
    /// A session with an embedded admin or employee role.
    CoarseRole,
    /// A session whose capability is confirmed by the async role check.
    Capability(String),
}

/// Session snapshot consumed by [`evaluate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GuardInput {
    pub session_present: bool,
    pub coarse_authorized: bool,
    pub privilege: PrivilegeResolution,
}

impl GuardInput {
    /// Snapshot with no session at all.
    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            session_present: false,
            coarse_authorized: false,
            privilege: PrivilegeResolution::Denied,
        }
    }

    /// Snapshot of `store`, paired with the privilege resolved for this evaluation.
    #[must_use]
    pub fn from_store(store: &SessionStore, privilege: PrivilegeResolution) -> Self {
        Self {
            session_present: store.is_authenticated(),
            coarse_authorized: store.is_authorized(),
            privilege,
        }
    }
}

/// What the view layer must do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    RenderUnauthorized,
    /// Render nothing until the pending check settles.
    RenderNothing,
    Redirect { location: String },
}

impl GuardDecision {
    fn redirect_home() -> Self {
        Self::Redirect {
            location: HOME_PATH.to_string(),
        }
    }

    fn redirect_signin(intended: &str) -> Self {
        Self::Redirect {
            location: signin_location(intended),
        }
    }
}

/// Decides how to treat a navigation to `intended` under `requirement`.
#[must_use]
pub fn evaluate(requirement: &RouteRequirement, input: &GuardInput, intended: &str) -> GuardDecision {
    let decision = match requirement {
        RouteRequirement::PublicOnly => {
            if input.session_present {
                GuardDecision::redirect_home()
            } else {
                GuardDecision::Render
            }
        }
        RouteRequirement::Authenticated => {
            if input.session_present {
                GuardDecision::Render
            } else {
                GuardDecision::redirect_signin(intended)
            }
        }
        RouteRequirement::CoarseRole => match (input.session_present, input.coarse_authorized) {
            (false, _) => GuardDecision::redirect_signin(intended),
            (true, false) => GuardDecision::RenderUnauthorized,
            (true, true) => GuardDecision::Render,
        },
        RouteRequirement::Capability(_) => {
            if !input.session_present || !input.coarse_authorized {
                GuardDecision::redirect_signin(intended)
            } else {
                match input.privilege {
                    PrivilegeResolution::Granted => GuardDecision::Render,
                    PrivilegeResolution::Pending => GuardDecision::RenderNothing,
                    PrivilegeResolution::Denied => GuardDecision::RenderUnauthorized,
                }
            }
        }
    };

    debug!(?requirement, ?decision, "route guard evaluated");
    decision
}

/// Identifies one async evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvaluationTicket(u64);

/// Tracks the async privilege evaluation of one mounted guard. Only the most
/// recent evaluation may settle the state, and nothing settles after the view
/// is torn down.
#[derive(Debug, Default)]
pub struct ResolutionTracker {
    generation: Cell<u64>,
    state: Cell<PrivilegeResolution>,
    detached: Cell<bool>,
}

impl ResolutionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new evaluation; the state goes back to `Pending` and every
    /// earlier ticket becomes stale.
    pub fn begin(&self) -> EvaluationTicket {
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);
        self.state.set(PrivilegeResolution::Pending);
        EvaluationTicket(generation)
    }

    /// Applies `resolution` if `ticket` is still current. Returns whether it was applied.
    pub fn settle(&self, ticket: EvaluationTicket, resolution: PrivilegeResolution) -> bool {
        if self.detached.get() || ticket.0 != self.generation.get() {
            debug!(?resolution, "discarding stale privilege resolution");
            return false;
        }
        self.state.set(resolution);
        true
    }

    /// Marks the owning view as gone.
    pub fn cancel(&self) {
        self.detached.set(true);
    }

    #[must_use]
    pub fn state(&self) -> PrivilegeResolution {
        self.state.get()
    }
}
