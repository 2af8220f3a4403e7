//! Leptos bindings for the auth core. `AuthProvider` owns the tab's
//! [`AuthService`] and installs the cross-tab listener; the guard components
//! evaluate their route requirement and render children, the not-permitted
//! view, nothing, or a router redirect.
//!
//! UX-only guards; real access control must live on the API.

use super::{
    guards::{self, GuardDecision, GuardInput, ResolutionTracker, RouteRequirement},
    navigation::HOME_PATH,
    service::AuthService,
    types::PrivilegeResolution,
};
use leptos::{prelude::*, task::spawn_local};
use leptos_router::{
    components::{A, Redirect},
    hooks::use_location,
};
use tracing::debug;

/// Auth context shared through Leptos.
#[derive(Clone, Copy)]
pub struct AuthContext {
    service: StoredValue<AuthService, LocalStorage>,
    /// Bumped whenever this tab changes the session, so guards re-evaluate.
    pub revision: RwSignal<u64>,
}

impl AuthContext {
    #[must_use]
    pub fn service(&self) -> AuthService {
        self.service.get_value()
    }

    /// Signals that the session slot changed in this tab.
    pub fn session_changed(&self) {
        self.revision.update(|revision| *revision = revision.wrapping_add(1));
    }

    fn evaluate(
        &self,
        requirement: &RouteRequirement,
        privilege: PrivilegeResolution,
        intended: &str,
    ) -> GuardDecision {
        self.revision.track();
        self.service
            .with_value(|service| service.evaluate(requirement, privilege, intended))
    }
}

/// Provides the auth context and registers the cross-tab reload listener.
#[component]
pub fn AuthProvider(service: AuthService, children: Children) -> impl IntoView {
    service.install_cross_tab_listener();
    provide_context(AuthContext {
        service: StoredValue::new_local(service),
        revision: RwSignal::new(0),
    });

    view! { {children()} }
}

/// Returns the auth context, if an `AuthProvider` is mounted above.
pub fn use_auth() -> Option<AuthContext> {
    use_context::<AuthContext>()
}

fn render_decision(decision: GuardDecision, children: &ChildrenFn) -> AnyView {
    match decision {
        GuardDecision::Render => children(),
        GuardDecision::RenderUnauthorized => view! { <UnauthorizedPage /> }.into_any(),
        GuardDecision::RenderNothing => ().into_any(),
        GuardDecision::Redirect { location } => view! { <Redirect path=location /> }.into_any(),
    }
}

fn guarded<P>(requirement: RouteRequirement, privilege: P, children: ChildrenFn) -> impl IntoView
where
    P: Fn() -> PrivilegeResolution + Send + Sync + 'static,
{
    let auth = use_auth();
    let location = use_location();

    move || {
        let intended = location.pathname.get();
        let decision = match auth {
            Some(auth) => auth.evaluate(&requirement, privilege(), &intended),
            // Without a provider there is no session to trust.
            None => guards::evaluate(&requirement, &GuardInput::signed_out(), &intended),
        };
        render_decision(decision, &children)
    }
}

/// Renders children only for signed-out users, e.g. the sign-in page.
#[component]
pub fn PublicOnlyGuard(children: ChildrenFn) -> impl IntoView {
    guarded(
        RouteRequirement::PublicOnly,
        || PrivilegeResolution::Pending,
        children,
    )
}

/// Renders children for any session, or only for admin/employee sessions
/// when `coarse_role` is set.
#[component]
pub fn AuthenticatedGuard(
    #[prop(optional)] coarse_role: bool,
    children: ChildrenFn,
) -> impl IntoView {
    let requirement = if coarse_role {
        RouteRequirement::CoarseRole
    } else {
        RouteRequirement::Authenticated
    };
    guarded(requirement, || PrivilegeResolution::Pending, children)
}

/// Renders children once the server confirms `authority` for the session.
/// Nothing is rendered while the check is pending.
#[component]
pub fn AsyncPrivilegeGuard(#[prop(into)] authority: String, children: ChildrenFn) -> impl IntoView {
    let auth = use_auth();
    let tracker = StoredValue::new_local(ResolutionTracker::new());
    let resolution = RwSignal::new(PrivilegeResolution::Pending);
    let requirement = RouteRequirement::Capability(authority.clone());

    Effect::new(move |_| {
        let Some(auth) = auth else {
            return;
        };
        auth.revision.track();

        let Some(ticket) = tracker.try_with_value(ResolutionTracker::begin) else {
            return;
        };
        resolution.set(PrivilegeResolution::Pending);

        let service = auth.service();
        let authority = authority.clone();
        spawn_local(async move {
            let resolved = service.has_async_role(&authority).await;
            let applied = tracker
                .try_with_value(|tracker| tracker.settle(ticket, resolved))
                .unwrap_or(false);
            if applied {
                let _ = resolution.try_set(resolved);
            } else {
                debug!(authority = %authority, "privilege resolution superseded or torn down");
            }
        });
    });

    on_cleanup(move || {
        tracker.try_with_value(ResolutionTracker::cancel);
    });

    guarded(requirement, move || resolution.get(), children)
}

/// Not-permitted view for signed-in users that lack the route's role.
#[component]
pub fn UnauthorizedPage() -> impl IntoView {
    view! {
        <div class="flex flex-col items-center justify-center min-h-[50vh] text-center px-4">
            <h1 class="text-2xl font-bold text-gray-900 dark:text-white">"Not permitted"</h1>
            <p class="mt-4 text-gray-500 dark:text-gray-400 max-w-sm mx-auto">
                "Your account does not have access to this page."
            </p>
            <A
                href=HOME_PATH
                {..}
                class="mt-6 inline-flex items-center px-5 py-2.5 text-sm font-medium text-white bg-blue-700 rounded-lg hover:bg-blue-800"
            >
                "Go Home"
            </A>
        </div>
    }
}
