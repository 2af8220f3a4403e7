//! Auth feature covering session persistence, role resolution, route guards and
//! the adaptive sign-in gate. It keeps authorization decisions out of view code
//! and must stay aligned with the server's contract: the server issues tokens,
//! owns role membership and is the final word on expired or revoked sessions.
//! This module touches security boundaries and must avoid logging passwords,
//! raw tokens or challenge responses.
//!
//! Flow Overview: the sign-in gate checks its challenge precondition and posts
//! credentials; the returned token is decoded and saved as the single session
//! slot; guards re-evaluate from the store and, for fine-grained capabilities,
//! from the server's group-aware role probe. A probe answered with
//! `signOutRequired` clears the slot and sends the tab back to sign-in. Changes
//! to the slot made by another tab reload this one.

pub mod error;
pub mod gate;
pub mod guards;
pub mod listener;
pub mod navigation;
pub mod repository;
pub mod roles;
pub mod service;
pub mod store;
pub mod token;
pub mod types;

#[cfg(target_arch = "wasm32")]
pub mod browser;
#[cfg(target_arch = "wasm32")]
pub mod components;

#[cfg(test)]
pub(crate) mod testing;

pub use error::AuthError;
pub use gate::SignInGate;
pub use guards::{GuardDecision, GuardInput, ResolutionTracker, RouteRequirement, evaluate};
pub use navigation::{HOME_PATH, Navigator, SIGNIN_PATH};
pub use repository::SessionRepository;
pub use roles::RoleResolver;
pub use service::AuthService;
pub use store::SessionStore;
pub use types::{
    CaptchaPolicy, CaptchaVerification, Credentials, PrivilegeResolution, ROLE_ADMIN,
    ROLE_EMPLOYEE, RoleClaim, SessionDescriptor,
};
