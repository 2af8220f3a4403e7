use crate::app_lib::AppError;
use thiserror::Error;

/// Failures surfaced by the auth core. Messages are user-facing; none of them
/// reveal whether an account exists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("malformed session token: {0}")]
    MalformedToken(String),
    #[error("Incorrect email or password.")]
    AuthenticationFailure,
    #[error("You are not permitted to perform this action.")]
    AuthorizationDenied,
    #[error("Your session was ended by the server. Please sign in again.")]
    ForcedSignOut,
    #[error("Please complete the verification challenge before signing in.")]
    ChallengeRequired,
    #[error("The verification challenge expired. Please complete it again.")]
    ChallengeExpired,
    #[error("session storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Transport(#[from] AppError),
}
