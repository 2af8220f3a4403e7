//! Adaptive brute-force gate for the sign-in form. The counter lives as long as
//! the form is mounted and is never persisted: it is a coarse deterrent, not a
//! rate limiter. The server enforces the real limits.
//!
//! Once `attempts` reaches the server's threshold, a submission needs a
//! human-verification response that the server confirmed and the provider has
//! not expired since. Local rejections never reach `/auth`.

use super::{
    error::AuthError,
    types::{CaptchaPolicy, CaptchaVerification, Credentials},
};
use crate::app_lib::AuthApi;
use std::cell::{Cell, RefCell};
use tracing::{debug, info, warn};

/// Per-mount sign-in gate. All methods take `&self` so one instance can be
/// shared by the form's event handlers; no borrow is held across an await.
#[derive(Debug, Default)]
pub struct SignInGate {
    attempts: Cell<u32>,
    policy: Cell<CaptchaPolicy>,
    verification: RefCell<Option<CaptchaVerification>>,
}

impl SignInGate {
    #[must_use]
    pub fn new(policy: CaptchaPolicy) -> Self {
        Self {
            attempts: Cell::new(0),
            policy: Cell::new(policy),
            verification: RefCell::new(None),
        }
    }

    /// Creates the gate for a freshly mounted form, reading the policy from the
    /// server and falling back to the default threshold when that fails.
    pub async fn mount(api: &dyn AuthApi) -> Self {
        let policy = match api.captcha_threshold().await {
            Ok(max_failed_attempts) => CaptchaPolicy {
                max_failed_attempts,
            },
            Err(err) => {
                let fallback = CaptchaPolicy::default();
                warn!(
                    error = %err,
                    max_failed_attempts = fallback.max_failed_attempts,
                    "captcha policy unavailable; using fallback"
                );
                fallback
            }
        };
        Self::new(policy)
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts.get()
    }

    #[must_use]
    pub fn policy(&self) -> CaptchaPolicy {
        self.policy.get()
    }

    #[must_use]
    pub fn verification(&self) -> Option<CaptchaVerification> {
        self.verification.borrow().clone()
    }

    /// Whether the next submission must carry a confirmed challenge. The form
    /// shows the widget when this is true.
    #[must_use]
    pub fn challenge_required(&self) -> bool {
        self.attempts.get() >= self.policy.get().max_failed_attempts
    }

    /// Local pre-network validation of the next submission.
    ///
    /// # Errors
    /// `ChallengeExpired` when the provider expired the response,
    /// `ChallengeRequired` when there is no server-confirmed response.
    pub fn check_precondition(&self) -> Result<(), AuthError> {
        if !self.challenge_required() {
            return Ok(());
        }

        match self.verification.borrow().as_ref() {
            Some(verification) if verification.presented_and_expired => {
                Err(AuthError::ChallengeExpired)
            }
            Some(verification) if verification.server_confirmed => Ok(()),
            _ => Err(AuthError::ChallengeRequired),
        }
    }

    /// Handles the widget callback: `Some(response)` for a solved challenge,
    /// `None` when the provider reset or expired it. Returns whether the
    /// verification is now server-confirmed.
    pub async fn on_challenge_response(&self, api: &dyn AuthApi, human_key: Option<String>) -> bool {
        let Some(human_key) = human_key else {
            debug!("challenge expired or reset by provider");
            *self.verification.borrow_mut() = Some(CaptchaVerification::expired());
            return false;
        };

        *self.verification.borrow_mut() = Some(CaptchaVerification::presented(human_key.clone()));

        let confirmed = match api.verify_captcha(&human_key).await {
            Ok(confirmed) => confirmed,
            Err(err) => {
                warn!(error = %err, "challenge verification failed");
                false
            }
        };
        if !confirmed {
            debug!("challenge not confirmed by server");
            return false;
        }

        // The provider may have expired or replaced the response meanwhile.
        let mut slot = self.verification.borrow_mut();
        let applied = match slot.as_mut() {
            Some(verification) if verification.human_key.as_deref() == Some(human_key.as_str()) => {
                verification.server_confirmed = true;
                debug!("challenge confirmed by server");
                true
            }
            _ => {
                debug!("discarding confirmation for a superseded challenge");
                false
            }
        };
        applied
    }

    /// Submits `credentials` through the gate and returns the raw token.
    ///
    /// # Errors
    /// `ChallengeRequired`/`ChallengeExpired` without contacting the server,
    /// `AuthenticationFailure` when `/auth` rejects the credentials (the counter
    /// is incremented), or `Transport` when the server cannot be reached.
    pub async fn submit(&self, api: &dyn AuthApi, credentials: &Credentials) -> Result<String, AuthError> {
        if let Err(err) = self.check_precondition() {
            info!(attempts = self.attempts.get(), error = %err, "sign-in blocked locally");
            return Err(err);
        }

        match api.sign_in(credentials).await {
            Ok(token) => {
                info!(attempts = self.attempts.get(), "sign-in accepted");
                Ok(token)
            }
            Err(err) if err.is_rejection() => {
                let attempts = self.attempts.get().saturating_add(1);
                self.attempts.set(attempts);
                info!(
                    attempts,
                    challenge_required = self.challenge_required(),
                    "sign-in rejected"
                );
                Err(AuthError::AuthenticationFailure)
            }
            Err(err) => {
                warn!(error = %err, "sign-in request failed");
                Err(AuthError::Transport(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SignInGate;
    use crate::app_lib::AppError;
    use crate::features::auth::testing::ScriptedApi;
    use crate::features::auth::{AuthError, CaptchaPolicy, CaptchaVerification, Credentials};

    fn credentials() -> Credentials {
        Credentials::new("ana@example.test", "guess")
    }

    async fn fail_times(gate: &SignInGate, api: &ScriptedApi, times: u32) {
        for _ in 0..times {
            let result = gate.submit(api, &credentials()).await;
            assert_eq!(result, Err(AuthError::AuthenticationFailure));
        }
    }

    #[tokio::test]
    async fn mount_reads_threshold_or_falls_back_to_five() {
        let api = ScriptedApi::new().with_threshold(Ok(3));
        assert_eq!(SignInGate::mount(&api).await.policy().max_failed_attempts, 3);

        let unreachable = ScriptedApi::new();
        assert_eq!(
            SignInGate::mount(&unreachable).await.policy(),
            CaptchaPolicy::default()
        );
    }

    #[tokio::test]
    async fn sixth_attempt_without_challenge_is_blocked_locally() {
        let api = ScriptedApi::rejecting_sign_in();
        let gate = SignInGate::new(CaptchaPolicy::default());

        fail_times(&gate, &api, 5).await;
        assert_eq!(gate.attempts(), 5);
        assert!(gate.challenge_required());

        let result = gate.submit(&api, &credentials()).await;
        assert_eq!(result, Err(AuthError::ChallengeRequired));
        assert_eq!(api.sign_in_calls.get(), 5);
        assert_eq!(gate.attempts(), 5);
    }

    #[tokio::test]
    async fn confirmed_challenge_lets_sixth_attempt_through() {
        let api = ScriptedApi::rejecting_sign_in().with_captcha(Ok(true));
        let gate = SignInGate::new(CaptchaPolicy::default());
        fail_times(&gate, &api, 5).await;

        assert!(gate.on_challenge_response(&api, Some("human-1".to_string())).await);
        let result = gate.submit(&api, &credentials()).await;
        assert_eq!(result, Err(AuthError::AuthenticationFailure));
        assert_eq!(api.sign_in_calls.get(), 6);
        assert_eq!(gate.attempts(), 6);
    }

    #[tokio::test]
    async fn unconfirmed_challenge_still_blocks() {
        for verdict in [Ok(false), Err(AppError::Network("down".to_string()))] {
            let api = ScriptedApi::rejecting_sign_in().with_captcha(verdict);
            let gate = SignInGate::new(CaptchaPolicy {
                max_failed_attempts: 1,
            });
            fail_times(&gate, &api, 1).await;

            assert!(!gate.on_challenge_response(&api, Some("human-1".to_string())).await);
            assert_eq!(
                gate.submit(&api, &credentials()).await,
                Err(AuthError::ChallengeRequired)
            );
            assert_eq!(api.sign_in_calls.get(), 1);
        }
    }

    #[tokio::test]
    async fn expiry_after_confirmation_rejects_with_challenge_expired() {
        let api = ScriptedApi::rejecting_sign_in().with_captcha(Ok(true));
        let gate = SignInGate::new(CaptchaPolicy {
            max_failed_attempts: 2,
        });
        fail_times(&gate, &api, 2).await;

        assert!(gate.on_challenge_response(&api, Some("human-1".to_string())).await);
        assert!(!gate.on_challenge_response(&api, None).await);
        assert_eq!(gate.verification(), Some(CaptchaVerification::expired()));

        assert_eq!(
            gate.submit(&api, &credentials()).await,
            Err(AuthError::ChallengeExpired)
        );
        assert_eq!(api.sign_in_calls.get(), 2);
    }

    #[tokio::test]
    async fn successful_sign_in_returns_token_without_counting() {
        let api = ScriptedApi::new().with_sign_in(Ok("h.p.s".to_string()));
        let gate = SignInGate::new(CaptchaPolicy::default());

        assert_eq!(gate.submit(&api, &credentials()).await, Ok("h.p.s".to_string()));
        assert_eq!(gate.attempts(), 0);
    }

    #[tokio::test]
    async fn transport_failures_are_not_counted_as_guesses() {
        let api = ScriptedApi::new();
        let gate = SignInGate::new(CaptchaPolicy::default());

        let result = gate.submit(&api, &credentials()).await;
        assert!(matches!(result, Err(AuthError::Transport(AppError::Network(_)))));
        assert_eq!(gate.attempts(), 0);
    }

    #[tokio::test]
    async fn zero_threshold_requires_challenge_from_the_start() {
        let api = ScriptedApi::new().with_sign_in(Ok("h.p.s".to_string()));
        let gate = SignInGate::new(CaptchaPolicy {
            max_failed_attempts: 0,
        });

        assert_eq!(
            gate.submit(&api, &credentials()).await,
            Err(AuthError::ChallengeRequired)
        );
        assert_eq!(api.sign_in_calls.get(), 0);
    }
}
