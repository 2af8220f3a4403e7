//! Data model shared by the auth core: the persisted session descriptor, role
//! claims, the tri-state privilege resolution and the sign-in gate's captcha
//! state.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Full administrative access.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
/// Regular console staff.
pub const ROLE_EMPLOYEE: &str = "ROLE_EMPLOYEE";

const ROLE_PREFIX: &str = "ROLE_";

/// Failed sign-ins tolerated before a challenge is required when the server
/// setting cannot be read.
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;

/// Normalizes a role name to its authority form, so `ADMIN` and `ROLE_ADMIN`
/// name the same capability.
#[must_use]
pub fn authority_for(name: &str) -> String {
    let name = name.trim();
    if name.starts_with(ROLE_PREFIX) {
        name.to_string()
    } else {
        format!("{ROLE_PREFIX}{name}")
    }
}

/// A role embedded in the token. Embedded roles are a lower bound: roles
/// inherited through groups are only known to the server.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleClaim {
    pub authority: String,
}

impl RoleClaim {
    #[must_use]
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
        }
    }
}

/// The single active session, as persisted in the session slot.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptor {
    pub raw_token: String,
    pub authorization_header_value: String,
    pub subject: String,
    pub roles: BTreeSet<RoleClaim>,
    pub expires_at_epoch_ms: i64,
}

impl SessionDescriptor {
    /// Embedded-claims lookup; accepts short (`ADMIN`) or full (`ROLE_ADMIN`) names.
    #[must_use]
    pub fn has_role(&self, name: &str) -> bool {
        let authority = authority_for(name);
        self.roles.iter().any(|role| role.authority == authority)
    }

    #[must_use]
    pub fn is_expired_at(&self, now_epoch_ms: i64) -> bool {
        now_epoch_ms > self.expires_at_epoch_ms
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_epoch_ms())
    }
}

// Token material stays out of logs and panics.
impl fmt::Debug for SessionDescriptor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionDescriptor")
            .field("raw_token", &"[REDACTED]")
            .field("authorization_header_value", &"[REDACTED]")
            .field("subject", &self.subject)
            .field("roles", &self.roles)
            .field("expires_at_epoch_ms", &self.expires_at_epoch_ms)
            .finish()
    }
}

/// Outcome of one privilege evaluation. Never cached across checks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PrivilegeResolution {
    #[default]
    Pending,
    Granted,
    Denied,
}

impl PrivilegeResolution {
    #[must_use]
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

impl<E> From<Result<(), E>> for PrivilegeResolution {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::Granted,
            Err(_) => Self::Denied,
        }
    }
}

/// Server-provided sign-in policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptchaPolicy {
    pub max_failed_attempts: u32,
}

impl Default for CaptchaPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
        }
    }
}

/// State of the human-verification challenge for the current sign-in form.
#[derive(Clone, PartialEq, Eq)]
pub struct CaptchaVerification {
    pub human_key: Option<String>,
    pub server_confirmed: bool,
    pub presented_and_expired: bool,
}

impl CaptchaVerification {
    /// A fresh response from the widget, not yet confirmed by the server.
    #[must_use]
    pub fn presented(human_key: impl Into<String>) -> Self {
        Self {
            human_key: Some(human_key.into()),
            server_confirmed: false,
            presented_and_expired: false,
        }
    }

    /// The provider reset or expired the challenge.
    #[must_use]
    pub fn expired() -> Self {
        Self {
            human_key: None,
            server_confirmed: false,
            presented_and_expired: true,
        }
    }
}

impl fmt::Debug for CaptchaVerification {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CaptchaVerification")
            .field("human_key", &self.human_key.as_ref().map(|_| "[REDACTED]"))
            .field("server_confirmed", &self.server_confirmed)
            .field("presented_and_expired", &self.presented_and_expired)
            .finish()
    }
}

/// Sign-in form input.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Milliseconds since the Unix epoch from the host clock.
#[cfg(target_arch = "wasm32")]
#[must_use]
pub fn now_epoch_ms() -> i64 {
    #[allow(clippy::cast_possible_truncation)]
    let now = js_sys::Date::now() as i64;
    now
}

/// Milliseconds since the Unix epoch from the host clock.
#[cfg(not(target_arch = "wasm32"))]
#[must_use]
pub fn now_epoch_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|elapsed| i64::try_from(elapsed.as_millis()).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(roles: &[&str], expires_at_epoch_ms: i64) -> SessionDescriptor {
        SessionDescriptor {
            raw_token: "h.p.s".to_string(),
            authorization_header_value: "Bearer h.p.s".to_string(),
            subject: "ana@example.test".to_string(),
            roles: roles.iter().map(|role| RoleClaim::new(*role)).collect(),
            expires_at_epoch_ms,
        }
    }

    #[test]
    fn authority_for_adds_prefix_once() {
        assert_eq!(authority_for("ADMIN"), ROLE_ADMIN);
        assert_eq!(authority_for("ROLE_ADMIN"), ROLE_ADMIN);
        assert_eq!(authority_for(" EMPLOYEE "), ROLE_EMPLOYEE);
    }

    #[test]
    fn has_role_matches_short_and_full_names() {
        let session = descriptor(&[ROLE_EMPLOYEE], 0);
        assert!(session.has_role("EMPLOYEE"));
        assert!(session.has_role(ROLE_EMPLOYEE));
        assert!(!session.has_role("ADMIN"));
    }

    #[test]
    fn expiry_is_strictly_after_deadline() {
        let session = descriptor(&[], 1_000);
        assert!(!session.is_expired_at(1_000));
        assert!(session.is_expired_at(1_001));
    }

    #[test]
    fn debug_redacts_token_material() {
        let rendered = format!("{:?}", descriptor(&[ROLE_ADMIN], 0));
        assert!(!rendered.contains("h.p.s"));
        assert!(rendered.contains("ana@example.test"));

        let verification = CaptchaVerification::presented("human-secret");
        assert!(!format!("{verification:?}").contains("human-secret"));
    }

    #[test]
    fn privilege_resolution_from_result() {
        assert_eq!(
            PrivilegeResolution::from(Ok::<(), ()>(())),
            PrivilegeResolution::Granted
        );
        assert_eq!(
            PrivilegeResolution::from(Err::<(), _>("nope")),
            PrivilegeResolution::Denied
        );
        assert_eq!(PrivilegeResolution::default(), PrivilegeResolution::Pending);
    }

    #[test]
    fn default_policy_is_five_attempts() {
        assert_eq!(CaptchaPolicy::default().max_failed_attempts, 5);
    }
}
