//! Bearer token decoding. The token is a `header.payload.signature` string with
//! a base64url JSON payload; only the payload is read. No signature check is
//! performed here: the server issued the token over a secure transport and
//! rejects anything it did not sign.

use super::{
    error::AuthError,
    types::{RoleClaim, SessionDescriptor},
};
use base64ct::{Base64UrlUnpadded, Encoding};
use serde::Deserialize;

#[derive(Deserialize)]
struct Claims {
    sub: Option<String>,
    #[serde(default, alias = "authorities")]
    roles: Vec<ClaimedRole>,
    exp: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClaimedRole {
    Object { authority: String },
    Bare(String),
}

impl ClaimedRole {
    fn into_claim(self) -> Option<RoleClaim> {
        let authority = match self {
            ClaimedRole::Object { authority } | ClaimedRole::Bare(authority) => authority,
        };
        let authority = authority.trim();
        (!authority.is_empty()).then(|| RoleClaim::new(authority))
    }
}

fn malformed(reason: impl Into<String>) -> AuthError {
    AuthError::MalformedToken(reason.into())
}

/// Decodes a raw bearer token into a session descriptor.
///
/// # Errors
/// Returns `AuthError::MalformedToken` when the token does not have three
/// segments, the payload is not base64url JSON, or `sub`/`exp` are missing.
pub fn decode(raw_token: &str) -> Result<SessionDescriptor, AuthError> {
    let raw_token = raw_token.trim();
    let mut parts = raw_token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed("expected three dot-separated segments"));
    };

    let bytes = Base64UrlUnpadded::decode_vec(payload.trim_end_matches('='))
        .map_err(|_| malformed("payload is not base64url"))?;
    let claims: Claims = serde_json::from_slice(&bytes)
        .map_err(|err| malformed(format!("payload is not a claim set: {err}")))?;

    let subject = claims
        .sub
        .map(|sub| sub.trim().to_string())
        .filter(|sub| !sub.is_empty())
        .ok_or_else(|| malformed("missing subject"))?;
    let expires_at_epoch_ms = claims
        .exp
        .ok_or_else(|| malformed("missing expiry"))?
        .checked_mul(1000)
        .ok_or_else(|| malformed("expiry out of range"))?;
    let roles = claims
        .roles
        .into_iter()
        .filter_map(ClaimedRole::into_claim)
        .collect();

    Ok(SessionDescriptor {
        raw_token: raw_token.to_string(),
        authorization_header_value: format!("Bearer {raw_token}"),
        subject,
        roles,
        expires_at_epoch_ms,
    })
}
