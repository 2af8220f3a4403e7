//! Test doubles for the auth core.

use crate::app_lib::{ApiFuture, AppError, AuthApi, RoleCheck};
use crate::features::auth::types::Credentials;
use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};

/// Builds an unsigned token around `claims`.
pub(crate) fn token_with(claims: &Value) -> String {
    let header = Base64UrlUnpadded::encode_string(json!({ "alg": "HS256" }).to_string().as_bytes());
    let payload = Base64UrlUnpadded::encode_string(claims.to_string().as_bytes());
    format!("{header}.{payload}.signature")
}

/// Token for `subject` holding `roles`, expiring at `exp` (epoch seconds).
pub(crate) fn token_for(subject: &str, roles: &[&str], exp: i64) -> String {
    let roles: Vec<Value> = roles
        .iter()
        .map(|role| json!({ "authority": role }))
        .collect();
    token_with(&json!({ "sub": subject, "roles": roles, "exp": exp }))
}

fn unreachable_server() -> AppError {
    AppError::Network("Unable to reach the server: connection refused".to_string())
}

/// Scripted `AuthApi` that counts calls. Unscripted endpoints fail as if the
/// server were unreachable.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    pub(crate) sign_in_result: RefCell<Option<Result<String, AppError>>>,
    pub(crate) role_check_result: RefCell<Option<Result<RoleCheck, AppError>>>,
    pub(crate) captcha_result: RefCell<Option<Result<bool, AppError>>>,
    pub(crate) threshold_result: RefCell<Option<Result<u32, AppError>>>,
    pub(crate) sign_in_calls: Cell<u32>,
    pub(crate) role_check_calls: Cell<u32>,
    pub(crate) captcha_calls: Cell<u32>,
    pub(crate) last_authorization: RefCell<Option<String>>,
    pub(crate) last_role_name: RefCell<Option<String>>,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_sign_in(self, result: Result<String, AppError>) -> Self {
        *self.sign_in_result.borrow_mut() = Some(result);
        self
    }

    pub(crate) fn with_role_check(self, result: Result<RoleCheck, AppError>) -> Self {
        *self.role_check_result.borrow_mut() = Some(result);
        self
    }

    pub(crate) fn with_captcha(self, result: Result<bool, AppError>) -> Self {
        *self.captcha_result.borrow_mut() = Some(result);
        self
    }

    pub(crate) fn with_threshold(self, result: Result<u32, AppError>) -> Self {
        *self.threshold_result.borrow_mut() = Some(result);
        self
    }

    pub(crate) fn rejecting_sign_in() -> Self {
        Self::new().with_sign_in(Err(AppError::Http {
            status: 401,
            message: "Bad credentials".to_string(),
        }))
    }
}

impl AuthApi for ScriptedApi {
    fn sign_in<'a>(&'a self, _credentials: &'a Credentials) -> ApiFuture<'a, String> {
        self.sign_in_calls.set(self.sign_in_calls.get() + 1);
        let result = self
            .sign_in_result
            .borrow()
            .clone()
            .unwrap_or_else(|| Err(unreachable_server()));
        Box::pin(async move { result })
    }

    fn check_role<'a>(
        &'a self,
        authorization: &'a str,
        role_name: &'a str,
    ) -> ApiFuture<'a, RoleCheck> {
        self.role_check_calls.set(self.role_check_calls.get() + 1);
        *self.last_authorization.borrow_mut() = Some(authorization.to_string());
        *self.last_role_name.borrow_mut() = Some(role_name.to_string());
        let result = self
            .role_check_result
            .borrow()
            .clone()
            .unwrap_or_else(|| Err(unreachable_server()));
        Box::pin(async move { result })
    }

    fn verify_captcha<'a>(&'a self, _human_key: &'a str) -> ApiFuture<'a, bool> {
        self.captcha_calls.set(self.captcha_calls.get() + 1);
        let result = self
            .captcha_result
            .borrow()
            .clone()
            .unwrap_or_else(|| Err(unreachable_server()));
        Box::pin(async move { result })
    }

    fn captcha_threshold(&self) -> ApiFuture<'_, u32> {
        let result = self
            .threshold_result
            .borrow()
            .clone()
            .unwrap_or_else(|| Err(unreachable_server()));
        Box::pin(async move { result })
    }
}
