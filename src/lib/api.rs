//! HTTP client for the console endpoints the auth core depends on. Feature code
//! talks to the [`AuthApi`] trait so the resolver and the sign-in gate can be
//! driven by a scripted API in tests; [`HttpAuthApi`] is the `reqwest` backed
//! implementation (fetch in the browser, rustls natively). No client-side
//! timeout is applied on purpose: the transport's own behavior decides, and
//! callers never retry.

use super::{config::AppConfig, errors::AppError};
use crate::features::auth::types::Credentials;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use std::{future::Future, pin::Pin};
use tracing::{Instrument, debug, info_span};
use url::form_urlencoded;

/// Sign-in endpoint returning `{ token }`.
pub const SIGN_IN_PATH: &str = "/auth";
/// Group-aware role probe.
pub const ROLE_CHECK_PATH: &str = "/users/roles/checking";
/// Human-verification confirmation.
pub const CAPTCHA_VERIFY_PATH: &str = "/captcha/verify";

/// Maximum number of error body characters surfaced to the UI.
const MAX_ERROR_CHARS: usize = 200;

#[cfg(not(target_arch = "wasm32"))]
const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Boxed future returned by [`AuthApi`] calls. Not `Send`: the browser event
/// loop is single threaded and so is every consumer of this trait.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AppError>> + 'a>>;

/// Answer of the role probe. Both flags are independent.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleCheck {
    pub has_role: bool,
    #[serde(default)]
    pub sign_out_required: bool,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Deserialize)]
struct CaptchaResponse {
    success: bool,
}

/// Remote collaborators of the auth core.
pub trait AuthApi {
    /// Submits credentials and returns the raw bearer token.
    fn sign_in<'a>(&'a self, credentials: &'a Credentials) -> ApiFuture<'a, String>;

    /// Asks the server whether the session behind `authorization` holds
    /// `role_name`, including roles inherited through groups.
    fn check_role<'a>(&'a self, authorization: &'a str, role_name: &'a str)
    -> ApiFuture<'a, RoleCheck>;

    /// Confirms a challenge response with the server.
    fn verify_captcha<'a>(&'a self, human_key: &'a str) -> ApiFuture<'a, bool>;

    /// Reads the number of failed sign-ins tolerated before a challenge is required.
    fn captcha_threshold(&self) -> ApiFuture<'_, u32>;
}

/// `reqwest` implementation of [`AuthApi`].
#[derive(Clone, Debug)]
pub struct HttpAuthApi {
    client: Client,
    base_url: String,
    captcha_threshold_path: String,
}

impl HttpAuthApi {
    /// Builds a client for the API described by `config`.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the underlying HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client()?,
            base_url: config.api_base_url.clone(),
            captcha_threshold_path: config.captcha_threshold_path.clone(),
        })
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> String {
        build_url_with_base(&self.base_url, path, query)
    }
}

impl AuthApi for HttpAuthApi {
    fn sign_in<'a>(&'a self, credentials: &'a Credentials) -> ApiFuture<'a, String> {
        Box::pin(async move {
            let url = self.url(SIGN_IN_PATH, &[]);
            let payload = json!({
                "email": credentials.email,
                "password": credentials.password.expose_secret(),
            });
            let request = self.client.post(&url).json(&payload);
            let response: TokenResponse = send_json(request, "POST", SIGN_IN_PATH).await?;
            Ok(response.token)
        })
    }

    fn check_role<'a>(
        &'a self,
        authorization: &'a str,
        role_name: &'a str,
    ) -> ApiFuture<'a, RoleCheck> {
        Box::pin(async move {
            let url = self.url(ROLE_CHECK_PATH, &[("roleName", role_name)]);
            let request = self.client.get(&url).header("Authorization", authorization);
            send_json(request, "GET", ROLE_CHECK_PATH).await
        })
    }

    fn verify_captcha<'a>(&'a self, human_key: &'a str) -> ApiFuture<'a, bool> {
        Box::pin(async move {
            let url = self.url(CAPTCHA_VERIFY_PATH, &[("humanKey", human_key)]);
            let response: CaptchaResponse =
                send_json(self.client.get(&url), "GET", CAPTCHA_VERIFY_PATH).await?;
            Ok(response.success)
        })
    }

    fn captcha_threshold(&self) -> ApiFuture<'_, u32> {
        Box::pin(async move {
            let url = self.url(&self.captcha_threshold_path, &[]);
            send_json(self.client.get(&url), "GET", &self.captcha_threshold_path).await
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn build_client() -> Result<Client, AppError> {
    Client::builder()
        .user_agent(APP_USER_AGENT)
        .build()
        .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))
}

#[cfg(target_arch = "wasm32")]
fn build_client() -> Result<Client, AppError> {
    Client::builder()
        .build()
        .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))
}

/// Builds a URL from an explicit base URL, the path and encoded query pairs. An
/// empty base keeps the URL relative to the document origin.
fn build_url_with_base(base_url: &str, path: &str, query: &[(&str, &str)]) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    let mut url = if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    };

    if !query.is_empty() {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query.iter())
            .finish();
        url.push('?');
        url.push_str(&encoded);
    }

    url
}

/// Sends the request and decodes a JSON body. Only the path is recorded in the
/// span; query strings may carry challenge responses.
async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    method: &str,
    path: &str,
) -> Result<T, AppError> {
    let span = info_span!("api.request", http.method = method, path = %path);
    let response = request
        .send()
        .instrument(span)
        .await
        .map_err(map_request_error)?;

    debug!(path, status = response.status().as_u16(), "api response");
    handle_json_response(response).await
}

/// Maps transport errors into `AppError` variants with timeout detection.
fn map_request_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        AppError::Config(format!("Invalid request: {err}"))
    } else {
        AppError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Parses JSON responses and surfaces HTTP errors with sanitized bodies.
async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Http {
            status: status.as_u16(),
            message: sanitize_body(&body),
        })
    }
}

/// Sanitizes HTTP error bodies for user-facing messages by trimming and truncating.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
