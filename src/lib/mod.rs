//! Shared utilities for API access, configuration and transport errors.
//!
//! ## Endpoints consumed by the auth core
//!
//! 1. **Sign-in:** `POST /auth` with `{ email, password }` returns `{ token }`.
//! 2. **Role probe:** `GET /users/roles/checking?roleName=...` with the session's
//!    `Authorization` header returns `{ hasRole, signOutRequired }`. The server
//!    resolves group-inherited roles that are not embedded in the token.
//! 3. **Challenge:** `GET /captcha/verify?humanKey=...` returns `{ success }`.
//! 4. **Policy:** the captcha attempt threshold is a bare integer setting.
//!
//! Centralizing these helpers keeps network behavior consistent and keeps token
//! handling out of view code. Callers must not log passwords, tokens or
//! challenge responses.

pub mod api;
pub mod config;
pub mod errors;

pub use api::{ApiFuture, AuthApi, HttpAuthApi, RoleCheck};
pub use config::AppConfig;
pub use errors::AppError;
