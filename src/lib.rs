//! Client-side session, authorization and sign-in defense core for the risk
//! management console.
//!
//! The browser build (`wasm32`) persists the session in `localStorage`, drives
//! navigation through `window.location` and exposes Leptos guard components.
//! Native builds share the same core over in-memory or file-backed session
//! slots and ship the `riskguard` operator CLI.
//!
//! Nothing in this crate verifies token signatures. The server issues tokens,
//! owns role membership, and rejects expired or revoked sessions; the client only
//! decodes claims and fails closed when it cannot reach the server.

#[path = "lib/mod.rs"]
pub mod app_lib;
pub mod features;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

pub use app_lib::{AppConfig, AppError};
pub use features::auth;
