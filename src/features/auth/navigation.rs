//! Navigation seam used by the resolver (forced sign-out), the service
//! (sign-out) and the cross-tab listener (reload).

use std::cell::RefCell;
use tracing::info;
use url::form_urlencoded;

/// Sign-in view.
pub const SIGNIN_PATH: &str = "/signin";
/// Landing view for signed-in users.
pub const HOME_PATH: &str = "/";

/// Moves the current tab somewhere else.
pub trait Navigator {
    /// Navigates to `location`.
    fn navigate(&self, location: &str);
    /// Reloads the current document, dropping in-memory view state.
    fn reload(&self);
}

/// Sign-in location that remembers where the user was headed. Returning there
/// after sign-in is best-effort.
#[must_use]
pub fn signin_location(intended: &str) -> String {
    let intended = intended.trim();
    if intended.is_empty() || intended == HOME_PATH || intended.starts_with(SIGNIN_PATH) {
        return SIGNIN_PATH.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("from", intended)
        .finish();
    format!("{SIGNIN_PATH}?{query}")
}

/// Navigator for headless hosts such as the CLI: it only logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, location: &str) {
        info!(location, "navigation requested");
    }

    fn reload(&self) {
        info!("reload requested");
    }
}

/// Records navigations instead of performing them, for embeddings that drive
/// the core without a document.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    locations: RefCell<Vec<String>>,
    reloads: RefCell<u32>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn locations(&self) -> Vec<String> {
        self.locations.borrow().clone()
    }

    #[must_use]
    pub fn last_location(&self) -> Option<String> {
        self.locations.borrow().last().cloned()
    }

    #[must_use]
    pub fn reloads(&self) -> u32 {
        *self.reloads.borrow()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, location: &str) {
        self.locations.borrow_mut().push(location.to_string());
    }

    fn reload(&self) {
        *self.reloads.borrow_mut() += 1;
    }
}
