//! Browser bindings: `localStorage` as the session repository and
//! `window.location` as the navigator. `storage` events only fire in tabs other
//! than the writer, which is exactly the cross-tab contract the listener needs.

use super::{
    error::AuthError,
    navigation::Navigator,
    repository::{ChangeObserver, SessionRepository},
};
use tracing::{debug, error, warn};
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use web_sys::{Storage, StorageEvent, Window};

fn window() -> Option<Window> {
    web_sys::window()
}

fn local_storage() -> Result<Storage, AuthError> {
    window()
        .ok_or_else(|| AuthError::Storage("No browser window available.".to_string()))?
        .local_storage()
        .map_err(|err| storage_error("open", &err))?
        .ok_or_else(|| AuthError::Storage("Local storage is disabled.".to_string()))
}

fn storage_error(operation: &str, err: &JsValue) -> AuthError {
    warn!(operation, error = ?err, "local storage operation failed");
    AuthError::Storage(format!("Local storage {operation} failed."))
}

/// Session slot backed by one `localStorage` key.
#[derive(Clone, Debug)]
pub struct LocalStorageRepository {
    key: String,
}

impl LocalStorageRepository {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl SessionRepository for LocalStorageRepository {
    fn load(&self) -> Option<String> {
        let storage = local_storage().ok()?;
        match storage.get_item(&self.key) {
            Ok(value) => value,
            Err(err) => {
                storage_error("read", &err);
                None
            }
        }
    }

    fn store(&self, value: &str) -> Result<(), AuthError> {
        local_storage()?
            .set_item(&self.key, value)
            .map_err(|err| storage_error("write", &err))
    }

    fn remove(&self) -> Result<(), AuthError> {
        local_storage()?
            .remove_item(&self.key)
            .map_err(|err| storage_error("remove", &err))
    }

    fn subscribe(&self, observer: ChangeObserver) {
        let Some(window) = window() else {
            warn!("no window; cross-tab listener not installed");
            return;
        };

        let key = self.key.clone();
        let closure = Closure::<dyn Fn(StorageEvent)>::new(move |event: StorageEvent| {
            // A `None` key means the whole storage area was cleared.
            match event.key() {
                Some(changed) if changed != key => {}
                _ => observer(),
            }
        });

        if let Err(err) =
            window.add_event_listener_with_callback("storage", closure.as_ref().unchecked_ref())
        {
            error!(error = ?err, "failed to register storage listener");
            return;
        }
        // Lives for the whole document.
        closure.forget();
        debug!("storage listener registered");
    }
}

/// Navigates by assigning `window.location`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn navigate(&self, location: &str) {
        let Some(window) = window() else {
            return;
        };
        if let Err(err) = window.location().set_href(location) {
            error!(error = ?err, "navigation failed");
        }
    }

    fn reload(&self) {
        let Some(window) = window() else {
            return;
        };
        if let Err(err) = window.location().reload() {
            error!(error = ?err, "reload failed");
        }
    }
}
