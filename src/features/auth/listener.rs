//! Cross-tab invalidation. In-memory view state cannot be invalidated from
//! outside the tab, so any change to the session slot made elsewhere reloads
//! the whole document; unsaved page state is lost, the slot stays authoritative.

use super::{navigation::Navigator, repository::SessionRepository};
use std::rc::Rc;
use tracing::info;

/// Registers the reload observer on `repository`. Call once at application start.
pub fn install(repository: &dyn SessionRepository, navigator: Rc<dyn Navigator>) {
    repository.subscribe(Rc::new(move || {
        info!("session changed in another tab; reloading");
        navigator.reload();
    }));
}
