//! Single-slot persistence for the session. A repository holds at most one
//! serialized value and tells observers when *another* tab changed it, the way
//! browser `storage` events behave. Writes always replace the slot wholesale.

use super::error::AuthError;
use std::cell::RefCell;
use std::rc::Rc;

/// Callback fired when the slot changes outside the current tab.
pub type ChangeObserver = Rc<dyn Fn()>;

/// Persisted single-slot holder of the serialized session.
pub trait SessionRepository {
    /// Reads the slot.
    fn load(&self) -> Option<String>;

    /// Replaces the slot.
    ///
    /// # Errors
    /// Returns `AuthError::Storage` when the backing store refuses the write.
    fn store(&self, value: &str) -> Result<(), AuthError>;

    /// Empties the slot.
    ///
    /// # Errors
    /// Returns `AuthError::Storage` when the backing store refuses the removal.
    fn remove(&self) -> Result<(), AuthError>;

    /// Registers an observer for changes made through other tabs.
    fn subscribe(&self, observer: ChangeObserver);
}

#[derive(Default)]
struct Profile {
    slot: Option<String>,
    observers: Vec<(usize, ChangeObserver)>,
    next_tab: usize,
}

/// In-memory stand-in for a browser profile's storage, shared by every tab
/// opened from it.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    profile: Rc<RefCell<Profile>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a repository handle for a new tab.
    #[must_use]
    pub fn open_tab(&self) -> MemoryRepository {
        let mut profile = self.profile.borrow_mut();
        let tab = profile.next_tab;
        profile.next_tab += 1;
        MemoryRepository {
            storage: self.clone(),
            tab,
        }
    }

    /// Writes the slot on behalf of `tab` and notifies every other tab. Like
    /// `localStorage`, writing the value already present notifies nobody.
    fn write(&self, tab: usize, value: Option<String>) {
        let observers: Vec<ChangeObserver> = {
            let mut profile = self.profile.borrow_mut();
            if profile.slot == value {
                return;
            }
            profile.slot = value;
            profile
                .observers
                .iter()
                .filter(|(owner, _)| *owner != tab)
                .map(|(_, observer)| Rc::clone(observer))
                .collect()
        };

        for observer in observers {
            observer();
        }
    }
}

/// One tab's handle on a [`MemoryStorage`].
#[derive(Clone)]
pub struct MemoryRepository {
    storage: MemoryStorage,
    tab: usize,
}

impl MemoryRepository {
    /// A repository on a private profile with a single tab.
    #[must_use]
    pub fn standalone() -> Self {
        MemoryStorage::new().open_tab()
    }
}

impl SessionRepository for MemoryRepository {
    fn load(&self) -> Option<String> {
        self.storage.profile.borrow().slot.clone()
    }

    fn store(&self, value: &str) -> Result<(), AuthError> {
        self.storage.write(self.tab, Some(value.to_string()));
        Ok(())
    }

    fn remove(&self) -> Result<(), AuthError> {
        self.storage.write(self.tab, None);
        Ok(())
    }

    fn subscribe(&self, observer: ChangeObserver) {
        self.storage
            .profile
            .borrow_mut()
            .observers
            .push((self.tab, observer));
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileRepository;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use super::{AuthError, ChangeObserver, SessionRepository};
    use std::fs;
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};
    use tracing::debug;

    /// Session slot kept in one file, for native hosts. There are no sibling
    /// tabs in-process, so nothing is ever notified.
    #[derive(Clone, Debug)]
    pub struct FileRepository {
        path: PathBuf,
    }

    impl FileRepository {
        #[must_use]
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl SessionRepository for FileRepository {
        fn load(&self) -> Option<String> {
            let contents = fs::read_to_string(&self.path).ok()?;
            let contents = contents.trim();
            (!contents.is_empty()).then(|| contents.to_string())
        }

        fn store(&self, value: &str) -> Result<(), AuthError> {
            if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|err| {
                    AuthError::Storage(format!("failed to create {}: {err}", parent.display()))
                })?;
            }
            fs::write(&self.path, value).map_err(|err| {
                AuthError::Storage(format!("failed to write {}: {err}", self.path.display()))
            })?;
            restrict_permissions(&self.path)
        }

        fn remove(&self) -> Result<(), AuthError> {
            match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                Err(err) => Err(AuthError::Storage(format!(
                    "failed to remove {}: {err}",
                    self.path.display()
                ))),
            }
        }

        fn subscribe(&self, _observer: ChangeObserver) {
            debug!(path = %self.path.display(), "file session slot has no sibling tabs to observe");
        }
    }

    // The slot holds a bearer token; keep it owner-only.
    #[cfg(unix)]
    fn restrict_permissions(path: &Path) -> Result<(), AuthError> {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|err| {
            AuthError::Storage(format!(
                "failed to restrict permissions on {}: {err}",
                path.display()
            ))
        })
    }

    #[cfg(not(unix))]
    fn restrict_permissions(_path: &Path) -> Result<(), AuthError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FileRepository, MemoryRepository, MemoryStorage, SessionRepository};
    use crate::features::auth::AuthError;
    use std::cell::Cell;
    use std::rc::Rc;
    use uuid::Uuid;

    fn counter(repository: &dyn SessionRepository) -> Rc<Cell<u32>> {
        let hits = Rc::new(Cell::new(0));
        let observed = Rc::clone(&hits);
        repository.subscribe(Rc::new(move || observed.set(observed.get() + 1)));
        hits
    }

    #[test]
    fn memory_slot_is_replaced_wholesale() -> Result<(), AuthError> {
        let repository = MemoryRepository::standalone();
        assert_eq!(repository.load(), None);
        repository.store("first")?;
        repository.store("second")?;
        assert_eq!(repository.load().as_deref(), Some("second"));
        repository.remove()?;
        assert_eq!(repository.load(), None);
        Ok(())
    }

    #[test]
    fn writes_notify_other_tabs_only() -> Result<(), AuthError> {
        let storage = MemoryStorage::new();
        let tab_a = storage.open_tab();
        let tab_b = storage.open_tab();
        let hits_a = counter(&tab_a);
        let hits_b = counter(&tab_b);

        tab_a.store("session")?;
        assert_eq!(hits_a.get(), 0);
        assert_eq!(hits_b.get(), 1);
        assert_eq!(tab_b.load().as_deref(), Some("session"));

        tab_b.remove()?;
        assert_eq!(hits_a.get(), 1);
        assert_eq!(hits_b.get(), 1);
        Ok(())
    }

    #[test]
    fn unchanged_writes_do_not_notify() -> Result<(), AuthError> {
        let storage = MemoryStorage::new();
        let tab_a = storage.open_tab();
        let tab_b = storage.open_tab();
        let hits_b = counter(&tab_b);

        tab_a.remove()?;
        tab_a.store("same")?;
        tab_a.store("same")?;
        assert_eq!(hits_b.get(), 1);
        Ok(())
    }

    #[test]
    fn file_slot_round_trips_and_tolerates_missing_file() -> Result<(), AuthError> {
        let dir = std::env::temp_dir().join(format!("riskguard-slot-{}", Uuid::new_v4()));
        let repository = FileRepository::new(dir.join("session.json"));

        assert_eq!(repository.load(), None);
        repository.remove()?;
        repository.store("{\"subject\":\"a\"}")?;
        assert_eq!(repository.load().as_deref(), Some("{\"subject\":\"a\"}"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(repository.path())
                .map_err(|err| AuthError::Storage(err.to_string()))?
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        repository.remove()?;
        assert_eq!(repository.load(), None);
        let _ = std::fs::remove_dir_all(&dir);
        Ok(())
    }
}
