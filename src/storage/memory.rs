//! In-memory user store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{StoreError, UserMap, UserStore};

/// Keeps the user map in memory and counts how many times it was saved.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Mutex<UserMap>,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given users.
    #[must_use]
    pub fn with_users(users: UserMap) -> Self {
        Self {
            users: Mutex::new(users),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful [`save`](UserStore::save) calls so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl UserStore for MemoryStore {
    fn load(&self) -> UserMap {
        self.users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, users: &UserMap) -> Result<(), StoreError> {
        let mut guard = self
            .users
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        guard.clone_from(users);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
