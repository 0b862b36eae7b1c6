//! User subscription storage.
//!
//! The store is a single mapping from user id to [`UserRecord`]. Every
//! operation reads the whole mapping and mutating operations write the whole
//! mapping back. There is no caching and no locking between callers.

mod json_file;
mod memory;
mod record;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use record::{RecordIssue, Subscriber, UserMap, UserRecord, example_users, validate_records};

use thiserror::Error;

/// Errors that can occur while persisting user data.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to write user data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize user data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Storage capability for user subscriptions.
///
/// Backends implement [`load`](UserStore::load) and [`save`](UserStore::save);
/// the remaining operations are read-modify-write sequences on top of them.
pub trait UserStore: Send + Sync {
    /// Reads the full mapping. Missing or unreadable state yields an empty map.
    fn load(&self) -> UserMap;

    /// Replaces the persisted mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if the mapping cannot be written.
    fn save(&self, users: &UserMap) -> Result<(), StoreError>;

    /// Stores the city for a user and marks them subscribed.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated mapping cannot be saved.
    fn set_city(&self, user_id: &str, city: &str) -> Result<(), StoreError> {
        let mut users = self.load();
        let record = users.entry(user_id.to_owned()).or_default();
        record.city = Some(city.to_owned());
        record.subscribed = true;
        self.save(&users)
    }

    /// Returns the stored city of a user, if any.
    fn get_city(&self, user_id: &str) -> Option<String> {
        self.load().remove(user_id).and_then(|record| record.city)
    }

    /// Snapshot of all subscribed users with a city.
    fn list_subscribed(&self) -> Vec<Subscriber> {
        self.load()
            .into_iter()
            .filter(|(_, record)| record.subscribed)
            .filter_map(|(user_id, record)| {
                record
                    .city
                    .filter(|city| !city.trim().is_empty())
                    .map(|city| Subscriber { user_id, city })
            })
            .collect()
    }

    /// Clears the subscription flag. Returns whether the user had a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated mapping cannot be saved.
    fn unsubscribe(&self, user_id: &str) -> Result<bool, StoreError> {
        let mut users = self.load();
        let Some(record) = users.get_mut(user_id) else {
            return Ok(false);
        };
        record.subscribed = false;
        self.save(&users)?;
        Ok(true)
    }
}
