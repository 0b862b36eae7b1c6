//! User records and their validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whole persisted state: user id (stringified chat id) to record.
pub type UserMap = BTreeMap<String, UserRecord>;

/// Subscription state of one user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    /// City used for the daily forecast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// Whether the user receives the daily broadcast.
    #[serde(default)]
    pub subscribed: bool,
}

impl UserRecord {
    /// Creates a subscribed record for the given city.
    #[must_use]
    pub fn subscribed_to(city: impl Into<String>) -> Self {
        Self {
            city: Some(city.into()),
            subscribed: true,
        }
    }
}

/// One entry of the subscriber snapshot used by the broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    /// Telegram user id as stored in the data file; also the private chat id.
    pub user_id: String,
    /// City the forecast is requested for.
    pub city: String,
}

/// Problems found in a persisted user map.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordIssue {
    #[error("User {user_id} is subscribed but has no city")]
    SubscribedWithoutCity { user_id: String },

    #[error("User {user_id} has a blank city")]
    BlankCity { user_id: String },

    #[error("Key '{user_id}' is not a numeric chat id")]
    InvalidUserId { user_id: String },
}

/// Checks every record of the map and returns all issues found.
#[must_use]
pub fn validate_records(users: &UserMap) -> Vec<RecordIssue> {
    let mut issues = Vec::new();

    for (user_id, record) in users {
        if user_id.parse::<i64>().is_err() {
            issues.push(RecordIssue::InvalidUserId {
                user_id: user_id.clone(),
            });
        }

        match record.city.as_deref() {
            Some(city) if city.trim().is_empty() => issues.push(RecordIssue::BlankCity {
                user_id: user_id.clone(),
            }),
            None if record.subscribed => issues.push(RecordIssue::SubscribedWithoutCity {
                user_id: user_id.clone(),
            }),
            _ => {}
        }
    }

    issues
}

/// Example state file content for documentation and the validator.
#[must_use]
pub fn example_users() -> UserMap {
    let mut users = UserMap::new();
    users.insert("123456789".to_owned(), UserRecord::subscribed_to("Москва"));
    users.insert(
        "987654321".to_owned(),
        UserRecord {
            city: Some("London".to_owned()),
            subscribed: false,
        },
    );
    users
}
