//! Request and response types for the Stream Chat API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// A chat user.
///
/// Fields the server does not model explicitly travel in `extra_data` and are
/// flattened into the user object on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Custom fields.
    #[serde(flatten)]
    pub extra_data: HashMap<String, serde_json::Value>,
}

impl User {
    /// Create a user with only an ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a custom field.
    pub fn with_extra(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.extra_data.insert(key.into(), value.into());
        self
    }
}

/// Request body for creating or updating users.
#[derive(Debug, Serialize)]
pub(crate) struct UpsertUsersRequest<'a> {
    pub users: HashMap<&'a str, &'a User>,
}

/// Response from creating or updating users, keyed by user ID.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpsertUsersResponse {
    #[serde(default)]
    pub users: HashMap<String, User>,
}

/// Options for deleting a user.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteUserOptions {
    /// Also mark the user's messages as deleted.
    pub mark_messages_deleted: bool,
    /// Remove the user and their data permanently.
    pub hard_delete: bool,
}
