//! Users API.

use std::collections::HashMap;

use crate::client::StreamClient;
use crate::error::{Error, Result};
use crate::request::{QueryParams, params, path_segment};
use crate::types::{DeleteUserOptions, UpsertUsersRequest, UpsertUsersResponse, User};

/// Users API client.
pub struct UsersApi {
    client: StreamClient,
}

impl UsersApi {
    pub(crate) fn new(client: StreamClient) -> Self {
        Self { client }
    }

    /// Create or update users.
    pub async fn upsert(&self, users: &[User]) -> Result<UpsertUsersResponse> {
        let request = UpsertUsersRequest {
            users: users
            .iter()
            .map(|u| (u.id.as_str(), u))
            .collect::<HashMap<_, _>>(),
        };
        self.client
            .post("users", &QueryParams::new(), &request)
            .await
    }

    /// Create or update a single user, returning the stored record.
    pub async fn upsert_one(&self, user: &User) -> Result<User> {
        let mut response = self.upsert(std::slice::from_ref(user)).await?;
        response.users.remove(&user.id).ok_or_else(|| {
            Error::Decode(serde::de::Error::custom(format!(
                "user {} missing from response",
                user.id
            )))
        })
    }

    /// Delete a user.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.delete_with_options(id, DeleteUserOptions::default())
            .await
    }

    /// Delete a user with explicit options.
    ///
    /// `id` is escaped into a single path segment; `.` and `..` are rejected.
    pub async fn delete_with_options(&self, id: &str, options: DeleteUserOptions) -> Result<()> {
        if id.is_empty() {
            return Err(Error::precondition("user ID is empty"));
        }
        let id = path_segment(id)?;

        let mut query = Vec::new();
        if options.mark_messages_deleted {
            query.push(("mark_messages_deleted", "true"));
        }
        if options.hard_delete {
            query.push(("hard_delete", "true"));
        }

        self.client
            .delete(&format!("users/{}", id), &params(query))
            .await
    }
}
