//! API endpoint implementations.

mod users;

pub use users::UsersApi;
