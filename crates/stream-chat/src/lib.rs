//! HTTP client SDK for the Stream Chat REST API.
//!
//! Every call is authenticated with a server token signed from the API
//! secret, carries the API key as a query parameter, and maps HTTP failures to
//! a typed [`Error`].
//!
//! # Example
//!
//! ```no_run
//! use stream_chat::{StreamClient, User, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = StreamClient::builder("api-key", "api-secret").build()?;
//!
//! // Issue a token for a frontend user
//! let token = client.create_token("frodo-baggins", None)?;
//!
//! // Register the user
//! let user = User::new("frodo-baggins").with_name("Frodo Baggins");
//! client.users().upsert_one(&user).await?;
//!
//! // Call any endpoint directly
//! let app: serde_json::Value = client.get("app", &Default::default()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Errors
//!
//! - **Precondition**: empty API key, secret or user ID
//! - **Transport**: connection, DNS and timeout failures ([`Error::is_timeout`])
//! - **Status**: responses with status 399 or above, with method, URL and body
//! - **Decode**: a successful body that does not match the expected type

pub mod api;
pub mod client;
pub mod error;
pub mod request;
pub mod response;
pub mod token;
pub mod types;

pub use client::{ClientBuilder, StreamClient};
pub use error::{Error, Result};
pub use request::QueryParams;
pub use token::TokenSigner;
pub use types::*;
