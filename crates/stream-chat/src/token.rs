//! HS256 token signing.
//!
//! Tokens are compact JWTs signed with the API secret. Signing is a pure
//! function of the claims, the expiration and the secret: no `iat` or nonce is
//! added, so identical inputs always yield identical tokens.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Name of the expiration claim.
const EXPIRATION_CLAIM: &str = "exp";

/// Signs claim sets with the client secret.
#[derive(Clone)]
pub struct TokenSigner {
    key: EncodingKey,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Create a signer keyed by `secret`.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
        }
    }

    /// Sign `claims`, adding an `exp` claim when `expires` is set.
    ///
    /// `claims` must serialize to a JSON object. An `exp` already present in
    /// `claims` is replaced by `expires`, or kept as-is when `expires` is
    /// `None`.
    pub fn sign<C>(&self, claims: &C, expires: Option<DateTime<Utc>>) -> Result<String>
    where
        C: Serialize + ?Sized,
    {
        let mut claims = match serde_json::to_value(claims) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(Error::Signing(format!(
                    "claims must be a JSON object, got {}",
                    json_kind(&other)
                )));
            }
            Err(e) => return Err(Error::Signing(e.to_string())),
        };

        if let Some(expires) = expires {
            claims.insert(EXPIRATION_CLAIM.to_string(), expires.timestamp().into());
        }

        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| Error::Signing(e.to_string()))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
