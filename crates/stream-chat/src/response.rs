//! Response classification.
//!
//! Every function here takes the [`reqwest::Response`] by value, so the body
//! stream is released on each return path whether it was read or not.

use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// First status code treated as a failure.
const FIRST_ERROR_STATUS: u16 = 399;

/// Whether `status` counts as a successful response.
pub fn is_success(status: StatusCode) -> bool {
    status.as_u16() < FIRST_ERROR_STATUS
}

/// Check the status and decode the body into `T`.
pub(crate) async fn parse_json<T: DeserializeOwned>(
    method: &Method,
    response: Response,
) -> Result<T> {
    let response = check_status(method, response).await?;
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(Error::Decode)
}

/// Check the status and drop the body unread.
pub(crate) async fn discard(method: &Method, response: Response) -> Result<()> {
    check_status(method, response).await.map(drop)
}

async fn check_status(method: &Method, response: Response) -> Result<Response> {
    let status = response.status();
    if is_success(status) {
        return Ok(response);
    }

    let url = response.url().to_string();
    // The status is the failure being reported; an unreadable body must not mask it.
    let body = response.text().await.unwrap_or_default();

    tracing::debug!(%method, %status, "request rejected");
    Err(Error::Status {
        method: method.clone(),
        url,
        status,
        body,
    })
}
