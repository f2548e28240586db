//! Request URL construction.

use std::collections::BTreeMap;

use url::Url;

use crate::error::{Error, Result};

/// Name of the query parameter carrying the API key.
pub const API_KEY_PARAM: &str = "api_key";

/// Query parameters: each name maps to its values in insertion order.
pub type QueryParams = BTreeMap<String, Vec<String>>;

/// Build the full request URL for `path` under `base_url`.
///
/// The base and path are joined with a single `/`. Parameters are encoded
/// with sorted names, values in insertion order, and a trailing `api_key`
/// entry is merged in at its sorted position. A caller-supplied `api_key` is
/// dropped so the query always carries exactly the configured key.
pub fn build_url(base_url: &str, path: &str, params: &QueryParams, api_key: &str) -> Result<Url> {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let mut url = Url::parse(&format!("{}/{}", base, path))?;

    let api_key_values = [api_key.to_string()];
    let entries = params
        .iter()
        .filter(|(name, _)| name.as_str() != API_KEY_PARAM)
        .map(|(name, values)| (name.as_str(), values.as_slice()))
        .chain(std::iter::once((API_KEY_PARAM, api_key_values.as_slice())));

    let mut sorted: Vec<(&str, &[String])> = entries.collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (name, values) in sorted {
            for value in values {
                query.append_pair(name, value);
            }
        }
    }

    Ok(url)
}

/// Percent-encode `segment` so it occupies exactly one path segment.
///
/// `/`, `?`, `#` and `%` are escaped. The dot segments `.` and `..` cannot be
/// escaped and are rejected, as is an empty segment.
pub fn path_segment(segment: &str) -> Result<String> {
    match segment {
        "" => Err(Error::precondition("path segment is empty")),
        "." | ".." => Err(Error::precondition(format!(
            "path segment {:?} is not allowed",
            segment
        ))),
        _ => Ok(urlencoding::encode(segment).into_owned()),
    }
}

/// Convenience constructor for [`QueryParams`].
///
/// ```
/// use stream_chat::request::params;
///
/// let query = params([("limit", "10"), ("type", "messaging"), ("type", "team")]);
/// assert_eq!(query["type"], vec!["messaging", "team"]);
/// ```
pub fn params<I, K, V>(pairs: I) -> QueryParams
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut query = QueryParams::new();
    for (name, value) in pairs {
        query.entry(name.into()).or_default().push(value.into());
    }
    query
}
