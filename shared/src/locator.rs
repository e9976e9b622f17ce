//! Parsing of S3 object locators.
//!
//! Two forms are accepted:
//!
//! - `s3://bucket/key/path`
//! - `https://bucket.s3.region.amazonaws.com/key%20path` (virtual-host style,
//!   `http://` also accepted). The key is percent-decoded.

use crate::{Error, Result};

const S3_SCHEME: &str = "s3://";
const S3_HOST_MARKER: &str = ".s3.";

/// Bucket and key of an S3 object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    pub key: String,
}

impl S3Location {
    /// Parse a locator in either supported form.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();

        let (bucket, key) = if let Some(rest) = raw.strip_prefix(S3_SCHEME) {
            match rest.split_once('/') {
                Some((bucket, key)) => (bucket.to_string(), key.to_string()),
                None => (rest.to_string(), String::new()),
            }
        } else if let Some(rest) = raw.strip_prefix("https://").or_else(|| raw.strip_prefix("http://")) {
            parse_virtual_host(rest)?
        } else {
            return Err(Error::Validation(
                "Invalid S3 URI/URL format. Must start with 's3://' or 'https://'".to_string(),
            ));
        };

        if bucket.is_empty() || key.is_empty() {
            return Err(Error::Validation("Invalid bucket or object key".to_string()));
        }

        Ok(Self { bucket, key })
    }
}

/// Split `host/path?query#fragment` into bucket and decoded key.
fn parse_virtual_host(rest: &str) -> Result<(String, String)> {
    let end = rest.find(|c: char| c == '?' || c == '#').unwrap_or(rest.len());
    let rest = &rest[..end];

    let (host, path) = match rest.find('/') {
        Some(slash) => rest.split_at(slash),
        None => (rest, ""),
    };

    let Some((bucket, _)) = host.split_once(S3_HOST_MARKER) else {
        return Err(Error::Validation("Invalid S3 HTTPS URL format".to_string()));
    };

    let decoded = urlencoding::decode_binary(path.trim_start_matches('/').as_bytes());
    let key = String::from_utf8_lossy(&decoded).into_owned();

    Ok((bucket.to_string(), key))
}
