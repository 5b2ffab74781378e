//! Content hashing.
//!
//! Identifiers coming out of the object store and the search index are
//! compared by content hash, with the same normalization applied on both
//! sides.

use sha2::{Digest, Sha256};

use crate::error::{Result, SieveError};

/// Whitespace stripped from both ends before hashing: Unicode white space
/// plus the ASCII information separators U+001C..=U+001F.
fn is_strippable(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Normalize text before hashing.
///
/// Lower-cases, decodes `&lt;` and `&gt;`, then trims surrounding
/// whitespace and information separators. Decoding happens after
/// lower-casing, so `&LT;` is decoded too.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .trim_matches(is_strippable)
        .to_string()
}

/// Lowercase hex SHA-256 of the normalized text.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(normalize(text).as_bytes()))
}

/// Like [`content_hash`], for raw bytes that must be UTF-8.
///
/// # Errors
///
/// [`SieveError::InvalidInput`] when `data` is not valid UTF-8.
pub fn content_hash_bytes(data: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(data)
        .map_err(|e| SieveError::InvalidInput(format!("not valid UTF-8: {}", e)))?;
    Ok(content_hash(text))
}
