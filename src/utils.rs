use crate::error::AppError;

use serde::de::DeserializeOwned;
use tracing::warn;

/// Parse an `{id}` path segment. Runs before any store access.
pub fn parse_id(raw: &str) -> Result<i32, AppError> {
    raw.parse().map_err(|_| {
        warn!(id = raw, "non-numeric id in path");
        AppError::InvalidId
    })
}

/// Decode a JSON request body, surfacing the parser's message on failure.
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Decode a URL-encoded form into its pairs, in order, keeping repeated keys.
///
/// Malformed percent-escapes and `;` separators are rejected instead of being
/// passed through literally.
pub fn decode_form(raw: &str) -> Result<Vec<(String, String)>, AppError> {
    let reject = |reason: &str| {
        warn!(reason, "failed to decode form");
        AppError::BadRequest("Error parsing form".to_string())
    };

    let bytes = raw.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'%' => {
                let escape = bytes.get(idx + 1..idx + 3);
                if !matches!(escape, Some(hex) if hex.iter().all(u8::is_ascii_hexdigit)) {
                    return Err(reject("invalid URL escape"));
                }
                idx += 3;
            }
            b';' => return Err(reject("invalid semicolon separator")),
            _ => idx += 1,
        }
    }

    serde_urlencoded::from_str(raw).map_err(|e| reject(&e.to_string()))
}
