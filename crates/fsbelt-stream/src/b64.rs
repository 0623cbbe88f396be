//! Base64 encoding and decoding.

use base64::Engine;
use base64::engine::GeneralPurpose;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use tracing::debug;

use crate::error::StreamError;

fn engine(url_safe: bool, no_padding: bool) -> &'static GeneralPurpose {
    match (url_safe, no_padding) {
        (true, true) => &URL_SAFE_NO_PAD,
        (true, false) => &URL_SAFE,
        (false, true) => &STANDARD_NO_PAD,
        (false, false) => &STANDARD,
    }
}

/// Encode bytes with the selected alphabet and padding.
pub fn encode(data: &[u8], url_safe: bool, no_padding: bool) -> String {
    engine(url_safe, no_padding).encode(data)
}

/// Decode with the selected alphabet and padding, strictly.
pub fn decode(data: &[u8], url_safe: bool, no_padding: bool) -> Result<Vec<u8>, StreamError> {
    Ok(engine(url_safe, no_padding).decode(data)?)
}

/// Decode input whose alphabet is unknown.
///
/// Tries url-safe unpadded, url-safe, standard unpadded, standard, in
/// that order, and returns the first success.
pub fn robust_decode(data: &[u8]) -> Result<Vec<u8>, StreamError> {
    let attempts: [(&str, &GeneralPurpose); 4] = [
        ("url-safe unpadded", &URL_SAFE_NO_PAD),
        ("url-safe", &URL_SAFE),
        ("standard unpadded", &STANDARD_NO_PAD),
        ("standard", &STANDARD),
    ];
    for (name, engine) in attempts {
        match engine.decode(data) {
            Ok(decoded) => {
                debug!(alphabet = name, "base64 decoded");
                return Ok(decoded);
            }
            Err(err) => {
                debug!(alphabet = name, error = %err, "base64 decode attempt failed");
            }
        }
    }
    Err(StreamError::Base64Exhausted)
}
