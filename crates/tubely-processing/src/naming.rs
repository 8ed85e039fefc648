//! Random object names and content-type helpers.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::TryRngCore;
use tubely_core::constants::RANDOM_NAME_BYTES;

use crate::ProcessingError;

/// URL-safe name built from 32 bytes of OS randomness.
pub fn random_file_stem() -> Result<String, ProcessingError> {
    let mut bytes = [0u8; RANDOM_NAME_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| ProcessingError::Random(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// `"Video/MP4; codecs=avc1"` -> `"video/mp4"`.
pub fn normalize_media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// File extension taken from the subtype of a normalized media type.
pub fn extension_for(media_type: &str) -> Option<&str> {
    match media_type.split_once('/') {
        Some((_, subtype)) if !subtype.is_empty() => Some(subtype),
        _ => None,
    }
}
