use crate::error::CryptoError;

/// Longest key identifier, bounded by the one-byte length in the envelope trailer.
pub const MAX_KEY_ID_LEN: usize = 255;

const SEPARATORS: [char; 3] = ['/', '\\', ':'];

/// Normalises a caller-supplied key identifier.
///
/// Path and scheme separators (`/`, `\`, `:`) become `_` and surrounding whitespace is
/// trimmed, so `"tenant:a/primary "` and `"tenant_a_primary"` name the same key.
///
/// # Errors
/// [`CryptoError::InvalidInput`] when the result is empty, longer than
/// [`MAX_KEY_ID_LEN`] bytes or contains control characters.
pub fn sanitize(id: &str) -> Result<String, CryptoError> {
    let sanitized: String =
        id.trim().chars().map(|c| if SEPARATORS.contains(&c) { '_' } else { c }).collect();

    if sanitized.is_empty() {
        return Err(CryptoError::invalid_input("key identifier is empty"));
    }
    if sanitized.len() > MAX_KEY_ID_LEN {
        return Err(CryptoError::invalid_input("key identifier exceeds 255 bytes"));
    }
    if sanitized.chars().any(char::is_control) {
        return Err(CryptoError::invalid_input("key identifier contains control characters"));
    }
    Ok(sanitized)
}

/// True when `id` is already in the form [`sanitize`] produces.
pub fn is_sanitized(id: &str) -> bool {
    sanitize(id).is_ok_and(|s| s == id)
}
