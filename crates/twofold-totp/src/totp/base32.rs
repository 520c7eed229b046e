//! Base32 secret normalisation, validation and decoding.
//!
//! Secrets are accepted the way users paste them (lowercase, grouped with
//! spaces) and stored in one canonical form: uppercase, no whitespace,
//! exactly 16 or 32 characters of `A–Z2–7`.

use crate::totp::types::*;

/// Accepted canonical lengths.
const VALID_LENGTHS: [usize; 2] = [16, 32];

/// Strip all whitespace and uppercase.
pub fn normalize_secret(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Validate a user-supplied secret, returning its canonical form.
///
/// Length is checked before the alphabet, so a short string of invalid
/// characters reports [`SecretRejection::BadLength`].
pub fn validate_secret(raw: &str) -> Result<String, SecretRejection> {
    let secret = normalize_secret(raw);
    if !VALID_LENGTHS.contains(&secret.chars().count()) {
        return Err(SecretRejection::BadLength);
    }
    if !secret.chars().all(is_base32_char) {
        return Err(SecretRejection::BadAlphabet);
    }
    Ok(secret)
}

/// `true` if `raw` would pass [`validate_secret`].
pub fn is_valid_secret(raw: &str) -> bool {
    validate_secret(raw).is_ok()
}

/// Decode a Base32 secret to raw key bytes.
///
/// Accepts any length and optional `=` padding; an empty key or a
/// character outside the alphabet is a [`TotpErrorKind::DecodeFailed`].
pub fn decode_secret(secret: &str) -> Result<Vec<u8>, TotpError> {
    let cleaned = normalize_secret(secret);
    let cleaned = cleaned.trim_end_matches('=');
    if cleaned.is_empty() || !cleaned.chars().all(is_base32_char) {
        return Err(TotpError::new(
            TotpErrorKind::DecodeFailed,
            "Invalid base-32 secret",
        ));
    }
    ::base32::decode(::base32::Alphabet::Rfc4648 { padding: false }, cleaned)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| TotpError::new(TotpErrorKind::DecodeFailed, "Invalid base-32 secret"))
}

/// Encode raw bytes to Base32 (no padding, uppercase).
pub fn encode_secret(bytes: &[u8]) -> String {
    ::base32::encode(::base32::Alphabet::Rfc4648 { padding: false }, bytes)
}

fn is_base32_char(c: char) -> bool {
    matches!(c, 'A'..='Z' | '2'..='7')
}
