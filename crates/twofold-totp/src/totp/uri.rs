//! `otpauth://totp/` URI encoding and decoding.
//!
//! Format: `otpauth://totp/ISSUER:NAME?secret=BASE32&algorithm=SHA1&digits=6&period=30&issuer=ISSUER`
//!
//! The label is percent-encoded with the JavaScript `encodeURIComponent` set
//! and the query with `application/x-www-form-urlencoded`, so output is
//! byte-identical to what browser-based authenticators produce.

use crate::totp::base32::normalize_secret;
use crate::totp::types::*;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Required prefix; only TOTP is supported.
pub const TOTP_URI_PREFIX: &str = "otpauth://totp/";

/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const LABEL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parse
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parse an `otpauth://totp/` URI into its name, issuer and secret.
///
/// The secret is normalised but not Base32-validated; that is the
/// importer's job.
pub fn parse_otpauth_uri(uri: &str) -> Result<ParsedAccount, TotpError> {
    if !uri.starts_with(TOTP_URI_PREFIX) {
        return Err(TotpError::new(
            TotpErrorKind::InvalidUri,
            "not an otpauth://totp/ URI",
        ));
    }

    let url = url::Url::parse(uri).map_err(|e| {
        TotpError::new(TotpErrorKind::InvalidUri, format!("Invalid URI: {}", e))
    })?;

    // First occurrence wins; an empty value counts as absent.
    let query = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
    };

    let secret = query("secret")
        .ok_or_else(|| TotpError::new(TotpErrorKind::InvalidUri, "missing secret"))?;
    let query_issuer = query("issuer");

    // Path is "/LABEL" after the "totp" host.
    let path = url.path();
    let raw_label = path.strip_prefix('/').unwrap_or(path);
    let label = percent_decode_strict(raw_label).ok_or_else(|| {
        TotpError::new(TotpErrorKind::InvalidUri, "malformed percent-encoding in label")
    })?;

    let (label_issuer, name) = match label.split_once(':') {
        Some((issuer, name)) => (Some(issuer), name),
        None => (None, label.as_str()),
    };
    let issuer = query_issuer
        .as_deref()
        .or(label_issuer)
        .unwrap_or("");

    Ok(ParsedAccount {
        name: name.trim().to_string(),
        issuer: issuer.trim().to_string(),
        secret: normalize_secret(&secret),
    })
}

/// Parse newline-separated URIs, dropping blank lines and lines that
/// fail to decode.
pub fn parse_otpauth_uris(text: &str) -> Vec<ParsedAccount> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|line| match parse_otpauth_uri(line) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::debug!("import: dropping undecodable URI line: {}", e);
                None
            }
        })
        .collect()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generate the provisioning URI for an account.
pub fn build_otpauth_uri(account: &Account) -> String {
    let label = if account.issuer.is_empty() {
        account.name.clone()
    } else {
        format!("{}:{}", account.issuer, account.name)
    };

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query
        .append_pair("secret", &account.secret)
        .append_pair("algorithm", "SHA1")
        .append_pair("digits", &DIGITS.to_string())
        .append_pair("period", &PERIOD.to_string());
    if !account.issuer.is_empty() {
        query.append_pair("issuer", &account.issuer);
    }

    format!(
        "{}{}?{}",
        TOTP_URI_PREFIX,
        utf8_percent_encode(&label, LABEL_ENCODE_SET),
        query.finish()
    )
}

/// Generate URIs for multiple accounts, one per line.
pub fn build_otpauth_uris(accounts: &[Account]) -> String {
    accounts
        .iter()
        .map(build_otpauth_uri)
        .collect::<Vec<_>>()
        .join("\n")
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  URL decoding helper
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Percent-decode a path segment. `None` on a truncated or non-hex escape
/// or on bytes that are not UTF-8. `+` is left as is.
fn percent_decode_strict(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let escapes_ok = bytes.iter().enumerate().all(|(i, &b)| {
        b != b'%'
            || bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    });
    if !escapes_ok {
        return None;
    }
    percent_decode_str(s)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}
