//! TOTP code generation (RFC 6238) with fixed parameters.
//!
//! HMAC-SHA1, 6 digits, 30-second step, counter epoch 0. Every function
//! takes an explicit unix timestamp; the wall clock lives behind
//! [`Clock`](crate::totp::service::Clock).

use crate::totp::base32::decode_secret;
use crate::totp::types::*;
use hmac::{Hmac, Mac};
use sha1::Sha1;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Raw HMAC-OTP (RFC 4226 §5.3)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute the 6-digit code for raw key bytes and a counter.
pub fn hotp_raw(key: &[u8], counter: u64) -> Result<String, TotpError> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key)
        .map_err(|e| TotpError::new(TotpErrorKind::Internal, format!("HMAC init: {}", e)))?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();
    Ok(truncate(&digest))
}

/// Dynamic truncation per RFC 4226 §5.3.
fn truncate(hmac_result: &[u8]) -> String {
    let offset = (hmac_result[hmac_result.len() - 1] & 0x0f) as usize;
    let binary = ((hmac_result[offset] as u32 & 0x7f) << 24)
        | ((hmac_result[offset + 1] as u32) << 16)
        | ((hmac_result[offset + 2] as u32) << 8)
        | (hmac_result[offset + 3] as u32);
    let code = binary % 10u32.pow(DIGITS);
    format!("{:0>width$}", code, width = DIGITS as usize)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TOTP (time-based, RFC 6238)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Time-step counter for a unix timestamp.
pub fn time_step_at(unix_seconds: u64) -> u64 {
    unix_seconds / PERIOD as u64
}

/// Seconds until the window containing `unix_seconds` ends, in `[1, 30]`.
pub fn seconds_remaining_at(unix_seconds: u64) -> u32 {
    let p = PERIOD as u64;
    (p - (unix_seconds % p)) as u32
}

/// Elapsed share of the current window (0.0 = fresh code).
pub fn progress_fraction_at(unix_seconds: u64) -> f64 {
    (unix_seconds % PERIOD as u64) as f64 / PERIOD as f64
}

/// Generate the code for a Base32 secret at a unix timestamp.
///
/// A secret that does not decode is an upstream invariant breach: it is
/// logged and returned as [`TotpErrorKind::DecodeFailed`], never replaced
/// by a placeholder code.
pub fn generate_code_at(secret_b32: &str, unix_seconds: u64) -> Result<String, TotpError> {
    let key = decode_secret(secret_b32).map_err(|e| {
        log::error!("TOTP: secret failed to decode at generation time: {}", e);
        e
    })?;
    hotp_raw(&key, time_step_at(unix_seconds))
}

/// Generate a [`GeneratedCode`] snapshot for an account.
pub fn code_for_account_at(account: &Account, unix_seconds: u64) -> Result<GeneratedCode, TotpError> {
    let code = generate_code_at(&account.secret, unix_seconds)
        .map_err(|e| e.with_detail(format!("account {}", account.id)))?;
    Ok(GeneratedCode {
        account_id: account.id.clone(),
        code,
        remaining_seconds: seconds_remaining_at(unix_seconds),
        period: PERIOD,
        progress: progress_fraction_at(unix_seconds),
    })
}

/// Generate snapshots for every account, in list order.
///
/// Fails on the first account whose secret does not decode.
pub fn codes_for_accounts_at(
    accounts: &[Account],
    unix_seconds: u64,
) -> Result<Vec<GeneratedCode>, TotpError> {
    accounts
        .iter()
        .map(|a| code_for_account_at(a, unix_seconds))
        .collect()
}

/// Format a code with a space in the middle (e.g. "123 456").
pub fn format_code_display(code: &str) -> String {
    if code.len() <= 4 || !code.is_ascii() {
        return code.to_string();
    }
    let mid = code.len() / 2;
    format!("{} {}", &code[..mid], &code[mid..])
}

/// Current unix timestamp in seconds.
pub(crate) fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Secret: "12345678901234567890" (ASCII) → base32 below.
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    // ── RFC 4226 Appendix D ──────────────────────────────────────

    #[test]
    fn rfc4226_hotp_vectors() {
        let key = b"12345678901234567890";
        let expected = [
            "755224", "287082", "359152", "969429", "338314",
            "254676", "287922", "162583", "399871", "520489",
        ];
        for (counter, exp) in expected.iter().enumerate() {
            assert_eq!(&hotp_raw(key, counter as u64).unwrap(), exp, "HOTP mismatch at counter {}", counter);
        }
    }

    // ── RFC 6238 Appendix B (SHA-1, last 6 digits) ───────────────

    #[test]
    fn rfc6238_sha1_vectors() {
        let cases = [
            (59u64, "287082"),
            (1111111109, "081804"),
            (1111111111, "050471"),
            (1234567890, "005924"),
            (2000000000, "279037"),
            (20000000000, "353130"),
        ];
        for (t, exp) in cases {
            assert_eq!(generate_code_at(RFC_SECRET, t).unwrap(), exp, "TOTP mismatch at T={}", t);
        }
    }

    #[test]
    fn code_is_six_ascii_digits() {
        let code = generate_code_at("JBSWY3DPEHPK3PXP", 1_700_000_000).unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    // ── Window behaviour ─────────────────────────────────────────

    #[test]
    fn code_constant_within_window() {
        let base = 1_700_000_010 - (1_700_000_010 % 30);
        let first = generate_code_at(RFC_SECRET, base).unwrap();
        for t in base..base + 30 {
            assert_eq!(generate_code_at(RFC_SECRET, t).unwrap(), first);
        }
    }

    #[test]
    fn code_changes_at_window_boundary() {
        assert_ne!(
            generate_code_at(RFC_SECRET, 29).unwrap(),
            generate_code_at(RFC_SECRET, 30).unwrap()
        );
    }

    #[test]
    fn time_step_calculation() {
        assert_eq!(time_step_at(0), 0);
        assert_eq!(time_step_at(29), 0);
        assert_eq!(time_step_at(30), 1);
        assert_eq!(time_step_at(59), 1);
        assert_eq!(time_step_at(60), 2);
    }

    #[test]
    fn seconds_remaining_calculation() {
        assert_eq!(seconds_remaining_at(0), 30);
        assert_eq!(seconds_remaining_at(1), 29);
        assert_eq!(seconds_remaining_at(29), 1);
        assert_eq!(seconds_remaining_at(30), 30);
    }

    #[test]
    fn seconds_remaining_counts_down_then_resets() {
        let base = 1_700_000_010 - (1_700_000_010 % 30);
        for t in base..base + 29 {
            assert_eq!(seconds_remaining_at(t + 1), seconds_remaining_at(t) - 1);
        }
        assert_eq!(seconds_remaining_at(base + 29), 1);
        assert_eq!(seconds_remaining_at(base + 30), 30);
    }

    #[test]
    fn progress_fraction_calculation() {
        assert!((progress_fraction_at(0) - 0.0).abs() < 0.01);
        assert!((progress_fraction_at(15) - 0.5).abs() < 0.01);
    }

    // ── Failure policy ───────────────────────────────────────────

    #[test]
    fn invalid_secret_surfaces_decode_error() {
        let err = generate_code_at("!!!INVALID!!!", 59).unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::DecodeFailed);
        assert_eq!(err.category(), ErrorCategory::Decode);
    }

    // ── Account snapshots ────────────────────────────────────────

    #[test]
    fn code_for_account_snapshot() {
        let acct = Account::create("user", "", RFC_SECRET).unwrap();
        let result = code_for_account_at(&acct, 59).unwrap();
        assert_eq!(result.code, "287082");
        assert_eq!(result.remaining_seconds, 1);
        assert_eq!(result.period, 30);
        assert_eq!(result.account_id, acct.id);
    }

    #[test]
    fn codes_for_accounts_fails_on_corrupt_secret() {
        let good = Account::create("a", "", RFC_SECRET).unwrap();
        let mut bad = good.clone();
        bad.id = "corrupt".into();
        bad.secret = "1111".into();
        let err = codes_for_accounts_at(&[good, bad], 59).unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::DecodeFailed);
        assert_eq!(err.detail.as_deref(), Some("account corrupt"));
    }

    // ── Display formatting ───────────────────────────────────────

    #[test]
    fn format_code_split() {
        assert_eq!(format_code_display("123456"), "123 456");
        assert_eq!(format_code_display("012345"), "012 345");
        assert_eq!(format_code_display("1234"), "1234");
    }
}
