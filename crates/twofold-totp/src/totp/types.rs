//! Core types for the TOTP account engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed TOTP time-step in seconds.
pub const PERIOD: u32 = 30;
/// Fixed number of digits in a generated code.
pub const DIGITS: u32 = 6;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Account
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A single TOTP account as held in the account list and persisted by the store.
///
/// The JSON shape (`{id, name, issuer, secret}`) doubles as the JSON export
/// schema, so field names must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Opaque unique identifier, never reused.
    pub id: String,
    /// User-facing label (e.g. "alice@example.com").
    pub name: String,
    /// Issuer (e.g. "GitHub"); empty when absent.
    #[serde(default)]
    pub issuer: String,
    /// Canonical Base32 secret (uppercase, no whitespace, 16 or 32 chars).
    pub secret: String,
}

impl Account {
    /// Create an account with a fresh id from user-supplied fields.
    ///
    /// Trims `name` and `issuer`, rejects an empty name and validates the
    /// secret, storing its canonical form.
    pub fn create(name: &str, issuer: &str, raw_secret: &str) -> Result<Self, TotpError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TotpError::new(
                TotpErrorKind::InvalidInput,
                "Account name is required",
            ));
        }
        let secret = crate::totp::base32::validate_secret(raw_secret)?;
        Ok(Self {
            id: new_account_id(),
            name: name.to_string(),
            issuer: issuer.trim().to_string(),
            secret,
        })
    }

    /// Display name: "Issuer (name)" or just "name".
    pub fn display_name(&self) -> String {
        if self.issuer.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.issuer, self.name)
        }
    }
}

/// Generate a fresh, never-reused account identifier.
pub fn new_account_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Decoded / candidate records
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Result of decoding a single `otpauth://` URI.
///
/// The secret is normalised (uppercase, whitespace stripped) but has not
/// been Base32-validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAccount {
    pub name: String,
    pub issuer: String,
    pub secret: String,
}

/// A record proposed for import, before validation and renaming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCandidate {
    pub name: Option<String>,
    pub issuer: Option<String>,
    pub secret: Option<String>,
}

impl ImportCandidate {
    /// Build a candidate from one element of a JSON import document.
    /// Non-string or missing fields become `None`.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let field = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };
        Self {
            name: field("name"),
            issuer: field("issuer"),
            secret: field("secret"),
        }
    }

    /// Trimmed name, `None` when missing or blank.
    pub fn clean_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }

    /// Secret, `None` when missing or empty.
    pub fn raw_secret(&self) -> Option<&str> {
        self.secret.as_deref().filter(|s| !s.is_empty())
    }

    /// Trimmed issuer, empty when absent.
    pub fn clean_issuer(&self) -> &str {
        self.issuer.as_deref().map(str::trim).unwrap_or("")
    }

    /// `true` if the candidate carries both a name and a secret.
    pub fn is_complete(&self) -> bool {
        self.clean_name().is_some() && self.raw_secret().is_some()
    }
}

impl From<ParsedAccount> for ImportCandidate {
    fn from(p: ParsedAccount) -> Self {
        Self {
            name: Some(p.name),
            issuer: Some(p.issuer),
            secret: Some(p.secret),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generated code result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A generated code with associated timing info, one per account per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCode {
    /// Account this code was generated for.
    pub account_id: String,
    /// The 6-digit code (e.g. "012345").
    pub code: String,
    /// Seconds until the code rotates, in `[1, 30]`.
    pub remaining_seconds: u32,
    /// Window length in seconds.
    pub period: u32,
    /// Elapsed share of the window, 0.0 = fresh.
    pub progress: f64,
}

impl GeneratedCode {
    /// The code is about to rotate (five seconds or less left).
    pub fn is_expiring(&self) -> bool {
        self.remaining_seconds <= 5
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Import / Export format identifiers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Import source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportFormat {
    /// Detect from content.
    #[default]
    Auto,
    /// JSON array of account objects, or a single object.
    Json,
    /// One `otpauth://totp/` URI per line.
    Uri,
}

/// Export target format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// One `otpauth://totp/` URI per line.
    #[default]
    Uri,
    /// Pretty-printed JSON array of accounts.
    Json,
}

impl ExportFormat {
    /// File extension used for downloads.
    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Uri => "txt",
            Self::Json => "json",
        }
    }

    /// MIME type used for downloads.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Uri => "text/plain",
            Self::Json => "application/json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uri => write!(f, "uri"),
            Self::Json => write!(f, "json"),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Import result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Summary of a successful import. The accounts are not yet merged anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    /// Format that was actually parsed (never `Auto`).
    pub format: ImportFormat,
    /// Candidate records found before validation.
    pub total_found: usize,
    /// Number of accepted accounts.
    pub count: usize,
    /// Candidates dropped for a missing field or invalid secret.
    pub skipped: usize,
    /// Accepted accounts, with fresh ids and collision-free names.
    pub added: Vec<Account>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Secret rejection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Why a user-supplied secret was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretRejection {
    /// Normalised length is not 16 or 32.
    BadLength,
    /// A character outside `A–Z2–7`.
    BadAlphabet,
}

impl fmt::Display for SecretRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadLength => write!(f, "bad length"),
            Self::BadAlphabet => write!(f, "bad alphabet"),
        }
    }
}

impl From<SecretRejection> for TotpError {
    fn from(r: SecretRejection) -> Self {
        let detail = match r {
            SecretRejection::BadLength => "secret must be 16 or 32 characters",
            SecretRejection::BadAlphabet => "secret may only contain A-Z and 2-7",
        };
        TotpError::new(TotpErrorKind::InvalidSecret, r.to_string()).with_detail(detail)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error kind for this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotpErrorKind {
    InvalidSecret,
    InvalidUri,
    DecodeFailed,
    UnrecognizedFormat,
    MalformedJson,
    NoValidRecords,
    NothingImported,
    ExportFailed,
    InvalidInput,
    NotFound,
    StorageError,
    QrEncodeFailed,
    Internal,
}

/// Coarse error family, used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad secret format; user-correctable.
    Validation,
    /// Malformed URI; the single record can be skipped.
    Parse,
    /// Whole-batch import failure.
    Import,
    /// Base32 decode failure on a supposedly valid secret.
    Decode,
    /// Everything else.
    Other,
}

/// Crate-level error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotpError {
    pub kind: TotpErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl fmt::Display for TotpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(d) = &self.detail {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for TotpError {}

impl TotpError {
    pub fn new(kind: TotpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        match self.kind {
            TotpErrorKind::InvalidSecret => ErrorCategory::Validation,
            TotpErrorKind::InvalidUri => ErrorCategory::Parse,
            TotpErrorKind::UnrecognizedFormat
            | TotpErrorKind::MalformedJson
            | TotpErrorKind::NoValidRecords
            | TotpErrorKind::NothingImported => ErrorCategory::Import,
            TotpErrorKind::DecodeFailed => ErrorCategory::Decode,
            _ => ErrorCategory::Other,
        }
    }
}

impl From<TotpError> for String {
    fn from(e: TotpError) -> String {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Account ──────────────────────────────────────────────────

    #[test]
    fn account_create_normalises_fields() {
        let acct = Account::create("  alice  ", " GitHub ", "jbsw y3dp ehpk 3pxp").unwrap();
        assert_eq!(acct.name, "alice");
        assert_eq!(acct.issuer, "GitHub");
        assert_eq!(acct.secret, "JBSWY3DPEHPK3PXP");
        assert!(!acct.id.is_empty());
    }

    #[test]
    fn account_create_rejects_blank_name() {
        let err = Account::create("   ", "", "JBSWY3DPEHPK3PXP").unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::InvalidInput);
    }

    #[test]
    fn account_create_rejects_bad_secret() {
        let err = Account::create("alice", "", "SHORT").unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::InvalidSecret);
        assert_eq!(err.message, "bad length");
    }

    #[test]
    fn account_ids_are_unique() {
        let a = Account::create("a", "", "JBSWY3DPEHPK3PXP").unwrap();
        let b = Account::create("a", "", "JBSWY3DPEHPK3PXP").unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn account_display_name() {
        let a = Account::create("alice", "GitHub", "JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(a.display_name(), "GitHub (alice)");
        let b = Account::create("alice", "", "JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(b.display_name(), "alice");
    }

    #[test]
    fn account_json_schema() {
        let a = Account {
            id: "1".into(),
            name: "alice".into(),
            issuer: "".into(),
            secret: "JBSWY3DPEHPK3PXP".into(),
        };
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"id": "1", "name": "alice", "issuer": "", "secret": "JBSWY3DPEHPK3PXP"})
        );
    }

    #[test]
    fn account_missing_issuer_defaults_empty() {
        let a: Account =
            serde_json::from_str(r#"{"id":"1","name":"n","secret":"JBSWY3DPEHPK3PXP"}"#).unwrap();
        assert_eq!(a.issuer, "");
    }

    // ── ImportCandidate ──────────────────────────────────────────

    #[test]
    fn candidate_from_json_ignores_non_strings() {
        let v = serde_json::json!({"name": 42, "issuer": "X", "secret": null});
        let c = ImportCandidate::from_json(&v);
        assert!(c.name.is_none());
        assert_eq!(c.issuer.as_deref(), Some("X"));
        assert!(c.secret.is_none());
        assert!(!c.is_complete());
    }

    #[test]
    fn candidate_blank_name_is_missing() {
        let c = ImportCandidate {
            name: Some("  ".into()),
            issuer: None,
            secret: Some("JBSWY3DPEHPK3PXP".into()),
        };
        assert!(c.clean_name().is_none());
        assert_eq!(c.clean_issuer(), "");
    }

    // ── GeneratedCode ────────────────────────────────────────────

    #[test]
    fn generated_code_expiring_threshold() {
        let mut code = GeneratedCode {
            account_id: "a".into(),
            code: "123456".into(),
            remaining_seconds: 6,
            period: PERIOD,
            progress: 0.8,
        };
        assert!(!code.is_expiring());
        code.remaining_seconds = 5;
        assert!(code.is_expiring());
    }

    // ── Formats ──────────────────────────────────────────────────

    #[test]
    fn export_format_file_metadata() {
        assert_eq!(ExportFormat::Json.file_extension(), "json");
        assert_eq!(ExportFormat::Uri.file_extension(), "txt");
        assert_eq!(ExportFormat::Json.mime_type(), "application/json");
        assert_eq!(ExportFormat::Uri.mime_type(), "text/plain");
    }

    #[test]
    fn import_format_serde() {
        let f: ImportFormat = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(f, ImportFormat::Auto);
        assert_eq!(serde_json::to_string(&ImportFormat::Uri).unwrap(), "\"uri\"");
    }

    // ── Error ────────────────────────────────────────────────────

    #[test]
    fn error_display() {
        let err = TotpError::new(TotpErrorKind::InvalidUri, "missing secret")
            .with_detail("otpauth://totp/x");
        let s = err.to_string();
        assert!(s.contains("InvalidUri"));
        assert!(s.contains("missing secret"));
        assert!(s.contains("otpauth://totp/x"));
    }

    #[test]
    fn error_categories() {
        let cat = |k| TotpError::new(k, "").category();
        assert_eq!(cat(TotpErrorKind::InvalidSecret), ErrorCategory::Validation);
        assert_eq!(cat(TotpErrorKind::InvalidUri), ErrorCategory::Parse);
        assert_eq!(cat(TotpErrorKind::NothingImported), ErrorCategory::Import);
        assert_eq!(cat(TotpErrorKind::UnrecognizedFormat), ErrorCategory::Import);
        assert_eq!(cat(TotpErrorKind::DecodeFailed), ErrorCategory::Decode);
        assert_eq!(cat(TotpErrorKind::NotFound), ErrorCategory::Other);
    }

    #[test]
    fn secret_rejection_into_error() {
        let err: TotpError = SecretRejection::BadAlphabet.into();
        assert_eq!(err.kind, TotpErrorKind::InvalidSecret);
        assert_eq!(err.message, "bad alphabet");
        assert!(err.detail.is_some());
    }

    #[test]
    fn error_into_string() {
        let err = TotpError::new(TotpErrorKind::NotFound, "missing");
        let s: String = err.into();
        assert!(s.contains("NotFound"));
    }
}
