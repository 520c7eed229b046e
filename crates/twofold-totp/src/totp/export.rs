//! Export accounts as a JSON backup or as `otpauth://` URIs.

use chrono::{DateTime, Utc};

use crate::totp::types::*;
use crate::totp::uri;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Public API
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Export accounts in the requested format.
///
/// `Ok(None)` means there was nothing to export; it is not an error.
pub fn export_accounts(
    accounts: &[Account],
    format: ExportFormat,
) -> Result<Option<String>, TotpError> {
    if accounts.is_empty() {
        log::info!("export: nothing to export");
        return Ok(None);
    }
    let content = match format {
        ExportFormat::Json => export_json(accounts)?,
        ExportFormat::Uri => uri::build_otpauth_uris(accounts),
    };
    log::info!("export: wrote {} accounts as {}", accounts.len(), format);
    Ok(Some(content))
}

/// Download name for a backup taken at `now`, e.g.
/// `2fa-backup-2024-01-31T12-34-56.json`.
pub fn suggested_filename(format: ExportFormat, now: DateTime<Utc>) -> String {
    format!(
        "2fa-backup-{}.{}",
        now.format("%Y-%m-%dT%H-%M-%S"),
        format.file_extension()
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  JSON
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn export_json(accounts: &[Account]) -> Result<String, TotpError> {
    serde_json::to_string_pretty(accounts).map_err(|e| {
        TotpError::new(
            TotpErrorKind::ExportFailed,
            format!("JSON serialise error: {}", e),
        )
    })
}
