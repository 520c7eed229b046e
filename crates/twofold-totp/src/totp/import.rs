//! Batch import from JSON or `otpauth://` URI text.
//!
//! Supported formats:
//! - JSON array of `{name, issuer, secret}` objects (or a single object)
//! - `otpauth://totp/` URIs, one per line
//!
//! The pipeline never touches the caller's list: it returns fresh accounts
//! with collision-free names for the caller to merge and persist.

use serde_json::Value;
use std::collections::HashSet;

use crate::totp::base32::validate_secret;
use crate::totp::types::*;
use crate::totp::uri;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Auto-detect + import
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Detect the format of import content.
pub fn detect_format(data: &str) -> Result<ImportFormat, TotpError> {
    let trimmed = data.trim();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return Ok(ImportFormat::Json);
    }
    if trimmed.contains("otpauth://") {
        return Ok(ImportFormat::Uri);
    }
    Err(TotpError::new(
        TotpErrorKind::UnrecognizedFormat,
        "unrecognized format",
    ))
}

/// Import accounts from `data`, resolving name collisions against
/// `existing` and against earlier records of the same batch.
pub fn import_accounts(
    data: &str,
    format: ImportFormat,
    existing: &[Account],
) -> Result<ImportResult, TotpError> {
    let (format, candidates) = parse_candidates(data, format)?;
    let total_found = candidates.len();

    let mut taken: HashSet<String> = existing.iter().map(|a| a.name.to_lowercase()).collect();
    let mut added = Vec::new();

    for (i, candidate) in candidates.iter().enumerate() {
        let (name, raw_secret) = match (candidate.clean_name(), candidate.raw_secret()) {
            (Some(n), Some(s)) => (n, s),
            _ => {
                log::debug!("import: record {} skipped: missing name or secret", i + 1);
                continue;
            }
        };
        let secret = match validate_secret(raw_secret) {
            Ok(s) => s,
            Err(reason) => {
                log::debug!("import: record {} skipped: {}", i + 1, reason);
                continue;
            }
        };

        let name = unique_name(name, &taken);
        taken.insert(name.to_lowercase());
        added.push(Account {
            id: new_account_id(),
            name,
            issuer: candidate.clean_issuer().to_string(),
            secret,
        });
    }

    if added.is_empty() {
        return Err(TotpError::new(
            TotpErrorKind::NothingImported,
            "nothing imported",
        )
        .with_detail(format!("all {} records were invalid", total_found)));
    }

    let count = added.len();
    log::info!(
        "import: accepted {} of {} {:?} records",
        count,
        total_found,
        format
    );
    Ok(ImportResult {
        format,
        total_found,
        count,
        skipped: total_found - count,
        added,
    })
}

/// Records that would be considered for import, without validation,
/// renaming or ids. Only candidates carrying a name and a secret are listed.
pub fn preview_import(data: &str, format: ImportFormat) -> Result<Vec<ImportCandidate>, TotpError> {
    let (_, candidates) = parse_candidates(data, format)?;
    Ok(candidates.into_iter().filter(ImportCandidate::is_complete).collect())
}

/// `base`, or `base (n)` with the first `n >= 1` not present in `taken`.
/// `taken` holds lowercased names.
pub fn unique_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(&base.to_lowercase()) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{} ({})", base, n))
        .find(|candidate| !taken.contains(&candidate.to_lowercase()))
        .unwrap_or_else(|| base.to_string())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Candidate extraction
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Resolve the format and extract raw candidates. Fails when nothing at
/// all could be extracted.
fn parse_candidates(
    data: &str,
    format: ImportFormat,
) -> Result<(ImportFormat, Vec<ImportCandidate>), TotpError> {
    let format = match format {
        ImportFormat::Auto => detect_format(data)?,
        explicit => explicit,
    };

    let candidates = match format {
        ImportFormat::Json => json_candidates(data)?,
        _ => uri::parse_otpauth_uris(data)
            .into_iter()
            .map(ImportCandidate::from)
            .collect(),
    };

    if candidates.is_empty() {
        return Err(TotpError::new(
            TotpErrorKind::NoValidRecords,
            "no valid records",
        ));
    }
    Ok((format, candidates))
}

fn json_candidates(data: &str) -> Result<Vec<ImportCandidate>, TotpError> {
    let val: Value = serde_json::from_str(data.trim()).map_err(|e| {
        TotpError::new(TotpErrorKind::MalformedJson, format!("JSON parse error: {}", e))
    })?;
    Ok(match val {
        Value::Array(items) => items.iter().map(ImportCandidate::from_json).collect(),
        single => vec![ImportCandidate::from_json(&single)],
    })
}
