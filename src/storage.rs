//! # Account File Storage
//!
//! JSON-file implementation of the engine's [`AccountStore`] boundary.
//!
//! ## Features
//!
//! - Pretty-printed JSON array of `{id, name, issuer, secret}` records
//! - Parent directories created on first save
//! - Serialised access through an async mutex
//! - Never fails a load: a missing or unreadable file yields an empty list
//!
//! ## Security
//!
//! Secrets are stored in plain text. Encryption at rest is out of scope for
//! this store; put the file on an encrypted volume if that matters.
//!
//! ## Example
//!
//! ```rust,no_run
//! use twofold_lib::storage::JsonFileStore;
//! use twofold_totp::totp::AccountStore;
//!
//! # async fn example() -> Result<(), twofold_totp::totp::TotpError> {
//! let store = JsonFileStore::new("accounts.json");
//! let accounts = store.load().await;
//! store.save(&accounts).await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use twofold_totp::totp::{Account, AccountStore, TotpError, TotpErrorKind};

/// Account store backed by a single JSON file.
///
/// Reads and writes go through one async mutex, so a save never
/// interleaves with another save or with a load on the same instance.
pub struct JsonFileStore {
    /// File path where the account list is stored
    path: PathBuf,
    /// Serialises file access
    io_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Creates a store for the given file path.
    ///
    /// Nothing is touched on disk until the first [`save`](AccountStore::save).
    ///
    /// # Arguments
    ///
    /// * `path` - The file path where accounts should be stored (e.g. "accounts.json")
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io_lock: Mutex::new(()),
        }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checks whether a storage file exists at the configured path.
    pub fn has_stored_data(&self) -> bool {
        self.path.exists()
    }

    /// Deletes the storage file. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the file exists but cannot be removed.
    pub async fn clear(&self) -> Result<(), TotpError> {
        let _guard = self.io_lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("remove", &self.path, e)),
        }
    }
}

#[async_trait::async_trait]
impl AccountStore for JsonFileStore {
    /// Loads the account list.
    ///
    /// Returns an empty list when the file does not exist, cannot be read,
    /// or does not hold a JSON account array. Non-missing failures are
    /// logged at `warn`.
    async fn load(&self) -> Vec<Account> {
        let _guard = self.io_lock.lock().await;
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("storage: {} not found, starting empty", self.path.display());
                return Vec::new();
            }
            Err(e) => {
                log::warn!("storage: cannot read {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Account>>(&data) {
            Ok(accounts) => accounts,
            Err(e) => {
                log::warn!("storage: {} is corrupt, starting empty: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// Writes the full account list as pretty JSON, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if serialisation or any file operation fails.
    async fn save(&self, accounts: &[Account]) -> Result<(), TotpError> {
        let _guard = self.io_lock.lock().await;
        let json = serde_json::to_string_pretty(accounts).map_err(|e| {
            TotpError::new(TotpErrorKind::StorageError, format!("serialise error: {}", e))
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error("create directory for", &self.path, e))?;
        }
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| storage_error("write", &self.path, e))?;
        log::debug!("storage: saved {} accounts", accounts.len());
        Ok(())
    }
}

fn storage_error(action: &str, path: &Path, e: std::io::Error) -> TotpError {
    TotpError::new(
        TotpErrorKind::StorageError,
        format!("cannot {} {}", action, path.display()),
    )
    .with_detail(e.to_string())
}
