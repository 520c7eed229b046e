//! Error types for the host layer

use thiserror::Error;
use twofold_totp::totp::TotpError;

/// Result type alias for host operations
pub type Result<T> = std::result::Result<T, HostError>;

/// Host error types
#[derive(Error, Debug)]
pub enum HostError {
    /// Config file could not be read
    #[error("Config I/O error on {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`AppConfig`](crate::config::AppConfig)
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Logger could not be installed (usually: already installed)
    #[error("Logging init error: {0}")]
    Logging(String),

    /// Error from the account engine
    #[error(transparent)]
    Totp(#[from] TotpError),
}

impl From<HostError> for String {
    fn from(e: HostError) -> String {
        e.to_string()
    }
}
