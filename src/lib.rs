//! # Twofold host
//!
//! Wires the account engine to the outside world: configuration, logging,
//! a JSON-file account store and the periodic code ticker.

pub mod config;
pub mod error;
pub mod logging;
pub mod storage;
pub mod ticker;

use std::sync::Arc;

pub use config::AppConfig;
pub use error::{HostError, Result};
pub use storage::JsonFileStore;
pub use ticker::{spawn_ticker, Ticker};

use twofold_totp::totp::{
    AuthenticatorService, AuthenticatorState, DomainProvider, ExportFormat, SystemClock,
};

/// A running host: shared service state plus its ticker.
pub struct App {
    pub config: AppConfig,
    pub state: AuthenticatorState,
    pub ticker: Ticker,
}

/// A backup ready to hand to a download or save dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    pub filename: String,
    pub mime_type: &'static str,
    pub contents: String,
}

impl App {
    /// Start ticking over an already bootstrapped state.
    pub fn start(config: AppConfig, state: AuthenticatorState) -> Self {
        let ticker = spawn_ticker(state.clone(), config.tick_interval());
        Self {
            config,
            state,
            ticker,
        }
    }

    /// Export in the configured default format. `None` when there is
    /// nothing to export.
    pub async fn export_default(&self) -> Result<Option<Backup>> {
        self.export(self.config.default_export_format).await
    }

    pub async fn export(&self, format: ExportFormat) -> Result<Option<Backup>> {
        let service = self.state.lock().await;
        let Some(contents) = service.export(format)? else {
            return Ok(None);
        };
        Ok(Some(Backup {
            filename: service.export_filename(format),
            mime_type: format.mime_type(),
            contents,
        }))
    }
}

/// Build a service backed by the configured JSON file and load it.
pub async fn bootstrap(
    config: &AppConfig,
    domain: Arc<dyn DomainProvider>,
) -> AuthenticatorState {
    // Initialize storage
    let store = Arc::new(JsonFileStore::new(config.storage_path.clone()));

    let mut service = AuthenticatorService::new(store, Arc::new(SystemClock), domain);
    let count = service.load().await;
    log::info!(
        "bootstrap: {} accounts from {}",
        count,
        config.storage_path.display()
    );
    service.into_state()
}

/// Install logging, bootstrap the service and start ticking.
pub async fn run(config: AppConfig, domain: Arc<dyn DomainProvider>) -> Result<App> {
    logging::init_logging(&config)?;
    let state = bootstrap(&config, domain).await;
    Ok(App::start(config, state))
}
