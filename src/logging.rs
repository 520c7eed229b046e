//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the configured level is used. The
//! engine logs through `log`, which the subscriber picks up via its
//! `tracing-log` bridge. JSON output is selected by the `logs-json` feature
//! or by `log_json` in the config.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AppConfig;
use crate::error::{HostError, Result};

/// Build the filter: `RUST_LOG` if present and valid, else `fallback`.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// `true` if log lines should be JSON.
pub fn wants_json(config: &AppConfig) -> bool {
    cfg!(feature = "logs-json") || config.log_json
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &AppConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(&config.log_level));
    let installed = if wants_json(config) {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    installed.map_err(|e| HostError::Logging(e.to_string()))?;

    tracing::info!("Starting twofold v{}", env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_follows_config() {
        let mut c = AppConfig::default();
        c.log_json = true;
        assert!(wants_json(&c));
        c.log_json = false;
        assert_eq!(wants_json(&c), cfg!(feature = "logs-json"));
    }

    #[test]
    fn invalid_fallback_still_builds_filter() {
        // Must not panic on garbage directives.
        let _ = env_filter("=[not a directive");
    }
}
