//! Periodic code refresh.
//!
//! The engine never owns a clock thread; this task calls
//! [`AuthenticatorService::tick`](twofold_totp::totp::AuthenticatorService::tick)
//! on a fixed interval and publishes each snapshot on a `watch` channel.
//! Stop it by aborting the returned handle.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use twofold_totp::totp::{AuthenticatorState, GeneratedCode};

/// Handle to a running ticker.
pub struct Ticker {
    pub codes: watch::Receiver<Vec<GeneratedCode>>,
    pub task: tokio::task::JoinHandle<()>,
}

impl Ticker {
    pub fn stop(&self) {
        self.task.abort();
    }
}

/// Spawn a background task that refreshes codes every `interval`
/// (at least one second).
///
/// A failed tick is logged and the previous snapshot is kept. Missed ticks
/// are skipped rather than bunched.
pub fn spawn_ticker(state: AuthenticatorState, interval: Duration) -> Ticker {
    let (tx, rx) = watch::channel(Vec::new());
    let period = interval.max(Duration::from_secs(1));

    let task = tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let result = state.lock().await.tick();
            match result {
                Ok(codes) => {
                    if tx.send(codes).is_err() {
                        log::debug!("ticker: all receivers dropped, stopping");
                        break;
                    }
                }
                Err(e) => log::error!("ticker: code refresh failed: {}", e),
            }
        }
    });

    Ticker { codes: rx, task }
}
