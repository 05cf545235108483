//! Expiration Index and Background Sweeper
//!
//! Keys with a deadline are expired two ways:
//!
//! 1. **Passive**: every engine operation checks the key's deadline first and,
//!    if it has passed, removes the key before doing anything else.
//! 2. **Active**: [`ExpirySweeper`] wakes up once per interval (1s by default)
//!    and removes every key whose deadline has passed, accessed or not.
//!
//! The [`ExpirationIndex`] itself is a plain map; it lives inside the engine's
//! key space and is only ever touched while holding the engine lock, so both
//! paths see the same state.

use crate::storage::StorageEngine;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error, info, trace};

/// Key → absolute deadline.
///
/// A key with no entry here never expires.
#[derive(Debug, Default, Clone)]
pub struct ExpirationIndex {
    deadlines: HashMap<String, Instant>,
}

impl ExpirationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deadline of `key` to `now + ttl`, replacing any previous one.
    pub fn set_deadline(&mut self, key: &str, ttl: Duration, now: Instant) {
        self.deadlines.insert(key.to_string(), now + ttl);
    }

    /// Removes the deadline of `key`.
    ///
    /// Returns `true` if there was one.
    pub fn clear_deadline(&mut self, key: &str) -> bool {
        self.deadlines.remove(key).is_some()
    }

    pub fn deadline(&self, key: &str) -> Option<Instant> {
        self.deadlines.get(key).copied()
    }

    /// True if `key` has a deadline and `now` is strictly past it.
    #[inline]
    pub fn has_passed(&self, key: &str, now: Instant) -> bool {
        self.deadlines
            .get(key)
            .map(|deadline| now > *deadline)
            .unwrap_or(false)
    }

    /// Time left before `key` expires, or `None` if it has no deadline.
    pub fn remaining(&self, key: &str, now: Instant) -> Option<Duration> {
        self.deadlines
            .get(key)
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// All keys whose deadline is before `now`.
    pub fn expired_keys(&self, now: Instant) -> Vec<String> {
        self.deadlines
            .iter()
            .filter(|(_, deadline)| now > **deadline)
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
    }
}

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct ExpiryConfig {
    /// Time between two sweeps (default: 1s)
    pub interval: Duration,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

/// A handle to the running expiry sweeper.
///
/// When this handle is dropped, the sweeper task will be stopped.
#[derive(Debug)]
pub struct ExpirySweeper {
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirySweeper {
    /// Spawns the sweeper on the current Tokio runtime.
    ///
    /// The sweeper keeps running until [`stop`](Self::stop) is called or the
    /// handle is dropped.
    pub fn start(engine: Arc<StorageEngine>, config: ExpiryConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(sweeper_loop(engine, config.clone(), shutdown_rx));

        info!(
            interval_ms = config.interval.as_millis(),
            "Background expiry sweeper started"
        );

        Self { shutdown_tx }
    }

    /// Stops the expiry sweeper.
    pub fn stop(&self) {
        if self.shutdown_tx.send(true).is_ok() {
            info!("Background expiry sweeper stopped");
        }
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweeper_loop(
    engine: Arc<StorageEngine>,
    config: ExpiryConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }

        // A faulting scan is logged and the loop carries on with the next one
        match panic::catch_unwind(AssertUnwindSafe(|| engine.cleanup_expired())) {
            Ok(0) => trace!("Sweep found no expired keys"),
            Ok(expired) => debug!(
                expired = expired,
                keys_remaining = engine.len(),
                "Expired keys cleaned up"
            ),
            Err(_) => error!("Expiry sweep panicked; continuing with next interval"),
        }
    }
}

/// Starts the expiry sweeper with default configuration.
pub fn start_expiry_sweeper(engine: Arc<StorageEngine>) -> ExpirySweeper {
    ExpirySweeper::start(engine, ExpiryConfig::default())
}
