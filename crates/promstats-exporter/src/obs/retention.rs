//! Background retention task.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use super::PrometheusHandler;

/// Expire stale series every `every` until `shutdown` flips to true.
pub async fn run_cleanup(handler: Arc<PrometheusHandler>, every: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = handler.cleanup(SystemTime::now());
                if removed > 0 {
                    tracing::debug!(removed, live = handler.store().len(), "retention pass");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    tracing::info!("retention task stopped");
                    return;
                }
            }
        }
    }
}
