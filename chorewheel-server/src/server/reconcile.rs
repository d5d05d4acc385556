//! Periodic timer reconciliation.
//!
//! The lifecycle engine exposes deadlines; this task makes them enforced
//! rather than advisory. Runs until the shutdown token fires.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::lifecycle::Engine;

pub fn spawn_sweep(
    engine: Engine,
    interval: Duration,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    match engine.sweep_timers().await {
                        Ok(outcome) if !outcome.is_empty() => {
                            tracing::info!(
                                acceptances_expired = outcome.acceptances_expired,
                                penalties_applied = outcome.penalties_applied,
                                "timer sweep applied consequences"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!(error=%e, "timer sweep failed; will retry next tick");
                        }
                    }
                }
            }
        }
        tracing::debug!("timer sweep stopped");
    })
}
