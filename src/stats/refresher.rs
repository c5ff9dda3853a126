//! StatsRefresher - keeps an aggregator current in the background
//!
//! One task, four triggers:
//!
//! | Trigger                    | Action                                   |
//! |----------------------------|------------------------------------------|
//! | spawn                      | `refresh_stats()`                        |
//! | connected address changes  | `refresh_stats()`, pending refetch dropped |
//! | interval tick              | `refresh_stats()` if the cache is stale  |
//! | contract event             | `refetch()` after the event delay        |
//!
//! Events arriving inside the delay window restart it, so a burst of
//! notifications costs one fetch.

use std::pin::Pin;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, Sleep};
use tracing::{debug, info};

use super::aggregator::UserStatsAggregator;
use crate::contract::ContractEvent;
use crate::wallet::address;

pub struct StatsRefresher {
    task: JoinHandle<()>,
}

impl StatsRefresher {
    /// Spawn the refresh loop. It runs until `shutdown` fires or `stop()`;
    /// dropping the handle detaches it.
    pub fn spawn(aggregator: UserStatsAggregator, shutdown: broadcast::Receiver<()>) -> Self {
        Self { task: tokio::spawn(run(aggregator, shutdown)) }
    }

    pub fn stop(&self) { self.task.abort(); }

    pub fn is_finished(&self) -> bool { self.task.is_finished() }

    /// Wait for the loop to exit (after shutdown)
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

async fn run(aggregator: UserStatsAggregator, mut shutdown: broadcast::Receiver<()>) {
    let config = *aggregator.config();
    let mut wallet = aggregator.session().watch_state();
    let mut events = aggregator.contract_events();
    let mut tick = tokio::time::interval_at(Instant::now() + config.refresh_interval, config.refresh_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pending: Option<Pin<Box<Sleep>>> = None;

    let mut current = wallet.borrow_and_update().address().map(str::to_string);
    refresh(&aggregator, "mount").await;

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            changed = wallet.changed() => {
                if changed.is_err() { break; }
                let next = wallet.borrow_and_update().address().map(str::to_string);
                if same_account(current.as_deref(), next.as_deref()) { continue; }
                current = next;
                pending = None;
                refresh(&aggregator, "account").await;
            }
            _ = tick.tick() => {
                if !aggregator.is_cache_valid() {
                    refresh(&aggregator, "interval").await;
                }
            }
            event = next_event(&mut events) => match event {
                Ok(event) => {
                    debug!(event = event.name(), "contract event, scheduling refetch");
                    pending = Some(Box::pin(tokio::time::sleep(config.event_refresh_delay)));
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "contract events lagged, scheduling refetch");
                    pending = Some(Box::pin(tokio::time::sleep(config.event_refresh_delay)));
                }
                Err(RecvError::Closed) => {
                    debug!("contract event stream closed");
                    events = None;
                }
            },
            _ = fire(&mut pending) => {
                pending = None;
                if let Err(e) = aggregator.refetch().await {
                    debug!(error = %e, "event refetch failed");
                }
            }
        }
    }
    info!("stats refresher stopped");
}

async fn refresh(aggregator: &UserStatsAggregator, trigger: &'static str) {
    if let Err(e) = aggregator.refresh_stats().await {
        debug!(trigger, error = %e, "stats refresh failed");
    }
}

fn same_account(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => address::same(a, b),
        (None, None) => true,
        _ => false,
    }
}

async fn next_event(events: &mut Option<broadcast::Receiver<ContractEvent>>) -> Result<ContractEvent, RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn fire(pending: &mut Option<Pin<Box<Sleep>>>) {
    match pending {
        Some(sleep) => sleep.await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_comparison_ignores_case() {
        assert!(same_account(Some("0xABC"), Some("0xabc")));
        assert!(same_account(None, None));
        assert!(!same_account(Some("0xabc"), None));
        assert!(!same_account(Some("0xabc"), Some("0xabd")));
    }
}
