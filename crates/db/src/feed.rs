//! Change-notification feed for the admin order board.
//!
//! Cross-session visibility works by polling the shared order store, but
//! consumers only care about *changes*. The feed polls on an interval,
//! fingerprints the snapshot, and publishes through a watch channel only when
//! the fingerprint moves, so subscribers wake exactly once per real change.

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::warn;

use smartmenu_core::Order;

use crate::repositories::OrderRepository;

/// Board depth; older orders fall off the feed.
const FEED_LIMIT: u32 = 100;

#[derive(Clone, Debug, Default)]
pub struct OrderSnapshot {
    pub digest: String,
    pub orders: Vec<Order>,
}

/// Order-insensitive fingerprint over the fields the board renders. Status
/// flips and new orders change it; reordering of equal data does not.
pub fn snapshot_digest(orders: &[Order]) -> String {
    let mut keys: Vec<(&str, &str, i64, usize)> = orders
        .iter()
        .map(|order| (order.id.0.as_str(), order.status.as_str(), order.total_kzt, order.lines.len()))
        .collect();
    keys.sort();

    let mut hasher = Sha256::new();
    for (id, status, total, line_count) in keys {
        hasher.update(id.as_bytes());
        hasher.update([0u8]);
        hasher.update(status.as_bytes());
        hasher.update([0u8]);
        hasher.update(total.to_le_bytes());
        hasher.update((line_count as u64).to_le_bytes());
    }
    hasher.finalize().iter().map(|byte| format!("{byte:02x}")).collect()
}

pub struct OrderFeed {
    receiver: watch::Receiver<OrderSnapshot>,
}

impl OrderFeed {
    /// Starts the polling task. The task stops once every subscriber
    /// (including the returned feed) is dropped.
    pub fn spawn(
        repository: Arc<dyn OrderRepository>,
        poll_interval: Duration,
    ) -> (Self, JoinHandle<()>) {
        let initial = OrderSnapshot { digest: snapshot_digest(&[]), orders: Vec::new() };
        let (sender, receiver) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if sender.is_closed() {
                    break;
                }

                let orders = match repository.list_recent(FEED_LIMIT).await {
                    Ok(orders) => orders,
                    Err(error) => {
                        warn!(%error, "order feed poll failed");
                        continue;
                    }
                };

                let digest = snapshot_digest(&orders);
                let dirty = sender.borrow().digest != digest;
                if dirty && sender.send(OrderSnapshot { digest, orders }).is_err() {
                    break;
                }
            }
        });

        (Self { receiver }, handle)
    }

    pub fn subscribe(&self) -> watch::Receiver<OrderSnapshot> {
        self.receiver.clone()
    }

    pub fn latest(&self) -> OrderSnapshot {
        self.receiver.borrow().clone()
    }
}
