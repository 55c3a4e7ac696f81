//! Periodic read refresh.
//!
//! # Responsibilities
//! - Re-issue a fixed key set on an interval
//! - Publish each round's results to an optional subscriber
//! - Exit on the shutdown broadcast

use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time;

use crate::reads::layer::ReadLayer;
use crate::reads::types::{ReadKey, ReadValue};

/// One polling round: each key with its value, `None` meaning no data yet.
pub type PollRound = Vec<(ReadKey, Option<ReadValue>)>;

pub struct Poller {
    name: &'static str,
    reads: ReadLayer,
    keys: Vec<ReadKey>,
    interval: Duration,
    updates: Option<mpsc::UnboundedSender<PollRound>>,
}

impl Poller {
    pub fn new(name: &'static str, reads: ReadLayer, keys: Vec<ReadKey>, interval: Duration) -> Self {
        Self {
            name,
            reads,
            keys,
            interval,
            updates: None,
        }
    }

    /// Send every round's results to `tx`.
    pub fn with_updates(mut self, tx: mpsc::UnboundedSender<PollRound>) -> Self {
        self.updates = Some(tx);
        self
    }

    /// Run a single round.
    pub async fn poll_once(&self) -> PollRound {
        let values = self.reads.fetch_many(&self.keys).await;
        self.keys.iter().cloned().zip(values).collect()
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if self.keys.is_empty() {
            tracing::info!(poller = self.name, "No keys to poll");
            return;
        }

        tracing::info!(
            poller = self.name,
            keys = self.keys.len(),
            interval_ms = self.interval.as_millis() as u64,
            "Poller starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let round = self.poll_once().await;
                    if let Some(tx) = &self.updates {
                        if tx.send(round).is_err() {
                            tracing::debug!(poller = self.name, "Update receiver dropped, stopping");
                            break;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!(poller = self.name, "Poller received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
