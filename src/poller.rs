//! Periodic timers for the live screens
//!
//! There is no push channel; screens are kept current by a clock that ticks
//! and a refresher that refetches. Both run as tokio tasks and stop when
//! their handle is dropped. A refresh may run while a save is in flight.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::error::Result;

/// Publishes the current time every period
pub struct Ticker {
    rx: watch::Receiver<DateTime<Utc>>,
    handle: JoinHandle<()>,
}

impl Ticker {
    pub fn spawn(period: Duration) -> Self {
        let (tx, rx) = watch::channel(Utc::now());

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(Utc::now()).is_err() {
                    break;
                }
            }
        });

        Self { rx, handle }
    }

    pub fn subscribe(&self) -> watch::Receiver<DateTime<Utc>> {
        self.rx.clone()
    }

    /// Time of the last tick
    pub fn now(&self) -> DateTime<Utc> {
        *self.rx.borrow()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Runs a fetch every period and publishes the latest successful result.
/// Failures are logged and the previous value is kept.
pub struct Refresher<T> {
    rx: watch::Receiver<Option<T>>,
    handle: JoinHandle<()>,
}

impl<T> Refresher<T>
where
    T: Send + Sync + 'static,
{
    pub fn spawn<F, Fut>(period: Duration, mut refresh: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(None);

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                match refresh().await {
                    Ok(value) => {
                        if tx.send(Some(value)).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "refresh failed"),
                }
            }
        });

        Self { rx, handle }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.rx.clone()
    }
}

impl<T> Drop for Refresher<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
