//! Periodic re-hydration of a shared cart.
//!
//! One tokio task per handle. Dropping the [`RefreshHandle`] aborts it;
//! [`RefreshHandle::shutdown`] stops it gracefully and waits.

use crate::repository::CartRepository;
use crate::store::CartStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Owner of a running refresh task.
pub struct RefreshHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Refresh `store` every `period`, starting one period from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<R>(store: Arc<CartStore<R>>, period: Duration) -> Self
    where
        R: CartRepository + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        if let Err(e) = store.refresh().await {
                            debug!("Scheduled cart refresh failed: {}", e);
                        }
                    }
                }
            }
            debug!("Cart refresh task stopped");
        });

        info!("Cart refresh scheduled every {:?}", period);
        RefreshHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the task and wait for an in-flight refresh to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Cart refresh task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
