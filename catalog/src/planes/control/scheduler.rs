use crate::planes::data::{CatalogCache, DEFAULT_REFRESH_INTERVAL};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Foreground/background flag for the page (or session) that owns the cache.
///
/// Only transitions notify watchers; setting the current value again is a no-op.
#[derive(Clone, Debug)]
pub struct Visibility {
    tx: watch::Sender<bool>,
}

impl Visibility {
    pub fn new(visible: bool) -> Self {
        let (tx, _) = watch::channel(visible);
        Self { tx }
    }

    pub fn set(&self, visible: bool) {
        self.tx.send_if_modified(|current| {
            if *current == visible {
                return false;
            }
            *current = visible;
            true
        });
    }

    pub fn is_visible(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Periodic staleness check for one brand, gated on visibility.
pub struct RefreshScheduler;

impl RefreshScheduler {
    /// Spawn the scheduler task. Every `every` it runs [`CatalogCache::refresh_if_stale`]
    /// while visible, and it also runs the check as soon as visibility comes back.
    /// A zero period is replaced by [`DEFAULT_REFRESH_INTERVAL`].
    pub fn spawn(
        cache: CatalogCache,
        brand_id: impl Into<String>,
        every: Duration,
        visibility: &Visibility,
    ) -> SchedulerHandle {
        let brand_id = brand_id.into();
        let every = if every.is_zero() {
            warn!(
                "Zero refresh period for brand '{}', using {:?}",
                brand_id, DEFAULT_REFRESH_INTERVAL
            );
            DEFAULT_REFRESH_INTERVAL
        } else {
            every
        };
        let mut visible = visibility.subscribe();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            let mut watching = true;
            info!("Refresh scheduler started for brand '{}' every {:?}", brand_id, every);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        if *visible.borrow() {
                            cache.refresh_if_stale(&brand_id).await;
                        } else {
                            debug!("Page hidden, skipping scheduled refresh for '{}'", brand_id);
                        }
                    }
                    changed = visible.changed(), if watching => {
                        if changed.is_err() {
                            watching = false;
                            continue;
                        }
                        if *visible.borrow_and_update() {
                            debug!("Page visible again, checking catalog for '{}'", brand_id);
                            cache.refresh_if_stale(&brand_id).await;
                        }
                    }
                }
            }

            info!("Refresh scheduler stopped for brand '{}'", brand_id);
        });

        SchedulerHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Stops the scheduler when shut down or dropped.
pub struct SchedulerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
