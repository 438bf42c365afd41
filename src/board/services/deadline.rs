//! Periodic missed-deadline sweep.

use super::TaskBoardResult;
use crate::board::ports::BoardStore;
use crate::config::{ConfigError, DeadlineSweepConfig};
use mockable::Clock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Flags in-flight tasks whose deadline has passed.
///
/// The sweep only sets the `missed_deadline` flag; statuses and board
/// placements are never touched.
pub struct DeadlineSweepService<S, C>
where
    S: BoardStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    interval: Duration,
}

impl<S, C> Clone for DeadlineSweepService<S, C>
where
    S: BoardStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            interval: self.interval,
        }
    }
}

impl<S, C> DeadlineSweepService<S, C>
where
    S: BoardStore,
    C: Clock + Send + Sync,
{
    /// Creates a sweep that runs every `interval`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when `interval` is zero.
    pub fn new(store: Arc<S>, clock: Arc<C>, interval: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::Validation(
                "deadline sweep interval must be positive".to_owned(),
            ));
        }
        Ok(Self {
            store,
            clock,
            interval,
        })
    }

    /// Creates a sweep scheduled by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when the configured interval is
    /// zero.
    pub fn from_config(
        store: Arc<S>,
        clock: Arc<C>,
        config: &DeadlineSweepConfig,
    ) -> Result<Self, ConfigError> {
        Self::new(store, clock, config.interval())
    }

    /// Returns the time between sweeps.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs one sweep and returns the number of tasks flagged.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskBoardError::Store`] when the update fails.
    pub async fn run_once(&self) -> TaskBoardResult<u64> {
        let flagged = self.store.mark_missed_deadlines(self.clock.utc()).await?;
        if flagged == 0 {
            debug!("deadline sweep flagged no tasks");
        } else {
            info!(flagged, "deadline sweep flagged overdue tasks");
        }
        Ok(flagged)
    }

    /// Sweeps on every tick until `shutdown` resolves.
    ///
    /// The first sweep runs immediately. A failed sweep is logged and the
    /// loop carries on.
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(self.interval);
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    debug!("deadline sweep stopped");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.run_once().await {
                        error!(error = %err, "deadline sweep failed");
                    }
                }
            }
        }
    }
}
