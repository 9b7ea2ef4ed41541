use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::ConfigError;
use crate::model::generation::{Generation, GenerationCounter};
use crate::model::query::Query;
use crate::model::store::ResultStore;
use crate::services::operation::Operation;
use crate::services::runner::OperationRunner;
use crate::services::timer::Timer;

/// Validated controller options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    /// Quiet period before the operation runs.
    pub delay: Duration,
    /// Blank queries clear the store right away instead of being scheduled.
    pub skip_empty_query: bool,
    /// Tear down superseded tasks on the executor, not only logically.
    pub abort_superseded: bool,
}

impl DebounceConfig {
    pub const DEFAULT_DELAY_MS: i64 = 300;

    /// Fails on a negative delay.
    pub fn from_millis(delay_ms: i64, skip_empty_query: bool) -> Result<Self, ConfigError> {
        let millis =
            u64::try_from(delay_ms).map_err(|_| ConfigError::NegativeDelay(delay_ms))?;
        Ok(Self {
            delay: Duration::from_millis(millis),
            skip_empty_query,
            abort_superseded: true,
        })
    }

    pub fn with_abort_superseded(mut self, abort_superseded: bool) -> Self {
        self.abort_superseded = abort_superseded;
        self
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(Self::DEFAULT_DELAY_MS as u64),
            skip_empty_query: true,
            abort_superseded: true,
        }
    }
}

/// Collapses a burst of query changes into one operation run after the input
/// has been quiet for `delay`.
///
/// Every `submit` starts a new generation, so results from earlier ones are
/// dropped however late they arrive. Dropping the controller cancels the
/// pending timer, invalidates whatever is still in flight and resets the
/// store to Idle.
pub struct DebounceController<P: Send + Sync + 'static> {
    config: DebounceConfig,
    generations: GenerationCounter,
    runner: OperationRunner<P>,
    timer: Timer,
    last: Option<(Query, Generation)>,
}

impl<P: Send + Sync + 'static> DebounceController<P> {
    pub fn new(config: DebounceConfig, operation: impl Operation<P>) -> Self {
        Self::with_store(config, operation, ResultStore::new())
    }

    /// Writes into a store the consumer already holds.
    pub fn with_store(
        config: DebounceConfig,
        operation: impl Operation<P>,
        store: ResultStore<P>,
    ) -> Self {
        let generations = GenerationCounter::new();
        let runner = OperationRunner::new(Arc::new(operation), generations.clone(), store);
        Self {
            config,
            generations,
            runner,
            timer: Timer::new(),
            last: None,
        }
    }

    pub fn config(&self) -> &DebounceConfig {
        &self.config
    }

    pub fn store(&self) -> ResultStore<P> {
        self.runner.store().clone()
    }

    pub fn current_generation(&self) -> Generation {
        self.generations.current()
    }

    /// A timer is waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.timer.is_pending()
    }

    pub fn submit(&mut self, query: impl Into<Query>) -> Generation {
        let query = query.into();
        let generation = self.generations.advance();
        self.supersede();

        if self.config.skip_empty_query && query.is_blank() {
            self.last = None;
            self.runner.store().reset(generation);
            debug!(%generation, "blank query, store cleared");
            return generation;
        }

        debug!(%generation, %query, delay = ?self.config.delay, "query scheduled");
        self.schedule(query, generation, self.config.delay);
        generation
    }

    /// Clears the pending timer without scheduling anything new.
    pub fn cancel(&mut self) -> bool {
        let cleared = self.timer.cancel();
        if cleared {
            debug!(generation = %self.generations.current(), "pending timer cancelled");
        }
        cleared
    }

    /// Runs the waiting query now instead of after the quiet period.
    /// Does nothing once the timer has fired: that run is already underway.
    pub fn flush(&mut self) -> bool {
        let Some((query, generation)) = self.last.clone() else {
            return false;
        };
        if !self.timer.cancel() {
            return false;
        }
        debug!(%generation, %query, "flushing pending query");
        self.schedule(query, generation, Duration::ZERO);
        true
    }

    /// Resets the store to Idle and invalidates the pending timer and any
    /// operation in flight, so nothing older can land afterwards.
    pub fn clear(&mut self) -> Generation {
        let generation = self.generations.advance();
        self.supersede();
        self.last = None;
        self.runner.store().reset(generation);
        debug!(%generation, "store cleared");
        generation
    }

    fn schedule(&mut self, query: Query, generation: Generation, delay: Duration) {
        self.last = Some((query.clone(), generation));
        let runner = self.runner.clone();
        self.timer.schedule(delay, move || async move {
            runner.run(query, generation).await;
        });
    }

    fn supersede(&mut self) {
        if self.config.abort_superseded {
            self.timer.abort();
        } else {
            self.timer.cancel();
        }
    }
}

impl<P: Send + Sync + 'static> Drop for DebounceController<P> {
    fn drop(&mut self) {
        self.clear();
    }
}
