use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ErrorKind, OperationError};
use crate::model::generation::{Generation, GenerationCounter};
use crate::model::query::Query;
use crate::model::result::Status;
use crate::model::store::ResultStore;
use crate::services::operation::{Operation, perform_caught};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The store now holds this terminal status.
    Applied(Status),
    /// A newer generation took over; nothing was written.
    Discarded,
}

/// Runs one operation per fired timer and writes its outcome to the store,
/// but only while its generation is still the current one.
pub struct OperationRunner<P> {
    operation: Arc<dyn Operation<P>>,
    generations: GenerationCounter,
    store: ResultStore<P>,
}

impl<P> Clone for OperationRunner<P> {
    fn clone(&self) -> Self {
        Self {
            operation: Arc::clone(&self.operation),
            generations: self.generations.clone(),
            store: self.store.clone(),
        }
    }
}

impl<P: Send + Sync + 'static> OperationRunner<P> {
    pub fn new(
        operation: Arc<dyn Operation<P>>,
        generations: GenerationCounter,
        store: ResultStore<P>,
    ) -> Self {
        Self {
            operation,
            generations,
            store,
        }
    }

    pub fn store(&self) -> &ResultStore<P> {
        &self.store
    }

    pub async fn run(&self, query: Query, generation: Generation) -> RunOutcome {
        let started = self.generations.with_current(generation, || {
            self.store.begin(query.clone(), generation);
        });
        if started.is_none() {
            debug!(%generation, %query, "superseded before start");
            return RunOutcome::Discarded;
        }

        debug!(%generation, %query, "operation started");
        let outcome = perform_caught(self.operation.as_ref(), query.clone()).await;
        let status = match &outcome {
            Ok(_) => Status::Success,
            Err(_) => Status::Failure,
        };
        let failure = outcome.as_ref().err().cloned();

        let applied = self.generations.with_current(generation, || {
            self.store.settle(query.clone(), generation, outcome);
        });

        match applied {
            Some(()) => {
                if let Some(err) = failure {
                    log_failure(generation, &query, &err);
                } else {
                    debug!(%generation, %query, "operation succeeded");
                }
                RunOutcome::Applied(status)
            }
            None => {
                debug!(%generation, %query, "stale result discarded");
                RunOutcome::Discarded
            }
        }
    }
}

fn log_failure(generation: Generation, query: &Query, err: &OperationError) {
    match err.kind {
        ErrorKind::Validation => {
            debug!(%generation, %query, error = %err, "validation failed");
        }
        _ => warn!(%generation, %query, error = %err, "operation failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_std::task;
    use std::time::Duration;

    fn runner_with<O: Operation<u32>>(operation: O) -> (OperationRunner<u32>, GenerationCounter) {
        let generations = GenerationCounter::new();
        let runner =
            OperationRunner::new(Arc::new(operation), generations.clone(), ResultStore::new());
        (runner, generations)
    }

    #[async_std::test]
    async fn applies_current_success() {
        let (runner, generations) = runner_with(|query: Query| async move {
            Ok::<_, OperationError>(query.len() as u32)
        });
        let generation = generations.advance();

        let outcome = runner.run(Query::from("react"), generation).await;
        assert_eq!(outcome, RunOutcome::Applied(Status::Success));

        let snapshot = runner.store().snapshot();
        assert_eq!(snapshot.payload(), Some(&5));
        assert_eq!(snapshot.generation, generation);
    }

    #[async_std::test]
    async fn failures_land_in_the_store() {
        let (runner, generations) = runner_with(|_query: Query| async move {
            Err::<u32, _>(OperationError::network("NetworkError"))
        });
        let generation = generations.advance();

        let outcome = runner.run(Query::from("react"), generation).await;
        assert_eq!(outcome, RunOutcome::Applied(Status::Failure));
        let snapshot = runner.store().snapshot();
        assert_eq!(snapshot.error().map(|e| e.kind), Some(ErrorKind::Network));
        assert!(snapshot.payload().is_none());
    }

    #[async_std::test]
    async fn panicking_operation_settles_as_failure() {
        let (runner, generations) = runner_with(|query: Query| async move {
            if query.as_str() == "boom" {
                panic!("operation blew up");
            }
            Ok::<u32, OperationError>(1)
        });
        let generation = generations.advance();

        let outcome = runner.run(Query::from("boom"), generation).await;
        assert_eq!(outcome, RunOutcome::Applied(Status::Failure));
        let snapshot = runner.store().snapshot();
        assert_eq!(snapshot.status(), Status::Failure);
        assert_eq!(snapshot.error().map(|e| e.kind), Some(ErrorKind::Panicked));
        assert_eq!(
            snapshot.error().map(|e| e.message.as_str()),
            Some("operation blew up")
        );

        let next = generations.advance();
        let outcome = runner.run(Query::from("fine"), next).await;
        assert_eq!(outcome, RunOutcome::Applied(Status::Success));
    }

    #[async_std::test]
    async fn superseded_before_start_never_touches_store() {
        let (runner, generations) =
            runner_with(|_query: Query| async move { Ok::<u32, OperationError>(1) });
        let stale = generations.advance();
        generations.advance();

        assert_eq!(runner.run(Query::from("a"), stale).await, RunOutcome::Discarded);
        assert_eq!(runner.store().snapshot().version, 0);
    }

    #[async_std::test]
    async fn superseded_during_flight_is_dropped() {
        let (runner, generations) = runner_with(|_query: Query| async move {
            task::sleep(Duration::from_millis(60)).await;
            Ok::<u32, OperationError>(9)
        });
        let generation = generations.advance();

        let handle = task::spawn({
            let runner = runner.clone();
            async move { runner.run(Query::from("a"), generation).await }
        });
        task::sleep(Duration::from_millis(20)).await;
        assert!(runner.store().snapshot().is_loading());
        generations.advance();

        assert_eq!(handle.await, RunOutcome::Discarded);
        let snapshot = runner.store().snapshot();
        assert_eq!(snapshot.status(), Status::Pending);
        assert!(snapshot.payload().is_none());
    }
}
