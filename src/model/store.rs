use async_std::channel::{self, Receiver, Sender, TrySendError};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::OperationError;
use crate::model::generation::Generation;
use crate::model::query::Query;
use crate::model::result::{OperationResult, Snapshot};

/// Single source of truth for what the consumer should currently display.
///
/// Cloning yields another handle to the same store. Snapshots are immutable;
/// every mutation swaps in a new one with a higher `version`.
pub struct ResultStore<P> {
    inner: Arc<Inner<P>>,
}

struct Inner<P> {
    snapshot: RwLock<Arc<Snapshot<P>>>,
    subscribers: Mutex<Vec<Sender<u64>>>,
}

impl<P> Clone for ResultStore<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> Default for ResultStore<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> ResultStore<P> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                snapshot: RwLock::new(Arc::new(Snapshot::idle())),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot<P>> {
        let guard = self
            .inner
            .snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Reset to Idle with no query, payload or error.
    ///
    /// This does not advance the generation, so an operation already in
    /// flight can still land afterwards. Use `DebounceController::clear` to
    /// invalidate that work as well.
    pub fn clear(&self) {
        let generation = self.snapshot().generation;
        self.reset(generation);
    }

    /// Notifications carry the new snapshot version. Bursts coalesce, so
    /// always re-read `snapshot()` after waking.
    pub fn subscribe(&self) -> StoreSubscription {
        let (tx, rx) = channel::bounded(1);
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        StoreSubscription { rx }
    }

    pub(crate) fn reset(&self, generation: Generation) {
        self.replace(None, generation, OperationResult::Idle);
    }

    pub(crate) fn begin(&self, query: Query, generation: Generation) {
        self.replace(Some(query), generation, OperationResult::Pending);
    }

    pub(crate) fn settle(
        &self,
        query: Query,
        generation: Generation,
        outcome: Result<P, OperationError>,
    ) {
        self.replace(Some(query), generation, outcome.into());
    }

    fn replace(&self, query: Option<Query>, generation: Generation, result: OperationResult<P>) {
        let version = {
            let mut guard = self
                .inner
                .snapshot
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let version = guard.version + 1;
            *guard = Arc::new(Snapshot {
                query,
                generation,
                result,
                version,
            });
            version
        };
        self.notify(version);
    }

    fn notify(&self, version: u64) {
        let mut subscribers = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.retain(|tx| match tx.try_send(version) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Closed(_)) => false,
        });
    }
}

/// Receiving side of [`ResultStore::subscribe`].
pub struct StoreSubscription {
    rx: Receiver<u64>,
}

impl StoreSubscription {
    /// Waits for the next mutation. `None` once every store handle is gone.
    pub async fn changed(&self) -> Option<u64> {
        self.rx.recv().await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::result::Status;

    #[test]
    fn starts_idle() {
        let store: ResultStore<String> = ResultStore::new();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.status(), Status::Idle);
        assert_eq!(snapshot.version, 0);
        assert!(snapshot.query.is_none());
    }

    #[test]
    fn pending_then_success_then_clear() {
        let store: ResultStore<Vec<&str>> = ResultStore::new();
        store.begin(Query::from("re"), Generation(1));
        assert!(store.snapshot().is_loading());

        store.settle(Query::from("re"), Generation(1), Ok(vec!["react"]));
        let settled = store.snapshot();
        assert_eq!(settled.payload(), Some(&vec!["react"]));
        assert_eq!(settled.query.as_deref(), Some("re"));
        assert_eq!(settled.version, 2);

        store.clear();
        let cleared = store.snapshot();
        assert_eq!(cleared.status(), Status::Idle);
        assert!(cleared.query.is_none());
        assert_eq!(cleared.generation, Generation(1));
    }

    #[test]
    fn old_snapshots_stay_untouched() {
        let store: ResultStore<u8> = ResultStore::new();
        let before = store.snapshot();
        store.settle(Query::from("x"), Generation(1), Ok(1));
        assert_eq!(before.status(), Status::Idle);
        assert_eq!(store.snapshot().payload(), Some(&1));
    }

    #[async_std::test]
    async fn subscribers_are_woken_and_coalesced() {
        let store: ResultStore<u8> = ResultStore::new();
        let subscription = store.subscribe();

        store.begin(Query::from("a"), Generation(1));
        store.settle(Query::from("a"), Generation(1), Ok(3));

        // The second notification coalesces into the first one.
        assert_eq!(subscription.changed().await, Some(1));
        assert_eq!(store.snapshot().version, 2);

        store.clear();
        assert_eq!(subscription.changed().await, Some(3));
    }

    #[async_std::test]
    async fn subscription_ends_with_the_store() {
        let store: ResultStore<u8> = ResultStore::new();
        let subscription = store.subscribe();
        drop(store);
        assert_eq!(subscription.changed().await, None);
    }
}
