use async_std::future::timeout;
use async_std::task;
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use crate::error::OperationError;
use crate::model::query::Query;

pub type OperationFuture<P> =
    Pin<Box<dyn Future<Output = Result<P, OperationError>> + Send + 'static>>;

/// The async unit of work run for a settled query: a network search, a field
/// validator, anything that maps a query to a payload or an error.
pub trait Operation<P>: Send + Sync + 'static {
    fn perform(&self, query: Query) -> OperationFuture<P>;
}

impl<P, F, Fut> Operation<P> for F
where
    F: Fn(Query) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<P, OperationError>> + Send + 'static,
{
    fn perform(&self, query: Query) -> OperationFuture<P> {
        Box::pin(self(query))
    }
}

/// Lifts a synchronous check into an operation. The check still runs on the
/// executor, never inside `submit`.
pub fn from_fn<P, F>(check: F) -> impl Operation<P>
where
    P: Send + 'static,
    F: Fn(&Query) -> Result<P, OperationError> + Send + Sync + 'static,
{
    let check = Arc::new(check);
    move |query: Query| {
        let check = Arc::clone(&check);
        async move {
            task::yield_now().await;
            check(&query)
        }
    }
}

/// Fails with `ErrorKind::Timeout` when `operation` does not answer within `limit`.
pub fn with_timeout<P, O>(operation: O, limit: Duration) -> impl Operation<P>
where
    P: Send + 'static,
    O: Operation<P>,
{
    move |query: Query| {
        let pending = operation.perform(query);
        async move {
            match timeout(limit, pending).await {
                Ok(outcome) => outcome,
                Err(_elapsed) => Err(OperationError::timeout(format!(
                    "no answer within {} ms",
                    limit.as_millis()
                ))),
            }
        }
    }
}

/// Starts `operation` and turns a panic, while building the future or while
/// polling it, into an `ErrorKind::Panicked` failure.
pub fn perform_caught<P, O>(operation: &O, query: Query) -> CatchUnwind<P>
where
    P: Send + 'static,
    O: Operation<P> + ?Sized,
{
    let inner = panic::catch_unwind(AssertUnwindSafe(|| operation.perform(query)))
        .map_err(|payload| panic_error(&*payload));
    CatchUnwind { inner: Some(inner) }
}

/// Future returned by [`perform_caught`].
pub struct CatchUnwind<P> {
    inner: Option<Result<OperationFuture<P>, OperationError>>,
}

impl<P> Future for CatchUnwind<P> {
    type Output = Result<P, OperationError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut pending = match this.inner.take() {
            Some(Ok(pending)) => pending,
            Some(Err(err)) => return Poll::Ready(Err(err)),
            None => panic!("CatchUnwind polled after completion"),
        };

        match panic::catch_unwind(AssertUnwindSafe(|| pending.as_mut().poll(cx))) {
            Ok(Poll::Pending) => {
                this.inner = Some(Ok(pending));
                Poll::Pending
            }
            Ok(Poll::Ready(outcome)) => Poll::Ready(outcome),
            Err(payload) => Poll::Ready(Err(panic_error(&*payload))),
        }
    }
}

fn panic_error(payload: &(dyn Any + Send)) -> OperationError {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    OperationError::panicked(detail)
}
