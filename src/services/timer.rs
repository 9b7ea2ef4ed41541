use async_std::task::{self, JoinHandle};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tracing::trace;

const PENDING: u8 = 0;
const CANCELLED: u8 = 1;
const FIRED: u8 = 2;

/// State of one scheduled job. It leaves `PENDING` exactly once, either by
/// being cancelled or by firing, whichever side wins the swap.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<AtomicU8>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// True only if this call moved the job from pending to cancelled.
    pub fn cancel(&self) -> bool {
        self.transition(CANCELLED)
    }

    fn fire(&self) -> bool {
        self.transition(FIRED)
    }

    fn transition(&self, to: u8) -> bool {
        self.state
            .compare_exchange(PENDING, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }

    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == PENDING
    }
}

struct Scheduled {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// One-slot delayed job on the async-std executor.
///
/// Scheduling replaces the previous job. `cancel` stops a job that has not
/// fired yet; `abort` also tears down a job that is already running.
#[derive(Default)]
pub struct Timer {
    scheduled: Option<Scheduled>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F, Fut>(&mut self, delay: Duration, job: F) -> CancellationToken
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if let Some(previous) = self.scheduled.take() {
            previous.token.cancel();
        }

        let token = CancellationToken::new();
        let handle = task::spawn({
            let token = token.clone();
            async move {
                task::sleep(delay).await;
                if !token.fire() {
                    trace!(?delay, "timer cancelled before firing");
                    return;
                }
                trace!(?delay, "timer fired");
                job().await;
            }
        });

        self.scheduled = Some(Scheduled {
            token: token.clone(),
            handle,
        });
        token
    }

    /// Returns true if a job was waiting and will now never fire.
    pub fn cancel(&mut self) -> bool {
        self.scheduled
            .as_ref()
            .is_some_and(|scheduled| scheduled.token.cancel())
    }

    /// Cancels and drops the spawned task, including a job already in flight.
    pub fn abort(&mut self) -> bool {
        let was_pending = self.cancel();
        if let Some(scheduled) = self.scheduled.take() {
            task::spawn(async move {
                scheduled.handle.cancel().await;
            });
        }
        was_pending
    }

    /// Scheduled, not cancelled and not fired yet.
    pub fn is_pending(&self) -> bool {
        self.scheduled
            .as_ref()
            .is_some_and(|scheduled| scheduled.token.is_pending())
    }
}
