use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Monotonic token identifying the most recent input change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl Generation {
    pub const ZERO: Self = Self(0);

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// Shared cell holding the current generation.
///
/// Only the controller advances it. The runner takes the same lock while it
/// compares generations and writes the store, so an `advance` can never land
/// between the check and the write.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    current: Arc<Mutex<Generation>>,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Generation {
        *self.lock()
    }

    pub(crate) fn advance(&self) -> Generation {
        let mut current = self.lock();
        *current = current.next();
        *current
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }

    /// Holds the counter while `f` runs, only if `generation` is still current.
    pub(crate) fn with_current<R>(
        &self,
        generation: Generation,
        f: impl FnOnce() -> R,
    ) -> Option<R> {
        let current = self.lock();
        if *current != generation {
            return None;
        }
        let out = f();
        drop(current);
        Some(out)
    }

    fn lock(&self) -> MutexGuard<'_, Generation> {
        // The guarded value is a plain integer, a poisoned lock still holds a valid one.
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
