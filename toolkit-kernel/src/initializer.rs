//! Run-once async initialization with retry after failure.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::attempt::AttemptId;

/// Observable phase of an [`AsyncInitializer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitPhase {
    /// No attempt has succeeded yet, or the last one failed, or the guard was reset.
    Uninitialized,
    /// An attempt is in flight.
    Initializing {
        /// Token of the in-flight attempt.
        attempt: AttemptId,
    },
    /// An attempt succeeded. Terminal until [`AsyncInitializer::reset`].
    Ready,
}

impl InitPhase {
    /// Returns `true` for [`InitPhase::Ready`].
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

type Outcome<E> = Option<Result<(), E>>;

enum Slot<E> {
    Uninitialized,
    Initializing {
        attempt: AttemptId,
        outcome: watch::Receiver<Outcome<E>>,
    },
    Ready,
}

/// Guard that runs an initialization action exactly once.
///
/// Concurrent callers share the in-flight attempt and observe its outcome.
/// A failed attempt leaves the guard uninitialized so the next caller starts
/// a fresh one. The error type is cloned once per waiting caller.
pub struct AsyncInitializer<E> {
    slot: Mutex<Slot<E>>,
    ready: AtomicBool,
}

impl<E> Default for AsyncInitializer<E> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(Slot::Uninitialized),
            ready: AtomicBool::new(false),
        }
    }
}

impl<E> fmt::Debug for AsyncInitializer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncInitializer")
            .field("phase", &self.phase())
            .finish()
    }
}

impl<E> AsyncInitializer<E> {
    /// Creates an uninitialized guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once an attempt has succeeded. Never blocks.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Returns a snapshot of the current phase.
    #[must_use]
    pub fn phase(&self) -> InitPhase {
        match &*self.lock() {
            Slot::Uninitialized => InitPhase::Uninitialized,
            Slot::Initializing { attempt, .. } => InitPhase::Initializing { attempt: *attempt },
            Slot::Ready => InitPhase::Ready,
        }
    }

    /// Forces the guard back to [`InitPhase::Uninitialized`].
    ///
    /// An attempt still in flight reports its outcome to its own callers but
    /// no longer marks the guard ready.
    pub fn reset(&self) {
        let mut slot = self.lock();
        *slot = Slot::Uninitialized;
        self.ready.store(false, Ordering::Release);
        debug!("initializer reset");
    }

    fn lock(&self) -> MutexGuard<'_, Slot<E>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, attempt: AttemptId, succeeded: bool) -> bool {
        let mut slot = self.lock();
        let current = matches!(&*slot, Slot::Initializing { attempt: a, .. } if *a == attempt);
        if current {
            if succeeded {
                *slot = Slot::Ready;
                self.ready.store(true, Ordering::Release);
            } else {
                *slot = Slot::Uninitialized;
            }
        }
        current
    }
}

impl<E: Clone> AsyncInitializer<E> {
    /// Runs `init` unless the guard is already ready.
    ///
    /// If another caller's attempt is in flight this waits for it and returns
    /// its outcome instead of starting a second attempt.
    ///
    /// # Errors
    ///
    /// Returns the error produced by the attempt this call started or joined.
    pub async fn initialize<F, Fut>(&self, init: F) -> Result<(), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let (attempt, outcome) = loop {
            if self.is_initialized() {
                return Ok(());
            }

            let mut waiting = {
                let mut slot = self.lock();
                let receiver = match &*slot {
                    Slot::Ready => return Ok(()),
                    Slot::Initializing { outcome, .. } => outcome.clone(),
                    Slot::Uninitialized => {
                        let attempt = AttemptId::random();
                        let (tx, rx) = watch::channel(None);
                        *slot = Slot::Initializing {
                            attempt,
                            outcome: rx,
                        };
                        break (attempt, tx);
                    }
                };
                receiver
            };

            let observed = match waiting.wait_for(Option::is_some).await {
                Ok(outcome) => outcome.clone(),
                Err(_) => None,
            };
            match observed {
                Some(result) => return result,
                None => debug!("initialization attempt abandoned, starting a new one"),
            }
        };

        let abandon = AbandonGuard {
            owner: self,
            attempt,
            armed: true,
        };
        debug!(%attempt, "initialization attempt started");
        let result = init().await;
        abandon.disarm();

        let current = self.settle(attempt, result.is_ok());
        match &result {
            Ok(()) => debug!(%attempt, current, "initialization attempt succeeded"),
            Err(_) => warn!(%attempt, "initialization attempt failed; the next call will retry"),
        }
        outcome.send_replace(Some(result.clone()));
        result
    }
}

/// Returns the guard to `Uninitialized` if the leading future is dropped mid-attempt.
struct AbandonGuard<'a, E> {
    owner: &'a AsyncInitializer<E>,
    attempt: AttemptId,
    armed: bool,
}

impl<E> AbandonGuard<'_, E> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<E> Drop for AbandonGuard<'_, E> {
    fn drop(&mut self) {
        if self.armed && self.owner.settle(self.attempt, false) {
            warn!(attempt = %self.attempt, "initialization attempt cancelled");
        }
    }
}
