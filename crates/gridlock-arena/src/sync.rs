//! Lock and condition primitives shared by every arena user.
//!
//! [`Lock`] is a plain mutex whose guard must never be held across an
//! `.await`. [`Condition`] pairs with a lock to give the classic
//! "wait until predicate" discipline without a lost wakeup:
//!
//! ```ignore
//! // waiter
//! let holder = turn_ready
//!     .wait_until(&game, |g| g.turn_holder())
//!     .await;
//!
//! // waker
//! game.with(|g| g.grant_turn(next));
//! turn_ready.broadcast();
//! ```
//!
//! The waiter registers interest *before* it evaluates the predicate
//! under the lock, so a broadcast that lands between the check and the
//! sleep is still observed.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// Lock
// ---------------------------------------------------------------------------

/// A named mutex over one slice of arena state.
///
/// A panic while the lock is held does not poison later users: the data
/// is handed out as-is, since every transition on it is a single
/// assignment sequence that leaves the value well-formed.
#[derive(Debug)]
pub struct Lock<T> {
    name: &'static str,
    inner: Mutex<T>,
}

impl<T> Lock<T> {
    pub fn new(name: &'static str, value: T) -> Self {
        Self {
            name,
            inner: Mutex::new(value),
        }
    }

    /// Acquires the lock. The guard must be dropped before any `.await`.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!(lock = self.name, "recovering poisoned lock");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Runs `f` with the lock held and returns its result.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// A condition variable for tasks waiting on state behind a [`Lock`].
#[derive(Debug, Default)]
pub struct Condition {
    notify: Notify,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspends until `ready` returns `Some`, re-evaluating it under the
    /// lock after every wake-up.
    pub async fn wait_until<T, R>(
        &self,
        lock: &Lock<T>,
        mut ready: impl FnMut(&mut T) -> Option<R>,
    ) -> R {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let outcome = {
                let mut guard = lock.lock();
                ready(&mut guard)
            };
            if let Some(value) = outcome {
                return value;
            }

            notified.await;
        }
    }

    /// Wakes one waiter (or the next one to arrive).
    pub fn signal(&self) {
        self.notify.notify_one();
    }

    /// Wakes every task currently waiting.
    pub fn broadcast(&self) {
        self.notify.notify_waiters();
    }
}
