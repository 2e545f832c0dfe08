// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion counting for concurrently running workers
//!
//! A [`CompletionGroup`] hands out one [`CompletionToken`] per worker. The
//! group's [`wait`](CompletionGroup::wait) resolves once every token has
//! either been completed or dropped. Dropped tokens are counted separately
//! so a failed worker can never leave the waiter hanging.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Default)]
struct Inner {
    outstanding: AtomicUsize,
    completed: AtomicUsize,
    abandoned: AtomicUsize,
    notify: Notify,
}

impl Inner {
    fn release(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.notify.notify_waiters();
        }
    }

    fn summary(&self) -> CompletionSummary {
        CompletionSummary {
            completed: self.completed.load(Ordering::Acquire),
            abandoned: self.abandoned.load(Ordering::Acquire),
        }
    }
}

/// Counts of how registered tokens were released
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionSummary {
    pub completed: usize,
    pub abandoned: usize,
}

/// Shared completion counter
#[derive(Clone, Default)]
pub struct CompletionGroup {
    inner: Arc<Inner>,
}

impl CompletionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one expected completion
    pub fn register(&self) -> CompletionToken {
        self.inner.outstanding.fetch_add(1, Ordering::AcqRel);
        CompletionToken {
            inner: Some(Arc::clone(&self.inner)),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::Acquire)
    }

    pub fn summary(&self) -> CompletionSummary {
        self.inner.summary()
    }

    /// Wait until no registered token is outstanding.
    ///
    /// Returns immediately when nothing is registered.
    pub async fn wait(&self) -> CompletionSummary {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a release between the check and the
            // await still wakes us.
            notified.as_mut().enable();

            if self.outstanding() == 0 {
                return self.summary();
            }
            notified.await;
        }
    }
}

/// One worker's completion signal.
///
/// Dropping the token without calling [`complete`](Self::complete) releases
/// it as abandoned.
#[must_use = "dropping a token releases it as abandoned"]
pub struct CompletionToken {
    inner: Option<Arc<Inner>>,
}

impl CompletionToken {
    /// Signal that the worker finished its sequence
    pub fn complete(mut self) {
        if let Some(inner) = self.inner.take() {
            inner.completed.fetch_add(1, Ordering::AcqRel);
            inner.release();
        }
    }
}

impl Drop for CompletionToken {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.abandoned.fetch_add(1, Ordering::AcqRel);
            inner.release();
        }
    }
}

#[cfg(test)]
#[path = "completion_tests.rs"]
mod tests;
