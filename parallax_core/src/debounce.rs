// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event coalescing.
//!
//! [`Debouncer`] coalesces a burst of events into one delivery: each
//! [`push`](Debouncer::push) replaces the pending value and reschedules the
//! deadline to `now + window`, and [`poll`](Debouncer::poll) hands the latest
//! value out once the deadline has passed. It owns no timer; the host reads
//! [`deadline`](Debouncer::deadline) and schedules its own wake-up.

use crate::time::{Duration, HostTime};

/// Coalesces values pushed within a fixed window.
#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Clone, Debug)]
struct Pending<T> {
    value: T,
    deadline: HostTime,
}

impl<T> Debouncer<T> {
    /// Creates an idle debouncer with the given window.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Replaces any pending value and restarts the window at `now`.
    pub fn push(&mut self, value: T, now: HostTime) {
        self.pending = Some(Pending {
            value,
            deadline: now.saturating_add(self.window),
        });
    }

    /// When the pending value becomes deliverable, if any is pending.
    #[must_use]
    pub fn deadline(&self) -> Option<HostTime> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Whether a value is waiting for its window to close.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the pending value if its window has closed by `now`.
    pub fn poll(&mut self, now: HostTime) -> Option<T> {
        match &self.pending {
            Some(p) if now >= p.deadline => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Drops the pending value. Returns `true` if one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}
