// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Periodic scroll-direction reversal.
//!
//! [`DirectionController`] flips a [`Direction`] every fixed period. Flip
//! times are anchored to the start time (`start + k * period`) rather than to
//! the time each flip was observed, so late polls never push later flips back
//! and the schedule does not drift.

use crate::time::{Duration, HostTime};

/// Horizontal scroll direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Content slides toward negative x (leftwards).
    #[default]
    Forward,
    /// Content slides toward positive x (rightwards).
    Reverse,
}

impl Direction {
    /// `+1` for [`Forward`](Self::Forward), `-1` for [`Reverse`](Self::Reverse).
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Reverse => -1.0,
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }
}

/// Outcome of a [`DirectionController::poll`] that applied at least one flip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirectionFlip {
    /// Direction after all due flips.
    pub direction: Direction,
    /// Scheduled time of the last flip applied.
    pub at: HostTime,
    /// How many flips this poll applied (more than one after a stall).
    pub applied: u64,
    /// Flips since the controller was started.
    pub total: u64,
}

/// Flips the scroll direction on a fixed period.
#[derive(Clone, Debug)]
pub struct DirectionController {
    period: Duration,
    direction: Direction,
    anchor: Option<HostTime>,
    flips: u64,
}

impl DirectionController {
    /// Creates a stopped controller scrolling [`Direction::Forward`].
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        assert!(!period.is_zero(), "direction flip period must be non-zero");
        Self {
            period,
            direction: Direction::Forward,
            anchor: None,
            flips: 0,
        }
    }

    /// The current direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// The flip period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Starts the flip schedule at `now`. No-op while already running.
    pub fn start(&mut self, now: HostTime) {
        if self.anchor.is_none() {
            self.anchor = Some(now);
            self.flips = 0;
        }
    }

    /// Stops the schedule. The current direction is kept.
    pub fn stop(&mut self) {
        self.anchor = None;
    }

    /// Whether the schedule is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    /// Scheduled time of the next flip, if running.
    #[must_use]
    pub fn next_flip(&self) -> Option<HostTime> {
        let anchor = self.anchor?;
        anchor.checked_add(self.period.saturating_mul(self.flips + 1))
    }

    /// Applies every flip scheduled at or before `now`.
    pub fn poll(&mut self, now: HostTime) -> Option<DirectionFlip> {
        let mut applied = 0;
        let mut at = None;
        while let Some(due) = self.next_flip() {
            if due > now {
                break;
            }
            self.flips += 1;
            self.direction = self.direction.flipped();
            applied += 1;
            at = Some(due);
        }
        at.map(|at| DirectionFlip {
            direction: self.direction,
            at,
            applied,
            total: self.flips,
        })
    }
}
