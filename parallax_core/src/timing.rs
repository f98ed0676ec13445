// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame opportunities delivered by backends.
//!
//! A backend turns its platform callback (`requestAnimationFrame`, a simulated
//! clock) into a [`FrameTick`] and hands it to
//! [`ParallaxEngine::frame`](crate::engine::ParallaxEngine::frame). The tick's
//! `now` is the only time the engine uses to sample layer animations, so the
//! same tick always produces the same scene.

use crate::time::{Duration, HostTime};

/// A frame opportunity delivered by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameTick {
    /// Host time the frame represents.
    pub now: HostTime,
    /// Monotonically increasing frame counter.
    pub frame_index: u64,
    /// Display refresh interval in host ticks, if known.
    pub refresh_interval: Option<Duration>,
}

impl FrameTick {
    /// Creates a tick with no refresh-interval information.
    #[inline]
    #[must_use]
    pub const fn new(now: HostTime, frame_index: u64) -> Self {
        Self {
            now,
            frame_index,
            refresh_interval: None,
        }
    }

    /// Returns the tick that follows this one after `interval`.
    #[inline]
    #[must_use]
    pub fn next(&self, interval: Duration) -> Self {
        Self {
            now: self.now.saturating_add(interval),
            frame_index: self.frame_index + 1,
            refresh_interval: Some(interval),
        }
    }
}
