// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewport measurement.
//!
//! [`ViewportTracker`] holds the last committed window size and funnels raw
//! resize signals through a [`Debouncer`], so a continuous drag commits one
//! size per pause instead of one per event.

use kurbo::Size;

use crate::debounce::Debouncer;
use crate::time::{Duration, HostTime};

/// Window size in pixels.
///
/// A width of zero means "not measured yet": nothing downstream renders or
/// animates until a real width arrives.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Viewport {
    /// The unmeasured viewport.
    pub const NOT_READY: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    /// Creates a viewport, clamping negative or non-finite sides to zero.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        let clamp = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        Self {
            width: clamp(width),
            height: clamp(height),
        }
    }

    /// Whether the viewport has a usable width.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.width > 0.0
    }

    /// The viewport as a [`Size`].
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl From<Size> for Viewport {
    fn from(size: Size) -> Self {
        Self::new(size.width, size.height)
    }
}

/// Tracks the committed viewport and debounces resize signals.
#[derive(Clone, Debug)]
pub struct ViewportTracker {
    current: Viewport,
    resize: Debouncer<Viewport>,
}

impl ViewportTracker {
    /// Creates a tracker from the first measurement.
    ///
    /// `initial` is the window size if a windowing context exists. Without
    /// one the tracker reports width `0` (not ready) and `headless_height`.
    #[must_use]
    pub fn new(initial: Option<Size>, debounce: Duration, headless_height: f64) -> Self {
        let current = match initial {
            Some(size) => Viewport::from(size),
            None => Viewport::new(0.0, headless_height),
        };
        Self {
            current,
            resize: Debouncer::new(debounce),
        }
    }

    /// The last committed viewport.
    #[must_use]
    pub fn current(&self) -> Viewport {
        self.current
    }

    /// Records a raw resize signal at `now`.
    pub fn on_resize(&mut self, size: Size, now: HostTime) {
        self.resize.push(Viewport::from(size), now);
    }

    /// When the pending resize commits, if one is pending.
    #[must_use]
    pub fn deadline(&self) -> Option<HostTime> {
        self.resize.deadline()
    }

    /// Commits a pending resize whose window has closed.
    ///
    /// Returns the new viewport only if it differs from the current one.
    pub fn poll(&mut self, now: HostTime) -> Option<Viewport> {
        let next = self.resize.poll(now)?;
        if next == self.current {
            return None;
        }
        self.current = next;
        Some(next)
    }

    /// Drops any pending resize.
    pub fn cancel(&mut self) -> bool {
        self.resize.cancel()
    }
}
