// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the engine lifecycle.
//!
//! [`TraceSink`] has one method per engine event, each defaulting to a no-op,
//! so a sink implements only what it cares about.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. With the `trace` feature
//! **off** every `Tracer` method compiles to nothing. With it **on** each call
//! costs one `Option` branch before dispatch.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies.

use crate::direction::Direction;
use crate::time::{Duration, HostTime};
use crate::viewport::Viewport;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why the layer stack was rebuilt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RebuildReason {
    /// First build after mount.
    Mount,
    /// A debounced resize committed a new viewport.
    Resize,
    /// The scroll direction flipped.
    DirectionFlip,
}

impl RebuildReason {
    /// Short lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mount => "mount",
            Self::Resize => "resize",
            Self::DirectionFlip => "direction-flip",
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the engine mounts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MountEvent {
    /// Host time of the mount.
    pub now: HostTime,
    /// First measured viewport.
    pub viewport: Viewport,
}

/// Emitted when a debounced resize commits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportEvent {
    /// Host time of the commit.
    pub now: HostTime,
    /// The committed viewport.
    pub viewport: Viewport,
    /// Resulting cover scale (zero when not ready).
    pub scale: f64,
}

/// Emitted when the scroll direction flips.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirectionFlipEvent {
    /// Scheduled time of the flip.
    pub at: HostTime,
    /// Host time at which the engine applied it.
    pub applied_at: HostTime,
    /// Direction after the flip.
    pub direction: Direction,
    /// Flips since mount.
    pub total: u64,
}

/// Emitted after the layer stack is torn down and rebuilt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayersRebuiltEvent {
    /// Host time of the rebuild.
    pub now: HostTime,
    /// Number of layers now instantiated (zero when not ready).
    pub layers: u32,
    /// What triggered it.
    pub reason: RebuildReason,
}

/// Emitted once per rendered frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameEvent {
    /// Monotonic frame counter from the tick.
    pub frame_index: u64,
    /// Host time of the tick.
    pub now: HostTime,
    /// Display refresh interval reported by the tick, if known.
    pub refresh_interval: Option<Duration>,
    /// Nodes whose world transform changed.
    pub transforms: u32,
    /// Whether the tree structure changed this frame.
    pub topology_changed: bool,
}

/// Emitted when the engine unmounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnmountEvent {
    /// Layers torn down.
    pub layers: u32,
    /// Whether a pending resize was dropped.
    pub cancelled_resize: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the engine.
///
/// All methods have default no-op implementations.
pub trait TraceSink {
    /// Called when the engine mounts.
    fn on_mount(&mut self, e: &MountEvent) {
        _ = e;
    }

    /// Called when a resize commits.
    fn on_viewport(&mut self, e: &ViewportEvent) {
        _ = e;
    }

    /// Called for every direction flip.
    fn on_direction_flip(&mut self, e: &DirectionFlipEvent) {
        _ = e;
    }

    /// Called after the layer stack is rebuilt.
    fn on_layers_rebuilt(&mut self, e: &LayersRebuiltEvent) {
        _ = e;
    }

    /// Called once per rendered frame.
    fn on_frame(&mut self, e: &FrameEvent) {
        _ = e;
    }

    /// Called when the engine unmounts.
    fn on_unmount(&mut self, e: &UnmountEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($(#[$doc:meta])* $name:ident, $method:ident, $event:ty) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, e: &$event) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$method(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    dispatch!(
        /// Emits a [`MountEvent`].
        mount, on_mount, MountEvent
    );
    dispatch!(
        /// Emits a [`ViewportEvent`].
        viewport, on_viewport, ViewportEvent
    );
    dispatch!(
        /// Emits a [`DirectionFlipEvent`].
        direction_flip, on_direction_flip, DirectionFlipEvent
    );
    dispatch!(
        /// Emits a [`LayersRebuiltEvent`].
        layers_rebuilt, on_layers_rebuilt, LayersRebuiltEvent
    );
    dispatch!(
        /// Emits a [`FrameEvent`].
        frame, on_frame, FrameEvent
    );
    dispatch!(
        /// Emits an [`UnmountEvent`].
        unmount, on_unmount, UnmountEvent
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
