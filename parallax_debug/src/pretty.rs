// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in seconds using a [`Timebase`].

use std::io::Write;

use parallax_core::time::{HostTime, Timebase};
use parallax_core::trace::{
    DirectionFlipEvent, FrameEvent, LayersRebuiltEvent, MountEvent, TraceSink, UnmountEvent,
    ViewportEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
    frames: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self::new(Box::new(std::io::stderr()), timebase)
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, timebase: Timebase) -> Self {
        Self::with_writer(writer, timebase)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    ///
    /// Per-frame lines are off by default; see [`with_frames`](Self::with_frames).
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self {
            writer,
            timebase,
            frames: false,
        }
    }

    /// Enables or disables one line per rendered frame.
    #[must_use]
    pub fn with_frames(mut self, frames: bool) -> Self {
        self.frames = frames;
        self
    }

    /// Consumes the sink and returns its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn secs(&self, t: HostTime) -> f64 {
        self.timebase.ticks_to_nanos(t.ticks()) as f64 / 1e9
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_mount(&mut self, e: &MountEvent) {
        let _ = writeln!(
            self.writer,
            "[mount] t={:.3}s viewport={}x{}",
            self.secs(e.now),
            e.viewport.width,
            e.viewport.height,
        );
    }

    fn on_viewport(&mut self, e: &ViewportEvent) {
        let _ = writeln!(
            self.writer,
            "[viewport] t={:.3}s size={}x{} scale={:.4}",
            self.secs(e.now),
            e.viewport.width,
            e.viewport.height,
            e.scale,
        );
    }

    fn on_direction_flip(&mut self, e: &DirectionFlipEvent) {
        let late_ms = self
            .timebase
            .ticks_to_nanos(e.applied_at.saturating_duration_since(e.at).ticks())
            as f64
            / 1e6;
        let _ = writeln!(
            self.writer,
            "[flip] t={:.3}s direction={:?} total={} late={late_ms:.1}ms",
            self.secs(e.at),
            e.direction,
            e.total,
        );
    }

    fn on_layers_rebuilt(&mut self, e: &LayersRebuiltEvent) {
        let _ = writeln!(
            self.writer,
            "[rebuild] t={:.3}s layers={} reason={}",
            self.secs(e.now),
            e.layers,
            e.reason.as_str(),
        );
    }

    fn on_frame(&mut self, e: &FrameEvent) {
        if !self.frames {
            return;
        }
        let topology = if e.topology_changed { " topology" } else { "" };
        let _ = write!(
            self.writer,
            "[frame] #{} t={:.3}s transforms={}{topology}",
            e.frame_index,
            self.secs(e.now),
            e.transforms,
        );
        if let Some(interval) = e.refresh_interval {
            let ms = self.timebase.ticks_to_nanos(interval.ticks()) as f64 / 1e6;
            let _ = write!(self.writer, " interval={ms:.3}ms");
        }
        let _ = writeln!(self.writer);
    }

    fn on_unmount(&mut self, e: &UnmountEvent) {
        let resize = if e.cancelled_resize {
            " cancelled-resize"
        } else {
            ""
        };
        let _ = writeln!(self.writer, "[unmount] layers={}{resize}", e.layers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_core::direction::Direction;
    use parallax_core::time::Duration;
    use parallax_core::trace::RebuildReason;

    fn frame() -> FrameEvent {
        FrameEvent {
            frame_index: 3,
            now: HostTime(50_000),
            refresh_interval: Some(Duration(16_667)),
            transforms: 8,
            topology_changed: false,
        }
    }

    #[test]
    fn flip_line() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::MICROS);
        sink.on_direction_flip(&DirectionFlipEvent {
            at: HostTime(60_000_000),
            applied_at: HostTime(60_002_000),
            direction: Direction::Reverse,
            total: 1,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            output,
            "[flip] t=60.000s direction=Reverse total=1 late=2.0ms\n"
        );
    }

    #[test]
    fn rebuild_line_names_reason() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        sink.on_layers_rebuilt(&LayersRebuiltEvent {
            now: HostTime(0),
            layers: 8,
            reason: RebuildReason::Resize,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("layers=8 reason=resize"), "got: {output}");
    }

    #[test]
    fn frames_are_opt_in() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::MICROS);
        sink.on_frame(&frame());
        let mut sink = PrettyPrintSink::with_writer(sink.into_inner(), Timebase::MICROS)
            .with_frames(true);
        sink.on_frame(&frame());
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output.lines().count(), 1);
        assert_eq!(
            output,
            "[frame] #3 t=0.050s transforms=8 interval=16.667ms\n"
        );
    }
}
