// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`]. Floats are stored as their IEEE bits.

use parallax_core::direction::Direction;
use parallax_core::time::{Duration, HostTime};
use parallax_core::trace::{
    DirectionFlipEvent, FrameEvent, LayersRebuiltEvent, MountEvent, RebuildReason, TraceSink,
    UnmountEvent, ViewportEvent,
};
use parallax_core::viewport::Viewport;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_MOUNT: u8 = 1;
const TAG_VIEWPORT: u8 = 2;
const TAG_DIRECTION_FLIP: u8 = 3;
const TAG_LAYERS_REBUILT: u8 = 4;
const TAG_FRAME: u8 = 5;
const TAG_UNMOUNT: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_viewport(&mut self, v: Viewport) {
        self.write_f64(v.width);
        self.write_f64(v.height);
    }

    fn write_direction(&mut self, d: Direction) {
        self.write_u8(match d {
            Direction::Forward => 0,
            Direction::Reverse => 1,
        });
    }

    fn write_reason(&mut self, r: RebuildReason) {
        self.write_u8(match r {
            RebuildReason::Mount => 0,
            RebuildReason::Resize => 1,
            RebuildReason::DirectionFlip => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_mount(&mut self, e: &MountEvent) {
        self.write_u8(TAG_MOUNT);
        self.write_u64(e.now.ticks());
        self.write_viewport(e.viewport);
    }

    fn on_viewport(&mut self, e: &ViewportEvent) {
        self.write_u8(TAG_VIEWPORT);
        self.write_u64(e.now.ticks());
        self.write_viewport(e.viewport);
        self.write_f64(e.scale);
    }

    fn on_direction_flip(&mut self, e: &DirectionFlipEvent) {
        self.write_u8(TAG_DIRECTION_FLIP);
        self.write_u64(e.at.ticks());
        self.write_u64(e.applied_at.ticks());
        self.write_direction(e.direction);
        self.write_u64(e.total);
    }

    fn on_layers_rebuilt(&mut self, e: &LayersRebuiltEvent) {
        self.write_u8(TAG_LAYERS_REBUILT);
        self.write_u64(e.now.ticks());
        self.write_u32(e.layers);
        self.write_reason(e.reason);
    }

    fn on_frame(&mut self, e: &FrameEvent) {
        self.write_u8(TAG_FRAME);
        self.write_u64(e.frame_index);
        self.write_u64(e.now.ticks());
        self.write_u64(e.refresh_interval.map_or(0, Duration::ticks));
        self.write_u32(e.transforms);
        self.write_u8(u8::from(e.topology_changed));
    }

    fn on_unmount(&mut self, e: &UnmountEvent) {
        self.write_u8(TAG_UNMOUNT);
        self.write_u32(e.layers);
        self.write_u8(u8::from(e.cancelled_resize));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`MountEvent`].
    Mount(MountEvent),
    /// A [`ViewportEvent`].
    Viewport(ViewportEvent),
    /// A [`DirectionFlipEvent`].
    DirectionFlip(DirectionFlipEvent),
    /// A [`LayersRebuiltEvent`].
    LayersRebuilt(LayersRebuiltEvent),
    /// A [`FrameEvent`].
    Frame(FrameEvent),
    /// An [`UnmountEvent`].
    Unmount(UnmountEvent),
}

impl RecordedEvent {
    /// Host time the event is stamped with, if it carries one.
    #[must_use]
    pub fn time(&self) -> Option<HostTime> {
        match self {
            Self::Mount(e) => Some(e.now),
            Self::Viewport(e) => Some(e.now),
            Self::DirectionFlip(e) => Some(e.applied_at),
            Self::LayersRebuilt(e) => Some(e.now),
            Self::Frame(e) => Some(e.now),
            Self::Unmount(_) => None,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_u64().map(f64::from_bits)
    }

    fn read_viewport(&mut self) -> Option<Viewport> {
        Some(Viewport {
            width: self.read_f64()?,
            height: self.read_f64()?,
        })
    }

    fn read_direction(&mut self) -> Option<Direction> {
        Some(match self.read_u8()? {
            0 => Direction::Forward,
            _ => Direction::Reverse,
        })
    }

    fn read_reason(&mut self) -> Option<RebuildReason> {
        Some(match self.read_u8()? {
            0 => RebuildReason::Mount,
            1 => RebuildReason::Resize,
            _ => RebuildReason::DirectionFlip,
        })
    }

    fn decode_mount(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Mount(MountEvent {
            now: HostTime(self.read_u64()?),
            viewport: self.read_viewport()?,
        }))
    }

    fn decode_viewport(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Viewport(ViewportEvent {
            now: HostTime(self.read_u64()?),
            viewport: self.read_viewport()?,
            scale: self.read_f64()?,
        }))
    }

    fn decode_direction_flip(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DirectionFlip(DirectionFlipEvent {
            at: HostTime(self.read_u64()?),
            applied_at: HostTime(self.read_u64()?),
            direction: self.read_direction()?,
            total: self.read_u64()?,
        }))
    }

    fn decode_layers_rebuilt(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LayersRebuilt(LayersRebuiltEvent {
            now: HostTime(self.read_u64()?),
            layers: self.read_u32()?,
            reason: self.read_reason()?,
        }))
    }

    fn decode_frame(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Frame(FrameEvent {
            frame_index: self.read_u64()?,
            now: HostTime(self.read_u64()?),
            refresh_interval: Some(Duration(self.read_u64()?)).filter(|d| !d.is_zero()),
            transforms: self.read_u32()?,
            topology_changed: self.read_u8()? != 0,
        }))
    }

    fn decode_unmount(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Unmount(UnmountEvent {
            layers: self.read_u32()?,
            cancelled_resize: self.read_u8()? != 0,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_MOUNT => self.decode_mount(),
            TAG_VIEWPORT => self.decode_viewport(),
            TAG_DIRECTION_FLIP => self.decode_direction_flip(),
            TAG_LAYERS_REBUILT => self.decode_layers_rebuilt(),
            TAG_FRAME => self.decode_frame(),
            TAG_UNMOUNT => self.decode_unmount(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
