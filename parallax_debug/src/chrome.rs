// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! The mounted lifetime becomes a `B`/`E` span, each scroll direction becomes
//! a span on its own track, and everything else is an instant event.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use parallax_core::direction::Direction;
use parallax_core::time::{HostTime, Timebase};

use crate::recorder::{RecordedEvent, decode};

const TID_LIFECYCLE: u32 = 0;
const TID_DIRECTION: u32 = 1;
const TID_FRAMES: u32 = 2;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
/// An unmount carries no timestamp of its own and closes its spans at the
/// last time seen in the recording.
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut last = HostTime(0);
    let mut direction_open = false;

    for recorded in decode(bytes) {
        if let Some(t) = recorded.time() {
            last = last.max(t);
        }
        match recorded {
            RecordedEvent::Mount(e) => {
                let ts = ticks_to_us(e.now.ticks(), timebase);
                events.push(json!({
                    "ph": "B",
                    "name": "Mounted",
                    "cat": "Lifecycle",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_LIFECYCLE,
                    "args": {
                        "width": e.viewport.width,
                        "height": e.viewport.height,
                    }
                }));
                events.push(direction_begin(Direction::Forward, ts));
                direction_open = true;
            }
            RecordedEvent::Viewport(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Viewport",
                    "cat": "Lifecycle",
                    "ts": ticks_to_us(e.now.ticks(), timebase),
                    "pid": 0,
                    "tid": TID_LIFECYCLE,
                    "s": "t",
                    "args": {
                        "width": e.viewport.width,
                        "height": e.viewport.height,
                        "scale": e.scale,
                    }
                }));
            }
            RecordedEvent::DirectionFlip(e) => {
                let ts = ticks_to_us(e.at.ticks(), timebase);
                if direction_open {
                    events.push(direction_end(ts));
                }
                let mut begin = direction_begin(e.direction, ts);
                begin["args"]["total"] = json!(e.total);
                begin["args"]["lateness_us"] = json!(ticks_to_us(
                    e.applied_at.saturating_duration_since(e.at).ticks(),
                    timebase
                ));
                events.push(begin);
                direction_open = true;
            }
            RecordedEvent::LayersRebuilt(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "LayersRebuilt",
                    "cat": "Lifecycle",
                    "ts": ticks_to_us(e.now.ticks(), timebase),
                    "pid": 0,
                    "tid": TID_LIFECYCLE,
                    "s": "t",
                    "args": {
                        "layers": e.layers,
                        "reason": e.reason.as_str(),
                    }
                }));
            }
            RecordedEvent::Frame(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Frame",
                    "cat": "Frame",
                    "ts": ticks_to_us(e.now.ticks(), timebase),
                    "pid": 0,
                    "tid": TID_FRAMES,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "refresh_interval_us": e
                            .refresh_interval
                            .map(|d| ticks_to_us(d.ticks(), timebase)),
                        "transforms": e.transforms,
                        "topology_changed": e.topology_changed,
                    }
                }));
            }
            RecordedEvent::Unmount(e) => {
                let ts = ticks_to_us(last.ticks(), timebase);
                if direction_open {
                    events.push(direction_end(ts));
                    direction_open = false;
                }
                events.push(json!({
                    "ph": "E",
                    "name": "Mounted",
                    "cat": "Lifecycle",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_LIFECYCLE,
                    "args": {
                        "layers": e.layers,
                        "cancelled_resize": e.cancelled_resize,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn direction_begin(direction: Direction, ts: f64) -> Value {
    json!({
        "ph": "B",
        "name": format!("{direction:?}"),
        "cat": "Direction",
        "ts": ts,
        "pid": 0,
        "tid": TID_DIRECTION,
        "args": {}
    })
}

fn direction_end(ts: f64) -> Value {
    json!({
        "ph": "E",
        "cat": "Direction",
        "ts": ts,
        "pid": 0,
        "tid": TID_DIRECTION,
    })
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use parallax_core::trace::{
        DirectionFlipEvent, FrameEvent, MountEvent, TraceSink, UnmountEvent,
    };
    use parallax_core::viewport::Viewport;

    fn export_to_values(rec: &RecorderSink) -> Vec<Value> {
        let mut out = Vec::new();
        export(rec.as_bytes(), Timebase::MICROS, &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn mounted_session_is_a_balanced_span() {
        let mut rec = RecorderSink::new();
        rec.on_mount(&MountEvent {
            now: HostTime(1_000),
            viewport: Viewport::new(1920.0, 1080.0),
        });
        rec.on_frame(&FrameEvent {
            frame_index: 0,
            now: HostTime(17_667),
            refresh_interval: None,
            transforms: 8,
            topology_changed: false,
        });
        rec.on_unmount(&UnmountEvent {
            layers: 8,
            cancelled_resize: false,
        });

        let parsed = export_to_values(&rec);
        let phases: Vec<&str> = parsed.iter().map(|v| v["ph"].as_str().unwrap()).collect();
        assert_eq!(phases, ["B", "B", "i", "E", "E"]);
        assert_eq!(parsed[0]["name"], "Mounted");
        assert_eq!(parsed[1]["name"], "Forward");
        assert_eq!(parsed[2]["name"], "Frame");
        // Unmount closes at the last stamped event.
        assert_eq!(parsed[4]["ts"], 17_667.0);
    }

    #[test]
    fn flip_switches_direction_span() {
        let mut rec = RecorderSink::new();
        rec.on_mount(&MountEvent {
            now: HostTime(0),
            viewport: Viewport::new(800.0, 600.0),
        });
        rec.on_direction_flip(&DirectionFlipEvent {
            at: HostTime(60_000_000),
            applied_at: HostTime(60_000_250),
            direction: Direction::Reverse,
            total: 1,
        });

        let parsed = export_to_values(&rec);
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["tid"], TID_DIRECTION);
        assert_eq!(parsed[3]["name"], "Reverse");
        assert_eq!(parsed[3]["ts"], 60_000_000.0);
        assert_eq!(parsed[3]["args"]["lateness_us"], 250.0);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], Timebase::NANOS, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty());
    }
}
