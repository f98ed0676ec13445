// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated parallax session that exercises the tracing and diagnostics
//! pipeline.
//!
//! Mounts an eight-layer background, runs 70 seconds of virtual time at 60 Hz
//! with a burst of window resizes and one direction flip, then unmounts.
//! Events go to both a
//! [`PrettyPrintSink`](parallax_debug::pretty::PrettyPrintSink) on stdout and
//! a [`RecorderSink`](parallax_debug::recorder::RecorderSink), which is then
//! exported as a Chrome trace JSON file.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use kurbo::Size;
use parallax_core::background::{BackgroundDefinition, ImageRef};
use parallax_core::config::ParallaxConfig;
use parallax_core::engine::ParallaxEngine;
use parallax_core::time::{Duration, HostTime, Timebase};
use parallax_core::timing::FrameTick;
use parallax_core::trace::{
    DirectionFlipEvent, FrameEvent, LayersRebuiltEvent, MountEvent, TraceSink, UnmountEvent,
    ViewportEvent,
};

use parallax_debug::pretty::PrettyPrintSink;
use parallax_debug::recorder::RecorderSink;

/// 16.6ms refresh interval in nanoseconds (≈60 Hz).
const REFRESH_INTERVAL_NS: u64 = 16_666_667;
const SECOND_NS: u64 = 1_000_000_000;
const RUN_SECONDS: u64 = 70;

/// Raw resize signals as (time in ms, width, height): a drag that settles.
const RESIZES: &[(u64, f64, f64)] = &[
    (20_000, 1600.0, 900.0),
    (20_030, 1400.0, 850.0),
    (20_060, 1280.0, 800.0),
    (45_000, 0.0, 800.0),
    (50_000, 1920.0, 1080.0),
];

/// Forwards every event to a pretty printer and a shared recorder.
struct Tee {
    pretty: PrettyPrintSink,
    recorder: Rc<RefCell<RecorderSink>>,
}

macro_rules! tee {
    ($($method:ident: $event:ty),* $(,)?) => {
        $(
            fn $method(&mut self, e: &$event) {
                self.pretty.$method(e);
                self.recorder.borrow_mut().$method(e);
            }
        )*
    };
}

impl TraceSink for Tee {
    tee!(
        on_mount: MountEvent,
        on_viewport: ViewportEvent,
        on_direction_flip: DirectionFlipEvent,
        on_layers_rebuilt: LayersRebuiltEvent,
        on_frame: FrameEvent,
        on_unmount: UnmountEvent,
    );
}

fn main() {
    let timebase = Timebase::NANOS;

    // -- background ----------------------------------------------------------
    let images = (0..8)
        .map(|d| ImageRef::new(format!("assets/layer-{d}.webp")))
        .collect();
    let background = BackgroundDefinition::from_layers(images, Size::new(384.0, 216.0), 0.1)
        .expect("valid background");
    let mut engine = ParallaxEngine::new(background, ParallaxConfig::DEFAULT, timebase)
        .expect("valid configuration");

    // -- sinks ---------------------------------------------------------------
    let recorder = Rc::new(RefCell::new(RecorderSink::new()));
    engine.set_trace_sink(Box::new(Tee {
        pretty: PrettyPrintSink::new(Box::new(std::io::stdout()), timebase),
        recorder: Rc::clone(&recorder),
    }));

    // -- simulated loop ------------------------------------------------------
    let end = HostTime(RUN_SECONDS * SECOND_NS);
    let _ = engine.mount(HostTime(0), Some(Size::new(1920.0, 1080.0)));

    let mut resizes = RESIZES.iter().peekable();
    let mut tick = FrameTick::new(HostTime(0), 0);
    let mut frames = 0_u64;
    while tick.now <= end {
        while let Some(&&(ms, width, height)) = resizes.peek() {
            let at = HostTime(ms * 1_000_000);
            if at > tick.now {
                break;
            }
            engine.on_resize(Size::new(width, height), at);
            resizes.next();
        }
        // Timers are only serviced on frame boundaries here, so flips report
        // up to one frame of lateness.
        engine.advance(tick.now);
        let _ = engine.frame(&tick);
        frames += 1;
        tick = tick.next(Duration(REFRESH_INTERVAL_NS));
    }
    let _ = engine.unmount();

    // -- export Chrome trace -------------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    parallax_debug::chrome::export(recorder.borrow().as_bytes(), timebase, &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({frames} frames)");
}
