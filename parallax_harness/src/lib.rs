// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless virtual-clock host for end-to-end tests and demos.
//!
//! [`Harness`] plays the part a real backend plays: it owns the clock, fires
//! the engine's timers exactly at their deadlines, delivers a frame tick every
//! refresh interval, forwards resizes and mirrors scene changes into a
//! [`MirrorPresenter`] that checks the add/remove stream for consistency.
//! Every engine event is captured in an [`EventLog`].
//!
//! Time uses [`Timebase::NANOS`], so one tick is one nanosecond.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use kurbo::Size;
use parallax_core::backend::Presenter;
use parallax_core::background::BackgroundDefinition;
use parallax_core::config::ParallaxConfig;
use parallax_core::engine::ParallaxEngine;
use parallax_core::error::ConfigError;
use parallax_core::scene::{Scene, SceneChanges};
use parallax_core::time::{Duration, HostTime, Timebase};
use parallax_core::timing::FrameTick;
use parallax_core::trace::{
    DirectionFlipEvent, FrameEvent, LayersRebuiltEvent, MountEvent, TraceSink, UnmountEvent,
    ViewportEvent,
};
use parallax_debug::recorder::RecordedEvent;
use parallax_render::RenderPlan;

/// 60 Hz in nanoseconds.
pub const REFRESH_60HZ: Duration = Duration(16_666_667);

/// Nanoseconds in one second.
pub const SECOND: Duration = Duration(1_000_000_000);

/// Nanoseconds in one millisecond.
pub const MILLISECOND: Duration = Duration(1_000_000);

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// Shared, cloneable record of every engine event.
///
/// One clone is installed as the engine's [`TraceSink`]; the harness keeps
/// another to read from.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<RecordedEvent>>>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of everything logged so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    /// Every direction flip logged so far.
    #[must_use]
    pub fn flips(&self) -> Vec<DirectionFlipEvent> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::DirectionFlip(f) => Some(*f),
                _ => None,
            })
            .collect()
    }

    /// Number of logged events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Whether nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    fn push(&self, event: RecordedEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl TraceSink for EventLog {
    fn on_mount(&mut self, e: &MountEvent) {
        self.push(RecordedEvent::Mount(*e));
    }

    fn on_viewport(&mut self, e: &ViewportEvent) {
        self.push(RecordedEvent::Viewport(*e));
    }

    fn on_direction_flip(&mut self, e: &DirectionFlipEvent) {
        self.push(RecordedEvent::DirectionFlip(*e));
    }

    fn on_layers_rebuilt(&mut self, e: &LayersRebuiltEvent) {
        self.push(RecordedEvent::LayersRebuilt(*e));
    }

    fn on_frame(&mut self, e: &FrameEvent) {
        self.push(RecordedEvent::Frame(*e));
    }

    fn on_unmount(&mut self, e: &UnmountEvent) {
        self.push(RecordedEvent::Unmount(*e));
    }
}

// ---------------------------------------------------------------------------
// MirrorPresenter
// ---------------------------------------------------------------------------

/// A [`Presenter`] that mirrors the set of live scene slots.
///
/// Panics if the change stream removes a slot it never saw or adds one that
/// is already live, which would corrupt a real native tree.
#[derive(Clone, Debug, Default)]
pub struct MirrorPresenter {
    live: BTreeSet<u32>,
    applies: u64,
    transform_updates: u64,
}

impl MirrorPresenter {
    /// Creates an empty mirror.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mirrored nodes.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of change sets applied.
    #[must_use]
    pub fn applies(&self) -> u64 {
        self.applies
    }

    /// Total world-transform updates received.
    #[must_use]
    pub fn transform_updates(&self) -> u64 {
        self.transform_updates
    }
}

impl Presenter for MirrorPresenter {
    fn apply(&mut self, scene: &Scene, changes: &SceneChanges) {
        for &idx in &changes.removed {
            assert!(self.live.remove(&idx), "removed slot {idx} was never added");
        }
        for &idx in &changes.added {
            assert!(self.live.insert(idx), "slot {idx} added twice");
        }
        for &idx in &changes.transforms {
            assert!(
                self.live.contains(&idx),
                "transform for unmirrored slot {idx}"
            );
        }
        assert_eq!(
            self.live.len(),
            scene.node_count(),
            "mirror out of sync with the scene"
        );
        self.applies += 1;
        self.transform_updates += changes.transforms.len() as u64;
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A deterministic host driving one [`ParallaxEngine`].
#[derive(Debug)]
pub struct Harness {
    engine: ParallaxEngine,
    presenter: MirrorPresenter,
    log: EventLog,
    now: HostTime,
    refresh: Duration,
    next_frame: HostTime,
    frame_index: u64,
}

impl Harness {
    /// Creates a harness at time zero with a 60 Hz display.
    ///
    /// # Errors
    ///
    /// Returns the engine's configuration error.
    pub fn new(
        background: BackgroundDefinition,
        config: ParallaxConfig,
    ) -> Result<Self, ConfigError> {
        let mut engine = ParallaxEngine::new(background, config, Timebase::NANOS)?;
        let log = EventLog::new();
        engine.set_trace_sink(Box::new(log.clone()));
        Ok(Self {
            engine,
            presenter: MirrorPresenter::new(),
            log,
            now: HostTime(0),
            refresh: REFRESH_60HZ,
            next_frame: HostTime(0),
            frame_index: 0,
        })
    }

    /// Replaces the display refresh interval.
    #[must_use]
    pub fn with_refresh(mut self, refresh: Duration) -> Self {
        assert!(!refresh.is_zero(), "refresh interval must be positive");
        self.refresh = refresh;
        self
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.now
    }

    /// The engine under test.
    #[must_use]
    pub fn engine(&self) -> &ParallaxEngine {
        &self.engine
    }

    /// The presenter mirror.
    #[must_use]
    pub fn presenter(&self) -> &MirrorPresenter {
        &self.presenter
    }

    /// The event log.
    #[must_use]
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Mounts the engine at the current time. The first frame is delivered
    /// immediately.
    pub fn mount(&mut self, initial: Option<Size>) {
        let changes = self.engine.mount(self.now, initial);
        self.presenter.apply(self.engine.scene(), &changes);
        self.next_frame = self.now;
    }

    /// Unmounts the engine at the current time.
    pub fn unmount(&mut self) {
        let changes = self.engine.unmount();
        self.presenter.apply(self.engine.scene(), &changes);
    }

    /// Delivers a raw window resize at the current time.
    pub fn resize(&mut self, size: Size) {
        self.engine.on_resize(size, self.now);
    }

    /// Runs timers and frames for `duration` of virtual time.
    pub fn run_for(&mut self, duration: Duration) {
        self.run_until(self.now.saturating_add(duration));
    }

    /// Runs timers and frames up to and including `target`.
    ///
    /// Timers fire at their exact deadlines. A timer due at the same instant
    /// as a frame fires first.
    pub fn run_until(&mut self, target: HostTime) {
        loop {
            let timer = self.engine.next_deadline().filter(|&t| t <= target);
            let frame = Some(self.next_frame)
                .filter(|&t| t <= target && self.engine.is_mounted());
            match (timer, frame) {
                (Some(t), f) if f.is_none_or(|f| t <= f) => {
                    self.now = self.now.max(t);
                    self.engine.advance(t);
                }
                (_, Some(f)) => {
                    self.now = self.now.max(f);
                    self.deliver_frame(f);
                    self.next_frame = f.saturating_add(self.refresh);
                }
                (None, None) => break,
            }
        }
        self.now = self.now.max(target);
    }

    /// Renders one extra frame at the current time.
    pub fn render_now(&mut self) {
        self.engine.advance(self.now);
        self.deliver_frame(self.now);
    }

    /// The draw list of the current scene.
    #[must_use]
    pub fn plan(&self) -> RenderPlan {
        RenderPlan::from_scene(self.engine.scene())
    }

    fn deliver_frame(&mut self, at: HostTime) {
        let tick = FrameTick {
            refresh_interval: Some(self.refresh),
            ..FrameTick::new(at, self.frame_index)
        };
        self.frame_index += 1;
        let changes = self.engine.frame(&tick);
        self.presenter.apply(self.engine.scene(), &changes);
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Point;
    use parallax_core::background::ImageRef;
    use parallax_core::direction::Direction;
    use parallax_core::scene::ImageId;
    use parallax_core::trace::RebuildReason;
    use parallax_render::Paint;

    use super::*;

    fn background(layers: u32) -> BackgroundDefinition {
        let images = (0..layers)
            .map(|d| ImageRef::new(format!("layer-{d}.webp")))
            .collect();
        BackgroundDefinition::from_layers(images, Size::new(384.0, 216.0), 0.1).unwrap()
    }

    fn harness(layers: u32) -> Harness {
        Harness::new(background(layers), ParallaxConfig::DEFAULT).unwrap()
    }

    fn secs(s: u64) -> HostTime {
        HostTime(s * SECOND.0)
    }

    fn frames_after(log: &EventLog, t: HostTime) -> usize {
        log.events()
            .iter()
            .filter(|e| matches!(e, RecordedEvent::Frame(f) if f.now > t))
            .count()
    }

    #[test]
    fn flips_follow_the_period_without_drift() {
        let mut h = harness(8).with_refresh(Duration(16_700_000));
        h.mount(Some(Size::new(1920.0, 1080.0)));
        h.run_until(secs(151));

        let flips = h.log().flips();
        let at: Vec<HostTime> = flips.iter().map(|f| f.at).collect();
        assert_eq!(at, [secs(30), secs(60), secs(90), secs(120), secs(150)]);
        let directions: Vec<Direction> = flips.iter().map(|f| f.direction).collect();
        assert_eq!(
            directions,
            [
                Direction::Reverse,
                Direction::Forward,
                Direction::Reverse,
                Direction::Forward,
                Direction::Reverse,
            ]
        );
        assert!(flips.iter().all(|f| f.applied_at == f.at), "timers are punctual");
        assert_eq!(h.engine().direction(), Direction::Reverse);
    }

    #[test]
    fn unmount_cancels_everything() {
        let mut h = harness(8);
        h.mount(Some(Size::new(1280.0, 720.0)));
        h.run_until(secs(10));
        h.resize(Size::new(640.0, 480.0));
        h.run_for(MILLISECOND.saturating_mul(30));
        h.unmount();
        let unmounted_at = h.now();
        let logged = h.log().len();

        // A resize arriving after teardown and a long quiet stretch.
        h.resize(Size::new(800.0, 600.0));
        h.run_until(secs(200));

        assert_eq!(h.log().len(), logged, "no events after unmount");
        assert_eq!(frames_after(h.log(), unmounted_at), 0);
        assert_eq!(h.presenter().live_count(), 0);
        assert!(h.engine().next_deadline().is_none());
        assert!(!h.engine().is_animating());
        assert!(matches!(
            h.log().events().last(),
            Some(RecordedEvent::Unmount(UnmountEvent {
                layers: 8,
                cancelled_resize: true,
            }))
        ));
    }

    #[test]
    fn zero_width_renders_no_layers_until_measured() {
        let mut h = harness(8);
        h.mount(Some(Size::new(0.0, 800.0)));
        h.run_for(SECOND);
        assert_eq!(h.engine().layer_count(), 0);
        assert_eq!(h.plan().items.len(), 1, "backdrop only");
        assert_eq!(h.presenter().transform_updates(), 0);

        h.resize(Size::new(1024.0, 768.0));
        h.run_for(SECOND);
        assert_eq!(h.engine().layer_count(), 8);
        assert!(h.presenter().transform_updates() > 0);
    }

    #[test]
    fn headless_mount_waits_for_first_resize() {
        let mut h = harness(3);
        h.mount(None);
        assert_eq!(h.engine().viewport().height, 800.0);
        assert_eq!(h.engine().layer_count(), 0);
        h.resize(Size::new(1440.0, 900.0));
        h.run_for(SECOND);
        assert_eq!(h.engine().layer_count(), 3);
    }

    #[test]
    fn bursts_of_resizes_commit_once() {
        let mut h = harness(4);
        h.mount(Some(Size::new(1280.0, 720.0)));
        for w in (1_000_u32..1_400).step_by(40) {
            h.resize(Size::new(f64::from(w), 700.0));
            h.run_for(MILLISECOND.saturating_mul(20));
        }
        h.run_for(SECOND);
        let commits: Vec<ViewportEvent> = h
            .log()
            .events()
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::Viewport(v) => Some(*v),
                _ => None,
            })
            .collect();
        assert_eq!(commits.len(), 1, "debounced into one commit");
        assert_eq!(commits[0].viewport.width, 1360.0);
    }

    #[test]
    fn resize_and_flip_at_the_same_instant() {
        let mut h = harness(4);
        h.mount(Some(Size::new(1280.0, 720.0)));
        let debounce = ParallaxConfig::DEFAULT.resize_debounce(Timebase::NANOS);
        h.run_until(HostTime(secs(30).0 - debounce.0));
        h.resize(Size::new(1920.0, 1080.0));
        h.run_until(secs(31));

        let events = h.log().events();
        let viewport = events
            .iter()
            .position(|e| matches!(e, RecordedEvent::Viewport(v) if v.now == secs(30)))
            .unwrap();
        let flip = events
            .iter()
            .position(|e| matches!(e, RecordedEvent::DirectionFlip(f) if f.at == secs(30)))
            .unwrap();
        assert!(viewport < flip, "resize is processed before the flip");

        let reasons: Vec<RebuildReason> = events
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::LayersRebuilt(r) if r.now == secs(30) => Some(r.reason),
                _ => None,
            })
            .collect();
        assert_eq!(
            reasons,
            [RebuildReason::Resize, RebuildReason::DirectionFlip]
        );
    }

    /// The image and native-pixel position visible for `depth` at `point`.
    fn sample_tile(plan: &RenderPlan, depth: u32, point: Point) -> Option<Point> {
        plan.sample_all(point).find_map(|s| match s.paint {
            Paint::Image { image, .. } if image == ImageId(depth) => Some(s.local),
            _ => None,
        })
    }

    /// Cycles shorter than the flip period so a whole loop fits between
    /// flips.
    const FAST: ParallaxConfig = ParallaxConfig {
        base_speed_ms: 20_000,
        speed_step_ms: 2_000,
        ..ParallaxConfig::DEFAULT
    };

    fn assert_seamless(direction_flips: u64) {
        let viewport = Size::new(1280.0, 720.0);
        let start = secs(30 * direction_flips);
        let mut h = Harness::new(background(4), FAST).unwrap();
        h.mount(Some(viewport));
        h.run_until(start);
        h.render_now();
        let before = h.plan();

        for depth in 0..4 {
            let cycle = FAST.cycle_duration(depth, Timebase::NANOS);
            let mut late = Harness::new(background(4), FAST).unwrap();
            late.mount(Some(viewport));
            late.run_until(HostTime(start.0 + cycle.0 - 1));
            late.render_now();
            let after = late.plan();

            for y in (0..720).step_by(24) {
                let p = Point::new(0.0, f64::from(y));
                let a = sample_tile(&before, depth, p);
                let b = sample_tile(&after, depth, p);
                match (a, b) {
                    (Some(a), Some(b)) => assert!(
                        (a - b).hypot() < 1e-3,
                        "depth {depth} jumps at {p:?}: {a:?} vs {b:?}"
                    ),
                    (None, None) => {}
                    _ => panic!("depth {depth} coverage changed at {p:?}"),
                }
            }
        }
    }

    #[test]
    fn forward_loop_is_seamless() {
        assert_seamless(0);
    }

    #[test]
    fn reverse_loop_is_seamless() {
        assert_seamless(1);
    }

    #[test]
    fn remount_starts_fresh() {
        let mut h = harness(2);
        h.mount(Some(Size::new(800.0, 600.0)));
        h.run_until(secs(45));
        h.unmount();
        h.run_until(secs(50));
        h.mount(Some(Size::new(800.0, 600.0)));
        h.run_until(secs(79));
        assert_eq!(h.log().flips().len(), 1);
        h.run_until(secs(81));
        let flips = h.log().flips();
        assert_eq!(flips.last().map(|f| f.at), Some(secs(80)), "schedule restarted");
        assert!(flips.iter().all(|f| f.total == 1), "flip count restarted");
        assert_eq!(h.presenter().live_count(), h.engine().scene().node_count());
    }

    #[test]
    fn frames_report_the_display_refresh() {
        let refresh = MILLISECOND.saturating_mul(8);
        let mut h = Harness::new(background(3), ParallaxConfig::DEFAULT)
            .unwrap()
            .with_refresh(refresh);
        h.mount(Some(Size::new(1280.0, 720.0)));
        h.run_for(MILLISECOND.saturating_mul(40));
        let frames: Vec<_> = h
            .log()
            .events()
            .into_iter()
            .filter_map(|e| match e {
                RecordedEvent::Frame(f) => Some(f),
                _ => None,
            })
            .collect();
        assert_eq!(frames.len(), 6, "frames at 0, 8, 16, 24, 32 and 40 ms");
        assert!(frames.iter().all(|f| f.refresh_interval == Some(refresh)));
    }
}
