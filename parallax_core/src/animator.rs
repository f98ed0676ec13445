// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-depth layer geometry and the looping scroll animation.
//!
//! Each depth layer is a horizontally tileable strip made of three adjacent
//! tile groups at offsets `{-1, 0, +1} * group_width`, each group holding
//! `images_per_group` copies of the layer image edge to edge. The strip
//! translates linearly from `0` to `direction * -group_width` and wraps. At the
//! wrap point the neighbouring group occupies exactly the place the departed
//! one started from, so the loop has no visible seam.
//!
//! All geometry below the layer root is expressed in native tile pixels. The
//! root transform maps it to viewport pixels:
//!
//! ```text
//! root = translate(left, top + depth_factor * vertical_offset_pixels) * scale(s)
//! ```
//!
//! Depth `0` is the farthest layer: it is drawn first, scrolls slowest and
//! sits on the horizon line. Depth `N - 1` is the nearest: drawn last, fastest,
//! and shifted down by the full vertical offset.

use kurbo::{Affine, Point, Size, Vec2};

use crate::config::ParallaxConfig;
use crate::direction::Direction;
use crate::scale::ScaleResult;
use crate::time::{Duration, HostTime, Timebase};
use crate::viewport::Viewport;

/// Number of tile groups in a layer strip.
pub const GROUP_COUNT: usize = 3;

/// How eagerly a layer's image should be fetched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoadPriority {
    /// Fetch immediately with high priority.
    Eager,
    /// Fetch when convenient.
    #[default]
    Lazy,
}

/// Inputs shared by every layer of one recomputation.
#[derive(Clone, Copy, Debug)]
pub struct LayerContext<'a> {
    /// Engine configuration.
    pub config: &'a ParallaxConfig,
    /// Host clock timebase.
    pub timebase: Timebase,
    /// Number of depth layers.
    pub depth_count: u32,
    /// Native tile size.
    pub tile_size: Size,
    /// Committed viewport.
    pub viewport: Viewport,
    /// Scale for `viewport`.
    pub scale: ScaleResult,
    /// Current scroll direction.
    pub direction: Direction,
}

/// Derived geometry and timing for one depth layer.
///
/// Recomputed wholesale whenever viewport, scale or direction changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerState {
    /// Depth index, `0` farthest.
    pub depth: u32,
    /// `depth / (N - 1)`, in `[0, 1]`.
    pub depth_factor: f64,
    /// Time to scroll one group width.
    pub cycle: Duration,
    /// Tiles per group.
    pub images_per_group: u32,
    /// Native tile size.
    pub tile_size: Size,
    /// Uniform scale from native to viewport pixels.
    pub scale: f64,
    /// Top-left of the centre tile group in viewport pixels.
    pub origin: Point,
    /// Scroll direction baked into this state.
    pub direction: Direction,
    /// Image fetch priority.
    pub priority: LoadPriority,
}

impl LayerState {
    /// Computes the state of layer `depth`.
    ///
    /// # Panics
    ///
    /// Panics if `depth` is not below `ctx.depth_count`.
    #[must_use]
    pub fn compute(depth: u32, ctx: &LayerContext<'_>) -> Self {
        assert!(
            depth < ctx.depth_count,
            "depth {depth} out of range for {} layers",
            ctx.depth_count
        );
        let depth_factor = if ctx.depth_count > 1 {
            f64::from(depth) / f64::from(ctx.depth_count - 1)
        } else {
            0.0
        };
        let centred = ctx.scale.centered_origin(ctx.viewport);
        let origin = Point::new(
            centred.x,
            centred.y + depth_factor * ctx.scale.vertical_offset_pixels,
        );
        let eager_from = ctx.depth_count.saturating_sub(ctx.config.priority_layers);
        let priority = if depth >= eager_from {
            LoadPriority::Eager
        } else {
            LoadPriority::Lazy
        };
        Self {
            depth,
            depth_factor,
            cycle: ctx.config.cycle_duration(depth, ctx.timebase),
            images_per_group: ctx.config.images_per_group,
            tile_size: ctx.tile_size,
            scale: ctx.scale.scale,
            origin,
            direction: ctx.direction,
            priority,
        }
    }

    /// Width of one tile group in native pixels.
    #[must_use]
    pub fn group_width(&self) -> f64 {
        self.tile_size.width * f64::from(self.images_per_group)
    }

    /// Horizontal offsets of the three tile groups inside the strip.
    #[must_use]
    pub fn group_offsets(&self) -> [f64; GROUP_COUNT] {
        let w = self.group_width();
        [-w, 0.0, w]
    }

    /// Horizontal offsets of the tiles inside one group.
    pub fn tile_offsets(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.images_per_group).map(|i| f64::from(i) * self.tile_size.width)
    }

    /// Transform from native layer space into viewport pixels.
    #[must_use]
    pub fn root_transform(&self) -> Affine {
        Affine::translate(self.origin.to_vec2()) * Affine::scale(self.scale)
    }

    /// Scroll speed in native pixels per second, or zero for a zero cycle.
    #[must_use]
    pub fn speed(&self, timebase: Timebase) -> f64 {
        let secs = self.cycle.as_secs_f64(timebase);
        if secs > 0.0 {
            self.group_width() / secs
        } else {
            0.0
        }
    }
}

/// Strip placement at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerTransform {
    /// Fraction of the current cycle elapsed, in `[0, 1)`.
    pub phase: f64,
    /// Strip translation in native pixels.
    pub translation: f64,
}

impl LayerTransform {
    /// Local transform of the strip node.
    #[must_use]
    pub fn strip_affine(&self) -> Affine {
        Affine::translate(Vec2::new(self.translation, 0.0))
    }
}

/// Where the strip of `state` sits at `time` given the loop started at
/// `phase_start`.
///
/// Linear in time with no easing; wraps every `state.cycle`.
#[must_use]
pub fn compute_layer_transform(
    time: HostTime,
    state: &LayerState,
    phase_start: HostTime,
) -> LayerTransform {
    let cycle = state.cycle.ticks();
    let phase = if cycle == 0 {
        0.0
    } else {
        let elapsed = time.saturating_duration_since(phase_start).ticks();
        (elapsed % cycle) as f64 / cycle as f64
    };
    LayerTransform {
        phase,
        translation: state.direction.sign() * -state.group_width() * phase,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum AnimatorPhase {
    #[default]
    Idle,
    Animating {
        state: LayerState,
        phase_start: HostTime,
    },
}

/// Per-layer animation state machine: `Idle -> Animating`.
///
/// Entering `Animating` again with new parameters restarts the loop at
/// translation `0`. Position is not preserved across a restart.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayerAnimator {
    phase: AnimatorPhase,
}

impl LayerAnimator {
    /// Creates an idle animator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: AnimatorPhase::Idle,
        }
    }

    /// (Re)starts the loop with `state` at `now`.
    pub fn restart(&mut self, state: LayerState, now: HostTime) {
        self.phase = AnimatorPhase::Animating {
            state,
            phase_start: now,
        };
    }

    /// Returns to idle.
    pub fn stop(&mut self) {
        self.phase = AnimatorPhase::Idle;
    }

    /// Whether the loop is running.
    #[must_use]
    pub const fn is_animating(&self) -> bool {
        matches!(self.phase, AnimatorPhase::Animating { .. })
    }

    /// The state being animated.
    #[must_use]
    pub const fn state(&self) -> Option<&LayerState> {
        match &self.phase {
            AnimatorPhase::Animating { state, .. } => Some(state),
            AnimatorPhase::Idle => None,
        }
    }

    /// When the current loop started.
    #[must_use]
    pub const fn phase_start(&self) -> Option<HostTime> {
        match self.phase {
            AnimatorPhase::Animating { phase_start, .. } => Some(phase_start),
            AnimatorPhase::Idle => None,
        }
    }

    /// Strip placement at `now`, or `None` while idle.
    #[must_use]
    pub fn transform_at(&self, now: HostTime) -> Option<LayerTransform> {
        match &self.phase {
            AnimatorPhase::Animating { state, phase_start } => {
                Some(compute_layer_transform(now, state, *phase_start))
            }
            AnimatorPhase::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    const TILE: Size = Size::new(384.0, 216.0);

    fn ctx<'a>(config: &'a ParallaxConfig, depth_count: u32, direction: Direction) -> LayerContext<'a> {
        let viewport = Viewport::new(1920.0, 1080.0);
        LayerContext {
            config,
            timebase: Timebase::NANOS,
            depth_count,
            tile_size: TILE,
            viewport,
            scale: ScaleResult::compute(viewport, TILE, config.overscan_factor, 0.1),
            direction,
        }
    }

    #[test]
    fn depth_three_of_eight_cycles_in_ninety_seconds() {
        let config = ParallaxConfig::DEFAULT;
        let state = LayerState::compute(3, &ctx(&config, 8, Direction::Forward));
        assert_eq!(state.cycle.as_secs_f64(Timebase::NANOS), 90.0);
        assert!((state.depth_factor - 3.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn nearer_layers_are_faster_and_lower() {
        // Regression pin for the depth convention: depth 0 is farthest.
        let config = ParallaxConfig::DEFAULT;
        let c = ctx(&config, 8, Direction::Forward);
        let states: Vec<_> = (0..8).map(|d| LayerState::compute(d, &c)).collect();
        for pair in states.windows(2) {
            assert!(
                pair[0].cycle > pair[1].cycle,
                "depth {} must cycle slower than depth {}",
                pair[0].depth,
                pair[1].depth
            );
            assert!(pair[0].speed(Timebase::NANOS) < pair[1].speed(Timebase::NANOS));
            assert!(pair[0].origin.y < pair[1].origin.y, "vertical fan-out");
        }
        assert_eq!(states[0].depth_factor, 0.0);
        assert_eq!(states[7].depth_factor, 1.0);
    }

    #[test]
    fn origin_centres_scaled_tile_plus_offset() {
        let config = ParallaxConfig::DEFAULT;
        let state = LayerState::compute(7, &ctx(&config, 8, Direction::Forward));
        assert!((state.origin.x - (1920.0 - 2323.2) / 2.0).abs() < 1e-9);
        assert!((state.origin.y - ((1080.0 - 1306.8) / 2.0 + 108.0)).abs() < 1e-9);
    }

    #[test]
    fn nearest_layers_load_eagerly() {
        let config = ParallaxConfig::DEFAULT;
        let c = ctx(&config, 8, Direction::Forward);
        let eager: Vec<u32> = (0..8)
            .map(|d| LayerState::compute(d, &c))
            .filter(|s| s.priority == LoadPriority::Eager)
            .map(|s| s.depth)
            .collect();
        assert_eq!(eager, [6, 7]);
    }

    #[test]
    fn three_groups_of_three_tiles() {
        let config = ParallaxConfig::DEFAULT;
        let state = LayerState::compute(0, &ctx(&config, 4, Direction::Forward));
        assert_eq!(state.group_width(), 1152.0);
        assert_eq!(state.group_offsets(), [-1152.0, 0.0, 1152.0]);
        let tiles: Vec<f64> = state.tile_offsets().collect();
        assert_eq!(tiles, [0.0, 384.0, 768.0]);
    }

    #[test]
    fn translation_sweeps_one_group_width() {
        let config = ParallaxConfig::DEFAULT;
        let state = LayerState::compute(0, &ctx(&config, 4, Direction::Forward));
        let start = HostTime(1_000);
        let cycle = state.cycle.ticks();

        let t0 = compute_layer_transform(start, &state, start);
        assert_eq!(t0.translation, 0.0);

        let half = compute_layer_transform(HostTime(1_000 + cycle / 2), &state, start);
        assert!((half.translation + 576.0).abs() < 1e-6, "forward moves left");

        let wrapped = compute_layer_transform(HostTime(1_000 + cycle), &state, start);
        assert_eq!(wrapped, t0, "one full cycle returns to the start");
    }

    #[test]
    fn reverse_direction_moves_right() {
        let config = ParallaxConfig::DEFAULT;
        let state = LayerState::compute(0, &ctx(&config, 4, Direction::Reverse));
        let t = compute_layer_transform(HostTime(state.cycle.ticks() / 4), &state, HostTime(0));
        assert!((t.translation - 288.0).abs() < 1e-6);
    }

    #[test]
    fn restart_resets_phase_to_zero() {
        // Accepted discontinuity: a restart jumps back to translation 0.
        let config = ParallaxConfig::DEFAULT;
        let c = ctx(&config, 4, Direction::Forward);
        let mut animator = LayerAnimator::new();
        assert!(animator.transform_at(HostTime(0)).is_none());

        animator.restart(LayerState::compute(1, &c), HostTime(0));
        let mid = animator.transform_at(HostTime(20_000_000_000)).unwrap();
        assert!(mid.translation < 0.0);

        let flipped = LayerContext {
            direction: Direction::Reverse,
            ..c
        };
        animator.restart(LayerState::compute(1, &flipped), HostTime(20_000_000_000));
        let after = animator.transform_at(HostTime(20_000_000_000)).unwrap();
        assert_eq!(after.translation, 0.0);
        assert_eq!(animator.phase_start(), Some(HostTime(20_000_000_000)));

        animator.stop();
        assert!(!animator.is_animating());
        assert!(animator.state().is_none());
    }

    #[test]
    fn root_transform_maps_native_to_viewport() {
        let config = ParallaxConfig::DEFAULT;
        let state = LayerState::compute(0, &ctx(&config, 4, Direction::Forward));
        let p = state.root_transform() * Point::new(384.0, 0.0);
        assert!((p.x - (state.origin.x + 2323.2)).abs() < 1e-6);
        assert!((p.y - state.origin.y).abs() < 1e-9);
    }
}
