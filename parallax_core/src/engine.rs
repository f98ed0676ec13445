// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The parallax orchestrator.
//!
//! [`ParallaxEngine`] wires the viewport tracker, the cover scale, the
//! direction controller and one [`LayerAnimator`] per depth into a retained
//! [`Scene`]. It owns no timers and no clock. The host drives it with four
//! calls:
//!
//! - [`on_resize`](ParallaxEngine::on_resize) for every raw window resize,
//! - [`advance`](ParallaxEngine::advance) once the time returned by
//!   [`next_deadline`](ParallaxEngine::next_deadline) has passed,
//! - [`frame`](ParallaxEngine::frame) once per display refresh,
//! - [`mount`](ParallaxEngine::mount) / [`unmount`](ParallaxEngine::unmount)
//!   around the component's lifetime.
//!
//! Every call finishes all of its recomputation before returning. Timers are
//! fired strictly in chronological order; when a resize commit and a direction
//! flip fall due at the same instant, the resize is processed first.
//!
//! While the committed viewport has zero width the scene holds only the
//! backdrop and the foreground slot: no layer nodes exist and nothing
//! animates.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Size;

use crate::animator::{LayerAnimator, LayerContext, LayerState};
use crate::background::BackgroundDefinition;
use crate::config::ParallaxConfig;
use crate::direction::{Direction, DirectionController};
use crate::error::ConfigError;
use crate::scale::ScaleResult;
use crate::scene::{ImageId, NodeId, NodeKind, Scene, SceneChanges};
use crate::time::{HostTime, Timebase};
use crate::timing::FrameTick;
use crate::trace::{
    DirectionFlipEvent, FrameEvent, LayersRebuiltEvent, MountEvent, RebuildReason, TraceSink,
    Tracer, UnmountEvent, ViewportEvent,
};
use crate::viewport::{Viewport, ViewportTracker};

/// Scene handles that exist only while mounted.
#[derive(Clone, Copy, Debug)]
struct Mounted {
    root: NodeId,
    backdrop: NodeId,
    foreground: NodeId,
}

/// One instantiated depth layer.
#[derive(Clone, Copy, Debug)]
struct LayerSlot {
    animator: LayerAnimator,
    node: NodeId,
    strip: NodeId,
}

/// Multi-layer infinite parallax background.
pub struct ParallaxEngine {
    background: BackgroundDefinition,
    config: ParallaxConfig,
    timebase: Timebase,
    scene: Scene,
    images: Vec<ImageId>,
    viewport: ViewportTracker,
    scale: ScaleResult,
    direction: DirectionController,
    mounted: Option<Mounted>,
    layers: Vec<LayerSlot>,
    recompute_count: u64,
    sink: Option<Box<dyn TraceSink>>,
}

impl fmt::Debug for ParallaxEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallaxEngine")
            .field("viewport", &self.viewport.current())
            .field("scale", &self.scale.scale)
            .field("direction", &self.direction.direction())
            .field("mounted", &self.mounted.is_some())
            .field("layers", &self.layers.len())
            .field("recompute_count", &self.recompute_count)
            .finish_non_exhaustive()
    }
}

impl ParallaxEngine {
    /// Creates an unmounted engine.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` cannot drive `background`'s depth
    /// count.
    pub fn new(
        background: BackgroundDefinition,
        config: ParallaxConfig,
        timebase: Timebase,
    ) -> Result<Self, ConfigError> {
        config.validate(background.depth_count())?;
        config.validate_ticks(background.depth_count(), timebase)?;

        let mut scene = Scene::new();
        let images = background
            .images()
            .iter()
            .map(|image| scene.register_image(image.clone()))
            .collect();

        Ok(Self {
            viewport: ViewportTracker::new(
                None,
                config.resize_debounce(timebase),
                config.headless_height,
            ),
            direction: DirectionController::new(config.flip_period(timebase)),
            background,
            config,
            timebase,
            scene,
            images,
            scale: ScaleResult::NOT_READY,
            mounted: None,
            layers: Vec::new(),
            recompute_count: 0,
            sink: None,
        })
    }

    /// Installs a trace sink. Events are dispatched only with the `trace`
    /// feature enabled.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.sink = Some(sink);
    }

    // -- Lifecycle --

    /// Mounts the background at `now`.
    ///
    /// `initial` is the window size, or `None` without a windowing context (the
    /// viewport then reports zero width and the configured headless height).
    /// Builds the backdrop, the foreground slot and, if the viewport has a
    /// width, every depth layer; starts the direction flip schedule. Returns
    /// the evaluated scene changes. No-op while already mounted.
    pub fn mount(&mut self, now: HostTime, initial: Option<Size>) -> SceneChanges {
        if self.mounted.is_some() {
            return SceneChanges::default();
        }
        self.viewport = ViewportTracker::new(
            initial,
            self.config.resize_debounce(self.timebase),
            self.config.headless_height,
        );

        let root = self.scene.create_node(NodeKind::Container);
        let backdrop = self.scene.create_node(NodeKind::Backdrop {
            rgba: self.config.backdrop_rgba,
        });
        let foreground = self.scene.create_node(NodeKind::Foreground);
        self.scene.add_child(root, backdrop);
        self.scene.add_child(root, foreground);
        self.mounted = Some(Mounted {
            root,
            backdrop,
            foreground,
        });

        self.direction.start(now);
        let viewport = self.viewport.current();
        self.tracer().mount(&MountEvent { now, viewport });
        self.sync_layers(now, RebuildReason::Mount);
        self.scene.evaluate()
    }

    /// Tears the background down.
    ///
    /// Cancels the pending resize, the flip schedule and every layer
    /// animation, and destroys all scene nodes. Events arriving afterwards are
    /// ignored. Returns the evaluated removals.
    pub fn unmount(&mut self) -> SceneChanges {
        let Some(mounted) = self.mounted.take() else {
            return SceneChanges::default();
        };
        let cancelled_resize = self.viewport.cancel();
        self.direction.stop();
        let layers = self.layer_count();
        for slot in &mut self.layers {
            slot.animator.stop();
        }
        self.layers.clear();
        self.scene.destroy_subtree(mounted.root);
        self.scale = ScaleResult::NOT_READY;
        self.tracer().unmount(&UnmountEvent {
            layers,
            cancelled_resize,
        });
        self.scene.evaluate()
    }

    // -- Event intake --

    /// Records a raw resize signal. Ignored while unmounted.
    pub fn on_resize(&mut self, size: Size, now: HostTime) {
        if self.mounted.is_some() {
            self.viewport.on_resize(size, now);
        }
    }

    /// Earliest time at which [`advance`](Self::advance) has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<HostTime> {
        if self.mounted.is_none() {
            return None;
        }
        match (self.viewport.deadline(), self.direction.next_flip()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fires every timer due at or before `now`, oldest first.
    ///
    /// Each fired timer recomputes the layer stack at its scheduled time, so a
    /// late call produces the same scene as a punctual one.
    pub fn advance(&mut self, now: HostTime) {
        if self.mounted.is_none() {
            return;
        }
        loop {
            let resize = self.viewport.deadline().filter(|&t| t <= now);
            let flip = self.direction.next_flip().filter(|&t| t <= now);
            match (resize, flip) {
                (Some(r), f) if f.is_none_or(|f| r <= f) => self.commit_resize(r),
                (_, Some(f)) => self.apply_flip(f, now),
                (None, None) => break,
            }
        }
    }

    /// Samples every layer animation at `tick.now` and evaluates the scene.
    ///
    /// Returns an empty change set while unmounted.
    pub fn frame(&mut self, tick: &FrameTick) -> SceneChanges {
        if self.mounted.is_none() {
            return SceneChanges::default();
        }
        for slot in &self.layers {
            if let Some(t) = slot.animator.transform_at(tick.now) {
                self.scene.set_transform(slot.strip, t.strip_affine());
            }
        }
        let changes = self.scene.evaluate();
        let event = FrameEvent {
            frame_index: tick.frame_index,
            now: tick.now,
            refresh_interval: tick.refresh_interval,
            transforms: u32::try_from(changes.transforms.len()).unwrap_or(u32::MAX),
            topology_changed: changes.topology_changed,
        };
        self.tracer().frame(&event);
        changes
    }

    // -- Queries --

    /// Whether the engine is mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Whether any layer is animating.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.layers.iter().any(|slot| slot.animator.is_animating())
    }

    /// The committed viewport.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport.current()
    }

    /// The cover scale for the committed viewport.
    #[must_use]
    pub fn scale(&self) -> ScaleResult {
        self.scale
    }

    /// The current scroll direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction.direction()
    }

    /// State of every instantiated layer, farthest first.
    pub fn layer_states(&self) -> impl Iterator<Item = &LayerState> + '_ {
        self.layers.iter().filter_map(|slot| slot.animator.state())
    }

    /// Number of instantiated layers (zero while not ready).
    #[must_use]
    pub fn layer_count(&self) -> u32 {
        u32::try_from(self.layers.len()).unwrap_or(u32::MAX)
    }

    /// Scene node of layer `depth`, if instantiated.
    #[must_use]
    pub fn layer_node(&self, depth: u32) -> Option<NodeId> {
        self.layers.get(depth as usize).map(|slot| slot.node)
    }

    /// The retained scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Root node of the mounted scene.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.mounted.map(|m| m.root)
    }

    /// Slot for caller content, painted above every layer.
    #[must_use]
    pub fn foreground(&self) -> Option<NodeId> {
        self.mounted.map(|m| m.foreground)
    }

    /// Solid fill painted beneath every layer.
    #[must_use]
    pub fn backdrop(&self) -> Option<NodeId> {
        self.mounted.map(|m| m.backdrop)
    }

    /// How many times the layer stack has been recomputed.
    #[must_use]
    pub fn recompute_count(&self) -> u64 {
        self.recompute_count
    }

    /// The background definition.
    #[must_use]
    pub fn background(&self) -> &BackgroundDefinition {
        &self.background
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &ParallaxConfig {
        &self.config
    }

    /// The host timebase.
    #[must_use]
    pub fn timebase(&self) -> Timebase {
        self.timebase
    }

    // -- Internals --

    fn tracer(&mut self) -> Tracer<'_> {
        match &mut self.sink {
            Some(sink) => Tracer::new(sink.as_mut()),
            None => Tracer::none(),
        }
    }

    fn commit_resize(&mut self, at: HostTime) {
        let Some(viewport) = self.viewport.poll(at) else {
            return;
        };
        self.sync_layers(at, RebuildReason::Resize);
        let scale = self.scale.scale;
        self.tracer().viewport(&ViewportEvent {
            now: at,
            viewport,
            scale,
        });
    }

    fn apply_flip(&mut self, at: HostTime, now: HostTime) {
        let Some(flip) = self.direction.poll(at) else {
            return;
        };
        self.tracer().direction_flip(&DirectionFlipEvent {
            at: flip.at,
            applied_at: now,
            direction: flip.direction,
            total: flip.total,
        });
        self.sync_layers(at, RebuildReason::DirectionFlip);
    }

    /// Recomputes every [`LayerState`] and restarts the animations at `now`.
    ///
    /// Layer nodes are created when the viewport becomes ready and destroyed
    /// when it stops being ready; otherwise only their root transforms change.
    fn sync_layers(&mut self, now: HostTime, reason: RebuildReason) {
        let Some(mounted) = self.mounted else {
            return;
        };
        self.recompute_count += 1;

        let viewport = self.viewport.current();
        self.scale = ScaleResult::compute(
            viewport,
            self.background.tile_size(),
            self.config.overscan_factor,
            self.background.vertical_offset_fraction(),
        );
        let size = viewport.size();
        for node in [mounted.root, mounted.backdrop, mounted.foreground] {
            self.scene.set_size(node, size);
        }

        if !self.scale.is_ready() {
            for slot in self.layers.drain(..) {
                self.scene.destroy_subtree(slot.node);
            }
        } else {
            let ctx = LayerContext {
                config: &self.config,
                timebase: self.timebase,
                depth_count: self.background.depth_count(),
                tile_size: self.background.tile_size(),
                viewport,
                scale: self.scale,
                direction: self.direction.direction(),
            };
            let states: Vec<LayerState> = (0..ctx.depth_count)
                .map(|depth| LayerState::compute(depth, &ctx))
                .collect();

            if self.layers.is_empty() {
                for state in &states {
                    let slot = self.build_layer(state, mounted.foreground);
                    self.layers.push(slot);
                }
            }
            for (slot, state) in self.layers.iter_mut().zip(states) {
                self.scene.set_transform(slot.node, state.root_transform());
                slot.animator.restart(state, now);
            }
        }

        let layers = self.layer_count();
        self.tracer().layers_rebuilt(&LayersRebuiltEvent {
            now,
            layers,
            reason,
        });
    }

    /// Creates the node subtree of one layer directly below `above`.
    fn build_layer(&mut self, state: &LayerState, above: NodeId) -> LayerSlot {
        let image = self.images[state.depth as usize];
        let group_size = Size::new(state.group_width(), state.tile_size.height);

        let node = self.scene.create_node(NodeKind::Layer { depth: state.depth });
        self.scene.set_size(node, state.tile_size);
        let strip = self.scene.create_node(NodeKind::Strip);
        self.scene.add_child(node, strip);

        for offset in state.group_offsets() {
            let group = self.scene.create_node(NodeKind::TileGroup);
            self.scene
                .set_transform(group, kurbo::Affine::translate((offset, 0.0)));
            self.scene.set_size(group, group_size);
            self.scene.add_child(strip, group);
            for tile_x in state.tile_offsets() {
                let tile = self.scene.create_node(NodeKind::Tile {
                    image,
                    priority: state.priority,
                });
                self.scene
                    .set_transform(tile, kurbo::Affine::translate((tile_x, 0.0)));
                self.scene.set_size(tile, state.tile_size);
                self.scene.add_child(group, tile);
            }
        }

        self.scene.insert_before(node, above);
        LayerSlot {
            animator: LayerAnimator::new(),
            node,
            strip,
        }
    }
}
