// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: the painted nodes of one frame, back to front.

use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect, Size};
use parallax_core::animator::LoadPriority;
use parallax_core::scene::{ImageId, NodeId, NodeKind, Scene};

/// What a render item paints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Paint {
    /// A solid colour, straight RGBA.
    Fill([u8; 4]),
    /// An image tile.
    Image {
        /// The image drawn.
        image: ImageId,
        /// Its fetch priority.
        priority: LoadPriority,
    },
}

/// A single painted node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderItem {
    /// The node this item comes from.
    pub node: NodeId,
    /// What the node paints.
    pub paint: Paint,
    /// Node-local to viewport transform.
    pub world_transform: Affine,
    /// Extent in node-local units, anchored at the local origin.
    pub size: Size,
}

impl RenderItem {
    /// Axis-aligned viewport-space bounding box.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.world_transform
            .transform_rect_bbox(Rect::from_origin_size(Point::ORIGIN, self.size))
    }

    /// Maps a viewport point into node-local units if it falls inside the
    /// item. The right and bottom edges are exclusive, so adjacent tiles never
    /// both claim a point.
    #[must_use]
    pub fn local_point(&self, point: Point) -> Option<Point> {
        if self.world_transform.determinant() == 0.0 {
            return None;
        }
        let local = self.world_transform.inverse() * point;
        let inside = local.x >= 0.0
            && local.y >= 0.0
            && local.x < self.size.width
            && local.y < self.size.height;
        inside.then_some(local)
    }
}

/// What is visible at one viewport point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// The node hit.
    pub node: NodeId,
    /// What it paints.
    pub paint: Paint,
    /// The hit position in node-local units (native tile pixels for tiles).
    pub local: Point,
}

/// Painted nodes of one frame in back-to-front order.
#[derive(Clone, Debug, Default)]
pub struct RenderPlan {
    /// Draw items, farthest first.
    pub items: Vec<RenderItem>,
}

impl RenderPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the plan of an evaluated scene.
    #[must_use]
    pub fn from_scene(scene: &Scene) -> Self {
        let mut plan = Self::new();
        plan.rebuild(scene);
        plan
    }

    /// Rebuilds the plan in place from an evaluated scene.
    pub fn rebuild(&mut self, scene: &Scene) {
        self.items.clear();
        for &idx in scene.traversal_order() {
            let paint = match scene.kind_at(idx) {
                NodeKind::Backdrop { rgba } => Paint::Fill(rgba),
                NodeKind::Tile { image, priority } => Paint::Image { image, priority },
                _ => continue,
            };
            self.items.push(RenderItem {
                node: scene.id_at(idx),
                paint,
                world_transform: scene.world_transform_at(idx),
                size: scene.size_at(idx),
            });
        }
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Items whose bounds intersect `viewport`.
    pub fn visible(&self, viewport: Rect) -> impl Iterator<Item = &RenderItem> + '_ {
        self.items
            .iter()
            .filter(move |item| item.bounds().overlaps(viewport))
    }

    /// Every item under `point`, topmost first.
    pub fn sample_all(&self, point: Point) -> impl Iterator<Item = Sample> + '_ {
        self.items.iter().rev().filter_map(move |item| {
            item.local_point(point).map(|local| Sample {
                node: item.node,
                paint: item.paint,
                local,
            })
        })
    }

    /// The topmost item under `point`.
    #[must_use]
    pub fn sample(&self, point: Point) -> Option<Sample> {
        self.sample_all(point).next()
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;

    use parallax_core::background::{BackgroundDefinition, ImageRef};
    use parallax_core::config::ParallaxConfig;
    use parallax_core::engine::ParallaxEngine;
    use parallax_core::time::{HostTime, Timebase};
    use parallax_core::timing::FrameTick;

    use super::*;

    fn mounted(layers: u32, size: Option<Size>) -> ParallaxEngine {
        let images = (0..layers)
            .map(|d| ImageRef::new(format!("{d}.png")))
            .collect();
        let bg = BackgroundDefinition::from_layers(images, Size::new(384.0, 216.0), 0.1).unwrap();
        let mut engine = ParallaxEngine::new(bg, ParallaxConfig::DEFAULT, Timebase::MICROS).unwrap();
        let _ = engine.mount(HostTime(0), size);
        engine
    }

    #[test]
    fn headless_plan_is_just_the_backdrop() {
        let engine = mounted(4, None);
        let plan = RenderPlan::from_scene(engine.scene());
        assert_eq!(plan.items.len(), 1);
        assert_eq!(plan.items[0].paint, Paint::Fill([0, 0, 0, 255]));
    }

    #[test]
    fn items_are_back_to_front() {
        let engine = mounted(2, Some(Size::new(1920.0, 1080.0)));
        let plan = RenderPlan::from_scene(engine.scene());
        assert_eq!(plan.items.len(), 1 + 2 * 9);
        assert!(matches!(plan.items[0].paint, Paint::Fill(_)), "backdrop first");

        let images: Vec<ImageId> = plan
            .items
            .iter()
            .filter_map(|item| match item.paint {
                Paint::Image { image, .. } => Some(image),
                Paint::Fill(_) => None,
            })
            .collect();
        assert!(images.is_sorted(), "farther depths paint before nearer ones");
    }

    #[test]
    fn topmost_sample_is_the_nearest_layer() {
        let engine = mounted(3, Some(Size::new(1920.0, 1080.0)));
        let plan = RenderPlan::from_scene(engine.scene());
        let hit = plan.sample(Point::new(960.0, 540.0)).unwrap();
        assert!(matches!(hit.paint, Paint::Image { image: ImageId(2), .. }));
        assert!(plan.sample(Point::new(960.0, 5_000.0)).is_none());
    }

    #[test]
    fn every_layer_covers_the_viewport() {
        let mut engine = mounted(8, Some(Size::new(1280.0, 720.0)));
        for (i, secs) in [0_u64, 7, 29, 44].into_iter().enumerate() {
            let _ = engine.frame(&FrameTick::new(HostTime(secs * 1_000_000), i as u64));
            let plan = RenderPlan::from_scene(engine.scene());
            for x in (0..1280).step_by(160) {
                for y in (0..720).step_by(90) {
                    let p = Point::new(f64::from(x), f64::from(y));
                    let tiles = plan
                        .sample_all(p)
                        .filter(|s| matches!(s.paint, Paint::Image { .. }))
                        .count();
                    assert_eq!(tiles, 8, "gap at {p:?} after {secs}s");
                }
            }
        }
    }

    #[test]
    fn tile_local_points_are_native_pixels() {
        let engine = mounted(2, Some(Size::new(1920.0, 1080.0)));
        let plan = RenderPlan::from_scene(engine.scene());
        for sample in plan.sample_all(Point::new(0.0, 0.0)) {
            if let Paint::Image { .. } = sample.paint {
                assert!(sample.local.x >= 0.0 && sample.local.x < 384.0);
                assert!(sample.local.y >= 0.0 && sample.local.y < 216.0);
            }
        }
    }

    #[test]
    fn visible_culls_offscreen_tiles() {
        let engine = mounted(2, Some(Size::new(1920.0, 1080.0)));
        let plan = RenderPlan::from_scene(engine.scene());
        let viewport = Rect::new(0.0, 0.0, 1920.0, 1080.0);
        let visible = plan.visible(viewport).count();
        assert!(visible < plan.items.len(), "outer groups start off screen");
        assert!(visible > 1);
    }
}
