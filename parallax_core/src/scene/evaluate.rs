// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene evaluation and change tracking.
//!
//! Evaluation drains each dirty channel in turn:
//!
//! 1. **TRANSFORM**: recompute `world_transform = parent_world * local` for
//!    every affected node, parents before children.
//! 2. **CONTENT**: collect only; backends read kind and size from the scene.
//! 3. **TOPOLOGY**: consume; the traversal order is rebuilt up front.
//!
//! [`SceneChanges`] carries raw slot indices so backends can index the
//! scene's arrays through the `*_at()` accessors without generation checks.

use alloc::vec::Vec;

use kurbo::Affine;

use super::id::INVALID;
use super::store::Scene;
use crate::dirty;

/// Changes produced by one [`Scene::evaluate`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneChanges {
    /// Nodes whose world transform was recomputed.
    pub transforms: Vec<u32>,
    /// Nodes whose kind or size changed.
    pub content: Vec<u32>,
    /// Nodes created since the last evaluate and still alive.
    pub added: Vec<u32>,
    /// Nodes destroyed since the last evaluate.
    pub removed: Vec<u32>,
    /// Whether the traversal order was rebuilt.
    pub topology_changed: bool,
}

impl SceneChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.transforms.clear();
        self.content.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
            && self.content.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl Scene {
    /// Recomputes dirty world transforms and returns what changed.
    pub fn evaluate(&mut self) -> SceneChanges {
        let mut changes = SceneChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), reusing a caller-provided buffer.
    pub fn evaluate_into(&mut self, changes: &mut SceneChanges) {
        changes.clear();

        if self.traversal_dirty {
            self.rebuild_traversal_order();
            changes.topology_changed = true;
            self.traversal_dirty = false;
        }

        let dirty_transforms: Vec<u32> = self
            .dirty
            .drain(dirty::TRANSFORM)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &dirty_transforms {
            let parent_idx = self.parent[idx as usize];
            let parent_world = if parent_idx != INVALID {
                self.world_transform[parent_idx as usize]
            } else {
                Affine::IDENTITY
            };
            self.world_transform[idx as usize] = parent_world * self.local_transform[idx as usize];
        }
        changes.transforms = dirty_transforms;

        changes.content = self
            .dirty
            .drain(dirty::CONTENT)
            .deterministic()
            .run()
            .collect();

        let _: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }

    /// Live slots in depth-first pre-order: back-to-front paint order.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    fn rebuild_traversal_order(&mut self) {
        let mut order = core::mem::take(&mut self.traversal_order);
        order.clear();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx) {
                self.collect_preorder(idx, &mut order);
            }
        }
        self.traversal_order = order;
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Size};

    use super::*;
    use crate::scene::NodeKind;

    #[test]
    fn world_transforms_compose_parent_first() {
        let mut scene = Scene::new();
        let layer = scene.create_node(NodeKind::Layer { depth: 0 });
        let strip = scene.create_node(NodeKind::Strip);

        let root_xf = Affine::translate((10.0, 20.0)) * Affine::scale(2.0);
        let strip_xf = Affine::translate((-5.0, 0.0));
        scene.set_transform(layer, root_xf);
        scene.set_transform(strip, strip_xf);
        scene.add_child(layer, strip);

        let _ = scene.evaluate();

        assert_eq!(scene.world_transform(layer), root_xf);
        assert_eq!(scene.world_transform(strip), root_xf * strip_xf);
        // Strip-local x = 5 lands at 10 + 2 * (5 - 5).
        let p = scene.world_transform(strip) * Point::new(5.0, 0.0);
        assert_eq!(p, Point::new(10.0, 20.0));
    }

    #[test]
    fn moving_a_parent_reevaluates_descendants() {
        let mut scene = Scene::new();
        let layer = scene.create_node(NodeKind::Layer { depth: 0 });
        let strip = scene.create_node(NodeKind::Strip);
        let tile = scene.create_node(NodeKind::TileGroup);
        scene.add_child(layer, strip);
        scene.add_child(strip, tile);
        let _ = scene.evaluate();

        scene.set_transform(strip, Affine::translate((3.0, 0.0)));
        let changes = scene.evaluate();

        assert!(changes.transforms.contains(&strip.index()));
        assert!(changes.transforms.contains(&tile.index()), "eager propagation");
        assert!(!changes.transforms.contains(&layer.index()));
        assert_eq!(
            scene.world_transform(tile),
            Affine::translate((3.0, 0.0))
        );
    }

    #[test]
    fn quiet_scene_reports_nothing() {
        let mut scene = Scene::new();
        let _root = scene.create_node(NodeKind::Container);
        let first = scene.evaluate();
        assert!(!first.is_empty());
        assert!(scene.evaluate().is_empty());
    }

    #[test]
    fn traversal_order_is_paint_order() {
        let mut scene = Scene::new();
        let root = scene.create_node(NodeKind::Container);
        let backdrop = scene.create_node(NodeKind::Backdrop { rgba: [0, 0, 0, 255] });
        let layer = scene.create_node(NodeKind::Layer { depth: 0 });
        let strip = scene.create_node(NodeKind::Strip);
        let fg = scene.create_node(NodeKind::Foreground);

        scene.add_child(root, backdrop);
        scene.add_child(root, layer);
        scene.add_child(layer, strip);
        scene.add_child(root, fg);
        let _ = scene.evaluate();

        assert_eq!(
            scene.traversal_order(),
            &[root.index(), backdrop.index(), layer.index(), strip.index(), fg.index()]
        );
    }

    #[test]
    fn content_changes_are_local() {
        let mut scene = Scene::new();
        let root = scene.create_node(NodeKind::Container);
        let backdrop = scene.create_node(NodeKind::Backdrop { rgba: [0, 0, 0, 255] });
        scene.add_child(root, backdrop);
        let _ = scene.evaluate();

        scene.set_size(root, Size::new(800.0, 600.0));
        let changes = scene.evaluate();
        assert_eq!(changes.content, [root.index()]);
    }

    #[test]
    fn lifecycle_lists() {
        let mut scene = Scene::new();
        let id = scene.create_node(NodeKind::Strip);
        let changes = scene.evaluate();
        assert_eq!(changes.added, [id.index()]);
        assert!(changes.removed.is_empty());

        scene.destroy_node(id);
        let changes = scene.evaluate();
        assert_eq!(changes.removed, [id.index()]);
        assert!(changes.added.is_empty());
    }

    #[test]
    fn transient_node_is_never_reported() {
        let mut scene = Scene::new();
        let id = scene.create_node(NodeKind::Strip);
        scene.destroy_node(id);
        let changes = scene.evaluate();
        assert!(changes.added.is_empty());
        assert!(changes.removed.is_empty());
    }

    #[test]
    fn reused_slot_reports_only_the_old_node() {
        let mut scene = Scene::new();
        let old = scene.create_node(NodeKind::Strip);
        let _ = scene.evaluate();

        scene.destroy_node(old);
        let reused = scene.create_node(NodeKind::TileGroup);
        assert_eq!(reused.index(), old.index(), "slot is recycled");
        scene.destroy_node(reused);

        let changes = scene.evaluate();
        assert!(changes.added.is_empty());
        assert_eq!(changes.removed, [old.index()]);
    }
}
