// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology and property
//! management.

use alloc::vec::Vec;

use kurbo::{Affine, Size};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{INVALID, ImageId, NodeId};
use super::traverse::Children;
use crate::animator::LoadPriority;
use crate::background::ImageRef;
use crate::dirty;

/// What a node stands for.
///
/// Only [`Backdrop`](Self::Backdrop) and [`Tile`](Self::Tile) paint anything;
/// the other kinds position their subtree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Plain positioning node.
    #[default]
    Container,
    /// Solid fill beneath every layer.
    Backdrop {
        /// Straight RGBA colour.
        rgba: [u8; 4],
    },
    /// Root of one depth layer.
    Layer {
        /// Depth index, `0` farthest.
        depth: u32,
    },
    /// The animated strip inside a layer.
    Strip,
    /// One of the three tile groups of a strip.
    TileGroup,
    /// One image tile.
    Tile {
        /// Image drawn by the tile.
        image: ImageId,
        /// Fetch priority of that image.
        priority: LoadPriority,
    },
    /// Host slot for caller content, above every layer.
    Foreground,
}

/// Struct-of-arrays storage for the background scene.
///
/// Nodes are addressed by [`NodeId`] handles. Destroyed nodes are recycled
/// through a free list and generation counters reject stale handles.
#[derive(Debug)]
pub struct Scene {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Local properties --
    pub(crate) kind: Vec<NodeKind>,
    pub(crate) local_transform: Vec<Affine>,
    pub(crate) size: Vec<Size>,

    // -- Computed properties --
    pub(crate) world_transform: Vec<Affine>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Traversal cache --
    pub(crate) traversal_order: Vec<u32>,
    pub(crate) traversal_dirty: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,

    images: Vec<ImageRef>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            kind: Vec::new(),
            local_transform: Vec::new(),
            size: Vec::new(),
            world_transform: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            traversal_order: Vec::new(),
            traversal_dirty: true,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            images: Vec::new(),
        }
    }

    // -- Image table --

    /// Adds an image to the table and returns its id.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "one image per depth layer"
    )]
    pub fn register_image(&mut self, image: ImageRef) -> ImageId {
        let id = ImageId(self.images.len() as u32);
        self.images.push(image);
        id
    }

    /// Looks up a registered image.
    #[must_use]
    pub fn image(&self, id: ImageId) -> Option<&ImageRef> {
        self.images.get(id.0 as usize)
    }

    /// Every registered image, indexed by [`ImageId`].
    #[must_use]
    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    // -- Allocation API --

    /// Creates a detached node of the given kind.
    ///
    /// The node starts with an identity transform and zero size.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.kind[i] = kind;
            self.local_transform[i] = Affine::IDENTITY;
            self.size[i] = Size::ZERO;
            self.world_transform[i] = Affine::IDENTITY;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.kind.push(kind);
            self.local_transform.push(Affine::IDENTITY);
            self.size.push(Size::ZERO);
            self.world_transform.push(Affine::IDENTITY);
            self.generation.push(0);
            idx
        };

        self.traversal_dirty = true;
        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
        self.dirty.mark(idx, dirty::CONTENT);

        self.id_at(idx)
    }

    /// Destroys a childless node, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the node has children or the handle is stale.
    pub fn destroy_node(&mut self, id: NodeId) {
        self.validate(id);
        assert!(
            self.first_child[id.idx as usize] == INVALID,
            "cannot destroy node with children"
        );
        self.free_slot(id.idx);
    }

    /// Detaches a node from its parent, then destroys it and all of its
    /// descendants.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy_subtree(&mut self, id: NodeId) {
        if self.parent(id).is_some() {
            self.remove_from_parent(id);
        }
        let mut order = Vec::new();
        self.collect_preorder(id.idx, &mut order);
        // Reverse pre-order leaves every node childless by the time it is
        // destroyed.
        for &idx in order.iter().rev() {
            self.destroy_node(self.id_at(idx));
        }
    }

    /// Returns whether the handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Topology API --

    /// Appends `child` as the topmost child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` already has a parent.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );

        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
        self.dirty.mark_with(c, dirty::TRANSFORM, &EagerPolicy);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Inserts `child` directly below `sibling` in paint order.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, or `sibling`
    /// has no parent.
    pub fn insert_before(&mut self, child: NodeId, sibling: NodeId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
        self.dirty.mark_with(c, dirty::TRANSFORM, &EagerPolicy);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Detaches `child` from its parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn remove_from_parent(&mut self, child: NodeId) {
        self.validate(child);
        let c = child.idx;
        let p = self.parent[c as usize];
        assert!(p != INVALID, "node has no parent");

        self.unlink_from_parent(c);
        self.dirty.remove_dependency(c, p, dirty::TRANSFORM);
        self.dirty.mark_with(c, dirty::TRANSFORM, &EagerPolicy);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.id_at(p))
    }

    /// Returns an iterator over the direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    // -- Property getters --

    /// Returns the kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.validate(id);
        self.kind[id.idx as usize]
    }

    /// Returns the local transform of a node.
    #[must_use]
    pub fn local_transform(&self, id: NodeId) -> Affine {
        self.validate(id);
        self.local_transform[id.idx as usize]
    }

    /// Returns the size of a node in its local space.
    #[must_use]
    pub fn size(&self, id: NodeId) -> Size {
        self.validate(id);
        self.size[id.idx as usize]
    }

    /// Returns the computed world transform of a node.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn world_transform(&self, id: NodeId) -> Affine {
        self.validate(id);
        self.world_transform[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the local transform of a node.
    ///
    /// Marks TRANSFORM with eager propagation to descendants.
    pub fn set_transform(&mut self, id: NodeId, transform: Affine) {
        self.validate(id);
        self.local_transform[id.idx as usize] = transform;
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the local size of a node.
    pub fn set_size(&mut self, id: NodeId, size: Size) {
        self.validate(id);
        self.size[id.idx as usize] = size;
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    // -- Raw-index accessors for backends --
    //
    // These take raw slot indices (as found in `SceneChanges` or
    // `traversal_order()`) and skip generation checks.

    /// Returns the live handle for raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn id_at(&self, idx: u32) -> NodeId {
        self.check_slot(idx);
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns the kind at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn kind_at(&self, idx: u32) -> NodeKind {
        self.check_slot(idx);
        self.kind[idx as usize]
    }

    /// Returns the size at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn size_at(&self, idx: u32) -> Size {
        self.check_slot(idx);
        self.size[idx as usize]
    }

    /// Returns the computed world transform at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn world_transform_at(&self, idx: u32) -> Affine {
        self.check_slot(idx);
        self.world_transform[idx as usize]
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    fn validate(&self, id: NodeId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn check_slot(&self, idx: u32) {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
    }

    /// Unlinks and frees one slot. The slot must have no children.
    fn free_slot(&mut self, idx: u32) {
        if self.parent[idx as usize] != INVALID {
            let p = self.parent[idx as usize];
            self.unlink_from_parent(idx);
            self.dirty.mark(p, dirty::TOPOLOGY);
        }
        self.dirty.remove_key(idx);
        // Bump so outstanding handles fail validation immediately.
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
        self.traversal_dirty = true;
        // A node created since the last evaluate was never reported; drop it
        // from both lists.
        if let Some(pos) = self.pending_added.iter().position(|&a| a == idx) {
            self.pending_added.remove(pos);
        } else {
            self.pending_removed.push(idx);
        }
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Depth-first pre-order collection of the subtree at `idx`.
    pub(crate) fn collect_preorder(&self, idx: u32, out: &mut Vec<u32>) {
        out.push(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.collect_preorder(child, out);
            child = self.next_sibling[child as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn create_and_destroy() {
        let mut scene = Scene::new();
        let id = scene.create_node(NodeKind::Container);
        assert!(scene.is_alive(id));
        assert_eq!(scene.node_count(), 1);
        scene.destroy_node(id);
        assert!(!scene.is_alive(id));
        assert_eq!(scene.node_count(), 0);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut scene = Scene::new();
        let a = scene.create_node(NodeKind::Strip);
        scene.destroy_node(a);
        let b = scene.create_node(NodeKind::Foreground);
        assert!(!scene.is_alive(a));
        assert!(scene.is_alive(b));
        assert_eq!(a.index(), b.index(), "slot reused");
        assert_ne!(a.generation(), b.generation());
        assert_eq!(scene.kind(b), NodeKind::Foreground, "slot state reset");
    }

    #[test]
    fn children_follow_paint_order() {
        let mut scene = Scene::new();
        let root = scene.create_node(NodeKind::Container);
        let backdrop = scene.create_node(NodeKind::Backdrop { rgba: [0, 0, 0, 255] });
        let fg = scene.create_node(NodeKind::Foreground);
        let layer = scene.create_node(NodeKind::Layer { depth: 0 });

        scene.add_child(root, backdrop);
        scene.add_child(root, fg);
        scene.insert_before(layer, fg);

        let kids: Vec<_> = scene.children(root).collect();
        assert_eq!(kids, vec![backdrop, layer, fg]);
        assert_eq!(scene.parent(layer), Some(root));
    }

    #[test]
    fn remove_from_parent_detaches() {
        let mut scene = Scene::new();
        let root = scene.create_node(NodeKind::Container);
        let child = scene.create_node(NodeKind::Strip);
        scene.add_child(root, child);
        scene.remove_from_parent(child);
        assert_eq!(scene.parent(child), None);
        assert!(scene.children(root).next().is_none());
    }

    #[test]
    fn destroy_subtree_frees_every_descendant() {
        let mut scene = Scene::new();
        let root = scene.create_node(NodeKind::Container);
        let layer = scene.create_node(NodeKind::Layer { depth: 2 });
        let strip = scene.create_node(NodeKind::Strip);
        let group = scene.create_node(NodeKind::TileGroup);
        let tile = scene.create_node(NodeKind::Tile {
            image: ImageId(0),
            priority: LoadPriority::Lazy,
        });
        scene.add_child(root, layer);
        scene.add_child(layer, strip);
        scene.add_child(strip, group);
        scene.add_child(group, tile);

        scene.destroy_subtree(layer);

        for id in [layer, strip, group, tile] {
            assert!(!scene.is_alive(id), "{id:?} survived");
        }
        assert!(scene.is_alive(root));
        assert!(scene.children(root).next().is_none());
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn destroying_one_layer_keeps_its_siblings_linked() {
        let mut scene = Scene::new();
        let root = scene.create_node(NodeKind::Container);
        let far = scene.create_node(NodeKind::Layer { depth: 0 });
        let near = scene.create_node(NodeKind::Layer { depth: 1 });
        let strip = scene.create_node(NodeKind::Strip);
        let fg = scene.create_node(NodeKind::Foreground);
        scene.add_child(root, far);
        scene.add_child(root, near);
        scene.add_child(near, strip);
        scene.add_child(root, fg);
        let _ = scene.evaluate();

        scene.destroy_subtree(near);

        let kids: Vec<_> = scene.children(root).collect();
        assert_eq!(kids, vec![far, fg]);
        let changes = scene.evaluate();
        assert!(changes.topology_changed);
        let mut removed = changes.removed.clone();
        removed.sort_unstable();
        assert_eq!(removed, [near.index(), strip.index()]);
    }

    #[test]
    fn image_table_hands_out_dense_ids() {
        let mut scene = Scene::new();
        let a = scene.register_image(ImageRef::new("far.png"));
        let b = scene.register_image(ImageRef::new("near.png"));
        assert_eq!((a, b), (ImageId(0), ImageId(1)));
        assert_eq!(scene.image(b).map(ImageRef::as_str), Some("near.png"));
        assert!(scene.image(ImageId(9)).is_none());
        assert_eq!(scene.images().len(), 2);
    }

    #[test]
    #[should_panic(expected = "cannot destroy node with children")]
    fn destroy_with_children_panics() {
        let mut scene = Scene::new();
        let parent = scene.create_node(NodeKind::Container);
        let child = scene.create_node(NodeKind::Container);
        scene.add_child(parent, child);
        scene.destroy_node(parent);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_set_transform() {
        let mut scene = Scene::new();
        let id = scene.create_node(NodeKind::Strip);
        scene.destroy_node(id);
        scene.set_transform(id, Affine::translate((1.0, 0.0)));
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_subtree_handle_panics_on_kind() {
        let mut scene = Scene::new();
        let layer = scene.create_node(NodeKind::Layer { depth: 0 });
        let strip = scene.create_node(NodeKind::Strip);
        scene.add_child(layer, strip);
        scene.destroy_subtree(layer);
        let _ = scene.kind(strip);
    }

    #[test]
    #[should_panic(expected = "child already has a parent")]
    fn double_attach_panics() {
        let mut scene = Scene::new();
        let a = scene.create_node(NodeKind::Container);
        let b = scene.create_node(NodeKind::Container);
        let c = scene.create_node(NodeKind::Container);
        scene.add_child(a, c);
        scene.add_child(b, c);
    }
}
