// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channels for the scene graph.
//!
//! The scene uses multi-channel dirty tracking (via [`understory_dirty`]) so
//! that a frame only touches the nodes the engine actually changed.
//!
//! - [`TRANSFORM`] propagates: each child has a dependency edge on its parent
//!   and is marked with [`EagerPolicy`](understory_dirty::EagerPolicy), so
//!   moving a layer strip re-derives the world transform of every tile below
//!   it.
//! - [`CONTENT`] is local: a node kind or size change (new backdrop colour,
//!   new tile image, resized foreground) only reports that node.
//! - [`TOPOLOGY`] is marked on create/destroy/attach/detach and forces a
//!   traversal-order rebuild during [`Scene::evaluate`](crate::scene::Scene::evaluate).

use understory_dirty::Channel;

/// Local transform changed; world transforms of the subtree are stale.
pub const TRANSFORM: Channel = Channel::new(0);

/// Node kind or size changed.
pub const CONTENT: Channel = Channel::new(1);

/// Tree structure changed.
pub const TOPOLOGY: Channel = Channel::new(2);
