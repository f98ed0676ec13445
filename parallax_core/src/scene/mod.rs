// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained scene graph.
//!
//! The engine describes the background as a small tree of nodes that any
//! backend can mirror:
//!
//! ```text
//! root (viewport)
//! ├── backdrop
//! ├── layer d=0      root transform: translate(origin) * scale(s)
//! │   └── strip      animated translation
//! │       ├── group  offset -group_width
//! │       │   └── tile × images_per_group
//! │       ├── group  offset 0
//! │       └── group  offset +group_width
//! ├── layer d=1 …
//! └── foreground
//! ```
//!
//! Each node has:
//!
//! - An identity ([`NodeId`]), a generational handle that goes stale when the
//!   node is destroyed.
//! - Topology: parent, first-child and sibling links. Sibling order is paint
//!   order, so a pre-order walk visits nodes back to front.
//! - A [`kind`](NodeKind) fixed at creation, plus **local properties** set by
//!   the engine: [`transform`](Scene::set_transform) and
//!   [`size`](Scene::set_size).
//! - **Computed properties** produced by [`evaluate`](Scene::evaluate): the
//!   `world_transform`, i.e. the product of ancestor local transforms.
//!
//! Nodes live in struct-of-arrays storage with index-based handles. Property
//! mutations mark the matching [`dirty`](crate::dirty) channel and
//! [`evaluate`](Scene::evaluate) reports what changed as [`SceneChanges`].

mod evaluate;
mod id;
mod store;
mod traverse;

pub use evaluate::SceneChanges;
pub use id::{ImageId, NodeId};
pub use store::{NodeKind, Scene};
pub use traverse::Children;
