// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry, timing and scene graph for infinite multi-layer parallax
//! backgrounds.
//!
//! `parallax_core` renders several depth-ordered image layers, each scrolling
//! at a depth-proportional speed, looping horizontally without seams,
//! reversing direction on a fixed period and rescaling to cover any viewport.
//! It is `no_std` compatible (with `alloc`) and owns no clock, timer or
//! window: backends feed it time, resize signals and frame ticks, and mirror
//! its retained [`Scene`](scene::Scene) into their native tree.
//!
//! # Architecture
//!
//! ```text
//!   resize ──► ViewportTracker ──► ScaleResult ──┐
//!                                               ▼
//!   BackgroundDefinition ─────────────► LayerState × N ◄── DirectionController
//!                                               │
//!                                               ▼
//!   FrameTick ──► LayerAnimator::transform_at ──► Scene::evaluate()
//!                                                      │
//!                                                      ▼
//!                                  SceneChanges ──► Presenter::apply()
//! ```
//!
//! **[`engine`]**: the [`ParallaxEngine`](engine::ParallaxEngine)
//! orchestrator and its mount / resize / advance / frame / unmount lifecycle.
//!
//! **[`background`]** and **[`config`]**: validated static inputs.
//!
//! **[`viewport`]**, **[`debounce`]**, **[`scale`]**: measurement, resize
//! coalescing and cover scaling.
//!
//! **[`animator`]**: per-depth geometry and the pure
//! [`compute_layer_transform`](animator::compute_layer_transform).
//!
//! **[`direction`]**: drift-free periodic direction flips.
//!
//! **[`scene`]** and **[`dirty`]**: struct-of-arrays scene graph with
//! generational handles and `understory_dirty` channels.
//!
//! **[`backend`]**: the [`Presenter`](backend::Presenter) trait.
//!
//! **[`time`]** and **[`timing`]**: host ticks, timebases and frame ticks.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) events with a
//! zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Depth convention
//!
//! Depth `0` is the farthest layer. It is painted first, scrolls slowest and
//! sits on the horizon. Depth `N - 1` is the nearest: painted last, fastest,
//! and lowest on screen.
//!
//! # Crate features
//!
//! - `std` (disabled by default): enables `std` support in dependencies.
//! - `trace` (disabled by default): enables `Tracer` dispatch.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod animator;
pub mod backend;
pub mod background;
pub mod config;
pub mod debounce;
pub mod direction;
pub mod dirty;
pub mod engine;
pub mod error;
pub mod scale;
pub mod scene;
pub mod time;
pub mod timing;
pub mod trace;
pub mod viewport;
