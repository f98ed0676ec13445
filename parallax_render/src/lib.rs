// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plans for parallax scenes.
//!
//! This crate flattens an evaluated [`parallax_core`] scene into the
//! intermediate form a drawing backend consumes:
//!
//! - [`RenderItem`]: one painted node (the backdrop or an image tile) with its
//!   world transform and local size.
//! - [`RenderPlan`]: every item of one frame in back-to-front order, with
//!   point sampling that reports which image (and which pixel of it) is
//!   visible at a viewport position.
//!
//! Sampling lets headless tests compare what is on screen at two instants
//! without rasterizing anything.

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod plan;

pub use plan::{Paint, RenderItem, RenderPlan, Sample};
