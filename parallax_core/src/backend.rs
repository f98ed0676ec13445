// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for host integrations.
//!
//! The engine is host-agnostic. A backend crate supplies:
//!
//! - **Tick source**: produces [`FrameTick`] values from the host's frame
//!   callback (`requestAnimationFrame` on the web, a virtual clock headless).
//!   Setup and lifecycle differ too much across hosts to share a trait.
//! - **Time**: `now() -> HostTime` and a [`Timebase`] for the host clock.
//! - **Timers**: one wake-up at
//!   [`ParallaxEngine::next_deadline`](crate::engine::ParallaxEngine::next_deadline),
//!   followed by a call to
//!   [`ParallaxEngine::advance`](crate::engine::ParallaxEngine::advance).
//! - **Resize signal**: raw window sizes forwarded to
//!   [`ParallaxEngine::on_resize`](crate::engine::ParallaxEngine::on_resize).
//! - **Presenter**: implements [`Presenter`] to mirror the scene into a native
//!   tree (DOM elements, a draw list).
//!
//! [`FrameTick`]: crate::timing::FrameTick
//! [`Timebase`]: crate::time::Timebase

use crate::scene::{Scene, SceneChanges};

/// Applies evaluated scene changes to a host presentation tree.
///
/// # Frame loop pseudocode
///
/// ```rust,ignore
/// fn on_frame(tick: FrameTick) {
///     engine.advance(tick.now);
///     let changes = engine.frame(&tick);
///     presenter.apply(engine.scene(), &changes);
///     if let Some(at) = engine.next_deadline() {
///         host.wake_at(at);
///     }
/// }
/// ```
pub trait Presenter {
    /// Applies `changes` to the backing tree, reading current node state from
    /// `scene` as needed.
    fn apply(&mut self, scene: &Scene, changes: &SceneChanges);
}
