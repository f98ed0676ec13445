// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cover scaling.
//!
//! The background is scaled uniformly so that one tile covers the viewport on
//! both axes, then enlarged by a fixed overscan margin so that aspect-ratio
//! mismatch and the per-layer vertical fan-out never expose an edge:
//!
//! ```text
//! scale = max(viewport.h / tile.h, viewport.w / tile.w) * overscan
//! ```

use kurbo::{Point, Size};

use crate::viewport::Viewport;

/// Scale factor and derived pixel geometry for one viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScaleResult {
    /// Uniform scale applied to native tile pixels.
    pub scale: f64,
    /// Tile width after scaling.
    pub scaled_width: f64,
    /// Tile height after scaling.
    pub scaled_height: f64,
    /// Maximum vertical layer offset, in viewport pixels.
    pub vertical_offset_pixels: f64,
}

impl ScaleResult {
    /// The degenerate result for an unmeasured viewport.
    pub const NOT_READY: Self = Self {
        scale: 0.0,
        scaled_width: 0.0,
        scaled_height: 0.0,
        vertical_offset_pixels: 0.0,
    };

    /// Computes the cover scale of `tile_size` over `viewport`.
    ///
    /// Returns [`NOT_READY`](Self::NOT_READY) when the viewport has no width.
    #[must_use]
    pub fn compute(
        viewport: Viewport,
        tile_size: Size,
        overscan: f64,
        vertical_offset_fraction: f64,
    ) -> Self {
        if !viewport.is_ready() {
            return Self::NOT_READY;
        }
        let cover = (viewport.height / tile_size.height).max(viewport.width / tile_size.width);
        let scale = cover * overscan;
        Self {
            scale,
            scaled_width: tile_size.width * scale,
            scaled_height: tile_size.height * scale,
            vertical_offset_pixels: vertical_offset_fraction * viewport.height,
        }
    }

    /// Whether this result describes a renderable background.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.scale > 0.0
    }

    /// Scaled tile size.
    #[must_use]
    pub fn scaled_size(&self) -> Size {
        Size::new(self.scaled_width, self.scaled_height)
    }

    /// Top-left corner that centers one scaled tile in `viewport`, before any
    /// per-layer vertical offset.
    #[must_use]
    pub fn centered_origin(&self, viewport: Viewport) -> Point {
        Point::new(
            (viewport.width - self.scaled_width) / 2.0,
            (viewport.height - self.scaled_height) / 2.0,
        )
    }
}
