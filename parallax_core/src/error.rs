// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration-time errors.
//!
//! Runtime conditions (an unmeasured viewport, an image that fails to decode)
//! are never errors; the engine degrades to a blank backdrop. Only a malformed
//! [`BackgroundDefinition`](crate::background::BackgroundDefinition) or
//! [`ParallaxConfig`](crate::config::ParallaxConfig) is rejected, and it is
//! rejected before an engine exists.

/// A [`BackgroundDefinition`](crate::background::BackgroundDefinition) that
/// cannot produce a meaningful depth stack.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum BackgroundError {
    /// Fewer than two depth layers were supplied.
    #[error("background needs at least 2 depth layers, got {count}")]
    TooFewLayers {
        /// Number of layers supplied.
        count: usize,
    },
    /// The same depth index was supplied twice.
    #[error("depth index {depth} appears more than once")]
    DuplicateDepth {
        /// The repeated index.
        depth: u32,
    },
    /// Depth indices do not form the range `0..N`.
    #[error("depth indices must be contiguous from 0: expected {expected}, found {found}")]
    NonContiguousDepth {
        /// The next index the sequence required.
        expected: u32,
        /// The index actually found in that position.
        found: u32,
    },
    /// The native tile size is zero, negative or not finite.
    #[error("tile size must be finite and positive, got {width}x{height}")]
    InvalidTileSize {
        /// Supplied tile width.
        width: f64,
        /// Supplied tile height.
        height: f64,
    },
    /// The vertical offset fraction lies outside `[0, 1]`.
    #[error("vertical offset fraction must lie in [0, 1], got {0}")]
    InvalidOffsetFraction(f64),
}

/// A [`ParallaxConfig`](crate::config::ParallaxConfig) that cannot drive an
/// engine for the given background.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The overscan factor would leave edge gaps (or is not a number).
    #[error("overscan factor must be finite and at least 1, got {0}")]
    InvalidOverscan(f64),
    /// A tile group must hold at least one image.
    #[error("a tile group needs at least one image")]
    EmptyGroup,
    /// The direction flip period is zero.
    #[error("direction flip period must be non-zero")]
    ZeroFlipPeriod,
    /// `base_speed_ms - depth * speed_step_ms` reaches zero.
    #[error("cycle duration at depth {depth} is not positive")]
    NonPositiveSpeed {
        /// First depth whose cycle duration is not positive.
        depth: u32,
    },
    /// The background definition itself is malformed.
    #[error(transparent)]
    Background(#[from] BackgroundError),
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let err = BackgroundError::NonContiguousDepth {
            expected: 2,
            found: 4,
        };
        assert_eq!(
            err.to_string(),
            "depth indices must be contiguous from 0: expected 2, found 4"
        );

        let err = ConfigError::from(BackgroundError::TooFewLayers { count: 1 });
        assert_eq!(
            err.to_string(),
            "background needs at least 2 depth layers, got 1",
            "transparent wrapper forwards the inner message"
        );
    }
}
