// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Static description of the depth stack.
//!
//! A [`BackgroundDefinition`] lists one image per depth index, the native
//! pixel size shared by every image, and the fraction of the viewport height
//! by which layers fan out vertically. It is validated once, at construction,
//! and is immutable afterwards.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Size;

use crate::error::BackgroundError;

/// Opaque reference to a layer image (a URL, an asset path, a texture name).
///
/// The engine never loads or inspects images; it hands the reference to the
/// presenter untouched.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wraps an image reference.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ImageRef {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for ImageRef {
    fn from(source: String) -> Self {
        Self(source)
    }
}

impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageRef({:?})", self.0)
    }
}

/// An ordered, validated set of depth layers.
///
/// Depth `0` is the farthest layer; depth `N - 1` the nearest.
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundDefinition {
    images: Vec<ImageRef>,
    tile_size: Size,
    vertical_offset_fraction: f64,
}

impl BackgroundDefinition {
    /// Builds a definition from `(depth, image)` pairs in any order.
    ///
    /// # Errors
    ///
    /// Fails if there are fewer than two layers, if a depth repeats, if the
    /// depths are not exactly `0..N`, if the tile size is not finite and
    /// positive, or if the offset fraction lies outside `[0, 1]`.
    pub fn new(
        images: impl IntoIterator<Item = (u32, ImageRef)>,
        tile_size: Size,
        vertical_offset_fraction: f64,
    ) -> Result<Self, BackgroundError> {
        let mut indexed: Vec<(u32, ImageRef)> = images.into_iter().collect();
        indexed.sort_by_key(|(depth, _)| *depth);

        for (expected, (depth, _)) in (0_u32..).zip(&indexed) {
            if *depth < expected {
                return Err(BackgroundError::DuplicateDepth { depth: *depth });
            }
            if *depth != expected {
                return Err(BackgroundError::NonContiguousDepth {
                    expected,
                    found: *depth,
                });
            }
        }

        Self::from_layers(
            indexed.into_iter().map(|(_, image)| image).collect(),
            tile_size,
            vertical_offset_fraction,
        )
    }

    /// Builds a definition from images already ordered farthest-first.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn from_layers(
        images: Vec<ImageRef>,
        tile_size: Size,
        vertical_offset_fraction: f64,
    ) -> Result<Self, BackgroundError> {
        if images.len() < 2 {
            return Err(BackgroundError::TooFewLayers {
                count: images.len(),
            });
        }
        let valid_side = |v: f64| v.is_finite() && v > 0.0;
        if !valid_side(tile_size.width) || !valid_side(tile_size.height) {
            return Err(BackgroundError::InvalidTileSize {
                width: tile_size.width,
                height: tile_size.height,
            });
        }
        if !(0.0..=1.0).contains(&vertical_offset_fraction) {
            return Err(BackgroundError::InvalidOffsetFraction(
                vertical_offset_fraction,
            ));
        }
        Ok(Self {
            images,
            tile_size,
            vertical_offset_fraction,
        })
    }

    /// Number of depth layers (`N`).
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "a depth stack never approaches u32::MAX layers"
    )]
    pub fn depth_count(&self) -> u32 {
        self.images.len() as u32
    }

    /// Image for the given depth, if it exists.
    #[must_use]
    pub fn image(&self, depth: u32) -> Option<&ImageRef> {
        self.images.get(depth as usize)
    }

    /// All images, farthest first.
    #[must_use]
    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    /// Native pixel size of every tile.
    #[must_use]
    pub fn tile_size(&self) -> Size {
        self.tile_size
    }

    /// Fraction of the viewport height used as the maximum layer offset.
    #[must_use]
    pub fn vertical_offset_fraction(&self) -> f64 {
        self.vertical_offset_fraction
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn tile() -> Size {
        Size::new(384.0, 216.0)
    }

    #[test]
    fn unordered_pairs_are_sorted_by_depth() {
        let bg = BackgroundDefinition::new(
            [(2, "c".into()), (0, "a".into()), (1, "b".into())],
            tile(),
            0.1,
        )
        .unwrap();
        assert_eq!(bg.depth_count(), 3);
        assert_eq!(bg.image(0).map(ImageRef::as_str), Some("a"));
        assert_eq!(bg.image(2).map(ImageRef::as_str), Some("c"));
        assert!(bg.image(3).is_none());
    }

    #[test]
    fn single_layer_is_rejected() {
        let err = BackgroundDefinition::from_layers(vec!["only".into()], tile(), 0.0).unwrap_err();
        assert_eq!(err, BackgroundError::TooFewLayers { count: 1 });
    }

    #[test]
    fn gap_in_depths_is_rejected() {
        let err = BackgroundDefinition::new([(0, "a".into()), (2, "c".into())], tile(), 0.0)
            .unwrap_err();
        assert_eq!(
            err,
            BackgroundError::NonContiguousDepth {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn missing_zero_is_rejected() {
        let err = BackgroundDefinition::new([(1, "b".into()), (2, "c".into())], tile(), 0.0)
            .unwrap_err();
        assert_eq!(
            err,
            BackgroundError::NonContiguousDepth {
                expected: 0,
                found: 1
            }
        );
    }

    #[test]
    fn duplicate_depth_is_rejected() {
        let err = BackgroundDefinition::new(
            [(0, "a".into()), (1, "b".into()), (1, "b2".into())],
            tile(),
            0.0,
        )
        .unwrap_err();
        assert_eq!(err, BackgroundError::DuplicateDepth { depth: 1 });
    }

    #[test]
    fn degenerate_tile_and_fraction_are_rejected() {
        let layers = vec![ImageRef::from("a"), ImageRef::from("b")];
        assert!(matches!(
            BackgroundDefinition::from_layers(layers.clone(), Size::new(0.0, 216.0), 0.0),
            Err(BackgroundError::InvalidTileSize { .. })
        ));
        assert!(matches!(
            BackgroundDefinition::from_layers(layers.clone(), Size::new(f64::NAN, 216.0), 0.0),
            Err(BackgroundError::InvalidTileSize { .. })
        ));
        assert_eq!(
            BackgroundDefinition::from_layers(layers, tile(), 1.5),
            Err(BackgroundError::InvalidOffsetFraction(1.5))
        );
    }
}
