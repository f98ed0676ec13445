// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine tuning.
//!
//! [`ParallaxConfig`] gathers every constant the engine's geometry and timing
//! depend on. [`ParallaxConfig::DEFAULT`] reproduces the reference behavior:
//! 21% overscan, three tiles per group, a direction flip every 30 s, and a
//! cycle of `120 s - depth * 10 s` per group width.

use crate::error::ConfigError;
use crate::time::{Duration, Timebase};

/// Multiplier applied to the minimum covering scale.
pub const DEFAULT_OVERSCAN: f64 = 1.21;

/// Tiles placed edge-to-edge in one tile group.
pub const DEFAULT_IMAGES_PER_GROUP: u32 = 3;

/// Period of the scroll-direction flip.
pub const DEFAULT_DIRECTION_FLIP_PERIOD_MS: u64 = 30_000;

/// Cycle duration of the farthest layer (depth 0).
pub const DEFAULT_BASE_SPEED_MS: u64 = 120_000;

/// Cycle duration removed per depth step.
pub const DEFAULT_SPEED_STEP_MS: u64 = 10_000;

/// Window within which resize events are coalesced.
pub const DEFAULT_RESIZE_DEBOUNCE_MS: u64 = 100;

/// Number of nearest layers whose images load eagerly.
pub const DEFAULT_PRIORITY_LAYERS: u32 = 2;

/// Height reported when no windowing context exists.
pub const DEFAULT_HEADLESS_HEIGHT: f64 = 800.0;

/// Configuration for a [`ParallaxEngine`](crate::engine::ParallaxEngine).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParallaxConfig {
    /// Multiplier applied to the minimum covering scale (at least 1).
    pub overscan_factor: f64,
    /// Tiles per tile group.
    pub images_per_group: u32,
    /// Milliseconds between direction flips.
    pub direction_flip_period_ms: u64,
    /// Cycle duration of depth 0, in milliseconds.
    pub base_speed_ms: u64,
    /// Cycle duration removed per depth index, in milliseconds.
    pub speed_step_ms: u64,
    /// Resize debounce window, in milliseconds.
    pub resize_debounce_ms: u64,
    /// How many of the nearest layers get eager image loading.
    pub priority_layers: u32,
    /// Height reported before measurement when running headless.
    pub headless_height: f64,
    /// Backdrop color as straight RGBA.
    pub backdrop_rgba: [u8; 4],
}

impl ParallaxConfig {
    /// The reference configuration.
    pub const DEFAULT: Self = Self {
        overscan_factor: DEFAULT_OVERSCAN,
        images_per_group: DEFAULT_IMAGES_PER_GROUP,
        direction_flip_period_ms: DEFAULT_DIRECTION_FLIP_PERIOD_MS,
        base_speed_ms: DEFAULT_BASE_SPEED_MS,
        speed_step_ms: DEFAULT_SPEED_STEP_MS,
        resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
        priority_layers: DEFAULT_PRIORITY_LAYERS,
        headless_height: DEFAULT_HEADLESS_HEIGHT,
        backdrop_rgba: [0, 0, 0, 255],
    };

    /// Cycle duration for `depth` in milliseconds, or `None` if it would not
    /// be positive.
    #[must_use]
    pub const fn speed_units(&self, depth: u32) -> Option<u64> {
        match self.speed_step_ms.checked_mul(depth as u64) {
            Some(step) => match self.base_speed_ms.checked_sub(step) {
                Some(0) | None => None,
                Some(units) => Some(units),
            },
            None => None,
        }
    }

    /// Cycle duration for `depth` in host ticks.
    ///
    /// Returns [`Duration::ZERO`] for depths whose cycle would not be
    /// positive; [`validate`](Self::validate) rules those out up front.
    #[must_use]
    pub const fn cycle_duration(&self, depth: u32, timebase: Timebase) -> Duration {
        match self.speed_units(depth) {
            Some(ms) => Duration::from_millis(ms, timebase),
            None => Duration::ZERO,
        }
    }

    /// Direction flip period in host ticks.
    #[must_use]
    pub const fn flip_period(&self, timebase: Timebase) -> Duration {
        Duration::from_millis(self.direction_flip_period_ms, timebase)
    }

    /// Resize debounce window in host ticks.
    #[must_use]
    pub const fn resize_debounce(&self, timebase: Timebase) -> Duration {
        Duration::from_millis(self.resize_debounce_ms, timebase)
    }

    /// Checks that this configuration can drive `depth_count` layers.
    ///
    /// # Errors
    ///
    /// Fails on an overscan below 1 (or not finite), an empty tile group, a
    /// zero flip period, or a speed step that drives the farthest-index cycle
    /// to zero.
    pub fn validate(&self, depth_count: u32) -> Result<(), ConfigError> {
        if !self.overscan_factor.is_finite() || self.overscan_factor < 1.0 {
            return Err(ConfigError::InvalidOverscan(self.overscan_factor));
        }
        if self.images_per_group == 0 {
            return Err(ConfigError::EmptyGroup);
        }
        if self.direction_flip_period_ms == 0 {
            return Err(ConfigError::ZeroFlipPeriod);
        }
        // Speed is monotonic in depth, so the nearest layer is the first to fail.
        let nearest = depth_count.saturating_sub(1);
        if self.speed_units(nearest).is_none() {
            let first_bad = (0..=nearest)
                .find(|&d| self.speed_units(d).is_none())
                .unwrap_or(nearest);
            return Err(ConfigError::NonPositiveSpeed { depth: first_bad });
        }
        Ok(())
    }

    /// Checks that the flip period and every cycle survive conversion to
    /// `timebase` ticks.
    ///
    /// A coarse timebase can round a positive millisecond value down to zero
    /// ticks, which would stall the flip schedule or freeze a layer.
    ///
    /// # Errors
    ///
    /// Fails with [`ConfigError::ZeroFlipPeriod`] or
    /// [`ConfigError::NonPositiveSpeed`] for the first value that rounds to
    /// zero.
    pub fn validate_ticks(
        &self,
        depth_count: u32,
        timebase: Timebase,
    ) -> Result<(), ConfigError> {
        if self.flip_period(timebase).is_zero() {
            return Err(ConfigError::ZeroFlipPeriod);
        }
        let frozen = (0..depth_count).find(|&d| self.cycle_duration(d, timebase).is_zero());
        if let Some(depth) = frozen {
            return Err(ConfigError::NonPositiveSpeed { depth });
        }
        Ok(())
    }
}

impl Default for ParallaxConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_speed_units() {
        let config = ParallaxConfig::DEFAULT;
        assert_eq!(config.speed_units(0), Some(120_000));
        assert_eq!(config.speed_units(3), Some(90_000), "depth 3 of 8 → 90s");
        assert_eq!(config.speed_units(11), Some(10_000));
        assert_eq!(config.speed_units(12), None, "120 - 12*10 is zero");
    }

    #[test]
    fn cycle_duration_uses_timebase() {
        let config = ParallaxConfig::DEFAULT;
        assert_eq!(
            config.cycle_duration(3, Timebase::MICROS),
            Duration(90_000_000)
        );
        assert_eq!(config.cycle_duration(20, Timebase::MICROS), Duration::ZERO);
    }

    #[test]
    fn coarse_timebase_rounds_sub_tick_values_to_errors() {
        // One tick per second.
        let seconds = Timebase::new(1_000_000_000, 1);
        let config = ParallaxConfig {
            direction_flip_period_ms: 500,
            ..ParallaxConfig::DEFAULT
        };
        assert_eq!(config.validate(8), Ok(()));
        assert_eq!(
            config.validate_ticks(8, seconds),
            Err(ConfigError::ZeroFlipPeriod)
        );

        let config = ParallaxConfig {
            base_speed_ms: 2_500,
            speed_step_ms: 1_000,
            ..ParallaxConfig::DEFAULT
        };
        assert_eq!(config.validate(3), Ok(()));
        assert_eq!(
            config.validate_ticks(3, seconds),
            Err(ConfigError::NonPositiveSpeed { depth: 2 })
        );
        assert_eq!(ParallaxConfig::DEFAULT.validate_ticks(8, seconds), Ok(()));
    }

    #[test]
    fn default_validates_for_eight_layers() {
        assert_eq!(ParallaxConfig::default().validate(8), Ok(()));
    }

    #[test]
    fn too_many_layers_for_speed_step() {
        let err = ParallaxConfig::DEFAULT.validate(13).unwrap_err();
        assert_eq!(err, ConfigError::NonPositiveSpeed { depth: 12 });
    }

    #[test]
    fn invalid_fields_are_reported() {
        let mut config = ParallaxConfig::DEFAULT;
        config.overscan_factor = 0.9;
        assert_eq!(config.validate(4), Err(ConfigError::InvalidOverscan(0.9)));

        let mut config = ParallaxConfig::DEFAULT;
        config.images_per_group = 0;
        assert_eq!(config.validate(4), Err(ConfigError::EmptyGroup));

        let mut config = ParallaxConfig::DEFAULT;
        config.direction_flip_period_ms = 0;
        assert_eq!(config.validate(4), Err(ConfigError::ZeroFlipPeriod));
    }
}
