//! # Calibration Module
//!
//! Converts normalized stick deflection into slew percentages.
//!
//! ## Scaling
//!
//! A raw reading in `-1.0..=1.0` is multiplied by 100 and rounded to the
//! nearest integer, ties toward positive infinity (`-2.5` becomes `-2`,
//! `2.5` becomes `3`). Readings outside the range, and NaN, are clamped
//! first so the result always lies in `-100..=100`.
//!
//! ## Direction
//!
//! Each axis can be inverted. The default inverts pan so that pushing the
//! stick right slews the camera the way the CameraVision rig expects, and
//! leaves tilt as reported.
//!
//! ## Usage
//!
//! ```
//! use camvision_bridge::controller::calibration::Calibration;
//!
//! let cal = Calibration::default();
//! assert_eq!(cal.pan.sample(0.45), -45);
//! assert_eq!(cal.tilt.sample(-0.02), -2);
//! ```

use crate::config::ControllerConfig;

/// Scale factor from normalized deflection to percent.
const PERCENT_SCALE: f32 = 100.0;

/// Calibration for a single axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisCalibration {
    /// Flip the sign of the result.
    pub invert: bool,
}

impl AxisCalibration {
    /// Creates an axis calibration.
    #[must_use]
    pub fn new(invert: bool) -> Self {
        Self { invert }
    }

    /// Converts a raw reading into a slew percentage.
    ///
    /// # Arguments
    ///
    /// * `raw` - Normalized deflection (-1.0 to 1.0)
    ///
    /// # Returns
    ///
    /// Slew percentage (-100 to 100)
    ///
    /// # Examples
    ///
    /// ```
    /// use camvision_bridge::controller::calibration::AxisCalibration;
    ///
    /// let cal = AxisCalibration::new(false);
    /// assert_eq!(cal.sample(0.333), 33);
    /// assert_eq!(cal.sample(-1.0), -100);
    /// assert_eq!(cal.sample(7.5), 100); // Clamped
    /// ```
    #[must_use]
    pub fn sample(&self, raw: f32) -> i32 {
        let raw = if raw.is_nan() { 0.0 } else { raw.clamp(-1.0, 1.0) };
        // floor(x + 0.5) rounds ties up, which f32::round does not
        let percent = (raw * PERCENT_SCALE + 0.5).floor() as i32;

        if self.invert {
            -percent
        } else {
            percent
        }
    }
}

/// Calibration for the pan/tilt pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub pan: AxisCalibration,
    pub tilt: AxisCalibration,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            pan: AxisCalibration::new(true),
            tilt: AxisCalibration::new(false),
        }
    }
}

impl Calibration {
    /// Builds the calibration described by the controller config.
    #[must_use]
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            pan: AxisCalibration::new(config.invert_pan),
            tilt: AxisCalibration::new(config.invert_tilt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_inverts_pan_only() {
        let cal = Calibration::default();
        assert!(cal.pan.invert);
        assert!(!cal.tilt.invert);
    }

    #[test]
    fn test_full_deflection() {
        let cal = AxisCalibration::new(false);
        assert_eq!(cal.sample(1.0), 100);
        assert_eq!(cal.sample(-1.0), -100);
        assert_eq!(cal.sample(0.0), 0);
    }

    #[test]
    fn test_inverted_full_deflection() {
        let cal = AxisCalibration::new(true);
        assert_eq!(cal.sample(1.0), -100);
        assert_eq!(cal.sample(-1.0), 100);
    }

    #[test]
    fn test_rounds_to_nearest() {
        let cal = AxisCalibration::new(false);
        assert_eq!(cal.sample(0.454), 45);
        assert_eq!(cal.sample(0.456), 46);
        assert_eq!(cal.sample(-0.454), -45);
        assert_eq!(cal.sample(-0.456), -46);
    }

    #[test]
    fn test_ties_round_up() {
        let cal = AxisCalibration::new(false);
        // 0.125 scales to exactly 12.5
        assert_eq!(cal.sample(0.125), 13);
        assert_eq!(cal.sample(-0.125), -12);
    }

    #[test]
    fn test_inversion_applies_after_rounding() {
        let cal = AxisCalibration::new(true);
        assert_eq!(cal.sample(-0.125), 12);
        assert_eq!(cal.sample(0.125), -13);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let cal = AxisCalibration::new(false);
        assert_eq!(cal.sample(1.7), 100);
        assert_eq!(cal.sample(-42.0), -100);
        assert_eq!(cal.sample(f32::INFINITY), 100);
        assert_eq!(cal.sample(f32::NEG_INFINITY), -100);
    }

    #[test]
    fn test_nan_reads_as_center() {
        let cal = AxisCalibration::new(true);
        assert_eq!(cal.sample(f32::NAN), 0);
    }

    #[test]
    fn test_from_config() {
        let mut config = ControllerConfig::default();
        config.invert_pan = false;
        config.invert_tilt = true;

        let cal = Calibration::from_config(&config);
        assert_eq!(cal.pan, AxisCalibration::new(false));
        assert_eq!(cal.tilt, AxisCalibration::new(true));
    }

    #[test]
    fn test_reference_sample() {
        let cal = Calibration::default();
        assert_eq!(cal.pan.sample(0.45), -45);
        assert_eq!(cal.tilt.sample(-0.02), -2);
        assert_eq!(cal.pan.sample(0.0), 0);
    }
}
