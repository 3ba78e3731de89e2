//! # Controller Module
//!
//! Joystick and gamepad input handling.
//!
//! This module handles:
//! - Controller detection and connection via evdev
//! - Reading stick deflection and button states once per poll tick
//! - Scaling stick deflection to slew percentages
//! - Mapping buttons to camera commands in priority order

pub mod source;
pub mod gamepad;
pub mod calibration;
pub mod bindings;
