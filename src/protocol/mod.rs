//! # CameraVision Protocol Module
//!
//! Text command protocol spoken to the CameraVision command port.
//!
//! This module handles:
//! - Token vocabulary (slew tokens like `-45p`, discrete tokens like `A`)
//! - Edge-suppressed slew encoding with a zero band around center
//! - Global debounce of discrete commands

pub mod command;
pub mod encoder;
pub mod debounce;
