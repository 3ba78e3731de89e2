//! # CameraVision Bridge Library
//!
//! Drive a CameraVision pan/tilt camera from a joystick or gamepad.
//!
//! This library provides the core functionality for turning controller input
//! into the CameraVision text command protocol: slew tokens for the stick,
//! discrete tokens for buttons, sent over TCP with flood and repeat
//! suppression.

pub mod config;
pub mod error;
pub mod protocol;
pub mod controller;
pub mod transport;
pub mod driver;
