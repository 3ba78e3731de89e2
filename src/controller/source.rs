//! # Input Source
//!
//! Backend-neutral view of a joystick or gamepad, as seen by the driver
//! loop once per poll tick.

use serde::Deserialize;

use crate::protocol::command::Axis;

/// Logical gamepad buttons that can be bound to commands.
///
/// Face buttons are named by position so the mapping does not depend on the
/// vendor's labels (Xbox A is [`Button::South`], PlayStation Cross too).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    South,
    East,
    West,
    North,
    LeftShoulder,
    RightShoulder,
    LeftTrigger,
    RightTrigger,
    Select,
    Start,
    Mode,
    LeftThumb,
    RightThumb,
}

/// State of a button on the current poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
    /// The connected device has no such button.
    Absent,
}

impl ButtonState {
    /// Returns `true` only for [`ButtonState::Pressed`].
    #[must_use]
    pub fn is_pressed(self) -> bool {
        self == ButtonState::Pressed
    }
}

/// A polled input device.
///
/// `poll` refreshes the snapshot that `axis_value` and `button_state` read
/// from, so all queries within one tick see the same device state.
#[cfg_attr(test, mockall::automock)]
pub trait InputSource {
    /// Whether the device is still attached.
    fn is_connected(&self) -> bool;

    /// Refresh the device snapshot. Returns `false` once the device is gone.
    fn poll(&mut self) -> bool;

    /// Current deflection of `axis`, in `[-1.0, 1.0]`.
    fn axis_value(&self, axis: Axis) -> f32;

    /// Current state of `button`.
    fn button_state(&self, button: Button) -> ButtonState;
}
