//! # Button Bindings Module
//!
//! Maps gamepad buttons to discrete camera commands.
//!
//! ## Default Bindings
//!
//! Listed in priority order. When several bound buttons are held on the same
//! tick only the first one in this list produces a command.
//!
//! | Priority | Button | Command | Token |
//! |----------|--------|---------|-------|
//! | 1 | Left stick click | Center | `c` |
//! | 2 | South (A / Cross) | Press A | `A` |
//! | 3 | East (B / Circle) | Press B | `B` |
//! | 4 | West (X / Square) | Press X | `X` |
//! | 5 | North (Y / Triangle) | Press Y | `Y` |
//! | 6 | Left shoulder | Press LB | `LB` |
//! | 7 | Right shoulder | Press RB | `RB` |
//! | 8 | Left trigger | Press LT | `LT` |
//! | 9 | Right trigger | Press RT | `RT` |
//! | 10 | Right stick click | Press RS | `RS` |
//!
//! ## Usage
//!
//! ```
//! use camvision_bridge::controller::bindings::BindingTable;
//! use camvision_bridge::protocol::command::Command;
//!
//! let table = BindingTable::default();
//! assert_eq!(table.bindings()[0].command, Command::Center);
//! ```

use serde::Deserialize;

use super::source::{Button, ButtonState, InputSource};
use crate::protocol::command::Command;

/// A single button-to-command binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ButtonBinding {
    pub button: Button,
    pub command: Command,
}

impl ButtonBinding {
    /// Creates a binding.
    #[must_use]
    pub const fn new(button: Button, command: Command) -> Self {
        Self { button, command }
    }
}

/// Default bindings, highest priority first.
pub const DEFAULT_BINDINGS: [ButtonBinding; 10] = [
    ButtonBinding::new(Button::LeftThumb, Command::Center),
    ButtonBinding::new(Button::South, Command::PressA),
    ButtonBinding::new(Button::East, Command::PressB),
    ButtonBinding::new(Button::West, Command::PressX),
    ButtonBinding::new(Button::North, Command::PressY),
    ButtonBinding::new(Button::LeftShoulder, Command::PressLeftShoulder),
    ButtonBinding::new(Button::RightShoulder, Command::PressRightShoulder),
    ButtonBinding::new(Button::LeftTrigger, Command::PressLeftTrigger),
    ButtonBinding::new(Button::RightTrigger, Command::PressRightTrigger),
    ButtonBinding::new(Button::RightThumb, Command::PressRightThumb),
];

/// Result of scanning the bindings on one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Command of the highest-priority pressed button, if any.
    pub command: Option<Command>,
    /// Bound buttons the device does not have, in the order they were checked.
    pub absent: Vec<Button>,
}

/// Ordered list of button bindings.
///
/// The order of the list is the priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingTable {
    bindings: Vec<ButtonBinding>,
}

impl Default for BindingTable {
    fn default() -> Self {
        Self::new(DEFAULT_BINDINGS.to_vec())
    }
}

impl BindingTable {
    /// Creates a table from bindings in priority order.
    #[must_use]
    pub fn new(bindings: Vec<ButtonBinding>) -> Self {
        Self { bindings }
    }

    /// Bindings in priority order.
    #[must_use]
    pub fn bindings(&self) -> &[ButtonBinding] {
        &self.bindings
    }

    /// Finds the command to send this tick.
    ///
    /// Walks the bindings in priority order and stops at the first pressed
    /// button. Buttons the device lacks are skipped and reported in
    /// [`Selection::absent`]; bindings after the winner are not queried.
    ///
    /// # Arguments
    ///
    /// * `source` - Device polled for the current tick
    pub fn select<S: InputSource + ?Sized>(&self, source: &S) -> Selection {
        let mut selection = Selection::default();

        for binding in &self.bindings {
            match source.button_state(binding.button) {
                ButtonState::Pressed => {
                    selection.command = Some(binding.command);
                    break;
                }
                ButtonState::Released => {}
                ButtonState::Absent => selection.absent.push(binding.button),
            }
        }

        selection
    }
}
