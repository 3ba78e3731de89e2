//! # Command Tokens
//!
//! Token vocabulary of the CameraVision command port.
//!
//! Tokens are sent back-to-back with no delimiter, so the vocabulary is
//! prefix-free: axis tokens start with `-` or a digit and end in their axis
//! suffix, discrete tokens are letters only and no discrete token is a prefix
//! of another.

use serde::Deserialize;
use std::fmt;

/// Lower bound of an axis sample (full deflection, negative direction).
pub const AXIS_SAMPLE_MIN: i32 = -100;

/// Upper bound of an axis sample (full deflection, positive direction).
pub const AXIS_SAMPLE_MAX: i32 = 100;

/// Slew axes understood by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal slew
    Pan,
    /// Vertical slew
    Tilt,
}

impl Axis {
    /// Suffix that terminates an axis token.
    #[must_use]
    pub fn suffix(self) -> char {
        match self {
            Axis::Pan => 'p',
            Axis::Tilt => 't',
        }
    }
}

/// Discrete camera commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Center,
    PressA,
    PressB,
    PressX,
    PressY,
    PressLeftShoulder,
    PressRightShoulder,
    PressLeftTrigger,
    PressRightTrigger,
    PressRightThumb,
}

/// Single dispatch table from command kind to wire token.
const COMMAND_TOKENS: &[(Command, &str)] = &[
    (Command::Center, "c"),
    (Command::PressA, "A"),
    (Command::PressB, "B"),
    (Command::PressX, "X"),
    (Command::PressY, "Y"),
    (Command::PressLeftShoulder, "LB"),
    (Command::PressRightShoulder, "RB"),
    (Command::PressLeftTrigger, "LT"),
    (Command::PressRightTrigger, "RT"),
    (Command::PressRightThumb, "RS"),
];

impl Command {
    /// Every command, in table order.
    pub const ALL: [Command; 10] = [
        Command::Center,
        Command::PressA,
        Command::PressB,
        Command::PressX,
        Command::PressY,
        Command::PressLeftShoulder,
        Command::PressRightShoulder,
        Command::PressLeftTrigger,
        Command::PressRightTrigger,
        Command::PressRightThumb,
    ];

    /// Wire token for this command.
    ///
    /// # Examples
    ///
    /// ```
    /// use camvision_bridge::protocol::command::Command;
    ///
    /// assert_eq!(Command::Center.token(), "c");
    /// assert_eq!(Command::PressA.token(), "A");
    /// ```
    #[must_use]
    pub fn token(self) -> &'static str {
        COMMAND_TOKENS
            .iter()
            .find(|(command, _)| *command == self)
            .map(|(_, token)| *token)
            .unwrap_or_default()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One outbound protocol unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Slew rate for one axis, in percent of maximum
    Slew { axis: Axis, value: i32 },
    /// A discrete command
    Discrete(Command),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Slew { axis, value } => write!(f, "{}{}", value, axis.suffix()),
            Token::Discrete(command) => f.write_str(command.token()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_suffixes() {
        assert_eq!(Axis::Pan.suffix(), 'p');
        assert_eq!(Axis::Tilt.suffix(), 't');
    }

    #[test]
    fn test_every_command_has_a_token() {
        for command in Command::ALL {
            assert!(!command.token().is_empty(), "{:?} has no token", command);
        }
        assert_eq!(COMMAND_TOKENS.len(), Command::ALL.len());
    }

    #[test]
    fn test_face_button_tokens() {
        assert_eq!(Command::Center.token(), "c");
        assert_eq!(Command::PressA.token(), "A");
        assert_eq!(Command::PressB.token(), "B");
        assert_eq!(Command::PressX.token(), "X");
        assert_eq!(Command::PressY.token(), "Y");
    }

    #[test]
    fn test_tokens_are_prefix_free() {
        let tokens: Vec<&str> = Command::ALL.iter().map(|c| c.token()).collect();
        for (i, a) in tokens.iter().enumerate() {
            for (j, b) in tokens.iter().enumerate() {
                if i != j {
                    assert!(!b.starts_with(a), "{} is a prefix of {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_discrete_tokens_never_look_like_axis_tokens() {
        for command in Command::ALL {
            let first = command.token().chars().next().unwrap();
            assert!(first != '-' && !first.is_ascii_digit());
        }
    }

    #[test]
    fn test_slew_token_formatting() {
        let token = Token::Slew { axis: Axis::Pan, value: -37 };
        assert_eq!(token.to_string(), "-37p");

        let token = Token::Slew { axis: Axis::Tilt, value: 0 };
        assert_eq!(token.to_string(), "0t");

        let token = Token::Slew { axis: Axis::Tilt, value: 100 };
        assert_eq!(token.to_string(), "100t");
    }

    #[test]
    fn test_discrete_token_formatting() {
        assert_eq!(Token::Discrete(Command::PressY).to_string(), "Y");
        assert_eq!(Token::Discrete(Command::PressLeftShoulder).to_string(), "LB");
    }

    #[test]
    fn test_command_deserializes_from_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            command: Command,
        }

        let parsed: Wrapper = toml::from_str(r#"command = "press_left_trigger""#).unwrap();
        assert_eq!(parsed.command, Command::PressLeftTrigger);
    }
}
