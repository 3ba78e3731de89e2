//! # Error Types
//!
//! Custom error types for CameraVision Bridge using `thiserror`.

use thiserror::Error;

/// Exit status when the controller goes away mid-run.
pub const EXIT_CONTROLLER_DISCONNECTED: u8 = 2;

/// Exit status for every other fatal condition.
pub const EXIT_FAILURE: u8 = 1;

/// Main error type for CameraVision Bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No joystick or gamepad was found at startup
    #[error("No controller found")]
    ControllerNotFound,

    /// The controller stopped answering state queries
    #[error("Controller disconnected")]
    ControllerDisconnected,

    /// Controller access errors (permissions, bad device path)
    #[error("Controller error: {0}")]
    Controller(String),

    /// The camera command port could not be reached
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Write or shutdown failure on an established link
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Process exit status for this error.
    ///
    /// A missing controller is reported but is not a failure, a controller
    /// that disconnects mid-run gets its own status so wrappers can tell it
    /// apart, and everything else exits with [`EXIT_FAILURE`].
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            BridgeError::ControllerNotFound => 0,
            BridgeError::ControllerDisconnected => EXIT_CONTROLLER_DISCONNECTED,
            _ => EXIT_FAILURE,
        }
    }
}

/// Result type alias for CameraVision Bridge
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(BridgeError::ControllerNotFound.exit_code(), 0);
        assert_eq!(BridgeError::ControllerDisconnected.exit_code(), 2);
        assert_eq!(BridgeError::Transport("broken pipe".into()).exit_code(), 1);
        assert_eq!(
            BridgeError::Connect {
                addr: "localhost:2222".into(),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn test_connect_error_message_names_address() {
        let err = BridgeError::Connect {
            addr: "camera.local:2222".into(),
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        };
        assert!(err.to_string().contains("camera.local:2222"));
    }
}
