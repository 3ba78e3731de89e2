//! # Gamepad Module
//!
//! Joystick and gamepad input through the Linux evdev interface.
//!
//! ## Controller Detection
//!
//! Any event device that reports both `ABS_X` and `ABS_Y` and at least one
//! gamepad or joystick button (`BTN_SOUTH`, `BTN_TRIGGER`) is accepted. Devices
//! are scanned in sorted path order so the choice is stable when several
//! controllers are plugged in.
//!
//! ## Input Axes
//!
//! - Pan: left stick `ABS_X`
//! - Tilt: left stick `ABS_Y`
//!
//! Raw values are normalized to `-1.0..=1.0` using the range the device
//! reports for the axis.

use evdev::{AbsoluteAxisType, AttributeSet, Device, Key};
use std::path::Path;
use tracing::{debug, info, warn};

use super::source::{Button, ButtonState, InputSource};
use crate::error::{BridgeError, Result};
use crate::protocol::command::Axis;

/// Directory scanned for event devices.
const INPUT_DIR: &str = "/dev/input";

/// Buttons that mark a device as a gamepad or joystick.
const CONTROLLER_KEYS: [Key; 2] = [Key::BTN_SOUTH, Key::BTN_TRIGGER];

/// evdev key code for a logical button.
#[must_use]
pub fn button_key(button: Button) -> Key {
    match button {
        Button::South => Key::BTN_SOUTH,
        Button::East => Key::BTN_EAST,
        Button::West => Key::BTN_WEST,
        Button::North => Key::BTN_NORTH,
        Button::LeftShoulder => Key::BTN_TL,
        Button::RightShoulder => Key::BTN_TR,
        Button::LeftTrigger => Key::BTN_TL2,
        Button::RightTrigger => Key::BTN_TR2,
        Button::Select => Key::BTN_SELECT,
        Button::Start => Key::BTN_START,
        Button::Mode => Key::BTN_MODE,
        Button::LeftThumb => Key::BTN_THUMBL,
        Button::RightThumb => Key::BTN_THUMBR,
    }
}

/// evdev axis code for a slew axis.
#[must_use]
pub fn axis_code(axis: Axis) -> AbsoluteAxisType {
    match axis {
        Axis::Pan => AbsoluteAxisType::ABS_X,
        Axis::Tilt => AbsoluteAxisType::ABS_Y,
    }
}

/// Maps a raw absolute value onto `-1.0..=1.0`.
///
/// A degenerate range (`maximum <= minimum`) reads as centered.
///
/// # Examples
///
/// ```
/// use camvision_bridge::controller::gamepad::normalize_axis;
///
/// assert_eq!(normalize_axis(0, 0, 255), -1.0);
/// assert_eq!(normalize_axis(255, 0, 255), 1.0);
/// assert_eq!(normalize_axis(0, -32768, 32767).abs() < 0.001, true);
/// ```
#[must_use]
pub fn normalize_axis(value: i32, minimum: i32, maximum: i32) -> f32 {
    if maximum <= minimum {
        return 0.0;
    }
    let span = (i64::from(maximum) - i64::from(minimum)) as f64;
    let offset = (i64::from(value) - i64::from(minimum)) as f64;
    ((offset / span) * 2.0 - 1.0).clamp(-1.0, 1.0) as f32
}

/// Last reading of one absolute axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct AxisReading {
    value: i32,
    minimum: i32,
    maximum: i32,
}

impl AxisReading {
    fn normalized(&self) -> f32 {
        normalize_axis(self.value, self.minimum, self.maximum)
    }
}

/// Gamepad handle
///
/// Represents an open evdev joystick or gamepad. State is sampled with
/// [`InputSource::poll`]; between polls every query answers from the same
/// snapshot.
pub struct Gamepad {
    device: Device,
    device_path: String,
    pressed: AttributeSet<Key>,
    pan: AxisReading,
    tilt: AxisReading,
    connected: bool,
}

impl std::fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gamepad")
            .field("device_path", &self.device_path)
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

impl Gamepad {
    /// Detect and open the first available joystick or gamepad
    ///
    /// Scans all `/dev/input/event*` devices in sorted order.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: No suitable device found on the system
    /// - `Controller`: `/dev/input` missing or unreadable
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use camvision_bridge::controller::gamepad::Gamepad;
    ///
    /// let gamepad = Gamepad::open()?;
    /// println!("Connected to controller at: {}", gamepad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open() -> Result<Self> {
        let input_dir = Path::new(INPUT_DIR);

        if !input_dir.exists() {
            return Err(BridgeError::Controller(format!(
                "{} directory not found",
                INPUT_DIR
            )));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| BridgeError::Controller(format!("Failed to read {}: {}", INPUT_DIR, e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| BridgeError::Controller(format!("Failed to read directory entry: {}", e)))?;

        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let is_event_node = path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with("event"));
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("unnamed")
                    );

                    if is_controller(&device) {
                        let device_path = path.to_string_lossy().to_string();
                        info!(
                            "Found controller \"{}\" at: {}",
                            device.name().unwrap_or("unnamed"),
                            device_path
                        );
                        return Ok(Self::from_device(device, device_path));
                    }
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(BridgeError::ControllerNotFound)
    }

    /// Open a specific event device
    ///
    /// The device is used even if it does not look like a gamepad; unbound
    /// buttons will simply read as absent.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: `path` does not exist
    /// - `Controller`: the device exists but cannot be opened
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Controller device {} does not exist", path.display());
            return Err(BridgeError::ControllerNotFound);
        }

        let device = Device::open(path)
            .map_err(|e| BridgeError::Controller(format!("Failed to open {}: {}", path.display(), e)))?;

        if !is_controller(&device) {
            warn!(
                "{} does not report a stick and gamepad buttons, using it anyway",
                path.display()
            );
        }

        let device_path = path.to_string_lossy().to_string();
        info!(
            "Opened controller \"{}\" at: {}",
            device.name().unwrap_or("unnamed"),
            device_path
        );
        Ok(Self::from_device(device, device_path))
    }

    fn from_device(device: Device, device_path: String) -> Self {
        let mut gamepad = Self {
            device,
            device_path,
            pressed: AttributeSet::new(),
            pan: AxisReading::default(),
            tilt: AxisReading::default(),
            connected: true,
        };
        // Prime ranges so axis_value is meaningful before the first tick
        gamepad.poll();
        gamepad
    }

    /// Get the device path of this controller
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Human-readable device name reported by the kernel.
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Bound buttons this device does not have.
    pub fn missing_buttons<'a>(&self, buttons: impl IntoIterator<Item = &'a Button>) -> Vec<Button> {
        buttons
            .into_iter()
            .copied()
            .filter(|&button| !self.has_button(button))
            .collect()
    }

    fn has_button(&self, button: Button) -> bool {
        self.device
            .supported_keys()
            .is_some_and(|keys| keys.contains(button_key(button)))
    }
}

/// Whether a device exposes a stick and gamepad/joystick buttons.
fn is_controller(device: &Device) -> bool {
    let has_stick = device.supported_absolute_axes().is_some_and(|axes| {
        axes.contains(AbsoluteAxisType::ABS_X) && axes.contains(AbsoluteAxisType::ABS_Y)
    });
    let has_buttons = device
        .supported_keys()
        .is_some_and(|keys| CONTROLLER_KEYS.iter().any(|&key| keys.contains(key)));

    has_stick && has_buttons
}

impl InputSource for Gamepad {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn poll(&mut self) -> bool {
        if !self.connected {
            return false;
        }

        let state = self
            .device
            .get_key_state()
            .and_then(|keys| self.device.get_abs_state().map(|abs| (keys, abs)));

        match state {
            Ok((keys, abs)) => {
                self.pressed = keys;
                for (axis, reading) in [(Axis::Pan, &mut self.pan), (Axis::Tilt, &mut self.tilt)] {
                    let info = &abs[axis_code(axis).0 as usize];
                    *reading = AxisReading {
                        value: info.value,
                        minimum: info.minimum,
                        maximum: info.maximum,
                    };
                }
                true
            }
            Err(e) => {
                warn!("Lost controller at {}: {}", self.device_path, e);
                self.connected = false;
                false
            }
        }
    }

    fn axis_value(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Pan => self.pan.normalized(),
            Axis::Tilt => self.tilt.normalized(),
        }
    }

    fn button_state(&self, button: Button) -> ButtonState {
        if !self.has_button(button) {
            ButtonState::Absent
        } else if self.pressed.contains(button_key(button)) {
            ButtonState::Pressed
        } else {
            ButtonState::Released
        }
    }
}
