//! # Driver Loop
//!
//! Polls the controller at a fixed rate and keeps the camera in step with it.
//!
//! Each tick runs `Polling → Evaluating → Transmitting → Sleeping`:
//!
//! 1. Poll the input source; a lost device stops the loop.
//! 2. Pick at most one discrete command from the bindings and pass it
//!    through the debounce gate.
//! 3. Encode the command (if any) followed by the pan/tilt slew tokens and
//!    send them as one write. Idle ticks send nothing.
//! 4. Sleep until the next tick.
//!
//! Everything happens on one task, so the encoder and debounce state are
//! plain fields with no locking.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::controller::bindings::BindingTable;
use crate::controller::calibration::Calibration;
use crate::controller::source::{Button, InputSource};
use crate::error::{BridgeError, Result};
use crate::protocol::command::{Axis, Command};
use crate::protocol::debounce::{DebounceGate, DEFAULT_DEBOUNCE_WINDOW};
use crate::protocol::encoder::{CommandEncoder, EncoderState};
use crate::transport::sink::CommandSink;
use crate::transport::CameraLink;

/// Default poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Number of transmissions between status log messages
const LOG_INTERVAL_SENDS: u64 = 100;

/// Where the loop currently is within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Polling,
    Evaluating,
    Transmitting,
    Sleeping,
    Stopped,
}

/// Per-connection protocol state, owned by the driver.
#[derive(Debug, Clone, Default)]
pub struct LinkState {
    pub encoder: EncoderState,
    pub debounce: DebounceGate,
}

/// Tunables for the driver loop
#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub poll_interval: Duration,
    pub debounce_window: Duration,
    pub calibration: Calibration,
    pub bindings: BindingTable,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            calibration: Calibration::default(),
            bindings: BindingTable::default(),
        }
    }
}

impl DriverSettings {
    /// Settings described by a loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.controller.poll_interval(),
            debounce_window: config.buttons.debounce_window(),
            calibration: Calibration::from_config(&config.controller),
            bindings: BindingTable::new(config.buttons.bindings.clone()),
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Discrete command that was sent
    pub command: Option<Command>,
    /// Discrete command that was held back by the debounce gate
    pub debounced: Option<Command>,
    /// Pan sample after calibration
    pub pan: i32,
    /// Tilt sample after calibration
    pub tilt: i32,
    /// Bytes written to the link
    pub bytes: usize,
}

/// Controller-to-camera driver loop.
pub struct Driver<S, K> {
    source: S,
    link: CameraLink<K>,
    settings: DriverSettings,
    state: LinkState,
    encoder: CommandEncoder,
    phase: Phase,
    reported_absent: HashSet<Button>,
    sends: u64,
}

impl<S, K> Driver<S, K>
where
    S: InputSource,
    K: CommandSink,
{
    /// Creates a driver with fresh protocol state for `link`.
    pub fn new(source: S, link: CameraLink<K>, settings: DriverSettings) -> Self {
        let state = LinkState {
            encoder: EncoderState::new(),
            debounce: DebounceGate::new(settings.debounce_window),
        };

        Self {
            source,
            link,
            settings,
            state,
            encoder: CommandEncoder::new(),
            phase: Phase::Polling,
            reported_absent: HashSet::new(),
            sends: 0,
        }
    }

    /// Current loop phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Protocol state for the current link.
    pub fn state(&self) -> &LinkState {
        &self.state
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn link(&self) -> &CameraLink<K> {
        &self.link
    }

    /// Run one poll tick at `now_ms` (milliseconds on a monotonic clock).
    ///
    /// # Errors
    ///
    /// - `ControllerDisconnected`: the input source reported the device gone
    /// - `Transport`: the write to the camera failed
    ///
    /// Either error leaves the driver in [`Phase::Stopped`].
    pub async fn tick(&mut self, now_ms: u64) -> Result<TickReport> {
        self.phase = Phase::Polling;
        if !self.source.poll() {
            self.phase = Phase::Stopped;
            return Err(BridgeError::ControllerDisconnected);
        }

        self.phase = Phase::Evaluating;
        let mut report = TickReport::default();

        let selection = self.settings.bindings.select(&self.source);
        for button in selection.absent {
            if self.reported_absent.insert(button) {
                warn!("Button {:?} not found on controller, skipping its binding", button);
            } else {
                trace!("Button {:?} still absent", button);
            }
        }

        if let Some(command) = selection.command {
            if self.state.debounce.accept(now_ms) {
                self.encoder.command(command);
                report.command = Some(command);
            } else {
                trace!("Debounced {:?} at {} ms", command, now_ms);
                report.debounced = Some(command);
            }
        }

        report.pan = self.settings.calibration.pan.sample(self.source.axis_value(Axis::Pan));
        report.tilt = self.settings.calibration.tilt.sample(self.source.axis_value(Axis::Tilt));
        self.encoder.slew(&mut self.state.encoder, report.pan, report.tilt);

        self.phase = Phase::Transmitting;
        if !self.encoder.is_empty() {
            let bytes = self.encoder.take();
            if let Err(e) = self.link.send(&bytes).await {
                self.phase = Phase::Stopped;
                return Err(e);
            }
            report.bytes = bytes.len();
            self.sends += 1;

            if self.sends % LOG_INTERVAL_SENDS == 0 {
                info!(
                    "Sent {} updates ({} bytes) to {}",
                    self.sends,
                    self.link.bytes_sent(),
                    self.link.peer()
                );
            }
        }

        self.phase = Phase::Sleeping;
        Ok(report)
    }

    /// Poll until `shutdown` completes or a fatal error occurs.
    ///
    /// The link is closed before returning in every case. Ticks that overrun
    /// the poll interval delay the following ones rather than bunching up.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that stopped the loop (see [`Driver::tick`]).
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if !self.source.is_connected() {
            self.phase = Phase::Stopped;
            return Err(BridgeError::ControllerDisconnected);
        }

        tokio::pin!(shutdown);

        let start = Instant::now();
        let mut ticker = interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Polling controller every {} ms, sending to {}",
            self.settings.poll_interval.as_millis(),
            self.link.peer()
        );

        let outcome = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    if let Err(e) = self.tick(now_ms).await {
                        break Err(e);
                    }
                }

                _ = &mut shutdown => {
                    info!("Shutdown requested after {} updates", self.sends);
                    break Ok(());
                }
            }
        };

        self.phase = Phase::Stopped;

        match outcome {
            Ok(()) => self.link.close().await,
            Err(e) => {
                if let Err(close_err) = self.link.close().await {
                    debug!("Ignoring close failure after fatal error: {}", close_err);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::source::{ButtonState, MockInputSource};
    use crate::transport::sink::mocks::RecordingSink;

    /// Program the mock for the next tick.
    fn frame(
        source: &mut MockInputSource,
        pan: f32,
        tilt: f32,
        pressed: &'static [Button],
        absent: &'static [Button],
    ) {
        source.checkpoint();
        source.expect_is_connected().return_const(true);
        source.expect_poll().return_const(true);
        source.expect_axis_value().returning(move |axis| match axis {
            Axis::Pan => pan,
            Axis::Tilt => tilt,
        });
        source.expect_button_state().returning(move |button| {
            if absent.contains(&button) {
                ButtonState::Absent
            } else if pressed.contains(&button) {
                ButtonState::Pressed
            } else {
                ButtonState::Released
            }
        });
    }

    fn driver() -> (Driver<MockInputSource, RecordingSink>, RecordingSink) {
        let sink = RecordingSink::new();
        let link = CameraLink::from_sink(sink.clone(), "mock");
        let driver = Driver::new(MockInputSource::new(), link, DriverSettings::default());
        (driver, sink)
    }

    #[tokio::test]
    async fn test_fresh_driver_state() {
        let (driver, _sink) = driver();
        assert_eq!(driver.phase(), Phase::Polling);
        assert_eq!(driver.state().encoder, EncoderState::new());
        assert_eq!(driver.state().debounce.last_accepted_at_ms(), None);
    }

    #[tokio::test]
    async fn test_slew_then_return_to_center() {
        let (mut driver, sink) = driver();

        frame(driver.source_mut(), 0.45, -0.02, &[], &[]);
        let report = driver.tick(0).await.unwrap();
        assert_eq!((report.pan, report.tilt), (-45, -2));
        assert_eq!(driver.phase(), Phase::Sleeping);

        frame(driver.source_mut(), 0.0, 0.0, &[], &[]);
        driver.tick(100).await.unwrap();

        assert_eq!(sink.get_written_data(), vec![b"-45p".to_vec(), b"0p".to_vec()]);
    }

    #[tokio::test]
    async fn test_idle_ticks_send_nothing() {
        let (mut driver, sink) = driver();

        frame(driver.source_mut(), 0.01, -0.01, &[], &[]);
        for now_ms in [0, 100, 200] {
            let report = driver.tick(now_ms).await.unwrap();
            assert_eq!(report.bytes, 0);
        }

        assert!(sink.get_written_data().is_empty());
    }

    #[tokio::test]
    async fn test_held_button_is_debounced() {
        let (mut driver, sink) = driver();
        frame(driver.source_mut(), 0.0, 0.0, &[Button::South], &[]);

        let first = driver.tick(0).await.unwrap();
        let second = driver.tick(100).await.unwrap();
        let third = driver.tick(260).await.unwrap();

        assert_eq!(first.command, Some(Command::PressA));
        assert_eq!(second.command, None);
        assert_eq!(second.debounced, Some(Command::PressA));
        assert_eq!(third.command, Some(Command::PressA));
        assert_eq!(sink.get_written_data(), vec![b"A".to_vec(), b"A".to_vec()]);
    }

    #[tokio::test]
    async fn test_debounce_is_shared_across_buttons() {
        let (mut driver, sink) = driver();

        frame(driver.source_mut(), 0.0, 0.0, &[Button::South], &[]);
        driver.tick(0).await.unwrap();

        frame(driver.source_mut(), 0.0, 0.0, &[Button::East], &[]);
        let report = driver.tick(100).await.unwrap();

        assert_eq!(report.debounced, Some(Command::PressB));
        assert_eq!(sink.transcript(), "A");
    }

    #[tokio::test]
    async fn test_only_highest_priority_button_is_sent() {
        let (mut driver, sink) = driver();

        frame(driver.source_mut(), 0.0, 0.0, &[Button::North, Button::South], &[]);
        let report = driver.tick(0).await.unwrap();

        assert_eq!(report.command, Some(Command::PressA));
        assert_eq!(sink.transcript(), "A");
    }

    #[tokio::test]
    async fn test_command_and_slew_share_one_write() {
        let (mut driver, sink) = driver();

        frame(driver.source_mut(), 0.45, 0.3, &[Button::LeftThumb], &[]);
        let report = driver.tick(0).await.unwrap();

        assert_eq!(report.bytes, 8);
        assert_eq!(sink.get_written_data(), vec![b"c-45p30t".to_vec()]);
    }

    #[tokio::test]
    async fn test_absent_button_does_not_stop_the_tick() {
        let (mut driver, sink) = driver();

        frame(driver.source_mut(), -0.5, 0.0, &[Button::West], &[Button::LeftThumb]);
        let report = driver.tick(0).await.unwrap();
        assert_eq!(report.command, Some(Command::PressX));

        frame(driver.source_mut(), -0.5, 0.0, &[], &[Button::LeftThumb]);
        driver.tick(100).await.unwrap();

        assert_eq!(sink.transcript(), "X50p50p");
        assert!(driver.reported_absent.contains(&Button::LeftThumb));
    }

    #[tokio::test]
    async fn test_disconnect_stops_the_loop() {
        let (mut driver, sink) = driver();
        driver.source_mut().expect_poll().return_const(false);

        let result = driver.tick(0).await;

        assert!(matches!(result, Err(BridgeError::ControllerDisconnected)));
        assert_eq!(driver.phase(), Phase::Stopped);
        assert!(sink.get_written_data().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_is_fatal() {
        let (mut driver, sink) = driver();
        sink.set_write_error(std::io::ErrorKind::BrokenPipe);

        frame(driver.source_mut(), 1.0, 0.0, &[], &[]);
        let result = driver.tick(0).await;

        assert!(matches!(result, Err(BridgeError::Transport(_))));
        assert_eq!(driver.phase(), Phase::Stopped);
    }

    #[tokio::test]
    async fn test_settings_from_config() {
        let mut config = Config::default();
        config.controller.poll_interval_ms = 40;
        config.controller.invert_pan = false;
        config.buttons.debounce_ms = 500;
        config.buttons.bindings.truncate(2);

        let settings = DriverSettings::from_config(&config);
        assert_eq!(settings.poll_interval, Duration::from_millis(40));
        assert_eq!(settings.debounce_window, Duration::from_millis(500));
        assert!(!settings.calibration.pan.invert);
        assert_eq!(settings.bindings.bindings().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_disconnect() {
        let sink = RecordingSink::new();
        let link = CameraLink::from_sink(sink.clone(), "mock");
        let mut source = MockInputSource::new();

        let mut polls = 0;
        source.expect_is_connected().return_const(true);
        source.expect_poll().returning(move || {
            polls += 1;
            polls <= 3
        });
        source.expect_axis_value().returning(|axis| match axis {
            Axis::Pan => -1.0,
            Axis::Tilt => 0.0,
        });
        source.expect_button_state().return_const(ButtonState::Released);

        let mut driver = Driver::new(source, link, DriverSettings::default());
        let result = driver.run_until(std::future::pending()).await;

        assert!(matches!(result, Err(BridgeError::ControllerDisconnected)));
        assert_eq!(driver.phase(), Phase::Stopped);
        assert_eq!(sink.transcript(), "100p100p100p");
        assert!(sink.is_shut_down());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_shutdown_closes_link() {
        let sink = RecordingSink::new();
        let link = CameraLink::from_sink(sink.clone(), "mock");
        let mut source = MockInputSource::new();

        source.expect_is_connected().return_const(true);
        source.expect_poll().return_const(true);
        source.expect_axis_value().return_const(0.0f32);
        source.expect_button_state().return_const(ButtonState::Released);

        let mut driver = Driver::new(source, link, DriverSettings::default());
        let result = driver
            .run_until(tokio::time::sleep(Duration::from_millis(350)))
            .await;

        assert!(result.is_ok());
        assert_eq!(driver.phase(), Phase::Stopped);
        assert!(sink.get_written_data().is_empty());
        assert!(sink.is_shut_down());
    }

    #[tokio::test]
    async fn test_run_refuses_disconnected_source() {
        let (mut driver, sink) = driver();
        driver.source_mut().expect_is_connected().return_const(false);

        let result = driver.run_until(std::future::pending()).await;

        assert!(matches!(result, Err(BridgeError::ControllerDisconnected)));
        assert!(!sink.is_shut_down());
    }
}
