//! # Command Encoder
//!
//! Turns slew samples and discrete commands into protocol tokens.
//!
//! Axis tokens are edge-suppressed: a centered stick produces a single `0`
//! token when it returns to center and nothing afterwards, so the command
//! port is not flooded with zero slews while the operator is idle. Any
//! off-center sample is always sent.

use bytes::{BufMut, BytesMut};

use super::command::{Axis, Command, Token, AXIS_SAMPLE_MAX, AXIS_SAMPLE_MIN};

/// Half-width of the band around center treated as zero.
///
/// Absorbs stick jitter and rounding noise near center.
pub const ZERO_BAND: i32 = 2;

/// Returns `true` if `sample` lies inside the closed zero band `[-2, 2]`.
#[must_use]
pub fn in_zero_band(sample: i32) -> bool {
    (-ZERO_BAND..=ZERO_BAND).contains(&sample)
}

/// Encode one axis sample.
///
/// Pure transition of the per-axis state machine.
///
/// # Arguments
///
/// * `axis` - Axis the sample belongs to
/// * `sample` - Slew percentage; clamped to `[-100, 100]`
/// * `last_was_zero` - Whether the last token sent for this axis was a zero
///
/// # Returns
///
/// The token to send (if any) and the new `last_was_zero` value.
///
/// # Examples
///
/// ```
/// use camvision_bridge::protocol::command::{Axis, Token};
/// use camvision_bridge::protocol::encoder::encode_axis;
///
/// assert_eq!(encode_axis(Axis::Pan, 1, true), (None, true));
/// assert_eq!(
///     encode_axis(Axis::Pan, 1, false),
///     (Some(Token::Slew { axis: Axis::Pan, value: 0 }), true)
/// );
/// ```
#[must_use]
pub fn encode_axis(axis: Axis, sample: i32, last_was_zero: bool) -> (Option<Token>, bool) {
    let sample = sample.clamp(AXIS_SAMPLE_MIN, AXIS_SAMPLE_MAX);

    if in_zero_band(sample) {
        if last_was_zero {
            (None, true)
        } else {
            (Some(Token::Slew { axis, value: 0 }), true)
        }
    } else {
        (Some(Token::Slew { axis, value: sample }), false)
    }
}

/// Per-connection encoder state.
///
/// Both axes start as zero, assuming the stick is centered when the link
/// comes up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderState {
    pub pan_was_zero: bool,
    pub tilt_was_zero: bool,
}

impl Default for EncoderState {
    fn default() -> Self {
        Self {
            pan_was_zero: true,
            tilt_was_zero: true,
        }
    }
}

impl EncoderState {
    /// Creates a state for a fresh connection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slew both axes, pan first.
    ///
    /// Returns the tokens to send, in order. Empty when both axes were
    /// already at rest.
    pub fn slew(&mut self, pan: i32, tilt: i32) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(2);

        let (token, pan_was_zero) = encode_axis(Axis::Pan, pan, self.pan_was_zero);
        self.pan_was_zero = pan_was_zero;
        tokens.extend(token);

        let (token, tilt_was_zero) = encode_axis(Axis::Tilt, tilt, self.tilt_was_zero);
        self.tilt_was_zero = tilt_was_zero;
        tokens.extend(token);

        tokens
    }
}

/// Assembles the outbound bytes of a tick.
///
/// # Examples
///
/// ```
/// use camvision_bridge::protocol::command::Command;
/// use camvision_bridge::protocol::encoder::{CommandEncoder, EncoderState};
///
/// let mut state = EncoderState::new();
/// let mut encoder = CommandEncoder::new();
/// encoder.command(Command::PressA);
/// encoder.slew(&mut state, -45, -2);
/// assert_eq!(&encoder.take()[..], b"A-45p");
/// ```
#[derive(Debug, Default)]
pub struct CommandEncoder {
    buf: BytesMut,
    tokens: usize,
}

impl CommandEncoder {
    /// Creates an empty encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a discrete command. Never suppressed here.
    pub fn command(&mut self, command: Command) {
        self.push(Token::Discrete(command));
    }

    /// Append whatever slew tokens `state` says are needed.
    pub fn slew(&mut self, state: &mut EncoderState, pan: i32, tilt: i32) {
        for token in state.slew(pan, tilt) {
            self.push(token);
        }
    }

    fn push(&mut self, token: Token) {
        self.buf.put_slice(token.to_string().as_bytes());
        self.tokens += 1;
    }

    /// Number of tokens buffered since the last [`take`](Self::take).
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tokens
    }

    /// Returns `true` if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drain the buffered bytes.
    pub fn take(&mut self) -> BytesMut {
        self.tokens = 0;
        self.buf.split()
    }
}
