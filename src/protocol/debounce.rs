//! # Debounce Gate
//!
//! Keeps a held button from retriggering its command on every poll tick.
//!
//! There is one gate for all discrete commands, not one per button: pressing
//! A and then B inside the window drops B.

use std::time::Duration;

/// Default minimum spacing between accepted discrete commands.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(250);

/// Global cooldown for discrete commands.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use camvision_bridge::protocol::debounce::DebounceGate;
///
/// let mut gate = DebounceGate::new(Duration::from_millis(250));
/// assert!(gate.accept(0));
/// assert!(!gate.accept(100));
/// assert!(gate.accept(260));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceGate {
    window_ms: u64,
    last_accepted_at_ms: Option<u64>,
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}

impl DebounceGate {
    /// Creates a gate that has never accepted anything.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
            last_accepted_at_ms: None,
        }
    }

    /// Debounce window.
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Timestamp of the last accepted command, if any.
    #[must_use]
    pub fn last_accepted_at_ms(&self) -> Option<u64> {
        self.last_accepted_at_ms
    }

    /// Try to pass a discrete command at `now_ms`.
    ///
    /// Accepts iff strictly more than the window has elapsed since the last
    /// acceptance, recording `now_ms` on success. A timestamp earlier than the
    /// last acceptance is rejected.
    pub fn accept(&mut self, now_ms: u64) -> bool {
        let open = match self.last_accepted_at_ms {
            None => true,
            Some(last) => now_ms.checked_sub(last).is_some_and(|elapsed| elapsed > self.window_ms),
        };

        if open {
            self.last_accepted_at_ms = Some(now_ms);
        }
        open
    }
}
