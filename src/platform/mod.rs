//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Motion-sensor permission and the device-motion event stream
//! - Haptic feedback
//!
//! Everything here is best-effort. A missing API degrades to a logged no-op;
//! nothing in this module can fail the game.

#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::sim::GameEvent;

/// Outcome of asking for motion-sensor access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPermission {
    Granted,
    Denied,
    /// No motion API on this device (desktop browsers, native)
    Unsupported,
}

impl MotionPermission {
    /// Parse the string a permission prompt resolves with
    pub fn from_response(response: Option<&str>) -> Self {
        match response.map(str::to_lowercase).as_deref() {
            Some("granted") => MotionPermission::Granted,
            Some("unsupported") | None => MotionPermission::Unsupported,
            Some(_) => MotionPermission::Denied,
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, MotionPermission::Granted)
    }
}

/// Best-effort vibration
pub trait Haptics {
    fn pulse(&self, millis: u32);
}

/// Haptics for hosts without a vibration motor
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHaptics;

impl Haptics for NullHaptics {
    fn pulse(&self, _millis: u32) {}
}

/// Forward haptic requests from drained game events.
///
/// Returns how many pulses were sent. Disabled haptics send nothing.
pub fn dispatch_haptics(haptics: &dyn Haptics, events: &[GameEvent], enabled: bool) -> usize {
    if !enabled {
        return 0;
    }
    let mut sent = 0;
    for event in events {
        if let GameEvent::Haptic { millis } = event {
            haptics.pulse(*millis);
            sent += 1;
        }
    }
    sent
}
