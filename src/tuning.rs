//! Data-driven game balance
//!
//! Every threshold the gameplay layer uses lives here as a named field, so
//! different feel (longer string, twitchier tilt) is a JSON edit rather than a
//! code change. Missing fields fall back to the defaults below.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// How a detected jerk is turned into an upward kick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JumpStrategy {
    /// Overwrite the ball's vertical velocity with `jump_velocity`.
    /// Snappy and repeatable regardless of what the ball was doing.
    #[default]
    VelocityOverride,
    /// Apply `jump_impulse` upward, composing with the current velocity
    Impulse,
}

/// Tunable parameter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === World ===
    /// Initial vertical gravity (engine units)
    pub gravity_y: f32,
    /// Pixels/s² per engine gravity unit
    pub gravity_scale: f32,

    // === String ===
    /// Rest length of the string (L)
    pub string_rest_length: f32,
    /// Where the string leaves the handle, relative to the handle center
    pub string_anchor_offset: Vec2,
    /// The string counts as slack while `d < L - slack_margin`
    pub slack_margin: f32,
    pub slack_stiffness: f32,
    pub taut_stiffness: f32,
    pub slack_damping: f32,
    pub taut_damping: f32,
    /// Visual droop multiplier for the slack curve
    pub sag_factor: f32,

    // === Ball ===
    pub ball_radius: f32,
    pub ball_restitution: f32,
    pub ball_friction: f32,
    pub ball_density: f32,
    /// Spawn height above the bottom of the viewport
    pub drop_height: f32,

    // === Landing detection ===
    /// Seconds between detector polls
    pub detector_period: f32,
    /// Check point sits this far above the cup base
    pub cup_cap_offset: f32,
    pub cup_tolerance_x: f32,
    pub cup_tolerance_y: f32,
    /// px/s
    pub cup_speed_cap: f32,
    pub spike_tolerance_x: f32,
    pub spike_tolerance_y: f32,
    /// px/s
    pub spike_speed_cap: f32,
    /// Speed (px/s) the ball must exceed to leave Success
    pub release_speed: f32,
    pub cup_points: u64,
    pub spike_points: u64,

    // === Magnet ===
    pub magnet_stiffness: f32,
    /// Seconds
    pub magnet_lifetime: f32,

    // === Motion input ===
    pub tilt_gain: f32,
    /// m/s² on the linear acceleration y or z axis
    pub jerk_threshold: f32,
    pub jump_strategy: JumpStrategy,
    /// px/s, negative is up
    pub jump_velocity: f32,
    pub jump_impulse: f32,
    pub drag_stiffness: f32,
    pub haptic_pulse_ms: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity_y: 1.8,
            gravity_scale: 1000.0,

            string_rest_length: 320.0,
            string_anchor_offset: Vec2::new(0.0, -80.0),
            slack_margin: 5.0,
            slack_stiffness: 0.002,
            taut_stiffness: 1.0,
            slack_damping: 0.0,
            taut_damping: 0.02,
            sag_factor: 0.6,

            ball_radius: 35.0,
            ball_restitution: 0.4,
            ball_friction: 0.05,
            ball_density: 0.04,
            drop_height: 400.0,

            detector_period: 0.05,
            cup_cap_offset: 40.0,
            cup_tolerance_x: 40.0,
            cup_tolerance_y: 30.0,
            cup_speed_cap: 180.0,
            spike_tolerance_x: 25.0,
            spike_tolerance_y: 40.0,
            spike_speed_cap: 240.0,
            release_speed: 300.0,
            cup_points: 10,
            spike_points: 100,

            magnet_stiffness: 0.5,
            magnet_lifetime: 1.0,

            tilt_gain: 0.3,
            jerk_threshold: 3.0,
            jump_strategy: JumpStrategy::VelocityOverride,
            jump_velocity: -1320.0,
            jump_impulse: 200_000.0,
            drag_stiffness: 0.2,
            haptic_pulse_ms: 50,
        }
    }
}

/// Why a tuning file was rejected
#[derive(Debug)]
pub enum TuningError {
    /// Not valid JSON for this schema
    Parse(serde_json::Error),
    /// Parsed, but a value breaks a gameplay invariant
    Invalid(&'static str),
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Parse(e) => write!(f, "tuning parse error: {}", e),
            TuningError::Invalid(reason) => write!(f, "invalid tuning: {}", reason),
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Parse(e) => Some(e),
            TuningError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(e: serde_json::Error) -> Self {
        TuningError::Parse(e)
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Parse a tuning document, falling back to defaults on any error
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::warn!("{} - using default tuning", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if !(self.string_rest_length > 0.0) {
            return Err(TuningError::Invalid("string_rest_length must be positive"));
        }
        if !(self.detector_period > 0.0) {
            return Err(TuningError::Invalid("detector_period must be positive"));
        }
        if !(self.magnet_lifetime > 0.0) {
            return Err(TuningError::Invalid("magnet_lifetime must be positive"));
        }
        if self.release_speed <= self.cup_speed_cap || self.release_speed <= self.spike_speed_cap
        {
            return Err(TuningError::Invalid(
                "release_speed must exceed both landing speed caps",
            ));
        }
        // A ball resting on the tip sits one radius above it
        if self.spike_tolerance_y <= self.ball_radius {
            return Err(TuningError::Invalid(
                "spike_tolerance_y must exceed ball_radius",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "string_rest_length": 250.0, "tilt_gain": 0.2 }"#)
            .expect("valid tuning");
        assert_eq!(tuning.string_rest_length, 250.0);
        assert_eq!(tuning.tilt_gain, 0.2);
        assert_eq!(tuning.spike_points, 100);
        assert_eq!(tuning.jump_strategy, JumpStrategy::VelocityOverride);
    }

    #[test]
    fn test_release_speed_must_exceed_caps() {
        let result = Tuning::from_json(r#"{ "release_speed": 100.0 }"#);
        assert!(matches!(result, Err(TuningError::Invalid(_))));
    }

    #[test]
    fn test_spike_tolerance_must_clear_ball() {
        let result = Tuning::from_json(r#"{ "ball_radius": 50.0 }"#);
        assert!(matches!(result, Err(TuningError::Invalid(_))));
    }

    #[test]
    fn test_bad_json_falls_back() {
        let tuning = Tuning::from_json_or_default("{ not json");
        assert_eq!(tuning, Tuning::default());
    }

    #[test]
    fn test_jump_strategy_roundtrip_name() {
        let tuning = Tuning::from_json(r#"{ "jump_strategy": "Impulse" }"#).expect("valid");
        assert_eq!(tuning.jump_strategy, JumpStrategy::Impulse);
    }
}
