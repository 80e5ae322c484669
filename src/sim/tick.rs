//! Fixed timestep simulation tick
//!
//! Single entry point that advances the game deterministically. Everything
//! asynchronous on the host (sensor callbacks, pointer events, button
//! presses) is queued into a `TickInput` and applied here in a fixed order.

use super::detector;
use super::motion::{self, MotionSample, PointerEvent};
use super::state::{GameMode, GameState};
use super::string::update_string;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Switch target (mode buttons)
    pub set_mode: Option<GameMode>,
    /// Start motion sensing (play button, after permission was granted)
    pub start_sensing: bool,
    /// Device-motion samples received since the last tick, oldest first
    pub motion: Vec<MotionSample>,
    /// Pointer events received since the last tick, oldest first
    pub pointer: Vec<PointerEvent>,
}

/// Advance the game state by one timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if let Some(mode) = input.set_mode {
        state.set_mode(mode);
    }

    if input.start_sensing {
        state.begin_sensing();
    }

    for event in &input.pointer {
        motion::apply_pointer(state, *event);
    }

    for sample in &input.motion {
        motion::apply_sample(state, sample);
    }

    // Pre-step hook
    update_string(&mut state.world, &state.scene, &state.tuning);

    state.world.step(dt);
    state.time_ticks += 1;

    detector::expire_magnets(state, dt);
    detector::advance(state, dt);
}
