//! Game state and core simulation types
//!
//! `GameState` is the single owner of everything the gameplay layer touches:
//! the physics world, the live scene handles, the phase machine and score.
//! Scene builder, string controller, landing detector and motion mapper all
//! receive it by reference; nothing holds world ids outside of it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::ConstraintId;
use super::detector::PendingMagnet;
use super::scene::{SceneError, SceneHandles, Viewport, build_scene};
use super::string::{StringVisual, current_visual};
use super::world::PhysicsWorld;
use crate::tuning::{Tuning, TuningError};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the player to start motion sensing
    #[default]
    Start,
    /// Active gameplay
    Playing,
    /// Ball landed; stays here until the ball is flicked away again
    Success,
}

/// Which target the player is aiming for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Big cup - forgiving, low reward
    #[default]
    Cup,
    /// Spike tip - tight tolerances, high reward
    Spike,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Cup => "Cup",
            GameMode::Spike => "Spike",
        }
    }

    /// Points awarded for a landing in this mode
    pub fn points(&self, tuning: &Tuning) -> u64 {
        match self {
            GameMode::Cup => tuning.cup_points,
            GameMode::Spike => tuning.spike_points,
        }
    }

    /// Banner shown while in Success
    pub fn success_banner(&self) -> &'static str {
        match self {
            GameMode::Cup => "GREAT!",
            GameMode::Spike => "SPIKE!!",
        }
    }
}

/// Things the host may want to react to (UI, haptics, sound)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    ModeChanged { mode: GameMode },
    SensingStarted,
    Landed { mode: GameMode, points: u64 },
    /// Ball left the target fast enough to score again
    Released,
    Jumped,
    MagnetAttached,
    MagnetReleased,
    /// Best-effort vibration request
    Haptic { millis: u32 },
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub(crate) world: PhysicsWorld,
    pub(crate) scene: SceneHandles,
    pub(crate) viewport: Viewport,
    pub(crate) tuning: Tuning,
    pub(crate) phase: GamePhase,
    pub(crate) mode: GameMode,
    pub(crate) score: u64,
    /// Motion samples only drive the world once this is set
    pub(crate) sensing: bool,
    /// Seconds accumulated toward the next detector poll
    pub(crate) detector_accumulator: f32,
    /// Magnets waiting for their removal timer
    pub(crate) magnets: Vec<PendingMagnet>,
    /// Active pointer-drag constraint
    pub(crate) drag: Option<ConstraintId>,
    /// Last raw sample summary, shown in the debug line
    pub(crate) debug_info: String,
    pub(crate) events: Vec<GameEvent>,
    /// Simulation tick counter
    pub(crate) time_ticks: u64,
}

impl GameState {
    /// Create a new game with its first scene built.
    ///
    /// Fails without allocating a world if the viewport is unusable or the
    /// tuning is inconsistent.
    pub fn new(viewport: Viewport, mode: GameMode, tuning: Tuning) -> Result<Self, SceneError> {
        viewport.validate()?;
        if let Err(TuningError::Invalid(reason)) = tuning.validate() {
            return Err(SceneError::InvalidTuning { reason });
        }

        let mut world = PhysicsWorld::new(Vec2::new(0.0, tuning.gravity_y), tuning.gravity_scale);
        let scene = build_scene(&mut world, mode, viewport, &tuning)?;
        log::info!(
            "Scene built: {} mode, {}x{} viewport",
            mode.as_str(),
            viewport.width,
            viewport.height
        );

        Ok(Self {
            world,
            scene,
            viewport,
            tuning,
            phase: GamePhase::Start,
            mode,
            score: 0,
            sensing: false,
            detector_accumulator: 0.0,
            magnets: Vec::new(),
            drag: None,
            debug_info: String::new(),
            events: Vec::new(),
            time_ticks: 0,
        })
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn is_sensing(&self) -> bool {
        self.sensing
    }

    pub fn debug_info(&self) -> &str {
        &self.debug_info
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// Direct world access for test harnesses and scripted demos
    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn scene(&self) -> &SceneHandles {
        &self.scene
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// String geometry at the current ball position
    pub fn string_visual(&self) -> Option<StringVisual> {
        current_visual(&self.world, &self.scene, &self.tuning)
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Magnets whose removal timer has not fired yet
    pub fn pending_magnets(&self) -> &[PendingMagnet] {
        &self.magnets
    }

    /// Take all events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Switch target. Legal in any phase; score and phase are kept.
    ///
    /// The previous scene is torn down before the new one is built, and every
    /// id it handed out (ball, target, string, drag) is dropped with it.
    pub fn set_mode(&mut self, mode: GameMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;

        self.scene.teardown(&mut self.world);
        if let Some(drag) = self.drag.take() {
            self.world.remove_constraint(drag);
        }
        self.detector_accumulator = 0.0;

        match build_scene(&mut self.world, mode, self.viewport, &self.tuning) {
            Ok(scene) => self.scene = scene,
            // Viewport was validated in new(), so this only fires on a logic error
            Err(e) => log::error!("Scene rebuild failed: {}", e),
        }

        log::info!("Mode switched to {}", mode.as_str());
        self.push_event(GameEvent::ModeChanged { mode });
    }

    /// Begin driving the world from motion samples.
    ///
    /// One-way: Start becomes Playing, and later calls are no-ops. Returns
    /// whether this call started sensing.
    pub fn begin_sensing(&mut self) -> bool {
        if self.sensing {
            return false;
        }
        self.sensing = true;
        if self.phase == GamePhase::Start {
            self.phase = GamePhase::Playing;
        }
        log::info!("Motion sensing started");
        self.push_event(GameEvent::SensingStarted);
        true
    }

    /// Enter Success and award the mode's points. Returns the points awarded,
    /// zero if already in Success.
    pub(crate) fn record_landing(&mut self) -> u64 {
        if self.phase == GamePhase::Success {
            return 0;
        }
        let points = self.mode.points(&self.tuning);
        self.phase = GamePhase::Success;
        self.score += points;

        log::info!(
            "Landed on {} (+{}, score {})",
            self.mode.as_str(),
            points,
            self.score
        );
        self.push_event(GameEvent::Landed {
            mode: self.mode,
            points,
        });
        self.push_event(GameEvent::Haptic {
            millis: self.tuning.haptic_pulse_ms,
        });
        points
    }

    /// Leave Success so the next landing can score
    pub(crate) fn release(&mut self) {
        if self.phase != GamePhase::Success {
            return;
        }
        self.phase = GamePhase::Playing;
        self.push_event(GameEvent::Released);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_game() -> GameState {
        GameState::new(Viewport::new(400.0, 800.0), GameMode::Cup, Tuning::default())
            .expect("valid viewport")
    }

    #[test]
    fn test_new_game_starts_in_start() {
        let state = new_game();
        assert_eq!(state.phase(), GamePhase::Start);
        assert_eq!(state.score(), 0);
        assert!(!state.is_sensing());
        assert_eq!(state.world().gravity, Vec2::new(0.0, 1.8));
    }

    #[test]
    fn test_invalid_viewport_builds_nothing() {
        let result = GameState::new(Viewport::new(0.0, 800.0), GameMode::Cup, Tuning::default());
        assert!(matches!(result, Err(SceneError::InvalidViewport { .. })));
    }

    #[test]
    fn test_begin_sensing_once() {
        let mut state = new_game();
        assert!(state.begin_sensing());
        assert_eq!(state.phase(), GamePhase::Playing);
        assert!(!state.begin_sensing());

        let started = state
            .drain_events()
            .into_iter()
            .filter(|e| *e == GameEvent::SensingStarted)
            .count();
        assert_eq!(started, 1);
    }

    #[test]
    fn test_landing_scores_once_until_release() {
        let mut state = new_game();
        assert_eq!(state.record_landing(), 10);
        assert_eq!(state.record_landing(), 0);
        assert_eq!(state.score(), 10);

        state.release();
        assert_eq!(state.phase(), GamePhase::Playing);
        assert_eq!(state.record_landing(), 10);
        assert_eq!(state.score(), 20);
    }

    #[test]
    fn test_mode_change_keeps_score_and_phase() {
        let mut state = new_game();
        state.record_landing();
        state.set_mode(GameMode::Spike);
        assert_eq!(state.mode(), GameMode::Spike);
        assert_eq!(state.phase(), GamePhase::Success);
        assert_eq!(state.score(), 10);
    }

    #[test]
    fn test_zero_detector_period_rejected() {
        let tuning = Tuning {
            detector_period: 0.0,
            ..Tuning::default()
        };
        let result = GameState::new(Viewport::new(400.0, 800.0), GameMode::Cup, tuning);
        assert!(matches!(result, Err(SceneError::InvalidTuning { .. })));
    }

    #[test]
    fn test_unreachable_spike_tolerance_rejected() {
        let tuning = Tuning {
            spike_tolerance_y: 20.0,
            ..Tuning::default()
        };
        let result = GameState::new(Viewport::new(400.0, 800.0), GameMode::Spike, tuning);
        assert!(matches!(result, Err(SceneError::InvalidTuning { .. })));
    }
}
