//! Landing detection
//!
//! Polled on its own cadence (`Tuning::detector_period`), not every physics
//! step. A landing needs the ball near the target's reference point and
//! nearly still; once in Success, the ball has to be flung away faster than
//! `release_speed` before it can score again.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{BodyId, ConstraintId};
use super::state::{GameEvent, GameMode, GamePhase, GameState};
use super::world::DistanceConstraint;
use crate::tuning::Tuning;

/// A spike magnet waiting for its removal timer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingMagnet {
    pub constraint: ConstraintId,
    /// Seconds until removal
    pub remaining: f32,
}

/// What a single poll decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Idle,
    Landed { points: u64 },
    Released,
}

/// Is a ball at `offset` from the reference point, moving at `speed`, landed?
pub fn is_landed(mode: GameMode, offset: Vec2, speed: f32, tuning: &Tuning) -> bool {
    let (tol_x, tol_y, cap) = match mode {
        GameMode::Cup => (
            tuning.cup_tolerance_x,
            tuning.cup_tolerance_y,
            tuning.cup_speed_cap,
        ),
        GameMode::Spike => (
            tuning.spike_tolerance_x,
            tuning.spike_tolerance_y,
            tuning.spike_speed_cap,
        ),
    };
    offset.x.abs() < tol_x && offset.y.abs() < tol_y && speed < cap
}

/// Run one detector poll against the current state
pub fn poll(state: &mut GameState) -> PollOutcome {
    let Some(ball) = state.world.body(state.scene.ball) else {
        return PollOutcome::Idle;
    };
    let (pos, speed) = (ball.pos, ball.speed());

    if state.phase == GamePhase::Success {
        if speed > state.tuning.release_speed {
            state.release();
            return PollOutcome::Released;
        }
        return PollOutcome::Idle;
    }

    let reference = state.scene.target.reference_point(&state.tuning);
    if !is_landed(state.mode, pos - reference, speed, &state.tuning) {
        return PollOutcome::Idle;
    }

    let points = state.record_landing();
    if let Some((body, tip_offset)) = state.scene.target.magnet_anchor() {
        attach_magnet(state, body, tip_offset);
    }
    PollOutcome::Landed { points }
}

/// Pin the ball onto the spike tip for `magnet_lifetime` seconds.
///
/// Not gated on existing magnets; each one carries its own timer.
fn attach_magnet(state: &mut GameState, body: BodyId, tip_offset: Vec2) {
    let magnet = DistanceConstraint {
        body_a: Some(body),
        point_a: tip_offset,
        body_b: state.scene.ball,
        point_b: Vec2::ZERO,
        length: 0.0,
        stiffness: state.tuning.magnet_stiffness,
        damping: 0.0,
    };
    let Some(constraint) = state.world.add_constraint(magnet) else {
        log::warn!("Magnet could not be attached");
        return;
    };
    state.magnets.push(PendingMagnet {
        constraint,
        remaining: state.tuning.magnet_lifetime,
    });
    state.push_event(GameEvent::MagnetAttached);
}

/// Count down magnet timers and remove the expired ones.
///
/// Removal is a no-op if the constraint already left the world (mode switch
/// teardown, for instance).
pub fn expire_magnets(state: &mut GameState, dt: f32) {
    let mut released = 0;
    let world = &mut state.world;
    state.magnets.retain_mut(|magnet| {
        magnet.remaining -= dt;
        if magnet.remaining > 0.0 {
            return true;
        }
        if world.remove_constraint(magnet.constraint) {
            released += 1;
        }
        false
    });

    for _ in 0..released {
        log::debug!("Magnet released");
        state.push_event(GameEvent::MagnetReleased);
    }
}

/// Feed elapsed time to the detector timer, polling once per full period
pub fn advance(state: &mut GameState, dt: f32) {
    let period = state.tuning.detector_period;
    state.detector_accumulator += dt;
    while state.detector_accumulator >= period {
        state.detector_accumulator -= period;
        poll(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::scene::Viewport;
    use proptest::prelude::*;

    fn game(mode: GameMode) -> GameState {
        GameState::new(Viewport::new(400.0, 800.0), mode, Tuning::default()).expect("game")
    }

    /// Park the ball at `offset` from the target reference with velocity `vel`
    fn place_ball(state: &mut GameState, offset: Vec2, vel: Vec2) {
        let reference = state.scene().target.reference_point(state.tuning());
        let ball = state.scene().ball;
        let body = state.world_mut().body_mut(ball).expect("ball");
        body.pos = reference + offset;
        body.vel = vel;
    }

    #[test]
    fn test_cup_tolerances() {
        let t = Tuning::default();
        assert!(is_landed(GameMode::Cup, Vec2::new(39.0, -29.0), 10.0, &t));
        assert!(!is_landed(GameMode::Cup, Vec2::new(40.0, 0.0), 10.0, &t));
        assert!(!is_landed(GameMode::Cup, Vec2::new(0.0, 30.0), 10.0, &t));
        assert!(!is_landed(GameMode::Cup, Vec2::ZERO, 180.0, &t));
    }

    #[test]
    fn test_spike_is_tighter_than_cup() {
        let t = Tuning::default();
        let offset = Vec2::new(30.0, 0.0);
        assert!(is_landed(GameMode::Cup, offset, 0.0, &t));
        assert!(!is_landed(GameMode::Spike, offset, 0.0, &t));
    }

    #[test]
    fn test_far_ball_stays_playing() {
        let mut state = game(GameMode::Cup);
        state.begin_sensing();
        place_ball(&mut state, Vec2::new(100.0, 0.0), Vec2::ZERO);
        assert_eq!(poll(&mut state), PollOutcome::Idle);
        assert_eq!(state.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_spike_landing_attaches_magnet() {
        let mut state = game(GameMode::Spike);
        state.begin_sensing();
        place_ball(&mut state, Vec2::new(5.0, 10.0), Vec2::new(2.0, 0.0));

        assert_eq!(poll(&mut state), PollOutcome::Landed { points: 100 });
        assert_eq!(state.pending_magnets().len(), 1);
        let magnet = state.pending_magnets()[0].constraint;
        let c = state.world().constraint(magnet).expect("magnet");
        assert_eq!(c.length, 0.0);
        assert_eq!(c.stiffness, 0.5);
    }

    #[test]
    fn test_release_needs_release_speed() {
        let mut state = game(GameMode::Cup);
        place_ball(&mut state, Vec2::ZERO, Vec2::ZERO);
        poll(&mut state);
        assert_eq!(state.phase(), GamePhase::Success);

        // Faster than the cup cap, still below release
        place_ball(&mut state, Vec2::new(300.0, 0.0), Vec2::new(0.0, 250.0));
        assert_eq!(poll(&mut state), PollOutcome::Idle);
        assert_eq!(state.phase(), GamePhase::Success);

        place_ball(&mut state, Vec2::new(300.0, 0.0), Vec2::new(0.0, 301.0));
        assert_eq!(poll(&mut state), PollOutcome::Released);
        assert_eq!(state.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_expired_magnet_removal_is_idempotent() {
        let mut state = game(GameMode::Spike);
        place_ball(&mut state, Vec2::ZERO, Vec2::ZERO);
        poll(&mut state);
        let magnet = state.pending_magnets()[0].constraint;

        // Something else already removed it
        assert!(state.world_mut().remove_constraint(magnet));
        expire_magnets(&mut state, 2.0);

        assert!(state.pending_magnets().is_empty());
        assert!(
            !state
                .drain_events()
                .contains(&GameEvent::MagnetReleased)
        );
    }

    #[test]
    fn test_advance_polls_on_period() {
        let mut state = game(GameMode::Cup);
        place_ball(&mut state, Vec2::ZERO, Vec2::ZERO);

        advance(&mut state, 0.03);
        assert_eq!(state.phase(), GamePhase::Start);
        advance(&mut state, 0.03);
        assert_eq!(state.phase(), GamePhase::Success);
    }

    proptest! {
        #[test]
        fn test_score_monotonic(
            steps in prop::collection::vec(
                (-60.0f32..60.0, -60.0f32..60.0, 0.0f32..400.0, any::<bool>()),
                1..40,
            )
        ) {
            let mut state = game(GameMode::Cup);
            for (x, y, speed, switch) in steps {
                if switch {
                    let next = match state.mode() {
                        GameMode::Cup => GameMode::Spike,
                        GameMode::Spike => GameMode::Cup,
                    };
                    state.set_mode(next);
                }
                place_ball(&mut state, Vec2::new(x, y), Vec2::new(speed, 0.0));

                let before_score = state.score();
                let before_phase = state.phase();
                poll(&mut state);
                let gained = state.score() - before_score;

                if before_phase == GamePhase::Success {
                    prop_assert_eq!(gained, 0);
                } else if gained > 0 {
                    prop_assert_eq!(gained, state.mode().points(state.tuning()));
                    prop_assert_eq!(state.phase(), GamePhase::Success);
                }
            }
        }

        #[test]
        fn test_magnet_gone_after_lifetime(
            chunks in prop::collection::vec(0.01f32..0.3, 1..20),
            switch_mode in any::<bool>(),
        ) {
            let mut state = game(GameMode::Spike);
            place_ball(&mut state, Vec2::ZERO, Vec2::ZERO);
            poll(&mut state);
            let magnet = state.pending_magnets()[0].constraint;
            let lifetime = state.tuning().magnet_lifetime;

            if switch_mode {
                state.set_mode(GameMode::Cup);
            }

            let mut elapsed = 0.0;
            for dt in chunks {
                expire_magnets(&mut state, dt);
                elapsed += dt;
                if elapsed < lifetime - 1e-3 && !switch_mode {
                    prop_assert!(state.world().contains_constraint(magnet));
                }
            }
            expire_magnets(&mut state, lifetime + 0.01);
            prop_assert!(!state.world().contains_constraint(magnet));
            prop_assert!(state.pending_magnets().is_empty());
        }
    }
}
