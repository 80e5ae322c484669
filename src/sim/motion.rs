//! Motion and pointer input mapping
//!
//! Device tilt steers world gravity sideways; a sharp vertical jerk kicks the
//! ball upward. Pointer drag goes through a pinned distance constraint and is
//! available whether or not motion sensing has started.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::body::BodyId;
use super::state::{GameEvent, GameState};
use super::world::{DistanceConstraint, PhysicsWorld};
use crate::tuning::{JumpStrategy, Tuning};

/// One device-motion reading, m/s². Missing axes read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub acceleration_including_gravity: Option<Vec3>,
    /// Linear acceleration with gravity removed
    pub acceleration: Option<Vec3>,
}

impl MotionSample {
    /// Sample with only the gravity-inclusive reading, as tilt produces
    pub fn tilt(x: f32, y: f32, z: f32) -> Self {
        Self {
            acceleration_including_gravity: Some(Vec3::new(x, y, z)),
            acceleration: None,
        }
    }

    /// Sample with only the linear reading, as a flick produces
    pub fn linear(x: f32, y: f32, z: f32) -> Self {
        Self {
            acceleration_including_gravity: None,
            acceleration: Some(Vec3::new(x, y, z)),
        }
    }

    #[inline]
    pub fn gravity_reading(&self) -> Vec3 {
        self.acceleration_including_gravity.unwrap_or(Vec3::ZERO)
    }

    #[inline]
    pub fn linear_reading(&self) -> Vec3 {
        self.acceleration.unwrap_or(Vec3::ZERO)
    }

    /// Either jerk axis over the threshold
    pub fn is_jerk(&self, threshold: f32) -> bool {
        let a = self.linear_reading();
        a.y > threshold || a.z > threshold
    }
}

/// Pointer input in world pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down(Vec2),
    Move(Vec2),
    Up,
}

/// Horizontal gravity for a tilt reading
#[inline]
pub fn tilt_gravity_x(sample: &MotionSample, tuning: &Tuning) -> f32 {
    -sample.gravity_reading().x * tuning.tilt_gain
}

/// Kick the ball upward using the configured strategy
pub fn jump(world: &mut PhysicsWorld, ball: BodyId, tuning: &Tuning) -> bool {
    match tuning.jump_strategy {
        JumpStrategy::VelocityOverride => {
            let Some(body) = world.body(ball) else {
                return false;
            };
            let vel = Vec2::new(body.vel.x, tuning.jump_velocity);
            world.set_velocity(ball, vel)
        }
        JumpStrategy::Impulse => world.apply_impulse(ball, Vec2::new(0.0, -tuning.jump_impulse)),
    }
}

/// Apply one motion sample. Ignored until sensing has started.
///
/// Returns true if the sample triggered a jump.
pub fn apply_sample(state: &mut GameState, sample: &MotionSample) -> bool {
    if !state.sensing {
        return false;
    }

    state.world.gravity.x = tilt_gravity_x(sample, &state.tuning);

    if sample.is_jerk(state.tuning.jerk_threshold) {
        let jumped = jump(&mut state.world, state.scene.ball, &state.tuning);
        state.debug_info = "JUMP!".to_string();
        if jumped {
            log::debug!("Jump triggered");
            state.push_event(GameEvent::Jumped);
        }
        return jumped;
    }

    state.debug_info = format!("Y:{:.1}", sample.linear_reading().y);
    false
}

/// Drive the drag constraint from pointer input
pub fn apply_pointer(state: &mut GameState, event: PointerEvent) {
    match event {
        PointerEvent::Down(point) => {
            if let Some(old) = state.drag.take() {
                state.world.remove_constraint(old);
            }
            let Some(body_id) = state.world.dynamic_body_at(point) else {
                return;
            };
            let Some(body) = state.world.body(body_id) else {
                return;
            };
            let grab = DistanceConstraint::pinned(point, body_id, point - body.pos)
                .with_stiffness(state.tuning.drag_stiffness);
            state.drag = state.world.add_constraint(grab);
        }
        PointerEvent::Move(point) => {
            let Some(id) = state.drag else {
                return;
            };
            match state.world.constraint_mut(id) {
                Some(c) => c.point_a = point,
                // Scene was rebuilt under the pointer
                None => state.drag = None,
            }
        }
        PointerEvent::Up => {
            if let Some(id) = state.drag.take() {
                state.world.remove_constraint(id);
            }
        }
    }
}
