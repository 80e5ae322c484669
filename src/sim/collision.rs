//! Collision detection and response for the ball
//!
//! Only dynamic circles are tested, and only against static shapes. That is
//! all a kendama needs: one ball, everything else nailed down.

use glam::Vec2;

use super::body::Shape;
use super::sdf::{check_sdf_collision, sd_box};

/// Normal speeds (px/s) below this settle instead of bouncing
pub const RESTING_SPEED: f32 = 60.0;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point on the obstacle surface (if hit)
    pub point: Vec2,
    /// Surface normal at contact, pointing from the obstacle toward the ball
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check collision between a ball and an obstacle shape placed at `shape_pos`
pub fn ball_shape_collision(
    ball_pos: Vec2,
    ball_radius: f32,
    shape: &Shape,
    shape_pos: Vec2,
) -> CollisionResult {
    match *shape {
        Shape::Rect { half_extents } => {
            let hit = check_sdf_collision(ball_pos, ball_radius, |p| {
                sd_box(p, shape_pos, half_extents)
            });
            if !hit.hit || hit.normal == Vec2::ZERO {
                return CollisionResult::miss();
            }
            CollisionResult {
                hit: true,
                point: ball_pos - hit.normal * hit.distance,
                normal: hit.normal,
                penetration: hit.penetration,
            }
        }
        Shape::Circle { radius } => {
            let delta = ball_pos - shape_pos;
            let dist = delta.length();
            let reach = ball_radius + radius;
            if dist >= reach {
                return CollisionResult::miss();
            }
            // Concentric: push straight up
            let normal = if dist > 1e-4 {
                delta / dist
            } else {
                Vec2::new(0.0, -1.0)
            };
            CollisionResult {
                hit: true,
                point: shape_pos + normal * radius,
                normal,
                penetration: reach - dist,
            }
        }
    }
}

/// Velocity after hitting a static surface
///
/// The normal component is reversed and scaled by `restitution` (zeroed for
/// resting contact), the tangential component loses `friction` of itself.
/// Separating velocities pass through untouched.
pub fn contact_response(velocity: Vec2, normal: Vec2, restitution: f32, friction: f32) -> Vec2 {
    let vn = velocity.dot(normal);
    if vn >= 0.0 {
        return velocity;
    }

    let normal_vel = normal * vn;
    let tangent_vel = velocity - normal_vel;
    let bounce = if -vn < RESTING_SPEED { 0.0 } else { restitution };

    tangent_vel * (1.0 - friction.clamp(0.0, 1.0)) - normal_vel * bounce
}
