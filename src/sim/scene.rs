//! Scene construction
//!
//! A scene is everything that lives in the world for one mode: the handle,
//! the mode's target, the ball, the string joining ball to handle and four
//! invisible boundary walls. Geometry is laid out relative to the viewport
//! bottom so the toy sits where a thumb can reach it.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{BodyId, BodyOptions, ConstraintId, Shape};
use super::state::GameMode;
use super::world::{DistanceConstraint, PhysicsWorld};
use crate::tuning::Tuning;

pub const HANDLE_SIZE: Vec2 = Vec2::new(30.0, 200.0);
/// Handle center, measured up from the viewport bottom
pub const HANDLE_LIFT: f32 = 100.0;

pub const CUP_BASE_SIZE: Vec2 = Vec2::new(100.0, 20.0);
pub const CUP_BASE_LIFT: f32 = 210.0;
pub const CUP_GUARD_SIZE: Vec2 = Vec2::new(10.0, 60.0);
pub const CUP_GUARD_SPREAD: f32 = 55.0;
pub const CUP_GUARD_LIFT: f32 = 230.0;

pub const SPIKE_SIZE: Vec2 = Vec2::new(15.0, 150.0);
pub const SPIKE_LIFT: f32 = 250.0;

/// Boundary wall thickness
const WALL_THICKNESS: f32 = 50.0;
/// The ceiling sits far above the screen so the ball can be flung out of view
const CEILING_Y: f32 = -800.0;
/// Side walls and floor sit just outside the visible area
const WALL_OUTSET: f32 = 100.0;

/// Drawable area in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<(), SceneError> {
        let ok = |v: f32| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(())
        } else {
            Err(SceneError::InvalidViewport {
                width: self.width,
                height: self.height,
            })
        }
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.width / 2.0
    }

    /// Point `lift` pixels above the bottom edge, horizontally centered
    #[inline]
    pub fn lifted(&self, lift: f32) -> Vec2 {
        Vec2::new(self.center_x(), self.height - lift)
    }
}

/// Errors from building a scene
#[derive(Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Width or height is zero, negative or not finite
    InvalidViewport { width: f32, height: f32 },
    /// The world refused the string constraint
    StringRejected,
    /// Tuning values break a gameplay invariant
    InvalidTuning { reason: &'static str },
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::InvalidViewport { width, height } => {
                write!(f, "invalid viewport {}x{}", width, height)
            }
            SceneError::StringRejected => write!(f, "string constraint could not be attached"),
            SceneError::InvalidTuning { reason } => write!(f, "invalid tuning: {}", reason),
        }
    }
}

impl std::error::Error for SceneError {}

/// The mode-specific target and its bodies
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Cup {
        /// Center of the cup base
        base_position: Vec2,
        width: f32,
        guard_height: f32,
        base: BodyId,
        /// Invisible side guards, left then right
        guards: [BodyId; 2],
    },
    Spike {
        tip_position: Vec2,
        length: f32,
        rod: BodyId,
    },
}

impl Target {
    pub fn mode(&self) -> GameMode {
        match self {
            Target::Cup { .. } => GameMode::Cup,
            Target::Spike { .. } => GameMode::Spike,
        }
    }

    /// Point the ball must come to rest near to count as landed
    pub fn reference_point(&self, tuning: &Tuning) -> Vec2 {
        match *self {
            Target::Cup { base_position, .. } => {
                base_position - Vec2::new(0.0, tuning.cup_cap_offset)
            }
            Target::Spike { tip_position, .. } => tip_position,
        }
    }

    /// Body a landing magnet hangs from, and the tip offset on that body.
    /// Only the spike has one.
    pub fn magnet_anchor(&self) -> Option<(BodyId, Vec2)> {
        match *self {
            Target::Cup { .. } => None,
            Target::Spike { length, rod, .. } => Some((rod, Vec2::new(0.0, -length / 2.0))),
        }
    }

    pub fn body_ids(&self) -> Vec<BodyId> {
        match *self {
            Target::Cup { base, guards, .. } => vec![base, guards[0], guards[1]],
            Target::Spike { rod, .. } => vec![rod],
        }
    }
}

/// Ids of everything a scene build added to the world
#[derive(Debug, Clone, PartialEq)]
pub struct SceneHandles {
    pub handle: BodyId,
    pub target: Target,
    pub ball: BodyId,
    pub string: ConstraintId,
    /// Ceiling, left, right, floor
    pub walls: [BodyId; 4],
}

impl SceneHandles {
    pub fn mode(&self) -> GameMode {
        self.target.mode()
    }

    pub fn all_bodies(&self) -> Vec<BodyId> {
        let mut ids = vec![self.handle, self.ball];
        ids.extend(self.target.body_ids());
        ids.extend(self.walls);
        ids
    }

    /// Remove everything this scene added. Safe to call twice.
    pub fn teardown(&self, world: &mut PhysicsWorld) {
        world.remove_constraint(self.string);
        for id in self.all_bodies() {
            world.remove_body(id);
        }
    }
}

/// Populate `world` with the scene for `mode`.
///
/// The viewport is checked before anything is added, so a failed build leaves
/// the world untouched.
pub fn build_scene(
    world: &mut PhysicsWorld,
    mode: GameMode,
    viewport: Viewport,
    tuning: &Tuning,
) -> Result<SceneHandles, SceneError> {
    viewport.validate()?;

    let handle = world.add_body(
        Shape::rect(HANDLE_SIZE.x, HANDLE_SIZE.y),
        viewport.lifted(HANDLE_LIFT),
        BodyOptions::fixed(),
    );

    let target = match mode {
        GameMode::Cup => build_cup(world, viewport),
        GameMode::Spike => build_spike(world, viewport),
    };

    let ball = world.add_body(
        Shape::Circle {
            radius: tuning.ball_radius,
        },
        viewport.lifted(tuning.drop_height),
        BodyOptions {
            restitution: tuning.ball_restitution,
            friction: tuning.ball_friction,
            density: tuning.ball_density,
            is_static: false,
            visible: true,
        },
    );

    let walls = build_walls(world, viewport);

    let string_constraint = DistanceConstraint::between(
        handle,
        tuning.string_anchor_offset,
        ball,
        tuning.string_rest_length,
    )
    .with_stiffness(tuning.taut_stiffness)
    .with_damping(tuning.taut_damping);

    let Some(string) = world.add_constraint(string_constraint) else {
        let partial = [handle, ball]
            .into_iter()
            .chain(target.body_ids())
            .chain(walls);
        for id in partial {
            world.remove_body(id);
        }
        return Err(SceneError::StringRejected);
    };

    log::debug!(
        "Built {} scene: {} bodies, string {:?}",
        mode.as_str(),
        world.body_count(),
        string
    );

    Ok(SceneHandles {
        handle,
        target,
        ball,
        string,
        walls,
    })
}

fn build_cup(world: &mut PhysicsWorld, viewport: Viewport) -> Target {
    let base_position = viewport.lifted(CUP_BASE_LIFT);
    let base = world.add_body(
        Shape::rect(CUP_BASE_SIZE.x, CUP_BASE_SIZE.y),
        base_position,
        BodyOptions::fixed(),
    );

    let guard_y = viewport.height - CUP_GUARD_LIFT;
    let guard_shape = Shape::rect(CUP_GUARD_SIZE.x, CUP_GUARD_SIZE.y);
    let left = world.add_body(
        guard_shape,
        Vec2::new(viewport.center_x() - CUP_GUARD_SPREAD, guard_y),
        BodyOptions::invisible_wall(),
    );
    let right = world.add_body(
        guard_shape,
        Vec2::new(viewport.center_x() + CUP_GUARD_SPREAD, guard_y),
        BodyOptions::invisible_wall(),
    );

    Target::Cup {
        base_position,
        width: CUP_BASE_SIZE.x,
        guard_height: CUP_GUARD_SIZE.y,
        base,
        guards: [left, right],
    }
}

fn build_spike(world: &mut PhysicsWorld, viewport: Viewport) -> Target {
    let center = viewport.lifted(SPIKE_LIFT);
    let rod = world.add_body(
        Shape::rect(SPIKE_SIZE.x, SPIKE_SIZE.y),
        center,
        BodyOptions::fixed(),
    );

    Target::Spike {
        tip_position: center - Vec2::new(0.0, SPIKE_SIZE.y / 2.0),
        length: SPIKE_SIZE.y,
        rod,
    }
}

fn build_walls(world: &mut PhysicsWorld, viewport: Viewport) -> [BodyId; 4] {
    let (w, h) = (viewport.width, viewport.height);
    let ceiling = world.add_body(
        Shape::rect(w * 2.0, WALL_THICKNESS),
        Vec2::new(w / 2.0, CEILING_Y),
        BodyOptions::invisible_wall(),
    );
    let left = world.add_body(
        Shape::rect(WALL_THICKNESS, h * 2.0),
        Vec2::new(-WALL_OUTSET, h / 2.0),
        BodyOptions::invisible_wall(),
    );
    let right = world.add_body(
        Shape::rect(WALL_THICKNESS, h * 2.0),
        Vec2::new(w + WALL_OUTSET, h / 2.0),
        BodyOptions::invisible_wall(),
    );
    let floor = world.add_body(
        Shape::rect(w * 2.0, WALL_THICKNESS),
        Vec2::new(w / 2.0, h + WALL_OUTSET),
        BodyOptions::invisible_wall(),
    );
    [ceiling, left, right, floor]
}
