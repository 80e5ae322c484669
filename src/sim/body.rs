//! Rigid bodies for the bundled 2D world

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Identifier of a body inside a `PhysicsWorld`. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Identifier of a constraint inside a `PhysicsWorld`. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConstraintId(pub u32);

/// Convex collision shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    /// Axis-aligned rectangle
    Rect { half_extents: Vec2 },
}

impl Shape {
    pub fn rect(width: f32, height: f32) -> Self {
        Shape::Rect {
            half_extents: Vec2::new(width / 2.0, height / 2.0),
        }
    }

    pub fn area(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
            Shape::Rect { half_extents } => 4.0 * half_extents.x * half_extents.y,
        }
    }

    /// Does the shape, placed at `center`, contain `point`?
    pub fn contains(&self, center: Vec2, point: Vec2) -> bool {
        match *self {
            Shape::Circle { radius } => (point - center).length_squared() <= radius * radius,
            Shape::Rect { half_extents } => {
                let d = (point - center).abs();
                d.x <= half_extents.x && d.y <= half_extents.y
            }
        }
    }
}

/// Material and behavior flags for a new body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyOptions {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
    pub is_static: bool,
    /// Rendering hint only; invisible bodies still collide
    pub visible: bool,
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            restitution: 0.0,
            friction: 0.1,
            density: 0.001,
            is_static: false,
            visible: true,
        }
    }
}

impl BodyOptions {
    /// Static body with default material
    pub fn fixed() -> Self {
        Self {
            is_static: true,
            ..Default::default()
        }
    }

    /// Static body that is never drawn
    pub fn invisible_wall() -> Self {
        Self {
            is_static: true,
            visible: false,
            ..Default::default()
        }
    }
}

/// A body living in the world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub shape: Shape,
    pub pos: Vec2,
    pub vel: Vec2,
    pub options: BodyOptions,
}

impl Body {
    pub fn new(id: BodyId, shape: Shape, pos: Vec2, options: BodyOptions) -> Self {
        Self {
            id,
            shape,
            pos,
            vel: Vec2::ZERO,
            options,
        }
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.options.is_static
    }

    pub fn mass(&self) -> f32 {
        self.options.density * self.shape.area()
    }

    /// Zero for static bodies
    pub fn inverse_mass(&self) -> f32 {
        if self.is_static() {
            return 0.0;
        }
        let mass = self.mass();
        if mass > 0.0 { 1.0 / mass } else { 0.0 }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}
