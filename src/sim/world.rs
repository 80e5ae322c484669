//! Minimal 2D rigid-body world
//!
//! Just enough engine for the gameplay layer: static and dynamic convex bodies,
//! distance constraints with adjustable stiffness/damping, a settable gravity
//! vector and ball-vs-static contacts. Screen coordinates, y grows downward.
//!
//! Per-step hooks are run by the caller before `step`.

use glam::Vec2;

use super::body::{Body, BodyId, BodyOptions, ConstraintId, Shape};
use super::collision::{ball_shape_collision, contact_response};

/// Constraint solver passes per step
pub const CONSTRAINT_ITERATIONS: u32 = 2;
/// Upper bound on collision substeps per step
pub const MAX_COLLISION_SUBSTEPS: u32 = 8;

/// Distance constraint between an (optional) body A and body B
///
/// Without a body A, `point_a` is a fixed world point; otherwise both points
/// are offsets from the respective body centers. Behaves like a rope: it pulls
/// the points back to `length` but never pushes them apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceConstraint {
    pub body_a: Option<BodyId>,
    pub point_a: Vec2,
    pub body_b: BodyId,
    pub point_b: Vec2,
    /// Rest length
    pub length: f32,
    /// Fraction of the length error corrected per solver pass (0..=1)
    pub stiffness: f32,
    /// Fraction of relative normal velocity removed per solver pass (0..=1)
    pub damping: f32,
}

impl DistanceConstraint {
    pub fn between(body_a: BodyId, point_a: Vec2, body_b: BodyId, length: f32) -> Self {
        Self {
            body_a: Some(body_a),
            point_a,
            body_b,
            point_b: Vec2::ZERO,
            length,
            stiffness: 1.0,
            damping: 0.0,
        }
    }

    /// Tie `point_b` on `body_b` to a fixed world point
    pub fn pinned(world_point: Vec2, body_b: BodyId, point_b: Vec2) -> Self {
        Self {
            body_a: None,
            point_a: world_point,
            body_b,
            point_b,
            length: 0.0,
            stiffness: 1.0,
            damping: 0.0,
        }
    }

    pub fn with_stiffness(mut self, stiffness: f32) -> Self {
        self.stiffness = stiffness;
        self
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }
}

/// Static obstacle snapshot used during collision substeps
#[derive(Debug, Clone, Copy)]
struct Obstacle {
    shape: Shape,
    pos: Vec2,
    restitution: f32,
    friction: f32,
}

/// The simulation world
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    /// Engine-unit gravity; acceleration is `gravity * gravity_scale`
    pub gravity: Vec2,
    /// Pixels/s² per gravity unit
    pub gravity_scale: f32,
    /// Sorted by id
    bodies: Vec<Body>,
    /// Sorted by id
    constraints: Vec<(ConstraintId, DistanceConstraint)>,
    next_id: u32,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec2, gravity_scale: f32) -> Self {
        Self {
            gravity,
            gravity_scale,
            bodies: Vec::new(),
            constraints: Vec::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.binary_search_by_key(&id, |b| b.id).ok()
    }

    fn constraint_index(&self, id: ConstraintId) -> Option<usize> {
        self.constraints.binary_search_by_key(&id, |(cid, _)| *cid).ok()
    }

    /// Add a body and return its id
    pub fn add_body(&mut self, shape: Shape, pos: Vec2, options: BodyOptions) -> BodyId {
        let id = BodyId(self.allocate_id());
        self.bodies.push(Body::new(id, shape, pos, options));
        id
    }

    /// Remove a body and every constraint attached to it.
    /// Returns false if the body was not present.
    pub fn remove_body(&mut self, id: BodyId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        self.bodies.remove(idx);
        self.constraints
            .retain(|(_, c)| c.body_b != id && c.body_a != Some(id));
        true
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.index_of(id).map(|i| &self.bodies[i])
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        match self.index_of(id) {
            Some(i) => Some(&mut self.bodies[i]),
            None => None,
        }
    }

    pub fn contains_body(&self, id: BodyId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Add a constraint. Returns None if it references a body that is not in
    /// the world.
    pub fn add_constraint(&mut self, constraint: DistanceConstraint) -> Option<ConstraintId> {
        if !self.contains_body(constraint.body_b) {
            return None;
        }
        if let Some(a) = constraint.body_a {
            if !self.contains_body(a) {
                return None;
            }
        }
        let id = ConstraintId(self.allocate_id());
        self.constraints.push((id, constraint));
        Some(id)
    }

    /// Remove a constraint. Removing an absent constraint is a no-op that
    /// returns false.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> bool {
        match self.constraint_index(id) {
            Some(idx) => {
                self.constraints.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&DistanceConstraint> {
        self.constraint_index(id).map(|i| &self.constraints[i].1)
    }

    pub fn constraint_mut(&mut self, id: ConstraintId) -> Option<&mut DistanceConstraint> {
        match self.constraint_index(id) {
            Some(i) => Some(&mut self.constraints[i].1),
            None => None,
        }
    }

    pub fn contains_constraint(&self, id: ConstraintId) -> bool {
        self.constraint_index(id).is_some()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Overwrite a body's velocity. Returns false if the body is gone.
    pub fn set_velocity(&mut self, id: BodyId, vel: Vec2) -> bool {
        match self.body_mut(id) {
            Some(body) => {
                body.vel = vel;
                true
            }
            None => false,
        }
    }

    /// Change a dynamic body's velocity by `impulse / mass`
    pub fn apply_impulse(&mut self, id: BodyId, impulse: Vec2) -> bool {
        match self.body_mut(id) {
            Some(body) => {
                let inv_mass = body.inverse_mass();
                body.vel += impulse * inv_mass;
                true
            }
            None => false,
        }
    }

    /// Remove every body and constraint. Gravity and id allocation survive.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.constraints.clear();
    }

    /// Find a dynamic body containing a world point
    pub fn dynamic_body_at(&self, point: Vec2) -> Option<BodyId> {
        self.bodies
            .iter()
            .find(|b| !b.is_static() && b.shape.contains(b.pos, point))
            .map(|b| b.id)
    }

    /// Advance the world by one fixed timestep
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }

        let accel = self.gravity * self.gravity_scale;
        for body in self.bodies.iter_mut().filter(|b| !b.is_static()) {
            body.vel += accel * dt;
        }

        // Copy static shapes out so dynamic bodies can be mutated freely
        let obstacles: Vec<Obstacle> = self
            .bodies
            .iter()
            .filter(|b| b.is_static())
            .map(|b| Obstacle {
                shape: b.shape,
                pos: b.pos,
                restitution: b.options.restitution,
                friction: b.options.friction,
            })
            .collect();

        for body in self.bodies.iter_mut().filter(|b| !b.is_static()) {
            let Shape::Circle { radius } = body.shape else {
                body.pos += body.vel * dt;
                continue;
            };

            let move_dist = body.vel.length() * dt;
            let step_size = radius * 0.5;
            let num_steps = ((move_dist / step_size).ceil() as u32).clamp(1, MAX_COLLISION_SUBSTEPS);
            let step_dt = dt / num_steps as f32;

            for _ in 0..num_steps {
                body.pos += body.vel * step_dt;
                resolve_contacts(body, radius, &obstacles);
            }
        }

        self.solve_constraints();

        // Constraint corrections can push the ball into geometry
        for body in self.bodies.iter_mut().filter(|b| !b.is_static()) {
            if let Shape::Circle { radius } = body.shape {
                resolve_contacts(body, radius, &obstacles);
            }
        }
    }

    fn solve_constraints(&mut self) {
        for _ in 0..CONSTRAINT_ITERATIONS {
            for ci in 0..self.constraints.len() {
                let c = self.constraints[ci].1;

                let Some(ib) = self.index_of(c.body_b) else {
                    continue;
                };
                let ia = match c.body_a {
                    Some(a) => match self.index_of(a) {
                        Some(i) => Some(i),
                        None => continue,
                    },
                    None => None,
                };

                let (pa, va, ima) = match ia {
                    Some(i) => {
                        let a = &self.bodies[i];
                        (a.pos + c.point_a, a.vel, a.inverse_mass())
                    }
                    None => (c.point_a, Vec2::ZERO, 0.0),
                };
                let b = &self.bodies[ib];
                let (pb, vb, imb) = (b.pos + c.point_b, b.vel, b.inverse_mass());

                let total = ima + imb;
                if total <= 0.0 {
                    continue;
                }

                let delta = pb - pa;
                let len = delta.length();
                if len < 1e-4 {
                    continue;
                }
                let err = len - c.length;
                // Only resists stretching; a shorter span exerts nothing
                if err <= 0.0 {
                    continue;
                }
                let dir = delta / len;

                // Positive when B is pulling away from A
                let vn = (vb - va).dot(dir);
                let mut dv = 0.0;
                if vn > 0.0 {
                    dv += vn * c.stiffness;
                }
                dv += (vn - dv) * c.damping;

                let correction = dir * (err * c.stiffness);
                let share_a = ima / total;
                let share_b = imb / total;

                if let Some(i) = ia {
                    let a = &mut self.bodies[i];
                    a.pos += correction * share_a;
                    a.vel += dir * dv * share_a;
                }
                let b = &mut self.bodies[ib];
                b.pos -= correction * share_b;
                b.vel -= dir * dv * share_b;
            }
        }
    }
}

fn resolve_contacts(body: &mut Body, radius: f32, obstacles: &[Obstacle]) {
    for obstacle in obstacles {
        let result = ball_shape_collision(body.pos, radius, &obstacle.shape, obstacle.pos);
        if !result.hit {
            continue;
        }
        body.pos += result.normal * result.penetration;
        let restitution = body.options.restitution.max(obstacle.restitution);
        let friction = body.options.friction.min(obstacle.friction);
        body.vel = contact_response(body.vel, result.normal, restitution, friction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball_options() -> BodyOptions {
        BodyOptions {
            restitution: 0.4,
            friction: 0.05,
            density: 0.04,
            is_static: false,
            visible: true,
        }
    }

    #[test]
    fn test_gravity_integrates() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 1.0), 1000.0);
        let ball = world.add_body(Shape::Circle { radius: 10.0 }, Vec2::ZERO, ball_options());
        world.step(0.1);
        let body = world.body(ball).expect("ball");
        assert!((body.vel.y - 100.0).abs() < 1e-3);
        assert!((body.pos.y - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_ball_lands_on_floor() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 1.8), 1000.0);
        world.add_body(Shape::rect(400.0, 20.0), Vec2::new(0.0, 100.0), BodyOptions::fixed());
        let ball = world.add_body(Shape::Circle { radius: 10.0 }, Vec2::ZERO, ball_options());

        for _ in 0..300 {
            world.step(1.0 / 60.0);
        }

        let body = world.body(ball).expect("ball");
        // Floor top at y = 90
        assert!(body.pos.y <= 80.5, "ball sank into floor: {}", body.pos.y);
        assert!(body.pos.y > 75.0, "ball never settled: {}", body.pos.y);
        assert!(body.speed() < 60.0);
    }

    #[test]
    fn test_rigid_constraint_limits_distance() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 1.8), 1000.0);
        let anchor = world.add_body(Shape::rect(10.0, 10.0), Vec2::ZERO, BodyOptions::fixed());
        let ball = world.add_body(
            Shape::Circle { radius: 10.0 },
            Vec2::new(0.0, 100.0),
            ball_options(),
        );
        world
            .add_constraint(DistanceConstraint::between(anchor, Vec2::ZERO, ball, 100.0))
            .expect("constraint");

        for _ in 0..120 {
            world.step(1.0 / 60.0);
        }

        let dist = world.body(ball).expect("ball").pos.length();
        assert!((dist - 100.0).abs() < 2.0, "distance drifted to {}", dist);
    }

    #[test]
    fn test_slack_constraint_never_pushes() {
        let mut world = PhysicsWorld::new(Vec2::ZERO, 1000.0);
        let anchor = world.add_body(Shape::rect(10.0, 10.0), Vec2::ZERO, BodyOptions::fixed());
        let ball = world.add_body(
            Shape::Circle { radius: 10.0 },
            Vec2::new(0.0, 50.0),
            ball_options(),
        );
        world
            .add_constraint(
                DistanceConstraint::between(anchor, Vec2::ZERO, ball, 100.0).with_damping(0.5),
            )
            .expect("constraint");

        for _ in 0..10 {
            world.step(1.0 / 60.0);
        }

        let body = world.body(ball).expect("ball");
        assert_eq!(body.pos, Vec2::new(0.0, 50.0));
        assert_eq!(body.vel, Vec2::ZERO);
    }

    #[test]
    fn test_ball_rests_on_ledge_under_slack_string() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 1.8), 1000.0);
        let anchor = world.add_body(Shape::rect(10.0, 10.0), Vec2::ZERO, BodyOptions::fixed());
        // Ledge top at y = 190, well inside the string's reach
        world.add_body(Shape::rect(20.0, 20.0), Vec2::new(0.0, 200.0), BodyOptions::fixed());
        let ball = world.add_body(
            Shape::Circle { radius: 10.0 },
            Vec2::new(0.0, 179.0),
            ball_options(),
        );
        world
            .add_constraint(
                DistanceConstraint::between(anchor, Vec2::ZERO, ball, 300.0).with_stiffness(0.002),
            )
            .expect("string");

        for _ in 0..60 {
            world.step(1.0 / 60.0);
        }

        let body = world.body(ball).expect("ball");
        assert!((body.pos.y - 180.0).abs() < 0.6, "ball hovers at {}", body.pos.y);
        assert!(body.speed() < 31.0, "ball jitters at {}", body.speed());
    }

    #[test]
    fn test_remove_constraint_is_idempotent() {
        let mut world = PhysicsWorld::new(Vec2::ZERO, 1000.0);
        let anchor = world.add_body(Shape::rect(10.0, 10.0), Vec2::ZERO, BodyOptions::fixed());
        let ball = world.add_body(Shape::Circle { radius: 5.0 }, Vec2::X * 50.0, ball_options());
        let id = world
            .add_constraint(DistanceConstraint::between(anchor, Vec2::ZERO, ball, 50.0))
            .expect("constraint");

        assert!(world.remove_constraint(id));
        assert!(!world.remove_constraint(id));
        assert_eq!(world.constraint_count(), 0);
    }

    #[test]
    fn test_constraint_to_missing_body_rejected() {
        let mut world = PhysicsWorld::new(Vec2::ZERO, 1000.0);
        let ball = world.add_body(Shape::Circle { radius: 5.0 }, Vec2::ZERO, ball_options());
        assert!(world.remove_body(ball));
        assert!(world.add_constraint(DistanceConstraint::pinned(Vec2::ZERO, ball, Vec2::ZERO)).is_none());
    }

    #[test]
    fn test_removing_body_drops_its_constraints() {
        let mut world = PhysicsWorld::new(Vec2::ZERO, 1000.0);
        let anchor = world.add_body(Shape::rect(10.0, 10.0), Vec2::ZERO, BodyOptions::fixed());
        let ball = world.add_body(Shape::Circle { radius: 5.0 }, Vec2::X * 50.0, ball_options());
        let id = world
            .add_constraint(DistanceConstraint::between(anchor, Vec2::ZERO, ball, 50.0))
            .expect("constraint");

        world.remove_body(ball);
        assert!(!world.contains_constraint(id));
        assert!(world.body(ball).is_none());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut world = PhysicsWorld::new(Vec2::ZERO, 1000.0);
        let first = world.add_body(Shape::Circle { radius: 5.0 }, Vec2::ZERO, ball_options());
        world.clear();
        let second = world.add_body(Shape::Circle { radius: 5.0 }, Vec2::ZERO, ball_options());
        assert_ne!(first, second);
        assert!(world.body(first).is_none());
    }

    #[test]
    fn test_impulse_scales_with_mass() {
        let mut world = PhysicsWorld::new(Vec2::ZERO, 1000.0);
        let ball = world.add_body(Shape::Circle { radius: 10.0 }, Vec2::ZERO, ball_options());
        let mass = world.body(ball).expect("ball").mass();
        world.apply_impulse(ball, Vec2::new(0.0, -mass * 50.0));
        assert!((world.body(ball).expect("ball").vel.y + 50.0).abs() < 1e-2);
    }

    #[test]
    fn test_pinned_drag_pulls_ball() {
        let mut world = PhysicsWorld::new(Vec2::ZERO, 1000.0);
        let ball = world.add_body(Shape::Circle { radius: 10.0 }, Vec2::ZERO, ball_options());
        world
            .add_constraint(
                DistanceConstraint::pinned(Vec2::new(100.0, 0.0), ball, Vec2::ZERO)
                    .with_stiffness(0.2),
            )
            .expect("drag");
        world.step(1.0 / 60.0);
        let x = world.body(ball).expect("ball").pos.x;
        assert!(x > 30.0 && x < 100.0, "x = {}", x);
    }
}
