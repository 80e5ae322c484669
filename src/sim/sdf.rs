//! SDF-based contact detection
//!
//! Signed distance to the box shapes the game is built from. A negative value
//! means the point is inside the shape.

use glam::Vec2;

/// Signed distance to an axis-aligned box
pub fn sd_box(p: Vec2, center: Vec2, half_extents: Vec2) -> f32 {
    let d = (p - center).abs() - half_extents;
    let outside = d.max(Vec2::ZERO).length();
    let inside = d.x.max(d.y).min(0.0);
    outside + inside
}

/// Compute SDF gradient (surface normal) using central differences
pub fn sdf_gradient<F>(p: Vec2, sdf: F) -> Vec2
where
    F: Fn(Vec2) -> f32,
{
    let eps = 0.5;
    let dx = sdf(p + Vec2::new(eps, 0.0)) - sdf(p - Vec2::new(eps, 0.0));
    let dy = sdf(p + Vec2::new(0.0, eps)) - sdf(p - Vec2::new(0.0, eps));
    Vec2::new(dx, dy).normalize_or_zero()
}

/// Result of SDF collision check
#[derive(Debug, Clone)]
pub struct SdfCollision {
    pub hit: bool,
    pub distance: f32,
    pub normal: Vec2,
    pub penetration: f32,
}

impl SdfCollision {
    pub fn miss() -> Self {
        Self {
            hit: false,
            distance: f32::MAX,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check collision between a circle and an SDF shape
pub fn check_sdf_collision<F>(ball_pos: Vec2, ball_radius: f32, sdf: F) -> SdfCollision
where
    F: Fn(Vec2) -> f32,
{
    let dist = sdf(ball_pos);

    if dist < ball_radius {
        let normal = sdf_gradient(ball_pos, &sdf);
        SdfCollision {
            hit: true,
            distance: dist,
            normal,
            penetration: ball_radius - dist,
        }
    } else {
        SdfCollision::miss()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sd_box_outside_inside() {
        let center = Vec2::new(100.0, 100.0);
        let half = Vec2::new(50.0, 10.0);

        // 5 px above the top face
        assert!((sd_box(Vec2::new(100.0, 85.0), center, half) - 5.0).abs() < 1e-4);
        // Center is half the short side deep
        assert!((sd_box(center, center, half) + 10.0).abs() < 1e-4);
        // Corner region measures euclidean distance
        let d = sd_box(Vec2::new(153.0, 114.0), center, half);
        assert!((d - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_box_gradient_points_out_of_top_face() {
        let center = Vec2::ZERO;
        let half = Vec2::new(50.0, 10.0);
        let n = sdf_gradient(Vec2::new(0.0, -15.0), |p| sd_box(p, center, half));
        assert!((n - Vec2::new(0.0, -1.0)).length() < 1e-3);
    }

    #[test]
    fn test_check_sdf_collision() {
        let hit = check_sdf_collision(Vec2::new(0.0, -40.0), 35.0, |p| {
            sd_box(p, Vec2::ZERO, Vec2::new(50.0, 10.0))
        });
        assert!(hit.hit);
        assert!((hit.penetration - 5.0).abs() < 1e-3);

        let miss = check_sdf_collision(Vec2::new(0.0, -60.0), 35.0, |p| {
            sd_box(p, Vec2::ZERO, Vec2::new(50.0, 10.0))
        });
        assert!(!miss.hit);
    }
}
