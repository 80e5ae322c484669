//! Shape generation for 2D primitives
//!
//! All output is in viewport pixels; the pipeline maps to NDC.

use glam::Vec2;
use std::f32::consts::PI;

use super::vertex::Vertex;

/// Segments used for the ball and round line caps
pub const CIRCLE_SEGMENTS: u32 = 32;

fn push_quad(vertices: &mut Vec<Vertex>, corners: [Vec2; 4], color: [f32; 4]) {
    let [a, b, c, d] = corners;
    for p in [a, b, c, c, b, d] {
        vertices.push(Vertex::new(p.x, p.y, color));
    }
}

/// Generate vertices for an axis-aligned filled rectangle
pub fn rect(center: Vec2, half_extents: Vec2, color: [f32; 4]) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(6);
    let min = center - half_extents;
    let max = center + half_extents;
    push_quad(
        &mut vertices,
        [
            min,
            Vec2::new(max.x, min.y),
            Vec2::new(min.x, max.y),
            max,
        ],
        color,
    );
    vertices
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }

    vertices
}

/// Generate vertices for a thick polyline with round joins and caps
pub fn polyline(points: &[Vec2], width: f32, color: [f32; 4]) -> Vec<Vertex> {
    if points.len() < 2 {
        return Vec::new();
    }

    let half = width / 2.0;
    let mut vertices = Vec::with_capacity(points.len() * 6 + points.len() * 24);

    for pair in points.windows(2) {
        let (p1, p2) = (pair[0], pair[1]);
        let dir = (p2 - p1).normalize_or_zero();
        // Perpendicular for width
        let perp = Vec2::new(-dir.y, dir.x) * half;
        push_quad(
            &mut vertices,
            [p1 + perp, p1 - perp, p2 + perp, p2 - perp],
            color,
        );
    }

    // Small discs at every vertex round off joins and both caps
    for p in points {
        vertices.extend(circle(*p, half, color, 8));
    }

    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_covers_extents() {
        let v = rect(Vec2::new(10.0, 20.0), Vec2::new(5.0, 2.0), [1.0; 4]);
        assert_eq!(v.len(), 6);
        let xs: Vec<f32> = v.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = v.iter().map(|v| v.position[1]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), 5.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 15.0);
        assert_eq!(ys.iter().cloned().fold(f32::MAX, f32::min), 18.0);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 22.0);
    }

    #[test]
    fn test_polyline_vertex_count() {
        let points = [Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
        let v = polyline(&points, 4.0, [1.0; 4]);
        // 2 segments * 6 + 3 joints * 8 triangles * 3
        assert_eq!(v.len(), 12 + 72);
    }

    #[test]
    fn test_degenerate_polyline_is_empty() {
        assert!(polyline(&[Vec2::ZERO], 4.0, [1.0; 4]).is_empty());
    }
}
