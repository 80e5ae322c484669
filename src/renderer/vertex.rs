//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// `0xRRGGBB` to linear-ish RGBA floats
pub const fn rgb(hex: u32) -> [f32; 4] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        1.0,
    ]
}

/// Colors for game elements
pub mod colors {
    use super::rgb;

    pub const BACKGROUND: [f32; 4] = rgb(0xf0f9ff);
    pub const HANDLE: [f32; 4] = rgb(0x8b4513);
    pub const CUP: [f32; 4] = rgb(0xa0522d);
    pub const SPIKE: [f32; 4] = rgb(0xcd853f);
    pub const BALL: [f32; 4] = rgb(0xdc143c);
    pub const STRING_SLACK: [f32; 4] = rgb(0x999999);
    pub const STRING_TAUT: [f32; 4] = rgb(0x555555);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_hex() {
        assert_eq!(rgb(0xff0000), [1.0, 0.0, 0.0, 1.0]);
        let c = colors::BALL;
        assert!((c[0] - 220.0 / 255.0).abs() < 1e-6);
        assert!((c[2] - 60.0 / 255.0).abs() < 1e-6);
    }
}
