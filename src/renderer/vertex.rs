//! Vertex type for 2D rendering

use bytemuck::{Pod, Zeroable};

/// 2D vertex in screen pixels (y down) with an RGBA color
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

/// Fixed overlay colors
pub mod colors {
    use crate::catalog::rgb;

    /// Cow patches and head
    pub const COW_MARKINGS: [f32; 4] = rgb(0x3e2723);
    /// Gloss stops over the player car (top, 30%, bottom)
    pub const GLOSS_TOP: [f32; 4] = [1.0, 1.0, 1.0, 0.4];
    pub const GLOSS_MID: [f32; 4] = [1.0, 1.0, 1.0, 0.15];
    pub const GLOSS_BOTTOM: [f32; 4] = [1.0, 1.0, 1.0, 0.0];
    /// Cockpit letterbox
    pub const LETTERBOX: [f32; 4] = [0.0, 0.0, 0.0, 0.35];
    /// Clear color behind everything
    pub const CLEAR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
}
