use bytemuck::{Pod, Zeroable};

/// A vertex with a homogeneous position at shader location 0 and an RGBA color at location 1.
#[repr(C)]
#[derive(Default, Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ColoredVertex {
    pub position: [f32; 4],
    pub color: [f32; 4],
}

impl ColoredVertex {
    pub fn new_2d(pos: [f32; 2], color: [f32; 4]) -> ColoredVertex {
        ColoredVertex {
            position: [pos[0], pos[1], 0.0, 1.0],
            color,
        }
    }

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ColoredVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: POSITION_LOCATION,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: COLOR_LOCATION,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Shader input slot of the `position` attribute.
pub const POSITION_LOCATION: u32 = 0;
/// Shader input slot of the `color` attribute.
pub const COLOR_LOCATION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_shader_slots() {
        let desc = ColoredVertex::desc();
        assert_eq!(desc.array_stride, 32);
        assert_eq!(desc.attributes.len(), 2);
        assert_eq!(desc.attributes[0].shader_location, 0);
        assert_eq!(desc.attributes[0].offset, 0);
        assert_eq!(desc.attributes[1].shader_location, 1);
        assert_eq!(desc.attributes[1].offset, 16);
        assert!(desc
            .attributes
            .iter()
            .all(|a| a.format == wgpu::VertexFormat::Float32x4));
    }

    #[test]
    fn new_2d_fills_z_and_w() {
        let v = ColoredVertex::new_2d([0.5, -0.25], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(v.position, [0.5, -0.25, 0.0, 1.0]);
    }
}
