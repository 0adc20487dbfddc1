use std::f32::consts::TAU;

use crate::{
    digit::{ConfigurationError, Digit},
    pipelines::ColoredVertex,
};

/// Number of angular segments used to approximate the "0" ring.
pub const RING_SEGMENTS: usize = 16;
/// Vertices of the ring mesh, one outer and one inner vertex per segment.
pub const RING_VERTEX_COUNT: usize = 2 * RING_SEGMENTS;
/// Indices of the closed ring strip.
pub const RING_INDEX_COUNT: usize = 2 * RING_SEGMENTS + 2;

// Indices are stored as u8
const _: () = assert!(RING_INDEX_COUNT <= 256);

/// Uniform scale applied to both glyphs, horizontal offset included.
pub const SHRINK: f32 = 0.4;
pub const RING_OUTER_RADIUS: f32 = 0.6;
pub const RING_INNER_RADIUS: f32 = 0.4;
/// Anisotropic scale turning the ring into an ellipse.
pub const RING_SCALE: [f32; 2] = [0.9, 1.3];

pub const ONE_COLOR: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
pub const ZERO_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// Unscaled outline of the "1" glyph: a thin bar (vertices 0..4) and the flag tip (vertex 4).
const ONE_OUTLINE: [[f32; 2]; 5] = [
    [-0.15, 0.77],
    [-0.15, -0.77],
    [0.15, 0.77],
    [0.15, -0.77],
    [-0.4, 0.35],
];
const ONE_INDICES: [u8; 9] = [0, 1, 2, 1, 3, 2, 0, 2, 4];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Topology {
    TriangleList,
    TriangleStrip,
}

impl Topology {
    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }
}

/// Geometry of one clock digit, in normalized device coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitMesh {
    pub vertices: Vec<ColoredVertex>,
    pub indices: Vec<u8>,
    pub topology: Topology,
}

impl DigitMesh {
    pub fn triangle_count(&self) -> usize {
        match self.topology {
            Topology::TriangleList => self.indices.len() / 3,
            Topology::TriangleStrip => self.indices.len().saturating_sub(2),
        }
    }

    /// Indices widened for upload, wgpu has no 8-bit index format.
    pub fn indices_u16(&self) -> Vec<u16> {
        self.indices.iter().map(|&i| i as u16).collect()
    }
}

/// Builds the mesh for `digit` shifted horizontally by `x_offset` (before shrinking).
pub fn build_digit_mesh(digit: Digit, x_offset: f32) -> DigitMesh {
    match digit {
        Digit::One => build_one(x_offset),
        Digit::Zero => build_ring(x_offset),
    }
}

/// Like [`build_digit_mesh`], validating a raw bit value first.
pub fn build_digit_mesh_from_value(value: u32, x_offset: f32) -> Result<DigitMesh, ConfigurationError> {
    let digit = Digit::try_from(value)?;
    Ok(build_digit_mesh(digit, x_offset))
}

fn build_one(x_offset: f32) -> DigitMesh {
    let vertices = ONE_OUTLINE
        .iter()
        .map(|&[x, y]| ColoredVertex::new_2d([(x + x_offset) * SHRINK, y * SHRINK], ONE_COLOR))
        .collect();
    DigitMesh {
        vertices,
        indices: ONE_INDICES.to_vec(),
        topology: Topology::TriangleList,
    }
}

fn build_ring(x_offset: f32) -> DigitMesh {
    let step = TAU / RING_SEGMENTS as f32;
    let ring_vertex = |radius: f32, angle: f32| {
        ColoredVertex::new_2d(
            [
                (radius * angle.cos() * RING_SCALE[0] + x_offset) * SHRINK,
                radius * angle.sin() * RING_SCALE[1] * SHRINK,
            ],
            ZERO_COLOR,
        )
    };

    // Outer vertices first, then inner ones
    let outer = (0..RING_SEGMENTS).map(|i| ring_vertex(RING_OUTER_RADIUS, i as f32 * step));
    let inner = (0..RING_SEGMENTS).map(|i| ring_vertex(RING_INNER_RADIUS, i as f32 * step));
    let vertices = outer.chain(inner).collect::<Vec<_>>();

    let mut indices = Vec::with_capacity(RING_INDEX_COUNT);
    for i in 0..RING_SEGMENTS {
        indices.push(i as u8);
        indices.push((i + RING_SEGMENTS) as u8);
    }
    // Close the strip back onto the first segment
    indices.push(0);
    indices.push(RING_SEGMENTS as u8);

    DigitMesh {
        vertices,
        indices,
        topology: Topology::TriangleStrip,
    }
}
