//! Vertex layouts stored in baked meshes.

use bytemuck::{Pod, Zeroable};

use crate::math::Vec3;

/// Position, normal, color and UV, each stored as four `f32` lanes.
///
/// Unused lanes (position.w, normal.w, color.a, uv.zw) are zero.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct VertexPncvF32 {
    /// Object-space position.
    pub position: [f32; 4],
    /// Vertex normal.
    pub normal: [f32; 4],
    /// Linear RGB color.
    pub color: [f32; 4],
    /// Texture coordinates.
    pub uv: [f32; 4],
}

impl VertexPncvF32 {
    /// Size of one vertex in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Creates a vertex from its meaningful components.
    #[must_use]
    pub const fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position: [position[0], position[1], position[2], 0.0],
            normal: [normal[0], normal[1], normal[2], 0.0],
            color: [color[0], color[1], color[2], 0.0],
            uv: [uv[0], uv[1], 0.0, 0.0],
        }
    }

    /// Returns the position as a vector.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        Vec3::from_xyz(self.position)
    }

    /// Returns the normal as a vector.
    #[inline]
    #[must_use]
    pub const fn normal(&self) -> Vec3 {
        Vec3::from_xyz(self.normal)
    }

    /// Overwrites the xyz lanes of the normal.
    #[inline]
    pub fn set_normal(&mut self, normal: Vec3) {
        self.normal[0] = normal.x;
        self.normal[1] = normal.y;
        self.normal[2] = normal.z;
    }
}

/// Vertex layout tag written into mesh metadata.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// Unrecognized layout. Never treat as a valid layout.
    #[default]
    Unknown,
    /// [`VertexPncvF32`]: every attribute at 32 bits.
    PncvF32,
}

impl VertexFormat {
    /// Parses a metadata token. Unrecognized tokens map to `Unknown`.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token {
            "PNCV_F32" => Self::PncvF32,
            _ => Self::Unknown,
        }
    }

    /// Returns the metadata token.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::PncvF32 => "PNCV_F32",
        }
    }

    /// Size of one vertex in bytes, if the layout is known.
    #[must_use]
    pub const fn stride(self) -> Option<usize> {
        match self {
            Self::Unknown => None,
            Self::PncvF32 => Some(VertexPncvF32::SIZE),
        }
    }
}
