//! # Geometry Utilities
//!
//! Derived data computed while baking meshes.
//!
//! ## Bounds
//!
//! [`calculate_bounds`] produces an AABB-centered bounding sphere: the box
//! comes from per-axis min/max, the sphere is centered on the box midpoint
//! with the distance to the farthest vertex as radius. It is cheap and a
//! little conservative, not a minimal enclosing sphere.
//!
//! ## Normals
//!
//! [`NormalMode::Flat`] overwrites the three vertex normals of every triangle
//! with that triangle's face normal, so a vertex shared by several triangles
//! keeps the normal of the last one processed. Imported normals are always
//! discarded. [`NormalMode::Smooth`] is the explicit alternative: each vertex
//! gets the area-weighted average of its adjacent faces.

use serde::{Deserialize, Serialize};

use crate::error::{AssetError, AssetResult};
use crate::math::Vec3;
use crate::vertex::VertexPncvF32;

/// Bounding sphere and axis-aligned half-extent box of a mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshBounds {
    /// Center of both the box and the sphere.
    pub origin: [f32; 3],
    /// Sphere radius, never negative.
    pub radius: f32,
    /// Box half extents, never negative.
    pub extents: [f32; 3],
}

/// How normals are regenerated when a mesh is baked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalMode {
    /// One normal per triangle, written to all three of its vertices.
    #[default]
    Flat,
    /// Area-weighted average of the faces around each vertex.
    Smooth,
}

/// Computes the AABB-centered bounds of a vertex list.
///
/// An empty list yields zero bounds at the origin.
#[must_use]
pub fn calculate_bounds(vertices: &[VertexPncvF32]) -> MeshBounds {
    if vertices.is_empty() {
        return MeshBounds::default();
    }

    let (min, max) = vertices.iter().fold((Vec3::MAX, Vec3::MIN), |(min, max), v| {
        let p = v.position();
        (min.min(p), max.max(p))
    });

    let origin = (min + max) * 0.5;
    let extents = (max - min) * 0.5;

    let radius = vertices
        .iter()
        .map(|v| v.position().distance(origin))
        .fold(0.0f32, f32::max);

    MeshBounds {
        origin: origin.to_array(),
        radius,
        extents: extents.to_array(),
    }
}

/// Face normal of a triangle with the baker's fixed winding,
/// `normalize(cross(p2 - p0, p1 - p0))`.
///
/// Zero-area triangles give a zero normal instead of NaN.
#[must_use]
pub fn face_normal(p0: Vec3, p1: Vec3, p2: Vec3) -> Vec3 {
    (p2 - p0).cross(p1 - p0).normalize_or_zero()
}

/// Regenerates normals in the requested mode.
///
/// # Errors
///
/// See [`regenerate_face_normals`].
pub fn regenerate_normals(
    mode: NormalMode,
    vertices: &mut [VertexPncvF32],
    indices: &[u32],
) -> AssetResult<()> {
    match mode {
        NormalMode::Flat => regenerate_face_normals(vertices, indices),
        NormalMode::Smooth => regenerate_smooth_normals(vertices, indices),
    }
}

/// Overwrites every triangle's vertex normals with its face normal.
///
/// Indices are validated before anything is written, so on error the
/// vertices are untouched.
///
/// # Errors
///
/// Returns [`AssetError::IncompleteTriangle`] if `indices.len()` is not a
/// multiple of three, or [`AssetError::IndexOutOfRange`] for a dangling
/// index.
pub fn regenerate_face_normals(vertices: &mut [VertexPncvF32], indices: &[u32]) -> AssetResult<()> {
    validate_triangles(indices, vertices.len())?;

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let normal = face_normal(
            vertices[i0].position(),
            vertices[i1].position(),
            vertices[i2].position(),
        );

        vertices[i0].set_normal(normal);
        vertices[i1].set_normal(normal);
        vertices[i2].set_normal(normal);
    }

    Ok(())
}

/// Replaces the normal of every referenced vertex with the area-weighted
/// average of its adjacent face normals. Vertices no triangle references
/// keep their normal.
///
/// # Errors
///
/// Same as [`regenerate_face_normals`].
pub fn regenerate_smooth_normals(vertices: &mut [VertexPncvF32], indices: &[u32]) -> AssetResult<()> {
    validate_triangles(indices, vertices.len())?;

    let mut accumulated: Vec<Option<Vec3>> = vec![None; vertices.len()];
    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let p0 = vertices[i0].position();
        // Unnormalized, so larger faces weigh more.
        let weighted = (vertices[i2].position() - p0).cross(vertices[i1].position() - p0);

        for i in [i0, i1, i2] {
            *accumulated[i].get_or_insert(Vec3::ZERO) += weighted;
        }
    }

    for (vertex, sum) in vertices.iter_mut().zip(accumulated) {
        if let Some(sum) = sum {
            vertex.set_normal(sum.normalize_or_zero());
        }
    }

    Ok(())
}

/// Checks that `indices` form whole triangles over `vertex_count` vertices.
pub(crate) fn validate_triangles(indices: &[u32], vertex_count: usize) -> AssetResult<()> {
    if indices.len() % 3 != 0 {
        return Err(AssetError::IncompleteTriangle(indices.len()));
    }
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(AssetError::IndexOutOfRange {
            index,
            vertex_count,
        });
    }
    Ok(())
}
