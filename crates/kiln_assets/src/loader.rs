//! # Loader
//!
//! Renderer-side entry points: read a baked file, parse its metadata and
//! unpack the payload in one call.

use std::path::Path;

use crate::container::load_binary_file;
use crate::error::{AssetError, AssetResult};
use crate::geometry::validate_triangles;
use crate::mesh::{read_mesh_info, unpack_mesh_to_vecs, MeshInfo};
use crate::texture::{read_texture_info, unpack_texture_to_vec, TextureInfo};
use crate::vertex::VertexPncvF32;

/// A texture ready for upload.
#[derive(Clone, Debug)]
pub struct LoadedTexture {
    /// Parsed metadata.
    pub info: TextureInfo,
    /// Decompressed pixels, exactly `info.texture_size` bytes.
    pub pixels: Vec<u8>,
}

/// A mesh ready for upload.
#[derive(Clone, Debug)]
pub struct LoadedMesh {
    /// Parsed metadata.
    pub info: MeshInfo,
    /// Typed vertices.
    pub vertices: Vec<VertexPncvF32>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
}

impl LoadedMesh {
    /// Expands the indexed mesh into one vertex per index.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::IncompleteTriangle`] or
    /// [`AssetError::IndexOutOfRange`] if the indices were modified after
    /// loading and no longer describe whole triangles.
    pub fn triangle_list(&self) -> AssetResult<Vec<VertexPncvF32>> {
        validate_triangles(&self.indices, self.vertices.len())?;
        Ok(self.indices.iter().map(|&i| self.vertices[i as usize]).collect())
    }

    /// Number of triangles.
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Loads a baked texture and decompresses its pixels.
///
/// # Errors
///
/// Propagates container, metadata and decompression errors. Returns
/// [`AssetError::UnknownTextureFormat`] for an unrecognized format and
/// [`AssetError::BufferSizeMismatch`] if the declared size disagrees with
/// the dimensions.
pub fn load_texture(path: impl AsRef<Path>) -> AssetResult<LoadedTexture> {
    let path = path.as_ref();
    let file = load_binary_file(path)?;
    let info = read_texture_info(&file)?;

    let expected = info.expected_size().ok_or(AssetError::UnknownTextureFormat)?;
    if info.texture_size != expected {
        return Err(AssetError::BufferSizeMismatch {
            what: "declared texture size",
            expected,
            actual: info.texture_size,
        });
    }
    let pixels = unpack_texture_to_vec(&info, file.payload())?;

    tracing::debug!(
        "Loaded texture {} ({}x{}, {})",
        path.display(),
        info.width,
        info.height,
        info.compression.name()
    );

    Ok(LoadedTexture { info, pixels })
}

/// Loads a baked mesh and decodes its buffers.
///
/// # Errors
///
/// Propagates container and metadata errors, and rejects metadata that
/// breaks the mesh size invariants or indices past the vertex buffer.
pub fn load_mesh(path: impl AsRef<Path>) -> AssetResult<LoadedMesh> {
    let path = path.as_ref();
    let file = load_binary_file(path)?;
    let info = read_mesh_info(&file)?;
    info.validate()?;

    let (vertex_bytes, index_bytes) = unpack_mesh_to_vecs(&info, file.payload())?;
    let vertices = info.vertices_from_bytes(&vertex_bytes)?;
    let indices = info.indices_from_bytes(&index_bytes)?;
    validate_triangles(&indices, vertices.len())?;

    tracing::debug!(
        "Loaded mesh {} ({} vertices, {} faces)",
        path.display(),
        info.vertex_count,
        info.face_count
    );

    Ok(LoadedMesh {
        info,
        vertices,
        indices,
    })
}
