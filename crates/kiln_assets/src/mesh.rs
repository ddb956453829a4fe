//! # Mesh Codec
//!
//! Packs vertex and index buffers into `MESH` containers and back.
//!
//! ## Payload
//!
//! ```text
//! [vertex_buffer_size bytes: vertices, Pod layout]
//! [index_buffer_size bytes:  u32 little-endian indices]
//! ```
//!
//! There is no separator; the boundary is `vertex_buffer_size` from the
//! metadata. Buffers are the in-memory Pod bytes, which on every supported
//! target are little-endian. Mesh payloads are never compressed, they are uploaded as-is.
//!
//! ## Metadata
//!
//! ```text
//! {
//!   "vertex_buffer_size": 1536, "vertex_count": 24, "face_count": 12,
//!   "index_buffer_size": 144, "index_count": 36, "index_size": 4,
//!   "vertex_format": "PNCV_F32",
//!   "bounds": { "origin": [0,0,0], "radius": 1.73, "extents": [1,1,1] },
//!   "original_file": "models/cube.obj"
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::container::{AssetFile, AssetKind};
use crate::error::{AssetError, AssetResult};
use crate::geometry::{calculate_bounds, regenerate_normals, MeshBounds, NormalMode};
use crate::vertex::{VertexFormat, VertexPncvF32};

/// Current mesh schema version.
pub const MESH_VERSION: u32 = 1;

/// Byte width of one index. Indices are always `u32`.
pub const INDEX_SIZE: u8 = 4;

/// Parsed mesh metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshInfo {
    /// Size of the vertex buffer in bytes.
    pub vertex_buffer_size: u64,
    /// Number of vertices.
    pub vertex_count: u32,
    /// Number of triangles.
    pub face_count: u32,
    /// Size of the index buffer in bytes.
    pub index_buffer_size: u64,
    /// Number of indices, three per triangle.
    pub index_count: u32,
    /// Bytes per index.
    pub index_size: u8,
    /// Bounding volumes of the vertex positions.
    pub bounds: MeshBounds,
    /// Vertex layout.
    pub vertex_format: VertexFormat,
    /// Source file the mesh was baked from. Diagnostic only.
    pub original_file: String,
}

impl MeshInfo {
    /// Describes a triangle mesh and derives the buffer sizes.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::UnknownVertexFormat`] for an `Unknown` layout
    /// and [`AssetError::IncompleteTriangle`] if `index_count` is not a
    /// multiple of three.
    pub fn new(
        vertex_format: VertexFormat,
        vertex_count: u32,
        index_count: u32,
        bounds: MeshBounds,
        original_file: impl Into<String>,
    ) -> AssetResult<Self> {
        let stride = vertex_format.stride().ok_or(AssetError::UnknownVertexFormat)?;
        if index_count % 3 != 0 {
            return Err(AssetError::IncompleteTriangle(index_count as usize));
        }

        Ok(Self {
            vertex_buffer_size: u64::from(vertex_count) * stride as u64,
            vertex_count,
            face_count: index_count / 3,
            index_buffer_size: u64::from(index_count) * u64::from(INDEX_SIZE),
            index_count,
            index_size: INDEX_SIZE,
            bounds,
            vertex_format,
            original_file: original_file.into(),
        })
    }

    /// Checks the size invariants between counts, formats and byte sizes.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::UnknownVertexFormat`] or
    /// [`AssetError::InvalidMeshInfo`] naming the broken invariant.
    pub fn validate(&self) -> AssetResult<()> {
        let stride = self.vertex_format.stride().ok_or(AssetError::UnknownVertexFormat)?;

        if self.vertex_buffer_size != u64::from(self.vertex_count) * stride as u64 {
            return Err(AssetError::InvalidMeshInfo(format!(
                "vertex buffer is {} bytes but {} vertices of {} need {}",
                self.vertex_buffer_size,
                self.vertex_count,
                self.vertex_format.name(),
                u64::from(self.vertex_count) * stride as u64
            )));
        }
        if self.index_size != INDEX_SIZE {
            return Err(AssetError::InvalidMeshInfo(format!(
                "index size {} is not supported",
                self.index_size
            )));
        }
        if self.index_buffer_size != u64::from(self.index_count) * u64::from(self.index_size) {
            return Err(AssetError::InvalidMeshInfo(format!(
                "index buffer is {} bytes but {} indices need {}",
                self.index_buffer_size,
                self.index_count,
                u64::from(self.index_count) * u64::from(self.index_size)
            )));
        }
        if u64::from(self.index_count) != u64::from(self.face_count) * 3 {
            return Err(AssetError::InvalidMeshInfo(format!(
                "{} indices do not make {} triangles",
                self.index_count, self.face_count
            )));
        }
        Ok(())
    }

    /// Decodes an unpacked vertex buffer into typed vertices.
    ///
    /// The input needs no particular alignment.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::UnknownVertexFormat`] or
    /// [`AssetError::BufferSizeMismatch`].
    pub fn vertices_from_bytes(&self, bytes: &[u8]) -> AssetResult<Vec<VertexPncvF32>> {
        if self.vertex_format != VertexFormat::PncvF32 {
            return Err(AssetError::UnknownVertexFormat);
        }
        expect_len("vertex buffer", self.vertex_buffer_size, bytes.len())?;
        Ok(bytemuck::pod_collect_to_vec(bytes))
    }

    /// Decodes an unpacked index buffer.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::BufferSizeMismatch`] if `bytes` is not the
    /// declared index buffer size.
    pub fn indices_from_bytes(&self, bytes: &[u8]) -> AssetResult<Vec<u32>> {
        expect_len("index buffer", self.index_buffer_size, bytes.len())?;
        Ok(bytemuck::pod_collect_to_vec(bytes))
    }
}

/// On-disk shape of the metadata document.
#[derive(Serialize, Deserialize)]
struct MeshMetadata {
    vertex_buffer_size: u64,
    vertex_count: u32,
    face_count: u32,
    index_buffer_size: u64,
    index_count: u32,
    index_size: u8,
    vertex_format: String,
    bounds: MeshBounds,
    original_file: String,
}

/// Packs pre-serialized vertex and index buffers into a mesh container.
///
/// # Errors
///
/// Returns an error if `info` breaks its own invariants or a buffer does
/// not have the declared size.
pub fn pack_mesh(info: &MeshInfo, vertex_data: &[u8], index_data: &[u8]) -> AssetResult<AssetFile> {
    info.validate()?;
    expect_len("vertex buffer", info.vertex_buffer_size, vertex_data.len())?;
    expect_len("index buffer", info.index_buffer_size, index_data.len())?;

    let metadata = serde_json::to_string(&MeshMetadata {
        vertex_buffer_size: info.vertex_buffer_size,
        vertex_count: info.vertex_count,
        face_count: info.face_count,
        index_buffer_size: info.index_buffer_size,
        index_count: info.index_count,
        index_size: info.index_size,
        vertex_format: info.vertex_format.name().to_string(),
        bounds: info.bounds,
        original_file: info.original_file.clone(),
    })?;

    let mut payload = Vec::with_capacity(vertex_data.len() + index_data.len());
    payload.extend_from_slice(vertex_data);
    payload.extend_from_slice(index_data);

    tracing::debug!(
        "Packed mesh {} ({} vertices, {} faces, {} bytes)",
        info.original_file,
        info.vertex_count,
        info.face_count,
        payload.len()
    );

    Ok(AssetFile::new(AssetKind::Mesh.tag(), MESH_VERSION, metadata, payload))
}

/// Parses the mesh metadata of a container.
///
/// The result is not validated; an unrecognized vertex format comes back as
/// [`VertexFormat::Unknown`].
///
/// # Errors
///
/// Returns a kind/version error for a container that is not a current mesh,
/// or [`AssetError::Metadata`] if the document is malformed.
pub fn read_mesh_info(file: &AssetFile) -> AssetResult<MeshInfo> {
    file.expect_kind(AssetKind::Mesh, MESH_VERSION)?;
    let meta: MeshMetadata = serde_json::from_str(file.metadata())?;

    Ok(MeshInfo {
        vertex_buffer_size: meta.vertex_buffer_size,
        vertex_count: meta.vertex_count,
        face_count: meta.face_count,
        index_buffer_size: meta.index_buffer_size,
        index_count: meta.index_count,
        index_size: meta.index_size,
        bounds: meta.bounds,
        vertex_format: VertexFormat::parse(&meta.vertex_format),
        original_file: meta.original_file,
    })
}

/// Splits a mesh payload into its vertex and index buffers.
///
/// Both outputs must be exactly the declared sizes and the payload must be
/// exactly their sum.
///
/// # Errors
///
/// Returns [`AssetError::BufferSizeMismatch`] naming the wrong buffer.
pub fn unpack_mesh(
    info: &MeshInfo,
    payload: &[u8],
    vertex_out: &mut [u8],
    index_out: &mut [u8],
) -> AssetResult<()> {
    expect_len(
        "mesh payload",
        info.vertex_buffer_size.saturating_add(info.index_buffer_size),
        payload.len(),
    )?;
    expect_len("vertex output", info.vertex_buffer_size, vertex_out.len())?;
    expect_len("index output", info.index_buffer_size, index_out.len())?;

    let (vertices, indices) = payload.split_at(vertex_out.len());
    vertex_out.copy_from_slice(vertices);
    index_out.copy_from_slice(indices);
    Ok(())
}

/// Splits a mesh payload into newly allocated vertex and index buffers.
///
/// # Errors
///
/// Same as [`unpack_mesh`].
pub fn unpack_mesh_to_vecs(info: &MeshInfo, payload: &[u8]) -> AssetResult<(Vec<u8>, Vec<u8>)> {
    expect_len(
        "mesh payload",
        info.vertex_buffer_size.saturating_add(info.index_buffer_size),
        payload.len(),
    )?;

    let vertex_len = info.vertex_buffer_size as usize;
    let mut vertices = vec![0u8; vertex_len];
    let mut indices = vec![0u8; payload.len() - vertex_len];
    unpack_mesh(info, payload, &mut vertices, &mut indices)?;
    Ok((vertices, indices))
}

/// Bakes a triangle mesh: regenerates normals, computes bounds and packs.
///
/// `vertices` is updated in place with the regenerated normals, so imported
/// normals are always replaced.
///
/// # Errors
///
/// Returns an error for invalid indices or a mesh too large for the
/// format's u32 counts.
pub fn build_mesh(
    vertices: &mut [VertexPncvF32],
    indices: &[u32],
    original_file: impl Into<String>,
    normal_mode: NormalMode,
) -> AssetResult<AssetFile> {
    regenerate_normals(normal_mode, vertices, indices)?;
    let bounds = calculate_bounds(vertices);

    let vertex_count = u32::try_from(vertices.len())
        .map_err(|_| AssetError::InvalidMeshInfo(format!("{} vertices exceed u32", vertices.len())))?;
    let index_count = u32::try_from(indices.len())
        .map_err(|_| AssetError::InvalidMeshInfo(format!("{} indices exceed u32", indices.len())))?;

    let info = MeshInfo::new(
        VertexFormat::PncvF32,
        vertex_count,
        index_count,
        bounds,
        original_file,
    )?;
    pack_mesh(
        &info,
        bytemuck::cast_slice::<VertexPncvF32, u8>(vertices),
        bytemuck::cast_slice::<u32, u8>(indices),
    )
}

fn expect_len(what: &'static str, expected: u64, actual: usize) -> AssetResult<()> {
    if expected == actual as u64 {
        Ok(())
    } else {
        Err(AssetError::BufferSizeMismatch {
            what,
            expected,
            actual: actual as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> (Vec<VertexPncvF32>, Vec<u32>) {
        let vertices = vec![
            VertexPncvF32::new([0.0, 0.0, 0.0], [0.0; 3], [1.0, 0.0, 0.0], [0.0, 0.0]),
            VertexPncvF32::new([1.0, 0.0, 0.0], [0.0; 3], [0.0, 1.0, 0.0], [1.0, 0.0]),
            VertexPncvF32::new([1.0, 1.0, 0.0], [0.0; 3], [0.0, 0.0, 1.0], [1.0, 1.0]),
            VertexPncvF32::new([0.0, 1.0, 0.0], [0.0; 3], [1.0, 1.0, 1.0], [0.0, 1.0]),
        ];
        (vertices, vec![0, 1, 2, 0, 2, 3])
    }

    #[test]
    fn test_build_and_unpack_quad() {
        let (mut vertices, indices) = quad();
        let file = build_mesh(&mut vertices, &indices, "quad.obj", NormalMode::Flat).unwrap();
        assert_eq!(file.kind(), *b"MESH");

        let info = read_mesh_info(&file).unwrap();
        assert_eq!(info.vertex_count, 4);
        assert_eq!(info.face_count, 2);
        assert_eq!(info.index_count, 6);
        assert_eq!(info.vertex_buffer_size, 4 * 64);
        assert_eq!(info.index_buffer_size, 6 * 4);
        assert_eq!(info.vertex_format, VertexFormat::PncvF32);
        assert_eq!(info.bounds.origin, [0.5, 0.5, 0.0]);
        assert!(info.validate().is_ok());

        let (vb, ib) = unpack_mesh_to_vecs(&info, file.payload()).unwrap();
        assert_eq!(info.vertices_from_bytes(&vb).unwrap(), vertices);
        assert_eq!(info.indices_from_bytes(&ib).unwrap(), indices);

        // Flat normals of a CCW quad in the XY plane point down -Z.
        for v in &vertices {
            assert_eq!(v.normal[2], -1.0);
        }
    }

    #[test]
    fn test_payload_layout_is_vertices_then_indices() {
        let (mut vertices, indices) = quad();
        let file = build_mesh(&mut vertices, &indices, "quad.obj", NormalMode::Flat).unwrap();

        let split = 4 * VertexPncvF32::SIZE;
        assert_eq!(&file.payload()[..split], bytemuck::cast_slice::<VertexPncvF32, u8>(&vertices));
        assert_eq!(&file.payload()[split..], bytemuck::cast_slice::<u32, u8>(&indices));
        assert_eq!(&file.payload()[split..split + 4], &0u32.to_le_bytes());
    }

    #[test]
    fn test_metadata_keys() {
        let (mut vertices, indices) = quad();
        let file = build_mesh(&mut vertices, &indices, "quad.obj", NormalMode::Flat).unwrap();
        let doc: serde_json::Value = serde_json::from_str(file.metadata()).unwrap();

        for key in [
            "vertex_buffer_size",
            "vertex_count",
            "face_count",
            "index_buffer_size",
            "index_count",
            "index_size",
            "vertex_format",
            "original_file",
        ] {
            assert!(doc.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(doc["vertex_format"], "PNCV_F32");
        assert!(doc["bounds"]["origin"].is_array());
        assert!(doc["bounds"]["radius"].is_number());
        assert!(doc["bounds"]["extents"].is_array());
    }

    #[test]
    fn test_pack_rejects_wrong_buffer_sizes() {
        let info = MeshInfo::new(VertexFormat::PncvF32, 1, 3, MeshBounds::default(), "x").unwrap();
        assert!(matches!(
            pack_mesh(&info, &[0u8; 63], &[0u8; 12]),
            Err(AssetError::BufferSizeMismatch { what: "vertex buffer", .. })
        ));
        assert!(matches!(
            pack_mesh(&info, &[0u8; 64], &[0u8; 8]),
            Err(AssetError::BufferSizeMismatch { what: "index buffer", .. })
        ));
    }

    #[test]
    fn test_validate_catches_inconsistent_info() {
        let mut info = MeshInfo::new(VertexFormat::PncvF32, 2, 3, MeshBounds::default(), "x").unwrap();
        info.vertex_buffer_size += 1;
        assert!(matches!(info.validate(), Err(AssetError::InvalidMeshInfo(_))));

        let mut info = MeshInfo::new(VertexFormat::PncvF32, 2, 3, MeshBounds::default(), "x").unwrap();
        info.vertex_format = VertexFormat::Unknown;
        assert!(matches!(info.validate(), Err(AssetError::UnknownVertexFormat)));

        assert!(matches!(
            MeshInfo::new(VertexFormat::PncvF32, 2, 4, MeshBounds::default(), "x"),
            Err(AssetError::IncompleteTriangle(4))
        ));
    }

    #[test]
    fn test_unpack_checks_output_sizes() {
        let (mut vertices, indices) = quad();
        let file = build_mesh(&mut vertices, &indices, "quad.obj", NormalMode::Flat).unwrap();
        let info = read_mesh_info(&file).unwrap();

        let mut vb = vec![0u8; 4 * 64];
        let mut short_ib = vec![0u8; 20];
        assert!(matches!(
            unpack_mesh(&info, file.payload(), &mut vb, &mut short_ib),
            Err(AssetError::BufferSizeMismatch { what: "index output", .. })
        ));

        let mut ib = vec![0u8; 24];
        let truncated = &file.payload()[..file.payload().len() - 1];
        assert!(matches!(
            unpack_mesh(&info, truncated, &mut vb, &mut ib),
            Err(AssetError::BufferSizeMismatch { what: "mesh payload", .. })
        ));
    }

    #[test]
    fn test_unknown_vertex_format_is_sentinel() {
        let (mut vertices, indices) = quad();
        let file = build_mesh(&mut vertices, &indices, "quad.obj", NormalMode::Flat).unwrap();
        let patched = file.metadata().replace("PNCV_F32", "P32N8C8V16");
        let file = AssetFile::new(file.kind(), file.version(), patched, file.payload().to_vec());

        let info = read_mesh_info(&file).unwrap();
        assert_eq!(info.vertex_format, VertexFormat::Unknown);
        assert!(matches!(
            info.vertices_from_bytes(&[0u8; 256]),
            Err(AssetError::UnknownVertexFormat)
        ));
    }

    #[test]
    fn test_build_rejects_bad_indices() {
        let (mut vertices, _) = quad();
        assert!(matches!(
            build_mesh(&mut vertices, &[0, 1, 7], "bad.obj", NormalMode::Flat),
            Err(AssetError::IndexOutOfRange { index: 7, .. })
        ));
    }
}
