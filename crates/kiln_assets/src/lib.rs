//! # KILN Assets
//!
//! Baked asset containers and the codecs that fill them.
//!
//! ## Layers
//!
//! ```text
//! loader ──► texture / mesh codecs ──► container
//!                  │         │
//!            compression   geometry
//! ```
//!
//! - [`container`]: typed, versioned, length-prefixed envelope on disk
//! - [`texture`]: RGBA8 pixels, optionally LZ4 block compressed
//! - [`mesh`]: vertex and index buffers with bounds
//! - [`loader`]: read, parse and unpack in one call for the renderer
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on a GPU API or an image/model importer.
//! Importers live in `kiln_baker`, upload lives in the renderer.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod compression;
pub mod container;
pub mod error;
pub mod geometry;
pub mod loader;
pub mod math;
pub mod mesh;
pub mod texture;
pub mod vertex;

pub use compression::{BlockCompressor, Lz4Block};
pub use container::{load_binary_file, save_binary_file, AssetFile, AssetKind, ContainerHeader, HEADER_SIZE};
pub use error::{AssetError, AssetResult};
pub use geometry::{calculate_bounds, regenerate_normals, MeshBounds, NormalMode};
pub use loader::{load_mesh, load_texture, LoadedMesh, LoadedTexture};
pub use math::Vec3;
pub use mesh::{build_mesh, pack_mesh, read_mesh_info, unpack_mesh, unpack_mesh_to_vecs, MeshInfo, MESH_VERSION};
pub use texture::{
    pack_texture, read_texture_info, unpack_texture, unpack_texture_to_vec, CompressionMode, TextureFormat,
    TextureInfo, TEXTURE_VERSION,
};
pub use vertex::{VertexFormat, VertexPncvF32};
