//! # KILN Baker
//!
//! Offline conversion of artist sources into baked containers.
//!
//! ```text
//! <input>/brick.png ──decode_image──► pack_texture ──► <output>/brick.tx
//! <input>/crate.obj ──import_obj────► build_mesh   ──► <output>/crate.mesh
//! <input>/robot.glb ──import_gltf───► build_mesh   ──► <output>/robot.mesh
//! ```
//!
//! Decoding lives here so `kiln_assets` stays importer-free. The binary is a
//! thin wrapper around [`Baker::run`].

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod import;
pub mod pipeline;

pub use config::{BakerConfig, CONFIG_FILE_NAME, DEFAULT_OUTPUT_DIR};
pub use error::{BakeError, BakeResult};
pub use import::{decode_image, import_gltf, import_obj, DecodedImage, ImportedMesh};
pub use pipeline::{
    bake_mesh, bake_texture, discover_sources, prepare_mesh, prepare_texture, write_outputs, BakeReport, BakedAsset,
    Baker, FailedAsset, PreparedOutput, SourceAsset,
};
