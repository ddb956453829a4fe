//! # Baker Error Types
//!
//! Everything that can go wrong while baking one source file or setting up
//! a batch.

use std::io;
use std::path::PathBuf;

use kiln_assets::AssetError;
use thiserror::Error;

/// Errors that can occur in the baker.
#[derive(Error, Debug)]
pub enum BakeError {
    /// Packing or writing a container failed.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    /// The image decoder rejected a texture source.
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    /// The OBJ importer rejected a mesh source.
    #[error("obj import failed: {0}")]
    Obj(#[from] tobj::LoadError),

    /// The glTF importer rejected a mesh source.
    #[error("gltf import failed: {0}")]
    Gltf(#[from] gltf::Error),

    /// The configuration file is not valid TOML for [`BakerConfig`](crate::BakerConfig).
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A directory or config file could not be read or created.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// A mesh source holds no triangles.
    #[error("no triangles in {}", .0.display())]
    EmptyMesh(PathBuf),

    /// Another source already bakes into the same output file.
    #[error("{} is already baked from {}", .output.display(), .first.display())]
    OutputCollision {
        /// The contested output file.
        output: PathBuf,
        /// The source that claimed it first, in discovery order.
        first: PathBuf,
    },

    /// The worker pool could not be started.
    #[error("worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for baker operations.
pub type BakeResult<T> = Result<T, BakeError>;
