//! # Asset Error Types
//!
//! All errors that can occur while reading, writing, packing or unpacking
//! baked assets.

use std::io;

use thiserror::Error;

/// Errors that can occur in the asset codecs.
#[derive(Error, Debug)]
pub enum AssetError {
    /// The file could not be opened, created, read or written.
    ///
    /// Missing assets are expected while content is being authored, so this
    /// is a plain error value and never a panic.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The container bytes do not match what the header declares.
    #[error("corrupt container: {reason}")]
    CorruptContainer {
        /// What was wrong with the file.
        reason: String,
    },

    /// The container holds a different kind of asset than requested.
    #[error("kind mismatch: expected {expected:?}, found {found:?}")]
    KindMismatch {
        /// The tag the codec expected.
        expected: [u8; 4],
        /// The tag found in the file.
        found: [u8; 4],
    },

    /// The container was written with a schema this build cannot read.
    #[error("unsupported {kind:?} version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Kind tag of the container.
        kind: [u8; 4],
        /// Version this build reads.
        expected: u32,
        /// Version found in the file.
        found: u32,
    },

    /// The metadata document could not be encoded or decoded.
    #[error("invalid metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    /// The texture format is `Unknown`, so its pixel size is not known.
    #[error("unknown texture format")]
    UnknownTextureFormat,

    /// The vertex format is `Unknown`, so its stride is not known.
    #[error("unknown vertex format")]
    UnknownVertexFormat,

    /// A buffer does not have the size the descriptor declares.
    #[error("{what}: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch {
        /// Which buffer was wrong.
        what: &'static str,
        /// Size required by the descriptor.
        expected: u64,
        /// Size actually supplied.
        actual: u64,
    },

    /// A metadata or payload section is too large for a u32 length field.
    #[error("{section} section too large: {len} bytes")]
    SectionTooLarge {
        /// Which section overflowed.
        section: &'static str,
        /// Its length in bytes.
        len: usize,
    },

    /// The block compressor rejected its input.
    #[error("compression failed: {0}")]
    Compression(String),

    /// The compressed stream is malformed or does not decode to the
    /// declared size.
    #[error("decompression failed: {0}")]
    Decompression(String),

    /// A triangle references a vertex that does not exist.
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// The offending index value.
        index: u32,
        /// Number of vertices available.
        vertex_count: usize,
    },

    /// The index list length is not a multiple of three.
    #[error("index count {0} is not a multiple of 3")]
    IncompleteTriangle(usize),

    /// The mesh descriptor is internally inconsistent.
    #[error("invalid mesh info: {0}")]
    InvalidMeshInfo(String),
}

impl AssetError {
    /// Shorthand for a [`AssetError::CorruptContainer`] error.
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptContainer {
            reason: reason.into(),
        }
    }
}

/// Result type for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;
