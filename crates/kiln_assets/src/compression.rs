//! # Block Compression
//!
//! Stateless block compressors used by the texture codec.
//!
//! Payloads are stored as raw blocks with no size prefix. The uncompressed
//! size lives in the asset metadata, so the decoder always knows exactly how
//! large its destination must be.

use crate::error::{AssetError, AssetResult};

/// A stateless block compressor.
///
/// Implementations hold no configuration and no hidden globals, so a single
/// value can be shared freely between threads.
pub trait BlockCompressor: Send + Sync {
    /// Upper bound on the compressed size of `len` input bytes.
    fn max_compressed_size(&self, len: usize) -> usize;

    /// Compresses `src` into `dst` and returns the compressed size.
    ///
    /// `dst` must be at least [`max_compressed_size`](Self::max_compressed_size)
    /// bytes long.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::Compression`] if `dst` is too small.
    fn compress(&self, src: &[u8], dst: &mut [u8]) -> AssetResult<usize>;

    /// Decompresses `src` into `dst` and returns the decoded size.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::Decompression`] if the stream is malformed or
    /// does not fit in `dst`.
    fn decompress(&self, src: &[u8], dst: &mut [u8]) -> AssetResult<usize>;
}

/// LZ4 block format, backed by `lz4_flex`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Lz4Block;

impl BlockCompressor for Lz4Block {
    #[inline]
    fn max_compressed_size(&self, len: usize) -> usize {
        lz4_flex::block::get_maximum_output_size(len)
    }

    fn compress(&self, src: &[u8], dst: &mut [u8]) -> AssetResult<usize> {
        lz4_flex::block::compress_into(src, dst).map_err(|e| AssetError::Compression(e.to_string()))
    }

    fn decompress(&self, src: &[u8], dst: &mut [u8]) -> AssetResult<usize> {
        lz4_flex::block::decompress_into(src, dst)
            .map_err(|e| AssetError::Decompression(e.to_string()))
    }
}

/// Compresses `src` into a freshly allocated, exactly sized buffer.
///
/// # Errors
///
/// Propagates compressor failures.
pub fn compress_to_vec(compressor: &impl BlockCompressor, src: &[u8]) -> AssetResult<Vec<u8>> {
    let mut staging = vec![0u8; compressor.max_compressed_size(src.len())];
    let written = compressor.compress(src, &mut staging)?;
    staging.truncate(written);
    Ok(staging)
}
