//! # Texture Codec
//!
//! Packs decoded pixel buffers into `TEXI` containers and back.
//!
//! ## Metadata
//!
//! ```text
//! {
//!   "format": "RGBA8",
//!   "width": 512,
//!   "height": 256,
//!   "buffer_size": 524288,      // uncompressed bytes
//!   "original_file": "textures/brick.png",
//!   "compression": "LZ4"        // or "None"
//! }
//! ```
//!
//! Unrecognized `format` and `compression` tokens never fail the parse: they
//! become [`TextureFormat::Unknown`] and [`CompressionMode::None`]. Callers
//! must check for `Unknown` before using the pixels.

use serde::{Deserialize, Serialize};

use crate::compression::{compress_to_vec, BlockCompressor, Lz4Block};
use crate::container::{AssetFile, AssetKind};
use crate::error::{AssetError, AssetResult};

/// Current texture schema version.
pub const TEXTURE_VERSION: u32 = 1;

/// An LZ4 block never expands by more than this factor.
const LZ4_MAX_RATIO: u64 = 255;

/// Pixel formats a texture payload can hold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Unrecognized format. Never treat as a valid format.
    #[default]
    Unknown,
    /// 8 bits per channel, RGBA order.
    Rgba8,
}

impl TextureFormat {
    /// Parses a metadata token. Unrecognized tokens map to `Unknown`.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token {
            "RGBA8" => Self::Rgba8,
            _ => Self::Unknown,
        }
    }

    /// Returns the metadata token.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Rgba8 => "RGBA8",
        }
    }

    /// Bytes per pixel, if the format is known.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> Option<u64> {
        match self {
            Self::Unknown => None,
            Self::Rgba8 => Some(4),
        }
    }
}

/// Payload compression modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompressionMode {
    /// Pixels are stored verbatim.
    #[default]
    #[serde(rename = "None")]
    None,
    /// Pixels are stored as one LZ4 block.
    #[serde(rename = "LZ4")]
    Lz4,
}

impl CompressionMode {
    /// Parses a metadata token. Unrecognized tokens map to `None`.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token {
            "LZ4" => Self::Lz4,
            _ => Self::None,
        }
    }

    /// Returns the metadata token.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Lz4 => "LZ4",
        }
    }
}

/// Parsed texture metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureInfo {
    /// Pixel format.
    pub format: TextureFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Size of the pixel data before compression, in bytes.
    pub texture_size: u64,
    /// How the payload is compressed.
    pub compression: CompressionMode,
    /// Source file the texture was baked from. Diagnostic only.
    pub original_file: String,
}

impl TextureInfo {
    /// Describes an RGBA8 texture of the given size.
    #[must_use]
    pub fn rgba8(
        width: u32,
        height: u32,
        original_file: impl Into<String>,
        compression: CompressionMode,
    ) -> Self {
        Self {
            format: TextureFormat::Rgba8,
            width,
            height,
            texture_size: u64::from(width) * u64::from(height) * 4,
            compression,
            original_file: original_file.into(),
        }
    }

    /// Size implied by width, height and format.
    #[must_use]
    pub fn expected_size(&self) -> Option<u64> {
        self.format
            .bytes_per_pixel()
            .map(|bpp| u64::from(self.width) * u64::from(self.height) * bpp)
    }
}

/// On-disk shape of the metadata document.
#[derive(Serialize, Deserialize)]
struct TextureMetadata {
    format: String,
    width: u32,
    height: u32,
    buffer_size: u64,
    original_file: String,
    compression: String,
}

/// Packs pixels into a texture container using LZ4 when requested.
///
/// # Errors
///
/// See [`pack_texture_with`].
pub fn pack_texture(info: &TextureInfo, pixels: &[u8]) -> AssetResult<AssetFile> {
    pack_texture_with(&Lz4Block, info, pixels)
}

/// Packs pixels into a texture container with an explicit compressor.
///
/// # Errors
///
/// Returns [`AssetError::UnknownTextureFormat`] for an `Unknown` format,
/// [`AssetError::BufferSizeMismatch`] if `pixels` or `texture_size`
/// disagree with the dimensions, or a compression error.
pub fn pack_texture_with(
    compressor: &impl BlockCompressor,
    info: &TextureInfo,
    pixels: &[u8],
) -> AssetResult<AssetFile> {
    let expected = info.expected_size().ok_or(AssetError::UnknownTextureFormat)?;
    if info.texture_size != expected {
        return Err(AssetError::BufferSizeMismatch {
            what: "declared texture size",
            expected,
            actual: info.texture_size,
        });
    }
    if pixels.len() as u64 != expected {
        return Err(AssetError::BufferSizeMismatch {
            what: "pixel buffer",
            expected,
            actual: pixels.len() as u64,
        });
    }

    let metadata = serde_json::to_string(&TextureMetadata {
        format: info.format.name().to_string(),
        width: info.width,
        height: info.height,
        buffer_size: info.texture_size,
        original_file: info.original_file.clone(),
        compression: info.compression.name().to_string(),
    })?;

    let payload = match info.compression {
        CompressionMode::None => pixels.to_vec(),
        CompressionMode::Lz4 => compress_to_vec(compressor, pixels)?,
    };

    tracing::debug!(
        "Packed texture {} ({}x{}, {} -> {} bytes, {})",
        info.original_file,
        info.width,
        info.height,
        pixels.len(),
        payload.len(),
        info.compression.name()
    );

    Ok(AssetFile::new(
        AssetKind::Texture.tag(),
        TEXTURE_VERSION,
        metadata,
        payload,
    ))
}

/// Parses the texture metadata of a container.
///
/// # Errors
///
/// Returns [`AssetError::KindMismatch`] / [`AssetError::UnsupportedVersion`]
/// for a container that is not a current texture, or
/// [`AssetError::Metadata`] if the document is malformed.
pub fn read_texture_info(file: &AssetFile) -> AssetResult<TextureInfo> {
    file.expect_kind(AssetKind::Texture, TEXTURE_VERSION)?;
    let meta: TextureMetadata = serde_json::from_str(file.metadata())?;

    Ok(TextureInfo {
        format: TextureFormat::parse(&meta.format),
        width: meta.width,
        height: meta.height,
        texture_size: meta.buffer_size,
        compression: CompressionMode::parse(&meta.compression),
        original_file: meta.original_file,
    })
}

/// Unpacks a texture payload into `destination` using LZ4 when needed.
///
/// # Errors
///
/// See [`unpack_texture_with`].
pub fn unpack_texture(info: &TextureInfo, payload: &[u8], destination: &mut [u8]) -> AssetResult<()> {
    unpack_texture_with(&Lz4Block, info, payload, destination)
}

/// Unpacks a texture payload into `destination` with an explicit compressor.
///
/// For compressed payloads `destination` must hold at least `texture_size`
/// bytes and the stream must decode to exactly that many. Uncompressed
/// payloads are copied as-is.
///
/// # Errors
///
/// Returns [`AssetError::Decompression`] for a malformed stream, a short
/// destination or a size mismatch, and [`AssetError::BufferSizeMismatch`]
/// when an uncompressed payload does not fit.
pub fn unpack_texture_with(
    compressor: &impl BlockCompressor,
    info: &TextureInfo,
    payload: &[u8],
    destination: &mut [u8],
) -> AssetResult<()> {
    match info.compression {
        CompressionMode::Lz4 => {
            let size = texture_len(info)?;
            if destination.len() < size {
                return Err(AssetError::Decompression(format!(
                    "destination holds {} bytes, texture needs {size}",
                    destination.len()
                )));
            }
            let written = compressor.decompress(payload, &mut destination[..size])?;
            if written != size {
                return Err(AssetError::Decompression(format!(
                    "decoded {written} bytes, expected {size}"
                )));
            }
        }
        CompressionMode::None => {
            if destination.len() < payload.len() {
                return Err(AssetError::BufferSizeMismatch {
                    what: "destination buffer",
                    expected: payload.len() as u64,
                    actual: destination.len() as u64,
                });
            }
            destination[..payload.len()].copy_from_slice(payload);
        }
    }
    Ok(())
}

/// Unpacks a texture payload into a new buffer of exactly `texture_size`
/// bytes.
///
/// # Errors
///
/// Same as [`unpack_texture`], plus [`AssetError::BufferSizeMismatch`] if an
/// uncompressed payload is not exactly `texture_size` bytes. A compressed
/// payload too small to produce `texture_size` bytes is rejected before the
/// buffer is allocated.
pub fn unpack_texture_to_vec(info: &TextureInfo, payload: &[u8]) -> AssetResult<Vec<u8>> {
    let size = texture_len(info)?;
    match info.compression {
        CompressionMode::None if payload.len() != size => {
            return Err(AssetError::BufferSizeMismatch {
                what: "uncompressed payload",
                expected: info.texture_size,
                actual: payload.len() as u64,
            });
        }
        CompressionMode::Lz4 if info.texture_size > (payload.len() as u64).saturating_mul(LZ4_MAX_RATIO) => {
            return Err(AssetError::Decompression(format!(
                "{} compressed bytes cannot expand to {} bytes",
                payload.len(),
                info.texture_size
            )));
        }
        _ => {}
    }

    let mut pixels = vec![0u8; size];
    unpack_texture(info, payload, &mut pixels)?;
    Ok(pixels)
}

fn texture_len(info: &TextureInfo) -> AssetResult<usize> {
    usize::try_from(info.texture_size)
        .map_err(|_| AssetError::corrupt(format!("texture size {} exceeds address space", info.texture_size)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        (0..width * height)
            .flat_map(|i| {
                let v = (i % 251) as u8;
                [v, v / 2, 255 - v, 255]
            })
            .collect()
    }

    #[test]
    fn test_pack_none_is_verbatim() {
        let pixels = gradient(4, 4);
        let info = TextureInfo::rgba8(4, 4, "a.png", CompressionMode::None);
        let file = pack_texture(&info, &pixels).unwrap();

        assert_eq!(file.kind(), *b"TEXI");
        assert_eq!(file.version(), TEXTURE_VERSION);
        assert_eq!(file.payload(), pixels.as_slice());
    }

    #[test]
    fn test_pack_lz4_shrinks_and_roundtrips() {
        let pixels = vec![128u8; 64 * 64 * 4];
        let info = TextureInfo::rgba8(64, 64, "flat.png", CompressionMode::Lz4);
        let file = pack_texture(&info, &pixels).unwrap();

        assert!(file.payload().len() < pixels.len());
        assert!(file.payload().len() <= Lz4Block.max_compressed_size(pixels.len()));

        let parsed = read_texture_info(&file).unwrap();
        assert_eq!(parsed, info);
        assert_eq!(unpack_texture_to_vec(&parsed, file.payload()).unwrap(), pixels);
    }

    #[test]
    fn test_metadata_keys() {
        let info = TextureInfo::rgba8(2, 3, "keys.png", CompressionMode::Lz4);
        let file = pack_texture(&info, &gradient(2, 3)).unwrap();
        let doc: serde_json::Value = serde_json::from_str(file.metadata()).unwrap();

        assert_eq!(doc["format"], "RGBA8");
        assert_eq!(doc["width"], 2);
        assert_eq!(doc["height"], 3);
        assert_eq!(doc["buffer_size"], 24);
        assert_eq!(doc["original_file"], "keys.png");
        assert_eq!(doc["compression"], "LZ4");
    }

    #[test]
    fn test_unknown_tokens_map_to_sentinels() {
        let metadata = r#"{"format":"BC7","width":1,"height":1,"buffer_size":4,
            "original_file":"x","compression":"ZSTD"}"#;
        let file = AssetFile::new(*b"TEXI", TEXTURE_VERSION, metadata.to_string(), vec![0; 4]);
        let info = read_texture_info(&file).unwrap();

        assert_eq!(info.format, TextureFormat::Unknown);
        assert_eq!(info.format.bytes_per_pixel(), None);
        assert_eq!(info.compression, CompressionMode::None);
    }

    #[test]
    fn test_read_rejects_wrong_kind_and_bad_json() {
        let mesh = AssetFile::new(*b"MESH", 1, "{}".to_string(), Vec::new());
        assert!(matches!(read_texture_info(&mesh), Err(AssetError::KindMismatch { .. })));

        let broken = AssetFile::new(*b"TEXI", TEXTURE_VERSION, "{\"format\":".to_string(), Vec::new());
        assert!(matches!(read_texture_info(&broken), Err(AssetError::Metadata(_))));
    }

    #[test]
    fn test_pack_rejects_bad_input() {
        let mut info = TextureInfo::rgba8(2, 2, "bad.png", CompressionMode::None);
        assert!(matches!(
            pack_texture(&info, &[0u8; 15]),
            Err(AssetError::BufferSizeMismatch { expected: 16, actual: 15, .. })
        ));

        info.format = TextureFormat::Unknown;
        assert!(matches!(
            pack_texture(&info, &[0u8; 16]),
            Err(AssetError::UnknownTextureFormat)
        ));
    }

    #[test]
    fn test_unpack_lz4_failures_are_reported() {
        let pixels = gradient(8, 8);
        let info = TextureInfo::rgba8(8, 8, "g.png", CompressionMode::Lz4);
        let file = pack_texture(&info, &pixels).unwrap();

        let mut small = vec![0u8; pixels.len() - 1];
        assert!(matches!(
            unpack_texture(&info, file.payload(), &mut small),
            Err(AssetError::Decompression(_))
        ));

        let mut out = vec![0u8; pixels.len()];
        let truncated = &file.payload()[..file.payload().len() / 2];
        assert!(unpack_texture(&info, truncated, &mut out).is_err());

        // Claiming a larger texture than the stream holds must not pass.
        let mut lying = info.clone();
        lying.texture_size += 4;
        let mut bigger = vec![0u8; pixels.len() + 4];
        assert!(matches!(
            unpack_texture(&lying, file.payload(), &mut bigger),
            Err(AssetError::Decompression(_))
        ));
    }

    #[test]
    fn test_unpack_none_checks_destination() {
        let info = TextureInfo::rgba8(1, 1, "p.png", CompressionMode::None);
        let mut out = [0u8; 2];
        assert!(matches!(
            unpack_texture(&info, &[1, 2, 3, 4], &mut out),
            Err(AssetError::BufferSizeMismatch { .. })
        ));
        assert!(matches!(
            unpack_texture_to_vec(&info, &[1, 2, 3]),
            Err(AssetError::BufferSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_absurd_declared_size_rejected_before_allocation() {
        let mut info = TextureInfo::rgba8(1, 1, "p.png", CompressionMode::Lz4);
        info.texture_size = 1 << 40;
        assert!(matches!(
            unpack_texture_to_vec(&info, &[0u8; 8]),
            Err(AssetError::Decompression(_))
        ));
    }
}
