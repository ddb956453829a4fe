//! # Asset Container
//!
//! The generic binary envelope every baked asset is stored in.
//!
//! ## File Format
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ Header (16 bytes, little-endian, no padding)       │
//! ├────────────────────────────────────────────────────┤
//! │ Kind (4) │ Version (4) │ Meta Len (4) │ Blob Len (4)│
//! ├────────────────────────────────────────────────────┤
//! │ Metadata (Meta Len bytes, UTF-8 JSON)              │
//! ├────────────────────────────────────────────────────┤
//! │ Payload (Blob Len bytes, opaque)                   │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! The reader only frames the file. Checking the kind and version against
//! what a codec understands is the codec's job, see [`AssetFile::expect_kind`].

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{AssetError, AssetResult};

/// Size of the fixed container header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Asset categories stored in containers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// A 2D texture (`TEXI`).
    Texture,
    /// A triangle mesh (`MESH`).
    Mesh,
}

impl AssetKind {
    /// Returns the 4-byte tag written at the start of the file.
    #[must_use]
    pub const fn tag(self) -> [u8; 4] {
        match self {
            Self::Texture => *b"TEXI",
            Self::Mesh => *b"MESH",
        }
    }

    /// Looks up the kind for a tag read from disk.
    #[must_use]
    pub fn from_tag(tag: [u8; 4]) -> Option<Self> {
        match &tag {
            b"TEXI" => Some(Self::Texture),
            b"MESH" => Some(Self::Mesh),
            _ => None,
        }
    }

    /// File extension used for baked files of this kind.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Texture => "tx",
            Self::Mesh => "mesh",
        }
    }
}

/// The fixed-size container header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Asset kind tag.
    pub kind: [u8; 4],
    /// Schema version for that kind.
    pub version: u32,
    /// Length of the metadata section in bytes.
    pub metadata_len: u32,
    /// Length of the payload section in bytes.
    pub payload_len: u32,
}

impl ContainerHeader {
    /// Serializes the header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.kind);
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.metadata_len.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.payload_len.to_le_bytes());
        bytes
    }

    /// Deserializes the header from bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        Self {
            kind: [bytes[0], bytes[1], bytes[2], bytes[3]],
            version: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            metadata_len: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            payload_len: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        }
    }

    /// Total number of bytes that follow the header.
    #[must_use]
    pub const fn body_len(&self) -> u64 {
        self.metadata_len as u64 + self.payload_len as u64
    }
}

/// A baked asset: kind tag, schema version, JSON metadata and payload.
///
/// Built by a codec's pack function and never modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetFile {
    kind: [u8; 4],
    version: u32,
    metadata: String,
    payload: Vec<u8>,
}

impl AssetFile {
    /// Creates a container from its parts.
    #[must_use]
    pub fn new(kind: [u8; 4], version: u32, metadata: String, payload: Vec<u8>) -> Self {
        Self {
            kind,
            version,
            metadata,
            payload,
        }
    }

    /// Returns the kind tag.
    #[must_use]
    pub const fn kind(&self) -> [u8; 4] {
        self.kind
    }

    /// Returns the schema version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns the metadata text.
    #[must_use]
    pub fn metadata(&self) -> &str {
        &self.metadata
    }

    /// Returns the payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consumes the container and returns its payload.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Builds the header describing this container.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::SectionTooLarge`] if a section does not fit a
    /// u32 length field.
    pub fn header(&self) -> AssetResult<ContainerHeader> {
        Ok(ContainerHeader {
            kind: self.kind,
            version: self.version,
            metadata_len: section_len("metadata", self.metadata.len())?,
            payload_len: section_len("payload", self.payload.len())?,
        })
    }

    /// Checks that this container holds `kind` at schema `version`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::KindMismatch`] or
    /// [`AssetError::UnsupportedVersion`].
    pub fn expect_kind(&self, kind: AssetKind, version: u32) -> AssetResult<()> {
        if self.kind != kind.tag() {
            return Err(AssetError::KindMismatch {
                expected: kind.tag(),
                found: self.kind,
            });
        }
        if self.version != version {
            return Err(AssetError::UnsupportedVersion {
                kind: self.kind,
                expected: version,
                found: self.version,
            });
        }
        Ok(())
    }

    /// Writes the container to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if a section is too large or the writer fails.
    /// Bytes already written are not rolled back.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> AssetResult<()> {
        let header = self.header()?;
        writer.write_all(&header.to_bytes())?;
        writer.write_all(self.metadata.as_bytes())?;
        writer.write_all(&self.payload)?;
        Ok(())
    }

    /// Serializes the container into a byte vector.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::SectionTooLarge`] if a section does not fit.
    pub fn to_bytes(&self) -> AssetResult<Vec<u8>> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.metadata.len() + self.payload.len());
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Reads a container from a reader.
    ///
    /// Sections are read incrementally, so a bogus length in a truncated
    /// stream does not allocate the declared size up front.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::CorruptContainer`] if the stream ends before
    /// the declared lengths are satisfied or the metadata is not UTF-8.
    pub fn read_from<R: Read>(reader: &mut R) -> AssetResult<Self> {
        let header = read_header(reader)?;
        Self::read_body(reader, header)
    }

    /// Parses a container from an in-memory buffer.
    ///
    /// Trailing bytes after the payload are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::CorruptContainer`] if the buffer is shorter
    /// than the header says.
    pub fn from_bytes(bytes: &[u8]) -> AssetResult<Self> {
        let header_bytes: &[u8; HEADER_SIZE] = bytes
            .get(..HEADER_SIZE)
            .and_then(|h| h.try_into().ok())
            .ok_or_else(|| AssetError::corrupt(header_too_short(bytes.len() as u64)))?;
        let header = ContainerHeader::from_bytes(header_bytes);
        check_remaining(&header, (bytes.len() - HEADER_SIZE) as u64)?;

        let meta_end = HEADER_SIZE + header.metadata_len as usize;
        let payload_end = meta_end + header.payload_len as usize;
        let metadata = metadata_from_utf8(bytes[HEADER_SIZE..meta_end].to_vec())?;

        Ok(Self {
            kind: header.kind,
            version: header.version,
            metadata,
            payload: bytes[meta_end..payload_end].to_vec(),
        })
    }

    fn read_body<R: Read>(reader: &mut R, header: ContainerHeader) -> AssetResult<Self> {
        let metadata = read_section(reader, "metadata", header.metadata_len)?;
        let payload = read_section(reader, "payload", header.payload_len)?;

        Ok(Self {
            kind: header.kind,
            version: header.version,
            metadata: metadata_from_utf8(metadata)?,
            payload,
        })
    }
}

/// Writes a container to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`AssetError::Io`] if the file cannot be created or written. A
/// failed write leaves the file in an indeterminate state; write it again.
pub fn save_binary_file(path: impl AsRef<Path>, file: &AssetFile) -> AssetResult<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    file.write_to(&mut writer)?;
    writer.flush()?;

    tracing::debug!(
        "Saved {} v{} to {} ({} bytes metadata, {} bytes payload)",
        String::from_utf8_lossy(&file.kind),
        file.version,
        path.display(),
        file.metadata.len(),
        file.payload.len()
    );
    Ok(())
}

/// Reads a container from `path`.
///
/// The declared section lengths are checked against the real file size
/// before anything is allocated.
///
/// # Errors
///
/// Returns [`AssetError::Io`] if the file cannot be opened or read, and
/// [`AssetError::CorruptContainer`] if it is shorter than its header claims.
pub fn load_binary_file(path: impl AsRef<Path>) -> AssetResult<AssetFile> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let header = read_header(&mut reader)?;
    check_remaining(&header, file_len.saturating_sub(HEADER_SIZE as u64))?;
    let asset = AssetFile::read_body(&mut reader, header)?;

    tracing::debug!(
        "Loaded {} v{} from {} ({} bytes)",
        String::from_utf8_lossy(&asset.kind),
        asset.version,
        path.display(),
        file_len
    );
    Ok(asset)
}

fn section_len(section: &'static str, len: usize) -> AssetResult<u32> {
    u32::try_from(len).map_err(|_| AssetError::SectionTooLarge { section, len })
}

fn header_too_short(available: u64) -> String {
    format!("{available} bytes is shorter than the {HEADER_SIZE}-byte header")
}

fn read_header<R: Read>(reader: &mut R) -> AssetResult<ContainerHeader> {
    let mut bytes = [0u8; HEADER_SIZE];
    let mut filled = 0;
    while filled < HEADER_SIZE {
        match reader.read(&mut bytes[filled..]) {
            Ok(0) => return Err(AssetError::corrupt(header_too_short(filled as u64))),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(ContainerHeader::from_bytes(&bytes))
}

fn check_remaining(header: &ContainerHeader, remaining: u64) -> AssetResult<()> {
    if remaining < header.body_len() {
        return Err(AssetError::corrupt(format!(
            "header declares {} metadata + {} payload bytes but only {} remain",
            header.metadata_len, header.payload_len, remaining
        )));
    }
    Ok(())
}

fn read_section<R: Read>(reader: &mut R, section: &str, len: u32) -> AssetResult<Vec<u8>> {
    let mut buf = Vec::new();
    reader.take(u64::from(len)).read_to_end(&mut buf)?;
    if buf.len() != len as usize {
        return Err(AssetError::corrupt(format!(
            "{section} truncated: declared {len} bytes, read {}",
            buf.len()
        )));
    }
    Ok(buf)
}

fn metadata_from_utf8(bytes: Vec<u8>) -> AssetResult<String> {
    String::from_utf8(bytes).map_err(|e| AssetError::corrupt(format!("metadata is not UTF-8: {e}")))
}
