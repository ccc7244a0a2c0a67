//! Container layer: primary header plus the optional BSPX extension directory.

use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, warn};

use super::header::{le_i32, le_u32, Lump, LumpKind, PrimaryHeader};
use crate::error::{BspError, Result};

/// Extension header (8 bytes): identifying tag and entry count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionHeader {
    pub tag: [u8; 4],
    pub count: i32,
}

impl ExtensionHeader {
    pub const SIZE: usize = 8;
    /// Tag used when a container gains its first extension lump.
    pub const DEFAULT_TAG: [u8; 4] = *b"BSPX";

    pub fn from_bytes(data: &[u8; Self::SIZE]) -> Self {
        Self {
            tag: [data[0], data[1], data[2], data[3]],
            count: le_i32(data, 4),
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.tag);
        out[4..8].copy_from_slice(&self.count.to_le_bytes());
        out
    }

    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }
}

/// Extension directory entry (32 bytes): null-padded name, offset, length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionEntry {
    pub name: [u8; Self::NAME_LEN],
    pub offset: u32,
    pub length: u32,
}

impl ExtensionEntry {
    pub const NAME_LEN: usize = 24;
    pub const SIZE: usize = Self::NAME_LEN + 8;

    pub fn from_bytes(data: &[u8; Self::SIZE]) -> Self {
        let mut name = [0u8; Self::NAME_LEN];
        name.copy_from_slice(&data[..Self::NAME_LEN]);
        Self {
            name,
            offset: le_u32(data, Self::NAME_LEN),
            length: le_u32(data, Self::NAME_LEN + 4),
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..Self::NAME_LEN].copy_from_slice(&self.name);
        out[Self::NAME_LEN..Self::NAME_LEN + 4].copy_from_slice(&self.offset.to_le_bytes());
        out[Self::NAME_LEN + 4..].copy_from_slice(&self.length.to_le_bytes());
        out
    }

    /// Encode a lump name into the fixed 24-byte field.
    pub fn encode_name(name: &str) -> Result<[u8; Self::NAME_LEN]> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > Self::NAME_LEN || bytes.contains(&0) {
            return Err(BspError::InvalidLumpName(name.to_string()));
        }
        let mut out = [0u8; Self::NAME_LEN];
        out[..bytes.len()].copy_from_slice(bytes);
        Ok(out)
    }

    /// The name with NUL padding trimmed from both ends.
    pub fn name(&self) -> String {
        trim_nul(&self.name)
    }

    pub fn lump_name(&self) -> LumpName {
        LumpName(self.name)
    }

    pub fn as_lump(&self) -> Lump {
        Lump {
            offset: self.offset,
            length: self.length,
        }
    }
}

/// An extension lump name as its raw 24-byte directory field.
///
/// Names read from a container keep every byte of the field, including
/// anything after the first NUL, so rewriting never alters them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LumpName([u8; ExtensionEntry::NAME_LEN]);

impl LumpName {
    /// Validate and pad a name supplied by the user.
    pub fn new(name: &str) -> Result<Self> {
        ExtensionEntry::encode_name(name).map(Self)
    }

    pub fn from_field(field: [u8; ExtensionEntry::NAME_LEN]) -> Self {
        Self(field)
    }

    pub fn field(&self) -> &[u8; ExtensionEntry::NAME_LEN] {
        &self.0
    }
}

impl fmt::Display for LumpName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&trim_nul(&self.0))
    }
}

/// Trim NUL bytes from both ends of a fixed-width field.
pub(crate) fn trim_nul(field: &[u8]) -> String {
    let start = field.iter().position(|&b| b != 0).unwrap_or(field.len());
    let end = field.iter().rposition(|&b| b != 0).map_or(start, |i| i + 1);
    String::from_utf8_lossy(&field[start..end]).into_owned()
}

/// A parsed BSP container.
#[derive(Debug, Clone)]
pub struct BspFile {
    pub header: PrimaryHeader,
    /// First byte past every primary lump.
    pub extension_offset: u64,
    /// `None` for legacy containers with nothing after the primary lumps.
    pub extension_header: Option<ExtensionHeader>,
    /// Entries in file order.
    pub extensions: Vec<ExtensionEntry>,
    /// Set when the directory ended before the declared entry count.
    pub directory_truncated: bool,
}

impl BspFile {
    /// Parse a container from a seekable source.
    ///
    /// A missing extension header is the normal legacy case and not an error.
    /// A directory that ends early is kept as far as it was read and flagged
    /// through [`BspFile::directory_truncated`].
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        reader
            .seek(SeekFrom::Start(0))
            .map_err(BspError::MalformedPrimaryHeader)?;
        let header = PrimaryHeader::read(reader)?;
        let extension_offset = header.extension_offset();
        debug!(version = %header.version, extension_offset, "read primary header");

        let mut bsp = Self {
            header,
            extension_offset,
            extension_header: None,
            extensions: Vec::new(),
            directory_truncated: false,
        };

        let extension_header = match read_extension_header(reader, extension_offset) {
            Ok(ext) => ext,
            Err(e) => {
                debug!("no extension header at {}: {}", extension_offset, e);
                return Ok(bsp);
            }
        };

        let expected = extension_header.count.max(0) as usize;
        let mut buf = [0u8; ExtensionEntry::SIZE];
        for _ in 0..expected {
            if let Err(e) = reader.read_exact(&mut buf) {
                warn!(
                    "extension directory truncated after {} of {} entries: {}",
                    bsp.extensions.len(),
                    expected,
                    e
                );
                bsp.directory_truncated = true;
                break;
            }
            bsp.extensions.push(ExtensionEntry::from_bytes(&buf));
        }
        if extension_header.count < 0 {
            warn!("negative extension lump count {}", extension_header.count);
            bsp.directory_truncated = true;
        }
        debug!(
            tag = %extension_header.tag_str(),
            entries = bsp.extensions.len(),
            "read extension directory"
        );

        bsp.extension_header = Some(extension_header);
        Ok(bsp)
    }

    /// Open and parse a container from a path.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path).map_err(|source| BspError::CannotOpenInput {
            path: path.to_path_buf(),
            source,
        })?;
        Self::read(&mut file)
    }

    pub fn lump(&self, kind: LumpKind) -> Lump {
        self.header.lump(kind)
    }

    /// Find an extension entry by its trimmed name.
    pub fn find_extension(&self, name: &str) -> Option<&ExtensionEntry> {
        self.extensions.iter().find(|e| e.name() == name)
    }

    pub fn extension_names(&self) -> Vec<String> {
        self.extensions.iter().map(ExtensionEntry::name).collect()
    }

    /// Fail if the extension directory could not be read completely.
    pub fn ensure_complete(&self) -> Result<()> {
        if self.directory_truncated {
            return Err(BspError::TruncatedExtensionDirectory {
                expected: self.extension_header.map_or(0, |h| h.count),
                found: self.extensions.len(),
            });
        }
        Ok(())
    }
}

fn read_extension_header<R: Read + Seek>(reader: &mut R, offset: u64) -> std::io::Result<ExtensionHeader> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut buf = [0u8; ExtensionHeader::SIZE];
    reader.read_exact(&mut buf)?;
    Ok(ExtensionHeader::from_bytes(&buf))
}
