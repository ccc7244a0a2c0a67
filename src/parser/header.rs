//! Primary header structures for the BSP container.

use std::fmt;
use std::io::Read;

use crate::error::{BspError, Result};

/// Container version tag stored in the first four bytes of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BspVersion {
    /// Quake 1 (version 29).
    Bsp29,
    /// Half-Life (version 30).
    HalfLife,
    /// RMQ extended limits ("2PSB").
    Bsp2Psb,
    /// Fully 32-bit indexed ("BSP2").
    Bsp2,
    Unknown(i32),
}

impl BspVersion {
    pub const BSP29: i32 = 29;
    pub const HALF_LIFE: i32 = 30;
    pub const BSP2PSB: i32 = i32::from_le_bytes(*b"2PSB");
    pub const BSP2: i32 = i32::from_le_bytes(*b"BSP2");

    pub fn from_raw(raw: i32) -> Self {
        match raw {
            Self::BSP29 => BspVersion::Bsp29,
            Self::HALF_LIFE => BspVersion::HalfLife,
            Self::BSP2PSB => BspVersion::Bsp2Psb,
            Self::BSP2 => BspVersion::Bsp2,
            other => BspVersion::Unknown(other),
        }
    }

    pub fn raw(self) -> i32 {
        match self {
            BspVersion::Bsp29 => Self::BSP29,
            BspVersion::HalfLife => Self::HALF_LIFE,
            BspVersion::Bsp2Psb => Self::BSP2PSB,
            BspVersion::Bsp2 => Self::BSP2,
            BspVersion::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for BspVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BspVersion::Bsp29 => f.write_str("29"),
            BspVersion::HalfLife => f.write_str("HalfLife"),
            BspVersion::Bsp2Psb => f.write_str("2PSB"),
            BspVersion::Bsp2 => f.write_str("BSP2"),
            BspVersion::Unknown(raw) => write!(f, "Unknown version ({})", raw),
        }
    }
}

/// The fifteen primary lumps, in on-disk directory order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LumpKind {
    Entities = 0,
    Planes,
    Textures,
    Vertexes,
    Visibility,
    Nodes,
    Texinfo,
    Faces,
    Lighting,
    Clipnodes,
    Leafs,
    Marksurfaces,
    Edges,
    Surfedges,
    Models,
}

impl LumpKind {
    pub const COUNT: usize = 15;

    pub const ALL: [LumpKind; Self::COUNT] = [
        LumpKind::Entities,
        LumpKind::Planes,
        LumpKind::Textures,
        LumpKind::Vertexes,
        LumpKind::Visibility,
        LumpKind::Nodes,
        LumpKind::Texinfo,
        LumpKind::Faces,
        LumpKind::Lighting,
        LumpKind::Clipnodes,
        LumpKind::Leafs,
        LumpKind::Marksurfaces,
        LumpKind::Edges,
        LumpKind::Surfedges,
        LumpKind::Models,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LumpKind::Entities => "Entities",
            LumpKind::Planes => "Planes",
            LumpKind::Textures => "Textures",
            LumpKind::Vertexes => "Vertexes",
            LumpKind::Visibility => "Visibility",
            LumpKind::Nodes => "Nodes",
            LumpKind::Texinfo => "Texinfo",
            LumpKind::Faces => "Faces",
            LumpKind::Lighting => "Lighting",
            LumpKind::Clipnodes => "Clipnodes",
            LumpKind::Leafs => "Leafs",
            LumpKind::Marksurfaces => "Marksurfaces",
            LumpKind::Edges => "Edges",
            LumpKind::Surfedges => "Surfedges",
            LumpKind::Models => "Models",
        }
    }
}

impl fmt::Display for LumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lump descriptor {offset, length} (8 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lump {
    pub offset: u32,
    pub length: u32,
}

impl Lump {
    pub const SIZE: usize = 8;

    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            offset: le_u32(data, 0),
            length: le_u32(data, 4),
        }
    }

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.offset.to_le_bytes());
        out[4..8].copy_from_slice(&self.length.to_le_bytes());
        out
    }

    /// One past the last byte of the lump. Computed in 64 bits.
    pub fn end(&self) -> u64 {
        self.offset as u64 + self.length as u64
    }

    /// Check that the lump lies within a file of `file_len` bytes.
    pub fn check_bounds(&self, name: &str, file_len: u64) -> Result<()> {
        if self.end() > file_len {
            return Err(BspError::LumpOutOfBounds {
                name: name.to_string(),
                offset: self.offset as u64,
                length: self.length as u64,
                file_len,
            });
        }
        Ok(())
    }
}

/// Primary header: version followed by the fixed lump directory (124 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryHeader {
    pub version: BspVersion,
    pub lumps: [Lump; LumpKind::COUNT],
}

impl PrimaryHeader {
    pub const SIZE: usize = 4 + LumpKind::COUNT * Lump::SIZE;

    pub fn from_bytes(data: &[u8; Self::SIZE]) -> Self {
        let version = BspVersion::from_raw(le_i32(data, 0));
        let mut lumps = [Lump::default(); LumpKind::COUNT];
        for (i, lump) in lumps.iter_mut().enumerate() {
            let start = 4 + i * Lump::SIZE;
            *lump = Lump::from_bytes(&data[start..start + Lump::SIZE]);
        }
        Self { version, lumps }
    }

    /// Read the header from the current position of `reader`.
    ///
    /// Any short read or I/O fault is reported as
    /// [`BspError::MalformedPrimaryHeader`].
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        reader
            .read_exact(&mut buf)
            .map_err(BspError::MalformedPrimaryHeader)?;
        Ok(Self::from_bytes(&buf))
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.version.raw().to_le_bytes());
        for (i, lump) in self.lumps.iter().enumerate() {
            let start = 4 + i * Lump::SIZE;
            out[start..start + Lump::SIZE].copy_from_slice(&lump.to_bytes());
        }
        out
    }

    pub fn lump(&self, kind: LumpKind) -> Lump {
        self.lumps[kind as usize]
    }

    /// Start of the extension region: the furthest end of any primary lump.
    pub fn extension_offset(&self) -> u64 {
        self.lumps.iter().map(Lump::end).max().unwrap_or(0)
    }
}

pub(crate) fn le_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

pub(crate) fn le_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

pub(crate) fn le_i32(data: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

pub(crate) fn le_f32(data: &[u8], at: usize) -> f32 {
    f32::from_bits(le_u32(data, at))
}
