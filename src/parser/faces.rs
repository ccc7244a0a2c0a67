//! Version-dependent face record layouts and the decoupled lightmap lump.

use std::fmt;
use std::io::{Read, Seek, SeekFrom};

use serde::Serialize;
use tracing::debug;

use super::container::BspFile;
use super::header::{le_f32, le_i32, le_u16, BspVersion, LumpKind};
use crate::error::{BspError, Result};

/// Name of the extension lump holding one [`DecoupledLightmap`] per face.
pub const DECOUPLED_LM: &str = "DECOUPLED_LM";

/// On-disk face record layout, selected once per container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceLayout {
    /// 16-bit plane, side, edge count and texinfo (BSP29, Half-Life).
    Narrow,
    /// 32-bit fields throughout (BSP2).
    Wide,
}

impl FaceLayout {
    pub fn for_version(version: BspVersion) -> Result<Self> {
        match version {
            BspVersion::Bsp29 | BspVersion::HalfLife => Ok(FaceLayout::Narrow),
            BspVersion::Bsp2 => Ok(FaceLayout::Wide),
            other => Err(BspError::UnsupportedVersion(other)),
        }
    }

    pub fn record_size(self) -> usize {
        match self {
            FaceLayout::Narrow => 20,
            FaceLayout::Wide => 28,
        }
    }
}

/// Number of face records in the container's Faces lump.
pub fn face_count(bsp: &BspFile) -> Result<usize> {
    let layout = FaceLayout::for_version(bsp.header.version)?;
    Ok(bsp.lump(LumpKind::Faces).length as usize / layout.record_size())
}

/// Per-face lightmap placement (24 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecoupledLightmap {
    pub width: u16,
    pub height: u16,
    pub offset: i32,
    /// Rows of the 2x4 world-to-lightmap transform.
    pub world_to_lm: [[f32; 4]; 2],
}

impl DecoupledLightmap {
    pub const SIZE: usize = 24;

    pub fn from_bytes(data: &[u8; Self::SIZE]) -> Self {
        let row = |at: usize| {
            [
                le_f32(data, at),
                le_f32(data, at + 4),
                le_f32(data, at + 8),
                le_f32(data, at + 12),
            ]
        };
        Self {
            width: le_u16(data, 0),
            height: le_u16(data, 2),
            offset: le_i32(data, 4),
            world_to_lm: [row(8), row(24)],
        }
    }
}

impl fmt::Display for DecoupledLightmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vec4 = |v: &[f32; 4]| {
            format!(
                "{{x: {:.3}, y: {:.3}, z: {:.3}, w: {:.3}}}",
                v[0], v[1], v[2], v[3]
            )
        };
        write!(
            f,
            "LM[w: {:2}, h: {:2}, off: {:6}, [{}, {}]",
            self.width,
            self.height,
            self.offset,
            vec4(&self.world_to_lm[0]),
            vec4(&self.world_to_lm[1])
        )
    }
}

/// Read one [`DecoupledLightmap`] per face from the `DECOUPLED_LM` lump.
///
/// Returns `Ok(None)` when the container has no such lump. Any short read
/// aborts the whole pass.
pub fn read_decoupled_lightmaps<R: Read + Seek>(
    bsp: &BspFile,
    reader: &mut R,
) -> Result<Option<Vec<DecoupledLightmap>>> {
    let count = face_count(bsp)?;
    let Some(entry) = bsp.find_extension(DECOUPLED_LM) else {
        return Ok(None);
    };
    debug!(faces = count, offset = entry.offset, "reading decoupled lightmaps");

    reader.seek(SeekFrom::Start(entry.offset as u64))?;
    let mut records = Vec::with_capacity(count);
    let mut buf = [0u8; DecoupledLightmap::SIZE];
    for _ in 0..count {
        reader.read_exact(&mut buf)?;
        records.push(DecoupledLightmap::from_bytes(&buf));
    }
    Ok(Some(records))
}
