//! Texture directory embedded at the start of the Textures lump.

use std::io::{Read, Seek, SeekFrom};

use super::header::{le_u32, Lump};
use crate::error::{BspError, Result};

/// Width of the name field at the start of every texture record.
pub const TEXTURE_NAME_LEN: usize = 16;

/// Offset value marking an empty texture slot.
const EMPTY_SLOT: u32 = u32::MAX;

/// Miptex directory: one offset per slot, relative to the lump start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDirectory {
    /// Absolute file offset of the Textures lump.
    pub lump_offset: u64,
    /// `None` for empty slots.
    pub offsets: Vec<Option<u32>>,
}

impl TextureDirectory {
    /// Parse the directory from the Textures lump.
    ///
    /// Every valid slot must leave room for a full name field inside the lump.
    pub fn read<R: Read + Seek>(reader: &mut R, lump: Lump) -> Result<Self> {
        let lump_len = lump.length as u64;
        if lump_len < 4 {
            return Err(BspError::MalformedTextureDirectory(format!(
                "lump of {} bytes cannot hold a count",
                lump_len
            )));
        }

        reader.seek(SeekFrom::Start(lump.offset as u64))?;
        let mut count_buf = [0u8; 4];
        reader.read_exact(&mut count_buf)?;
        let count = u32::from_le_bytes(count_buf) as u64;

        if 4 + count * 4 > lump_len {
            return Err(BspError::MalformedTextureDirectory(format!(
                "{} offsets do not fit in a {} byte lump",
                count, lump_len
            )));
        }

        let mut raw = vec![0u8; count as usize * 4];
        reader.read_exact(&mut raw)?;

        let mut offsets = Vec::with_capacity(count as usize);
        for i in 0..count as usize {
            let offset = le_u32(&raw, i * 4);
            if offset == EMPTY_SLOT {
                offsets.push(None);
                continue;
            }
            if offset as u64 + TEXTURE_NAME_LEN as u64 > lump_len {
                return Err(BspError::MalformedTextureDirectory(format!(
                    "texture {} at offset {} runs past the lump end",
                    i, offset
                )));
            }
            offsets.push(Some(offset));
        }

        Ok(Self {
            lump_offset: lump.offset as u64,
            offsets,
        })
    }

    /// Absolute file offsets of every valid texture name field.
    pub fn name_positions(&self) -> impl Iterator<Item = u64> + '_ {
        self.offsets
            .iter()
            .flatten()
            .map(move |&offset| self.lump_offset + offset as u64)
    }
}
