//! Copy-then-patch obfuscation of a whole map file.

use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use super::names::TextureNameObfuscator;
use crate::bspx::{ensure_distinct, open_input};
use crate::error::{BspError, Result};
use crate::parser::{BspFile, LumpKind, TextureDirectory, TEXTURE_NAME_LEN};

/// One texture name change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub old: String,
    pub new: String,
}

/// Copy `input` to `output` and randomize every texture name in the copy.
///
/// The input file is only read. If anything fails the partial output is
/// removed.
pub fn obfuscate_file<R: Rng>(
    input: &Path,
    output: &Path,
    obfuscator: &mut TextureNameObfuscator<R>,
) -> Result<Vec<Rename>> {
    ensure_distinct(input, output)?;
    let mut source = open_input(input)?;

    let mut dest = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(output)
        .map_err(|source| BspError::CannotCreateOutput {
            path: output.to_path_buf(),
            source,
        })?;

    let result = (|| -> Result<Vec<Rename>> {
        let expected = source.metadata()?.len();
        let copied = io::copy(&mut source, &mut dest)?;
        if copied != expected {
            return Err(BspError::ShortCopy { expected, copied });
        }
        dest.sync_all().map_err(BspError::OutputFlushFailed)?;

        let renames = obfuscate_in_place(&mut dest, obfuscator)?;
        dest.sync_all().map_err(BspError::OutputFlushFailed)?;
        Ok(renames)
    })();

    match &result {
        Ok(renames) => info!("obfuscated {} textures into {}", renames.len(), output.display()),
        Err(_) => {
            drop(dest);
            let _ = std::fs::remove_file(output);
        }
    }
    result
}

/// Rewrite the texture names of a container in place.
///
/// Only the first [`super::OBFUSCATED_LEN`] bytes of each 16-byte name field
/// change; directory offsets and texture data are untouched.
pub fn obfuscate_in_place<F, R>(file: &mut F, obfuscator: &mut TextureNameObfuscator<R>) -> Result<Vec<Rename>>
where
    F: Read + Write + Seek,
    R: Rng,
{
    let bsp = BspFile::read(file)?;
    let lump = bsp.lump(LumpKind::Textures);
    if lump.length == 0 {
        debug!("no texture lump");
        return Ok(Vec::new());
    }
    let file_len = file.seek(SeekFrom::End(0))?;
    lump.check_bounds(LumpKind::Textures.name(), file_len)?;

    let directory = TextureDirectory::read(file, lump)?;
    debug!(slots = directory.offsets.len(), "read texture directory");

    let mut renames = Vec::new();
    for position in directory.name_positions() {
        let mut field = [0u8; TEXTURE_NAME_LEN];
        file.seek(SeekFrom::Start(position))?;
        file.read_exact(&mut field)?;

        let old = String::from_utf8_lossy(super::normalize_name(&field)).into_owned();
        let replacement = obfuscator.obfuscate(&field);
        field[..replacement.len()].copy_from_slice(&replacement);

        file.seek(SeekFrom::Start(position))?;
        file.write_all(&field)?;

        let new = String::from_utf8_lossy(&replacement).into_owned();
        info!("{} => {}", old, new);
        renames.push(Rename { old, new });
    }

    Ok(renames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{BspVersion, Lump, PrimaryHeader};
    use std::io::Cursor;

    /// Container whose Textures lump holds the given names, each followed by
    /// eight bytes of fake mip data.
    fn container(names: &[&str]) -> Vec<u8> {
        let mut lump = (names.len() as u32 + 1).to_le_bytes().to_vec();
        let table_len = 4 + 4 * (names.len() + 1);
        for i in 0..names.len() {
            lump.extend_from_slice(&((table_len + i * 24) as u32).to_le_bytes());
        }
        lump.extend_from_slice(&u32::MAX.to_le_bytes());
        for name in names {
            let mut field = [0u8; 16];
            field[..name.len()].copy_from_slice(name.as_bytes());
            lump.extend_from_slice(&field);
            lump.extend_from_slice(&[0x5A; 8]);
        }

        let mut header = PrimaryHeader {
            version: BspVersion::Bsp29,
            lumps: [Lump::default(); LumpKind::COUNT],
        };
        header.lumps[LumpKind::Textures as usize] = Lump {
            offset: PrimaryHeader::SIZE as u32,
            length: lump.len() as u32,
        };
        let mut data = header.to_bytes().to_vec();
        data.extend(lump);
        data
    }

    #[test]
    fn test_patches_names_only() {
        let original = container(&["+0lava", "+1lava", "sky1", "wall"]);
        let mut cursor = Cursor::new(original.clone());
        let mut obf = TextureNameObfuscator::seeded(9);

        let renames = obfuscate_in_place(&mut cursor, &mut obf).unwrap();
        let patched = cursor.into_inner();
        assert_eq!(patched.len(), original.len());
        assert_eq!(renames.len(), 4);
        assert_eq!(renames[0].old, "+0lava");
        assert_eq!(renames[0].new[2..], renames[1].new[2..]);
        assert!(renames[2].new.starts_with("sky"));

        // Header and directory untouched.
        let table_end = PrimaryHeader::SIZE + 4 + 4 * 5;
        assert_eq!(patched[..table_end], original[..table_end]);

        for i in 0..4 {
            let start = table_end + i * 24;
            assert_eq!(&patched[start..start + 15], renames[i].new.as_bytes());
            // 16th byte and mip data are preserved.
            assert_eq!(patched[start + 15], original[start + 15]);
            assert_eq!(patched[start + 16..start + 24], original[start + 16..start + 24]);
        }
    }

    #[test]
    fn test_no_texture_lump() {
        let mut header = PrimaryHeader {
            version: BspVersion::Bsp29,
            lumps: [Lump::default(); LumpKind::COUNT],
        };
        header.lumps[0] = Lump { offset: 124, length: 0 };
        let mut cursor = Cursor::new(header.to_bytes().to_vec());
        let mut obf = TextureNameObfuscator::seeded(0);
        assert!(obfuscate_in_place(&mut cursor, &mut obf).unwrap().is_empty());
    }

    #[test]
    fn test_texture_lump_past_eof() {
        let mut data = container(&["wall"]);
        data.truncate(data.len() - 4);
        let mut cursor = Cursor::new(data);
        let mut obf = TextureNameObfuscator::seeded(0);
        assert!(matches!(
            obfuscate_in_place(&mut cursor, &mut obf),
            Err(BspError::LumpOutOfBounds { .. })
        ));
    }
}
