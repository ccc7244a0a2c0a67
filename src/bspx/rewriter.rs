//! Rewrites a container with a new extension region.
//!
//! The primary region is streamed through unchanged. Extension lumps are
//! loaded into an [`ExtensionLumps`] map, handed to a caller-supplied
//! transform, and written back as a fresh header, directory and payload area.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{BspError, Result};
use crate::parser::{BspFile, ExtensionEntry, ExtensionHeader, LumpName};

/// Extension lump payloads keyed by their raw name field.
///
/// Ordered by name so rewritten files are reproducible.
pub type ExtensionLumps = BTreeMap<LumpName, Vec<u8>>;

/// Load every extension lump payload listed in the container's directory.
pub fn load_extensions<R: Read + Seek>(bsp: &BspFile, source: &mut R) -> Result<ExtensionLumps> {
    let file_len = source.seek(SeekFrom::End(0))?;
    let mut lumps = ExtensionLumps::new();

    for entry in &bsp.extensions {
        entry.as_lump().check_bounds(&entry.name(), file_len)?;

        source.seek(SeekFrom::Start(entry.offset as u64))?;
        let mut payload = vec![0u8; entry.length as usize];
        source.read_exact(&mut payload)?;
        lumps.insert(entry.lump_name(), payload);
    }

    Ok(lumps)
}

/// Serialize an extension region whose header starts at byte `start`.
///
/// Writes the header, one directory entry per lump, then the payloads in the
/// same order. Returns the number of bytes written.
pub fn write_extensions<W: Write>(
    out: &mut W,
    start: u64,
    tag: [u8; 4],
    lumps: &ExtensionLumps,
) -> Result<u64> {
    let mut entries = Vec::with_capacity(lumps.len());
    let mut offset =
        start + ExtensionHeader::SIZE as u64 + (ExtensionEntry::SIZE * lumps.len()) as u64;

    for (name, payload) in lumps {
        let length = u32::try_from(payload.len())
            .map_err(|_| BspError::ExtensionTooLarge(payload.len() as u64))?;
        entries.push(ExtensionEntry {
            name: *name.field(),
            offset: u32::try_from(offset).map_err(|_| BspError::ExtensionTooLarge(offset))?,
            length,
        });
        offset += length as u64;
    }
    // The final payload must also end within 32-bit addressing.
    u32::try_from(offset).map_err(|_| BspError::ExtensionTooLarge(offset))?;

    let header = ExtensionHeader {
        tag,
        count: i32::try_from(lumps.len())
            .map_err(|_| BspError::ExtensionTooLarge(lumps.len() as u64))?,
    };
    out.write_all(&header.to_bytes())?;
    for entry in &entries {
        out.write_all(&entry.to_bytes())?;
    }
    for payload in lumps.values() {
        out.write_all(payload)?;
    }

    Ok(offset - start)
}

/// Write `bsp` to `destination` with its extension lumps passed through
/// `transform`.
///
/// `destination` is truncated before `source` is read, so it must not be the
/// file `source` was opened from. [`super::set_lump`] and
/// [`super::remove_lump`] check this before calling here.
///
/// The destination is removed again if any step fails, so a file at
/// `destination` after `Ok(())` is always complete and synced.
pub fn rewrite<R, F>(bsp: &BspFile, source: &mut R, destination: &Path, transform: F) -> Result<()>
where
    R: Read + Seek,
    F: FnOnce(&mut ExtensionLumps),
{
    bsp.ensure_complete()?;

    let file = File::create(destination).map_err(|source| BspError::CannotCreateOutput {
        path: destination.to_path_buf(),
        source,
    })?;

    let result = write_container(bsp, source, file, transform);
    if result.is_err() {
        let _ = fs::remove_file(destination);
    } else {
        info!("wrote {}", destination.display());
    }
    result
}

fn write_container<R, F>(bsp: &BspFile, source: &mut R, file: File, transform: F) -> Result<()>
where
    R: Read + Seek,
    F: FnOnce(&mut ExtensionLumps),
{
    let mut out = BufWriter::new(file);

    source.seek(SeekFrom::Start(0))?;
    let copied = io::copy(&mut source.by_ref().take(bsp.extension_offset), &mut out)?;
    if copied != bsp.extension_offset {
        return Err(BspError::ShortCopy {
            expected: bsp.extension_offset,
            copied,
        });
    }
    debug!(bytes = copied, "copied primary region");

    let mut lumps = load_extensions(bsp, source)?;
    transform(&mut lumps);

    // A legacy file that still has no extension lumps stays byte-identical.
    if bsp.extension_header.is_some() || !lumps.is_empty() {
        let tag = bsp
            .extension_header
            .map_or(ExtensionHeader::DEFAULT_TAG, |h| h.tag);
        let written = write_extensions(&mut out, bsp.extension_offset, tag, &lumps)?;
        debug!(lumps = lumps.len(), bytes = written, "wrote extension region");
    }

    let file = out
        .into_inner()
        .map_err(|e| BspError::OutputFlushFailed(e.into_error()))?;
    file.sync_all().map_err(BspError::OutputFlushFailed)?;
    Ok(())
}
