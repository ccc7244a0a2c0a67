//! File-level extension lump edits.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::info;

use super::rewriter::rewrite;
use crate::error::{BspError, Result};
use crate::parser::{BspFile, LumpName};

/// Default output path for an edited map: `<stem>.new.bsp` next to the input.
pub fn output_path_for(input: &Path) -> PathBuf {
    input.with_extension("new.bsp")
}

/// Refuse to write over the input file.
pub(crate) fn ensure_distinct(input: &Path, output: &Path) -> Result<()> {
    let same = match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    };
    if same {
        return Err(BspError::OutputIsInput(output.to_path_buf()));
    }
    Ok(())
}

pub(crate) fn open_input(input: &Path) -> Result<File> {
    File::open(input).map_err(|source| BspError::CannotOpenInput {
        path: input.to_path_buf(),
        source,
    })
}

/// Add or replace the extension lump `name` and write the result to `output`.
pub fn set_lump(input: &Path, output: &Path, name: &str, payload: Vec<u8>) -> Result<()> {
    let key = LumpName::new(name)?;
    ensure_distinct(input, output)?;

    let mut file = open_input(input)?;
    let bsp = BspFile::read(&mut file)?;
    let size = payload.len();
    rewrite(&bsp, &mut file, output, |lumps| {
        lumps.insert(key, payload);
    })?;

    info!("set {} ({} bytes)", name, size);
    Ok(())
}

/// Remove the extension lump `name` and write the result to `output`.
///
/// A missing lump is not an error: the output is still written and `false`
/// is returned.
pub fn remove_lump(input: &Path, output: &Path, name: &str) -> Result<bool> {
    let key = LumpName::new(name)?;
    ensure_distinct(input, output)?;

    let mut file = open_input(input)?;
    let bsp = BspFile::read(&mut file)?;
    let mut removed = false;
    rewrite(&bsp, &mut file, output, |lumps| {
        removed = lumps.remove(&key).is_some();
    })?;

    if removed {
        info!("removed {}", name);
    } else {
        info!("{} not present, nothing removed", name);
    }
    Ok(removed)
}
