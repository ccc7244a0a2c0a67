//! Serializable summary of a parsed container.

use std::path::Path;

use serde::Serialize;

use crate::parser::{face_count, BspFile, LumpKind};

#[derive(Debug, Clone, Serialize)]
pub struct LumpSummary {
    pub name: String,
    pub offset: u64,
    pub length: u64,
}

/// Everything `print` reports about a container.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub file_name: String,
    pub version: String,
    pub lumps: Vec<LumpSummary>,
    pub extension_offset: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_tag: Option<String>,
    pub extension_lumps: Vec<LumpSummary>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub directory_truncated: bool,
    /// Absent for versions without a known face layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_count: Option<usize>,
}

impl Summary {
    pub fn new(path: &Path, bsp: &BspFile) -> Self {
        let file_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();

        let lumps = LumpKind::ALL
            .iter()
            .map(|&kind| {
                let lump = bsp.lump(kind);
                LumpSummary {
                    name: kind.name().to_string(),
                    offset: lump.offset as u64,
                    length: lump.length as u64,
                }
            })
            .collect();

        let extension_lumps = bsp
            .extensions
            .iter()
            .map(|entry| LumpSummary {
                name: entry.name(),
                offset: entry.offset as u64,
                length: entry.length as u64,
            })
            .collect();

        Self {
            file_name,
            version: bsp.header.version.to_string(),
            lumps,
            extension_offset: bsp.extension_offset,
            extension_tag: bsp.extension_header.map(|h| h.tag_str()),
            extension_lumps,
            directory_truncated: bsp.directory_truncated,
            face_count: face_count(bsp).ok(),
        }
    }
}
