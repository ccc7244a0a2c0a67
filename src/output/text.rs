//! Plain text report format.

use std::io::{self, Write};

use super::summary::{LumpSummary, Summary};
use crate::parser::DecoupledLightmap;

/// Write a summary in the classic column layout.
///
/// Format:
/// ```text
/// Filename: e1m1.bsp
///  Version: 29
///    Lumps:
///      Entities                    12.4 kB @      124 ofs
///   XLumps:                                 @   210344 ofs
///      RGBLIGHTING                 60.1 kB @   210384 ofs
/// ```
pub fn write_text<W: Write>(summary: &Summary, mut writer: W) -> io::Result<()> {
    writeln!(writer, "Filename: {}", summary.file_name)?;
    writeln!(writer, " Version: {}", summary.version)?;
    if let Some(faces) = summary.face_count {
        writeln!(writer, "   Faces: {}", faces)?;
    }
    writeln!(writer, "   Lumps:")?;
    for lump in &summary.lumps {
        write_lump_line(&mut writer, lump)?;
    }

    if !summary.extension_lumps.is_empty() {
        writeln!(
            writer,
            "  XLumps:                                 @ {:8} ofs",
            summary.extension_offset
        )?;
        for lump in &summary.extension_lumps {
            write_lump_line(&mut writer, lump)?;
        }
    }
    if summary.directory_truncated {
        writeln!(writer, "  (extension directory truncated)")?;
    }

    writeln!(writer)?;
    Ok(())
}

fn write_lump_line<W: Write>(writer: &mut W, lump: &LumpSummary) -> io::Result<()> {
    writeln!(
        writer,
        "     {:<24} {:8.1} kB @ {:8} ofs",
        lump.name,
        lump.length as f64 / 1024.0,
        lump.offset
    )
}

/// Write one line per decoupled lightmap record.
pub fn write_lightmaps_text<W: Write>(lightmaps: &[DecoupledLightmap], mut writer: W) -> io::Result<()> {
    for lm in lightmaps {
        writeln!(writer, "{}", lm)?;
    }
    Ok(())
}

/// Render a summary as a string.
pub fn to_text_string(summary: &Summary) -> io::Result<String> {
    let mut buf = Vec::new();
    write_text(summary, &mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> Summary {
        Summary {
            file_name: "start.bsp".to_string(),
            version: "BSP2".to_string(),
            lumps: vec![LumpSummary {
                name: "Entities".to_string(),
                offset: 124,
                length: 2048,
            }],
            extension_offset: 2172,
            extension_tag: Some("BSPX".to_string()),
            extension_lumps: vec![LumpSummary {
                name: "LMSHIFT".to_string(),
                offset: 2212,
                length: 512,
            }],
            directory_truncated: false,
            face_count: Some(3),
        }
    }

    #[test]
    fn test_text_layout() {
        let text = to_text_string(&summary()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Filename: start.bsp");
        assert_eq!(lines[1], " Version: BSP2");
        assert_eq!(lines[2], "   Faces: 3");
        assert_eq!(lines[4], "     Entities                      2.0 kB @      124 ofs");
        assert_eq!(lines[5], "  XLumps:                                 @     2172 ofs");
        assert_eq!(lines[6], "     LMSHIFT                       0.5 kB @     2212 ofs");
    }

    #[test]
    fn test_no_xlumps_section_without_extensions() {
        let mut s = summary();
        s.extension_lumps.clear();
        let text = to_text_string(&s).unwrap();
        assert!(!text.contains("XLumps"));
    }
}
