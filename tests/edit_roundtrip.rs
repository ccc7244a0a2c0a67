//! End-to-end edits on map files written to a temporary directory.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use bspxmgr::bspx::load_extensions;
use bspxmgr::obfuscate::obfuscate_file;
use bspxmgr::parser::{ExtensionEntry, ExtensionHeader, Lump, LumpKind, PrimaryHeader};
use bspxmgr::{output_path_for, remove_lump, rewrite, set_lump, BspError, BspFile, BspVersion, TextureNameObfuscator};
use tempfile::tempdir;

/// Build a small BSP29 map: an entities lump, a textures lump holding
/// `textures`, a faces lump of two records, and the given extension lumps.
fn build_map(textures: &[&str], extensions: &[(&str, &str)]) -> Vec<u8> {
    let entities = b"{\n\"classname\" \"worldspawn\"\n}\n\0".to_vec();

    let mut tex = (textures.len() as u32).to_le_bytes().to_vec();
    let table_len = 4 + 4 * textures.len();
    for i in 0..textures.len() {
        tex.extend_from_slice(&((table_len + i * 40) as u32).to_le_bytes());
    }
    for name in textures {
        let mut field = [0u8; 16];
        field[..name.len()].copy_from_slice(name.as_bytes());
        tex.extend_from_slice(&field);
        tex.extend_from_slice(&[0x77; 24]);
    }

    let faces = vec![0x11u8; 40];

    let mut header = PrimaryHeader {
        version: BspVersion::Bsp29,
        lumps: [Lump::default(); LumpKind::COUNT],
    };
    let mut body = Vec::new();
    let mut place = |kind: LumpKind, data: &[u8], body: &mut Vec<u8>| {
        header.lumps[kind as usize] = Lump {
            offset: (PrimaryHeader::SIZE + body.len()) as u32,
            length: data.len() as u32,
        };
        body.extend_from_slice(data);
    };
    // Textures sit after faces on disk even though they come first in the directory.
    place(LumpKind::Entities, &entities, &mut body);
    place(LumpKind::Faces, &faces, &mut body);
    place(LumpKind::Textures, &tex, &mut body);

    let mut data = header.to_bytes().to_vec();
    data.extend(body);

    if !extensions.is_empty() {
        let start = data.len();
        data.extend_from_slice(
            &ExtensionHeader {
                tag: *b"BSPX",
                count: extensions.len() as i32,
            }
            .to_bytes(),
        );
        let mut offset = start + ExtensionHeader::SIZE + ExtensionEntry::SIZE * extensions.len();
        for (name, payload) in extensions {
            let entry = ExtensionEntry {
                name: ExtensionEntry::encode_name(name).unwrap(),
                offset: offset as u32,
                length: payload.len() as u32,
            };
            data.extend_from_slice(&entry.to_bytes());
            offset += payload.len();
        }
        for (_, payload) in extensions {
            data.extend_from_slice(payload.as_bytes());
        }
    }
    data
}

fn write_map(dir: &Path, data: &[u8]) -> PathBuf {
    let path = dir.join("test.bsp");
    fs::write(&path, data).unwrap();
    path
}

fn lumps_of(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut cursor = Cursor::new(fs::read(path).unwrap());
    let bsp = BspFile::read(&mut cursor).unwrap();
    load_extensions(&bsp, &mut cursor)
        .unwrap()
        .into_iter()
        .map(|(name, payload)| (name.to_string(), payload))
        .collect()
}

/// Append a one-lump extension region whose name field is `field` verbatim.
fn append_raw_extension(data: &mut Vec<u8>, field: [u8; ExtensionEntry::NAME_LEN], payload: &[u8]) {
    let offset = data.len() + ExtensionHeader::SIZE + ExtensionEntry::SIZE;
    data.extend_from_slice(&ExtensionHeader { tag: *b"BSPX", count: 1 }.to_bytes());
    data.extend_from_slice(
        &ExtensionEntry {
            name: field,
            offset: offset as u32,
            length: payload.len() as u32,
        }
        .to_bytes(),
    );
    data.extend_from_slice(payload);
}

#[test]
fn test_noop_rewrite_preserves_primary_and_lumps() {
    let dir = tempdir().unwrap();
    let data = build_map(&["wall"], &[("ZETA", "zz"), ("ALPHA", "aaaa")]);
    let input = write_map(dir.path(), &data);
    let output = dir.path().join("out.bsp");

    let mut file = fs::File::open(&input).unwrap();
    let bsp = BspFile::read(&mut file).unwrap();
    rewrite(&bsp, &mut file, &output, |_| {}).unwrap();

    let written = fs::read(&output).unwrap();
    let primary_end = bsp.extension_offset as usize;
    assert_eq!(written[..primary_end], data[..primary_end]);
    assert_eq!(written.len(), data.len());
    assert_eq!(
        lumps_of(&output),
        vec![
            ("ALPHA".to_string(), b"aaaa".to_vec()),
            ("ZETA".to_string(), b"zz".to_vec()),
        ]
    );
}

#[test]
fn test_noop_rewrite_of_legacy_map_is_identical() {
    let dir = tempdir().unwrap();
    let data = build_map(&["wall"], &[]);
    let input = write_map(dir.path(), &data);
    let output = dir.path().join("out.bsp");

    let mut file = fs::File::open(&input).unwrap();
    let bsp = BspFile::read(&mut file).unwrap();
    assert!(bsp.extension_header.is_none());
    rewrite(&bsp, &mut file, &output, |_| {}).unwrap();

    assert_eq!(fs::read(&output).unwrap(), data);
}

#[test]
fn test_set_lump_on_legacy_map_adds_bspx() {
    let dir = tempdir().unwrap();
    let data = build_map(&["wall"], &[]);
    let input = write_map(dir.path(), &data);
    let output = output_path_for(&input);

    set_lump(&input, &output, "LMSHIFT", vec![4, 4, 4]).unwrap();

    let written = fs::read(&output).unwrap();
    let bsp = BspFile::read(&mut Cursor::new(written.clone())).unwrap();
    assert_eq!(bsp.extension_header.unwrap().tag, *b"BSPX");
    assert_eq!(bsp.extension_names(), vec!["LMSHIFT"]);
    assert_eq!(written[..data.len()], data[..]);
    assert_eq!(fs::read(&input).unwrap(), data);
}

#[test]
fn test_upsert_twice_keeps_single_entry() {
    let dir = tempdir().unwrap();
    let data = build_map(&["wall"], &[("RGBLIGHTING", "rgb")]);
    let input = write_map(dir.path(), &data);
    let first = dir.path().join("first.bsp");
    let second = dir.path().join("second.bsp");

    set_lump(&input, &first, "LMSHIFT", b"new".to_vec()).unwrap();
    set_lump(&first, &second, "LMSHIFT", b"new".to_vec()).unwrap();

    assert_eq!(
        lumps_of(&second),
        vec![
            ("LMSHIFT".to_string(), b"new".to_vec()),
            ("RGBLIGHTING".to_string(), b"rgb".to_vec()),
        ]
    );
}

#[test]
fn test_set_replaces_existing_payload() {
    let dir = tempdir().unwrap();
    let data = build_map(&["wall"], &[("LMSHIFT", "old payload")]);
    let input = write_map(dir.path(), &data);
    let output = output_path_for(&input);

    set_lump(&input, &output, "LMSHIFT", b"x".to_vec()).unwrap();
    assert_eq!(lumps_of(&output), vec![("LMSHIFT".to_string(), b"x".to_vec())]);
}

#[test]
fn test_remove_then_absent() {
    let dir = tempdir().unwrap();
    let data = build_map(&["wall"], &[("A", "1"), ("B", "22")]);
    let input = write_map(dir.path(), &data);
    let output = output_path_for(&input);

    assert!(remove_lump(&input, &output, "A").unwrap());
    let bsp = BspFile::open(&output).unwrap();
    assert_eq!(bsp.extension_names(), vec!["B"]);
    assert_eq!(bsp.extension_header.unwrap().count, 1);
}

#[test]
fn test_remove_missing_is_noop() {
    let dir = tempdir().unwrap();
    let data = build_map(&["wall"], &[("A", "1"), ("B", "22")]);
    let input = write_map(dir.path(), &data);
    let output = output_path_for(&input);

    assert!(!remove_lump(&input, &output, "MISSING").unwrap());
    assert_eq!(lumps_of(&output), lumps_of(&input));
    assert_eq!(fs::read(&output).unwrap(), data);
}

#[test]
fn test_noop_rewrite_keeps_non_utf8_name() {
    let dir = tempdir().unwrap();
    let mut field = [0u8; ExtensionEntry::NAME_LEN];
    field[..4].copy_from_slice(b"LM\xFFX");
    let mut data = build_map(&["wall"], &[]);
    append_raw_extension(&mut data, field, b"payload");
    let input = write_map(dir.path(), &data);
    let output = output_path_for(&input);

    assert!(!remove_lump(&input, &output, "MISSING").unwrap());
    assert_eq!(fs::read(&output).unwrap(), data);
}

#[test]
fn test_noop_rewrite_keeps_bytes_after_terminator() {
    let dir = tempdir().unwrap();
    let mut field = [0u8; ExtensionEntry::NAME_LEN];
    field[..8].copy_from_slice(b"AB\0\0\0CDE");
    let mut data = build_map(&["wall"], &[]);
    append_raw_extension(&mut data, field, b"xyz");
    let input = write_map(dir.path(), &data);
    let output = output_path_for(&input);

    assert!(!remove_lump(&input, &output, "MISSING").unwrap());
    let written = fs::read(&output).unwrap();
    assert_eq!(written, data);
    let bsp = BspFile::open(&output).unwrap();
    assert_eq!(bsp.extensions[0].name, field);
}

#[test]
fn test_primary_region_past_eof_is_short_copy() {
    let dir = tempdir().unwrap();
    let mut header = PrimaryHeader {
        version: BspVersion::Bsp29,
        lumps: [Lump::default(); LumpKind::COUNT],
    };
    header.lumps[LumpKind::Entities as usize] = Lump {
        offset: PrimaryHeader::SIZE as u32,
        length: 1000,
    };
    let mut data = header.to_bytes().to_vec();
    data.resize(224, b' ');
    let input = write_map(dir.path(), &data);
    let output = output_path_for(&input);

    assert!(matches!(
        set_lump(&input, &output, "LMSHIFT", vec![1]),
        Err(BspError::ShortCopy { expected: 1124, copied: 224 })
    ));
    assert!(!output.exists());
}

#[test]
fn test_invalid_name_creates_no_output() {
    let dir = tempdir().unwrap();
    let input = write_map(dir.path(), &build_map(&["wall"], &[]));
    let output = output_path_for(&input);

    let result = set_lump(&input, &output, "THIS_NAME_IS_FAR_TOO_LONG_FOR_BSPX", vec![1]);
    assert!(matches!(result, Err(BspError::InvalidLumpName(_))));
    assert!(!output.exists());
}

#[test]
fn test_refuses_to_overwrite_input() {
    let dir = tempdir().unwrap();
    let data = build_map(&["wall"], &[("A", "1")]);
    let input = write_map(dir.path(), &data);

    assert!(matches!(
        remove_lump(&input, &input, "A"),
        Err(BspError::OutputIsInput(_))
    ));
    assert_eq!(fs::read(&input).unwrap(), data);
}

#[test]
fn test_truncated_directory_is_not_rewritten() {
    let dir = tempdir().unwrap();
    let mut data = build_map(&["wall"], &[("A", "1"), ("B", "2")]);
    let bsp = BspFile::read(&mut Cursor::new(data.clone())).unwrap();
    // Cut the file in the middle of the second directory entry.
    data.truncate(bsp.extension_offset as usize + ExtensionHeader::SIZE + ExtensionEntry::SIZE + 10);
    let input = write_map(dir.path(), &data);
    let output = output_path_for(&input);

    assert!(matches!(
        set_lump(&input, &output, "C", vec![3]),
        Err(BspError::TruncatedExtensionDirectory { expected: 2, found: 1 })
    ));
    assert!(!output.exists());
}

#[test]
fn test_missing_input_reports_path() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("missing.bsp");
    assert!(matches!(
        BspFile::open(&input),
        Err(BspError::CannotOpenInput { .. })
    ));
}

#[test]
fn test_obfuscate_writes_copy() {
    let dir = tempdir().unwrap();
    let data = build_map(&["+0base", "+1base", "+2base", "+0other", "*water1", "{"], &[("A", "1")]);
    let input = write_map(dir.path(), &data);
    let output = output_path_for(&input);

    let mut obfuscator = TextureNameObfuscator::seeded(7);
    let renames = obfuscate_file(&input, &output, &mut obfuscator).unwrap();

    assert_eq!(fs::read(&input).unwrap(), data);
    let written = fs::read(&output).unwrap();
    assert_eq!(written.len(), data.len());

    let new: Vec<&str> = renames.iter().map(|r| r.new.as_str()).collect();
    assert_eq!(&new[0][2..], &new[1][2..]);
    assert_eq!(&new[1][2..], &new[2][2..]);
    assert_ne!(&new[0][2..], &new[3][2..]);
    assert!(new[4].starts_with("*water"));
    assert!(new[5].starts_with('{'));
    assert!(new.iter().all(|n| n.len() == 15));

    // Extension region and directory survive untouched.
    assert_eq!(lumps_of(&output), lumps_of(&input));

    let bsp = BspFile::open(&output).unwrap();
    let tex = bsp.lump(LumpKind::Textures);
    let first_name = tex.offset as usize + 4 + 4 * 6;
    assert_eq!(&written[first_name..first_name + 15], new[0].as_bytes());
    assert_eq!(written[first_name + 15], 0);
}
