//! Shared fixtures for integration tests.

#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use std::io::Write;
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Temporary directory plus its UTF-8 path.
pub fn temp_dir() -> (TempDir, Utf8PathBuf) {
    let temp = TempDir::new().unwrap();
    let path = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
    (temp, path)
}

/// Write a stored (uncompressed) zip. Names ending in `/` become directories.
pub fn write_zip(path: &Utf8Path, entries: &[(&str, &[u8])]) -> Utf8PathBuf {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (name, contents) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(contents).unwrap();
        }
    }

    zip.finish().unwrap();
    path.to_path_buf()
}

/// Zip with `count` small files named `f00000.txt`, `f00001.txt`, ...
pub fn write_zip_with_entries(path: &Utf8Path, count: usize) -> Utf8PathBuf {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for i in 0..count {
        zip.start_file(format!("f{i:05}.txt"), options).unwrap();
    }

    zip.finish().unwrap();
    path.to_path_buf()
}

pub fn resource_manifest(uuid: &str, name: &str) -> String {
    format!(
        r#"{{
  "format_version": 2,
  "header": {{ "name": "{name}", "uuid": "{uuid}", "version": [1, 2, 3] }},
  "modules": [{{ "type": "resources", "uuid": "00000000-0000-0000-0000-000000000001" }}]
}}"#
    )
}

pub fn behavior_manifest(uuid: &str, name: &str) -> String {
    format!(
        r#"{{
  "format_version": 2,
  "header": {{ "name": "{name}", "uuid": "{uuid}", "version": [0, 9, 0] }},
  "modules": [{{ "type": "data", "uuid": "00000000-0000-0000-0000-000000000002" }}]
}}"#
    )
}

const LOCAL_HEADER: &[u8] = b"PK\x03\x04";
const CENTRAL_HEADER: &[u8] = b"PK\x01\x02";

/// Zip with one deflated entry, compressed from `contents`.
pub fn write_deflated_zip(path: &Utf8Path, name: &str, contents: &[u8]) -> Utf8PathBuf {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file(name, options).unwrap();
    zip.write_all(contents).unwrap();
    zip.finish().unwrap();
    path.to_path_buf()
}

/// Overwrite a little-endian u32 field of `entry`'s headers.
///
/// Offsets are relative to the start of the local and central headers
/// respectively; `None` leaves that header alone.
pub fn patch_entry_field(
    path: &Utf8Path,
    entry: &str,
    local_offset: Option<usize>,
    central_offset: Option<usize>,
    value: u32,
) {
    let mut bytes = std::fs::read(path).unwrap();
    let mut patched = 0;

    for (signature, name_len_at, name_at, offset) in [
        (LOCAL_HEADER, 26, 30, local_offset),
        (CENTRAL_HEADER, 28, 46, central_offset),
    ] {
        let Some(offset) = offset else { continue };
        let mut pos = 0;
        while let Some(found) = bytes[pos..]
            .windows(4)
            .position(|window| window == signature)
        {
            let start = pos + found;
            pos = start + 4;
            let name_len =
                u16::from_le_bytes([bytes[start + name_len_at], bytes[start + name_len_at + 1]])
                    as usize;
            let name_start = start + name_at;
            if bytes.get(name_start..name_start + name_len) != Some(entry.as_bytes()) {
                continue;
            }
            bytes[start + offset..start + offset + 4].copy_from_slice(&value.to_le_bytes());
            patched += 1;
        }
    }

    assert!(patched > 0, "entry {entry} not found in {path}");
    std::fs::write(path, bytes).unwrap();
}

/// Declare `size` as the uncompressed size of `entry`.
pub fn patch_declared_size(path: &Utf8Path, entry: &str, size: u32) {
    patch_entry_field(path, entry, Some(22), Some(24), size);
}

/// Replace the CRC-32 recorded for `entry` in both headers.
pub fn corrupt_crc(path: &Utf8Path, entry: &str) {
    patch_entry_field(path, entry, Some(14), Some(16), 0xDEAD_BEEF);
}
