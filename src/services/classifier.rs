//! Package classification from embedded `manifest.json` files.

use crate::models::{
    DEFAULT_PACK_VERSION, Manifest, PackageMetadata, PackageType, WorldLayout,
};
use crate::services::archive::ArchiveHandle;

/// Name suffix used to locate a manifest, possibly nested in a folder.
pub const MANIFEST_SUFFIX: &str = "manifest.json";

/// Locate and parse the archive's manifest.
///
/// Returns `None` when there is no manifest or it is not a JSON object.
pub fn read_manifest(handle: &ArchiveHandle) -> Option<Manifest> {
    let entry = handle.find_first_matching(MANIFEST_SUFFIX)?;

    let bytes = match handle.read_entry(&entry.name) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to read {} from {}: {}", entry.name, handle.path(), e);
            return None;
        }
    };

    match Manifest::parse(&bytes) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            tracing::warn!("Unparseable manifest {} in {}: {}", entry.name, handle.path(), e);
            None
        }
    }
}

/// Classify the archive by its manifest. No manifest means [`PackageType::Unknown`].
pub fn classify(handle: &ArchiveHandle) -> PackageType {
    let kind = read_manifest(handle)
        .map(|manifest| manifest.package_type())
        .unwrap_or(PackageType::Unknown);
    tracing::debug!("Classified {} as {}", handle.path(), kind);
    kind
}

pub fn uuid(handle: &ArchiveHandle) -> Option<String> {
    read_manifest(handle).and_then(|m| m.uuid())
}

pub fn name(handle: &ArchiveHandle) -> Option<String> {
    read_manifest(handle).and_then(|m| m.name())
}

/// Pack version as `major.minor.patch`, `"1.0.0"` when absent or malformed.
pub fn version(handle: &ArchiveHandle) -> String {
    read_manifest(handle)
        .map(|m| m.version_string())
        .unwrap_or_else(|| DEFAULT_PACK_VERSION.to_string())
}

pub fn metadata(handle: &ArchiveHandle) -> PackageMetadata {
    read_manifest(handle)
        .map(|m| PackageMetadata::from_manifest(&m))
        .unwrap_or_else(PackageMetadata::unknown)
}

/// World display name: manifest `level_name`, else the archive's file stem.
pub fn world_level_name(handle: &ArchiveHandle) -> String {
    read_manifest(handle)
        .and_then(|m| m.level_name())
        .filter(|name| !name.trim().is_empty())
        .or_else(|| handle.path().file_stem().map(str::to_string))
        .unwrap_or_default()
}

/// Whether the archive carries a `db/` folder or a `level.dat`.
pub fn world_layout(handle: &ArchiveHandle) -> WorldLayout {
    let mut layout = WorldLayout::default();
    for entry in handle.entries() {
        let name = entry.name.replace('\\', "/");
        let mut segments: Vec<&str> = name.split('/').filter(|s| !s.is_empty()).collect();
        let last = if entry.is_directory { None } else { segments.pop() };

        if segments.iter().any(|s| s.eq_ignore_ascii_case("db")) {
            layout.has_db = true;
        }
        if last.is_some_and(|file| file.eq_ignore_ascii_case("level.dat")) {
            layout.has_level_dat = true;
        }
    }
    layout
}
