use super::{ArchiveEntry, ArchiveError};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use zip::ZipArchive;

/// Local file header signature every zip archive starts with.
pub const ZIP_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Read-only view of an opened archive.
///
/// The entry list is snapshotted from the central directory on open. Reads
/// reopen the file each time, so a handle never pins an OS file handle and
/// can be listed any number of times.
#[derive(Debug, Clone)]
pub struct ArchiveHandle {
    path: Utf8PathBuf,
    file_size: u64,
    entries: Vec<ArchiveEntry>,
}

impl ArchiveHandle {
    /// Open `path`, failing with [`ArchiveError::InvalidFormat`] unless it is
    /// a readable file starting with [`ZIP_SIGNATURE`] and carrying a
    /// readable central directory.
    pub fn open(path: &Utf8Path) -> Result<Self, ArchiveError> {
        let invalid = |reason: String| ArchiveError::InvalidFormat {
            path: path.to_path_buf(),
            reason,
        };

        let metadata = fs::metadata(path).map_err(|e| invalid(e.to_string()))?;
        if !metadata.is_file() {
            return Err(invalid("not a regular file".to_string()));
        }

        if !has_zip_signature(path).map_err(|e| invalid(e.to_string()))? {
            return Err(invalid("missing zip signature".to_string()));
        }

        let file = File::open(path).map_err(|e| invalid(e.to_string()))?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| invalid(e.to_string()))?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|e| invalid(format!("entry {index}: {e}")))?;
            entries.push(ArchiveEntry {
                name: entry.name().to_string(),
                size: entry.size(),
                is_directory: entry.is_dir(),
            });
        }

        tracing::debug!("Opened archive {} with {} entries", path, entries.len());

        Ok(Self {
            path: path.to_path_buf(),
            file_size: metadata.len(),
            entries,
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Size of the archive file itself.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Entries in archive order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-read the signature from disk.
    pub fn signature_matches(&self) -> io::Result<bool> {
        has_zip_signature(&self.path)
    }

    /// First non-directory entry whose name ends with `suffix`, ignoring
    /// ASCII case. Archive order decides between several matches.
    pub fn find_first_matching(&self, suffix: &str) -> Option<&ArchiveEntry> {
        let suffix = suffix.to_ascii_lowercase();
        self.entries
            .iter()
            .filter(|entry| !entry.is_directory)
            .find(|entry| entry.name.to_ascii_lowercase().ends_with(&suffix))
    }

    /// Raw bytes of the first file entry named exactly `name`.
    pub fn read_entry(&self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let index = self
            .entries
            .iter()
            .position(|entry| !entry.is_directory && entry.name == name)
            .ok_or_else(|| ArchiveError::EntryNotFound(name.to_string()))?;

        let mut archive = self.reader()?;
        let mut file = archive.by_index(index).map_err(io::Error::other)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Fresh reader over the archive, indexed like [`entries`](Self::entries).
    pub(crate) fn reader(&self) -> Result<ZipArchive<BufReader<File>>, ArchiveError> {
        let file = File::open(&self.path)?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(io::Error::other)?;
        if archive.len() != self.entries.len() {
            return Err(ArchiveError::InvalidFormat {
                path: self.path.clone(),
                reason: "archive changed since it was opened".to_string(),
            });
        }
        Ok(archive)
    }
}

fn has_zip_signature(path: &Utf8Path) -> io::Result<bool> {
    let mut header = [0u8; 4];
    let mut file = File::open(path)?;
    match file.read_exact(&mut header) {
        Ok(()) => Ok(header == ZIP_SIGNATURE),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}
