use super::path::resolve_within;
use super::validator::{MAX_ENTRY_SIZE, ValidationPolicy};
use super::{ArchiveEntry, ArchiveError, ArchiveHandle};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};

/// Files written by one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Extracted files relative to the target directory, in archive order.
    pub files: Vec<Utf8PathBuf>,
    pub bytes_written: u64,
}

/// Writes archive entries below a target directory.
///
/// Containment is checked here for every entry regardless of any earlier
/// validation. Entry sizes are enforced on the bytes actually decompressed,
/// not only on the sizes the archive declares. On error, files already
/// written stay in place; the caller owns rollback.
#[derive(Debug, Clone, Copy)]
pub struct SafeExtractor {
    max_entry_size: u64,
}

impl Default for SafeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SafeExtractor {
    pub fn new() -> Self {
        Self {
            max_entry_size: MAX_ENTRY_SIZE,
        }
    }

    /// Extractor enforcing the entry size ceiling of `policy`.
    pub fn with_policy(policy: ValidationPolicy) -> Self {
        Self {
            max_entry_size: policy.max_entry_size,
        }
    }

    pub fn extract(
        &self,
        handle: &ArchiveHandle,
        target_dir: &Utf8Path,
    ) -> Result<ExtractionReport, ArchiveError> {
        self.extract_with_progress(handle, target_dir, |_, _| {})
    }

    /// Like [`extract`](Self::extract), calling `progress(done, total)` after
    /// each entry.
    pub fn extract_with_progress<F>(
        &self,
        handle: &ArchiveHandle,
        target_dir: &Utf8Path,
        mut progress: F,
    ) -> Result<ExtractionReport, ArchiveError>
    where
        F: FnMut(usize, usize),
    {
        let write_err = |path: &Utf8Path| {
            let path = path.to_path_buf();
            move |source: io::Error| ArchiveError::Write { path, source }
        };

        fs::create_dir_all(target_dir).map_err(write_err(target_dir))?;
        let root = target_dir
            .canonicalize_utf8()
            .map_err(write_err(target_dir))?;

        let mut archive = handle.reader()?;
        let total = handle.len();
        let mut report = ExtractionReport::default();

        for (index, entry) in handle.entries().iter().enumerate() {
            let destination = resolve_within(&root, &entry.name)
                .ok_or_else(|| ArchiveError::PathTraversal(entry.name.clone()))?;

            if entry.is_directory {
                fs::create_dir_all(&destination).map_err(write_err(&destination))?;
                let real = destination
                    .canonicalize_utf8()
                    .map_err(write_err(&destination))?;
                if !real.starts_with(&root) {
                    return Err(ArchiveError::PathTraversal(entry.name.clone()));
                }
                progress(index + 1, total);
                continue;
            }

            if destination == root {
                return Err(ArchiveError::PathTraversal(entry.name.clone()));
            }

            let parent = destination.parent().unwrap_or(root.as_path());
            fs::create_dir_all(parent).map_err(write_err(parent))?;

            // A symlinked directory inside the target could redirect writes.
            let real_parent = parent.canonicalize_utf8().map_err(write_err(parent))?;
            if !real_parent.starts_with(&root) {
                return Err(ArchiveError::PathTraversal(entry.name.clone()));
            }
            if fs::symlink_metadata(&destination)
                .map(|meta| meta.file_type().is_symlink())
                .unwrap_or(false)
            {
                return Err(ArchiveError::PathTraversal(entry.name.clone()));
            }

            if entry.size > self.max_entry_size {
                return Err(ArchiveError::EntryTooLarge {
                    name: entry.name.clone(),
                    size: entry.size,
                    limit: self.max_entry_size,
                });
            }

            let source = archive.by_index(index).map_err(io::Error::other)?;
            let file = File::create(&destination).map_err(write_err(&destination))?;
            let mut writer = BufWriter::new(file);
            let written = copy_bounded(entry, source, &mut writer, &destination)?;
            writer.flush().map_err(write_err(&destination))?;

            tracing::debug!("Extracted {} ({} bytes)", entry.name, written);

            report.bytes_written += written;
            if let Ok(relative) = destination.strip_prefix(&root) {
                report.files.push(relative.to_path_buf());
            }
            progress(index + 1, total);
        }

        tracing::info!(
            "Extracted {} files ({} bytes) from {} into {}",
            report.files.len(),
            report.bytes_written,
            handle.path(),
            root
        );

        Ok(report)
    }
}

/// Copy one entry, refusing to produce more bytes than it declared.
///
/// Reading one byte past the declared size is enough to detect a lying
/// header; an honest entry still reaches EOF, which is where the zip reader
/// verifies the CRC.
fn copy_bounded<R: Read, W: Write>(
    entry: &ArchiveEntry,
    source: R,
    writer: &mut W,
    destination: &Utf8Path,
) -> Result<u64, ArchiveError> {
    let mut limited = source.take(entry.size.saturating_add(1));
    let mut buffer = [0u8; 64 * 1024];
    let mut written = 0u64;

    loop {
        let read = match limited.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(read_error(entry, e)),
        };

        written += read as u64;
        if written > entry.size {
            return Err(ArchiveError::EntryTooLarge {
                name: entry.name.clone(),
                size: written,
                limit: entry.size,
            });
        }

        writer
            .write_all(&buffer[..read])
            .map_err(|source| ArchiveError::Write {
                path: destination.to_path_buf(),
                source,
            })?;
    }

    Ok(written)
}

fn read_error(entry: &ArchiveEntry, source: io::Error) -> ArchiveError {
    match source.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => ArchiveError::CorruptEntry {
            name: entry.name.clone(),
            source,
        },
        _ => ArchiveError::Io(source),
    }
}
