use crate::models::DataLayout;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;
use thiserror::Error;
use url::Url;

/// Highest numeric suffix tried when picking a free staging name.
pub const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Paths under this prefix come from the desktop document portal and may not
/// be visible to `exists()` even though they can be read.
const PORTAL_PREFIX: &str = "/run/user/";

/// Errors that can occur while staging a file
#[derive(Error, Debug)]
pub enum StageError {
    #[error("No source path given")]
    EmptyPath,

    #[error("Invalid file URL: {0}")]
    InvalidUrl(String),

    #[error("Source file does not exist: {0}")]
    SourceMissing(Utf8PathBuf),

    #[error("Failed to create imports directory {path}: {source}")]
    ImportsDir {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No free file name for {0} in the imports directory")]
    NoFreeName(String),

    #[error("Failed to copy {from} to {to}: {source}")]
    CopyFailed {
        from: Utf8PathBuf,
        to: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A file made addressable for an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub source_path: Utf8PathBuf,
    pub staged_path: Utf8PathBuf,
    /// False when the source already lived under the data root and was used
    /// in place.
    pub copied: bool,
}

/// Copies externally supplied files into `<data_root>/imports`.
#[derive(Debug, Clone)]
pub struct FileStager {
    layout: DataLayout,
}

impl FileStager {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    pub fn imports_dir(&self) -> Utf8PathBuf {
        self.layout.imports_dir()
    }

    /// Make `original` addressable under the data root.
    ///
    /// Accepts plain paths and `file://` URLs. Sources already under the data
    /// root are returned unchanged without copying.
    pub fn stage(&self, original: &str) -> Result<StagedFile, StageError> {
        let source = resolve_source(original)?;

        if !source.exists() && !source.as_str().starts_with(PORTAL_PREFIX) {
            return Err(StageError::SourceMissing(source));
        }

        if is_within(&source, self.layout.data_root()) {
            tracing::debug!("{} is already under the data root, using it in place", source);
            return Ok(StagedFile {
                staged_path: source.clone(),
                source_path: source,
                copied: false,
            });
        }

        let imports = self.imports_dir();
        fs::create_dir_all(&imports).map_err(|source| StageError::ImportsDir {
            path: imports.clone(),
            source,
        })?;

        let file_name = source.file_name().unwrap_or("import");
        let destination = unique_destination(&imports, file_name)
            .ok_or_else(|| StageError::NoFreeName(file_name.to_string()))?;

        copy_with_fallback(&source, &destination)?;
        tracing::info!("Staged {} as {}", source, destination);

        Ok(StagedFile {
            source_path: source,
            staged_path: destination,
            copied: true,
        })
    }

    /// Delete `path` if it lives in the imports directory. Anything else is
    /// left alone and reported as `false`.
    pub fn unstage(&self, path: &Utf8Path) -> bool {
        if !is_within(path, &self.imports_dir()) || !path.is_file() {
            return false;
        }
        match fs::remove_file(path) {
            Ok(()) => {
                tracing::debug!("Removed staged file {}", path);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to remove staged file {}: {}", path, e);
                false
            }
        }
    }

    /// Remove a staged copy; in-place files are never touched.
    pub fn cleanup(&self, staged: &StagedFile) -> bool {
        staged.copied && self.unstage(&staged.staged_path)
    }
}

fn resolve_source(original: &str) -> Result<Utf8PathBuf, StageError> {
    let trimmed = original.trim();
    if trimmed.is_empty() {
        return Err(StageError::EmptyPath);
    }

    if !trimmed.starts_with("file:") {
        return Ok(Utf8PathBuf::from(trimmed));
    }

    let url = Url::parse(trimmed).map_err(|e| StageError::InvalidUrl(format!("{trimmed}: {e}")))?;
    let path = url
        .to_file_path()
        .map_err(|_| StageError::InvalidUrl(trimmed.to_string()))?;
    Utf8PathBuf::from_path_buf(path).map_err(|_| StageError::InvalidUrl(trimmed.to_string()))
}

/// Compare canonical forms where they exist, lexical forms otherwise.
fn is_within(path: &Utf8Path, root: &Utf8Path) -> bool {
    let path = path
        .canonicalize_utf8()
        .unwrap_or_else(|_| path.to_path_buf());
    let root = root
        .canonicalize_utf8()
        .unwrap_or_else(|_| root.to_path_buf());
    path.starts_with(root)
}

/// `name`, then `stem-1.ext`, `stem-2.ext`, ... until a free one is found.
fn unique_destination(dir: &Utf8Path, file_name: &str) -> Option<Utf8PathBuf> {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return Some(candidate);
    }

    let name = Utf8Path::new(file_name);
    let stem = name.file_stem().unwrap_or(file_name);
    let extension = name.extension();

    (1..MAX_NAME_ATTEMPTS)
        .map(|i| match extension {
            Some(ext) => dir.join(format!("{stem}-{i}.{ext}")),
            None => dir.join(format!("{stem}-{i}")),
        })
        .find(|candidate| !candidate.exists())
}

/// Plain copy first; sandboxed sources that refuse it get a read-all/write-all
/// copy. A failed fallback leaves nothing behind.
fn copy_with_fallback(source: &Utf8Path, destination: &Utf8Path) -> Result<(), StageError> {
    let first_error = match fs::copy(source, destination) {
        Ok(_) => return Ok(()),
        Err(e) => e,
    };
    tracing::warn!(
        "Direct copy of {} failed ({}), retrying with stream copy",
        source,
        first_error
    );

    let result = fs::read(source).and_then(|bytes| fs::write(destination, bytes));
    result.map_err(|source_err| {
        let _ = fs::remove_file(destination);
        StageError::CopyFailed {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
            source: source_err,
        }
    })
}
