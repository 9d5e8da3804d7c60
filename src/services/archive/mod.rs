//! Zip archive handling for untrusted input.
//!
//! Three layers, each usable on its own:
//! - [`ArchiveHandle`]: opens an archive, checks the signature and snapshots
//!   the central directory
//! - [`ArchiveValidator`]: policy checks (entry count, sizes, traversal)
//! - [`SafeExtractor`]: writes entries below a target directory, re-checking
//!   containment for every entry on its own
//!
//! Nothing is written to disk before [`ArchiveValidator::validate`] passes;
//! the extractor still refuses escaping entries even if handed an archive
//! that was never validated.

pub mod extractor;
pub mod inspector;
pub mod path;
pub mod validator;

pub use extractor::{ExtractionReport, SafeExtractor};
pub use inspector::{ArchiveHandle, ZIP_SIGNATURE};
pub use validator::{ArchiveValidator, MAX_ENTRIES, MAX_ENTRY_SIZE, ValidationPolicy};

use camino::Utf8PathBuf;
use serde::Serialize;
use std::io;
use thiserror::Error;

/// One entry of an archive's central directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    /// Raw entry name as stored in the archive.
    pub name: String,
    /// Declared uncompressed size in bytes.
    pub size: u64,
    pub is_directory: bool,
}

/// Errors raised while opening, validating or extracting an archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Invalid archive {path}: {reason}")]
    InvalidFormat { path: Utf8PathBuf, reason: String },

    #[error("Entry not found in archive: {0}")]
    EntryNotFound(String),

    #[error("Archive has {count} entries, limit is {limit}")]
    TooManyEntries { count: usize, limit: usize },

    #[error("Entry escapes the extraction directory: {0}")]
    PathTraversal(String),

    #[error("Entry {name} is {size} bytes, limit is {limit}")]
    EntryTooLarge { name: String, size: u64, limit: u64 },

    #[error("Corrupt entry {name}: {source}")]
    CorruptEntry {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Archive file is {size} bytes, limit is {limit}")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ArchiveError {
    /// True for violations of archive policy, as opposed to local I/O trouble.
    pub fn is_policy_violation(&self) -> bool {
        !matches!(self, ArchiveError::Write { .. } | ArchiveError::Io(_))
    }
}
