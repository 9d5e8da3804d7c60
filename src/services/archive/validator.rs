use super::path::is_traversal;
use super::{ArchiveError, ArchiveHandle};

/// Default ceiling on the number of entries in one archive.
pub const MAX_ENTRIES: usize = 10_000;

/// Default ceiling on the size of one entry, and of the archive file itself.
pub const MAX_ENTRY_SIZE: u64 = 2_000_000_000;

/// Limits applied to untrusted archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub max_entries: usize,
    pub max_entry_size: u64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_entries: MAX_ENTRIES,
            max_entry_size: MAX_ENTRY_SIZE,
        }
    }
}

/// Policy checks over an [`ArchiveHandle`].
///
/// Checks run in a fixed order: signature, entry count, traversal, entry
/// sizes, archive size. [`validate`](Self::validate) fails closed with the
/// first violation; [`inspect`](Self::inspect) reports all of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveValidator {
    policy: ValidationPolicy,
}

impl ArchiveValidator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    pub fn validate(&self, handle: &ArchiveHandle) -> Result<(), ArchiveError> {
        match self.inspect(handle).into_iter().next() {
            Some(violation) => {
                tracing::warn!("Rejected archive {}: {}", handle.path(), violation);
                Err(violation)
            }
            None => Ok(()),
        }
    }

    /// Every violation found, in check order. Empty means the archive passed.
    pub fn inspect(&self, handle: &ArchiveHandle) -> Vec<ArchiveError> {
        let mut violations = Vec::new();

        // The file may have been swapped since it was opened.
        match handle.signature_matches() {
            Ok(true) => {}
            Ok(false) => violations.push(ArchiveError::InvalidFormat {
                path: handle.path().to_path_buf(),
                reason: "missing zip signature".to_string(),
            }),
            Err(e) => violations.push(ArchiveError::InvalidFormat {
                path: handle.path().to_path_buf(),
                reason: e.to_string(),
            }),
        }

        if handle.len() > self.policy.max_entries {
            violations.push(ArchiveError::TooManyEntries {
                count: handle.len(),
                limit: self.policy.max_entries,
            });
        }

        for entry in handle.entries() {
            if is_traversal(&entry.name) {
                violations.push(ArchiveError::PathTraversal(entry.name.clone()));
            }
        }

        for entry in handle.entries() {
            if entry.size > self.policy.max_entry_size {
                violations.push(ArchiveError::EntryTooLarge {
                    name: entry.name.clone(),
                    size: entry.size,
                    limit: self.policy.max_entry_size,
                });
            }
        }

        if handle.file_size() > self.policy.max_entry_size {
            violations.push(ArchiveError::FileTooLarge {
                size: handle.file_size(),
                limit: self.policy.max_entry_size,
            });
        }

        violations
    }
}
