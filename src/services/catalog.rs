use crate::models::{
    BACKGROUND_CANDIDATES, BEHAVIOR_PACKS_DIR, ICON_CANDIDATES, InstallationRecord,
    RESOURCE_PACKS_DIR, TAG_FILE, WORLDS_DIR,
};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::fs;
use std::io;
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;
use tokio::sync::broadcast;

/// Emitted when a refresh finds a different set of installed versions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogEvent {
    Changed { count: usize },
}

/// Names of the content folders of one installed version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionContents {
    pub worlds: Vec<String>,
    pub resource_packs: Vec<String>,
    pub behavior_packs: Vec<String>,
}

/// Read-only view of the versions root.
///
/// The catalog never holds handles into the tree; it rescans on
/// [`refresh`](Self::refresh) and tolerates directories disappearing while
/// it does so.
pub struct VersionCatalog {
    versions_root: Utf8PathBuf,
    records: RwLock<Vec<InstallationRecord>>,

    /// `None` until computed; invalidated by new installations.
    latest: RwLock<Option<Option<InstallationRecord>>>,

    events: broadcast::Sender<CatalogEvent>,
}

impl VersionCatalog {
    pub fn new<P: AsRef<Utf8Path>>(versions_root: P) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            versions_root: versions_root.as_ref().to_path_buf(),
            records: RwLock::new(Vec::new()),
            latest: RwLock::new(None),
            events,
        }
    }

    pub fn versions_root(&self) -> &Utf8Path {
        &self.versions_root
    }

    /// Rescan the versions root. Returns whether the record set changed.
    pub fn refresh(&self) -> io::Result<bool> {
        let scanned = scan(&self.versions_root)?;

        let changed = {
            let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
            if *records == scanned {
                false
            } else {
                *records = scanned;
                true
            }
        };

        if changed {
            self.invalidate_latest();
            let count = self.len();
            tracing::info!("Version catalog changed: {} installed", count);
            let _ = self.events.send(CatalogEvent::Changed { count });
        }

        Ok(changed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    /// Records ordered by name.
    pub fn records(&self) -> Vec<InstallationRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<InstallationRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|record| record.name == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any version is installed.
    pub fn is_installed(&self) -> bool {
        !self.is_empty()
    }

    /// The record with the latest install timestamp, cached until
    /// [`invalidate_latest`](Self::invalidate_latest).
    pub fn most_recent(&self) -> Option<InstallationRecord> {
        if let Some(cached) = self
            .latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return cached.clone();
        }

        let latest = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .max_by_key(|record| record.install_timestamp)
            .cloned();
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = Some(latest.clone());
        latest
    }

    pub fn invalidate_latest(&self) {
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Folder names inside the worlds and pack directories of `name`.
    pub fn contents(&self, name: &str) -> VersionContents {
        let version_dir = self.versions_root.join(name);
        VersionContents {
            worlds: list_dirs(&version_dir.join(WORLDS_DIR)),
            resource_packs: list_dirs(&version_dir.join(RESOURCE_PACKS_DIR)),
            behavior_packs: list_dirs(&version_dir.join(BEHAVIOR_PACKS_DIR)),
        }
    }
}

fn scan(root: &Utf8Path) -> io::Result<Vec<InstallationRecord>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut records = Vec::new();
    for entry in entries.flatten() {
        let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
            tracing::warn!("Skipping non UTF-8 path {}", entry.path().display());
            continue;
        };
        // Gone since read_dir listed it.
        let Ok(metadata) = fs::metadata(&path) else {
            continue;
        };
        if !metadata.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().map(str::to_string) else {
            continue;
        };

        let install_timestamp = metadata
            .created()
            .or_else(|_| metadata.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let tag = fs::read_to_string(path.join(TAG_FILE))
            .ok()
            .filter(|tag| !tag.is_empty());

        let icon_path = first_existing(&path, &ICON_CANDIDATES);
        let background_path = first_existing(&path, &BACKGROUND_CANDIDATES);

        records.push(InstallationRecord {
            name,
            path,
            install_timestamp,
            tag,
            icon_path,
            background_path,
        });
    }

    records.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(records)
}

fn first_existing(dir: &Utf8Path, candidates: &[&str]) -> Option<Utf8PathBuf> {
    candidates
        .iter()
        .map(|candidate| dir.join(candidate))
        .find(|path| path.is_file())
}

fn list_dirs(dir: &Utf8Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}
