use camino::Utf8PathBuf;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::time::SystemTime;

/// File holding the free-text tag of an installed version.
pub const TAG_FILE: &str = "tag.txt";

/// Icon file names probed in order; the first existing one wins.
pub const ICON_CANDIDATES: [&str; 4] = [
    "custom_icon.png",
    "custom_icon.jpg",
    "custom_icon.jpeg",
    "custom_icon.svg",
];

/// Background file names probed in order; the first existing one wins.
pub const BACKGROUND_CANDIDATES: [&str; 3] = [
    "custom_background.png",
    "custom_background.jpg",
    "custom_background.jpeg",
];

/// One installed version, i.e. one subdirectory of the versions root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallationRecord {
    pub name: String,
    pub path: Utf8PathBuf,
    pub install_timestamp: SystemTime,
    pub tag: Option<String>,
    pub icon_path: Option<Utf8PathBuf>,
    pub background_path: Option<Utf8PathBuf>,
}

impl InstallationRecord {
    /// A record only counts while its directory exists and has content.
    pub fn is_valid(&self) -> bool {
        fs::read_dir(&self.path)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }

    pub fn install_date(&self) -> DateTime<Local> {
        DateTime::<Local>::from(self.install_timestamp)
    }
}
