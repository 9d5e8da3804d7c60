//! Data models for the installer.
//!
//! - [`InstallerState`]: observable installer state (phases, progress, outcomes)
//! - [`LauncherConfig`]: configuration loaded from `launcher.yaml` and the environment
//! - [`DataLayout`]: on-disk layout under the data root
//! - [`InstallationRecord`]: one installed version as seen by the catalog
//! - [`Manifest`], [`PackageType`], [`PackageMetadata`]: pack manifest model

pub mod app_state;
pub mod config;
pub mod package;
pub mod paths;
pub mod record;

pub use app_state::{
    ErrorCategory, InstallPhase, InstallerState, MAX_CONCURRENT_OPERATIONS_PER_KIND,
    OperationKind, OperationOutcome,
};
pub use config::{
    LauncherConfig, LoggingConfig, PathsConfig, SafetyConfig, TimeoutsConfig, ToolsConfig,
};
pub use package::{DEFAULT_PACK_VERSION, Manifest, PackageMetadata, PackageType, WorldLayout};
pub use paths::{
    BEHAVIOR_PACKS_DIR, DataLayout, GAME_DIR_NAME, RESOURCE_PACKS_DIR, WORLDS_DIR,
    is_valid_version_name,
};
pub use record::{BACKGROUND_CANDIDATES, ICON_CANDIDATES, InstallationRecord, TAG_FILE};
