//! Services module - installer business logic.
//!
//! Framework-agnostic; nothing here knows about the command line.
//!
//! # Components
//!
//! - [`archive`]: zip inspection, validation and contained extraction
//! - [`classifier`]: pack type and identity from `manifest.json`
//! - [`FileStager`]: copies external files into the imports area
//! - [`process`]: external extractor and game client adapters
//! - [`InstallationController`]: install/import/uninstall with rollback
//! - [`VersionCatalog`]: scans installed versions
//! - [`OperationWorker`]: one background slot per operation kind
//!
//! # Usage Example
//!
//! ```ignore
//! use bedrock_installer::services::{InstallRequest, InstallationController};
//!
//! let controller = InstallationController::from_config(&config, Arc::new(StateManager::new()));
//! let installed = controller
//!     .install(InstallRequest::new("/downloads/game.apk", "1.21.0"))
//!     .await?;
//! ```

pub mod archive;
pub mod catalog;
pub mod classifier;
pub mod error;
pub mod installer;
pub mod process;
pub mod stager;
pub mod worker;

pub use archive::{ArchiveEntry, ArchiveError, ArchiveHandle, ArchiveValidator, SafeExtractor};
pub use catalog::{CatalogEvent, VersionCatalog, VersionContents};
pub use error::InstallError;
pub use installer::{
    CancelHandle, ImportRequest, ImportRoute, Imported, InstallRequest, InstallationController,
    Installed, Uninstalled, detect_package_type,
};
pub use process::{
    BaseExtractor, ClientImport, GameClient, LaunchOptions, ProcessClient, ProcessError,
    ProcessExtractor,
};
pub use stager::{FileStager, StageError, StagedFile};
pub use worker::OperationWorker;
