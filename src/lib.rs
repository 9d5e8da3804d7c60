// Bedrock Installer - safe installation of game versions, packs and worlds
//
// This is the library crate containing the core installer logic.
// The binary crate (main.rs) provides the command-line entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::InstallMetrics;
pub use models::{DataLayout, InstallPhase, InstallerState, LauncherConfig, PackageType};
pub use services::{InstallError, InstallationController, OperationWorker, VersionCatalog};
pub use state::{ProgressSink, StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
