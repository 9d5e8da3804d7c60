//! Bedrock Installer - command-line entry point.
//!
//! Initializes configuration ([`ConfigManager`]), logging, the tokio runtime,
//! the [`StateManager`] and the [`InstallationController`], then runs one
//! subcommand:
//!
//! - `install <SOURCE> --name <NAME>`: extract a full game version
//! - `import <FILE> --version <NAME>`: add a pack or world to a version
//! - `uninstall <NAME>`: remove a version (and optionally its profile)
//! - `list`: show installed versions
//! - `inspect <ARCHIVE>`: validation verdict and manifest metadata as JSON
//!
//! Ctrl-C during `install` requests cooperative cancellation: the extractor
//! is allowed to finish and its output is rolled back.

use anyhow::{Context, Result};
use bedrock_installer::models::{PackageMetadata, WorldLayout};
use bedrock_installer::services::archive::{
    ArchiveEntry, ArchiveHandle, ArchiveValidator, ValidationPolicy,
};
use bedrock_installer::services::{
    ImportRequest, ImportRoute, InstallRequest, LaunchOptions, OperationWorker, classifier,
};
use bedrock_installer::{
    APP_NAME, ConfigManager, InstallationController, LauncherConfig, PackageType, StateChange,
    StateManager, VERSION,
};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

#[derive(Debug, Parser)]
#[command(name = "bedrock-installer", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Cli {
    /// Directory holding launcher.yaml
    #[arg(long, default_value = "config")]
    config_dir: Utf8PathBuf,

    /// Log at debug level
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Install a game version from an application package
    #[command(alias = "i")]
    Install {
        /// Package path or file:// URL
        source: String,
        /// Name of the version directory
        #[arg(long)]
        name: String,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        background: Option<String>,
        #[arg(long)]
        tag: Option<String>,
    },

    /// Import a pack or world into an installed version
    Import {
        file: String,
        #[arg(long)]
        version: String,
        #[arg(long, value_enum, default_value_t = KindArg::Auto)]
        kind: KindArg,
        /// Use the shared profile instead of the per-version one
        #[arg(long)]
        shared_profile: bool,
        #[arg(long)]
        nvidia: bool,
        #[arg(long)]
        zink: bool,
        #[arg(long)]
        mangohud: bool,
    },

    /// Remove an installed version
    #[command(alias = "rm")]
    Uninstall {
        version: String,
        #[arg(long)]
        delete_profile: bool,
    },

    /// List installed versions
    #[command(alias = "ls")]
    List,

    /// Validate an archive and print its metadata as JSON
    Inspect { archive: Utf8PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Auto,
    Addon,
    Resource,
    Behavior,
    World,
}

impl KindArg {
    fn package_type(self) -> Option<PackageType> {
        match self {
            KindArg::Auto => None,
            KindArg::Addon => Some(PackageType::Addon),
            KindArg::Resource => Some(PackageType::ResourcePack),
            KindArg::Behavior => Some(PackageType::BehaviorPack),
            KindArg::World => Some(PackageType::World),
        }
    }
}

#[derive(Debug, Serialize)]
struct InspectReport {
    path: Utf8PathBuf,
    file_size: u64,
    entry_count: usize,
    valid: bool,
    violations: Vec<String>,
    metadata: PackageMetadata,
    world: WorldLayout,
    entries: Vec<ArchiveEntry>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::new(&cli.config_dir)?;
    let mut config = config_manager.load_config()?;
    config.logging.debug |= cli.debug;

    let controller_config = config.clone();
    let layout = bedrock_installer::DataLayout::new(&config.paths.data_dir);
    layout
        .ensure_exists()
        .with_context(|| format!("Failed to prepare data directory {}", layout.data_root()))?;

    let _log_guard = bedrock_installer::logging::setup_logging(
        &layout.logs_dir(),
        APP_NAME,
        config.logging.debug,
        config.logging.console,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("installer-worker")
        .build()?;

    let result = runtime.block_on(run(cli.command, controller_config, runtime.handle().clone()));

    runtime.shutdown_timeout(std::time::Duration::from_secs(5));
    tracing::info!("Shutdown complete");

    result
}

async fn run(
    command: Command,
    config: LauncherConfig,
    runtime: tokio::runtime::Handle,
) -> Result<()> {
    let state = Arc::new(StateManager::new());
    spawn_progress_printer(&state);
    let controller = Arc::new(InstallationController::from_config(&config, state.clone()));
    let metrics = Arc::clone(controller.metrics());
    controller
        .catalog()
        .refresh()
        .context("Failed to scan installed versions")?;

    let worker = OperationWorker::new(Arc::clone(&controller), runtime);

    let result: Result<()> = async {
        match command {
            Command::Install {
                source,
                name,
                icon,
                background,
                tag,
            } => {
                let mut request = InstallRequest::new(source, name);
                request.icon = icon;
                request.background = background;
                request.tag = tag;

                let task = worker.install(request)?;
                let installed = wait_cancellable(task, || worker.cancel_handle().cancel()).await?;
                if installed.already_present {
                    println!("{} is already installed at {}", installed.name, installed.path);
                } else {
                    println!("Installed {} at {}", installed.name, installed.path);
                }
                Ok(())
            }

            Command::Import {
                file,
                version,
                kind,
                shared_profile,
                nvidia,
                zink,
                mangohud,
            } => {
                let mut request = ImportRequest::new(file, version)
                    .with_shared_profile(shared_profile)
                    .with_launch_options(LaunchOptions {
                        nvidia_offload: nvidia,
                        zink,
                        mangohud,
                    });
                request.kind = kind.package_type();

                let imported = worker.import(request)?.await.context("Import task failed")??;
                match imported.route {
                    ImportRoute::Extracted { destination, files } => {
                        println!(
                            "Imported {} ({} files) into {}",
                            imported.kind, files, destination
                        )
                    }
                    ImportRoute::Delegated => {
                        println!(
                            "Handed {} to the game client for {}",
                            imported.kind, imported.version
                        )
                    }
                }
                Ok(())
            }

            Command::Uninstall {
                version,
                delete_profile,
            } => {
                let uninstalled = worker
                    .uninstall(version, delete_profile)?
                    .await
                    .context("Uninstall task failed")??;
                for path in &uninstalled.removed {
                    println!("Removed {}", path);
                }
                for (path, error) in &uninstalled.failed {
                    eprintln!("Could not remove {}: {}", path, error);
                }
                Ok(())
            }

            Command::List => {
                let catalog = controller.catalog();
                let latest = catalog.most_recent().map(|r| r.name);
                for record in catalog.records() {
                    let marker = if latest.as_deref() == Some(record.name.as_str()) {
                        "*"
                    } else {
                        " "
                    };
                    println!(
                        "{} {:<24} {}  {}",
                        marker,
                        record.name,
                        record.install_date().format("%Y-%m-%d %H:%M"),
                        record.tag.as_deref().unwrap_or("")
                    );
                }
                Ok(())
            }

            Command::Inspect { archive } => {
                let policy = ValidationPolicy {
                    max_entries: config.safety.max_entries,
                    max_entry_size: config.safety.max_entry_size,
                };
                let report = inspect(&archive, policy)?;
                println!("{}", serde_json::to_string_pretty(&report)?);
                Ok(())
            }
        }
    }
    .await;

    metrics.log_summary();
    result
}

fn spawn_progress_printer(state: &StateManager) {
    let mut rx = state.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(StateChange::PhaseChanged { kind, phase }) => {
                    eprintln!("[{}] {:?}", kind, phase);
                }
                Ok(StateChange::OperationChanged { operation }) if !operation.is_empty() => {
                    eprintln!("{}", operation);
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("Progress printer skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Wait for an install task; the first Ctrl-C requests cancellation.
async fn wait_cancellable<T, F>(
    mut task: JoinHandle<Result<T, bedrock_installer::InstallError>>,
    cancel: F,
) -> Result<T>
where
    F: Fn(),
{
    tokio::select! {
        joined = &mut task => return Ok(joined.context("Install task failed")??),
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, cancelling install after the extractor returns");
            eprintln!("Cancelling...");
            cancel();
        }
    }
    Ok(task.await.context("Install task failed")??)
}

fn inspect(path: &Utf8PathBuf, policy: ValidationPolicy) -> Result<InspectReport> {
    let handle = ArchiveHandle::open(path)?;
    let violations: Vec<String> = ArchiveValidator::new(policy)
        .inspect(&handle)
        .iter()
        .map(ToString::to_string)
        .collect();

    Ok(InspectReport {
        path: path.clone(),
        file_size: handle.file_size(),
        entry_count: handle.len(),
        valid: violations.is_empty(),
        violations,
        metadata: classifier::metadata(&handle),
        world: classifier::world_layout(&handle),
        entries: handle.entries().to_vec(),
    })
}
