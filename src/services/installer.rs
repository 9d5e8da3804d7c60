//! Install, import and uninstall workflows.
//!
//! [`InstallationController`] is the only writer of the versions and
//! profiles trees. A full install walks
//! `Staging → Extracting → Populating → Committed`; any failure or a
//! cancellation observed after extraction rolls back the target directory
//! and every staged file of the attempt before the error is returned.

use crate::metrics::InstallMetrics;
use crate::models::{
    BEHAVIOR_PACKS_DIR, DataLayout, InstallPhase, LauncherConfig, OperationKind,
    OperationOutcome, PackageType, RESOURCE_PACKS_DIR, TAG_FILE, WORLDS_DIR,
    is_valid_version_name,
};
use crate::services::archive::{
    ArchiveHandle, ArchiveValidator, ExtractionReport, SafeExtractor, ValidationPolicy,
};
use crate::services::catalog::VersionCatalog;
use crate::services::classifier;
use crate::services::error::InstallError;
use crate::services::process::{
    BaseExtractor, ClientImport, GameClient, LaunchOptions, ProcessClient, ProcessExtractor,
};
use crate::services::stager::{FileStager, StagedFile};
use crate::state::ProgressSink;
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

const ICON_STEM: &str = "custom_icon";
const BACKGROUND_STEM: &str = "custom_background";
const DEFAULT_ICON_EXT: &str = "png";
const DEFAULT_BACKGROUND_EXT: &str = "jpg";

/// A full version install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallRequest {
    /// Path or `file://` URL of the application package.
    pub source: String,
    /// Directory name under the versions root.
    pub name: String,
    pub icon: Option<String>,
    pub background: Option<String>,
    pub tag: Option<String>,
}

impl InstallRequest {
    pub fn new(source: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// Content import into an installed version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRequest {
    pub file: String,
    pub version: String,
    /// `None` detects the type from the file extension and manifest.
    pub kind: Option<PackageType>,
    /// Use the client's shared profile instead of the per-version one.
    pub shared_profile: bool,
    pub launch: LaunchOptions,
}

impl ImportRequest {
    pub fn new(file: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: PackageType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_shared_profile(mut self, shared: bool) -> Self {
        self.shared_profile = shared;
        self
    }

    pub fn with_launch_options(mut self, launch: LaunchOptions) -> Self {
        self.launch = launch;
        self
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    pub name: String,
    pub path: Utf8PathBuf,
    /// The directory existed before and nothing was done.
    pub already_present: bool,
}

/// How an import was carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportRoute {
    Extracted { destination: Utf8PathBuf, files: usize },
    /// Handed to the game client; only the client start is confirmed.
    Delegated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Imported {
    pub kind: PackageType,
    pub version: String,
    pub route: ImportRoute,
}

/// Paths removed by an uninstall, plus the ones that could not be.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uninstalled {
    pub removed: Vec<Utf8PathBuf>,
    pub failed: Vec<(Utf8PathBuf, String)>,
}

/// Requests cooperative cancellation of the running install.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<watch::Sender<bool>>);

impl CancelHandle {
    pub fn cancel(&self) {
        tracing::info!("Cancellation requested");
        self.0.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }
}

/// Transient bookkeeping for one install attempt.
struct Attempt {
    target: Utf8PathBuf,
    staged: Vec<StagedFile>,
}

/// Orchestrates install, import and uninstall with commit/rollback semantics.
pub struct InstallationController<E = ProcessExtractor, C = ProcessClient> {
    layout: DataLayout,
    stager: FileStager,
    validator: ArchiveValidator,
    extractor: E,
    client: C,
    catalog: Arc<VersionCatalog>,
    progress: Arc<dyn ProgressSink>,
    metrics: Arc<InstallMetrics>,
    cancel_tx: Arc<watch::Sender<bool>>,
    icon_pattern: Regex,
    background_pattern: Regex,
}

impl InstallationController<ProcessExtractor, ProcessClient> {
    /// Controller wired to the configured external tools and limits.
    pub fn from_config(config: &LauncherConfig, progress: Arc<dyn ProgressSink>) -> Self {
        let layout = DataLayout::new(&config.paths.data_dir);
        let catalog = Arc::new(VersionCatalog::new(layout.versions_root()));
        let extractor =
            ProcessExtractor::new(config.tools.extractor.clone(), config.timeouts.extract());
        let client =
            ProcessClient::new(config.tools.client.clone(), config.timeouts.client_start());

        Self::new(layout, extractor, client, catalog, progress).with_policy(ValidationPolicy {
            max_entries: config.safety.max_entries,
            max_entry_size: config.safety.max_entry_size,
        })
    }
}

impl<E: BaseExtractor, C: GameClient> InstallationController<E, C> {
    pub fn new(
        layout: DataLayout,
        extractor: E,
        client: C,
        catalog: Arc<VersionCatalog>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            stager: FileStager::new(layout.clone()),
            layout,
            validator: ArchiveValidator::default(),
            extractor,
            client,
            catalog,
            progress,
            metrics: Arc::new(InstallMetrics::new()),
            cancel_tx: Arc::new(cancel_tx),
            icon_pattern: Regex::new(r"^custom_icon\.[^.]+$").expect("Invalid icon regex"),
            background_pattern: Regex::new(r"^custom_background\.[^.]+$")
                .expect("Invalid background regex"),
        }
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.validator = ArchiveValidator::new(policy);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<InstallMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn catalog(&self) -> &Arc<VersionCatalog> {
        &self.catalog
    }

    pub fn metrics(&self) -> &Arc<InstallMetrics> {
        &self.metrics
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancel_tx))
    }

    /// Ask the running install to roll back once the extractor returns.
    pub fn cancel_install(&self) {
        self.cancel_handle().cancel();
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Install a version from an application package.
    ///
    /// An existing directory of the same name counts as success without
    /// running the extractor.
    pub async fn install(&self, request: InstallRequest) -> Result<Installed, InstallError> {
        let kind = OperationKind::Install;

        if !is_valid_version_name(&request.name) {
            let error = InstallError::Input(format!("Invalid version name: {:?}", request.name));
            self.progress.phase_changed(kind, InstallPhase::Failed);
            self.progress.finished(kind, &error.outcome());
            return Err(error);
        }

        let target = self.layout.version_dir(&request.name);
        if target.is_dir() {
            tracing::info!("Version {} already present at {}", request.name, target);
            self.progress.phase_changed(kind, InstallPhase::Committed);
            self.progress.finished(
                kind,
                &OperationOutcome::Succeeded {
                    message: format!("{} is already installed", request.name),
                },
            );
            return Ok(Installed {
                name: request.name,
                path: target,
                already_present: true,
            });
        }

        self.cancel_tx.send_replace(false);
        let started = Instant::now();
        let mut attempt = Attempt {
            target,
            staged: Vec::new(),
        };

        tracing::info!("Installing {} from {}", request.name, request.source);
        let result = self.run_install(&request, &mut attempt).await;

        match &result {
            Ok(installed) => {
                self.metrics.record_install_committed(started.elapsed());
                tracing::info!("Installed {} at {}", installed.name, installed.path);
                self.progress.finished(
                    kind,
                    &OperationOutcome::Succeeded {
                        message: format!("Installed {}", installed.name),
                    },
                );
            }
            Err(error) => {
                self.rollback(&mut attempt);
                if matches!(error, InstallError::Cancelled) {
                    tracing::warn!("Install of {} cancelled", request.name);
                    self.metrics.record_install_cancelled();
                    self.progress.phase_changed(kind, InstallPhase::Cancelled);
                } else {
                    tracing::error!("Install of {} failed: {}", request.name, error);
                    self.metrics.record_install_failed();
                    self.progress.phase_changed(kind, InstallPhase::Failed);
                }
                self.progress.finished(kind, &error.outcome());
            }
        }

        result
    }

    async fn run_install(
        &self,
        request: &InstallRequest,
        attempt: &mut Attempt,
    ) -> Result<Installed, InstallError> {
        let kind = OperationKind::Install;

        self.progress.phase_changed(kind, InstallPhase::Staging);
        self.progress
            .message(kind, &format!("Staging {}", request.source));
        let source = self.stage_for(&request.source, attempt)?;
        fs::File::open(&source.staged_path).map_err(|e| {
            InstallError::Input(format!(
                "Staged file {} is not readable: {}",
                source.staged_path, e
            ))
        })?;
        let icon = match non_empty(request.icon.as_deref()) {
            Some(icon) => Some(self.stage_for(icon, attempt)?),
            None => None,
        };
        let background = match non_empty(request.background.as_deref()) {
            Some(background) => Some(self.stage_for(background, attempt)?),
            None => None,
        };

        self.progress.phase_changed(kind, InstallPhase::Extracting);
        self.progress
            .message(kind, &format!("Extracting {}", request.name));
        self.extractor
            .extract(&source.staged_path, &attempt.target)
            .await?;

        if !has_entries(&attempt.target) {
            return Err(InstallError::MissingOutput(attempt.target.clone()));
        }
        if self.is_cancelled() {
            return Err(InstallError::Cancelled);
        }

        self.progress.phase_changed(kind, InstallPhase::Populating);
        self.populate(
            &attempt.target,
            icon.as_ref(),
            background.as_ref(),
            request.tag.as_deref(),
        )?;

        self.progress.phase_changed(kind, InstallPhase::Committed);
        self.refresh_catalog();
        self.cleanup_staged(attempt);

        Ok(Installed {
            name: request.name.clone(),
            path: attempt.target.clone(),
            already_present: false,
        })
    }

    fn stage_for(&self, original: &str, attempt: &mut Attempt) -> Result<StagedFile, InstallError> {
        let staged = self.stager.stage(original)?;
        attempt.staged.push(staged.clone());
        Ok(staged)
    }

    fn cleanup_staged(&self, attempt: &mut Attempt) {
        for staged in attempt.staged.drain(..) {
            self.stager.cleanup(&staged);
        }
    }

    /// Best effort: failures are logged and never replace the original error.
    fn rollback(&self, attempt: &mut Attempt) {
        if attempt.target.exists() {
            match fs::remove_dir_all(&attempt.target) {
                Ok(()) => tracing::info!("Rolled back {}", attempt.target),
                Err(e) => tracing::warn!("Failed to remove {}: {}", attempt.target, e),
            }
        }
        self.cleanup_staged(attempt);
    }

    fn refresh_catalog(&self) {
        self.catalog.invalidate_latest();
        if let Err(e) = self.catalog.refresh() {
            tracing::warn!("Failed to refresh version catalog: {}", e);
        }
    }

    fn populate(
        &self,
        target: &Utf8Path,
        icon: Option<&StagedFile>,
        background: Option<&StagedFile>,
        tag: Option<&str>,
    ) -> Result<(), InstallError> {
        for dir in [WORLDS_DIR, RESOURCE_PACKS_DIR, BEHAVIOR_PACKS_DIR] {
            let path = target.join(dir);
            fs::create_dir_all(&path)
                .map_err(|e| InstallError::filesystem(format!("Failed to create {path}"), e))?;
        }

        if let Some(icon) = icon {
            self.replace_asset(
                target,
                &icon.staged_path,
                ICON_STEM,
                DEFAULT_ICON_EXT,
                &self.icon_pattern,
            )?;
        }
        if let Some(background) = background {
            self.replace_asset(
                target,
                &background.staged_path,
                BACKGROUND_STEM,
                DEFAULT_BACKGROUND_EXT,
                &self.background_pattern,
            )?;
        }

        if let Some(tag) = non_empty(tag) {
            let path = target.join(TAG_FILE);
            fs::write(&path, tag)
                .map_err(|e| InstallError::filesystem(format!("Failed to write {path}"), e))?;
        }

        Ok(())
    }

    /// Copy `source` to `<target>/<stem>.<ext>`, removing earlier assets of
    /// the same role first.
    fn replace_asset(
        &self,
        target: &Utf8Path,
        source: &Utf8Path,
        stem: &str,
        default_ext: &str,
        existing: &Regex,
    ) -> Result<Utf8PathBuf, InstallError> {
        let entries = fs::read_dir(target)
            .map_err(|e| InstallError::filesystem(format!("Failed to list {target}"), e))?;
        for entry in entries.flatten() {
            let name = entry.file_name();
            if name.to_str().is_some_and(|n| existing.is_match(n)) {
                fs::remove_file(entry.path()).map_err(|e| {
                    InstallError::filesystem(format!("Failed to remove old {stem}"), e)
                })?;
            }
        }

        let extension = source
            .extension()
            .filter(|ext| !ext.is_empty())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| default_ext.to_string());
        let destination = target.join(format!("{stem}.{extension}"));
        fs::copy(source, &destination).map_err(|e| {
            InstallError::filesystem(format!("Failed to copy {source} to {destination}"), e)
        })?;

        tracing::debug!("Copied {} to {}", source, destination);
        Ok(destination)
    }

    /// Import a pack or world into an installed version.
    pub async fn import(&self, request: ImportRequest) -> Result<Imported, InstallError> {
        let kind = OperationKind::Import;
        let result = self.run_import(&request).await;

        match &result {
            Ok(imported) => {
                self.metrics.record_import(true);
                tracing::info!(
                    "Imported {} into {} ({:?})",
                    imported.kind,
                    imported.version,
                    imported.route
                );
                self.progress.phase_changed(kind, InstallPhase::Committed);
                self.progress.finished(
                    kind,
                    &OperationOutcome::Succeeded {
                        message: format!("Imported {} into {}", imported.kind, imported.version),
                    },
                );
            }
            Err(error) => {
                self.metrics.record_import(false);
                tracing::error!("Import of {} failed: {}", request.file, error);
                self.progress.phase_changed(kind, InstallPhase::Failed);
                self.progress.finished(kind, &error.outcome());
            }
        }

        result
    }

    async fn run_import(&self, request: &ImportRequest) -> Result<Imported, InstallError> {
        let version = request.version.trim();
        if version.is_empty() {
            return Err(InstallError::Input("No target version given".to_string()));
        }
        if !is_valid_version_name(version) {
            return Err(InstallError::Input(format!("Invalid version name: {version:?}")));
        }
        if !self.layout.version_dir(version).is_dir() {
            return Err(InstallError::Input(format!("Version {version} is not installed")));
        }

        self.progress
            .phase_changed(OperationKind::Import, InstallPhase::Staging);
        let staged = self.stager.stage(&request.file)?;

        let result = self.dispatch_import(request, version, &staged).await;
        self.stager.cleanup(&staged);
        result
    }

    async fn dispatch_import(
        &self,
        request: &ImportRequest,
        version: &str,
        staged: &StagedFile,
    ) -> Result<Imported, InstallError> {
        let kind = request
            .kind
            .unwrap_or_else(|| detect_package_type(&staged.staged_path));
        tracing::info!("Importing {} as {} into {}", staged.source_path, kind, version);

        self.progress
            .phase_changed(OperationKind::Import, InstallPhase::Extracting);
        self.progress.message(
            OperationKind::Import,
            &format!("Importing {} into {}", kind, version),
        );

        let pack_folder = || {
            staged
                .source_path
                .file_stem()
                .filter(|stem| is_valid_version_name(stem))
                .unwrap_or("pack")
                .to_string()
        };

        let route = match kind {
            PackageType::Addon => {
                self.extract_package(
                    &staged.staged_path,
                    self.layout.resource_packs_dir(version),
                    None,
                )
                .await?
            }
            PackageType::ResourcePack => {
                self.extract_package(
                    &staged.staged_path,
                    self.layout.resource_packs_dir(version),
                    Some(pack_folder()),
                )
                .await?
            }
            PackageType::BehaviorPack => {
                self.extract_package(
                    &staged.staged_path,
                    self.layout.behavior_packs_dir(version),
                    Some(pack_folder()),
                )
                .await?
            }
            PackageType::World | PackageType::Unknown => {
                let client_import = ClientImport {
                    version_dir: self.layout.version_dir(version),
                    profile_dir: (!request.shared_profile)
                        .then(|| self.layout.profile_dir(version)),
                    file: staged.staged_path.clone(),
                    options: request.launch,
                };
                self.client.import_file(&client_import).await?;
                ImportRoute::Delegated
            }
        };

        Ok(Imported {
            kind,
            version: version.to_string(),
            route,
        })
    }

    /// Validate, then extract into `dest_root` (or a subfolder of it).
    ///
    /// On failure every top-level item this call created in `dest_root` is
    /// removed again.
    async fn extract_package(
        &self,
        archive: &Utf8Path,
        dest_root: Utf8PathBuf,
        subfolder: Option<String>,
    ) -> Result<ImportRoute, InstallError> {
        let archive = archive.to_path_buf();
        let validator = self.validator;
        let progress = Arc::clone(&self.progress);
        let metrics = Arc::clone(&self.metrics);

        let (destination, report) = tokio::task::spawn_blocking(
            move || -> Result<(Utf8PathBuf, ExtractionReport), InstallError> {
                let handle = ArchiveHandle::open(&archive).inspect_err(|_| {
                    metrics.record_archive_rejected();
                })?;
                validator.validate(&handle).inspect_err(|_| {
                    metrics.record_archive_rejected();
                })?;

                fs::create_dir_all(&dest_root).map_err(|e| {
                    InstallError::filesystem(format!("Failed to create {dest_root}"), e)
                })?;
                let before = top_level_names(&dest_root).map_err(|e| {
                    InstallError::filesystem(format!("Failed to list {dest_root}"), e)
                })?;

                let destination = match subfolder {
                    Some(folder) => dest_root.join(folder),
                    None => dest_root.clone(),
                };

                let extractor = SafeExtractor::with_policy(validator.policy());
                match extractor.extract_with_progress(&handle, &destination, |done, total| {
                    progress.progress(OperationKind::Import, done, total)
                }) {
                    Ok(report) => {
                        metrics.record_extraction(report.files.len(), report.bytes_written);
                        Ok((destination, report))
                    }
                    Err(e) => {
                        remove_new_entries(&dest_root, &before);
                        Err(e.into())
                    }
                }
            },
        )
        .await
        .map_err(|e| InstallError::Worker(e.to_string()))??;

        Ok(ImportRoute::Extracted {
            destination,
            files: report.files.len(),
        })
    }

    /// Remove an installed version, and optionally its profile.
    ///
    /// Accepts a version name or a path to a directory directly inside the
    /// versions root. Removal failures are reported in
    /// [`Uninstalled::failed`] rather than aborting.
    pub async fn uninstall(
        &self,
        version: &str,
        delete_profile: bool,
    ) -> Result<Uninstalled, InstallError> {
        let kind = OperationKind::Uninstall;
        let result = self.run_uninstall(version, delete_profile).await;

        match &result {
            Ok(uninstalled) => {
                tracing::info!(
                    "Uninstalled {}: {} removed, {} failed",
                    version,
                    uninstalled.removed.len(),
                    uninstalled.failed.len()
                );
                self.progress.finished(
                    kind,
                    &OperationOutcome::Succeeded {
                        message: format!("Removed {} paths", uninstalled.removed.len()),
                    },
                );
            }
            Err(error) => {
                tracing::error!("Uninstall of {} failed: {}", version, error);
                self.progress.finished(kind, &error.outcome());
            }
        }

        result
    }

    async fn run_uninstall(
        &self,
        version: &str,
        delete_profile: bool,
    ) -> Result<Uninstalled, InstallError> {
        let trimmed = version.trim();
        if trimmed.is_empty() {
            return Err(InstallError::Input("No version given".to_string()));
        }

        let candidate = Utf8Path::new(trimmed);
        let dir = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else if is_valid_version_name(trimmed) {
            self.layout.version_dir(trimmed)
        } else {
            return Err(InstallError::Input(format!("Invalid version name: {trimmed:?}")));
        };

        let root = self
            .layout
            .versions_root()
            .canonicalize_utf8()
            .map_err(|e| InstallError::Input(format!("Versions directory unavailable: {e}")))?;
        let real = dir
            .canonicalize_utf8()
            .map_err(|_| InstallError::Input(format!("Version not found: {trimmed}")))?;
        if real.parent() != Some(root.as_path()) || !real.is_dir() {
            return Err(InstallError::Input(format!(
                "{dir} is not a version directory"
            )));
        }
        let folder = real.file_name().unwrap_or_default().to_string();

        self.progress
            .message(OperationKind::Uninstall, &format!("Removing {folder}"));

        let mut outcome = Uninstalled::default();
        remove_tree(&real, &mut outcome).await;
        if delete_profile {
            let profile = self.layout.profile_dir(&folder);
            if profile.exists() {
                remove_tree(&profile, &mut outcome).await;
            }
        }

        self.refresh_catalog();
        Ok(outcome)
    }
}

async fn remove_tree(path: &Utf8Path, outcome: &mut Uninstalled) {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => outcome.removed.push(path.to_path_buf()),
        Err(e) => {
            tracing::warn!("Failed to remove {}: {}", path, e);
            outcome.failed.push((path.to_path_buf(), e.to_string()));
        }
    }
}

/// Extension first (`.mcaddon`, `.mcworld`), then the manifest.
pub fn detect_package_type(path: &Utf8Path) -> PackageType {
    match path.extension().map(str::to_ascii_lowercase).as_deref() {
        Some("mcaddon") => return PackageType::Addon,
        Some("mcworld") => return PackageType::World,
        _ => {}
    }

    match ArchiveHandle::open(path) {
        Ok(handle) => classifier::classify(&handle),
        Err(e) => {
            tracing::debug!("Could not classify {}: {}", path, e);
            PackageType::Unknown
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn has_entries(dir: &Utf8Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

fn top_level_names(dir: &Utf8Path) -> std::io::Result<HashSet<OsString>> {
    Ok(fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.file_name())
        .collect())
}

fn remove_new_entries(dir: &Utf8Path, before: &HashSet<OsString>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        if before.contains(&entry.file_name()) {
            continue;
        }
        let path = entry.path();
        let removed = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        if let Err(e) = removed {
            tracing::warn!("Failed to roll back {}: {}", path.display(), e);
        }
    }
}
