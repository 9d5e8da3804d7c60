//! Integration tests for InstallationController and OperationWorker.
//!
//! The external extractor and game client are replaced with in-process stubs
//! so install, import and uninstall can be driven end to end on a temporary
//! data root.

mod common;

use bedrock_installer::models::{
    ErrorCategory, InstallPhase, OperationKind, OperationOutcome, PackageType,
};
use bedrock_installer::services::archive::ArchiveError;
use bedrock_installer::services::{
    BaseExtractor, CancelHandle, ClientImport, GameClient, ImportRequest, ImportRoute,
    InstallRequest, OperationWorker, ProcessError, StageError,
};
use bedrock_installer::{
    DataLayout, InstallError, InstallationController, StateManager, VersionCatalog,
};
use camino::{Utf8Path, Utf8PathBuf};
use common::{corrupt_crc, resource_manifest, temp_dir, write_zip};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::SystemTime;
use tempfile::TempDir;
use tokio::sync::Notify;

#[derive(Clone)]
enum Behavior {
    /// Write `app.so` into the target and exit 0.
    WriteAppSo,
    /// Write a partial file, then exit non-zero.
    Fail,
    /// Exit 0 without producing anything.
    Nothing,
    /// Block until notified, then behave like `WriteAppSo`.
    WaitFor(Arc<Notify>),
}

#[derive(Clone)]
struct StubExtractor {
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
    /// Cancelled from inside the extractor when set.
    cancel: Arc<OnceLock<CancelHandle>>,
}

impl StubExtractor {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            cancel: Arc::new(OnceLock::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn write_app_so(target: &Utf8Path) {
    fs::create_dir_all(target).unwrap();
    fs::write(target.join("app.so"), b"\x7fELF").unwrap();
}

impl BaseExtractor for StubExtractor {
    async fn extract(&self, _source: &Utf8Path, target: &Utf8Path) -> Result<(), ProcessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            Behavior::WriteAppSo => write_app_so(target),
            Behavior::Fail => {
                fs::create_dir_all(target).unwrap();
                fs::write(target.join("partial.bin"), b"half").unwrap();
                return Err(ProcessError::NonZeroExit {
                    program: "stub-extract".to_string(),
                    code: Some(2),
                    stderr: "corrupt apk".to_string(),
                });
            }
            Behavior::Nothing => {}
            Behavior::WaitFor(notify) => {
                notify.notified().await;
                write_app_so(target);
            }
        }

        if let Some(cancel) = self.cancel.get() {
            cancel.cancel();
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
struct StubClient {
    imports: Arc<Mutex<Vec<ClientImport>>>,
}

impl StubClient {
    fn imports(&self) -> Vec<ClientImport> {
        self.imports.lock().unwrap().clone()
    }
}

impl GameClient for StubClient {
    async fn import_file(&self, request: &ClientImport) -> Result<(), ProcessError> {
        assert!(request.file.is_file(), "client must see the staged file");
        self.imports.lock().unwrap().push(request.clone());
        Ok(())
    }
}

struct Harness {
    _temp: TempDir,
    root: Utf8PathBuf,
    layout: DataLayout,
    state: Arc<StateManager>,
    extractor: StubExtractor,
    client: StubClient,
    controller: InstallationController<StubExtractor, StubClient>,
}

impl Harness {
    fn new(behavior: Behavior) -> Self {
        let (temp, root) = temp_dir();
        let layout = DataLayout::new(root.join("data"));
        layout.ensure_exists().unwrap();

        let state = Arc::new(StateManager::new());
        let extractor = StubExtractor::new(behavior);
        let client = StubClient::default();
        let catalog = Arc::new(VersionCatalog::new(layout.versions_root()));
        let controller = InstallationController::new(
            layout.clone(),
            extractor.clone(),
            client.clone(),
            catalog,
            state.clone(),
        );

        Self {
            _temp: temp,
            root,
            layout,
            state,
            extractor,
            client,
            controller,
        }
    }

    /// A fake application package outside the data root.
    fn package(&self) -> Utf8PathBuf {
        let path = self.root.join("demo.apk");
        fs::write(&path, b"PK\x03\x04 not really an apk").unwrap();
        path
    }

    fn imports_is_empty(&self) -> bool {
        fs::read_dir(self.layout.imports_dir())
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }

    fn add_version(&self, name: &str) {
        fs::create_dir_all(self.layout.version_dir(name)).unwrap();
    }

    fn last_outcome(&self, kind: OperationKind) -> Option<OperationOutcome> {
        self.state.read(|s| s.last_outcome(kind).cloned())
    }
}

#[tokio::test]
async fn test_demo_install_is_cataloged() {
    let h = Harness::new(Behavior::WriteAppSo);
    let source = h.package();

    let installed = h
        .controller
        .install(InstallRequest::new(source.as_str(), "Demo"))
        .await
        .unwrap();

    assert!(!installed.already_present);
    assert_eq!(installed.path, h.layout.version_dir("Demo"));
    assert!(installed.path.join("app.so").is_file());
    for dir in ["worlds", "resource_packs", "behavior_packs"] {
        assert!(installed.path.join(dir).is_dir(), "{dir} missing");
    }

    let records = h.controller.catalog().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Demo");
    assert!(records[0].tag.is_none());
    assert!(records[0].install_timestamp > SystemTime::UNIX_EPOCH);
    assert!(records[0].is_valid());

    assert!(h.imports_is_empty(), "staged copy must be removed");
    assert!(source.exists());
    assert_eq!(
        h.state.read(|s| s.phase(OperationKind::Install)),
        InstallPhase::Committed
    );
    assert!(matches!(
        h.last_outcome(OperationKind::Install),
        Some(OperationOutcome::Succeeded { .. })
    ));
    assert_eq!(
        h.controller
            .metrics()
            .installs_committed
            .load(Ordering::Relaxed),
        1
    );
}

#[tokio::test]
async fn test_reinstall_skips_extractor() {
    let h = Harness::new(Behavior::WriteAppSo);
    let source = h.package();

    let first = h
        .controller
        .install(InstallRequest::new(source.as_str(), "Demo"))
        .await
        .unwrap();
    let second = h
        .controller
        .install(InstallRequest::new(source.as_str(), "Demo"))
        .await
        .unwrap();

    assert!(!first.already_present);
    assert!(second.already_present);
    assert_eq!(h.extractor.calls(), 1);
}

#[tokio::test]
async fn test_cancel_after_extraction_rolls_back() {
    let h = Harness::new(Behavior::WriteAppSo);
    h.extractor
        .cancel
        .set(h.controller.cancel_handle())
        .unwrap();
    let source = h.package();

    let result = h
        .controller
        .install(InstallRequest::new(source.as_str(), "Demo"))
        .await;

    assert!(matches!(result, Err(InstallError::Cancelled)));
    assert!(!h.layout.version_dir("Demo").exists());
    assert!(h.imports_is_empty());
    assert!(h.controller.catalog().is_empty());
    assert_eq!(
        h.state.read(|s| s.phase(OperationKind::Install)),
        InstallPhase::Cancelled
    );
    assert_eq!(
        h.last_outcome(OperationKind::Install),
        Some(OperationOutcome::Cancelled)
    );
    assert_eq!(
        h.controller
            .metrics()
            .installs_cancelled
            .load(Ordering::Relaxed),
        1
    );
}

#[tokio::test]
async fn test_cancel_flag_resets_for_next_install() {
    let h = Harness::new(Behavior::WriteAppSo);
    let source = h.package();

    // A stale request from before the install started is ignored.
    h.controller.cancel_install();
    let installed = h
        .controller
        .install(InstallRequest::new(source.as_str(), "Demo"))
        .await
        .unwrap();

    assert!(installed.path.is_dir());
    assert!(!h.controller.cancel_handle().is_cancelled());
}

#[tokio::test]
async fn test_extractor_failure_rolls_back() {
    let h = Harness::new(Behavior::Fail);
    let source = h.package();

    let error = h
        .controller
        .install(InstallRequest::new(source.as_str(), "Broken"))
        .await
        .unwrap_err();

    assert_eq!(error.category(), ErrorCategory::ExternalProcess);
    assert!(error.to_string().contains("corrupt apk"));
    assert!(!h.layout.version_dir("Broken").exists());
    assert!(h.imports_is_empty());
    assert_eq!(
        h.state.read(|s| s.phase(OperationKind::Install)),
        InstallPhase::Failed
    );
}

#[tokio::test]
async fn test_empty_extractor_output_is_failure() {
    let h = Harness::new(Behavior::Nothing);
    let source = h.package();

    let result = h
        .controller
        .install(InstallRequest::new(source.as_str(), "Hollow"))
        .await;

    assert!(matches!(result, Err(InstallError::MissingOutput(_))));
    assert!(!h.layout.version_dir("Hollow").exists());
}

#[tokio::test]
async fn test_install_rejects_bad_input() {
    let h = Harness::new(Behavior::WriteAppSo);
    let source = h.package();

    let bad_name = h
        .controller
        .install(InstallRequest::new(source.as_str(), "../escape"))
        .await;
    assert!(matches!(bad_name, Err(InstallError::Input(_))));

    let missing = h
        .controller
        .install(InstallRequest::new(h.root.join("gone.apk").as_str(), "Demo"))
        .await;
    assert!(matches!(
        missing,
        Err(InstallError::Stage(StageError::SourceMissing(_)))
    ));

    assert_eq!(h.extractor.calls(), 0);
    assert!(!h.layout.version_dir("Demo").exists());
}

#[tokio::test]
async fn test_install_customizations() {
    let h = Harness::new(Behavior::WriteAppSo);
    let source = h.package();
    let icon = h.root.join("icon.PNG");
    let background = h.root.join("bg.jpeg");
    fs::write(&icon, b"icon").unwrap();
    fs::write(&background, b"background").unwrap();

    let installed = h
        .controller
        .install(
            InstallRequest::new(source.as_str(), "Custom")
                .with_icon(icon.as_str())
                .with_background(background.as_str())
                .with_tag("Beta build"),
        )
        .await
        .unwrap();

    assert_eq!(
        fs::read(installed.path.join("custom_icon.png")).unwrap(),
        b"icon"
    );
    assert_eq!(
        fs::read_to_string(installed.path.join("tag.txt")).unwrap(),
        "Beta build"
    );

    let record = h.controller.catalog().get("Custom").unwrap();
    assert_eq!(record.tag.as_deref(), Some("Beta build"));
    assert_eq!(record.icon_path, Some(installed.path.join("custom_icon.png")));
    assert_eq!(
        record.background_path,
        Some(installed.path.join("custom_background.jpeg"))
    );
    assert!(h.imports_is_empty());
}

#[tokio::test]
async fn test_import_addon_into_resource_packs() {
    let h = Harness::new(Behavior::WriteAppSo);
    h.add_version("1.21");
    let addon = write_zip(
        &h.root.join("Bundle.mcaddon"),
        &[
            ("RP/manifest.json", resource_manifest("rp", "Bundle RP").as_bytes()),
            ("RP/textures/a.png", b"png"),
        ],
    );

    let imported = h
        .controller
        .import(ImportRequest::new(addon.as_str(), "1.21"))
        .await
        .unwrap();

    let packs = h.layout.resource_packs_dir("1.21");
    assert_eq!(imported.kind, PackageType::Addon);
    assert_eq!(
        imported.route,
        ImportRoute::Extracted {
            destination: packs.clone(),
            files: 2
        }
    );
    assert!(packs.join("RP/manifest.json").is_file());
    assert!(h.imports_is_empty());
    assert!(h.client.imports().is_empty());
}

#[tokio::test]
async fn test_import_detects_resource_pack() {
    let h = Harness::new(Behavior::WriteAppSo);
    h.add_version("1.21");
    let pack = write_zip(
        &h.root.join("Shiny.mcpack"),
        &[("manifest.json", resource_manifest("rp", "Shiny").as_bytes())],
    );

    let imported = h
        .controller
        .import(ImportRequest::new(pack.as_str(), "1.21"))
        .await
        .unwrap();

    assert_eq!(imported.kind, PackageType::ResourcePack);
    assert!(
        h.layout
            .resource_packs_dir("1.21")
            .join("Shiny/manifest.json")
            .is_file()
    );
}

#[tokio::test]
async fn test_import_rejects_traversal_without_writing() {
    let h = Harness::new(Behavior::WriteAppSo);
    h.add_version("1.21");
    let evil = write_zip(
        &h.root.join("Evil.mcaddon"),
        &[
            ("RP/manifest.json", resource_manifest("rp", "Evil").as_bytes()),
            ("../../../escape.txt", b"gotcha"),
        ],
    );

    let error = h
        .controller
        .import(ImportRequest::new(evil.as_str(), "1.21"))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        InstallError::Archive(ArchiveError::PathTraversal(_))
    ));
    assert_eq!(error.category(), ErrorCategory::Validation);
    let packs = h.layout.resource_packs_dir("1.21");
    assert!(!packs.join("RP").exists());
    assert!(!h.layout.data_root().join("escape.txt").exists());
    assert!(!h.layout.versions_root().join("escape.txt").exists());
    assert!(h.imports_is_empty());
    assert_eq!(
        h.controller
            .metrics()
            .archives_rejected
            .load(Ordering::Relaxed),
        1
    );
}

#[tokio::test]
async fn test_import_rolls_back_partial_extraction() {
    let h = Harness::new(Behavior::WriteAppSo);
    h.add_version("1.21");
    let packs = h.layout.resource_packs_dir("1.21");
    fs::create_dir_all(packs.join("Existing")).unwrap();
    fs::write(packs.join("Existing/manifest.json"), b"{}").unwrap();

    let broken = write_zip(
        &h.root.join("Broken.mcaddon"),
        &[
            ("RP/a.txt", b"first entry is fine"),
            ("RP/b.txt", b"second entry is damaged"),
            ("Loose.txt", b"never reached"),
        ],
    );
    corrupt_crc(&broken, "RP/b.txt");

    let error = h
        .controller
        .import(ImportRequest::new(broken.as_str(), "1.21"))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        InstallError::Archive(ArchiveError::CorruptEntry { ref name, .. }) if name == "RP/b.txt"
    ));
    assert_eq!(error.category(), ErrorCategory::Validation);
    assert!(!packs.join("RP").exists());
    assert!(!packs.join("Loose.txt").exists());
    assert!(packs.join("Existing/manifest.json").is_file());
    assert!(h.imports_is_empty());
    assert_eq!(
        h.last_outcome(OperationKind::Import),
        Some(OperationOutcome::Failed {
            category: ErrorCategory::Validation,
            message: error.to_string(),
        })
    );
}

#[tokio::test]
async fn test_import_world_is_delegated() {
    let h = Harness::new(Behavior::WriteAppSo);
    h.add_version("1.21");
    let world = write_zip(
        &h.root.join("Castle.mcworld"),
        &[("level.dat", b"\x0a"), ("db/CURRENT", b"x")],
    );

    let imported = h
        .controller
        .import(ImportRequest::new(world.as_str(), "1.21"))
        .await
        .unwrap();

    assert_eq!(imported.kind, PackageType::World);
    assert_eq!(imported.route, ImportRoute::Delegated);

    let calls = h.client.imports();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].version_dir, h.layout.version_dir("1.21"));
    assert_eq!(calls[0].profile_dir, Some(h.layout.profile_dir("1.21")));
    assert!(calls[0].file.starts_with(h.layout.imports_dir()));
    assert!(!calls[0].file.exists(), "staged input removed afterwards");
}

#[tokio::test]
async fn test_import_shared_profile_and_explicit_kind() {
    let h = Harness::new(Behavior::WriteAppSo);
    h.add_version("1.21");
    let file = h.root.join("thing.bin");
    fs::write(&file, b"opaque").unwrap();

    let imported = h
        .controller
        .import(
            ImportRequest::new(file.as_str(), "1.21")
                .with_kind(PackageType::World)
                .with_shared_profile(true),
        )
        .await
        .unwrap();

    assert_eq!(imported.route, ImportRoute::Delegated);
    assert_eq!(h.client.imports()[0].profile_dir, None);
}

#[tokio::test]
async fn test_import_requires_installed_version() {
    let h = Harness::new(Behavior::WriteAppSo);
    let file = h.root.join("pack.mcpack");
    fs::write(&file, b"x").unwrap();

    for version in ["", "missing", "../1.21"] {
        let result = h
            .controller
            .import(ImportRequest::new(file.as_str(), version))
            .await;
        assert!(
            matches!(result, Err(InstallError::Input(_))),
            "{version:?}: {result:?}"
        );
    }
    assert!(matches!(
        h.last_outcome(OperationKind::Import),
        Some(OperationOutcome::Failed {
            category: ErrorCategory::Input,
            ..
        })
    ));
}

#[tokio::test]
async fn test_uninstall_removes_version_and_profile() {
    let h = Harness::new(Behavior::WriteAppSo);
    let source = h.package();
    h.controller
        .install(InstallRequest::new(source.as_str(), "Demo"))
        .await
        .unwrap();
    let profile = h.layout.profile_dir("Demo");
    fs::create_dir_all(profile.join("games")).unwrap();

    let uninstalled = h.controller.uninstall("Demo", true).await.unwrap();

    assert_eq!(uninstalled.removed.len(), 2);
    assert!(uninstalled.failed.is_empty());
    assert!(!h.layout.version_dir("Demo").exists());
    assert!(!profile.exists());
    assert!(h.controller.catalog().is_empty());
}

#[tokio::test]
async fn test_uninstall_keeps_profile_by_default() {
    let h = Harness::new(Behavior::WriteAppSo);
    h.add_version("Demo");
    let profile = h.layout.profile_dir("Demo");
    fs::create_dir_all(&profile).unwrap();

    let by_path = h.layout.version_dir("Demo");
    let uninstalled = h
        .controller
        .uninstall(by_path.as_str(), false)
        .await
        .unwrap();

    assert_eq!(uninstalled.removed.len(), 1);
    assert!(profile.exists());
}

#[tokio::test]
async fn test_uninstall_refuses_paths_outside_versions_root() {
    let h = Harness::new(Behavior::WriteAppSo);
    let elsewhere = h.root.join("elsewhere");
    fs::create_dir_all(&elsewhere).unwrap();

    let outside = h.controller.uninstall(elsewhere.as_str(), false).await;
    let root = h
        .controller
        .uninstall(h.layout.versions_root().as_str(), false)
        .await;
    let missing = h.controller.uninstall("NotThere", false).await;

    assert!(matches!(outside, Err(InstallError::Input(_))));
    assert!(matches!(root, Err(InstallError::Input(_))));
    assert!(matches!(missing, Err(InstallError::Input(_))));
    assert!(elsewhere.exists());
    assert!(h.layout.versions_root().exists());
}

#[tokio::test]
async fn test_worker_rejects_second_install() {
    let notify = Arc::new(Notify::new());
    let h = Harness::new(Behavior::WaitFor(Arc::clone(&notify)));
    let source = h.package();
    let Harness {
        _temp,
        layout,
        controller,
        ..
    } = h;

    let worker = OperationWorker::new(Arc::new(controller), tokio::runtime::Handle::current());

    let first = worker
        .install(InstallRequest::new(source.as_str(), "First"))
        .unwrap();
    assert!(worker.is_running(OperationKind::Install));
    assert!(!worker.is_running(OperationKind::Import));

    let second = worker.install(InstallRequest::new(source.as_str(), "Second"));
    assert!(matches!(
        second,
        Err(InstallError::AlreadyRunning(OperationKind::Install))
    ));

    notify.notify_one();
    let installed = first.await.unwrap().unwrap();

    assert_eq!(installed.name, "First");
    assert!(!layout.version_dir("Second").exists());
    assert!(!worker.is_running(OperationKind::Install));

    // The slot is free again.
    let again = worker
        .install(InstallRequest::new(source.as_str(), "First"))
        .unwrap();
    assert!(again.await.unwrap().unwrap().already_present);
}

#[cfg(unix)]
mod process_extractor {
    use super::*;
    use bedrock_installer::services::ProcessExtractor;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    fn script(dir: &Utf8Path, name: &str, body: &str) -> Utf8PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_script_extractor_success() {
        let (_temp, dir) = temp_dir();
        let tool = script(&dir, "extract.sh", r#"echo elf > "$2/app.so""#);
        let target = dir.join("versions/Demo");

        ProcessExtractor::new(tool.as_str(), Duration::from_secs(10))
            .extract(&dir.join("demo.apk"), &target)
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(target.join("app.so")).unwrap(), "elf\n");
    }

    #[tokio::test]
    async fn test_script_extractor_forwards_stderr() {
        let (_temp, dir) = temp_dir();
        let tool = script(&dir, "extract.sh", "echo 'bad signature' >&2\nexit 3");

        let error = ProcessExtractor::new(tool.as_str(), Duration::from_secs(10))
            .extract(&dir.join("demo.apk"), &dir.join("out"))
            .await
            .unwrap_err();

        match error {
            ProcessError::NonZeroExit { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "bad signature");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_script_extractor_timeout() {
        let (_temp, dir) = temp_dir();
        let tool = script(&dir, "extract.sh", "sleep 5");

        let error = ProcessExtractor::new(tool.as_str(), Duration::from_millis(200))
            .extract(&dir.join("demo.apk"), &dir.join("out"))
            .await
            .unwrap_err();

        assert!(matches!(error, ProcessError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_missing_extractor_binary() {
        let (_temp, dir) = temp_dir();

        let tool = dir.join("no-such-tool");

        let error = ProcessExtractor::new(tool.as_str(), Duration::from_secs(1))
            .extract(&dir.join("demo.apk"), &dir.join("out"))
            .await
            .unwrap_err();

        assert!(matches!(error, ProcessError::Spawn { .. }));
    }
}
