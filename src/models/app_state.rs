use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Maximum number of in-flight operations of one kind.
///
/// Install and import each own a background slot; a second submission of the
/// same kind is rejected instead of queued. Enforced by
/// [`crate::services::OperationWorker`] with one `tokio::sync::Semaphore` per
/// kind.
pub const MAX_CONCURRENT_OPERATIONS_PER_KIND: usize = 1;

/// The operations the installer performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Install,
    Import,
    Uninstall,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [
        OperationKind::Install,
        OperationKind::Import,
        OperationKind::Uninstall,
    ];
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationKind::Install => "install",
            OperationKind::Import => "import",
            OperationKind::Uninstall => "uninstall",
        })
    }
}

/// Steps of the install/import state machine.
///
/// `Committed`, `Cancelled` and `Failed` are terminal for one attempt; the
/// next attempt starts again from `Staging`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallPhase {
    #[default]
    Idle,
    Staging,
    Extracting,
    Populating,
    Committed,
    Cancelled,
    Failed,
}

impl InstallPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InstallPhase::Committed | InstallPhase::Cancelled | InstallPhase::Failed
        )
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self,
            InstallPhase::Staging | InstallPhase::Extracting | InstallPhase::Populating
        )
    }
}

/// Coarse classification of operation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Input,
    Validation,
    ExternalProcess,
    Filesystem,
    Cancelled,
    Busy,
    Internal,
}

/// Final result of one operation, as shown to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OperationOutcome {
    Succeeded { message: String },
    Failed { category: ErrorCategory, message: String },
    Cancelled,
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Succeeded { .. })
    }
}

/// Observable snapshot of the installer.
///
/// Wrapped in `Arc<RwLock<_>>` by [`crate::state::StateManager`]; mutate it
/// only through [`StateManager::update`](crate::state::StateManager::update)
/// so change events are emitted.
#[derive(Clone, Debug, Default)]
pub struct InstallerState {
    pub phases: IndexMap<OperationKind, InstallPhase>,
    pub current_operation: String,

    // Progress of the running extraction
    pub progress: usize,
    pub total: usize,

    pub last_outcomes: IndexMap<OperationKind, OperationOutcome>,
}

impl InstallerState {
    pub fn phase(&self, kind: OperationKind) -> InstallPhase {
        self.phases.get(&kind).copied().unwrap_or_default()
    }

    pub fn is_busy(&self) -> bool {
        self.phases.values().any(InstallPhase::is_running)
    }

    pub fn last_outcome(&self, kind: OperationKind) -> Option<&OperationOutcome> {
        self.last_outcomes.get(&kind)
    }

    /// Forget progress and outcomes, keeping nothing from previous runs.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
