use crate::models::{ErrorCategory, OperationKind, OperationOutcome};
use crate::services::archive::ArchiveError;
use crate::services::process::ProcessError;
use crate::services::stager::StageError;
use camino::Utf8PathBuf;
use std::io;
use thiserror::Error;

/// Errors returned by install, import and uninstall
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Staging failed: {0}")]
    Stage(#[from] StageError),

    #[error("Archive rejected: {0}")]
    Archive(#[from] ArchiveError),

    #[error("External process failed: {0}")]
    ExternalProcess(#[from] ProcessError),

    #[error("Extractor reported success but produced nothing at {0}")]
    MissingOutput(Utf8PathBuf),

    #[error("{context}: {source}")]
    Filesystem {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Installation cancelled by user")]
    Cancelled,

    #[error("An {0} operation is already running")]
    AlreadyRunning(OperationKind),

    #[error("Background task failed: {0}")]
    Worker(String),
}

impl InstallError {
    pub(crate) fn filesystem(context: impl Into<String>, source: io::Error) -> Self {
        InstallError::Filesystem {
            context: context.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            InstallError::Input(_) | InstallError::Stage(_) => ErrorCategory::Input,
            InstallError::Archive(e) if e.is_policy_violation() => ErrorCategory::Validation,
            InstallError::Archive(_) => ErrorCategory::Filesystem,
            InstallError::ExternalProcess(ProcessError::Prepare { .. }) => {
                ErrorCategory::Filesystem
            }
            InstallError::ExternalProcess(_) | InstallError::MissingOutput(_) => {
                ErrorCategory::ExternalProcess
            }
            InstallError::Filesystem { .. } => ErrorCategory::Filesystem,
            InstallError::Cancelled => ErrorCategory::Cancelled,
            InstallError::AlreadyRunning(_) => ErrorCategory::Busy,
            InstallError::Worker(_) => ErrorCategory::Internal,
        }
    }

    /// Outcome reported to observers for this error.
    pub fn outcome(&self) -> OperationOutcome {
        match self {
            InstallError::Cancelled => OperationOutcome::Cancelled,
            other => OperationOutcome::Failed {
                category: other.category(),
                message: other.to_string(),
            },
        }
    }
}
