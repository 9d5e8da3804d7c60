//! Process-boundary collaborators: the base-content extractor and the game
//! client's import-file mode.
//!
//! Both sit behind traits so the installer can be driven by in-process stubs
//! in tests. The process-backed implementations enforce hard timeouts; a
//! timeout is a failure, never a retry.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// Errors raised by external processes
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to prepare {path}: {source}")]
    Prepare {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("{program} exited with code {code:?}: {stderr}")]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Unpacks a full game build into a version directory.
pub trait BaseExtractor: Send + Sync {
    /// Extract `source` into `target`. Success means exit code 0.
    fn extract(
        &self,
        source: &Utf8Path,
        target: &Utf8Path,
    ) -> impl Future<Output = Result<(), ProcessError>> + Send;
}

/// Hands a content file to the game client for import.
pub trait GameClient: Send + Sync {
    /// Start the client in import-file mode. Success means the process
    /// started, not that the import finished.
    fn import_file(
        &self,
        request: &ClientImport,
    ) -> impl Future<Output = Result<(), ProcessError>> + Send;
}

/// Environment tweaks applied when launching the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchOptions {
    /// PRIME render offload to an NVIDIA GPU.
    pub nvidia_offload: bool,
    /// Force the Zink OpenGL-on-Vulkan driver.
    pub zink: bool,
    /// Wrap the client in `mangohud`.
    pub mangohud: bool,
}

/// One import handed to the game client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientImport {
    pub version_dir: Utf8PathBuf,
    /// `None` when the shared default profile should be used.
    pub profile_dir: Option<Utf8PathBuf>,
    pub file: Utf8PathBuf,
    pub options: LaunchOptions,
}

/// Fully resolved client command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCommand {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

/// Build the client invocation: `-dg <version> [-dd <profile>] -ifp <file>`.
pub fn build_client_command(client: &str, request: &ClientImport) -> ClientCommand {
    let mut program = client.to_string();
    let mut args = Vec::new();

    if request.options.mangohud {
        program = "mangohud".to_string();
        args.push(client.to_string());
    }

    args.push("-dg".to_string());
    args.push(request.version_dir.to_string());
    if let Some(profile) = &request.profile_dir {
        args.push("-dd".to_string());
        args.push(profile.to_string());
    }
    args.push("-ifp".to_string());
    args.push(request.file.to_string());

    let mut envs = Vec::new();
    if request.options.zink {
        envs.push(("MESA_LOADER_DRIVER_OVERRIDE".to_string(), "zink".to_string()));
    }
    if request.options.nvidia_offload {
        envs.push(("__NV_PRIME_RENDER_OFFLOAD".to_string(), "1".to_string()));
        envs.push(("__VK_LAYER_NV_optimus".to_string(), "NVIDIA_only".to_string()));
        envs.push(("__GLX_VENDOR_LIBRARY_NAME".to_string(), "nvidia".to_string()));
    }

    ClientCommand {
        program,
        args,
        envs,
    }
}

/// Runs an external extractor as `program <source> <target>`.
#[derive(Debug, Clone)]
pub struct ProcessExtractor {
    program: String,
    timeout: Duration,
}

impl ProcessExtractor {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl BaseExtractor for ProcessExtractor {
    async fn extract(&self, source: &Utf8Path, target: &Utf8Path) -> Result<(), ProcessError> {
        tokio::fs::create_dir_all(target)
            .await
            .map_err(|source| ProcessError::Prepare {
                path: target.to_path_buf(),
                source,
            })?;

        tracing::info!("Executing: {} {} {}", self.program, source, target);
        let start = Instant::now();

        let child = Command::new(&self.program)
            .arg(source.as_str())
            .arg(target.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                tracing::warn!("{} timed out after {:?}", self.program, self.timeout);
                ProcessError::Timeout {
                    program: self.program.clone(),
                    timeout: self.timeout,
                }
            })?
            .map_err(|source| ProcessError::Wait {
                program: self.program.clone(),
                source,
            })?;

        tracing::info!(
            "{} completed in {:.2}s with status {}",
            self.program,
            start.elapsed().as_secs_f32(),
            output.status
        );

        if output.status.success() {
            Ok(())
        } else {
            Err(ProcessError::NonZeroExit {
                program: self.program.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Starts the game client in import-file mode.
///
/// After spawning, the client is watched for `start_timeout`: exiting
/// non-zero inside that window is a failure, still running or exiting
/// cleanly is success. A client still running afterwards is reaped in the
/// background.
#[derive(Debug, Clone)]
pub struct ProcessClient {
    program: String,
    start_timeout: Duration,
}

impl ProcessClient {
    pub fn new(program: impl Into<String>, start_timeout: Duration) -> Self {
        Self {
            program: program.into(),
            start_timeout,
        }
    }
}

impl GameClient for ProcessClient {
    async fn import_file(&self, request: &ClientImport) -> Result<(), ProcessError> {
        let command = build_client_command(&self.program, request);
        tracing::info!("Executing: {} {}", command.program, command.args.join(" "));

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .envs(command.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        match timeout(self.start_timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(status)) => Err(ProcessError::NonZeroExit {
                program: command.program,
                code: status.code(),
                stderr: String::new(),
            }),
            Ok(Err(source)) => Err(ProcessError::Wait {
                program: command.program,
                source,
            }),
            Err(_) => {
                tracing::debug!("{} still running, import handed off", command.program);
                tokio::spawn(async move {
                    let _ = child.wait().await;
                });
                Ok(())
            }
        }
    }
}
