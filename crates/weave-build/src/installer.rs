//! Package installer subprocess.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time;
use tracing::{debug, info};

use crate::BuildConfig;

/// Outcome of one installer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStatus {
    Succeeded,
    /// The installer exited unsuccessfully. `code` is `None` when it was
    /// terminated by a signal.
    Failed { code: Option<i32> },
    /// The installer ran past its deadline and was killed.
    TimedOut { after: Duration },
    /// The installer could not be started.
    Unavailable { reason: String },
}

impl InstallStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, InstallStatus::Succeeded)
    }
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallStatus::Succeeded => write!(f, "succeeded"),
            InstallStatus::Failed { code: Some(code) } => write!(f, "exited with status {}", code),
            InstallStatus::Failed { code: None } => write!(f, "terminated by signal"),
            InstallStatus::TimedOut { after } => write!(f, "timed out after {}s", after.as_secs()),
            InstallStatus::Unavailable { reason } => write!(f, "could not be started: {}", reason),
        }
    }
}

/// Something that installs the dependencies listed in a package directory.
pub trait PackageInstaller {
    /// Install into `dir`, which already contains `package.json`.
    fn install(&self, dir: &Path) -> impl Future<Output = InstallStatus> + Send;
}

/// Runs an external program (`npm install` by default) in the package
/// directory and waits for it.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandInstaller {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &BuildConfig) -> Self {
        Self::new(
            config.installer.clone(),
            config.installer_args.clone(),
            config.install_timeout(),
        )
    }
}

impl PackageInstaller for CommandInstaller {
    async fn install(&self, dir: &Path) -> InstallStatus {
        info!(
            "running {} {} in {}",
            self.program,
            self.args.join(" "),
            dir.display()
        );

        let mut child = match Command::new(&self.program)
            .args(&self.args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                return InstallStatus::Unavailable {
                    reason: format!("{}: {}", self.program, e),
                };
            }
        };

        let waited = time::timeout(self.timeout, child.wait()).await;
        match waited {
            Ok(Ok(status)) if status.success() => InstallStatus::Succeeded,
            Ok(Ok(status)) => InstallStatus::Failed {
                code: status.code(),
            },
            Ok(Err(e)) => InstallStatus::Unavailable {
                reason: format!("{}: {}", self.program, e),
            },
            Err(_) => {
                if let Err(e) = child.kill().await {
                    debug!("failed to kill {}: {}", self.program, e);
                }
                InstallStatus::TimedOut {
                    after: self.timeout,
                }
            }
        }
    }
}
