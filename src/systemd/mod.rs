//! systemd and udev integration
//!
//! The orchestrator talks to the init system and the device manager only
//! through the [`InitSystem`] and [`DeviceManager`] traits. The production
//! implementations drive `systemctl` and `udevadm`; [`mock`] records calls
//! for tests.

pub mod mock;
pub mod notify;
pub mod unit;

use async_trait::async_trait;
use tracing::debug;

use crate::{RdInitError, command};

/// Outcome of a completed restart job as reported by systemd
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    /// The job finished successfully
    Done,
    /// The job ran but the unit did not come up; holds the unit's `Result`
    Failed(String),
}

impl std::fmt::Display for JobResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobResult::Done => write!(f, "done"),
            JobResult::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Control interface of the init system
#[async_trait]
pub trait InitSystem: Send + Sync {
    /// Reload unit definitions from disk
    async fn reload(&self) -> Result<(), RdInitError>;

    /// Restart a unit in replace mode and wait for the job to complete
    ///
    /// An error means the restart could not be enqueued at all. A job that
    /// ran but failed is reported through [`JobResult::Failed`].
    async fn restart_unit(&self, unit: &str) -> Result<JobResult, RdInitError>;

    /// Report readiness to the supervising service manager
    async fn notify_ready(&self) -> Result<(), RdInitError>;
}

/// Control interface of the device manager
#[async_trait]
pub trait DeviceManager: Send + Sync {
    /// Reload rules and link files
    async fn reload_rules(&self) -> Result<(), RdInitError>;

    /// Re-trigger `add` events for devices in a subsystem
    async fn trigger_subsystem(&self, subsystem: &str) -> Result<(), RdInitError>;
}

/// [`InitSystem`] backed by `systemctl`
#[derive(Debug, Clone)]
pub struct Systemctl {
    program: String,
}

impl Systemctl {
    pub fn new() -> Self {
        Self::with_program("systemctl")
    }

    /// Drive a different `systemctl` binary
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn show_property(&self, unit: &str, property: &str) -> Result<String, RdInitError> {
        let prop = format!("--property={}", property);
        let output = command::run_checked(&self.program, &["show", &prop, "--value", unit])
            .await
            .map_err(control_plane)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for Systemctl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InitSystem for Systemctl {
    async fn reload(&self) -> Result<(), RdInitError> {
        debug!("Reloading systemd unit definitions");
        command::run_checked(&self.program, &["daemon-reload"])
            .await
            .map_err(control_plane)?;
        Ok(())
    }

    async fn restart_unit(&self, unit: &str) -> Result<JobResult, RdInitError> {
        debug!(unit, "Restarting unit");
        let output = command::run(&self.program, &["restart", "--job-mode=replace", unit])
            .await
            .map_err(control_plane)?;

        if output.status.success() {
            return Ok(JobResult::Done);
        }

        // systemctl exits non-zero both when the job cannot be queued and when
        // the queued job fails; only a loaded unit can have had a job run.
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let load_state = self.show_property(unit, "LoadState").await?;
        if load_state != "loaded" {
            return Err(RdInitError::ControlPlane(format!(
                "failed to restart unit {} (load state {}): {}",
                unit, load_state, stderr
            )));
        }

        // A unit whose job failed on a dependency keeps Result=success.
        let result = self.show_property(unit, "Result").await?;
        let reason = if !result.is_empty() && result != "success" {
            result
        } else if !stderr.is_empty() {
            stderr
        } else {
            self.show_property(unit, "ActiveState").await?
        };
        Ok(JobResult::Failed(reason))
    }

    async fn notify_ready(&self) -> Result<(), RdInitError> {
        notify::notify_ready()?;
        Ok(())
    }
}

/// [`DeviceManager`] backed by `udevadm`
#[derive(Debug, Clone)]
pub struct Udevadm {
    program: String,
}

impl Udevadm {
    pub fn new() -> Self {
        Self::with_program("udevadm")
    }

    /// Drive a different `udevadm` binary
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Udevadm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceManager for Udevadm {
    async fn reload_rules(&self) -> Result<(), RdInitError> {
        command::run_checked(&self.program, &["control", "--reload"])
            .await
            .map_err(control_plane)?;
        Ok(())
    }

    async fn trigger_subsystem(&self, subsystem: &str) -> Result<(), RdInitError> {
        let filter = format!("--subsystem-match={}", subsystem);
        command::run_checked(&self.program, &["trigger", "--type=devices", &filter])
            .await
            .map_err(control_plane)?;
        Ok(())
    }
}

fn control_plane(err: RdInitError) -> RdInitError {
    match err {
        RdInitError::ControlPlane(_) => err,
        other => RdInitError::ControlPlane(other.to_string()),
    }
}
