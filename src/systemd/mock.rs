//! Recording control plane for testing
//!
//! Implements both [`InitSystem`] and [`DeviceManager`] and appends every
//! call to a shared log, so tests can assert the exact order in which the
//! orchestrator drives systemd and udev.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{DeviceManager, InitSystem, JobResult};
use crate::RdInitError;

/// Mock control plane
///
/// # Example
/// ```
/// use rd_init::systemd::mock::RecordingControl;
///
/// let control = RecordingControl::new().with_failure("reload");
/// let devices = control.clone(); // shares the same call log
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingControl {
    calls: Arc<Mutex<Vec<String>>>,
    failures: Vec<String>,
    results: HashMap<String, JobResult>,
}

impl RecordingControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the call with this log entry (e.g. `"reload"`, `"restart foo.mount"`)
    pub fn with_failure(mut self, call: &str) -> Self {
        self.failures.push(call.to_string());
        self
    }

    /// Report `result` when `unit` is restarted
    pub fn with_job_result(mut self, unit: &str, result: JobResult) -> Self {
        self.results.insert(unit.to_string(), result);
        self
    }

    /// Calls recorded so far, in order
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: String) -> Result<(), RdInitError> {
        let fail = self.failures.contains(&call);
        self.calls.lock().await.push(call.clone());
        if fail {
            return Err(RdInitError::ControlPlane(format!("mock failure: {}", call)));
        }
        Ok(())
    }
}

#[async_trait]
impl InitSystem for RecordingControl {
    async fn reload(&self) -> Result<(), RdInitError> {
        self.record("reload".to_string()).await
    }

    async fn restart_unit(&self, unit: &str) -> Result<JobResult, RdInitError> {
        self.record(format!("restart {}", unit)).await?;
        Ok(self.results.get(unit).cloned().unwrap_or(JobResult::Done))
    }

    async fn notify_ready(&self) -> Result<(), RdInitError> {
        self.record("ready".to_string()).await
    }
}

#[async_trait]
impl DeviceManager for RecordingControl {
    async fn reload_rules(&self) -> Result<(), RdInitError> {
        self.record("udev reload".to_string()).await
    }

    async fn trigger_subsystem(&self, subsystem: &str) -> Result<(), RdInitError> {
        self.record(format!("udev trigger {}", subsystem)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_in_order() {
        let control = RecordingControl::new();
        let devices = control.clone();

        control.reload().await.unwrap();
        devices.trigger_subsystem("net").await.unwrap();
        control.restart_unit("a.service").await.unwrap();

        assert_eq!(
            control.calls().await,
            vec!["reload", "udev trigger net", "restart a.service"]
        );
    }

    #[tokio::test]
    async fn test_configured_failure_and_result() {
        let control = RecordingControl::new()
            .with_failure("ready")
            .with_job_result("b.mount", JobResult::Failed("exit-code".into()));

        assert!(control.notify_ready().await.is_err());
        assert_eq!(
            control.restart_unit("b.mount").await.unwrap(),
            JobResult::Failed("exit-code".into())
        );
    }
}
