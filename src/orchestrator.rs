//! Provisioning orchestrator
//!
//! Runs the fixed boot sequence:
//! 1. Provision - apply meta-data, user-data and network-config
//! 2. Reload units - `systemctl daemon-reload`
//! 3. Retrigger devices - reload udev and replay `net` events so renames apply
//! 4. Signal ready - `READY=1` to the supervising systemd
//! 5. Restart units - each affected unit once, in order
//!
//! Readiness must go out before any restart: systemd-networkd may be
//! ordered after this service, so restarting it first would deadlock.

use tracing::{debug, info, warn};

use crate::RdInitError;
use crate::host::{Host, LinuxHost};
use crate::paths::Paths;
use crate::stages::Component;
use crate::systemd::unit::UnitSet;
use crate::systemd::{DeviceManager, InitSystem, JobResult, Systemctl, Udevadm};

/// Device subsystem replayed after new link files are written
pub const NET_SUBSYSTEM: &str = "net";

/// Orchestrator steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Provision,
    ReloadUnits,
    RetriggerDevices,
    SignalReady,
    RestartUnits,
}

impl Step {
    /// Every step, in execution order
    pub const ALL: [Step; 5] = [
        Step::Provision,
        Step::ReloadUnits,
        Step::RetriggerDevices,
        Step::SignalReady,
        Step::RestartUnits,
    ];
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Provision => write!(f, "provision"),
            Step::ReloadUnits => write!(f, "reload-units"),
            Step::RetriggerDevices => write!(f, "retrigger-devices"),
            Step::SignalReady => write!(f, "signal-ready"),
            Step::RestartUnits => write!(f, "restart-units"),
        }
    }
}

/// Drives the components and the control plane for one boot
pub struct Orchestrator {
    paths: Paths,
    host: Box<dyn Host>,
    init: Box<dyn InitSystem>,
    devices: Box<dyn DeviceManager>,
}

impl Orchestrator {
    /// Orchestrator for the live system
    pub fn new(paths: Paths) -> Self {
        Self::with_backends(
            paths,
            Box::new(LinuxHost::new()),
            Box::new(Systemctl::new()),
            Box::new(Udevadm::new()),
        )
    }

    /// Orchestrator with explicit OS and control-plane backends
    pub fn with_backends(
        paths: Paths,
        host: Box<dyn Host>,
        init: Box<dyn InitSystem>,
        devices: Box<dyn DeviceManager>,
    ) -> Self {
        Self {
            paths,
            host,
            init,
            devices,
        }
    }

    /// Run every step; the first failure ends the run
    pub async fn run(&self) -> Result<(), RdInitError> {
        let mut units = UnitSet::new();

        for step in Step::ALL {
            info!("Starting step: {}", step);
            self.run_step(step, &mut units)
                .await
                .map_err(|e| RdInitError::step(step.to_string(), e))?;
        }

        info!("Provisioning complete");
        Ok(())
    }

    async fn run_step(&self, step: Step, units: &mut UnitSet) -> Result<(), RdInitError> {
        match step {
            Step::Provision => {
                for component in Component::ALL {
                    let affected = component.run(self.host.as_ref(), &self.paths).await?;
                    info!(%component, units = ?affected, "Component applied");
                    units.extend(affected);
                }
                Ok(())
            }
            Step::ReloadUnits => {
                info!(units = ?units.iter().collect::<Vec<_>>(), "Reloading systemd");
                self.init.reload().await
            }
            Step::RetriggerDevices => {
                info!("Re-triggering network devices");
                self.devices.reload_rules().await?;
                self.devices.trigger_subsystem(NET_SUBSYSTEM).await
            }
            Step::SignalReady => {
                info!("Notifying systemd of readiness");
                self.init.notify_ready().await
            }
            Step::RestartUnits => {
                if units.is_empty() {
                    debug!("No units to restart");
                    return Ok(());
                }
                info!(count = units.len(), "Restarting affected units");
                for unit in units.iter() {
                    info!(unit, "Restarting systemd unit");
                    let result = self.init.restart_unit(unit).await?;
                    match &result {
                        JobResult::Done => info!(unit, result = %result, "restarted systemd unit"),
                        JobResult::Failed(_) => {
                            warn!(unit, result = %result, "restarted systemd unit")
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_order() {
        let names: Vec<String> = Step::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "provision",
                "reload-units",
                "retrigger-devices",
                "signal-ready",
                "restart-units"
            ]
        );
    }
}
