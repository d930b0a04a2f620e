//! Simulator lifecycle: state queries, idempotent boot, install and launch.

use super::inventory::{Device, DeviceState, Inventory};
use crate::cli::OutputManager;
use crate::deploy::{
    error::{Error, Result},
    process::{CommandRunner, Invocation, OPEN, XCRUN},
};
use std::{path::Path, time::Duration};
use tokio::time::{Instant, sleep};

/// Host application that owns the simulator UI
const SIMULATOR_APP: &str = "Simulator";

/// Timing used while bringing a simulator up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootPolicy {
    /// Pause after launching Simulator.app before talking to simctl
    pub host_settle: Duration,
    /// Delay between state queries while waiting for boot
    pub poll_interval: Duration,
    /// Maximum time to wait for the device to report `Booted`
    pub timeout: Duration,
}

impl Default for BootPolicy {
    fn default() -> Self {
        Self {
            host_settle: Duration::from_secs(2),
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
        }
    }
}

/// What [`SimulatorController::ensure_running`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    AlreadyRunning,
    Booted,
}

/// Drives `xcrun simctl` for one host.
pub struct SimulatorController<'a, R> {
    runner: &'a R,
    policy: BootPolicy,
    output: OutputManager,
}

impl<'a, R: CommandRunner> SimulatorController<'a, R> {
    pub fn new(runner: &'a R, policy: BootPolicy) -> Self {
        Self {
            runner,
            policy,
            output: OutputManager::new(false, false),
        }
    }

    /// Reports non-fatal problems through `output`.
    pub fn with_output(mut self, output: OutputManager) -> Self {
        self.output = output;
        self
    }

    /// Available iOS simulators, for selection.
    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        let inventory = self
            .inventory(&["simctl", "list", "devices", "available", "-j"])
            .await?;
        Ok(inventory.ios_devices())
    }

    /// Current state of `udid`; `NotFound` when simctl doesn't know it.
    pub async fn query_state(&self, udid: &str) -> Result<DeviceState> {
        let inventory = self.inventory(&["simctl", "list", "devices", "-j"]).await?;
        Ok(inventory.state_of(udid))
    }

    /// Brings `udid` to the running state.
    ///
    /// Launches Simulator.app, then boots the device only if it isn't already
    /// running, and polls until simctl reports it booted or the policy's
    /// timeout expires.
    pub async fn ensure_running(&self, udid: &str) -> Result<BootOutcome> {
        self.launch_host_app().await;
        sleep(self.policy.host_settle).await;

        match self.query_state(udid).await? {
            DeviceState::Running => {
                log::info!("Simulator {} is already booted", udid);
                Ok(BootOutcome::AlreadyRunning)
            }
            DeviceState::NotFound => Err(Error::DeviceNotFound {
                udid: udid.to_string(),
            }),
            DeviceState::Booting => {
                log::info!("Simulator {} is already booting", udid);
                self.wait_until_running(udid).await?;
                Ok(BootOutcome::Booted)
            }
            DeviceState::Stopped => {
                self.boot(udid).await?;
                self.wait_until_running(udid).await?;
                Ok(BootOutcome::Booted)
            }
        }
    }

    /// `xcrun simctl install <udid> <bundle>`
    pub async fn install(&self, udid: &str, bundle: &Path) -> Result<()> {
        let invocation = Invocation::new(XCRUN)
            .args(["simctl", "install", udid])
            .path_arg(bundle)?;
        let output = self.runner.run(&invocation).await?;

        if !output.succeeded() {
            return Err(Error::InstallFailure {
                udid: udid.to_string(),
                status: output.status,
                output: output.combined(),
            });
        }
        Ok(())
    }

    /// `xcrun simctl launch <udid> <bundle id>`, returning the pid when simctl prints one.
    pub async fn launch(&self, udid: &str, bundle_id: &str) -> Result<Option<u32>> {
        let invocation = Invocation::new(XCRUN).args(["simctl", "launch", udid, bundle_id]);
        let output = self.runner.run(&invocation).await?;

        if !output.succeeded() {
            return Err(Error::AppLaunchFailure {
                bundle_id: bundle_id.to_string(),
                udid: udid.to_string(),
                status: output.status,
                output: output.combined(),
            });
        }
        Ok(parse_launch_pid(&output.stdout_str(), bundle_id))
    }

    async fn inventory(&self, args: &[&str]) -> Result<Inventory> {
        let invocation = Invocation::new(XCRUN).args(args.iter().copied());
        let output = self.runner.run(&invocation).await?.check(&invocation)?;
        Ok(Inventory::parse(&output.stdout)?)
    }

    /// `open -a Simulator`. Failures only warn: simctl can boot headless.
    async fn launch_host_app(&self) {
        let invocation = Invocation::new(OPEN).args(["-a", SIMULATOR_APP]);
        let warning = match self.runner.run(&invocation).await {
            Ok(output) if output.succeeded() => return,
            Ok(output) => format!(
                "Could not open Simulator.app (status {}): {}",
                output.status,
                output.combined()
            ),
            Err(e) => format!("Could not open Simulator.app: {}", e),
        };
        log::debug!("{}", warning);
        let _ = self.output.warn(&warning);
    }

    async fn boot(&self, udid: &str) -> Result<()> {
        log::info!("Booting simulator {}", udid);
        let invocation = Invocation::new(XCRUN).args(["simctl", "boot", udid]);
        let output = self.runner.run(&invocation).await?;

        if output.succeeded() {
            return Ok(());
        }

        // Another client may have booted it between our query and the boot command
        if self.query_state(udid).await? == DeviceState::Running {
            log::debug!("simctl boot failed but {} is running: {}", udid, output.combined());
            return Ok(());
        }

        Err(Error::BootFailure {
            udid: udid.to_string(),
            status: output.status,
            stderr: output.combined(),
        })
    }

    async fn wait_until_running(&self, udid: &str) -> Result<()> {
        let started = Instant::now();
        loop {
            match self.query_state(udid).await? {
                DeviceState::Running => {
                    log::debug!(
                        "Simulator {} booted after {}ms",
                        udid,
                        started.elapsed().as_millis()
                    );
                    return Ok(());
                }
                DeviceState::NotFound => {
                    return Err(Error::DeviceNotFound {
                        udid: udid.to_string(),
                    });
                }
                DeviceState::Stopped | DeviceState::Booting => {}
            }

            let waited = started.elapsed();
            if waited >= self.policy.timeout {
                return Err(Error::DeviceNotReady {
                    udid: udid.to_string(),
                    waited,
                });
            }
            sleep(self.policy.poll_interval).await;
        }
    }
}

/// `com.example.Demo: 12345` → `Some(12345)`
fn parse_launch_pid(stdout: &str, bundle_id: &str) -> Option<u32> {
    stdout.lines().find_map(|line| {
        line.trim()
            .strip_prefix(bundle_id)?
            .strip_prefix(':')?
            .trim()
            .parse()
            .ok()
    })
}
