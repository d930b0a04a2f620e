//! Command line interface for simforge.
//!
//! Validates the package and host tools first, then resolves the signing
//! identity and target simulator (flags, saved preference, or prompts), and
//! finally hands everything to the deployment pipeline.

mod args;
mod output;
mod prompt;
mod select;

pub use args::{Args, DEFAULT_CONVERTER, RuntimeConfig};
pub use output::OutputManager;
pub use prompt::select_from;
pub use select::{DeviceRequest, choose_device, choose_identity};

use crate::config::PreferenceStore;
use crate::deploy::{
    DeployOptions, HAS_SIMCTL, Pipeline, SystemRunner, resolve_converter,
    simulator::SimulatorController,
};
use crate::error::{CliError, Result};
use crate::source::PackageReference;
use std::io;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;
    let config = RuntimeConfig::from(&args);

    let package = PackageReference::parse(&args.package)?;
    let converter = resolve_converter(&args.converter).ok_or_else(|| CliError::InvalidArguments {
        reason: format!(
            "conversion tool not found at {}. Build it with `swift build -c release` or pass --converter",
            args.converter.display()
        ),
    })?;
    if !*HAS_SIMCTL {
        return Err(CliError::InvalidArguments {
            reason: "`xcrun simctl` is not available. Install Xcode and run `xcode-select --install`"
                .to_string(),
        }
        .into());
    }

    let store = PreferenceStore::new(&args.config);
    let preferences = store.load(config.output());

    let runner = SystemRunner;
    let policy = args.boot_policy();
    let controller =
        SimulatorController::new(&runner, policy).with_output(config.output().clone());
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();

    let identity = choose_identity(&runner, args.identity.as_deref(), &mut input, &mut stdout).await?;
    let device = choose_device(
        &controller,
        DeviceRequest {
            udid: args.device.as_deref(),
            remember: args.remember,
        },
        &preferences,
        &store,
        &mut input,
        &mut stdout,
        config.output(),
    )
    .await?;

    let _ = config.progress(&format!(
        "Deploying {} to {}",
        package.display_name(),
        device.name
    ));
    let options = DeployOptions {
        converter,
        scratch_root: None,
        boot: policy,
    };
    let pipeline = Pipeline::new(&runner, options, config.output().clone());
    let report = pipeline.deploy(&package, &identity, &device.udid).await?;

    if report.signed_frameworks > 0 {
        let _ = config.indent(&format!("Signed {} embedded frameworks", report.signed_frameworks));
    }
    let launched = match report.pid {
        Some(pid) => format!("{} launched on {} (pid {})", report.bundle_identifier, device.name, pid),
        None => format!("{} launched on {}", report.bundle_identifier, device.name),
    };
    let _ = config.success(&launched);
    Ok(0)
}
