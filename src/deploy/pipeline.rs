//! Deployment pipeline orchestration.
//!
//! Runs, in order:
//! 1. Create a scratch workspace
//! 2. Resolve the package into a bundle inside the workspace
//! 3. Run the conversion tool on the bundle
//! 4. Sign embedded frameworks, then the bundle
//! 5. Make sure the simulator is booted
//! 6. Install the bundle
//! 7. Read the bundle identifier from Info.plist
//! 8. Launch the app
//!
//! The first failure aborts the run. The workspace is removed on every exit
//! path, and nothing is retried.

use super::{
    convert::convert_for_simulator,
    error::{Error, Result},
    manifest::read_bundle_identifier,
    process::CommandRunner,
    resolver::{ResolvedBundle, resolve_bundle},
    signing::{SigningIdentity, sign_frameworks, sign_main_bundle},
    simulator::{BootOutcome, BootPolicy, SimulatorController},
    workspace::ScratchWorkspace,
};
use crate::{
    cli::OutputManager,
    source::{PackageKind, PackageReference},
};
use std::{
    fmt,
    path::PathBuf,
    time::{Duration, Instant},
};
use thiserror::Error;

/// Pipeline step, used to report where a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    PrepareWorkspace,
    ResolveBundle,
    Convert,
    Sign,
    BootDevice,
    Install,
    ReadBundleIdentifier,
    Launch,
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineStep::PrepareWorkspace => "Preparing scratch workspace",
            PipelineStep::ResolveBundle => "Resolving app bundle",
            PipelineStep::Convert => "Converting app for simulator",
            PipelineStep::Sign => "Code signing",
            PipelineStep::BootDevice => "Booting simulator",
            PipelineStep::Install => "Installing to simulator",
            PipelineStep::ReadBundleIdentifier => "Reading bundle identifier",
            PipelineStep::Launch => "Launching app",
        })
    }
}

/// The single terminal failure of a pipeline run.
#[derive(Error, Debug)]
#[error("{step} failed: {source}")]
pub struct PipelineError {
    pub step: PipelineStep,
    #[source]
    pub source: Error,
}

trait StepExt<T> {
    fn during(self, step: PipelineStep) -> std::result::Result<T, PipelineError>;
}

impl<T> StepExt<T> for Result<T> {
    fn during(self, step: PipelineStep) -> std::result::Result<T, PipelineError> {
        self.map_err(|source| PipelineError { step, source })
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Conversion tool executable
    pub converter: PathBuf,
    /// Parent directory for scratch workspaces (system temp dir when `None`)
    pub scratch_root: Option<PathBuf>,
    pub boot: BootPolicy,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReport {
    pub bundle_name: String,
    pub bundle_identifier: String,
    pub signed_frameworks: usize,
    pub boot: BootOutcome,
    /// Process id printed by `simctl launch`, if any
    pub pid: Option<u32>,
    pub elapsed: Duration,
}

/// Deploys packages to a simulator.
pub struct Pipeline<'a, R> {
    runner: &'a R,
    options: DeployOptions,
    output: OutputManager,
}

impl<'a, R: CommandRunner> Pipeline<'a, R> {
    pub fn new(runner: &'a R, options: DeployOptions, output: OutputManager) -> Self {
        Self {
            runner,
            options,
            output,
        }
    }

    /// Runs every step for `package` against simulator `udid`.
    pub async fn deploy(
        &self,
        package: &PackageReference,
        identity: &SigningIdentity,
        udid: &str,
    ) -> std::result::Result<DeploymentReport, PipelineError> {
        let started = Instant::now();
        log::info!(
            "Deploying {} to simulator {} signed as {}",
            package.display_name(),
            udid,
            identity
        );

        let workspace = ScratchWorkspace::create(self.options.scratch_root.as_deref())
            .during(PipelineStep::PrepareWorkspace)?;

        let outcome = self.run_steps(&workspace, package, identity, udid).await;

        if let Err(e) = workspace.close() {
            let _ = self
                .output
                .warn(&format!("Failed to remove scratch workspace: {}", e));
        }

        match outcome {
            Ok(mut report) => {
                report.elapsed = started.elapsed();
                log::info!(
                    "Deployed {} in {}ms",
                    report.bundle_identifier,
                    report.elapsed.as_millis()
                );
                Ok(report)
            }
            Err(e) => {
                log::debug!("Pipeline stopped at step {:?}", e.step);
                Err(e)
            }
        }
    }

    async fn run_steps(
        &self,
        workspace: &ScratchWorkspace,
        package: &PackageReference,
        identity: &SigningIdentity,
        udid: &str,
    ) -> std::result::Result<DeploymentReport, PipelineError> {
        self.progress(match package.kind() {
            PackageKind::Archive => "Extracting IPA...",
            PackageKind::Bundle => "Copying app bundle...",
        });
        let bundle = resolve_bundle(self.runner, package, workspace)
            .await
            .during(PipelineStep::ResolveBundle)?;

        self.progress("Converting app for simulator...");
        convert_for_simulator(self.runner, &self.options.converter, &bundle)
            .await
            .during(PipelineStep::Convert)?;

        let signed_frameworks = self.sign(&bundle, identity).await?;

        self.progress("Checking simulator status...");
        let controller = SimulatorController::new(self.runner, self.options.boot)
            .with_output(self.output.clone());
        let boot = controller
            .ensure_running(udid)
            .await
            .during(PipelineStep::BootDevice)?;

        self.progress("Installing to simulator...");
        controller
            .install(udid, bundle.path())
            .await
            .during(PipelineStep::Install)?;

        self.progress("Launching app...");
        let bundle_identifier = read_bundle_identifier(self.runner, &bundle)
            .await
            .during(PipelineStep::ReadBundleIdentifier)?;
        let pid = controller
            .launch(udid, &bundle_identifier)
            .await
            .during(PipelineStep::Launch)?;

        Ok(DeploymentReport {
            bundle_name: bundle.name(),
            bundle_identifier,
            signed_frameworks,
            boot,
            pid,
            elapsed: Duration::ZERO,
        })
    }

    async fn sign(
        &self,
        bundle: &ResolvedBundle,
        identity: &SigningIdentity,
    ) -> std::result::Result<usize, PipelineError> {
        if bundle.frameworks_dir().is_dir() {
            self.progress("Signing frameworks...");
        }
        let frameworks = sign_frameworks(self.runner, bundle, identity)
            .await
            .during(PipelineStep::Sign)?;
        for framework in &frameworks {
            if let Some(name) = framework.file_name() {
                let _ = self
                    .output
                    .verbose(&format!("signed {}", name.to_string_lossy()));
            }
        }

        self.progress("Signing main bundle...");
        sign_main_bundle(self.runner, bundle, identity)
            .await
            .during(PipelineStep::Sign)?;
        Ok(frameworks.len())
    }

    fn progress(&self, message: &str) {
        let _ = self.output.progress(message);
    }
}
