//! Simulator deployment.
//!
//! Turns an `.app` bundle or a decrypted `.ipa` archive into a running app on
//! an iOS Simulator device:
//!
//! ```text
//! package ─► workspace copy ─► convert ─► sign ─► boot ─► install ─► launch
//! ```
//!
//! - [`process`] - subprocess gateway ([`CommandRunner`], [`SystemRunner`])
//! - `workspace` - RAII scratch directory for one run
//! - `resolver` - package → bundle inside the workspace
//! - `signing` - identity discovery and framework-first signing
//! - [`simulator`] - inventory, boot with bounded readiness poll, install, launch
//! - `pipeline` - ordered steps with guaranteed workspace cleanup

mod convert;
mod error;
mod fs;
mod manifest;
mod pipeline;
pub mod process;
mod resolver;
mod signing;
pub mod simulator;
mod tool_detection;
mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use convert::convert_for_simulator;
pub use error::{Context, Error, ErrorExt, Result};
pub use manifest::read_bundle_identifier;
pub use pipeline::{DeployOptions, DeploymentReport, Pipeline, PipelineError, PipelineStep};
pub use process::{CommandRunner, Invocation, ProcessOutput, SystemRunner};
pub use resolver::{ResolvedBundle, resolve_bundle};
pub use signing::{
    IdentityMatch, SigningIdentity, SigningReport, find_identity, list_identities,
    parse_identities, sign_bundle, sign_frameworks, sign_main_bundle,
};
pub use tool_detection::{HAS_SIMCTL, resolve_converter};
pub use workspace::ScratchWorkspace;
