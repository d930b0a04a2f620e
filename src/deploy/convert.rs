//! Simulator conversion step.
//!
//! The conversion tool rewrites a device-built executable so it runs in the
//! simulator. It is opaque to us: one argument (the bundle path), mutates the
//! bundle in place, exit status 0 on success.

use super::{
    error::{Error, Result},
    process::{CommandRunner, Invocation, path_arg},
    resolver::ResolvedBundle,
};
use std::path::Path;

/// Runs `converter <bundle>`.
pub async fn convert_for_simulator<R: CommandRunner>(
    runner: &R,
    converter: &Path,
    bundle: &ResolvedBundle,
) -> Result<()> {
    let invocation = Invocation::new(path_arg(converter)?).path_arg(bundle.path())?;
    let output = runner.run(&invocation).await?;

    if !output.succeeded() {
        return Err(Error::ConversionFailure {
            path: bundle.path().to_path_buf(),
            status: output.status,
            output: output.combined(),
        });
    }

    let log = output.combined();
    if !log.is_empty() {
        log::debug!("Conversion tool output:\n{}", log);
    }
    Ok(())
}
