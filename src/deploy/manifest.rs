//! Bundle manifest queries.

use super::{
    error::{Error, Result},
    process::{CommandRunner, Invocation, PLIST_BUDDY},
    resolver::ResolvedBundle,
};

/// Reads `CFBundleIdentifier` from the bundle's `Info.plist` with PlistBuddy.
pub async fn read_bundle_identifier<R: CommandRunner>(
    runner: &R,
    bundle: &ResolvedBundle,
) -> Result<String> {
    let plist = bundle.info_plist();
    let invocation = Invocation::new(PLIST_BUDDY)
        .args(["-c", "Print :CFBundleIdentifier"])
        .path_arg(&plist)?;
    let output = runner.run(&invocation).await?;

    if !output.succeeded() {
        return Err(Error::BundleIdentifier {
            path: plist,
            reason: output.combined(),
        });
    }

    let identifier = output.stdout_str().trim().to_string();
    if identifier.is_empty() {
        return Err(Error::BundleIdentifier {
            path: plist,
            reason: "CFBundleIdentifier is empty".into(),
        });
    }
    Ok(identifier)
}
