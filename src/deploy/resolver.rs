//! Bundle resolution.
//!
//! Turns a [`PackageReference`] into a [`ResolvedBundle`] that lives inside the
//! scratch workspace:
//!
//! - `.app` directories are copied verbatim.
//! - `.ipa` archives are extracted with `unzip`, checked for the `SC_Info`
//!   encryption marker, and must contain exactly one `Payload/*.app`.

use super::{
    error::{Context, Error, ErrorExt, Result},
    fs,
    process::{CommandRunner, Invocation, UNZIP},
    workspace::ScratchWorkspace,
};
use crate::source::{BUNDLE_EXTENSION, PackageKind, PackageReference};
use std::path::{Path, PathBuf};

/// Top-level directory of an extracted installer archive
const PAYLOAD_DIR: &str = "Payload";

/// Present in App Store packages that are still FairPlay encrypted
const ENCRYPTION_MARKER: &str = "SC_Info";

/// The single installable bundle for this run, rooted in the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBundle {
    path: PathBuf,
}

impl ResolvedBundle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bundle directory name, e.g. `Demo.app`.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn info_plist(&self) -> PathBuf {
        self.path.join("Info.plist")
    }

    pub fn frameworks_dir(&self) -> PathBuf {
        self.path.join("Frameworks")
    }
}

/// Produces the workspace copy of the package's bundle.
pub async fn resolve_bundle<R: CommandRunner>(
    runner: &R,
    package: &PackageReference,
    workspace: &ScratchWorkspace,
) -> Result<ResolvedBundle> {
    match package.kind() {
        PackageKind::Bundle => copy_bundle(package, workspace).await,
        PackageKind::Archive => extract_archive(runner, package, workspace).await,
    }
}

async fn copy_bundle(
    package: &PackageReference,
    workspace: &ScratchWorkspace,
) -> Result<ResolvedBundle> {
    let name = package
        .path()
        .file_name()
        .ok_or_else(|| Error::GenericError("Invalid app bundle path".into()))?;
    let destination = workspace.path().join(name);

    log::debug!(
        "Copying {} to {}",
        package.path().display(),
        destination.display()
    );
    fs::copy_dir(package.path(), &destination)
        .await
        .with_context(|| format!("copying bundle into workspace: {}", destination.display()))?;

    Ok(ResolvedBundle { path: destination })
}

async fn extract_archive<R: CommandRunner>(
    runner: &R,
    package: &PackageReference,
    workspace: &ScratchWorkspace,
) -> Result<ResolvedBundle> {
    let invocation = Invocation::new(UNZIP)
        .arg("-q")
        .path_arg(package.path())?
        .arg("-d")
        .path_arg(workspace.path())?;
    runner.run(&invocation).await?.check(&invocation)?;

    let payload = workspace.path().join(PAYLOAD_DIR);

    if payload.join(ENCRYPTION_MARKER).exists() {
        return Err(Error::UnsupportedPackage {
            path: package.path().to_path_buf(),
        });
    }

    if !payload.is_dir() {
        return Err(Error::MalformedPackage {
            path: package.path().to_path_buf(),
            reason: format!("no {} directory in archive", PAYLOAD_DIR),
        });
    }

    let bundles = find_bundles(&payload).await?;
    match bundles.as_slice() {
        [bundle] => Ok(ResolvedBundle {
            path: bundle.clone(),
        }),
        [] => Err(Error::MalformedPackage {
            path: package.path().to_path_buf(),
            reason: format!("no .{} bundle found in {}", BUNDLE_EXTENSION, PAYLOAD_DIR),
        }),
        many => Err(Error::MalformedPackage {
            path: package.path().to_path_buf(),
            reason: format!(
                "{} .{} bundles found in {} ({}), expected exactly one",
                many.len(),
                BUNDLE_EXTENSION,
                PAYLOAD_DIR,
                many.iter()
                    .filter_map(|p| p.file_name())
                    .map(|n| n.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }),
    }
}

/// `*.app` directories directly inside `payload`.
async fn find_bundles(payload: &Path) -> Result<Vec<PathBuf>> {
    let mut bundles = Vec::new();
    for entry in fs::sorted_entries(payload).await? {
        let is_bundle = entry
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case(BUNDLE_EXTENSION));
        let is_dir = tokio::fs::metadata(&entry)
            .await
            .fs_context("inspecting payload entry", &entry)?
            .is_dir();
        if is_bundle && is_dir {
            bundles.push(entry);
        }
    }
    Ok(bundles)
}
