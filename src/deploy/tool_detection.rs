//! External tool detection and availability checking.
//!
//! Lookups happen once, before any device or identity is queried, so a host
//! without Xcode fails with a useful message instead of a spawn error halfway
//! through a deployment.

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// Check if `xcrun simctl` is usable.
///
/// Cached result to avoid repeated subprocess calls.
pub static HAS_SIMCTL: LazyLock<bool> = LazyLock::new(|| match which::which("xcrun") {
    Ok(path) => {
        log::debug!("Found xcrun at: {}", path.display());

        match std::process::Command::new(&path)
            .args(["simctl", "help"])
            .output()
        {
            Ok(output) if output.status.success() => {
                log::info!("✓ simctl available");
                true
            }
            Ok(output) => {
                log::warn!(
                    "xcrun found at {} but `simctl help` failed (exit code: {:?}). \
                         Is Xcode selected? Stderr: {}",
                    path.display(),
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr)
                );
                false
            }
            Err(e) => {
                log::warn!("xcrun found at {} but failed to execute: {}", path.display(), e);
                false
            }
        }
    }
    Err(e) => {
        log::debug!("xcrun not found in PATH: {}", e);
        false
    }
});

/// Locates the conversion tool.
///
/// A value with a directory component must point at an existing file. A bare
/// name is looked up on `PATH`.
pub fn resolve_converter(converter: &Path) -> Option<PathBuf> {
    if converter.components().count() > 1 {
        if converter.is_file() {
            log::debug!("Using converter at: {}", converter.display());
            return Some(converter.to_path_buf());
        }
        log::debug!("Converter not found at: {}", converter.display());
        return None;
    }

    match which::which(converter) {
        Ok(path) => {
            log::debug!("Found converter at: {}", path.display());
            Some(path)
        }
        Err(e) => {
            log::debug!("{} not found in PATH: {}", converter.display(), e);
            None
        }
    }
}
