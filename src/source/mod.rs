//! Package reference resolution

use crate::error::{CliError, Result, SimforgeError};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Bundle directory extension
pub const BUNDLE_EXTENSION: &str = "app";

/// Installer archive extension
pub const ARCHIVE_EXTENSION: &str = "ipa";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// `.ipa` installer archive (zip file)
    Archive,
    /// `.app` bundle directory
    Bundle,
}

/// User-supplied package path. Never modified by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReference {
    path: PathBuf,
    kind: PackageKind,
}

impl PackageReference {
    pub fn parse(source: &Path) -> Result<Self> {
        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let kind = match extension.as_deref() {
            Some(BUNDLE_EXTENSION) => PackageKind::Bundle,
            Some(ARCHIVE_EXTENSION) => PackageKind::Archive,
            _ => {
                return Err(invalid(format!(
                    "{} is neither a .app bundle nor an .ipa archive",
                    source.display()
                )));
            }
        };

        if !source.exists() {
            return Err(invalid(format!(
                "Path does not exist: {}",
                source.display()
            )));
        }

        match kind {
            PackageKind::Bundle if !source.is_dir() => {
                return Err(invalid(format!(
                    "{} is not a directory; .app bundles are directories",
                    source.display()
                )));
            }
            PackageKind::Archive if !source.is_file() => {
                return Err(invalid(format!(
                    "{} is not a file; .ipa archives are zip files",
                    source.display()
                )));
            }
            _ => {}
        }

        let path = source.absolutize()?.into_owned();

        Ok(Self { path, kind })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> PackageKind {
        self.kind
    }

    /// File name shown to the user (`Demo.app`, `Demo.ipa`).
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

fn invalid(reason: String) -> SimforgeError {
    SimforgeError::Cli(CliError::InvalidArguments { reason })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_bundle_directories() {
        let temp = tempfile::tempdir().unwrap();
        let app = temp.path().join("Demo.app");
        std::fs::create_dir(&app).unwrap();

        let package = PackageReference::parse(&app).unwrap();
        assert_eq!(package.kind(), PackageKind::Bundle);
        assert_eq!(package.path(), app.as_path());
        assert_eq!(package.display_name(), "Demo.app");
    }

    #[test]
    fn detects_archives_case_insensitively() {
        let temp = tempfile::tempdir().unwrap();
        let ipa = temp.path().join("Demo.IPA");
        std::fs::write(&ipa, b"PK").unwrap();

        let package = PackageReference::parse(&ipa).unwrap();
        assert_eq!(package.kind(), PackageKind::Archive);
    }

    #[test]
    fn rejects_unknown_extensions() {
        let temp = tempfile::tempdir().unwrap();
        let zip = temp.path().join("Demo.zip");
        std::fs::write(&zip, b"PK").unwrap();

        let err = PackageReference::parse(&zip).unwrap_err();
        assert!(err.to_string().contains("neither a .app bundle nor an .ipa archive"));
    }

    #[test]
    fn rejects_missing_paths() {
        let temp = tempfile::tempdir().unwrap();
        let err = PackageReference::parse(&temp.path().join("Missing.app")).unwrap_err();
        assert!(err.to_string().contains("Path does not exist"));
    }

    #[test]
    fn rejects_mismatched_kinds() {
        let temp = tempfile::tempdir().unwrap();
        let app_file = temp.path().join("Fake.app");
        std::fs::write(&app_file, b"").unwrap();
        let ipa_dir = temp.path().join("Fake.ipa");
        std::fs::create_dir(&ipa_dir).unwrap();

        assert!(PackageReference::parse(&app_file).is_err());
        assert!(PackageReference::parse(&ipa_dir).is_err());
    }
}
