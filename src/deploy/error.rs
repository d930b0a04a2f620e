//! Error types for deployment operations.
//!
//! Every step of the pipeline reports one of these variants. The variants map
//! one-to-one onto the failure categories a user can act on: a missing tool,
//! an encrypted or malformed package, a signing failure, a device that cannot
//! be found or booted, and the final install/launch commands.

use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

/// Result type alias for deployment operations
pub type Result<T> = std::result::Result<T, Error>;

/// Deployment error
#[derive(Error, Debug)]
pub enum Error {
    /// External tool could not be started (missing binary, permission denied)
    #[error("failed to launch `{program}`: {source}")]
    LaunchFailure {
        /// Program that could not be started
        program: String,
        /// Underlying spawn error
        #[source]
        source: io::Error,
    },

    /// Auxiliary tool exited with a non-zero status
    #[error("`{command}` exited with status {status}: {stderr}")]
    ToolFailure {
        /// Command line that failed
        command: String,
        /// Exit status reported by the tool
        status: i32,
        /// Captured standard error
        stderr: String,
    },

    /// Installer archive is encrypted and cannot be deployed
    #[error(
        "{} is encrypted (contains Payload/SC_Info). Please provide a decrypted IPA.",
        path.display()
    )]
    UnsupportedPackage {
        /// Archive that was rejected
        path: PathBuf,
    },

    /// Installer archive does not contain exactly one application bundle
    #[error("malformed package {}: {reason}", path.display())]
    MalformedPackage {
        /// Archive that was rejected
        path: PathBuf,
        /// What was wrong with its structure
        reason: String,
    },

    /// Conversion tool rejected the bundle
    #[error("conversion of {} failed with status {status}: {output}", path.display())]
    ConversionFailure {
        /// Bundle passed to the conversion tool
        path: PathBuf,
        /// Exit status of the conversion tool
        status: i32,
        /// Tool output
        output: String,
    },

    /// `codesign` exited with a non-zero status
    #[error("signing {} failed with status {status}: {stderr}", path.display())]
    SigningFailure {
        /// Signed target (framework or main bundle)
        path: PathBuf,
        /// Exit status of codesign
        status: i32,
        /// Captured standard error
        stderr: String,
    },

    /// Device identifier does not match any known simulator
    #[error("simulator {udid} not found; select a different simulator")]
    DeviceNotFound {
        /// Identifier that did not resolve
        udid: String,
    },

    /// Device did not reach the booted state in time
    #[error("simulator {udid} did not finish booting within {}s", waited.as_secs())]
    DeviceNotReady {
        /// Device being booted
        udid: String,
        /// Time spent waiting
        waited: Duration,
    },

    /// Boot command failed and the device is not running
    #[error("failed to boot simulator {udid} (status {status}): {stderr}")]
    BootFailure {
        /// Device being booted
        udid: String,
        /// Exit status of `simctl boot`
        status: i32,
        /// Captured standard error
        stderr: String,
    },

    /// `simctl install` failed
    #[error("installing on simulator {udid} failed with status {status}: {output}")]
    InstallFailure {
        /// Target device
        udid: String,
        /// Exit status of `simctl install`
        status: i32,
        /// Tool output, verbatim
        output: String,
    },

    /// `simctl launch` failed
    #[error("launching {bundle_id} on simulator {udid} failed with status {status}: {output}")]
    AppLaunchFailure {
        /// Bundle identifier that was launched
        bundle_id: String,
        /// Target device
        udid: String,
        /// Exit status of `simctl launch`
        status: i32,
        /// Tool output, verbatim
        output: String,
    },

    /// Bundle identifier could not be read from Info.plist
    #[error("failed to read bundle identifier from {}: {reason}", path.display())]
    BundleIdentifier {
        /// Manifest that was queried
        path: PathBuf,
        /// Reason for the failure
        reason: String,
    },

    /// `simctl list -j` returned something we could not parse
    #[error("invalid simulator inventory: {0}")]
    InvalidInventory(#[from] serde_json::Error),

    /// Filesystem operation failed
    #[error("{context} {}: {error}", path.display())]
    Fs {
        /// What was being done
        context: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        error: io::Error,
    },

    /// IO error without path context
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// Directory traversal error
    #[error("{0}")]
    WalkDir(#[from] walkdir::Error),

    /// Path prefix stripping error
    #[error("{0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Anything else
    #[error("{0}")]
    GenericError(String),
}

/// Attach path context to IO results.
pub trait ErrorExt<T> {
    /// Converts an IO error into [`Error::Fs`] naming the operation and path.
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Wrap an error with a lazily built message.
pub trait Context<T> {
    /// Prefixes the error message with the given context.
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::GenericError(format!("{}: {}", f(), e)))
    }
}

/// Return early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::deploy::Error::GenericError(format!($($arg)*)))
    };
}
