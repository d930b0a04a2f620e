//! Top-level error types for the simforge binary.
//!
//! Deployment steps report [`crate::deploy::Error`]; the pipeline wraps the
//! first failure in a [`crate::deploy::PipelineError`]. This module adds the
//! errors that only exist at the command line boundary (bad arguments, empty
//! inventories, invalid interactive selections).

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, SimforgeError>;

/// Main error type for the simforge binary
#[derive(Error, Debug)]
pub enum SimforgeError {
    /// CLI argument and selection errors
    #[error("{0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors from discovery commands run outside the pipeline
    #[error("{0}")]
    Deploy(#[from] crate::deploy::Error),

    /// Terminal pipeline failure
    #[error("{0}")]
    Pipeline(#[from] crate::deploy::PipelineError),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// A required inventory came back empty
    #[error("No {what} found")]
    NothingToSelect {
        /// What was being listed ("signing identities", "simulators")
        what: &'static str,
    },

    /// Interactive selection was not a valid index
    #[error("Invalid selection: {input:?} (expected a number between 1 and {max})")]
    InvalidSelection {
        /// What the user typed
        input: String,
        /// Highest valid index
        max: usize,
    },

    /// Value passed on the command line does not match any known item
    #[error("{what} {value:?} not found")]
    UnknownChoice {
        /// What kind of item was requested
        what: &'static str,
        /// Requested value
        value: String,
    },

    /// Value passed on the command line matches several distinct items
    #[error("{what} {value:?} matches {count} certificates; pass its SHA-1 hash instead")]
    AmbiguousChoice {
        /// What kind of item was requested
        what: &'static str,
        /// Requested value
        value: String,
        /// Number of distinct matches
        count: usize,
    },
}

impl SimforgeError {
    /// Hint printed under the error message, when one applies.
    pub fn hint(&self) -> Option<&'static str> {
        use crate::deploy::Error;

        let deploy_error = match self {
            SimforgeError::Deploy(e) => e,
            SimforgeError::Pipeline(e) => &e.source,
            _ => return None,
        };

        match deploy_error {
            Error::UnsupportedPackage { .. } => {
                Some("Encrypted App Store packages cannot run in the simulator.")
            }
            Error::DeviceNotFound { .. } => {
                Some("Run again without --device to pick from the available simulators.")
            }
            Error::DeviceNotReady { .. } => Some("Try a longer --boot-timeout."),
            Error::LaunchFailure { .. } => {
                Some("Make sure the Xcode command line tools are installed (xcode-select --install).")
            }
            _ => None,
        }
    }
}
