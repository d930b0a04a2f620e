//! Deploy iOS apps to the Simulator.
//!
//! This library provides the deployment pipeline behind the `simforge` binary:
//! - package resolution (`.app` bundles and decrypted `.ipa` archives)
//! - conversion and framework-first code signing
//! - simulator boot, install and launch through `xcrun simctl`
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod config;
pub mod deploy;
pub mod error;
pub mod source;

// Re-export commonly used types
pub use error::{CliError, Result, SimforgeError};
