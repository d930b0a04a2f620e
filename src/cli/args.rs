//! Command line argument parsing and validation.

use crate::config::DEFAULT_CONFIG_FILE;
use crate::deploy::simulator::BootPolicy;
use clap::Parser;
use std::{path::PathBuf, time::Duration};

/// Default location of the conversion tool, relative to the working directory
pub const DEFAULT_CONVERTER: &str = ".build/release/simforge";

/// Deploy iOS apps to the Simulator
#[derive(Parser, Debug)]
#[command(
    name = "simforge",
    version,
    about = "Deploy .app bundles and decrypted .ipa packages to the iOS Simulator",
    long_about = "Copies or extracts the package into a scratch directory, converts it for the \
simulator, re-signs embedded frameworks and the bundle, boots the chosen simulator if needed, \
then installs and launches the app.

Usage:
  simforge ./build/Demo.app
  simforge Demo.ipa --identity \"Apple Development: Jane Doe (ABCDEF1234)\"
  simforge Demo.ipa --device 1234-ABCD --remember

Exit code 0 = the app was launched on the simulator."
)]
pub struct Args {
    /// Package to deploy (.app directory or .ipa file)
    #[arg(value_name = "PACKAGE")]
    pub package: PathBuf,

    /// Signing identity, by SHA-1 hash or exact name (prompts when omitted)
    #[arg(short, long, value_name = "ID_OR_NAME")]
    pub identity: Option<String>,

    /// Target simulator UDID (uses the saved choice or prompts when omitted)
    #[arg(short, long, value_name = "UDID")]
    pub device: Option<String>,

    /// Save --device as the preferred simulator
    #[arg(long, requires = "device")]
    pub remember: bool,

    /// Conversion tool run on the bundle before signing
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONVERTER, env = "SIMFORGE_CONVERTER")]
    pub converter: PathBuf,

    /// Preference file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Maximum time to wait for the simulator to boot, in seconds
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub boot_timeout: u64,

    /// Show every signed framework and extra detail
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.boot_timeout == 0 {
            return Err("--boot-timeout must be at least 1 second".to_string());
        }
        if let Some(device) = &self.device
            && device.trim().is_empty()
        {
            return Err("--device cannot be empty".to_string());
        }
        if let Some(identity) = &self.identity
            && identity.trim().is_empty()
        {
            return Err("--identity cannot be empty".to_string());
        }
        Ok(())
    }

    /// Boot policy honoring `--boot-timeout`.
    pub fn boot_policy(&self) -> BootPolicy {
        BootPolicy {
            timeout: Duration::from_secs(self.boot_timeout),
            ..BootPolicy::default()
        }
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }
}
