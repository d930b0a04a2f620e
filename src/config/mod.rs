//! Persisted user preferences.
//!
//! A small JSON file in the working directory remembering the last simulator
//! the user picked:
//!
//! ```json
//! { "simulatorUDID": "1234-ABCD" }
//! ```

use crate::cli::OutputManager;
use crate::deploy::simulator::Device;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default preference file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".simforge_config";

/// Saved user choices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// UDID of the preferred simulator
    #[serde(
        rename = "simulatorUDID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub simulator_udid: Option<String>,
}

impl Preferences {
    /// The saved simulator, if it is still among `devices`.
    pub fn saved_device<'a>(&self, devices: &'a [Device]) -> Option<&'a Device> {
        let udid = self.simulator_udid.as_deref()?;
        let device = devices.iter().find(|d| d.udid == udid);
        if device.is_none() {
            log::debug!("Saved simulator {} is no longer available", udid);
        }
        device
    }
}

/// Reads and writes [`Preferences`] at a fixed path.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads preferences. Never fails: preferences are optional.
    ///
    /// A missing file is created with empty preferences. A file that cannot be
    /// read, parsed or created is reported through `output` and treated as
    /// empty; it is replaced on the next successful save.
    pub fn load(&self, output: &OutputManager) -> Preferences {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("Creating preference file {}", self.path.display());
                let preferences = Preferences::default();
                if let Err(e) = self.save(&preferences) {
                    let _ = output.warn(&format!(
                        "Could not create preference file {}: {}",
                        self.path.display(),
                        e
                    ));
                }
                return preferences;
            }
            Err(e) => {
                let _ = output.warn(&format!(
                    "Could not read preference file {}: {}",
                    self.path.display(),
                    e
                ));
                return Preferences::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(preferences) => preferences,
            Err(e) => {
                let _ = output.warn(&format!(
                    "Ignoring unreadable preference file {}: {}",
                    self.path.display(),
                    e
                ));
                Preferences::default()
            }
        }
    }

    pub fn save(&self, preferences: &Preferences) -> Result<()> {
        let json = serde_json::to_string_pretty(preferences)?;
        std::fs::write(&self.path, json)?;
        log::debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }

    /// Records `udid` as the preferred simulator.
    pub fn remember_device(&self, udid: &str) -> Result<()> {
        self.save(&Preferences {
            simulator_udid: Some(udid.to_string()),
        })
    }
}
