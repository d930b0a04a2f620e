//! `simctl list devices -j` parsing.

use serde::Deserialize;
use std::collections::BTreeMap;

const RUNTIME_PREFIX: &str = "com.apple.CoreSimulator.SimRuntime.";

/// Top-level `simctl list devices -j` document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Inventory {
    /// Device records keyed by runtime identifier
    #[serde(default)]
    pub devices: BTreeMap<String, Vec<DeviceRecord>>,
}

/// One simulator as reported by simctl.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRecord {
    pub name: String,
    pub udid: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(rename = "isAvailable", default)]
    pub is_available: Option<bool>,
}

/// Observed state of a simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Stopped,
    Booting,
    Running,
    NotFound,
}

impl DeviceState {
    fn from_simctl(state: Option<&str>) -> Self {
        match state {
            Some("Booted") => DeviceState::Running,
            Some("Booting") => DeviceState::Booting,
            _ => DeviceState::Stopped,
        }
    }
}

/// Simulator offered for selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// `"<name> (<runtime>)"`, e.g. `iPhone 15 (iOS 17.2)`
    pub name: String,
    pub udid: String,
    pub state: DeviceState,
}

impl Inventory {
    pub fn parse(json: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(json)
    }

    /// State of `udid` across every runtime.
    pub fn state_of(&self, udid: &str) -> DeviceState {
        self.devices
            .values()
            .flatten()
            .find(|record| record.udid == udid)
            .map(|record| DeviceState::from_simctl(record.state.as_deref()))
            .unwrap_or(DeviceState::NotFound)
    }

    /// Available devices under iOS runtimes.
    pub fn ios_devices(&self) -> Vec<Device> {
        self.devices
            .iter()
            .filter(|(runtime, _)| runtime.contains("iOS"))
            .flat_map(|(runtime, records)| {
                let runtime = runtime_display_name(runtime);
                records
                    .iter()
                    .filter(|record| record.is_available == Some(true))
                    .map(move |record| Device {
                        name: format!("{} ({})", record.name, runtime),
                        udid: record.udid.clone(),
                        state: DeviceState::from_simctl(record.state.as_deref()),
                    })
            })
            .collect()
    }
}

/// `com.apple.CoreSimulator.SimRuntime.iOS-17-2` → `iOS 17.2`.
///
/// Keys that don't follow the CoreSimulator convention are returned unchanged.
pub fn runtime_display_name(runtime: &str) -> String {
    let Some(short) = runtime.strip_prefix(RUNTIME_PREFIX) else {
        return runtime.to_string();
    };
    match short.split_once('-') {
        Some((platform, version)) => format!("{} {}", platform, version.replace('-', ".")),
        None => short.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
  "devices" : {
    "com.apple.CoreSimulator.SimRuntime.watchOS-10-2" : [
      { "state" : "Shutdown", "isAvailable" : true, "name" : "Apple Watch Series 9 (45mm)", "udid" : "WATCH-1" }
    ],
    "com.apple.CoreSimulator.SimRuntime.iOS-17-2" : [
      { "state" : "Booted", "isAvailable" : true, "name" : "iPhone 15", "udid" : "1234-ABCD" },
      { "state" : "Shutdown", "isAvailable" : true, "name" : "iPad Air", "udid" : "5678-EFGH" },
      { "state" : "Shutdown", "isAvailable" : false, "availabilityError" : "runtime profile not found", "name" : "iPhone X", "udid" : "DEAD-BEEF" }
    ],
    "com.apple.CoreSimulator.SimRuntime.iOS-16-4" : [
      { "state" : "Booting", "isAvailable" : true, "name" : "iPhone 14", "udid" : "9999-0000" }
    ]
  }
}"#;

    #[test]
    fn maps_simctl_states() {
        let inventory = Inventory::parse(LISTING.as_bytes()).unwrap();

        assert_eq!(inventory.state_of("1234-ABCD"), DeviceState::Running);
        assert_eq!(inventory.state_of("5678-EFGH"), DeviceState::Stopped);
        assert_eq!(inventory.state_of("9999-0000"), DeviceState::Booting);
        assert_eq!(inventory.state_of("WATCH-1"), DeviceState::Stopped);
        assert_eq!(inventory.state_of("NOPE"), DeviceState::NotFound);
    }

    #[test]
    fn lists_available_ios_devices_only() {
        let inventory = Inventory::parse(LISTING.as_bytes()).unwrap();
        let devices = inventory.ios_devices();

        let names: Vec<&str> = devices.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            ["iPhone 14 (iOS 16.4)", "iPhone 15 (iOS 17.2)", "iPad Air (iOS 17.2)"]
        );
        assert_eq!(devices[1].udid, "1234-ABCD");
        assert_eq!(devices[1].state, DeviceState::Running);
    }

    #[test]
    fn runtime_names() {
        assert_eq!(
            runtime_display_name("com.apple.CoreSimulator.SimRuntime.iOS-17-2"),
            "iOS 17.2"
        );
        assert_eq!(
            runtime_display_name("com.apple.CoreSimulator.SimRuntime.xrOS-1-0"),
            "xrOS 1.0"
        );
        assert_eq!(runtime_display_name("iOS 12.4"), "iOS 12.4");
    }

    #[test]
    fn tolerates_missing_fields() {
        let inventory =
            Inventory::parse(br#"{"devices": {"iOS": [{"name": "A", "udid": "1"}]}}"#).unwrap();
        assert_eq!(inventory.state_of("1"), DeviceState::Stopped);
        assert!(inventory.ios_devices().is_empty());

        let empty = Inventory::parse(b"{}").unwrap();
        assert_eq!(empty.state_of("1"), DeviceState::NotFound);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Inventory::parse(b"xcrun: error: unable to find utility").is_err());
    }
}
