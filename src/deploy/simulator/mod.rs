//! iOS Simulator control via `xcrun simctl`.
//!
//! - `inventory` - `simctl list devices -j` parsing and state mapping
//! - `controller` - [`SimulatorController`]: state queries, boot, install, launch

mod controller;
mod inventory;

pub use controller::{BootOutcome, BootPolicy, SimulatorController};
pub use inventory::{Device, DeviceState, Inventory, runtime_display_name};
