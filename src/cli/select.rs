//! Signing identity and simulator selection.

use super::OutputManager;
use super::prompt::select_from;
use crate::config::{PreferenceStore, Preferences};
use crate::deploy::{
    CommandRunner, IdentityMatch, SigningIdentity, find_identity, list_identities,
    simulator::{Device, SimulatorController},
};
use crate::error::{CliError, Result};
use std::io::{BufRead, Write};

/// Picks the signing identity named by `query`, or asks.
pub async fn choose_identity<R, Rd, W>(
    runner: &R,
    query: Option<&str>,
    input: &mut Rd,
    output: &mut W,
) -> Result<SigningIdentity>
where
    R: CommandRunner,
    Rd: BufRead,
    W: Write,
{
    let identities = list_identities(runner).await?;
    if identities.is_empty() {
        return Err(CliError::NothingToSelect {
            what: "signing identities",
        }
        .into());
    }

    if let Some(query) = query {
        return match find_identity(&identities, query) {
            IdentityMatch::Found(identity) => Ok(identity),
            IdentityMatch::NotFound => Err(CliError::UnknownChoice {
                what: "Signing identity",
                value: query.to_string(),
            }
            .into()),
            IdentityMatch::Ambiguous(found) => Err(CliError::AmbiguousChoice {
                what: "Signing identity",
                value: query.to_string(),
                count: found.len(),
            }
            .into()),
        };
    }

    let identity = select_from(
        "Available signing identities:",
        &identities,
        |identity| identity.name.clone(),
        input,
        output,
    )?;
    Ok(identity.clone())
}

/// How the target simulator was requested on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceRequest<'a> {
    pub udid: Option<&'a str>,
    pub remember: bool,
}

/// Picks the target simulator.
///
/// An explicit UDID wins, then the saved preference if that simulator still
/// exists, then an interactive choice which is saved for next time. Failing
/// to save the choice is reported through `status` and does not stop the run.
pub async fn choose_device<R, Rd, W>(
    controller: &SimulatorController<'_, R>,
    request: DeviceRequest<'_>,
    preferences: &Preferences,
    store: &PreferenceStore,
    input: &mut Rd,
    output: &mut W,
    status: &OutputManager,
) -> Result<Device>
where
    R: CommandRunner,
    Rd: BufRead,
    W: Write,
{
    let devices = controller.list_devices().await?;
    if devices.is_empty() {
        return Err(CliError::NothingToSelect { what: "simulators" }.into());
    }

    if let Some(udid) = request.udid {
        let device = devices
            .into_iter()
            .find(|device| device.udid == udid)
            .ok_or_else(|| CliError::UnknownChoice {
                what: "Simulator",
                value: udid.to_string(),
            })?;
        if request.remember {
            remember(store, &device, status);
        }
        return Ok(device);
    }

    if let Some(device) = preferences.saved_device(&devices) {
        let _ = status.progress(&format!("Using saved simulator: {}", device.name));
        return Ok(device.clone());
    }

    let device = select_from(
        "Available simulators:",
        &devices,
        |device| device.name.clone(),
        input,
        output,
    )?
    .clone();
    remember(store, &device, status);
    Ok(device)
}

fn remember(store: &PreferenceStore, device: &Device, status: &OutputManager) {
    if let Err(e) = store.remember_device(&device.udid) {
        let _ = status.warn(&format!(
            "Could not save simulator preference to {}: {}",
            store.path().display(),
            e
        ));
    }
}
