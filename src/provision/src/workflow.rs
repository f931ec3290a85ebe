//! Provisioning workflows over a [`DeviceGateway`].
//!
//! The state machines are the ones the web UI runs; this module only drives
//! them with awaited requests instead of effects.

use crate::device_client::DeviceGateway;
use anyhow::{Context, Result, bail};
use calid_ui_core::{ConfigSession, DeviceConfig, I2cScan, UploadState, WifiScan};
use log::{info, warn};
use std::path::PathBuf;

/// Split a `key=value` edit as given on the command line.
pub fn parse_edit(edit: &str) -> Result<(String, String)> {
    let Some((key, value)) = edit.split_once('=') else {
        bail!("failed to parse edit {edit:?}: expected key=value")
    };
    Ok((key.trim().to_string(), value.to_string()))
}

/// Load the device configuration into a fresh edit session.
pub async fn load_session<G: DeviceGateway>(gateway: &G) -> Result<ConfigSession> {
    let Some(config) = gateway.fetch_current_config().await else {
        bail!("failed to load configuration")
    };
    Ok(ConfigSession::load(config))
}

/// Apply wire-key edits to the device configuration and submit it.
///
/// The whole form is resubmitted, so slots and settings that were not edited
/// keep their current values. Returns the configuration the device now holds.
pub async fn provision<G: DeviceGateway>(
    gateway: &G,
    edits: &[(String, String)],
) -> Result<DeviceConfig> {
    let mut session = load_session(gateway).await?;

    for (key, value) in edits {
        session
            .update_wire_field(key, value)
            .with_context(|| format!("failed to set {key}"))?;
    }

    if !session.dirty {
        info!("configuration unchanged, submitting anyway");
    }

    let Some(submission) = session.begin_save() else {
        bail!("failed to save configuration: a save is already in progress")
    };
    let saved = gateway.save_config(submission).await;

    match session.finish_save(saved) {
        Some(config) => {
            info!("configuration saved, device is restarting");
            Ok(config)
        }
        None => bail!("failed to save configuration"),
    }
}

/// Run one Wi-Fi scan. Returns `false` when the scan failed and the list was kept.
pub async fn scan_wifi<G: DeviceGateway>(gateway: &G, scan: &mut WifiScan) -> bool {
    let request = scan.begin();
    let networks = gateway.scan_wifi().await;
    scan.complete(request, networks);
    !scan.cycle.last_failed
}

/// Run one I2C bus scan. Returns `false` when the scan failed and the list was kept.
pub async fn scan_i2c<G: DeviceGateway>(gateway: &G, scan: &mut I2cScan) -> bool {
    let request = scan.begin();
    let addresses = gateway.scan_i2c().await;
    scan.complete(request, addresses);
    !scan.cycle.last_failed
}

/// Upload a firmware image and report the final upload state.
pub async fn upload_firmware<G: DeviceGateway>(gateway: &G, firmware: PathBuf) -> UploadState {
    info!("uploading {}", firmware.display());
    if gateway.upload_firmware(firmware).await {
        UploadState::Completed
    } else {
        warn!("firmware upload was rejected");
        UploadState::Failed("Firmware upload failed".to_string())
    }
}
