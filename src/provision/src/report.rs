//! Plain text rendering of device state for the terminal.

use calid_ui_core::{
    DeviceConfig, DiscoveredNetwork, I2cDevice, SensorSnapshot, SystemInfo, types::fields,
};
use std::fmt::Write;

/// Keys whose values are never echoed back.
const SECRET_KEYS: [&str; 4] = ["password", "apiKey", "adminPassword", "mqttPassword"];

pub fn render_snapshot(snapshot: &SensorSnapshot) -> String {
    if snapshot.sensors.is_empty() {
        return "no sensors configured\n".to_string();
    }

    let mut out = String::new();
    for sensor in &snapshot.sensors {
        let _ = write!(
            out,
            "{} (pin {}) {}",
            sensor.sensor_type,
            sensor.pin,
            sensor.status_label()
        );
        if let Some(error) = sensor.visible_error() {
            let _ = write!(out, "  {error}");
        }
        let readings: Vec<_> = sensor
            .visible_readings()
            .iter()
            .map(|r| format!("{} {} {}", r.kind, r.formatted_value(), r.unit))
            .collect();
        if !readings.is_empty() {
            let _ = write!(out, "  {}", readings.join(", "));
        }
        out.push('\n');
    }
    out
}

pub fn render_system_info(info: &SystemInfo) -> String {
    let mut out = format!(
        "Adoption code: {}\nMAC address:   {}\n",
        info.adoption_code, info.mac_address
    );
    if let Some(chip) = &info.chip_model {
        let revision = info
            .chip_revision
            .map(|r| format!(" rev {r}"))
            .unwrap_or_default();
        let _ = writeln!(out, "Chip:          {chip}{revision}");
    }
    if let Some(id) = info.chip_id {
        let _ = writeln!(out, "Chip ID:       {id}");
    }
    if let Some(sdk) = &info.sdk_version {
        let _ = writeln!(out, "SDK:           {sdk}");
    }
    if let Some(uptime) = info.uptime {
        let _ = writeln!(
            out,
            "Uptime:        {}h {:02}m {:02}s",
            uptime / 3600,
            uptime / 60 % 60,
            uptime % 60
        );
    }
    if let Some(heap) = info.free_heap {
        let _ = writeln!(out, "Free heap:     {heap} bytes");
    }
    if let Some(rssi) = info.rssi {
        let _ = writeln!(out, "Wi-Fi signal:  {rssi} dBm");
    }
    if let Some(reason) = &info.reset_reason {
        let _ = writeln!(out, "Last reset:    {reason}");
    }
    out
}

pub fn render_networks(networks: &[DiscoveredNetwork]) -> String {
    if networks.is_empty() {
        return "no networks found\n".to_string();
    }
    networks
        .iter()
        .map(|n| {
            let lock = if n.secure { "secured" } else { "open" };
            format!("{:>4} dBm  {lock:<7}  {}\n", n.rssi, n.ssid)
        })
        .collect()
}

pub fn render_i2c_devices(devices: &[I2cDevice]) -> String {
    if devices.is_empty() {
        return "no I2C devices found\n".to_string();
    }
    devices
        .iter()
        .map(|d| match &d.hint {
            Some(hint) => format!("{}  {hint}\n", d.label),
            None => format!("{}\n", d.label),
        })
        .collect()
}

/// The configuration as the `key=value` pairs `config set` accepts.
pub fn render_config(config: &DeviceConfig) -> String {
    fields::flatten(config)
        .into_iter()
        .map(|(key, value)| {
            if SECRET_KEYS.contains(&key.as_str()) && !value.is_empty() {
                format!("{key}=********\n")
            } else {
                format!("{key}={value}\n")
            }
        })
        .collect()
}
