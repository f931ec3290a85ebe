use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScanPhase {
    #[default]
    Idle,
    Scanning,
}

/// Request bookkeeping shared by the Wi-Fi and I2C scans.
///
/// Each request gets a new number; only the response to the latest one is applied.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanCycle {
    pub phase: ScanPhase,
    pub latest_request: u32,
    pub last_failed: bool,
}

impl ScanCycle {
    pub fn begin(&mut self) -> u32 {
        self.latest_request = self.latest_request.wrapping_add(1);
        self.phase = ScanPhase::Scanning;
        self.latest_request
    }

    /// Returns `false` for a response to a superseded request.
    fn settle(&mut self, request: u32, succeeded: bool) -> bool {
        if request != self.latest_request || self.phase != ScanPhase::Scanning {
            log::debug!(
                "dropping scan response {request}, latest is {}",
                self.latest_request
            );
            return false;
        }
        self.phase = ScanPhase::Idle;
        self.last_failed = !succeeded;
        true
    }
}

/// Access point found by `GET /api/wifi/scan`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscoveredNetwork {
    pub ssid: String,
    pub rssi: i32,
    #[serde(default)]
    pub secure: bool,
}

/// Drop repeated SSIDs (first report wins) and order by signal, strongest first.
pub fn dedupe_networks(raw: Vec<DiscoveredNetwork>) -> Vec<DiscoveredNetwork> {
    let mut seen = HashSet::new();
    let mut networks: Vec<_> = raw
        .into_iter()
        .filter(|network| seen.insert(network.ssid.clone()))
        .collect();
    networks.sort_by(|a, b| b.rssi.cmp(&a.rssi));
    networks
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WifiScan {
    pub cycle: ScanCycle,
    pub networks: Vec<DiscoveredNetwork>,
}

impl WifiScan {
    pub fn begin(&mut self) -> u32 {
        self.cycle.begin()
    }

    /// Apply a scan result. `None` means the scan failed and the previous list is kept.
    pub fn complete(&mut self, request: u32, networks: Option<Vec<DiscoveredNetwork>>) -> bool {
        if !self.cycle.settle(request, networks.is_some()) {
            return false;
        }
        if let Some(raw) = networks {
            self.networks = dedupe_networks(raw);
        }
        true
    }
}

/// `0x76` style label used everywhere an address is shown.
pub fn format_i2c_address(address: u8) -> String {
    format!("0x{address:02X}")
}

/// Part commonly found at an address on these boards.
pub fn likely_i2c_device(address: u8) -> Option<&'static str> {
    match address {
        0x76 | 0x77 => Some("BME280/BMP280"),
        0x44 | 0x45 => Some("SHT31"),
        0x70 => Some("TCA9548A multiplexer"),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct I2cDevice {
    pub address: u8,
    pub label: String,
    pub hint: Option<String>,
}

impl From<u8> for I2cDevice {
    fn from(address: u8) -> Self {
        Self {
            address,
            label: format_i2c_address(address),
            hint: likely_i2c_device(address).map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct I2cScan {
    pub cycle: ScanCycle,
    pub devices: Vec<I2cDevice>,
}

impl I2cScan {
    pub fn begin(&mut self) -> u32 {
        self.cycle.begin()
    }

    /// Apply a bus scan. Addresses are shown in the order the device reported them.
    pub fn complete(&mut self, request: u32, addresses: Option<Vec<u8>>) -> bool {
        if !self.cycle.settle(request, addresses.is_some()) {
            return false;
        }
        if let Some(addresses) = addresses {
            self.devices = addresses.into_iter().map(I2cDevice::from).collect();
        }
        true
    }
}
