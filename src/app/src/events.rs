use serde::{Deserialize, Serialize};

use crate::types::*;

/// Events that can happen in the app
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Event {
    /// Sent once by the shell. `api_base` overrides the `/api` prefix.
    Initialize { api_base: Option<String> },
    Config(ConfigEvent),
    Discovery(DiscoveryEvent),
    Telemetry(TelemetryEvent),
    Device(DeviceEvent),
    Ui(UiEvent),
}

/// Provisioning session events
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum ConfigEvent {
    Load,
    UpdateField {
        key: String,
        value: String,
    },
    UpdateSensorField {
        slot: u32,
        key: String,
        value: String,
    },
    Save,
    Discard,

    // HTTP responses (internal events, skipped from serialization)
    #[serde(skip)]
    LoadResponse(Option<DeviceConfig>),
    #[serde(skip)]
    SaveResponse(bool),
}

/// Wi-Fi and I2C scan events
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    ScanWifi,
    ScanI2c,

    #[serde(skip)]
    WifiScanResponse {
        request: u32,
        networks: Option<Vec<DiscoveredNetwork>>,
    },
    #[serde(skip)]
    I2cScanResponse {
        request: u32,
        addresses: Option<Vec<u8>>,
    },
}

/// Monitoring view events
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum TelemetryEvent {
    /// The monitoring view was mounted
    Start,
    /// Shell sends this every `interval_ms` while `telemetry.phase` is not `Stopped`
    Tick { generation: u32 },
    /// The monitoring view was torn down
    Stop,

    #[serde(skip)]
    DataResponse {
        generation: u32,
        sequence: u32,
        snapshot: Option<SensorSnapshot>,
    },
    #[serde(skip)]
    SystemInfoResponse {
        generation: u32,
        info: Option<SystemInfo>,
    },
}

/// Device maintenance events
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    FetchLogs,
    FetchSystemInfo,
    SetCredentials { user: String, password: String },
    ClearCredentials,

    // Firmware upload runs in the shell, which reports progress here
    UploadStarted,
    UploadCompleted,
    UploadFailed(String),

    #[serde(skip)]
    LogsResponse(String),
    #[serde(skip)]
    SystemInfoResponse(Option<SystemInfo>),
}

/// UI actions
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum UiEvent {
    ClearError,
    ClearSuccess,
}
