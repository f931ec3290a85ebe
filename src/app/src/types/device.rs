use base64::prelude::*;
use serde::{Deserialize, Serialize};

/// Body of `GET /api/system`. Only the adoption code and MAC are always sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    #[serde(default)]
    pub adoption_code: String,
    #[serde(default)]
    pub mac_address: String,
    #[serde(default)]
    pub free_heap: Option<u64>,
    /// Seconds since boot.
    #[serde(default)]
    pub uptime: Option<u64>,
    #[serde(default)]
    pub rssi: Option<i32>,
    #[serde(default)]
    pub reset_reason: Option<String>,
    #[serde(default)]
    pub sdk_version: Option<String>,
    #[serde(default)]
    pub chip_model: Option<String>,
    #[serde(default)]
    pub chip_revision: Option<u32>,
    /// `ESP.getChipId()`, only reported by ESP8266 builds.
    #[serde(default)]
    pub chip_id: Option<u32>,
}

/// State of the firmware upload
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum UploadState {
    #[default]
    Idle,
    Uploading,
    Completed,
    Failed(String),
}

/// Admin login the device's protected endpoints expect as HTTP Basic auth.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminCredentials {
    pub user: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        let encoded = BASE64_STANDARD.encode(format!("{}:{}", self.user, self.password));
        format!("Basic {encoded}")
    }
}
