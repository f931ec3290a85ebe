use serde::{Deserialize, Serialize};

use crate::types::*;

/// Path prefix of the device API when the UI is served by the device itself.
pub const DEFAULT_API_BASE: &str = "/api";

/// Application Model - the complete state
/// Also serves as the ViewModel when serialized (credentials are excluded)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Model {
    /// Prefix prepended to every device endpoint
    pub api_base: String,

    /// Admin login for Basic auth; never sent to the view
    #[serde(skip)]
    pub credentials: Option<AdminCredentials>,

    // Provisioning
    pub config_session: Option<ConfigSession>,

    // Discovery
    pub wifi_scan: WifiScan,
    pub i2c_scan: I2cScan,

    // Monitoring
    pub telemetry: TelemetryState,
    pub system_info: Option<SystemInfo>,

    // Device
    pub logs: Option<String>,
    pub firmware_upload_state: UploadState,

    // UI state
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub success_message: Option<String>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            credentials: None,
            config_session: None,
            wifi_scan: WifiScan::default(),
            i2c_scan: I2cScan::default(),
            telemetry: TelemetryState::default(),
            system_info: None,
            logs: None,
            firmware_upload_state: UploadState::default(),
            is_loading: false,
            error_message: None,
            success_message: None,
        }
    }
}

impl Model {
    /// Start a loading operation (sets is_loading=true, clears error)
    pub fn start_loading(&mut self) {
        self.is_loading = true;
        self.error_message = None;
    }

    /// Stop loading and clear error
    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.error_message = None;
    }

    /// Set an error message and stop loading
    pub fn set_error(&mut self, error: String) {
        self.is_loading = false;
        self.error_message = Some(error);
    }

    /// Set an error message, stop loading, and return a render command
    pub fn set_error_and_render(
        &mut self,
        error: String,
    ) -> crux_core::Command<crate::Effect, crate::events::Event> {
        self.set_error(error);
        crux_core::render::render()
    }

    /// Clear the error message without affecting the loading state.
    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// `Authorization` header for protected endpoints, if credentials are known.
    pub fn authorization(&self) -> Option<String> {
        self.credentials
            .as_ref()
            .map(AdminCredentials::authorization_header)
    }

    /// Adopt the admin login that was just stored on the device.
    ///
    /// The firmware only replaces the password when a non-empty one was sent.
    pub fn adopt_saved_credentials(&mut self, saved: &DeviceConfig) {
        let Some(password) = saved.admin_password.as_deref().filter(|p| !p.is_empty()) else {
            return;
        };
        let user = saved
            .admin_user
            .clone()
            .or_else(|| self.credentials.as_ref().map(|c| c.user.clone()))
            .unwrap_or_default();
        log::info!("switching to updated admin credentials for {user}");
        self.credentials = Some(AdminCredentials::new(user, password));
    }
}
