use calid_ui_core::{AdminCredentials, DEFAULT_API_BASE, POLL_INTERVAL_MS};
use clap::Args;
use std::time::Duration;

/// Where the device is and how to talk to it.
///
/// Every option can also be given through its environment variable, so a
/// provisioning station can export them once.
#[derive(Clone, Debug, Args)]
pub struct AppConfig {
    /// Address of the device (its access point serves on 192.168.4.1)
    #[arg(long, env = "CALID_DEVICE_URL", default_value = "http://192.168.4.1")]
    pub device_url: String,

    /// Path prefix of the device API
    #[arg(long, env = "CALID_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Admin user for the protected endpoints
    #[arg(long, env = "CALID_ADMIN_USER", default_value = "admin")]
    pub admin_user: String,

    /// Admin password; requests are sent without credentials when unset
    #[arg(long, env = "CALID_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Telemetry poll interval in milliseconds
    #[arg(long, env = "CALID_POLL_INTERVAL_MS", default_value_t = u64::from(POLL_INTERVAL_MS))]
    pub poll_interval_ms: u64,
}

impl AppConfig {
    pub fn credentials(&self) -> Option<AdminCredentials> {
        self.admin_password
            .as_ref()
            .map(|password| AdminCredentials::new(self.admin_user.clone(), password.clone()))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Full address of an API endpoint.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}{}{endpoint}",
            self.device_url.trim_end_matches('/'),
            self.api_base.trim_end_matches('/')
        )
    }
}
