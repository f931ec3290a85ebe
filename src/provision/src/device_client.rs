use crate::{
    config::AppConfig,
    http_client::{device_http_client, handle_http_response, or_sentinel},
};
use anyhow::{Context, Result};
use calid_ui_core::{
    DeviceConfig, DiscoveredNetwork, FIRMWARE_FIELD, FlatSubmission, LOGS_UNAVAILABLE,
    SensorSnapshot, SystemInfo, endpoints,
};
use log::info;
#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use reqwest::{
    Client, RequestBuilder,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use trait_variant::make;

/// Requests the provisioning workflows make against a device.
///
/// None of these fail: transport errors, non-2xx statuses and undecodable
/// bodies are logged and replaced by the value each method documents.
#[make(Send)]
#[cfg_attr(any(test, feature = "mock"), automock)]
pub trait DeviceGateway {
    /// `GET /data`; `None` on failure.
    async fn fetch_current_data(&self) -> Option<SensorSnapshot>;
    /// `GET /system`; `None` on failure.
    async fn fetch_system_info(&self) -> Option<SystemInfo>;
    /// `GET /config`; `None` on failure or when the body is not a valid configuration.
    async fn fetch_current_config(&self) -> Option<DeviceConfig>;
    /// `GET /logs`; the placeholder text on failure.
    async fn fetch_logs(&self) -> String;
    /// `POST /config` as a urlencoded form; `true` only for a 2xx answer.
    async fn save_config(&self, submission: FlatSubmission) -> bool;
    /// `POST /update` as multipart; `true` only for a 2xx answer.
    async fn upload_firmware(&self, firmware: PathBuf) -> bool;
    /// `GET /wifi/scan`; `None` on failure.
    async fn scan_wifi(&self) -> Option<Vec<DiscoveredNetwork>>;
    /// `GET /system/scan-i2c`; `None` on failure.
    async fn scan_i2c(&self) -> Option<Vec<u8>>;
}

#[derive(Clone)]
pub struct HttpDeviceGateway {
    client: Client,
    config: AppConfig,
    authorization: Option<String>,
}

impl HttpDeviceGateway {
    pub fn new(config: AppConfig) -> Result<Self> {
        let authorization = config
            .credentials()
            .map(|credentials| credentials.authorization_header());

        Ok(HttpDeviceGateway {
            client: device_http_client()?,
            config,
            authorization,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.authorization {
            Some(header) => request.header(reqwest::header::AUTHORIZATION, header),
            None => request,
        }
    }

    /// GET request to the device API
    async fn get(&self, endpoint: &str) -> Result<String> {
        let url = self.config.endpoint_url(endpoint);
        info!("GET {url}");

        let res = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .context(format!("failed to send GET request to {url}"))?;

        handle_http_response(res, &format!("GET {url}")).await
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let body = self.get(endpoint).await?;
        serde_json::from_str(&body).context(format!("failed to parse response of {endpoint}"))
    }

    /// POST request to the device API with a urlencoded form body
    async fn post_form(&self, endpoint: &str, submission: &FlatSubmission) -> Result<String> {
        let url = self.config.endpoint_url(endpoint);
        info!("POST {url} with {} fields", submission.len());

        let res = self
            .authorized(self.client.post(&url))
            .form(submission)
            .send()
            .await
            .context(format!("failed to send POST request to {url}"))?;

        handle_http_response(res, &format!("POST {url}")).await
    }

    /// POST request to the device API with the file as the firmware part
    async fn post_firmware(&self, firmware: &Path) -> Result<String> {
        let url = self.config.endpoint_url(endpoints::UPDATE);
        let bytes = tokio::fs::read(firmware)
            .await
            .context(format!("failed to read firmware image {}", firmware.display()))?;
        let file_name = firmware
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "firmware.bin".to_string());
        info!("POST {url} with {file_name} ({} bytes)", bytes.len());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")
            .context("failed to build firmware part")?;

        let res = self
            .authorized(self.client.post(&url))
            .multipart(Form::new().part(FIRMWARE_FIELD, part))
            .send()
            .await
            .context(format!("failed to send POST request to {url}"))?;

        handle_http_response(res, &format!("POST {url}")).await
    }
}

impl DeviceGateway for HttpDeviceGateway {
    async fn fetch_current_data(&self) -> Option<SensorSnapshot> {
        or_sentinel("Fetch sensor data", self.get_json(endpoints::DATA).await)
    }

    async fn fetch_system_info(&self) -> Option<SystemInfo> {
        or_sentinel("Fetch system info", self.get_json(endpoints::SYSTEM).await)
    }

    async fn fetch_current_config(&self) -> Option<DeviceConfig> {
        let config = self.get(endpoints::CONFIG).await.and_then(|body| {
            DeviceConfig::from_device_json(body.as_bytes()).map_err(anyhow::Error::msg)
        });
        or_sentinel("Fetch configuration", config)
    }

    async fn fetch_logs(&self) -> String {
        or_sentinel("Fetch logs", self.get(endpoints::LOGS).await)
            .unwrap_or_else(|| LOGS_UNAVAILABLE.to_string())
    }

    async fn save_config(&self, submission: FlatSubmission) -> bool {
        or_sentinel(
            "Save configuration",
            self.post_form(endpoints::CONFIG, &submission).await,
        )
        .is_some()
    }

    async fn upload_firmware(&self, firmware: PathBuf) -> bool {
        or_sentinel("Firmware upload", self.post_firmware(&firmware).await).is_some()
    }

    async fn scan_wifi(&self) -> Option<Vec<DiscoveredNetwork>> {
        or_sentinel("Wi-Fi scan", self.get_json(endpoints::WIFI_SCAN).await)
    }

    async fn scan_i2c(&self) -> Option<Vec<u8>> {
        or_sentinel("I2C scan", self.get_json(endpoints::I2C_SCAN).await)
    }
}
