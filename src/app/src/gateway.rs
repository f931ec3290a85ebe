//! Remote access gateway to the device HTTP API.
//!
//! Every request resolves to exactly one event. Transport errors, non-2xx
//! statuses and undecodable bodies never reach the update loop as errors:
//! they are logged and replaced by the sentinel each request documents.

use crux_core::Command;
use serde::de::DeserializeOwned;

use crate::events::Event;
use crate::http_helpers::{
    api_url, or_sentinel, process_json_response, process_status_response,
    process_string_response,
};
use crate::model::Model;
use crate::types::*;
use crate::{Effect, HttpCmd};

/// Attach the Basic auth header when credentials are configured.
macro_rules! authorized {
    ($gateway:expr, $request:expr) => {
        match &$gateway.authorization {
            Some(header) => $request.header("Authorization", header.as_str()),
            None => $request,
        }
    };
}

/// Endpoint paths relative to the API prefix.
pub mod endpoints {
    pub const DATA: &str = "/data";
    pub const SYSTEM: &str = "/system";
    pub const CONFIG: &str = "/config";
    pub const LOGS: &str = "/logs";
    pub const UPDATE: &str = "/update";
    pub const WIFI_SCAN: &str = "/wifi/scan";
    pub const I2C_SCAN: &str = "/system/scan-i2c";
}

/// Multipart field name the firmware update handler reads.
pub const FIRMWARE_FIELD: &str = "update";

/// Shown in place of the log when it could not be fetched.
pub const LOGS_UNAVAILABLE: &str = "Error fetching logs";

pub struct Gateway {
    api_base: String,
    authorization: Option<String>,
}

impl Gateway {
    pub fn new(api_base: impl Into<String>, authorization: Option<String>) -> Self {
        Self {
            api_base: api_base.into(),
            authorization,
        }
    }

    pub fn for_model(model: &Model) -> Self {
        Self::new(model.api_base.clone(), model.authorization())
    }

    pub fn url(&self, endpoint: &str) -> String {
        api_url(&self.api_base, endpoint)
    }

    /// `GET /data`. `None` on failure.
    pub fn fetch_current_data<F>(&self, to_event: F) -> Command<Effect, Event>
    where
        F: FnOnce(Option<SensorSnapshot>) -> Event + Send + 'static,
    {
        self.get_json("Fetch sensor data", endpoints::DATA, to_event)
    }

    /// `GET /system`. `None` on failure.
    pub fn fetch_system_info<F>(&self, to_event: F) -> Command<Effect, Event>
    where
        F: FnOnce(Option<SystemInfo>) -> Event + Send + 'static,
    {
        self.get_json("Fetch system info", endpoints::SYSTEM, to_event)
    }

    /// `GET /config`, decoded into an editable snapshot. `None` on failure.
    pub fn fetch_current_config<F>(&self, to_event: F) -> Command<Effect, Event>
    where
        F: FnOnce(Option<DeviceConfig>) -> Event + Send + 'static,
    {
        const ACTION: &str = "Fetch configuration";
        self.get_json(ACTION, endpoints::CONFIG, move |payload: Option<DeviceConfigPayload>| {
            let config = payload.and_then(|payload| {
                or_sentinel(
                    ACTION,
                    DeviceConfig::try_from(payload).map_err(|e| format!("{ACTION} failed: {e}")),
                )
            });
            to_event(config)
        })
    }

    /// `GET /logs`. [`LOGS_UNAVAILABLE`] on failure.
    pub fn fetch_logs<F>(&self, to_event: F) -> Command<Effect, Event>
    where
        F: FnOnce(String) -> Event + Send + 'static,
    {
        const ACTION: &str = "Fetch logs";
        authorized!(self, HttpCmd::get(self.url(endpoints::LOGS)))
            .build()
            .then_send(move |result| {
                let logs = or_sentinel(ACTION, process_string_response(ACTION, result))
                    .unwrap_or_else(|| LOGS_UNAVAILABLE.to_string());
                to_event(logs)
            })
    }

    /// `POST /config` as a urlencoded form. `false` on failure.
    pub fn save_config<F>(&self, submission: &FlatSubmission, to_event: F) -> Command<Effect, Event>
    where
        F: FnOnce(bool) -> Event + Send + 'static,
    {
        const ACTION: &str = "Save configuration";
        match authorized!(self, HttpCmd::post(self.url(endpoints::CONFIG))).body_form(submission) {
            Ok(builder) => builder.build().then_send(move |result| {
                let saved = or_sentinel(ACTION, process_status_response(ACTION, result)).is_some();
                to_event(saved)
            }),
            Err(e) => {
                log::warn!("Failed to create {ACTION} request: {e}");
                Command::event(to_event(false))
            }
        }
    }

    /// `GET /wifi/scan`. `None` on failure, so an empty result stays distinguishable.
    pub fn scan_wifi<F>(&self, to_event: F) -> Command<Effect, Event>
    where
        F: FnOnce(Option<Vec<DiscoveredNetwork>>) -> Event + Send + 'static,
    {
        self.get_json("Wi-Fi scan", endpoints::WIFI_SCAN, to_event)
    }

    /// `GET /system/scan-i2c`. `None` on failure.
    pub fn scan_i2c<F>(&self, to_event: F) -> Command<Effect, Event>
    where
        F: FnOnce(Option<Vec<u8>>) -> Event + Send + 'static,
    {
        self.get_json("I2C scan", endpoints::I2C_SCAN, to_event)
    }

    fn get_json<T, F>(
        &self,
        action: &'static str,
        endpoint: &str,
        to_event: F,
    ) -> Command<Effect, Event>
    where
        T: DeserializeOwned + 'static,
        F: FnOnce(Option<T>) -> Event + Send + 'static,
    {
        authorized!(self, HttpCmd::get(self.url(endpoint)))
            .build()
            .then_send(move |result| {
                to_event(or_sentinel(action, process_json_response(action, result)))
            })
    }
}
