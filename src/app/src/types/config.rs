use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use serde_valid::Validate;
use std::fmt;

/// Number of sensor slots on the device. The slot index is the sensor identity.
pub const MAX_SENSORS: usize = 4;

/// Default bus address of a BME280 breakout.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x76;

/// Multiplexer channel value meaning "sensor sits directly on the bus".
pub const NO_MULTIPLEXER: i8 = -1;

/// Hardware driver selected for a sensor slot.
///
/// The discriminants are the codes the firmware stores and expects on the wire.
#[derive(Debug, Clone, Copy, Default, Serialize_repr, Deserialize_repr, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SensorType {
    #[default]
    Disabled = 0,
    Bme280 = 2,
    Dht11 = 11,
    Dht22 = 22,
}

impl SensorType {
    pub const ALL: [SensorType; 4] = [Self::Disabled, Self::Dht11, Self::Dht22, Self::Bme280];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Disabled => "Disabled",
            Self::Bme280 => "BME280 (I2C)",
            Self::Dht11 => "DHT11",
            Self::Dht22 => "DHT22",
        }
    }

    pub fn is_enabled(self) -> bool {
        self != Self::Disabled
    }

    /// Whether the slot is addressed over I2C (address and multiplexer channel apply).
    pub fn uses_i2c(self) -> bool {
        self == Self::Bme280
    }

    /// Resolve a driver name as some firmware revisions report it.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "" | "NONE" | "DISABLED" => Some(Self::Disabled),
            "BME280" => Some(Self::Bme280),
            "DHT11" => Some(Self::Dht11),
            "DHT22" => Some(Self::Dht22),
            _ => None,
        }
    }
}

impl TryFrom<i32> for SensorType {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Disabled),
            2 => Ok(Self::Bme280),
            11 => Ok(Self::Dht11),
            22 => Ok(Self::Dht22),
            other => Err(other),
        }
    }
}

/// One hardware sensor slot.
///
/// Fields that do not apply to the selected type are still carried, because the
/// device keeps them for when the slot is switched back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SensorConfig {
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub pin: i32,
    #[validate(maximum = 127)]
    pub i2c_address: u8,
    #[validate(maximum = 7)]
    pub i2c_multiplexer_channel: i8,
    pub temp_offset: f64,
    pub hum_offset: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sensor_type: SensorType::Disabled,
            pin: 0,
            i2c_address: DEFAULT_I2C_ADDRESS,
            i2c_multiplexer_channel: NO_MULTIPLEXER,
            temp_offset: 0.0,
            hum_offset: 0.0,
        }
    }
}

impl SensorConfig {
    /// Multiplexer channel, if the sensor sits behind one.
    pub fn multiplexer_channel(&self) -> Option<u8> {
        u8::try_from(self.i2c_multiplexer_channel).ok()
    }
}

/// Structured configuration snapshot edited by the operator.
///
/// Scalars the device did not report stay `None` and are left out of the
/// submission. `admin_password` is write-only and never filled from the device.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    pub ssid: Option<String>,
    pub password: Option<String>,
    pub api_endpoint: Option<String>,
    pub sensor_id: Option<String>,
    pub api_key: Option<String>,
    pub admin_user: Option<String>,
    pub admin_password: Option<String>,
    pub mqtt_enabled: Option<bool>,
    pub mqtt_broker: Option<String>,
    pub mqtt_port: Option<u16>,
    pub mqtt_user: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_topic_prefix: Option<String>,
    pub ntp_server: Option<String>,
    pub utc_offset: Option<i32>,
    pub firmware_url: Option<String>,
    pub testing_mode: Option<bool>,
    pub sensors: [SensorConfig; MAX_SENSORS],
}

/// Sensor type as reported by `GET /api/config`; integer codes or their string form.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SensorTypeCode {
    Code(i32),
    Text(String),
}

impl SensorTypeCode {
    fn resolve(&self) -> Option<SensorType> {
        match self {
            Self::Code(code) => SensorType::try_from(*code).ok(),
            Self::Text(text) => match text.trim().parse::<i32>() {
                Ok(code) => SensorType::try_from(code).ok(),
                Err(_) => SensorType::from_name(text),
            },
        }
    }
}

impl fmt::Display for SensorTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code}"),
            Self::Text(text) => write!(f, "{text:?}"),
        }
    }
}

/// Sensor record as the device reports it. Older firmware only sends `type` and `pin`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensorPayload {
    #[serde(rename = "type", default)]
    pub sensor_type: Option<SensorTypeCode>,
    #[serde(default)]
    pub pin: Option<i32>,
    #[serde(default)]
    pub i2c_address: Option<u8>,
    #[serde(default)]
    pub i2c_multiplexer_channel: Option<i8>,
    #[serde(default)]
    pub temp_offset: Option<f64>,
    #[serde(default)]
    pub hum_offset: Option<f64>,
}

/// Body of `GET /api/config`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfigPayload {
    pub ssid: Option<String>,
    pub password: Option<String>,
    pub api_endpoint: Option<String>,
    pub sensor_id: Option<String>,
    pub api_key: Option<String>,
    pub admin_user: Option<String>,
    pub mqtt_enabled: Option<bool>,
    pub mqtt_broker: Option<String>,
    pub mqtt_port: Option<u16>,
    pub mqtt_user: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_topic_prefix: Option<String>,
    pub ntp_server: Option<String>,
    pub utc_offset: Option<i32>,
    pub firmware_url: Option<String>,
    pub testing_mode: Option<bool>,
    #[serde(default)]
    pub sensors: Option<Vec<SensorPayload>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigDecodeError {
    UnknownSensorType { slot: usize, code: String },
}

impl fmt::Display for ConfigDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSensorType { slot, code } => {
                write!(f, "sensor slot {slot} has unknown type {code}")
            }
        }
    }
}

impl std::error::Error for ConfigDecodeError {}

impl SensorPayload {
    fn into_sensor(self, slot: usize) -> Result<SensorConfig, ConfigDecodeError> {
        let defaults = SensorConfig::default();
        let sensor_type = match &self.sensor_type {
            None => SensorType::Disabled,
            Some(code) => code
                .resolve()
                .ok_or_else(|| ConfigDecodeError::UnknownSensorType {
                    slot,
                    code: code.to_string(),
                })?,
        };

        Ok(SensorConfig {
            sensor_type,
            pin: self.pin.unwrap_or(defaults.pin),
            i2c_address: self.i2c_address.unwrap_or(defaults.i2c_address),
            i2c_multiplexer_channel: self
                .i2c_multiplexer_channel
                .unwrap_or(defaults.i2c_multiplexer_channel),
            temp_offset: self.temp_offset.unwrap_or(defaults.temp_offset),
            hum_offset: self.hum_offset.unwrap_or(defaults.hum_offset),
        })
    }
}

impl TryFrom<DeviceConfigPayload> for DeviceConfig {
    type Error = ConfigDecodeError;

    /// Builds the editable snapshot. Missing `sensors` yields four disabled
    /// default slots; a short list is padded and extra entries are dropped.
    fn try_from(payload: DeviceConfigPayload) -> Result<Self, Self::Error> {
        let mut sensors = [SensorConfig::default(); MAX_SENSORS];

        if let Some(received) = payload.sensors {
            if received.len() > MAX_SENSORS {
                log::warn!(
                    "device reported {} sensor slots, keeping the first {MAX_SENSORS}",
                    received.len()
                );
            }
            for (slot, (target, raw)) in sensors.iter_mut().zip(received).enumerate() {
                *target = raw.into_sensor(slot)?;
            }
        }

        Ok(Self {
            ssid: payload.ssid,
            password: payload.password,
            api_endpoint: payload.api_endpoint,
            sensor_id: payload.sensor_id,
            api_key: payload.api_key,
            admin_user: payload.admin_user,
            admin_password: None,
            mqtt_enabled: payload.mqtt_enabled,
            mqtt_broker: payload.mqtt_broker,
            mqtt_port: payload.mqtt_port,
            mqtt_user: payload.mqtt_user,
            mqtt_password: payload.mqtt_password,
            mqtt_topic_prefix: payload.mqtt_topic_prefix,
            ntp_server: payload.ntp_server,
            utc_offset: payload.utc_offset,
            firmware_url: payload.firmware_url,
            testing_mode: payload.testing_mode,
            sensors,
        })
    }
}

impl DeviceConfig {
    /// Decode a `GET /api/config` body into an editable snapshot.
    pub fn from_device_json(body: &[u8]) -> Result<Self, String> {
        let payload: DeviceConfigPayload =
            serde_json::from_slice(body).map_err(|e| format!("JSON parse error: {e}"))?;
        Self::try_from(payload).map_err(|e| e.to_string())
    }
}
