//! Field descriptors for the configuration form.
//!
//! One table drives form binding, flattening into `application/x-www-form-urlencoded`
//! pairs, and decoding a flat submission back into a [`DeviceConfig`] the way the
//! device does. Adding a field means adding one row here.

use serde_valid::Validate;
use std::collections::BTreeMap;
use std::fmt;

use super::config::{DeviceConfig, SensorConfig, SensorType, MAX_SENSORS, NO_MULTIPLEXER};

/// Flat key/value pairs as submitted to `POST /api/config`.
pub type FlatSubmission = BTreeMap<String, String>;

/// How a field's text form is read and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Text,
    /// `"on"`/`"off"`; decoding also accepts `true`/`false` and `1`/`0`.
    Flag,
    Integer,
    /// Decimal or `0x`-prefixed hex in, decimal out.
    Address,
    Float,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Integer(i64),
    Float(f64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    UnknownField(String),
    UnknownSlot(usize),
    NotANumber(String),
    NotAFlag(String),
    OutOfRange(String),
    UnknownSensorType(i64),
    NotEditable {
        field: &'static str,
        sensor_type: SensorType,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField(key) => write!(f, "Unknown field: {key}"),
            Self::UnknownSlot(slot) => write!(f, "Sensor slot {slot} does not exist"),
            Self::NotANumber(raw) => write!(f, "Not a valid number: {raw:?}"),
            Self::NotAFlag(raw) => write!(f, "Not a valid on/off value: {raw:?}"),
            Self::OutOfRange(detail) => write!(f, "Value out of range: {detail}"),
            Self::UnknownSensorType(code) => write!(f, "Unknown sensor type: {code}"),
            Self::NotEditable { field, sensor_type } => {
                write!(f, "{field} does not apply to {}", sensor_type.label())
            }
        }
    }
}

impl std::error::Error for FieldError {}

impl Codec {
    pub fn decode(self, raw: &str) -> Result<FieldValue, FieldError> {
        let trimmed = raw.trim();
        match self {
            Self::Text => Ok(FieldValue::Text(raw.to_string())),
            Self::Flag => match trimmed.to_ascii_lowercase().as_str() {
                "on" | "true" | "1" => Ok(FieldValue::Flag(true)),
                "off" | "false" | "0" | "" => Ok(FieldValue::Flag(false)),
                _ => Err(FieldError::NotAFlag(raw.to_string())),
            },
            Self::Integer => trimmed
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| FieldError::NotANumber(raw.to_string())),
            Self::Address => {
                let parsed = match trimmed
                    .strip_prefix("0x")
                    .or_else(|| trimmed.strip_prefix("0X"))
                {
                    Some(hex) => i64::from_str_radix(hex, 16),
                    None => trimmed.parse::<i64>(),
                };
                parsed
                    .map(FieldValue::Integer)
                    .map_err(|_| FieldError::NotANumber(raw.to_string()))
            }
            Self::Float => match trimmed.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(FieldValue::Float(value)),
                _ => Err(FieldError::NotANumber(raw.to_string())),
            },
        }
    }

    pub fn encode(self, value: &FieldValue) -> String {
        value.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Flag(true) => f.write_str("on"),
            Self::Flag(false) => f.write_str("off"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<SensorType> for FieldValue {
    fn from(value: SensorType) -> Self {
        Self::Integer(i64::from(value.code()))
    }
}

impl TryFrom<FieldValue> for String {
    type Error = FieldError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Text(text) => Ok(text),
            other => Ok(other.to_string()),
        }
    }
}

impl TryFrom<FieldValue> for bool {
    type Error = FieldError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Flag(flag) => Ok(flag),
            other => Err(FieldError::NotAFlag(other.to_string())),
        }
    }
}

impl TryFrom<FieldValue> for f64 {
    type Error = FieldError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Float(x) => Ok(x),
            FieldValue::Integer(n) => Ok(n as f64),
            other => Err(FieldError::NotANumber(other.to_string())),
        }
    }
}

impl TryFrom<FieldValue> for SensorType {
    type Error = FieldError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Integer(n) => i32::try_from(n)
                .ok()
                .and_then(|code| SensorType::try_from(code).ok())
                .ok_or(FieldError::UnknownSensorType(n)),
            other => Err(FieldError::NotANumber(other.to_string())),
        }
    }
}

macro_rules! integer_field_value {
    ($($ty:ty),+ $(,)?) => {$(
        impl From<$ty> for FieldValue {
            fn from(value: $ty) -> Self {
                Self::Integer(i64::from(value))
            }
        }

        impl TryFrom<FieldValue> for $ty {
            type Error = FieldError;

            fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
                match value {
                    FieldValue::Integer(n) => {
                        <$ty>::try_from(n).map_err(|_| FieldError::OutOfRange(n.to_string()))
                    }
                    other => Err(FieldError::NotANumber(other.to_string())),
                }
            }
        }
    )+};
}

integer_field_value!(u8, i8, u16, i32);

/// A top-level configuration scalar. Its form key is also its wire key.
pub struct ScalarField {
    pub key: &'static str,
    pub codec: Codec,
    read: fn(&DeviceConfig) -> Option<FieldValue>,
    write: fn(&mut DeviceConfig, FieldValue) -> Result<(), FieldError>,
}

impl ScalarField {
    pub fn read(&self, config: &DeviceConfig) -> Option<FieldValue> {
        (self.read)(config)
    }

    pub fn decode_into(&self, config: &mut DeviceConfig, raw: &str) -> Result<(), FieldError> {
        let value = self.codec.decode(raw)?;
        (self.write)(config, value)
    }
}

/// A per-slot sensor field. On the wire it is `{wire_prefix}{slot}`.
pub struct SensorField {
    pub key: &'static str,
    pub wire_prefix: &'static str,
    pub codec: Codec,
    applies_to: fn(SensorType) -> bool,
    read: fn(&SensorConfig) -> FieldValue,
    write: fn(&mut SensorConfig, FieldValue) -> Result<(), FieldError>,
}

impl SensorField {
    pub fn wire_key(&self, slot: usize) -> String {
        format!("{}{slot}", self.wire_prefix)
    }

    /// Whether the operator may edit this field for a slot of the given type.
    pub fn is_editable(&self, sensor_type: SensorType) -> bool {
        (self.applies_to)(sensor_type)
    }

    pub fn read(&self, sensor: &SensorConfig) -> FieldValue {
        (self.read)(sensor)
    }

    pub fn decode_into(&self, sensor: &mut SensorConfig, raw: &str) -> Result<(), FieldError> {
        let value = self.codec.decode(raw)?;
        (self.write)(sensor, value)
    }
}

macro_rules! scalar {
    ($key:literal, $field:ident, $codec:ident) => {
        ScalarField {
            key: $key,
            codec: Codec::$codec,
            read: |config| config.$field.clone().map(FieldValue::from),
            write: |config, value| {
                config.$field = Some(value.try_into()?);
                Ok(())
            },
        }
    };
}

macro_rules! sensor {
    ($key:literal, $prefix:literal, $field:ident, $codec:ident, $applies:expr) => {
        SensorField {
            key: $key,
            wire_prefix: $prefix,
            codec: Codec::$codec,
            applies_to: $applies,
            read: |sensor| FieldValue::from(sensor.$field),
            write: |sensor, value| {
                sensor.$field = value.try_into()?;
                Ok(())
            },
        }
    };
}

pub static SCALAR_FIELDS: &[ScalarField] = &[
    scalar!("ssid", ssid, Text),
    scalar!("password", password, Text),
    scalar!("apiEndpoint", api_endpoint, Text),
    scalar!("sensorId", sensor_id, Text),
    scalar!("apiKey", api_key, Text),
    scalar!("adminUser", admin_user, Text),
    scalar!("adminPassword", admin_password, Text),
    scalar!("testingMode", testing_mode, Flag),
    scalar!("mqttEnabled", mqtt_enabled, Flag),
    scalar!("mqttBroker", mqtt_broker, Text),
    scalar!("mqttPort", mqtt_port, Integer),
    scalar!("mqttUser", mqtt_user, Text),
    scalar!("mqttPassword", mqtt_password, Text),
    scalar!("mqttTopicPrefix", mqtt_topic_prefix, Text),
    scalar!("ntpServer", ntp_server, Text),
    scalar!("utcOffset", utc_offset, Integer),
    scalar!("firmwareUrl", firmware_url, Text),
];

pub static SENSOR_FIELDS: &[SensorField] = &[
    sensor!("type", "sensorType", sensor_type, Integer, |_| true),
    sensor!("pin", "sensorPin", pin, Integer, SensorType::is_enabled),
    sensor!("i2cAddress", "sensorI2C", i2c_address, Address, SensorType::uses_i2c),
    sensor!(
        "i2cMultiplexerChannel",
        "sensorMux",
        i2c_multiplexer_channel,
        Integer,
        SensorType::uses_i2c
    ),
    sensor!("tempOffset", "sensorTOff", temp_offset, Float, SensorType::is_enabled),
    sensor!("humOffset", "sensorHOff", hum_offset, Float, SensorType::is_enabled),
];

pub fn scalar_field(key: &str) -> Option<&'static ScalarField> {
    SCALAR_FIELDS.iter().find(|field| field.key == key)
}

pub fn sensor_field(key: &str) -> Option<&'static SensorField> {
    SENSOR_FIELDS.iter().find(|field| field.key == key)
}

/// A flat submission key resolved against the descriptor tables.
pub enum WireKey {
    Scalar(&'static ScalarField),
    Sensor {
        slot: usize,
        field: &'static SensorField,
    },
}

pub fn resolve_wire_key(key: &str) -> Option<WireKey> {
    if let Some(field) = scalar_field(key) {
        return Some(WireKey::Scalar(field));
    }

    SENSOR_FIELDS.iter().find_map(|field| {
        let digits = key.strip_prefix(field.wire_prefix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let slot = digits.parse::<usize>().ok().filter(|slot| *slot < MAX_SENSORS)?;
        Some(WireKey::Sensor { slot, field })
    })
}

/// Flatten a snapshot into the pairs the device expects.
///
/// Unset scalars are left out, except flags which are sent as `"off"`.
/// Every sensor field of every slot is always present.
pub fn flatten(config: &DeviceConfig) -> FlatSubmission {
    let mut submission = FlatSubmission::new();

    for field in SCALAR_FIELDS {
        let value = match field.read(config) {
            Some(value) => value,
            None if field.codec == Codec::Flag => FieldValue::Flag(false),
            None => continue,
        };
        submission.insert(field.key.to_string(), field.codec.encode(&value));
    }

    for (slot, sensor) in config.sensors.iter().enumerate() {
        for field in SENSOR_FIELDS {
            submission.insert(field.wire_key(slot), field.codec.encode(&field.read(sensor)));
        }
    }

    submission
}

/// Decode a flat submission the way the device applies it.
///
/// Absent flags are off. Unknown keys are skipped. No editability checks apply.
pub fn parse_submission(submission: &FlatSubmission) -> Result<DeviceConfig, FieldError> {
    let mut config = DeviceConfig::default();
    for field in SCALAR_FIELDS.iter().filter(|f| f.codec == Codec::Flag) {
        field.decode_into(&mut config, "off")?;
    }

    for (key, raw) in submission {
        match resolve_wire_key(key) {
            Some(WireKey::Scalar(field)) => field.decode_into(&mut config, raw)?,
            Some(WireKey::Sensor { slot, field }) => {
                field.decode_into(&mut config.sensors[slot], raw)?
            }
            None => log::debug!("ignoring unknown submission key {key}"),
        }
    }

    Ok(config)
}

/// Return a copy of `config` with the scalar `key` set from its text form.
pub fn apply_scalar(config: &DeviceConfig, key: &str, raw: &str) -> Result<DeviceConfig, FieldError> {
    let field = scalar_field(key).ok_or_else(|| FieldError::UnknownField(key.to_string()))?;
    let mut next = config.clone();
    field.decode_into(&mut next, raw)?;
    Ok(next)
}

/// Return a copy of `config` with one sensor field of `slot` set from its text form.
///
/// Rejects fields that do not apply to the slot's current type and values
/// outside the bus ranges.
pub fn apply_sensor(
    config: &DeviceConfig,
    slot: usize,
    key: &str,
    raw: &str,
) -> Result<DeviceConfig, FieldError> {
    let field = sensor_field(key).ok_or_else(|| FieldError::UnknownField(key.to_string()))?;
    let current = config
        .sensors
        .get(slot)
        .ok_or(FieldError::UnknownSlot(slot))?;

    if !field.is_editable(current.sensor_type) {
        return Err(FieldError::NotEditable {
            field: field.key,
            sensor_type: current.sensor_type,
        });
    }

    let mut sensor = *current;
    field.decode_into(&mut sensor, raw)?;
    sensor
        .validate()
        .map_err(|e| FieldError::OutOfRange(e.to_string()))?;
    if sensor.i2c_multiplexer_channel < NO_MULTIPLEXER {
        return Err(FieldError::OutOfRange(
            sensor.i2c_multiplexer_channel.to_string(),
        ));
    }

    let mut next = config.clone();
    next.sensors[slot] = sensor;
    Ok(next)
}

/// Apply a flat wire key such as `mqttPort` or `sensorPin2`.
pub fn apply_wire(config: &DeviceConfig, key: &str, raw: &str) -> Result<DeviceConfig, FieldError> {
    match resolve_wire_key(key) {
        Some(WireKey::Scalar(field)) => apply_scalar(config, field.key, raw),
        Some(WireKey::Sensor { slot, field }) => apply_sensor(config, slot, field.key, raw),
        None => Err(FieldError::UnknownField(key.to_string())),
    }
}
