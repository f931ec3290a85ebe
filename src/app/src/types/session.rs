use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::config::DeviceConfig;
use super::fields::{self, FieldError, FlatSubmission};

/// Whether the operator is editing or a submission is in flight.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProvisioningState {
    #[default]
    Editing,
    Saving,
}

/// Editable configuration loaded from the device.
///
/// `baseline` is the last snapshot known to be stored on the device and drives
/// the `dirty` flag. Rejected edits leave the snapshot untouched and record a
/// message under the field's key (`ssid`, `sensors.2.pin`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSession {
    pub config: DeviceConfig,
    pub baseline: DeviceConfig,
    pub state: ProvisioningState,
    pub dirty: bool,
    pub field_errors: HashMap<String, String>,
    #[serde(skip)]
    submitted: Option<DeviceConfig>,
}

impl ConfigSession {
    pub fn load(config: DeviceConfig) -> Self {
        Self {
            baseline: config.clone(),
            config,
            state: ProvisioningState::Editing,
            dirty: false,
            field_errors: HashMap::new(),
            submitted: None,
        }
    }

    pub fn is_saving(&self) -> bool {
        self.state == ProvisioningState::Saving
    }

    pub fn update_field(&mut self, key: &str, value: &str) -> Result<(), FieldError> {
        let result = fields::apply_scalar(&self.config, key, value);
        self.commit(key.to_string(), result)
    }

    pub fn update_sensor_field(
        &mut self,
        slot: usize,
        key: &str,
        value: &str,
    ) -> Result<(), FieldError> {
        let result = fields::apply_sensor(&self.config, slot, key, value);
        self.commit(format!("sensors.{slot}.{key}"), result)
    }

    /// Edit by flat wire key, e.g. `mqttPort` or `sensorType1`.
    pub fn update_wire_field(&mut self, key: &str, value: &str) -> Result<(), FieldError> {
        let result = fields::apply_wire(&self.config, key, value);
        self.commit(key.to_string(), result)
    }

    fn commit(
        &mut self,
        error_key: String,
        result: Result<DeviceConfig, FieldError>,
    ) -> Result<(), FieldError> {
        match result {
            Ok(next) => {
                self.config = next;
                self.field_errors.remove(&error_key);
                self.dirty = self.config != self.baseline;
                Ok(())
            }
            Err(e) => {
                self.field_errors.insert(error_key, e.to_string());
                Err(e)
            }
        }
    }

    /// Freeze the current snapshot for submission.
    ///
    /// Returns `None` while a previous submission is still in flight.
    pub fn begin_save(&mut self) -> Option<FlatSubmission> {
        if self.is_saving() {
            return None;
        }
        let submission = fields::flatten(&self.config);
        self.submitted = Some(self.config.clone());
        self.state = ProvisioningState::Saving;
        Some(submission)
    }

    /// Settle the in-flight submission.
    ///
    /// On success the submitted snapshot becomes the baseline and is returned.
    /// On failure the edits stay as they are.
    pub fn finish_save(&mut self, saved: bool) -> Option<DeviceConfig> {
        if !self.is_saving() {
            return None;
        }
        self.state = ProvisioningState::Editing;
        let submitted = self.submitted.take()?;
        if !saved {
            return None;
        }
        self.baseline = submitted.clone();
        self.dirty = self.config != self.baseline;
        Some(submitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::config::SensorType;

    fn session() -> ConfigSession {
        let mut config = DeviceConfig {
            ssid: Some("home".to_string()),
            ..Default::default()
        };
        config.sensors[0].sensor_type = SensorType::Dht22;
        config.sensors[0].pin = 4;
        ConfigSession::load(config)
    }

    #[test]
    fn edits_mark_dirty_and_reverting_clears_it() {
        let mut session = session();

        session.update_field("ssid", "office").unwrap();
        assert!(session.dirty);

        session.update_field("ssid", "home").unwrap();
        assert!(!session.dirty);
    }

    #[test]
    fn rejected_edit_records_error_and_keeps_snapshot() {
        let mut session = session();
        let before = session.config.clone();

        assert!(session.update_sensor_field(0, "pin", "four").is_err());

        assert_eq!(session.config, before);
        assert!(session.field_errors.contains_key("sensors.0.pin"));
        assert!(!session.dirty);
    }

    #[test]
    fn accepted_edit_clears_previous_error() {
        let mut session = session();
        let _ = session.update_sensor_field(0, "pin", "four");

        session.update_sensor_field(0, "pin", "5").unwrap();

        assert!(session.field_errors.is_empty());
        assert_eq!(session.config.sensors[0].pin, 5);
    }

    #[test]
    fn second_save_while_saving_is_ignored() {
        let mut session = session();

        assert!(session.begin_save().is_some());
        assert!(session.begin_save().is_none());
        assert!(session.is_saving());
    }

    #[test]
    fn successful_save_moves_baseline_to_submitted_snapshot() {
        let mut session = session();
        session.update_field("ssid", "office").unwrap();
        let submission = session.begin_save().unwrap();
        assert_eq!(submission["ssid"], "office");

        // Edit made while the request is in flight stays dirty afterwards.
        session.update_field("apiKey", "k").unwrap();
        let persisted = session.finish_save(true).unwrap();

        assert_eq!(persisted.ssid.as_deref(), Some("office"));
        assert_eq!(persisted.api_key, None);
        assert_eq!(session.state, ProvisioningState::Editing);
        assert!(session.dirty);
    }

    #[test]
    fn failed_save_keeps_edits() {
        let mut session = session();
        session.update_field("ssid", "office").unwrap();
        session.begin_save();

        assert!(session.finish_save(false).is_none());

        assert_eq!(session.config.ssid.as_deref(), Some("office"));
        assert_eq!(session.baseline.ssid.as_deref(), Some("home"));
        assert!(session.dirty);
        assert_eq!(session.state, ProvisioningState::Editing);
    }

    #[test]
    fn stray_save_result_is_ignored() {
        let mut session = session();

        assert!(session.finish_save(true).is_none());
        assert_eq!(session.state, ProvisioningState::Editing);
    }

    #[test]
    fn wire_keys_edit_sensor_slots() {
        let mut session = session();

        session.update_wire_field("sensorType3", "2").unwrap();
        session.update_wire_field("sensorI2C3", "0x77").unwrap();

        assert_eq!(session.config.sensors[3].sensor_type, SensorType::Bme280);
        assert_eq!(session.config.sensors[3].i2c_address, 0x77);
    }
}
