use serde::{Deserialize, Serialize};

/// Refresh period of the monitoring view.
pub const POLL_INTERVAL_MS: u32 = 5000;

/// One measured quantity, e.g. temperature in °C.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: String,
}

impl Reading {
    /// One decimal place, or `--` when the device reported no number.
    pub fn formatted_value(&self) -> String {
        match self.value {
            Some(value) if value.is_finite() => format!("{value:.1}"),
            _ => "--".to_string(),
        }
    }
}

/// Live state of one sensor slot as reported by `GET /api/data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SensorReading {
    #[serde(rename = "type")]
    pub sensor_type: String,
    #[serde(default)]
    pub pin: i32,
    pub valid: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub readings: Vec<Reading>,
}

impl SensorReading {
    pub fn status_label(&self) -> &'static str {
        if self.valid {
            "ONLINE"
        } else {
            "OFFLINE"
        }
    }

    /// Error text, shown only for offline sensors.
    pub fn visible_error(&self) -> Option<&str> {
        if self.valid {
            return None;
        }
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    /// Readings are only meaningful while the sensor is online.
    pub fn visible_readings(&self) -> &[Reading] {
        if self.valid {
            self.readings.as_slice()
        } else {
            &[]
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SensorSnapshot {
    pub sensors: Vec<SensorReading>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TelemetryPhase {
    #[default]
    Stopped,
    /// Started, first poll not settled yet.
    Initializing,
    Polling,
}

/// Monitoring loop state.
///
/// The shell sends a tick every `interval_ms` while `phase` is not `Stopped`.
/// `generation` changes on every start and stop, so results of an earlier
/// mount are recognised and dropped. Within a generation, `sequence` orders
/// overlapping polls so a slow response never overwrites a newer one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryState {
    pub phase: TelemetryPhase,
    pub generation: u32,
    pub interval_ms: u32,
    pub snapshot: Option<SensorSnapshot>,
    pub failed_polls: u32,
    requested: u32,
    applied: u32,
}

impl Default for TelemetryState {
    fn default() -> Self {
        Self {
            phase: TelemetryPhase::Stopped,
            generation: 0,
            interval_ms: POLL_INTERVAL_MS,
            snapshot: None,
            failed_polls: 0,
            requested: 0,
            applied: 0,
        }
    }
}

impl TelemetryState {
    /// Begin a new monitoring lifecycle. Returns `None` if one is already running.
    pub fn start(&mut self) -> Option<u32> {
        if self.is_running() {
            return None;
        }
        self.generation = self.generation.wrapping_add(1);
        self.phase = TelemetryPhase::Initializing;
        self.snapshot = None;
        self.failed_polls = 0;
        self.requested = 0;
        self.applied = 0;
        Some(self.generation)
    }

    /// End the lifecycle. Idempotent; returns whether anything changed.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.phase = TelemetryPhase::Stopped;
        self.generation = self.generation.wrapping_add(1);
        true
    }

    pub fn is_running(&self) -> bool {
        self.phase != TelemetryPhase::Stopped
    }

    pub fn is_current(&self, generation: u32) -> bool {
        self.is_running() && generation == self.generation
    }

    /// Loading until the first successful poll of this lifecycle.
    pub fn is_loading(&self) -> bool {
        self.snapshot.is_none()
    }

    /// Number the next poll of the current lifecycle.
    pub fn next_request(&mut self) -> u32 {
        self.requested = self.requested.wrapping_add(1);
        self.requested
    }

    /// Apply a poll result. A failed poll (`None`) keeps the last snapshot.
    ///
    /// Returns `false` when the result was dropped as stale.
    pub fn accept(
        &mut self,
        generation: u32,
        sequence: u32,
        snapshot: Option<SensorSnapshot>,
    ) -> bool {
        if !self.is_current(generation) || sequence <= self.applied {
            log::debug!("dropping stale telemetry poll {generation}/{sequence}");
            return false;
        }
        self.phase = TelemetryPhase::Polling;
        match snapshot {
            Some(snapshot) => {
                self.applied = sequence;
                self.snapshot = Some(snapshot);
                self.failed_polls = 0;
            }
            None => self.failed_polls = self.failed_polls.saturating_add(1),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(valid: bool) -> SensorSnapshot {
        SensorSnapshot {
            sensors: vec![SensorReading {
                sensor_type: "DHT22".to_string(),
                pin: 4,
                valid,
                error: (!valid).then(|| "Read failed".to_string()),
                readings: vec![Reading {
                    kind: "temperature".to_string(),
                    value: Some(21.46),
                    unit: "°C".to_string(),
                }],
            }],
        }
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn start_is_idempotent_while_running() {
            let mut state = TelemetryState::default();

            let generation = state.start().unwrap();
            assert_eq!(state.phase, TelemetryPhase::Initializing);
            assert!(state.start().is_none());
            assert!(state.is_current(generation));
        }

        #[test]
        fn stop_is_idempotent() {
            let mut state = TelemetryState::default();
            state.start();

            assert!(state.stop());
            assert!(!state.stop());
            assert_eq!(state.phase, TelemetryPhase::Stopped);
        }

        #[test]
        fn results_after_stop_are_dropped() {
            let mut state = TelemetryState::default();
            let generation = state.start().unwrap();
            let sequence = state.next_request();
            state.stop();

            assert!(!state.accept(generation, sequence, Some(snapshot(true))));
            assert!(state.snapshot.is_none());
        }

        #[test]
        fn results_from_previous_mount_are_dropped() {
            let mut state = TelemetryState::default();
            let old = state.start().unwrap();
            let sequence = state.next_request();
            state.stop();
            let new = state.start().unwrap();

            assert_ne!(old, new);
            assert!(!state.accept(old, sequence, Some(snapshot(true))));
            assert!(state.is_loading());
        }
    }

    mod polling {
        use super::*;

        #[test]
        fn first_success_ends_loading() {
            let mut state = TelemetryState::default();
            let generation = state.start().unwrap();
            assert!(state.is_loading());

            let sequence = state.next_request();
            assert!(state.accept(generation, sequence, Some(snapshot(true))));

            assert!(!state.is_loading());
            assert_eq!(state.phase, TelemetryPhase::Polling);
        }

        #[test]
        fn failed_poll_keeps_last_snapshot() {
            let mut state = TelemetryState::default();
            let generation = state.start().unwrap();
            let first = state.next_request();
            state.accept(generation, first, Some(snapshot(true)));

            let second = state.next_request();
            assert!(state.accept(generation, second, None));

            assert_eq!(state.snapshot, Some(snapshot(true)));
            assert_eq!(state.failed_polls, 1);
        }

        #[test]
        fn failed_first_poll_stays_loading() {
            let mut state = TelemetryState::default();
            let generation = state.start().unwrap();
            let sequence = state.next_request();

            state.accept(generation, sequence, None);

            assert!(state.is_loading());
            assert_eq!(state.phase, TelemetryPhase::Polling);
        }

        #[test]
        fn slow_response_does_not_overwrite_newer_one() {
            let mut state = TelemetryState::default();
            let generation = state.start().unwrap();
            let slow = state.next_request();
            let fast = state.next_request();

            assert!(state.accept(generation, fast, Some(snapshot(false))));
            assert!(!state.accept(generation, slow, Some(snapshot(true))));

            assert_eq!(state.snapshot, Some(snapshot(false)));
        }

        #[test]
        fn snapshot_is_replaced_wholesale() {
            let mut state = TelemetryState::default();
            let generation = state.start().unwrap();
            let first = state.next_request();
            state.accept(generation, first, Some(snapshot(true)));

            let second = state.next_request();
            state.accept(generation, second, Some(SensorSnapshot::default()));

            assert_eq!(state.snapshot, Some(SensorSnapshot::default()));
        }
    }

    mod display {
        use super::*;

        #[test]
        fn values_have_one_decimal() {
            let reading = &snapshot(true).sensors[0].readings[0];
            assert_eq!(reading.formatted_value(), "21.5");
        }

        #[test]
        fn missing_value_shows_placeholder() {
            let reading: Reading =
                serde_json::from_str(r#"{"type":"humidity","value":null,"unit":"%"}"#).unwrap();
            assert_eq!(reading.formatted_value(), "--");
        }

        #[test]
        fn offline_sensor_shows_error_and_hides_readings() {
            let sensor = &snapshot(false).sensors[0];

            assert_eq!(sensor.status_label(), "OFFLINE");
            assert_eq!(sensor.visible_error(), Some("Read failed"));
            assert!(sensor.visible_readings().is_empty());
        }

        #[test]
        fn online_sensor_hides_error() {
            let mut sensor = snapshot(true).sensors[0].clone();
            sensor.error = Some("stale".to_string());

            assert_eq!(sensor.status_label(), "ONLINE");
            assert_eq!(sensor.visible_error(), None);
            assert_eq!(sensor.visible_readings().len(), 1);
        }

        #[test]
        fn device_payload_without_error_field_decodes() {
            let snapshot: SensorSnapshot = serde_json::from_str(
                r#"{"sensors":[{"type":"BME280","pin":21,"valid":true,"readings":[{"type":"pressure","value":1013.27,"unit":"hPa"}]}]}"#,
            )
            .unwrap();

            assert_eq!(snapshot.sensors[0].error, None);
            assert_eq!(snapshot.sensors[0].readings[0].formatted_value(), "1013.3");
        }

        #[test]
        fn payload_without_sensors_is_malformed() {
            assert!(serde_json::from_str::<SensorSnapshot>(r#"{"uptime":3}"#).is_err());
        }
    }
}
