use super::*;
use crux_core::Request;
use crux_http::protocol::{HttpRequest, HttpResponse, HttpResult};

fn dispatch(event: Event, model: &mut Model) -> Command<Effect, Event> {
    update::update(event, model)
}

fn http_requests(cmd: &mut Command<Effect, Event>) -> Vec<Request<HttpRequest>> {
    cmd.effects()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn single_request(cmd: &mut Command<Effect, Event>) -> Request<HttpRequest> {
    let mut requests = http_requests(cmd);
    assert_eq!(requests.len(), 1, "expected exactly one HTTP request");
    requests.remove(0)
}

fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Resolve a request and feed the resulting event back through `update`.
fn respond(
    cmd: &mut Command<Effect, Event>,
    mut request: Request<HttpRequest>,
    response: HttpResponse,
    model: &mut Model,
) -> Event {
    request
        .resolve(HttpResult::Ok(response))
        .expect("request should resolve");
    let event = cmd.events().next().expect("response event");
    let _ = dispatch(event.clone(), model);
    event
}

fn json(body: &str) -> HttpResponse {
    HttpResponse::ok().body(body.as_bytes().to_vec()).build()
}

mod provisioning {
    use super::*;

    const CONFIG_JSON: &str = r#"{
        "ssid":"greenhouse","password":"pw","apiEndpoint":"https://ingest.example",
        "sensorId":"gh-1","apiKey":"k","adminUser":"admin",
        "mqttEnabled":true,"mqttBroker":"broker","mqttPort":1883,
        "sensors":[{"type":22,"pin":4},{"type":2,"pin":21,"i2cAddress":119,"i2cMultiplexerChannel":3}]
    }"#;

    fn loaded() -> Model {
        let mut model = Model::default();
        let mut cmd = dispatch(Event::Config(ConfigEvent::Load), &mut model);
        let request = single_request(&mut cmd);
        respond(&mut cmd, request, json(CONFIG_JSON), &mut model);
        model
    }

    #[test]
    fn load_requests_config_endpoint() {
        let mut model = Model::default();
        let mut cmd = dispatch(Event::Config(ConfigEvent::Load), &mut model);

        let request = single_request(&mut cmd);

        assert_eq!(request.operation.method, "GET");
        assert_eq!(request.operation.url, "https://relative/api/config");
    }

    #[test]
    fn load_builds_four_slot_session() {
        let model = loaded();
        let session = model.config_session.expect("session");

        assert_eq!(session.config.sensors[0].sensor_type, SensorType::Dht22);
        assert_eq!(session.config.sensors[1].i2c_address, 0x77);
        assert_eq!(session.config.sensors[1].i2c_multiplexer_channel, 3);
        assert_eq!(session.config.sensors[2], SensorConfig::default());
        assert_eq!(session.config.mqtt_port, Some(1883));
        assert!(!model.is_loading);
    }

    #[test]
    fn load_failure_yields_no_session() {
        let mut model = Model::default();
        let mut cmd = dispatch(Event::Config(ConfigEvent::Load), &mut model);
        let request = single_request(&mut cmd);

        let event = respond(
            &mut cmd,
            request,
            HttpResponse::status(500).build(),
            &mut model,
        );

        assert_eq!(event, Event::Config(ConfigEvent::LoadResponse(None)));
        assert!(model.config_session.is_none());
        assert!(model.error_message.is_some());
    }

    #[test]
    fn load_with_unknown_sensor_type_yields_no_session() {
        let mut model = Model::default();
        let mut cmd = dispatch(Event::Config(ConfigEvent::Load), &mut model);
        let request = single_request(&mut cmd);

        respond(
            &mut cmd,
            request,
            json(r#"{"sensors":[{"type":99}]}"#),
            &mut model,
        );

        assert!(model.config_session.is_none());
    }

    #[test]
    fn save_posts_flattened_form_with_basic_auth() {
        let mut model = loaded();
        model.credentials = Some(AdminCredentials::new("admin", "admin"));
        let _ = dispatch(
            Event::Config(ConfigEvent::UpdateField {
                key: "mqttEnabled".to_string(),
                value: "off".to_string(),
            }),
            &mut model,
        );

        let mut cmd = dispatch(Event::Config(ConfigEvent::Save), &mut model);
        let request = single_request(&mut cmd);
        let body = String::from_utf8(request.operation.body.clone()).expect("utf-8 body");

        assert_eq!(request.operation.method, "POST");
        assert_eq!(request.operation.url, "https://relative/api/config");
        assert_eq!(
            header(&request.operation, "Authorization"),
            Some("Basic YWRtaW46YWRtaW4=")
        );
        for pair in [
            "ssid=greenhouse",
            "mqttEnabled=off",
            "sensorType0=22",
            "sensorPin0=4",
            "sensorType1=2",
            "sensorI2C1=119",
            "sensorMux1=3",
            "sensorType3=0",
            "sensorMux3=-1",
        ] {
            assert!(
                body.split('&').any(|p| p == pair),
                "missing {pair} in {body}"
            );
        }
        assert!(!body.contains("adminPassword"));
    }

    #[test]
    fn editing_one_slot_submits_all_slots() {
        let mut model = Model::default();
        let mut cmd = dispatch(Event::Config(ConfigEvent::Load), &mut model);
        let request = single_request(&mut cmd);
        respond(
            &mut cmd,
            request,
            json(
                r#"{"mqttEnabled":false,"sensors":[{"type":0,"pin":0},{"type":0,"pin":0},
                    {"type":2,"pin":21,"i2cAddress":119,"i2cMultiplexerChannel":3},{"type":0,"pin":0}]}"#,
            ),
            &mut model,
        );
        for (key, value) in [("type", "22"), ("pin", "4")] {
            let _ = dispatch(
                Event::Config(ConfigEvent::UpdateSensorField {
                    slot: 0,
                    key: key.to_string(),
                    value: value.to_string(),
                }),
                &mut model,
            );
        }

        let mut cmd = dispatch(Event::Config(ConfigEvent::Save), &mut model);
        let request = single_request(&mut cmd);
        let body = String::from_utf8(request.operation.body.clone()).expect("utf-8 body");
        let pairs: Vec<_> = body.split('&').collect();

        for pair in [
            "sensorType0=22",
            "sensorPin0=4",
            "sensorType2=2",
            "sensorI2C2=119",
            "sensorMux2=3",
            "mqttEnabled=off",
        ] {
            assert!(pairs.contains(&pair), "missing {pair} in {body}");
        }
    }

    #[test]
    fn save_success_reports_restart() {
        let mut model = loaded();
        let mut cmd = dispatch(Event::Config(ConfigEvent::Save), &mut model);
        let request = single_request(&mut cmd);

        let event = respond(&mut cmd, request, HttpResponse::ok().build(), &mut model);

        assert_eq!(event, Event::Config(ConfigEvent::SaveResponse(true)));
        assert_eq!(
            model.success_message.as_deref(),
            Some("Configuration saved! Device is restarting...")
        );
    }

    #[test]
    fn save_rejected_by_device_keeps_edits() {
        let mut model = loaded();
        let _ = dispatch(
            Event::Config(ConfigEvent::UpdateField {
                key: "ssid".to_string(),
                value: "office".to_string(),
            }),
            &mut model,
        );
        let mut cmd = dispatch(Event::Config(ConfigEvent::Save), &mut model);
        let request = single_request(&mut cmd);

        let event = respond(
            &mut cmd,
            request,
            HttpResponse::status(401).build(),
            &mut model,
        );

        assert_eq!(event, Event::Config(ConfigEvent::SaveResponse(false)));
        assert_eq!(
            model.error_message.as_deref(),
            Some("Failed to save configuration.")
        );
        let session = model.config_session.expect("session");
        assert_eq!(session.config.ssid.as_deref(), Some("office"));
        assert_eq!(session.state, ProvisioningState::Editing);
    }
}

mod monitoring {
    use super::*;

    const DATA_JSON: &str = r#"{"sensors":[
        {"type":"DHT22","pin":4,"valid":true,"readings":[
            {"type":"temperature","value":21.37,"unit":"°C"},
            {"type":"humidity","value":null,"unit":"%"}]},
        {"type":"BME280","pin":21,"valid":false,"error":"Sensor not found"}
    ]}"#;

    #[test]
    fn start_fetches_system_info_and_first_poll() {
        let mut model = Model::default();
        let mut cmd = dispatch(Event::Telemetry(TelemetryEvent::Start), &mut model);

        let mut urls: Vec<_> = http_requests(&mut cmd)
            .into_iter()
            .map(|r| r.operation.url.clone())
            .collect();
        urls.sort();

        assert_eq!(
            urls,
            ["https://relative/api/data", "https://relative/api/system"]
        );
    }

    #[test]
    fn tick_polls_data_and_renders_readings() {
        let mut model = Model::default();
        let _ = dispatch(Event::Telemetry(TelemetryEvent::Start), &mut model);
        let generation = model.telemetry.generation;

        let mut cmd = dispatch(
            Event::Telemetry(TelemetryEvent::Tick { generation }),
            &mut model,
        );
        let request = single_request(&mut cmd);
        respond(&mut cmd, request, json(DATA_JSON), &mut model);

        let sensors = &model.telemetry.snapshot.as_ref().expect("snapshot").sensors;
        assert_eq!(sensors[0].status_label(), "ONLINE");
        assert_eq!(sensors[0].readings[0].formatted_value(), "21.4");
        assert_eq!(sensors[0].readings[1].formatted_value(), "--");
        assert_eq!(sensors[1].visible_error(), Some("Sensor not found"));
    }

    #[test]
    fn failed_tick_keeps_previous_snapshot() {
        let mut model = Model::default();
        let _ = dispatch(Event::Telemetry(TelemetryEvent::Start), &mut model);
        let generation = model.telemetry.generation;

        let mut cmd = dispatch(
            Event::Telemetry(TelemetryEvent::Tick { generation }),
            &mut model,
        );
        let request = single_request(&mut cmd);
        respond(&mut cmd, request, json(DATA_JSON), &mut model);
        let before = model.telemetry.snapshot.clone();

        let mut cmd = dispatch(
            Event::Telemetry(TelemetryEvent::Tick { generation }),
            &mut model,
        );
        let request = single_request(&mut cmd);
        respond(&mut cmd, request, json("not json"), &mut model);

        assert_eq!(model.telemetry.snapshot, before);
        assert_eq!(model.telemetry.failed_polls, 1);
    }

    #[test]
    fn tick_after_stop_sends_nothing() {
        let mut model = Model::default();
        let _ = dispatch(Event::Telemetry(TelemetryEvent::Start), &mut model);
        let generation = model.telemetry.generation;
        let _ = dispatch(Event::Telemetry(TelemetryEvent::Stop), &mut model);

        let mut cmd = dispatch(
            Event::Telemetry(TelemetryEvent::Tick { generation }),
            &mut model,
        );

        assert!(http_requests(&mut cmd).is_empty());
    }
}

mod discovery {
    use super::*;

    #[test]
    fn wifi_scan_dedupes_and_sorts() {
        let mut model = Model::default();
        let mut cmd = dispatch(Event::Discovery(DiscoveryEvent::ScanWifi), &mut model);
        let request = single_request(&mut cmd);
        assert_eq!(request.operation.url, "https://relative/api/wifi/scan");

        respond(
            &mut cmd,
            request,
            json(
                r#"[{"ssid":"a","rssi":-70,"secure":true},{"ssid":"b","rssi":-40},{"ssid":"a","rssi":-30}]"#,
            ),
            &mut model,
        );

        let ssids: Vec<_> = model
            .wifi_scan
            .networks
            .iter()
            .map(|n| (n.ssid.as_str(), n.rssi))
            .collect();
        assert_eq!(ssids, [("b", -40), ("a", -70)]);
        assert_eq!(model.wifi_scan.cycle.phase, ScanPhase::Idle);
    }

    #[test]
    fn i2c_scan_failure_is_distinguishable_from_empty_bus() {
        let mut model = Model::default();
        let mut cmd = dispatch(Event::Discovery(DiscoveryEvent::ScanI2c), &mut model);
        let request = single_request(&mut cmd);
        assert_eq!(request.operation.url, "https://relative/api/system/scan-i2c");

        let event = respond(
            &mut cmd,
            request,
            HttpResponse::status(503).build(),
            &mut model,
        );

        assert_eq!(
            event,
            Event::Discovery(DiscoveryEvent::I2cScanResponse {
                request: 1,
                addresses: None
            })
        );
        assert!(model.i2c_scan.cycle.last_failed);
    }

    #[test]
    fn i2c_scan_lists_addresses_with_hints() {
        let mut model = Model::default();
        let mut cmd = dispatch(Event::Discovery(DiscoveryEvent::ScanI2c), &mut model);
        let request = single_request(&mut cmd);

        respond(&mut cmd, request, json("[118,112]"), &mut model);

        let labels: Vec<_> = model
            .i2c_scan
            .devices
            .iter()
            .map(|d| (d.label.as_str(), d.hint.as_deref()))
            .collect();
        assert_eq!(
            labels,
            [("0x76", Some("BME280/BMP280")), ("0x70", Some("TCA9548A multiplexer"))]
        );
    }
}

mod device {
    use super::*;

    #[test]
    fn logs_failure_shows_placeholder_text() {
        let mut model = Model::default();
        let mut cmd = dispatch(Event::Device(DeviceEvent::FetchLogs), &mut model);
        let request = single_request(&mut cmd);
        assert_eq!(request.operation.url, "https://relative/api/logs");

        respond(
            &mut cmd,
            request,
            HttpResponse::status(404).build(),
            &mut model,
        );

        assert_eq!(model.logs.as_deref(), Some(LOGS_UNAVAILABLE));
        assert!(model.error_message.is_none());
    }

    #[test]
    fn logs_are_shown_verbatim() {
        let mut model = Model::default();
        let mut cmd = dispatch(Event::Device(DeviceEvent::FetchLogs), &mut model);
        let request = single_request(&mut cmd);

        respond(
            &mut cmd,
            request,
            HttpResponse::ok().body(b"[BOOT] ok\n[WIFI] up\n".to_vec()).build(),
            &mut model,
        );

        assert_eq!(model.logs.as_deref(), Some("[BOOT] ok\n[WIFI] up\n"));
    }
}

#[test]
fn initialize_overrides_api_base() {
    let mut model = Model::default();
    let _ = dispatch(
        Event::Initialize {
            api_base: Some("/device/api/".to_string()),
        },
        &mut model,
    );

    let mut cmd = dispatch(Event::Device(DeviceEvent::FetchSystemInfo), &mut model);
    let request = single_request(&mut cmd);

    assert_eq!(request.operation.url, "https://relative/device/api/system");
}

#[test]
fn clear_error() {
    let mut model = Model {
        error_message: Some("Some error".to_string()),
        ..Default::default()
    };

    let _ = dispatch(Event::Ui(UiEvent::ClearError), &mut model);

    assert_eq!(model.error_message, None);
}
