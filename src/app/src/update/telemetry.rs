use crux_core::{render::render, Command};

use crate::events::{Event, TelemetryEvent};
use crate::gateway::Gateway;
use crate::model::Model;
use crate::update_field;
use crate::Effect;

/// Handle the monitoring loop
///
/// Shell sends `Tick` events based on watching `telemetry.phase` and `telemetry.interval_ms`.
pub fn handle(event: TelemetryEvent, model: &mut Model) -> Command<Effect, Event> {
    match event {
        TelemetryEvent::Start => {
            let Some(generation) = model.telemetry.start() else {
                log::debug!("monitoring already running");
                return Command::done();
            };
            let gateway = Gateway::for_model(model);
            Command::all([
                render(),
                gateway.fetch_system_info(move |info| {
                    Event::Telemetry(TelemetryEvent::SystemInfoResponse { generation, info })
                }),
                poll(model, generation),
            ])
        }

        TelemetryEvent::Tick { generation } => {
            if !model.telemetry.is_current(generation) {
                return Command::done();
            }
            poll(model, generation)
        }

        TelemetryEvent::DataResponse {
            generation,
            sequence,
            snapshot,
        } => {
            if model.telemetry.accept(generation, sequence, snapshot) {
                render()
            } else {
                Command::done()
            }
        }

        TelemetryEvent::SystemInfoResponse { generation, info } => {
            match info {
                Some(info) if model.telemetry.is_current(generation) => {
                    update_field!(model.system_info, Some(info))
                }
                _ => Command::done(),
            }
        }

        TelemetryEvent::Stop => {
            if model.telemetry.stop() {
                render()
            } else {
                Command::done()
            }
        }
    }
}

fn poll(model: &mut Model, generation: u32) -> Command<Effect, Event> {
    let sequence = model.telemetry.next_request();
    Gateway::for_model(model).fetch_current_data(move |snapshot| {
        Event::Telemetry(TelemetryEvent::DataResponse {
            generation,
            sequence,
            snapshot,
        })
    })
}
