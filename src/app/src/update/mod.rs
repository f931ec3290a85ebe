mod config;
mod device;
mod discovery;
mod telemetry;
mod ui;

use crux_core::{render::render, Command};

use crate::events::Event;
use crate::model::Model;
use crate::Effect;

/// Main update dispatcher - routes events to domain-specific handlers
pub fn update(event: Event, model: &mut Model) -> Command<Effect, Event> {
    match event {
        Event::Initialize { api_base } => {
            if let Some(api_base) = api_base {
                log::info!("using API base {api_base}");
                model.api_base = api_base;
            }
            render()
        }
        Event::Config(event) => config::handle(event, model),
        Event::Discovery(event) => discovery::handle(event, model),
        Event::Telemetry(event) => telemetry::handle(event, model),
        Event::Device(event) => device::handle(event, model),
        Event::Ui(event) => ui::handle(event, model),
    }
}
