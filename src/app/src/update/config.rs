use crux_core::{render::render, Command};

use crate::events::{ConfigEvent, Event};
use crate::gateway::Gateway;
use crate::model::Model;
use crate::types::{ConfigSession, FieldError};
use crate::Effect;

pub const SAVE_SUCCEEDED: &str = "Configuration saved! Device is restarting...";
pub const SAVE_FAILED: &str = "Failed to save configuration.";
pub const LOAD_FAILED: &str = "Failed to load configuration.";

/// Handle the provisioning session (load, edit, save)
pub fn handle(event: ConfigEvent, model: &mut Model) -> Command<Effect, Event> {
    match event {
        ConfigEvent::Load => {
            model.start_loading();
            Command::all([
                render(),
                Gateway::for_model(model).fetch_current_config(|config| {
                    Event::Config(ConfigEvent::LoadResponse(config))
                }),
            ])
        }

        ConfigEvent::LoadResponse(config) => {
            match config {
                Some(config) => {
                    model.stop_loading();
                    model.config_session = Some(ConfigSession::load(config));
                }
                None => model.set_error(LOAD_FAILED.to_string()),
            }
            render()
        }

        ConfigEvent::UpdateField { key, value } => {
            edit(model, |session| session.update_field(&key, &value))
        }

        ConfigEvent::UpdateSensorField { slot, key, value } => edit(model, |session| {
            session.update_sensor_field(slot as usize, &key, &value)
        }),

        ConfigEvent::Save => {
            let Some(session) = model.config_session.as_mut() else {
                return model.set_error_and_render("No configuration loaded".to_string());
            };
            let Some(submission) = session.begin_save() else {
                log::debug!("save already in progress");
                return Command::done();
            };
            model.error_message = None;
            model.success_message = None;
            Command::all([
                render(),
                Gateway::for_model(model).save_config(&submission, |saved| {
                    Event::Config(ConfigEvent::SaveResponse(saved))
                }),
            ])
        }

        ConfigEvent::SaveResponse(saved) => {
            let Some(session) = model.config_session.as_mut() else {
                log::debug!("save finished after the session was discarded");
                return Command::done();
            };
            let persisted = session.finish_save(saved);
            match persisted {
                Some(persisted) => {
                    model.adopt_saved_credentials(&persisted);
                    model.success_message = Some(SAVE_SUCCEEDED.to_string());
                }
                None => model.set_error(SAVE_FAILED.to_string()),
            }
            render()
        }

        ConfigEvent::Discard => {
            model.config_session = None;
            render()
        }
    }
}

/// Apply an edit to the loaded session. Rejections are kept as field errors.
fn edit<F>(model: &mut Model, apply: F) -> Command<Effect, Event>
where
    F: FnOnce(&mut ConfigSession) -> Result<(), FieldError>,
{
    let Some(session) = model.config_session.as_mut() else {
        log::warn!("ignoring edit without a loaded configuration");
        return Command::done();
    };
    if let Err(e) = apply(session) {
        log::debug!("edit rejected: {e}");
    }
    render()
}
