use crux_core::{render::render, Command};

use crate::events::{DeviceEvent, Event};
use crate::gateway::Gateway;
use crate::model::Model;
use crate::types::{AdminCredentials, UploadState};
use crate::update_field;
use crate::Effect;

pub const UPLOAD_SUCCEEDED: &str = "Firmware uploaded! Device is restarting...";

/// Handle device maintenance events (logs, system info, credentials, firmware)
pub fn handle(event: DeviceEvent, model: &mut Model) -> Command<Effect, Event> {
    match event {
        DeviceEvent::FetchLogs => {
            model.start_loading();
            Command::all([
                render(),
                Gateway::for_model(model)
                    .fetch_logs(|logs| Event::Device(DeviceEvent::LogsResponse(logs))),
            ])
        }

        DeviceEvent::LogsResponse(logs) => {
            model.stop_loading();
            model.logs = Some(logs);
            render()
        }

        DeviceEvent::FetchSystemInfo => Gateway::for_model(model)
            .fetch_system_info(|info| Event::Device(DeviceEvent::SystemInfoResponse(info))),

        DeviceEvent::SystemInfoResponse(info) => match info {
            Some(info) => update_field!(model.system_info, Some(info)),
            None => Command::done(),
        },

        DeviceEvent::SetCredentials { user, password } => {
            model.credentials = Some(AdminCredentials::new(user, password));
            Command::done()
        }

        DeviceEvent::ClearCredentials => {
            model.credentials = None;
            Command::done()
        }

        DeviceEvent::UploadStarted => {
            model.firmware_upload_state = UploadState::Uploading;
            model.success_message = None;
            model.clear_error();
            render()
        }

        DeviceEvent::UploadCompleted => {
            model.firmware_upload_state = UploadState::Completed;
            model.success_message = Some(UPLOAD_SUCCEEDED.to_string());
            render()
        }

        DeviceEvent::UploadFailed(error) => {
            model.firmware_upload_state = UploadState::Failed(error.clone());
            model.set_error_and_render(format!("Upload failed: {error}"))
        }
    }
}
