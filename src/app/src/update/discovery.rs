use crux_core::{render::render, Command};

use crate::events::{DiscoveryEvent, Event};
use crate::gateway::Gateway;
use crate::model::Model;
use crate::Effect;

/// Handle Wi-Fi and I2C scans
///
/// A new scan may be started while one is in flight; only the latest result is applied.
pub fn handle(event: DiscoveryEvent, model: &mut Model) -> Command<Effect, Event> {
    match event {
        DiscoveryEvent::ScanWifi => {
            let request = model.wifi_scan.begin();
            Command::all([
                render(),
                Gateway::for_model(model).scan_wifi(move |networks| {
                    Event::Discovery(DiscoveryEvent::WifiScanResponse { request, networks })
                }),
            ])
        }

        DiscoveryEvent::WifiScanResponse { request, networks } => {
            if model.wifi_scan.complete(request, networks) {
                render()
            } else {
                Command::done()
            }
        }

        DiscoveryEvent::ScanI2c => {
            let request = model.i2c_scan.begin();
            Command::all([
                render(),
                Gateway::for_model(model).scan_i2c(move |addresses| {
                    Event::Discovery(DiscoveryEvent::I2cScanResponse { request, addresses })
                }),
            ])
        }

        DiscoveryEvent::I2cScanResponse { request, addresses } => {
            if model.i2c_scan.complete(request, addresses) {
                render()
            } else {
                Command::done()
            }
        }
    }
}
