//! WebAssembly FFI bindings for the Crux Core
//!
//! The web shell serializes events with bincode, passes them in here and
//! executes the returned effects (render, HTTP).

use lazy_static::lazy_static;
use wasm_bindgen::prelude::wasm_bindgen;

use crux_core::{bridge::Bridge, Core};

use crate::App;

lazy_static! {
    static ref CORE: Bridge<App> = Bridge::new(Core::new());
}

/// Initialize the WASM module and route `log` output to the browser console.
#[wasm_bindgen(start)]
pub fn init_wasm() {
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        wasm_bindgen::throw_str(&format!("Failed to initialize logger: {e}"));
    }
}

/// Process an event from JavaScript
///
/// Takes a bincode-serialized Event and returns bincode-serialized Effects.
#[wasm_bindgen]
pub fn process_event(event_bytes: &[u8]) -> Vec<u8> {
    let mut effects = Vec::new();
    if let Err(e) = CORE.update(event_bytes, &mut effects) {
        wasm_bindgen::throw_str(&format!("Failed to process event: {e:?}"));
    }
    effects
}

/// Get the current view model
///
/// Returns a bincode-serialized ViewModel.
#[wasm_bindgen]
pub fn view() -> Vec<u8> {
    let mut view = Vec::new();
    if let Err(e) = CORE.view(&mut view) {
        wasm_bindgen::throw_str(&format!("Failed to get view model: {e:?}"));
    }
    view
}

/// Handle a response to an effect
///
/// Takes an effect ID and bincode-serialized response data.
/// Returns bincode-serialized Effects that should be processed.
#[wasm_bindgen]
pub fn handle_response(id: u32, response_bytes: &[u8]) -> Vec<u8> {
    let mut effects = Vec::new();
    if let Err(e) = CORE.resolve(
        crux_core::bridge::EffectId(id),
        response_bytes,
        &mut effects,
    ) {
        wasm_bindgen::throw_str(&format!("Failed to handle response: {e:?}"));
    }
    effects
}
