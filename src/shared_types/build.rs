use anyhow::Result;
use calid_ui_core::{
    events::{ConfigEvent, DeviceEvent, DiscoveryEvent, TelemetryEvent, UiEvent},
    types::{ProvisioningState, ScanPhase, SensorType, TelemetryPhase, UploadState},
    App,
};
use crux_core::typegen::TypeGen;
use std::path::PathBuf;

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=../app");

    let mut gen = TypeGen::new();

    gen.register_app::<App>()?;

    // Explicitly register domain event enums to ensure all variants are traced
    gen.register_type::<ConfigEvent>()?;
    gen.register_type::<DiscoveryEvent>()?;
    gen.register_type::<TelemetryEvent>()?;
    gen.register_type::<DeviceEvent>()?;
    gen.register_type::<UiEvent>()?;

    // Explicitly register other enums to ensure all variants are traced
    gen.register_type::<SensorType>()?;
    gen.register_type::<ProvisioningState>()?;
    gen.register_type::<ScanPhase>()?;
    gen.register_type::<TelemetryPhase>()?;
    gen.register_type::<UploadState>()?;

    let output_root = PathBuf::from("./generated");

    gen.typescript("shared_types", output_root.join("typescript"))?;

    Ok(())
}
