//! Domain-based type organization
//!
//! Types are organized by domain to match the structure in `update/`:
//! - config: Device configuration snapshot and its device payload
//! - fields: Form field descriptors, flattening and decoding
//! - session: Provisioning session (edit/save lifecycle)
//! - discovery: Wi-Fi and I2C scan state
//! - telemetry: Live sensor readings and the polling loop state
//! - device: System info, credentials and firmware upload

pub mod config;
pub mod device;
pub mod discovery;
pub mod fields;
pub mod session;
pub mod telemetry;

pub use config::*;
pub use device::*;
pub use discovery::*;
pub use fields::{FieldError, FieldValue, FlatSubmission};
pub use session::*;
pub use telemetry::*;
