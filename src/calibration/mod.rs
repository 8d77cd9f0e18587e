/// White balance calibration module
///
/// This module handles:
/// - Per-camera reference tables and nearest-temperature lookup (reference.rs)
/// - Reading and writing tables as JSON files (store.rs)
/// - Sampling a camera body to build a new table (builder.rs)
/// - The session cache and camera substitution (registry.rs)
/// - Resolving a photo's white balance to Kelvin (white_balance.rs)

pub mod builder;
pub mod reference;
pub mod registry;
pub mod store;
pub mod white_balance;

pub use builder::{AutoConfirm, Confirmation, ReferenceBuilder};
pub use reference::{CalibrationEntry, CalibrationReference, CameraId};
pub use registry::{
    Acquisition, AlwaysBuild, CalibrationRegistry, CameraChooser, NoProvider, ReferenceProvider,
    ReferenceResolution,
};
pub use store::{CalibrationStore, KnownCamera};
pub use white_balance::{resolve_kelvin, WhiteBalance};
