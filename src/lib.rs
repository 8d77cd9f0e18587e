//! DPP3 recipe to XMP sidecar conversion
//!
//! Reads the non-destructive edits Canon Digital Photo Professional 3 embeds
//! in raw files and writes them as XMP sidecars that Lightroom and Camera
//! Raw understand. Named white balance presets are resolved to a Kelvin
//! temperature through per-camera calibration tables.

pub mod batch;
pub mod calibration;
pub mod config;
pub mod crop;
pub mod error;
pub mod metadata;
pub mod progress;
pub mod prompt;
pub mod translate;
pub mod xmp;

pub use batch::{BatchSummary, Converter};
pub use config::ConvertConfig;
pub use error::{ConvertError, Result};
pub use translate::{RecipeTranslator, TargetAttributeSet, Translation};
