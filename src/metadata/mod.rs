/// Photo metadata module
///
/// This module handles:
/// - The typed per-photo recipe record (record.rs)
/// - Reading and tagging recipes through exiftool (exiftool.rs)

pub mod exiftool;
pub mod record;

pub use exiftool::{ExifTool, MetadataSource, RecipeTagger};
pub use record::{
    CameraIdentity, CropRect, FilterColor, MetadataRecord, RggbLevels, ToneCurves,
    WhiteBalanceMode, WhiteBalancePreset,
};
