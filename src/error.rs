/// Error types for recipe conversion
///
/// Per-photo conditions (no recipe, nothing to translate, unreadable metadata)
/// let a batch continue. Calibration and filesystem consistency errors abort
/// the run, since a mis-resolved color temperature is a correctness defect.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Error, Debug)]
pub enum ConvertError {
    /// The photo carries no recipe marker
    #[error("no recipe")]
    MissingRecipe,

    /// A recipe exists but none of its fields translate to an attribute
    #[error("recipe has no translatable adjustments")]
    NoEditableAdjustments,

    /// No calibration reference exists for the camera and none was chosen
    #[error("no white balance reference for camera {camera_id}")]
    UnknownCamera { camera_id: String },

    /// A sampled reference photo reports a different temperature than requested
    #[error(
        "photo {} should be set to color temperature = {expected}k, but is actually set to {actual_mode} {}k",
        .file.display(),
        .actual_kelvin.map_or_else(|| "unset".to_string(), |k| k.to_string())
    )]
    CalibrationMismatch {
        file: PathBuf,
        expected: u32,
        actual_mode: String,
        actual_kelvin: Option<u32>,
    },

    /// The batch root does not exist or is not a directory
    #[error("root folder {} not found", .0.display())]
    InvalidRoot(PathBuf),

    /// A sidecar or calibration file could not be written
    #[error("failed to write {}: {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The metadata collaborator failed or returned something unusable
    #[error("metadata error for {}: {message}", .path.display())]
    Metadata { path: PathBuf, message: String },

    /// A stored calibration table is unreadable or corrupt
    #[error("calibration store {} is unreadable: {source}", .path.display())]
    CalibrationStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Crop rectangle or image dimensions out of range
    #[error("invalid crop: {reason}")]
    InvalidCrop { reason: String },

    /// Invalid configuration value
    #[error("invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// The operator abandoned the confirmation step
    #[error("cancelled by operator")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    /// Create a metadata error with context
    pub fn metadata(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Metadata {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a write failure for the given target
    pub fn write_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailure {
            path: path.into(),
            source,
        }
    }

    /// Check if this error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConvertError::CalibrationMismatch { .. }
                | ConvertError::InvalidRoot(_)
                | ConvertError::WriteFailure { .. }
                | ConvertError::CalibrationStore { .. }
                | ConvertError::UnknownCamera { .. }
                | ConvertError::InvalidParameter { .. }
                | ConvertError::Cancelled
                | ConvertError::Io(_)
        )
    }

    /// Check if this error is a normal "nothing to do" skip
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            ConvertError::MissingRecipe | ConvertError::NoEditableAdjustments
        )
    }
}
