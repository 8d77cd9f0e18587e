/// Conversion settings
///
/// Holds the temperature sweep used when sampling a camera, the translation
/// constants for adjustments that have no exact counterpart in the target
/// format, and where calibration data lives on disk.
///
/// Values can be loaded from a JSON file; any missing key keeps its default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};

/// Raw formats carrying DPP3 recipes
pub const DEFAULT_RAW_EXTENSIONS: [&str; 3] = ["CRW", "CR2", "CR3"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    // ========== Calibration Sweep ==========
    /// Lowest sampled color temperature (Kelvin)
    pub temp_min: u32,

    /// Highest sampled color temperature (Kelvin)
    pub temp_max: u32,

    /// Distance between two samples (Kelvin)
    pub temp_step: u32,

    // ========== Translation Constants ==========
    /// DPP highlight range is -5..+5, XMP is -100..+100.
    /// Set to 0 to disable the translation.
    pub highlight_multiplier: i32,

    /// Same as `highlight_multiplier`, for shadows
    pub shadow_multiplier: i32,

    /// DPP has no filter amount for monochrome filters, so a fixed
    /// XMP gray mixer strength (-100..+100) stands in for it
    pub mono_filter_strength: i32,

    // ========== Locations ==========
    /// Directory holding one `<CameraId>.json` table per camera body
    pub calibration_dir: PathBuf,

    /// Working directory for sampled reference photos
    pub reference_dir: PathBuf,

    /// exiftool executable
    pub exiftool: PathBuf,

    /// File extensions treated as raw photos (case-insensitive)
    pub raw_extensions: Vec<String>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        let data_dir = Self::data_dir();
        Self {
            temp_min: 2500,
            temp_max: 10000,
            temp_step: 50,
            highlight_multiplier: 20,
            shadow_multiplier: 20,
            mono_filter_strength: 50,
            calibration_dir: data_dir.join("cameras"),
            reference_dir: data_dir.join("reference"),
            exiftool: PathBuf::from("exiftool"),
            raw_extensions: DEFAULT_RAW_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl ConvertConfig {
    /// Load configuration overrides from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Reject sweeps that would never terminate or never sample
    pub fn validate(&self) -> Result<()> {
        if self.temp_step == 0 {
            return Err(ConvertError::InvalidParameter {
                parameter: "temp_step".to_string(),
                value: "0".to_string(),
            });
        }
        if self.temp_min > self.temp_max {
            return Err(ConvertError::InvalidParameter {
                parameter: "temp_min".to_string(),
                value: format!("{} (greater than temp_max {})", self.temp_min, self.temp_max),
            });
        }
        Ok(())
    }

    /// Every temperature sampled during a reference build, ascending
    pub fn temperatures(&self) -> impl Iterator<Item = u32> {
        (self.temp_min..=self.temp_max).step_by(self.temp_step.max(1) as usize)
    }

    /// Number of samples in one sweep
    pub fn temperature_count(&self) -> usize {
        self.temperatures().count()
    }

    /// Check whether a path has one of the configured raw extensions
    pub fn is_raw_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_uppercase())
            .map(|ext| self.raw_extensions.iter().any(|raw| raw.eq_ignore_ascii_case(&ext)))
            .unwrap_or(false)
    }

    /// Get the directory application data is stored under:
    /// - Linux: ~/.local/share/recipe-xmp
    /// - macOS: ~/Library/Application Support/recipe-xmp
    /// - Windows: %APPDATA%\recipe-xmp
    fn data_dir() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("recipe-xmp");
        path
    }
}
