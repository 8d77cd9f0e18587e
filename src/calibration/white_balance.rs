/// White balance resolution
///
/// Kelvin recipes carry their temperature directly. Named presets and
/// click-white-balance only carry RGGB multipliers, which are matched
/// against the camera's calibration table to find the closest temperature.

use std::path::Path;
use tracing::debug;

use super::registry::{CalibrationRegistry, ReferenceProvider};
use crate::error::Result;
use crate::metadata::{MetadataRecord, WhiteBalanceMode};

/// Outcome of white balance resolution for one photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhiteBalance {
    /// `crs:WhiteBalance` value
    pub label: String,
    /// Absolute temperature, when one applies
    pub kelvin: Option<u32>,
    /// Whether the recipe's white balance counts as an edit
    pub applies: bool,
}

impl WhiteBalance {
    fn auto() -> Self {
        Self {
            label: "Auto".to_string(),
            kelvin: None,
            applies: false,
        }
    }
}

/// Resolve the white balance of a photo, acquiring the camera's calibration
/// table through `registry` when a preset has to be looked up
pub fn resolve(
    record: &MetadataRecord,
    sample: &Path,
    registry: &mut CalibrationRegistry,
    provider: &dyn ReferenceProvider,
) -> Result<WhiteBalance> {
    let mode = match &record.white_balance {
        Some(mode) => mode,
        None => return Ok(WhiteBalance::auto()),
    };

    let resolved = match mode {
        WhiteBalanceMode::Kelvin => WhiteBalance {
            label: "Custom".to_string(),
            kelvin: record.kelvin,
            applies: true,
        },
        mode if mode.needs_calibration() => {
            let kelvin = match record.rggb {
                Some(levels) => registry
                    .reference_for(record, sample, provider)?
                    .nearest_kelvin(levels.rgb()),
                None => None,
            };
            let label = match mode {
                WhiteBalanceMode::Preset(preset) => preset.as_str(),
                _ => "Custom",
            };
            debug!("{:?} resolved to {:?} K", mode, kelvin);
            WhiteBalance {
                label: label.to_string(),
                kelvin,
                applies: true,
            }
        }
        WhiteBalanceMode::ShotSettings => WhiteBalance {
            label: "As Shot".to_string(),
            kelvin: None,
            applies: false,
        },
        _ => WhiteBalance::auto(),
    };

    Ok(resolved)
}

/// Absolute temperature for a photo, if its recipe implies one
pub fn resolve_kelvin(
    record: &MetadataRecord,
    sample: &Path,
    registry: &mut CalibrationRegistry,
    provider: &dyn ReferenceProvider,
) -> Result<Option<u32>> {
    Ok(resolve(record, sample, registry, provider)?.kelvin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::reference::{CalibrationEntry, CalibrationReference, CameraId};
    use crate::calibration::registry::NoProvider;
    use crate::calibration::store::CalibrationStore;
    use crate::metadata::{CameraIdentity, RggbLevels, WhiteBalancePreset};

    fn camera() -> CameraIdentity {
        CameraIdentity {
            model_id: "Canon EOS 5D".to_string(),
            owner_name: None,
            serial: "12345".to_string(),
        }
    }

    fn registry_with_table(dir: &Path) -> CalibrationRegistry {
        let mut registry = CalibrationRegistry::new(CalibrationStore::new(dir));
        registry.insert(
            CameraId::from_identity(&camera()),
            CalibrationReference::from_entries(
                camera(),
                [
                    CalibrationEntry { kelvin: 3000, rgb: [256, 130, 120] },
                    CalibrationEntry { kelvin: 5000, rgb: [256, 150, 150] },
                ],
            ),
        );
        registry
    }

    fn record(mode: WhiteBalanceMode) -> MetadataRecord {
        MetadataRecord {
            has_recipe: true,
            white_balance: Some(mode),
            kelvin: Some(4321),
            rggb: Some(RggbLevels([256, 149, 149, 148])),
            camera: camera(),
            ..MetadataRecord::default()
        }
    }

    #[test]
    fn test_kelvin_mode_skips_table() {
        let dir = tempfile::tempdir().unwrap();
        // empty registry and no provider: a table lookup would fail
        let mut registry = CalibrationRegistry::new(CalibrationStore::new(dir.path()));

        let wb = resolve(&record(WhiteBalanceMode::Kelvin), Path::new("a.CR2"), &mut registry, &NoProvider).unwrap();
        assert_eq!(wb.kelvin, Some(4321));
        assert_eq!(wb.label, "Custom");
        assert!(wb.applies);
    }

    #[test]
    fn test_preset_uses_nearest_table_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_with_table(dir.path());

        let daylight = record(WhiteBalanceMode::Preset(WhiteBalancePreset::Daylight));
        let wb = resolve(&daylight, Path::new("a.CR2"), &mut registry, &NoProvider).unwrap();
        assert_eq!(wb.kelvin, Some(5000));
        assert_eq!(wb.label, "Daylight");

        let click = record(WhiteBalanceMode::ManualClick);
        let wb = resolve(&click, Path::new("a.CR2"), &mut registry, &NoProvider).unwrap();
        assert_eq!(wb.label, "Custom");
        assert_eq!(
            resolve_kelvin(&click, Path::new("a.CR2"), &mut registry, &NoProvider).unwrap(),
            Some(5000)
        );
    }

    #[test]
    fn test_shot_settings_has_no_temperature() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_with_table(dir.path());

        let wb = resolve(&record(WhiteBalanceMode::ShotSettings), Path::new("a.CR2"), &mut registry, &NoProvider)
            .unwrap();
        assert_eq!(wb.label, "As Shot");
        assert_eq!(wb.kelvin, None);
        assert!(!wb.applies);
    }

    #[test]
    fn test_unknown_mode_is_auto() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_with_table(dir.path());

        let other = record(WhiteBalanceMode::Other("Underwater".to_string()));
        let wb = resolve(&other, Path::new("a.CR2"), &mut registry, &NoProvider).unwrap();
        assert_eq!(wb, WhiteBalance::auto());
    }

    #[test]
    fn test_uncalibrated_preset_is_unknown_camera() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = CalibrationRegistry::new(CalibrationStore::new(dir.path()));

        let shade = record(WhiteBalanceMode::Preset(WhiteBalancePreset::Shade));
        let result = resolve(&shade, Path::new("a.CR2"), &mut registry, &NoProvider);
        assert!(matches!(result, Err(crate::error::ConvertError::UnknownCamera { .. })));
    }
}
