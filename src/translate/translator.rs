/// Recipe to XMP attribute translation
///
/// Each recipe field is mapped on its own and decides whether it applies.
/// A photo produces a sidecar only when it has a recipe and at least one
/// field applied.

use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

use super::attributes::{
    format_number, format_signed, format_thousands, Attribute, CurveChannel, FieldMapping,
    GrayscaleLook, TargetAttributeSet, ToneCurve,
};
use crate::calibration::registry::{CalibrationRegistry, ReferenceProvider};
use crate::calibration::white_balance;
use crate::config::ConvertConfig;
use crate::crop;
use crate::error::{ConvertError, Result};
use crate::metadata::MetadataRecord;

/// Name of the camera profile used for monochrome picture styles
const MONOCHROME_LOOK: &str = "Adobe Monochrome";

/// Clarity added to monochrome conversions
const MONOCHROME_CLARITY: &str = "+8";

/// Translated sidecar content plus what the console reports about it
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub attributes: TargetAttributeSet,
    pub summary: Summary,
}

/// Per-photo console summary, e.g. `5,200 K / Daylight; +0.33ev`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub kelvin: Option<u32>,
    pub white_balance: String,
    /// Rendered exposure, when the recipe has one
    pub exposure: Option<String>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kelvin {
            Some(kelvin) => write!(f, "{} K", format_thousands(kelvin))?,
            None => write!(f, " (Auto)")?,
        }
        write!(f, " / {}", self.white_balance)?;
        if let Some(exposure) = self.exposure.as_deref().filter(|exp| *exp != "0") {
            write!(f, "; {}ev", exposure)?;
        }
        Ok(())
    }
}

pub struct RecipeTranslator<'a> {
    config: &'a ConvertConfig,
}

impl<'a> RecipeTranslator<'a> {
    pub fn new(config: &'a ConvertConfig) -> Self {
        Self { config }
    }

    /// Translate one photo's recipe; `None` when there is nothing to write
    pub fn translate(
        &self,
        record: &MetadataRecord,
        sample: &Path,
        registry: &mut CalibrationRegistry,
        provider: &dyn ReferenceProvider,
    ) -> Result<Option<Translation>> {
        match self.try_translate(record, sample, registry, provider) {
            Ok(translation) => Ok(Some(translation)),
            Err(e) if e.is_skip() => {
                debug!("{}: {}", sample.display(), e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Translate one photo's recipe, reporting why nothing applies as
    /// `MissingRecipe` or `NoEditableAdjustments`
    pub fn try_translate(
        &self,
        record: &MetadataRecord,
        sample: &Path,
        registry: &mut CalibrationRegistry,
        provider: &dyn ReferenceProvider,
    ) -> Result<Translation> {
        if !record.has_recipe {
            return Err(ConvertError::MissingRecipe);
        }

        let mut set = TargetAttributeSet::new();
        set.rggb_levels = record.rggb_raw.clone().unwrap_or_default();

        let wb = white_balance::resolve(record, sample, registry, provider)?;
        if wb.applies {
            set.mark_edited();
        }
        set.white_balance = wb.label.clone();

        if let Some(check) = check_mark(record) {
            set.mark_edited();
            set.keywords.push(check);
        }

        if record.tone_curve_active {
            set.mark_edited();
            set.tone_curves = tone_curves(record);
        }

        set.apply(rating(record));
        set.apply(temperature(wb.kelvin));
        let exposure = set.apply(exposure(record));
        set.apply(contrast(record));
        set.apply(scaled("crs:Highlight", record.highlight, self.config.highlight_multiplier));
        set.apply(scaled("crs:Shadow", record.shadow, self.config.shadow_multiplier));
        set.apply(saturation(record));
        set.apply(sharpness(record));

        let cropped = crop_box(record)?;
        if cropped.applies {
            set.lens_profile_enable = false;
        }
        set.apply(cropped);

        set.apply(orientation(record));

        if is_monochrome(record) {
            set.look = Some(GrayscaleLook {
                name: MONOCHROME_LOOK.to_string(),
                convert_to_grayscale: true,
            });
            set.apply(self.monochrome(record));
        }

        if !set.has_edits() {
            return Err(ConvertError::NoEditableAdjustments);
        }

        Ok(Translation {
            attributes: set,
            summary: Summary {
                kelvin: wb.kelvin,
                white_balance: wb.label,
                exposure,
            },
        })
    }

    /// Clarity boost plus a gray mixer channel for the filter color
    fn monochrome(&self, record: &MetadataRecord) -> FieldMapping {
        let mut attributes = vec![Attribute::new("crs:Clarity2012", MONOCHROME_CLARITY)];
        if let Some(filter) = record.monochrome_filter {
            attributes.push(Attribute::new(
                format!("crs:GrayMixer{}", filter.as_str()),
                format_signed(f64::from(self.config.mono_filter_strength)),
            ));
        }
        FieldMapping::many(attributes)
    }
}

fn is_monochrome(record: &MetadataRecord) -> bool {
    record.picture_style.as_deref() == Some("Monochrome")
}

fn rating(record: &MetadataRecord) -> FieldMapping {
    match record.rating {
        Some(rating) if rating != 0 => FieldMapping::single("xmp:Rating", rating.to_string()),
        _ => FieldMapping::none(),
    }
}

fn temperature(kelvin: Option<u32>) -> FieldMapping {
    match kelvin {
        Some(kelvin) => FieldMapping {
            applies: true,
            value: Some(kelvin.to_string()),
            attributes: vec![
                Attribute::new("crs:Temperature", kelvin.to_string()),
                Attribute::new("crs:Tint", "0"),
            ],
        },
        None => FieldMapping::none(),
    }
}

fn exposure(record: &MetadataRecord) -> FieldMapping {
    match record.exposure {
        Some(ev) => FieldMapping::single("crs:Exposure2012", format_signed(ev)),
        None => FieldMapping::none(),
    }
}

/// DPP -4..+4 to XMP -100..+100
fn contrast(record: &MetadataRecord) -> FieldMapping {
    match record.contrast {
        Some(value) => FieldMapping::single("crs:Contrast2012", format_signed(value / 4.0 * 100.0)),
        None => FieldMapping::none(),
    }
}

fn saturation(record: &MetadataRecord) -> FieldMapping {
    match record.saturation {
        Some(value) => FieldMapping::single("crs:Saturation", format_signed(value / 4.0 * 100.0)),
        None => FieldMapping::none(),
    }
}

/// DPP 0..10 to XMP 0..150
fn sharpness(record: &MetadataRecord) -> FieldMapping {
    match record.sharpness {
        Some(value) => FieldMapping::single("crs:Sharpness", format_number(value / 10.0 * 150.0)),
        None => FieldMapping::none(),
    }
}

/// Highlight and shadow: only non-zero values count, and a zero
/// multiplier turns the mapping off
fn scaled(name: &str, value: Option<f64>, multiplier: i32) -> FieldMapping {
    match value {
        Some(value) if value != 0.0 && multiplier != 0 => {
            FieldMapping::single(name, format_number(value * f64::from(multiplier)))
        }
        _ => FieldMapping::none(),
    }
}

fn crop_box(record: &MetadataRecord) -> Result<FieldMapping> {
    if !record.crop_active {
        return Ok(FieldMapping::none());
    }

    let rect = record.crop.as_ref().ok_or_else(|| ConvertError::InvalidCrop {
        reason: "crop is active but the rectangle is missing".to_string(),
    })?;
    let (width, height) = match (record.image_width, record.image_height) {
        (Some(width), Some(height)) => (width, height),
        _ => {
            return Err(ConvertError::InvalidCrop {
                reason: "crop is active but the image size is missing".to_string(),
            })
        }
    };

    let result = crop::transform_rect(rect, width, height)?;
    if result.right < result.left || result.bottom < result.top {
        warn!("Crop resolves to an inverted box: {:?}", result);
    }

    Ok(FieldMapping::many(vec![
        Attribute::new("crs:CropTop", format_number(result.top)),
        Attribute::new("crs:CropLeft", format_number(result.left)),
        Attribute::new("crs:CropBottom", format_number(result.bottom)),
        Attribute::new("crs:CropRight", format_number(result.right)),
        Attribute::new("crs:CropAngle", format_number(result.angle)),
        Attribute::new("crs:HasCrop", "True"),
    ]))
}

/// Rotation applied in DPP differs from the camera's orientation tag
fn orientation(record: &MetadataRecord) -> FieldMapping {
    let rotation = record.rotation.unwrap_or(0);
    let shot = record.orientation.as_deref().map_or(0, orientation_degrees);
    if rotation == shot {
        return FieldMapping::none();
    }

    match tiff_orientation(rotation) {
        Some(tiff) => FieldMapping::single("tiff:Orientation", tiff.to_string()),
        None => {
            warn!("Unsupported rotation of {} degrees ignored", rotation);
            FieldMapping::none()
        }
    }
}

/// "Horizontal (normal)" is 0, "Rotate 90 CW" is 90; anything else is 0
pub fn orientation_degrees(orientation: &str) -> i32 {
    orientation
        .strip_prefix("Rotate ")
        .and_then(|rest| rest.split_once(" CW"))
        .and_then(|(degrees, _)| degrees.parse().ok())
        .unwrap_or(0)
}

/// EXIF orientation value for a clockwise rotation
pub fn tiff_orientation(degrees: i32) -> Option<u8> {
    match degrees {
        0 => Some(1),
        90 => Some(6),
        180 => Some(3),
        270 => Some(8),
        _ => None,
    }
}

fn check_mark(record: &MetadataRecord) -> Option<String> {
    record
        .check_mark
        .as_deref()
        .filter(|check| *check != "Clear")
        .map(|check| format!("DPP3:CheckMark={}", check))
}

fn tone_curves(record: &MetadataRecord) -> Vec<ToneCurve> {
    let curves = &record.tone_curves;
    CurveChannel::ALL
        .iter()
        .filter_map(|&channel| {
            let raw = match channel {
                CurveChannel::Rgb => curves.rgb.as_deref(),
                CurveChannel::Red => curves.red.as_deref(),
                CurveChannel::Green => curves.green.as_deref(),
                CurveChannel::Blue => curves.blue.as_deref(),
            }?;
            let points = parse_curve_points(raw);
            if points.is_empty() {
                None
            } else {
                Some(ToneCurve { channel, points })
            }
        })
        .collect()
}

/// Parse `(0,0)(128,140)(255,255)`; malformed pairs are skipped
pub fn parse_curve_points(raw: &str) -> Vec<(u32, u32)> {
    fn digits(value: &str) -> Option<u32> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        value.parse().ok()
    }

    raw.split('(')
        .skip(1)
        .filter_map(|chunk| {
            let (pair, _) = chunk.split_once(')')?;
            let (x, y) = pair.split_once(',')?;
            Some((digits(x)?, digits(y)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::reference::{CalibrationEntry, CalibrationReference, CameraId};
    use crate::calibration::registry::NoProvider;
    use crate::calibration::store::CalibrationStore;
    use crate::metadata::{
        CameraIdentity, CropRect, FilterColor, RggbLevels, ToneCurves, WhiteBalanceMode,
        WhiteBalancePreset,
    };

    fn recipe() -> MetadataRecord {
        MetadataRecord {
            has_recipe: true,
            rggb_raw: Some("2048 1024 1024 1500".to_string()),
            camera: CameraIdentity {
                model_id: "Canon EOS 5D".to_string(),
                owner_name: None,
                serial: "12345".to_string(),
            },
            ..MetadataRecord::default()
        }
    }

    fn run(record: &MetadataRecord) -> Result<Option<Translation>> {
        run_with(&ConvertConfig::default(), record)
    }

    fn run_with(config: &ConvertConfig, record: &MetadataRecord) -> Result<Option<Translation>> {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = CalibrationRegistry::new(CalibrationStore::new(dir.path()));
        registry.insert(
            CameraId::from_identity(&record.camera),
            CalibrationReference::from_entries(
                record.camera.clone(),
                [
                    CalibrationEntry { kelvin: 3000, rgb: [256, 130, 120] },
                    CalibrationEntry { kelvin: 5000, rgb: [256, 150, 150] },
                ],
            ),
        );
        RecipeTranslator::new(config).translate(record, Path::new("IMG_0001.CR2"), &mut registry, &NoProvider)
    }

    #[test]
    fn test_missing_marker_is_no_output() {
        let record = MetadataRecord {
            has_recipe: false,
            contrast: Some(2.0),
            ..recipe()
        };
        assert_eq!(run(&record).unwrap(), None);
    }

    #[test]
    fn test_recipe_without_edits_is_no_output() {
        let record = MetadataRecord {
            white_balance: Some(WhiteBalanceMode::ShotSettings),
            highlight: Some(0.0),
            rating: Some(0),
            check_mark: Some("Clear".to_string()),
            ..recipe()
        };
        assert_eq!(run(&record).unwrap(), None);

        let dir = tempfile::tempdir().unwrap();
        let mut registry = CalibrationRegistry::new(CalibrationStore::new(dir.path()));
        let config = ConvertConfig::default();
        let result = RecipeTranslator::new(&config).try_translate(
            &record,
            Path::new("IMG_0001.CR2"),
            &mut registry,
            &NoProvider,
        );
        assert!(matches!(result, Err(ConvertError::NoEditableAdjustments)));
    }

    #[test]
    fn test_contrast_mapping() {
        let plus = run(&MetadataRecord { contrast: Some(2.0), ..recipe() }).unwrap().unwrap();
        assert_eq!(plus.attributes.get("crs:Contrast2012"), Some("+50"));

        let minus = run(&MetadataRecord { contrast: Some(-4.0), ..recipe() }).unwrap().unwrap();
        assert_eq!(minus.attributes.get("crs:Contrast2012"), Some("-100"));
    }

    #[test]
    fn test_highlight_mapping_uses_multiplier() {
        let record = MetadataRecord { highlight: Some(3.0), shadow: Some(-1.0), ..recipe() };
        let translation = run(&record).unwrap().unwrap();
        assert_eq!(translation.attributes.get("crs:Highlight"), Some("60"));
        assert_eq!(translation.attributes.get("crs:Shadow"), Some("-20"));

        let config = ConvertConfig {
            highlight_multiplier: 0,
            shadow_multiplier: 0,
            ..ConvertConfig::default()
        };
        assert_eq!(run_with(&config, &record).unwrap(), None);
    }

    #[test]
    fn test_sharpness_and_saturation() {
        let record = MetadataRecord {
            sharpness: Some(7.0),
            saturation: Some(-1.0),
            exposure: Some(0.33),
            ..recipe()
        };
        let translation = run(&record).unwrap().unwrap();
        assert_eq!(translation.attributes.get("crs:Sharpness"), Some("105"));
        assert_eq!(translation.attributes.get("crs:Saturation"), Some("-25"));
        assert_eq!(translation.attributes.get("crs:Exposure2012"), Some("+0.33"));
        assert_eq!(translation.summary.exposure.as_deref(), Some("+0.33"));
    }

    #[test]
    fn test_preset_resolves_temperature() {
        let record = MetadataRecord {
            white_balance: Some(WhiteBalanceMode::Preset(WhiteBalancePreset::Daylight)),
            rggb: Some(RggbLevels([256, 149, 149, 148])),
            ..recipe()
        };
        let translation = run(&record).unwrap().unwrap();
        assert_eq!(translation.attributes.white_balance, "Daylight");
        assert_eq!(translation.attributes.get("crs:Temperature"), Some("5000"));
        assert_eq!(translation.attributes.get("crs:Tint"), Some("0"));
        assert_eq!(translation.summary.to_string(), "5,000 K / Daylight");
    }

    #[test]
    fn test_summary_formatting() {
        let summary = Summary {
            kelvin: None,
            white_balance: "As Shot".to_string(),
            exposure: Some("-1".to_string()),
        };
        assert_eq!(summary.to_string(), " (Auto) / As Shot; -1ev");

        let zero = Summary {
            kelvin: Some(10000),
            white_balance: "Custom".to_string(),
            exposure: Some("0".to_string()),
        };
        assert_eq!(zero.to_string(), "10,000 K / Custom");
    }

    #[test]
    fn test_attribute_order() {
        let record = MetadataRecord {
            white_balance: Some(WhiteBalanceMode::Kelvin),
            kelvin: Some(4300),
            rating: Some(3),
            exposure: Some(1.0),
            contrast: Some(1.0),
            sharpness: Some(3.0),
            ..recipe()
        };
        let translation = run(&record).unwrap().unwrap();
        let names: Vec<&str> = translation
            .attributes
            .attributes
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "xmp:Rating",
                "crs:Temperature",
                "crs:Tint",
                "crs:Exposure2012",
                "crs:Contrast2012",
                "crs:Sharpness"
            ]
        );
    }

    #[test]
    fn test_crop_disables_lens_profile() {
        let record = MetadataRecord {
            crop_active: true,
            crop: Some(CropRect { left: 100.0, top: 50.0, width: 800.0, height: 600.0, angle: 0.0 }),
            image_width: Some(4000),
            image_height: Some(3000),
            ..recipe()
        };
        let translation = run(&record).unwrap().unwrap();
        assert!(!translation.attributes.lens_profile_enable);
        assert_eq!(translation.attributes.get("crs:CropLeft"), Some("0.025"));
        assert_eq!(translation.attributes.get("crs:CropRight"), Some("0.225"));
        assert_eq!(translation.attributes.get("crs:CropAngle"), Some("0"));
        assert_eq!(translation.attributes.get("crs:HasCrop"), Some("True"));
    }

    #[test]
    fn test_crop_without_dimensions_is_invalid() {
        let record = MetadataRecord {
            crop_active: true,
            crop: Some(CropRect { left: 0.0, top: 0.0, width: 10.0, height: 10.0, angle: 0.0 }),
            ..recipe()
        };
        assert!(matches!(run(&record), Err(ConvertError::InvalidCrop { .. })));
    }

    #[test]
    fn test_monochrome_style() {
        let record = MetadataRecord {
            picture_style: Some("Monochrome".to_string()),
            monochrome_filter: Some(FilterColor::Red),
            ..recipe()
        };
        let translation = run(&record).unwrap().unwrap();
        assert_eq!(translation.attributes.get("crs:Clarity2012"), Some("+8"));
        assert_eq!(translation.attributes.get("crs:GrayMixerRed"), Some("+50"));
        assert_eq!(
            translation.attributes.look.as_ref().map(|look| look.name.as_str()),
            Some("Adobe Monochrome")
        );
    }

    #[test]
    fn test_rotation_against_orientation() {
        assert_eq!(orientation_degrees("Horizontal (normal)"), 0);
        assert_eq!(orientation_degrees("Rotate 270 CW"), 270);

        let rotated = MetadataRecord {
            rotation: Some(90),
            orientation: Some("Horizontal (normal)".to_string()),
            ..recipe()
        };
        let translation = run(&rotated).unwrap().unwrap();
        assert_eq!(translation.attributes.get("tiff:Orientation"), Some("6"));

        let unchanged = MetadataRecord {
            rotation: Some(90),
            orientation: Some("Rotate 90 CW".to_string()),
            ..recipe()
        };
        assert_eq!(run(&unchanged).unwrap(), None);
    }

    #[test]
    fn test_check_mark_and_tone_curves() {
        let record = MetadataRecord {
            check_mark: Some("2".to_string()),
            tone_curve_active: true,
            tone_curves: ToneCurves {
                rgb: Some("(0,0)(128,140)(255,255)".to_string()),
                red: Some("".to_string()),
                green: None,
                blue: Some("(0,10)(255,245)".to_string()),
            },
            ..recipe()
        };
        let translation = run(&record).unwrap().unwrap();
        assert_eq!(translation.attributes.keywords, vec!["DPP3:CheckMark=2".to_string()]);

        let curves = &translation.attributes.tone_curves;
        assert_eq!(curves.len(), 2);
        assert_eq!(curves[0].channel, CurveChannel::Rgb);
        assert_eq!(curves[0].points, vec![(0, 0), (128, 140), (255, 255)]);
        assert_eq!(curves[1].channel, CurveChannel::Blue);
    }

    #[test]
    fn test_curve_point_parsing_skips_garbage() {
        assert_eq!(parse_curve_points("(1,2)(x,3)(4,5"), vec![(1, 2)]);
        assert_eq!(parse_curve_points("(-1,2)(3,4)"), vec![(3, 4)]);
        assert!(parse_curve_points("").is_empty());
    }
}
