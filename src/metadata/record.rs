/// Typed per-photo recipe record
///
/// exiftool reports DPP3 recipe fields (the CanonVRD group) alongside the
/// regular EXIF tags. This module turns its JSON output into a
/// `MetadataRecord` the translator can consume without string lookups.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// White balance mode stored in a recipe (`WhiteBalanceAdj`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhiteBalanceMode {
    Auto,
    ShotSettings,
    Kelvin,
    ManualClick,
    Preset(WhiteBalancePreset),
    /// Anything DPP may report that we don't know about
    Other(String),
}

/// Named DPP white balance presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteBalancePreset {
    Cloudy,
    Daylight,
    Flash,
    Fluorescent,
    Shade,
    Tungsten,
}

impl WhiteBalancePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            WhiteBalancePreset::Cloudy => "Cloudy",
            WhiteBalancePreset::Daylight => "Daylight",
            WhiteBalancePreset::Flash => "Flash",
            WhiteBalancePreset::Fluorescent => "Fluorescent",
            WhiteBalancePreset::Shade => "Shade",
            WhiteBalancePreset::Tungsten => "Tungsten",
        }
    }
}

impl WhiteBalanceMode {
    /// Parse the exiftool print value
    pub fn parse(value: &str) -> Self {
        match value {
            "Auto" => WhiteBalanceMode::Auto,
            "Shot Settings" => WhiteBalanceMode::ShotSettings,
            "Kelvin" => WhiteBalanceMode::Kelvin,
            "Manual (Click)" => WhiteBalanceMode::ManualClick,
            "Cloudy" => WhiteBalanceMode::Preset(WhiteBalancePreset::Cloudy),
            "Daylight" => WhiteBalanceMode::Preset(WhiteBalancePreset::Daylight),
            "Flash" => WhiteBalanceMode::Preset(WhiteBalancePreset::Flash),
            "Fluorescent" => WhiteBalanceMode::Preset(WhiteBalancePreset::Fluorescent),
            "Shade" => WhiteBalanceMode::Preset(WhiteBalancePreset::Shade),
            "Tungsten" => WhiteBalanceMode::Preset(WhiteBalancePreset::Tungsten),
            other => WhiteBalanceMode::Other(other.to_string()),
        }
    }

    /// Modes whose temperature has to be looked up in a calibration table
    pub fn needs_calibration(&self) -> bool {
        matches!(self, WhiteBalanceMode::Preset(_) | WhiteBalanceMode::ManualClick)
    }
}

/// Monochrome filter colors with an XMP gray mixer counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterColor {
    Yellow,
    Orange,
    Red,
    Green,
}

impl FilterColor {
    /// Parse `MonochromeFilterEffect`; "None" and unknown values have no filter
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Yellow" => Some(FilterColor::Yellow),
            "Orange" => Some(FilterColor::Orange),
            "Red" => Some(FilterColor::Red),
            "Green" => Some(FilterColor::Green),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterColor::Yellow => "Yellow",
            FilterColor::Orange => "Orange",
            FilterColor::Red => "Red",
            FilterColor::Green => "Green",
        }
    }
}

/// Four white balance gains: Red, Green1, Green2, Blue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RggbLevels(pub [i64; 4]);

impl RggbLevels {
    /// Parse the space separated exiftool value, e.g. `"2048 1024 1024 1500"`
    pub fn parse(value: &str) -> Option<Self> {
        let mut levels = [0i64; 4];
        let mut parts = value.split_whitespace();
        for level in levels.iter_mut() {
            *level = parts.next()?.parse::<f64>().ok()? as i64;
        }
        Some(Self(levels))
    }

    /// R, G, B with the duplicate green channel dropped
    pub fn rgb(&self) -> [i64; 3] {
        [self.0[0], self.0[1], self.0[3]]
    }
}

/// Crop rectangle as DPP stores it: origin relative to the rotated,
/// expanded canvas, size in pixels, rotation in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub angle: f64,
}

/// Raw `(x,y)(x,y)...` point lists for each tone curve channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToneCurves {
    pub rgb: Option<String>,
    pub red: Option<String>,
    pub green: Option<String>,
    pub blue: Option<String>,
}

/// Identity of the camera body a photo was shot with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraIdentity {
    pub model_id: String,
    pub owner_name: Option<String>,
    pub serial: String,
}

impl CameraIdentity {
    /// Human readable name, e.g. "Canon EOS 5D serial 12345"
    pub fn label(&self) -> String {
        format!("{} serial {}", self.model_id, self.serial)
    }
}

/// Everything the translator needs to know about one photo
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRecord {
    /// `VRDVersion` present: the photo carries a recipe
    pub has_recipe: bool,

    // ========== White Balance ==========
    pub white_balance: Option<WhiteBalanceMode>,
    pub kelvin: Option<u32>,
    pub rggb: Option<RggbLevels>,
    /// `WBAdjRGGBLevels` exactly as reported, copied through to the sidecar
    pub rggb_raw: Option<String>,

    // ========== Tone & Color ==========
    pub exposure: Option<f64>,
    pub contrast: Option<f64>,
    pub saturation: Option<f64>,
    pub sharpness: Option<f64>,
    pub highlight: Option<f64>,
    pub shadow: Option<f64>,
    pub picture_style: Option<String>,
    pub monochrome_filter: Option<FilterColor>,
    pub tone_curve_active: bool,
    pub tone_curves: ToneCurves,

    // ========== Geometry ==========
    pub crop_active: bool,
    pub crop: Option<CropRect>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    /// Rotation applied in DPP, degrees clockwise
    pub rotation: Option<i32>,
    /// EXIF orientation print value, e.g. "Rotate 90 CW"
    pub orientation: Option<String>,

    // ========== Organisation ==========
    pub rating: Option<i32>,
    pub check_mark: Option<String>,

    pub camera: CameraIdentity,
}

impl MetadataRecord {
    /// Build a record from one exiftool `-j` JSON object
    pub fn from_exiftool_json(value: Value) -> serde_json::Result<Self> {
        let raw: ExifToolRecord = serde_json::from_value(value)?;
        Ok(raw.into())
    }
}

/// exiftool JSON, field names as exiftool prints them
#[derive(Debug, Default, Deserialize)]
struct ExifToolRecord {
    #[serde(rename = "VRDVersion", default, deserialize_with = "text")]
    vrd_version: Option<String>,
    #[serde(rename = "WhiteBalanceAdj", default, deserialize_with = "text")]
    white_balance_adj: Option<String>,
    #[serde(rename = "WBAdjColorTemp", default, deserialize_with = "number")]
    wb_adj_color_temp: Option<f64>,
    #[serde(rename = "WBAdjRGGBLevels", default, deserialize_with = "text")]
    wb_adj_rggb_levels: Option<String>,
    #[serde(rename = "RawBrightnessAdj", default, deserialize_with = "number")]
    raw_brightness_adj: Option<f64>,
    #[serde(rename = "CameraRawContrast", default, deserialize_with = "number")]
    contrast: Option<f64>,
    #[serde(rename = "CameraRawSaturation", default, deserialize_with = "number")]
    saturation: Option<f64>,
    #[serde(rename = "CameraRawSharpness", default, deserialize_with = "number")]
    sharpness: Option<f64>,
    #[serde(rename = "StandardRawHighlight", default, deserialize_with = "number")]
    highlight: Option<f64>,
    #[serde(rename = "StandardRawShadow", default, deserialize_with = "number")]
    shadow: Option<f64>,
    #[serde(rename = "PictureStyle", default, deserialize_with = "text")]
    picture_style: Option<String>,
    #[serde(rename = "MonochromeFilterEffect", default, deserialize_with = "text")]
    monochrome_filter_effect: Option<String>,
    #[serde(rename = "ToneCurveActive", default, deserialize_with = "text")]
    tone_curve_active: Option<String>,
    #[serde(rename = "RGBCurvePoints", default, deserialize_with = "text")]
    rgb_curve_points: Option<String>,
    #[serde(rename = "RedCurvePoints", default, deserialize_with = "text")]
    red_curve_points: Option<String>,
    #[serde(rename = "GreenCurvePoints", default, deserialize_with = "text")]
    green_curve_points: Option<String>,
    #[serde(rename = "BlueCurvePoints", default, deserialize_with = "text")]
    blue_curve_points: Option<String>,
    #[serde(rename = "CropActive", default, deserialize_with = "text")]
    crop_active: Option<String>,
    #[serde(rename = "CropLeft", default, deserialize_with = "number")]
    crop_left: Option<f64>,
    #[serde(rename = "CropTop", default, deserialize_with = "number")]
    crop_top: Option<f64>,
    #[serde(rename = "CropWidth", default, deserialize_with = "number")]
    crop_width: Option<f64>,
    #[serde(rename = "CropHeight", default, deserialize_with = "number")]
    crop_height: Option<f64>,
    #[serde(rename = "AngleAdj", default, deserialize_with = "number")]
    angle_adj: Option<f64>,
    #[serde(rename = "ExifImageWidth", default, deserialize_with = "number")]
    image_width: Option<f64>,
    #[serde(rename = "ExifImageHeight", default, deserialize_with = "number")]
    image_height: Option<f64>,
    #[serde(rename = "Rotation", default, deserialize_with = "number")]
    rotation: Option<f64>,
    #[serde(rename = "Orientation", default, deserialize_with = "text")]
    orientation: Option<String>,
    #[serde(rename = "Rating", default, deserialize_with = "number")]
    rating: Option<f64>,
    #[serde(rename = "CheckMark", default, deserialize_with = "text")]
    check_mark: Option<String>,
    #[serde(rename = "CheckMark2", default, deserialize_with = "text")]
    check_mark2: Option<String>,
    #[serde(rename = "CanonModelID", default, deserialize_with = "text")]
    canon_model_id: Option<String>,
    #[serde(rename = "OwnerName", default, deserialize_with = "text")]
    owner_name: Option<String>,
    #[serde(rename = "SerialNumber", default, deserialize_with = "text")]
    serial_number: Option<String>,
}

impl From<ExifToolRecord> for MetadataRecord {
    fn from(raw: ExifToolRecord) -> Self {
        let crop = match (raw.crop_left, raw.crop_top, raw.crop_width, raw.crop_height) {
            (Some(left), Some(top), Some(width), Some(height)) => Some(CropRect {
                left,
                top,
                width,
                height,
                angle: raw.angle_adj.unwrap_or(0.0),
            }),
            _ => None,
        };

        // CheckMark2 is the newer tag and wins when both are present
        let check_mark = raw
            .check_mark
            .as_ref()
            .map(|first| raw.check_mark2.clone().unwrap_or_else(|| first.clone()));

        MetadataRecord {
            has_recipe: raw.vrd_version.is_some(),
            white_balance: raw.white_balance_adj.as_deref().map(WhiteBalanceMode::parse),
            kelvin: raw.wb_adj_color_temp.map(|k| k.round() as u32),
            rggb: raw.wb_adj_rggb_levels.as_deref().and_then(RggbLevels::parse),
            rggb_raw: raw.wb_adj_rggb_levels,
            exposure: raw.raw_brightness_adj,
            contrast: raw.contrast,
            saturation: raw.saturation,
            sharpness: raw.sharpness,
            highlight: raw.highlight,
            shadow: raw.shadow,
            picture_style: raw.picture_style,
            monochrome_filter: raw.monochrome_filter_effect.as_deref().and_then(FilterColor::parse),
            tone_curve_active: raw.tone_curve_active.as_deref() == Some("Yes"),
            tone_curves: ToneCurves {
                rgb: raw.rgb_curve_points,
                red: raw.red_curve_points,
                green: raw.green_curve_points,
                blue: raw.blue_curve_points,
            },
            crop_active: raw.crop_active.as_deref() == Some("Yes"),
            crop,
            image_width: raw.image_width.map(|w| w as u32),
            image_height: raw.image_height.map(|h| h as u32),
            rotation: raw.rotation.map(|r| r as i32),
            orientation: raw.orientation,
            rating: raw.rating.map(|r| r as i32),
            check_mark,
            camera: CameraIdentity {
                model_id: raw.canon_model_id.unwrap_or_default(),
                owner_name: raw.owner_name.filter(|name| !name.is_empty()),
                serial: raw.serial_number.unwrap_or_default(),
            },
        }
    }
}

/// exiftool prints numeric-looking values as JSON numbers, so serials and
/// versions may arrive either way
pub(crate) fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Numbers may come as `0.33`, `"+0.33"` or `"0"`
fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_start_matches('+').parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rggb_extraction_drops_second_green() {
        let levels = RggbLevels::parse("256 128 128 140").unwrap();
        assert_eq!(levels.rgb(), [256, 128, 140]);
    }

    #[test]
    fn test_rggb_rejects_short_values() {
        assert!(RggbLevels::parse("256 128 128").is_none());
        assert!(RggbLevels::parse("").is_none());
    }

    #[test]
    fn test_white_balance_mode_parsing() {
        assert_eq!(WhiteBalanceMode::parse("Kelvin"), WhiteBalanceMode::Kelvin);
        assert_eq!(WhiteBalanceMode::parse("Manual (Click)"), WhiteBalanceMode::ManualClick);
        assert_eq!(
            WhiteBalanceMode::parse("Tungsten"),
            WhiteBalanceMode::Preset(WhiteBalancePreset::Tungsten)
        );
        assert!(WhiteBalanceMode::parse("Daylight").needs_calibration());
        assert!(!WhiteBalanceMode::parse("Shot Settings").needs_calibration());
        assert_eq!(
            WhiteBalanceMode::parse("Underwater"),
            WhiteBalanceMode::Other("Underwater".to_string())
        );
    }

    #[test]
    fn test_filter_color_none_has_no_filter() {
        assert_eq!(FilterColor::parse("Orange"), Some(FilterColor::Orange));
        assert_eq!(FilterColor::parse("None"), None);
    }

    #[test]
    fn test_from_exiftool_json() {
        let value = json!({
            "SourceFile": "IMG_0001.CR2",
            "VRDVersion": "3.11",
            "WhiteBalanceAdj": "Daylight",
            "WBAdjColorTemp": 5200,
            "WBAdjRGGBLevels": "2048 1024 1024 1500",
            "RawBrightnessAdj": "+0.33",
            "CameraRawContrast": -2,
            "StandardRawHighlight": 0,
            "PictureStyle": "Monochrome",
            "MonochromeFilterEffect": "Red",
            "CropActive": "Yes",
            "CropLeft": 100,
            "CropTop": 50,
            "CropWidth": 800,
            "CropHeight": 600,
            "AngleAdj": 0,
            "ExifImageWidth": 4000,
            "ExifImageHeight": 3000,
            "CheckMark": "Clear",
            "CheckMark2": "2",
            "CanonModelID": "Canon EOS 5D",
            "OwnerName": "",
            "SerialNumber": 12345
        });

        let record = MetadataRecord::from_exiftool_json(value).unwrap();
        assert!(record.has_recipe);
        assert_eq!(
            record.white_balance,
            Some(WhiteBalanceMode::Preset(WhiteBalancePreset::Daylight))
        );
        assert_eq!(record.kelvin, Some(5200));
        assert_eq!(record.rggb.unwrap().rgb(), [2048, 1024, 1500]);
        assert_eq!(record.exposure, Some(0.33));
        assert_eq!(record.contrast, Some(-2.0));
        assert_eq!(record.highlight, Some(0.0));
        assert_eq!(record.monochrome_filter, Some(FilterColor::Red));
        assert!(record.crop_active);
        assert_eq!(record.crop.unwrap().width, 800.0);
        assert_eq!(record.check_mark.as_deref(), Some("2"));
        assert_eq!(record.camera.serial, "12345");
        assert_eq!(record.camera.owner_name, None);
    }

    #[test]
    fn test_missing_marker_means_no_recipe() {
        let record = MetadataRecord::from_exiftool_json(json!({
            "SourceFile": "IMG_0002.CR2",
            "Rating": 3
        }))
        .unwrap();
        assert!(!record.has_recipe);
        assert_eq!(record.rating, Some(3));
    }
}
