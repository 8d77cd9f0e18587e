/// Target attribute set
///
/// The translator decides which XMP attributes apply and with which values;
/// the serializer in `xmp` decides how they are written. Nothing here knows
/// about XML syntax.

/// One `name="value"` attribute on the XMP description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Result of mapping one recipe field
///
/// `applies` marks the field as an edit even when it renders no attribute
/// (for example a preset white balance whose temperature can't be resolved).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    pub applies: bool,
    /// Rendered value, for summaries
    pub value: Option<String>,
    pub attributes: Vec<Attribute>,
}

impl FieldMapping {
    /// Field absent or at its default
    pub fn none() -> Self {
        Self::default()
    }

    /// Field maps to exactly one attribute
    pub fn single(name: &str, value: String) -> Self {
        Self {
            applies: true,
            value: Some(value.clone()),
            attributes: vec![Attribute::new(name, value)],
        }
    }

    /// Field maps to several attributes
    pub fn many(attributes: Vec<Attribute>) -> Self {
        Self {
            applies: true,
            value: None,
            attributes,
        }
    }
}

/// Tone curve channels, in the order they are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveChannel {
    Rgb,
    Red,
    Green,
    Blue,
}

impl CurveChannel {
    pub const ALL: [CurveChannel; 4] = [
        CurveChannel::Rgb,
        CurveChannel::Red,
        CurveChannel::Green,
        CurveChannel::Blue,
    ];

    /// Suffix of the `crs:ToneCurvePV2012` element name
    pub fn suffix(&self) -> &'static str {
        match self {
            CurveChannel::Rgb => "",
            CurveChannel::Red => "Red",
            CurveChannel::Green => "Green",
            CurveChannel::Blue => "Blue",
        }
    }
}

/// One tone curve as a sequence of `(input, output)` points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneCurve {
    pub channel: CurveChannel,
    pub points: Vec<(u32, u32)>,
}

/// Camera profile ("look") descriptor used for monochrome conversions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayscaleLook {
    pub name: String,
    pub convert_to_grayscale: bool,
}

/// Everything that goes into one sidecar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetAttributeSet {
    /// Recipe multipliers copied through verbatim
    pub rggb_levels: String,
    /// `crs:WhiteBalance` label
    pub white_balance: String,
    /// Ordered attributes
    pub attributes: Vec<Attribute>,
    /// Lens profile correction is turned off for cropped photos
    pub lens_profile_enable: bool,
    pub tone_curves: Vec<ToneCurve>,
    pub look: Option<GrayscaleLook>,
    /// `dc:subject` keywords
    pub keywords: Vec<String>,
    has_edits: bool,
}

impl Default for TargetAttributeSet {
    fn default() -> Self {
        Self {
            rggb_levels: String::new(),
            white_balance: "Auto".to_string(),
            attributes: Vec::new(),
            lens_profile_enable: true,
            tone_curves: Vec::new(),
            look: None,
            keywords: Vec::new(),
            has_edits: false,
        }
    }
}

impl TargetAttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field's attributes; returns its rendered value if it applied
    pub fn apply(&mut self, mapping: FieldMapping) -> Option<String> {
        if !mapping.applies {
            return None;
        }
        self.has_edits = true;
        self.attributes.extend(mapping.attributes);
        mapping.value
    }

    /// Record an edit that has no attribute of its own
    pub fn mark_edited(&mut self) {
        self.has_edits = true;
    }

    /// True once at least one field contributed
    pub fn has_edits(&self) -> bool {
        self.has_edits
    }

    /// Look up an attribute value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }
}

/// Render a number the way the sidecar expects: whole numbers without a
/// decimal point, fractions without trailing zeros
pub fn format_number(value: f64) -> String {
    // 14 significant digits drops binary noise such as 105.00000000000001
    let rounded: f64 = format!("{:.13e}", value).parse().unwrap_or(value);
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{}", rounded)
}

/// `format_number` with a leading `+` on positive values
pub fn format_signed(value: f64) -> String {
    let rendered = format_number(value);
    if value > 0.0 && rendered != "0" {
        format!("+{}", rendered)
    } else {
        rendered
    }
}

/// Group thousands with commas, e.g. 10000 -> "10,000"
pub fn format_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
