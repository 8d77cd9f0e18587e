/// Per-camera white balance reference tables
///
/// A reference maps sampled color temperatures to the RGB multipliers DPP
/// computed for them on one specific camera body. Sensors vary from body to
/// body, so tables are keyed by model and serial number.

use std::collections::BTreeMap;
use std::fmt;

use crate::metadata::CameraIdentity;

/// Normalized `<model>.<serial>` key, e.g. `Canon-EOS-R5.12345`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(String);

impl CameraId {
    /// Replace anything outside `[A-Za-z0-9_-]` in the model with `-`,
    /// then collapse runs of `-`
    pub fn new(model_id: &str, serial: &str) -> Self {
        let model: String = model_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '-' })
            .collect();

        let mut id = String::with_capacity(model.len() + serial.len() + 1);
        for c in format!("{}.{}", model, serial).chars() {
            if c == '-' && id.ends_with('-') {
                continue;
            }
            id.push(c);
        }
        Self(id)
    }

    pub fn from_identity(camera: &CameraIdentity) -> Self {
        Self::new(&camera.model_id, &camera.serial)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One sampled temperature and the multipliers DPP used for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationEntry {
    pub kelvin: u32,
    pub rgb: [i64; 3],
}

/// Complete sampled table for one camera body
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationReference {
    pub camera: CameraIdentity,
    table: BTreeMap<u32, [i64; 3]>,
}

impl CalibrationReference {
    pub fn new(camera: CameraIdentity) -> Self {
        Self {
            camera,
            table: BTreeMap::new(),
        }
    }

    /// Build a reference from `(kelvin, rgb)` pairs
    pub fn from_entries(camera: CameraIdentity, entries: impl IntoIterator<Item = CalibrationEntry>) -> Self {
        let mut reference = Self::new(camera);
        for entry in entries {
            reference.insert(entry);
        }
        reference
    }

    pub fn id(&self) -> CameraId {
        CameraId::from_identity(&self.camera)
    }

    pub fn insert(&mut self, entry: CalibrationEntry) {
        self.table.insert(entry.kelvin, entry.rgb);
    }

    /// Entries in ascending temperature order
    pub fn entries(&self) -> impl Iterator<Item = CalibrationEntry> + '_ {
        self.table
            .iter()
            .map(|(&kelvin, &rgb)| CalibrationEntry { kelvin, rgb })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub(crate) fn table(&self) -> &BTreeMap<u32, [i64; 3]> {
        &self.table
    }

    /// Temperature whose multipliers are closest to `rgb`
    ///
    /// Euclidean distance over R, G, B; temperatures are scanned in
    /// ascending order and the first of equally close entries wins.
    pub fn nearest_kelvin(&self, rgb: [i64; 3]) -> Option<u32> {
        let mut closest: Option<(u32, f64)> = None;

        for entry in self.entries() {
            let distance = rgb
                .iter()
                .zip(entry.rgb.iter())
                .map(|(&a, &b)| ((a - b) as f64).powi(2))
                .sum::<f64>()
                .sqrt();

            match closest {
                Some((_, best)) if distance >= best => {}
                _ => closest = Some((entry.kelvin, distance)),
            }
        }

        closest.map(|(kelvin, _)| kelvin)
    }
}
