/// Calibration tables on disk
///
/// One JSON file per camera body, named after its `CameraId`. Each file
/// maps a Kelvin temperature to the RGB levels that temperature produces.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::reference::{CalibrationEntry, CalibrationReference, CameraId};
use crate::error::{ConvertError, Result};
use crate::metadata::record::text;
use crate::metadata::CameraIdentity;

/// A reference table found on disk, as offered in the substitution menu
#[derive(Debug, Clone, PartialEq)]
pub struct KnownCamera {
    pub id: CameraId,
    /// e.g. "Canon EOS 5D serial 12345"
    pub name: String,
    pub path: PathBuf,
}

/// On-disk layout of one calibration file
#[derive(Debug, Deserialize)]
struct StoredReference {
    #[serde(rename = "CanonModelID", default, deserialize_with = "text")]
    model_id: Option<String>,
    #[serde(rename = "OwnerName", default, deserialize_with = "text")]
    owner_name: Option<String>,
    #[serde(rename = "SerialNumber", default, deserialize_with = "text")]
    serial: Option<String>,
    data: BTreeMap<u32, [i64; 3]>,
}

impl From<&CalibrationReference> for StoredReference {
    fn from(reference: &CalibrationReference) -> Self {
        Self {
            model_id: Some(reference.camera.model_id.clone()),
            owner_name: reference.camera.owner_name.clone(),
            serial: Some(reference.camera.serial.clone()),
            data: reference.table().clone(),
        }
    }
}

impl From<StoredReference> for CalibrationReference {
    fn from(stored: StoredReference) -> Self {
        let camera = CameraIdentity {
            model_id: stored.model_id.unwrap_or_default(),
            owner_name: stored.owner_name.filter(|name| !name.is_empty()),
            serial: stored.serial.unwrap_or_default(),
        };
        CalibrationReference::from_entries(
            camera,
            stored
                .data
                .into_iter()
                .map(|(kelvin, rgb)| CalibrationEntry { kelvin, rgb }),
        )
    }
}

/// The calibration store manages one `<CameraId>.json` file per camera body.
pub struct CalibrationStore {
    dir: PathBuf,
}

impl CalibrationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the calibration file for a camera
    pub fn path_for(&self, id: &CameraId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    pub fn contains(&self, id: &CameraId) -> bool {
        self.path_for(id).is_file()
    }

    /// Load the table for a camera, `None` if it was never built
    pub fn load(&self, id: &CameraId) -> Result<Option<CalibrationReference>> {
        let path = self.path_for(id);
        if !path.is_file() {
            return Ok(None);
        }
        Self::load_file(&path).map(Some)
    }

    /// Load a camera's table even when its file was renamed
    pub fn find(&self, id: &CameraId) -> Result<Option<CalibrationReference>> {
        if let Some(reference) = self.load(id)? {
            return Ok(Some(reference));
        }
        match self.known_cameras()?.into_iter().find(|known| &known.id == id) {
            Some(known) => Self::load_file(&known.path).map(Some),
            None => Ok(None),
        }
    }

    /// Load a table from an explicit file
    pub fn load_file(path: &Path) -> Result<CalibrationReference> {
        let text = fs::read_to_string(path)?;
        let stored: StoredReference =
            serde_json::from_str(&text).map_err(|source| ConvertError::CalibrationStore {
                path: path.to_path_buf(),
                source,
            })?;

        let reference = CalibrationReference::from(stored);
        debug!(
            "Loaded {} calibration entries from {}",
            reference.len(),
            path.display()
        );
        Ok(reference)
    }

    /// Write a table, replacing whatever was stored for that camera
    pub fn save(&self, reference: &CalibrationReference) -> Result<PathBuf> {
        let path = self.path_for(&reference.id());

        fs::create_dir_all(&self.dir).map_err(|e| ConvertError::write_failure(&self.dir, e))?;
        let text = Self::to_json_text(reference)?;
        fs::write(&path, text).map_err(|e| ConvertError::write_failure(&path, e))?;

        info!("💾 Saved white balance reference to {}", path.display());
        Ok(path)
    }

    /// Compact JSON with every table row on its own line
    fn to_json_text(reference: &CalibrationReference) -> Result<String> {
        let stored = StoredReference::from(reference);
        let mut text = format!(
            "{{\"CanonModelID\":{},\"OwnerName\":{},\"SerialNumber\":{},\"data\":{{",
            serde_json::to_string(&stored.model_id)?,
            serde_json::to_string(&stored.owner_name)?,
            serde_json::to_string(&stored.serial)?,
        );
        for (i, (kelvin, rgb)) in stored.data.iter().enumerate() {
            if i > 0 {
                text.push(',');
            }
            text.push_str(&format!("\n\"{}\":{}", kelvin, serde_json::to_string(rgb)?));
        }
        text.push_str("}}");
        Ok(text)
    }

    /// List every readable table in the store, sorted by name
    pub fn known_cameras(&self) -> Result<Vec<KnownCamera>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut cameras = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_json = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false);
            if !path.is_file() || !is_json {
                continue;
            }

            match Self::load_file(&path) {
                Ok(reference) => cameras.push(KnownCamera {
                    id: reference.id(),
                    name: reference.camera.label(),
                    path,
                }),
                Err(e) => warn!("⚠️  Skipping unreadable calibration file {}: {}", path.display(), e),
            }
        }

        cameras.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cameras)
    }
}

impl std::fmt::Debug for CalibrationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalibrationStore")
            .field("dir", &self.dir)
            .finish()
    }
}
