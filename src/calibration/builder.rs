/// White balance reference builder
///
/// DPP computes the RGB multipliers for a Kelvin setting only when it
/// re-renders a photo, so a reference is built in three phases:
/// 1. Tag one copy of a sample photo per temperature in the sweep
/// 2. Wait for the operator to open and save all copies in DPP
/// 3. Read every copy back and record its multipliers
///
/// Any copy whose recipe disagrees with the requested temperature makes
/// the whole table invalid; nothing is written in that case.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::reference::{CalibrationEntry, CalibrationReference, CameraId};
use super::store::CalibrationStore;
use crate::config::ConvertConfig;
use crate::error::{ConvertError, Result};
use crate::metadata::exiftool::original_backup_path;
use crate::metadata::{MetadataRecord, MetadataSource, RecipeTagger, WhiteBalanceMode};
use crate::progress;

/// Blocking checkpoint between tagging and reading back
///
/// Returns once the operator confirms the sampled photos were re-saved in
/// DPP. There is no timeout; only the operator can cancel.
pub trait Confirmation {
    fn wait_for_render(&self, folder: &Path, count: usize) -> Result<()>;
}

/// Confirms immediately, for unattended runs against pre-rendered samples
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Confirmation for AutoConfirm {
    fn wait_for_render(&self, _folder: &Path, _count: usize) -> Result<()> {
        Ok(())
    }
}

pub struct ReferenceBuilder<'a> {
    config: &'a ConvertConfig,
    source: &'a dyn MetadataSource,
    tagger: &'a dyn RecipeTagger,
    confirmation: &'a dyn Confirmation,
}

impl<'a> ReferenceBuilder<'a> {
    pub fn new(
        config: &'a ConvertConfig,
        source: &'a dyn MetadataSource,
        tagger: &'a dyn RecipeTagger,
        confirmation: &'a dyn Confirmation,
    ) -> Self {
        Self {
            config,
            source,
            tagger,
            confirmation,
        }
    }

    /// Folder the sampled copies for a camera are written to
    pub fn sample_folder(&self, id: &CameraId) -> PathBuf {
        self.config.reference_dir.join(id.as_str())
    }

    /// Build the reference for the camera that shot `sample` and persist it,
    /// replacing any earlier table for that camera
    pub fn build(
        &self,
        sample: &Path,
        record: &MetadataRecord,
        store: &CalibrationStore,
    ) -> Result<CalibrationReference> {
        if !record.has_recipe {
            return Err(ConvertError::MissingRecipe);
        }

        let id = CameraId::from_identity(&record.camera);
        let owner = record
            .camera
            .owner_name
            .as_ref()
            .map(|name| format!(" ({})", name))
            .unwrap_or_default();
        info!(
            "🎨 Building white balance reference for {}{} serial {}",
            record.camera.model_id, owner, record.camera.serial
        );

        let extension = sample
            .extension()
            .map(|ext| ext.to_string_lossy().to_uppercase())
            .unwrap_or_default();
        let folder = self.sample_folder(&id);

        let sampled = self.generate_samples(sample, &id, &folder, &extension)?;

        progress::line("");
        progress::line(&format!("Open the folder {} in DPP3,", folder.display()));
        progress::line("select all reference photos and run File > Save.");
        self.confirmation.wait_for_render(&folder, sampled.len())?;
        progress::line("");

        let reference = self.read_samples(record, &sampled, &extension)?;
        store.save(&reference)?;

        progress::line("");
        progress::line(&format!(
            "White balance reference data for {} generated.",
            record.camera.label()
        ));
        progress::line(&format!("You may now delete {}", folder.display()));

        Ok(reference)
    }

    /// Tag one copy per temperature; returns `(kelvin, path)` in sweep order
    fn generate_samples(
        &self,
        sample: &Path,
        id: &CameraId,
        folder: &Path,
        extension: &str,
    ) -> Result<Vec<(u32, PathBuf)>> {
        fs::create_dir_all(folder).map_err(|e| ConvertError::write_failure(folder, e))?;
        remove_stale_samples(folder, extension)?;

        progress::line("Generating reference photos...");

        // exiftool rewrites the working copy and keeps the pre-tag file as
        // `<copy>_original`, which becomes the next working copy
        let working = self.config.reference_dir.join(format!("{}.{}", id, extension));
        fs::copy(sample, &working).map_err(|e| ConvertError::write_failure(&working, e))?;
        let backup = original_backup_path(&working);

        let total = self.config.temperature_count();
        let mut sampled = Vec::with_capacity(total);

        for (index, kelvin) in self.config.temperatures().enumerate() {
            let target = folder.join(format!("{}.{}", kelvin, extension));
            if target.exists() {
                fs::remove_file(&target)?;
            }

            self.tagger.tag_kelvin(&working, kelvin)?;
            fs::rename(&working, &target).map_err(|e| ConvertError::write_failure(&target, e))?;
            fs::rename(&backup, &working).map_err(|e| ConvertError::write_failure(&working, e))?;

            progress::temperature_step(index + 1, total, kelvin, extension);
            sampled.push((kelvin, target));
        }

        fs::remove_file(&working)?;
        debug!("Tagged {} reference photos in {}", sampled.len(), folder.display());
        Ok(sampled)
    }

    /// Read every re-rendered copy back into a table
    fn read_samples(
        &self,
        record: &MetadataRecord,
        sampled: &[(u32, PathBuf)],
        extension: &str,
    ) -> Result<CalibrationReference> {
        progress::line("Reading white balance data...");

        let mut reference = CalibrationReference::new(record.camera.clone());
        let total = sampled.len();

        for (index, (kelvin, path)) in sampled.iter().enumerate() {
            let rendered = self.source.read(path)?;

            let is_kelvin = rendered.white_balance == Some(WhiteBalanceMode::Kelvin);
            if !is_kelvin || rendered.kelvin != Some(*kelvin) {
                return Err(ConvertError::CalibrationMismatch {
                    file: path.clone(),
                    expected: *kelvin,
                    actual_mode: mode_label(&rendered),
                    actual_kelvin: rendered.kelvin,
                });
            }

            let rggb = rendered.rggb.ok_or_else(|| {
                ConvertError::metadata(path, "no WBAdjRGGBLevels in re-rendered reference photo")
            })?;

            progress::temperature_step(index + 1, total, *kelvin, extension);
            reference.insert(CalibrationEntry {
                kelvin: *kelvin,
                rgb: rggb.rgb(),
            });
        }

        Ok(reference)
    }
}

fn mode_label(record: &MetadataRecord) -> String {
    match &record.white_balance {
        Some(WhiteBalanceMode::Other(value)) => value.clone(),
        Some(mode) => format!("{:?}", mode),
        None => "no white balance".to_string(),
    }
}

/// Remove sampled copies left over from an earlier build
fn remove_stale_samples(folder: &Path, extension: &str) -> Result<()> {
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if path.is_file() && matches {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
