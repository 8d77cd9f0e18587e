/// Batch conversion driver
///
/// Walks a folder tree, translates every raw photo's recipe and writes the
/// sidecar next to it. Per-photo problems are reported and counted; fatal
/// errors stop the run.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::calibration::{
    Acquisition, AlwaysBuild, CalibrationReference, CalibrationRegistry, CalibrationStore, CameraChooser,
    Confirmation, ReferenceBuilder,
};
use crate::config::ConvertConfig;
use crate::error::{ConvertError, Result};
use crate::metadata::{MetadataSource, RecipeTagger};
use crate::progress;
use crate::translate::RecipeTranslator;
use crate::xmp;

/// Photo counts for one run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Sidecars written
    pub converted: usize,
    /// Photos without a recipe or without translatable edits
    pub skipped: usize,
    /// Photos whose recipe could not be read or translated
    pub failed: usize,
}

pub struct Converter {
    config: ConvertConfig,
    source: Box<dyn MetadataSource>,
    tagger: Box<dyn RecipeTagger>,
    confirmation: Box<dyn Confirmation>,
    chooser: Box<dyn CameraChooser>,
    registry: CalibrationRegistry,
}

impl Converter {
    /// Create a converter that builds references for unknown cameras
    pub fn new(
        config: ConvertConfig,
        source: Box<dyn MetadataSource>,
        tagger: Box<dyn RecipeTagger>,
        confirmation: Box<dyn Confirmation>,
    ) -> Self {
        let registry = CalibrationRegistry::new(CalibrationStore::new(&config.calibration_dir));
        Self {
            config,
            source,
            tagger,
            confirmation,
            chooser: Box::new(AlwaysBuild),
            registry,
        }
    }

    /// Replace how unknown cameras are resolved
    pub fn with_chooser(mut self, chooser: Box<dyn CameraChooser>) -> Self {
        self.chooser = chooser;
        self
    }

    /// Convert every raw photo below `root`
    pub fn convert_tree(&mut self, root: &Path) -> Result<BatchSummary> {
        if !root.is_dir() {
            return Err(ConvertError::InvalidRoot(root.to_path_buf()));
        }

        info!("📁 Converting recipes under {}", root.display());

        let builder = ReferenceBuilder::new(
            &self.config,
            self.source.as_ref(),
            self.tagger.as_ref(),
            self.confirmation.as_ref(),
        );
        let provider = Acquisition::new(&builder, self.chooser.as_ref());
        let translator = RecipeTranslator::new(&self.config);

        let mut summary = BatchSummary::default();
        let mut last_folder: Option<PathBuf> = None;

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("⚠️  Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() || !self.config.is_raw_file(path) {
                continue;
            }

            let folder = path.parent().unwrap_or(root);
            if last_folder.as_deref() != Some(folder) {
                progress::line("");
                progress::line(&format!("{}/", folder.display()));
                last_folder = Some(folder.to_path_buf());
            }

            progress::photo(&entry.file_name().to_string_lossy());

            let converted = self
                .source
                .read(path)
                .and_then(|record| translator.translate(&record, path, &mut self.registry, &provider))
                .and_then(|translation| match translation {
                    Some(translation) => {
                        write_sidecar(path, &xmp::render(&translation.attributes))?;
                        Ok(Some(translation.summary))
                    }
                    None => Ok(None),
                });

            match converted {
                Ok(Some(photo_summary)) => {
                    progress::finish(&photo_summary.to_string());
                    summary.converted += 1;
                }
                Ok(None) => {
                    progress::finish("(no recipe)");
                    summary.skipped += 1;
                }
                Err(e) if e.is_fatal() => {
                    progress::finish("");
                    error!("❌ {}: {}", path.display(), e);
                    return Err(e);
                }
                Err(e) => {
                    progress::finish(&format!("(failed: {})", e));
                    warn!("⚠️  {}: {}", path.display(), e);
                    summary.failed += 1;
                }
            }
        }

        progress::line("");
        progress::line("All done.");
        info!(
            "✅ {} converted, {} skipped, {} failed",
            summary.converted, summary.skipped, summary.failed
        );
        Ok(summary)
    }

    /// Build (or rebuild) the reference for the camera that shot `sample`
    pub fn build_reference(&mut self, sample: &Path) -> Result<CalibrationReference> {
        if !sample.is_file() {
            return Err(ConvertError::InvalidRoot(sample.to_path_buf()));
        }

        let record = self.source.read(sample)?;
        let builder = ReferenceBuilder::new(
            &self.config,
            self.source.as_ref(),
            self.tagger.as_ref(),
            self.confirmation.as_ref(),
        );
        let reference = self.registry.rebuild(&record, sample, &builder)?;
        Ok(reference.clone())
    }
}

/// Write `<stem>.xmp` beside the photo
fn write_sidecar(photo: &Path, xml: &str) -> Result<PathBuf> {
    let target = photo.with_extension("xmp");
    fs::write(&target, xml).map_err(|e| ConvertError::write_failure(&target, e))?;
    Ok(target)
}
