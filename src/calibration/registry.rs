/// Session registry of calibration tables
///
/// Holds every table used during a run and decides, through a
/// `ReferenceProvider`, how a camera without a stored table gets one.

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use super::builder::ReferenceBuilder;
use super::reference::{CalibrationReference, CameraId};
use super::store::{CalibrationStore, KnownCamera};
use crate::error::{ConvertError, Result};
use crate::metadata::{CameraIdentity, MetadataRecord};

/// How to obtain a reference for a camera that has none
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceResolution {
    /// Borrow the table of another, already calibrated camera
    UseExisting(CameraId),
    /// Sample this camera now
    BuildNew,
}

/// Decides what to do about an uncalibrated camera
pub trait CameraChooser {
    fn choose(&self, camera: &CameraIdentity, known: &[KnownCamera]) -> Result<ReferenceResolution>;
}

/// Always sample the camera itself
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysBuild;

impl CameraChooser for AlwaysBuild {
    fn choose(&self, _camera: &CameraIdentity, _known: &[KnownCamera]) -> Result<ReferenceResolution> {
        Ok(ReferenceResolution::BuildNew)
    }
}

/// Produces a reference for a camera missing from the store
pub trait ReferenceProvider {
    fn provide(
        &self,
        record: &MetadataRecord,
        sample: &Path,
        store: &CalibrationStore,
    ) -> Result<CalibrationReference>;
}

/// Never produces anything; uncalibrated cameras stay unknown
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProvider;

impl ReferenceProvider for NoProvider {
    fn provide(&self, record: &MetadataRecord, _sample: &Path, _store: &CalibrationStore) -> Result<CalibrationReference> {
        Err(ConvertError::UnknownCamera {
            camera_id: CameraId::from_identity(&record.camera).to_string(),
        })
    }
}

/// Asks the chooser, then either loads the substitute or builds a new table
pub struct Acquisition<'a> {
    builder: &'a ReferenceBuilder<'a>,
    chooser: &'a dyn CameraChooser,
}

impl<'a> Acquisition<'a> {
    pub fn new(builder: &'a ReferenceBuilder<'a>, chooser: &'a dyn CameraChooser) -> Self {
        Self { builder, chooser }
    }
}

impl ReferenceProvider for Acquisition<'_> {
    fn provide(
        &self,
        record: &MetadataRecord,
        sample: &Path,
        store: &CalibrationStore,
    ) -> Result<CalibrationReference> {
        let known = store.known_cameras()?;

        match self.chooser.choose(&record.camera, &known)? {
            ReferenceResolution::BuildNew => self.builder.build(sample, record, store),
            ReferenceResolution::UseExisting(substitute) => {
                info!(
                    "Using {} as substitute reference for {}",
                    substitute,
                    record.camera.label()
                );
                // the listed file may be named differently from its camera id
                let reference = match known.iter().find(|candidate| candidate.id == substitute) {
                    Some(candidate) => Some(CalibrationStore::load_file(&candidate.path)?),
                    None => store.find(&substitute)?,
                };
                reference.ok_or_else(|| ConvertError::UnknownCamera {
                    camera_id: substitute.to_string(),
                })
            }
        }
    }
}

/// Session-scoped cache of calibration tables, keyed by camera
///
/// Each camera's table is acquired at most once per run: from memory, then
/// from the store, and only then from the provider.
pub struct CalibrationRegistry {
    store: CalibrationStore,
    cache: HashMap<CameraId, CalibrationReference>,
}

impl CalibrationRegistry {
    pub fn new(store: CalibrationStore) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    pub fn store(&self) -> &CalibrationStore {
        &self.store
    }

    /// Cached table for a camera, without touching the store
    pub fn get(&self, id: &CameraId) -> Option<&CalibrationReference> {
        self.cache.get(id)
    }

    /// Put a table in the cache under the given camera
    pub fn insert(&mut self, id: CameraId, reference: CalibrationReference) {
        self.cache.insert(id, reference);
    }

    /// Table for the camera that shot `sample`
    pub fn reference_for(
        &mut self,
        record: &MetadataRecord,
        sample: &Path,
        provider: &dyn ReferenceProvider,
    ) -> Result<&CalibrationReference> {
        let id = CameraId::from_identity(&record.camera);

        if !self.cache.contains_key(&id) {
            let reference = match self.store.load(&id)? {
                Some(reference) => reference,
                None => {
                    info!("White balance reference required for {}", record.camera.label());
                    provider.provide(record, sample, &self.store)?
                }
            };
            debug!("Caching {} calibration entries for {}", reference.len(), id);
            self.cache.insert(id.clone(), reference);
        }

        self.cache
            .get(&id)
            .ok_or(ConvertError::UnknownCamera { camera_id: id.to_string() })
    }

    /// Build a fresh table for the camera that shot `sample`, replacing
    /// both the stored and the cached one
    pub fn rebuild(
        &mut self,
        record: &MetadataRecord,
        sample: &Path,
        builder: &ReferenceBuilder<'_>,
    ) -> Result<&CalibrationReference> {
        let reference = builder.build(sample, record, &self.store)?;
        let id = CameraId::from_identity(&record.camera);
        self.cache.insert(id.clone(), reference);
        self.cache
            .get(&id)
            .ok_or(ConvertError::UnknownCamera { camera_id: id.to_string() })
    }
}
