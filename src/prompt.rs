/// Interactive console prompts
///
/// Both prompts block until the operator answers. End of input counts as
/// cancelling, so a closed stdin never loops forever.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::calibration::{CalibrationStore, CameraChooser, Confirmation, KnownCamera, ReferenceResolution};
use crate::error::{ConvertError, Result};
use crate::metadata::CameraIdentity;
use crate::progress;

/// Read one trimmed line, `None` at end of input
fn read_answer(input: &mut dyn BufRead, question: &str) -> Result<Option<String>> {
    print!("\t{}", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Ok(None);
    }
    Ok(Some(answer.trim().to_string()))
}

/// Waits for the operator to type `ok` after re-saving the reference photos
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleConfirmation;

impl ConsoleConfirmation {
    fn wait_on(&self, input: &mut dyn BufRead) -> Result<()> {
        loop {
            match read_answer(input, "Type 'ok' when photos are saved in DPP3: ")? {
                Some(answer) if answer.eq_ignore_ascii_case("ok") => return Ok(()),
                Some(_) => continue,
                None => return Err(ConvertError::Cancelled),
            }
        }
    }
}

impl Confirmation for ConsoleConfirmation {
    fn wait_for_render(&self, folder: &Path, count: usize) -> Result<()> {
        debug!("Waiting for {} photos in {} to be re-saved", count, folder.display());
        let stdin = io::stdin();
        let mut input = stdin.lock();
        self.wait_on(&mut input)
    }
}

/// Numbered menu offering an existing reference as a substitute
///
/// `0` builds a new reference, `r` rescans the store (for tables copied in
/// while the prompt is open).
#[derive(Debug)]
pub struct ConsoleChooser {
    store: CalibrationStore,
}

impl ConsoleChooser {
    pub fn new(calibration_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: CalibrationStore::new(calibration_dir),
        }
    }

    fn choose_from(
        &self,
        input: &mut dyn BufRead,
        camera: &CameraIdentity,
        known: &[KnownCamera],
    ) -> Result<ReferenceResolution> {
        let mut known = known.to_vec();

        loop {
            progress::line("");
            progress::line(&format!("Unknown camera {}", camera.label()));
            if !known.is_empty() {
                progress::line("");
                for (i, candidate) in known.iter().enumerate() {
                    progress::line(&format!("{:>3}) {}", i + 1, candidate.name));
                }
                progress::line("");
            }
            progress::line(&format!("Type '0' to generate white balance data for {},", camera.label()));
            if !known.is_empty() {
                progress::line(&format!(
                    "or select one of the cameras above to use as a substitute for {},",
                    camera.label()
                ));
            }
            progress::line("or 'r' to rescan the camera list.");

            let answer = match read_answer(input, "> ")? {
                Some(answer) => answer,
                None => return Err(ConvertError::Cancelled),
            };

            if answer.eq_ignore_ascii_case("r") {
                known = self.store.known_cameras()?;
                continue;
            }

            match answer.parse::<usize>() {
                Ok(0) => return Ok(ReferenceResolution::BuildNew),
                Ok(n) if n <= known.len() => {
                    return Ok(ReferenceResolution::UseExisting(known[n - 1].id.clone()))
                }
                _ => progress::line(&format!("'{}' is not a valid choice.", answer)),
            }
        }
    }
}

impl CameraChooser for ConsoleChooser {
    fn choose(&self, camera: &CameraIdentity, known: &[KnownCamera]) -> Result<ReferenceResolution> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        self.choose_from(&mut input, camera, known)
    }
}
