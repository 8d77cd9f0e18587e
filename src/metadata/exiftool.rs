/// exiftool integration
///
/// Reading recipes and writing the two white balance fields used during
/// reference building both go through the exiftool command line tool.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tracing::debug;

use super::record::MetadataRecord;
use crate::error::{ConvertError, Result};

/// Anything that can produce a typed record for a photo
pub trait MetadataSource {
    fn read(&self, path: &Path) -> Result<MetadataRecord>;
}

/// Anything that can set a fixed Kelvin white balance on a photo's recipe
///
/// Implementations modify `path` in place and keep the untouched file as
/// `<path>_original`.
pub trait RecipeTagger {
    fn tag_kelvin(&self, path: &Path, kelvin: u32) -> Result<()>;
}

/// Path of the backup exiftool leaves next to a tagged file
pub fn original_backup_path(path: &Path) -> PathBuf {
    let mut backup = path.as_os_str().to_owned();
    backup.push("_original");
    PathBuf::from(backup)
}

/// exiftool invoked as an external process
#[derive(Debug, Clone)]
pub struct ExifTool {
    program: PathBuf,
}

impl ExifTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run exiftool and return stdout, failing on a non-zero exit
    fn run(&self, path: &Path, args: &[String]) -> Result<Vec<u8>> {
        debug!("exiftool {} {}", args.join(" "), path.display());

        let output = Command::new(&self.program)
            .args(args)
            .arg(path)
            .output()
            .map_err(|e| {
                ConvertError::metadata(path, format!("cannot run {}: {}", self.program.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConvertError::metadata(path, stderr.trim().to_string()));
        }

        Ok(output.stdout)
    }
}

impl MetadataSource for ExifTool {
    fn read(&self, path: &Path) -> Result<MetadataRecord> {
        let args = ["-j", "-all", "-CanonVRD:all"].map(String::from);
        let stdout = self.run(path, &args)?;

        let parsed: Value = serde_json::from_slice(&stdout)
            .map_err(|e| ConvertError::metadata(path, format!("unreadable exiftool output: {}", e)))?;

        // exiftool -j always answers with an array, one object per file
        let first = match parsed {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            _ => return Err(ConvertError::metadata(path, "exiftool returned no record")),
        };

        MetadataRecord::from_exiftool_json(first)
            .map_err(|e| ConvertError::metadata(path, format!("unexpected exiftool record: {}", e)))
    }
}

impl RecipeTagger for ExifTool {
    fn tag_kelvin(&self, path: &Path, kelvin: u32) -> Result<()> {
        let args = [
            "-CanonVRD:WhiteBalanceAdj=Kelvin".to_string(),
            format!("-CanonVRD:WBAdjColorTemp={}", kelvin),
        ];
        self.run(path, &args)?;
        Ok(())
    }
}
