use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use recipe_xmp::calibration::{AlwaysBuild, CameraChooser};
use recipe_xmp::metadata::ExifTool;
use recipe_xmp::prompt::{ConsoleChooser, ConsoleConfirmation};
use recipe_xmp::{ConvertConfig, ConvertError, Converter};

/// Canon Digital Photo Professional 3.x recipe to XMP converter
#[derive(Parser)]
#[command(name = "recipe-xmp")]
#[command(version, about = "Converts DPP3 raw recipes into XMP sidecars", long_about = None)]
struct Cli {
    /// Folder to convert recursively, or one photo to build its camera's
    /// white balance reference from
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// JSON file with configuration overrides
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Lowest sampled color temperature (Kelvin)
    #[arg(long, value_name = "K")]
    temp_min: Option<u32>,

    /// Highest sampled color temperature (Kelvin)
    #[arg(long, value_name = "K")]
    temp_max: Option<u32>,

    /// Kelvin between two reference samples
    #[arg(long, value_name = "K")]
    temp_step: Option<u32>,

    /// Highlight multiplier, 0 disables highlight translation
    #[arg(long, value_name = "N")]
    highlight_multiplier: Option<i32>,

    /// Shadow multiplier, 0 disables shadow translation
    #[arg(long, value_name = "N")]
    shadow_multiplier: Option<i32>,

    /// Gray mixer strength used for monochrome filters (-100..100)
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    mono_filter_strength: Option<i32>,

    /// Directory holding camera calibration tables
    #[arg(long, value_name = "DIR")]
    cameras: Option<PathBuf>,

    /// exiftool executable
    #[arg(long, value_name = "PROGRAM")]
    exiftool: Option<PathBuf>,

    /// Offer existing references as a substitute for unknown cameras
    #[arg(long)]
    substitute: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Config file values, then command line overrides
    fn load_config(&self) -> Result<ConvertConfig> {
        let mut config = match &self.config {
            Some(path) => ConvertConfig::from_json_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => ConvertConfig::default(),
        };

        if let Some(value) = self.temp_min {
            config.temp_min = value;
        }
        if let Some(value) = self.temp_max {
            config.temp_max = value;
        }
        if let Some(value) = self.temp_step {
            config.temp_step = value;
        }
        if let Some(value) = self.highlight_multiplier {
            config.highlight_multiplier = value;
        }
        if let Some(value) = self.shadow_multiplier {
            config.shadow_multiplier = value;
        }
        if let Some(value) = self.mono_filter_strength {
            config.mono_filter_strength = value;
        }
        if let Some(dir) = &self.cameras {
            config.calibration_dir = dir.clone();
        }
        if let Some(program) = &self.exiftool {
            config.exiftool = program.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

/// Log subscriber writing to `writer`; stdout is left to the progress lines
fn subscriber<W>(verbose: bool, writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .finish()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing::subscriber::set_global_default(subscriber(cli.verbose, io::stderr))
        .context("failed to install logger")?;

    println!();
    println!(
        "\tCanon Digital Photo Professional 3.x recipe to XMP converter {}",
        env!("CARGO_PKG_VERSION")
    );

    let config = cli.load_config()?;
    let exiftool = ExifTool::new(&config.exiftool);
    let chooser: Box<dyn CameraChooser> = if cli.substitute {
        Box::new(ConsoleChooser::new(&config.calibration_dir))
    } else {
        Box::new(AlwaysBuild)
    };

    let mut converter = Converter::new(
        config,
        Box::new(exiftool.clone()),
        Box::new(exiftool),
        Box::new(ConsoleConfirmation),
    )
    .with_chooser(chooser);

    let result = if cli.path.is_file() {
        converter.build_reference(&cli.path).map(|reference| {
            info!("Reference {} holds {} temperatures", reference.id(), reference.len());
        })
    } else if cli.path.is_dir() {
        converter.convert_tree(&cli.path).map(|_| ())
    } else {
        Err(ConvertError::InvalidRoot(cli.path.clone()))
    };

    if let Err(e) = result {
        error!("❌ {}", e);
        return Err(e.into());
    }

    Ok(())
}
