//! Command line pieces shared by both binaries.

use std::path::{Path, PathBuf};
use std::process::exit;

use clap::Args;
use log::{error, warn, LevelFilter};

use crate::config::{self, DEFAULT_CONFIG_PATH, DEFAULT_DATUM};
use crate::projection::Datum;

#[derive(Debug, Clone, Args)]
pub struct DatumArgs {
    /// Datum latitude :
    /// overrides the configuration file, requires --lon
    #[clap(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,
    /// Datum longitude :
    /// overrides the configuration file, requires --lat
    #[clap(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
    /// Mower configuration holding OM_DATUM_LAT and OM_DATUM_LONG
    #[clap(long, default_value = DEFAULT_CONFIG_PATH)]
    pub datum_config: PathBuf,
}

impl DatumArgs {
    /// Flags first, then the configuration file, then the default datum.
    pub fn resolve(&self) -> Datum {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            return Datum::new(lat, lon);
        }
        match config::read_datum(&self.datum_config) {
            Ok(datum) => datum,
            Err(err) => {
                warn!("{}, falling back to the default datum {}", err, DEFAULT_DATUM);
                DEFAULT_DATUM
            }
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct Verbosity {
    /// verbose :
    /// if specified, will print debug information (RUST_LOG still takes precedence)
    #[clap(short, long)]
    pub verbose: bool,
}

impl Verbosity {
    pub fn handle_verbose(&self) {
        let level = if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };
        let mut builder = pretty_env_logger::formatted_builder();
        builder.filter_level(level);
        if let Ok(filters) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filters);
        }
        builder.init();
    }
}

/// Exits when `input` is missing or `output` would be clobbered.
pub fn validate_paths(input: &Path, output: Option<&Path>, overwrite: bool) {
    if !input.exists() {
        error!("Input file does not exist : {:?}", input);
        exit(1);
    }
    if let Some(output) = output {
        if output.exists() && !overwrite {
            error!(
                "Output file already exists : {:?}\nUse --overwrite to overwrite it",
                output
            );
            exit(1);
        }
    }
}
