/*!
Reads the datum from the mower's shell-style configuration file.
 */
use std::path::Path;

use crate::error::{Error, Result};
use crate::projection::Datum;

pub const DEFAULT_CONFIG_PATH: &str = "/boot/openmower/mower_config.txt";

/// Datum used when neither flags nor the configuration provide one.
pub const DEFAULT_DATUM: Datum = Datum {
    latitude: 59.3293,
    longitude: 18.0686,
};

const LATITUDE_KEY: &str = "OM_DATUM_LAT";
const LONGITUDE_KEY: &str = "OM_DATUM_LONG";

pub fn read_datum(path: &Path) -> Result<Datum> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| Error::Config(format!("cannot read {}: {}", path.display(), err)))?;
    parse_datum(&text)
}

/// Picks `OM_DATUM_LAT` and `OM_DATUM_LONG` out of `export KEY="VALUE"` lines.
pub fn parse_datum(text: &str) -> Result<Datum> {
    let mut latitude = None;
    let mut longitude = None;
    for line in text.lines() {
        let line = line.trim();
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let slot = match key.trim() {
            LATITUDE_KEY => &mut latitude,
            LONGITUDE_KEY => &mut longitude,
            _ => continue,
        };
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        let parsed = value
            .parse::<f64>()
            .map_err(|_| Error::Config(format!("{} is not a number: {:?}", key.trim(), value)))?;
        *slot = Some(parsed);
    }
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Ok(Datum::new(latitude, longitude)),
        (None, _) => Err(Error::Config(format!("{} not set", LATITUDE_KEY))),
        (_, None) => Err(Error::Config(format!("{} not set", LONGITUDE_KEY))),
    }
}
