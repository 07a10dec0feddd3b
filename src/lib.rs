/*!
Conversion between the mower's recorded map topics and GeoJSON.

Import: dump text → [`parser`] → [`assembler::assemble`] (through
[`projection`]) → [`geojson::FeatureCollection`].

Export: [`geojson::FeatureCollection`] → [`assembler::decompose`] (through
[`projection`]) → [`export::TopicMessage`] bodies for the publisher.
 */
pub mod args;
pub mod assembler;
pub mod config;
pub mod error;
pub mod export;
pub mod geojson;
pub mod parser;
pub mod projection;
pub mod ros;
pub mod topics;
pub mod zone;

pub use error::{Diagnostic, Error, Result};
pub use projection::{Datum, GeoPoint, LocalPoint, Projector};
pub use zone::ZoneKind;
