/*!
This module contains the struct definition for the GeoJSON format.
They are used both to read a map edited by hand and to write the converted one.
 */
use serde::{Deserialize, Deserializer, Serialize};

use crate::zone::ZoneKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: Vec<f64>,
    },
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    /// Any geometry type the mower map has no use for
    #[serde(other, skip_serializing)]
    Unsupported,
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry::Unsupported
    }
}

impl Geometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::Unsupported => "unsupported",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default)]
    pub id: String,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<ZoneKind>,
    /// Whatever else the editor stored on the feature
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_tag")]
    pub typ: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Properties,
    #[serde(default, deserialize_with = "null_as_default")]
    pub geometry: Geometry,
}

impl Feature {
    pub fn new(id: String, kind: ZoneKind, geometry: Geometry) -> Self {
        Self {
            typ: feature_tag(),
            properties: Properties {
                id,
                kind: Some(kind),
                extra: Default::default(),
            },
            geometry,
        }
    }

    pub fn id(&self) -> &str {
        &self.properties.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "collection_tag")]
    pub typ: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self {
            typ: collection_tag(),
            features: Vec::new(),
        }
    }
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            features,
            ..Default::default()
        }
    }
}

fn feature_tag() -> String {
    "Feature".to_string()
}

fn collection_tag() -> String {
    "FeatureCollection".to_string()
}

/// `null` is allowed for both `properties` and `geometry`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unknown or missing `type` properties become `None` instead of failing the
/// whole file.
fn lenient_kind<'de, D>(deserializer: D) -> Result<Option<ZoneKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(kind)) => kind.parse().ok(),
        _ => None,
    })
}
