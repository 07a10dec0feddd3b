/*!
Zone kinds and the per-kind feature id counter.
 */
use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    DockingPoint,
    WorkingArea,
    ExclusionZone,
    TransportZone,
}

impl ZoneKind {
    /// Classifies an area by its name.
    ///
    /// Exclusion is checked before navigation/transport so that a name
    /// carrying both keywords stays an exclusion zone. Never yields
    /// [`ZoneKind::DockingPoint`], which is bound to its topic instead.
    pub fn classify(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("exclusion") {
            ZoneKind::ExclusionZone
        } else if name.contains("navigation") || name.contains("transport") {
            ZoneKind::TransportZone
        } else {
            ZoneKind::WorkingArea
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneKind::DockingPoint => "docking_point",
            ZoneKind::WorkingArea => "working_area",
            ZoneKind::ExclusionZone => "exclusion_zone",
            ZoneKind::TransportZone => "transport_zone",
        }
    }

    /// Every kind except the docking point is drawn as a polygon.
    pub fn is_polygon(&self) -> bool {
        !matches!(self, ZoneKind::DockingPoint)
    }
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "docking_point" => Ok(ZoneKind::DockingPoint),
            "working_area" => Ok(ZoneKind::WorkingArea),
            "exclusion_zone" => Ok(ZoneKind::ExclusionZone),
            "transport_zone" => Ok(ZoneKind::TransportZone),
            _ => Err(format!("{} is not a valid zone kind", s)),
        }
    }
}

/// Hands out `working_area_1`, `working_area_2`, ... within one conversion.
#[derive(Debug, Default)]
pub struct ZoneCounters {
    counts: HashMap<ZoneKind, usize>,
}

impl ZoneCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id for `kind`. The first docking point is plain `docking_point`.
    pub fn next_id(&mut self, kind: ZoneKind) -> String {
        let count = self.counts.entry(kind).or_insert(0);
        *count += 1;
        match (kind, *count) {
            (ZoneKind::DockingPoint, 1) => kind.as_str().to_string(),
            (_, n) => format!("{}_{}", kind, n),
        }
    }
}
