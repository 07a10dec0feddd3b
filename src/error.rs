/*!
Error and diagnostic types.

Hard failures are [`Error`] values and stop the conversion. Everything the
converter can recover from (a garbled number, a shape with too few points,
a hole it cannot export) is a [`Diagnostic`]: the offending piece is
dropped or zeroed and the run goes on.
 */
use std::fmt;

use crate::zone::ZoneKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Projection produced, or would produce, non-finite coordinates
    #[error("degenerate projection: {0}")]
    DegenerateProjection(String),

    /// A GeoJSON geometry that cannot be read as the expected shape
    #[error("invalid geometry in feature `{id}`: {reason}")]
    InvalidGeometry { id: String, reason: String },

    /// Datum configuration missing or unreadable
    #[error("datum configuration error: {0}")]
    Config(String),

    /// External ROS executable failed
    #[error("`{tool}` failed: {message}")]
    Tool { tool: String, message: String },

    #[error("interrupted")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A recoverable problem met while converting.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A coordinate field whose value is not a number; zero was used instead.
    MalformedField {
        line: usize,
        field: String,
        text: String,
    },
    /// A shape without enough points for its kind; it was dropped.
    InsufficientGeometry {
        name: String,
        kind: ZoneKind,
        points: usize,
    },
    /// Interior rings of a polygon that the message format cannot carry.
    DiscardedRings { id: String, rings: usize },
    /// A feature the export direction does not know how to publish.
    UnsupportedFeature { id: String, reason: String },
}

impl Diagnostic {
    /// Logs the diagnostic at `warn` and hands it back for collection.
    pub(crate) fn report(self) -> Self {
        log::warn!("{}", self);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MalformedField { line, field, text } => write!(
                f,
                "line {}: `{}` has non-numeric value {:?}, using 0",
                line, field, text
            ),
            Diagnostic::InsufficientGeometry { name, kind, points } => write!(
                f,
                "dropping {} `{}`: {} point(s) is not enough",
                kind, name, points
            ),
            Diagnostic::DiscardedRings { id, rings } => write!(
                f,
                "feature `{}`: discarding {} interior ring(s), only the outer ring is exported",
                id, rings
            ),
            Diagnostic::UnsupportedFeature { id, reason } => {
                write!(f, "skipping feature `{}`: {}", id, reason)
            }
        }
    }
}
