//! Polygon identity and snapshot types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ZoneType;
use crate::constants::MIN_POLYGON_VERTICES;
use crate::geometry::Vertex;

/// Stable identifier of a polygon on the board.
///
/// Freshly drawn polygons get a random UUID; identifiers read from a saved
/// annotation set are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    /// Generate a new random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for ZoneId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ZoneId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Full state of one polygon, as saved in an annotation set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonData {
    pub id: ZoneId,
    pub zone_type: ZoneType,
    /// Committed vertices in drawing order
    #[serde(default)]
    pub vertices: Vec<Vertex>,
    /// Rubber-band preview point, absent once the polygon is closed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_position: Option<Vertex>,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hovering_close_handle: bool,
}

impl PolygonData {
    /// Create an empty, unlocked polygon.
    pub fn new(id: ZoneId, zone_type: ZoneType) -> Self {
        Self {
            id,
            zone_type,
            vertices: Vec::new(),
            cursor_position: None,
            complete: false,
            locked: false,
            hovering_close_handle: false,
        }
    }

    /// A closed polygon needs at least three vertices.
    pub fn is_valid(&self) -> bool {
        !self.complete || self.vertices.len() >= MIN_POLYGON_VERTICES
    }
}
