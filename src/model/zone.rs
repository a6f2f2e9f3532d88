//! Zone categories for annotated polygons.

use serde::{Deserialize, Serialize};

/// Fixed category of an annotated zone.
///
/// The category decides how a polygon is drawn (stroke and fill color) and
/// which label the layer list shows for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneType {
    /// Area nobody is allowed to enter
    Restricted,
    /// Vehicle parking area
    Parking,
    /// Entry or exit passage
    Entrance,
    /// Area excluded from analysis
    Exclusion,
}

impl ZoneType {
    /// Get all zone types in palette order.
    pub fn all() -> &'static [ZoneType] {
        &[
            ZoneType::Restricted,
            ZoneType::Parking,
            ZoneType::Entrance,
            ZoneType::Exclusion,
        ]
    }

    /// Get the display label for this zone type.
    pub fn label(&self) -> &'static str {
        match self {
            ZoneType::Restricted => "Restricted area",
            ZoneType::Parking => "Parking area",
            ZoneType::Entrance => "Entrance",
            ZoneType::Exclusion => "Exclusion area",
        }
    }

    /// Outline color (RGB).
    pub fn stroke_color(&self) -> [u8; 3] {
        match self {
            ZoneType::Restricted => [230, 57, 70],
            ZoneType::Parking => [29, 120, 220],
            ZoneType::Entrance => [42, 157, 80],
            ZoneType::Exclusion => [120, 120, 120],
        }
    }

    /// Translucent fill color (RGBA), the stroke color at low alpha.
    pub fn fill_color(&self) -> [u8; 4] {
        let [r, g, b] = self.stroke_color();
        [r, g, b, 64]
    }
}
