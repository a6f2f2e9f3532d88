//! Data models for the annotation board.

mod polygon;
mod zone;

pub use polygon::{PolygonData, ZoneId};
pub use zone::ZoneType;
