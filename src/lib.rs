//! Polyzone - polygon zone annotation
//!
//! Draw named polygon zones (restricted areas, parking, entrances, exclusion
//! areas) over an uploaded image, then save them as a JSON annotation set
//! that can be loaded back for further editing.
//!
//! The [`AnnotationBoard`] is the entry point: it owns one [`PolygonEditor`]
//! per zone, routes pointer input to the active one, and handles image
//! ingestion, zoom/pan and save/load.

pub mod board;
pub mod config;
pub mod constants;
pub mod decode;
pub mod editor;
pub mod format;
pub mod geometry;
pub mod model;

pub use board::{AnnotationBoard, AnnotationHandler, BoardError, InteractionMode, LayerInfo};
pub use config::{AppConfig, CanvasConfig};
pub use decode::{ImageFile, IngestError};
pub use editor::{EditorState, PointerOutcome, PolygonEditor};
pub use format::{AnnotationSet, FormatError};
pub use geometry::{Size, Transform, Vertex};
pub use model::{PolygonData, ZoneId, ZoneType};
