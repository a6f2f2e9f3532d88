//! Global constants for the polyzone annotation board

/// Width the stage is fitted to when an image is ingested
pub const DEFAULT_STAGE_WIDTH: f32 = 800.0;

/// Stage height shown while no image is loaded
pub const DEFAULT_STAGE_HEIGHT: f32 = 450.0;

/// Radius of the handle drawn on every polygon vertex
pub const VERTEX_RADIUS: f32 = 6.0;

/// Extra hit tolerance around the first vertex (half the handle's hit stroke)
pub const CLOSE_HANDLE_HIT_PADDING: f32 = 6.0;

/// Scale applied to the first-vertex handle while it can close the polygon
pub const CLOSE_HANDLE_HOVER_SCALE: f32 = 3.0;

/// Zoom step: zoom in multiplies the scale by `1 + offset`, zoom out by `1 - offset`
pub const DEFAULT_ZOOM_OFFSET: f32 = 0.2;

/// Zoom level of a freshly reset viewport
pub const DEFAULT_ZOOM_LEVEL: f32 = 1.0;

/// Lowest scale the viewport may reach
pub const MIN_SCALE: f32 = 0.05;

/// Minimum number of vertices a polygon needs before it can be closed
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Default upload size limit in megabytes
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 100;
