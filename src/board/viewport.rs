//! Pan/zoom state of the annotation surface.

use crate::constants::DEFAULT_ZOOM_LEVEL;
use crate::geometry::{clamp_viewport, compute_zoom, Size, Transform, Vertex};

/// Current viewport transform plus an in-progress pan gesture.
#[derive(Debug, Clone)]
pub struct Viewport {
    transform: Transform,
    zoom_level: f32,
    /// Last device position of an ongoing pan
    pan_anchor: Option<Vertex>,
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            transform: Transform::identity(),
            zoom_level: DEFAULT_ZOOM_LEVEL,
            pan_anchor: None,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn zoom_level(&self) -> f32 {
        self.zoom_level
    }

    /// Whether the zoom differs from the default level.
    pub fn is_zoomed(&self) -> bool {
        (self.zoom_level - DEFAULT_ZOOM_LEVEL).abs() > f32::EPSILON
    }

    /// Convert a device position into surface-local coordinates.
    pub fn to_surface(&self, device: Vertex) -> Vertex {
        self.transform.to_surface(device)
    }

    /// Zoom around the surface centre and return the new scale.
    pub fn zoom(&mut self, factor: f32, surface: Size, image: Size) -> f32 {
        self.transform = compute_zoom(self.transform, factor, surface, image);
        self.zoom_level = self.transform.scale;
        log::debug!(
            "Zoom x{:.2} -> scale {:.2}, pan ({:.1}, {:.1})",
            factor,
            self.transform.scale,
            self.transform.x,
            self.transform.y
        );
        self.transform.scale
    }

    /// Back to identity, dropping any pan gesture.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_panning(&self) -> bool {
        self.pan_anchor.is_some()
    }

    pub fn begin_pan(&mut self, device: Vertex) {
        self.pan_anchor = Some(device);
    }

    /// Pan by the movement since the last pointer position.
    ///
    /// Returns true when the transform changed.
    pub fn pan_to(&mut self, device: Vertex, surface: Size, image: Size) -> bool {
        let Some(anchor) = self.pan_anchor else {
            return false;
        };
        self.pan_anchor = Some(device);
        let candidate = self
            .transform
            .pan_by(device.x - anchor.x, device.y - anchor.y);
        let clamped = clamp_viewport(image.scaled(self.transform.scale), surface, candidate);
        if clamped == self.transform {
            return false;
        }
        self.transform = clamped;
        true
    }

    /// Finish a pan gesture. Returns true if one was in progress.
    pub fn end_pan(&mut self) -> bool {
        self.pan_anchor.take().is_some()
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURFACE: Size = Size {
        width: 800.0,
        height: 450.0,
    };

    #[test]
    fn test_zoom_and_reset() {
        let mut viewport = Viewport::new();
        assert!(!viewport.is_zoomed());

        let scale = viewport.zoom(1.2, SURFACE, SURFACE);
        assert!((scale - 1.2).abs() < 1e-4);
        assert!(viewport.is_zoomed());

        assert_eq!(viewport.zoom(1.0, SURFACE, SURFACE), 1.0);
        assert_eq!(viewport.transform(), Transform::identity());
        assert!(!viewport.is_zoomed());
    }

    #[test]
    fn test_pan_gesture() {
        let mut viewport = Viewport::new();
        assert!(!viewport.pan_to(Vertex::new(10.0, 10.0), SURFACE, SURFACE));
        assert!(!viewport.is_panning());

        viewport.begin_pan(Vertex::new(100.0, 100.0));
        assert!(viewport.pan_to(Vertex::new(130.0, 90.0), SURFACE, SURFACE));
        assert_eq!(viewport.transform(), Transform::new(30.0, -10.0, 1.0));

        // Far drag is clamped to half a surface past the image edge
        assert!(viewport.pan_to(Vertex::new(5000.0, 90.0), SURFACE, SURFACE));
        assert_eq!(viewport.transform().x, 400.0);

        assert!(viewport.end_pan());
        assert!(!viewport.end_pan());
    }

    #[test]
    fn test_to_surface_follows_transform() {
        let mut viewport = Viewport::new();
        viewport.begin_pan(Vertex::new(0.0, 0.0));
        viewport.pan_to(Vertex::new(20.0, 20.0), SURFACE, SURFACE);
        assert_eq!(viewport.to_surface(Vertex::new(70.0, 70.0)), Vertex::new(50.0, 50.0));
    }
}
