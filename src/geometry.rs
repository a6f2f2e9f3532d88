//! Coordinate geometry for the annotation surface.
//!
//! Pure helpers shared by the polygon editor and the board: distances,
//! centroids, drag clamping, and the pan/zoom viewport math. None of these
//! functions fail; degenerate input yields `NaN` or `None`.

use serde::{Deserialize, Serialize};

use crate::constants::MIN_SCALE;

/// A 2D point in surface-local coordinates.
///
/// Serialized as a `[x, y]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
}

impl Vertex {
    pub const ORIGIN: Vertex = Vertex { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Vertex) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Offset this point by another one.
    pub fn translate(&self, delta: Vertex) -> Vertex {
        Vertex::new(self.x + delta.x, self.y + delta.y)
    }

    pub fn is_origin(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl From<[f32; 2]> for Vertex {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Vertex> for [f32; 2] {
    fn from(v: Vertex) -> Self {
        [v.x, v.y]
    }
}

/// Width and height of a surface or image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Scale both dimensions by the same factor.
    pub fn scaled(&self, factor: f32) -> Size {
        Size::new(self.width * factor, self.height * factor)
    }

    /// Fit a `width` x `height` image to `target_width`, keeping the aspect ratio.
    ///
    /// Returns `None` for images with a zero dimension.
    pub fn fit_to_width(width: u32, height: u32, target_width: f32) -> Option<Size> {
        if width == 0 || height == 0 {
            return None;
        }
        let ratio = width as f32 / height as f32;
        Some(Size::new(target_width, target_width / ratio))
    }
}

/// Pan/zoom transform of the rendering surface.
///
/// `x`/`y` is the translation of the surface origin in device pixels,
/// `scale` the uniform zoom factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Transform {
    pub fn new(x: f32, y: f32, scale: f32) -> Self {
        Self { x, y, scale }
    }

    /// Create an identity transform (scale=1, no pan).
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    /// Convert a device position into surface-local coordinates.
    pub fn to_surface(&self, device: Vertex) -> Vertex {
        Vertex::new((device.x - self.x) / self.scale, (device.y - self.y) / self.scale)
    }

    /// Convert a surface-local position back into device coordinates.
    pub fn to_device(&self, local: Vertex) -> Vertex {
        Vertex::new(local.x * self.scale + self.x, local.y * self.scale + self.y)
    }

    /// Apply a pan delta to the transform.
    pub fn pan_by(&self, dx: f32, dy: f32) -> Transform {
        Transform::new(self.x + dx, self.y + dy, self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Average of a flattened `x, y, x, y, ...` sequence.
///
/// An empty sequence yields a `NaN` point. A trailing odd coordinate is ignored.
pub fn centroid(points: &[f32]) -> Vertex {
    let pairs = points.chunks_exact(2);
    let count = pairs.len() as f32;
    let (total_x, total_y) = pairs.fold((0.0_f32, 0.0_f32), |(sx, sy), pair| {
        (sx + pair[0], sy + pair[1])
    });
    Vertex::new(total_x / count, total_y / count)
}

/// Distance between two points, rounded to two decimals for display.
pub fn distance(a: Vertex, b: Vertex) -> String {
    format!("{:.2}", a.distance_to(&b))
}

/// Keep a drag handle of radius `handle_radius` on the surface.
///
/// A coordinate whose handle would cross an edge snaps to that edge.
pub fn clamp_to_handle_bounds(
    surface_width: f32,
    surface_height: f32,
    handle_radius: f32,
    pos: Vertex,
) -> Vertex {
    let mut x = pos.x;
    let mut y = pos.y;
    if pos.x + handle_radius > surface_width {
        x = surface_width;
    }
    if pos.x - handle_radius < 0.0 {
        x = 0.0;
    }
    if pos.y + handle_radius > surface_height {
        y = surface_height;
    }
    if pos.y - handle_radius < 0.0 {
        y = 0.0;
    }
    Vertex::new(x, y)
}

/// Smallest and largest value of a sequence, `None` when it is empty.
pub fn min_max(values: &[f32]) -> Option<(f32, f32)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((if v < lo { v } else { lo }, if v > hi { v } else { hi })),
    })
}

/// Clamp a candidate viewport so the image stays at least partly in view.
///
/// `image_box` is the image's rendered size; the surface origin may move at
/// most half a surface past either image edge. The scale is floored at
/// [`MIN_SCALE`].
pub fn clamp_viewport(image_box: Size, surface: Size, candidate: Transform) -> Transform {
    let min_x = -image_box.width + surface.width / 2.0;
    let max_x = surface.width / 2.0;
    let min_y = -image_box.height + surface.height / 2.0;
    let max_y = surface.height / 2.0;

    Transform {
        x: candidate.x.min(max_x).max(min_x),
        y: candidate.y.min(max_y).max(min_y),
        scale: candidate.scale.max(MIN_SCALE),
    }
}

/// Zoom by `factor` around the surface midpoint.
///
/// A factor of exactly 1 resets the viewport to identity. Otherwise the
/// point under the surface centre stays fixed and the result is clamped with
/// [`clamp_viewport`] against the image as currently rendered.
pub fn compute_zoom(current: Transform, factor: f32, surface: Size, image: Size) -> Transform {
    if factor == 1.0 {
        return Transform::identity();
    }

    let old_scale = current.scale;
    let center = Vertex::new(surface.width / 2.0, surface.height / 2.0);

    // Surface-local point under the centre before zooming
    let focus = Vertex::new(
        center.x / old_scale - current.x / old_scale,
        center.y / old_scale - current.y / old_scale,
    );

    let new_scale = (old_scale * factor).max(MIN_SCALE);
    let candidate = Transform::new(
        -(focus.x - center.x / new_scale) * new_scale,
        -(focus.y - center.y / new_scale) * new_scale,
        new_scale,
    );

    clamp_viewport(image.scaled(old_scale), surface, candidate)
}

/// Point-in-polygon test (ray casting). Fewer than three vertices never contain anything.
pub fn polygon_contains(vertices: &[Vertex], point: Vertex) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let vi = vertices[i];
        let vj = vertices[j];
        if ((vi.y > point.y) != (vj.y > point.y))
            && (point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
