//! Per-polygon editing state machine.
//!
//! A [`PolygonEditor`] collects vertices while the user draws, closes the
//! shape when the first-vertex handle is clicked, and afterwards supports
//! dragging single vertices or the whole shape. Locking suppresses every
//! vertex mutation until the polygon is unlocked again.
//!
//! ```text
//! Empty --pointer down--> Drawing --click on close handle (>= 3 vertices)--> Complete
//!   ^                        |  ^                                               |
//!   +------ reset -----------+  +------------------- undo ----------------------+
//! ```
//!
//! Illegal transitions are silently ignored; callers learn what happened
//! from the returned [`PointerOutcome`] or `bool`.

use crate::constants::{
    CLOSE_HANDLE_HIT_PADDING, CLOSE_HANDLE_HOVER_SCALE, MIN_POLYGON_VERTICES, VERTEX_RADIUS,
};
use crate::geometry::{clamp_to_handle_bounds, polygon_contains, Size, Vertex};
use crate::model::{PolygonData, ZoneId, ZoneType};

/// Drawing phase of a polygon. Locking is tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    /// No vertices yet
    Empty,
    /// Collecting vertices
    Drawing,
    /// Closed shape
    Complete,
}

/// Result of forwarding a pointer-down to an editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Nothing changed
    Ignored,
    /// A vertex was appended
    VertexAdded,
    /// The polygon was just closed
    Closed,
}

/// Editing state of a single polygon.
#[derive(Debug, Clone)]
pub struct PolygonEditor {
    id: ZoneId,
    zone_type: ZoneType,
    vertices: Vec<Vertex>,
    cursor: Option<Vertex>,
    complete: bool,
    locked: bool,
    hovering_close_handle: bool,
    /// Current scale of the first-vertex handle
    handle_scale: f32,
    /// Uncommitted whole-shape drag offset
    drag_offset: Vertex,
    vertex_radius: f32,
    hover_scale: f32,
}

impl PolygonEditor {
    /// Create an empty, unlocked editor.
    pub fn new(id: ZoneId, zone_type: ZoneType) -> Self {
        Self {
            id,
            zone_type,
            vertices: Vec::new(),
            cursor: None,
            complete: false,
            locked: false,
            hovering_close_handle: false,
            handle_scale: 1.0,
            drag_offset: Vertex::ORIGIN,
            vertex_radius: VERTEX_RADIUS,
            hover_scale: CLOSE_HANDLE_HOVER_SCALE,
        }
    }

    /// Rebuild an editor from a saved snapshot.
    ///
    /// A snapshot marked complete with fewer than three vertices is reopened
    /// for drawing. Transient hover state is not restored.
    pub fn from_snapshot(data: PolygonData) -> Self {
        let complete = if data.is_valid() {
            data.complete
        } else {
            log::warn!(
                "Polygon {} is marked complete with {} vertices, reopening it",
                data.id,
                data.vertices.len()
            );
            false
        };

        let mut editor = Self::new(data.id, data.zone_type);
        editor.vertices = data.vertices;
        editor.complete = complete;
        editor.cursor = if complete { None } else { data.cursor_position };
        editor.locked = data.locked;
        editor
    }

    /// Set the vertex handle radius and the close-handle hover scale.
    pub fn with_handle(mut self, vertex_radius: f32, hover_scale: f32) -> Self {
        self.vertex_radius = vertex_radius;
        self.hover_scale = hover_scale;
        self
    }

    pub fn id(&self) -> &ZoneId {
        &self.id
    }

    pub fn zone_type(&self) -> ZoneType {
        self.zone_type
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn cursor_position(&self) -> Option<Vertex> {
        self.cursor
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_hovering_close_handle(&self) -> bool {
        self.hovering_close_handle
    }

    /// Scale of the first-vertex handle (enlarged while it can close the shape).
    pub fn handle_scale(&self) -> f32 {
        self.handle_scale
    }

    /// Offset of a whole-shape drag that has not been committed yet.
    pub fn drag_offset(&self) -> Vertex {
        self.drag_offset
    }

    pub fn state(&self) -> EditorState {
        if self.complete {
            EditorState::Complete
        } else if self.vertices.is_empty() {
            EditorState::Empty
        } else {
            EditorState::Drawing
        }
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Flip the lock flag and return the new value.
    pub fn toggle_lock(&mut self) -> bool {
        self.locked = !self.locked;
        self.locked
    }

    /// Whether closing the polygon is currently a legal move.
    fn can_close(&self) -> bool {
        !self.complete && !self.locked && self.vertices.len() >= MIN_POLYGON_VERTICES
    }

    /// Hit radius of the first-vertex handle at its current scale.
    pub fn close_handle_hit_radius(&self) -> f32 {
        (self.vertex_radius + CLOSE_HANDLE_HIT_PADDING) * self.handle_scale
    }

    /// Whether `pos` lies on the first-vertex handle.
    pub fn is_over_close_handle(&self, pos: Vertex) -> bool {
        match self.vertices.first() {
            Some(first) if !self.complete => {
                first.distance_to(&pos) <= self.close_handle_hit_radius()
            }
            _ => false,
        }
    }

    /// Pointer entered the first-vertex handle.
    ///
    /// Only takes effect while the polygon can be closed.
    pub fn hover_enter_close_handle(&mut self) -> bool {
        if !self.can_close() {
            return false;
        }
        self.hovering_close_handle = true;
        self.handle_scale = self.hover_scale;
        true
    }

    /// Pointer left the first-vertex handle.
    pub fn hover_exit_close_handle(&mut self) {
        self.hovering_close_handle = false;
        self.handle_scale = 1.0;
    }

    /// Derive hover enter/exit from a pointer position.
    ///
    /// Returns true when the hover flag changed.
    pub fn track_close_handle(&mut self, pos: Vertex) -> bool {
        let over = self.is_over_close_handle(pos);
        if over && !self.hovering_close_handle {
            self.hover_enter_close_handle()
        } else if !over && self.hovering_close_handle {
            self.hover_exit_close_handle();
            true
        } else {
            false
        }
    }

    /// Handle a pointer-down at a surface-local position.
    ///
    /// Clicking the close handle with at least three vertices closes the
    /// polygon without adding a point; clicking it with fewer does nothing,
    /// so a click near the first vertex is dropped rather than appended.
    /// Any other click while drawing appends a vertex.
    pub fn pointer_down(&mut self, pos: Vertex) -> PointerOutcome {
        if self.locked || self.complete {
            return PointerOutcome::Ignored;
        }

        if self.hovering_close_handle || self.is_over_close_handle(pos) {
            if self.vertices.len() < MIN_POLYGON_VERTICES {
                log::debug!(
                    "Polygon {} needs at least {} vertices to close, has {}",
                    self.id,
                    MIN_POLYGON_VERTICES,
                    self.vertices.len()
                );
                return PointerOutcome::Ignored;
            }
            self.complete = true;
            self.cursor = None;
            self.hover_exit_close_handle();
            log::debug!("Closed polygon {} with {} vertices", self.id, self.vertices.len());
            return PointerOutcome::Closed;
        }

        self.vertices.push(pos);
        log::trace!(
            "Polygon {}: vertex at ({:.1}, {:.1}), total {}",
            self.id,
            pos.x,
            pos.y,
            self.vertices.len()
        );
        PointerOutcome::VertexAdded
    }

    /// Move the rubber-band preview point. No-op once closed or while locked.
    pub fn pointer_move(&mut self, pos: Vertex) -> bool {
        if self.locked || self.complete {
            return false;
        }
        self.cursor = Some(pos);
        true
    }

    /// Drag vertex `index` to `pos`, keeping its handle on the surface.
    pub fn drag_vertex(&mut self, index: usize, pos: Vertex, surface: Size) -> bool {
        if self.locked {
            return false;
        }
        let radius = self.vertex_radius;
        let Some(vertex) = self.vertices.get_mut(index) else {
            return false;
        };
        *vertex = clamp_to_handle_bounds(surface.width, surface.height, radius, pos);
        true
    }

    /// Update the offset of an ongoing whole-shape drag.
    ///
    /// Only closed, unlocked polygons can be dragged as a whole.
    pub fn drag_shape(&mut self, offset: Vertex) -> bool {
        if !self.complete || self.locked {
            return false;
        }
        self.drag_offset = offset;
        true
    }

    /// Finish a whole-shape drag: bake the offset into the vertices.
    ///
    /// The offset is always reset to zero afterwards. Returns true when
    /// vertices moved.
    pub fn end_shape_drag(&mut self) -> bool {
        let offset = std::mem::replace(&mut self.drag_offset, Vertex::ORIGIN);
        if offset.is_origin() || !self.complete || self.locked {
            return false;
        }
        for vertex in &mut self.vertices {
            *vertex = vertex.translate(offset);
        }
        log::debug!(
            "Moved polygon {} by ({:.1}, {:.1})",
            self.id,
            offset.x,
            offset.y
        );
        true
    }

    /// Remove the last vertex and reopen the polygon.
    ///
    /// The rubber band continues from the removed vertex. Returns the removed
    /// vertex, or `None` when there was nothing to undo or the polygon is locked.
    pub fn undo(&mut self) -> Option<Vertex> {
        if self.locked {
            return None;
        }
        let removed = self.vertices.pop()?;
        self.complete = false;
        self.cursor = Some(removed);
        if self.vertices.len() < MIN_POLYGON_VERTICES {
            self.hover_exit_close_handle();
        }
        Some(removed)
    }

    /// Discard every vertex and return to the empty state.
    ///
    /// Reset is a discard, so it applies even to locked polygons.
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.complete = false;
        self.cursor = None;
        self.drag_offset = Vertex::ORIGIN;
        self.hover_exit_close_handle();
    }

    /// Whether a surface-local point lies inside the closed shape.
    pub fn contains(&self, pos: Vertex) -> bool {
        self.complete && polygon_contains(&self.vertices, pos.translate(negate(self.drag_offset)))
    }

    /// Flattened outline for rendering: the vertices, followed by the cursor
    /// point while still drawing, shifted by any pending drag offset.
    pub fn outline(&self) -> Vec<f32> {
        let preview = if self.complete { None } else { self.cursor };
        self.vertices
            .iter()
            .chain(preview.iter())
            .flat_map(|v| {
                let p = v.translate(self.drag_offset);
                [p.x, p.y]
            })
            .collect()
    }

    /// Copy of the current polygon state.
    pub fn snapshot(&self) -> PolygonData {
        PolygonData {
            id: self.id.clone(),
            zone_type: self.zone_type,
            vertices: self.vertices.clone(),
            cursor_position: if self.complete { None } else { self.cursor },
            complete: self.complete,
            locked: self.locked,
            hovering_close_handle: self.hovering_close_handle,
        }
    }
}

fn negate(v: Vertex) -> Vertex {
    Vertex::new(-v.x, -v.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURFACE: Size = Size {
        width: 200.0,
        height: 100.0,
    };

    fn editor() -> PolygonEditor {
        PolygonEditor::new(ZoneId::from("zone"), ZoneType::Restricted)
    }

    fn triangle() -> PolygonEditor {
        let mut e = editor();
        e.pointer_down(Vertex::new(10.0, 10.0));
        e.pointer_down(Vertex::new(50.0, 10.0));
        e.pointer_down(Vertex::new(30.0, 40.0));
        e
    }

    fn closed_triangle() -> PolygonEditor {
        let mut e = triangle();
        assert!(e.hover_enter_close_handle());
        assert_eq!(e.pointer_down(Vertex::new(10.0, 10.0)), PointerOutcome::Closed);
        e
    }

    #[test]
    fn test_states() {
        let mut e = editor();
        assert_eq!(e.state(), EditorState::Empty);
        e.pointer_down(Vertex::new(1.0, 1.0));
        assert_eq!(e.state(), EditorState::Drawing);
        let e = closed_triangle();
        assert_eq!(e.state(), EditorState::Complete);
    }

    #[test]
    fn test_close_does_not_add_vertex() {
        for n in 3..8 {
            let mut e = editor();
            for i in 0..n {
                let angle = i as f32 * std::f32::consts::TAU / n as f32;
                let outcome = e.pointer_down(Vertex::new(
                    100.0 + 40.0 * angle.cos(),
                    50.0 + 40.0 * angle.sin(),
                ));
                assert_eq!(outcome, PointerOutcome::VertexAdded);
            }
            assert!(e.hover_enter_close_handle());
            assert_eq!(e.handle_scale(), CLOSE_HANDLE_HOVER_SCALE);
            let first = e.vertices()[0];
            assert_eq!(e.pointer_down(first), PointerOutcome::Closed);
            assert!(e.is_complete());
            assert_eq!(e.vertices().len(), n);
            assert!(!e.is_hovering_close_handle());
        }
    }

    #[test]
    fn test_close_with_two_vertices_is_ignored() {
        let mut e = editor();
        e.pointer_down(Vertex::new(10.0, 10.0));
        e.pointer_down(Vertex::new(80.0, 10.0));

        assert!(!e.hover_enter_close_handle());
        assert!(!e.is_hovering_close_handle());
        assert_eq!(e.pointer_down(Vertex::new(11.0, 10.0)), PointerOutcome::Ignored);
        assert!(!e.is_complete());
        assert_eq!(e.vertices().len(), 2);
    }

    #[test]
    fn test_click_near_single_vertex_is_dropped() {
        let mut e = editor();
        e.pointer_down(Vertex::new(10.0, 10.0));

        // Inside the 12-unit handle radius: dropped
        assert_eq!(e.pointer_down(Vertex::new(20.0, 10.0)), PointerOutcome::Ignored);
        assert_eq!(e.vertices().len(), 1);
        // Just outside it: appended
        assert_eq!(e.pointer_down(Vertex::new(23.0, 10.0)), PointerOutcome::VertexAdded);
        assert_eq!(e.vertices().len(), 2);
    }

    #[test]
    fn test_click_on_handle_closes_without_hover_event() {
        let mut e = triangle();
        assert_eq!(e.pointer_down(Vertex::new(12.0, 9.0)), PointerOutcome::Closed);
        assert_eq!(e.vertices().len(), 3);
    }

    #[test]
    fn test_pointer_down_after_complete_is_noop() {
        let mut e = closed_triangle();
        assert_eq!(e.pointer_down(Vertex::new(150.0, 80.0)), PointerOutcome::Ignored);
        assert_eq!(e.vertices().len(), 3);
    }

    #[test]
    fn test_pointer_move_updates_cursor_only_while_drawing() {
        let mut e = triangle();
        assert!(e.pointer_move(Vertex::new(70.0, 70.0)));
        assert_eq!(e.cursor_position(), Some(Vertex::new(70.0, 70.0)));
        assert_eq!(e.outline().len(), 8);

        let mut e = closed_triangle();
        assert!(!e.pointer_move(Vertex::new(70.0, 70.0)));
        assert_eq!(e.cursor_position(), None);
        assert_eq!(e.outline(), vec![10.0, 10.0, 50.0, 10.0, 30.0, 40.0]);
    }

    #[test]
    fn test_hover_exit_restores_scale() {
        let mut e = triangle();
        e.hover_enter_close_handle();
        e.hover_exit_close_handle();
        assert!(!e.is_hovering_close_handle());
        assert_eq!(e.handle_scale(), 1.0);
    }

    #[test]
    fn test_track_close_handle() {
        let mut e = triangle();
        assert!(e.track_close_handle(Vertex::new(15.0, 12.0)));
        assert!(e.is_hovering_close_handle());
        // Enlarged handle keeps the hover a little further out
        assert!(!e.track_close_handle(Vertex::new(30.0, 10.0)));
        assert!(e.track_close_handle(Vertex::new(100.0, 90.0)));
        assert!(!e.is_hovering_close_handle());
    }

    #[test]
    fn test_undo_after_complete() {
        let mut e = closed_triangle();
        assert_eq!(e.undo(), Some(Vertex::new(30.0, 40.0)));
        assert!(!e.is_complete());
        assert_eq!(e.vertices(), &[Vertex::new(10.0, 10.0), Vertex::new(50.0, 10.0)]);
        assert_eq!(e.cursor_position(), Some(Vertex::new(30.0, 40.0)));
    }

    #[test]
    fn test_undo_empty_is_noop() {
        let mut e = editor();
        assert_eq!(e.undo(), None);
        assert_eq!(e.cursor_position(), None);
        assert_eq!(e.state(), EditorState::Empty);
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut drawing = triangle();
        let mut closed = closed_triangle();
        let mut locked = closed_triangle();
        locked.set_locked(true);

        for e in [&mut drawing, &mut closed, &mut locked] {
            e.reset();
            assert!(e.vertices().is_empty());
            assert!(!e.is_complete());
            assert_eq!(e.state(), EditorState::Empty);
        }
    }

    #[test]
    fn test_locked_blocks_mutation() {
        let mut e = closed_triangle();
        assert!(e.toggle_lock());

        assert!(!e.drag_vertex(0, Vertex::new(90.0, 90.0), SURFACE));
        assert_eq!(e.vertices()[0], Vertex::new(10.0, 10.0));
        assert_eq!(e.undo(), None);
        assert!(!e.drag_shape(Vertex::new(5.0, 5.0)));
        assert!(!e.end_shape_drag());
        assert_eq!(e.vertices().len(), 3);

        assert!(!e.toggle_lock());
        assert!(e.drag_vertex(0, Vertex::new(90.0, 90.0), SURFACE));
        assert_eq!(e.vertices()[0], Vertex::new(90.0, 90.0));
    }

    #[test]
    fn test_locked_while_drawing_ignores_pointer() {
        let mut e = triangle();
        e.set_locked(true);
        assert_eq!(e.pointer_down(Vertex::new(150.0, 50.0)), PointerOutcome::Ignored);
        assert!(!e.pointer_move(Vertex::new(150.0, 50.0)));
        assert!(!e.hover_enter_close_handle());
        assert_eq!(e.pointer_down(Vertex::new(10.0, 10.0)), PointerOutcome::Ignored);
        assert!(!e.is_complete());
    }

    #[test]
    fn test_drag_vertex_is_clamped() {
        let mut e = closed_triangle();
        assert!(e.drag_vertex(1, Vertex::new(500.0, -3.0), SURFACE));
        assert_eq!(e.vertices()[1], Vertex::new(200.0, 0.0));
        assert!(e.is_complete());
        assert!(!e.drag_vertex(7, Vertex::new(1.0, 1.0), SURFACE));
    }

    #[test]
    fn test_whole_shape_drag() {
        let mut e = triangle();
        assert!(!e.drag_shape(Vertex::new(5.0, 5.0)));

        let mut e = closed_triangle();
        assert!(e.drag_shape(Vertex::new(5.0, -2.0)));
        assert_eq!(e.outline()[..2], [15.0, 8.0]);
        assert!(e.contains(Vertex::new(35.0, 18.0)));
        assert!(e.end_shape_drag());
        assert_eq!(e.drag_offset(), Vertex::ORIGIN);
        assert_eq!(
            e.vertices(),
            &[
                Vertex::new(15.0, 8.0),
                Vertex::new(55.0, 8.0),
                Vertex::new(35.0, 38.0)
            ]
        );
        assert!(!e.end_shape_drag());
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut e = triangle();
        e.pointer_move(Vertex::new(60.0, 60.0));
        let snap = e.snapshot();
        assert_eq!(snap.vertices.len(), 3);
        assert_eq!(snap.cursor_position, Some(Vertex::new(60.0, 60.0)));
        assert!(!snap.complete);

        let snap = closed_triangle().snapshot();
        assert!(snap.complete);
        assert_eq!(snap.cursor_position, None);
        assert_eq!(snap.zone_type, ZoneType::Restricted);
    }

    #[test]
    fn test_from_snapshot_reopens_invalid_complete() {
        let mut data = PolygonData::new(ZoneId::from("x"), ZoneType::Parking);
        data.vertices = vec![Vertex::new(0.0, 0.0), Vertex::new(5.0, 5.0)];
        data.complete = true;
        data.locked = true;

        let e = PolygonEditor::from_snapshot(data);
        assert!(!e.is_complete());
        assert!(e.is_locked());
        assert_eq!(e.vertices().len(), 2);
    }
}
