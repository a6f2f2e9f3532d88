//! The annotation board: a set of polygons drawn over one image.
//!
//! The board owns every [`PolygonEditor`], tracks which one receives
//! pointer input, and holds the image and viewport state. Pointer positions
//! passed in are device coordinates; the board converts them to
//! surface-local coordinates through the current viewport transform before
//! forwarding them to an editor.
//!
//! Image ingestion is asynchronous. [`AnnotationBoard::ingest`] validates
//! the file and queues it on a background decoder; the result is applied
//! by [`AnnotationBoard::poll_ingestion`] or
//! [`AnnotationBoard::wait_for_ingestion`]. Until then the previously
//! loaded image stays in place.

mod viewport;


pub use viewport::Viewport;

use std::collections::HashMap;

use thiserror::Error;

use crate::config::CanvasConfig;
use crate::decode::{DecodeError, DecodeResult, ImageDecoder, ImageFile, IngestError};
use crate::editor::{PointerOutcome, PolygonEditor};
use crate::format::AnnotationSet;
use crate::geometry::{Size, Vertex};
use crate::model::{ZoneId, ZoneType};

/// Errors reported by board operations.
#[derive(Error, Debug)]
pub enum BoardError {
    /// Saving requires a loaded image
    #[error("Image not found")]
    ImageNotFound,

    /// The uploaded file was rejected
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// What pointer input on the surface does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Clicks add vertices to the active polygon
    #[default]
    Draw,
    /// Pointer drags pan the viewport
    Drag,
}

/// The image currently shown on the board.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    /// File name or URL the image came from
    pub reference: String,
    /// Decoded width in pixels; the declared surface width after a load
    pub natural_width: u32,
    /// Decoded height in pixels; the declared surface height after a load
    pub natural_height: u32,
}

/// One row of the layer list, in board order.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInfo {
    /// 1-based position in the list
    pub index: usize,
    pub id: ZoneId,
    pub zone_type: ZoneType,
    pub label: &'static str,
    pub locked: bool,
    pub complete: bool,
    /// Whether this polygon currently receives pointer input
    pub active: bool,
}

/// Receives the outcome of a submit or cancel.
pub trait AnnotationHandler {
    /// Called with the serialized set after a successful submit.
    fn on_save(&mut self, set: &AnnotationSet);

    /// Called when the user abandons the session.
    fn on_cancel(&mut self);
}

/// Set-level fields carried through load and save.
#[derive(Debug, Clone, Default)]
struct SetMetadata {
    id: Option<u64>,
    name: Option<String>,
    description: Option<String>,
}

/// Upload waiting for its decode result.
#[derive(Debug, Clone)]
struct PendingIngest {
    ticket: u64,
    reference: String,
}

/// Collection of polygons over a single image.
pub struct AnnotationBoard {
    config: CanvasConfig,
    editors: HashMap<ZoneId, PolygonEditor>,
    /// Creation (and serialization) order
    order: Vec<ZoneId>,
    /// Render order, back to front
    z_order: Vec<ZoneId>,
    active: Option<ZoneId>,
    image: Option<LoadedImage>,
    pending: Option<PendingIngest>,
    /// Surface size; zero while no image has been sized
    size: Size,
    viewport: Viewport,
    mode: InteractionMode,
    /// Started on the first upload
    decoder: Option<ImageDecoder>,
    metadata: SetMetadata,
    /// Bumped on every visible change
    revision: u64,
}

impl AnnotationBoard {
    /// Create an empty board.
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            config,
            editors: HashMap::new(),
            order: Vec::new(),
            z_order: Vec::new(),
            active: None,
            image: None,
            pending: None,
            size: Size::ZERO,
            viewport: Viewport::new(),
            mode: InteractionMode::default(),
            decoder: None,
            metadata: SetMetadata::default(),
            revision: 0,
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Counter that changes whenever the rendered state changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    // ------------------------------------------------------------------
    // Polygons
    // ------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &ZoneId) -> bool {
        self.editors.contains_key(id)
    }

    pub fn editor(&self, id: &ZoneId) -> Option<&PolygonEditor> {
        self.editors.get(id)
    }

    /// Polygons in creation order.
    pub fn polygons(&self) -> impl Iterator<Item = &PolygonEditor> {
        self.order.iter().filter_map(|id| self.editors.get(id))
    }

    /// Polygons back to front; the last one is drawn on top.
    pub fn render_order(&self) -> impl Iterator<Item = &PolygonEditor> {
        self.z_order.iter().filter_map(|id| self.editors.get(id))
    }

    pub fn active_id(&self) -> Option<&ZoneId> {
        self.active.as_ref()
    }

    pub fn active_editor(&self) -> Option<&PolygonEditor> {
        self.active.as_ref().and_then(|id| self.editors.get(id))
    }

    fn active_editor_mut(&mut self) -> Option<&mut PolygonEditor> {
        self.active.as_ref().and_then(|id| self.editors.get_mut(id))
    }

    /// Start a new polygon of `zone_type` and make it active.
    ///
    /// Requires a loaded image and draw mode; returns `None` otherwise.
    pub fn add_polygon(&mut self, zone_type: ZoneType) -> Option<ZoneId> {
        if self.image.is_none() {
            log::debug!("Ignoring new {} polygon: no image loaded", zone_type.label());
            return None;
        }
        if self.mode != InteractionMode::Draw {
            log::debug!("Ignoring new {} polygon: not in draw mode", zone_type.label());
            return None;
        }

        let id = ZoneId::generate();
        let editor = PolygonEditor::new(id.clone(), zone_type)
            .with_handle(self.config.vertex_radius, self.config.close_handle_scale);
        self.editors.insert(id.clone(), editor);
        self.order.push(id.clone());
        self.z_order.push(id.clone());
        self.active = Some(id.clone());
        self.touch();

        log::info!("Added {} polygon {}", zone_type.label(), id);
        Some(id)
    }

    /// Delete a polygon. Returns false for an unknown id.
    pub fn remove_polygon(&mut self, id: &ZoneId) -> bool {
        let Some(mut editor) = self.editors.remove(id) else {
            log::debug!("Cannot remove unknown polygon {}", id);
            return false;
        };
        editor.reset();
        self.order.retain(|other| other != id);
        self.z_order.retain(|other| other != id);
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        self.touch();

        log::info!("Removed polygon {}", id);
        true
    }

    /// Make `id` the active polygon and raise it to the top.
    pub fn select(&mut self, id: &ZoneId) -> bool {
        if !self.editors.contains_key(id) {
            return false;
        }
        self.active = Some(id.clone());
        self.bring_to_front(id);
        self.touch();
        true
    }

    /// Clear the active polygon.
    pub fn deselect(&mut self) {
        if self.active.take().is_some() {
            self.touch();
        }
    }

    fn bring_to_front(&mut self, id: &ZoneId) {
        if let Some(pos) = self.z_order.iter().position(|other| other == id) {
            let raised = self.z_order.remove(pos);
            self.z_order.push(raised);
        }
    }

    /// Front-most closed polygon under a device position.
    pub fn polygon_at(&self, device: Vertex) -> Option<ZoneId> {
        let local = self.viewport.to_surface(device);
        self.z_order
            .iter()
            .rev()
            .find(|id| self.editors.get(*id).is_some_and(|editor| editor.contains(local)))
            .cloned()
    }

    /// Select the polygon under a device position, if any.
    pub fn click_at(&mut self, device: Vertex) -> Option<ZoneId> {
        let id = self.polygon_at(device)?;
        self.select(&id);
        Some(id)
    }

    /// Flip a polygon's lock and return the new state.
    pub fn toggle_lock(&mut self, id: &ZoneId) -> Option<bool> {
        let locked = self.editors.get_mut(id)?.toggle_lock();
        self.touch();
        log::debug!("Polygon {} {}", id, if locked { "locked" } else { "unlocked" });
        Some(locked)
    }

    fn clear_polygons(&mut self) {
        self.editors.clear();
        self.order.clear();
        self.z_order.clear();
        self.active = None;
    }

    /// Remove every polygon, keeping the image.
    pub fn clear_all(&mut self) {
        self.clear_polygons();
        self.touch();
        log::info!("Cleared all polygons");
    }

    /// Remove every polygon and the image, returning to a blank board.
    pub fn delete_all(&mut self) {
        self.clear_polygons();
        self.image = None;
        self.pending = None;
        self.size = Size::ZERO;
        self.viewport.reset();
        self.metadata = SetMetadata::default();
        self.touch();
        log::info!("Deleted all polygons and the image");
    }

    /// Layer list rows in creation order.
    pub fn layers(&self) -> Vec<LayerInfo> {
        self.polygons()
            .enumerate()
            .map(|(i, editor)| LayerInfo {
                index: i + 1,
                id: editor.id().clone(),
                zone_type: editor.zone_type(),
                label: editor.zone_type().label(),
                locked: editor.is_locked(),
                complete: editor.is_complete(),
                active: self.active.as_ref() == Some(editor.id()),
            })
            .collect()
    }

    /// Number of polygons of a given zone type.
    pub fn zone_count(&self, zone_type: ZoneType) -> usize {
        self.polygons()
            .filter(|editor| editor.zone_type() == zone_type)
            .count()
    }

    // ------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Switch between drawing and panning. Polygon state is untouched.
    pub fn set_mode(&mut self, mode: InteractionMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.viewport.end_pan();
        self.touch();
        log::debug!("Interaction mode: {:?}", mode);
    }

    /// Pointer pressed on the surface.
    pub fn pointer_down(&mut self, device: Vertex) -> PointerOutcome {
        if self.mode == InteractionMode::Drag {
            self.viewport.begin_pan(device);
            return PointerOutcome::Ignored;
        }

        let local = self.viewport.to_surface(device);
        let Some(editor) = self.active_editor_mut() else {
            log::trace!("Pointer down with no active polygon");
            return PointerOutcome::Ignored;
        };
        let hover_changed = editor.track_close_handle(local);
        let outcome = editor.pointer_down(local);

        if outcome == PointerOutcome::Closed {
            if let Some(id) = self.active.take() {
                log::info!("Completed polygon {}", id);
            }
        }
        if hover_changed || outcome != PointerOutcome::Ignored {
            self.touch();
        }
        outcome
    }

    /// Pointer moved over the surface. Returns true when anything changed.
    pub fn pointer_move(&mut self, device: Vertex) -> bool {
        let changed = match self.mode {
            InteractionMode::Drag => {
                let surface = self.stage_size();
                let image = self.size;
                self.viewport.pan_to(device, surface, image)
            }
            InteractionMode::Draw => {
                let local = self.viewport.to_surface(device);
                match self.active_editor_mut() {
                    Some(editor) => {
                        let hover_changed = editor.track_close_handle(local);
                        editor.pointer_move(local) || hover_changed
                    }
                    None => false,
                }
            }
        };
        if changed {
            self.touch();
        }
        changed
    }

    /// Pointer released; ends a pan gesture.
    pub fn pointer_up(&mut self) {
        self.viewport.end_pan();
    }

    /// Explicit hover enter/exit on a polygon's first-vertex handle.
    pub fn hover_close_handle(&mut self, id: &ZoneId, entered: bool) -> bool {
        let Some(editor) = self.editors.get_mut(id) else {
            return false;
        };
        let changed = if entered {
            editor.hover_enter_close_handle()
        } else {
            let was_hovering = editor.is_hovering_close_handle();
            editor.hover_exit_close_handle();
            was_hovering
        };
        if changed {
            self.touch();
        }
        changed
    }

    /// Drag a single vertex to a device position.
    pub fn drag_vertex(&mut self, id: &ZoneId, index: usize, device: Vertex) -> bool {
        let local = self.viewport.to_surface(device);
        let surface = self.stage_size();
        let moved = self
            .editors
            .get_mut(id)
            .is_some_and(|editor| editor.drag_vertex(index, local, surface));
        if moved {
            self.touch();
        }
        moved
    }

    /// Update the offset of a whole-shape drag, raising the shape on its first move.
    pub fn drag_shape(&mut self, id: &ZoneId, offset: Vertex) -> bool {
        let moved = self
            .editors
            .get_mut(id)
            .is_some_and(|editor| editor.drag_shape(offset));
        if moved {
            if self.active.as_ref() != Some(id) {
                self.select(id);
            }
            self.touch();
        }
        moved
    }

    /// Commit a whole-shape drag.
    pub fn end_shape_drag(&mut self, id: &ZoneId) -> bool {
        let moved = self
            .editors
            .get_mut(id)
            .is_some_and(|editor| editor.end_shape_drag());
        if moved {
            self.touch();
        }
        moved
    }

    /// Undo the last vertex of the active polygon.
    pub fn undo(&mut self) -> bool {
        let removed = self.active_editor_mut().and_then(|editor| editor.undo());
        if removed.is_some() {
            self.touch();
        }
        removed.is_some()
    }

    /// Discard every vertex of the active polygon.
    pub fn reset_active(&mut self) -> bool {
        let Some(editor) = self.active_editor_mut() else {
            return false;
        };
        editor.reset();
        self.touch();
        true
    }

    // ------------------------------------------------------------------
    // Viewport
    // ------------------------------------------------------------------

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Surface size, or the configured placeholder while no image is sized.
    pub fn stage_size(&self) -> Size {
        if self.size.is_empty() {
            Size::new(self.config.stage_width, self.config.stage_height)
        } else {
            self.size
        }
    }

    /// Surface size as fitted to the current image (zero without one).
    pub fn surface_size(&self) -> Size {
        self.size
    }

    pub fn is_zoomed(&self) -> bool {
        self.viewport.is_zoomed()
    }

    /// Zoom around the surface centre by `factor`; `1.0` resets the view.
    pub fn zoom(&mut self, factor: f32) -> f32 {
        let surface = self.stage_size();
        let image = self.size;
        let scale = self.viewport.zoom(factor, surface, image);
        self.touch();
        scale
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.zoom(1.0 + self.config.zoom_offset)
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.zoom(1.0 - self.config.zoom_offset)
    }

    pub fn reset_zoom(&mut self) -> f32 {
        self.zoom(1.0)
    }

    // ------------------------------------------------------------------
    // Image ingestion
    // ------------------------------------------------------------------

    pub fn image(&self) -> Option<&LoadedImage> {
        self.image.as_ref()
    }

    /// Whether an upload is waiting for its decode result.
    pub fn is_ingesting(&self) -> bool {
        self.pending.is_some()
    }

    /// Validate an uploaded file and queue it for decoding.
    ///
    /// Returns the decode ticket. A newer upload supersedes one still in
    /// flight; the older result is discarded when it arrives. Once decoded,
    /// an image that replaces a loaded one discards the polygons drawn on it.
    pub fn ingest(&mut self, file: Option<ImageFile>) -> Result<u64, BoardError> {
        let max_bytes = self.config.max_file_size_bytes();
        if let Err(e) = ImageFile::validate(file.as_ref(), max_bytes) {
            log::warn!("Rejected upload: {}", e);
            return Err(e.into());
        }
        let file = file.ok_or(IngestError::MissingFile)?;

        let sent = self.decoder()?.request_decode(file.bytes);
        let ticket = match sent {
            Ok(ticket) => ticket,
            Err(e) => {
                // Respawned on the next upload
                self.decoder = None;
                log::warn!("Rejected upload {:?}: {}", file.name, e);
                return Err(IngestError::DecoderUnavailable(e).into());
            }
        };
        log::info!("Ingesting {:?} (request {})", file.name, ticket);
        self.pending = Some(PendingIngest {
            ticket,
            reference: file.name,
        });
        Ok(ticket)
    }

    fn decoder(&mut self) -> Result<&mut ImageDecoder, IngestError> {
        if self.decoder.is_none() {
            self.decoder = Some(ImageDecoder::spawn().map_err(IngestError::DecoderUnavailable)?);
        }
        self.decoder
            .as_mut()
            .ok_or_else(|| IngestError::DecoderUnavailable("decoder not running".to_string()))
    }

    /// Apply a finished decode without blocking.
    ///
    /// Returns the fitted surface size on success, the decode error on
    /// failure, or `None` if no relevant result has arrived yet.
    pub fn poll_ingestion(&mut self) -> Option<Result<Size, DecodeError>> {
        loop {
            let result = self.decoder.as_mut()?.take_one_result()?;
            if let Some(applied) = self.apply_decode_result(result) {
                return Some(applied);
            }
        }
    }

    /// Block until the pending upload has been decoded and applied.
    ///
    /// Returns `None` when no upload is in flight.
    pub fn wait_for_ingestion(&mut self) -> Option<Result<Size, DecodeError>> {
        loop {
            let result = self.decoder.as_mut()?.wait_result()?;
            if let Some(applied) = self.apply_decode_result(result) {
                return Some(applied);
            }
        }
    }

    fn apply_decode_result(&mut self, result: DecodeResult) -> Option<Result<Size, DecodeError>> {
        let ticket = result.ticket();
        let Some(pending) = self.pending.take_if(|p| p.ticket == ticket) else {
            log::debug!("Discarding stale decode result {}", ticket);
            return None;
        };

        let decoded = match result {
            DecodeResult::Decoded(decoded) => decoded,
            DecodeResult::Error(err) => {
                log::warn!("{}", err);
                return Some(Err(err));
            }
        };

        let Some(size) =
            Size::fit_to_width(decoded.width, decoded.height, self.config.stage_width)
        else {
            let err = DecodeError {
                ticket,
                error: format!("image {:?} has no pixels", pending.reference),
            };
            log::warn!("{}", err);
            return Some(Err(err));
        };

        log::info!(
            "Loaded image {:?} ({}x{}), surface {:.0}x{:.0}",
            pending.reference,
            decoded.width,
            decoded.height,
            size.width,
            size.height
        );
        if let Some(previous) = self.image.take() {
            // Vertices live in the old surface's coordinates
            if !self.order.is_empty() {
                log::warn!(
                    "Replacing image {:?}: discarding {} polygons drawn on it",
                    previous.reference,
                    self.order.len()
                );
            }
            self.clear_polygons();
            self.metadata = SetMetadata::default();
        }
        self.image = Some(LoadedImage {
            reference: pending.reference,
            natural_width: decoded.width,
            natural_height: decoded.height,
        });
        self.size = size;
        self.viewport.reset();
        self.touch();
        Some(Ok(size))
    }

    // ------------------------------------------------------------------
    // Save / load
    // ------------------------------------------------------------------

    /// Serialize the board. Fails when no image is loaded.
    pub fn save(&self) -> Result<AnnotationSet, BoardError> {
        let Some(image) = &self.image else {
            log::warn!("Cannot save: image not found");
            return Err(BoardError::ImageNotFound);
        };

        Ok(AnnotationSet {
            id: self.metadata.id,
            name: self.metadata.name.clone(),
            description: self.metadata.description.clone(),
            image_url: image.reference.clone(),
            image_width: self.size.width,
            image_height: self.size.height,
            annotation_data: self.polygons().map(PolygonEditor::snapshot).collect(),
        })
    }

    /// Save and hand the set to `handler`.
    pub fn submit(&self, handler: &mut dyn AnnotationHandler) -> Result<AnnotationSet, BoardError> {
        let set = self.save()?;
        log::info!("Submitting {} polygons", set.len());
        handler.on_save(&set);
        Ok(set)
    }

    /// Abandon the session.
    pub fn cancel(&self, handler: &mut dyn AnnotationHandler) {
        log::info!("Annotation cancelled");
        handler.on_cancel();
    }

    /// Replace the board contents with a saved set.
    ///
    /// Polygons keep their ids; missing or duplicate ids are regenerated.
    /// The last polygon becomes active.
    pub fn load(&mut self, set: AnnotationSet) {
        self.clear_polygons();
        self.pending = None;
        self.viewport.reset();

        self.metadata = SetMetadata {
            id: set.id,
            name: set.name,
            description: set.description,
        };
        self.size = Size::new(set.image_width, set.image_height);
        self.image = if set.image_url.is_empty() {
            log::debug!("Loaded set has no image reference");
            None
        } else {
            Some(LoadedImage {
                reference: set.image_url,
                natural_width: set.image_width.round() as u32,
                natural_height: set.image_height.round() as u32,
            })
        };

        for mut data in set.annotation_data {
            if data.id.is_empty() || self.editors.contains_key(&data.id) {
                let fresh = ZoneId::generate();
                log::warn!("Polygon id {:?} is empty or duplicated, using {}", data.id.as_str(), fresh);
                data.id = fresh;
            }
            let editor = PolygonEditor::from_snapshot(data)
                .with_handle(self.config.vertex_radius, self.config.close_handle_scale);
            let id = editor.id().clone();
            self.editors.insert(id.clone(), editor);
            self.order.push(id.clone());
            self.z_order.push(id.clone());
            self.active = Some(id);
        }
        self.touch();

        log::info!(
            "Loaded {} polygons, surface {:.0}x{:.0}",
            self.order.len(),
            self.size.width,
            self.size.height
        );
    }
}

impl Default for AnnotationBoard {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}
