//! The annotation set: image reference plus every polygon, the unit of save/load.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::format::error::FormatError;
use crate::model::PolygonData;

/// Serialized bundle of an image reference and its polygons.
///
/// `image_width`/`image_height` are the dimensions of the surface the
/// vertices were drawn on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationSet {
    /// Host-assigned record id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Reference to the annotated image
    pub image_url: String,

    /// Older files spell this `imageWith`
    #[serde(alias = "imageWith")]
    pub image_width: f32,

    pub image_height: f32,

    /// Polygon snapshots in board order
    #[serde(default)]
    pub annotation_data: Vec<PolygonData>,
}

impl AnnotationSet {
    /// Create an empty set for an image.
    pub fn new(image_url: impl Into<String>, image_width: f32, image_height: f32) -> Self {
        Self {
            id: None,
            name: None,
            description: None,
            image_url: image_url.into(),
            image_width,
            image_height,
            annotation_data: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.annotation_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotation_data.is_empty()
    }

    /// Serialize with pretty printing.
    pub fn to_json(&self) -> Result<String, FormatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a set.
    pub fn from_json(json: &str) -> Result<Self, FormatError> {
        let set: Self = serde_json::from_str(json)?;
        set.validate()?;
        Ok(set)
    }

    /// Read a set from a JSON file.
    pub fn read(path: &Path) -> Result<Self, FormatError> {
        log::info!("Reading annotation set from {:?}", path);
        let json = std::fs::read_to_string(path)?;
        let set = Self::from_json(&json)?;
        log::info!("Read {} polygons for image {:?}", set.len(), set.image_url);
        Ok(set)
    }

    /// Write the set to a JSON file.
    pub fn write(&self, path: &Path) -> Result<(), FormatError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Wrote {} polygons to {:?}", self.len(), path);
        Ok(())
    }

    /// Reject sets whose surface dimensions cannot be rendered.
    fn validate(&self) -> Result<(), FormatError> {
        for (name, value) in [("imageWidth", self.image_width), ("imageHeight", self.image_height)] {
            if !value.is_finite() || value < 0.0 {
                return Err(FormatError::invalid_format(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
