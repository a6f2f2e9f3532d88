//! Annotation-set serialization.
//!
//! An [`AnnotationSet`] is what the board produces on save and consumes on
//! load. It is written as camelCase JSON:
//!
//! ```json
//! {
//!   "imageUrl": "parking-lot.png",
//!   "imageWidth": 800.0,
//!   "imageHeight": 450.0,
//!   "annotationData": [
//!     { "id": "…", "zoneType": "PARKING", "vertices": [[10, 10], [50, 10], [30, 40]],
//!       "complete": true, "locked": false }
//!   ]
//! }
//! ```

mod annotation_set;
mod error;

#[cfg(test)]
mod tests;

pub use annotation_set::AnnotationSet;
pub use error::FormatError;
