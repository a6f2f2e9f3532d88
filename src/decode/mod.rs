//! Image ingestion: file validation and background decoding.
//!
//! Decoding runs on a dedicated thread so the event loop never blocks on a
//! large image. Results are polled by the board, one at a time.

mod decoder;
mod file;

pub use decoder::{DecodeError, DecodeResult, DecodedImage, ImageDecoder};
pub use file::{ImageFile, IngestError, ACCEPTED_EXTENSIONS, ACCEPTED_MIME_TYPES};
