//! Uploaded image files and their validation.

use std::path::Path;

use thiserror::Error;

/// MIME types accepted for upload.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/png", "image/jpg", "image/jpeg", "image/webp"];

/// File extensions accepted for upload.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Reasons an upload is rejected before decoding.
#[derive(Error, Debug)]
pub enum IngestError {
    /// No file was selected, or it is empty
    #[error("File is empty")]
    MissingFile,

    /// File is not one of the accepted image types
    #[error("File '{name}' is not a supported image (PNG, JPG, WebP)")]
    NotAnImage {
        /// Name of the rejected file
        name: String,
    },

    /// File exceeds the configured size limit
    #[error("File is too large: {size} bytes (limit {limit} bytes)")]
    TooLarge {
        /// Size of the rejected file in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },

    /// Reading the file from disk failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The background decoder could not be started
    #[error("Image decoder unavailable: {0}")]
    DecoderUnavailable(String),
}

/// A raw file handed to the board for ingestion.
#[derive(Debug, Clone)]
pub struct ImageFile {
    /// File name or reference, recorded as the image reference once decoded
    pub name: String,
    /// MIME type reported by the host, if any
    pub mime_type: Option<String>,
    /// File contents
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Create a file from a name and its contents; the MIME type is guessed from the extension.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_from_name(&name).map(str::to_string);
        Self {
            name,
            mime_type,
            bytes,
        }
    }

    /// Override the MIME type reported by the host.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Read a file from disk.
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let bytes = std::fs::read(path)?;
        Ok(Self::new(path.to_string_lossy(), bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the file looks like an accepted image.
    ///
    /// A declared MIME type wins; otherwise the extension and then the
    /// magic bytes decide.
    pub fn is_image(&self) -> bool {
        if let Some(mime) = &self.mime_type {
            return ACCEPTED_MIME_TYPES.contains(&mime.to_ascii_lowercase().as_str());
        }
        extension(&self.name).is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
            || has_image_magic(&self.bytes)
    }

    /// Check the file against the upload rules.
    pub fn validate(file: Option<&ImageFile>, max_bytes: u64) -> Result<&ImageFile, IngestError> {
        let file = file.ok_or(IngestError::MissingFile)?;
        if file.bytes.is_empty() {
            return Err(IngestError::MissingFile);
        }
        if !file.is_image() {
            return Err(IngestError::NotAnImage {
                name: file.name.clone(),
            });
        }
        if file.size() > max_bytes {
            return Err(IngestError::TooLarge {
                size: file.size(),
                limit: max_bytes,
            });
        }
        Ok(file)
    }
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

fn mime_from_name(name: &str) -> Option<&'static str> {
    match extension(name)?.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Check the magic bytes of the accepted formats.
fn has_image_magic(data: &[u8]) -> bool {
    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return true;
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return true;
    }

    // WebP: RIFF....WEBP
    data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP"
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_mime_guessed_from_extension() {
        let file = ImageFile::new("photo.JPG", vec![1, 2, 3]);
        assert_eq!(file.mime_type.as_deref(), Some("image/jpeg"));
        assert!(file.is_image());
    }

    #[test]
    fn test_magic_detection_without_extension() {
        let file = ImageFile::new("upload", PNG_MAGIC.to_vec());
        assert!(file.mime_type.is_none());
        assert!(file.is_image());

        let file = ImageFile::new("upload", b"plain text".to_vec());
        assert!(!file.is_image());
    }

    #[test]
    fn test_declared_mime_wins() {
        let file = ImageFile::new("scan.png", PNG_MAGIC.to_vec()).with_mime_type("application/pdf");
        assert!(!file.is_image());
    }

    #[test]
    fn test_validate_missing() {
        assert!(matches!(
            ImageFile::validate(None, 1024),
            Err(IngestError::MissingFile)
        ));
        let empty = ImageFile::new("a.png", Vec::new());
        assert!(matches!(
            ImageFile::validate(Some(&empty), 1024),
            Err(IngestError::MissingFile)
        ));
    }

    #[test]
    fn test_validate_type_and_size() {
        let text = ImageFile::new("notes.txt", b"hello".to_vec());
        assert!(matches!(
            ImageFile::validate(Some(&text), 1024),
            Err(IngestError::NotAnImage { .. })
        ));

        let big = ImageFile::new("big.png", vec![0; 2048]);
        assert!(matches!(
            ImageFile::validate(Some(&big), 1024),
            Err(IngestError::TooLarge {
                size: 2048,
                limit: 1024
            })
        ));

        let ok = ImageFile::new("ok.png", PNG_MAGIC.to_vec());
        assert!(ImageFile::validate(Some(&ok), 1024).is_ok());
    }
}
