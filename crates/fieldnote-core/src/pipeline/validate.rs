//! Upload validation before any stage runs.

use crate::config::LimitsConfig;
use crate::error::PipelineError;
use crate::types::Upload;

/// Validates uploads before the pipeline touches storage.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Perform quick validation before storing anything.
    ///
    /// Checks:
    /// - Payload is not empty
    /// - Payload size is within limits
    /// - Payload has valid image magic bytes
    pub fn validate(&self, upload: &Upload) -> Result<(), PipelineError> {
        let invalid = |message: String| PipelineError::Validation {
            name: upload.file_name.clone(),
            message,
        };

        if upload.bytes.is_empty() {
            return Err(invalid("no file data".to_string()));
        }

        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        let len = upload.bytes.len() as u64;
        if len > max_bytes {
            return Err(invalid(format!(
                "file too large ({}MB > {}MB)",
                len / (1024 * 1024),
                self.limits.max_file_size_mb
            )));
        }

        if !Self::is_valid_image_header(&upload.bytes) {
            return Err(invalid(
                "unrecognized image format (invalid magic bytes)".to_string(),
            ));
        }

        Ok(())
    }

    /// Check if the leading bytes match known image formats.
    fn is_valid_image_header(header: &[u8]) -> bool {
        if header.len() < 4 {
            return false;
        }

        // JPEG: FF D8 FF
        if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return true;
        }

        // PNG: 89 50 4E 47
        if header.starts_with(&[0x89, b'P', b'N', b'G']) {
            return true;
        }

        // GIF: GIF8
        if header.starts_with(b"GIF8") {
            return true;
        }

        // WebP: RIFF....WEBP
        if header.starts_with(b"RIFF") {
            return header.len() >= 12 && &header[8..12] == b"WEBP";
        }

        // BMP: BM
        if header.starts_with(b"BM") {
            return true;
        }

        // TIFF: II (little-endian) or MM (big-endian) followed by version 42
        if header.starts_with(&[b'I', b'I', 0x2A, 0x00]) || header.starts_with(&[b'M', b'M', 0x00, 0x2A])
        {
            return true;
        }

        // HEIC/HEIF/AVIF: ftyp box at offset 4
        header.len() >= 12 && &header[4..8] == b"ftyp"
    }
}
