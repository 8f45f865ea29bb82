//! Blob storage for original images and their derivatives.
//!
//! - **BlobRef**: opaque, relative `/`-separated reference into a store
//! - **BlobStore**: async storage trait used by the pipeline
//! - **LocalBlobStore**: filesystem implementation

mod local;

pub use local::LocalBlobStore;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BlobError, BlobResult};

/// Reference to bytes held in a [`BlobStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(String);

impl BlobRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Build `dir/name`.
    pub fn join(dir: &str, name: &str) -> Self {
        Self(format!("{}/{}", dir.trim_end_matches('/'), name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Lowercased extension of the final segment, if any.
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Reference to the file of the same name under another directory.
    pub fn sibling_in(&self, dir: &str) -> Self {
        Self::join(dir, self.file_name())
    }

    /// Reject references that would escape the store root.
    pub fn check(&self) -> BlobResult<()> {
        let valid = !self.0.is_empty()
            && !self.0.starts_with('/')
            && !self.0.contains('\\')
            && self
                .0
                .split('/')
                .all(|seg| !seg.is_empty() && seg != "." && seg != "..");
        if valid {
            Ok(())
        } else {
            Err(BlobError::InvalidReference(self.0.clone()))
        }
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage for raw image bytes.
///
/// Writes must be durable before the call returns. The store does not know
/// which records reference its blobs; the pipeline keeps the two consistent.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store new bytes under a freshly generated, collision-free reference.
    ///
    /// Only the extension of `suggested_name` is kept.
    async fn store(&self, bytes: Bytes, suggested_name: &str) -> BlobResult<BlobRef>;

    /// Write bytes at a caller-chosen reference, replacing any previous blob.
    async fn put(&self, reference: &BlobRef, bytes: Bytes) -> BlobResult<()>;

    /// Read the bytes at a reference.
    async fn read(&self, reference: &BlobRef) -> BlobResult<Bytes>;

    /// Remove the blob at a reference. Fails with `NotFound` if absent.
    async fn delete(&self, reference: &BlobRef) -> BlobResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_keeps_file_name() {
        let original = BlobRef::new("original/1718000000123456.jpg");
        assert_eq!(
            original.sibling_in("thumb").as_str(),
            "thumb/1718000000123456.jpg"
        );
        assert_eq!(original.file_name(), "1718000000123456.jpg");
    }

    #[test]
    fn test_extension() {
        assert_eq!(BlobRef::new("original/1.JPG").extension().as_deref(), Some("jpg"));
        assert_eq!(BlobRef::new("original/1").extension(), None);
        assert_eq!(BlobRef::new("original/.hidden").extension(), None);
    }

    #[test]
    fn test_check_rejects_escapes() {
        assert!(BlobRef::new("original/1.jpg").check().is_ok());
        assert!(BlobRef::new("../etc/passwd").check().is_err());
        assert!(BlobRef::new("/abs/path.jpg").check().is_err());
        assert!(BlobRef::new("img//1.jpg").check().is_err());
        assert!(BlobRef::new("").check().is_err());
    }
}
