//! Local filesystem blob store.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{BlobRef, BlobStore};
use crate::config::Config;
use crate::error::{BlobError, BlobResult};

/// Retries when another process already claimed a generated name.
const MAX_NAME_ATTEMPTS: usize = 16;

/// Blob store rooted at a local directory.
///
/// New originals are named `<stamp>.<ext>` where `stamp` is a microsecond
/// timestamp forced strictly increasing per store, so concurrent uploads
/// never share a name. Files are opened create-new as a second guard.
pub struct LocalBlobStore {
    root: PathBuf,
    original_dir: String,
    last_stamp: AtomicU64,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, original_dir: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            original_dir: original_dir.into(),
            last_stamp: AtomicU64::new(0),
        }
    }

    /// Build from the `[storage]` section of the config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.blob_root(), config.storage.original_dir.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, reference: &BlobRef) -> BlobResult<PathBuf> {
        reference.check()?;
        Ok(self.root.join(reference.as_str()))
    }

    fn next_stamp(&self) -> u64 {
        let now = Utc::now().timestamp_micros().max(0) as u64;
        let mut prev = self.last_stamp.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self.last_stamp.compare_exchange_weak(
                prev,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    async fn ensure_parent(path: &Path) -> BlobResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| io_error(parent, e))?;
        }
        Ok(())
    }

    async fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<bool> {
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e),
        };
        let written = async {
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            drop(file);
            let _ = fs::remove_file(path).await;
            return Err(e);
        }
        Ok(true)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> BlobError {
    BlobError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Extension worth keeping from a client-side file name.
fn clean_extension(suggested_name: &str) -> Option<String> {
    Path::new(suggested_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, bytes: Bytes, suggested_name: &str) -> BlobResult<BlobRef> {
        let ext = clean_extension(suggested_name);

        for _ in 0..MAX_NAME_ATTEMPTS {
            let stamp = self.next_stamp();
            let name = match &ext {
                Some(ext) => format!("{stamp}.{ext}"),
                None => stamp.to_string(),
            };
            let reference = BlobRef::join(&self.original_dir, &name);
            let path = self.full_path(&reference)?;
            Self::ensure_parent(&path).await?;

            if Self::write_new(&path, &bytes)
                .await
                .map_err(|e| io_error(&path, e))?
            {
                tracing::debug!("Stored {} ({} bytes)", reference, bytes.len());
                return Ok(reference);
            }
            tracing::trace!("Name {} already taken, retrying", reference);
        }

        Err(io_error(
            &self.root.join(&self.original_dir),
            std::io::Error::new(ErrorKind::AlreadyExists, "no free blob name"),
        ))
    }

    async fn put(&self, reference: &BlobRef, bytes: Bytes) -> BlobResult<()> {
        let path = self.full_path(reference)?;
        Self::ensure_parent(&path).await?;

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| io_error(&path, e))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| io_error(&path, e))?;
        file.sync_all().await.map_err(|e| io_error(&path, e))?;

        tracing::debug!("Wrote {} ({} bytes)", reference, bytes.len());
        Ok(())
    }

    async fn read(&self, reference: &BlobRef) -> BlobResult<Bytes> {
        let path = self.full_path(reference)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlobError::NotFound(reference.clone())),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    async fn delete(&self, reference: &BlobRef) -> BlobResult<()> {
        let path = self.full_path(reference)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("Deleted {}", reference);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlobError::NotFound(reference.clone())),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_clean_extension() {
        assert_eq!(clean_extension("photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(clean_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(clean_extension("noext"), None);
        assert_eq!(clean_extension("weird.j?g"), None);
    }

    #[test]
    fn test_stamps_strictly_increase() {
        let store = LocalBlobStore::new("/unused", "original");
        let a = store.next_stamp();
        let b = store.next_stamp();
        let c = store.next_stamp();
        assert!(a < b && b < c);
    }

    #[tokio::test]
    async fn test_store_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "original");

        let reference = store
            .store(Bytes::from_static(b"payload"), "photo.jpg")
            .await
            .unwrap();
        assert!(reference.as_str().starts_with("original/"));
        assert_eq!(reference.extension().as_deref(), Some("jpg"));
        assert!(dir.path().join(reference.as_str()).exists());

        let bytes = store.read(&reference).await.unwrap();
        assert_eq!(&bytes[..], b"payload");

        store.delete(&reference).await.unwrap();
        assert!(matches!(
            store.read(&reference).await,
            Err(BlobError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(&reference).await,
            Err(BlobError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_stores_get_distinct_refs() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalBlobStore::new(dir.path(), "original"));

        let mut handles = Vec::new();
        for i in 0..32u8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.store(Bytes::from(vec![i; 8]), "same.png").await
            }));
        }

        let mut refs = HashSet::new();
        for handle in handles {
            refs.insert(handle.await.unwrap().unwrap());
        }
        assert_eq!(refs.len(), 32);
    }

    #[tokio::test]
    async fn test_put_overwrites_and_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "original");
        let reference = BlobRef::new("thumb/1.png");

        store.put(&reference, Bytes::from_static(b"one")).await.unwrap();
        store.put(&reference, Bytes::from_static(b"two")).await.unwrap();
        assert_eq!(&store.read(&reference).await.unwrap()[..], b"two");
    }

    #[tokio::test]
    async fn test_rejects_escaping_reference() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "original");
        let err = store.read(&BlobRef::new("../secret")).await.unwrap_err();
        assert!(matches!(err, BlobError::InvalidReference(_)));
    }
}
