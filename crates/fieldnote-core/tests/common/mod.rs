//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use fieldnote_core::error::{BlobResult, StoreResult};
use fieldnote_core::types::{NewSighting, SightingPatch};
use fieldnote_core::{
    BlobError, BlobRef, BlobStore, Config, LocalBlobStore, MemoryRecordStore, RecordStore,
    Sighting, SightingId, SightingService, StoreError,
};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// A service over a temporary blob root and an in-memory record store.
pub struct Harness {
    pub dir: TempDir,
    pub config: Config,
    pub records: Arc<MemoryRecordStore>,
    pub service: SightingService,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(|_| {}, |blobs| blobs, None)
    }

    /// Wrap the blob store, e.g. to inject failures.
    pub fn with_blobs(wrap: impl FnOnce(Arc<dyn BlobStore>) -> Arc<dyn BlobStore>) -> Self {
        Self::build(|_| {}, wrap, None)
    }

    /// Commit through `records` instead of the plain memory store.
    pub fn with_records(records: Arc<dyn RecordStore>) -> Self {
        Self::build(|_| {}, |blobs| blobs, Some(records))
    }

    /// Full control: adjust the config, wrap the blob store, swap the records.
    pub fn build(
        configure: impl FnOnce(&mut Config),
        wrap: impl FnOnce(Arc<dyn BlobStore>) -> Arc<dyn BlobStore>,
        records: Option<Arc<dyn RecordStore>>,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.root = dir.path().join("files").to_string_lossy().into_owned();
        config.records.path = dir
            .path()
            .join("sightings.json")
            .to_string_lossy()
            .into_owned();
        configure(&mut config);

        let memory = Arc::new(MemoryRecordStore::new());
        let blobs = wrap(Arc::new(LocalBlobStore::from_config(&config)));
        let records = records.unwrap_or_else(|| memory.clone() as Arc<dyn RecordStore>);
        let service = SightingService::new(blobs, records, &config);

        Self {
            dir,
            config,
            records: memory,
            service,
        }
    }

    pub fn blob_path(&self, reference: &BlobRef) -> PathBuf {
        self.config.blob_root().join(reference.as_str())
    }

    pub fn blob_exists(&self, reference: &BlobRef) -> bool {
        self.blob_path(reference).is_file()
    }

    /// Number of files currently under one artifact directory.
    pub fn files_in(&self, dir: &str) -> usize {
        count_files(&self.config.blob_root().join(dir))
    }
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).count())
        .unwrap_or(0)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(DynamicImage::new_rgb8(width, height), ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(DynamicImage::new_rgb8(width, height), ImageFormat::Jpeg)
}

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

fn dms(values: [u32; 3]) -> Value {
    Value::Rational(values.iter().map(|&v| Rational::from((v, 1))).collect())
}

fn exif_field(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

fn ascii(text: &str) -> Value {
    Value::Ascii(vec![text.as_bytes().to_vec()])
}

/// A JPEG whose EXIF block carries the given GPS position.
pub fn geotagged_jpeg(lat: [u32; 3], lat_ref: &str, lng: [u32; 3], lng_ref: &str) -> Vec<u8> {
    jpeg_with_exif(&[
        exif_field(Tag::Make, ascii("fieldnote-test")),
        exif_field(Tag::GPSLatitudeRef, ascii(lat_ref)),
        exif_field(Tag::GPSLatitude, dms(lat)),
        exif_field(Tag::GPSLongitudeRef, ascii(lng_ref)),
        exif_field(Tag::GPSLongitude, dms(lng)),
    ])
}

/// A JPEG whose GPS block has a latitude but lost its longitude.
pub fn half_tagged_jpeg() -> Vec<u8> {
    jpeg_with_exif(&[
        exif_field(Tag::Make, ascii("fieldnote-test")),
        exif_field(Tag::GPSLatitudeRef, ascii("N")),
        exif_field(Tag::GPSLatitude, dms([37, 46, 30])),
    ])
}

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(DynamicImage::new_rgb8(width, height), ImageFormat::Bmp)
}

fn jpeg_with_exif(fields: &[Field]) -> Vec<u8> {
    let mut writer = Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    // APP1 segment right after SOI: marker, length, "Exif\0\0", TIFF data.
    let jpeg = jpeg_bytes(64, 48);
    let length = u16::try_from(2 + 6 + tiff.len()).unwrap();
    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Blob store whose `put` fails for references under one directory.
pub struct FailingPuts {
    pub inner: Arc<dyn BlobStore>,
    pub dir: &'static str,
}

#[async_trait]
impl BlobStore for FailingPuts {
    async fn store(&self, bytes: Bytes, suggested_name: &str) -> BlobResult<BlobRef> {
        self.inner.store(bytes, suggested_name).await
    }

    async fn put(&self, reference: &BlobRef, bytes: Bytes) -> BlobResult<()> {
        if reference.as_str().starts_with(&format!("{}/", self.dir)) {
            return Err(BlobError::Io {
                path: PathBuf::from(reference.as_str()),
                source: std::io::Error::other("disk full"),
            });
        }
        self.inner.put(reference, bytes).await
    }

    async fn read(&self, reference: &BlobRef) -> BlobResult<Bytes> {
        self.inner.read(reference).await
    }

    async fn delete(&self, reference: &BlobRef) -> BlobResult<()> {
        self.inner.delete(reference).await
    }
}

/// Blob store whose `store` never succeeds.
pub struct FailingStore {
    pub inner: Arc<dyn BlobStore>,
}

#[async_trait]
impl BlobStore for FailingStore {
    async fn store(&self, _bytes: Bytes, suggested_name: &str) -> BlobResult<BlobRef> {
        Err(BlobError::Io {
            path: PathBuf::from(suggested_name),
            source: std::io::Error::other("read-only file system"),
        })
    }

    async fn put(&self, reference: &BlobRef, bytes: Bytes) -> BlobResult<()> {
        self.inner.put(reference, bytes).await
    }

    async fn read(&self, reference: &BlobRef) -> BlobResult<Bytes> {
        self.inner.read(reference).await
    }

    async fn delete(&self, reference: &BlobRef) -> BlobResult<()> {
        self.inner.delete(reference).await
    }
}

/// Record store that refuses every write.
#[derive(Default)]
pub struct ReadOnlyRecords {
    pub inner: MemoryRecordStore,
}

impl ReadOnlyRecords {
    fn refuse() -> StoreError {
        StoreError::Io {
            path: PathBuf::from("sightings.json"),
            source: std::io::Error::other("read-only file system"),
        }
    }
}

#[async_trait]
impl RecordStore for ReadOnlyRecords {
    async fn create(&self, _new: NewSighting) -> StoreResult<Sighting> {
        Err(Self::refuse())
    }

    async fn find_by_owner(&self, owner: Option<&str>) -> StoreResult<Vec<Sighting>> {
        self.inner.find_by_owner(owner).await
    }

    async fn find_by_id(&self, id: &SightingId) -> StoreResult<Sighting> {
        self.inner.find_by_id(id).await
    }

    async fn update_by_id(&self, _id: &SightingId, _patch: SightingPatch) -> StoreResult<Sighting> {
        Err(Self::refuse())
    }

    async fn delete_by_id(&self, _id: &SightingId) -> StoreResult<Sighting> {
        Err(Self::refuse())
    }
}

/// Blob store whose `put` stalls for references under one directory.
pub struct SlowPuts {
    pub inner: Arc<dyn BlobStore>,
    pub dir: &'static str,
    pub delay: Duration,
}

#[async_trait]
impl BlobStore for SlowPuts {
    async fn store(&self, bytes: Bytes, suggested_name: &str) -> BlobResult<BlobRef> {
        self.inner.store(bytes, suggested_name).await
    }

    async fn put(&self, reference: &BlobRef, bytes: Bytes) -> BlobResult<()> {
        if reference.as_str().starts_with(&format!("{}/", self.dir)) {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.put(reference, bytes).await
    }

    async fn read(&self, reference: &BlobRef) -> BlobResult<Bytes> {
        self.inner.read(reference).await
    }

    async fn delete(&self, reference: &BlobRef) -> BlobResult<()> {
        self.inner.delete(reference).await
    }
}

/// Record store that takes `delay` before every create.
pub struct SlowRecords {
    pub inner: Arc<dyn RecordStore>,
    pub delay: Duration,
}

#[async_trait]
impl RecordStore for SlowRecords {
    async fn create(&self, new: NewSighting) -> StoreResult<Sighting> {
        tokio::time::sleep(self.delay).await;
        self.inner.create(new).await
    }

    async fn find_by_owner(&self, owner: Option<&str>) -> StoreResult<Vec<Sighting>> {
        self.inner.find_by_owner(owner).await
    }

    async fn find_by_id(&self, id: &SightingId) -> StoreResult<Sighting> {
        self.inner.find_by_id(id).await
    }

    async fn update_by_id(&self, id: &SightingId, patch: SightingPatch) -> StoreResult<Sighting> {
        self.inner.update_by_id(id, patch).await
    }

    async fn delete_by_id(&self, id: &SightingId) -> StoreResult<Sighting> {
        self.inner.delete_by_id(id).await
    }
}
