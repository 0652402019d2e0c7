//! Pipeline integration tests against the in-memory backend.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use lastnext_images::{ImageError, ImageKind, ImagePipeline, UploadedFile};
use lastnext_storages::{MemoryConfig, MemoryStorage, StorageBackend};
use rstest::{fixture, rstest};
use std::io::Cursor;
use std::sync::Arc;

struct Harness {
	storage: Arc<MemoryStorage>,
	pipeline: ImagePipeline,
}

#[fixture]
fn harness() -> Harness {
	let storage = Arc::new(MemoryStorage::new(MemoryConfig::default()));
	let pipeline = ImagePipeline::new(storage.clone());
	Harness { storage, pipeline }
}

fn png(width: u32, height: u32) -> Vec<u8> {
	let img = RgbaImage::from_pixel(width, height, Rgba([10, 120, 30, 128]));
	let mut out = Cursor::new(Vec::new());
	DynamicImage::ImageRgba8(img)
		.write_to(&mut out, ImageFormat::Png)
		.unwrap();
	out.into_inner()
}

#[rstest]
#[tokio::test]
async fn test_job_image_stored_under_category(harness: Harness) {
	let upload = UploadedFile::new("sink.png", png(1000, 400));

	let stored = harness.pipeline.ingest(&upload, ImageKind::Job).await.unwrap();

	assert!(stored.name.starts_with("maintenance_job_images/"));
	assert!(stored.name.ends_with(".jpg"));
	assert_eq!(stored.url, format!("/media/{}", stored.name));
	assert_eq!(stored.width, 800);
	assert_eq!(harness.storage.names().await, vec![stored.name.clone()]);
}

#[rstest]
#[tokio::test]
async fn test_profile_image_is_webp(harness: Harness) {
	let upload = UploadedFile::new("me.webp", png(50, 50));

	let stored = harness.pipeline.ingest(&upload, ImageKind::Profile).await.unwrap();

	assert!(stored.name.starts_with("profile_images/"));
	let bytes = harness.storage.open(&stored.name).await.unwrap();
	assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::WebP);
}

#[rstest]
#[tokio::test]
async fn test_processing_error_stores_nothing(harness: Harness) {
	let upload = UploadedFile::new("notes.txt", png(10, 10));

	let err = harness.pipeline.ingest(&upload, ImageKind::Job).await.unwrap_err();

	assert!(err.is_processing());
	assert!(matches!(err, ImageError::UnsupportedExtension { .. }));
	assert!(harness.storage.is_empty().await);
}

#[rstest]
#[tokio::test]
async fn test_discard_tolerates_missing_file(harness: Harness) {
	let upload = UploadedFile::new("a.png", png(10, 10));
	let stored = harness.pipeline.ingest(&upload, ImageKind::Job).await.unwrap();

	harness.pipeline.discard(&stored.name).await.unwrap();
	harness.pipeline.discard(&stored.name).await.unwrap();

	assert!(harness.storage.is_empty().await);
}
