//! # lastnext-images
//!
//! The image normalization pipeline applied to every uploaded picture.
//!
//! An upload is checked for an allowed extension, decoded, flattened onto a
//! white background when it carries transparency, converted to 8-bit RGB,
//! downscaled to fit the bound of its [`ImageKind`] and re-encoded. The
//! result is written through a [`StorageBackend`](lastnext_storages::StorageBackend)
//! under `<category>/<YYYY>/<MM>/<random>.<ext>`.
//!
//! | Kind | Category | Bound | Format |
//! |---|---|---|---|
//! | [`ImageKind::Job`] | `maintenance_job_images` | 800×800 | JPEG |
//! | [`ImageKind::Profile`] | `profile_images` | 300×300 | WEBP |
//!
//! ```rust,no_run
//! use lastnext_images::{ImageKind, ImagePipeline, UploadedFile};
//! use lastnext_storages::{MemoryConfig, MemoryStorage};
//! use std::sync::Arc;
//!
//! # async fn run(bytes: Vec<u8>) -> Result<(), lastnext_images::ImageError> {
//! let pipeline = ImagePipeline::new(Arc::new(MemoryStorage::new(MemoryConfig::default())));
//! let upload = UploadedFile::new("leak.png", bytes);
//! let stored = pipeline.ingest(&upload, ImageKind::Job).await?;
//! println!("{} -> {}", stored.name, stored.url);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod kind;
pub mod naming;
pub mod normalize;
pub mod pipeline;
pub mod upload;

pub use error::{ImageError, Result};
pub use kind::{ImageKind, ImageSpec, OutputFormat};
pub use naming::upload_path;
pub use normalize::{ALLOWED_EXTENSIONS, NormalizedImage, normalize, validate_extension};
pub use pipeline::{ImagePipeline, StoredImage};
pub use upload::UploadedFile;
