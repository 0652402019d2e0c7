//! Normalize uploads and hand them to a storage backend.

use chrono::Utc;
use lastnext_storages::{StorageBackend, StorageError};
use std::sync::Arc;

use crate::error::{ImageError, Result};
use crate::kind::ImageKind;
use crate::naming::upload_path;
use crate::normalize::normalize;
use crate::upload::UploadedFile;

/// A normalized image written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
	/// Storage name, e.g. `maintenance_job_images/2024/05/Ab3dE6gH9jK1.jpg`
	pub name: String,
	/// Public URL of the stored file
	pub url: String,
	pub width: u32,
	pub height: u32,
}

#[derive(Clone)]
pub struct ImagePipeline {
	storage: Arc<dyn StorageBackend>,
}

impl ImagePipeline {
	pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
		Self { storage }
	}

	pub fn storage(&self) -> &Arc<dyn StorageBackend> {
		&self.storage
	}

	/// Normalize `upload` for `kind` and store the result.
	///
	/// # Errors
	///
	/// Processing errors ([`ImageError::is_processing`]) when the upload is
	/// not a usable image; [`ImageError::Storage`] when writing fails.
	pub async fn ingest(&self, upload: &UploadedFile, kind: ImageKind) -> Result<StoredImage> {
		let owned = upload.clone();
		let normalized = tokio::task::spawn_blocking(move || normalize(&owned, kind))
			.await
			.map_err(|e| ImageError::Worker(e.to_string()))??;

		let name = upload_path(&kind.spec(), Utc::now());
		let name = self.storage.save(&name, &normalized.data).await?;
		let url = self.storage.url(&name).await?;

		tracing::debug!(
			"Stored {} ({}x{}) from upload {}",
			name,
			normalized.width,
			normalized.height,
			upload.filename
		);

		Ok(StoredImage {
			name,
			url,
			width: normalized.width,
			height: normalized.height,
		})
	}

	/// Remove a stored image. A file that is already gone is not an error.
	pub async fn discard(&self, name: &str) -> Result<()> {
		match self.storage.delete(name).await {
			Ok(()) => Ok(()),
			Err(StorageError::NotFound(_)) => {
				tracing::debug!("Image {} already removed", name);
				Ok(())
			}
			Err(e) => Err(e.into()),
		}
	}

	/// Public URL for a stored name.
	pub async fn url(&self, name: &str) -> Result<String> {
		Ok(self.storage.url(name).await?)
	}

	/// Public URL for a stored name, or `None` when the backend cannot
	/// resolve it (for instance the file was removed out of band).
	pub async fn url_if_stored(&self, name: &str) -> Option<String> {
		match self.storage.url(name).await {
			Ok(url) => Some(url),
			Err(e) => {
				tracing::debug!("No URL for {}: {}", name, e);
				None
			}
		}
	}
}
