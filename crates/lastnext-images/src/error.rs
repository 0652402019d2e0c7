use lastnext_storages::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors raised while normalizing or storing an image.
///
/// Everything except [`ImageError::Storage`] is a processing error: the
/// upload itself is unusable and callers log it and carry on without the
/// image.
#[derive(Debug, Error)]
pub enum ImageError {
	#[error("Upload has no file extension: {0:?}")]
	MissingExtension(String),

	#[error("Unsupported image extension {extension:?}, allowed: png, jpg, jpeg, gif, webp")]
	UnsupportedExtension { extension: String },

	#[error("Failed to decode image: {0}")]
	Decode(String),

	#[error("Failed to encode image: {0}")]
	Encode(String),

	#[error("Image worker failed: {0}")]
	Worker(String),

	#[error(transparent)]
	Storage(#[from] StorageError),
}

impl ImageError {
	/// Whether the upload itself was at fault.
	pub fn is_processing(&self) -> bool {
		!matches!(self, ImageError::Storage(_))
	}
}
