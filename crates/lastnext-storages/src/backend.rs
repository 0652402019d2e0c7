//! Storage backend trait definition.

use crate::{Result, StorageError};
use async_trait::async_trait;
use std::path::{Component, Path};

/// Storage backend trait for media files.
///
/// Names are relative, `/`-separated paths such as
/// `maintenance_job_images/2024/05/Ab3dE6gH9jK1.jpg`. Backends reject names
/// that are empty, absolute, or contain `..` components.
///
/// # Examples
///
/// ```rust,no_run
/// use lastnext_storages::{StorageBackend, Result};
///
/// async fn example(storage: &dyn StorageBackend) -> Result<()> {
///     storage.save("example.txt", b"Hello, world!").await?;
///
///     if storage.exists("example.txt").await? {
///         let size = storage.size("example.txt").await?;
///         println!("File size: {} bytes", size);
///     }
///
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
	/// Save a file, creating intermediate directories as needed.
	///
	/// Returns the stored name. An existing file with the same name is
	/// overwritten.
	///
	/// # Errors
	///
	/// Returns `StorageError::InvalidName` for names outside the storage root.
	async fn save(&self, name: &str, content: &[u8]) -> Result<String>;

	/// Read a file.
	///
	/// # Errors
	///
	/// Returns `StorageError::NotFound` if the file doesn't exist.
	async fn open(&self, name: &str) -> Result<Vec<u8>>;

	/// Delete a file.
	///
	/// # Errors
	///
	/// Returns `StorageError::NotFound` if the file doesn't exist.
	async fn delete(&self, name: &str) -> Result<()>;

	/// Check if a file exists.
	async fn exists(&self, name: &str) -> Result<bool>;

	/// Public URL under which the file is served.
	///
	/// # Errors
	///
	/// Returns `StorageError::NotFound` if the file doesn't exist.
	async fn url(&self, name: &str) -> Result<String>;

	/// File size in bytes.
	///
	/// # Errors
	///
	/// Returns `StorageError::NotFound` if the file doesn't exist.
	async fn size(&self, name: &str) -> Result<u64>;
}

/// Reject names that are empty, absolute or climb out of the storage root.
pub(crate) fn validate_name(name: &str) -> Result<()> {
	if name.is_empty() {
		return Err(StorageError::InvalidName(name.to_string()));
	}

	let path = Path::new(name);
	let escapes = path.components().any(|component| {
		!matches!(component, Component::Normal(_) | Component::CurDir)
	});

	if escapes {
		return Err(StorageError::InvalidName(name.to_string()));
	}

	Ok(())
}

/// Join a base URL and a stored name with exactly one separator.
pub(crate) fn join_url(base_url: &str, name: &str) -> String {
	format!(
		"{}/{}",
		base_url.trim_end_matches('/'),
		name.trim_start_matches('/')
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("photo.jpg")]
	#[case("maintenance_job_images/2024/05/abc.jpg")]
	#[case("./nested/file.webp")]
	fn test_validate_name_accepts_relative(#[case] name: &str) {
		assert!(validate_name(name).is_ok());
	}

	#[rstest]
	#[case("")]
	#[case("/etc/passwd")]
	#[case("../outside.txt")]
	#[case("nested/../../outside.txt")]
	fn test_validate_name_rejects_escape(#[case] name: &str) {
		assert!(matches!(
			validate_name(name),
			Err(StorageError::InvalidName(_))
		));
	}

	#[rstest]
	#[case("/media", "a/b.jpg", "/media/a/b.jpg")]
	#[case("/media/", "a/b.jpg", "/media/a/b.jpg")]
	#[case("https://cdn.example.com/media/", "/x.webp", "https://cdn.example.com/media/x.webp")]
	fn test_join_url(#[case] base: &str, #[case] name: &str, #[case] expected: &str) {
		assert_eq!(join_url(base, name), expected);
	}
}
