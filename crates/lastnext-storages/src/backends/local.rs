//! Local file system storage backend implementation.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

use crate::backend::{join_url, validate_name};
use crate::config::LocalConfig;
use crate::{Result, StorageBackend, StorageError};

/// Local file system storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
	base_path: PathBuf,
	base_url: String,
}

impl LocalStorage {
	/// Create a new local storage backend.
	///
	/// # Errors
	///
	/// Returns `StorageError::ConfigError` if the base path is missing (and
	/// creation is disabled) or is not a directory.
	pub async fn new(config: LocalConfig) -> Result<Self> {
		let base_path = PathBuf::from(&config.base_path);

		if !base_path.exists() {
			if config.create_base_path {
				fs::create_dir_all(&base_path).await?;
				tracing::info!("Created media directory {}", base_path.display());
			} else {
				return Err(StorageError::ConfigError(format!(
					"Base path does not exist: {}",
					base_path.display()
				)));
			}
		}

		if !base_path.is_dir() {
			return Err(StorageError::ConfigError(format!(
				"Base path is not a directory: {}",
				base_path.display()
			)));
		}

		Ok(Self {
			base_path,
			base_url: config.base_url,
		})
	}

	/// Base directory of this backend.
	pub fn base_path(&self) -> &std::path::Path {
		&self.base_path
	}

	/// Get the full file path.
	fn get_path(&self, name: &str) -> Result<PathBuf> {
		validate_name(name)?;
		Ok(self.base_path.join(name))
	}
}

#[async_trait]
impl StorageBackend for LocalStorage {
	async fn save(&self, name: &str, content: &[u8]) -> Result<String> {
		let path = self.get_path(name)?;

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).await?;
		}

		fs::write(&path, content).await?;

		Ok(name.to_string())
	}

	async fn open(&self, name: &str) -> Result<Vec<u8>> {
		let path = self.get_path(name)?;

		if !path.is_file() {
			return Err(StorageError::NotFound(name.to_string()));
		}

		let content = fs::read(&path).await?;
		Ok(content)
	}

	async fn delete(&self, name: &str) -> Result<()> {
		let path = self.get_path(name)?;

		if !path.is_file() {
			return Err(StorageError::NotFound(name.to_string()));
		}

		fs::remove_file(&path).await?;
		Ok(())
	}

	async fn exists(&self, name: &str) -> Result<bool> {
		let path = self.get_path(name)?;
		Ok(path.is_file())
	}

	async fn url(&self, name: &str) -> Result<String> {
		let path = self.get_path(name)?;

		if !path.is_file() {
			return Err(StorageError::NotFound(name.to_string()));
		}

		Ok(join_url(&self.base_url, name))
	}

	async fn size(&self, name: &str) -> Result<u64> {
		let path = self.get_path(name)?;

		if !path.is_file() {
			return Err(StorageError::NotFound(name.to_string()));
		}

		let metadata = fs::metadata(&path).await?;
		Ok(metadata.len())
	}
}
