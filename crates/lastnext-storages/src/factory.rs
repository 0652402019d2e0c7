//! Factory function for creating storage backends.

use crate::{Result, StorageBackend, StorageConfig};
use std::sync::Arc;

/// Create a storage backend from configuration.
///
/// # Examples
///
/// ```rust,no_run
/// use lastnext_storages::{create_storage, MemoryConfig, StorageConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let storage = create_storage(StorageConfig::Memory(MemoryConfig::default())).await?;
///     storage.save("hello.txt", b"hi").await?;
///     Ok(())
/// }
/// ```
pub async fn create_storage(config: StorageConfig) -> Result<Arc<dyn StorageBackend>> {
	match config {
		#[cfg(feature = "local")]
		StorageConfig::Local(local_config) => {
			let storage = crate::backends::local::LocalStorage::new(local_config).await?;
			Ok(Arc::new(storage))
		}
		StorageConfig::Memory(memory_config) => Ok(Arc::new(
			crate::backends::memory::MemoryStorage::new(memory_config),
		)),
	}
}
