//! In-memory storage backend.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::backend::{join_url, validate_name};
use crate::config::MemoryConfig;
use crate::{Result, StorageBackend, StorageError};

/// Storage backend that keeps every file in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
	base_url: String,
	files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
	pub fn new(config: MemoryConfig) -> Self {
		Self {
			base_url: config.base_url,
			files: RwLock::new(HashMap::new()),
		}
	}

	/// Names of all stored files, sorted.
	pub async fn names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.files.read().await.keys().cloned().collect();
		names.sort();
		names
	}

	/// Number of stored files.
	pub async fn len(&self) -> usize {
		self.files.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.files.read().await.is_empty()
	}
}

#[async_trait]
impl StorageBackend for MemoryStorage {
	async fn save(&self, name: &str, content: &[u8]) -> Result<String> {
		validate_name(name)?;
		self.files
			.write()
			.await
			.insert(name.to_string(), content.to_vec());
		Ok(name.to_string())
	}

	async fn open(&self, name: &str) -> Result<Vec<u8>> {
		validate_name(name)?;
		self.files
			.read()
			.await
			.get(name)
			.cloned()
			.ok_or_else(|| StorageError::NotFound(name.to_string()))
	}

	async fn delete(&self, name: &str) -> Result<()> {
		validate_name(name)?;
		self.files
			.write()
			.await
			.remove(name)
			.map(|_| ())
			.ok_or_else(|| StorageError::NotFound(name.to_string()))
	}

	async fn exists(&self, name: &str) -> Result<bool> {
		validate_name(name)?;
		Ok(self.files.read().await.contains_key(name))
	}

	async fn url(&self, name: &str) -> Result<String> {
		if !self.exists(name).await? {
			return Err(StorageError::NotFound(name.to_string()));
		}
		Ok(join_url(&self.base_url, name))
	}

	async fn size(&self, name: &str) -> Result<u64> {
		validate_name(name)?;
		self.files
			.read()
			.await
			.get(name)
			.map(|content| content.len() as u64)
			.ok_or_else(|| StorageError::NotFound(name.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_memory_roundtrip_and_listing() {
		let storage = MemoryStorage::new(MemoryConfig::default());

		storage.save("b/two.txt", b"2").await.unwrap();
		storage.save("a/one.txt", b"1").await.unwrap();

		assert_eq!(storage.names().await, vec!["a/one.txt", "b/two.txt"]);
		assert_eq!(storage.open("a/one.txt").await.unwrap(), b"1");
		assert_eq!(storage.url("a/one.txt").await.unwrap(), "/media/a/one.txt");

		storage.delete("a/one.txt").await.unwrap();
		assert_eq!(storage.len().await, 1);
		assert!(matches!(
			storage.delete("a/one.txt").await,
			Err(StorageError::NotFound(_))
		));
	}
}
