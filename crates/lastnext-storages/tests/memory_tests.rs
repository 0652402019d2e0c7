//! Integration tests for MemoryStorage backend.

use crate::fixtures::memory_backend;
use crate::utils::{assert_invalid_name, assert_not_found, assert_storage_exists};
use lastnext_storages::{
	BackendType, MemoryConfig, MemoryStorage, StorageBackend, StorageConfig, create_storage,
};
use rstest::rstest;
use std::sync::Arc;

#[rstest]
#[tokio::test]
async fn test_memory_save_open_size(memory_backend: Arc<MemoryStorage>) {
	memory_backend.save("a/b.txt", b"hello").await.unwrap();

	assert_storage_exists(&*memory_backend, "a/b.txt").await;
	assert_eq!(memory_backend.open("a/b.txt").await.unwrap(), b"hello");
	assert_eq!(memory_backend.size("a/b.txt").await.unwrap(), 5);
}

#[rstest]
#[tokio::test]
async fn test_memory_overwrite_replaces_content(memory_backend: Arc<MemoryStorage>) {
	memory_backend.save("x.txt", b"one").await.unwrap();
	memory_backend.save("x.txt", b"two").await.unwrap();

	assert_eq!(memory_backend.open("x.txt").await.unwrap(), b"two");
	assert_eq!(memory_backend.len().await, 1);
}

#[rstest]
#[tokio::test]
async fn test_memory_errors(memory_backend: Arc<MemoryStorage>) {
	assert_not_found(memory_backend.open("missing").await);
	assert_invalid_name(memory_backend.save("../x", b"x").await);
}

#[rstest]
#[tokio::test]
async fn test_factory_builds_memory_backend() {
	let config = StorageConfig::Memory(MemoryConfig {
		base_url: "/files".to_string(),
	});
	assert_eq!(config.backend_type(), BackendType::Memory);

	let backend = create_storage(config).await.unwrap();
	backend.save("f.txt", b"f").await.unwrap();

	assert_eq!(backend.url("f.txt").await.unwrap(), "/files/f.txt");
}
