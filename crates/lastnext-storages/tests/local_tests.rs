//! Integration tests for LocalStorage backend.

use crate::fixtures::{LocalTestDir, binary_file, local_temp_dir, small_file};
use crate::utils::{
	TestFile, assert_invalid_name, assert_not_found, assert_storage_exists,
	assert_storage_not_exists, generate_unique_name,
};
use lastnext_storages::{LocalConfig, LocalStorage, StorageBackend, StorageError};
use rstest::rstest;

// ============================================================================
// CRUD Tests
// ============================================================================

mod crud_tests {
	use super::*;

	#[rstest]
	#[tokio::test]
	async fn test_save_and_open(local_temp_dir: LocalTestDir, small_file: TestFile) {
		let backend = local_temp_dir.backend().await;

		let path = backend
			.save(&small_file.name, &small_file.content)
			.await
			.expect("Failed to save file");

		assert_eq!(path, small_file.name);
		assert_storage_exists(&*backend, &small_file.name).await;
		assert_eq!(backend.open(&small_file.name).await.unwrap(), small_file.content);
	}

	#[rstest]
	#[tokio::test]
	async fn test_binary_content_preserved(local_temp_dir: LocalTestDir, binary_file: TestFile) {
		let backend = local_temp_dir.backend().await;

		backend.save(&binary_file.name, &binary_file.content).await.unwrap();

		assert_eq!(backend.open(&binary_file.name).await.unwrap(), binary_file.content);
		assert_eq!(backend.size(&binary_file.name).await.unwrap(), 256);
	}

	#[rstest]
	#[tokio::test]
	async fn test_delete_file(local_temp_dir: LocalTestDir) {
		let backend = local_temp_dir.backend().await;
		let name = generate_unique_name("delete");

		backend.save(&name, b"temporary").await.unwrap();
		assert_storage_exists(&*backend, &name).await;

		backend.delete(&name).await.expect("Failed to delete file");

		assert_storage_not_exists(&*backend, &name).await;
		assert_not_found(backend.delete(&name).await);
	}

	#[rstest]
	#[tokio::test]
	async fn test_nested_path_creates_directories(local_temp_dir: LocalTestDir) {
		let backend = local_temp_dir.backend().await;
		let name = "maintenance_job_images/2026/10/abcdefABCDEF.jpg";

		backend.save(name, b"jpeg").await.unwrap();

		assert!(local_temp_dir.path().join(name).is_file());
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_file_is_not_found(local_temp_dir: LocalTestDir) {
		let backend = local_temp_dir.backend().await;

		assert_not_found(backend.open("missing.txt").await);
		assert_not_found(backend.size("missing.txt").await);
		assert_not_found(backend.url("missing.txt").await);
	}
}

// ============================================================================
// URL Tests
// ============================================================================

mod url_tests {
	use super::*;

	#[rstest]
	#[tokio::test]
	async fn test_url_uses_media_prefix(local_temp_dir: LocalTestDir) {
		let backend = local_temp_dir.backend().await;
		backend.save("profile_images/2026/10/x.webp", b"w").await.unwrap();

		let url = backend.url("profile_images/2026/10/x.webp").await.unwrap();

		assert_eq!(url, "/media/profile_images/2026/10/x.webp");
	}

	#[rstest]
	#[tokio::test]
	async fn test_url_with_absolute_base(local_temp_dir: LocalTestDir) {
		let config = LocalConfig::new(
			local_temp_dir.path().to_string_lossy(),
			"https://cdn.example.com/media/",
		);
		let storage = LocalStorage::new(config).await.unwrap();
		storage.save("a.txt", b"a").await.unwrap();

		assert_eq!(
			storage.url("a.txt").await.unwrap(),
			"https://cdn.example.com/media/a.txt"
		);
	}
}

// ============================================================================
// Security Tests
// ============================================================================

mod security_tests {
	use super::*;

	#[rstest]
	#[case("../escape.txt")]
	#[case("nested/../../escape.txt")]
	#[case("/etc/passwd")]
	#[case("")]
	#[tokio::test]
	async fn test_rejects_unsafe_names(local_temp_dir: LocalTestDir, #[case] name: &str) {
		let storage = local_temp_dir.storage().await;

		assert_invalid_name(storage.save(name, b"x").await);
		assert_invalid_name(storage.open(name).await);
		assert_invalid_name(storage.exists(name).await);
	}
}

// ============================================================================
// Configuration Tests
// ============================================================================

mod config_tests {
	use super::*;

	#[rstest]
	#[tokio::test]
	async fn test_missing_base_path_rejected(local_temp_dir: LocalTestDir) {
		let missing = local_temp_dir.path().join("does-not-exist");
		let config = LocalConfig::new(missing.to_string_lossy(), "/media");

		let result = LocalStorage::new(config).await;

		assert!(matches!(result, Err(StorageError::ConfigError(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_base_path_created_on_request(local_temp_dir: LocalTestDir) {
		let missing = local_temp_dir.path().join("media");
		let config =
			LocalConfig::new(missing.to_string_lossy(), "/media").create_base_path(true);

		let storage = LocalStorage::new(config).await.unwrap();

		assert!(storage.base_path().is_dir());
	}
}
