//! Test fixtures for storage backend tests.

#![allow(dead_code)]

use lastnext_storages::{
	LocalConfig, LocalStorage, MemoryConfig, MemoryStorage, StorageBackend, StorageConfig,
};
use rstest::fixture;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use crate::utils::TestFile;

// ============================================================================
// File fixtures
// ============================================================================

/// Small text file.
#[fixture]
pub fn small_file() -> TestFile {
	TestFile::text("small.txt", 10)
}

/// Binary file containing every byte value.
#[fixture]
pub fn binary_file() -> TestFile {
	TestFile::new("binary.bin", (0u8..=255).collect())
}

// ============================================================================
// Local backend
// ============================================================================

/// Temporary media root. The directory lives as long as this value.
pub struct LocalTestDir {
	temp_dir: TempDir,
}

impl LocalTestDir {
	pub fn config(&self) -> LocalConfig {
		LocalConfig::new(self.temp_dir.path().to_string_lossy(), "/media")
	}

	pub async fn backend(&self) -> Arc<dyn StorageBackend> {
		lastnext_storages::create_storage(StorageConfig::Local(self.config()))
			.await
			.expect("Failed to create local backend")
	}

	pub async fn storage(&self) -> LocalStorage {
		LocalStorage::new(self.config())
			.await
			.expect("Failed to create local storage")
	}

	pub fn path(&self) -> &Path {
		self.temp_dir.path()
	}
}

#[fixture]
pub fn local_temp_dir() -> LocalTestDir {
	LocalTestDir {
		temp_dir: TempDir::new().expect("Failed to create temp dir"),
	}
}

// ============================================================================
// Memory backend
// ============================================================================

#[fixture]
pub fn memory_backend() -> Arc<MemoryStorage> {
	Arc::new(MemoryStorage::new(MemoryConfig::default()))
}
