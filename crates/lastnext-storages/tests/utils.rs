//! Test data and assertions shared by the backend tests.

#![allow(dead_code)]

use lastnext_storages::{StorageBackend, StorageError};

/// Test file structure.
#[derive(Debug, Clone)]
pub struct TestFile {
	pub name: String,
	pub content: Vec<u8>,
}

impl TestFile {
	pub fn new(name: &str, content: Vec<u8>) -> Self {
		Self {
			name: name.to_string(),
			content,
		}
	}

	/// Text file with `lines` lines of filler.
	pub fn text(name: &str, lines: usize) -> Self {
		let content = (0..lines)
			.map(|i| format!("Line {}: test content", i))
			.collect::<Vec<_>>()
			.join("\n");
		Self::new(name, content.into_bytes())
	}
}

/// Unique file name with the given prefix.
pub fn generate_unique_name(prefix: &str) -> String {
	format!("{}_{}.txt", prefix, uuid::Uuid::new_v4().simple())
}

pub async fn assert_storage_exists(backend: &dyn StorageBackend, name: &str) {
	assert!(
		backend.exists(name).await.expect("exists() failed"),
		"expected {} to exist",
		name
	);
}

pub async fn assert_storage_not_exists(backend: &dyn StorageBackend, name: &str) {
	assert!(
		!backend.exists(name).await.expect("exists() failed"),
		"expected {} to be absent",
		name
	);
}

pub fn assert_not_found<T: std::fmt::Debug>(result: Result<T, StorageError>) {
	assert!(
		matches!(result, Err(StorageError::NotFound(_))),
		"expected NotFound, got {:?}",
		result
	);
}

pub fn assert_invalid_name<T: std::fmt::Debug>(result: Result<T, StorageError>) {
	assert!(
		matches!(result, Err(StorageError::InvalidName(_))),
		"expected InvalidName, got {:?}",
		result
	);
}
