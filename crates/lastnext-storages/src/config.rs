//! Configuration types for storage backends.

use crate::{Result, StorageError};
use std::str::FromStr;

/// Storage backend type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendType {
	/// Local file system
	Local,
	/// Process-local memory
	Memory,
}

impl std::fmt::Display for BackendType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			BackendType::Local => write!(f, "Local"),
			BackendType::Memory => write!(f, "Memory"),
		}
	}
}

impl FromStr for BackendType {
	type Err = StorageError;

	fn from_str(s: &str) -> Result<Self> {
		match s.to_lowercase().as_str() {
			"local" => Ok(BackendType::Local),
			"memory" => Ok(BackendType::Memory),
			_ => Err(StorageError::ConfigError(format!(
				"Invalid backend type: {}",
				s
			))),
		}
	}
}

/// Configuration for local file system backend.
#[cfg(feature = "local")]
#[derive(Debug, Clone)]
pub struct LocalConfig {
	/// Base directory path for file storage
	pub base_path: String,
	/// URL prefix the base directory is served under (e.g. "/media")
	pub base_url: String,
	/// Create the base directory when it does not exist
	pub create_base_path: bool,
}

#[cfg(feature = "local")]
impl LocalConfig {
	/// Local configuration that requires `base_path` to exist.
	pub fn new(base_path: impl Into<String>, base_url: impl Into<String>) -> Self {
		Self {
			base_path: base_path.into(),
			base_url: base_url.into(),
			create_base_path: false,
		}
	}

	/// Create the base directory on startup when missing.
	pub fn create_base_path(mut self, create: bool) -> Self {
		self.create_base_path = create;
		self
	}
}

/// Configuration for the in-memory backend.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
	/// URL prefix returned by `url()`
	pub base_url: String,
}

impl Default for MemoryConfig {
	fn default() -> Self {
		Self {
			base_url: "/media".to_string(),
		}
	}
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub enum StorageConfig {
	#[cfg(feature = "local")]
	Local(LocalConfig),
	Memory(MemoryConfig),
}

impl StorageConfig {
	/// The backend type this configuration selects.
	pub fn backend_type(&self) -> BackendType {
		match self {
			#[cfg(feature = "local")]
			StorageConfig::Local(_) => BackendType::Local,
			StorageConfig::Memory(_) => BackendType::Memory,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("local", BackendType::Local)]
	#[case("LOCAL", BackendType::Local)]
	#[case("memory", BackendType::Memory)]
	fn test_backend_type_from_str(#[case] input: &str, #[case] expected: BackendType) {
		assert_eq!(input.parse::<BackendType>().unwrap(), expected);
	}

	#[rstest]
	fn test_backend_type_rejects_unknown() {
		let result = "s3".parse::<BackendType>();
		assert!(matches!(result, Err(StorageError::ConfigError(_))));
	}
}
