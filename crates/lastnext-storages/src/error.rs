//! Error types for storage operations.

use thiserror::Error;

/// Errors that can occur in storage backends
#[derive(Debug, Error)]
pub enum StorageError {
	/// File does not exist in the backend
	#[error("File not found: {0}")]
	NotFound(String),

	/// Name is empty, absolute, or escapes the storage root
	#[error("Invalid file name: {0}")]
	InvalidName(String),

	/// Backend configuration is invalid
	#[error("Configuration error: {0}")]
	ConfigError(String),

	/// Underlying I/O failure
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
