//! Error types for settings loading.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfError>;

#[derive(Debug, Error)]
pub enum ConfError {
	#[error("Failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Invalid TOML in {path}: {source}")]
	Toml {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid value for {key}: {value:?} is not a valid {expected}")]
	InvalidValue {
		key: String,
		value: String,
		expected: &'static str,
	},

	#[error("Invalid settings: {0}")]
	Deserialize(#[from] serde_json::Error),

	#[error("Settings validation failed: {0}")]
	Validation(String),
}
