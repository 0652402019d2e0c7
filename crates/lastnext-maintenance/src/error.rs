use lastnext_images::ImageError;
use lastnext_storages::StorageError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Per-field error messages, serialized as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
	pub fn new() -> Self {
		Self::default()
	}

	/// Errors for a single field.
	pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
		let mut errors = Self::new();
		errors.add(field, message);
		errors
	}

	pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
		self.0.entry(field.into()).or_default().push(message.into());
	}

	pub fn get(&self, field: &str) -> Option<&[String]> {
		self.0.get(field).map(Vec::as_slice)
	}

	pub fn contains(&self, field: &str) -> bool {
		self.0.contains_key(field)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
		self.0.iter()
	}

	/// `Ok(())` when no field failed, a validation error otherwise.
	pub fn into_result(self) -> Result<()> {
		if self.is_empty() {
			Ok(())
		} else {
			Err(MaintenanceError::Validation(self))
		}
	}
}

impl fmt::Display for FieldErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let parts: Vec<String> = self
			.0
			.iter()
			.map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
			.collect();
		write!(f, "{}", parts.join("; "))
	}
}

/// Errors raised by maintenance operations.
#[derive(Debug, Error)]
pub enum MaintenanceError {
	/// Input failed validation
	#[error("Validation failed: {0}")]
	Validation(FieldErrors),

	/// A referenced record does not exist.
	///
	/// `reference` is true when the identifier came from a request payload
	/// rather than from the resource being addressed.
	#[error("{field}: {message}")]
	NotFound {
		field: String,
		message: String,
		reference: bool,
	},

	#[error("Authentication failed: {0}")]
	Authentication(String),

	#[error("Token error: {0}")]
	Token(String),

	#[error("Identity provider error: {0}")]
	Identity(String),

	#[error("Database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("Migration error: {0}")]
	Migration(#[from] sqlx::migrate::MigrateError),

	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),

	#[error("{0}")]
	Internal(String),
}

impl MaintenanceError {
	/// The addressed resource does not exist.
	pub fn not_found(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::NotFound {
			field: field.into(),
			message: message.into(),
			reference: false,
		}
	}

	/// An identifier inside a request payload does not resolve.
	pub fn invalid_reference(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::NotFound {
			field: field.into(),
			message: message.into(),
			reference: true,
		}
	}

	pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Validation(FieldErrors::single(field, message))
	}
}

impl From<ImageError> for MaintenanceError {
	fn from(err: ImageError) -> Self {
		match err {
			ImageError::Storage(e) => MaintenanceError::Storage(e),
			other => MaintenanceError::Internal(other.to_string()),
		}
	}
}

pub type Result<T> = std::result::Result<T, MaintenanceError>;
