use bytes::Bytes;
use std::path::Path;

/// A file received from a client, before any processing.
#[derive(Debug, Clone)]
pub struct UploadedFile {
	/// Client supplied file name, used only for its extension
	pub filename: String,
	pub content_type: Option<String>,
	pub data: Bytes,
}

impl UploadedFile {
	pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
		Self {
			filename: filename.into(),
			content_type: None,
			data: data.into(),
		}
	}

	pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type = Some(content_type.into());
		self
	}

	/// Lowercased extension of the file name.
	pub fn extension(&self) -> Option<String> {
		Path::new(&self.filename)
			.extension()
			.and_then(|ext| ext.to_str())
			.map(|ext| ext.to_ascii_lowercase())
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}
}
