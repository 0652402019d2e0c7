//! `multipart/form-data` parsing.
//!
//! Browsers send every form field as text, so known fields are coerced to
//! the JSON type the typed payloads expect before deserialization.

use futures_util::future::ready;
use futures_util::stream::once;
use lastnext_images::UploadedFile;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::http::Request;

const BOOL_FIELDS: &[&str] = &["is_defective", "is_preventivemaintenance", "is_active"];
const INT_FIELDS: &[&str] = &["room_id"];
const JSON_FIELDS: &[&str] = &["topic_data"];

/// Parsed multipart form.
#[derive(Debug, Default)]
pub struct FormData {
	fields: Vec<(String, String)>,
	files: Vec<(String, UploadedFile)>,
}

impl FormData {
	/// Read every part of a multipart request.
	pub async fn parse(request: &Request) -> Result<Self, ApiError> {
		let content_type = request
			.content_type()
			.ok_or_else(|| ApiError::BadRequest("Missing Content-Type header".to_string()))?;
		let boundary = multer::parse_boundary(content_type)?;

		let body = request.body.clone();
		let stream = once(ready(Ok::<_, std::io::Error>(body)));
		let mut multipart = multer::Multipart::new(stream, boundary);

		let mut form = FormData::default();
		while let Some(field) = multipart.next_field().await? {
			let name = field.name().unwrap_or_default().to_string();
			match field.file_name().map(str::to_string) {
				Some(filename) => {
					let content_type = field.content_type().map(|m| m.to_string());
					let data = field.bytes().await?;
					let mut upload = UploadedFile::new(filename, data);
					if let Some(content_type) = content_type {
						upload = upload.with_content_type(content_type);
					}
					form.files.push((name, upload));
				}
				None => {
					let text = field.text().await?;
					form.fields.push((name, text));
				}
			}
		}
		Ok(form)
	}

	pub fn field(&self, name: &str) -> Option<&str> {
		self.fields
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}

	/// Uploaded files of the field `name`, in submission order.
	pub fn files(&self, name: &str) -> Vec<UploadedFile> {
		self.files
			.iter()
			.filter(|(key, _)| key == name)
			.map(|(_, file)| file.clone())
			.collect()
	}

	pub fn file(&self, name: &str) -> Option<UploadedFile> {
		self.files(name).into_iter().next()
	}

	/// Text fields as a JSON object. Empty values are dropped; the last
	/// value of a repeated field wins.
	pub fn to_json(&self) -> Result<Value, ApiError> {
		let mut object = Map::new();
		for (name, value) in &self.fields {
			if value.trim().is_empty() {
				continue;
			}
			object.insert(name.clone(), coerce(name, value)?);
		}
		Ok(Value::Object(object))
	}

	/// Deserialize the text fields into `T`.
	pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
		serde_json::from_value(self.to_json()?)
			.map_err(|e| ApiError::BadRequest(format!("Invalid form data - {}", e)))
	}
}

fn coerce(name: &str, value: &str) -> Result<Value, ApiError> {
	let value = value.trim();
	if BOOL_FIELDS.contains(&name) {
		return match value.to_ascii_lowercase().as_str() {
			"true" | "1" | "on" | "yes" => Ok(Value::Bool(true)),
			"false" | "0" | "off" | "no" => Ok(Value::Bool(false)),
			_ => Err(ApiError::BadRequest(format!("{}: Must be a valid boolean.", name))),
		};
	}
	if INT_FIELDS.contains(&name) {
		return value
			.parse::<i64>()
			.map(Value::from)
			.map_err(|_| ApiError::BadRequest(format!("{}: A valid integer is required.", name)));
	}
	if JSON_FIELDS.contains(&name) {
		return serde_json::from_str(value)
			.map_err(|e| ApiError::BadRequest(format!("{}: Invalid JSON - {}", name, e)));
	}
	Ok(Value::String(value.to_string()))
}

/// Multipart body builder for tests and clients.
#[derive(Debug, Default)]
pub struct MultipartBody {
	boundary: String,
	body: Vec<u8>,
}

impl MultipartBody {
	pub fn new() -> Self {
		Self {
			boundary: "lastnext-form-boundary".to_string(),
			body: Vec::new(),
		}
	}

	pub fn text(mut self, name: &str, value: &str) -> Self {
		self.body.extend_from_slice(
			format!(
				"--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
				self.boundary, name, value
			)
			.as_bytes(),
		);
		self
	}

	pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
		self.body.extend_from_slice(
			format!(
				"--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
				self.boundary, name, filename, content_type
			)
			.as_bytes(),
		);
		self.body.extend_from_slice(data);
		self.body.extend_from_slice(b"\r\n");
		self
	}

	pub fn content_type(&self) -> String {
		format!("multipart/form-data; boundary={}", self.boundary)
	}

	pub fn finish(mut self) -> Vec<u8> {
		self.body
			.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
		self.body
	}

	/// Attach the body to `request`.
	pub fn apply(self, request: Request) -> Request {
		let content_type = self.content_type();
		request
			.with_header("content-type", &content_type)
			.with_body(self.finish())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use http::Method;
	use lastnext_maintenance::CreateJobInput;
	use rstest::rstest;
	use serde_json::json;

	fn request(body: MultipartBody) -> Request {
		body.apply(Request::build(Method::POST, "/api/jobs/"))
	}

	#[rstest]
	#[tokio::test]
	async fn test_parse_fields_and_files() {
		let req = request(
			MultipartBody::new()
				.text("description", "Leak")
				.file("images", "a.png", "image/png", b"one")
				.file("images", "b.png", "image/png", b"two"),
		);

		let form = FormData::parse(&req).await.unwrap();

		assert_eq!(form.field("description"), Some("Leak"));
		let files = form.files("images");
		assert_eq!(files.len(), 2);
		assert_eq!(files[1].filename, "b.png");
		assert_eq!(files[0].content_type.as_deref(), Some("image/png"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_form_values_coerced_for_job_input() {
		let req = request(
			MultipartBody::new()
				.text("description", "Leak")
				.text("remarks", "Room 12")
				.text("room_id", "12")
				.text("is_preventivemaintenance", "true")
				.text("property_id", "")
				.text("topic_data", r#"{"title": "Plumbing", "description": "Pipes"}"#),
		);

		let input: CreateJobInput = FormData::parse(&req).await.unwrap().deserialize().unwrap();

		assert_eq!(input.room_id, Some(12));
		assert!(input.is_preventivemaintenance);
		assert_eq!(input.property_id, None);
		assert_eq!(input.topic_data.unwrap().title, "Plumbing");
	}

	#[rstest]
	#[case("room_id", "twelve")]
	#[case("is_defective", "maybe")]
	#[case("topic_data", "{not json")]
	fn test_coerce_rejects_bad_values(#[case] name: &str, #[case] value: &str) {
		assert!(matches!(coerce(name, value), Err(ApiError::BadRequest(_))));
	}

	#[rstest]
	fn test_coerce_passes_other_fields_as_strings() {
		assert_eq!(coerce("status", " completed ").unwrap(), json!("completed"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_boundary_is_bad_request() {
		let req = Request::build(Method::POST, "/").with_header("content-type", "multipart/form-data");

		assert!(matches!(
			FormData::parse(&req).await,
			Err(ApiError::BadRequest(_))
		));
	}
}
