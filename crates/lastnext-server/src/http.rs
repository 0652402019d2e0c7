//! Request and response types passed between the server loop and the views.

use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode, Uri, Version};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::net::SocketAddr;

use crate::error::ApiError;

/// A fully buffered HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	pub remote_addr: Option<SocketAddr>,
	path_params: HashMap<String, String>,
}

impl Request {
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
			remote_addr: None,
			path_params: HashMap::new(),
		}
	}

	/// HTTP/1.1 request without headers or body.
	///
	/// # Examples
	///
	/// ```
	/// use http::Method;
	/// use lastnext_server::Request;
	///
	/// let request = Request::build(Method::GET, "/api/jobs/j24A1B2C3/")
	///     .with_header("authorization", "Bearer abc");
	/// assert_eq!(request.path(), "/api/jobs/j24A1B2C3/");
	/// assert_eq!(request.bearer_token(), Some("abc"));
	/// ```
	pub fn build(method: Method, uri: &str) -> Self {
		let uri = uri.parse().unwrap_or_else(|_| Uri::from_static("/"));
		Self::new(method, uri, Version::HTTP_11, HeaderMap::new(), Bytes::new())
	}

	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// JSON body with a matching content type.
	pub fn with_json<T: Serialize>(self, data: &T) -> Self {
		let body = serde_json::to_vec(data).unwrap_or_default();
		self.with_header("content-type", "application/json")
			.with_body(body)
	}

	pub fn path(&self) -> &str {
		self.uri.path()
	}

	pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}

	pub fn content_type(&self) -> Option<&str> {
		self.header(CONTENT_TYPE)
	}

	pub fn is_multipart(&self) -> bool {
		self.content_type()
			.is_some_and(|ct| ct.starts_with("multipart/form-data"))
	}

	/// Token of an `Authorization: Bearer <token>` header.
	pub fn bearer_token(&self) -> Option<&str> {
		let value = self.header(AUTHORIZATION)?;
		let (scheme, token) = value.split_once(' ')?;
		if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
			Some(token.trim())
		} else {
			None
		}
	}

	pub fn set_path_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.path_params.insert(key.into(), value.into());
	}

	pub fn path_param(&self, key: &str) -> Option<&str> {
		self.path_params.get(key).map(String::as_str)
	}

	/// Deserialize the JSON body. An empty body reads as `{}`.
	pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
		let body: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
			b"{}"
		} else {
			&self.body
		};
		serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("JSON parse error - {}", e)))
	}
}

/// HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn created() -> Self {
		Self::new(StatusCode::CREATED)
	}

	pub fn no_content() -> Self {
		Self::new(StatusCode::NO_CONTENT)
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	/// Set the body to `data` as JSON.
	pub fn with_json<T: Serialize>(mut self, data: &T) -> Result<Self, ApiError> {
		self.body = Bytes::from(serde_json::to_vec(data).map_err(|e| ApiError::Internal(e.to_string()))?);
		self.headers.insert(
			CONTENT_TYPE,
			HeaderValue::from_static("application/json"),
		);
		Ok(self)
	}

	/// `{"detail": message}` with `status`.
	pub fn detail(status: StatusCode, message: &str) -> Self {
		let body = serde_json::json!({ "detail": message });
		Self::new(status)
			.with_header("content-type", "application/json")
			.with_body(body.to_string())
	}

	/// Parse the body as JSON.
	pub fn json_body(&self) -> serde_json::Result<serde_json::Value> {
		serde_json::from_slice(&self.body)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case("Bearer abc.def", Some("abc.def"))]
	#[case("bearer  xyz ", Some("xyz"))]
	#[case("Token abc", None)]
	#[case("Bearer ", None)]
	fn test_bearer_token(#[case] header: &str, #[case] expected: Option<&str>) {
		let request = Request::build(Method::GET, "/").with_header("authorization", header);

		assert_eq!(request.bearer_token(), expected);
	}

	#[rstest]
	fn test_empty_body_reads_as_empty_object() {
		let request = Request::build(Method::PATCH, "/api/jobs/x/");

		let value: serde_json::Value = request.json().unwrap();

		assert_eq!(value, json!({}));
	}

	#[rstest]
	fn test_malformed_json_is_bad_request() {
		let request = Request::build(Method::POST, "/").with_body("{nope");

		let err = request.json::<serde_json::Value>().unwrap_err();

		assert!(matches!(err, ApiError::BadRequest(_)));
	}

	#[rstest]
	fn test_detail_response() {
		let response = Response::detail(StatusCode::UNAUTHORIZED, "Invalid credentials");

		assert_eq!(response.status, StatusCode::UNAUTHORIZED);
		assert_eq!(
			response.json_body().unwrap(),
			json!({ "detail": "Invalid credentials" })
		);
	}
}
