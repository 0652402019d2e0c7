//! Third-party identity verification and profile picture download.

use async_trait::async_trait;
use lastnext_images::UploadedFile;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{MaintenanceError, Result};

/// Verified claims of an identity-provider ID token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityClaims {
	/// Provider subject id
	pub sub: String,
	pub email: Option<String>,
	pub email_verified: bool,
	pub given_name: Option<String>,
	pub family_name: Option<String>,
	pub picture: Option<String>,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
	/// Provider name recorded as the profile's login provider.
	fn provider(&self) -> &str;

	async fn verify(&self, id_token: &str) -> Result<IdentityClaims>;
}

#[async_trait]
pub trait PictureFetcher: Send + Sync {
	async fn fetch(&self, url: &str) -> Result<UploadedFile>;
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
	reqwest::Client::builder()
		.timeout(timeout)
		.build()
		.map_err(|e| MaintenanceError::Internal(e.to_string()))
}

/// Google's `tokeninfo` response. Booleans arrive as strings.
#[derive(Debug, Deserialize)]
struct TokenInfo {
	aud: String,
	sub: String,
	email: Option<String>,
	email_verified: Option<serde_json::Value>,
	given_name: Option<String>,
	family_name: Option<String>,
	picture: Option<String>,
}

fn truthy(value: Option<&serde_json::Value>) -> bool {
	match value {
		Some(serde_json::Value::Bool(b)) => *b,
		Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("true"),
		_ => false,
	}
}

/// Verifies Google ID tokens through the `tokeninfo` endpoint and checks the
/// audience against the configured client id.
pub struct GoogleTokenVerifier {
	client: reqwest::Client,
	tokeninfo_url: String,
	client_id: String,
}

impl GoogleTokenVerifier {
	pub fn new(
		tokeninfo_url: impl Into<String>,
		client_id: impl Into<String>,
		timeout: Duration,
	) -> Result<Self> {
		Ok(Self {
			client: http_client(timeout)?,
			tokeninfo_url: tokeninfo_url.into(),
			client_id: client_id.into(),
		})
	}
}

#[async_trait]
impl IdentityVerifier for GoogleTokenVerifier {
	fn provider(&self) -> &str {
		"google"
	}

	async fn verify(&self, id_token: &str) -> Result<IdentityClaims> {
		let response = self
			.client
			.get(&self.tokeninfo_url)
			.query(&[("id_token", id_token)])
			.send()
			.await
			.map_err(|e| MaintenanceError::Identity(e.to_string()))?;

		if !response.status().is_success() {
			return Err(MaintenanceError::Identity(format!(
				"Token verification failed with status {}",
				response.status()
			)));
		}

		let info: TokenInfo = response
			.json()
			.await
			.map_err(|e| MaintenanceError::Identity(e.to_string()))?;

		if self.client_id.is_empty() || info.aud != self.client_id {
			return Err(MaintenanceError::Identity(
				"Token was issued for another audience".to_string(),
			));
		}

		Ok(IdentityClaims {
			email_verified: truthy(info.email_verified.as_ref()),
			sub: info.sub,
			email: info.email,
			given_name: info.given_name,
			family_name: info.family_name,
			picture: info.picture,
		})
	}
}

/// Downloads pictures over HTTP.
pub struct HttpPictureFetcher {
	client: reqwest::Client,
}

impl HttpPictureFetcher {
	pub fn new(timeout: Duration) -> Result<Self> {
		Ok(Self {
			client: http_client(timeout)?,
		})
	}
}

/// File name carrying an extension the image pipeline accepts.
fn picture_filename(content_type: Option<&str>) -> &'static str {
	match content_type.map(|ct| ct.split(';').next().unwrap_or("").trim()) {
		Some("image/png") => "picture.png",
		Some("image/gif") => "picture.gif",
		Some("image/webp") => "picture.webp",
		_ => "picture.jpg",
	}
}

#[async_trait]
impl PictureFetcher for HttpPictureFetcher {
	async fn fetch(&self, url: &str) -> Result<UploadedFile> {
		let response = self
			.client
			.get(url)
			.send()
			.await
			.and_then(|r| r.error_for_status())
			.map_err(|e| MaintenanceError::Internal(format!("Picture download failed: {}", e)))?;

		let content_type = response
			.headers()
			.get(reqwest::header::CONTENT_TYPE)
			.and_then(|v| v.to_str().ok())
			.map(str::to_string);

		let data = response
			.bytes()
			.await
			.map_err(|e| MaintenanceError::Internal(format!("Picture download failed: {}", e)))?;

		let mut upload = UploadedFile::new(picture_filename(content_type.as_deref()), data);
		if let Some(content_type) = content_type {
			upload = upload.with_content_type(content_type);
		}
		Ok(upload)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case(Some(json!("true")), true)]
	#[case(Some(json!("TRUE")), true)]
	#[case(Some(json!(true)), true)]
	#[case(Some(json!("false")), false)]
	#[case(None, false)]
	fn test_email_verified_parsing(#[case] value: Option<serde_json::Value>, #[case] expected: bool) {
		assert_eq!(truthy(value.as_ref()), expected);
	}

	#[rstest]
	#[case(Some("image/png"), "picture.png")]
	#[case(Some("image/webp; charset=binary"), "picture.webp")]
	#[case(Some("image/jpeg"), "picture.jpg")]
	#[case(None, "picture.jpg")]
	fn test_picture_filename(#[case] content_type: Option<&str>, #[case] expected: &str) {
		assert_eq!(picture_filename(content_type), expected);
	}
}
