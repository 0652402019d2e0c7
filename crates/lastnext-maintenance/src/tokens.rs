//! Access and refresh tokens.
//!
//! Both are HS256 JWTs signed with the configured secret. The `token_type`
//! claim keeps one kind from being accepted in place of the other.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{MaintenanceError, Result};
use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
	Access,
	Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
	/// User id
	pub sub: String,
	pub username: String,
	pub token_type: TokenType,
	/// Unique token id
	pub jti: String,
	pub iat: i64,
	pub exp: i64,
}

impl Claims {
	pub fn new(user: &User, token_type: TokenType, expires_in: Duration) -> Self {
		let now = Utc::now();
		Self {
			sub: user.id.to_string(),
			username: user.username.clone(),
			token_type,
			jti: uuid::Uuid::new_v4().simple().to_string(),
			iat: now.timestamp(),
			exp: (now + expires_in).timestamp(),
		}
	}

	pub fn user_id(&self) -> Result<i64> {
		self.sub
			.parse()
			.map_err(|_| MaintenanceError::Token(format!("Invalid subject {:?}", self.sub)))
	}
}

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
	pub access: String,
	pub refresh: String,
}

pub struct TokenIssuer {
	encoding_key: EncodingKey,
	decoding_key: DecodingKey,
	validation: Validation,
	access_ttl: Duration,
	refresh_ttl: Duration,
}

impl TokenIssuer {
	pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
		let mut validation = Validation::new(Algorithm::HS256);
		validation.leeway = 0;
		Self {
			encoding_key: EncodingKey::from_secret(secret),
			decoding_key: DecodingKey::from_secret(secret),
			validation,
			access_ttl,
			refresh_ttl,
		}
	}

	fn encode(&self, claims: &Claims) -> Result<String> {
		encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
			.map_err(|e| MaintenanceError::Token(e.to_string()))
	}

	pub fn issue(&self, user: &User, token_type: TokenType) -> Result<String> {
		let ttl = match token_type {
			TokenType::Access => self.access_ttl,
			TokenType::Refresh => self.refresh_ttl,
		};
		self.encode(&Claims::new(user, token_type, ttl))
	}

	pub fn issue_pair(&self, user: &User) -> Result<TokenPair> {
		Ok(TokenPair {
			access: self.issue(user, TokenType::Access)?,
			refresh: self.issue(user, TokenType::Refresh)?,
		})
	}

	/// Decode `token`, checking signature, expiry and kind.
	pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims> {
		let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
			.map(|data| data.claims)
			.map_err(|e| MaintenanceError::Token(e.to_string()))?;

		if claims.token_type != expected {
			return Err(MaintenanceError::Token(format!(
				"Expected a {:?} token",
				expected
			)));
		}
		Ok(claims)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};

	#[fixture]
	fn issuer() -> TokenIssuer {
		TokenIssuer::new(b"test-secret", Duration::minutes(60), Duration::days(30))
	}

	#[fixture]
	fn user() -> User {
		User {
			id: 42,
			username: "alice".to_string(),
			email: "alice@example.com".to_string(),
			password_hash: None,
			first_name: String::new(),
			last_name: String::new(),
			is_active: true,
			date_joined: Utc::now(),
		}
	}

	#[rstest]
	fn test_pair_roundtrip(issuer: TokenIssuer, user: User) {
		let pair = issuer.issue_pair(&user).unwrap();

		let access = issuer.verify(&pair.access, TokenType::Access).unwrap();
		let refresh = issuer.verify(&pair.refresh, TokenType::Refresh).unwrap();

		assert_eq!(access.user_id().unwrap(), 42);
		assert_eq!(access.username, "alice");
		assert_eq!(access.exp - access.iat, 60 * 60);
		assert_eq!(refresh.exp - refresh.iat, 30 * 24 * 60 * 60);
		assert_ne!(access.jti, refresh.jti);
	}

	#[rstest]
	fn test_kinds_not_interchangeable(issuer: TokenIssuer, user: User) {
		let pair = issuer.issue_pair(&user).unwrap();

		assert!(issuer.verify(&pair.refresh, TokenType::Access).is_err());
		assert!(issuer.verify(&pair.access, TokenType::Refresh).is_err());
	}

	#[rstest]
	fn test_expired_token_rejected(user: User) {
		let issuer = TokenIssuer::new(b"test-secret", Duration::seconds(-10), Duration::days(1));

		let token = issuer.issue(&user, TokenType::Access).unwrap();

		assert!(matches!(
			issuer.verify(&token, TokenType::Access),
			Err(MaintenanceError::Token(_))
		));
	}

	#[rstest]
	fn test_foreign_signature_rejected(issuer: TokenIssuer, user: User) {
		let other = TokenIssuer::new(b"other-secret", Duration::minutes(5), Duration::days(1));
		let token = other.issue(&user, TokenType::Access).unwrap();

		assert!(issuer.verify(&token, TokenType::Access).is_err());
	}
}
