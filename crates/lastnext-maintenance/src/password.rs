//! Password hashing and validation.

use argon2::Argon2;
use argon2::password_hash::{
	PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
};
use rand::RngCore;

use crate::error::{FieldErrors, MaintenanceError, Result};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

pub trait PasswordHasher: Send + Sync {
	fn hash(&self, password: &str) -> Result<String>;

	fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Argon2id with default parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
	pub fn new() -> Self {
		Self
	}
}

impl PasswordHasher for Argon2Hasher {
	fn hash(&self, password: &str) -> Result<String> {
		let mut salt_bytes = [0u8; 16];
		rand::thread_rng().fill_bytes(&mut salt_bytes);

		let salt = SaltString::encode_b64(&salt_bytes)
			.map_err(|e| MaintenanceError::Internal(e.to_string()))?;

		Argon2::default()
			.hash_password(password.as_bytes(), &salt)
			.map(|hash| hash.to_string())
			.map_err(|e| MaintenanceError::Internal(e.to_string()))
	}

	fn verify(&self, password: &str, hash: &str) -> Result<bool> {
		let parsed_hash =
			PasswordHash::new(hash).map_err(|e| MaintenanceError::Internal(e.to_string()))?;

		Ok(Argon2::default()
			.verify_password(password.as_bytes(), &parsed_hash)
			.is_ok())
	}
}

/// Collect password problems under the `password` field.
pub fn validate_password(password: &str, username: &str, errors: &mut FieldErrors) {
	if password.chars().count() < MIN_PASSWORD_LENGTH {
		errors.add(
			"password",
			format!(
				"This password is too short. It must contain at least {} characters.",
				MIN_PASSWORD_LENGTH
			),
		);
	}
	if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
		errors.add("password", "This password is entirely numeric.");
	}
	if !username.is_empty() && password.eq_ignore_ascii_case(username) {
		errors.add("password", "The password is too similar to the username.");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_hash_and_verify() {
		let hasher = Argon2Hasher::new();

		let hash = hasher.hash("correct horse").unwrap();

		assert!(hash.starts_with("$argon2id$"));
		assert!(hasher.verify("correct horse", &hash).unwrap());
		assert!(!hasher.verify("wrong horse", &hash).unwrap());
	}

	#[rstest]
	fn test_hashes_are_salted() {
		let hasher = Argon2Hasher::new();

		assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
	}

	#[rstest]
	#[case("short", "alice", true)]
	#[case("12345678901", "alice", true)]
	#[case("AliceAlice", "alicealice", true)]
	#[case("s3cure-enough", "alice", false)]
	fn test_validate_password(#[case] password: &str, #[case] username: &str, #[case] fails: bool) {
		let mut errors = FieldErrors::new();

		validate_password(password, username, &mut errors);

		assert_eq!(errors.contains("password"), fails);
	}
}
