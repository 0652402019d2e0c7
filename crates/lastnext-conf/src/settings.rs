//! Typed settings.

use crate::builder::SettingsBuilder;
use crate::error::{ConfError, Result};
use crate::sources::{DefaultSource, EnvSource, TomlFileSource};
use crate::{DEFAULT_PROFILE, ENV_PREFIX, PROFILE_VAR};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Secret used when none is configured. Rejected outside the `local` and
/// `test` profiles.
pub const INSECURE_SECRET_KEY: &str = "insecure-lastnext-development-secret-key";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
	/// sqlx connection URL, e.g. `sqlite://lastnext.db`
	pub url: String,
	/// SQLite admits a single writer; raise only for read-heavy setups.
	pub max_connections: u32,
}

impl Default for DatabaseSettings {
	fn default() -> Self {
		Self {
			url: "sqlite://lastnext.db".to_string(),
			max_connections: 1,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSettings {
	/// `local` or `memory`
	pub backend: String,
	/// Directory uploaded files are written to
	pub root: String,
	/// URL prefix the media directory is served under
	pub url: String,
	/// Create `root` at startup when missing
	pub create_dirs: bool,
}

impl Default for MediaSettings {
	fn default() -> Self {
		Self {
			backend: "local".to_string(),
			root: "media".to_string(),
			url: "/media".to_string(),
			create_dirs: true,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSettings {
	/// HS256 signing secret
	pub secret_key: String,
	pub access_token_minutes: i64,
	pub refresh_token_days: i64,
	pub session_days: i64,
}

impl Default for AuthSettings {
	fn default() -> Self {
		Self {
			secret_key: INSECURE_SECRET_KEY.to_string(),
			access_token_minutes: 60,
			refresh_token_days: 30,
			session_days: 30,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleSettings {
	/// OAuth client id the ID token audience must match
	pub client_id: String,
	pub tokeninfo_url: String,
	/// Timeout for outbound requests, in seconds
	pub timeout_secs: u64,
}

impl Default for GoogleSettings {
	fn default() -> Self {
		Self {
			client_id: String::new(),
			tokeninfo_url: "https://oauth2.googleapis.com/tokeninfo".to_string(),
			timeout_secs: 10,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
	pub addr: String,
	/// Largest accepted request body, in bytes
	pub max_body_bytes: u64,
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			addr: "127.0.0.1:8000".to_string(),
			max_body_bytes: 20 * 1024 * 1024,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
	/// `tracing-subscriber` filter directive, overridden by `RUST_LOG`
	pub filter: String,
}

impl Default for LogSettings {
	fn default() -> Self {
		Self {
			filter: "info".to_string(),
		}
	}
}

/// All settings of a Lastnext deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
	/// Profile the settings were loaded for
	#[serde(default)]
	pub profile: String,
	pub database: DatabaseSettings,
	pub media: MediaSettings,
	pub auth: AuthSettings,
	pub google: GoogleSettings,
	pub server: ServerSettings,
	pub log: LogSettings,
}

impl Settings {
	/// Load settings from `base_dir` and the process environment.
	pub fn load(base_dir: impl AsRef<Path>) -> Result<Self> {
		Self::load_from(base_dir, std::env::vars())
	}

	/// Load settings from `base_dir` and an explicit set of environment
	/// variables.
	pub fn load_from<I, K, V>(base_dir: impl AsRef<Path>, vars: I) -> Result<Self>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let base_dir = base_dir.as_ref();
		let env = EnvSource::from_vars(ENV_PREFIX, vars);
		let profile = env
			.var(PROFILE_VAR)
			.filter(|p| !p.trim().is_empty())
			.unwrap_or(DEFAULT_PROFILE)
			.to_string();

		let mut settings: Settings = SettingsBuilder::new()
			.add_source(DefaultSource::from_serialize(&Settings::default())?)
			.add_source(TomlFileSource::new(base_dir.join("base.toml")))
			.add_source(TomlFileSource::new(base_dir.join(format!("{}.toml", profile))))
			.add_source(env)
			.build()?;

		settings.profile = profile;
		settings.validate()?;

		tracing::info!("Loaded settings for profile {}", settings.profile);
		Ok(settings)
	}

	/// Reject settings the server cannot run with.
	pub fn validate(&self) -> Result<()> {
		if self.database.url.trim().is_empty() {
			return Err(ConfError::Validation("database.url is empty".to_string()));
		}
		if self.database.max_connections == 0 {
			return Err(ConfError::Validation(
				"database.max_connections must be at least 1".to_string(),
			));
		}
		if !matches!(self.media.backend.as_str(), "local" | "memory") {
			return Err(ConfError::Validation(format!(
				"media.backend must be local or memory, got {}",
				self.media.backend
			)));
		}
		if self.auth.secret_key.is_empty() {
			return Err(ConfError::Validation("auth.secret_key is empty".to_string()));
		}
		if self.auth.secret_key == INSECURE_SECRET_KEY && !self.is_development() {
			return Err(ConfError::Validation(format!(
				"auth.secret_key must be set for profile {}",
				self.profile
			)));
		}
		if self.auth.access_token_minutes <= 0 || self.auth.refresh_token_days <= 0 {
			return Err(ConfError::Validation(
				"token lifetimes must be positive".to_string(),
			));
		}
		Ok(())
	}

	/// `local` and `test` profiles accept development defaults.
	pub fn is_development(&self) -> bool {
		matches!(self.profile.as_str(), "" | "local" | "test")
	}
}
