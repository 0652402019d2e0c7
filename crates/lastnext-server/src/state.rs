//! Services shared by every request, assembled from [`Settings`].

use chrono::Duration;
use lastnext_conf::{MediaSettings, Settings};
use lastnext_images::ImagePipeline;
use lastnext_maintenance::{
	Accounts, Database, DatabaseConfig, GoogleTokenVerifier, HttpPictureFetcher, JobManager,
	TokenIssuer, User,
};
use lastnext_storages::{
	BackendType, LocalConfig, MemoryConfig, StorageBackend, StorageConfig, create_storage,
};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::error::{ApiError, ServerError};
use crate::http::Request;

/// Storage configuration for the media settings.
pub fn media_storage_config(media: &MediaSettings) -> Result<StorageConfig, ServerError> {
	Ok(match media.backend.parse::<BackendType>()? {
		BackendType::Local => StorageConfig::Local(
			LocalConfig::new(&media.root, &media.url).create_base_path(media.create_dirs),
		),
		BackendType::Memory => StorageConfig::Memory(MemoryConfig {
			base_url: media.url.clone(),
		}),
	})
}

pub async fn connect_database(settings: &Settings) -> Result<Database, ServerError> {
	let config = DatabaseConfig::new(&settings.database.url)
		.with_max_connections(settings.database.max_connections);
	Ok(Database::connect(&config).await?)
}

pub struct AppState {
	pub settings: Settings,
	pub pool: SqlitePool,
	pub jobs: JobManager,
	pub accounts: Accounts,
}

impl AppState {
	/// Connect the database and media storage described by `settings`.
	pub async fn from_settings(settings: Settings) -> Result<Self, ServerError> {
		let db = connect_database(&settings).await?;
		let storage = create_storage(media_storage_config(&settings.media)?).await?;
		Self::new(settings, db.pool().clone(), storage)
	}

	pub fn new(
		settings: Settings,
		pool: SqlitePool,
		storage: Arc<dyn StorageBackend>,
	) -> Result<Self, ServerError> {
		let images = ImagePipeline::new(storage);
		let auth = &settings.auth;
		let tokens = Arc::new(TokenIssuer::new(
			auth.secret_key.as_bytes(),
			Duration::minutes(auth.access_token_minutes),
			Duration::days(auth.refresh_token_days),
		));

		let mut accounts = Accounts::new(pool.clone(), tokens, images.clone())
			.with_session_ttl(Duration::days(auth.session_days));
		let google = &settings.google;
		if google.client_id.is_empty() {
			tracing::warn!("google.client_id is not set; identity sign-in is disabled");
		} else {
			let timeout = std::time::Duration::from_secs(google.timeout_secs);
			accounts = accounts.with_identity(
				Arc::new(GoogleTokenVerifier::new(
					&google.tokeninfo_url,
					&google.client_id,
					timeout,
				)?),
				Arc::new(HttpPictureFetcher::new(timeout)?),
			);
		}

		Ok(Self {
			jobs: JobManager::new(pool.clone(), images),
			accounts,
			pool,
			settings,
		})
	}

	/// The user behind the request's bearer token.
	pub async fn authenticate(&self, request: &Request) -> Result<User, ApiError> {
		let token = request.bearer_token().ok_or(ApiError::NotAuthenticated)?;
		Ok(self.accounts.authenticate(token).await?)
	}
}
