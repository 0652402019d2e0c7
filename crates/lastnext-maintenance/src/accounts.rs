//! User accounts: registration, password login, sessions, profiles and
//! identity-provider sign-in.

use chrono::{Duration, Utc};
use lastnext_images::{ImageKind, ImagePipeline, UploadedFile};
use serde::Serialize;
use sqlx::{Connection, SqliteConnection, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{begin_write, is_unique_violation};
use crate::error::{FieldErrors, MaintenanceError, Result};
use crate::identity::{IdentityClaims, IdentityVerifier, PictureFetcher};
use crate::inputs::{RegisterInput, UpdateProfileInput};
use crate::models::session::NewSession;
use crate::models::user::NewUser;
use crate::models::{Property, Session, User, UserProfile};
use crate::password::{Argon2Hasher, PasswordHasher, validate_password};
use crate::properties::property_by_public_id;
use crate::tokens::{TokenIssuer, TokenType};

/// Default lifetime of a login session.
pub const DEFAULT_SESSION_DAYS: i64 = 30;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const USERNAME_TAKEN: &str = "A user with that username already exists.";
const EMAIL_TAKEN: &str = "A user with that email already exists.";

/// A user's profile as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileDetail {
	/// User id
	pub id: i64,
	pub username: String,
	pub email: String,
	pub first_name: String,
	pub last_name: String,
	pub positions: Option<String>,
	/// URL of the normalized profile picture
	pub profile_image: Option<String>,
	pub email_verified: bool,
	pub login_provider: Option<String>,
	pub properties: Vec<Property>,
}

/// Tokens handed out on login, registration and identity exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthSession {
	pub access: String,
	pub refresh: String,
	pub session_token: String,
	pub user_id: i64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user: Option<ProfileDetail>,
}

impl AuthSession {
	fn from_session(session: &Session, user: Option<ProfileDetail>) -> Self {
		Self {
			access: session.access_token.clone(),
			refresh: session.refresh_token.clone(),
			session_token: session.session_token.clone(),
			user_id: session.user_id,
			user,
		}
	}
}

/// Account operations.
#[derive(Clone)]
pub struct Accounts {
	pool: SqlitePool,
	tokens: Arc<TokenIssuer>,
	hasher: Arc<dyn PasswordHasher>,
	images: ImagePipeline,
	verifier: Option<Arc<dyn IdentityVerifier>>,
	pictures: Option<Arc<dyn PictureFetcher>>,
	session_ttl: Duration,
}

impl Accounts {
	/// Accounts hashing with Argon2 and without an identity provider.
	pub fn new(pool: SqlitePool, tokens: Arc<TokenIssuer>, images: ImagePipeline) -> Self {
		Self {
			pool,
			tokens,
			hasher: Arc::new(Argon2Hasher::new()),
			images,
			verifier: None,
			pictures: None,
			session_ttl: Duration::days(DEFAULT_SESSION_DAYS),
		}
	}

	pub fn with_hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
		self.hasher = hasher;
		self
	}

	/// Enable [`Accounts::exchange_identity`].
	pub fn with_identity(
		mut self,
		verifier: Arc<dyn IdentityVerifier>,
		pictures: Arc<dyn PictureFetcher>,
	) -> Self {
		self.verifier = Some(verifier);
		self.pictures = Some(pictures);
		self
	}

	pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
		self.session_ttl = ttl;
		self
	}

	pub fn tokens(&self) -> &TokenIssuer {
		&self.tokens
	}

	fn new_session(&self, user: &User) -> Result<NewSession> {
		let pair = self.tokens.issue_pair(user)?;
		Ok(NewSession {
			user_id: user.id,
			session_token: Uuid::new_v4().to_string(),
			access_token: pair.access,
			refresh_token: pair.refresh,
			expires_at: Utc::now() + self.session_ttl,
		})
	}

	async fn issue_session(&self, conn: &mut SqliteConnection, user: &User) -> Result<Session> {
		let new = self.new_session(user)?;
		Session::insert(conn, &new).await
	}

	/// Create a user with a password, its profile and a first session.
	pub async fn register(&self, input: RegisterInput) -> Result<AuthSession> {
		let username = input.username.trim();
		let email = input.email.trim();

		let mut errors = FieldErrors::new();
		let mut conn = self.pool.acquire().await?;
		if username.is_empty() {
			errors.add("username", "This field is required.");
		} else if User::username_exists(&mut conn, username).await? {
			errors.add("username", USERNAME_TAKEN);
		}
		if email.is_empty() {
			errors.add("email", "This field is required.");
		} else if !email.contains('@') {
			errors.add("email", "Enter a valid email address.");
		} else if User::email_exists(&mut conn, email).await? {
			errors.add("email", EMAIL_TAKEN);
		}
		validate_password(&input.password, username, &mut errors);
		errors.into_result()?;
		drop(conn);

		let password_hash = self.hasher.hash(&input.password)?;

		let mut tx = begin_write(&self.pool).await?;
		let user = User::insert(
			&mut tx,
			&NewUser {
				username,
				email,
				password_hash: Some(&password_hash),
				..Default::default()
			},
		)
		.await
		.map_err(|e| {
			if is_unique_violation(&e) {
				MaintenanceError::validation("username", USERNAME_TAKEN)
			} else {
				e.into()
			}
		})?;
		UserProfile::insert(&mut tx, user.id, None).await?;
		let session = self.issue_session(&mut tx, &user).await?;
		tx.commit().await?;

		tracing::info!("User registered: {}", user.username);
		Ok(AuthSession::from_session(&session, None))
	}

	/// Check a username and password and open a session.
	pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession> {
		let mut conn = self.pool.acquire().await?;
		let user = User::find_by_username(&mut conn, username)
			.await?
			.filter(|user| user.is_active)
			.ok_or_else(|| MaintenanceError::Authentication(INVALID_CREDENTIALS.to_string()))?;

		let verified = match &user.password_hash {
			Some(hash) => self.hasher.verify(password, hash)?,
			None => false,
		};
		if !verified {
			tracing::debug!("Rejected password login for {}", username);
			return Err(MaintenanceError::Authentication(
				INVALID_CREDENTIALS.to_string(),
			));
		}

		let session = self.issue_session(&mut conn, &user).await?;
		tracing::info!("User logged in: {}", user.username);
		Ok(AuthSession::from_session(&session, None))
	}

	/// Delete the caller's session `session_token`. Unknown tokens are
	/// ignored.
	pub async fn logout(&self, user: &User, session_token: &str) -> Result<()> {
		let mut conn = self.pool.acquire().await?;
		if Session::delete_for_user(&mut conn, user.id, session_token).await? {
			tracing::info!("User logged out: {}", user.username);
		}
		Ok(())
	}

	/// The user's most recent session.
	pub async fn current_session(&self, user: &User) -> Result<Session> {
		let mut conn = self.pool.acquire().await?;
		Session::latest_for_user(&mut conn, user.id)
			.await?
			.ok_or_else(|| MaintenanceError::not_found("detail", "No active session found"))
	}

	/// Replace the tokens of the user's most recent session, creating one
	/// when the user has none.
	pub async fn reissue_session(&self, user: &User) -> Result<AuthSession> {
		let new = self.new_session(user)?;
		let mut tx = begin_write(&self.pool).await?;
		let session = match Session::latest_for_user(&mut tx, user.id).await? {
			Some(existing) => Session::replace(&mut tx, existing.id, &new).await?,
			None => Session::insert(&mut tx, &new).await?,
		};
		tx.commit().await?;
		Ok(AuthSession::from_session(&session, None))
	}

	/// Mint a new access token from a refresh token.
	pub async fn refresh_access(&self, refresh_token: &str) -> Result<String> {
		let claims = self.tokens.verify(refresh_token, TokenType::Refresh)?;
		let user = self.active_user(claims.user_id()?).await?;
		self.tokens.issue(&user, TokenType::Access)
	}

	/// Resolve the user an access token belongs to.
	pub async fn authenticate(&self, access_token: &str) -> Result<User> {
		let claims = self.tokens.verify(access_token, TokenType::Access)?;
		self.active_user(claims.user_id()?).await
	}

	async fn active_user(&self, user_id: i64) -> Result<User> {
		let mut conn = self.pool.acquire().await?;
		User::find(&mut conn, user_id)
			.await?
			.filter(|user| user.is_active)
			.ok_or_else(|| MaintenanceError::Authentication("User not found or inactive".to_string()))
	}

	async fn profile_of(&self, conn: &mut SqliteConnection, user_id: i64) -> Result<UserProfile> {
		UserProfile::for_user(conn, user_id)
			.await?
			.ok_or_else(|| MaintenanceError::not_found("profile", "Not found."))
	}

	async fn profile_detail(&self, conn: &mut SqliteConnection, user: &User) -> Result<ProfileDetail> {
		let profile = self.profile_of(conn, user.id).await?;
		let properties = UserProfile::properties(conn, profile.id).await?;
		let profile_image = match &profile.profile_image {
			Some(name) => self.images.url_if_stored(name).await,
			None => None,
		};
		Ok(ProfileDetail {
			id: user.id,
			username: user.username.clone(),
			email: user.email.clone(),
			first_name: user.first_name.clone(),
			last_name: user.last_name.clone(),
			positions: profile.positions,
			profile_image,
			email_verified: profile.email_verified,
			login_provider: profile.login_provider,
			properties,
		})
	}

	pub async fn profile(&self, user: &User) -> Result<ProfileDetail> {
		let mut conn = self.pool.acquire().await?;
		self.profile_detail(&mut conn, user).await
	}

	/// Update positions and, when an upload is given, the profile picture.
	/// A picture that cannot be processed is logged and ignored.
	pub async fn update_profile(
		&self,
		user: &User,
		input: UpdateProfileInput,
		picture: Option<&UploadedFile>,
	) -> Result<ProfileDetail> {
		let stored = match picture {
			Some(upload) => match self.images.ingest(upload, ImageKind::Profile).await {
				Ok(stored) => Some(stored),
				Err(e) if e.is_processing() => {
					tracing::warn!("Profile image of {} skipped: {}", user.username, e);
					None
				}
				Err(e) => return Err(e.into()),
			},
			None => None,
		};

		let mut conn = self.pool.acquire().await?;
		let mut profile = match self.profile_of(&mut conn, user.id).await {
			Ok(profile) => profile,
			Err(e) => {
				if let Some(stored) = &stored {
					self.discard(&stored.name).await;
				}
				return Err(e);
			}
		};
		if let Some(positions) = input.positions {
			profile.positions = Some(positions);
		}
		let replaced = match &stored {
			Some(stored) => profile.profile_image.replace(stored.name.clone()),
			None => None,
		};
		if let Err(e) = profile.save(&mut conn).await {
			if let Some(stored) = &stored {
				self.discard(&stored.name).await;
			}
			return Err(e);
		}
		if let Some(old) = replaced {
			self.discard(&old).await;
		}

		tracing::info!("Profile of {} updated", user.username);
		self.profile_detail(&mut conn, user).await
	}

	async fn save_profile(&self, profile: &UserProfile) -> Result<()> {
		let mut conn = self.pool.acquire().await?;
		profile.save(&mut conn).await
	}

	async fn discard(&self, name: &str) {
		if let Err(e) = self.images.discard(name).await {
			tracing::error!("Failed to remove {}: {}", name, e);
		}
	}

	/// Link a property to the caller's profile.
	pub async fn add_profile_property(&self, user: &User, property_id: &str) -> Result<ProfileDetail> {
		let mut conn = self.pool.acquire().await?;
		let property = property_by_public_id(&mut conn, property_id).await?;
		let profile = self.profile_of(&mut conn, user.id).await?;
		UserProfile::add_property(&mut conn, profile.id, property.id).await?;
		self.profile_detail(&mut conn, user).await
	}

	pub async fn remove_profile_property(
		&self,
		user: &User,
		property_id: &str,
	) -> Result<ProfileDetail> {
		let mut conn = self.pool.acquire().await?;
		let property = property_by_public_id(&mut conn, property_id).await?;
		let profile = self.profile_of(&mut conn, user.id).await?;
		UserProfile::remove_property(&mut conn, profile.id, property.id).await?;
		self.profile_detail(&mut conn, user).await
	}

	/// Sign in with an identity-provider ID token, creating the account on
	/// first use.
	pub async fn exchange_identity(
		&self,
		id_token: &str,
		provider_access_token: Option<&str>,
	) -> Result<AuthSession> {
		let verifier = self
			.verifier
			.as_ref()
			.ok_or_else(|| MaintenanceError::Identity("No identity provider configured".to_string()))?;
		if id_token.trim().is_empty() {
			return Err(MaintenanceError::validation("id_token", "No ID token provided"));
		}

		let claims = verifier.verify(id_token).await?;
		let email = claims
			.email
			.clone()
			.filter(|email| !email.trim().is_empty())
			.ok_or_else(|| MaintenanceError::validation("email", "Email not provided by the identity provider"))?;

		let mut tx = begin_write(&self.pool).await?;
		let (user, mut profile) = self.resolve_identity(&mut tx, &claims, &email).await?;

		User::update_identity(
			&mut tx,
			user.id,
			claims.given_name.as_deref().unwrap_or_default(),
			claims.family_name.as_deref().unwrap_or_default(),
			&email,
		)
		.await?;
		profile.google_id = Some(claims.sub.clone());
		profile.email_verified = claims.email_verified;
		profile.login_provider = Some(verifier.provider().to_string());
		profile.access_token = provider_access_token.map(str::to_string);
		profile.save(&mut tx).await?;
		tx.commit().await?;

		if let Some(url) = claims.picture.as_deref() {
			self.import_picture(&mut profile, url).await;
		}

		let mut conn = self.pool.acquire().await?;
		let user = User::find(&mut conn, user.id)
			.await?
			.ok_or_else(|| MaintenanceError::Internal(format!("User {} vanished", user.id)))?;
		let session = self.issue_session(&mut conn, &user).await?;
		let detail = self.profile_detail(&mut conn, &user).await?;

		tracing::info!("Identity sign-in for {} via {}", user.username, verifier.provider());
		Ok(AuthSession::from_session(&session, Some(detail)))
	}

	/// Find the account for `claims`: by subject id, then by email (linking
	/// the subject), else create one.
	async fn resolve_identity(
		&self,
		conn: &mut SqliteConnection,
		claims: &IdentityClaims,
		email: &str,
	) -> Result<(User, UserProfile)> {
		if let Some(profile) = UserProfile::find_by_google_id(conn, &claims.sub).await? {
			if let Some(user) = User::find(conn, profile.user_id).await? {
				return Ok((user, profile));
			}
		}

		if let Some(user) = User::find_by_email(conn, email).await? {
			let profile = match UserProfile::for_user(conn, user.id).await? {
				Some(profile) => profile,
				None => UserProfile::insert(conn, user.id, Some(&claims.sub)).await?,
			};
			return Ok((user, profile));
		}

		let username = unique_username(conn, email).await?;
		let mut savepoint = conn.begin().await?;
		let user = User::insert(
			&mut savepoint,
			&NewUser {
				username: &username,
				email,
				password_hash: None,
				first_name: claims.given_name.as_deref().unwrap_or_default(),
				last_name: claims.family_name.as_deref().unwrap_or_default(),
			},
		)
		.await?;
		let profile = UserProfile::insert(&mut savepoint, user.id, Some(&claims.sub)).await?;
		savepoint.commit().await?;

		tracing::info!("Created user {} from identity provider", user.username);
		Ok((user, profile))
	}

	/// Download and store the provider's picture. Failures are logged only.
	async fn import_picture(&self, profile: &mut UserProfile, url: &str) {
		let Some(fetcher) = &self.pictures else {
			return;
		};
		let upload = match fetcher.fetch(url).await {
			Ok(upload) => upload,
			Err(e) => {
				tracing::warn!("Error downloading profile image from {}: {}", url, e);
				return;
			}
		};
		let stored = match self.images.ingest(&upload, ImageKind::Profile).await {
			Ok(stored) => stored,
			Err(e) => {
				tracing::warn!("Profile image from {} skipped: {}", url, e);
				return;
			}
		};

		let replaced = profile.profile_image.replace(stored.name.clone());
		match self.save_profile(profile).await {
			Ok(()) => {
				if let Some(old) = replaced {
					self.discard(&old).await;
				}
			}
			Err(e) => {
				tracing::warn!("Could not record profile image {}: {}", stored.name, e);
				profile.profile_image = replaced;
				self.discard(&stored.name).await;
			}
		}
	}
}

/// Username from the local part of `email`, suffixed with a counter until
/// it is free.
async fn unique_username(conn: &mut SqliteConnection, email: &str) -> Result<String> {
	let base = match email.split('@').next().map(str::trim) {
		Some(local) if !local.is_empty() => local.to_string(),
		_ => "user".to_string(),
	};
	let mut candidate = base.clone();
	let mut counter = 1;
	while User::username_exists(conn, &candidate).await? {
		candidate = format!("{}{}", base, counter);
		counter += 1;
	}
	Ok(candidate)
}
