use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::error::Result;
use crate::models::Property;

/// An account.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
	pub id: i64,
	pub username: String,
	pub email: String,
	/// Argon2 PHC string; `None` for accounts created through an identity
	/// provider
	#[serde(skip)]
	pub password_hash: Option<String>,
	pub first_name: String,
	pub last_name: String,
	pub is_active: bool,
	pub date_joined: DateTime<Utc>,
}

/// Values for a user insert.
#[derive(Debug, Clone, Default)]
pub struct NewUser<'a> {
	pub username: &'a str,
	pub email: &'a str,
	pub password_hash: Option<&'a str>,
	pub first_name: &'a str,
	pub last_name: &'a str,
}

impl User {
	pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Self>> {
		Ok(sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = ?")
			.bind(id)
			.fetch_optional(&mut *conn)
			.await?)
	}

	pub async fn find_by_username(
		conn: &mut SqliteConnection,
		username: &str,
	) -> Result<Option<Self>> {
		Ok(sqlx::query_as::<_, Self>("SELECT * FROM users WHERE username = ?")
			.bind(username)
			.fetch_optional(&mut *conn)
			.await?)
	}

	/// First account registered with `email`.
	pub async fn find_by_email(conn: &mut SqliteConnection, email: &str) -> Result<Option<Self>> {
		Ok(
			sqlx::query_as::<_, Self>("SELECT * FROM users WHERE email = ? ORDER BY id LIMIT 1")
				.bind(email)
				.fetch_optional(&mut *conn)
				.await?,
		)
	}

	pub async fn username_exists(conn: &mut SqliteConnection, username: &str) -> Result<bool> {
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
			.bind(username)
			.fetch_one(&mut *conn)
			.await?;
		Ok(count > 0)
	}

	pub async fn email_exists(conn: &mut SqliteConnection, email: &str) -> Result<bool> {
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
			.bind(email)
			.fetch_one(&mut *conn)
			.await?;
		Ok(count > 0)
	}

	/// Insert the user row only; account creation inserts the profile in
	/// the same transaction.
	pub(crate) async fn insert(
		conn: &mut SqliteConnection,
		new: &NewUser<'_>,
	) -> std::result::Result<Self, sqlx::Error> {
		sqlx::query_as::<_, Self>(
			"INSERT INTO users (username, email, password_hash, first_name, last_name, is_active, date_joined)
			 VALUES (?, ?, ?, ?, ?, 1, ?) RETURNING *",
		)
		.bind(new.username)
		.bind(new.email)
		.bind(new.password_hash)
		.bind(new.first_name)
		.bind(new.last_name)
		.bind(Utc::now())
		.fetch_one(&mut *conn)
		.await
	}

	pub async fn update_identity(
		conn: &mut SqliteConnection,
		id: i64,
		first_name: &str,
		last_name: &str,
		email: &str,
	) -> Result<()> {
		sqlx::query("UPDATE users SET first_name = ?, last_name = ?, email = ? WHERE id = ?")
			.bind(first_name)
			.bind(last_name)
			.bind(email)
			.bind(id)
			.execute(&mut *conn)
			.await?;
		Ok(())
	}
}

/// Per-user profile, created together with its user.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct UserProfile {
	pub id: i64,
	pub user_id: i64,
	pub positions: Option<String>,
	/// Storage name of the normalized profile picture
	pub profile_image: Option<String>,
	pub google_id: Option<String>,
	pub email_verified: bool,
	/// Access token issued by the identity provider
	#[serde(skip)]
	pub access_token: Option<String>,
	pub login_provider: Option<String>,
}

impl UserProfile {
	pub(crate) async fn insert(
		conn: &mut SqliteConnection,
		user_id: i64,
		google_id: Option<&str>,
	) -> Result<Self> {
		Ok(sqlx::query_as::<_, Self>(
			"INSERT INTO user_profiles (user_id, google_id) VALUES (?, ?) RETURNING *",
		)
		.bind(user_id)
		.bind(google_id)
		.fetch_one(&mut *conn)
		.await?)
	}

	pub async fn for_user(conn: &mut SqliteConnection, user_id: i64) -> Result<Option<Self>> {
		Ok(
			sqlx::query_as::<_, Self>("SELECT * FROM user_profiles WHERE user_id = ?")
				.bind(user_id)
				.fetch_optional(&mut *conn)
				.await?,
		)
	}

	pub async fn find_by_google_id(
		conn: &mut SqliteConnection,
		google_id: &str,
	) -> Result<Option<Self>> {
		Ok(sqlx::query_as::<_, Self>(
			"SELECT * FROM user_profiles WHERE google_id = ? ORDER BY id LIMIT 1",
		)
		.bind(google_id)
		.fetch_optional(&mut *conn)
		.await?)
	}

	/// Persist every mutable column.
	pub async fn save(&self, conn: &mut SqliteConnection) -> Result<()> {
		sqlx::query(
			"UPDATE user_profiles SET
				positions = ?, profile_image = ?, google_id = ?, email_verified = ?,
				access_token = ?, login_provider = ?
			 WHERE id = ?",
		)
		.bind(&self.positions)
		.bind(&self.profile_image)
		.bind(&self.google_id)
		.bind(self.email_verified)
		.bind(&self.access_token)
		.bind(&self.login_provider)
		.bind(self.id)
		.execute(&mut *conn)
		.await?;
		Ok(())
	}

	/// Properties linked to this profile, by name.
	pub async fn properties(conn: &mut SqliteConnection, id: i64) -> Result<Vec<Property>> {
		Ok(sqlx::query_as::<_, Property>(
			"SELECT p.* FROM properties p
			 JOIN profile_properties pp ON pp.property_id = p.id
			 WHERE pp.profile_id = ?
			 ORDER BY p.name",
		)
		.bind(id)
		.fetch_all(&mut *conn)
		.await?)
	}

	pub async fn add_property(conn: &mut SqliteConnection, id: i64, property_pk: i64) -> Result<()> {
		sqlx::query(
			"INSERT OR IGNORE INTO profile_properties (profile_id, property_id) VALUES (?, ?)",
		)
		.bind(id)
		.bind(property_pk)
		.execute(&mut *conn)
		.await?;
		Ok(())
	}

	pub async fn remove_property(
		conn: &mut SqliteConnection,
		id: i64,
		property_pk: i64,
	) -> Result<()> {
		sqlx::query("DELETE FROM profile_properties WHERE profile_id = ? AND property_id = ?")
			.bind(id)
			.bind(property_pk)
			.execute(&mut *conn)
			.await?;
		Ok(())
	}
}
