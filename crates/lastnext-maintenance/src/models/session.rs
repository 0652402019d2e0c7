use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::error::Result;

/// A login session with the tokens issued for it.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Session {
	#[serde(skip)]
	pub id: i64,
	#[serde(skip)]
	pub user_id: i64,
	pub session_token: String,
	pub access_token: String,
	pub refresh_token: String,
	pub expires_at: DateTime<Utc>,
	pub created_at: DateTime<Utc>,
}

/// Values for a session insert or replacement.
#[derive(Debug, Clone)]
pub struct NewSession {
	pub user_id: i64,
	pub session_token: String,
	pub access_token: String,
	pub refresh_token: String,
	pub expires_at: DateTime<Utc>,
}

impl Session {
	pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
		now >= self.expires_at
	}

	pub async fn insert(conn: &mut SqliteConnection, new: &NewSession) -> Result<Self> {
		Ok(sqlx::query_as::<_, Self>(
			"INSERT INTO sessions (user_id, session_token, access_token, refresh_token, expires_at, created_at)
			 VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
		)
		.bind(new.user_id)
		.bind(&new.session_token)
		.bind(&new.access_token)
		.bind(&new.refresh_token)
		.bind(new.expires_at)
		.bind(Utc::now())
		.fetch_one(&mut *conn)
		.await?)
	}

	/// Most recent session of a user.
	pub async fn latest_for_user(conn: &mut SqliteConnection, user_id: i64) -> Result<Option<Self>> {
		Ok(sqlx::query_as::<_, Self>(
			"SELECT * FROM sessions WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT 1",
		)
		.bind(user_id)
		.fetch_optional(&mut *conn)
		.await?)
	}

	/// Overwrite the tokens and expiry of an existing session.
	pub async fn replace(conn: &mut SqliteConnection, id: i64, new: &NewSession) -> Result<Self> {
		Ok(sqlx::query_as::<_, Self>(
			"UPDATE sessions SET session_token = ?, access_token = ?, refresh_token = ?, expires_at = ?
			 WHERE id = ? RETURNING *",
		)
		.bind(&new.session_token)
		.bind(&new.access_token)
		.bind(&new.refresh_token)
		.bind(new.expires_at)
		.bind(id)
		.fetch_one(&mut *conn)
		.await?)
	}

	/// Delete the user's session with `session_token`. Returns whether one
	/// was removed.
	pub async fn delete_for_user(
		conn: &mut SqliteConnection,
		user_id: i64,
		session_token: &str,
	) -> Result<bool> {
		let result = sqlx::query("DELETE FROM sessions WHERE user_id = ? AND session_token = ?")
			.bind(user_id)
			.bind(session_token)
			.execute(&mut *conn)
			.await?;
		Ok(result.rows_affected() > 0)
	}
}
