use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::db::is_unique_violation;
use crate::error::{MaintenanceError, Result};
use crate::ids::generate_property_id;

const INSERT_ATTEMPTS: usize = 5;

/// A building or site that owns rooms.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Property {
	pub id: i64,
	/// Public identifier, `P` followed by eight hex characters
	pub property_id: String,
	pub name: String,
	pub description: Option<String>,
	pub created_at: DateTime<Utc>,
}

impl Property {
	pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Self>> {
		Ok(sqlx::query_as::<_, Self>("SELECT * FROM properties WHERE id = ?")
			.bind(id)
			.fetch_optional(&mut *conn)
			.await?)
	}

	pub async fn find_by_property_id(
		conn: &mut SqliteConnection,
		property_id: &str,
	) -> Result<Option<Self>> {
		Ok(
			sqlx::query_as::<_, Self>("SELECT * FROM properties WHERE property_id = ?")
				.bind(property_id)
				.fetch_optional(&mut *conn)
				.await?,
		)
	}

	pub async fn name_exists(conn: &mut SqliteConnection, name: &str) -> Result<bool> {
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM properties WHERE name = ?")
			.bind(name)
			.fetch_one(&mut *conn)
			.await?;
		Ok(count > 0)
	}

	/// Insert with a freshly generated `property_id`, retrying on the rare
	/// identifier collision.
	pub async fn insert(
		conn: &mut SqliteConnection,
		name: &str,
		description: Option<&str>,
	) -> Result<Self> {
		for _ in 0..INSERT_ATTEMPTS {
			let result = sqlx::query_as::<_, Self>(
				"INSERT INTO properties (property_id, name, description, created_at)
				 VALUES (?, ?, ?, ?) RETURNING *",
			)
			.bind(generate_property_id())
			.bind(name)
			.bind(description)
			.bind(Utc::now())
			.fetch_one(&mut *conn)
			.await;

			match result {
				Ok(property) => return Ok(property),
				Err(e) if is_unique_violation(&e) => {
					if Self::name_exists(conn, name).await? {
						return Err(MaintenanceError::validation(
							"name",
							"property with this name already exists.",
						));
					}
					tracing::debug!("property_id collision, retrying");
				}
				Err(e) => return Err(e.into()),
			}
		}
		Err(MaintenanceError::Internal(
			"Could not generate a unique property_id".to_string(),
		))
	}

	/// Ids of the users with access to this property.
	pub async fn user_ids(conn: &mut SqliteConnection, id: i64) -> Result<Vec<i64>> {
		Ok(sqlx::query_scalar(
			"SELECT user_id FROM property_users WHERE property_id = ? ORDER BY user_id",
		)
		.bind(id)
		.fetch_all(&mut *conn)
		.await?)
	}

	/// Properties a user has been granted access to, by name.
	pub async fn for_user(conn: &mut SqliteConnection, user_id: i64) -> Result<Vec<Self>> {
		Ok(sqlx::query_as::<_, Self>(
			"SELECT p.* FROM properties p
			 JOIN property_users pu ON pu.property_id = p.id
			 WHERE pu.user_id = ?
			 ORDER BY p.name",
		)
		.bind(user_id)
		.fetch_all(&mut *conn)
		.await?)
	}

	pub async fn grant_user(conn: &mut SqliteConnection, id: i64, user_id: i64) -> Result<()> {
		sqlx::query("INSERT OR IGNORE INTO property_users (property_id, user_id) VALUES (?, ?)")
			.bind(id)
			.bind(user_id)
			.execute(&mut *conn)
			.await?;
		Ok(())
	}
}
