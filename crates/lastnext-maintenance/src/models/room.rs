use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::error::Result;
use crate::models::Property;

/// A room, attachable to any number of properties.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Room {
	pub id: i64,
	pub name: String,
	pub room_type: String,
	pub is_active: bool,
	pub created_at: DateTime<Utc>,
	/// Ids of the properties this room belongs to
	#[sqlx(skip)]
	pub properties: Vec<i64>,
}

impl Room {
	async fn with_properties(mut self, conn: &mut SqliteConnection) -> Result<Self> {
		self.properties = Self::property_ids(conn, self.id).await?;
		Ok(self)
	}

	async fn load_all(conn: &mut SqliteConnection, rooms: Vec<Self>) -> Result<Vec<Self>> {
		let mut loaded = Vec::with_capacity(rooms.len());
		for room in rooms {
			loaded.push(room.with_properties(conn).await?);
		}
		Ok(loaded)
	}

	pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Self>> {
		let room = sqlx::query_as::<_, Self>("SELECT * FROM rooms WHERE id = ?")
			.bind(id)
			.fetch_optional(&mut *conn)
			.await?;
		match room {
			Some(room) => Ok(Some(room.with_properties(conn).await?)),
			None => Ok(None),
		}
	}

	pub async fn name_exists(conn: &mut SqliteConnection, name: &str) -> Result<bool> {
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms WHERE name = ?")
			.bind(name)
			.fetch_one(&mut *conn)
			.await?;
		Ok(count > 0)
	}

	pub async fn insert(
		conn: &mut SqliteConnection,
		name: &str,
		room_type: &str,
		is_active: bool,
	) -> Result<Self> {
		Ok(sqlx::query_as::<_, Self>(
			"INSERT INTO rooms (name, room_type, is_active, created_at)
			 VALUES (?, ?, ?, ?) RETURNING *",
		)
		.bind(name)
		.bind(room_type)
		.bind(is_active)
		.bind(Utc::now())
		.fetch_one(&mut *conn)
		.await?)
	}

	pub async fn set_active(conn: &mut SqliteConnection, id: i64, active: bool) -> Result<bool> {
		let result = sqlx::query("UPDATE rooms SET is_active = ? WHERE id = ?")
			.bind(active)
			.bind(id)
			.execute(&mut *conn)
			.await?;
		Ok(result.rows_affected() > 0)
	}

	pub async fn attach_property(
		conn: &mut SqliteConnection,
		id: i64,
		property_pk: i64,
	) -> Result<()> {
		sqlx::query("INSERT OR IGNORE INTO room_properties (room_id, property_id) VALUES (?, ?)")
			.bind(id)
			.bind(property_pk)
			.execute(&mut *conn)
			.await?;
		Ok(())
	}

	pub async fn property_ids(conn: &mut SqliteConnection, id: i64) -> Result<Vec<i64>> {
		Ok(sqlx::query_scalar(
			"SELECT property_id FROM room_properties WHERE room_id = ? ORDER BY property_id",
		)
		.bind(id)
		.fetch_all(&mut *conn)
		.await?)
	}

	/// The property a job filed against this room falls under: the
	/// associated property with the lowest id.
	pub async fn adopted_property(
		conn: &mut SqliteConnection,
		id: i64,
	) -> Result<Option<Property>> {
		Ok(sqlx::query_as::<_, Property>(
			"SELECT p.* FROM properties p
			 JOIN room_properties rp ON rp.property_id = p.id
			 WHERE rp.room_id = ?
			 ORDER BY p.id
			 LIMIT 1",
		)
		.bind(id)
		.fetch_optional(&mut *conn)
		.await?)
	}

	pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Self>> {
		let rooms = sqlx::query_as::<_, Self>("SELECT * FROM rooms ORDER BY room_type, name")
			.fetch_all(&mut *conn)
			.await?;
		Self::load_all(conn, rooms).await
	}

	/// Rooms of a property, ordered by type then name.
	pub async fn for_property(conn: &mut SqliteConnection, property_pk: i64) -> Result<Vec<Self>> {
		let rooms = sqlx::query_as::<_, Self>(
			"SELECT r.* FROM rooms r
			 JOIN room_properties rp ON rp.room_id = r.id
			 WHERE rp.property_id = ?
			 ORDER BY r.room_type, r.name",
		)
		.bind(property_pk)
		.fetch_all(&mut *conn)
		.await?;
		Self::load_all(conn, rooms).await
	}

	/// Rooms linked to a job, ordered by type then name.
	pub async fn for_job(conn: &mut SqliteConnection, job_pk: i64) -> Result<Vec<Self>> {
		let rooms = sqlx::query_as::<_, Self>(
			"SELECT r.* FROM rooms r
			 JOIN job_rooms jr ON jr.room_id = r.id
			 WHERE jr.job_id = ?
			 ORDER BY r.room_type, r.name",
		)
		.bind(job_pk)
		.fetch_all(&mut *conn)
		.await?;
		Self::load_all(conn, rooms).await
	}
}
