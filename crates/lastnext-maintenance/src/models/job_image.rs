use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::error::Result;

/// A photo attached to a job.
///
/// `image` is the storage name of the normalized file, or `None` when the
/// upload could not be processed.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct JobImage {
	pub id: i64,
	/// Primary key of the owning job
	pub job_id: i64,
	pub image: Option<String>,
	pub uploaded_by: Option<i64>,
	pub uploaded_at: DateTime<Utc>,
}

impl JobImage {
	pub async fn insert(
		conn: &mut SqliteConnection,
		job_pk: i64,
		image: Option<&str>,
		uploaded_by: Option<i64>,
	) -> Result<Self> {
		Ok(sqlx::query_as::<_, Self>(
			"INSERT INTO job_images (job_id, image, uploaded_by, uploaded_at)
			 VALUES (?, ?, ?, ?) RETURNING *",
		)
		.bind(job_pk)
		.bind(image)
		.bind(uploaded_by)
		.bind(Utc::now())
		.fetch_one(&mut *conn)
		.await?)
	}

	pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Self>> {
		Ok(sqlx::query_as::<_, Self>("SELECT * FROM job_images WHERE id = ?")
			.bind(id)
			.fetch_optional(&mut *conn)
			.await?)
	}

	/// Images of a job, newest first.
	pub async fn for_job(conn: &mut SqliteConnection, job_pk: i64) -> Result<Vec<Self>> {
		Ok(sqlx::query_as::<_, Self>(
			"SELECT * FROM job_images WHERE job_id = ? ORDER BY uploaded_at DESC, id DESC",
		)
		.bind(job_pk)
		.fetch_all(&mut *conn)
		.await?)
	}

	pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<()> {
		sqlx::query("DELETE FROM job_images WHERE id = ?")
			.bind(id)
			.execute(&mut *conn)
			.await?;
		Ok(())
	}
}
