use serde::Serialize;
use sqlx::{Connection, SqliteConnection};

use crate::db::is_unique_violation;
use crate::error::{MaintenanceError, Result};

/// Longest accepted topic title, in characters.
pub const TITLE_MAX_LENGTH: usize = 160;

/// Subject of a job, unique by title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Topic {
	pub id: i64,
	pub title: String,
	pub description: Option<String>,
}

impl Topic {
	pub async fn find_by_title(conn: &mut SqliteConnection, title: &str) -> Result<Option<Self>> {
		Ok(sqlx::query_as::<_, Self>("SELECT * FROM topics WHERE title = ?")
			.bind(title)
			.fetch_optional(&mut *conn)
			.await?)
	}

	pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Self>> {
		Ok(sqlx::query_as::<_, Self>("SELECT * FROM topics ORDER BY title")
			.fetch_all(&mut *conn)
			.await?)
	}

	/// The topic titled `title`, created with `description` when absent.
	///
	/// An existing topic keeps its description. Concurrent callers with the
	/// same title all receive the same row.
	pub async fn get_or_create(
		conn: &mut SqliteConnection,
		title: &str,
		description: Option<&str>,
	) -> Result<Self> {
		if let Some(topic) = Self::find_by_title(conn, title).await? {
			return Ok(topic);
		}
		Self::insert_or_fetch(conn, title, description).await
	}

	/// Insert inside a savepoint; when another writer won the race the
	/// savepoint is rolled back and the winner's row returned.
	pub(crate) async fn insert_or_fetch(
		conn: &mut SqliteConnection,
		title: &str,
		description: Option<&str>,
	) -> Result<Self> {
		let mut savepoint = conn.begin().await?;
		let inserted = sqlx::query_as::<_, Self>(
			"INSERT INTO topics (title, description) VALUES (?, ?) RETURNING *",
		)
		.bind(title)
		.bind(description)
		.fetch_one(&mut *savepoint)
		.await;

		match inserted {
			Ok(topic) => {
				savepoint.commit().await?;
				tracing::info!("Created topic {:?}", topic.title);
				Ok(topic)
			}
			Err(e) if is_unique_violation(&e) => {
				savepoint.rollback().await?;
				Self::find_by_title(conn, title).await?.ok_or_else(|| {
					MaintenanceError::Internal(format!(
						"Topic {:?} vanished after a unique violation",
						title
					))
				})
			}
			Err(e) => Err(e.into()),
		}
	}

	/// Topics linked to a job, by title.
	pub async fn for_job(conn: &mut SqliteConnection, job_pk: i64) -> Result<Vec<Self>> {
		Ok(sqlx::query_as::<_, Self>(
			"SELECT t.* FROM topics t
			 JOIN job_topics jt ON jt.topic_id = t.id
			 WHERE jt.job_id = ?
			 ORDER BY t.title",
		)
		.bind(job_pk)
		.fetch_all(&mut *conn)
		.await?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::db::testing::memory_pool;
	use rstest::rstest;

	#[rstest]
	#[tokio::test]
	async fn test_insert_or_fetch_returns_existing_row_on_conflict() {
		let pool = memory_pool().await;
		let mut conn = pool.acquire().await.unwrap();
		let winner = Topic::insert_or_fetch(&mut conn, "Plumbing", Some("first"))
			.await
			.unwrap();

		// Simulates losing the race: the pre-check was skipped
		let loser = Topic::insert_or_fetch(&mut conn, "Plumbing", Some("second"))
			.await
			.unwrap();

		assert_eq!(loser, winner);
		assert_eq!(loser.description.as_deref(), Some("first"));
		assert_eq!(Topic::list(&mut conn).await.unwrap().len(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_get_or_create_keeps_description() {
		let pool = memory_pool().await;
		let mut conn = pool.acquire().await.unwrap();

		let first = Topic::get_or_create(&mut conn, "Electrical", None).await.unwrap();
		let second = Topic::get_or_create(&mut conn, "Electrical", Some("ignored"))
			.await
			.unwrap();

		assert_eq!(first.id, second.id);
		assert_eq!(second.description, None);
	}
}
