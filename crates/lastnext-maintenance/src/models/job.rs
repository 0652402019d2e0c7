use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use std::fmt;
use std::str::FromStr;

use crate::error::Result;

/// Workflow state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum JobStatus {
	#[default]
	Pending,
	InProgress,
	WaitingSparepart,
	Completed,
	Cancelled,
}

impl JobStatus {
	pub const ALL: [JobStatus; 5] = [
		JobStatus::Pending,
		JobStatus::InProgress,
		JobStatus::WaitingSparepart,
		JobStatus::Completed,
		JobStatus::Cancelled,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			JobStatus::Pending => "pending",
			JobStatus::InProgress => "in_progress",
			JobStatus::WaitingSparepart => "waiting_sparepart",
			JobStatus::Completed => "completed",
			JobStatus::Cancelled => "cancelled",
		}
	}
}

impl fmt::Display for JobStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for JobStatus {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|status| status.as_str() == s)
			.ok_or_else(|| format!("\"{}\" is not a valid choice.", s))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum JobPriority {
	Low,
	#[default]
	Medium,
	High,
}

impl JobPriority {
	pub fn as_str(self) -> &'static str {
		match self {
			JobPriority::Low => "low",
			JobPriority::Medium => "medium",
			JobPriority::High => "high",
		}
	}
}

impl FromStr for JobPriority {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"low" => Ok(JobPriority::Low),
			"medium" => Ok(JobPriority::Medium),
			"high" => Ok(JobPriority::High),
			_ => Err(format!("\"{}\" is not a valid choice.", s)),
		}
	}
}

/// A maintenance ticket row.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Job {
	pub id: i64,
	pub job_id: String,
	/// Creator
	pub user_id: i64,
	pub updated_by: Option<i64>,
	/// Primary key of the property, when resolved
	pub property_id: Option<i64>,
	pub description: String,
	pub remarks: String,
	pub status: JobStatus,
	pub priority: JobPriority,
	pub is_defective: bool,
	pub is_preventivemaintenance: bool,
	pub due_date: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub completed_at: Option<DateTime<Utc>>,
}

/// Values for a job insert.
#[derive(Debug, Clone)]
pub struct NewJob {
	pub user_id: i64,
	pub property_id: Option<i64>,
	pub description: String,
	pub remarks: String,
	pub status: JobStatus,
	pub priority: JobPriority,
	pub is_defective: bool,
	pub is_preventivemaintenance: bool,
	pub due_date: Option<DateTime<Utc>>,
}

impl Job {
	/// Move to `status`, stamping `completed_at` the first time the job
	/// becomes completed. The stamp is never cleared or moved.
	pub fn apply_status(&mut self, status: JobStatus, now: DateTime<Utc>) {
		if status == JobStatus::Completed && self.completed_at.is_none() {
			self.completed_at = Some(now);
		}
		self.status = status;
	}

	pub async fn find_by_job_id(conn: &mut SqliteConnection, job_id: &str) -> Result<Option<Self>> {
		Ok(sqlx::query_as::<_, Self>("SELECT * FROM jobs WHERE job_id = ?")
			.bind(job_id)
			.fetch_optional(&mut *conn)
			.await?)
	}

	/// All jobs, newest first.
	pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Self>> {
		Ok(
			sqlx::query_as::<_, Self>("SELECT * FROM jobs ORDER BY created_at DESC, id DESC")
				.fetch_all(&mut *conn)
				.await?,
		)
	}

	/// Insert a row under `job_id`. Unique violations are returned as-is so
	/// the caller can retry with another identifier.
	pub(crate) async fn insert(
		conn: &mut SqliteConnection,
		job_id: &str,
		new: &NewJob,
		now: DateTime<Utc>,
	) -> std::result::Result<Self, sqlx::Error> {
		let completed_at = (new.status == JobStatus::Completed).then_some(now);
		sqlx::query_as::<_, Self>(
			"INSERT INTO jobs (
				job_id, user_id, updated_by, property_id, description, remarks, status,
				priority, is_defective, is_preventivemaintenance, due_date, created_at,
				updated_at, completed_at
			 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			 RETURNING *",
		)
		.bind(job_id)
		.bind(new.user_id)
		.bind(new.user_id)
		.bind(new.property_id)
		.bind(&new.description)
		.bind(&new.remarks)
		.bind(new.status)
		.bind(new.priority)
		.bind(new.is_defective)
		.bind(new.is_preventivemaintenance)
		.bind(new.due_date)
		.bind(now)
		.bind(now)
		.bind(completed_at)
		.fetch_one(&mut *conn)
		.await
	}

	/// Persist every mutable column. `updated_at` is set to `now`.
	pub async fn save(&mut self, conn: &mut SqliteConnection, now: DateTime<Utc>) -> Result<()> {
		self.updated_at = now;
		sqlx::query(
			"UPDATE jobs SET
				updated_by = ?, property_id = ?, description = ?, remarks = ?, status = ?,
				priority = ?, is_defective = ?, is_preventivemaintenance = ?, due_date = ?,
				updated_at = ?, completed_at = ?
			 WHERE id = ?",
		)
		.bind(self.updated_by)
		.bind(self.property_id)
		.bind(&self.description)
		.bind(&self.remarks)
		.bind(self.status)
		.bind(self.priority)
		.bind(self.is_defective)
		.bind(self.is_preventivemaintenance)
		.bind(self.due_date)
		.bind(self.updated_at)
		.bind(self.completed_at)
		.bind(self.id)
		.execute(&mut *conn)
		.await?;
		Ok(())
	}

	/// Link a room; linking an already attached room is a no-op.
	pub async fn add_room(conn: &mut SqliteConnection, id: i64, room_id: i64) -> Result<()> {
		sqlx::query("INSERT OR IGNORE INTO job_rooms (job_id, room_id) VALUES (?, ?)")
			.bind(id)
			.bind(room_id)
			.execute(&mut *conn)
			.await?;
		Ok(())
	}

	/// Link a topic; linking an already attached topic is a no-op.
	pub async fn add_topic(conn: &mut SqliteConnection, id: i64, topic_id: i64) -> Result<()> {
		sqlx::query("INSERT OR IGNORE INTO job_topics (job_id, topic_id) VALUES (?, ?)")
			.bind(id)
			.bind(topic_id)
			.execute(&mut *conn)
			.await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;
	use rstest::rstest;

	fn job() -> Job {
		let now = Utc::now();
		Job {
			id: 1,
			job_id: "j24ABCDEF".to_string(),
			user_id: 1,
			updated_by: Some(1),
			property_id: None,
			description: "Leaking tap".to_string(),
			remarks: "Room 12".to_string(),
			status: JobStatus::Pending,
			priority: JobPriority::Medium,
			is_defective: false,
			is_preventivemaintenance: false,
			due_date: None,
			created_at: now,
			updated_at: now,
			completed_at: None,
		}
	}

	#[rstest]
	fn test_completed_at_keeps_first_completion() {
		let mut job = job();
		let t1 = Utc::now();
		let t2 = t1 + Duration::minutes(5);
		let t3 = t2 + Duration::minutes(5);

		job.apply_status(JobStatus::Completed, t1);
		assert_eq!(job.completed_at, Some(t1));

		job.apply_status(JobStatus::InProgress, t2);
		assert_eq!(job.completed_at, Some(t1));

		job.apply_status(JobStatus::Completed, t3);
		assert_eq!(job.completed_at, Some(t1));
		assert_eq!(job.status, JobStatus::Completed);
	}

	#[rstest]
	#[case("pending", JobStatus::Pending)]
	#[case("in_progress", JobStatus::InProgress)]
	#[case("waiting_sparepart", JobStatus::WaitingSparepart)]
	#[case("completed", JobStatus::Completed)]
	#[case("cancelled", JobStatus::Cancelled)]
	fn test_status_from_str(#[case] input: &str, #[case] expected: JobStatus) {
		assert_eq!(input.parse::<JobStatus>().unwrap(), expected);
		assert_eq!(expected.to_string(), input);
	}

	#[rstest]
	#[case("done")]
	#[case("Completed")]
	#[case("")]
	fn test_status_rejects_unknown(#[case] input: &str) {
		assert!(input.parse::<JobStatus>().is_err());
	}

	#[rstest]
	fn test_defaults() {
		assert_eq!(JobStatus::default(), JobStatus::Pending);
		assert_eq!(JobPriority::default(), JobPriority::Medium);
		assert_eq!("high".parse::<JobPriority>().unwrap().as_str(), "high");
	}
}
