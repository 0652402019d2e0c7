//! Job lifecycle: create, update, status transitions and images.

use chrono::{DateTime, Utc};
use lastnext_images::{ImageKind, ImagePipeline, UploadedFile};
use serde::Serialize;
use sqlx::{Connection, SqliteConnection, SqlitePool};

use crate::db::{begin_write, is_unique_violation};
use crate::error::{FieldErrors, MaintenanceError, Result};
use crate::ids::generate_job_id;
use crate::inputs::{CreateJobInput, TopicData, UpdateJobInput};
use crate::models::job::NewJob;
use crate::models::{Job, JobImage, JobPriority, JobStatus, Property, Room, Topic, User, UserProfile};
use crate::topics::validate_title;

/// Attempts at finding an unused `job_id` before giving up.
pub const JOB_ID_ATTEMPTS: usize = 5;

const PREVENTIVE_REQUIRED: &str = "This field is required for preventive maintenance jobs.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobImageDetail {
	pub id: i64,
	pub image_url: Option<String>,
	pub uploaded_by: Option<i64>,
	pub uploaded_at: DateTime<Utc>,
}

/// A job with its related records resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDetail {
	pub id: i64,
	pub job_id: String,
	/// Creator's username
	pub user: String,
	/// Username of the last user to change the job
	pub updated_by: Option<String>,
	pub description: String,
	pub status: JobStatus,
	pub priority: JobPriority,
	pub remarks: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub completed_at: Option<DateTime<Utc>>,
	pub is_defective: bool,
	pub is_preventivemaintenance: bool,
	pub due_date: Option<DateTime<Utc>>,
	pub rooms: Vec<Room>,
	pub topics: Vec<Topic>,
	pub images: Vec<JobImageDetail>,
	pub image_urls: Vec<String>,
	/// Creator's profile picture
	pub profile_image: Option<String>,
	pub property_id: Option<String>,
	pub property_name: Option<String>,
}

fn parse_status(value: &str, errors: &mut FieldErrors) -> Option<JobStatus> {
	value
		.parse::<JobStatus>()
		.map_err(|message| errors.add("status", message))
		.ok()
}

fn parse_priority(value: &str, errors: &mut FieldErrors) -> Option<JobPriority> {
	value
		.parse::<JobPriority>()
		.map_err(|message| errors.add("priority", message))
		.ok()
}

fn blank_property_id(property_id: Option<&str>) -> Option<&str> {
	property_id.filter(|p| !p.trim().is_empty())
}

struct ValidCreate {
	status: JobStatus,
	priority: JobPriority,
}

/// Failed creates report anything other than a field or reference error as
/// a `detail` validation error carrying the original message.
fn create_failure(err: MaintenanceError) -> MaintenanceError {
	match err {
		MaintenanceError::Validation(_) | MaintenanceError::NotFound { .. } => err,
		other => {
			tracing::error!("Job creation failed: {}", other);
			MaintenanceError::validation("detail", other.to_string())
		}
	}
}

fn validate_create(input: &CreateJobInput) -> Result<ValidCreate> {
	let mut errors = FieldErrors::new();

	if input.description.trim().is_empty() {
		errors.add("description", "This field is required.");
	}
	if input.remarks.trim().is_empty() {
		errors.add("remarks", "This field is required.");
	}
	let status = input
		.status
		.as_deref()
		.and_then(|s| parse_status(s, &mut errors))
		.unwrap_or_default();
	let priority = input
		.priority
		.as_deref()
		.and_then(|p| parse_priority(p, &mut errors))
		.unwrap_or_default();

	let topic = input.topic_data.as_ref().filter(|t| t.has_title());
	if let Some(topic) = topic {
		validate_title(&topic.title, "topic_data", &mut errors);
	}
	if input.is_preventivemaintenance {
		if input.room_id.is_none() {
			errors.add("room_id", PREVENTIVE_REQUIRED);
		}
		if topic.is_none() {
			errors.add("topic_data", PREVENTIVE_REQUIRED);
		}
	}

	errors.into_result()?;
	Ok(ValidCreate { status, priority })
}

/// Insert a job, drawing a new identifier from `next_id` whenever the
/// previous one is already taken. Each attempt runs in its own savepoint.
pub(crate) async fn insert_job<F>(
	conn: &mut SqliteConnection,
	new: &NewJob,
	now: DateTime<Utc>,
	mut next_id: F,
) -> Result<Job>
where
	F: FnMut() -> String,
{
	for attempt in 1..=JOB_ID_ATTEMPTS {
		let job_id = next_id();
		let mut savepoint = conn.begin().await?;
		match Job::insert(&mut savepoint, &job_id, new, now).await {
			Ok(job) => {
				savepoint.commit().await?;
				return Ok(job);
			}
			Err(e) if is_unique_violation(&e) => {
				savepoint.rollback().await?;
				tracing::warn!("job_id {} already taken (attempt {})", job_id, attempt);
			}
			Err(e) => return Err(e.into()),
		}
	}
	Err(MaintenanceError::Internal(format!(
		"Could not generate a unique job_id after {} attempts",
		JOB_ID_ATTEMPTS
	)))
}

async fn resolve_property(conn: &mut SqliteConnection, property_id: &str) -> Result<Property> {
	Property::find_by_property_id(conn, property_id)
		.await?
		.ok_or_else(|| MaintenanceError::invalid_reference("property_id", "Invalid property ID"))
}

async fn resolve_room(conn: &mut SqliteConnection, room_id: i64) -> Result<Room> {
	Room::find(conn, room_id)
		.await?
		.ok_or_else(|| MaintenanceError::invalid_reference("room_id", "Invalid room ID"))
}

async fn resolve_topic(conn: &mut SqliteConnection, data: &TopicData) -> Result<Topic> {
	Topic::get_or_create(conn, &data.title, data.description.as_deref()).await
}

async fn job_by_job_id(conn: &mut SqliteConnection, job_id: &str) -> Result<Job> {
	Job::find_by_job_id(conn, job_id)
		.await?
		.ok_or_else(|| MaintenanceError::not_found("job_id", "Not found."))
}

/// Creates and changes jobs.
#[derive(Clone)]
pub struct JobManager {
	pool: SqlitePool,
	images: ImagePipeline,
}

impl JobManager {
	pub fn new(pool: SqlitePool, images: ImagePipeline) -> Self {
		Self { pool, images }
	}

	/// Create a job filed by `actor`, with `uploads` attached as images.
	///
	/// Runs in one transaction. On failure nothing is persisted and files
	/// already written for this call are removed. Uploads that are not
	/// usable images are logged and kept as image rows without a file.
	pub async fn create(
		&self,
		input: CreateJobInput,
		actor: &User,
		uploads: &[UploadedFile],
	) -> Result<JobDetail> {
		let valid = validate_create(&input)?;

		let mut written = Vec::new();
		let created = self
			.create_in_transaction(&input, &valid, actor, uploads, &mut written)
			.await;

		match created {
			Ok(job) => {
				tracing::info!(
					"Job {} created by {} with {} image(s)",
					job.job_id,
					actor.username,
					uploads.len()
				);
				let mut conn = self.pool.acquire().await?;
				self.detail(&mut conn, job).await
			}
			Err(e) => {
				self.discard_written(&written).await;
				Err(create_failure(e))
			}
		}
	}

	async fn create_in_transaction(
		&self,
		input: &CreateJobInput,
		valid: &ValidCreate,
		actor: &User,
		uploads: &[UploadedFile],
		written: &mut Vec<String>,
	) -> Result<Job> {
		let mut tx = begin_write(&self.pool).await?;

		let mut property = match blank_property_id(input.property_id.as_deref()) {
			Some(property_id) => Some(resolve_property(&mut tx, property_id).await?),
			None => None,
		};

		let room = match input.room_id {
			Some(room_id) => Some(resolve_room(&mut tx, room_id).await?),
			None => None,
		};
		if let (None, Some(room)) = (&property, &room) {
			property = Room::adopted_property(&mut tx, room.id).await?;
		}

		let topic = match input.topic_data.as_ref().filter(|t| t.has_title()) {
			Some(data) => Some(resolve_topic(&mut tx, data).await?),
			None => None,
		};

		let new = NewJob {
			user_id: actor.id,
			property_id: property.as_ref().map(|p| p.id),
			description: input.description.clone(),
			remarks: input.remarks.clone(),
			status: valid.status,
			priority: valid.priority,
			is_defective: input.is_defective,
			is_preventivemaintenance: input.is_preventivemaintenance,
			due_date: input.due_date,
		};
		let now = Utc::now();
		let job = insert_job(&mut tx, &new, now, || generate_job_id(now)).await?;

		if let Some(room) = &room {
			Job::add_room(&mut tx, job.id, room.id).await?;
		}
		if let Some(topic) = &topic {
			Job::add_topic(&mut tx, job.id, topic.id).await?;
		}
		for upload in uploads {
			self.attach_upload(&mut tx, job.id, upload, actor.id, written)
				.await?;
		}

		tx.commit().await?;
		Ok(job)
	}

	/// Normalize one upload and record it as a job image.
	async fn attach_upload(
		&self,
		conn: &mut SqliteConnection,
		job_pk: i64,
		upload: &UploadedFile,
		uploader: i64,
		written: &mut Vec<String>,
	) -> Result<JobImage> {
		match self.images.ingest(upload, ImageKind::Job).await {
			Ok(stored) => {
				written.push(stored.name.clone());
				JobImage::insert(conn, job_pk, Some(&stored.name), Some(uploader)).await
			}
			Err(e) if e.is_processing() => {
				tracing::warn!("Image {} could not be processed: {}", upload.filename, e);
				JobImage::insert(conn, job_pk, None, Some(uploader)).await
			}
			Err(e) => Err(e.into()),
		}
	}

	async fn discard_written(&self, written: &[String]) {
		for name in written {
			if let Err(e) = self.images.discard(name).await {
				tracing::error!("Failed to remove {} after rollback: {}", name, e);
			}
		}
	}

	/// Move a job to `status`, recording `actor` as the last updater.
	pub async fn update_status(&self, job_id: &str, status: &str, actor: &User) -> Result<JobDetail> {
		let status: JobStatus = status
			.parse()
			.map_err(|_| MaintenanceError::validation("status", "Invalid status value."))?;

		let mut conn = self.pool.acquire().await?;
		let mut job = job_by_job_id(&mut conn, job_id).await?;
		let now = Utc::now();
		job.apply_status(status, now);
		job.updated_by = Some(actor.id);
		job.save(&mut conn, now).await?;

		tracing::info!("Job {} moved to {} by {}", job.job_id, status, actor.username);
		self.detail(&mut conn, job).await
	}

	/// Apply a partial update. Rooms and topics are added, never replaced.
	pub async fn update(&self, job_id: &str, input: UpdateJobInput, actor: &User) -> Result<JobDetail> {
		let mut errors = FieldErrors::new();
		for (field, value) in [("description", &input.description), ("remarks", &input.remarks)] {
			if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
				errors.add(field, "This field may not be blank.");
			}
		}
		let status = input
			.status
			.as_deref()
			.and_then(|s| parse_status(s, &mut errors));
		let priority = input
			.priority
			.as_deref()
			.and_then(|p| parse_priority(p, &mut errors));
		let topic_data = input.topic_data.as_ref().filter(|t| t.has_title());
		if let Some(topic) = topic_data {
			validate_title(&topic.title, "topic_data", &mut errors);
		}
		errors.into_result()?;

		let mut tx = begin_write(&self.pool).await?;
		let mut job = job_by_job_id(&mut tx, job_id).await?;
		let now = Utc::now();

		if let Some(description) = input.description {
			job.description = description;
		}
		if let Some(remarks) = input.remarks {
			job.remarks = remarks;
		}
		if let Some(priority) = priority {
			job.priority = priority;
		}
		if let Some(is_defective) = input.is_defective {
			job.is_defective = is_defective;
		}
		if let Some(is_preventivemaintenance) = input.is_preventivemaintenance {
			job.is_preventivemaintenance = is_preventivemaintenance;
		}
		if let Some(due_date) = input.due_date {
			job.due_date = due_date;
		}
		if let Some(status) = status {
			job.apply_status(status, now);
		}

		if let Some(property_id) = blank_property_id(input.property_id.as_deref()) {
			job.property_id = Some(resolve_property(&mut tx, property_id).await?.id);
		}
		if let Some(room_id) = input.room_id {
			let room = resolve_room(&mut tx, room_id).await?;
			Job::add_room(&mut tx, job.id, room.id).await?;
		}
		if let Some(data) = topic_data {
			let topic = resolve_topic(&mut tx, data).await?;
			Job::add_topic(&mut tx, job.id, topic.id).await?;
		}

		job.updated_by = Some(actor.id);
		job.save(&mut tx, now).await?;
		tx.commit().await?;

		tracing::info!("Job {} updated by {}", job.job_id, actor.username);
		let mut conn = self.pool.acquire().await?;
		self.detail(&mut conn, job).await
	}

	/// Attach more images to an existing job.
	pub async fn add_images(
		&self,
		job_id: &str,
		uploads: &[UploadedFile],
		actor: &User,
	) -> Result<JobDetail> {
		let mut written = Vec::new();
		let added = self
			.add_images_in_transaction(job_id, uploads, actor, &mut written)
			.await;

		match added {
			Ok(job) => {
				tracing::info!(
					"{} image(s) added to job {} by {}",
					uploads.len(),
					job.job_id,
					actor.username
				);
				let mut conn = self.pool.acquire().await?;
				self.detail(&mut conn, job).await
			}
			Err(e) => {
				self.discard_written(&written).await;
				Err(e)
			}
		}
	}

	async fn add_images_in_transaction(
		&self,
		job_id: &str,
		uploads: &[UploadedFile],
		actor: &User,
		written: &mut Vec<String>,
	) -> Result<Job> {
		let mut tx = begin_write(&self.pool).await?;
		let mut job = job_by_job_id(&mut tx, job_id).await?;
		for upload in uploads {
			self.attach_upload(&mut tx, job.id, upload, actor.id, written)
				.await?;
		}
		job.updated_by = Some(actor.id);
		job.save(&mut tx, Utc::now()).await?;
		tx.commit().await?;
		Ok(job)
	}

	/// Delete one image of a job: the stored file first, then the row.
	pub async fn delete_image(&self, job_id: &str, image_id: i64) -> Result<()> {
		let mut conn = self.pool.acquire().await?;
		let job = job_by_job_id(&mut conn, job_id).await?;
		let image = JobImage::find(&mut conn, image_id)
			.await?
			.filter(|image| image.job_id == job.id)
			.ok_or_else(|| MaintenanceError::not_found("image_id", "Not found."))?;

		if let Some(name) = &image.image {
			self.images.discard(name).await?;
		}
		JobImage::delete(&mut conn, image.id).await?;

		tracing::info!("Image {} removed from job {}", image.id, job.job_id);
		Ok(())
	}

	pub async fn get(&self, job_id: &str) -> Result<JobDetail> {
		let mut conn = self.pool.acquire().await?;
		let job = job_by_job_id(&mut conn, job_id).await?;
		self.detail(&mut conn, job).await
	}

	/// All jobs, newest first.
	pub async fn list(&self) -> Result<Vec<JobDetail>> {
		let mut conn = self.pool.acquire().await?;
		let jobs = Job::list(&mut conn).await?;
		let mut details = Vec::with_capacity(jobs.len());
		for job in jobs {
			details.push(self.detail(&mut conn, job).await?);
		}
		Ok(details)
	}

	async fn detail(&self, conn: &mut SqliteConnection, job: Job) -> Result<JobDetail> {
		let creator = User::find(conn, job.user_id).await?;
		let updated_by = match job.updated_by {
			Some(id) => User::find(conn, id).await?.map(|u| u.username),
			None => None,
		};
		let property = match job.property_id {
			Some(pk) => Property::find(conn, pk).await?,
			None => None,
		};
		let rooms = Room::for_job(conn, job.id).await?;
		let topics = Topic::for_job(conn, job.id).await?;

		let mut images = Vec::new();
		for image in JobImage::for_job(conn, job.id).await? {
			let image_url = match &image.image {
				Some(name) => self.images.url_if_stored(name).await,
				None => None,
			};
			images.push(JobImageDetail {
				id: image.id,
				image_url,
				uploaded_by: image.uploaded_by,
				uploaded_at: image.uploaded_at,
			});
		}
		let image_urls = images.iter().filter_map(|i| i.image_url.clone()).collect();

		let profile_image = match &creator {
			Some(user) => match UserProfile::for_user(conn, user.id)
				.await?
				.and_then(|p| p.profile_image)
			{
				Some(name) => self.images.url_if_stored(&name).await,
				None => None,
			},
			None => None,
		};

		Ok(JobDetail {
			id: job.id,
			job_id: job.job_id,
			user: creator.map(|u| u.username).unwrap_or_default(),
			updated_by,
			description: job.description,
			status: job.status,
			priority: job.priority,
			remarks: job.remarks,
			created_at: job.created_at,
			updated_at: job.updated_at,
			completed_at: job.completed_at,
			is_defective: job.is_defective,
			is_preventivemaintenance: job.is_preventivemaintenance,
			due_date: job.due_date,
			rooms,
			topics,
			images,
			image_urls,
			profile_image,
			property_id: property.as_ref().map(|p| p.property_id.clone()),
			property_name: property.map(|p| p.name),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn input() -> CreateJobInput {
		CreateJobInput {
			description: "Air conditioner leaking".to_string(),
			remarks: "Guest complaint".to_string(),
			..Default::default()
		}
	}

	#[rstest]
	fn test_validate_requires_description_and_remarks() {
		let err = validate_create(&CreateJobInput::default()).err().unwrap();

		match err {
			MaintenanceError::Validation(errors) => {
				assert!(errors.contains("description"));
				assert!(errors.contains("remarks"));
			}
			other => panic!("unexpected error {:?}", other),
		}
	}

	#[rstest]
	fn test_validate_preventive_requires_room_and_topic() {
		let input = CreateJobInput {
			is_preventivemaintenance: true,
			topic_data: Some(TopicData::new("   ")),
			..input()
		};

		let err = validate_create(&input).err().unwrap();

		match err {
			MaintenanceError::Validation(errors) => {
				assert_eq!(errors.get("room_id").unwrap(), [PREVENTIVE_REQUIRED]);
				assert_eq!(errors.get("topic_data").unwrap(), [PREVENTIVE_REQUIRED]);
			}
			other => panic!("unexpected error {:?}", other),
		}
	}

	#[rstest]
	#[case(Some("completed"), JobStatus::Completed)]
	#[case(None, JobStatus::Pending)]
	fn test_validate_status(#[case] status: Option<&str>, #[case] expected: JobStatus) {
		let input = CreateJobInput {
			status: status.map(str::to_string),
			..input()
		};

		assert_eq!(validate_create(&input).unwrap().status, expected);
	}

	#[rstest]
	fn test_validate_rejects_unknown_priority() {
		let input = CreateJobInput {
			priority: Some("urgent".to_string()),
			..input()
		};

		assert!(matches!(
			validate_create(&input),
			Err(MaintenanceError::Validation(errors)) if errors.contains("priority")
		));
	}

	async fn seeded_user(conn: &mut SqliteConnection) -> User {
		User::insert(
			conn,
			&crate::models::user::NewUser {
				username: "tech",
				email: "tech@example.com",
				..Default::default()
			},
		)
		.await
		.unwrap()
	}

	fn new_job(user_id: i64) -> NewJob {
		NewJob {
			user_id,
			property_id: None,
			description: "Broken lamp".to_string(),
			remarks: "Lobby".to_string(),
			status: JobStatus::Pending,
			priority: JobPriority::Medium,
			is_defective: false,
			is_preventivemaintenance: false,
			due_date: None,
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_insert_job_retries_taken_id() {
		let pool = crate::db::testing::memory_pool().await;
		let mut conn = pool.acquire().await.unwrap();
		let user = seeded_user(&mut conn).await;
		let now = Utc::now();
		insert_job(&mut conn, &new_job(user.id), now, || "j24aaaaaa".to_string())
			.await
			.unwrap();

		let mut ids = vec!["j24bbbbbb", "j24aaaaaa"];
		let job = insert_job(&mut conn, &new_job(user.id), now, || {
			ids.pop().unwrap().to_string()
		})
		.await
		.unwrap();

		assert_eq!(job.job_id, "j24bbbbbb");
		assert_eq!(Job::list(&mut conn).await.unwrap().len(), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_insert_job_gives_up_after_attempts() {
		let pool = crate::db::testing::memory_pool().await;
		let mut conn = pool.acquire().await.unwrap();
		let user = seeded_user(&mut conn).await;
		let now = Utc::now();
		insert_job(&mut conn, &new_job(user.id), now, || "j24cccccc".to_string())
			.await
			.unwrap();

		let mut calls = 0;
		let result = insert_job(&mut conn, &new_job(user.id), now, || {
			calls += 1;
			"j24cccccc".to_string()
		})
		.await;

		assert!(matches!(result, Err(MaintenanceError::Internal(_))));
		assert_eq!(calls, JOB_ID_ATTEMPTS);
	}
}
