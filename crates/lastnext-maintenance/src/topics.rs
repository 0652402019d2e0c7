//! Topic listing and creation.

use sqlx::SqliteConnection;

use crate::error::{FieldErrors, Result};
use crate::inputs::TopicData;
use crate::models::Topic;
use crate::models::topic::TITLE_MAX_LENGTH;

/// Check a topic title, reporting problems under `field`.
pub(crate) fn validate_title(title: &str, field: &str, errors: &mut FieldErrors) {
	if title.trim().is_empty() {
		errors.add(field, "This field may not be blank.");
	} else if title.chars().count() > TITLE_MAX_LENGTH {
		errors.add(
			field,
			format!(
				"Ensure this field has no more than {} characters.",
				TITLE_MAX_LENGTH
			),
		);
	}
}

/// All topics, by title.
pub async fn list_topics(conn: &mut SqliteConnection) -> Result<Vec<Topic>> {
	Topic::list(conn).await
}

/// Get-or-create a topic from `data`.
pub async fn create_topic(conn: &mut SqliteConnection, data: &TopicData) -> Result<Topic> {
	let mut errors = FieldErrors::new();
	validate_title(&data.title, "title", &mut errors);
	errors.into_result()?;

	Topic::get_or_create(conn, &data.title, data.description.as_deref()).await
}
