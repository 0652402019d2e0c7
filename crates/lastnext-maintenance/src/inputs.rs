//! Typed request payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Topic reference inside a job payload: matched by exact title, created
/// with `description` when missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TopicData {
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub description: Option<String>,
}

impl TopicData {
	pub fn new(title: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			description: None,
		}
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub(crate) fn has_title(&self) -> bool {
		!self.title.trim().is_empty()
	}
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CreateJobInput {
	pub description: String,
	pub remarks: String,
	pub status: Option<String>,
	pub priority: Option<String>,
	pub is_defective: bool,
	pub is_preventivemaintenance: bool,
	pub due_date: Option<DateTime<Utc>>,
	/// Room primary key
	pub room_id: Option<i64>,
	/// Public property identifier (`P…`)
	pub property_id: Option<String>,
	pub topic_data: Option<TopicData>,
}

/// Partial job update. Absent fields are left untouched; `due_date: null`
/// clears the due date.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UpdateJobInput {
	pub description: Option<String>,
	pub remarks: Option<String>,
	pub status: Option<String>,
	pub priority: Option<String>,
	pub is_defective: Option<bool>,
	pub is_preventivemaintenance: Option<bool>,
	#[serde(deserialize_with = "present")]
	pub due_date: Option<Option<DateTime<Utc>>>,
	/// Room to add to the job's rooms
	pub room_id: Option<i64>,
	/// Property replacing the job's property
	pub property_id: Option<String>,
	/// Topic to add to the job's topics
	pub topic_data: Option<TopicData>,
}

/// Distinguish an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CreatePropertyInput {
	pub name: String,
	pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CreateRoomInput {
	pub name: String,
	pub room_type: String,
	pub is_active: Option<bool>,
	/// Property primary keys
	pub properties: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegisterInput {
	pub username: String,
	pub email: String,
	pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpdateProfileInput {
	pub positions: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_update_due_date_null_vs_absent() {
		let absent: UpdateJobInput = serde_json::from_value(json!({})).unwrap();
		let cleared: UpdateJobInput = serde_json::from_value(json!({ "due_date": null })).unwrap();
		let set: UpdateJobInput =
			serde_json::from_value(json!({ "due_date": "2024-05-01T08:00:00Z" })).unwrap();

		assert_eq!(absent.due_date, None);
		assert_eq!(cleared.due_date, Some(None));
		assert!(matches!(set.due_date, Some(Some(_))));
	}

	#[rstest]
	fn test_create_defaults() {
		let input: CreateJobInput =
			serde_json::from_value(json!({ "description": "d", "remarks": "r" })).unwrap();

		assert!(!input.is_preventivemaintenance);
		assert_eq!(input.room_id, None);
		assert_eq!(input.topic_data, None);
	}
}
