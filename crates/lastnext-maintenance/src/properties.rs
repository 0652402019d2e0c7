//! Properties, rooms and property access.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Connection, SqliteConnection};

use crate::db::is_unique_violation;
use crate::error::{FieldErrors, MaintenanceError, Result};
use crate::inputs::{CreatePropertyInput, CreateRoomInput};
use crate::models::{Property, Room, User};

const PROPERTY_NAME_MAX_LENGTH: usize = 255;
const ROOM_NAME_MAX_LENGTH: usize = 100;

/// A property with its users and rooms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDetail {
	pub id: i64,
	pub property_id: String,
	pub name: String,
	pub description: Option<String>,
	pub users: Vec<i64>,
	pub created_at: DateTime<Utc>,
	pub rooms: Vec<Room>,
}

impl PropertyDetail {
	pub async fn load(conn: &mut SqliteConnection, property: Property) -> Result<Self> {
		let users = Property::user_ids(conn, property.id).await?;
		let rooms = Room::for_property(conn, property.id).await?;
		Ok(Self {
			id: property.id,
			property_id: property.property_id,
			name: property.name,
			description: property.description,
			users,
			created_at: property.created_at,
			rooms,
		})
	}

	pub(crate) async fn load_all(
		conn: &mut SqliteConnection,
		properties: Vec<Property>,
	) -> Result<Vec<Self>> {
		let mut details = Vec::with_capacity(properties.len());
		for property in properties {
			details.push(Self::load(conn, property).await?);
		}
		Ok(details)
	}
}

/// Create a property. The creator, when given, is granted access.
pub async fn create_property(
	conn: &mut SqliteConnection,
	input: &CreatePropertyInput,
	creator: Option<&User>,
) -> Result<PropertyDetail> {
	let name = input.name.trim();
	let mut errors = FieldErrors::new();
	if name.is_empty() {
		errors.add("name", "This field may not be blank.");
	} else if name.chars().count() > PROPERTY_NAME_MAX_LENGTH {
		errors.add(
			"name",
			format!(
				"Ensure this field has no more than {} characters.",
				PROPERTY_NAME_MAX_LENGTH
			),
		);
	} else if Property::name_exists(conn, name).await? {
		errors.add("name", "property with this name already exists.");
	}
	errors.into_result()?;

	let mut tx = conn.begin().await?;
	let property = Property::insert(&mut tx, name, input.description.as_deref()).await?;
	if let Some(user) = creator {
		Property::grant_user(&mut tx, property.id, user.id).await?;
	}
	let detail = PropertyDetail::load(&mut tx, property).await?;
	tx.commit().await?;

	tracing::info!("Created property {} ({})", detail.name, detail.property_id);
	Ok(detail)
}

/// Resolve a public property identifier.
pub async fn property_by_public_id(
	conn: &mut SqliteConnection,
	property_id: &str,
) -> Result<Property> {
	Property::find_by_property_id(conn, property_id)
		.await?
		.ok_or_else(|| MaintenanceError::not_found("property_id", "Not found."))
}

/// Properties the user has been granted access to.
pub async fn properties_for_user(
	conn: &mut SqliteConnection,
	user_id: i64,
) -> Result<Vec<PropertyDetail>> {
	let properties = Property::for_user(conn, user_id).await?;
	PropertyDetail::load_all(conn, properties).await
}

/// Grant `user_id` access to the property `property_id`.
pub async fn grant_property_access(
	conn: &mut SqliteConnection,
	property_id: &str,
	user_id: i64,
) -> Result<()> {
	let property = property_by_public_id(conn, property_id).await?;
	Property::grant_user(conn, property.id, user_id).await
}

/// Create a room. The name is stored trimmed.
pub async fn create_room(conn: &mut SqliteConnection, input: &CreateRoomInput) -> Result<Room> {
	let name = input.name.trim();
	let mut errors = FieldErrors::new();
	if name.is_empty() {
		errors.add("name", "Room name cannot be empty.");
	} else if name.chars().count() > ROOM_NAME_MAX_LENGTH {
		errors.add(
			"name",
			format!(
				"Ensure this field has no more than {} characters.",
				ROOM_NAME_MAX_LENGTH
			),
		);
	} else if Room::name_exists(conn, name).await? {
		errors.add("name", "room with this name already exists.");
	}
	if input.room_type.trim().is_empty() {
		errors.add("room_type", "This field may not be blank.");
	}
	for pk in &input.properties {
		if Property::find(conn, *pk).await?.is_none() {
			errors.add(
				"properties",
				format!("Invalid pk \"{}\" - object does not exist.", pk),
			);
		}
	}
	errors.into_result()?;

	let mut tx = conn.begin().await?;
	let room = match Room::insert(
		&mut tx,
		name,
		input.room_type.trim(),
		input.is_active.unwrap_or(true),
	)
	.await
	{
		Ok(room) => room,
		Err(MaintenanceError::Database(e)) if is_unique_violation(&e) => {
			return Err(MaintenanceError::validation(
				"name",
				"room with this name already exists.",
			));
		}
		Err(e) => return Err(e),
	};
	for pk in &input.properties {
		Room::attach_property(&mut tx, room.id, *pk).await?;
	}
	tx.commit().await?;

	tracing::info!("Created room {} ({})", room.name, room.room_type);
	room_by_id(conn, room.id).await
}

/// Every room, ordered by type then name.
pub async fn list_rooms(conn: &mut SqliteConnection) -> Result<Vec<Room>> {
	Room::list(conn).await
}

pub async fn room_by_id(conn: &mut SqliteConnection, room_id: i64) -> Result<Room> {
	Room::find(conn, room_id)
		.await?
		.ok_or_else(|| MaintenanceError::not_found("room_id", "Not found."))
}

/// Set a room's active flag.
pub async fn set_room_active(
	conn: &mut SqliteConnection,
	room_id: i64,
	active: bool,
) -> Result<Room> {
	if !Room::set_active(conn, room_id, active).await? {
		return Err(MaintenanceError::not_found("room_id", "Not found."));
	}
	room_by_id(conn, room_id).await
}

pub async fn activate_room(conn: &mut SqliteConnection, room_id: i64) -> Result<Room> {
	set_room_active(conn, room_id, true).await
}

pub async fn deactivate_room(conn: &mut SqliteConnection, room_id: i64) -> Result<Room> {
	set_room_active(conn, room_id, false).await
}

/// Attach a room to a property. Attaching twice is a no-op.
pub async fn attach_room_to_property(
	conn: &mut SqliteConnection,
	room_id: i64,
	property_id: &str,
) -> Result<Room> {
	let room = room_by_id(conn, room_id).await?;
	let property = property_by_public_id(conn, property_id).await?;
	Room::attach_property(conn, room.id, property.id).await?;
	room_by_id(conn, room_id).await
}
