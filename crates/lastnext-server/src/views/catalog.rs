//! Properties, rooms and topics.

use lastnext_maintenance::{CreatePropertyInput, CreateRoomInput, TopicData, properties, topics};

use super::{created_json, ok_json, path_param};
use crate::error::ApiError;
use crate::http::{Request, Response};
use crate::state::AppState;

pub(super) async fn list_properties(
	state: &AppState,
	request: Request,
) -> Result<Response, ApiError> {
	let user = state.authenticate(&request).await?;
	let mut conn = state.pool.acquire().await?;
	ok_json(&properties::properties_for_user(&mut conn, user.id).await?)
}

pub(super) async fn create_property(
	state: &AppState,
	request: Request,
) -> Result<Response, ApiError> {
	let user = state.authenticate(&request).await?;
	let input: CreatePropertyInput = request.json()?;
	let mut conn = state.pool.acquire().await?;
	created_json(&properties::create_property(&mut conn, &input, Some(&user)).await?)
}

pub(super) async fn list_rooms(state: &AppState, request: Request) -> Result<Response, ApiError> {
	state.authenticate(&request).await?;
	let mut conn = state.pool.acquire().await?;
	ok_json(&properties::list_rooms(&mut conn).await?)
}

pub(super) async fn retrieve_room(state: &AppState, request: Request) -> Result<Response, ApiError> {
	state.authenticate(&request).await?;
	let room_id = path_param(&request, "room_id")?
		.parse::<i64>()
		.map_err(|_| ApiError::RouteNotFound)?;
	let mut conn = state.pool.acquire().await?;
	ok_json(&properties::room_by_id(&mut conn, room_id).await?)
}

pub(super) async fn create_room(state: &AppState, request: Request) -> Result<Response, ApiError> {
	state.authenticate(&request).await?;
	let input: CreateRoomInput = request.json()?;
	let mut conn = state.pool.acquire().await?;
	created_json(&properties::create_room(&mut conn, &input).await?)
}

pub(super) async fn list_topics(state: &AppState, request: Request) -> Result<Response, ApiError> {
	state.authenticate(&request).await?;
	let mut conn = state.pool.acquire().await?;
	ok_json(&topics::list_topics(&mut conn).await?)
}

/// Get-or-create by exact title.
pub(super) async fn create_topic(state: &AppState, request: Request) -> Result<Response, ApiError> {
	state.authenticate(&request).await?;
	let data: TopicData = request.json()?;
	let mut conn = state.pool.acquire().await?;
	created_json(&topics::create_topic(&mut conn, &data).await?)
}
