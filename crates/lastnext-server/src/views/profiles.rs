//! The signed-in user's profile.

use serde::Deserialize;

use lastnext_maintenance::UpdateProfileInput;

use super::ok_json;
use crate::error::ApiError;
use crate::forms::FormData;
use crate::http::{Request, Response};
use crate::state::AppState;

const PICTURE_FIELD: &str = "profile_image";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PropertyBody {
	property_id: Option<String>,
}

impl PropertyBody {
	fn property_id(self) -> Result<String, ApiError> {
		match self.property_id {
			Some(id) if !id.trim().is_empty() => Ok(id),
			_ => Err(ApiError::BadRequest("property_id is required".to_string())),
		}
	}
}

pub(super) async fn me(state: &AppState, request: Request) -> Result<Response, ApiError> {
	let user = state.authenticate(&request).await?;
	ok_json(&state.accounts.profile(&user).await?)
}

pub(super) async fn update(state: &AppState, request: Request) -> Result<Response, ApiError> {
	let user = state.authenticate(&request).await?;
	let profile = if request.is_multipart() {
		let form = FormData::parse(&request).await?;
		let input: UpdateProfileInput = form.deserialize()?;
		let picture = form.file(PICTURE_FIELD);
		state
			.accounts
			.update_profile(&user, input, picture.as_ref())
			.await?
	} else {
		let input: UpdateProfileInput = request.json()?;
		state.accounts.update_profile(&user, input, None).await?
	};
	ok_json(&profile)
}

pub(super) async fn add_property(state: &AppState, request: Request) -> Result<Response, ApiError> {
	let user = state.authenticate(&request).await?;
	let property_id = request.json::<PropertyBody>()?.property_id()?;
	ok_json(&state.accounts.add_profile_property(&user, &property_id).await?)
}

pub(super) async fn remove_property(
	state: &AppState,
	request: Request,
) -> Result<Response, ApiError> {
	let user = state.authenticate(&request).await?;
	let property_id = request.json::<PropertyBody>()?.property_id()?;
	ok_json(
		&state
			.accounts
			.remove_profile_property(&user, &property_id)
			.await?,
	)
}
