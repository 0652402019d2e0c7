//! Job endpoints.

use serde::Deserialize;

use lastnext_images::UploadedFile;
use lastnext_maintenance::{CreateJobInput, MaintenanceError, UpdateJobInput};

use super::{created_json, ok_json, path_param};
use crate::error::ApiError;
use crate::forms::FormData;
use crate::http::{Request, Response};
use crate::state::AppState;

/// Multipart field carrying job images.
const IMAGES_FIELD: &str = "images";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatusBody {
	status: Option<String>,
}

/// Typed payload plus uploads, from either a multipart form or a JSON body.
async fn payload<T: serde::de::DeserializeOwned>(
	request: &Request,
) -> Result<(T, Vec<UploadedFile>), ApiError> {
	if request.is_multipart() {
		let form = FormData::parse(request).await?;
		Ok((form.deserialize()?, form.files(IMAGES_FIELD)))
	} else {
		Ok((request.json()?, Vec::new()))
	}
}

pub(super) async fn list(state: &AppState, request: Request) -> Result<Response, ApiError> {
	state.authenticate(&request).await?;
	ok_json(&state.jobs.list().await?)
}

pub(super) async fn create(state: &AppState, request: Request) -> Result<Response, ApiError> {
	let user = state.authenticate(&request).await?;
	let (input, uploads): (CreateJobInput, _) = payload(&request).await?;
	let job = state.jobs.create(input, &user, &uploads).await?;
	created_json(&job)
}

pub(super) async fn retrieve(state: &AppState, request: Request) -> Result<Response, ApiError> {
	state.authenticate(&request).await?;
	ok_json(&state.jobs.get(path_param(&request, "job_id")?).await?)
}

pub(super) async fn update(state: &AppState, request: Request) -> Result<Response, ApiError> {
	let user = state.authenticate(&request).await?;
	let (input, _): (UpdateJobInput, _) = payload(&request).await?;
	let job = state
		.jobs
		.update(path_param(&request, "job_id")?, input, &user)
		.await?;
	ok_json(&job)
}

pub(super) async fn update_status(state: &AppState, request: Request) -> Result<Response, ApiError> {
	let user = state.authenticate(&request).await?;
	let body: StatusBody = request.json()?;
	let status = body
		.status
		.ok_or_else(|| MaintenanceError::validation("status", "This field is required."))?;
	let job = state
		.jobs
		.update_status(path_param(&request, "job_id")?, &status, &user)
		.await?;
	ok_json(&job)
}

pub(super) async fn add_images(state: &AppState, request: Request) -> Result<Response, ApiError> {
	let user = state.authenticate(&request).await?;
	if !request.is_multipart() {
		return Err(ApiError::BadRequest(
			"Images must be sent as multipart/form-data".to_string(),
		));
	}
	let uploads = FormData::parse(&request).await?.files(IMAGES_FIELD);
	if uploads.is_empty() {
		return Err(MaintenanceError::validation(IMAGES_FIELD, "No images were provided.").into());
	}
	let job = state
		.jobs
		.add_images(path_param(&request, "job_id")?, &uploads, &user)
		.await?;
	created_json(&job)
}

pub(super) async fn delete_image(state: &AppState, request: Request) -> Result<Response, ApiError> {
	state.authenticate(&request).await?;
	let image_id = path_param(&request, "image_id")?
		.parse::<i64>()
		.map_err(|_| ApiError::RouteNotFound)?;
	state
		.jobs
		.delete_image(path_param(&request, "job_id")?, image_id)
		.await?;
	Ok(Response::no_content())
}
