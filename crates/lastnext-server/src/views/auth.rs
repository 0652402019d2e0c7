//! Sign-in, sessions and token refresh.

use serde::Deserialize;
use serde_json::json;

use lastnext_maintenance::{MaintenanceError, RegisterInput};

use super::{created_json, ok_json};
use crate::error::ApiError;
use crate::http::{Request, Response};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginBody {
	username: String,
	password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IdentityBody {
	id_token: String,
	access_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LogoutBody {
	session_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RefreshBody {
	refresh: String,
}

pub(super) fn health() -> Result<Response, ApiError> {
	Ok(Response::ok()
		.with_header("content-type", "text/plain")
		.with_body("OK"))
}

pub(super) async fn log(state: &AppState, request: Request) -> Result<Response, ApiError> {
	let user = state.authenticate(&request).await?;
	tracing::info!("Log view accessed by user: {}", user.username);
	ok_json(&json!({ "message": "This is a log view" }))
}

pub(super) async fn check(state: &AppState, request: Request) -> Result<Response, ApiError> {
	let user = state.authenticate(&request).await?;
	ok_json(&json!({
		"authenticated": true,
		"username": user.username,
		"email": user.email,
	}))
}

pub(super) fn providers() -> Result<Response, ApiError> {
	ok_json(&json!({
		"google": {
			"name": "Google",
			"endpoint": "/api/v1/auth/google/",
			"description": "Sign in with Google OAuth2",
		},
		"local": {
			"name": "Local",
			"endpoint": "/api/auth/login/",
			"description": "Sign in with username and password",
		},
	}))
}

pub(super) async fn login(state: &AppState, request: Request) -> Result<Response, ApiError> {
	let body: LoginBody = request.json()?;
	let session = state.accounts.login(&body.username, &body.password).await?;
	ok_json(&session)
}

pub(super) async fn register(state: &AppState, request: Request) -> Result<Response, ApiError> {
	let input: RegisterInput = request.json()?;
	let session = state.accounts.register(input).await?;
	created_json(&session)
}

pub(super) async fn google(state: &AppState, request: Request) -> Result<Response, ApiError> {
	let body: IdentityBody = request.json()?;
	let session = state
		.accounts
		.exchange_identity(&body.id_token, body.access_token.as_deref())
		.await?;
	ok_json(&session)
}

pub(super) async fn current_session(
	state: &AppState,
	request: Request,
) -> Result<Response, ApiError> {
	let user = state.authenticate(&request).await?;
	let session = state.accounts.current_session(&user).await?;
	ok_json(&session)
}

pub(super) async fn reissue_session(
	state: &AppState,
	request: Request,
) -> Result<Response, ApiError> {
	let user = state.authenticate(&request).await?;
	let session = state.accounts.reissue_session(&user).await?;
	ok_json(&session)
}

pub(super) async fn logout(state: &AppState, request: Request) -> Result<Response, ApiError> {
	let user = state.authenticate(&request).await?;
	let body: LogoutBody = request.json()?;
	if let Some(token) = body.session_token.as_deref() {
		state.accounts.logout(&user, token).await?;
	}
	Ok(Response::no_content())
}

pub(super) async fn refresh(state: &AppState, request: Request) -> Result<Response, ApiError> {
	let body: RefreshBody = request.json()?;
	if body.refresh.trim().is_empty() {
		return Err(MaintenanceError::validation("refresh", "This field is required.").into());
	}
	let access = state.accounts.refresh_access(&body.refresh).await?;
	ok_json(&json!({ "access": access }))
}
