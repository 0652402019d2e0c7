//! Request handlers, one module per resource.

mod auth;
mod catalog;
mod jobs;
mod profiles;

use async_trait::async_trait;
use http::Method;
use serde::Serialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::http::{Request, Response};
use crate::router::{Endpoint, Router, api_routes};
use crate::server::Handler;
use crate::state::AppState;

/// The maintenance API as a [`Handler`].
pub struct App {
	state: Arc<AppState>,
	router: Router,
}

impl App {
	pub fn new(state: Arc<AppState>) -> Self {
		Self {
			state,
			router: api_routes(),
		}
	}

	pub fn state(&self) -> &AppState {
		&self.state
	}
}

#[async_trait]
impl Handler for App {
	async fn handle(&self, mut request: Request) -> Result<Response, ApiError> {
		let (endpoint, params) = self
			.router
			.resolve(request.path())
			.ok_or(ApiError::RouteNotFound)?;
		for (key, value) in params {
			request.set_path_param(key, value);
		}
		dispatch(&self.state, endpoint, request).await
	}
}

async fn dispatch(state: &AppState, endpoint: Endpoint, request: Request) -> Result<Response, ApiError> {
	let method = request.method.clone();
	match (endpoint, method) {
		(Endpoint::Health, Method::GET) => auth::health(),
		(Endpoint::AuthLog, Method::GET) => auth::log(state, request).await,
		(Endpoint::AuthCheck, Method::GET) => auth::check(state, request).await,
		(Endpoint::AuthProviders, Method::GET) => auth::providers(),
		(Endpoint::Login, Method::POST) => auth::login(state, request).await,
		(Endpoint::Register, Method::POST) => auth::register(state, request).await,
		(Endpoint::GoogleAuth, Method::POST) => auth::google(state, request).await,
		(Endpoint::Session, Method::GET) => auth::current_session(state, request).await,
		(Endpoint::Session, Method::POST) => auth::reissue_session(state, request).await,
		(Endpoint::Logout, Method::POST) => auth::logout(state, request).await,
		(Endpoint::TokenRefresh, Method::POST) => auth::refresh(state, request).await,

		(Endpoint::Jobs, Method::GET) => jobs::list(state, request).await,
		(Endpoint::Jobs, Method::POST) => jobs::create(state, request).await,
		(Endpoint::Job, Method::GET) => jobs::retrieve(state, request).await,
		(Endpoint::Job, Method::PATCH) => jobs::update(state, request).await,
		(Endpoint::JobStatus, Method::PATCH) => jobs::update_status(state, request).await,
		(Endpoint::JobImages, Method::POST) => jobs::add_images(state, request).await,
		(Endpoint::JobImage, Method::DELETE) => jobs::delete_image(state, request).await,

		(Endpoint::Properties, Method::GET) => catalog::list_properties(state, request).await,
		(Endpoint::Properties, Method::POST) => catalog::create_property(state, request).await,
		(Endpoint::Rooms, Method::GET) => catalog::list_rooms(state, request).await,
		(Endpoint::Rooms, Method::POST) => catalog::create_room(state, request).await,
		(Endpoint::Room, Method::GET) => catalog::retrieve_room(state, request).await,
		(Endpoint::Topics, Method::GET) => catalog::list_topics(state, request).await,
		(Endpoint::Topics, Method::POST) => catalog::create_topic(state, request).await,

		(Endpoint::ProfileMe, Method::GET) => profiles::me(state, request).await,
		(Endpoint::ProfileMe, Method::PATCH) => profiles::update(state, request).await,
		(Endpoint::ProfileAddProperty, Method::POST) => profiles::add_property(state, request).await,
		(Endpoint::ProfileRemoveProperty, Method::POST) => {
			profiles::remove_property(state, request).await
		}

		(_, method) => Err(ApiError::MethodNotAllowed(method)),
	}
}

fn ok_json<T: Serialize>(data: &T) -> Result<Response, ApiError> {
	Response::ok().with_json(data)
}

fn created_json<T: Serialize>(data: &T) -> Result<Response, ApiError> {
	Response::created().with_json(data)
}

fn path_param<'a>(request: &'a Request, name: &str) -> Result<&'a str, ApiError> {
	request.path_param(name).ok_or(ApiError::RouteNotFound)
}
