//! Path routing.

use std::collections::HashMap;

/// The operations reachable over HTTP. Methods are dispatched per endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
	Health,
	AuthLog,
	AuthCheck,
	AuthProviders,
	Login,
	Register,
	GoogleAuth,
	Session,
	Logout,
	TokenRefresh,
	Jobs,
	Job,
	JobStatus,
	JobImages,
	JobImage,
	Properties,
	Rooms,
	Room,
	Topics,
	ProfileMe,
	ProfileAddProperty,
	ProfileRemoveProperty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Literal(String),
	Param(String),
}

#[derive(Debug, Clone)]
struct Route {
	segments: Vec<Segment>,
	endpoint: Endpoint,
}

fn split(path: &str) -> impl Iterator<Item = &str> {
	path.trim_matches('/').split('/').filter(|s| !s.is_empty())
}

/// Matches request paths against `/literal/{param}/` patterns. A trailing
/// slash is optional.
#[derive(Debug, Clone, Default)]
pub struct Router {
	routes: Vec<Route>,
}

impl Router {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn route(mut self, pattern: &str, endpoint: Endpoint) -> Self {
		let segments = split(pattern)
			.map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
				Some(name) => Segment::Param(name.to_string()),
				None => Segment::Literal(s.to_string()),
			})
			.collect();
		self.routes.push(Route { segments, endpoint });
		self
	}

	/// The endpoint for `path` with its captured parameters.
	pub fn resolve(&self, path: &str) -> Option<(Endpoint, HashMap<String, String>)> {
		let parts: Vec<&str> = split(path).collect();
		self.routes.iter().find_map(|route| {
			if route.segments.len() != parts.len() {
				return None;
			}
			let mut params = HashMap::new();
			for (segment, part) in route.segments.iter().zip(&parts) {
				match segment {
					Segment::Literal(literal) if literal == part => {}
					Segment::Literal(_) => return None,
					Segment::Param(name) => {
						params.insert(name.clone(), (*part).to_string());
					}
				}
			}
			Some((route.endpoint, params))
		})
	}
}

/// Routes of the maintenance API.
pub fn api_routes() -> Router {
	Router::new()
		.route("/health/", Endpoint::Health)
		.route("/api/health/", Endpoint::Health)
		.route("/api/v1/auth/_log", Endpoint::AuthLog)
		.route("/api/v1/auth/check/", Endpoint::AuthCheck)
		.route("/api/providers/", Endpoint::AuthProviders)
		.route("/api/auth/login/", Endpoint::Login)
		.route("/api/v1/auth/register/", Endpoint::Register)
		.route("/api/v1/auth/google/", Endpoint::GoogleAuth)
		.route("/api/auth/session/", Endpoint::Session)
		.route("/api/auth/logout/", Endpoint::Logout)
		.route("/api/token/refresh/", Endpoint::TokenRefresh)
		.route("/api/jobs/", Endpoint::Jobs)
		.route("/api/jobs/{job_id}/", Endpoint::Job)
		.route("/api/jobs/{job_id}/update_status/", Endpoint::JobStatus)
		.route("/api/jobs/{job_id}/images/", Endpoint::JobImages)
		.route("/api/jobs/{job_id}/images/{image_id}/", Endpoint::JobImage)
		.route("/api/properties/", Endpoint::Properties)
		.route("/api/rooms/", Endpoint::Rooms)
		.route("/api/rooms/{room_id}/", Endpoint::Room)
		.route("/api/topics/", Endpoint::Topics)
		.route("/api/user-profiles/me/", Endpoint::ProfileMe)
		.route("/api/user-profiles/me/add_property/", Endpoint::ProfileAddProperty)
		.route("/api/user-profiles/me/remove_property/", Endpoint::ProfileRemoveProperty)
}
