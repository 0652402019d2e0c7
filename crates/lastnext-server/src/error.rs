//! Errors of the HTTP layer and their response mapping.

use http::StatusCode;
use lastnext_conf::ConfError;
use lastnext_maintenance::MaintenanceError;
use lastnext_storages::StorageError;
use serde_json::json;
use thiserror::Error;

use crate::http::Response;

/// Errors raised while handling a request.
#[derive(Debug, Error)]
pub enum ApiError {
	#[error(transparent)]
	Maintenance(#[from] MaintenanceError),

	/// Malformed body or form
	#[error("{0}")]
	BadRequest(String),

	#[error("Authentication credentials were not provided.")]
	NotAuthenticated,

	#[error("Not found.")]
	RouteNotFound,

	#[error("Method \"{0}\" not allowed.")]
	MethodNotAllowed(http::Method),

	#[error("Request body exceeds {0} bytes")]
	PayloadTooLarge(u64),

	#[error("{0}")]
	Internal(String),
}

impl From<sqlx::Error> for ApiError {
	fn from(err: sqlx::Error) -> Self {
		ApiError::Maintenance(MaintenanceError::Database(err))
	}
}

impl From<multer::Error> for ApiError {
	fn from(err: multer::Error) -> Self {
		ApiError::BadRequest(format!("Multipart form parse error - {}", err))
	}
}

impl ApiError {
	pub fn status(&self) -> StatusCode {
		match self {
			ApiError::Maintenance(err) => match err {
				MaintenanceError::Validation(_) => StatusCode::BAD_REQUEST,
				MaintenanceError::NotFound { reference: true, .. } => StatusCode::BAD_REQUEST,
				MaintenanceError::NotFound { .. } => StatusCode::NOT_FOUND,
				MaintenanceError::Authentication(_)
				| MaintenanceError::Token(_)
				| MaintenanceError::Identity(_) => StatusCode::UNAUTHORIZED,
				_ => StatusCode::INTERNAL_SERVER_ERROR,
			},
			ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
			ApiError::NotAuthenticated => StatusCode::UNAUTHORIZED,
			ApiError::RouteNotFound => StatusCode::NOT_FOUND,
			ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
			ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
			ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Render the error as a JSON response.
	///
	/// Validation errors become `{field: [messages]}`, unresolvable payload
	/// references `{field: [message]}`, missing addressed resources
	/// `{field: message}`; everything else `{"detail": message}`.
	pub fn into_response(self) -> Response {
		let status = self.status();
		let body = match &self {
			ApiError::Maintenance(MaintenanceError::Validation(errors)) => json!(errors),
			ApiError::Maintenance(MaintenanceError::NotFound {
				field,
				message,
				reference,
			}) => {
				if *reference {
					json!({ field.as_str(): [message] })
				} else {
					json!({ field.as_str(): message })
				}
			}
			other => {
				if status.is_server_error() {
					tracing::error!("Request failed: {}", other);
				}
				json!({ "detail": other.to_string() })
			}
		};

		Response::new(status)
			.with_header("content-type", "application/json")
			.with_body(body.to_string())
	}
}

/// Errors raised while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
	#[error("Configuration error: {0}")]
	Conf(#[from] ConfError),

	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),

	#[error(transparent)]
	Maintenance(#[from] MaintenanceError),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Invalid listen address {0:?}")]
	InvalidAddress(String),
}
