//! # lastnext-server
//!
//! HTTP surface of the maintenance backend: a hyper server, a small path
//! router and the JSON/multipart views over `lastnext-maintenance`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lastnext_conf::Settings;
//! use lastnext_server::{App, AppState, HttpServer, serve_with_shutdown};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load("settings")?;
//! let addr = settings.server.addr.parse()?;
//! let state = AppState::from_settings(settings).await?;
//! let server = HttpServer::new(Arc::new(App::new(Arc::new(state))));
//! serve_with_shutdown(server, addr).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod forms;
pub mod http;
pub mod router;
pub mod server;
pub mod state;
pub mod views;

pub use error::{ApiError, ServerError};
pub use forms::{FormData, MultipartBody};
pub use crate::http::{Request, Response};
pub use router::{Endpoint, Router, api_routes};
pub use server::{Handler, HttpServer, ShutdownCoordinator, serve_with_shutdown, shutdown_signal};
pub use state::{AppState, connect_database, media_storage_config};
pub use views::App;
