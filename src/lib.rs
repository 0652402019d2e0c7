//! # Lastnext
//!
//! Backend for a property-maintenance ticketing service: properties and
//! their rooms, maintenance jobs with topics and photos, user profiles and
//! token based sign-in.
//!
//! ## Feature Flags
//!
//! - `full` (default) - everything, including the HTTP server
//! - `minimal` - data model and job lifecycle only
//! - `maintenance` - jobs, properties, rooms, topics and accounts
//! - `images` - upload normalization
//! - `storages` - media storage backends
//! - `conf` - layered settings
//! - `server` - HTTP API and the `lastnext` binary
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use lastnext::prelude::*;
//!
//! # async fn example(jobs: JobManager, user: User) -> Result<()> {
//! let job = jobs
//! 	.create(
//! 		CreateJobInput {
//! 			description: "Air conditioner leaking".into(),
//! 			remarks: "Room 204".into(),
//! 			..Default::default()
//! 		},
//! 		&user,
//! 		&[],
//! 	)
//! 	.await?;
//! jobs.update_status(&job.job_id, "in_progress", &user).await?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "conf")]
pub use lastnext_conf as conf;
#[cfg(feature = "images")]
pub use lastnext_images as images;
#[cfg(feature = "maintenance")]
pub use lastnext_maintenance as maintenance;
#[cfg(feature = "server")]
pub use lastnext_server as server;
#[cfg(feature = "storages")]
pub use lastnext_storages as storages;

#[cfg(feature = "conf")]
pub use lastnext_conf::Settings;
#[cfg(feature = "images")]
pub use lastnext_images::{ImageKind, ImagePipeline, UploadedFile};
#[cfg(feature = "maintenance")]
pub use lastnext_maintenance::{Accounts, JobManager, MaintenanceError};
#[cfg(feature = "server")]
pub use lastnext_server::{App, AppState, HttpServer};
#[cfg(feature = "storages")]
pub use lastnext_storages::{StorageBackend, create_storage};

/// Prelude module for convenient imports
pub mod prelude {
	#[cfg(feature = "maintenance")]
	pub use lastnext_maintenance::prelude::*;

	#[cfg(feature = "images")]
	pub use lastnext_images::{ImagePipeline, UploadedFile};

	#[cfg(feature = "conf")]
	pub use lastnext_conf::Settings;

	#[cfg(feature = "server")]
	pub use lastnext_server::{App, AppState, HttpServer, Request, Response};
}
