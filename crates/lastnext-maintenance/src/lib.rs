//! # lastnext-maintenance
//!
//! Maintenance ticketing for properties and rooms.
//!
//! ## Features
//!
//! - [`JobManager`]: create jobs, change their status, apply partial updates,
//!   attach and remove images. Every multi-step write runs in one SQLite
//!   transaction.
//! - Properties, rooms and topics ([`properties`], [`topics`])
//! - [`Accounts`]: registration, password login, sessions, profiles and
//!   identity-provider sign-in
//! - [`TokenIssuer`]: HS256 access and refresh tokens
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lastnext_images::ImagePipeline;
//! use lastnext_maintenance::{CreateJobInput, Database, DatabaseConfig, JobManager};
//! use lastnext_storages::{MemoryConfig, MemoryStorage};
//! use std::sync::Arc;
//!
//! # async fn run(actor: lastnext_maintenance::User) -> lastnext_maintenance::Result<()> {
//! let db = Database::connect(&DatabaseConfig::new("sqlite://lastnext.db")).await?;
//! db.migrate().await?;
//!
//! let images = ImagePipeline::new(Arc::new(MemoryStorage::new(MemoryConfig::default())));
//! let jobs = JobManager::new(db.pool().clone(), images);
//!
//! let input = CreateJobInput {
//!     description: "Leaking tap".to_string(),
//!     remarks: "Bathroom 2".to_string(),
//!     ..Default::default()
//! };
//! let job = jobs.create(input, &actor, &[]).await?;
//! println!("created {}", job.job_id);
//! # Ok(())
//! # }
//! ```

pub mod accounts;
pub mod db;
pub mod error;
pub mod identity;
pub mod ids;
pub mod inputs;
pub mod jobs;
pub mod models;
pub mod password;
pub mod properties;
pub mod tokens;
pub mod topics;

pub use accounts::{Accounts, AuthSession, ProfileDetail};
pub use db::{Database, DatabaseConfig, MIGRATOR};
pub use error::{FieldErrors, MaintenanceError, Result};
pub use identity::{
	GoogleTokenVerifier, HttpPictureFetcher, IdentityClaims, IdentityVerifier, PictureFetcher,
};
pub use inputs::{
	CreateJobInput, CreatePropertyInput, CreateRoomInput, RegisterInput, TopicData,
	UpdateJobInput, UpdateProfileInput,
};
pub use jobs::{JobDetail, JobImageDetail, JobManager};
pub use models::{
	Job, JobImage, JobPriority, JobStatus, Property, Room, Session, Topic, User, UserProfile,
};
pub use password::{Argon2Hasher, PasswordHasher};
pub use properties::PropertyDetail;
pub use tokens::{Claims, TokenIssuer, TokenPair, TokenType};

/// Prelude module for convenient imports
pub mod prelude {
	pub use crate::accounts::{Accounts, AuthSession};
	pub use crate::error::{FieldErrors, MaintenanceError, Result};
	pub use crate::inputs::{CreateJobInput, TopicData, UpdateJobInput};
	pub use crate::jobs::{JobDetail, JobManager};
	pub use crate::models::{JobPriority, JobStatus, User};
}
