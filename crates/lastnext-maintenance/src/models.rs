//! Persistent records and their queries.
//!
//! - `Property`, `Room`: the places jobs are filed against
//! - `Topic`: job subject, unique by title
//! - `Job`, `JobImage`: maintenance tickets and their photos
//! - `User`, `UserProfile`, `Session`: accounts
//!
//! Queries take `&mut SqliteConnection` so they run equally on a pooled
//! connection or inside a transaction.

pub mod job;
pub mod job_image;
pub mod property;
pub mod room;
pub mod session;
pub mod topic;
pub mod user;

pub use job::{Job, JobPriority, JobStatus};
pub use job_image::JobImage;
pub use property::Property;
pub use room::Room;
pub use session::Session;
pub use topic::Topic;
pub use user::{User, UserProfile};
