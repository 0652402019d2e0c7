//! # lastnext-storages
//!
//! Media storage backend abstraction for Lastnext.
//!
//! Uploaded job photos and profile pictures are written through the
//! [`StorageBackend`] trait, so the image pipeline never touches the file
//! system directly.
//!
//! ## Backends
//!
//! - **Local**: files under a base directory, served from a media base URL
//! - **Memory**: process-local map, used by tests and ephemeral setups
//!
//! ## Example
//!
//! ```rust,no_run
//! use lastnext_storages::{create_storage, LocalConfig, StorageConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StorageConfig::Local(LocalConfig::new("/var/lib/lastnext/media", "/media"));
//!     let storage = create_storage(config).await?;
//!
//!     let name = storage.save("profile_images/2024/05/abc.webp", b"...").await?;
//!     let url = storage.url(&name).await?;
//!     assert_eq!(url, "/media/profile_images/2024/05/abc.webp");
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod backends;
pub mod config;
pub mod error;
pub mod factory;

pub use backend::StorageBackend;
pub use backends::memory::MemoryStorage;
#[cfg(feature = "local")]
pub use backends::local::LocalStorage;
#[cfg(feature = "local")]
pub use config::LocalConfig;
pub use config::{BackendType, MemoryConfig, StorageConfig};
pub use error::{Result, StorageError};
pub use factory::create_storage;
