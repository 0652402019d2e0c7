//! # lastnext-conf
//!
//! Settings for the Lastnext maintenance backend.
//!
//! Values are layered, later layers overriding earlier ones:
//!
//! 1. built-in defaults ([`Settings::default`])
//! 2. `settings/base.toml`
//! 3. `settings/<profile>.toml`, the profile coming from `LASTNEXT_ENV`
//!    (default `local`)
//! 4. `LASTNEXT_<SECTION>_<KEY>` environment variables
//!
//! Missing files are skipped. Environment values are parsed to the type of
//! the key they override, so `LASTNEXT_DATABASE_MAX_CONNECTIONS=4` becomes a
//! number and `LASTNEXT_MEDIA_CREATE_DIRS=false` a boolean.
//!
//! ```rust,no_run
//! use lastnext_conf::Settings;
//!
//! let settings = Settings::load("settings").expect("invalid settings");
//! println!("listening on {}", settings.server.addr);
//! ```

pub mod builder;
pub mod error;
pub mod settings;
pub mod sources;

pub use builder::SettingsBuilder;
pub use error::{ConfError, Result};
pub use settings::{
	AuthSettings, DatabaseSettings, GoogleSettings, LogSettings, MediaSettings, ServerSettings,
	Settings,
};
pub use sources::{ConfigSource, DefaultSource, EnvSource, TomlFileSource};

/// Prefix of every environment variable read by [`EnvSource`].
pub const ENV_PREFIX: &str = "LASTNEXT_";

/// Environment variable selecting the settings profile.
pub const PROFILE_VAR: &str = "LASTNEXT_ENV";

/// Profile used when `LASTNEXT_ENV` is unset.
pub const DEFAULT_PROFILE: &str = "local";
