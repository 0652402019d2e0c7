//! Settings layering: defaults, base.toml, profile file, environment.

use lastnext_conf::{ConfError, Settings};
use rstest::{fixture, rstest};
use std::fs;
use tempfile::TempDir;

#[fixture]
fn settings_dir() -> TempDir {
	let dir = TempDir::new().expect("Failed to create temp dir");
	fs::write(
		dir.path().join("base.toml"),
		r#"
[database]
url = "sqlite://base.db"
max_connections = 2

[server]
addr = "0.0.0.0:8000"
"#,
	)
	.unwrap();
	fs::write(
		dir.path().join("local.toml"),
		r#"
[database]
url = "sqlite://local.db"
"#,
	)
	.unwrap();
	fs::write(
		dir.path().join("production.toml"),
		r#"
[auth]
secret_key = "production-secret-value-0123456789"

[media]
root = "/srv/media"
"#,
	)
	.unwrap();
	dir
}

fn no_env() -> Vec<(String, String)> {
	Vec::new()
}

#[rstest]
fn test_defaults_without_files() {
	let dir = TempDir::new().unwrap();

	let settings = Settings::load_from(dir.path(), no_env()).unwrap();

	assert_eq!(settings.profile, "local");
	assert_eq!(settings.database.max_connections, 1);
	assert_eq!(settings.auth.access_token_minutes, 60);
	assert_eq!(settings.media.url, "/media");
}

#[rstest]
fn test_profile_file_overrides_base(settings_dir: TempDir) {
	let settings = Settings::load_from(settings_dir.path(), no_env()).unwrap();

	assert_eq!(settings.database.url, "sqlite://local.db");
	assert_eq!(settings.database.max_connections, 2);
	assert_eq!(settings.server.addr, "0.0.0.0:8000");
}

#[rstest]
fn test_env_overrides_files(settings_dir: TempDir) {
	let env = [
		("LASTNEXT_DATABASE_URL", "sqlite://env.db"),
		("LASTNEXT_DATABASE_MAX_CONNECTIONS", "3"),
		("LASTNEXT_MEDIA_CREATE_DIRS", "false"),
	];

	let settings = Settings::load_from(settings_dir.path(), env).unwrap();

	assert_eq!(settings.database.url, "sqlite://env.db");
	assert_eq!(settings.database.max_connections, 3);
	assert!(!settings.media.create_dirs);
}

#[rstest]
fn test_profile_selected_by_env(settings_dir: TempDir) {
	let env = [("LASTNEXT_ENV", "production")];

	let settings = Settings::load_from(settings_dir.path(), env).unwrap();

	assert_eq!(settings.profile, "production");
	assert_eq!(settings.database.url, "sqlite://base.db");
	assert_eq!(settings.media.root, "/srv/media");
}

#[rstest]
fn test_production_requires_secret(settings_dir: TempDir) {
	fs::remove_file(settings_dir.path().join("production.toml")).unwrap();
	let env = [("LASTNEXT_ENV", "production")];

	let result = Settings::load_from(settings_dir.path(), env);

	assert!(matches!(result, Err(ConfError::Validation(_))));
}

#[rstest]
fn test_invalid_toml_reports_path(settings_dir: TempDir) {
	fs::write(settings_dir.path().join("base.toml"), "[database\nurl =").unwrap();

	let result = Settings::load_from(settings_dir.path(), no_env());

	match result {
		Err(ConfError::Toml { path, .. }) => assert!(path.ends_with("base.toml")),
		other => panic!("expected TOML error, got {:?}", other),
	}
}

#[rstest]
fn test_zero_connections_rejected() {
	let dir = TempDir::new().unwrap();
	let env = [("LASTNEXT_DATABASE_MAX_CONNECTIONS", "0")];

	let result = Settings::load_from(dir.path(), env);

	assert!(matches!(result, Err(ConfError::Validation(_))));
}

#[rstest]
#[serial_test::serial]
fn test_load_reads_process_environment(settings_dir: TempDir) {
	// SAFETY: Setting environment variables is unsafe in multi-threaded programs.
	// This test uses #[serial] to ensure exclusive access to environment variables.
	unsafe {
		std::env::set_var("LASTNEXT_ENV", "production");
		std::env::set_var("LASTNEXT_SERVER_ADDR", "127.0.0.1:9100");
	}

	let result = Settings::load(settings_dir.path());

	// SAFETY: Removing environment variables is unsafe in multi-threaded programs.
	// This test uses #[serial] to ensure exclusive access to environment variables.
	unsafe {
		std::env::remove_var("LASTNEXT_ENV");
		std::env::remove_var("LASTNEXT_SERVER_ADDR");
	}
	let settings = result.unwrap();
	assert_eq!(settings.profile, "production");
	assert_eq!(settings.server.addr, "127.0.0.1:9100");
}
