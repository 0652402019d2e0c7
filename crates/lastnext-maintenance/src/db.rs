//! SQLite connection pool and migrations.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration;

use crate::error::Result;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Pool configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	pub url: String,
	/// SQLite admits one writer at a time, so the default is a single
	/// connection.
	pub max_connections: u32,
	pub acquire_timeout: Duration,
	pub busy_timeout: Duration,
}

impl DatabaseConfig {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			max_connections: 1,
			acquire_timeout: Duration::from_secs(30),
			busy_timeout: Duration::from_secs(5),
		}
	}

	pub fn with_max_connections(mut self, max: u32) -> Self {
		self.max_connections = max.max(1);
		self
	}
}

/// Handle to the SQLite database.
#[derive(Debug, Clone)]
pub struct Database {
	pool: SqlitePool,
}

impl Database {
	/// Open (creating if missing) the database described by `config`.
	pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
		let options = SqliteConnectOptions::from_str(&config.url)?
			.create_if_missing(true)
			.foreign_keys(true)
			.busy_timeout(config.busy_timeout);

		let pool = SqlitePoolOptions::new()
			.max_connections(config.max_connections)
			.acquire_timeout(config.acquire_timeout)
			.connect_with(options)
			.await?;

		tracing::info!(
			"Connected to {} ({} connection(s))",
			config.url,
			config.max_connections
		);
		Ok(Self { pool })
	}

	/// Apply pending migrations.
	pub async fn migrate(&self) -> Result<()> {
		MIGRATOR.run(&self.pool).await?;
		Ok(())
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}
}

impl From<SqlitePool> for Database {
	fn from(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

/// Start a transaction holding the write lock from `BEGIN`, so concurrent
/// writers queue on the busy timeout. A deferred transaction that reads
/// before writing gets `SQLITE_BUSY` immediately.
pub(crate) async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>> {
	Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Whether `err` is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
	err.as_database_error()
		.map(|db_err| db_err.is_unique_violation())
		.unwrap_or(false)
}
