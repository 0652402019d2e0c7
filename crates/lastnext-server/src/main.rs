//! `lastnext` command-line entry point.
//!
//! ```bash
//! lastnext runserver --addr 0.0.0.0:8000
//! lastnext migrate
//! lastnext check-settings
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lastnext_conf::Settings;
use lastnext_server::{
	App, AppState, HttpServer, connect_database, media_storage_config, serve_with_shutdown,
};
use lastnext_storages::create_storage;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lastnext")]
#[command(about = "Lastnext maintenance backend", long_about = None)]
#[command(version)]
struct Cli {
	/// Directory holding base.toml and the per-profile overrides
	#[arg(long, default_value = "settings")]
	settings_dir: PathBuf,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Apply migrations and serve the HTTP API
	Runserver {
		/// Listen address, overriding server.addr
		#[arg(long)]
		addr: Option<String>,
	},

	/// Apply pending database migrations
	Migrate,

	/// Load and validate the settings, then print the active profile
	CheckSettings,
}

fn init_tracing(settings: &Settings) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));
	tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn runserver(settings: Settings, addr: Option<String>) -> anyhow::Result<()> {
	let addr = addr.unwrap_or_else(|| settings.server.addr.clone());
	let addr: SocketAddr = addr
		.parse()
		.with_context(|| format!("Invalid listen address {:?}", addr))?;

	let db = connect_database(&settings).await?;
	db.migrate().await.context("Failed to apply migrations")?;
	let storage = create_storage(media_storage_config(&settings.media)?).await?;

	let max_body_bytes = settings.server.max_body_bytes;
	let state = AppState::new(settings, db.pool().clone(), storage)?;
	let server = HttpServer::new(Arc::new(App::new(Arc::new(state))))
		.with_max_body_bytes(max_body_bytes);

	serve_with_shutdown(server, addr).await?;
	Ok(())
}

async fn migrate(settings: &Settings) -> anyhow::Result<()> {
	let db = connect_database(settings).await?;
	db.migrate().await.context("Failed to apply migrations")?;
	tracing::info!("Migrations applied to {}", settings.database.url);
	Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let settings = Settings::load(&cli.settings_dir)
		.with_context(|| format!("Failed to load settings from {}", cli.settings_dir.display()))?;
	init_tracing(&settings);

	match cli.command {
		Commands::Runserver { addr } => runserver(settings, addr).await,
		Commands::Migrate => migrate(&settings).await,
		Commands::CheckSettings => {
			println!("Settings OK (profile: {})", settings.profile);
			Ok(())
		}
	}
}
