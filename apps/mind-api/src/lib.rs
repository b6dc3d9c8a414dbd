pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use color_eyre::eyre;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = mind_cli::VERSION,
	rename_all = "kebab",
	styles = mind_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = mind_config::load(&args.config)?;

	init_tracing(&config)?;

	let http_addr = resolve_bind(&config)?;
	let state = AppState::new(config).await?;
	let app = routes::router(state);
	let http_listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, version = mind_cli::VERSION, "HTTP server listening.");

	axum::serve(http_listener, app).await?;

	Ok(())
}

/// Parses `service.http_bind`, refusing non-loopback addresses while `bind_localhost_only` is set.
pub fn resolve_bind(config: &mind_config::Config) -> color_eyre::Result<SocketAddr> {
	let http_addr: SocketAddr = config.service.http_bind.parse()?;

	if config.security.bind_localhost_only && !http_addr.ip().is_loopback() {
		return Err(eyre::eyre!(
			"http_bind must be a loopback address when bind_localhost_only is true."
		));
	}

	Ok(http_addr)
}

fn init_tracing(config: &mind_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	Ok(())
}
