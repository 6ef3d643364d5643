mod api;
mod config;
mod error;
mod events;
mod fifo;
mod models;
mod openapi;
mod process;
mod queue_service;
mod search;
mod startup;
mod state;
mod stream_launcher;
mod volume;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "studio-hub-server",
    version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("GIT_SHA"),
        ", ",
        env!("BUILD_DATE"),
        ")"
    )
)]
struct Args {
    /// HTTP bind address, e.g. 0.0.0.0:8080
    #[arg(long)]
    bind: Option<std::net::SocketAddr>,

    /// Optional server config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,actix_web=info,studio_hub_server=info")
        }))
        .init();

    startup::run(args).await
}
