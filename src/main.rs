//! mdpost - post storage and remote markdown discovery over HTTP
//!
//! # Usage
//! ```bash
//! mdpost                          # Serve on port 5000 with ./data.db
//! mdpost --port 8080 --database posts.db
//! GH_TOKEN=... mdpost             # Authenticated GitHub listings
//! ```

mod config;
mod db;
mod error;
mod github;
mod models;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::BaseUrlRegistry;
use db::PostStore;
use github::{GithubClient, TreeFetcher};

const DEFAULT_ENV_FILE: &str = ".env";

/// Stores posts in SQLite and finds markdown files in GitHub repositories
#[derive(Parser, Debug)]
#[command(name = "mdpost")]
#[command(about = "Post storage and remote markdown discovery over HTTP", long_about = None)]
struct Cli {
    /// Port to run the server on
    #[arg(short, long, env = "PORT", default_value = "5000")]
    port: u16,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// SQLite database file
    #[arg(short, long, env = "DATABASE_PATH", default_value = "./data.db")]
    database: String,

    /// Token sent to the GitHub API
    #[arg(long, env = "GH_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// GitHub API root
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    github_api_url: String,

    /// Timeout for each remote listing, in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value = "30")]
    fetch_timeout_secs: u64,

    /// Maximum remote listings in flight per server
    #[arg(long, env = "FETCH_CONCURRENCY", default_value = "8")]
    fetch_concurrency: usize,

    /// Public base URL; derived from host name and port when unset
    #[arg(long, env = "API_BASE_URL")]
    base_url: Option<String>,

    /// Env file read at startup and used to persist a derived base URL
    #[arg(long, env = "ENV_FILE", default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The env file path may itself come from a flag, so resolve it first and
    // parse again once its values are in the environment
    let env_file = Cli::parse().env_file;
    let env_loaded = config::load_env_file(&env_file)?;

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if env_loaded {
        tracing::info!("Loaded environment from {}", env_file.display());
    }

    let store = PostStore::open(&cli.database).await?;
    tracing::info!("Database ready at {}", cli.database);

    let client = GithubClient::new(
        &cli.github_api_url,
        cli.github_token.as_deref(),
        Duration::from_secs(cli.fetch_timeout_secs),
    )?;
    if cli.github_token.is_none() {
        tracing::warn!("GH_TOKEN is not set; GitHub listings are unauthenticated");
    }
    let fetcher = Arc::new(TreeFetcher::new(Arc::new(client), cli.fetch_concurrency));

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::create_router(store, fetcher)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let registry = BaseUrlRegistry::new(cli.base_url.clone(), cli.port, &env_file);
    let base_url = registry.ensure_registered()?;

    tracing::info!("Listening on {} (base URL {})", addr, base_url);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutting down");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
