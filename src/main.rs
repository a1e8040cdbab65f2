use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use connecdo_api::api::dispatch::{routes, API_PREFIX};
use connecdo_api::config::{AppConfig, StoreKind};
use connecdo_api::{app, AppState};

#[derive(Parser)]
#[command(name = "connecdo-api", version, about = "Connecdo API server")]
struct Cli {
    #[arg(long, help = "Port to listen on (overrides CONNECDO_API_PORT / PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Store backend: supabase or memory (overrides CONNECDO_STORE)")]
    store: Option<String>,

    #[arg(long, help = "Print the route table and exit")]
    routes: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SUPABASE_URL, SUPABASE_ANON_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("connecdo_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.routes {
        for route in routes() {
            let auth = if route.auth { "auth" } else { "public" };
            println!("{:<7} {}{:<20} {}", route.method.as_str(), API_PREFIX, route.path, auth);
        }
        return Ok(());
    }

    let mut config = AppConfig::from_env();
    if let Some(port) = cli.port {
        config.api.port = port;
    }
    if let Some(store) = cli.store.as_deref() {
        config.store.kind =
            StoreKind::parse(store).with_context(|| format!("unknown store backend '{}'", store))?;
    }

    tracing::info!(
        "Starting Connecdo API in {:?} mode with {:?} store",
        config.environment,
        config.store.kind
    );

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let state = AppState::from_config(config).context("failed to configure the data store")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Connecdo API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
