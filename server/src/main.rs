mod auth;
mod config;
mod presence;
mod registry;
mod routes;
mod signaling;
mod state;
mod ws;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use auth::OpenVerifier;
use config::{generate_config_template, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    // Handle --generate-config: print template and exit
    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Initialize tracing/logging
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "argus_server=info".parse().unwrap()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "argus_server=info".parse().unwrap()),
            )
            .init();
    }

    tracing::info!("Argus relay v{} starting", env!("CARGO_PKG_VERSION"));

    // Identity verification is the platform auth service's job; the
    // relay ships with the open verifier, which trusts every join.
    // Swap in a real client here to gate joins on credentials.
    let app_state = state::AppState::new(Arc::new(OpenVerifier));

    // Build router
    let app = routes::build_router(app_state);

    // Bind and serve
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
