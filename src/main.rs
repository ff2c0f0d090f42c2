//! Catalog server
//!
//! Opens the Sled product store, registers the demo user and serves the REST
//! API until Ctrl-C.
//!
//! Usage:
//!   cargo run --bin seed_products   # optional sample data
//!   cargo run --bin shop_catalog    # start server
//!   # Then open http://localhost:8000/docs or use catalog-cli

use std::sync::Arc;

use tokio::net::TcpListener;

use shop_catalog::auth::{InMemoryIdentityProvider, TokenService};
use shop_catalog::config::{Config, DEFAULT_JWT_SECRET};
use shop_catalog::logging;
use shop_catalog::rest::{create_router, AppState};
use shop_catalog::storage::Storage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let _log_guard = logging::init(&config);

    if config.jwt_secret == DEFAULT_JWT_SECRET {
        tracing::warn!("CATALOG_JWT_SECRET is not set; using the built-in development secret");
    }

    let storage = Storage::open(&config.db_path)?;
    tracing::info!(path = %config.db_path.display(), "product store opened");

    let identities = InMemoryIdentityProvider::new().with_user(
        &config.demo_user,
        &config.demo_password,
        config.bcrypt_cost,
    )?;
    let tokens = TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl);

    let app = create_router(AppState::new(storage, tokens, Arc::new(identities)));

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "catalog API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
}
