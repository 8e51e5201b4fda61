use std::{process::ExitCode, sync::Arc};

use authentication_api::{
    build_api_route_filter, handle_auth_errors, Auth, AuthConfig, Config, RedisCredentialStore,
    SystemClock,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warp::Filter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authentication_api=debug,warp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        bind_address = %config.bind_address,
        token_issuer = %config.token_issuer,
        token_lifetime_seconds = config.token_lifetime.as_secs(),
        "Configuration loaded"
    );
    if config.uses_default_secret() {
        warn!("Signing tokens with the built-in default secret; set AUTH_API_TOKEN_SECRET");
    }

    let credential_store = match RedisCredentialStore::new(&config.redis_url) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(error = %e, "Invalid Redis URL");
            return ExitCode::FAILURE;
        }
    };

    let auth = Auth::new(AuthConfig {
        auth_token_issuer: config.token_issuer.clone(),
        auth_token_secret: config.token_secret.clone(),
        auth_token_lifetime: config.token_lifetime,
        credential_store,
        clock: Arc::new(SystemClock),
    });

    let routes = build_api_route_filter(&auth)
        .recover(handle_auth_errors)
        .with(warp::trace::request());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
    };

    let server = match warp::serve(routes)
        .try_bind_with_graceful_shutdown(config.bind_address, shutdown)
    {
        Ok((addr, server)) => {
            info!("starting authentication-api on http://{}", addr);
            server
        }
        Err(e) => {
            error!(bind_address = %config.bind_address, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    server.await;

    info!("authentication-api stopped");
    ExitCode::SUCCESS
}
