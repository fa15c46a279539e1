use anyhow::Context;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use agritrace as api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config().context("failed to load configuration")?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    let client = api::query::connect(&cfg).context("failed to set up table backend")?;
    let verifier = api::auth::TokenVerifier::new(&cfg.jwt_secret, &cfg.jwt_audience);
    let app_state = api::AppState::new(client, verifier);

    let cors_layer = if cfg.is_production() {
        CorsLayer::new()
    } else {
        info!("Using permissive CORS outside production");
        CorsLayer::permissive()
    };

    let app = api::build_router(app_state).layer(cors_layer);

    let addr = cfg.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("agritrace-api listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
