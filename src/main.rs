//! Entry point: load config, run migrations, wire dependencies, and serve.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use bandmate::config::{Config, StorageBackend};
use bandmate::db;
use bandmate::repositories::{ImageStore, LocalImageStore, S3ImageStore};
use bandmate::{create_app, AppState};
use chrono::Duration;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&db_pool).await?;
    tracing::info!("migrations applied");

    let jwt_secret = bandmate::auth::JwtSecret::new(
        config.jwt_secret.clone(),
        Duration::minutes(config.access_token_expire_minutes),
        Duration::days(config.refresh_token_expire_days),
    );

    let image_store: Arc<dyn ImageStore> = match (&config.storage_backend, &config.s3) {
        (StorageBackend::S3, Some(s3)) => {
            tracing::info!(bucket = %s3.bucket, region = %s3.region, "image storage: s3");
            Arc::new(S3ImageStore::new(s3.clone()))
        }
        _ => {
            tokio::fs::create_dir_all(&config.image_upload_dir).await?;
            tracing::info!(dir = %config.image_upload_dir.display(), "image storage: local");
            Arc::new(LocalImageStore::new(
                config.image_upload_dir.clone(),
                config.image_base_url.clone(),
            ))
        }
    };

    let state = AppState::new(
        db_pool,
        jwt_secret,
        image_store,
        config.max_image_bytes,
        config.cookie_secure,
    );

    let mut app = create_app(state);
    if config.storage_backend == StorageBackend::Local {
        app = app.nest_service("/uploads", ServeDir::new(&config.image_upload_dir));
    }
    let app = app
        .layer(cors_layer(&config.cors_allowed_origins)?)
        .layer(TraceLayer::new_for_http());

    tracing::info!(addr = %config.server_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

/// Any origin when none are configured; otherwise the listed origins with
/// credentials so the refresh cookie is sent.
fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }
    let origins = origins
        .iter()
        .map(|o| HeaderValue::from_str(o))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown signal received");
}
