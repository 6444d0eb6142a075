use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use formfill::config::Config;
use formfill::extraction::ResumeExtractor;
use formfill::register::ProfileRegister;
use formfill::routes::build_router;
use formfill::scanning::{FieldClassifier, HttpSessionFactory};
use formfill::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting formfill API v{}", env!("CARGO_PKG_VERSION"));

    // Plain HTTP page fetches; swap the factory for a real browser driver.
    let sessions = HttpSessionFactory::new(&config.browser_user_agent)
        .context("Failed to build page session factory")?;
    info!(
        "Scrape timeouts: navigation {}s, field wait {}s",
        config.navigation_timeout_secs, config.field_wait_timeout_secs
    );

    let state = AppState {
        config: config.clone(),
        extractor: Arc::new(ResumeExtractor::default()),
        classifier: Arc::new(FieldClassifier::default()),
        sessions: Arc::new(sessions),
        register: ProfileRegister::default(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
