mod api;
mod cache;
mod middleware;
mod scheduler;
mod sourcing;

use std::sync::Arc;
use std::time::Duration;

use salonscope_core::{AppConfig, DataMode, Profile};
use salonscope_scraper::{BrowserOptions, ChromeRenderer, Fetcher};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState, Monitoring},
    scheduler::MonitorRegistry,
    sourcing::Sourcing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = salonscope_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let sourcing = Arc::new(Sourcing::new(
        config.mode,
        build_fetcher(&config),
        Duration::from_millis(config.bulk_delay_ms),
    ));

    let monitoring = match config.profile {
        Profile::Full => Monitoring::Scheduled(Arc::new(
            MonitorRegistry::new(Arc::clone(&sourcing)).await?,
        )),
        Profile::Lite => Monitoring::Inert,
    };

    let state = AppState::new(
        Arc::clone(&sourcing),
        monitoring.clone(),
        Duration::from_secs(config.cache_ttl_secs),
    );
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        env = %config.env,
        requested_mode = %sourcing.mode(),
        mode = %sourcing.effective_mode(),
        profile = %config.profile,
        "salonscope server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Monitoring::Scheduled(registry) = monitoring {
        registry.shutdown().await;
    }
    Ok(())
}

/// Browser-backed fetcher for real mode, or `None` when demo data is all
/// that can be served.
fn build_fetcher(config: &AppConfig) -> Option<Fetcher> {
    if config.mode != DataMode::Real {
        return None;
    }

    let options = BrowserOptions {
        timeout: Duration::from_secs(config.scraper_timeout_secs),
        user_agent: config.scraper_user_agent.clone(),
        executable: config.chrome_path.clone(),
        headless: true,
    };
    match ChromeRenderer::new(options) {
        Ok(renderer) => Some(Fetcher::new(Arc::new(renderer))),
        Err(e) => {
            tracing::warn!(
                error = %e,
                "real scraping requested but no browser is usable; serving demo data"
            );
            None
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
