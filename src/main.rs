use chrono::Local;
use deal_calendar::models::YearMonth;
use deal_calendar::source::{AmoCrmSource, DealSource, MockDealSource};
use deal_calendar::{load_settings, router, AppState, WidgetConfig};
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = WidgetConfig::from_env();
    let settings = load_settings(&config.settings_path, config.initial_settings).await;

    let source: Arc<dyn DealSource> = match &config.host {
        Some(host) => {
            info!(base_url = %host.base_url, "fetching deals from host");
            Arc::new(AmoCrmSource::new(&host.base_url, &host.access_token)?)
        }
        None => {
            warn!("no host configured, serving demo deals");
            Arc::new(MockDealSource)
        }
    };

    let month = YearMonth::containing(Local::now().date_naive());
    let state = AppState::new(config.settings_path.clone(), source, month, settings);
    state.reload().await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
