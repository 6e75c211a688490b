use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use parish_api::extractors::{TENANT_KEY_HEADER, TENANT_NAME_HEADER};
use parish_api::state::AppState;
use parish_core::repositories::{CashMovementRepository, ObligationRepository, TenantDirectory};
use parish_core::services::{
    BalanceService, Clock, ObligationService, SystemClock, TenantAccessService,
};
use parish_infrastructure::{
    ConnectionMonitor, PgCashMovementRepository, PgObligationRepository, PgTenantDirectory,
    TenantConnectionRegistry,
};
use parish_shared::config::AppConfig;

const CORS_ORIGIN: &str = "http://localhost:5173";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Held until exit so buffered log lines are flushed
    let _log_guard = parish_shared::telemetry::init_telemetry();

    info!("Parish server starting...");

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!(database = ?config.database, monitor = ?config.monitor, "Configuration loaded");

    // Pools open lazily, so nothing connects until the first request
    let registry = Arc::new(TenantConnectionRegistry::new(config.database.clone()));

    let directory: Arc<dyn TenantDirectory> = Arc::new(PgTenantDirectory::new(registry.clone()));
    let repository: Arc<dyn ObligationRepository> =
        Arc::new(PgObligationRepository::new(registry.clone()));
    let movements: Arc<dyn CashMovementRepository> =
        Arc::new(PgCashMovementRepository::new(registry.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let state = AppState {
        registry: registry.clone(),
        tenants: Arc::new(TenantAccessService::new(directory)),
        obligations: Arc::new(ObligationService::new(repository, clock.clone())),
        balances: Arc::new(BalanceService::new(movements, clock)),
        config: config.clone(),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor = config.monitor.enabled.then(|| {
        ConnectionMonitor::new(registry.clone(), &config.monitor, config.database.max_connections)
            .spawn(shutdown_rx)
    });

    let app = parish_api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(CORS_ORIGIN.parse::<HeaderValue>()?)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    HeaderName::from_static(TENANT_KEY_HEADER),
                    HeaderName::from_static(TENANT_NAME_HEADER),
                ]),
        );

    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));

    run(addr, app, shutdown_signal(), registry, shutdown_tx, monitor).await
}

/// Serves until `signal` resolves, then stops the monitor and closes every
/// pool. Teardown runs whether serving ended cleanly or with an error.
async fn run(
    addr: SocketAddr,
    app: Router,
    signal: impl Future<Output = ()> + Send + 'static,
    registry: Arc<TenantConnectionRegistry>,
    shutdown_tx: watch::Sender<bool>,
    monitor: Option<JoinHandle<()>>,
) -> anyhow::Result<()> {
    let served = serve(addr, app, signal).await;
    if let Err(e) = &served {
        error!("Server stopped with an error: {}", e);
    }

    info!("Shutting down");
    let _ = shutdown_tx.send(true);
    if let Some(monitor) = monitor {
        if let Err(e) = monitor.await {
            error!("Connection monitor ended abnormally: {}", e);
        }
    }
    registry.close().await;
    info!("All connection pools closed");

    served
}

async fn serve(
    addr: SocketAddr,
    app: Router,
    signal: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).with_graceful_shutdown(signal).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
