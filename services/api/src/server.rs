use crate::cli::ServeArgs;
use crate::infra::{AppState, MapService};
use crate::routes::map_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use client_map::config::AppConfig;
use client_map::error::AppError;
use client_map::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        maps: Arc::new(MapService::from_config(&config)),
    };

    let app = map_routes()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        source = %config.sources.clients_url,
        "client map service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
