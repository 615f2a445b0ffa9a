use crate::cli::ServeArgs;
use crate::infra::{seeded_stores, AppState};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use matchflow::config::AppConfig;
use matchflow::error::AppError;
use matchflow::telemetry;
use matchflow::workflows::matching::{MatchingService, MatchingSettings};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

/// Age the seeded sample minor is given when the server boots.
const SEEDED_MINOR_AGE: u8 = 16;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let stores = seeded_stores(SEEDED_MINOR_AGE);
    let matching_service = Arc::new(MatchingService::new(
        stores.ports(),
        MatchingSettings::from(&config.matching),
    ));

    let app = with_application_routes(matching_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        adult_age = config.matching.adult_age,
        retry_budget = config.matching.capacity_retry_budget,
        "matchflow service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
