use crate::cli::ServeArgs;
use crate::infra::{load_catalog, seeded_repository, AppState};
use crate::routes::with_subevent_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use event_registry::config::AppConfig;
use event_registry::error::AppError;
use event_registry::subevents::SubeventService;
use event_registry::telemetry;
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
    if let Some(seed) = args.seed.take() {
        config.catalog.seed_path = Some(seed);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = match &config.catalog.seed_path {
        Some(path) => {
            let catalog = load_catalog(path)?;
            info!(path = %path.display(), subevents = catalog.len(), "loaded subevent catalog");
            catalog
        }
        None => Vec::new(),
    };
    let repository = Arc::new(seeded_repository(catalog)?);
    let subevent_service = Arc::new(SubeventService::new(repository));

    let app = with_subevent_routes(subevent_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "event registry ready");

    axum::serve(listener, app).await?;
    Ok(())
}
