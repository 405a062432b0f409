use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::router;
use agenda_sisreg::config::AppConfig;
use agenda_sisreg::error::AppError;
use agenda_sisreg::store::FileStore;
use agenda_sisreg::telemetry::{self, LogTarget};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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

    telemetry::init(&config.telemetry, LogTarget::Stdout)?;

    let store = FileStore::open(config.storage.store_dir.clone())?;
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let app_state = AppState::new(
        prometheus_handle,
        Arc::new(store),
        config.storage.default_unit.clone(),
    );
    let readiness_flag = app_state.readiness.clone();

    let app = router()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        store = %config.storage.store_dir.display(),
        "agenda sisreg service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
