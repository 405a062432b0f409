use agenda_sisreg::auth::SessionStore;
use agenda_sisreg::catalog::Catalog;
use agenda_sisreg::config::AppConfig;
use agenda_sisreg::error::AppError;
use agenda_sisreg::escalas::ScheduleEntry;
use agenda_sisreg::store::{keys, FileStore, LocalStore};
use agenda_sisreg::sync::read_cache;
use agenda_sisreg::telemetry::{self, LogTarget};
use chrono::{NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) store: Arc<dyn LocalStore>,
    /// Serializes read-modify-write cycles on the draft list.
    pub(crate) writes: Arc<Mutex<()>>,
    pub(crate) default_unit: String,
}

impl AppState {
    pub(crate) fn new(
        metrics: PrometheusHandle,
        store: Arc<dyn LocalStore>,
        default_unit: impl Into<String>,
    ) -> Self {
        Self {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(metrics),
            store,
            writes: Arc::new(Mutex::new(())),
            default_unit: default_unit.into(),
        }
    }

    pub(crate) fn sessions(&self) -> SessionStore<'_> {
        SessionStore::new(&*self.store, self.default_unit.clone())
    }
}

/// Configuration plus the on-disk store, shared by every one-shot command.
pub(crate) struct CommandContext {
    pub(crate) config: AppConfig,
    pub(crate) store: FileStore,
}

impl CommandContext {
    pub(crate) fn load() -> Result<Self, AppError> {
        let config = AppConfig::load()?;
        telemetry::init(&config.telemetry, LogTarget::Stderr)?;
        let store = FileStore::open(config.storage.store_dir.clone())?;
        Ok(Self { config, store })
    }

    pub(crate) fn catalog(&self) -> Result<Catalog, AppError> {
        Ok(Catalog::load_dir(&self.config.storage.data_dir)?)
    }

    pub(crate) fn sessions(&self) -> SessionStore<'_> {
        SessionStore::new(&self.store, self.config.storage.default_unit.clone())
    }
}

/// Cached entries a dashboard starts from: the consolidated cache for a
/// MASTER session, otherwise the active unit's own cache.
pub(crate) fn dashboard_source(
    store: &dyn LocalStore,
    sessions: &SessionStore<'_>,
) -> Result<Vec<ScheduleEntry>, AppError> {
    let master = sessions
        .current(Utc::now())?
        .is_some_and(|session| session.is_master());
    if master {
        return Ok(read_cache(store, keys::MASTER_CACHE, "")?);
    }
    let unit = sessions.active_unit()?;
    Ok(read_cache(store, &keys::unit_cache(&unit), &unit)?)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
