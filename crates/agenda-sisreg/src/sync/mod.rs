//! Keeps the per-unit caches in step with the remote spreadsheet.

mod client;

pub use client::SheetsClient;

use crate::config::ConfigError;
use crate::escalas::ingest::normalize_list;
use crate::escalas::ScheduleEntry;
use crate::store::{keys, JsonStoreExt, LocalStore, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::future::Future;
use tracing::{info, warn};

/// Unit name the backend reads as "every unit".
pub const ALL_UNITS: &str = "ALL";

/// Body returned by the sheets endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetsResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub dados: Value,
}

impl SheetsResponse {
    pub fn ok(dados: Value) -> Self {
        Self {
            status: "OK".to_string(),
            dados,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("sheets endpoint not configured: {0}")]
    NotConfigured(#[from] ConfigError),
    #[error("failed to reach sheets endpoint: {0}")]
    Transport(String),
    #[error("sheets endpoint answered with HTTP {status}")]
    Upstream { status: u16 },
    #[error("sheets response could not be decoded: {0}")]
    Decode(String),
    #[error("failed to encode schedule entry: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Remote spreadsheet operations.
pub trait SheetsGateway: Send + Sync {
    fn fetch(&self, unit: &str)
        -> impl Future<Output = Result<SheetsResponse, SyncError>> + Send;
    fn submit(&self, entry: &ScheduleEntry) -> impl Future<Output = Result<(), SyncError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "resultado", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Cache replaced with `entries`; `units` lists the distinct units seen.
    Updated {
        entries: Vec<ScheduleEntry>,
        units: Vec<String>,
    },
    /// The backend answered without data; the cache was left alone.
    NoData { status: String },
}

impl SyncOutcome {
    pub fn entries(&self) -> &[ScheduleEntry] {
        match self {
            SyncOutcome::Updated { entries, .. } => entries,
            SyncOutcome::NoData { .. } => &[],
        }
    }
}

pub struct SyncService<'a, G> {
    gateway: &'a G,
    store: &'a dyn LocalStore,
}

impl<'a, G: SheetsGateway> SyncService<'a, G> {
    pub fn new(gateway: &'a G, store: &'a dyn LocalStore) -> Self {
        Self { gateway, store }
    }

    pub async fn sync_unit(&self, unit: &str) -> Result<SyncOutcome, SyncError> {
        self.refresh(unit, &keys::unit_cache(unit), unit).await
    }

    /// MASTER refresh of every unit into the consolidated cache.
    pub async fn sync_all(&self) -> Result<SyncOutcome, SyncError> {
        self.refresh(ALL_UNITS, keys::MASTER_CACHE, "").await
    }

    pub fn cached(&self, unit: &str) -> Result<Vec<ScheduleEntry>, SyncError> {
        Ok(read_cache(self.store, &keys::unit_cache(unit), unit)?)
    }

    pub fn cached_master(&self) -> Result<Vec<ScheduleEntry>, SyncError> {
        Ok(read_cache(self.store, keys::MASTER_CACHE, "")?)
    }

    async fn refresh(
        &self,
        unit: &str,
        cache_key: &str,
        fallback_unit: &str,
    ) -> Result<SyncOutcome, SyncError> {
        let response = self.gateway.fetch(unit).await.map_err(|err| {
            warn!(unit, error = %err, "sync failed; keeping cached data");
            err
        })?;

        if !response.is_ok() {
            warn!(unit, status = %response.status, "sheets answered without data");
            return Ok(SyncOutcome::NoData {
                status: response.status,
            });
        }

        let entries = normalize_list(&response.dados, fallback_unit);
        self.store.save_json(cache_key, &entries)?;
        info!(unit, count = entries.len(), "cache refreshed");

        let units = distinct_units(&entries);
        Ok(SyncOutcome::Updated { entries, units })
    }
}

/// Cached entries under `key`, renormalized; missing or corrupt caches are
/// empty.
pub fn read_cache(
    store: &dyn LocalStore,
    key: &str,
    fallback_unit: &str,
) -> Result<Vec<ScheduleEntry>, StoreError> {
    let raw: Value = store.load_json(key, Value::Array(Vec::new()))?;
    Ok(normalize_list(&raw, fallback_unit))
}

/// Sorted, de-duplicated non-blank unit names.
pub fn distinct_units(entries: &[ScheduleEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| entry.unit.trim())
        .filter(|unit| !unit.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    struct CannedGateway {
        response: Result<SheetsResponse, u16>,
    }

    impl SheetsGateway for CannedGateway {
        async fn fetch(&self, _unit: &str) -> Result<SheetsResponse, SyncError> {
            self.response
                .clone()
                .map_err(|status| SyncError::Upstream { status })
        }

        async fn submit(&self, _entry: &ScheduleEntry) -> Result<(), SyncError> {
            Ok(())
        }
    }

    #[test]
    fn distinct_units_are_sorted_and_trimmed() {
        let entries: Vec<ScheduleEntry> = ["UBS B", " UBS A ", "", "UBS B"]
            .into_iter()
            .map(|unit| ScheduleEntry {
                unit: unit.to_string(),
                ..ScheduleEntry::default()
            })
            .collect();
        assert_eq!(distinct_units(&entries), vec!["UBS A", "UBS B"]);
    }

    #[tokio::test]
    async fn non_ok_status_leaves_cache_untouched() {
        let store = MemoryStore::new();
        store.set("cache_UBS A", r#"[{"cpf":"1"}]"#).expect("seed");
        let gateway = CannedGateway {
            response: Ok(SheetsResponse {
                status: "VAZIO".to_string(),
                dados: Value::Null,
            }),
        };

        let service = SyncService::new(&gateway, &store);
        let outcome = service.sync_unit("UBS A").await.expect("sync runs");
        assert_eq!(
            outcome,
            SyncOutcome::NoData {
                status: "VAZIO".to_string()
            }
        );
        assert_eq!(service.cached("UBS A").expect("cache").len(), 1);
    }

    #[tokio::test]
    async fn master_sync_uses_consolidated_key() {
        let store = MemoryStore::new();
        let gateway = CannedGateway {
            response: Ok(SheetsResponse::ok(json!([
                { "cpf": "1", "unidade": "UBS B" },
                { "cpf": "2", "unidade": "UBS A" }
            ]))),
        };

        let service = SyncService::new(&gateway, &store);
        let outcome = service.sync_all().await.expect("sync runs");
        match outcome {
            SyncOutcome::Updated { entries, units } => {
                assert_eq!(entries.len(), 2);
                assert_eq!(units, vec!["UBS A", "UBS B"]);
            }
            other => panic!("expected update, got {other:?}"),
        }
        assert_eq!(service.cached_master().expect("cache").len(), 2);
        assert!(store.get("cache_ALL").expect("get").is_none());
    }
}
