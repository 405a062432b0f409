use std::sync::Mutex;

use agenda_sisreg::escalas::ScheduleEntry;
use agenda_sisreg::store::{keys, LocalStore, MemoryStore};
use agenda_sisreg::sync::{SheetsGateway, SheetsResponse, SyncError, SyncOutcome, SyncService};
use serde_json::json;

/// Serves queued responses in order.
struct ScriptedGateway {
    responses: Mutex<Vec<Result<SheetsResponse, SyncError>>>,
    requested_units: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    fn new(mut responses: Vec<Result<SheetsResponse, SyncError>>) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            requested_units: Mutex::new(Vec::new()),
        }
    }
}

impl SheetsGateway for ScriptedGateway {
    async fn fetch(&self, unit: &str) -> Result<SheetsResponse, SyncError> {
        self.requested_units
            .lock()
            .expect("units mutex")
            .push(unit.to_string());
        self.responses
            .lock()
            .expect("responses mutex")
            .pop()
            .unwrap_or_else(|| Err(SyncError::Transport("no scripted response".to_string())))
    }

    async fn submit(&self, _entry: &ScheduleEntry) -> Result<(), SyncError> {
        Ok(())
    }
}

#[tokio::test]
async fn unit_sync_replaces_cache_then_survives_failures() {
    let store = MemoryStore::new();
    let gateway = ScriptedGateway::new(vec![
        Ok(SheetsResponse::ok(json!([
            {
                "CPF": "12345678901", "Profissional": "Ana",
                "Dias da Semana": "SEG", "VAGAS": "3",
                "vigencia_inicio": "2024-01-01", "vigencia_fim": "2024-01-31"
            },
            "linha inválida"
        ]))),
        Err(SyncError::Transport("timeout".to_string())),
    ]);
    let service = SyncService::new(&gateway, &store);

    let outcome = service.sync_unit("UBS SUL").await.expect("first sync");
    let entries = outcome.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].unit, "UBS SUL");
    assert_eq!(entries[0].total_slots(), 15);
    match &outcome {
        SyncOutcome::Updated { units, .. } => assert_eq!(units, &vec!["UBS SUL".to_string()]),
        other => panic!("expected update, got {other:?}"),
    }

    let cached_before = store
        .get(&keys::unit_cache("UBS SUL"))
        .expect("get")
        .expect("cache written");

    let failure = service.sync_unit("UBS SUL").await;
    assert!(matches!(failure, Err(SyncError::Transport(_))));
    assert_eq!(
        store.get(&keys::unit_cache("UBS SUL")).expect("get"),
        Some(cached_before)
    );
    assert_eq!(service.cached("UBS SUL").expect("cached").len(), 1);

    assert_eq!(
        *gateway.requested_units.lock().expect("units mutex"),
        vec!["UBS SUL", "UBS SUL"]
    );
}

#[tokio::test]
async fn master_sync_requests_all_units() {
    let store = MemoryStore::new();
    let gateway = ScriptedGateway::new(vec![Ok(SheetsResponse::ok(json!([
        { "cpf": "1", "unidade": "UBS SUL", "vagas": 2 },
        { "cpf": "2", "unidade": "POLICLINICA", "vagas": 4 },
        { "cpf": "3", "unidade": "UBS SUL", "vagas": 1 }
    ])))]);
    let service = SyncService::new(&gateway, &store);

    let outcome = service.sync_all().await.expect("master sync");
    match outcome {
        SyncOutcome::Updated { entries, units } => {
            assert_eq!(entries.len(), 3);
            assert_eq!(units, vec!["POLICLINICA", "UBS SUL"]);
        }
        other => panic!("expected update, got {other:?}"),
    }
    assert_eq!(
        *gateway.requested_units.lock().expect("units mutex"),
        vec!["ALL"]
    );
    assert!(store.get(keys::MASTER_CACHE).expect("get").is_some());
}
