use std::collections::HashSet;
use std::sync::Mutex;

use agenda_sisreg::escalas::{DraftBook, DraftError, ScheduleEntry, WeekdaySet};
use agenda_sisreg::store::{FileStore, LocalStore};
use agenda_sisreg::sync::{SheetsGateway, SheetsResponse, SyncError};
use chrono::NaiveDate;

struct RecordingGateway {
    failing_cpfs: HashSet<String>,
    submitted: Mutex<Vec<String>>,
}

impl RecordingGateway {
    fn new(failing: &[&str]) -> Self {
        Self {
            failing_cpfs: failing.iter().map(|cpf| cpf.to_string()).collect(),
            submitted: Mutex::new(Vec::new()),
        }
    }

    fn submitted(&self) -> Vec<String> {
        self.submitted.lock().expect("submitted mutex").clone()
    }
}

impl SheetsGateway for RecordingGateway {
    async fn fetch(&self, _unit: &str) -> Result<SheetsResponse, SyncError> {
        Ok(SheetsResponse::default())
    }

    async fn submit(&self, entry: &ScheduleEntry) -> Result<(), SyncError> {
        self.submitted
            .lock()
            .expect("submitted mutex")
            .push(entry.professional_id.clone());
        if self.failing_cpfs.contains(&entry.professional_id) {
            Err(SyncError::Transport("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

fn draft(cpf: &str, name: &str) -> ScheduleEntry {
    ScheduleEntry {
        professional_id: cpf.to_string(),
        professional_name: name.to_string(),
        procedure_code: "0701".to_string(),
        procedure_name: "CONSULTA EM CARDIOLOGIA".to_string(),
        weekdays: WeekdaySet::parse("SEG QUA"),
        start_time: "07:00".to_string(),
        end_time: "12:00".to_string(),
        slots_per_day: 8,
        valid_from: NaiveDate::from_ymd_opt(2024, 3, 1),
        valid_to: NaiveDate::from_ymd_opt(2024, 3, 31),
        ..ScheduleEntry::default()
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, 20).expect("valid date")
}

#[tokio::test]
async fn successful_finalize_writes_csv_and_clears_drafts() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = FileStore::open(dir.path().join("state")).expect("store");
    let book = DraftBook::new(&store, "UBS VILA NOVA");
    book.add(draft("11111111111", "Ana")).expect("add");
    book.add(draft("22222222222", "Silva, Bia")).expect("add");

    let gateway = RecordingGateway::new(&[]);
    let report = book
        .finalize(&gateway, dir.path(), today())
        .await
        .expect("finalize runs");

    assert_eq!(report.submitted, 2);
    assert_eq!(report.failed, 0);
    assert!(report.cleared);
    assert_eq!(
        report.file.file_name().and_then(|name| name.to_str()),
        Some("Escalas_UBS_VILA_NOVA_20-02-2024.csv")
    );

    let csv = std::fs::read_to_string(&report.file).expect("csv written");
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("\"Silva, Bia\""));
    assert!(csv.lines().nth(1).expect("row").ends_with(",UBS VILA NOVA"));

    assert_eq!(gateway.submitted(), vec!["11111111111", "22222222222"]);
    assert!(book.list().expect("list").is_empty());
}

#[tokio::test]
async fn failed_submissions_keep_drafts() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = FileStore::open(dir.path().join("state")).expect("store");
    let book = DraftBook::new(&store, "UBS CENTRO");
    book.add(draft("11111111111", "Ana")).expect("add");
    book.add(draft("22222222222", "Bia")).expect("add");
    book.add(draft("33333333333", "Caio")).expect("add");

    let gateway = RecordingGateway::new(&["22222222222"]);
    let report = book
        .finalize(&gateway, dir.path(), today())
        .await
        .expect("finalize runs");

    assert_eq!(report.failed, 1);
    assert_eq!(report.submitted, 2);
    assert!(!report.cleared);
    assert!(report.message().contains("1 itens"));
    assert_eq!(gateway.submitted().len(), 3);
    assert_eq!(book.list().expect("list").len(), 3);
    assert!(report.file.exists());
}

#[tokio::test]
async fn empty_drafts_are_rejected_without_side_effects() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = FileStore::open(dir.path().join("state")).expect("store");
    let book = DraftBook::new(&store, "UBS CENTRO");
    let gateway = RecordingGateway::new(&[]);

    let result = book.finalize(&gateway, dir.path(), today()).await;
    assert!(matches!(result, Err(DraftError::Empty)));
    assert!(gateway.submitted().is_empty());
    assert_eq!(
        std::fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "csv"))
            .count(),
        0
    );
    assert!(store.get("escalas_salvas").expect("get").is_none());
}
