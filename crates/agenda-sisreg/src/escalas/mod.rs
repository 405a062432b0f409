pub mod domain;
pub mod drafts;
pub mod export;
pub mod format;
pub mod ingest;
pub mod vagas;

pub use domain::{ScheduleEntry, Weekday, WeekdaySet};
pub use drafts::{DraftBook, DraftError, FinalizeReport};
pub use export::{export_csv, export_file_name, ExportError, CSV_HEADERS};
pub use format::ProcedureKind;
pub use vagas::{calculate_total_slots, parse_schedule_date};
