//! Locally entered schedules waiting to be exported and submitted.

use super::domain::ScheduleEntry;
use super::export::{export_csv, export_file_name, ExportError};
use super::format::is_valid_cpf;
use super::ingest::normalize_list;
use crate::store::{keys, JsonStoreExt, LocalStore, StoreError};
use crate::sync::SheetsGateway;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("no locally entered schedules to export")]
    Empty,
    #[error("{0}")]
    Invalid(String),
    #[error("draft index {index} out of range (have {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("failed to write export file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of exporting the drafts and pushing them to the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalizeReport {
    pub file: PathBuf,
    pub submitted: usize,
    pub failed: usize,
    pub cleared: bool,
}

impl FinalizeReport {
    pub fn message(&self) -> String {
        if self.failed == 0 {
            "✅ CSV baixado e todos os dados enviados ao Sheets!".to_string()
        } else {
            format!(
                "⚠️ CSV baixado, mas houve erro no envio de {} itens para o Sheets. Verifique sua conexão.",
                self.failed
            )
        }
    }
}

/// Draft list stored under [`keys::DRAFTS`].
pub struct DraftBook<'a> {
    store: &'a dyn LocalStore,
    fallback_unit: String,
}

impl<'a> DraftBook<'a> {
    pub fn new(store: &'a dyn LocalStore, fallback_unit: impl Into<String>) -> Self {
        Self {
            store,
            fallback_unit: fallback_unit.into(),
        }
    }

    pub fn list(&self) -> Result<Vec<ScheduleEntry>, DraftError> {
        let raw: Value = self.store.load_json(keys::DRAFTS, Value::Array(Vec::new()))?;
        Ok(normalize_list(&raw, &self.fallback_unit))
    }

    /// Appends one entry, filling a blank unit with the active one.
    pub fn add(&self, mut entry: ScheduleEntry) -> Result<usize, DraftError> {
        validate(&entry)?;
        if entry.unit.trim().is_empty() {
            entry.unit = self.fallback_unit.clone();
        }
        let mut drafts = self.list()?;
        drafts.push(entry);
        self.store.save_json(keys::DRAFTS, &drafts)?;
        Ok(drafts.len())
    }

    pub fn remove(&self, index: usize) -> Result<ScheduleEntry, DraftError> {
        let mut drafts = self.list()?;
        if index >= drafts.len() {
            return Err(DraftError::IndexOutOfRange {
                index,
                len: drafts.len(),
            });
        }
        let removed = drafts.remove(index);
        self.store.save_json(keys::DRAFTS, &drafts)?;
        Ok(removed)
    }

    pub fn clear(&self) -> Result<(), DraftError> {
        self.store.save_json(keys::DRAFTS, &Vec::<ScheduleEntry>::new())?;
        Ok(())
    }

    pub fn export(&self) -> Result<String, DraftError> {
        Ok(export_csv(&self.list()?, &self.fallback_unit)?)
    }

    /// Writes the CSV into `dir`, then submits every draft one after the
    /// other. Drafts are cleared only when every submission succeeded.
    pub async fn finalize<G: SheetsGateway>(
        &self,
        gateway: &G,
        dir: &Path,
        today: NaiveDate,
    ) -> Result<FinalizeReport, DraftError> {
        let drafts = self.list()?;
        if drafts.is_empty() {
            return Err(DraftError::Empty);
        }

        let csv = export_csv(&drafts, &self.fallback_unit)?;
        let file = dir.join(export_file_name(&self.fallback_unit, today));
        fs::write(&file, csv).map_err(|source| DraftError::Write {
            path: file.clone(),
            source,
        })?;
        info!(file = %file.display(), count = drafts.len(), "drafts exported");

        let mut failed = 0;
        for entry in &drafts {
            if let Err(err) = gateway.submit(entry).await {
                warn!(cpf = %entry.professional_id, error = %err, "submission failed");
                failed += 1;
            }
        }

        let cleared = failed == 0;
        if cleared {
            self.clear()?;
        }

        Ok(FinalizeReport {
            file,
            submitted: drafts.len() - failed,
            failed,
            cleared,
        })
    }
}

/// Form-level checks applied before an entry is stored.
pub fn validate(entry: &ScheduleEntry) -> Result<(), DraftError> {
    if !is_valid_cpf(&entry.professional_id) {
        return Err(DraftError::Invalid(format!(
            "CPF inválido: '{}'",
            entry.professional_id
        )));
    }
    if entry.weekdays.is_empty() {
        return Err(DraftError::Invalid(
            "Selecione ao menos um dia da semana.".to_string(),
        ));
    }
    if let (Some(start), Some(end)) = (entry.valid_from, entry.valid_to) {
        if start > end {
            return Err(DraftError::Invalid(
                "A vigência inicial deve ser anterior à final.".to_string(),
            ));
        }
    }
    if !entry.exam_names.trim().is_empty()
        && !entry.procedure_name.trim().to_uppercase().starts_with("GRUPO")
    {
        return Err(DraftError::Invalid(
            "Exames só podem ser informados para procedimentos de GRUPO.".to_string(),
        ));
    }
    Ok(())
}
