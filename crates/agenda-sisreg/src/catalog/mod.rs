//! Static reference data: units, professionals and procedures.

mod parser;

use parser::{extract_category, field, json_records, parse_csv_records, RawRecord};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::escalas::format::clean_text;

const UNIT_SUGGESTIONS: usize = 15;
const PROFESSIONAL_SUGGESTIONS: usize = 10;
const PROCEDURE_SUGGESTIONS: usize = 30;
const MIN_TERM_CHARS: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitRecord {
    pub name: String,
    pub cnes: String,
    pub kind: String,
}

impl UnitRecord {
    pub fn is_master(&self) -> bool {
        self.kind.trim().eq_ignore_ascii_case("MASTER")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Professional {
    pub cpf: String,
    pub name: String,
    pub units: Vec<String>,
    pub status: String,
}

impl Professional {
    pub fn is_active(&self) -> bool {
        self.status == "ATIVO"
    }

    pub fn works_at(&self, unit: &str) -> bool {
        self.units.iter().any(|candidate| candidate == unit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Procedure {
    pub code: String,
    pub name: String,
    pub kind: String,
    pub regulated: bool,
    pub category: String,
}

impl Procedure {
    /// Only group procedures carry an exam list.
    pub fn accepts_exams(&self) -> bool {
        clean_text(&self.name).to_uppercase().starts_with("GRUPO")
    }

    pub fn label(&self) -> String {
        format!("{} - {}", self.code, clean_text(&self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total_units: usize,
    pub total_professionals: usize,
    pub total_procedures: usize,
    pub units_by_kind: BTreeMap<String, usize>,
    pub procedures_by_kind: BTreeMap<String, usize>,
    pub regulated: usize,
    pub not_regulated: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    units: Vec<UnitRecord>,
    professionals: Vec<Professional>,
    procedures: Vec<Procedure>,
}

/// Reference files looked up in the data directory; JSON wins over CSV.
const UNIT_FILES: (&str, &str) = ("unidades", "unidades");
const PROFESSIONAL_FILES: (&str, &str) = ("profissionais", "profissionais");
const PROCEDURE_FILES: (&str, &str) = ("procedimentos_exames", "procedimentos");

impl Catalog {
    /// Missing files yield empty lists; unreadable ones are errors.
    pub fn load_dir(dir: &Path) -> Result<Self, CatalogError> {
        let units = load_records(dir, UNIT_FILES)?;
        let professionals = load_records(dir, PROFESSIONAL_FILES)?;
        let procedures = load_records(dir, PROCEDURE_FILES)?;

        let catalog = Self::from_records(units, professionals, procedures);
        debug!(
            units = catalog.units.len(),
            professionals = catalog.professionals.len(),
            procedures = catalog.procedures.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn from_parts(
        mut units: Vec<UnitRecord>,
        professionals: Vec<Professional>,
        procedures: Vec<Procedure>,
    ) -> Self {
        units.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            units,
            professionals,
            procedures,
        }
    }

    fn from_records(
        units: Vec<RawRecord>,
        professionals: Vec<RawRecord>,
        procedures: Vec<RawRecord>,
    ) -> Self {
        let units = units.iter().map(unit_from_record).collect();
        let professionals = merge_professionals(&professionals);
        let procedures = procedures.iter().map(procedure_from_record).collect();
        Self::from_parts(units, professionals, procedures)
    }

    pub fn units(&self) -> &[UnitRecord] {
        &self.units
    }

    pub fn professionals(&self) -> &[Professional] {
        &self.professionals
    }

    pub fn procedures(&self) -> &[Procedure] {
        &self.procedures
    }

    pub fn unit(&self, name: &str) -> Option<&UnitRecord> {
        self.units.iter().find(|unit| unit.name == name)
    }

    pub fn professional(&self, unit: &str, cpf: &str) -> Option<&Professional> {
        let cpf = cpf.trim();
        self.professionals
            .iter()
            .find(|professional| professional.cpf == cpf && professional.works_at(unit))
    }

    pub fn procedure(&self, code: &str) -> Option<&Procedure> {
        let code = code.trim();
        self.procedures.iter().find(|procedure| procedure.code == code)
    }

    pub fn search_units(&self, term: &str) -> Vec<&UnitRecord> {
        let Some(term) = search_term(term) else {
            return Vec::new();
        };
        self.units
            .iter()
            .filter(|unit| unit.name.to_lowercase().contains(&term))
            .take(UNIT_SUGGESTIONS)
            .collect()
    }

    /// Active professionals of `unit` whose name contains `term`.
    pub fn search_professionals(&self, unit: &str, term: &str) -> Vec<&Professional> {
        let Some(term) = search_term(term) else {
            return Vec::new();
        };
        self.professionals
            .iter()
            .filter(|professional| professional.works_at(unit) && professional.is_active())
            .filter(|professional| professional.name.to_lowercase().contains(&term))
            .take(PROFESSIONAL_SUGGESTIONS)
            .collect()
    }

    pub fn search_procedures(&self, term: &str) -> Vec<&Procedure> {
        let Some(term) = search_term(term) else {
            return Vec::new();
        };
        self.procedures
            .iter()
            .filter(|procedure| clean_text(&procedure.name).to_lowercase().contains(&term))
            .take(PROCEDURE_SUGGESTIONS)
            .collect()
    }

    pub fn statistics(&self) -> CatalogStats {
        let regulated = self.procedures.iter().filter(|p| p.regulated).count();
        CatalogStats {
            total_units: self.units.len(),
            total_professionals: self.professionals.len(),
            total_procedures: self.procedures.len(),
            units_by_kind: count_by(self.units.iter().map(|unit| unit.kind.as_str())),
            procedures_by_kind: count_by(self.procedures.iter().map(|p| p.kind.as_str())),
            regulated,
            not_regulated: self.procedures.len() - regulated,
        }
    }
}

fn search_term(term: &str) -> Option<String> {
    let term = term.trim().to_lowercase();
    (term.chars().count() >= MIN_TERM_CHARS).then_some(term)
}

fn count_by<'a>(kinds: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for kind in kinds {
        let key = if kind.is_empty() { "Sem tipo" } else { kind };
        *counts.entry(key.to_string()).or_insert(0) += 1;
    }
    counts
}

fn unit_from_record(record: &RawRecord) -> UnitRecord {
    UnitRecord {
        name: field(record, &["NOME_FANTASIA", "nome"]).unwrap_or("").to_string(),
        cnes: field(record, &["CODIGO_CNES", "codigo"]).unwrap_or("").to_string(),
        kind: field(record, &["TIPO", "tipo"])
            .unwrap_or("EXECUTANTE")
            .to_string(),
    }
}

/// The same CPF may be listed once per unit; rows are folded into one
/// professional carrying every unit, keeping first-seen order.
fn merge_professionals(records: &[RawRecord]) -> Vec<Professional> {
    let mut merged: Vec<Professional> = Vec::new();
    let mut index_by_cpf: HashMap<String, usize> = HashMap::new();

    for record in records {
        let cpf = field(record, &["CPF", "cpf"]).unwrap_or("").to_string();
        let unit = field(record, &["UNIDADE", "unidade"]).unwrap_or("");

        let idx = *index_by_cpf.entry(cpf.clone()).or_insert_with(|| {
            merged.push(Professional {
                cpf: cpf.clone(),
                name: field(record, &["NOME", "nome"]).unwrap_or("").to_string(),
                units: Vec::new(),
                status: field(record, &["STATUS", "status"])
                    .unwrap_or("ATIVO")
                    .to_string(),
            });
            merged.len() - 1
        });

        let professional = &mut merged[idx];
        if !unit.is_empty() && !professional.works_at(unit) {
            professional.units.push(unit.to_string());
        }
    }

    merged
}

fn procedure_from_record(record: &RawRecord) -> Procedure {
    let name = field(record, &["PROCEDIMENTO", "procedimento"]).unwrap_or("");
    Procedure {
        code: field(record, &["cod_int", "cod int", "CODIGO", "codigo"])
            .unwrap_or("")
            .to_string(),
        name: name.to_string(),
        kind: field(record, &["TIPO", "tipo"]).unwrap_or("").trim().to_string(),
        regulated: field(record, &["REGULADO", "regulado"])
            .is_some_and(|value| value.eq_ignore_ascii_case("sim")),
        category: extract_category(name),
    }
}

fn load_records(dir: &Path, (stem, wrapper): (&str, &str)) -> Result<Vec<RawRecord>, CatalogError> {
    let json_path = dir.join(format!("{stem}.json"));
    if json_path.exists() {
        let text = fs::read_to_string(&json_path).map_err(|source| CatalogError::Io {
            path: json_path.clone(),
            source,
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|source| CatalogError::Json {
            path: json_path.clone(),
            source,
        })?;
        return Ok(json_records(&value, wrapper));
    }

    let csv_path = dir.join(format!("{stem}.csv"));
    if csv_path.exists() {
        let file = fs::File::open(&csv_path).map_err(|source| CatalogError::Io {
            path: csv_path.clone(),
            source,
        })?;
        return parse_csv_records(file).map_err(|source| CatalogError::Csv {
            path: csv_path.clone(),
            source,
        });
    }

    warn!(dir = %dir.display(), stem, "reference file not found; using empty list");
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn sample() -> Catalog {
        Catalog::from_records(
            vec![
                record(&[("NOME_FANTASIA", "UBS SUL"), ("CODIGO_CNES", "300")]),
                record(&[
                    ("NOME_FANTASIA", "CENTRAL DE REGULACAO"),
                    ("CODIGO_CNES", "100"),
                    ("TIPO", "MASTER"),
                ]),
            ],
            vec![
                record(&[("CPF", "111"), ("NOME", "Ana Lima"), ("UNIDADE", "UBS SUL")]),
                record(&[("CPF", "111"), ("NOME", "Ana Lima"), ("UNIDADE", "UBS NORTE")]),
                record(&[
                    ("CPF", "222"),
                    ("NOME", "Ana Paula"),
                    ("UNIDADE", "UBS SUL"),
                    ("STATUS", "INATIVO"),
                ]),
            ],
            vec![
                record(&[
                    ("cod int", "0701"),
                    ("procedimento", "\"GRUPO - CARDIOLOGIA\""),
                    ("TIPO", "CONSULTA"),
                    ("REGULADO", "Sim"),
                ]),
                record(&[("CODIGO", "0302"), ("PROCEDIMENTO", "ECG - REPOUSO")]),
            ],
        )
    }

    #[test]
    fn units_are_sorted_and_master_detected() {
        let catalog = sample();
        assert_eq!(catalog.units()[0].name, "CENTRAL DE REGULACAO");
        assert!(catalog.units()[0].is_master());
        assert_eq!(catalog.unit("UBS SUL").map(|u| u.kind.as_str()), Some("EXECUTANTE"));
    }

    #[test]
    fn professionals_merge_units_by_cpf() {
        let catalog = sample();
        assert_eq!(catalog.professionals().len(), 2);
        assert_eq!(catalog.professionals()[0].units, vec!["UBS SUL", "UBS NORTE"]);
        assert!(catalog.professional("UBS NORTE", "111").is_some());
        assert!(catalog.professional("UBS NORTE", "222").is_none());
    }

    #[test]
    fn searches_respect_minimum_term_and_status() {
        let catalog = sample();
        assert!(catalog.search_units("u").is_empty());
        assert_eq!(catalog.search_units("ubs").len(), 1);

        let found = catalog.search_professionals("UBS SUL", "ANA");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].cpf, "111");

        let procedures = catalog.search_procedures("cardio");
        assert_eq!(procedures.len(), 1);
        assert!(procedures[0].accepts_exams());
        assert_eq!(procedures[0].label(), "0701 - GRUPO - CARDIOLOGIA");
        assert!(!catalog.procedure("0302").expect("ecg").accepts_exams());
    }

    #[test]
    fn statistics_group_by_kind() {
        let stats = sample().statistics();
        assert_eq!(stats.total_units, 2);
        assert_eq!(stats.units_by_kind.get("MASTER"), Some(&1));
        assert_eq!(stats.procedures_by_kind.get("Sem tipo"), Some(&1));
        assert_eq!(stats.regulated, 1);
        assert_eq!(stats.not_regulated, 1);
    }

    #[test]
    fn load_dir_prefers_json_and_tolerates_missing_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            dir.path().join("unidades.csv"),
            "NOME_FANTASIA;CODIGO_CNES;TIPO\nUBS CSV;1;EXECUTANTE\n",
        )
        .expect("write csv");
        fs::write(
            dir.path().join("unidades.json"),
            r#"{"unidades":[{"NOME_FANTASIA":"UBS JSON","CODIGO_CNES":"2"}]}"#,
        )
        .expect("write json");

        let catalog = Catalog::load_dir(dir.path()).expect("catalog loads");
        assert_eq!(catalog.units().len(), 1);
        assert_eq!(catalog.units()[0].name, "UBS JSON");
        assert!(catalog.professionals().is_empty());
        assert!(catalog.procedures().is_empty());
    }
}
