use super::domain::ScheduleEntry;
use chrono::NaiveDate;
use std::io::Write;

pub const CSV_HEADERS: [&str; 12] = [
    "CPF",
    "Profissional",
    "Cod_Procedimento",
    "Procedimento",
    "Exames",
    "Dias",
    "Inicio",
    "Fim",
    "Vagas",
    "Vig_Inicio",
    "Vig_Fim",
    "Unidade",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush CSV output: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes the 12-column export. Fields containing commas, quotes or line
/// breaks are quoted. An empty list writes nothing, not even the header.
pub fn write_csv<W: Write>(
    writer: W,
    entries: &[ScheduleEntry],
    fallback_unit: &str,
) -> Result<(), ExportError> {
    if entries.is_empty() {
        return Ok(());
    }

    let mut csv_writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);
    csv_writer.write_record(CSV_HEADERS)?;

    for entry in entries {
        let unit = if entry.unit.trim().is_empty() {
            fallback_unit
        } else {
            entry.unit.as_str()
        };
        csv_writer.write_record([
            entry.professional_id.as_str(),
            entry.professional_name.as_str(),
            entry.procedure_code.as_str(),
            entry.procedure_name.as_str(),
            entry.exam_names.as_str(),
            &entry.weekdays.to_string(),
            entry.start_time.as_str(),
            entry.end_time.as_str(),
            &entry.slots_per_day.to_string(),
            &iso_or_empty(entry.valid_from),
            &iso_or_empty(entry.valid_to),
            unit,
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn export_csv(entries: &[ScheduleEntry], fallback_unit: &str) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, entries, fallback_unit)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// `Escalas_<unit>_<DD-MM-YYYY>.csv` with whitespace runs in the unit
/// replaced by underscores.
pub fn export_file_name(unit: &str, today: NaiveDate) -> String {
    let unit = unit.split_whitespace().collect::<Vec<_>>().join("_");
    format!("Escalas_{}_{}.csv", unit, today.format("%d-%m-%Y"))
}

fn iso_or_empty(date: Option<NaiveDate>) -> String {
    date.map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
