//! Parses loosely keyed schedule rows (spreadsheet exports, older caches,
//! hand-edited JSON) into typed [`ScheduleEntry`] values.

mod mapping;
mod normalizer;

use super::domain::{ScheduleEntry, WeekdaySet};
use super::format::format_hour;
use super::vagas::parse_schedule_date;
use mapping::{EntryField, FieldMatch};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Normalizes every object in `value`. Anything other than an array yields
/// an empty list and non-object items are skipped.
pub fn normalize_list(value: &Value, fallback_unit: &str) -> Vec<ScheduleEntry> {
    let Some(items) = value.as_array() else {
        debug!("schedule payload is not an array; treating as empty");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| normalize_entry(item, fallback_unit))
        .collect()
}

/// Maps one row onto the canonical fields, defaulting whatever is missing.
pub fn normalize_entry(value: &Value, fallback_unit: &str) -> Option<ScheduleEntry> {
    let object = value.as_object()?;
    let fields = collect_fields(object);
    let text = |field: EntryField| fields.get(&field).map(|(_, value)| value.as_str());

    let unit = text(EntryField::Unit)
        .map(str::trim)
        .filter(|unit| !unit.is_empty())
        .unwrap_or(fallback_unit)
        .to_string();

    Some(ScheduleEntry {
        professional_id: owned(text(EntryField::Cpf)),
        professional_name: owned(text(EntryField::Professional)),
        procedure_code: owned(text(EntryField::ProcedureCode)),
        procedure_name: owned(text(EntryField::Procedure)),
        exam_names: owned(text(EntryField::Exams)),
        weekdays: text(EntryField::Weekdays)
            .map(WeekdaySet::parse)
            .unwrap_or_default(),
        start_time: text(EntryField::StartTime)
            .map(format_hour)
            .unwrap_or_default(),
        end_time: text(EntryField::EndTime).map(format_hour).unwrap_or_default(),
        slots_per_day: text(EntryField::Slots).map(parse_slots).unwrap_or(0),
        valid_from: text(EntryField::ValidFrom).and_then(parse_schedule_date),
        valid_to: text(EntryField::ValidTo).and_then(parse_schedule_date),
        unit,
    })
}

fn collect_fields(object: &Map<String, Value>) -> HashMap<EntryField, (u8, String)> {
    let mut fields: HashMap<EntryField, (u8, String)> = HashMap::new();

    for (key, value) in object {
        let Some(FieldMatch { field, rank }) =
            mapping::field_for_normalized(&normalizer::normalize_key(key))
        else {
            continue;
        };
        let Some(text) = scalar_text(value) else {
            continue;
        };

        match fields.get(&field) {
            Some((existing_rank, _)) if *existing_rank <= rank => {}
            _ => {
                fields.insert(field, (rank, text));
            }
        }
    }

    fields
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn owned(value: Option<&str>) -> String {
    value.map(|text| text.trim().to_string()).unwrap_or_default()
}

/// Slots accept integers or numeric text; fractions truncate, negatives and
/// garbage become zero.
fn parse_slots(raw: &str) -> u32 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => {
            value.trunc().min(u32::MAX as f64) as u32
        }
        _ => 0,
    }
}
