use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;

/// One reference-data row keyed by its original column name.
pub(crate) type RawRecord = HashMap<String, String>;

/// Reads a `;`-delimited export. Header names lose their quotes; values lose
/// surrounding quotes and the `[ ]` wrapping some exports put around types.
pub(crate) fn parse_csv_records<R: Read>(reader: R) -> Result<Vec<RawRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|header| header.replace(['"', '\''], "").trim().to_string())
        .collect();

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        if row.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        let record = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| (header.clone(), clean_value(row.get(idx).unwrap_or(""))))
            .collect();
        records.push(record);
    }

    Ok(records)
}

/// Accepts a bare array or an object wrapping the array under `wrapper`.
pub(crate) fn json_records(value: &Value, wrapper: &str) -> Vec<RawRecord> {
    let items = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get(wrapper) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .map(|object| {
            object
                .iter()
                .filter_map(|(key, value)| {
                    let text = match value {
                        Value::String(text) => clean_value(text),
                        Value::Number(number) => number.to_string(),
                        Value::Bool(flag) => flag.to_string(),
                        _ => return None,
                    };
                    Some((key.clone(), text))
                })
                .collect()
        })
        .collect()
}

pub(crate) fn clean_value(raw: &str) -> String {
    let unquoted = raw.trim().trim_matches('"').trim();
    let unbracketed = unquoted.strip_prefix('[').unwrap_or(unquoted);
    let unbracketed = unbracketed.strip_suffix(']').unwrap_or(unbracketed);
    unbracketed.trim().to_string()
}

/// First non-empty value among `keys`.
pub(crate) fn field<'r>(record: &'r RawRecord, keys: &[&str]) -> Option<&'r str> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .map(String::as_str)
        .find(|value| !value.is_empty())
}

/// Category of a procedure name: the text after `GRUPO -` up to a `(` or
/// `-`, else the text before the first `-` without `GRUPO`, else `OUTROS`.
pub(crate) fn extract_category(name: &str) -> String {
    let name = name.trim().trim_matches('"').trim();

    if let Some(category) = grouped_category(name) {
        return category;
    }

    match name.split_once('-') {
        Some((head, _)) => head.replacen("GRUPO", "", 1).trim().to_string(),
        None => "OUTROS".to_string(),
    }
}

fn grouped_category(name: &str) -> Option<String> {
    let upper = name.to_ascii_uppercase();
    let mut search_from = 0;

    while let Some(offset) = upper[search_from..].find("GRUPO") {
        let after_marker = search_from + offset + "GRUPO".len();
        search_from = after_marker;

        let rest = name[after_marker..].trim_start();
        let Some(rest) = rest.strip_prefix('-') else {
            continue;
        };
        let body = rest.trim_start();
        let end = body.find(['(', '-']).unwrap_or(body.len());
        if end == 0 {
            continue;
        }
        return Some(body[..end].trim().to_string());
    }

    None
}
