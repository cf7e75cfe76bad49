use std::io;
use std::path::Path;

use serde_json::{Map, Value};

use crate::io::atomic_write_string;
use crate::state::table_state::TableState;

/// Record field carrying the comma-separated column labels in display order.
pub const COLUMN_ORDER_FIELD: &str = "ColumnOrder";

pub type Record = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("record encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One flat record per row, in model order, with camelCase field names.
pub fn export_records(state: &TableState) -> Vec<Record> {
    let table = state.table();
    let labels: Vec<&str> = table
        .columns()
        .iter()
        .map(|column| table.column_label(*column).unwrap_or_default())
        .collect();
    let column_order = labels.join(",");

    table
        .rows()
        .iter()
        .map(|row| {
            let mut record = Record::new();
            for (column, label) in table.columns().iter().zip(&labels) {
                record.insert(
                    to_camel_case(label),
                    Value::String(table.cell(*row, *column).to_string()),
                );
            }
            record.insert(
                COLUMN_ORDER_FIELD.to_string(),
                Value::String(column_order.clone()),
            );
            record
        })
        .collect()
}

pub fn save_records(path: &Path, records: &[Record]) -> Result<(), RecordsError> {
    let array: Vec<Value> = records.iter().cloned().map(Value::Object).collect();
    let json = serde_json::to_string_pretty(&array)?;
    atomic_write_string(path, &json)?;
    tracing::info!(path = %path.display(), rows = records.len(), "records saved");
    Ok(())
}

/// `"Sum Insured Per Person"` becomes `"sumInsuredPerPerson"`.
pub fn to_camel_case(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for (idx, word) in label.split_whitespace().enumerate() {
        if idx == 0 {
            out.push_str(&word.to_lowercase());
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// `"sumInsuredPerPerson"` becomes `"Sum Insured Per Person"`.
pub fn from_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    for ch in key.chars() {
        if ch.is_whitespace() {
            if !out.ends_with(' ') && !out.is_empty() {
                out.push(' ');
            }
            prev = None;
            continue;
        }
        match prev {
            None => out.extend(ch.to_uppercase()),
            Some(p) if ch.is_uppercase() && (p.is_lowercase() || p.is_ascii_digit()) => {
                out.push(' ');
                out.push(ch);
            }
            Some(_) => out.push(ch),
        }
        prev = Some(ch);
    }
    out.trim_end().to_string()
}

/// Folds a column label or record key to a comparable form: alphanumerics
/// only, lowercased.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|ch| ch.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
