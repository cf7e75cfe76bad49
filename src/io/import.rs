use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;

use crate::io::records::{self, Record, COLUMN_ORDER_FIELD};
use crate::io::wire::TableSnapshot;
use crate::state::data_model::{self, ColumnId, Table};
use crate::state::table_state::TableState;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("JSON root is not an array")]
    NotAnArray,
    #[error("JSON array contains non-object elements")]
    NotArrayOfObjects,
}

pub fn parse_records(text: &str) -> Result<Vec<Record>, ImportError> {
    let value: Value = serde_json::from_str(text)?;
    records_from_value(value)
}

pub fn load_records(path: &Path) -> Result<Vec<Record>, ImportError> {
    let content = fs::read_to_string(path)?;
    parse_records(&content)
}

fn records_from_value(value: Value) -> Result<Vec<Record>, ImportError> {
    match value {
        Value::Array(arr) => {
            let mut rows = Vec::with_capacity(arr.len());
            for item in arr {
                match item {
                    Value::Object(map) => rows.push(map),
                    _ => return Err(ImportError::NotArrayOfObjects),
                }
            }
            Ok(rows)
        }
        _ => Err(ImportError::NotAnArray),
    }
}

/// Builds a table from flat records. Rows are named by position, columns
/// come from the first record's `ColumnOrder` (or its keys when absent), and
/// camelCase keys are matched to column labels.
pub fn import_records(records: &[Record]) -> Table {
    let mut table = Table::new();
    let Some(first) = records.first() else {
        return table;
    };

    let labels: Vec<String> = match first.get(COLUMN_ORDER_FIELD).and_then(Value::as_str) {
        Some(order) => order
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .collect(),
        None => first
            .keys()
            .filter(|key| *key != COLUMN_ORDER_FIELD)
            .map(|key| records::from_camel_case(key))
            .collect(),
    };
    let columns: Vec<(String, ColumnId)> = labels
        .iter()
        .map(|label| {
            let column = table.add_column(Some(label.as_str()));
            (records::normalize_name(label), column)
        })
        .collect();

    for (idx, record) in records.iter().enumerate() {
        let row = table.add_row(Some(idx.to_string().as_str()));
        for (key, value) in record {
            if key == COLUMN_ORDER_FIELD {
                continue;
            }
            let wanted = records::normalize_name(key);
            let Some((_, column)) = columns.iter().find(|(name, _)| *name == wanted) else {
                tracing::debug!(%key, "record field has no matching column");
                continue;
            };
            let text = data_model::display_value(value);
            if !text.is_empty() {
                table.set_cell(row, *column, text);
            }
        }
    }

    tracing::info!(
        rows = table.rows().len(),
        columns = table.columns().len(),
        "records imported"
    );
    table
}

/// Opens either a saved table snapshot (JSON object) or a record array.
pub fn load_table(path: &Path) -> Result<TableState, ImportError> {
    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    if value.is_object() {
        let snapshot: TableSnapshot = serde_json::from_value(value)?;
        return Ok(snapshot.into_state());
    }
    let records = records_from_value(value)?;
    Ok(TableState::from_table(import_records(&records)))
}
