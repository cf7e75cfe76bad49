use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnId(u64);

/// Addresses one cell. Ordering is by row id, then column id, which is not
/// display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub row: RowId,
    pub column: ColumnId,
}

impl CellKey {
    pub fn new(row: RowId, column: ColumnId) -> Self {
        Self { row, column }
    }
}

/// Canonical table contents. Rows and columns carry stable ids; labels are
/// display data only, so renaming never touches the cell map.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Table {
    rows: Vec<RowId>,
    columns: Vec<ColumnId>,
    row_labels: BTreeMap<RowId, String>,
    column_labels: BTreeMap<ColumnId, String>,
    cells: BTreeMap<CellKey, String>,
    next_id: u64,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[RowId] {
        &self.rows
    }

    pub fn columns(&self) -> &[ColumnId] {
        &self.columns
    }

    pub fn cells(&self) -> &BTreeMap<CellKey, String> {
        &self.cells
    }

    pub fn row_label(&self, row: RowId) -> Option<&str> {
        self.row_labels.get(&row).map(String::as_str)
    }

    pub fn column_label(&self, column: ColumnId) -> Option<&str> {
        self.column_labels.get(&column).map(String::as_str)
    }

    pub fn row_by_label(&self, label: &str) -> Option<RowId> {
        self.rows
            .iter()
            .copied()
            .find(|row| self.row_label(*row) == Some(label))
    }

    pub fn column_by_label(&self, label: &str) -> Option<ColumnId> {
        self.columns
            .iter()
            .copied()
            .find(|column| self.column_label(*column) == Some(label))
    }

    pub fn row_index(&self, row: RowId) -> Option<usize> {
        self.rows.iter().position(|r| *r == row)
    }

    pub fn column_index(&self, column: ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    pub fn has_row(&self, row: RowId) -> bool {
        self.row_labels.contains_key(&row)
    }

    pub fn has_column(&self, column: ColumnId) -> bool {
        self.column_labels.contains_key(&column)
    }

    pub fn contains(&self, key: CellKey) -> bool {
        self.has_row(key.row) && self.has_column(key.column)
    }

    /// Appends a row. Without a label the first free `Row {n}` is used.
    pub fn add_row(&mut self, label: Option<&str>) -> RowId {
        let label = match label.map(str::trim).filter(|l| !l.is_empty()) {
            Some(label) => unique_label(label, self.row_labels.values()),
            None => default_label("Row", self.rows.len() + 1, self.row_labels.values()),
        };
        let id = RowId(self.allocate_id());
        self.rows.push(id);
        self.row_labels.insert(id, label);
        tracing::debug!(?id, "row added");
        id
    }

    /// Appends a column. Without a label the first free `Column {n}` is used.
    pub fn add_column(&mut self, label: Option<&str>) -> ColumnId {
        let label = match label.map(str::trim).filter(|l| !l.is_empty()) {
            Some(label) => unique_label(label, self.column_labels.values()),
            None => default_label(
                "Column",
                self.columns.len() + 1,
                self.column_labels.values(),
            ),
        };
        let id = ColumnId(self.allocate_id());
        self.columns.push(id);
        self.column_labels.insert(id, label);
        tracing::debug!(?id, "column added");
        id
    }

    pub fn rename_row(&mut self, row: RowId, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || !self.has_row(row) {
            return false;
        }
        if self
            .row_labels
            .iter()
            .any(|(id, existing)| *id != row && existing == label)
        {
            return false;
        }
        self.row_labels.insert(row, label.to_string());
        true
    }

    pub fn rename_column(&mut self, column: ColumnId, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || !self.has_column(column) {
            return false;
        }
        if self
            .column_labels
            .iter()
            .any(|(id, existing)| *id != column && existing == label)
        {
            return false;
        }
        self.column_labels.insert(column, label.to_string());
        true
    }

    pub fn remove_row(&mut self, row: RowId) -> bool {
        let Some(index) = self.row_index(row) else {
            return false;
        };
        self.rows.remove(index);
        self.row_labels.remove(&row);
        self.cells.retain(|key, _| key.row != row);
        tracing::debug!(?row, "row removed");
        true
    }

    pub fn remove_column(&mut self, column: ColumnId) -> bool {
        let Some(index) = self.column_index(column) else {
            return false;
        };
        self.columns.remove(index);
        self.column_labels.remove(&column);
        self.cells.retain(|key, _| key.column != column);
        tracing::debug!(?column, "column removed");
        true
    }

    /// Writes free text into a cell. Unknown rows or columns are ignored so
    /// no orphaned entry can be created.
    pub fn set_cell(&mut self, row: RowId, column: ColumnId, value: impl Into<String>) -> bool {
        if !self.has_row(row) || !self.has_column(column) {
            return false;
        }
        self.cells.insert(CellKey::new(row, column), value.into());
        true
    }

    pub fn cell(&self, row: RowId, column: ColumnId) -> &str {
        self.cells
            .get(&CellKey::new(row, column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub(crate) fn take_cell(&mut self, key: CellKey) -> Option<String> {
        self.cells.remove(&key)
    }

    pub fn move_row(&mut self, from: usize, to: usize) -> bool {
        move_within(&mut self.rows, from, to)
    }

    pub fn move_column(&mut self, from: usize, to: usize) -> bool {
        move_within(&mut self.columns, from, to)
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn move_within<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() || from == to {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

fn default_label<'a>(
    prefix: &str,
    mut n: usize,
    taken: impl Iterator<Item = &'a String> + Clone,
) -> String {
    loop {
        let candidate = format!("{prefix} {n}");
        if !taken.clone().any(|existing| *existing == candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn unique_label<'a>(label: &str, taken: impl Iterator<Item = &'a String> + Clone) -> String {
    if !taken.clone().any(|existing| existing == label) {
        return label.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{label} ({n})");
        if !taken.clone().any(|existing| *existing == candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Formats a JSON value for display in a table cell.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
