use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::io;

use serde::{Deserialize, Serialize};

use crate::state::data_model::{CellKey, ColumnId, RowId, Table};
use crate::state::merge::MergeSet;
use crate::state::projection::SortOrder;
use crate::state::table_state::{SortOutcome, SortRejection, TableState};

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("table data parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Plain-object form of a table handed to the save and preview
/// collaborators. Cells are keyed `"{row}-{column}"` by label.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<String>,
    #[serde(default)]
    pub cells: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged_cells_data: Vec<MergedCellRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sorting_state: Vec<SortingEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_full_screen: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedCellRecord {
    pub start_row: String,
    pub start_col: String,
    pub row_span: usize,
    pub col_span: usize,
    #[serde(default)]
    pub covered_cells: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortingEntry {
    pub id: String,
    pub desc: bool,
}

pub fn cell_key(row_label: &str, column_label: &str) -> String {
    format!("{row_label}-{column_label}")
}

impl TableSnapshot {
    pub fn from_state(state: &TableState) -> Self {
        let table = state.table();
        let label_key = |key: &CellKey| {
            cell_key(
                table.row_label(key.row).unwrap_or_default(),
                table.column_label(key.column).unwrap_or_default(),
            )
        };

        let merged_cells_data = state
            .merges()
            .regions()
            .map(|region| MergedCellRecord {
                start_row: table
                    .row_label(region.anchor().row)
                    .unwrap_or_default()
                    .to_string(),
                start_col: table
                    .column_label(region.anchor().column)
                    .unwrap_or_default()
                    .to_string(),
                row_span: region.row_span(),
                col_span: region.col_span(),
                covered_cells: region.covered().iter().map(label_key).collect(),
            })
            .collect();

        // Distinct label pairs can join to the same key ("a-b" + "c" and
        // "a" + "b-c"); the first cell in key order wins.
        let mut cells = BTreeMap::new();
        for (key, value) in table.cells() {
            match cells.entry(label_key(key)) {
                Entry::Vacant(slot) => {
                    slot.insert(value.clone());
                }
                Entry::Occupied(slot) => {
                    tracing::warn!(key = %slot.key(), "cell key collision, value dropped");
                }
            }
        }

        let sorting_state = state
            .sort_spec()
            .and_then(|spec| {
                table.column_label(spec.column).map(|label| SortingEntry {
                    id: label.to_string(),
                    desc: spec.order == SortOrder::Desc,
                })
            })
            .into_iter()
            .collect();

        Self {
            columns: table
                .columns()
                .iter()
                .map(|column| table.column_label(*column).unwrap_or_default().to_string())
                .collect(),
            rows: table
                .rows()
                .iter()
                .map(|row| table.row_label(*row).unwrap_or_default().to_string())
                .collect(),
            cells,
            merged_cells_data,
            sorting_state,
            is_full_screen: state.is_full_screen().then_some(true),
        }
    }

    /// Rebuilds a session. Cells are found by looking every row/column label
    /// pair up, never by splitting keys, since labels may contain `-`.
    /// Merge and sort entries that no longer fit the table are skipped.
    pub fn into_state(self) -> TableState {
        let mut table = Table::new();
        let column_ids: Vec<ColumnId> = self
            .columns
            .iter()
            .map(|label| table.add_column(Some(label.as_str())))
            .collect();
        let row_ids: Vec<RowId> = self
            .rows
            .iter()
            .map(|label| table.add_row(Some(label.as_str())))
            .collect();

        for (row_label, row) in self.rows.iter().zip(&row_ids) {
            for (column_label, column) in self.columns.iter().zip(&column_ids) {
                if let Some(value) = self.cells.get(&cell_key(row_label, column_label)) {
                    table.set_cell(*row, *column, value.clone());
                }
            }
        }

        let mut merges = MergeSet::new();
        for record in &self.merged_cells_data {
            let row = self
                .rows
                .iter()
                .position(|label| *label == record.start_row)
                .map(|idx| row_ids[idx]);
            let column = self
                .columns
                .iter()
                .position(|label| *label == record.start_col)
                .map(|idx| column_ids[idx]);
            let (Some(row), Some(column)) = (row, column) else {
                tracing::warn!(
                    start_row = %record.start_row,
                    start_col = %record.start_col,
                    "merge record references an unknown row or column"
                );
                continue;
            };
            let outcome = merges.adopt(
                &mut table,
                CellKey::new(row, column),
                record.row_span,
                record.col_span,
            );
            if !outcome.is_applied() {
                tracing::warn!(?outcome, start_row = %record.start_row, "merge record skipped");
            }
        }

        let mut state = TableState::from_parts(table, merges);
        if let Some(entry) = self.sorting_state.first() {
            let order = if entry.desc {
                SortOrder::Desc
            } else {
                SortOrder::Asc
            };
            let outcome = match self
                .columns
                .iter()
                .position(|label| *label == entry.id)
            {
                Some(idx) => state.set_sort(column_ids[idx], order),
                None => SortOutcome::Rejected(SortRejection::UnknownColumn),
            };
            if matches!(outcome, SortOutcome::Rejected(_)) {
                tracing::warn!(column = %entry.id, ?outcome, "sorting state skipped");
            }
        }
        state.set_full_screen(self.is_full_screen.unwrap_or(false));
        state
    }
}

pub fn encode(state: &TableState) -> Result<String, WireError> {
    Ok(serde_json::to_string_pretty(&TableSnapshot::from_state(state))?)
}

pub fn decode(text: &str) -> Result<TableState, WireError> {
    let snapshot: TableSnapshot = serde_json::from_str(text)?;
    Ok(snapshot.into_state())
}
