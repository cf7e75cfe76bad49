use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::state::data_model::{CellKey, ColumnId, RowId, Table};
use crate::state::merge::MergeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub column: ColumnId,
    pub order: SortOrder,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnFilter {
    pub column: ColumnId,
    pub needle: String,
}

/// Presentation-only view settings. Nothing here ever touches cell data.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ViewSpec {
    pub sort: Option<SortSpec>,
    pub filters: Vec<ColumnFilter>,
    pub search: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectedCell {
    pub row: RowId,
    pub column: ColumnId,
    pub row_span: usize,
    pub col_span: usize,
    pub content: String,
    pub visible: bool,
    pub search_match: bool,
}

impl ProjectedCell {
    pub fn key(&self) -> CellKey {
        CellKey::new(self.row, self.column)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectedRow {
    pub row: RowId,
    pub label: String,
    pub cells: Vec<ProjectedCell>,
}

/// Rows that survive filters and search, in display order.
pub fn visible_rows(table: &Table, view: &ViewSpec) -> Vec<RowId> {
    let search = view.search.trim().to_lowercase();
    let mut rows: Vec<RowId> = table
        .rows()
        .iter()
        .copied()
        .filter(|row| row_passes_filters(table, *row, &view.filters))
        .filter(|row| search.is_empty() || row_matches_search(table, *row, &search))
        .collect();

    if let Some(spec) = view.sort.as_ref() {
        // Stable: equal values keep model order in both directions.
        rows.sort_by(|a, b| {
            let ordering = table.cell(*a, spec.column).cmp(table.cell(*b, spec.column));
            match spec.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }
    rows
}

pub fn project(table: &Table, merges: &MergeSet, view: &ViewSpec) -> Vec<ProjectedRow> {
    let rows = visible_rows(table, view);
    let positions: BTreeMap<RowId, usize> =
        rows.iter().enumerate().map(|(pos, row)| (*row, pos)).collect();

    let mut spans: BTreeMap<CellKey, (usize, usize)> = BTreeMap::new();
    let mut hidden: BTreeSet<CellKey> = BTreeSet::new();
    for region in merges.regions() {
        hidden.extend(region.covered().iter().copied());
        let row_span = shown_run(&rows, &positions, region.anchor().row, &region.rows());
        if row_span > 0 {
            spans.insert(region.anchor(), (row_span, region.col_span()));
        }
    }

    let search = view.search.trim().to_lowercase();
    rows.iter()
        .map(|row| ProjectedRow {
            row: *row,
            label: table.row_label(*row).unwrap_or_default().to_string(),
            cells: table
                .columns()
                .iter()
                .map(|column| {
                    let key = CellKey::new(*row, *column);
                    let content = table.cell(*row, *column).to_string();
                    let (row_span, col_span) = spans.get(&key).copied().unwrap_or((1, 1));
                    ProjectedCell {
                        row: *row,
                        column: *column,
                        row_span,
                        col_span,
                        search_match: !search.is_empty()
                            && content.to_lowercase().contains(&search),
                        content,
                        visible: !hidden.contains(&key),
                    }
                })
                .collect(),
        })
        .collect()
}

/// Number of displayed rows, starting at the anchor row, that belong to the
/// region without a gap. Zero when the anchor row itself is not shown.
fn shown_run(
    rows: &[RowId],
    positions: &BTreeMap<RowId, usize>,
    anchor_row: RowId,
    region_rows: &BTreeSet<RowId>,
) -> usize {
    let Some(start) = positions.get(&anchor_row).copied() else {
        return 0;
    };
    rows[start..]
        .iter()
        .take_while(|row| region_rows.contains(*row))
        .count()
}

fn row_passes_filters(table: &Table, row: RowId, filters: &[ColumnFilter]) -> bool {
    filters
        .iter()
        .filter(|filter| !filter.needle.is_empty())
        .all(|filter| table.cell(row, filter.column).contains(filter.needle.as_str()))
}

fn row_matches_search(table: &Table, row: RowId, needle: &str) -> bool {
    table
        .columns()
        .iter()
        .any(|column| table.cell(row, *column).to_lowercase().contains(needle))
}
