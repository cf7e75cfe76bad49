use std::collections::{BTreeMap, BTreeSet};

use crate::state::data_model::{CellKey, ColumnId, RowId, Table};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeRejection {
    TooFewCells,
    UnknownCell,
    NotRectangle,
    OverlapsRegion,
    SelectionSize,
    NotAnAnchor,
    /// Rows are shown in sorted order, so the selection on screen is not the
    /// rectangle the merge would join.
    SortedView,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    Applied,
    Rejected(MergeRejection),
}

impl MergeOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// A rectangle of cells collapsed into its top-left anchor.
///
/// `original` keeps every non-empty value the rectangle held when it was
/// merged, so dissolving the region puts the text back where it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeRegion {
    anchor: CellKey,
    row_span: usize,
    col_span: usize,
    covered: BTreeSet<CellKey>,
    original: BTreeMap<CellKey, String>,
    joined: String,
}

impl MergeRegion {
    pub fn anchor(&self) -> CellKey {
        self.anchor
    }

    pub fn row_span(&self) -> usize {
        self.row_span
    }

    pub fn col_span(&self) -> usize {
        self.col_span
    }

    pub fn covered(&self) -> &BTreeSet<CellKey> {
        &self.covered
    }

    pub fn original(&self) -> &BTreeMap<CellKey, String> {
        &self.original
    }

    pub fn contains(&self, key: CellKey) -> bool {
        self.anchor == key || self.covered.contains(&key)
    }

    pub fn rows(&self) -> BTreeSet<RowId> {
        std::iter::once(self.anchor.row)
            .chain(self.covered.iter().map(|key| key.row))
            .collect()
    }

    pub fn columns(&self) -> BTreeSet<ColumnId> {
        std::iter::once(self.anchor.column)
            .chain(self.covered.iter().map(|key| key.column))
            .collect()
    }

    /// True while the region's rows and columns still form a contiguous block
    /// in the table's current order with the anchor at its top-left corner.
    fn is_contiguous(&self, table: &Table) -> bool {
        if self.covered.iter().any(|key| !table.contains(*key)) || !table.contains(self.anchor) {
            return false;
        }
        let row_indices: Option<Vec<usize>> =
            self.rows().into_iter().map(|row| table.row_index(row)).collect();
        let column_indices: Option<Vec<usize>> = self
            .columns()
            .into_iter()
            .map(|column| table.column_index(column))
            .collect();
        let (Some(rows), Some(columns)) = (row_indices, column_indices) else {
            return false;
        };
        let (Some(anchor_row), Some(anchor_column)) = (
            table.row_index(self.anchor.row),
            table.column_index(self.anchor.column),
        ) else {
            return false;
        };

        spans_block(&rows, anchor_row, self.row_span)
            && spans_block(&columns, anchor_column, self.col_span)
    }
}

fn spans_block(indices: &[usize], start: usize, span: usize) -> bool {
    indices.len() == span
        && indices.iter().min() == Some(&start)
        && indices.iter().max() == Some(&(start + span - 1))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Rect {
    top: usize,
    left: usize,
    bottom: usize,
    right: usize,
}

impl Rect {
    fn height(&self) -> usize {
        self.bottom - self.top + 1
    }

    fn width(&self) -> usize {
        self.right - self.left + 1
    }

    /// Keys in row-major order: every column of the top row first.
    fn keys(&self, table: &Table) -> Vec<CellKey> {
        let mut keys = Vec::with_capacity(self.height() * self.width());
        for row in &table.rows()[self.top..=self.bottom] {
            for column in &table.columns()[self.left..=self.right] {
                keys.push(CellKey::new(*row, *column));
            }
        }
        keys
    }
}

fn selection_rect(table: &Table, selection: &BTreeSet<CellKey>) -> Result<Rect, MergeRejection> {
    if selection.len() < 2 {
        return Err(MergeRejection::TooFewCells);
    }

    let mut rect: Option<Rect> = None;
    for key in selection {
        let (Some(row), Some(column)) = (table.row_index(key.row), table.column_index(key.column))
        else {
            return Err(MergeRejection::UnknownCell);
        };
        rect = Some(match rect {
            None => Rect {
                top: row,
                left: column,
                bottom: row,
                right: column,
            },
            Some(r) => Rect {
                top: r.top.min(row),
                left: r.left.min(column),
                bottom: r.bottom.max(row),
                right: r.right.max(column),
            },
        });
    }

    let rect = rect.ok_or(MergeRejection::TooFewCells)?;
    // Keys are distinct and every position lies inside the bounding box, so
    // equal area means the selection fills it.
    if rect.height() * rect.width() != selection.len() {
        return Err(MergeRejection::NotRectangle);
    }
    Ok(rect)
}

/// True when the selection is at least two cells forming a full rectangle in
/// the current row and column order.
pub fn can_merge(table: &Table, selection: &BTreeSet<CellKey>) -> bool {
    selection_rect(table, selection).is_ok()
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct MergeSet {
    regions: BTreeMap<CellKey, MergeRegion>,
}

impl MergeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn regions(&self) -> impl Iterator<Item = &MergeRegion> {
        self.regions.values()
    }

    pub fn get(&self, anchor: CellKey) -> Option<&MergeRegion> {
        self.regions.get(&anchor)
    }

    pub fn region_containing(&self, key: CellKey) -> Option<&MergeRegion> {
        self.regions.values().find(|region| region.contains(key))
    }

    pub fn is_covered(&self, key: CellKey) -> bool {
        self.regions
            .values()
            .any(|region| region.covered.contains(&key))
    }

    /// Columns touched by a region cannot be sorted without tearing it apart.
    pub fn blocks_sort(&self, column: ColumnId) -> bool {
        self.regions
            .values()
            .any(|region| region.columns().contains(&column))
    }

    pub fn merge(&mut self, table: &mut Table, selection: &BTreeSet<CellKey>) -> MergeOutcome {
        let rect = match selection_rect(table, selection) {
            Ok(rect) => rect,
            Err(reason) => return MergeOutcome::Rejected(reason),
        };
        let keys = rect.keys(table);
        if keys.iter().any(|key| self.region_containing(*key).is_some()) {
            return MergeOutcome::Rejected(MergeRejection::OverlapsRegion);
        }

        let anchor = keys[0];
        let mut original = BTreeMap::new();
        let mut parts = Vec::new();
        for key in &keys {
            let value = table.cell(key.row, key.column);
            if !value.is_empty() {
                parts.push(value.to_string());
                original.insert(*key, value.to_string());
            }
        }
        let joined = parts.join(" ");

        for key in &keys[1..] {
            table.take_cell(*key);
        }
        table.set_cell(anchor.row, anchor.column, joined.clone());

        let region = MergeRegion {
            anchor,
            row_span: rect.height(),
            col_span: rect.width(),
            covered: keys[1..].iter().copied().collect(),
            original,
            joined,
        };
        tracing::debug!(
            ?anchor,
            row_span = region.row_span,
            col_span = region.col_span,
            "cells merged"
        );
        self.regions.insert(anchor, region);
        MergeOutcome::Applied
    }

    pub fn unmerge(&mut self, table: &mut Table, selection: &BTreeSet<CellKey>) -> MergeOutcome {
        if selection.len() != 1 {
            return MergeOutcome::Rejected(MergeRejection::SelectionSize);
        }
        let Some(key) = selection.iter().next().copied() else {
            return MergeOutcome::Rejected(MergeRejection::SelectionSize);
        };
        if !self.dissolve(table, key) {
            return MergeOutcome::Rejected(MergeRejection::NotAnAnchor);
        }
        MergeOutcome::Applied
    }

    /// Re-registers a region that was already merged elsewhere (a decoded
    /// snapshot). The anchor text is kept as is; stray values inside the
    /// rectangle are folded into the restore snapshot.
    pub fn adopt(
        &mut self,
        table: &mut Table,
        anchor: CellKey,
        row_span: usize,
        col_span: usize,
    ) -> MergeOutcome {
        if row_span == 0 || col_span == 0 || (row_span == 1 && col_span == 1) {
            return MergeOutcome::Rejected(MergeRejection::TooFewCells);
        }
        let (Some(top), Some(left)) = (
            table.row_index(anchor.row),
            table.column_index(anchor.column),
        ) else {
            return MergeOutcome::Rejected(MergeRejection::UnknownCell);
        };
        // Spans come from untrusted snapshots; bound them before any arithmetic.
        if row_span > table.rows().len() - top || col_span > table.columns().len() - left {
            return MergeOutcome::Rejected(MergeRejection::UnknownCell);
        }
        let rect = Rect {
            top,
            left,
            bottom: top + row_span - 1,
            right: left + col_span - 1,
        };
        let keys = rect.keys(table);
        if keys.iter().any(|key| self.region_containing(*key).is_some()) {
            return MergeOutcome::Rejected(MergeRejection::OverlapsRegion);
        }

        let mut original = BTreeMap::new();
        for key in &keys[1..] {
            if let Some(value) = table.take_cell(*key).filter(|v| !v.is_empty()) {
                original.insert(*key, value);
            }
        }
        let joined = table.cell(anchor.row, anchor.column).to_string();
        if !joined.is_empty() {
            original.insert(anchor, joined.clone());
        }

        self.regions.insert(
            anchor,
            MergeRegion {
                anchor,
                row_span,
                col_span,
                covered: keys[1..].iter().copied().collect(),
                original,
                joined,
            },
        );
        MergeOutcome::Applied
    }

    /// Dissolves every region that touches `row`.
    pub fn dissolve_touching_row(&mut self, table: &mut Table, row: RowId) -> usize {
        let anchors: Vec<CellKey> = self
            .regions
            .values()
            .filter(|region| region.rows().contains(&row))
            .map(|region| region.anchor)
            .collect();
        self.dissolve_all(table, &anchors)
    }

    /// Dissolves every region that touches `column`.
    pub fn dissolve_touching_column(&mut self, table: &mut Table, column: ColumnId) -> usize {
        let anchors: Vec<CellKey> = self
            .regions
            .values()
            .filter(|region| region.columns().contains(&column))
            .map(|region| region.anchor)
            .collect();
        self.dissolve_all(table, &anchors)
    }

    /// Dissolves regions that stopped being rectangles after a reorder.
    pub fn revalidate(&mut self, table: &mut Table) -> usize {
        let broken: Vec<CellKey> = self
            .regions
            .values()
            .filter(|region| !region.is_contiguous(table))
            .map(|region| region.anchor)
            .collect();
        if !broken.is_empty() {
            tracing::debug!(count = broken.len(), "dropping non-contiguous merge regions");
        }
        self.dissolve_all(table, &broken)
    }

    fn dissolve_all(&mut self, table: &mut Table, anchors: &[CellKey]) -> usize {
        anchors
            .iter()
            .filter(|anchor| self.dissolve(table, **anchor))
            .count()
    }

    fn dissolve(&mut self, table: &mut Table, anchor: CellKey) -> bool {
        let Some(region) = self.regions.remove(&anchor) else {
            return false;
        };

        // An anchor edited after the merge keeps its new text.
        if table.contains(anchor) && table.cell(anchor.row, anchor.column) == region.joined {
            match region.original.get(&anchor) {
                Some(value) => {
                    table.set_cell(anchor.row, anchor.column, value.clone());
                }
                None => {
                    table.take_cell(anchor);
                }
            }
        }
        for (key, value) in &region.original {
            if *key != anchor {
                table.set_cell(key.row, key.column, value.clone());
            }
        }
        tracing::debug!(?anchor, "merge region dissolved");
        true
    }
}
