use std::collections::BTreeSet;

use crate::state::data_model::{CellKey, ColumnId, RowId, Table};
use crate::state::layout::ColumnWidths;
use crate::state::merge::{self, MergeOutcome, MergeRejection, MergeSet};
use crate::state::projection::{self, ColumnFilter, ProjectedRow, SortOrder, SortSpec, ViewSpec};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortRejection {
    UnknownColumn,
    MergedColumn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOutcome {
    Sorted(SortOrder),
    Cleared,
    Rejected(SortRejection),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditSession {
    pub cell: CellKey,
    pub draft: String,
}

/// Pointer-driven modes. Only one can be active, so a column drag or resize
/// and a cell edit never overlap.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Editing(EditSession),
    DraggingColumn {
        from: usize,
    },
    ResizingColumn {
        column: ColumnId,
        origin_x: f64,
        origin_width: f64,
    },
}

#[derive(Clone, Debug, PartialEq)]
struct HistoryEntry {
    table: Table,
    merges: MergeSet,
}

/// Everything one open table editor needs: canonical data, merges,
/// presentation state, the current interaction and undo history.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct TableState {
    table: Table,
    merges: MergeSet,
    view: ViewSpec,
    widths: ColumnWidths,
    full_screen: bool,
    selection: BTreeSet<CellKey>,
    selection_anchor: Option<CellKey>,
    interaction: Interaction,
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
}

impl TableState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: Table) -> Self {
        Self {
            table,
            ..Self::default()
        }
    }

    pub fn from_parts(table: Table, merges: MergeSet) -> Self {
        Self {
            table,
            merges,
            ..Self::default()
        }
    }

    /// Swaps in freshly loaded data and resets every piece of session state.
    pub fn replace(&mut self, table: Table, merges: MergeSet) {
        *self = Self::from_parts(table, merges);
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn merges(&self) -> &MergeSet {
        &self.merges
    }

    pub fn view(&self) -> &ViewSpec {
        &self.view
    }

    pub fn sort_spec(&self) -> Option<&SortSpec> {
        self.view.sort.as_ref()
    }

    pub fn filters(&self) -> &[ColumnFilter] {
        &self.view.filters
    }

    pub fn filter_for(&self, column: ColumnId) -> &str {
        self.view
            .filters
            .iter()
            .find(|filter| filter.column == column)
            .map(|filter| filter.needle.as_str())
            .unwrap_or("")
    }

    pub fn search_query(&self) -> &str {
        &self.view.search
    }

    pub fn column_width(&self, column: ColumnId) -> f64 {
        self.widths.width(column)
    }

    pub fn is_full_screen(&self) -> bool {
        self.full_screen
    }

    pub fn selection(&self) -> &BTreeSet<CellKey> {
        &self.selection
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn editing(&self) -> Option<&EditSession> {
        match &self.interaction {
            Interaction::Editing(edit) => Some(edit),
            _ => None,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn cell(&self, row: RowId, column: ColumnId) -> &str {
        self.table.cell(row, column)
    }

    pub fn visible_rows(&self) -> Vec<RowId> {
        projection::visible_rows(&self.table, &self.view)
    }

    pub fn project(&self) -> Vec<ProjectedRow> {
        projection::project(&self.table, &self.merges, &self.view)
    }

    pub fn add_row(&mut self, label: Option<&str>) -> RowId {
        self.push_undo_snapshot();
        self.table.add_row(label)
    }

    pub fn add_column(&mut self, label: Option<&str>) -> ColumnId {
        self.push_undo_snapshot();
        self.table.add_column(label)
    }

    pub fn rename_row(&mut self, row: RowId, label: &str) -> bool {
        let before = self.snapshot();
        if !self.table.rename_row(row, label) {
            return false;
        }
        self.record(before);
        true
    }

    pub fn rename_column(&mut self, column: ColumnId, label: &str) -> bool {
        let before = self.snapshot();
        if !self.table.rename_column(column, label) {
            return false;
        }
        self.record(before);
        true
    }

    pub fn remove_row(&mut self, row: RowId) -> bool {
        let before = self.snapshot();
        if !self.table.remove_row(row) {
            return false;
        }
        self.merges.dissolve_touching_row(&mut self.table, row);
        self.record(before);
        self.forget_stale_keys();
        true
    }

    pub fn remove_column(&mut self, column: ColumnId) -> bool {
        let before = self.snapshot();
        if !self.table.remove_column(column) {
            return false;
        }
        self.merges.dissolve_touching_column(&mut self.table, column);
        self.widths.forget(column);
        self.record(before);
        self.forget_stale_keys();
        true
    }

    /// Writes a cell directly. Covered cells belong to their region's anchor
    /// and are refused.
    pub fn set_cell(&mut self, row: RowId, column: ColumnId, value: &str) -> bool {
        let key = CellKey::new(row, column);
        if !self.table.contains(key) || self.merges.is_covered(key) {
            return false;
        }
        if self.table.cells().get(&key).map(String::as_str) == Some(value) {
            return true;
        }
        self.push_undo_snapshot();
        self.table.set_cell(row, column, value)
    }

    /// Enters edit mode on `key`, committing any edit already in progress.
    pub fn begin_edit(&mut self, key: CellKey) -> bool {
        match self.interaction {
            Interaction::DraggingColumn { .. } | Interaction::ResizingColumn { .. } => {
                return false
            }
            Interaction::Editing(_) | Interaction::Idle => {}
        }
        if !self.table.contains(key) || self.merges.is_covered(key) {
            return false;
        }
        self.commit_edit();
        self.interaction = Interaction::Editing(EditSession {
            cell: key,
            draft: self.table.cell(key.row, key.column).to_string(),
        });
        true
    }

    pub fn update_draft(&mut self, text: String) {
        if let Interaction::Editing(edit) = &mut self.interaction {
            edit.draft = text;
        }
    }

    /// Leaves edit mode, writing the draft into the table.
    pub fn commit_edit(&mut self) -> bool {
        if !matches!(self.interaction, Interaction::Editing(_)) {
            return false;
        }
        let Interaction::Editing(edit) = std::mem::take(&mut self.interaction) else {
            return false;
        };
        self.set_cell(edit.cell.row, edit.cell.column, &edit.draft)
    }

    pub fn cancel_edit(&mut self) {
        if matches!(self.interaction, Interaction::Editing(_)) {
            self.interaction = Interaction::Idle;
        }
    }

    /// Selects a cell. With `additive` the cell is toggled in the current
    /// selection instead of replacing it. Ignored while a column drag or
    /// resize is in progress.
    pub fn select_cell(&mut self, key: CellKey, additive: bool) -> bool {
        if !self.accepts_selection(key) {
            return false;
        }
        if additive {
            if !self.selection.remove(&key) {
                self.selection.insert(key);
            }
        } else {
            self.selection.clear();
            self.selection.insert(key);
        }
        self.selection_anchor = Some(key);
        true
    }

    /// Selects every uncovered cell in the rectangle between the last
    /// selected cell and `key`, spanning rows in the order they are shown.
    pub fn select_range(&mut self, key: CellKey) -> bool {
        let Some(anchor) = self.selection_anchor else {
            return self.select_cell(key, false);
        };
        if !self.accepts_selection(key) {
            return false;
        }
        let shown = self.visible_rows();
        let (Some(r0), Some(c0), Some(r1), Some(c1)) = (
            shown.iter().position(|row| *row == anchor.row),
            self.table.column_index(anchor.column),
            shown.iter().position(|row| *row == key.row),
            self.table.column_index(key.column),
        ) else {
            return self.select_cell(key, false);
        };

        self.selection.clear();
        for row in &shown[r0.min(r1)..=r0.max(r1)] {
            for column in &self.table.columns()[c0.min(c1)..=c0.max(c1)] {
                let cell = CellKey::new(*row, *column);
                if !self.merges.is_covered(cell) {
                    self.selection.insert(cell);
                }
            }
        }
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.selection_anchor = None;
    }

    pub fn can_merge(&self) -> bool {
        self.view.sort.is_none() && merge::can_merge(&self.table, &self.selection)
    }

    /// Merges the selection. Refused while a sort is active: the join runs in
    /// model order, which only matches the screen when rows are unsorted.
    pub fn merge_selection(&mut self) -> MergeOutcome {
        self.commit_edit();
        if self.view.sort.is_some() {
            tracing::debug!("merge refused while rows are sorted");
            return MergeOutcome::Rejected(MergeRejection::SortedView);
        }
        let before = self.snapshot();
        let outcome = self.merges.merge(&mut self.table, &self.selection);
        if outcome.is_applied() {
            self.record(before);
            self.collapse_selection_to_anchor();
        }
        outcome
    }

    pub fn unmerge_selection(&mut self) -> MergeOutcome {
        self.commit_edit();
        let before = self.snapshot();
        let outcome = self.merges.unmerge(&mut self.table, &self.selection);
        if outcome.is_applied() {
            self.record(before);
        }
        outcome
    }

    /// Cycles the sort on `column`: ascending, descending, then off. Picking a
    /// different column replaces the active sort.
    pub fn cycle_sort(&mut self, column: ColumnId) -> SortOutcome {
        let next = match self.view.sort.as_ref() {
            Some(spec) if spec.column == column => match spec.order {
                SortOrder::Asc => Some(SortOrder::Desc),
                SortOrder::Desc => None,
            },
            _ => Some(SortOrder::Asc),
        };
        match next {
            Some(order) => self.set_sort(column, order),
            None => {
                self.clear_sort();
                SortOutcome::Cleared
            }
        }
    }

    pub fn set_sort(&mut self, column: ColumnId, order: SortOrder) -> SortOutcome {
        if !self.table.has_column(column) {
            return SortOutcome::Rejected(SortRejection::UnknownColumn);
        }
        if self.merges.blocks_sort(column) {
            tracing::debug!(?column, "sort refused on merged column");
            return SortOutcome::Rejected(SortRejection::MergedColumn);
        }
        self.view.sort = Some(SortSpec { column, order });
        SortOutcome::Sorted(order)
    }

    pub fn clear_sort(&mut self) {
        self.view.sort = None;
    }

    /// Sets the substring filter for one column; an empty needle removes it.
    pub fn set_filter(&mut self, column: ColumnId, needle: String) {
        self.view.filters.retain(|filter| filter.column != column);
        if !needle.is_empty() && self.table.has_column(column) {
            self.view.filters.push(ColumnFilter { column, needle });
        }
    }

    pub fn clear_filters(&mut self) {
        self.view.filters.clear();
    }

    pub fn set_search(&mut self, query: String) {
        self.view.search = query.trim().to_string();
    }

    pub fn reorder_column(&mut self, from: usize, to: usize) -> bool {
        let before = self.snapshot();
        if !self.table.move_column(from, to) {
            return false;
        }
        self.merges.revalidate(&mut self.table);
        self.record(before);
        true
    }

    pub fn reorder_row(&mut self, from: usize, to: usize) -> bool {
        let before = self.snapshot();
        if !self.table.move_row(from, to) {
            return false;
        }
        self.merges.revalidate(&mut self.table);
        self.record(before);
        true
    }

    pub fn begin_column_drag(&mut self, from: usize) -> bool {
        if from >= self.table.columns().len() {
            return false;
        }
        self.commit_edit();
        self.interaction = Interaction::DraggingColumn { from };
        true
    }

    /// Finishes a column drag by moving the dragged column to `to`.
    pub fn drop_column(&mut self, to: usize) -> bool {
        let Interaction::DraggingColumn { from } = self.interaction else {
            return false;
        };
        self.interaction = Interaction::Idle;
        self.reorder_column(from, to)
    }

    pub fn cancel_column_drag(&mut self) {
        if matches!(self.interaction, Interaction::DraggingColumn { .. }) {
            self.interaction = Interaction::Idle;
        }
    }

    pub fn begin_resize(&mut self, column: ColumnId, origin_x: f64) -> bool {
        if !self.table.has_column(column) {
            return false;
        }
        self.commit_edit();
        self.interaction = Interaction::ResizingColumn {
            column,
            origin_x,
            origin_width: self.widths.width(column),
        };
        true
    }

    pub fn resize_to(&mut self, pointer_x: f64) -> Option<f64> {
        let Interaction::ResizingColumn {
            column,
            origin_x,
            origin_width,
        } = self.interaction
        else {
            return None;
        };
        self.resize_column(column, origin_width + (pointer_x - origin_x))
    }

    pub fn end_resize(&mut self) {
        if matches!(self.interaction, Interaction::ResizingColumn { .. }) {
            self.interaction = Interaction::Idle;
        }
    }

    pub fn resize_column(&mut self, column: ColumnId, px: f64) -> Option<f64> {
        if !self.table.has_column(column) {
            return None;
        }
        Some(self.widths.set(column, px))
    }

    pub fn set_full_screen(&mut self, full_screen: bool) {
        self.full_screen = full_screen;
    }

    pub fn toggle_full_screen(&mut self) -> bool {
        self.full_screen = !self.full_screen;
        self.full_screen
    }

    pub fn undo(&mut self) -> bool {
        if let Some(entry) = self.undo_stack.pop() {
            self.redo_stack.push(self.snapshot());
            self.restore(entry);
            true
        } else {
            false
        }
    }

    pub fn redo(&mut self) -> bool {
        if let Some(entry) = self.redo_stack.pop() {
            self.undo_stack.push(self.snapshot());
            self.restore(entry);
            true
        } else {
            false
        }
    }

    fn accepts_selection(&self, key: CellKey) -> bool {
        !matches!(
            self.interaction,
            Interaction::DraggingColumn { .. } | Interaction::ResizingColumn { .. }
        ) && self.table.contains(key)
            && !self.merges.is_covered(key)
    }

    fn collapse_selection_to_anchor(&mut self) {
        let anchor = self
            .selection
            .iter()
            .copied()
            .find(|key| self.merges.get(*key).is_some());
        self.selection.clear();
        if let Some(anchor) = anchor {
            self.selection.insert(anchor);
        }
        self.selection_anchor = anchor;
    }

    /// Drops selection, filters, sort and edit state that point at rows,
    /// columns or cells that no longer exist or are now covered.
    fn forget_stale_keys(&mut self) {
        let table = &self.table;
        let merges = &self.merges;
        self.selection
            .retain(|key| table.contains(*key) && !merges.is_covered(*key));
        if self
            .selection_anchor
            .is_some_and(|key| !self.selection.contains(&key))
        {
            self.selection_anchor = None;
        }
        self.view
            .filters
            .retain(|filter| table.has_column(filter.column));
        if self
            .view
            .sort
            .as_ref()
            .is_some_and(|spec| !table.has_column(spec.column))
        {
            self.view.sort = None;
        }
        if let Interaction::Editing(edit) = &self.interaction {
            if !table.contains(edit.cell) || merges.is_covered(edit.cell) {
                self.interaction = Interaction::Idle;
            }
        }
    }

    fn snapshot(&self) -> HistoryEntry {
        HistoryEntry {
            table: self.table.clone(),
            merges: self.merges.clone(),
        }
    }

    fn push_undo_snapshot(&mut self) {
        let before = self.snapshot();
        self.record(before);
    }

    fn record(&mut self, before: HistoryEntry) {
        self.undo_stack.push(before);
        self.redo_stack.clear();
    }

    fn restore(&mut self, entry: HistoryEntry) {
        self.table = entry.table;
        self.merges = entry.merges;
        self.interaction = Interaction::Idle;
        self.forget_stale_keys();
    }
}
