use std::collections::BTreeSet;

use policysheet::state::data_model::{CellKey, ColumnId, RowId, Table};
use policysheet::state::merge::{self, MergeOutcome, MergeRejection, MergeSet};

struct Grid {
    table: Table,
    rows: Vec<RowId>,
    columns: Vec<ColumnId>,
}

impl Grid {
    fn key(&self, row: usize, column: usize) -> CellKey {
        CellKey::new(self.rows[row], self.columns[column])
    }

    fn select(&self, positions: &[(usize, usize)]) -> BTreeSet<CellKey> {
        positions.iter().map(|(r, c)| self.key(*r, *c)).collect()
    }

    fn text(&self, row: usize, column: usize) -> &str {
        self.table.cell(self.rows[row], self.columns[column])
    }
}

/// rows ["1","2"], columns ["A","B"], cells x y / z w
fn example() -> Grid {
    let mut table = Table::new();
    let rows = vec![table.add_row(Some("1")), table.add_row(Some("2"))];
    let columns = vec![table.add_column(Some("A")), table.add_column(Some("B"))];
    table.set_cell(rows[0], columns[0], "x");
    table.set_cell(rows[0], columns[1], "y");
    table.set_cell(rows[1], columns[0], "z");
    table.set_cell(rows[1], columns[1], "w");
    Grid {
        table,
        rows,
        columns,
    }
}

fn grid(rows: usize, columns: usize) -> Grid {
    let mut table = Table::new();
    let row_ids: Vec<RowId> = (0..rows).map(|_| table.add_row(None)).collect();
    let column_ids: Vec<ColumnId> = (0..columns).map(|_| table.add_column(None)).collect();
    for (r, row) in row_ids.iter().enumerate() {
        for (c, column) in column_ids.iter().enumerate() {
            table.set_cell(*row, *column, format!("{r}{c}"));
        }
    }
    Grid {
        table,
        rows: row_ids,
        columns: column_ids,
    }
}

#[test]
fn test_can_merge_full_rectangle() {
    let g = grid(3, 3);
    assert!(merge::can_merge(&g.table, &g.select(&[(0, 0), (0, 1)])));
    assert!(merge::can_merge(&g.table, &g.select(&[(0, 0), (1, 0)])));
    assert!(merge::can_merge(
        &g.table,
        &g.select(&[(1, 1), (1, 2), (2, 1), (2, 2)])
    ));
}

#[test]
fn test_can_merge_rejects_single_cell_l_shape_and_gaps() {
    let g = grid(3, 3);
    assert!(!merge::can_merge(&g.table, &g.select(&[(0, 0)])));
    assert!(!merge::can_merge(&g.table, &BTreeSet::new()));
    assert!(!merge::can_merge(&g.table, &g.select(&[(0, 0), (0, 1), (1, 0)])));
    assert!(!merge::can_merge(&g.table, &g.select(&[(0, 0), (0, 2)])));
    assert!(!merge::can_merge(&g.table, &g.select(&[(0, 0), (1, 1)])));
}

#[test]
fn test_merge_example_from_two_by_two() {
    let mut g = example();
    let mut merges = MergeSet::new();
    let selection = g.select(&[(0, 0), (0, 1), (1, 0), (1, 1)]);

    assert_eq!(merges.merge(&mut g.table, &selection), MergeOutcome::Applied);

    assert_eq!(g.text(0, 0), "x y z w");
    assert_eq!(g.table.cells().len(), 1);
    for (r, c) in [(0, 1), (1, 0), (1, 1)] {
        assert!(!g.table.cells().contains_key(&g.key(r, c)));
    }

    let region = merges.get(g.key(0, 0)).unwrap();
    assert_eq!(region.row_span(), 2);
    assert_eq!(region.col_span(), 2);
    assert_eq!(region.covered(), &g.select(&[(0, 1), (1, 0), (1, 1)]));
    assert_eq!(region.original().len(), 4);
    assert_eq!(region.original().get(&g.key(1, 1)).map(String::as_str), Some("w"));
}

#[test]
fn test_merge_skips_empty_values_when_joining() {
    let mut g = grid(1, 3);
    g.table.set_cell(g.rows[0], g.columns[1], "");
    let mut merges = MergeSet::new();

    let row = g.select(&[(0, 0), (0, 1), (0, 2)]);
    assert!(merges.merge(&mut g.table, &row).is_applied());
    assert_eq!(g.text(0, 0), "00 02");
}

#[test]
fn test_merge_joins_in_current_display_order() {
    let mut g = grid(2, 2);
    g.table.move_column(1, 0);
    let mut merges = MergeSet::new();

    let pair = g.select(&[(0, 0), (0, 1)]);
    assert!(merges.merge(&mut g.table, &pair).is_applied());
    // Column 1 now sits first, so it is the anchor.
    assert_eq!(g.text(0, 1), "01 00");
    assert!(merges.get(g.key(0, 1)).is_some());
}

#[test]
fn test_merge_rejections_leave_state_untouched() {
    let mut g = grid(3, 3);
    let mut merges = MergeSet::new();
    let before = g.table.clone();
    let single = g.select(&[(0, 0)]);
    let diagonal = g.select(&[(0, 0), (1, 1)]);

    assert_eq!(
        merges.merge(&mut g.table, &single),
        MergeOutcome::Rejected(MergeRejection::TooFewCells)
    );
    assert_eq!(
        merges.merge(&mut g.table, &diagonal),
        MergeOutcome::Rejected(MergeRejection::NotRectangle)
    );
    assert_eq!(g.table, before);
    assert!(merges.is_empty());
}

#[test]
fn test_merge_rejects_overlap_with_existing_region() {
    let mut g = grid(3, 3);
    let mut merges = MergeSet::new();
    let left = g.select(&[(0, 0), (0, 1)]);
    let right = g.select(&[(0, 1), (0, 2)]);
    assert!(merges.merge(&mut g.table, &left).is_applied());

    assert_eq!(
        merges.merge(&mut g.table, &right),
        MergeOutcome::Rejected(MergeRejection::OverlapsRegion)
    );
    assert_eq!(merges.len(), 1);
}

#[test]
fn test_merge_rejects_removed_cells() {
    let mut g = grid(2, 2);
    let selection = g.select(&[(0, 0), (0, 1)]);
    g.table.remove_column(g.columns[1]);
    let mut merges = MergeSet::new();

    assert_eq!(
        merges.merge(&mut g.table, &selection),
        MergeOutcome::Rejected(MergeRejection::UnknownCell)
    );
}

#[test]
fn test_unmerge_restores_original_values() {
    let mut g = example();
    let original = g.table.clone();
    let mut merges = MergeSet::new();
    let selection = g.select(&[(0, 0), (0, 1), (1, 0), (1, 1)]);
    let anchor = g.select(&[(0, 0)]);

    assert!(merges.merge(&mut g.table, &selection).is_applied());
    assert!(merges.unmerge(&mut g.table, &anchor).is_applied());

    assert_eq!(g.table, original);
    assert!(merges.is_empty());

    // Merging the same selection again reproduces the same merge.
    assert!(merges.merge(&mut g.table, &selection).is_applied());
    assert_eq!(g.text(0, 0), "x y z w");
}

#[test]
fn test_unmerge_keeps_anchor_edits() {
    let mut g = example();
    let mut merges = MergeSet::new();
    let pair = g.select(&[(0, 0), (0, 1)]);
    let anchor = g.select(&[(0, 0)]);
    assert!(merges.merge(&mut g.table, &pair).is_applied());

    g.table.set_cell(g.rows[0], g.columns[0], "edited");
    assert!(merges.unmerge(&mut g.table, &anchor).is_applied());

    assert_eq!(g.text(0, 0), "edited");
    assert_eq!(g.text(0, 1), "y");
}

#[test]
fn test_unmerge_requires_single_anchor() {
    let mut g = example();
    let mut merges = MergeSet::new();
    let pair = g.select(&[(0, 0), (0, 1)]);
    let two_cells = g.select(&[(0, 0), (1, 0)]);
    let not_anchor = g.select(&[(1, 0)]);
    assert!(merges.merge(&mut g.table, &pair).is_applied());

    assert_eq!(
        merges.unmerge(&mut g.table, &two_cells),
        MergeOutcome::Rejected(MergeRejection::SelectionSize)
    );
    assert_eq!(
        merges.unmerge(&mut g.table, &not_anchor),
        MergeOutcome::Rejected(MergeRejection::NotAnAnchor)
    );
    assert_eq!(merges.len(), 1);
}

#[test]
fn test_blocks_sort_for_region_columns() {
    let mut g = grid(2, 3);
    let mut merges = MergeSet::new();
    let pair = g.select(&[(0, 0), (0, 1)]);
    assert!(merges.merge(&mut g.table, &pair).is_applied());

    assert!(merges.blocks_sort(g.columns[0]));
    assert!(merges.blocks_sort(g.columns[1]));
    assert!(!merges.blocks_sort(g.columns[2]));
}

#[test]
fn test_dissolve_touching_removed_row_restores_survivors() {
    let mut g = grid(2, 2);
    let mut merges = MergeSet::new();
    let all = g.select(&[(0, 0), (0, 1), (1, 0), (1, 1)]);
    assert!(merges.merge(&mut g.table, &all).is_applied());

    let removed = g.rows[0];
    g.table.remove_row(removed);
    assert_eq!(merges.dissolve_touching_row(&mut g.table, removed), 1);

    assert!(merges.is_empty());
    assert_eq!(g.text(1, 0), "10");
    assert_eq!(g.text(1, 1), "11");
    assert!(g.table.cells().keys().all(|key| key.row != removed));
}

#[test]
fn test_revalidate_drops_region_split_by_reorder() {
    let mut g = grid(1, 3);
    let mut merges = MergeSet::new();
    let pair = g.select(&[(0, 0), (0, 1)]);
    assert!(merges.merge(&mut g.table, &pair).is_applied());

    // Moving the third column between the merged pair breaks contiguity.
    assert!(g.table.move_column(2, 1));
    assert_eq!(merges.revalidate(&mut g.table), 1);
    assert!(merges.is_empty());
    assert_eq!(g.text(0, 0), "00");
    assert_eq!(g.text(0, 1), "01");
}

#[test]
fn test_revalidate_keeps_region_moved_as_a_block() {
    let mut g = grid(1, 3);
    let mut merges = MergeSet::new();
    let pair = g.select(&[(0, 1), (0, 2)]);
    assert!(merges.merge(&mut g.table, &pair).is_applied());

    // Column 0 moves to the end; the pair stays adjacent and anchor-first.
    assert!(g.table.move_column(0, 2));
    assert_eq!(merges.revalidate(&mut g.table), 0);
    assert_eq!(merges.len(), 1);
}

#[test]
fn test_revalidate_drops_region_whose_anchor_is_no_longer_first() {
    let mut g = grid(1, 2);
    let mut merges = MergeSet::new();
    let pair = g.select(&[(0, 0), (0, 1)]);
    assert!(merges.merge(&mut g.table, &pair).is_applied());

    // B before A: still adjacent but the anchor is not top-left any more.
    assert!(g.table.move_column(1, 0));
    assert_eq!(merges.revalidate(&mut g.table), 1);
    assert!(merges.is_empty());
}

#[test]
fn test_adopt_rebuilds_region_from_geometry() {
    let mut g = grid(2, 2);
    let mut merges = MergeSet::new();
    let top_left = g.key(0, 0);
    let top_right = g.key(0, 1);

    assert!(merges.adopt(&mut g.table, top_left, 2, 1).is_applied());
    assert!(merges.is_covered(g.key(1, 0)));
    assert!(!g.table.cells().contains_key(&g.key(1, 0)));

    assert_eq!(
        merges.adopt(&mut g.table, top_right, 3, 1),
        MergeOutcome::Rejected(MergeRejection::UnknownCell)
    );
}

#[test]
fn test_adopt_rejects_spans_beyond_the_table() {
    let mut g = grid(2, 2);
    let mut merges = MergeSet::new();
    let anchor = g.key(1, 1);
    let before = g.table.clone();

    assert_eq!(
        merges.adopt(&mut g.table, anchor, usize::MAX, 2),
        MergeOutcome::Rejected(MergeRejection::UnknownCell)
    );
    assert_eq!(
        merges.adopt(&mut g.table, anchor, 1, usize::MAX),
        MergeOutcome::Rejected(MergeRejection::UnknownCell)
    );
    assert_eq!(
        merges.adopt(&mut g.table, anchor, 0, usize::MAX),
        MergeOutcome::Rejected(MergeRejection::TooFewCells)
    );
    assert_eq!(g.table, before);
    assert!(merges.is_empty());
}
