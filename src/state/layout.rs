use std::collections::BTreeMap;

use crate::state::data_model::ColumnId;

pub const DEFAULT_COLUMN_WIDTH: f64 = 160.0;
pub const MIN_COLUMN_WIDTH: f64 = 60.0;

/// Pixel widths per column. Purely presentational.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ColumnWidths {
    widths: BTreeMap<ColumnId, f64>,
}

impl ColumnWidths {
    pub fn width(&self, column: ColumnId) -> f64 {
        self.widths
            .get(&column)
            .copied()
            .unwrap_or(DEFAULT_COLUMN_WIDTH)
    }

    /// Stores `px` clamped to the minimum width and returns the applied value.
    pub fn set(&mut self, column: ColumnId, px: f64) -> f64 {
        let px = clamp_width(px);
        self.widths.insert(column, px);
        px
    }

    pub fn forget(&mut self, column: ColumnId) {
        self.widths.remove(&column);
    }
}

pub fn clamp_width(px: f64) -> f64 {
    if px.is_finite() {
        px.max(MIN_COLUMN_WIDTH)
    } else {
        DEFAULT_COLUMN_WIDTH
    }
}
