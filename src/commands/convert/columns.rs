use serde::Serialize;

use super::layout::Fragment;
use crate::util::collapse_whitespace;

/// Data cells tend to start a little left of their header label.
pub const COLUMN_LEFT_BIAS: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub label: String,
    pub boundary: f64,
}

/// Column labels with the x-coordinate where each column starts, in
/// left-to-right order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnMap {
    columns: Vec<Column>,
}

impl ColumnMap {
    /// Places each boundary halfway between the previous header cell's right
    /// edge and this cell's left edge, shifted left by [`COLUMN_LEFT_BIAS`].
    pub fn from_header(header: &[Fragment]) -> Self {
        let mut map = Self::default();
        let mut last_max: Option<f64> = None;

        for cell in header {
            let location = match last_max {
                Some(previous) => (previous + cell.x_min) / 2.0,
                None => cell.x_min,
            };
            last_max = Some(cell.x_max);
            map.insert(collapse_whitespace(&cell.text), location - COLUMN_LEFT_BIAS);
        }

        map
    }

    fn insert(&mut self, label: String, boundary: f64) {
        match self.columns.iter_mut().find(|column| column.label == label) {
            Some(existing) => existing.boundary = boundary,
            None => self.columns.push(Column { label, boundary }),
        }
    }

    /// The rightmost column whose boundary does not exceed `x`.
    pub fn column_for(&self, x: f64) -> Option<&str> {
        self.columns
            .iter()
            .rev()
            .find(|column| column.boundary <= x)
            .map(|column| column.label.as_str())
    }

    pub fn boundaries(&self) -> Vec<f64> {
        self.columns.iter().map(|column| column.boundary).collect()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.label.as_str())
    }
}
