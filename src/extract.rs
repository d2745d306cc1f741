//! Per-channel extraction with default substitution.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::frame::{Cell, Row};

pub const DEFAULT_POSITION: f64 = 0.0;
pub const DEFAULT_SIZE: f64 = 10.0;
pub const DEFAULT_COLOR: Rgba = Rgba::new(253.0, 106.0, 2.0, 1.0);

/// Column-major view of one channel.
///
/// With no column every row gets `default`. With a column each row gets
/// `lift(cell)`, except blank cells and cells past the end of a short row,
/// which get `default` for that row only.
pub fn extract<T, F>(rows: &[Row], index: Option<usize>, default: T, lift: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&Cell) -> T,
{
    let Some(index) = index else {
        return vec![default; rows.len()];
    };

    rows.iter()
        .map(|row| match row.get(index) {
            Some(cell) if !cell.is_blank() => lift(cell),
            _ => default.clone(),
        })
        .collect()
}

/// Position channel. Cells pass through as-is; the charting library accepts
/// numeric strings.
pub fn positions(rows: &[Row], index: Option<usize>) -> Vec<Cell> {
    extract(rows, index, Cell::Number(DEFAULT_POSITION), Cell::clone)
}

pub fn sizes(rows: &[Row], index: Option<usize>) -> Vec<Cell> {
    extract(rows, index, Cell::Number(DEFAULT_SIZE), Cell::clone)
}

/// Hover labels. Missing labels stay absent.
pub fn labels(rows: &[Row], index: Option<usize>) -> Vec<Option<Cell>> {
    extract(rows, index, None, |cell| Some(cell.clone()))
}

/// An `rgb(r,g,b,a)` colour as the charting library reads it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    fn components(&self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Rgba {
    fn default() -> Self {
        DEFAULT_COLOR
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.components().map(Cell::Number);
        write!(f, "rgb({},{},{},{})", r, g, b, a)
    }
}

/// Result of colour extraction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColorColumn {
    pub values: Vec<String>,
    /// Rows where a present component column held the blank marker.
    pub rows_with_blank: usize,
}

/// Colour channel built from the four `color.*` columns.
///
/// Only when all four columns are absent does every row get the packed
/// `default`. Otherwise each row is formatted from its cells: blank cells
/// are written verbatim with no per-cell substitution, and a component
/// with no column at all is written from `default`.
///
/// A row with a blank component therefore yields a string such as
/// `rgb(1, ,3,1)`, which is not a valid CSS colour. Such rows are counted
/// in [`ColorColumn::rows_with_blank`].
pub fn colors(rows: &[Row], rgba: [Option<usize>; 4], default: Rgba) -> ColorColumn {
    if rgba.iter().all(Option::is_none) {
        return ColorColumn {
            values: vec![default.to_string(); rows.len()],
            rows_with_blank: 0,
        };
    }

    let fallback = default.components().map(Cell::Number);
    let mut rows_with_blank = 0;
    let values = rows
        .iter()
        .map(|row| {
            let mut blank = false;
            let parts: [String; 4] = std::array::from_fn(|i| {
                match rgba[i].and_then(|idx| row.get(idx)) {
                    Some(cell) => {
                        blank |= cell.is_blank();
                        cell.to_string()
                    }
                    None => fallback[i].to_string(),
                }
            });
            if blank {
                rows_with_blank += 1;
            }
            format!("rgb({},{},{},{})", parts[0], parts[1], parts[2], parts[3])
        })
        .collect();

    ColorColumn {
        values,
        rows_with_blank,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: f64) -> Cell {
        Cell::Number(v)
    }

    #[test]
    fn absent_column_repeats_default() {
        let rows = vec![vec![n(1.0)], vec![n(2.0)], vec![n(3.0)]];
        assert_eq!(positions(&rows, None), vec![n(0.0); 3]);
        assert_eq!(sizes(&rows, None), vec![n(10.0); 3]);
        assert_eq!(labels(&rows, None), vec![None, None, None]);
    }

    #[test]
    fn blank_cell_defaults_that_row_only() {
        let rows = vec![
            vec![n(4.0), n(1.0)],
            vec![Cell::blank(), n(2.0)],
            vec![n(6.0), n(3.0)],
        ];
        assert_eq!(sizes(&rows, Some(0)), vec![n(4.0), n(10.0), n(6.0)]);
        assert_eq!(positions(&rows, Some(1)), vec![n(1.0), n(2.0), n(3.0)]);
    }

    #[test]
    fn short_row_falls_back_to_default() {
        let rows = vec![vec![n(1.0), n(2.0)], vec![n(3.0)]];
        assert_eq!(positions(&rows, Some(1)), vec![n(2.0), n(0.0)]);
    }

    #[test]
    fn labels_keep_text_and_drop_blanks() {
        let rows = vec![vec![Cell::from("a")], vec![Cell::blank()], vec![n(7.0)]];
        assert_eq!(
            labels(&rows, Some(0)),
            vec![Some(Cell::from("a")), None, Some(n(7.0))]
        );
    }

    #[test]
    fn empty_frame_gives_empty_columns() {
        assert!(positions(&[], Some(0)).is_empty());
        assert!(colors(&[], [None; 4], DEFAULT_COLOR).values.is_empty());
    }

    #[test]
    fn default_color_is_packed_orange() {
        assert_eq!(DEFAULT_COLOR.to_string(), "rgb(253,106,2,1)");
        assert_eq!(Rgba::new(0.5, 0.0, 1.0, 0.25).to_string(), "rgb(0.5,0,1,0.25)");
    }

    #[test]
    fn all_color_columns_absent_uses_default() {
        let rows = vec![vec![n(1.0)], vec![n(2.0)]];
        let column = colors(&rows, [None; 4], DEFAULT_COLOR);
        assert_eq!(column.values, vec!["rgb(253,106,2,1)"; 2]);
        assert_eq!(column.rows_with_blank, 0);
    }

    #[test]
    fn full_color_columns_are_formatted_per_row() {
        let rows = vec![
            vec![n(10.0), n(20.0), n(30.0), n(0.5)],
            vec![n(0.0), n(0.0), n(0.0), n(1.0)],
        ];
        let column = colors(&rows, [Some(0), Some(1), Some(2), Some(3)], DEFAULT_COLOR);
        assert_eq!(column.values, vec!["rgb(10,20,30,0.5)", "rgb(0,0,0,1)"]);
    }

    #[test]
    fn single_component_present_still_computes_every_row() {
        let rows = vec![vec![n(9.0)], vec![n(100.0)]];
        let column = colors(&rows, [None, Some(0), None, None], DEFAULT_COLOR);
        assert_eq!(column.values, vec!["rgb(253,9,2,1)", "rgb(253,100,2,1)"]);
    }

    #[test]
    fn blank_component_is_tolerated_and_counted() {
        let rows = vec![
            vec![n(1.0), Cell::blank(), n(3.0), n(1.0)],
            vec![n(1.0), n(2.0), n(3.0), n(1.0)],
        ];
        let column = colors(&rows, [Some(0), Some(1), Some(2), Some(3)], DEFAULT_COLOR);
        assert_eq!(column.values, vec!["rgb(1, ,3,1)", "rgb(1,2,3,1)"]);
        assert_eq!(column.rows_with_blank, 1);
    }
}
