//! Worksheet model
//!
//! Sparse row-major storage: only populated cells are stored, in a
//! per-row ordered map. Row and cell iteration is therefore always in
//! row-major, then column order, which the dependency graph build relies
//! on.

use std::collections::BTreeMap;

use crate::number_format::NumberFormat;
use crate::value::CellValue;

/// A single populated cell: value plus display format
#[derive(Debug, Clone, Default)]
pub struct Cell {
    /// The cell's value
    pub value: CellValue,
    /// The display format code applied when rendering the value
    pub format: NumberFormat,
}

impl Cell {
    /// Create a cell with a value and default format
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            format: NumberFormat::General,
        }
    }

    /// Create a cell with a value and format
    pub fn with_format(value: CellValue, format: NumberFormat) -> Self {
        Self { value, format }
    }
}

/// A single sheet of cells
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    name: String,
    rows: BTreeMap<u32, BTreeMap<u16, Cell>>,
}

impl Worksheet {
    /// Create a new empty worksheet
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
        }
    }

    /// Get the worksheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the sheet has no populated cells
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Set a cell's value, creating the cell if needed
    pub fn set_value_at<V: Into<CellValue>>(&mut self, row: u32, col: u16, value: V) {
        self.cell_entry(row, col).value = value.into();
    }

    /// Set a cell to a formula from its source text
    pub fn set_formula_at<S: Into<String>>(&mut self, row: u32, col: u16, text: S) {
        self.cell_entry(row, col).value = CellValue::formula(text);
    }

    /// Set a cell's display format
    pub fn set_format_at(&mut self, row: u32, col: u16, format: NumberFormat) {
        self.cell_entry(row, col).format = format;
    }

    fn cell_entry(&mut self, row: u32, col: u16) -> &mut Cell {
        self.rows.entry(row).or_default().entry(col).or_default()
    }

    /// Get the cell at a position, if populated
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&Cell> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Whether the cell at a position holds a formula
    pub fn is_formula_at(&self, row: u32, col: u16) -> bool {
        self.cell_at(row, col)
            .map(|c| c.value.is_formula())
            .unwrap_or(false)
    }

    /// Iterate rows in row-index order: (row index, ordered cells)
    pub fn rows(&self) -> impl Iterator<Item = (u32, &BTreeMap<u16, Cell>)> {
        self.rows.iter().map(|(row, cells)| (*row, cells))
    }

    /// Iterate over all formula cells in row-major order: (row, col, source text)
    pub fn formula_cells(&self) -> impl Iterator<Item = (u32, u16, &str)> {
        self.rows.iter().flat_map(|(row, cells)| {
            cells.iter().filter_map(move |(col, cell)| {
                cell.value.formula_text().map(|text| (*row, *col, text))
            })
        })
    }

    /// Column bounds across all rows: (min first populated, max last populated)
    ///
    /// One O(rows) pass; the XML driver caches the result per sheet.
    pub fn column_bounds(&self) -> Option<(u16, u16)> {
        let mut bounds: Option<(u16, u16)> = None;
        for cells in self.rows.values() {
            let (Some(first), Some(last)) = (cells.keys().next(), cells.keys().next_back()) else {
                continue;
            };
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(*first), hi.max(*last)),
                None => (*first, *last),
            });
        }
        bounds
    }

    /// Largest populated row index
    pub fn last_row(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_and_get() {
        let mut ws = Worksheet::new("Test");
        assert!(ws.is_empty());

        ws.set_value_at(0, 0, 1.5);
        ws.set_formula_at(1, 0, "=A1*2");

        assert_eq!(ws.cell_at(0, 0).unwrap().value, CellValue::Number(1.5));
        assert!(ws.is_formula_at(1, 0));
        assert!(!ws.is_formula_at(0, 0));
        assert!(ws.cell_at(5, 5).is_none());
    }

    #[test]
    fn test_formula_cells_row_major() {
        let mut ws = Worksheet::new("Test");
        ws.set_formula_at(2, 1, "=A1");
        ws.set_formula_at(0, 3, "=B2");
        ws.set_formula_at(0, 1, "=C3");
        ws.set_value_at(1, 1, "plain");

        let order: Vec<(u32, u16)> = ws.formula_cells().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(order, vec![(0, 1), (0, 3), (2, 1)]);
    }

    #[test]
    fn test_column_bounds() {
        let mut ws = Worksheet::new("Test");
        assert_eq!(ws.column_bounds(), None);

        ws.set_value_at(0, 3, "a");
        ws.set_value_at(4, 1, "b");
        ws.set_value_at(4, 7, "c");

        assert_eq!(ws.column_bounds(), Some((1, 7)));
        assert_eq!(ws.last_row(), Some(4));
    }
}
