//! Workbook: an ordered collection of worksheets

use crate::error::{Error, Result};
use crate::worksheet::Worksheet;

/// A workbook holding one or more worksheets
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
}

impl Workbook {
    /// Create an empty workbook (no sheets)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worksheet, returning its index
    pub fn add_worksheet(&mut self, sheet: Worksheet) -> usize {
        self.sheets.push(sheet);
        self.sheets.len() - 1
    }

    /// Number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Result<&Worksheet> {
        self.sheets
            .get(index)
            .ok_or(Error::SheetOutOfBounds(index, self.sheets.len()))
    }

    /// Get a mutable worksheet by index
    pub fn worksheet_mut(&mut self, index: usize) -> Result<&mut Worksheet> {
        let count = self.sheets.len();
        self.sheets
            .get_mut(index)
            .ok_or(Error::SheetOutOfBounds(index, count))
    }

    /// Find a worksheet by name
    pub fn worksheet_by_name(&self, name: &str) -> Result<&Worksheet> {
        self.sheets
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))
    }

    /// Iterate over worksheets in order
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.sheets.iter()
    }
}
