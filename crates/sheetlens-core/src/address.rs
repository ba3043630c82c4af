//! Cell address and range types
//!
//! The A1-style label produced by [`CellAddress::to_a1_string`] is the
//! canonical address form used as the key in every dependency map; no
//! (row, col) pair is ever used as a map key directly.

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// A cell address (e.g., "A1", "$B$2")
///
/// Row and column indices are 0-based internally; rows are 1-based in
/// display. The optional `$` prefix marks a reference absolute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., XFD=16383)
    pub col: u16,
    /// Whether the row reference is absolute ($)
    pub row_absolute: bool,
    /// Whether the column reference is absolute ($)
    pub col_absolute: bool,
}

impl CellAddress {
    /// Create a new cell address with relative references
    pub fn new(row: u32, col: u16) -> Self {
        Self {
            row,
            col,
            row_absolute: false,
            col_absolute: false,
        }
    }

    /// Create a new cell address with specified absolute/relative flags
    pub fn with_absolute(row: u32, col: u16, row_absolute: bool, col_absolute: bool) -> Self {
        Self {
            row,
            col,
            row_absolute,
            col_absolute,
        }
    }

    /// The canonical label for a (row, col) pair, without sigils
    ///
    /// This is the single source of truth for address equality: every map
    /// key in the dependency graph is produced by this function.
    pub fn label(row: u32, col: u16) -> String {
        CellAddress::new(row, col).to_a1_string()
    }

    /// Parse a cell address from A1-style notation
    ///
    /// # Examples
    /// ```
    /// use sheetlens_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("C6").unwrap();
    /// assert_eq!(addr.row, 5);
    /// assert_eq!(addr.col, 2);
    ///
    /// let addr = CellAddress::parse("$B$2").unwrap();
    /// assert!(addr.row_absolute);
    /// assert!(addr.col_absolute);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let bytes = s.as_bytes();
        let mut pos = 0;

        let col_absolute = if bytes.first() == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        if pos == col_start {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            )));
        }
        let col = Self::letters_to_column(&s[col_start..pos])?;

        let row_absolute = if bytes.get(pos) == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        let row: u32 = s[pos..]
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?;
        // Rows are 1-based in A1 notation
        if row == 0 {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 in '{}'",
                s
            )));
        }
        let row = row - 1;
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }

        Ok(Self {
            row,
            col,
            row_absolute,
            col_absolute,
        })
    }

    /// Convert column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
    pub fn column_to_letters(col: u16) -> String {
        let mut result = String::new();
        let mut n = col as u32 + 1; // 1-based for calculation

        while n > 0 {
            n -= 1;
            result.insert(0, ((n % 26) as u8 + b'A') as char);
            n /= 26;
        }

        result
    }

    /// Convert column letters to index (A = 0, Z = 25, AA = 26, etc.)
    pub fn letters_to_column(letters: &str) -> Result<u16> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
            // Checked per letter so long runs cannot overflow the
            // accumulator
            if col > u16::MAX as u32 + 1 {
                return Err(Error::InvalidAddress(format!(
                    "column '{}' out of range",
                    letters
                )));
            }
        }
        let col = col - 1; // back to 0-based

        if col >= MAX_COLS as u32 {
            return Err(Error::ColumnOutOfBounds(col as u16, MAX_COLS - 1));
        }
        Ok(col as u16)
    }

    /// Format as A1-style string, with `$` sigils for absolute parts
    pub fn to_a1_string(&self) -> String {
        let mut result = String::new();

        if self.col_absolute {
            result.push('$');
        }
        result.push_str(&Self::column_to_letters(self.col));

        if self.row_absolute {
            result.push('$');
        }
        result.push_str(&(self.row + 1).to_string());

        result
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A rectangular range of cells (e.g., "A1:B10")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// Start address (top-left)
    pub start: CellAddress,
    /// End address (bottom-right)
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range, normalized so start is the top-left corner
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        let (start_row, end_row) = if start.row <= end.row {
            (start.row, end.row)
        } else {
            (end.row, start.row)
        };
        let (start_col, end_col) = if start.col <= end.col {
            (start.col, end.col)
        } else {
            (end.col, start.col)
        };

        Self {
            start: CellAddress::with_absolute(
                start_row,
                start_col,
                start.row_absolute,
                start.col_absolute,
            ),
            end: CellAddress::with_absolute(end_row, end_col, end.row_absolute, end.col_absolute),
        }
    }

    /// Create a range from row/column indices
    pub fn from_indices(start_row: u32, start_col: u16, end_row: u32, end_col: u16) -> Self {
        Self::new(
            CellAddress::new(start_row, start_col),
            CellAddress::new(end_row, end_col),
        )
    }

    /// Parse a range from A1:B10 notation (a bare address is a 1-cell range)
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.find(':') {
            Some(colon) => {
                let start = CellAddress::parse(&s[..colon])?;
                let end = CellAddress::parse(&s[colon + 1..])?;
                Ok(Self::new(start, end))
            }
            None => {
                let addr = CellAddress::parse(s)?;
                Ok(Self { start: addr, end: addr })
            }
        }
    }

    /// Whether this range covers entire columns (all rows of the sheet)
    pub fn is_whole_columns(&self) -> bool {
        self.start.row == 0 && self.end.row == MAX_ROWS - 1
    }

    /// Number of rows in the range
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Number of columns in the range
    pub fn col_count(&self) -> u16 {
        self.end.col - self.start.col + 1
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Iterate over all cell addresses in the range (row by row)
    pub fn cells(&self) -> impl Iterator<Item = CellAddress> + '_ {
        let range = *self;
        (range.start.row..=range.end.row).flat_map(move |row| {
            (range.start.col..=range.end.col).map(move |col| CellAddress::new(row, col))
        })
    }

    /// Format as A1:B10 string
    pub fn to_a1_string(&self) -> String {
        if self.start.row == self.end.row && self.start.col == self.end.col {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
        }
    }

    /// Format as a column-range label (e.g. "B:D"), used for whole-column ranges
    pub fn to_column_range_string(&self) -> String {
        let mut result = String::new();
        if self.start.col_absolute {
            result.push('$');
        }
        result.push_str(&CellAddress::column_to_letters(self.start.col));
        result.push(':');
        if self.end.col_absolute {
            result.push('$');
        }
        result.push_str(&CellAddress::column_to_letters(self.end.col));
        result
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_letter_round_trip() {
        assert_eq!(CellAddress::column_to_letters(0), "A");
        assert_eq!(CellAddress::column_to_letters(25), "Z");
        assert_eq!(CellAddress::column_to_letters(26), "AA");
        assert_eq!(CellAddress::column_to_letters(701), "ZZ");
        assert_eq!(CellAddress::column_to_letters(702), "AAA");
        assert_eq!(CellAddress::column_to_letters(16383), "XFD");

        assert_eq!(CellAddress::letters_to_column("A").unwrap(), 0);
        assert_eq!(CellAddress::letters_to_column("z").unwrap(), 25);
        assert_eq!(CellAddress::letters_to_column("AA").unwrap(), 26);
        assert_eq!(CellAddress::letters_to_column("XFD").unwrap(), 16383);
        assert!(CellAddress::letters_to_column("XFE").is_err());
    }

    #[test]
    fn test_overlong_column_letters_rejected() {
        // Must error, not wrap around to a valid column
        assert!(CellAddress::letters_to_column("AAAAAAAA").is_err());
        assert!(CellAddress::parse("AAAAAAAA1").is_err());
        assert!(CellAddress::parse(&format!("{}1", "Z".repeat(40))).is_err());
    }

    #[test]
    fn test_parse_and_display() {
        let addr = CellAddress::parse("C6").unwrap();
        assert_eq!((addr.row, addr.col), (5, 2));
        assert!(!addr.row_absolute && !addr.col_absolute);
        assert_eq!(addr.to_string(), "C6");

        let addr = CellAddress::parse("$B$2").unwrap();
        assert!(addr.row_absolute && addr.col_absolute);
        assert_eq!(addr.to_string(), "$B$2");

        let addr = CellAddress::parse("A$1").unwrap();
        assert!(addr.row_absolute && !addr.col_absolute);
        assert_eq!(addr.to_string(), "A$1");
    }

    #[test]
    fn test_parse_errors() {
        assert!(CellAddress::parse("").is_err());
        assert!(CellAddress::parse("42").is_err());
        assert!(CellAddress::parse("A").is_err());
        assert!(CellAddress::parse("A0").is_err());
        assert!(CellAddress::parse("A1048577").is_err());
    }

    #[test]
    fn test_canonical_label() {
        // The label never carries sigils, whatever the display context
        assert_eq!(CellAddress::label(0, 0), "A1");
        assert_eq!(CellAddress::label(5, 2), "C6");
        assert_eq!(CellAddress::label(99, 27), "AB100");
    }

    #[test]
    fn test_range_normalization() {
        let range = CellRange::parse("B10:A1").unwrap();
        assert_eq!((range.start.row, range.start.col), (0, 0));
        assert_eq!((range.end.row, range.end.col), (9, 1));
    }

    #[test]
    fn test_range_cells_row_major() {
        let range = CellRange::parse("A1:B2").unwrap();
        let cells: Vec<String> = range.cells().map(|a| a.to_a1_string()).collect();
        assert_eq!(cells, vec!["A1", "B1", "A2", "B2"]);
    }

    #[test]
    fn test_whole_column_range() {
        let range = CellRange::from_indices(0, 1, crate::MAX_ROWS - 1, 3);
        assert!(range.is_whole_columns());
        assert_eq!(range.to_column_range_string(), "B:D");

        let partial = CellRange::from_indices(0, 1, 100, 3);
        assert!(!partial.is_whole_columns());
    }
}
