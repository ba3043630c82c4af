//! # sheetlens
//!
//! A library for analysing spreadsheet formulas: it renders parsed
//! formulas back to display text, builds per-sheet dependency graphs,
//! and exports sheets as XML in which every plain cell consumed by
//! formulas is annotated with those formulas in readable infix form.
//!
//! ## Example
//!
//! ```rust
//! use sheetlens::prelude::*;
//!
//! let mut sheet = Worksheet::new("Report");
//! sheet.set_value_at(0, 0, 10.0);
//! sheet.set_formula_at(0, 1, "=A1*2");
//!
//! let graph = SheetGraph::build(&sheet);
//! assert_eq!(graph.annotation_for("A1").unwrap(), "[.B1]=[.A1]*2");
//!
//! let mut xml = Vec::new();
//! XmlWriter::write_sheet(&mut xml, &sheet).unwrap();
//! ```

pub mod prelude;

// Re-export core types
pub use sheetlens_core::{
    Cell,
    CellAddress,
    CellRange,
    // Cell types
    CellValue,
    // Error types
    Error,
    NumberFormat,
    Result,
    // Main types
    Workbook,
    Worksheet,

    MAX_COLS,
    // Constants
    MAX_ROWS,
};

// Re-export formula types
pub use sheetlens_formula::{
    compile, render_tokens, FormulaError, FormulaResult, GraphBuilder, SheetGraph, Token,
};

// Re-export I/O types
pub use sheetlens_csv::{CsvError, CsvReadOptions, CsvReader};
pub use sheetlens_xml::{format_value, XmlError, XmlWriter};

use std::path::Path;

/// Extension trait for Workbook to add file input
pub trait WorkbookExt {
    /// Open a workbook from a file
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("csv") => {
                let worksheet = CsvReader::read_file(path, &CsvReadOptions::default())
                    .map_err(|e| Error::other(e.to_string()))?;

                let mut workbook = Workbook::new();
                workbook.add_worksheet(worksheet);
                Ok(workbook)
            }
            _ => Err(Error::other(format!(
                "Unsupported file format: {}",
                path.display()
            ))),
        }
    }
}

/// Export every non-empty sheet of a workbook as annotated XML
///
/// Convenience wrapper over [`XmlWriter::write_workbook_files`]; output
/// files are named from the given path's stem, one per sheet. Returns
/// the paths written.
pub fn export_xml<P: AsRef<Path>>(
    workbook: &Workbook,
    output: P,
) -> Result<Vec<std::path::PathBuf>> {
    XmlWriter::write_workbook_files(workbook, output.as_ref())
        .map_err(|e| Error::other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;

    #[test]
    fn test_open_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "1,2,=A1+B1").unwrap();
        drop(file);

        let workbook = Workbook::open(&path).unwrap();
        let sheet = workbook.worksheet(0).unwrap();
        assert_eq!(sheet.name(), "data");
        assert!(sheet.is_formula_at(0, 2));
    }

    #[test]
    fn test_open_unsupported_extension() {
        assert!(Workbook::open("book.xlsx").is_err());
    }

    #[test]
    fn test_csv_to_annotated_xml() {
        let mut sheet = Worksheet::new("S");
        sheet.set_value_at(0, 0, 4.0);
        sheet.set_formula_at(1, 0, "=SUM(A1:A1)");

        let mut buf = Vec::new();
        XmlWriter::write_sheet(&mut buf, &sheet).unwrap();
        let xml = String::from_utf8(buf).unwrap();

        assert!(xml.contains("cellFormula=\"SUM(A1:A1)\""));
        assert!(xml.contains("formula=\"[.A2]=SUM([.A1:.A1])\""));
    }
}
