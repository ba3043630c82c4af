//! # sheetlens-core
//!
//! Core data structures for the sheetlens spreadsheet annotation toolkit.
//!
//! This crate provides the fundamental types used throughout sheetlens:
//! - [`CellAddress`] and [`CellRange`] - Cell addressing and ranges
//! - [`CellValue`] - Represents cell values (numbers, strings, booleans, formulas)
//! - [`NumberFormat`] - Display format codes
//! - [`Workbook`], [`Worksheet`] - The document structures
//!
//! ## Example
//!
//! ```rust
//! use sheetlens_core::{Worksheet, CellValue};
//!
//! let mut sheet = Worksheet::new("Budget");
//! sheet.set_value_at(0, 0, CellValue::Number(42.0));
//! sheet.set_formula_at(1, 0, "=A1*2");
//!
//! assert!(sheet.cell_at(1, 0).unwrap().value.is_formula());
//! ```

pub mod address;
pub mod error;
pub mod number_format;
pub mod value;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use address::{CellAddress, CellRange};
pub use error::{Error, Result};
pub use number_format::NumberFormat;
pub use value::CellValue;
pub use workbook::Workbook;
pub use worksheet::{Cell, Worksheet};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;
