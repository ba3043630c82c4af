//! # sheetlens-csv
//!
//! CSV input for sheetlens: loads a CSV file into a [`Worksheet`],
//! treating fields that start with `=` as formula cells.
//!
//! [`Worksheet`]: sheetlens_core::Worksheet

mod error;
mod options;
mod reader;

pub use error::{CsvError, CsvResult};
pub use options::CsvReadOptions;
pub use reader::CsvReader;
