//! Prelude module - common imports for sheetlens users
//!
//! ```rust
//! use sheetlens::prelude::*;
//! ```

pub use crate::{
    CellAddress,
    CellRange,
    // Cell types
    CellValue,

    // I/O types
    CsvReader,

    // Error types
    Error,
    FormulaError,
    // Dependency graph types
    GraphBuilder,
    NumberFormat,
    Result,
    SheetGraph,
    Token,

    // Main types
    Workbook,
    // Extension traits
    WorkbookExt,
    Worksheet,

    XmlWriter,
};
