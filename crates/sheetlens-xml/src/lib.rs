//! # sheetlens-xml
//!
//! Annotated XML export for sheetlens.
//!
//! Each sheet becomes one XML document in which every cell carries its
//! formatted display value and, where relevant, its equations: formula
//! cells keep their verbatim source text, plain cells referenced by
//! formulas get a composite "derived formula" annotation built from the
//! sheet's dependency graph.

pub mod error;
pub mod format;
pub mod writer;

pub use error::{XmlError, XmlResult};
pub use format::format_value;
pub use writer::XmlWriter;
