//! # sheetlens-formula
//!
//! Formula handling for sheetlens.
//!
//! This crate provides:
//! - A closed token model for formulas in postfix (RPN) order
//! - Rendering of postfix token streams to human-readable infix text
//! - A compiler from formula source text to postfix tokens
//! - Per-sheet dependency tracking (which formulas consume which cells)
//!
//! ## Example
//!
//! ```rust
//! use sheetlens_formula::{compile, render_tokens};
//!
//! let tokens = compile("=SUM(A1:A3)*2").unwrap();
//! let text = render_tokens(&tokens).unwrap();
//! assert_eq!(text, "SUM([.A1:.A3])*2");
//! ```

pub mod compile;
pub mod dependency;
pub mod error;
pub mod render;
pub mod token;

pub use compile::compile;
pub use dependency::{GraphBuilder, SheetGraph};
pub use error::{FormulaError, FormulaResult};
pub use render::render_tokens;
pub use token::{Attr, BinaryOp, Op, Token};
