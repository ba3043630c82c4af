//! Postfix formula tokens
//!
//! A formula is a linear sequence of [`Token`]s in postfix (RPN) order:
//! operands precede the operators that consume them, so a single
//! left-to-right pass with an operand stack can render or analyze the
//! whole expression. The token kinds mirror the classic binary-format
//! encoding of spreadsheet formulas: value and reference operands,
//! fixed-arity operators, function calls, a parenthesis marker, and the
//! non-operand attribute/list control markers.

use sheetlens_core::{CellAddress, CellRange};

/// One token of a postfix formula stream
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A constant or name fragment already renderable as text
    Literal(String),
    /// Reference to a single cell (absolute flags carried in the address)
    CellRef(CellAddress),
    /// Reference to a rectangular range, including whole-column ranges
    AreaRef(CellRange),
    /// Infix/prefix/postfix operator with a fixed arity
    Op(Op),
    /// Named function call consuming `argc` operands
    ///
    /// For external (add-in) calls the first consumed operand is the
    /// function name itself, pushed as a [`Token::Literal`] before the
    /// arguments.
    Func {
        name: String,
        argc: u8,
        external: bool,
    },
    /// Parenthesis marker: wraps the most recent operand in parentheses
    Paren,
    /// Non-operand attribute marker
    Attr(Attr),
    /// Marks the start of an implicitly-unioned list of area expressions;
    /// no stack effect, the members are combined by a trailing operator
    List,
}

/// Attribute markers
///
/// All but [`Attr::Sum`] violate RPN ordering (they precede the operand
/// they annotate) and are dropped during rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attr {
    /// Optimized IF/CHOOSE jump
    Skip,
    /// Leading-space hint
    Space,
    /// Volatile-function hint
    Volatile,
    /// Optimized single-range SUM, consuming the given number of operands
    Sum(u8),
}

/// Operators with their own textual rendering rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Binary infix operator
    Binary(BinaryOp),
    /// Prefix negation
    Neg,
    /// Prefix plus (renders as written)
    Plus,
    /// Postfix percent
    Percent,
}

/// Binary infix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Concat,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    /// Binary range operator (`:`) between computed endpoints
    Range,
    /// Reference union (`~` in display form)
    Union,
    /// Reference intersection (space)
    Intersect,
}

impl BinaryOp {
    /// The operator's infix symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Power => "^",
            BinaryOp::Concat => "&",
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "<>",
            BinaryOp::LessThan => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Range => ":",
            BinaryOp::Union => "~",
            BinaryOp::Intersect => " ",
        }
    }
}

impl Op {
    /// Number of operands the operator consumes
    pub fn arity(&self) -> usize {
        match self {
            Op::Binary(_) => 2,
            Op::Neg | Op::Plus | Op::Percent => 1,
        }
    }

    /// Render the operator applied to its operands
    ///
    /// `args` must have exactly [`Op::arity`] entries, index 0 being the
    /// operand that was pushed earliest.
    pub fn render(&self, args: &[String]) -> String {
        match self {
            Op::Binary(op) => format!("{}{}{}", args[0], op.symbol(), args[1]),
            Op::Neg => format!("-{}", args[0]),
            Op::Plus => format!("+{}", args[0]),
            Op::Percent => format!("{}%", args[0]),
        }
    }
}

impl Token {
    /// Convenience constructor for a single-cell reference token
    pub fn cell(row: u32, col: u16) -> Self {
        Token::CellRef(CellAddress::new(row, col))
    }

    /// Convenience constructor for an area reference token
    pub fn area(first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> Self {
        Token::AreaRef(CellRange::from_indices(
            first_row, first_col, last_row, last_col,
        ))
    }

    /// Convenience constructor for a literal token
    pub fn lit<S: Into<String>>(text: S) -> Self {
        Token::Literal(text.into())
    }
}
