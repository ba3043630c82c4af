//! Formula compiler: source text to postfix tokens
//!
//! A recursive descent parser with the usual spreadsheet operator
//! precedence, followed by a lowering pass that flattens the expression
//! into postfix [`Token`] order. The two stages keep range detection
//! simple (`A1:B2` and whole-column `B:D` become a single area token)
//! while the emitted stream stays strictly RPN.

use crate::error::{FormulaError, FormulaResult};
use crate::token::{Attr, BinaryOp, Op, Token};
use once_cell::sync::Lazy;
use sheetlens_core::{CellAddress, CellRange, MAX_ROWS};
use std::collections::HashSet;

/// Compile formula source text into a postfix token stream
///
/// # Example
/// ```rust
/// use sheetlens_formula::compile;
///
/// let tokens = compile("=A1+B2").unwrap();
/// let tokens = compile("=IF(A1>0,\"Yes\",\"No\")").unwrap();
/// ```
pub fn compile(source: &str) -> FormulaResult<Vec<Token>> {
    let source = source.trim();

    // The leading '=' is optional so stored cached formula text and raw
    // user input both compile.
    let source = source.strip_prefix('=').unwrap_or(source);

    let mut parser = Parser::new(source);
    let expr = parser.parse_expression()?;

    if !matches!(parser.current(), Lexeme::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected trailing token: {:?}",
            parser.current()
        )));
    }

    let mut out = Vec::new();
    lower(&expr, &mut out)?;
    Ok(out)
}

/// Function names compiled as built-in calls; anything else uses the
/// external-call encoding where the name travels as the first operand.
static BUILTIN_FUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "ABS", "AND", "AVERAGE", "AVERAGEIF", "CEILING", "CHOOSE", "CONCAT", "CONCATENATE",
        "COUNT", "COUNTA", "COUNTBLANK", "COUNTIF", "DATE", "DAY", "EXACT", "FIND", "FLOOR",
        "HLOOKUP", "HOUR", "IF", "IFERROR", "INDEX", "INDIRECT", "INT", "ISBLANK", "ISERROR",
        "ISNUMBER", "ISTEXT", "LEFT", "LEN", "LN", "LOG", "LOG10", "LOOKUP", "LOWER", "MATCH",
        "MAX", "MEDIAN", "MID", "MIN", "MINUTE", "MOD", "MONTH", "NOT", "NOW", "OFFSET", "OR",
        "PI", "POWER", "PRODUCT", "PROPER", "RIGHT", "ROUND", "ROUNDDOWN", "ROUNDUP", "ROW",
        "SECOND", "SIGN", "SQRT", "STDEV", "SUBSTITUTE", "SUM", "SUMIF", "SUMPRODUCT", "T",
        "TEXT", "TODAY", "TRIM", "TRUNC", "UPPER", "VALUE", "VAR", "VLOOKUP", "YEAR",
    ]
    .into_iter()
    .collect()
});

/// Parsed expression, an intermediate form local to the compiler
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    String(String),
    Boolean(bool),
    CellRef(CellAddress),
    RangeRef(CellRange),
    NameRef(String),
    Paren(Box<Expr>),
    Unary {
        op: Op,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

/// Flatten an expression into postfix token order
fn lower(expr: &Expr, out: &mut Vec<Token>) -> FormulaResult<()> {
    match expr {
        Expr::Number(n) => out.push(Token::Literal(format_number(*n))),
        Expr::String(s) => out.push(Token::Literal(format!("\"{}\"", s.replace('"', "\"\"")))),
        Expr::Boolean(b) => out.push(Token::lit(if *b { "TRUE" } else { "FALSE" })),
        Expr::CellRef(addr) => out.push(Token::CellRef(*addr)),
        Expr::RangeRef(range) => out.push(Token::AreaRef(*range)),
        Expr::NameRef(name) => out.push(Token::Literal(name.clone())),
        Expr::Paren(inner) => {
            lower(inner, out)?;
            out.push(Token::Paren);
        }
        Expr::Unary { op, operand } => {
            lower(operand, out)?;
            out.push(Token::Op(*op));
        }
        Expr::Binary { op, left, right } => {
            lower(left, out)?;
            lower(right, out)?;
            out.push(Token::Op(Op::Binary(*op)));
        }
        Expr::Call { name, args } => lower_call(name, args, out)?,
    }
    Ok(())
}

fn lower_call(name: &str, args: &[Expr], out: &mut Vec<Token>) -> FormulaResult<()> {
    // Single-range SUM gets the optimized attribute encoding
    if name == "SUM" && args.len() == 1 {
        lower(&args[0], out)?;
        out.push(Token::Attr(Attr::Sum(1)));
        return Ok(());
    }

    let external = !BUILTIN_FUNCTIONS.contains(name);
    if external {
        // The call-target name is the first operand slot
        out.push(Token::Literal(name.to_string()));
    }

    for arg in args {
        lower(arg, out)?;
    }

    let argc = args.len() + usize::from(external);
    let argc = u8::try_from(argc)
        .map_err(|_| FormulaError::Parse(format!("too many arguments to {}", name)))?;
    out.push(Token::Func {
        name: name.to_string(),
        argc,
        external,
    });
    Ok(())
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Scanner token types
#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Number(f64),
    String(String),
    Boolean(bool),

    Identifier(String), // Function name, named range, or column letters
    CellRef(String),    // Cell reference like A1, $A$1

    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    ArgSep,

    LeftParen,
    RightParen,

    /// A character the scanner does not recognize
    Unknown(char),

    Eof,
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    current: Option<Lexeme>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            current: None,
        };
        parser.advance_lexeme();
        parser
    }

    // === Scanning ===

    fn advance_lexeme(&mut self) {
        self.skip_whitespace();
        self.current = Some(self.scan_lexeme());
    }

    fn scan_lexeme(&mut self) -> Lexeme {
        self.skip_whitespace();

        let Some(c) = self.peek_char() else {
            return Lexeme::Eof;
        };

        match c {
            '+' => {
                self.advance();
                return Lexeme::Plus;
            }
            '-' => {
                self.advance();
                return Lexeme::Minus;
            }
            '*' => {
                self.advance();
                return Lexeme::Star;
            }
            '/' => {
                self.advance();
                return Lexeme::Slash;
            }
            '^' => {
                self.advance();
                return Lexeme::Caret;
            }
            '%' => {
                self.advance();
                return Lexeme::Percent;
            }
            '&' => {
                self.advance();
                return Lexeme::Ampersand;
            }
            ':' => {
                self.advance();
                return Lexeme::Colon;
            }
            ',' | ';' => {
                self.advance();
                return Lexeme::ArgSep;
            }
            '(' => {
                self.advance();
                return Lexeme::LeftParen;
            }
            ')' => {
                self.advance();
                return Lexeme::RightParen;
            }
            '=' => {
                self.advance();
                return Lexeme::Equal;
            }
            _ => {}
        }

        if c == '<' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Lexeme::LessEqual;
            } else if self.peek_char() == Some('>') {
                self.advance();
                return Lexeme::NotEqual;
            }
            return Lexeme::LessThan;
        }

        if c == '>' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Lexeme::GreaterEqual;
            }
            return Lexeme::GreaterThan;
        }

        if c == '"' {
            return self.scan_string();
        }

        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            return self.scan_identifier_or_ref();
        }

        // Unknown character; surfaced as its own lexeme so the parser
        // rejects the whole formula instead of compiling a truncated
        // prefix
        self.advance();
        Lexeme::Unknown(c)
    }

    fn scan_string(&mut self) -> Lexeme {
        self.advance(); // opening quote

        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if c == '"' {
                // "" is an escaped quote
                if self.peek_char_at(1) == Some('"') {
                    s.push('"');
                    self.advance();
                    self.advance();
                } else {
                    break;
                }
            } else {
                s.push(c);
                self.advance();
            }
        }

        if self.peek_char() == Some('"') {
            self.advance();
        }

        Lexeme::String(s)
    }

    fn scan_number(&mut self) -> Lexeme {
        let start = self.pos;

        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num: f64 = self.input[start..self.pos].parse().unwrap_or(0.0);
        Lexeme::Number(num)
    }

    fn scan_identifier_or_ref(&mut self) -> Lexeme {
        let start = self.pos;

        while self.peek_char().map_or(false, |c| {
            c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'
        }) {
            self.advance();
        }

        let text = &self.input[start..self.pos];

        // TRUE/FALSE are literals unless used as a function name
        let upper = text.to_uppercase();
        if upper == "TRUE" && self.peek_char() != Some('(') {
            return Lexeme::Boolean(true);
        }
        if upper == "FALSE" && self.peek_char() != Some('(') {
            return Lexeme::Boolean(false);
        }

        // Letter(s)-then-digit(s) is a cell reference, unless followed by
        // '(' (LOG10(100) is a function call, not a reference)
        if is_cell_reference(text) && self.peek_char() != Some('(') {
            return Lexeme::CellRef(text.to_string());
        }

        Lexeme::Identifier(text.to_string())
    }

    // === Helpers ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current(&self) -> &Lexeme {
        self.current.as_ref().unwrap_or(&Lexeme::Eof)
    }

    fn consume(&mut self) -> Lexeme {
        let lexeme = self.current.take().unwrap_or(Lexeme::Eof);
        self.advance_lexeme();
        lexeme
    }

    fn expect(&mut self, expected: &Lexeme) -> FormulaResult<()> {
        if self.current() == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected,
                self.current()
            )))
        }
    }

    // === Expression parsing with precedence ===
    // Lowest to highest: comparison, concatenation, additive,
    // multiplicative, exponent, unary prefix, postfix percent, range,
    // primary.

    fn parse_expression(&mut self) -> FormulaResult<Expr> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_concatenation()?;

        loop {
            let op = match self.current() {
                Lexeme::Equal => BinaryOp::Equal,
                Lexeme::NotEqual => BinaryOp::NotEqual,
                Lexeme::LessThan => BinaryOp::LessThan,
                Lexeme::LessEqual => BinaryOp::LessEqual,
                Lexeme::GreaterThan => BinaryOp::GreaterThan,
                Lexeme::GreaterEqual => BinaryOp::GreaterEqual,
                _ => break,
            };

            self.consume();
            let right = self.parse_concatenation()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_concatenation(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_additive()?;

        while matches!(self.current(), Lexeme::Ampersand) {
            self.consume();
            let right = self.parse_additive()?;
            left = Expr::Binary {
                op: BinaryOp::Concat,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current() {
                Lexeme::Plus => BinaryOp::Add,
                Lexeme::Minus => BinaryOp::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_exponent()?;

        loop {
            let op = match self.current() {
                Lexeme::Star => BinaryOp::Multiply,
                Lexeme::Slash => BinaryOp::Divide,
                _ => break,
            };

            self.consume();
            let right = self.parse_exponent()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_exponent(&mut self) -> FormulaResult<Expr> {
        let left = self.parse_unary()?;

        if matches!(self.current(), Lexeme::Caret) {
            self.consume();
            let right = self.parse_exponent()?; // right associative
            return Ok(Expr::Binary {
                op: BinaryOp::Power,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<Expr> {
        if matches!(self.current(), Lexeme::Minus) {
            self.consume();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: Op::Neg,
                operand: Box::new(operand),
            });
        }

        if matches!(self.current(), Lexeme::Plus) {
            self.consume();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: Op::Plus,
                operand: Box::new(operand),
            });
        }

        let mut expr = self.parse_range()?;

        while matches!(self.current(), Lexeme::Percent) {
            self.consume();
            expr = Expr::Unary {
                op: Op::Percent,
                operand: Box::new(expr),
            };
        }

        Ok(expr)
    }

    fn parse_range(&mut self) -> FormulaResult<Expr> {
        let left = self.parse_primary()?;

        if matches!(self.current(), Lexeme::Colon) {
            self.consume();
            let right = self.parse_primary()?;

            // A1:B2 collapses to a single area reference
            if let (Expr::CellRef(start), Expr::CellRef(end)) = (&left, &right) {
                return Ok(Expr::RangeRef(CellRange::new(*start, *end)));
            }

            // B:D (bare column letters) is a whole-column area
            if let (Expr::NameRef(start), Expr::NameRef(end)) = (&left, &right) {
                if let (Some(start), Some(end)) =
                    (parse_column_name(start), parse_column_name(end))
                {
                    return Ok(Expr::RangeRef(CellRange::new(
                        CellAddress::with_absolute(0, start.0, false, start.1),
                        CellAddress::with_absolute(MAX_ROWS - 1, end.0, false, end.1),
                    )));
                }
            }

            // Computed endpoints keep the binary range operator
            return Ok(Expr::Binary {
                op: BinaryOp::Range,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> FormulaResult<Expr> {
        match self.current().clone() {
            Lexeme::Number(n) => {
                self.consume();
                Ok(Expr::Number(n))
            }

            Lexeme::String(s) => {
                self.consume();
                Ok(Expr::String(s))
            }

            Lexeme::Boolean(b) => {
                self.consume();
                Ok(Expr::Boolean(b))
            }

            Lexeme::LeftParen => {
                self.consume();
                let expr = self.parse_expression()?;
                self.expect(&Lexeme::RightParen)?;
                Ok(Expr::Paren(Box::new(expr)))
            }

            Lexeme::CellRef(ref_str) => {
                self.consume();
                let addr = CellAddress::parse(&ref_str).map_err(|e| {
                    FormulaError::InvalidReference(format!("'{}': {}", ref_str, e))
                })?;
                Ok(Expr::CellRef(addr))
            }

            Lexeme::Identifier(name) => {
                self.consume();
                if matches!(self.current(), Lexeme::LeftParen) {
                    self.parse_function_call(name.to_uppercase())
                } else {
                    Ok(Expr::NameRef(name))
                }
            }

            other => Err(FormulaError::Parse(format!(
                "Unexpected token: {:?}",
                other
            ))),
        }
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<Expr> {
        self.expect(&Lexeme::LeftParen)?;

        let mut args = Vec::new();

        if !matches!(self.current(), Lexeme::RightParen) {
            args.push(self.parse_expression()?);

            while matches!(self.current(), Lexeme::ArgSep) {
                self.consume();
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&Lexeme::RightParen)?;

        Ok(Expr::Call { name, args })
    }
}

/// Cell reference pattern: [$]letters[$]digits, nothing else
fn is_cell_reference(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    if chars.get(i) == Some(&'$') {
        i += 1;
    }

    let letter_start = i;
    while i < chars.len() && chars[i].is_ascii_alphabetic() {
        i += 1;
    }
    if i == letter_start {
        return false;
    }

    if chars.get(i) == Some(&'$') {
        i += 1;
    }

    let digit_start = i;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i == digit_start {
        return false;
    }

    i == chars.len()
}

/// Parse bare column letters with optional leading `$`: ("D", true for absolute)
fn parse_column_name(text: &str) -> Option<(u16, bool)> {
    let (absolute, letters) = match text.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    CellAddress::letters_to_column(letters)
        .ok()
        .map(|col| (col, absolute))
}
