//! Cell value types

use std::fmt;

/// The value held by a cell
///
/// Formula cells keep their source text verbatim (including the leading
/// `=`) together with an optional cached result from whatever produced the
/// workbook; sheetlens never evaluates formulas itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell
    #[default]
    Empty,
    /// Numeric value
    Number(f64),
    /// Boolean value
    Boolean(bool),
    /// String value
    String(String),
    /// Formula with its source text and an optional cached result
    Formula {
        text: String,
        cached: Option<Box<CellValue>>,
    },
}

impl CellValue {
    /// Create a string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(s.into())
    }

    /// Create a formula value from source text
    pub fn formula<S: Into<String>>(text: S) -> Self {
        CellValue::Formula {
            text: text.into(),
            cached: None,
        }
    }

    /// Check if the value is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Check if the value is a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula { .. })
    }

    /// Get the formula source text, if this is a formula
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            CellValue::Formula { text, .. } => Some(text),
            _ => None,
        }
    }

    /// The value a reader should see: the cached result for formulas,
    /// otherwise the value itself
    pub fn effective_value(&self) -> &CellValue {
        match self {
            CellValue::Formula {
                cached: Some(v), ..
            } => v.effective_value(),
            other => other,
        }
    }

    /// Short name of the value type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Number(_) => "number",
            CellValue::Boolean(_) => "boolean",
            CellValue::String(_) => "string",
            CellValue::Formula { .. } => "formula",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Formula { text, .. } => write!(f, "{}", text),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_text() {
        let v = CellValue::formula("=A1+B2");
        assert!(v.is_formula());
        assert_eq!(v.formula_text(), Some("=A1+B2"));
        assert_eq!(CellValue::Number(1.0).formula_text(), None);
    }

    #[test]
    fn test_effective_value() {
        let v = CellValue::Formula {
            text: "=1+2".into(),
            cached: Some(Box::new(CellValue::Number(3.0))),
        };
        assert_eq!(v.effective_value(), &CellValue::Number(3.0));

        let bare = CellValue::formula("=1+2");
        assert!(bare.effective_value().is_formula());
    }
}
