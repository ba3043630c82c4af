//! Number format codes for cell display

/// Display format for a cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,

    /// Built-in format by ID
    BuiltIn(u32),

    /// Custom format string
    Custom(String),
}

impl NumberFormat {
    /// 1 - 0
    pub const ID_NUMBER_INT: u32 = 1;
    /// 2 - 0.00
    pub const ID_NUMBER_DEC2: u32 = 2;
    /// 3 - #,##0
    pub const ID_NUMBER_SEP: u32 = 3;
    /// 4 - #,##0.00
    pub const ID_NUMBER_SEP_DEC2: u32 = 4;
    /// 9 - 0%
    pub const ID_PERCENT_INT: u32 = 9;
    /// 10 - 0.00%
    pub const ID_PERCENT_DEC2: u32 = 10;
    /// 11 - 0.00E+00
    pub const ID_SCIENTIFIC: u32 = 11;
    /// 14 - mm-dd-yy
    pub const ID_DATE_SHORT: u32 = 14;
    /// 22 - m/d/yy h:mm
    pub const ID_DATETIME: u32 = 22;
    /// 49 - @
    pub const ID_TEXT: u32 = 49;

    /// Create a number format from a format string
    ///
    /// Recognizes the built-in format codes and maps them back to their IDs;
    /// anything else becomes a custom format.
    pub fn from_code(code: &str) -> Self {
        if code.is_empty() || code.eq_ignore_ascii_case("general") {
            return NumberFormat::General;
        }
        match Self::id_for_code(code) {
            Some(id) => NumberFormat::BuiltIn(id),
            None => NumberFormat::Custom(code.to_string()),
        }
    }

    /// Get the format string
    pub fn format_string(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::BuiltIn(id) => Self::builtin_format_string(*id),
            NumberFormat::Custom(s) => s,
        }
    }

    /// Get built-in format string by ID
    fn builtin_format_string(id: u32) -> &'static str {
        match id {
            0 => "General",
            1 => "0",
            2 => "0.00",
            3 => "#,##0",
            4 => "#,##0.00",
            9 => "0%",
            10 => "0.00%",
            11 => "0.00E+00",
            14 => "mm-dd-yy",
            15 => "d-mmm-yy",
            16 => "d-mmm",
            17 => "mmm-yy",
            18 => "h:mm AM/PM",
            19 => "h:mm:ss AM/PM",
            20 => "h:mm",
            21 => "h:mm:ss",
            22 => "m/d/yy h:mm",
            49 => "@",
            _ => "General",
        }
    }

    fn id_for_code(code: &str) -> Option<u32> {
        let id = match code {
            "0" => 1,
            "0.00" => 2,
            "#,##0" => 3,
            "#,##0.00" => 4,
            "0%" => 9,
            "0.00%" => 10,
            "0.00E+00" => 11,
            "mm-dd-yy" => 14,
            "d-mmm-yy" => 15,
            "d-mmm" => 16,
            "mmm-yy" => 17,
            "h:mm AM/PM" => 18,
            "h:mm:ss AM/PM" => 19,
            "h:mm" => 20,
            "h:mm:ss" => 21,
            "m/d/yy h:mm" => 22,
            "@" => 49,
            _ => return None,
        };
        Some(id)
    }

    /// Check if this is a date/time format
    pub fn is_date_format(&self) -> bool {
        match self {
            NumberFormat::BuiltIn(id) => matches!(id, 14..=22),
            NumberFormat::Custom(s) => {
                // Heuristic: contains date/time placeholders but no quoted text
                let lower = s.to_lowercase();
                (lower.contains('y')
                    || lower.contains('m')
                    || lower.contains('d')
                    || lower.contains('h')
                    || lower.contains('s'))
                    && !lower.contains('"')
            }
            NumberFormat::General => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(NumberFormat::from_code(""), NumberFormat::General);
        assert_eq!(NumberFormat::from_code("General"), NumberFormat::General);
        assert_eq!(NumberFormat::from_code("0.00"), NumberFormat::BuiltIn(2));
        assert_eq!(
            NumberFormat::from_code("0.000"),
            NumberFormat::Custom("0.000".into())
        );
    }

    #[test]
    fn test_is_date_format() {
        assert!(NumberFormat::BuiltIn(14).is_date_format());
        assert!(NumberFormat::BuiltIn(22).is_date_format());
        assert!(!NumberFormat::BuiltIn(2).is_date_format());
        assert!(NumberFormat::Custom("yyyy-mm-dd".into()).is_date_format());
        assert!(!NumberFormat::Custom("0.000".into()).is_date_format());
    }
}
