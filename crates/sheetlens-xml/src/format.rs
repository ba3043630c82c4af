//! Display formatting of cell values
//!
//! Applies a cell's format code to its raw value, producing the display
//! text emitted into the XML export. Covers the built-in numeric,
//! percent, scientific, text and date/time codes; unsupported custom
//! codes fail and the writer substitutes a diagnostic placeholder.

use crate::error::{XmlError, XmlResult};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use sheetlens_core::{CellValue, NumberFormat};

/// Render a value with its display format
///
/// The value should already be the effective one (a formula's cached
/// result); a formula without a cached result displays as empty.
pub fn format_value(format: &NumberFormat, value: &CellValue) -> XmlResult<String> {
    match value {
        CellValue::Empty => Ok(String::new()),
        CellValue::Boolean(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
        CellValue::String(s) => Ok(s.clone()),
        CellValue::Formula { .. } => Ok(String::new()),
        CellValue::Number(n) => format_number(format, *n),
    }
}

fn format_number(format: &NumberFormat, n: f64) -> XmlResult<String> {
    match format {
        NumberFormat::General => Ok(general(n)),
        NumberFormat::BuiltIn(id) => format_builtin(*id, n),
        NumberFormat::Custom(code) => format_custom(code, n),
    }
}

fn format_builtin(id: u32, n: f64) -> XmlResult<String> {
    let text = match id {
        0 => general(n),
        NumberFormat::ID_NUMBER_INT => format!("{:.0}", n),
        NumberFormat::ID_NUMBER_DEC2 => format!("{:.2}", n),
        NumberFormat::ID_NUMBER_SEP => group_thousands(&format!("{:.0}", n)),
        NumberFormat::ID_NUMBER_SEP_DEC2 => group_thousands(&format!("{:.2}", n)),
        NumberFormat::ID_PERCENT_INT => format!("{:.0}%", n * 100.0),
        NumberFormat::ID_PERCENT_DEC2 => format!("{:.2}%", n * 100.0),
        NumberFormat::ID_SCIENTIFIC => scientific(n),
        14..=22 => return format_serial_date(id, n),
        NumberFormat::ID_TEXT => general(n),
        other => {
            return Err(XmlError::Format(format!(
                "unsupported built-in format id {}",
                other
            )))
        }
    };
    Ok(text)
}

/// General format: integral values lose the trailing ".0"
fn general(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn scientific(n: f64) -> String {
    if n == 0.0 {
        return "0.00E+00".to_string();
    }
    let mut exp = n.abs().log10().floor() as i32;
    let mut mantissa = n / 10f64.powi(exp);
    // Rounding the mantissa to two places can carry into a new digit
    if format!("{:.2}", mantissa.abs()).starts_with("10") {
        mantissa /= 10.0;
        exp += 1;
    }
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{:.2}E{}{:02}", mantissa, sign, exp.abs())
}

/// Insert thousands separators into a plain decimal string
fn group_thousands(text: &str) -> String {
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let (int_part, frac_part) = match rest.find('.') {
        Some(dot) => (&rest[..dot], &rest[dot..]),
        None => (rest, ""),
    };

    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}{}{}", sign, grouped, frac_part)
}

fn format_serial_date(id: u32, serial: f64) -> XmlResult<String> {
    let dt = serial_to_datetime(serial).ok_or_else(|| {
        XmlError::Format(format!("value {} is not a valid date serial", serial))
    })?;

    let pattern = match id {
        14 => "%m-%d-%y",
        15 => "%-d-%b-%y",
        16 => "%-d-%b",
        17 => "%b-%y",
        18 => "%-I:%M %p",
        19 => "%-I:%M:%S %p",
        20 => "%-H:%M",
        21 => "%-H:%M:%S",
        22 => "%-m/%-d/%y %-H:%M",
        _ => unreachable!("caller matched 14..=22"),
    };

    Ok(dt.format(pattern).to_string())
}

/// Excel serial date: days since 1899-12-30, fraction is time of day
fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.floor();
    let seconds = ((serial - days) * 86_400.0).round() as i64;
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = base.checked_add_signed(Duration::days(days as i64))?;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::seconds(seconds))
}

/// Minimal custom-pattern support: digit/percent patterns like "0.000" or
/// "#,##0.0%". Anything else is rejected.
fn format_custom(code: &str, n: f64) -> XmlResult<String> {
    if code.is_empty() || !code.chars().all(|c| matches!(c, '0' | '#' | ',' | '.' | '%')) {
        return Err(XmlError::Format(format!(
            "unsupported format code '{}'",
            code
        )));
    }

    let percent = code.ends_with('%');
    let n = if percent { n * 100.0 } else { n };
    let decimals = match code.find('.') {
        Some(dot) => code[dot + 1..]
            .chars()
            .take_while(|c| matches!(c, '0' | '#'))
            .count(),
        None => 0,
    };

    let mut text = format!("{:.*}", decimals, n);
    if code.contains(',') {
        text = group_thousands(&text);
    }
    if percent {
        text.push('%');
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn num(format: NumberFormat, n: f64) -> String {
        format_value(&format, &CellValue::Number(n)).unwrap()
    }

    #[test]
    fn test_general() {
        assert_eq!(num(NumberFormat::General, 42.0), "42");
        assert_eq!(num(NumberFormat::General, 3.14), "3.14");
        assert_eq!(num(NumberFormat::General, -7.0), "-7");
    }

    #[test]
    fn test_builtin_numeric() {
        assert_eq!(num(NumberFormat::BuiltIn(1), 3.7), "4");
        assert_eq!(num(NumberFormat::BuiltIn(2), 3.5), "3.50");
        assert_eq!(num(NumberFormat::BuiltIn(3), 1234567.0), "1,234,567");
        assert_eq!(num(NumberFormat::BuiltIn(4), -1234.5), "-1,234.50");
    }

    #[test]
    fn test_percent() {
        assert_eq!(num(NumberFormat::BuiltIn(9), 0.25), "25%");
        assert_eq!(num(NumberFormat::BuiltIn(10), 0.1234), "12.34%");
    }

    #[test]
    fn test_scientific() {
        assert_eq!(num(NumberFormat::BuiltIn(11), 0.0), "0.00E+00");
        assert_eq!(num(NumberFormat::BuiltIn(11), 1234.0), "1.23E+03");
        assert_eq!(num(NumberFormat::BuiltIn(11), 0.00123), "1.23E-03");
        assert_eq!(num(NumberFormat::BuiltIn(11), 9.999), "1.00E+01");
    }

    #[test]
    fn test_date_serials() {
        // Serial 1 is 1899-12-31; 25569 is 1970-01-01
        assert_eq!(num(NumberFormat::BuiltIn(14), 25569.0), "01-01-70");
        assert_eq!(num(NumberFormat::BuiltIn(22), 25569.5), "1/1/70 12:00");
        assert_eq!(num(NumberFormat::BuiltIn(21), 0.75), "18:00:00");
    }

    #[test]
    fn test_invalid_date_serial_fails() {
        let result = format_value(&NumberFormat::BuiltIn(14), &CellValue::Number(-1.0));
        assert!(matches!(result, Err(XmlError::Format(_))));
    }

    #[test]
    fn test_custom_patterns() {
        assert_eq!(num(NumberFormat::Custom("0.000".into()), 1.5), "1.500");
        assert_eq!(num(NumberFormat::Custom("#,##0.0%".into()), 0.125), "12.5%");
    }

    #[test]
    fn test_unsupported_custom_fails() {
        let result = format_value(
            &NumberFormat::Custom("[Red]0.00".into()),
            &CellValue::Number(1.0),
        );
        assert!(matches!(result, Err(XmlError::Format(_))));
    }

    #[test]
    fn test_non_numeric_values() {
        let fmt = NumberFormat::General;
        assert_eq!(format_value(&fmt, &CellValue::Empty).unwrap(), "");
        assert_eq!(format_value(&fmt, &CellValue::Boolean(true)).unwrap(), "TRUE");
        assert_eq!(
            format_value(&fmt, &CellValue::String("hi".into())).unwrap(),
            "hi"
        );
        // A formula with no cached result has nothing to display
        assert_eq!(
            format_value(&fmt, &CellValue::formula("=A1")).unwrap(),
            ""
        );
    }
}
