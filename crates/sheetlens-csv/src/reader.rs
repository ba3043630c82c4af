//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::CsvResult;
use crate::options::CsvReadOptions;
use sheetlens_core::{CellValue, Worksheet};

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a worksheet named after the file stem
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<Worksheet> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Sheet1".to_string());
        let file = File::open(path)?;
        Self::read_named(file, &name, options)
    }

    /// Read CSV from a reader into a worksheet
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<Worksheet> {
        Self::read_named(reader, "Sheet1", options)
    }

    /// Read CSV from a reader into a worksheet with the given name
    pub fn read_named<R: Read>(
        reader: R,
        name: &str,
        options: &CsvReadOptions,
    ) -> CsvResult<Worksheet> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut worksheet = Worksheet::new(name);

        for (row, result) in csv_reader.records().enumerate() {
            let record = result?;

            for (col, field) in record.iter().enumerate() {
                let value = Self::detect_value(field, options);
                if !value.is_empty() {
                    worksheet.set_value_at(row as u32, col as u16, value);
                }
            }
        }

        Ok(worksheet)
    }

    /// Classify one field
    fn detect_value(field: &str, options: &CsvReadOptions) -> CellValue {
        let field = field.trim();

        if field.is_empty() {
            return CellValue::Empty;
        }

        if options.detect_formulas && field.starts_with('=') {
            return CellValue::formula(field);
        }

        if !options.auto_detect_types {
            return CellValue::string(field);
        }

        match field.to_lowercase().as_str() {
            "true" | "yes" => return CellValue::Boolean(true),
            "false" | "no" => return CellValue::Boolean(false),
            _ => {}
        }

        if let Ok(n) = field.parse::<f64>() {
            return CellValue::Number(n);
        }

        CellValue::string(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_values_and_formulas() {
        let input = "1,2,=A1+B1\nhello,true,\n";
        let ws = CsvReader::read(input.as_bytes(), &CsvReadOptions::default()).unwrap();

        assert_eq!(ws.cell_at(0, 0).unwrap().value, CellValue::Number(1.0));
        assert_eq!(ws.cell_at(0, 1).unwrap().value, CellValue::Number(2.0));
        assert!(ws.is_formula_at(0, 2));
        assert_eq!(
            ws.cell_at(0, 2).unwrap().value.formula_text(),
            Some("=A1+B1")
        );
        assert_eq!(
            ws.cell_at(1, 0).unwrap().value,
            CellValue::String("hello".into())
        );
        assert_eq!(ws.cell_at(1, 1).unwrap().value, CellValue::Boolean(true));
        assert!(ws.cell_at(1, 2).is_none());
    }

    #[test]
    fn test_formula_detection_disabled() {
        let options = CsvReadOptions {
            detect_formulas: false,
            ..Default::default()
        };
        let ws = CsvReader::read("=A1".as_bytes(), &options).unwrap();
        assert!(!ws.is_formula_at(0, 0));
        assert_eq!(
            ws.cell_at(0, 0).unwrap().value,
            CellValue::String("=A1".into())
        );
    }

    #[test]
    fn test_read_file_names_sheet_from_stem() {
        use std::io::Write as _;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budget.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "10,20").unwrap();
        drop(file);

        let ws = CsvReader::read_file(&path, &CsvReadOptions::default()).unwrap();
        assert_eq!(ws.name(), "budget");
        assert_eq!(ws.cell_at(0, 1).unwrap().value, CellValue::Number(20.0));
    }

    #[test]
    fn test_ragged_rows_accepted() {
        let input = "1\n1,2,3\n";
        let ws = CsvReader::read(input.as_bytes(), &CsvReadOptions::default()).unwrap();
        assert_eq!(ws.column_bounds(), Some((0, 2)));
    }
}
