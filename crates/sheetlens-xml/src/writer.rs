//! Annotated XML export
//!
//! Writes each sheet as an XML table in which every formula cell carries
//! its source text and every plain cell that feeds formulas carries an
//! annotation listing those formulas in infix form. One file is written
//! per non-empty sheet.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use quick_xml::escape::escape;
use sheetlens_core::{CellAddress, CellValue, Workbook, Worksheet};
use sheetlens_formula::SheetGraph;

use crate::error::XmlResult;
use crate::format::format_value;

/// Substituted for a cell value whose display format cannot be applied
const FORMAT_ERROR_PLACEHOLDER: &str = "FORMAT ERROR";

/// Writes annotated XML for worksheets
pub struct XmlWriter;

impl XmlWriter {
    /// Write one XML file per non-empty sheet of the workbook
    ///
    /// Output files are named `<stem>.<sheet index>.xml` next to the
    /// given output path's stem. Returns the paths written.
    pub fn write_workbook_files(workbook: &Workbook, output: &Path) -> XmlResult<Vec<PathBuf>> {
        let stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("sheet");
        let dir = output.parent().unwrap_or_else(|| Path::new("."));

        let mut written = Vec::new();
        for (index, sheet) in workbook.worksheets().enumerate() {
            if sheet.is_empty() {
                log::debug!("skipping empty sheet '{}'", sheet.name());
                continue;
            }
            let path = dir.join(format!("{}.{}.xml", stem, index));
            let file = File::create(&path)?;
            Self::write_sheet(BufWriter::new(file), sheet)?;
            log::info!("wrote sheet '{}' to {}", sheet.name(), path.display());
            written.push(path);
        }
        Ok(written)
    }

    /// Write a single sheet as an annotated XML table
    pub fn write_sheet<W: Write>(mut writer: W, sheet: &Worksheet) -> XmlResult<()> {
        let graph = SheetGraph::build(sheet);

        writeln!(writer, "<?xml version='1.0' encoding='utf-8'?>")?;
        writeln!(
            writer,
            "<?xml-stylesheet type=\"text/xsl\" href=\"spreadsheet.xsl\"?>"
        )?;
        writeln!(writer, "<spreadsheets>")?;
        writeln!(writer, "<Table name=\"{}\">", escape(sheet.name()))?;

        if let Some((first_col, last_col)) = sheet.column_bounds() {
            Self::write_column_headers(&mut writer, first_col, last_col)?;
            for (row, _) in sheet.rows() {
                Self::write_row(&mut writer, sheet, &graph, row, first_col, last_col)?;
            }
        }

        writeln!(writer, "</Table>")?;
        writeln!(writer, "</spreadsheets>")?;
        Ok(())
    }

    fn write_column_headers<W: Write>(
        writer: &mut W,
        first_col: u16,
        last_col: u16,
    ) -> XmlResult<()> {
        writeln!(writer, "<ColumnHeaders>")?;
        writeln!(
            writer,
            "    <ColumnHeader>{}</ColumnHeader>",
            escape("RowID\\ColID")
        )?;
        for col in first_col..=last_col {
            writeln!(
                writer,
                "    <ColumnHeader>{}</ColumnHeader>",
                CellAddress::column_to_letters(col)
            )?;
        }
        writeln!(writer, "</ColumnHeaders>")?;
        Ok(())
    }

    fn write_row<W: Write>(
        writer: &mut W,
        sheet: &Worksheet,
        graph: &SheetGraph,
        row: u32,
        first_col: u16,
        last_col: u16,
    ) -> XmlResult<()> {
        writeln!(writer, "  <TableRow>")?;
        writeln!(writer, "    <RowHeader>{}</RowHeader>", row + 1)?;
        writeln!(writer, "  <TableCells>")?;

        for col in first_col..=last_col {
            let label = CellAddress::label(row, col);
            let cell = sheet.cell_at(row, col);

            let mut attrs = format!(" cellID=\".{}\"", label);

            match cell.map(|c| &c.value) {
                Some(CellValue::Formula { text, .. }) => {
                    let source = text.strip_prefix('=').unwrap_or(text);
                    attrs.push_str(" readOnly=\"readOnly\"");
                    attrs.push_str(&format!(" cellFormula=\"{}\"", escape(source)));
                }
                _ => {
                    // A plain cell referenced by formulas carries them
                    // as its annotation
                    if let Some(annotation) = graph.annotation_for(&label) {
                        attrs.push_str(&format!(" formula=\"{}\"", escape(&annotation)));
                    }
                }
            }

            let content = match cell {
                Some(cell) => Self::display_text(sheet, &label, cell),
                None => String::new(),
            };
            let content = escape(&content);
            writeln!(
                writer,
                "    <TableCell {} value_type=\"float\" value=\"{}\">{}</TableCell>",
                attrs, content, content
            )?;
        }

        writeln!(writer, " </TableCells> </TableRow>")?;
        writeln!(writer)?;
        Ok(())
    }

    /// Format a cell's effective value, substituting a placeholder when
    /// the display format cannot be applied. A bad format never aborts
    /// the sheet export.
    fn display_text(sheet: &Worksheet, label: &str, cell: &sheetlens_core::Cell) -> String {
        match format_value(&cell.format, cell.value.effective_value()) {
            Ok(text) => text,
            Err(err) => {
                log::warn!(
                    "cannot format cell {} of sheet '{}': {}",
                    label,
                    sheet.name(),
                    err
                );
                FORMAT_ERROR_PLACEHOLDER.to_string()
            }
        }
    }
}
