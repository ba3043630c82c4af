//! Sheetlens CLI - annotated spreadsheet XML export

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sheetlens::prelude::*;
use sheetlens::{compile, render_tokens};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sheetlens")]
#[command(
    author,
    version,
    about = "Spreadsheet formula analysis and annotated XML export"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a spreadsheet as annotated XML, one file per sheet
    #[command(alias = "xml")]
    Export {
        /// Input spreadsheet file (csv)
        input: PathBuf,

        /// Output path stem (default: derived from the input file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show information about a spreadsheet
    Info {
        /// Input spreadsheet file
        input: PathBuf,
    },

    /// Render a single formula to its display form
    Render {
        /// Formula source text, e.g. '=SUM(A1:A3)*2'
        formula: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Export { input, output } => export(&input, output.as_deref()),
        Commands::Info { input } => show_info(&input),
        Commands::Render { formula } => render(&formula),
    }
}

fn export(input: &Path, output: Option<&Path>) -> Result<()> {
    let workbook =
        Workbook::open(input).with_context(|| format!("Failed to open '{}'", input.display()))?;

    let output = output.map(Path::to_path_buf).unwrap_or_else(|| {
        let mut path = input.to_path_buf();
        path.set_extension("xml");
        path
    });

    let written = XmlWriter::write_workbook_files(&workbook, &output)
        .with_context(|| format!("Failed to write XML to '{}'", output.display()))?;

    if written.is_empty() {
        eprintln!("Warning: workbook has no non-empty sheets, nothing written");
    }
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

fn show_info(input: &Path) -> Result<()> {
    let workbook =
        Workbook::open(input).with_context(|| format!("Failed to open '{}'", input.display()))?;

    println!("File: {}", input.display());
    println!("Sheets: {}", workbook.sheet_count());

    for (index, sheet) in workbook.worksheets().enumerate() {
        let cells: usize = sheet.rows().map(|(_, row)| row.len()).sum();
        let formulas = sheet.formula_cells().count();
        let columns = match sheet.column_bounds() {
            Some((first, last)) => format!(
                "{}..{}",
                CellAddress::column_to_letters(first),
                CellAddress::column_to_letters(last)
            ),
            None => "-".to_string(),
        };
        println!(
            "  [{}] {}: {} cells, {} formulas, columns {}",
            index,
            sheet.name(),
            cells,
            formulas,
            columns
        );
    }
    Ok(())
}

fn render(formula: &str) -> Result<()> {
    let tokens = compile(formula).with_context(|| format!("Failed to parse '{}'", formula))?;
    let text = render_tokens(&tokens).context("Failed to render formula")?;
    println!("{}", text);
    Ok(())
}
