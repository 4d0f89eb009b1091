//! Table and CSV rendering of reconciled blob rows.

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use ollama_inspect_core::{Column, Report, Row, SizeUnit};
use std::io::{self, Write};
use std::path::PathBuf;

pub const EMPTY_MESSAGE: &str = "No blobs found.";

const SEPARATOR: &str = "  ";

/// Whether an output destination is an interactive terminal.
pub trait Terminal {
    fn is_interactive(&self) -> bool;
}

impl Terminal for io::Stdout {
    fn is_interactive(&self) -> bool {
        self.is_tty()
    }
}

/// Writes rows as an aligned text table.
pub struct TablePresenter<'a> {
    columns: &'a [Column],
    emphasis: bool,
}

impl<'a> TablePresenter<'a> {
    /// Emphasis is used only when color is wanted and `terminal` is interactive.
    pub fn new(columns: &'a [Column], color: bool, terminal: &dyn Terminal) -> Self {
        Self {
            columns,
            emphasis: color && terminal.is_interactive(),
        }
    }

    pub fn emphasis(&self) -> bool {
        self.emphasis
    }

    pub fn render<W: Write>(&self, out: &mut W, rows: &[&Row]) -> io::Result<()> {
        if rows.is_empty() {
            return writeln!(out, "{EMPTY_MESSAGE}");
        }

        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| self.columns.iter().map(|&c| row.cell(c)).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                cells
                    .iter()
                    .map(|line| line[i].chars().count())
                    .chain(std::iter::once(column.name().len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(column, &width)| pad(column.name(), width))
            .collect::<Vec<_>>()
            .join(SEPARATOR);

        if self.emphasis {
            writeln!(out, "{}", header.as_str().white().bold())?;
        } else {
            writeln!(out, "{header}")?;
        }
        writeln!(out, "{}", "-".repeat(header.chars().count()))?;

        for (row, line) in rows.iter().zip(&cells) {
            let highlight = self.emphasis && row.is_orphan();
            let parts: Vec<String> = line
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| {
                    let padded = pad(cell, width);
                    if highlight {
                        padded.red().to_string()
                    } else {
                        padded
                    }
                })
                .collect();
            writeln!(out, "{}", parts.join(SEPARATOR))?;
        }

        Ok(())
    }
}

fn pad(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

/// One-line totals for the whole report.
pub fn summary(report: &Report, unit: SizeUnit) -> String {
    format!(
        "{} blobs, {} orphaned ({} total, {} reclaimable)",
        report.rows.len(),
        report.orphan_count(),
        unit.format(report.total_bytes()),
        unit.format(report.orphan_bytes()),
    )
}

/// Where CSV output goes: `-` or an empty string mean standard output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvTarget {
    Stdout,
    File(PathBuf),
}

impl CsvTarget {
    pub fn parse(target: &str) -> Self {
        match target {
            "" | "-" => CsvTarget::Stdout,
            path => CsvTarget::File(PathBuf::from(path)),
        }
    }

    /// Write the rows, truncating the target file if there is one.
    pub fn write(&self, rows: &[&Row], columns: &[Column]) -> Result<()> {
        match self {
            CsvTarget::Stdout => write_csv(io::stdout().lock(), rows, columns),
            CsvTarget::File(path) => {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                write_csv(file, rows, columns)
            }
        }
    }
}

/// Header record followed by one record per row, selected columns only.
pub fn write_csv<W: Write>(out: W, rows: &[&Row], columns: &[Column]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(columns.iter().map(Column::name))?;
    for row in rows {
        writer.write_record(columns.iter().map(|&c| row.cell(c)))?;
    }
    writer.flush()?;
    Ok(())
}
