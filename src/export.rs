//! CSV output of the result table.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::{MarginBasis, ScreenRow};
use crate::screener::ResultTable;

pub const FULL_FILE_NAME: &str = "r3000_rule_of_40.csv";
pub const SCREENED_FILE_NAME: &str = "r3000_rule_of_40_ge40.csv";

/// Column headers, in [`OutputRow`] field order
pub const HEADERS: [&str; 7] = [
    "Ticker",
    "Name",
    "Growth YoY % (TTM)",
    "Adjusted Op Margin % (TTM)",
    "GAAP Op Margin % (TTM)",
    "Rule of 40 Score",
    "Margin Basis Used",
];

/// One output line; absent values serialize as empty cells
#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    ticker: &'a str,
    name: &'a str,
    growth_yoy_pct: Option<f64>,
    adj_op_margin_pct: Option<f64>,
    gaap_op_margin_pct: Option<f64>,
    rule40_score: Option<f64>,
    margin_basis: Option<MarginBasis>,
}

impl<'a> From<&'a ScreenRow> for OutputRow<'a> {
    fn from(row: &'a ScreenRow) -> Self {
        Self {
            ticker: &row.entry.symbol,
            name: &row.entry.name,
            growth_yoy_pct: row.metrics.growth_yoy_pct,
            adj_op_margin_pct: row.metrics.adj_op_margin_pct,
            gaap_op_margin_pct: row.metrics.gaap_op_margin_pct,
            rule40_score: row.metrics.rule40_score,
            margin_basis: row.metrics.margin_basis,
        }
    }
}

/// Write rows with a header line, even when there are no rows
pub fn write_rows<'a, W, I>(writer: W, rows: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a ScreenRow>,
{
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(HEADERS)?;
    for row in rows {
        csv_writer.serialize(OutputRow::from(row))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Paths of the files written by [`write_outputs`]
#[derive(Debug, Clone)]
pub struct OutputFiles {
    pub full: PathBuf,
    pub screened: PathBuf,
    pub screened_count: usize,
}

/// Write the full table and the `>= min_score` view into `dir`
pub fn write_outputs(dir: &Path, table: &ResultTable, min_score: f64) -> Result<OutputFiles> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let full = dir.join(FULL_FILE_NAME);
    let file = std::fs::File::create(&full)
        .with_context(|| format!("creating {}", full.display()))?;
    write_rows(file, table.rows())?;

    let screened_rows = table.screened(min_score);
    let screened = dir.join(SCREENED_FILE_NAME);
    let file = std::fs::File::create(&screened)
        .with_context(|| format!("creating {}", screened.display()))?;
    write_rows(file, screened_rows.iter().copied())?;

    Ok(OutputFiles {
        full,
        screened,
        screened_count: screened_rows.len(),
    })
}
