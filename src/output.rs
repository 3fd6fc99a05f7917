// ==============================================================================
// output.rs - Report Output Generation
// ==============================================================================
// Description: Writes analysis reports as pretty JSON or one-row-per-drug CSV
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

use crate::models::{AnalysisReport, AnalyzedDrug, DetectedVariant};

pub const CSV_COLUMNS: [&str; 11] = [
    "drug_name",
    "gene",
    "diplotype",
    "phenotype",
    "activity_score",
    "risk_label",
    "severity",
    "evidence_level",
    "confidence_score",
    "recommendation",
    "detected_variants",
];

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Unsupported output format: {0} (expected json or csv)")]
    UnknownFormat(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supported report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Full nested report
    #[default]
    Json,
    /// Flat per-drug table for spreadsheets
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }

    /// MIME type for HTTP downloads
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::Csv => "text/csv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(OutputError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    drug_name: &'a str,
    gene: &'a str,
    diplotype: &'a str,
    phenotype: &'static str,
    activity_score: Option<f64>,
    risk_label: &'static str,
    severity: &'static str,
    evidence_level: &'static str,
    confidence_score: f64,
    recommendation: &'a str,
    detected_variants: String,
}

impl<'a> From<&'a AnalyzedDrug> for CsvRow<'a> {
    fn from(entry: &'a AnalyzedDrug) -> Self {
        let result = &entry.result;
        Self {
            drug_name: &result.drug_name,
            gene: &result.gene,
            diplotype: &result.diplotype,
            phenotype: result.phenotype.as_str(),
            activity_score: result.activity_score,
            risk_label: result.risk_label().as_str(),
            severity: result.severity().as_str(),
            evidence_level: result.outcome.evidence_level.as_str(),
            confidence_score: result.confidence_score,
            recommendation: result.recommendation(),
            detected_variants: format_variants(&result.detected_variants),
        }
    }
}

/// `rsid|star|zygosity` entries joined with ';'
fn format_variants(variants: &[DetectedVariant]) -> String {
    variants
        .iter()
        .map(|v| format!("{}|{}|{}", v.rsid, v.star_allele, v.zygosity.as_str()))
        .collect::<Vec<_>>()
        .join(";")
}

/// Write a report to any writer
pub fn write_report<W: Write>(
    report: &AnalysisReport,
    format: OutputFormat,
    writer: W,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Json => write_json(report, writer),
        OutputFormat::Csv => write_csv(report, writer),
    }
}

/// Write a report to `path`, creating or truncating the file
pub fn write_report_file(
    report: &AnalysisReport,
    format: OutputFormat,
    path: &Path,
) -> Result<PathBuf, OutputError> {
    info!("Generating {} output: {:?}", format.extension(), path);

    let mut writer = BufWriter::new(File::create(path)?);
    write_report(report, format, &mut writer)?;
    writer.flush()?;

    info!(
        "{} output complete: {} drug result(s)",
        format.extension(),
        report.results.len()
    );

    Ok(path.to_path_buf())
}

fn write_json<W: Write>(report: &AnalysisReport, mut writer: W) -> Result<(), OutputError> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    Ok(())
}

fn write_csv<W: Write>(report: &AnalysisReport, writer: W) -> Result<(), OutputError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(CSV_COLUMNS)?;
    for entry in &report.results {
        csv_writer.serialize(CsvRow::from(entry))?;
    }
    csv_writer.flush()?;

    Ok(())
}
