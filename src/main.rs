// ==============================================================================
// main.rs - Pharmacogenomics Engine Entry Point
// ==============================================================================
// Description: Command-line entry point: validate a VCF, assess drug risk,
//              write the report
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pharmacogenomics_engine::audit::{AuditEvent, AuditEventType, AuditSink, TracingAuditSink};
use pharmacogenomics_engine::output::{write_report, write_report_file, OutputFormat};
use pharmacogenomics_engine::processor::PharmacogenomicsProcessor;
use pharmacogenomics_engine::validator::{parse_drug_list, InputValidator};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// VCF file to analyze (.vcf, .vcf.gz or .txt)
    #[arg(long, env = "PGX_VCF")]
    vcf: PathBuf,

    /// Comma-separated drug names (e.g., CODEINE,WARFARIN)
    #[arg(short, long, env = "PGX_DRUGS")]
    drugs: String,

    /// Report format (json or csv)
    #[arg(short, long, env = "PGX_FORMAT", default_value = "json")]
    format: OutputFormat,

    /// Output file (stdout when omitted)
    #[arg(short, long, env = "PGX_OUTPUT")]
    output: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json_logs: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pharmacogenomics_engine=info,audit=info".into());

    // Logs go to stderr so stdout carries only the report
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    info!("Pharmacogenomics engine starting...");

    let drugs = parse_drug_list(&args.drugs).context("Invalid --drugs value")?;

    let input = match InputValidator::new().load(&args.vcf) {
        Ok(input) => input,
        Err(e) => {
            warn!("Input rejected: {:#}", e);
            TracingAuditSink.record(AuditEvent::new(
                AuditEventType::InputRejected,
                None,
                Some(args.vcf.display().to_string()),
                serde_json::json!({ "reason": format!("{:#}", e) }),
            ));
            return Err(e);
        }
    };
    info!(
        "Loaded {} ({} bytes, sha256 {})",
        input.file_name, input.size, input.sha256
    );

    let report = PharmacogenomicsProcessor::builtin()
        .analyze(&input.text, drugs.as_slice())
        .context("Analysis failed")?;

    match &args.output {
        Some(path) => {
            write_report_file(&report, args.format, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report {} written to {:?}", report.report_id, path);
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            write_report(&report, args.format, &mut handle).context("Failed to write report")?;
            handle.flush()?;
        }
    }

    Ok(())
}
