// ==============================================================================
// validator.rs - Input File Validation
// ==============================================================================
// Description: Validates and loads uploaded VCF files (size, type, format)
//              and the requested drug list
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// Security: Allowlist-only file types, magic number verification
// ==============================================================================

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::knowledge::normalize_drug_name;

const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MB

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, PartialEq)]
pub struct InputLimits {
    pub max_file_size: u64,
    /// Lowercase extensions without the leading dot
    pub allowed_extensions: Vec<String>,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            allowed_extensions: vec!["vcf".to_string(), "vcf.gz".to_string(), "txt".to_string()],
        }
    }
}

/// A VCF upload that passed validation, decompressed to text
#[derive(Debug)]
pub struct ValidatedInput {
    pub file_name: String,
    pub extension: String,
    /// Size on disk in bytes (compressed size for .vcf.gz)
    pub size: u64,
    pub sha256: String,
    pub text: String,
    pub validated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Default)]
pub struct InputValidator {
    limits: InputLimits,
}

impl InputValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: InputLimits) -> Self {
        Self { limits }
    }

    /// Validate a VCF file and read it into memory
    pub fn load(&self, file_path: &Path) -> Result<ValidatedInput> {
        let file_name = file_path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid file path"))?
            .to_string_lossy()
            .to_string();

        info!("Validating file: {}", file_name);

        // 1. Size check
        let metadata = std::fs::metadata(file_path)
            .with_context(|| format!("Failed to get metadata for {}", file_path.display()))?;
        let size = metadata.len();

        if size > self.limits.max_file_size {
            anyhow::bail!(
                "File too large: {} bytes (max: {} bytes)",
                size,
                self.limits.max_file_size
            );
        }
        debug!("Size check passed: {} bytes", size);

        // 2. Extension check (allowlist)
        let safe_name = sanitize_filename(&file_name)?;
        let ext = get_extension(&safe_name)?;
        if !self.limits.allowed_extensions.contains(&ext) {
            anyhow::bail!("Invalid file type: .{} (expected .vcf or .vcf.gz)", ext);
        }
        debug!("Extension check passed: {}", ext);

        let mut raw = Vec::with_capacity(size as usize);
        File::open(file_path)
            .and_then(|mut file| file.read_to_end(&mut raw))
            .context("Failed to read input file")?;

        // 3. Magic number verification and decompression
        let text = if ext == "vcf.gz" {
            if !raw.starts_with(&GZIP_MAGIC) {
                anyhow::bail!("Magic number mismatch for .{} file", ext);
            }
            debug!("Magic number check passed");
            decompress(&raw, self.limits.max_file_size)?
        } else {
            std::str::from_utf8(&raw)
                .context("Input file is not valid UTF-8 text")?
                .to_string()
        };

        // 4. Content validation
        validate_vcf_content(&text)?;
        debug!("Content validation passed");

        // 5. Compute SHA-256 hash
        let sha256 = format!("{:x}", Sha256::digest(&raw));
        debug!("SHA-256: {}", sha256);

        Ok(ValidatedInput {
            file_name,
            extension: ext,
            size,
            sha256,
            text,
            validated_at: chrono::Utc::now(),
        })
    }
}

/// Split a comma-separated drug list into normalized names
///
/// # Examples
/// ```
/// use pharmacogenomics_engine::validator::parse_drug_list;
///
/// let drugs = parse_drug_list(" codeine, Warfarin ,,").unwrap();
/// assert_eq!(drugs, vec!["CODEINE", "WARFARIN"]);
/// assert!(parse_drug_list(" , ").is_err());
/// ```
pub fn parse_drug_list(list: &str) -> Result<Vec<String>> {
    let drugs: Vec<String> = list
        .split(',')
        .map(normalize_drug_name)
        .filter(|drug| !drug.is_empty())
        .collect();

    if drugs.is_empty() {
        anyhow::bail!("No drugs provided for analysis");
    }

    Ok(drugs)
}

/// Inflate gzip input, refusing to produce more than `limit` bytes
fn decompress(raw: &[u8], limit: u64) -> Result<String> {
    let mut inflated = Vec::new();
    GzDecoder::new(raw)
        .take(limit.saturating_add(1))
        .read_to_end(&mut inflated)
        .context("Failed to decompress gzip input")?;

    if inflated.len() as u64 > limit {
        anyhow::bail!(
            "File too large: decompressed size exceeds {} bytes",
            limit
        );
    }

    String::from_utf8(inflated).context("Decompressed input is not valid UTF-8 text")
}

/// The text must look like VCF: an INFO column header or a tab-separated data line
fn validate_vcf_content(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("VCF file is empty");
    }

    let has_header = text
        .lines()
        .any(|line| line.starts_with("#CHROM") && line.contains("INFO"));
    let has_data = text
        .lines()
        .any(|line| !line.starts_with('#') && line.contains('\t'));

    if !has_header && !has_data {
        anyhow::bail!("Invalid VCF format: no column header or tab-separated data lines");
    }

    Ok(())
}

fn sanitize_filename(name: &str) -> Result<String> {
    // Remove path separators, null bytes, control characters
    let safe = name
        .replace(['/', '\\', '\0'], "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.' || *c == '-')
        .take(255)
        .collect::<String>();

    if safe.is_empty() {
        anyhow::bail!("Invalid filename after sanitization");
    }

    Ok(safe)
}

fn get_extension(filename: &str) -> Result<String> {
    let lower = filename.to_lowercase();

    // Handle compound extension .vcf.gz
    if lower.ends_with(".vcf.gz") {
        return Ok("vcf.gz".to_string());
    }

    match lower.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Ok(ext.to_string()),
        _ => anyhow::bail!("No file extension found"),
    }
}
