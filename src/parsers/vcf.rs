// ==============================================================================
// parsers/vcf.rs - VCF text parser
// ==============================================================================
// Description: Line-oriented parser for pharmacogenomic VCF uploads
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// References:
// - VCF 4.2 Spec: https://samtools.github.io/hts-specs/VCFv4.2.pdf
// ==============================================================================
// Columns: CHROM POS ID REF ALT QUAL FILTER INFO [FORMAT SAMPLE]
// Malformed data lines are skipped and reported, never fatal.
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, info};

use crate::knowledge::VariantKnowledgeIndex;

/// Value stored for INFO flags that carry no `=value`
pub const FLAG_VALUE: &str = "true";

/// Patient identifier used when the header declares none
pub const DEFAULT_PATIENT_ID: &str = "PATIENT_001";

/// Minimum number of tab-separated columns in a data line
pub const MIN_COLUMNS: usize = 8;

/// INFO keys carrying a gene symbol
pub const GENE_KEYS: [&str; 2] = ["GENE", "Gene"];

/// INFO keys carrying a star-allele tag
pub const STAR_KEYS: [&str; 4] = ["STAR", "Star", "HAPLOTYPE", "Haplotype"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VcfParseError {
    #[error("VCF input is empty")]
    EmptyInput,

    #[error("Expected at least 8 tab-separated columns, found {0}")]
    TooFewColumns(usize),

    #[error("Invalid position value: '{0}' (must be an integer >= 1)")]
    InvalidPosition(String),
}

/// Key-value pairs from the INFO column
///
/// Ordered so that serialized records are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoMap(BTreeMap<String, String>);

impl InfoMap {
    /// Parse an INFO column (`KEY=VALUE;FLAG;...`)
    pub fn parse(field: &str) -> Self {
        let mut entries = BTreeMap::new();

        for segment in field.split(';') {
            let segment = segment.trim();
            if segment.is_empty() || segment == "." {
                continue;
            }

            match segment.split_once('=') {
                Some((key, value)) => {
                    entries.insert(key.to_string(), value.to_string());
                }
                None => {
                    entries.insert(segment.to_string(), FLAG_VALUE.to_string());
                }
            }
        }

        Self(entries)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn get_or_default<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// First non-empty value among `keys`
    pub fn get_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .find(|value| !value.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One genomic call from the VCF body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord {
    /// Chromosome name as written (e.g., "chr22", "10")
    pub chromosome: String,

    /// 1-based position
    pub position: u64,

    /// ID column value, or `chrom:position` when the column is '.'
    pub id: String,

    /// True when `id` was synthesized from the position
    pub synthetic_id: bool,

    pub reference_allele: String,

    pub alternate_allele: String,

    pub info: InfoMap,

    /// Raw GT value of the sample column (e.g., "0/1")
    pub genotype: Option<String>,
}

impl VariantRecord {
    /// rsIDs for knowledge-index lookup, in lookup order
    ///
    /// The INFO `RS=` tag comes first, then each `;`-separated entry of the
    /// ID column. A synthesized positional id never qualifies.
    pub fn rsid_candidates(&self) -> Vec<String> {
        let mut candidates = Vec::new();

        if let Some(rs) = self.info.get("RS").map(str::trim).filter(|rs| !rs.is_empty()) {
            candidates.push(if rs.to_ascii_lowercase().starts_with("rs") {
                format!("rs{}", &rs[2..])
            } else {
                format!("rs{}", rs)
            });
        }

        if !self.synthetic_id {
            for id in self.id.split(';').map(str::trim).filter(|id| !id.is_empty()) {
                if !candidates.iter().any(|c| c == id) {
                    candidates.push(id.to_string());
                }
            }
        }

        candidates
    }

    /// Preferred rsID: INFO `RS=` over the ID column
    pub fn rsid(&self) -> Option<String> {
        self.rsid_candidates().into_iter().next()
    }

    /// Gene symbol from INFO `GENE`
    pub fn gene_tag(&self) -> Option<&str> {
        self.info.get_any(&GENE_KEYS)
    }

    /// Star-allele tag from INFO `STAR` or `HAPLOTYPE`
    pub fn star_tag(&self) -> Option<&str> {
        self.info.get_any(&STAR_KEYS)
    }
}

/// Output of a parse run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcfParseResult {
    pub records: Vec<VariantRecord>,

    /// Non-empty lines seen, headers included
    pub total_lines: usize,

    /// One message per skipped data line
    pub parse_errors: Vec<String>,

    pub patient_id: String,
}

/// Summary of how much of a parsed file the knowledge index recognizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VcfStats {
    pub total_records: usize,
    pub genes_matched: usize,
    pub genes: Vec<String>,
    pub actionable_records: usize,
}

impl VcfParseResult {
    pub fn stats(&self, index: &VariantKnowledgeIndex) -> VcfStats {
        let mut genes = BTreeSet::new();
        let mut actionable_records = 0;

        for record in &self.records {
            if let Some((_, known)) = index.resolve(record) {
                genes.insert(known.gene.clone());
                actionable_records += 1;
            }
        }

        VcfStats {
            total_records: self.records.len(),
            genes_matched: genes.len(),
            genes: genes.into_iter().collect(),
            actionable_records,
        }
    }
}

/// Column positions learned from the `#CHROM` header
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ColumnLayout {
    format_index: Option<usize>,
    sample_index: Option<usize>,
}

impl ColumnLayout {
    fn from_header(line: &str) -> Self {
        let columns: Vec<&str> = line.trim_start_matches('#').split('\t').collect();
        let format_index = columns.iter().position(|&c| c == "FORMAT");
        let sample_index = format_index
            .map(|idx| idx + 1)
            .filter(|&idx| idx < columns.len());

        Self {
            format_index,
            sample_index,
        }
    }
}

/// VCF text parser
#[derive(Debug, Clone)]
pub struct VcfParser {
    /// Characters of an offending line quoted in its parse error
    pub error_prefix_len: usize,
}

impl Default for VcfParser {
    fn default() -> Self {
        Self {
            error_prefix_len: 50,
        }
    }
}

impl VcfParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error_prefix_len(mut self, len: usize) -> Self {
        self.error_prefix_len = len;
        self
    }

    /// Parse VCF text into variant records
    ///
    /// # Returns
    /// * `Ok(VcfParseResult)` - Records plus per-line errors for skipped lines
    /// * `Err(VcfParseError::EmptyInput)` - The text is empty or whitespace only
    ///
    /// # Example
    /// ```
    /// use pharmacogenomics_engine::parsers::VcfParser;
    ///
    /// let vcf = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
    ///            22\t42130692\trs3892097\tG\tA\t.\tPASS\tGENE=CYP2D6;STAR=*4\n";
    /// let result = VcfParser::new().parse(vcf)?;
    /// assert_eq!(result.records.len(), 1);
    /// # Ok::<(), pharmacogenomics_engine::parsers::VcfParseError>(())
    /// ```
    pub fn parse(&self, text: &str) -> Result<VcfParseResult, VcfParseError> {
        if text.trim().is_empty() {
            return Err(VcfParseError::EmptyInput);
        }

        let mut records = Vec::new();
        let mut parse_errors = Vec::new();
        let mut patient_id = DEFAULT_PATIENT_ID.to_string();
        let mut layout = ColumnLayout::default();
        let mut total_lines = 0;

        for (line_num, raw_line) in text.split('\n').enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            total_lines += 1;

            if line.starts_with("##SAMPLE") || line.starts_with("##patient") {
                if let Some(id) = extract_header_id(line) {
                    patient_id = id;
                }
                continue;
            }

            if line.starts_with("##") {
                continue;
            }

            if line.starts_with("#CHROM") {
                layout = ColumnLayout::from_header(line);
                debug!("Column header: {:?}", layout);
                continue;
            }

            match self.parse_record(line, &layout) {
                Ok(record) => records.push(record),
                Err(e) => {
                    debug!("Skipping line {}: {}", line_num + 1, e);
                    parse_errors.push(format!(
                        "Skipped malformed line {} ({}): {}",
                        line_num + 1,
                        e,
                        truncate(line, self.error_prefix_len)
                    ));
                }
            }
        }

        info!(
            "Parsed {} variant records from {} lines ({} skipped)",
            records.len(),
            total_lines,
            parse_errors.len()
        );

        Ok(VcfParseResult {
            records,
            total_lines,
            parse_errors,
            patient_id,
        })
    }

    /// Parse a single data line
    fn parse_record(&self, line: &str, layout: &ColumnLayout) -> Result<VariantRecord, VcfParseError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < MIN_COLUMNS {
            return Err(VcfParseError::TooFewColumns(fields.len()));
        }

        let chromosome = fields[0].to_string();
        let position = fields[1]
            .parse::<u64>()
            .ok()
            .filter(|&pos| pos >= 1)
            .ok_or_else(|| VcfParseError::InvalidPosition(fields[1].to_string()))?;

        let (id, synthetic_id) = match fields[2] {
            "." | "" => (format!("{}:{}", chromosome, position), true),
            id => (id.to_string(), false),
        };

        Ok(VariantRecord {
            chromosome,
            position,
            id,
            synthetic_id,
            reference_allele: fields[3].to_string(),
            alternate_allele: fields[4].to_string(),
            info: InfoMap::parse(fields[7]),
            genotype: extract_genotype(&fields, layout),
        })
    }
}

/// Read the GT value of the sample column using the FORMAT key order
fn extract_genotype(fields: &[&str], layout: &ColumnLayout) -> Option<String> {
    let format = fields.get(layout.format_index?)?;
    let sample = fields.get(layout.sample_index?)?;

    let gt_index = format.split(':').position(|key| key == "GT")?;
    sample
        .split(':')
        .nth(gt_index)
        .filter(|gt| !gt.is_empty())
        .map(str::to_string)
}

/// `ID=` value from a structured header line such as `##SAMPLE=<ID=P1,...>`
fn extract_header_id(line: &str) -> Option<String> {
    let start = line.find("ID=")? + 3;
    let rest = &line[start..];
    let end = rest.find([',', '>']).unwrap_or(rest.len());
    let id = rest[..end].trim();

    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

fn truncate(line: &str, max_chars: usize) -> String {
    line.chars().take(max_chars).collect()
}
