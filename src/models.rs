// ==============================================================================
// models.rs - Pharmacogenomic Data Models
// ==============================================================================
// Description: Phenotype, risk and result records shared by the pipeline
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::explanation::Explanation;

/// CPIC metabolizer phenotype category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phenotype {
    /// Poor Metabolizer
    #[serde(rename = "PM")]
    Poor,
    /// Intermediate Metabolizer
    #[serde(rename = "IM")]
    Intermediate,
    /// Normal Metabolizer
    #[serde(rename = "NM")]
    Normal,
    /// Rapid Metabolizer
    #[serde(rename = "RM")]
    Rapid,
    /// Ultrarapid Metabolizer
    #[serde(rename = "URM")]
    Ultrarapid,
    /// No phenotype could be assigned
    Unknown,
}

impl Phenotype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phenotype::Poor => "PM",
            Phenotype::Intermediate => "IM",
            Phenotype::Normal => "NM",
            Phenotype::Rapid => "RM",
            Phenotype::Ultrarapid => "URM",
            Phenotype::Unknown => "Unknown",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Phenotype::Poor => "Poor Metabolizer",
            Phenotype::Intermediate => "Intermediate Metabolizer",
            Phenotype::Normal => "Normal Metabolizer",
            Phenotype::Rapid => "Rapid Metabolizer",
            Phenotype::Ultrarapid => "Ultrarapid Metabolizer",
            Phenotype::Unknown => "Unknown Metabolizer Status",
        }
    }
}

/// Clinical risk classification for a drug/phenotype pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLabel {
    Safe,
    #[serde(rename = "Adjust Dosage")]
    AdjustDosage,
    Toxic,
    Ineffective,
    Unknown,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Safe => "Safe",
            RiskLabel::AdjustDosage => "Adjust Dosage",
            RiskLabel::Toxic => "Toxic",
            RiskLabel::Ineffective => "Ineffective",
            RiskLabel::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// CPIC level of evidence backing a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvidenceLevel {
    A,
    B,
    C,
}

impl EvidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceLevel::A => "A",
            EvidenceLevel::B => "B",
            EvidenceLevel::C => "C",
        }
    }
}

/// Functional consequence of a star allele
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantImpact {
    NoFunction,
    Decreased,
    Normal,
    Increased,
}

impl VariantImpact {
    /// CPIC activity value conventionally assigned to this impact class
    pub fn activity_value(&self) -> f64 {
        match self {
            VariantImpact::NoFunction => 0.0,
            VariantImpact::Decreased => 0.5,
            VariantImpact::Normal => 1.0,
            VariantImpact::Increased => 2.0,
        }
    }
}

/// Number of chromosome copies a variant call was observed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zygosity {
    Homozygous,
    Heterozygous,
    /// No genotype data; scored as a single affected allele
    Unknown,
}

impl Zygosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Zygosity::Homozygous => "homozygous",
            Zygosity::Heterozygous => "heterozygous",
            Zygosity::Unknown => "unknown",
        }
    }

    /// Alleles affected for activity scoring
    pub fn affected_alleles(&self) -> f64 {
        match self {
            Zygosity::Homozygous => 2.0,
            Zygosity::Heterozygous | Zygosity::Unknown => 1.0,
        }
    }
}

/// Static reference entry for an actionable pharmacogenomic variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownVariant {
    /// Gene symbol (e.g., "CYP2D6")
    pub gene: String,

    /// Star-allele name (e.g., "*4", "HapB3")
    pub star_allele: String,

    pub impact: VariantImpact,

    /// CPIC activity value (0, 0.5, 1.0 or 2.0)
    pub activity_value: f64,

    pub description: String,
}

/// A VCF call joined against the knowledge index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedVariant {
    /// Identifier the record matched on (rsID or gene-tagged allele)
    pub rsid: String,
    pub gene: String,
    pub star_allele: String,
    pub impact: VariantImpact,
    #[serde(skip)]
    pub activity_value: f64,
    pub zygosity: Zygosity,
}

/// Resolved phenotype for one gene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenePhenotype {
    pub gene: String,

    /// Clamped to [0.0, 4.0]
    pub activity_score: f64,

    pub phenotype: Phenotype,

    /// Display diplotype (e.g., "*1/*4")
    pub diplotype: String,

    /// Every detected call for the gene, in input order
    pub detected_variants: Vec<DetectedVariant>,

    /// More than two distinct alleles were seen at this diploid locus;
    /// only the first two appear in the diplotype
    pub ambiguous_diplotype: bool,
}

/// Clinical outcome attached to a (drug, phenotype) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub risk_label: RiskLabel,
    pub severity: Severity,
    pub recommendation: String,
    pub alternative_drugs: Vec<String>,
    pub monitoring_parameters: Vec<String>,
    pub evidence_level: EvidenceLevel,
}

impl Outcome {
    pub fn new(
        risk_label: RiskLabel,
        severity: Severity,
        recommendation: impl Into<String>,
        evidence_level: EvidenceLevel,
    ) -> Self {
        Self {
            risk_label,
            severity,
            recommendation: recommendation.into(),
            alternative_drugs: Vec::new(),
            monitoring_parameters: Vec::new(),
            evidence_level,
        }
    }

    pub fn with_alternatives(mut self, drugs: &[&str]) -> Self {
        self.alternative_drugs = drugs.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn with_monitoring(mut self, parameters: &[&str]) -> Self {
        self.monitoring_parameters = parameters.iter().map(|p| p.to_string()).collect();
        self
    }
}

/// Final per-drug record produced by the risk engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Normalized (trimmed, uppercased) drug name
    pub drug_name: String,
    pub gene: String,
    pub diplotype: String,
    pub phenotype: Phenotype,

    /// None when the drug has no knowledge-base entry
    pub activity_score: Option<f64>,

    #[serde(flatten)]
    pub outcome: Outcome,

    pub mechanism: String,
    pub confidence_score: f64,
    pub detected_variants: Vec<DetectedVariant>,
    pub ambiguous_diplotype: bool,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn risk_label(&self) -> RiskLabel {
        self.outcome.risk_label
    }

    pub fn severity(&self) -> Severity {
        self.outcome.severity
    }

    pub fn recommendation(&self) -> &str {
        &self.outcome.recommendation
    }
}

/// One drug entry of a full analysis report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedDrug {
    #[serde(flatten)]
    pub result: AnalysisResult,
    pub explanation: Explanation,
}

/// Parse and provenance metrics for an analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub vcf_parsing_success: bool,
    pub total_vcf_lines: usize,
    pub variants_parsed: usize,
    pub parse_errors: Vec<String>,
    pub processing_time_ms: u64,
    pub knowledge_base_version: String,
    pub guidelines_source: String,
}

/// Full analysis report for one VCF upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub report_id: Uuid,
    pub patient_id: String,
    pub timestamp: DateTime<Utc>,
    pub drugs_analyzed: Vec<String>,
    pub results: Vec<AnalyzedDrug>,
    pub quality_metrics: QualityMetrics,
}
