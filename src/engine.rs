// ==============================================================================
// engine.rs - Risk Assessment Engine
// ==============================================================================
// Description: Joins parsed VCF records, knowledge tables and phenotype
//              resolution into one clinical outcome per requested drug
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Flow (per drug, in request order):
//   normalize name → DrugRuleTable → gene → detected variants → phenotype
//   → outcome (Unknown fallback) → confidence → AnalysisResult
// Unknown drugs yield an Unknown-risk result; they never fail the batch.
// ==============================================================================

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::genotype_converter::genotype_to_zygosity;
use crate::knowledge::{normalize_drug_name, DrugRuleTable, VariantKnowledgeIndex};
use crate::models::{
    AnalysisResult, DetectedVariant, EvidenceLevel, Outcome, Phenotype, RiskLabel, Severity,
};
use crate::parsers::{VariantRecord, VcfParseError, VcfParser};
use crate::phenotype::PhenotypeResolver;

/// Gene reported for drugs missing from the rule table
pub const UNKNOWN_GENE: &str = "Unknown";

/// Diplotype reported for drugs missing from the rule table
pub const UNKNOWN_DIPLOTYPE: &str = "N/A";

pub const NO_ACTIONABLE_MECHANISM: &str =
    "No clinically actionable pharmacogenomic variant detected for this drug-gene pair.";

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] VcfParseError),
}

/// Heuristic confidence constants
///
/// Only the monotonic relationship (more evidence → higher confidence) is a
/// contract; the values themselves are tunable.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidencePolicy {
    pub base: f64,
    /// At least one variant detected for the gene
    pub detected_bonus: f64,
    /// More than `multiple_variants_threshold` variants detected
    pub multiple_variants_bonus: f64,
    pub multiple_variants_threshold: usize,
    /// Phenotype resolved to something other than Unknown
    pub resolved_phenotype_bonus: f64,
    /// Total input records exceed `input_size_threshold`
    pub input_size_bonus: f64,
    pub input_size_threshold: usize,
    pub cap: f64,
    /// Fixed score for drugs missing from the rule table
    pub unknown_drug: f64,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            base: 0.5,
            detected_bonus: 0.2,
            multiple_variants_bonus: 0.1,
            multiple_variants_threshold: 2,
            resolved_phenotype_bonus: 0.1,
            input_size_bonus: 0.1,
            input_size_threshold: 5,
            cap: 0.98,
            unknown_drug: 0.1,
        }
    }
}

impl ConfidencePolicy {
    pub fn score(&self, detected: usize, phenotype: Phenotype, total_records: usize) -> f64 {
        let mut score = self.base;

        if detected > 0 {
            score += self.detected_bonus;
        }
        if detected > self.multiple_variants_threshold {
            score += self.multiple_variants_bonus;
        }
        if phenotype != Phenotype::Unknown {
            score += self.resolved_phenotype_bonus;
        }
        if total_records > self.input_size_threshold {
            score += self.input_size_bonus;
        }

        score.min(self.cap)
    }
}

/// Per-drug risk assessment over injected knowledge tables
pub struct RiskAssessmentEngine<'k> {
    index: &'k VariantKnowledgeIndex,
    rules: &'k DrugRuleTable,
    resolver: PhenotypeResolver,
    policy: ConfidencePolicy,
}

impl<'k> RiskAssessmentEngine<'k> {
    pub fn new(index: &'k VariantKnowledgeIndex, rules: &'k DrugRuleTable) -> Self {
        Self {
            index,
            rules,
            resolver: PhenotypeResolver::new(),
            policy: ConfidencePolicy::default(),
        }
    }

    pub fn with_confidence_policy(mut self, policy: ConfidencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn index(&self) -> &'k VariantKnowledgeIndex {
        self.index
    }

    pub fn rules(&self) -> &'k DrugRuleTable {
        self.rules
    }

    /// Assess every drug, stamping all results with the current time
    pub fn assess<S: AsRef<str>>(
        &self,
        records: &[VariantRecord],
        drug_names: &[S],
    ) -> Vec<AnalysisResult> {
        self.assess_at(records, drug_names, Utc::now())
    }

    /// Assess every drug with a caller-supplied timestamp
    ///
    /// Output order and length follow `drug_names`.
    pub fn assess_at<S: AsRef<str>>(
        &self,
        records: &[VariantRecord],
        drug_names: &[S],
        timestamp: DateTime<Utc>,
    ) -> Vec<AnalysisResult> {
        info!(
            "Assessing {} drug(s) against {} variant record(s)",
            drug_names.len(),
            records.len()
        );

        drug_names
            .iter()
            .map(|name| self.assess_drug(records, name.as_ref(), timestamp))
            .collect()
    }

    fn assess_drug(
        &self,
        records: &[VariantRecord],
        drug_name: &str,
        timestamp: DateTime<Utc>,
    ) -> AnalysisResult {
        let drug = normalize_drug_name(drug_name);

        let Some(rule) = self.rules.lookup(&drug) else {
            warn!("No drug rule for {}; reporting Unknown risk", drug);
            return self.unknown_drug_result(drug, timestamp);
        };

        let detected = self.detect_variants(records, &rule.gene);
        let resolved = self.resolver.resolve(&rule.gene, &detected);
        let outcome = rule.outcome_for(resolved.phenotype).clone();
        let confidence_score = self
            .policy
            .score(detected.len(), resolved.phenotype, records.len());

        debug!(
            "{} / {}: {} {} → {} (confidence {:.2})",
            drug,
            rule.gene,
            resolved.diplotype,
            resolved.phenotype.as_str(),
            outcome.risk_label.as_str(),
            confidence_score
        );

        AnalysisResult {
            drug_name: drug,
            gene: resolved.gene,
            diplotype: resolved.diplotype,
            phenotype: resolved.phenotype,
            activity_score: Some(resolved.activity_score),
            outcome,
            mechanism: rule.mechanism.clone(),
            confidence_score,
            detected_variants: resolved.detected_variants,
            ambiguous_diplotype: resolved.ambiguous_diplotype,
            timestamp,
        }
    }

    fn unknown_drug_result(&self, drug: String, timestamp: DateTime<Utc>) -> AnalysisResult {
        let recommendation = format!(
            "No pharmacogenomic data available for {}. Follow standard prescribing guidelines.",
            drug
        );

        AnalysisResult {
            drug_name: drug,
            gene: UNKNOWN_GENE.to_string(),
            diplotype: UNKNOWN_DIPLOTYPE.to_string(),
            phenotype: Phenotype::Unknown,
            activity_score: None,
            outcome: Outcome::new(
                RiskLabel::Unknown,
                Severity::None,
                recommendation,
                EvidenceLevel::C,
            ),
            mechanism: NO_ACTIONABLE_MECHANISM.to_string(),
            confidence_score: self.policy.unknown_drug,
            detected_variants: Vec::new(),
            ambiguous_diplotype: false,
            timestamp,
        }
    }

    /// Records that resolve to `gene` and are carried by the sample, in input order
    ///
    /// Reference-only genotypes (`0/0`) are dropped; records without a
    /// genotype are kept with unknown zygosity.
    pub fn detect_variants(&self, records: &[VariantRecord], gene: &str) -> Vec<DetectedVariant> {
        records
            .iter()
            .filter_map(|record| {
                let (key, known) = self.index.resolve(record)?;
                if !known.gene.eq_ignore_ascii_case(gene) {
                    return None;
                }

                let Some(zygosity) = genotype_to_zygosity(record.genotype.as_deref()) else {
                    debug!("{} is reference-only in the sample; not carried", key);
                    return None;
                };

                Some(DetectedVariant {
                    rsid: key,
                    gene: known.gene.clone(),
                    star_allele: known.star_allele.clone(),
                    impact: known.impact,
                    activity_value: known.activity_value,
                    zygosity,
                })
            })
            .collect()
    }
}

impl RiskAssessmentEngine<'static> {
    /// Engine over the embedded CPIC tables
    pub fn builtin() -> Self {
        Self::new(VariantKnowledgeIndex::builtin(), DrugRuleTable::builtin())
    }
}

/// Parse VCF text and assess each drug against the built-in tables
///
/// # Returns
/// * `Ok(results)` - One result per drug, in request order
/// * `Err(EngineError::InvalidArgument)` - The VCF text is empty
///
/// # Example
/// ```
/// use pharmacogenomics_engine::assess_pharmacogenomic_risk;
///
/// let vcf = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
///            22\t42130692\trs3892097\tG\tA\t.\tPASS\tGENE=CYP2D6\tGT\t1/1\n";
/// let results = assess_pharmacogenomic_risk(vcf, &["codeine"])?;
/// assert_eq!(results[0].diplotype, "*4/*4");
/// # Ok::<(), pharmacogenomics_engine::EngineError>(())
/// ```
pub fn assess_pharmacogenomic_risk<S: AsRef<str>>(
    vcf_text: &str,
    drug_names: &[S],
) -> Result<Vec<AnalysisResult>, EngineError> {
    let parsed = VcfParser::new().parse(vcf_text)?;
    Ok(RiskAssessmentEngine::builtin().assess(&parsed.records, drug_names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{KnownVariant, VariantImpact, Zygosity};

    const HEADER: &str = "##fileformat=VCFv4.2\n\
        #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE1\n";

    fn parse(body: &str) -> Vec<VariantRecord> {
        VcfParser::new()
            .parse(&format!("{}{}", HEADER, body))
            .unwrap()
            .records
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_codeine_poor_metabolizer() {
        let records = parse("22\t42130692\trs3892097\tG\tA\t.\tPASS\tGENE=CYP2D6\tGT\t1/1\n");
        let results = RiskAssessmentEngine::builtin().assess(&records, &["CODEINE"]);

        let result = &results[0];
        assert_eq!(result.gene, "CYP2D6");
        assert_eq!(result.activity_score, Some(0.0));
        assert_eq!(result.phenotype, Phenotype::Poor);
        assert_eq!(result.diplotype, "*4/*4");
        assert!(matches!(
            result.risk_label(),
            RiskLabel::Ineffective | RiskLabel::Toxic
        ));
        assert_eq!(result.detected_variants[0].zygosity, Zygosity::Homozygous);
    }

    #[test]
    fn test_warfarin_without_variants_is_normal() {
        let results = RiskAssessmentEngine::builtin().assess(&[], &["warfarin"]);

        assert_eq!(results[0].drug_name, "WARFARIN");
        assert_eq!(results[0].phenotype, Phenotype::Normal);
        assert_eq!(results[0].risk_label(), RiskLabel::Safe);
        assert_eq!(results[0].diplotype, "*1/*1");
        // base + resolved phenotype
        assert!(approx(results[0].confidence_score, 0.6));
    }

    #[test]
    fn test_mixed_batch_with_unknown_drug() {
        let records = parse("10\t94781859\trs4244285\tG\tA\t.\tPASS\t.\tGT\t0/1\n");
        let results =
            RiskAssessmentEngine::builtin().assess(&records, &["CLOPIDOGREL", "UNKNOWNDRUG"]);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].gene, "CYP2C19");
        assert_eq!(results[0].phenotype, Phenotype::Intermediate);
        assert_eq!(results[0].diplotype, "*1/*2");

        let unknown = &results[1];
        assert_eq!(unknown.drug_name, "UNKNOWNDRUG");
        assert_eq!(unknown.risk_label(), RiskLabel::Unknown);
        assert_eq!(unknown.phenotype, Phenotype::Unknown);
        assert_eq!(unknown.gene, UNKNOWN_GENE);
        assert_eq!(unknown.activity_score, None);
        assert!(unknown.detected_variants.is_empty());
        assert!(approx(unknown.confidence_score, 0.1));
        assert!(unknown.recommendation().contains("UNKNOWNDRUG"));
    }

    #[test]
    fn test_reference_only_call_not_detected() {
        let records = parse("22\t42130692\trs3892097\tG\tA\t.\tPASS\t.\tGT\t0/0\n");
        let engine = RiskAssessmentEngine::builtin();

        assert!(engine.detect_variants(&records, "CYP2D6").is_empty());
        assert_eq!(engine.assess(&records, &["CODEINE"])[0].phenotype, Phenotype::Normal);
    }

    #[test]
    fn test_missing_genotype_counts_one_allele() {
        let vcf = "22\t42130692\trs3892097\tG\tA\t.\tPASS\tGENE=CYP2D6\n";
        let records = VcfParser::new().parse(vcf).unwrap().records;
        let results = RiskAssessmentEngine::builtin().assess(&records, &["CODEINE"]);

        assert_eq!(results[0].detected_variants[0].zygosity, Zygosity::Unknown);
        assert_eq!(results[0].activity_score, Some(1.0));
        assert_eq!(results[0].phenotype, Phenotype::Intermediate);
        assert_eq!(results[0].diplotype, "*1/*4");
    }

    #[test]
    fn test_detect_variants_filters_by_gene() {
        let records = parse(
            "22\t42130692\trs3892097\tG\tA\t.\tPASS\t.\tGT\t0/1\n\
             10\t94781859\trs4244285\tG\tA\t.\tPASS\t.\tGT\t0/1\n\
             22\t42126611\t.\tC\tG\t.\tPASS\tGENE=CYP2D6;STAR=41\tGT\t0/1\n",
        );
        let detected = RiskAssessmentEngine::builtin().detect_variants(&records, "CYP2D6");

        assert_eq!(detected.len(), 2);
        assert_eq!(detected[0].rsid, "rs3892097");
        assert_eq!(detected[1].rsid, "CYP2D6:*41");
    }

    #[test]
    fn test_confidence_policy_monotonic() {
        let policy = ConfidencePolicy::default();

        let none = policy.score(0, Phenotype::Normal, 0);
        let one = policy.score(1, Phenotype::Normal, 1);
        let many = policy.score(3, Phenotype::Normal, 3);
        let large_input = policy.score(3, Phenotype::Normal, 10);

        assert!(none < one && one < many && many < large_input);
        assert!(approx(large_input, 0.98));
        assert!(approx(policy.score(0, Phenotype::Unknown, 0), 0.5));
    }

    #[test]
    fn test_substitute_tables_and_policy() {
        let index = VariantKnowledgeIndex::from_entries(vec![(
            "rs42",
            KnownVariant {
                gene: "GENEX".to_string(),
                star_allele: "*9".to_string(),
                impact: VariantImpact::NoFunction,
                activity_value: 0.0,
                description: String::new(),
            },
        )]);
        let rules = DrugRuleTable::from_rules(vec![crate::knowledge::DrugRule::new(
            "Testdrug",
            "GENEX",
            "Test mechanism",
            Outcome::new(RiskLabel::Unknown, Severity::None, "Unknown", EvidenceLevel::C),
        )
        .with_outcome(
            Phenotype::Poor,
            Outcome::new(RiskLabel::Toxic, Severity::Critical, "Avoid", EvidenceLevel::A),
        )]);
        let policy = ConfidencePolicy {
            cap: 0.5,
            ..ConfidencePolicy::default()
        };

        let records = parse("1\t100\trs42\tA\tT\t.\tPASS\t.\tGT\t1/1\n");
        let engine = RiskAssessmentEngine::new(&index, &rules).with_confidence_policy(policy);
        let results = engine.assess(&records, &["testdrug", "codeine"]);

        assert_eq!(results[0].risk_label(), RiskLabel::Toxic);
        assert_eq!(results[0].severity(), Severity::Critical);
        assert!(approx(results[0].confidence_score, 0.5));
        assert_eq!(results[1].risk_label(), RiskLabel::Unknown);
    }

    #[test]
    fn test_shared_timestamp() {
        let ts = Utc::now();
        let results = RiskAssessmentEngine::builtin().assess_at(&[], &["CODEINE", "NOPE"], ts);
        assert!(results.iter().all(|r| r.timestamp == ts));
    }

    #[test]
    fn test_empty_vcf_is_invalid_argument() {
        let err = assess_pharmacogenomic_risk("  \n", &["CODEINE"]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidArgument(VcfParseError::EmptyInput)
        ));
    }
}
