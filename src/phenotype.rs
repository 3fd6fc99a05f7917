// ==============================================================================
// phenotype.rs - Activity Score and Phenotype Resolution
// ==============================================================================
// Description: Converts the detected variants of one gene into a CPIC-style
//              activity score, metabolizer phenotype and diplotype label
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Algorithm:
//   score = 2.0 (two normal alleles)
//   for each distinct star allele (first occurrence only):
//       score += (activity_value - 1.0) * affected_alleles(zygosity)
//   score = clamp(score, 0.0, 4.0)
//
// Thresholds:
//   CYP2D6, CYP2C19: 0 → PM, ≤1.0 → IM, ≤2.0 → NM, ≤2.5 → RM, >2.5 → URM
//   other genes:     0 → PM, <2.0 → IM, ≥2.0 → NM
// ==============================================================================

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::models::{DetectedVariant, GenePhenotype, Phenotype, Zygosity};

/// Activity score of two fully functional alleles
pub const BASELINE_ACTIVITY_SCORE: f64 = 2.0;

pub const MAX_ACTIVITY_SCORE: f64 = 4.0;

/// Reference allele shown for the unaffected copy in a diplotype
pub const REFERENCE_ALLELE: &str = "*1";

/// Genes whose CPIC guidelines define rapid and ultrarapid categories
const EXTENDED_SCALE_GENES: [&str; 2] = ["CYP2D6", "CYP2C19"];

/// Score-to-phenotype scale used for a gene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhenotypeScale {
    /// PM / IM / NM / RM / URM
    Extended,
    /// PM / IM / NM
    Standard,
}

impl PhenotypeScale {
    pub fn for_gene(gene: &str) -> Self {
        if EXTENDED_SCALE_GENES
            .iter()
            .any(|g| g.eq_ignore_ascii_case(gene.trim()))
        {
            PhenotypeScale::Extended
        } else {
            PhenotypeScale::Standard
        }
    }

    pub fn classify(&self, score: f64) -> Phenotype {
        if score <= 0.0 {
            return Phenotype::Poor;
        }

        match self {
            PhenotypeScale::Extended => {
                if score <= 1.0 {
                    Phenotype::Intermediate
                } else if score <= 2.0 {
                    Phenotype::Normal
                } else if score <= 2.5 {
                    Phenotype::Rapid
                } else {
                    Phenotype::Ultrarapid
                }
            }
            PhenotypeScale::Standard => {
                if score < 2.0 {
                    Phenotype::Intermediate
                } else {
                    Phenotype::Normal
                }
            }
        }
    }
}

/// Resolves a gene's phenotype from its detected variants
#[derive(Debug, Clone, Copy, Default)]
pub struct PhenotypeResolver;

impl PhenotypeResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve one gene
    ///
    /// A gene with no detected variants resolves to the baseline score and
    /// `NM`, whether or not the input covered it.
    pub fn resolve(&self, gene: &str, detected: &[DetectedVariant]) -> GenePhenotype {
        let distinct = distinct_alleles(detected);

        let raw_score = distinct.iter().fold(BASELINE_ACTIVITY_SCORE, |score, variant| {
            score + (variant.activity_value - 1.0) * variant.zygosity.affected_alleles()
        });
        let activity_score = raw_score.clamp(0.0, MAX_ACTIVITY_SCORE);
        let phenotype = PhenotypeScale::for_gene(gene).classify(activity_score);

        let ambiguous_diplotype = distinct.len() > 2;
        if ambiguous_diplotype {
            warn!(
                "{}: {} distinct alleles at a diploid locus; diplotype shows the first two",
                gene,
                distinct.len()
            );
        }

        debug!(
            "{}: score {:.2} (raw {:.2}) → {}",
            gene,
            activity_score,
            raw_score,
            phenotype.as_str()
        );

        GenePhenotype {
            gene: gene.to_string(),
            activity_score,
            phenotype,
            diplotype: diplotype_label(&distinct),
            detected_variants: detected.to_vec(),
            ambiguous_diplotype,
        }
    }
}

/// First occurrence of each star allele, in input order
fn distinct_alleles(detected: &[DetectedVariant]) -> Vec<&DetectedVariant> {
    let mut seen = HashSet::new();
    let mut distinct = Vec::new();

    for variant in detected {
        if seen.insert(variant.star_allele.as_str()) {
            distinct.push(variant);
        }
    }

    distinct
}

fn diplotype_label(distinct: &[&DetectedVariant]) -> String {
    match distinct {
        [] => format!("{0}/{0}", REFERENCE_ALLELE),
        [only] if only.zygosity == Zygosity::Homozygous => {
            format!("{0}/{0}", only.star_allele)
        }
        [only] => format!("{}/{}", REFERENCE_ALLELE, only.star_allele),
        [first, second, ..] => format!("{}/{}", first.star_allele, second.star_allele),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VariantImpact;

    fn variant(star: &str, impact: VariantImpact, zygosity: Zygosity) -> DetectedVariant {
        DetectedVariant {
            rsid: format!("rs_{}", star),
            gene: "CYP2D6".to_string(),
            star_allele: star.to_string(),
            impact,
            activity_value: impact.activity_value(),
            zygosity,
        }
    }

    #[test]
    fn test_no_variants_is_baseline_normal() {
        for gene in ["CYP2D6", "CYP2C9", "TPMT"] {
            let resolved = PhenotypeResolver::new().resolve(gene, &[]);
            assert_eq!(resolved.activity_score, 2.0);
            assert_eq!(resolved.phenotype, Phenotype::Normal);
            assert_eq!(resolved.diplotype, "*1/*1");
            assert!(!resolved.ambiguous_diplotype);
        }
    }

    #[test]
    fn test_homozygous_no_function() {
        let detected = vec![variant("*4", VariantImpact::NoFunction, Zygosity::Homozygous)];
        let resolved = PhenotypeResolver::new().resolve("CYP2D6", &detected);

        assert_eq!(resolved.activity_score, 0.0);
        assert_eq!(resolved.phenotype, Phenotype::Poor);
        assert_eq!(resolved.diplotype, "*4/*4");
    }

    #[test]
    fn test_heterozygous_and_unknown_count_one_allele() {
        let het = vec![variant("*2", VariantImpact::NoFunction, Zygosity::Heterozygous)];
        let resolved = PhenotypeResolver::new().resolve("CYP2C19", &het);
        assert_eq!(resolved.activity_score, 1.0);
        assert_eq!(resolved.phenotype, Phenotype::Intermediate);
        assert_eq!(resolved.diplotype, "*1/*2");

        let unknown = vec![variant("*2", VariantImpact::NoFunction, Zygosity::Unknown)];
        let resolved = PhenotypeResolver::new().resolve("CYP2C19", &unknown);
        assert_eq!(resolved.activity_score, 1.0);
        assert_eq!(resolved.diplotype, "*1/*2");
    }

    #[test]
    fn test_score_clamped_at_zero() {
        let detected = vec![
            variant("*3", VariantImpact::NoFunction, Zygosity::Homozygous),
            variant("*4", VariantImpact::NoFunction, Zygosity::Homozygous),
            variant("*6", VariantImpact::NoFunction, Zygosity::Homozygous),
        ];
        let resolved = PhenotypeResolver::new().resolve("GENEX", &detected);

        assert_eq!(resolved.activity_score, 0.0);
        assert_eq!(resolved.phenotype, Phenotype::Poor);
        assert_eq!(resolved.diplotype, "*3/*4");
        assert!(resolved.ambiguous_diplotype);
        assert_eq!(resolved.detected_variants.len(), 3);
    }

    #[test]
    fn test_score_clamped_at_four() {
        let detected = vec![
            variant("*17", VariantImpact::Increased, Zygosity::Homozygous),
            variant("*xN", VariantImpact::Increased, Zygosity::Homozygous),
        ];
        let resolved = PhenotypeResolver::new().resolve("CYP2C19", &detected);

        assert_eq!(resolved.activity_score, 4.0);
        assert_eq!(resolved.phenotype, Phenotype::Ultrarapid);
    }

    #[test]
    fn test_duplicate_allele_counted_once() {
        let detected = vec![
            variant("*41", VariantImpact::Decreased, Zygosity::Heterozygous),
            variant("*41", VariantImpact::Decreased, Zygosity::Homozygous),
        ];
        let resolved = PhenotypeResolver::new().resolve("CYP2D6", &detected);

        assert_eq!(resolved.activity_score, 1.5);
        assert_eq!(resolved.diplotype, "*1/*41");
        assert_eq!(resolved.detected_variants.len(), 2);
    }

    #[test]
    fn test_extended_scale_thresholds() {
        let scale = PhenotypeScale::for_gene("cyp2d6");
        assert_eq!(scale, PhenotypeScale::Extended);
        assert_eq!(scale.classify(0.0), Phenotype::Poor);
        assert_eq!(scale.classify(0.5), Phenotype::Intermediate);
        assert_eq!(scale.classify(1.0), Phenotype::Intermediate);
        assert_eq!(scale.classify(1.5), Phenotype::Normal);
        assert_eq!(scale.classify(2.0), Phenotype::Normal);
        assert_eq!(scale.classify(2.5), Phenotype::Rapid);
        assert_eq!(scale.classify(3.0), Phenotype::Ultrarapid);
    }

    #[test]
    fn test_standard_scale_has_no_rapid_categories() {
        let scale = PhenotypeScale::for_gene("SLCO1B1");
        assert_eq!(scale, PhenotypeScale::Standard);
        assert_eq!(scale.classify(0.0), Phenotype::Poor);
        assert_eq!(scale.classify(1.5), Phenotype::Intermediate);
        assert_eq!(scale.classify(2.0), Phenotype::Normal);
        assert_eq!(scale.classify(4.0), Phenotype::Normal);
    }

    #[test]
    fn test_two_distinct_alleles() {
        let detected = vec![
            variant("*4", VariantImpact::NoFunction, Zygosity::Heterozygous),
            variant("*10", VariantImpact::Decreased, Zygosity::Heterozygous),
        ];
        let resolved = PhenotypeResolver::new().resolve("CYP2D6", &detected);

        assert_eq!(resolved.activity_score, 0.5);
        assert_eq!(resolved.phenotype, Phenotype::Intermediate);
        assert_eq!(resolved.diplotype, "*4/*10");
        assert!(!resolved.ambiguous_diplotype);
    }
}
