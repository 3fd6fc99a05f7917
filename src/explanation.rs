// ==============================================================================
// explanation.rs - Clinical Explanation Generation
// ==============================================================================
// Description: Natural-language explanation for an analysis result, behind a
//              swappable generator trait with a templated implementation
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{NO_ACTIONABLE_MECHANISM, UNKNOWN_GENE};
use crate::models::{AnalysisResult, Phenotype, RiskLabel};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExplanationError {
    #[error("Explanation request is missing {0}")]
    InvalidRequest(&'static str),

    #[error("Explanation service unavailable: {0}")]
    Unavailable(String),

    #[error("Explanation service returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// Inputs an explanation is generated from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub drug_name: String,
    pub gene: String,
    pub phenotype: Phenotype,
    pub diplotype: String,
    pub risk_label: RiskLabel,
    pub mechanism: String,
    /// Detected star alleles, in detection order
    pub star_alleles: Vec<String>,
}

impl ExplanationRequest {
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            drug_name: result.drug_name.clone(),
            gene: result.gene.clone(),
            phenotype: result.phenotype,
            diplotype: result.diplotype.clone(),
            risk_label: result.risk_label(),
            mechanism: result.mechanism.clone(),
            star_alleles: result
                .detected_variants
                .iter()
                .map(|v| v.star_allele.clone())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub summary: String,
    pub mechanism: String,
    pub citations: Vec<String>,
}

/// Produces an explanation for one drug result
///
/// Implementations may call out to a hosted language model; callers treat
/// any error as "use the template instead".
pub trait ExplanationGenerator {
    fn explain(&self, request: &ExplanationRequest) -> Result<Explanation, ExplanationError>;
}

/// Deterministic templated explanations
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateExplainer;

impl TemplateExplainer {
    pub fn new() -> Self {
        Self
    }
}

impl ExplanationGenerator for TemplateExplainer {
    fn explain(&self, request: &ExplanationRequest) -> Result<Explanation, ExplanationError> {
        if request.drug_name.trim().is_empty() {
            return Err(ExplanationError::InvalidRequest("drug name"));
        }

        if request.gene == UNKNOWN_GENE {
            return Ok(Explanation {
                summary: format!(
                    "No pharmacogenomic guidance is available for {}.",
                    request.drug_name
                ),
                mechanism: NO_ACTIONABLE_MECHANISM.to_string(),
                citations: Vec::new(),
            });
        }

        let summary = format!(
            "The patient is a {} ({}) for {} with diplotype {}. Predicted risk for {}: {}.",
            request.phenotype.description(),
            request.phenotype.as_str(),
            request.gene,
            request.diplotype,
            request.drug_name,
            request.risk_label.as_str()
        );

        let base = if request.mechanism.trim().is_empty() {
            NO_ACTIONABLE_MECHANISM
        } else {
            request.mechanism.as_str()
        };
        let mechanism = if request.star_alleles.is_empty() {
            format!("{} No actionable {} variants were detected.", base, request.gene)
        } else {
            format!("{} Detected alleles: {}.", base, request.star_alleles.join(", "))
        };

        Ok(Explanation {
            summary,
            mechanism,
            citations: vec![
                format!("CPIC: {}–{}", request.gene, request.drug_name),
                format!("PharmGKB: {}", request.gene),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(gene: &str) -> ExplanationRequest {
        ExplanationRequest {
            drug_name: "CODEINE".to_string(),
            gene: gene.to_string(),
            phenotype: Phenotype::Poor,
            diplotype: "*4/*4".to_string(),
            risk_label: RiskLabel::Ineffective,
            mechanism: "CYP2D6 converts codeine to morphine.".to_string(),
            star_alleles: vec!["*4".to_string()],
        }
    }

    #[test]
    fn test_template_explanation() {
        let explanation = TemplateExplainer::new().explain(&request("CYP2D6")).unwrap();

        assert!(explanation.summary.contains("Poor Metabolizer (PM)"));
        assert!(explanation.summary.contains("*4/*4"));
        assert!(explanation.summary.contains("Ineffective"));
        assert!(explanation.mechanism.ends_with("Detected alleles: *4."));
        assert_eq!(
            explanation.citations,
            vec!["CPIC: CYP2D6–CODEINE", "PharmGKB: CYP2D6"]
        );
    }

    #[test]
    fn test_template_for_unknown_drug() {
        let mut req = request(UNKNOWN_GENE);
        req.drug_name = "ZZZNOTADRUG".to_string();

        let explanation = TemplateExplainer::new().explain(&req).unwrap();
        assert!(explanation.summary.contains("ZZZNOTADRUG"));
        assert_eq!(explanation.mechanism, NO_ACTIONABLE_MECHANISM);
        assert!(explanation.citations.is_empty());
    }

    #[test]
    fn test_template_rejects_missing_drug() {
        let mut req = request("CYP2D6");
        req.drug_name = " ".to_string();

        assert_eq!(
            TemplateExplainer::new().explain(&req),
            Err(ExplanationError::InvalidRequest("drug name"))
        );
    }
}
