// ==============================================================================
// knowledge/drugs.rs - Drug Rule Table
// ==============================================================================
// Description: Drug → gene → phenotype → clinical outcome rules
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Sources: CPIC guidelines (2024) for codeine, warfarin, clopidogrel,
//          simvastatin, azathioprine and fluorouracil
// ==============================================================================

use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::models::{EvidenceLevel, Outcome, Phenotype, RiskLabel, Severity};

pub const KNOWLEDGE_BASE_VERSION: &str = "2024.1";
pub const GUIDELINES_SOURCE: &str = "CPIC 2024";

static BUILTIN_RULES: OnceLock<DrugRuleTable> = OnceLock::new();

/// Single-gene risk rule for one drug
///
/// The `Unknown` outcome is mandatory at construction, so a lookup for any
/// phenotype always yields an outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrugRule {
    /// Display name (e.g., "Codeine")
    pub drug: String,
    pub gene: String,
    pub mechanism: String,
    outcomes: HashMap<Phenotype, Outcome>,
    unknown: Outcome,
}

impl DrugRule {
    pub fn new(
        drug: impl Into<String>,
        gene: impl Into<String>,
        mechanism: impl Into<String>,
        unknown: Outcome,
    ) -> Self {
        Self {
            drug: drug.into(),
            gene: gene.into(),
            mechanism: mechanism.into(),
            outcomes: HashMap::new(),
            unknown,
        }
    }

    pub fn with_outcome(mut self, phenotype: Phenotype, outcome: Outcome) -> Self {
        if phenotype == Phenotype::Unknown {
            self.unknown = outcome;
        } else {
            self.outcomes.insert(phenotype, outcome);
        }
        self
    }

    /// Outcome for `phenotype`, falling back to the `Unknown` entry
    pub fn outcome_for(&self, phenotype: Phenotype) -> &Outcome {
        self.outcomes.get(&phenotype).unwrap_or(&self.unknown)
    }

    pub fn has_outcome(&self, phenotype: Phenotype) -> bool {
        phenotype == Phenotype::Unknown || self.outcomes.contains_key(&phenotype)
    }
}

/// Read-only table of drug rules keyed by uppercased drug name
#[derive(Debug, Clone, Default)]
pub struct DrugRuleTable {
    rules: HashMap<String, DrugRule>,
}

impl DrugRuleTable {
    pub fn from_rules<I: IntoIterator<Item = DrugRule>>(rules: I) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|rule| (normalize_drug_name(&rule.drug), rule))
                .collect(),
        }
    }

    /// Process-wide table built from the embedded CPIC rules
    pub fn builtin() -> &'static Self {
        BUILTIN_RULES.get_or_init(|| Self::from_rules(builtin_rules()))
    }

    /// Case-insensitive lookup
    pub fn lookup(&self, drug_name: &str) -> Option<&DrugRule> {
        self.rules.get(&normalize_drug_name(drug_name))
    }

    /// Supported drug names, sorted
    pub fn drugs(&self) -> Vec<&str> {
        let mut drugs: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        drugs.sort_unstable();
        drugs
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Trim and uppercase a drug name
pub fn normalize_drug_name(name: &str) -> String {
    name.trim().to_uppercase()
}

fn standard(recommendation: &str, level: EvidenceLevel) -> Outcome {
    Outcome::new(RiskLabel::Safe, Severity::None, recommendation, level)
}

fn builtin_rules() -> Vec<DrugRule> {
    use EvidenceLevel::{A, B, C};
    use Phenotype::{Intermediate, Normal, Poor, Rapid, Ultrarapid};
    use RiskLabel::{AdjustDosage, Ineffective, Safe, Toxic};

    vec![
        DrugRule::new(
            "Codeine",
            "CYP2D6",
            "CYP2D6 converts codeine to morphine (active). PM have no conversion; URM over-convert causing toxicity.",
            Outcome::new(RiskLabel::Unknown, Severity::Low, "Insufficient genetic data. Consider CYP2D6 genotyping before prescribing.", B),
        )
        .with_outcome(
            Poor,
            Outcome::new(Ineffective, Severity::Moderate, "Avoid codeine. No conversion to morphine; drug will be ineffective.", A)
                .with_alternatives(&["Morphine", "Hydromorphone", "Oxycodone"]),
        )
        .with_outcome(
            Intermediate,
            Outcome::new(AdjustDosage, Severity::Low, "Use with caution. Reduced conversion to morphine. Monitor for inadequate analgesia.", A)
                .with_monitoring(&["Pain score", "Respiratory rate"]),
        )
        .with_outcome(Normal, standard("Use label recommended dosage. Normal CYP2D6 activity expected.", A))
        .with_outcome(
            Rapid,
            Outcome::new(Toxic, Severity::High, "Avoid codeine. Increased morphine formation may cause respiratory depression.", A)
                .with_alternatives(&["Morphine (with dose adjustment)", "Non-opioid analgesics"]),
        )
        .with_outcome(
            Ultrarapid,
            Outcome::new(Toxic, Severity::Critical, "CONTRAINDICATED. Ultra-rapid metabolism causes life-threatening morphine accumulation.", A)
                .with_alternatives(&["Non-opioid analgesics", "Tramadol (with caution)"]),
        ),
        DrugRule::new(
            "Warfarin",
            "CYP2C9",
            "CYP2C9 metabolizes S-warfarin (most potent enantiomer). Reduced activity increases warfarin exposure and bleeding risk.",
            Outcome::new(RiskLabel::Unknown, Severity::None, "Standard monitoring required. Consider pharmacogenomic testing.", C),
        )
        .with_outcome(
            Poor,
            Outcome::new(Toxic, Severity::High, "Initiate at <=20% of standard dose. Intensive INR monitoring required weekly for >=5 weeks.", A)
                .with_monitoring(&["INR", "Bleeding signs", "Bruising"]),
        )
        .with_outcome(
            Intermediate,
            Outcome::new(AdjustDosage, Severity::Moderate, "Reduce starting dose by 25-50%. More frequent INR monitoring required.", A)
                .with_monitoring(&["INR", "Prothrombin time"]),
        )
        .with_outcome(Normal, standard("Use standard dosing algorithm. Routine INR monitoring.", A))
        .with_outcome(
            Rapid,
            Outcome::new(AdjustDosage, Severity::Low, "Higher dose may be needed. Monitor INR closely.", B),
        )
        .with_outcome(
            Ultrarapid,
            Outcome::new(AdjustDosage, Severity::Low, "Higher dose likely required. Monitor INR closely.", B),
        ),
        DrugRule::new(
            "Clopidogrel",
            "CYP2C19",
            "CYP2C19 activates clopidogrel (prodrug). PM cannot activate it and have inadequate platelet inhibition.",
            Outcome::new(RiskLabel::Unknown, Severity::None, "Standard monitoring. CYP2C19 genotyping recommended for ACS patients.", C),
        )
        .with_outcome(
            Poor,
            Outcome::new(Ineffective, Severity::High, "Avoid clopidogrel. Inadequate platelet inhibition increases major cardiovascular event risk.", A)
                .with_alternatives(&["Prasugrel", "Ticagrelor"]),
        )
        .with_outcome(
            Intermediate,
            Outcome::new(Ineffective, Severity::Moderate, "Avoid if possible. Consider prasugrel or ticagrelor based on bleeding risk.", A)
                .with_alternatives(&["Prasugrel", "Ticagrelor"]),
        )
        .with_outcome(Normal, standard("Standard dosing (75mg daily). Expected normal platelet inhibition.", A))
        .with_outcome(Rapid, standard("Standard dosing. Slightly better antiplatelet effect expected.", B))
        .with_outcome(
            Ultrarapid,
            Outcome::new(Safe, Severity::Low, "Standard dosing. Enhanced antiplatelet effect; monitor for bleeding.", B)
                .with_monitoring(&["Bleeding time", "Platelet aggregation"]),
        ),
        DrugRule::new(
            "Simvastatin",
            "SLCO1B1",
            "SLCO1B1 transports simvastatin into hepatocytes. Reduced function raises plasma levels, increasing myopathy risk.",
            Outcome::new(RiskLabel::Unknown, Severity::None, "Use simvastatin with standard precautions.", C),
        )
        .with_outcome(
            Poor,
            Outcome::new(Toxic, Severity::High, "Limit simvastatin to <=20mg/day or switch to an alternative statin with lower myopathy risk.", A)
                .with_alternatives(&["Rosuvastatin", "Pravastatin", "Fluvastatin"])
                .with_monitoring(&["CK levels", "Muscle pain/weakness"]),
        )
        .with_outcome(
            Intermediate,
            Outcome::new(AdjustDosage, Severity::Moderate, "Maximum dose 40mg/day. Monitor CK levels and for symptoms of myopathy.", A)
                .with_monitoring(&["CK levels", "Myalgia"]),
        )
        .with_outcome(Normal, standard("Standard dosing per label. Routine monitoring.", A))
        .with_outcome(Rapid, standard("Standard dosing.", C))
        .with_outcome(Ultrarapid, standard("Standard dosing.", C)),
        DrugRule::new(
            "Azathioprine",
            "TPMT",
            "TPMT inactivates thiopurine metabolites. Low TPMT activity causes accumulation of toxic thioguanine nucleotides.",
            Outcome::new(RiskLabel::Unknown, Severity::Low, "TPMT phenotyping or genotyping recommended before starting azathioprine.", B),
        )
        .with_outcome(
            Poor,
            Outcome::new(Toxic, Severity::Critical, "Avoid azathioprine. Risk of life-threatening myelosuppression. Consider non-thiopurine alternatives.", A)
                .with_alternatives(&["Mycophenolate", "Methotrexate"])
                .with_monitoring(&["CBC", "LFTs"]),
        )
        .with_outcome(
            Intermediate,
            Outcome::new(AdjustDosage, Severity::High, "Reduce dose by 30-70% of standard dose. Weekly CBC for the first month.", A)
                .with_monitoring(&["CBC weekly", "Neutrophil count"]),
        )
        .with_outcome(Normal, standard("Standard dosing. CBC monitoring per standard of care.", A))
        .with_outcome(Rapid, standard("Standard dosing.", C))
        .with_outcome(Ultrarapid, standard("Standard dosing.", C)),
        DrugRule::new(
            "Fluorouracil",
            "DPYD",
            "DPYD catabolizes fluorouracil. Deficiency causes severe 5-FU accumulation and systemic toxicity.",
            Outcome::new(RiskLabel::Unknown, Severity::Moderate, "DPYD genotyping strongly recommended before initiating fluoropyrimidine therapy.", B),
        )
        .with_outcome(
            Poor,
            Outcome::new(Toxic, Severity::Critical, "CONTRAINDICATED. Complete DPYD deficiency; severe life-threatening toxicity expected.", A)
                .with_alternatives(&["Non-fluoropyrimidine chemotherapy regimen"]),
        )
        .with_outcome(
            Intermediate,
            Outcome::new(AdjustDosage, Severity::High, "Reduce starting dose by 50%. Titrate based on tolerability with close monitoring.", A)
                .with_monitoring(&["CBC", "GI toxicity", "Mucositis", "Diarrhea"]),
        )
        .with_outcome(Normal, standard("Standard dosing per oncology protocol.", A))
        .with_outcome(Rapid, standard("Standard dosing.", C))
        .with_outcome(Ultrarapid, standard("Standard dosing.", C)),
    ]
}
