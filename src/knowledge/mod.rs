// ==============================================================================
// knowledge/mod.rs - Pharmacogenomic knowledge base
// ==============================================================================
// Description: Static variant and drug-rule reference tables
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

pub mod drugs;
pub mod variants;

pub use drugs::{
    normalize_drug_name, DrugRule, DrugRuleTable, GUIDELINES_SOURCE, KNOWLEDGE_BASE_VERSION,
};
pub use variants::{allele_key, normalize_star, VariantKnowledgeIndex};
