// ==============================================================================
// lib.rs - Pharmacogenomics Engine Library
// ==============================================================================
// Description: Library interface for the variant → phenotype → drug risk
//              pipeline
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

pub mod parsers;
pub mod knowledge;
pub mod genotype_converter;
pub mod models;
pub mod phenotype;
pub mod engine;
pub mod explanation;
pub mod audit;
pub mod validator;
pub mod processor;
pub mod output;

pub use engine::{assess_pharmacogenomic_risk, ConfidencePolicy, EngineError, RiskAssessmentEngine};
pub use knowledge::{DrugRule, DrugRuleTable, VariantKnowledgeIndex};
pub use models::{AnalysisReport, AnalysisResult, DetectedVariant, GenePhenotype, Phenotype, RiskLabel};
pub use parsers::{VariantRecord, VcfParseResult, VcfParser};
pub use phenotype::PhenotypeResolver;
pub use processor::PharmacogenomicsProcessor;
