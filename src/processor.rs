// ==============================================================================
// processor.rs - Pharmacogenomic Analysis Pipeline
// ==============================================================================
// Description: Runs parse → assess → explain for one VCF upload and assembles
//              the full analysis report with quality metrics and audit trail
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{AuditEvent, AuditEventType, AuditSink, TracingAuditSink};
use crate::engine::{EngineError, RiskAssessmentEngine, UNKNOWN_GENE};
use crate::explanation::{
    Explanation, ExplanationError, ExplanationGenerator, ExplanationRequest, TemplateExplainer,
};
use crate::knowledge::{normalize_drug_name, GUIDELINES_SOURCE, KNOWLEDGE_BASE_VERSION};
use crate::models::{AnalysisReport, AnalysisResult, AnalyzedDrug, QualityMetrics};
use crate::parsers::VcfParser;

pub struct PharmacogenomicsProcessor<'k> {
    engine: RiskAssessmentEngine<'k>,
    parser: VcfParser,
    explainer: Box<dyn ExplanationGenerator + 'k>,
    audit: Arc<dyn AuditSink>,
}

impl PharmacogenomicsProcessor<'static> {
    /// Processor over the embedded tables with templated explanations
    pub fn builtin() -> Self {
        Self::new(RiskAssessmentEngine::builtin())
    }
}

impl<'k> PharmacogenomicsProcessor<'k> {
    pub fn new(engine: RiskAssessmentEngine<'k>) -> Self {
        Self {
            engine,
            parser: VcfParser::new(),
            explainer: Box::new(TemplateExplainer::new()),
            audit: Arc::new(TracingAuditSink),
        }
    }

    /// Swap in another explanation generator (e.g., a hosted language model)
    pub fn with_explainer(mut self, explainer: impl ExplanationGenerator + 'k) -> Self {
        self.explainer = Box::new(explainer);
        self
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_parser(mut self, parser: VcfParser) -> Self {
        self.parser = parser;
        self
    }

    /// Main processing pipeline
    ///
    /// # Returns
    /// * `Ok(AnalysisReport)` - One analyzed entry per requested drug, in order
    /// * `Err(EngineError::InvalidArgument)` - The VCF text is empty
    pub fn analyze<S: AsRef<str>>(
        &self,
        vcf_text: &str,
        drug_names: &[S],
    ) -> Result<AnalysisReport, EngineError> {
        let started = Instant::now();
        let report_id = Uuid::new_v4();
        let drugs_analyzed: Vec<String> = drug_names
            .iter()
            .map(|d| normalize_drug_name(d.as_ref()))
            .collect();

        info!("Starting analysis {} for {} drug(s)", report_id, drugs_analyzed.len());
        self.record(
            AuditEventType::AnalysisStarted,
            report_id,
            None,
            serde_json::json!({ "drugs": drugs_analyzed, "input_bytes": vcf_text.len() }),
        );

        // 1. Parse VCF
        let parsed = match self.parser.parse(vcf_text) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.record(
                    AuditEventType::InputRejected,
                    report_id,
                    None,
                    serde_json::json!({ "reason": e.to_string() }),
                );
                return Err(e.into());
            }
        };

        // 2. Assess risk
        let timestamp = Utc::now();
        let results = self
            .engine
            .assess_at(&parsed.records, drugs_analyzed.as_slice(), timestamp);

        // 3. Explain each result
        let results: Vec<AnalyzedDrug> = results
            .into_iter()
            .map(|result| {
                self.audit_result(report_id, &result);
                let explanation = self.explain(report_id, &result);
                AnalyzedDrug { result, explanation }
            })
            .collect();

        let quality_metrics = QualityMetrics {
            vcf_parsing_success: !parsed.records.is_empty(),
            total_vcf_lines: parsed.total_lines,
            variants_parsed: parsed.records.len(),
            parse_errors: parsed.parse_errors,
            processing_time_ms: started.elapsed().as_millis() as u64,
            knowledge_base_version: KNOWLEDGE_BASE_VERSION.to_string(),
            guidelines_source: GUIDELINES_SOURCE.to_string(),
        };

        info!(
            "Analysis {} complete: {} result(s), {} parse error(s), {} ms",
            report_id,
            results.len(),
            quality_metrics.parse_errors.len(),
            quality_metrics.processing_time_ms
        );
        self.record(
            AuditEventType::AnalysisCompleted,
            report_id,
            Some(parsed.patient_id.clone()),
            serde_json::json!({
                "results": results.len(),
                "variants_parsed": quality_metrics.variants_parsed,
                "parse_errors": quality_metrics.parse_errors.len(),
                "processing_time_ms": quality_metrics.processing_time_ms,
            }),
        );

        Ok(AnalysisReport {
            report_id,
            patient_id: parsed.patient_id,
            timestamp,
            drugs_analyzed,
            results,
            quality_metrics,
        })
    }

    fn audit_result(&self, report_id: Uuid, result: &AnalysisResult) {
        if result.gene == UNKNOWN_GENE {
            self.record(
                AuditEventType::UnknownDrug,
                report_id,
                Some(result.drug_name.clone()),
                serde_json::json!({ "drug": result.drug_name }),
            );
        }

        if result.ambiguous_diplotype {
            self.record(
                AuditEventType::AmbiguousDiplotype,
                report_id,
                Some(result.gene.clone()),
                serde_json::json!({
                    "drug": result.drug_name,
                    "diplotype": result.diplotype,
                    "detected_variants": result.detected_variants.len(),
                }),
            );
        }
    }

    /// Explanation from the configured generator, falling back to the template
    fn explain(&self, report_id: Uuid, result: &AnalysisResult) -> Explanation {
        let request = ExplanationRequest::from_result(result);

        match self.explainer.explain(&request).and_then(check_explanation) {
            Ok(explanation) => explanation,
            Err(e) => {
                warn!("Explanation for {} failed, using template: {}", result.drug_name, e);
                self.record(
                    AuditEventType::ExplanationFallback,
                    report_id,
                    Some(result.drug_name.clone()),
                    serde_json::json!({ "error": e.to_string() }),
                );

                TemplateExplainer::new()
                    .explain(&request)
                    .unwrap_or_else(|_| Explanation {
                        summary: result.recommendation().to_string(),
                        mechanism: result.mechanism.clone(),
                        citations: Vec::new(),
                    })
            }
        }
    }

    fn record(
        &self,
        event_type: AuditEventType,
        report_id: Uuid,
        resource: Option<String>,
        details: serde_json::Value,
    ) {
        self.audit
            .record(AuditEvent::new(event_type, Some(report_id), resource, details));
    }
}

/// Reject generated explanations with nothing to show
fn check_explanation(explanation: Explanation) -> Result<Explanation, ExplanationError> {
    if explanation.summary.trim().is_empty() {
        return Err(ExplanationError::InvalidResponse("empty summary".to_string()));
    }
    Ok(explanation)
}
