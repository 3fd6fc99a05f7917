// ==============================================================================
// tests/pipeline.rs - End-to-end pipeline tests
// ==============================================================================
// Description: VCF text → risk results through the public entry points
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

use pharmacogenomics_engine::models::{Severity, VariantImpact, Zygosity};
use pharmacogenomics_engine::{
    assess_pharmacogenomic_risk, AnalysisResult, DetectedVariant, EngineError,
    PharmacogenomicsProcessor, Phenotype, PhenotypeResolver, RiskLabel, VcfParser,
};

const HEADER: &str = "##fileformat=VCFv4.2\n\
    ##SAMPLE=<ID=PATIENT_123>\n\
    #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE1\n";

fn vcf(body: &str) -> String {
    format!("{}{}", HEADER, body)
}

/// Result with the timestamp stripped for comparison
fn comparable(results: &[AnalysisResult]) -> serde_json::Value {
    let mut json = serde_json::to_value(results).unwrap();
    for entry in json.as_array_mut().unwrap() {
        entry.as_object_mut().unwrap().remove("timestamp");
    }
    json
}

#[test]
fn test_idempotent_except_timestamp() {
    let text = vcf(
        "22\t42130692\trs3892097\tG\tA\t.\tPASS\tGENE=CYP2D6\tGT\t0/1\n\
         10\t94781859\trs4244285\tG\tA\t.\tPASS\t.\tGT\t1/1\n\
         1\t97450058\trs3918290\tC\tT\t.\tPASS\t.\tGT\t0|1\n",
    );
    let drugs = ["CODEINE", "clopidogrel", "Fluorouracil", "ZZZNOTADRUG"];

    let first = assess_pharmacogenomic_risk(&text, &drugs).unwrap();
    let second = assess_pharmacogenomic_risk(&text, &drugs).unwrap();

    assert_eq!(comparable(&first), comparable(&second));
}

#[test]
fn test_output_order_matches_request() {
    let drugs = ["warfarin", "ZZZNOTADRUG", "Codeine", "SIMVASTATIN", "codeine"];
    let results = assess_pharmacogenomic_risk(&vcf(""), &drugs).unwrap();

    assert_eq!(results.len(), drugs.len());
    for (result, drug) in results.iter().zip(drugs.iter()) {
        assert!(result.drug_name.eq_ignore_ascii_case(drug));
    }
}

#[test]
fn test_baseline_phenotype_for_every_gene() {
    let drugs = ["CODEINE", "WARFARIN", "CLOPIDOGREL", "SIMVASTATIN", "AZATHIOPRINE", "FLUOROURACIL"];
    let results = assess_pharmacogenomic_risk(&vcf(""), &drugs).unwrap();

    for result in results {
        assert_eq!(result.activity_score, Some(2.0), "{}", result.drug_name);
        assert_eq!(result.phenotype, Phenotype::Normal, "{}", result.drug_name);
        assert_eq!(result.diplotype, "*1/*1");
        assert_eq!(result.risk_label(), RiskLabel::Safe);
    }
}

#[test]
fn test_score_clamped_for_synthetic_gene() {
    let detected: Vec<DetectedVariant> = ["*3", "*4", "*5"]
        .iter()
        .map(|star| DetectedVariant {
            rsid: format!("GENEX:{}", star),
            gene: "GENEX".to_string(),
            star_allele: star.to_string(),
            impact: VariantImpact::NoFunction,
            activity_value: 0.0,
            zygosity: Zygosity::Homozygous,
        })
        .collect();

    let resolved = PhenotypeResolver::new().resolve("GENEX", &detected);
    assert_eq!(resolved.activity_score, 0.0);
    assert_eq!(resolved.phenotype, Phenotype::Poor);
}

#[test]
fn test_unknown_drug_does_not_fail() {
    let results = assess_pharmacogenomic_risk(&vcf(""), &["ZZZNOTADRUG"]).unwrap();

    assert_eq!(results[0].risk_label(), RiskLabel::Unknown);
    assert_eq!(results[0].phenotype, Phenotype::Unknown);
    assert_eq!(results[0].severity(), Severity::None);

    let json = serde_json::to_value(&results[0]).unwrap();
    assert_eq!(json["risk_label"], "Unknown");
}

#[test]
fn test_malformed_line_tolerated() {
    let text = vcf(
        "22\t42130692\trs3892097\tG\tA\t.\tPASS\tGENE=CYP2D6\tGT\t0/1\n\
         chr1\t12345\trs1\n",
    );
    let parsed = VcfParser::new().parse(&text).unwrap();

    assert_eq!(parsed.records.len(), 1);
    assert_eq!(parsed.parse_errors.len(), 1);
}

#[test]
fn test_codeine_poor_metabolizer_scenario() {
    let text = vcf("22\t42130692\trs3892097\tG\tA\t.\tPASS\tGENE=CYP2D6;STAR=*4\tGT\t1/1\n");
    let results = assess_pharmacogenomic_risk(&text, &["CODEINE"]).unwrap();
    let result = &results[0];

    assert_eq!(result.gene, "CYP2D6");
    assert_eq!(result.activity_score, Some(0.0));
    assert_eq!(result.phenotype, Phenotype::Poor);
    assert!(matches!(result.risk_label(), RiskLabel::Ineffective | RiskLabel::Toxic));
    assert_eq!(result.diplotype, "*4/*4");
}

#[test]
fn test_warfarin_normal_metabolizer_scenario() {
    let results = assess_pharmacogenomic_risk(&vcf(""), &["WARFARIN"]).unwrap();

    assert_eq!(results[0].phenotype, Phenotype::Normal);
    assert_eq!(results[0].risk_label(), RiskLabel::Safe);
}

#[test]
fn test_mixed_batch_scenario() {
    let text = vcf("10\t94781859\trs4244285\tG\tA\t.\tPASS\tGENE=CYP2C19;STAR=*2\tGT\t0/1\n");
    let results = assess_pharmacogenomic_risk(&text, &["CLOPIDOGREL", "UNKNOWNDRUG"]).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].gene, "CYP2C19");
    assert_eq!(results[0].phenotype, Phenotype::Intermediate);
    assert_eq!(results[1].risk_label(), RiskLabel::Unknown);
}

#[test]
fn test_more_evidence_raises_confidence() {
    let one = vcf("22\t42130692\trs3892097\tG\tA\t.\tPASS\t.\tGT\t0/1\n");
    let many = vcf(
        "22\t42130692\trs3892097\tG\tA\t.\tPASS\t.\tGT\t0/1\n\
         22\t42126611\trs1065852\tG\tA\t.\tPASS\t.\tGT\t0/1\n\
         22\t42127941\trs1135840\tG\tC\t.\tPASS\t.\tGT\t0/1\n\
         10\t94781859\trs4244285\tG\tA\t.\tPASS\t.\tGT\t0/1\n\
         10\t94761900\trs12248560\tC\tT\t.\tPASS\t.\tGT\t0/1\n\
         16\t31096368\trs1799853\tC\tT\t.\tPASS\t.\tGT\t0/1\n",
    );

    let none = assess_pharmacogenomic_risk(&vcf(""), &["CODEINE"]).unwrap()[0].confidence_score;
    let one = assess_pharmacogenomic_risk(&one, &["CODEINE"]).unwrap()[0].confidence_score;
    let many = assess_pharmacogenomic_risk(&many, &["CODEINE"]).unwrap()[0].confidence_score;
    let unknown = assess_pharmacogenomic_risk(&vcf(""), &["NOPE"]).unwrap()[0].confidence_score;

    assert!(unknown < none);
    assert!(none < one);
    assert!(one < many);
    assert!(many <= 0.98);
}

#[test]
fn test_empty_input_is_invalid_argument() {
    let err = assess_pharmacogenomic_risk("", &["CODEINE"]).unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));
}

#[test]
fn test_full_report() {
    let text = vcf(
        "22\t42130692\trs3892097\tG\tA\t.\tPASS\t.\tGT\t1/1\n\
         not a vcf line\n",
    );
    let report = PharmacogenomicsProcessor::builtin()
        .analyze(&text, &["codeine", "azathioprine"])
        .unwrap();

    assert_eq!(report.patient_id, "PATIENT_123");
    assert_eq!(report.drugs_analyzed, vec!["CODEINE", "AZATHIOPRINE"]);
    assert_eq!(report.quality_metrics.variants_parsed, 1);
    assert_eq!(report.quality_metrics.parse_errors.len(), 1);
    assert_eq!(report.results[1].result.phenotype, Phenotype::Normal);
    assert!(!report.results[0].explanation.citations.is_empty());
}
