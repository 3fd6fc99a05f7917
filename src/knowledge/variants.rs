// ==============================================================================
// knowledge/variants.rs - Variant Knowledge Index
// ==============================================================================
// Description: rsID / gene-tagged allele → star allele and functional impact
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Sources: CPIC allele functionality tables (2024), PharmGKB
// ==============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

use crate::models::{KnownVariant, VariantImpact};
use crate::parsers::VariantRecord;

/// (rsID, gene, star allele, impact, description)
type VariantRow = (&'static str, &'static str, &'static str, VariantImpact, &'static str);

const BUILTIN_VARIANTS: &[VariantRow] = &[
    // CYP2D6
    ("rs3892097", "CYP2D6", "*4", VariantImpact::NoFunction, "Most common non-functional CYP2D6 allele in Europeans"),
    ("rs1065852", "CYP2D6", "*10", VariantImpact::Decreased, "Common in East Asians; reduced but not absent activity"),
    ("rs5030655", "CYP2D6", "*6", VariantImpact::NoFunction, "Frameshift mutation causing null allele"),
    ("rs35742686", "CYP2D6", "*3", VariantImpact::NoFunction, "Frameshift in exon 5; prevalent in Europeans"),
    ("rs1135840", "CYP2D6", "*41", VariantImpact::Decreased, "Splicing defect; reduced activity"),
    ("rs1080985", "CYP2D6", "*41", VariantImpact::Decreased, "Associated with decreased phenotype"),
    ("rs28371725", "CYP2D6", "*41", VariantImpact::Decreased, "Splicing defect associated variant"),
    // CYP2C9
    ("rs1799853", "CYP2C9", "*2", VariantImpact::Decreased, "Arg144Cys; common in Caucasians, ~70% activity"),
    ("rs1057910", "CYP2C9", "*3", VariantImpact::NoFunction, "Ile359Leu; severely reduced warfarin metabolism"),
    ("rs28371686", "CYP2C9", "*5", VariantImpact::Decreased, "Common in African Americans"),
    ("rs9332131", "CYP2C9", "*6", VariantImpact::NoFunction, "Null allele found in African Americans"),
    // CYP2C19
    ("rs4244285", "CYP2C19", "*2", VariantImpact::NoFunction, "Most common loss-of-function; splicing defect"),
    ("rs4986893", "CYP2C19", "*3", VariantImpact::NoFunction, "Common in East Asians; premature stop codon"),
    ("rs12248560", "CYP2C19", "*17", VariantImpact::Increased, "Gain-of-function promoter variant increasing expression"),
    ("rs28399504", "CYP2C19", "*4", VariantImpact::NoFunction, "Splicing/missense loss-of-function allele"),
    // SLCO1B1
    ("rs4149056", "SLCO1B1", "*5", VariantImpact::Decreased, "Val174Ala; strongly associated with simvastatin myopathy"),
    ("rs2306283", "SLCO1B1", "*1b", VariantImpact::Increased, "Slightly increased hepatic uptake transporter activity"),
    // TPMT
    ("rs1800460", "TPMT", "*3B", VariantImpact::NoFunction, "Ala154Thr; protein instability and rapid degradation"),
    ("rs1142345", "TPMT", "*3C", VariantImpact::NoFunction, "Tyr240Cys; most common non-functional allele in Africans/Asians"),
    ("rs1800584", "TPMT", "*3A", VariantImpact::NoFunction, "Carries both *3B and *3C; most common in Caucasians"),
    // DPYD
    ("rs3918290", "DPYD", "*2A", VariantImpact::NoFunction, "IVS14+1G>A splice site; most common DPYD null allele"),
    ("rs67376798", "DPYD", "HapB3", VariantImpact::Decreased, "p.Ile560Ser haplotype B3; reduced activity"),
    ("rs55886062", "DPYD", "*13", VariantImpact::NoFunction, "Ile543Val; severe enzyme deficiency"),
    ("rs75017182", "DPYD", "HapB3", VariantImpact::Decreased, "HapB3 tagging SNP"),
];

static BUILTIN_INDEX: OnceLock<VariantKnowledgeIndex> = OnceLock::new();

/// Normalize a star-allele tag: bare numbers gain a '*' prefix ("4" → "*4")
pub fn normalize_star(star: &str) -> String {
    let star = star.trim();
    if star.starts_with(|c: char| c.is_ascii_digit()) {
        format!("*{}", star)
    } else {
        star.to_string()
    }
}

/// Gene-tagged allele key (e.g., "CYP2D6:*4", "DPYD:HapB3")
pub fn allele_key(gene: &str, star: &str) -> String {
    format!("{}:{}", gene.trim().to_ascii_uppercase(), normalize_star(star))
}

/// Read-only lookup from variant identifier to its reference entry
#[derive(Debug, Clone, Default)]
pub struct VariantKnowledgeIndex {
    entries: HashMap<String, KnownVariant>,
}

impl VariantKnowledgeIndex {
    /// Build an index from rsID-keyed entries
    ///
    /// Each entry is also registered under its gene-tagged allele key. The
    /// first entry for a key wins, so every key maps to exactly one variant.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, KnownVariant)>,
        S: Into<String>,
    {
        let mut index = HashMap::new();

        for (rsid, known) in entries {
            let rsid = rsid.into();
            let tag = allele_key(&known.gene, &known.star_allele);

            if index.contains_key(&rsid) {
                debug!("Duplicate knowledge entry for {} ignored", rsid);
                continue;
            }
            index.entry(tag).or_insert_with(|| known.clone());
            index.insert(rsid, known);
        }

        Self { entries: index }
    }

    /// Process-wide index built from the embedded CPIC/PharmGKB table
    pub fn builtin() -> &'static Self {
        BUILTIN_INDEX.get_or_init(|| {
            Self::from_entries(BUILTIN_VARIANTS.iter().map(
                |&(rsid, gene, star, impact, description)| {
                    (
                        rsid,
                        KnownVariant {
                            gene: gene.to_string(),
                            star_allele: star.to_string(),
                            impact,
                            activity_value: impact.activity_value(),
                            description: description.to_string(),
                        },
                    )
                },
            ))
        })
    }

    pub fn lookup(&self, identifier: &str) -> Option<&KnownVariant> {
        self.entries.get(identifier.trim())
    }

    /// Join a VCF record against the index
    ///
    /// Key precedence: INFO `RS=` tag, then each ID column entry (unless it
    /// was synthesized from the position), then the INFO `GENE` +
    /// `STAR`/`HAPLOTYPE` allele tag. The first key present in the index wins.
    ///
    /// # Returns
    /// * `Some((key, variant))` - The identifier that matched and its entry
    /// * `None` - The record is not actionable in this knowledge base
    pub fn resolve(&self, record: &VariantRecord) -> Option<(String, &KnownVariant)> {
        for rsid in record.rsid_candidates() {
            if let Some(known) = self.lookup(&rsid) {
                return Some((rsid, known));
            }
        }

        let (gene, star) = (record.gene_tag()?, record.star_tag()?);
        let key = allele_key(gene, star);
        self.lookup(&key).map(|known| (key, known))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct genes covered, sorted
    pub fn genes(&self) -> Vec<String> {
        let mut genes: Vec<String> = self.entries.values().map(|v| v.gene.clone()).collect();
        genes.sort();
        genes.dedup();
        genes
    }
}
