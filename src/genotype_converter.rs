// ==============================================================================
// genotype_converter.rs - Genotype to Zygosity Conversion
// ==============================================================================
// Description: Infers zygosity of a variant call from the VCF GT field
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Algorithm:
//   Split GT on '/' or '|', resolve allele indices ('.' = missing):
//   - both resolved, both non-reference, equal  → Homozygous   ("1/1", "2|2")
//   - any non-reference otherwise               → Heterozygous ("0/1", "1/2", "./1", "1")
//   - only reference alleles                    → not carried  ("0/0", "0")
//   - no GT, nothing resolvable, or malformed   → Unknown      ("./.", "")
// ==============================================================================

use thiserror::Error;
use tracing::debug;

use crate::models::Zygosity;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenotypeError {
    #[error("Empty genotype field")]
    Empty,

    #[error("Invalid allele index '{allele}' in genotype '{genotype}'")]
    InvalidAllele { genotype: String, allele: String },
}

/// Split a GT value into allele indices; `None` marks a missing ('.') allele
///
/// # Examples
/// ```
/// use pharmacogenomics_engine::genotype_converter::parse_allele_indices;
///
/// assert_eq!(parse_allele_indices("0/1").unwrap(), vec![Some(0), Some(1)]);
/// assert_eq!(parse_allele_indices("1|1").unwrap(), vec![Some(1), Some(1)]);
/// assert_eq!(parse_allele_indices("./1").unwrap(), vec![None, Some(1)]);
/// assert!(parse_allele_indices("A/G").is_err());
/// ```
pub fn parse_allele_indices(genotype: &str) -> Result<Vec<Option<u32>>, GenotypeError> {
    let genotype = genotype.trim();
    if genotype.is_empty() {
        return Err(GenotypeError::Empty);
    }

    genotype
        .split(['/', '|'])
        .map(|allele| {
            if allele == "." {
                Ok(None)
            } else {
                allele.parse::<u32>().map(Some).map_err(|_| GenotypeError::InvalidAllele {
                    genotype: genotype.to_string(),
                    allele: allele.to_string(),
                })
            }
        })
        .collect()
}

/// Infer zygosity for a call
///
/// # Returns
/// * `Some(zygosity)` - The sample carries the alternate allele (or carriage is unknown)
/// * `None` - The genotype is reference-only, so the variant is not carried
pub fn genotype_to_zygosity(genotype: Option<&str>) -> Option<Zygosity> {
    let Some(genotype) = genotype else {
        return Some(Zygosity::Unknown);
    };

    let alleles = match parse_allele_indices(genotype) {
        Ok(alleles) => alleles,
        Err(e) => {
            debug!("Treating genotype as unknown: {}", e);
            return Some(Zygosity::Unknown);
        }
    };

    let resolved: Vec<u32> = alleles.iter().flatten().copied().collect();
    if resolved.is_empty() {
        return Some(Zygosity::Unknown);
    }

    let alternate: Vec<u32> = resolved.iter().copied().filter(|&a| a != 0).collect();
    if alternate.is_empty() {
        return None;
    }

    if alternate.len() == 2 && resolved.len() == 2 && alternate[0] == alternate[1] {
        Some(Zygosity::Homozygous)
    } else {
        Some(Zygosity::Heterozygous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homozygous_alternate() {
        assert_eq!(genotype_to_zygosity(Some("1/1")), Some(Zygosity::Homozygous));
        assert_eq!(genotype_to_zygosity(Some("1|1")), Some(Zygosity::Homozygous));
        assert_eq!(genotype_to_zygosity(Some("2/2")), Some(Zygosity::Homozygous));
    }

    #[test]
    fn test_heterozygous() {
        assert_eq!(genotype_to_zygosity(Some("0/1")), Some(Zygosity::Heterozygous));
        assert_eq!(genotype_to_zygosity(Some("1|0")), Some(Zygosity::Heterozygous));
        // Two different alternate alleles
        assert_eq!(genotype_to_zygosity(Some("1/2")), Some(Zygosity::Heterozygous));
        // Only one allele resolvable
        assert_eq!(genotype_to_zygosity(Some("./1")), Some(Zygosity::Heterozygous));
        // Haploid call
        assert_eq!(genotype_to_zygosity(Some("1")), Some(Zygosity::Heterozygous));
    }

    #[test]
    fn test_reference_only_is_not_carried() {
        assert_eq!(genotype_to_zygosity(Some("0/0")), None);
        assert_eq!(genotype_to_zygosity(Some("0|0")), None);
        assert_eq!(genotype_to_zygosity(Some("0/.")), None);
    }

    #[test]
    fn test_unknown_zygosity() {
        assert_eq!(genotype_to_zygosity(None), Some(Zygosity::Unknown));
        assert_eq!(genotype_to_zygosity(Some("./.")), Some(Zygosity::Unknown));
        assert_eq!(genotype_to_zygosity(Some("")), Some(Zygosity::Unknown));
        assert_eq!(genotype_to_zygosity(Some("A/G")), Some(Zygosity::Unknown));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_allele_indices("   "), Err(GenotypeError::Empty));
        match parse_allele_indices("0/x") {
            Err(GenotypeError::InvalidAllele { allele, .. }) => assert_eq!(allele, "x"),
            other => panic!("Expected InvalidAllele error, got {:?}", other),
        }
    }
}
