// ==============================================================================
// parsers/mod.rs - File parser modules
// ==============================================================================
// Description: Parsers for genetic data file formats
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

pub mod vcf;

pub use vcf::{InfoMap, VariantRecord, VcfParseError, VcfParseResult, VcfParser, VcfStats};
