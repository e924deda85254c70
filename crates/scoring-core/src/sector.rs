//! Sector valuation adjustments.
//!
//! Raw P/E and PEG are divided by the sector's multiplier before bucketing,
//! which normalises a company's multiple to what is typical for its sector.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::{DataError, DataResult};

/// Row used when a company has no sector or an unknown one.
pub const DEFAULT_SECTOR: &str = "Technology";

const BUILTIN_ROWS: &[(&str, f64, f64)] = &[
    // (sector, pe_multiplier, peg_multiplier)
    ("Technology", 1.3, 1.3),
    ("Healthcare", 1.2, 1.2),
    ("Consumer Cyclical", 1.1, 1.1),
    ("Communication Services", 1.2, 1.2),
    ("Financial Services", 0.8, 0.9),
    ("Utilities", 0.8, 0.8),
    ("Real Estate", 0.9, 0.9),
    ("Energy", 0.9, 1.0),
    ("Basic Materials", 0.9, 1.0),
    ("Industrials", 1.0, 1.0),
    ("Consumer Defensive", 0.9, 0.9),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorAdjustment {
    pub pe_multiplier: f64,
    pub peg_multiplier: f64,
}

impl SectorAdjustment {
    pub fn adjust_pe(&self, pe: f64) -> f64 {
        pe / self.pe_multiplier
    }

    pub fn adjust_peg(&self, peg: f64) -> f64 {
        peg / self.peg_multiplier
    }

    fn is_valid(&self) -> bool {
        self.pe_multiplier.is_finite()
            && self.peg_multiplier.is_finite()
            && self.pe_multiplier > 0.0
            && self.peg_multiplier > 0.0
    }
}

/// Immutable sector lookup. Always contains its default row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorTable {
    default_sector: String,
    sectors: HashMap<String, SectorAdjustment>,
}

impl SectorTable {
    /// The built-in table
    pub fn builtin() -> Self {
        let sectors = BUILTIN_ROWS
            .iter()
            .map(|(name, pe, peg)| {
                (
                    name.to_string(),
                    SectorAdjustment {
                        pe_multiplier: *pe,
                        peg_multiplier: *peg,
                    },
                )
            })
            .collect();

        Self {
            default_sector: DEFAULT_SECTOR.to_string(),
            sectors,
        }
    }

    /// Process-wide built-in table, built on first use.
    pub fn standard() -> &'static SectorTable {
        static STANDARD: OnceLock<SectorTable> = OnceLock::new();
        STANDARD.get_or_init(SectorTable::builtin)
    }

    /// Parse a replacement table. Multipliers must be positive and finite,
    /// and the default sector must have a row.
    pub fn from_json(json: &str) -> DataResult<Self> {
        let table: SectorTable = serde_json::from_str(json)?;

        if let Some((name, _)) = table.sectors.iter().find(|(_, adj)| !adj.is_valid()) {
            return Err(DataError::InvalidData(format!(
                "sector '{}' has a non-positive multiplier",
                name
            )));
        }
        if !table.sectors.contains_key(&table.default_sector) {
            return Err(DataError::InvalidData(format!(
                "default sector '{}' missing from table",
                table.default_sector
            )));
        }

        Ok(table)
    }

    pub fn from_file(path: impl AsRef<Path>) -> DataResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn default_sector(&self) -> &str {
        &self.default_sector
    }

    /// Adjustment for `sector`; absent or unknown sectors get the default row.
    pub fn lookup(&self, sector: Option<&str>) -> SectorAdjustment {
        sector
            .and_then(|s| self.sectors.get(s))
            .or_else(|| self.sectors.get(&self.default_sector))
            .copied()
            // from_json and builtin both guarantee the default row exists
            .unwrap_or(SectorAdjustment {
                pe_multiplier: 1.0,
                peg_multiplier: 1.0,
            })
    }

    pub fn contains(&self, sector: &str) -> bool {
        self.sectors.contains_key(sector)
    }

    pub fn sector_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sectors.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for SectorTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unknown_sector_uses_technology() {
        let table = SectorTable::standard();
        let tech = table.lookup(Some("Technology"));
        assert_eq!(table.lookup(None), tech);
        assert_eq!(table.lookup(Some("Underwater Basket Weaving")), tech);
        assert_relative_eq!(tech.pe_multiplier, 1.3);
        assert_relative_eq!(tech.peg_multiplier, 1.3);
    }

    #[test]
    fn test_adjust_divides() {
        let fin = SectorTable::builtin().lookup(Some("Financial Services"));
        assert_relative_eq!(fin.adjust_pe(8.0), 10.0);
        assert_relative_eq!(fin.adjust_peg(0.9), 1.0);
    }

    #[test]
    fn test_builtin_has_eleven_rows() {
        let table = SectorTable::builtin();
        assert_eq!(table.sector_names().len(), 11);
        assert!(table.contains(DEFAULT_SECTOR));
    }

    #[test]
    fn test_from_json_override() {
        let json = r#"{
            "defaultSector": "Other",
            "sectors": {
                "Other": {"peMultiplier": 1.0, "pegMultiplier": 1.0},
                "Energy": {"peMultiplier": 0.7, "pegMultiplier": 0.8}
            }
        }"#;
        let table = SectorTable::from_json(json).unwrap();
        assert_eq!(table.default_sector(), "Other");
        assert_relative_eq!(table.lookup(Some("Energy")).pe_multiplier, 0.7);
        assert_relative_eq!(table.lookup(Some("Technology")).pe_multiplier, 1.0);
    }

    #[test]
    fn test_from_json_rejects_bad_tables() {
        let zero = r#"{"defaultSector": "A", "sectors": {"A": {"peMultiplier": 0.0, "pegMultiplier": 1.0}}}"#;
        assert!(SectorTable::from_json(zero).is_err());

        let no_default = r#"{"defaultSector": "B", "sectors": {"A": {"peMultiplier": 1.0, "pegMultiplier": 1.0}}}"#;
        assert!(SectorTable::from_json(no_default).is_err());
    }
}
