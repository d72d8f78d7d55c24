//! Per-symbol, per-reel weight tables

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, SlotResult};
use crate::symbols::{SymbolId, SymbolSet};

/// Weights of one symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolWeights {
    /// Base weight the per-reel entries were derived from
    pub base: u32,
    /// Weight on each reel, one entry per reel index
    pub reels: Vec<u32>,
}

/// Ordered mapping symbol → weights.
///
/// Insertion order is the symbol order used when strips are built, so two
/// tables with the same entries in a different order build different strips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightTable {
    reel_count: usize,
    symbols: IndexMap<SymbolId, SymbolWeights>,
}

impl WeightTable {
    /// Empty table for `reel_count` reels
    pub fn new(reel_count: usize) -> Self {
        Self {
            reel_count,
            symbols: IndexMap::new(),
        }
    }

    /// Builder: same weight on every reel
    pub fn with_uniform(mut self, symbol: SymbolId, weight: u32) -> Self {
        self.set(
            symbol,
            SymbolWeights {
                base: weight,
                reels: vec![weight; self.reel_count],
            },
        );
        self
    }

    /// Builder: explicit per-reel weights
    pub fn with_reels(mut self, symbol: SymbolId, base: u32, reels: Vec<u32>) -> Self {
        self.set(symbol, SymbolWeights { base, reels });
        self
    }

    /// Insert or replace a symbol's weights, keeping its original position
    pub fn set(&mut self, symbol: SymbolId, weights: SymbolWeights) {
        self.symbols.insert(symbol, weights);
    }

    pub fn reel_count(&self) -> usize {
        self.reel_count
    }

    /// Weights of one symbol
    pub fn get(&self, symbol: SymbolId) -> Option<&SymbolWeights> {
        self.symbols.get(&symbol)
    }

    /// Symbols in table order
    pub fn symbols(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// `(symbol, weight)` pairs for one reel, in table order
    pub fn reel_weights(&self, reel: usize) -> Vec<(SymbolId, u32)> {
        self.symbols
            .iter()
            .map(|(&id, w)| (id, w.reels.get(reel).copied().unwrap_or(0)))
            .collect()
    }

    /// Total weight on a reel
    pub fn total_weight(&self, reel: usize) -> u64 {
        self.reel_weights(reel)
            .iter()
            .map(|&(_, w)| w as u64)
            .sum()
    }

    /// Check the table's shape.
    ///
    /// Every symbol must carry exactly `reel_count` entries and every reel
    /// must have at least one symbol with positive weight.
    pub fn validate(&self) -> SlotResult<()> {
        if self.reel_count == 0 {
            return Err(ConfigurationError::InvalidWeightTable("zero reels".into()).into());
        }
        if self.symbols.is_empty() {
            return Err(ConfigurationError::InvalidWeightTable("no symbols".into()).into());
        }
        for (&symbol, weights) in &self.symbols {
            if weights.reels.len() != self.reel_count {
                return Err(ConfigurationError::ReelWeightCount {
                    symbol,
                    expected: self.reel_count,
                    found: weights.reels.len(),
                }
                .into());
            }
        }
        for reel in 0..self.reel_count {
            if self.total_weight(reel) == 0 {
                return Err(ConfigurationError::ZeroWeightReel { reel }.into());
            }
        }
        Ok(())
    }

    /// Check every weighted symbol against a symbol set
    pub fn validate_symbols(&self, set: &SymbolSet) -> SlotResult<()> {
        match self.symbols().find(|&id| !set.contains(id)) {
            Some(id) => Err(ConfigurationError::UnknownSymbol(id).into()),
            None => Ok(()),
        }
    }

    /// Canonical byte encoding used for cache fingerprints
    pub(crate) fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 + self.symbols.len() * (8 + 4 * self.reel_count));
        bytes.extend_from_slice(&(self.reel_count as u64).to_le_bytes());
        for (&id, w) in &self.symbols {
            bytes.extend_from_slice(&id.to_le_bytes());
            bytes.extend_from_slice(&w.base.to_le_bytes());
            for &r in &w.reels {
                bytes.extend_from_slice(&r.to_le_bytes());
            }
        }
        bytes
    }

    /// Weights matching [`SymbolSet::standard`] on five reels.
    /// No wild on the first reel.
    pub fn standard_5_reel() -> Self {
        Self::new(5)
            .with_uniform(1, 3)
            .with_uniform(2, 4)
            .with_uniform(3, 5)
            .with_uniform(4, 6)
            .with_uniform(5, 8)
            .with_uniform(6, 9)
            .with_uniform(7, 10)
            .with_uniform(8, 12)
            .with_reels(11, 2, vec![0, 2, 2, 2, 2])
            .with_uniform(12, 2)
            .with_uniform(13, 1)
            .with_uniform(14, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SlotError;

    #[test]
    fn test_standard_table_is_valid() {
        let table = WeightTable::standard_5_reel();
        table.validate().unwrap();
        table.validate_symbols(&SymbolSet::standard()).unwrap();
        assert_eq!(table.total_weight(0), 61);
        assert_eq!(table.total_weight(1), 63);
    }

    #[test]
    fn test_order_is_insertion_order() {
        let table = WeightTable::new(1)
            .with_uniform(9, 1)
            .with_uniform(3, 1)
            .with_uniform(5, 1);
        assert_eq!(table.symbols().collect::<Vec<_>>(), vec![9, 3, 5]);
    }

    #[test]
    fn test_wrong_entry_count() {
        let table = WeightTable::new(3).with_reels(1, 5, vec![5, 5]);
        assert_eq!(
            table.validate(),
            Err(SlotError::Configuration(ConfigurationError::ReelWeightCount {
                symbol: 1,
                expected: 3,
                found: 2,
            }))
        );
    }

    #[test]
    fn test_zero_weight_reel() {
        let table = WeightTable::new(3)
            .with_reels(1, 5, vec![5, 0, 5])
            .with_reels(2, 5, vec![1, 0, 1]);
        assert_eq!(
            table.validate(),
            Err(SlotError::Configuration(ConfigurationError::ZeroWeightReel { reel: 1 }))
        );
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(WeightTable::new(5).validate().is_err());
        assert!(WeightTable::new(0).with_uniform(1, 1).validate().is_err());
    }

    #[test]
    fn test_unknown_symbol() {
        let table = WeightTable::new(1).with_uniform(99, 1);
        assert_eq!(
            table.validate_symbols(&SymbolSet::standard()),
            Err(SlotError::Configuration(ConfigurationError::UnknownSymbol(99)))
        );
    }

    #[test]
    fn test_canonical_bytes_track_changes() {
        let a = WeightTable::new(2).with_uniform(1, 3);
        let b = WeightTable::new(2).with_uniform(1, 4);
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
        assert_eq!(a.canonical_bytes(), a.clone().canonical_bytes());
    }
}
