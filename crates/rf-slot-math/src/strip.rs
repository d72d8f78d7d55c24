//! Reel strips: building from weight tables and caching
//!
//! ```text
//! WeightTable ──(reel, volatility)──▶ ReelStripBuilder ──▶ ReelStrip
//!                                            │
//!                       StripCache[(reel, fingerprint)] ◀┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::Volatility;
use crate::error::{ConfigurationError, SlotResult};
use crate::symbols::SymbolId;
use crate::weights::WeightTable;

/// A concrete reel strip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReelStrip {
    /// Reel index
    pub reel_index: usize,
    /// Symbol IDs in order
    pub symbols: Vec<SymbolId>,
}

impl ReelStrip {
    /// Create a new reel strip
    pub fn new(reel_index: usize, symbols: Vec<SymbolId>) -> Self {
        Self {
            reel_index,
            symbols,
        }
    }

    /// Get symbol at position (wraps around)
    pub fn symbol_at(&self, position: usize) -> SymbolId {
        self.symbols[position % self.symbols.len()]
    }

    /// Get total strip length
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Occurrences of a symbol on the strip
    pub fn count(&self, symbol: SymbolId) -> usize {
        self.symbols.iter().filter(|&&s| s == symbol).count()
    }
}

impl AsRef<ReelStrip> for ReelStrip {
    fn as_ref(&self) -> &ReelStrip {
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUILDER
// ═══════════════════════════════════════════════════════════════════════════════

/// Expands weight tables into strips. Stateless and deterministic.
pub struct ReelStripBuilder;

impl ReelStripBuilder {
    /// Occurrences a symbol gets on a strip.
    ///
    /// `round(weight × scale)`, never below 1 for a positive weight.
    pub fn scaled_count(weight: u32, volatility: Volatility) -> usize {
        if weight == 0 {
            return 0;
        }
        let scaled = (weight as f64 * volatility.strip_scale()).round();
        (scaled as usize).max(1)
    }

    /// Strip length a reel will get
    pub fn expected_length(table: &WeightTable, reel_index: usize, volatility: Volatility) -> usize {
        table
            .reel_weights(reel_index)
            .iter()
            .map(|&(_, w)| Self::scaled_count(w, volatility))
            .sum()
    }

    /// Build the strip for one reel.
    ///
    /// Each symbol's occurrences are spread evenly along the strip: the k-th
    /// copy of a symbol with `c` copies sits at ideal offset
    /// `(k + ½) · len / c`, ties broken by table order.
    pub fn build_strip(
        reel_index: usize,
        table: &WeightTable,
        volatility: Volatility,
    ) -> SlotResult<ReelStrip> {
        if reel_index >= table.reel_count() {
            return Err(ConfigurationError::InvalidWeightTable(format!(
                "reel {} out of range for {} reels",
                reel_index,
                table.reel_count()
            ))
            .into());
        }

        let counts: Vec<(SymbolId, usize)> = table
            .reel_weights(reel_index)
            .into_iter()
            .map(|(id, w)| (id, Self::scaled_count(w, volatility)))
            .collect();

        let length: usize = counts.iter().map(|&(_, c)| c).sum();
        if length == 0 {
            return Err(ConfigurationError::ZeroWeightReel { reel: reel_index }.into());
        }

        let mut slots: Vec<(f64, usize, SymbolId)> = Vec::with_capacity(length);
        for (order, &(id, count)) in counts.iter().enumerate() {
            let spacing = length as f64 / count.max(1) as f64;
            for k in 0..count {
                slots.push(((k as f64 + 0.5) * spacing, order, id));
            }
        }
        slots.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        Ok(ReelStrip::new(
            reel_index,
            slots.into_iter().map(|(_, _, id)| id).collect(),
        ))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// Cache key: reel index plus a fingerprint of everything the strip depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StripKey {
    pub reel_index: usize,
    pub fingerprint: String,
}

/// Read-mostly strip cache.
///
/// Population races are harmless: a strip is a pure function of its key, so
/// two callers building the same entry produce identical strips and the last
/// insert wins.
#[derive(Debug, Default)]
pub struct StripCache {
    strips: RwLock<HashMap<StripKey, Arc<ReelStrip>>>,
}

impl StripCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// SHA-256 over the weight table and volatility
    pub fn fingerprint(table: &WeightTable, volatility: Volatility) -> String {
        let mut hasher = Sha256::new();
        hasher.update(table.canonical_bytes());
        hasher.update([volatility as u8]);
        hex::encode(hasher.finalize())
    }

    /// Cached strip for a reel, building it on a miss
    pub fn get_or_build(
        &self,
        reel_index: usize,
        table: &WeightTable,
        volatility: Volatility,
    ) -> SlotResult<Arc<ReelStrip>> {
        let key = StripKey {
            reel_index,
            fingerprint: Self::fingerprint(table, volatility),
        };
        self.get_or_build_keyed(key, table, volatility)
    }

    /// Strips for every reel of a table
    pub fn strips_for(
        &self,
        table: &WeightTable,
        volatility: Volatility,
    ) -> SlotResult<Vec<Arc<ReelStrip>>> {
        let fingerprint = Self::fingerprint(table, volatility);
        (0..table.reel_count())
            .map(|reel_index| {
                let key = StripKey {
                    reel_index,
                    fingerprint: fingerprint.clone(),
                };
                self.get_or_build_keyed(key, table, volatility)
            })
            .collect()
    }

    fn get_or_build_keyed(
        &self,
        key: StripKey,
        table: &WeightTable,
        volatility: Volatility,
    ) -> SlotResult<Arc<ReelStrip>> {
        if let Some(strip) = self.strips.read().get(&key) {
            return Ok(Arc::clone(strip));
        }

        let strip = Arc::new(ReelStripBuilder::build_strip(key.reel_index, table, volatility)?);
        log::debug!(
            "Built strip for reel {} ({} stops, {:?} volatility)",
            key.reel_index,
            strip.len(),
            volatility
        );
        self.strips.write().insert(key, Arc::clone(&strip));
        Ok(strip)
    }

    /// Drop every cached strip
    pub fn invalidate(&self) {
        self.strips.write().clear();
    }

    /// Number of cached strips
    pub fn len(&self) -> usize {
        self.strips.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.strips.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SlotError;

    fn table() -> WeightTable {
        WeightTable::new(2)
            .with_reels(1, 10, vec![10, 5])
            .with_reels(2, 3, vec![3, 1])
            .with_reels(3, 1, vec![1, 0])
    }

    #[test]
    fn test_scaled_counts() {
        assert_eq!(ReelStripBuilder::scaled_count(10, Volatility::High), 8);
        assert_eq!(ReelStripBuilder::scaled_count(10, Volatility::Medium), 10);
        assert_eq!(ReelStripBuilder::scaled_count(10, Volatility::Low), 12);
        // 3 × 1.2 = 3.6 → 4; 1 × 0.8 = 0.8 → 1
        assert_eq!(ReelStripBuilder::scaled_count(3, Volatility::Low), 4);
        assert_eq!(ReelStripBuilder::scaled_count(1, Volatility::High), 1);
        assert_eq!(ReelStripBuilder::scaled_count(0, Volatility::Low), 0);
    }

    #[test]
    fn test_length_matches_scaled_sum() {
        let table = table();
        for vol in [Volatility::Low, Volatility::Medium, Volatility::High] {
            for reel in 0..2 {
                let strip = ReelStripBuilder::build_strip(reel, &table, vol).unwrap();
                let expected: usize = table
                    .reel_weights(reel)
                    .iter()
                    .map(|&(_, w)| ReelStripBuilder::scaled_count(w, vol))
                    .sum();
                assert_eq!(strip.len(), expected);
                for (id, w) in table.reel_weights(reel) {
                    if w > 0 {
                        assert!(strip.count(id) >= 1);
                    } else {
                        assert_eq!(strip.count(id), 0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_symbols_are_spread() {
        let table = WeightTable::new(1).with_uniform(1, 4).with_uniform(2, 4);
        let strip = ReelStripBuilder::build_strip(0, &table, Volatility::Medium).unwrap();
        assert_eq!(strip.symbols, vec![1, 2, 1, 2, 1, 2, 1, 2]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let table = WeightTable::standard_5_reel();
        let a = ReelStripBuilder::build_strip(2, &table, Volatility::High).unwrap();
        let b = ReelStripBuilder::build_strip(2, &table, Volatility::High).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_reel_fails() {
        let table = WeightTable::new(2)
            .with_reels(1, 1, vec![1, 0])
            .with_reels(2, 1, vec![1, 0]);
        assert_eq!(
            ReelStripBuilder::build_strip(1, &table, Volatility::Medium),
            Err(SlotError::Configuration(ConfigurationError::ZeroWeightReel { reel: 1 }))
        );
        assert!(ReelStripBuilder::build_strip(2, &table, Volatility::Medium).is_err());
    }

    #[test]
    fn test_strip_wrap() {
        let strip = ReelStrip::new(0, vec![1, 2, 3, 4, 5]);
        assert_eq!(strip.symbol_at(0), 1);
        assert_eq!(strip.symbol_at(5), 1);
        assert_eq!(strip.symbol_at(7), 3);
    }

    #[test]
    fn test_cache_reuses_and_invalidates() {
        let cache = StripCache::new();
        let table = table();

        let a = cache.get_or_build(0, &table, Volatility::Medium).unwrap();
        let b = cache.get_or_build(0, &table, Volatility::Medium).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        // a different volatility is a different key
        let c = cache.get_or_build(0, &table, Volatility::High).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);

        cache.invalidate();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_fingerprint_changes_with_inputs() {
        let t = table();
        let f1 = StripCache::fingerprint(&t, Volatility::Medium);
        let f2 = StripCache::fingerprint(&t, Volatility::Low);
        let f3 = StripCache::fingerprint(&t.clone().with_uniform(4, 1), Volatility::Medium);
        assert_ne!(f1, f2);
        assert_ne!(f1, f3);
        assert_eq!(f1, StripCache::fingerprint(&table(), Volatility::Medium));
    }

    #[test]
    fn test_strips_for_all_reels() {
        let cache = StripCache::new();
        let strips = cache.strips_for(&table(), Volatility::Medium).unwrap();
        assert_eq!(strips.len(), 2);
        assert_eq!(strips[1].reel_index, 1);
        assert_eq!(strips[1].len(), 6);
    }
}
