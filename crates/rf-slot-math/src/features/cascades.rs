//! Cascade (tumble) step
//!
//! Winning cells are emptied, the survivors in each reel fall to the bottom,
//! and the vacated top cells are refilled uniformly from a fixed fill set.
//! Callers own the iteration cap.

use crate::error::{ConfigurationError, SlotResult};
use crate::grid::{Grid, Position};
use crate::random::RandomSource;
use crate::symbols::SymbolId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeProcessor {
    fill: Vec<SymbolId>,
}

impl CascadeProcessor {
    pub fn new(fill: Vec<SymbolId>) -> SlotResult<Self> {
        if fill.is_empty() {
            return Err(ConfigurationError::InvalidRule {
                name: "cascade_fill",
                reason: "fill set is empty".into(),
            }
            .into());
        }
        Ok(Self { fill })
    }

    pub fn fill(&self) -> &[SymbolId] {
        &self.fill
    }

    /// Empty the winning cells and let each reel fall.
    ///
    /// Empty cells end up at the top of their reel.
    pub fn collapse(grid: &Grid, positions: &[Position]) -> Grid {
        let mut next = grid.clone();
        for &pos in positions {
            next.clear(pos);
        }
        for reel in 0..next.reels() {
            if let Some(column) = next.column_mut(reel) {
                let rows = column.len();
                let survivors: Vec<Option<SymbolId>> =
                    column.iter().copied().filter(Option::is_some).collect();
                let mut fallen = vec![None; rows - survivors.len()];
                fallen.extend(survivors);
                *column = fallen;
            }
        }
        next
    }

    /// One full cascade step.
    ///
    /// With no winning positions the grid comes back unchanged and nothing is
    /// drawn. Otherwise refills draw reel by reel, top to bottom.
    pub fn cascade<R: RandomSource + ?Sized>(
        &self,
        grid: &Grid,
        positions: &[Position],
        rng: &mut R,
    ) -> SlotResult<Grid> {
        if positions.is_empty() {
            return Ok(grid.clone());
        }

        let mut next = Self::collapse(grid, positions);
        for reel in 0..next.reels() {
            for row in 0..next.rows() {
                let pos = Position::new(reel, row);
                if next.get(pos).is_none() {
                    let symbol = self.fill[rng.next_index(self.fill.len())?];
                    next.set(pos, symbol);
                }
            }
        }
        Ok(next)
    }
}
