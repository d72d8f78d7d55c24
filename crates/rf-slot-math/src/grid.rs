//! Visible symbol grid

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, SlotResult};
use crate::symbols::SymbolId;

/// Cell coordinate. Row 0 is the top of the reel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub reel: usize,
    pub row: usize,
}

impl Position {
    pub fn new(reel: usize, row: usize) -> Self {
        Self { reel, row }
    }
}

/// `reels × rows` symbols, stored column-major.
///
/// A cell is `None` only transiently, between removing a cascade's winning
/// symbols and refilling them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    reels: usize,
    rows: usize,
    cells: Vec<Vec<Option<SymbolId>>>,
}

impl Grid {
    /// Build from full columns; every column must have the same height
    pub fn from_columns(columns: Vec<Vec<SymbolId>>) -> SlotResult<Self> {
        let reels = columns.len();
        let rows = columns.first().map_or(0, Vec::len);
        if reels == 0 || rows == 0 || columns.iter().any(|c| c.len() != rows) {
            return Err(ConfigurationError::InvalidGeometry { reels, rows }.into());
        }
        Ok(Self {
            reels,
            rows,
            cells: columns
                .into_iter()
                .map(|c| c.into_iter().map(Some).collect())
                .collect(),
        })
    }

    pub fn reels(&self) -> usize {
        self.reels
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn get(&self, pos: Position) -> Option<SymbolId> {
        self.cells.get(pos.reel)?.get(pos.row).copied().flatten()
    }

    pub fn set(&mut self, pos: Position, symbol: SymbolId) {
        if let Some(cell) = self.cell_mut(pos) {
            *cell = Some(symbol);
        }
    }

    pub fn clear(&mut self, pos: Position) {
        if let Some(cell) = self.cell_mut(pos) {
            *cell = None;
        }
    }

    fn cell_mut(&mut self, pos: Position) -> Option<&mut Option<SymbolId>> {
        self.cells.get_mut(pos.reel)?.get_mut(pos.row)
    }

    /// Raw column, top to bottom
    pub fn column(&self, reel: usize) -> &[Option<SymbolId>] {
        self.cells.get(reel).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn column_mut(&mut self, reel: usize) -> Option<&mut Vec<Option<SymbolId>>> {
        self.cells.get_mut(reel)
    }

    /// Occurrences of a symbol anywhere on the grid
    pub fn count(&self, symbol: SymbolId) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&c| c == Some(symbol))
            .count()
    }

    /// Positions holding a symbol, reel by reel
    pub fn positions_of(&self, symbol: SymbolId) -> Vec<Position> {
        self.positions()
            .filter(|&p| self.get(p) == Some(symbol))
            .collect()
    }

    /// Every position, reel-major
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.reels).flat_map(move |reel| (0..self.rows).map(move |row| Position::new(reel, row)))
    }

    pub fn reel_contains(&self, reel: usize, symbol: SymbolId) -> bool {
        self.column(reel).contains(&Some(symbol))
    }

    /// Fill a whole reel with one symbol
    pub fn expand_reel(&mut self, reel: usize, symbol: SymbolId) {
        if let Some(column) = self.cells.get_mut(reel) {
            column.iter_mut().for_each(|c| *c = Some(symbol));
        }
    }

    /// True when no cell is empty
    pub fn is_filled(&self) -> bool {
        self.cells.iter().flatten().all(Option::is_some)
    }

    /// Full columns, or `None` while any cell is empty
    pub fn to_columns(&self) -> Option<Vec<Vec<SymbolId>>> {
        self.cells
            .iter()
            .map(|c| c.iter().copied().collect::<Option<Vec<_>>>())
            .collect()
    }
}
