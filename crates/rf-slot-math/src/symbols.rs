//! Symbol definitions

use serde::{Deserialize, Serialize};

/// Symbol identifier as it appears on strips and grids
pub type SymbolId = u32;

/// Symbol type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolType {
    /// Regular paying symbol
    Regular,
    /// Wild - substitutes for regular symbols
    Wild,
    /// Scatter - triggers free spins regardless of position
    Scatter,
    /// Bonus - triggers the bonus game
    Bonus,
    /// Jackpot symbol, target of jackpot forcing
    Jackpot,
}

/// A symbol definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// Unique symbol ID
    pub id: SymbolId,
    /// Symbol name (e.g., "HP1", "LP3", "WILD", "SCATTER")
    pub name: String,
    /// Symbol type
    #[serde(rename = "type")]
    pub symbol_type: SymbolType,
    /// Pay values for 3, 4, 5 of a kind, as line-bet multipliers
    #[serde(default)]
    pub pay_values: Vec<f64>,
}

impl Symbol {
    /// Create a regular symbol
    pub fn regular(id: SymbolId, name: impl Into<String>, pays: &[f64]) -> Self {
        Self {
            id,
            name: name.into(),
            symbol_type: SymbolType::Regular,
            pay_values: pays.to_vec(),
        }
    }

    /// Create a wild symbol
    pub fn wild(id: SymbolId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            symbol_type: SymbolType::Wild,
            pay_values: vec![50.0, 200.0, 1000.0],
        }
    }

    /// Create a scatter symbol. Scatters trigger, they do not pay.
    pub fn scatter(id: SymbolId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            symbol_type: SymbolType::Scatter,
            pay_values: Vec::new(),
        }
    }

    /// Create a bonus symbol
    pub fn bonus(id: SymbolId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            symbol_type: SymbolType::Bonus,
            pay_values: Vec::new(),
        }
    }

    /// Create a jackpot symbol
    pub fn jackpot(id: SymbolId, name: impl Into<String>, pays: &[f64]) -> Self {
        Self {
            id,
            name: name.into(),
            symbol_type: SymbolType::Jackpot,
            pay_values: pays.to_vec(),
        }
    }

    /// Get pay value for a match count
    pub fn get_pay(&self, match_count: usize) -> f64 {
        if match_count < 3 {
            return 0.0;
        }
        self.pay_values
            .get(match_count - 3)
            .copied()
            .unwrap_or(0.0)
    }

    /// Highest pay value (0 for non-paying symbols)
    pub fn top_pay(&self) -> f64 {
        self.pay_values.iter().copied().fold(0.0, f64::max)
    }

    /// Can a wild stand in for this symbol?
    pub fn is_substitutable(&self) -> bool {
        matches!(self.symbol_type, SymbolType::Regular | SymbolType::Jackpot)
    }
}

/// The symbols a game is built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolSet {
    pub symbols: Vec<Symbol>,
}

impl SymbolSet {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self { symbols }
    }

    /// Classic 5-reel set.
    /// HP = high paying, LP = low paying; HP1 is the top symbol.
    pub fn standard() -> Self {
        Self::new(vec![
            Symbol::regular(1, "HP1", &[20.0, 100.0, 500.0]),
            Symbol::regular(2, "HP2", &[15.0, 75.0, 300.0]),
            Symbol::regular(3, "HP3", &[10.0, 50.0, 200.0]),
            Symbol::regular(4, "HP4", &[8.0, 40.0, 150.0]),
            Symbol::regular(5, "LP1", &[5.0, 25.0, 100.0]),
            Symbol::regular(6, "LP2", &[4.0, 20.0, 80.0]),
            Symbol::regular(7, "LP3", &[3.0, 15.0, 60.0]),
            Symbol::regular(8, "LP4", &[2.0, 10.0, 40.0]),
            Symbol::wild(11, "WILD"),
            Symbol::scatter(12, "SCATTER"),
            Symbol::bonus(13, "BONUS"),
            Symbol::jackpot(14, "JACKPOT", &[50.0, 250.0, 2500.0]),
        ])
    }

    /// Multiply every pay value by `factor`.
    /// Every payout is linear in the pay table, so RTP scales by `factor` too.
    pub fn with_pay_scale(mut self, factor: f64) -> Self {
        for symbol in &mut self.symbols {
            for pay in &mut symbol.pay_values {
                *pay *= factor;
            }
        }
        self
    }

    /// Get symbol by ID
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.id == id)
    }

    /// Is the ID defined in this set?
    pub fn contains(&self, id: SymbolId) -> bool {
        self.get(id).is_some()
    }

    /// IDs of every symbol of a type, in definition order
    pub fn ids_of(&self, symbol_type: SymbolType) -> Vec<SymbolId> {
        self.symbols
            .iter()
            .filter(|s| s.symbol_type == symbol_type)
            .map(|s| s.id)
            .collect()
    }

    /// Get all regular symbol IDs
    pub fn regular_ids(&self) -> Vec<SymbolId> {
        self.ids_of(SymbolType::Regular)
    }

    /// First wild symbol ID
    pub fn wild_id(&self) -> Option<SymbolId> {
        self.first_of(SymbolType::Wild)
    }

    /// Scatter symbol ID
    pub fn scatter_id(&self) -> Option<SymbolId> {
        self.first_of(SymbolType::Scatter)
    }

    /// Bonus symbol ID
    pub fn bonus_id(&self) -> Option<SymbolId> {
        self.first_of(SymbolType::Bonus)
    }

    /// Jackpot symbol ID
    pub fn jackpot_id(&self) -> Option<SymbolId> {
        self.first_of(SymbolType::Jackpot)
    }

    /// Is this ID a wild?
    pub fn is_wild(&self, id: SymbolId) -> bool {
        self.get(id)
            .is_some_and(|s| s.symbol_type == SymbolType::Wild)
    }

    fn first_of(&self, symbol_type: SymbolType) -> Option<SymbolId> {
        self.symbols
            .iter()
            .find(|s| s.symbol_type == symbol_type)
            .map(|s| s.id)
    }
}

impl Default for SymbolSet {
    fn default() -> Self {
        Self::standard()
    }
}
