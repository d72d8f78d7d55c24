//! Win evaluation: paylines and clusters

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::{GameConfig, PayMode};
use crate::grid::{Grid, Position};
use crate::symbols::{SymbolId, SymbolSet};

/// How a win was formed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WinKind {
    Line { index: usize },
    Cluster,
}

/// One paying combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Win {
    pub kind: WinKind,
    /// Paying symbol
    pub symbol: SymbolId,
    /// Symbols in the combination, wilds included
    pub count: usize,
    pub positions: Vec<Position>,
    pub payout: f64,
}

/// Result of evaluating a grid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WinEvaluation {
    pub wins: Vec<Win>,
    /// Sum of all payouts
    pub total: f64,
}

impl WinEvaluation {
    pub fn from_wins(wins: Vec<Win>) -> Self {
        let total = wins.iter().map(|w| w.payout).sum();
        Self { wins, total }
    }

    pub fn is_win(&self) -> bool {
        !self.wins.is_empty()
    }

    /// Every position taking part in a win, sorted and deduplicated
    pub fn winning_positions(&self) -> Vec<Position> {
        let mut positions: Vec<Position> = self
            .wins
            .iter()
            .flat_map(|w| w.positions.iter().copied())
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions
    }
}

/// Turns a grid into wins
pub trait WinEvaluator: Send + Sync {
    fn evaluate(&self, grid: &Grid, bet: f64) -> WinEvaluation;
}

/// Evaluator for a configuration's pay mode
pub fn evaluator_for(config: &GameConfig) -> Box<dyn WinEvaluator> {
    match &config.pay_mode {
        PayMode::Lines { paylines } => Box::new(LinePayEvaluator::new(
            config.symbols.clone(),
            paylines.clone(),
        )),
        PayMode::Cluster { min_cluster } => Box::new(ClusterPayEvaluator::new(
            config.symbols.clone(),
            *min_cluster,
        )),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LINES
// ═══════════════════════════════════════════════════════════════════════════════

/// Left-to-right paylines with wild substitution
#[derive(Debug, Clone)]
pub struct LinePayEvaluator {
    symbols: SymbolSet,
    paylines: Vec<Vec<usize>>,
}

impl LinePayEvaluator {
    pub fn new(symbols: SymbolSet, paylines: Vec<Vec<usize>>) -> Self {
        Self { symbols, paylines }
    }

    pub fn line_count(&self) -> usize {
        self.paylines.len()
    }

    fn evaluate_line(&self, grid: &Grid, index: usize, line: &[usize], line_bet: f64) -> Option<Win> {
        let cells: Vec<(Position, Option<SymbolId>)> = line
            .iter()
            .enumerate()
            .map(|(reel, &row)| {
                let pos = Position::new(reel, row);
                (pos, grid.get(pos))
            })
            .collect();

        let is_wild = |s: Option<SymbolId>| s.is_some_and(|id| self.symbols.is_wild(id));

        // The first non-wild symbol decides the line; an all-wild line pays as wild
        let lead = cells
            .iter()
            .map(|&(_, s)| s)
            .find(|&s| !is_wild(s))
            .unwrap_or(cells.first()?.1);
        let lead = lead?;
        let lead_symbol = self.symbols.get(lead)?;

        let (paying, matches): (SymbolId, usize) = if lead_symbol.is_substitutable() {
            let run = cells
                .iter()
                .take_while(|&&(_, s)| s == Some(lead) || is_wild(s))
                .count();
            (lead, run)
        } else if self.symbols.is_wild(lead) {
            (lead, cells.len())
        } else {
            // scatter/bonus lead: only the leading wild run can pay
            let run = cells.iter().take_while(|&&(_, s)| is_wild(s)).count();
            (cells.first()?.1?, run)
        };

        let pay = self.symbols.get(paying)?.get_pay(matches);
        if matches < 3 || pay <= 0.0 {
            return None;
        }

        Some(Win {
            kind: WinKind::Line { index },
            symbol: paying,
            count: matches,
            positions: cells.iter().take(matches).map(|&(p, _)| p).collect(),
            payout: line_bet * pay,
        })
    }
}

impl WinEvaluator for LinePayEvaluator {
    fn evaluate(&self, grid: &Grid, bet: f64) -> WinEvaluation {
        let line_bet = bet / self.paylines.len().max(1) as f64;
        let wins = self
            .paylines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.len() == grid.reels())
            .filter_map(|(index, line)| self.evaluate_line(grid, index, line, line_bet))
            .collect();
        WinEvaluation::from_wins(wins)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLUSTERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Orthogonally connected clusters; wilds join any cluster.
///
/// A cluster of `n ≥ min_cluster` symbols pays
/// `(bet / 20) × top_pay × n / min_cluster`.
#[derive(Debug, Clone)]
pub struct ClusterPayEvaluator {
    symbols: SymbolSet,
    min_cluster: usize,
}

impl ClusterPayEvaluator {
    /// Bet divisor giving the per-unit cluster stake
    pub const BET_UNITS: f64 = 20.0;

    pub fn new(symbols: SymbolSet, min_cluster: usize) -> Self {
        Self {
            symbols,
            min_cluster: min_cluster.max(1),
        }
    }

    /// Flood fill from `start` over cells holding `target` or a wild
    fn flood(&self, grid: &Grid, start: Position, target: SymbolId, seen: &mut [Vec<bool>]) -> Vec<Position> {
        let mut cluster = Vec::new();
        let mut queue = VecDeque::new();
        seen[start.reel][start.row] = true;
        queue.push_back(start);

        while let Some(pos) = queue.pop_front() {
            cluster.push(pos);
            for next in neighbours(pos, grid.reels(), grid.rows()) {
                if seen[next.reel][next.row] {
                    continue;
                }
                let joins = grid
                    .get(next)
                    .is_some_and(|s| s == target || self.symbols.is_wild(s));
                if joins {
                    seen[next.reel][next.row] = true;
                    queue.push_back(next);
                }
            }
        }
        cluster
    }
}

fn neighbours(pos: Position, reels: usize, rows: usize) -> impl Iterator<Item = Position> {
    let Position { reel, row } = pos;
    [
        (reel.checked_sub(1), Some(row)),
        ((reel + 1 < reels).then_some(reel + 1), Some(row)),
        (Some(reel), row.checked_sub(1)),
        (Some(reel), (row + 1 < rows).then_some(row + 1)),
    ]
    .into_iter()
    .filter_map(|(r, w)| Some(Position::new(r?, w?)))
}

impl WinEvaluator for ClusterPayEvaluator {
    fn evaluate(&self, grid: &Grid, bet: f64) -> WinEvaluation {
        let unit = bet / Self::BET_UNITS;
        let mut wins = Vec::new();

        for symbol in self.symbols.symbols.iter().filter(|s| s.is_substitutable()) {
            // wilds may belong to one cluster per paying symbol
            let mut seen = vec![vec![false; grid.rows()]; grid.reels()];
            for start in grid.positions_of(symbol.id) {
                if seen[start.reel][start.row] {
                    continue;
                }
                let mut cluster = self.flood(grid, start, symbol.id, &mut seen);
                if cluster.len() < self.min_cluster {
                    continue;
                }
                cluster.sort_unstable();
                let count = cluster.len();
                wins.push(Win {
                    kind: WinKind::Cluster,
                    symbol: symbol.id,
                    count,
                    positions: cluster,
                    payout: unit * symbol.top_pay() * count as f64 / self.min_cluster as f64,
                });
            }
        }
        WinEvaluation::from_wins(wins)
    }
}
