//! Slot engine configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, SlotResult};
use crate::features::BonusRules;
use crate::symbols::{Symbol, SymbolId, SymbolSet, SymbolType};
use crate::weights::WeightTable;

/// Grid specification (reels × rows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of reels (columns)
    pub reels: usize,
    /// Number of visible rows per reel
    pub rows: usize,
}

impl GridSpec {
    /// Standard 5×3
    pub fn standard_5x3() -> Self {
        Self { reels: 5, rows: 3 }
    }

    /// Total grid positions
    pub fn total_positions(&self) -> usize {
        self.reels * self.rows
    }

    pub fn validate(&self) -> SlotResult<()> {
        if self.reels == 0 || self.rows == 0 {
            return Err(ConfigurationError::InvalidGeometry {
                reels: self.reels,
                rows: self.rows,
            }
            .into());
        }
        Ok(())
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::standard_5x3()
    }
}

/// Volatility class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    Low,
    #[default]
    Medium,
    High,
}

impl Volatility {
    /// Multiplier applied to per-reel weights when strips are built
    pub fn strip_scale(&self) -> f64 {
        match self {
            Volatility::High => 0.8,
            Volatility::Medium => 1.0,
            Volatility::Low => 1.2,
        }
    }

    /// Percentage points added to the base RTP estimate
    pub fn rtp_adjustment(&self) -> f64 {
        match self {
            Volatility::High => -2.0,
            Volatility::Medium => 0.0,
            Volatility::Low => 2.0,
        }
    }
}

/// RTP / volatility tuning, read-only to the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RtConfig {
    /// Target RTP as a fraction, in [0.85, 0.98]
    pub target_rtp: f64,
    pub volatility: Volatility,
    /// Spins per forced bonus
    pub bonus_frequency: f64,
    /// Spins per forced jackpot
    pub jackpot_frequency: f64,
}

impl RtConfig {
    pub const MIN_TARGET_RTP: f64 = 0.85;
    pub const MAX_TARGET_RTP: f64 = 0.98;

    pub fn validate(&self) -> SlotResult<()> {
        if !(Self::MIN_TARGET_RTP..=Self::MAX_TARGET_RTP).contains(&self.target_rtp) {
            return Err(ConfigurationError::TargetRtpOutOfRange(self.target_rtp).into());
        }
        for (name, value) in [
            ("bonus_frequency", self.bonus_frequency),
            ("jackpot_frequency", self.jackpot_frequency),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigurationError::NonPositiveFrequency { name, value }.into());
            }
        }
        Ok(())
    }

    /// Per-spin probability of a forced bonus
    pub fn bonus_probability(&self) -> f64 {
        (1.0 / self.bonus_frequency).min(1.0)
    }

    /// Per-spin probability of a forced jackpot
    pub fn jackpot_probability(&self) -> f64 {
        (1.0 / self.jackpot_frequency).min(1.0)
    }
}

impl Default for RtConfig {
    fn default() -> Self {
        Self {
            target_rtp: 0.96,
            volatility: Volatility::Medium,
            bonus_frequency: 150.0,
            jackpot_frequency: 50_000.0,
        }
    }
}

/// How wins are evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayMode {
    /// Left-to-right paylines; each line lists a row per reel (0 = top)
    Lines { paylines: Vec<Vec<usize>> },
    /// Orthogonally adjacent clusters
    Cluster { min_cluster: usize },
}

impl PayMode {
    pub fn is_cluster(&self) -> bool {
        matches!(self, PayMode::Cluster { .. })
    }
}

/// Standard payline patterns for a 5×3 grid
pub fn standard_20_paylines() -> Vec<Vec<usize>> {
    vec![
        // Straight lines
        vec![1, 1, 1, 1, 1],
        vec![0, 0, 0, 0, 0],
        vec![2, 2, 2, 2, 2],
        // V shapes
        vec![0, 1, 2, 1, 0],
        vec![2, 1, 0, 1, 2],
        // Zigzag
        vec![0, 0, 1, 2, 2],
        vec![2, 2, 1, 0, 0],
        vec![1, 0, 0, 0, 1],
        vec![1, 2, 2, 2, 1],
        // W shapes
        vec![0, 1, 0, 1, 0],
        vec![2, 1, 2, 1, 2],
        vec![0, 1, 1, 1, 0],
        vec![2, 1, 1, 1, 2],
        // Steps
        vec![1, 1, 0, 1, 1],
        vec![1, 1, 2, 1, 1],
        vec![0, 2, 0, 2, 0],
        vec![2, 0, 2, 0, 2],
        vec![1, 0, 1, 0, 1],
        vec![1, 2, 1, 2, 1],
        vec![0, 0, 2, 0, 0],
    ]
}

fn default_forcing() -> bool {
    true
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Game name
    pub name: String,
    /// Grid specification
    pub grid: GridSpec,
    /// Symbol definitions
    pub symbols: SymbolSet,
    /// Per-reel symbol weights
    pub weights: WeightTable,
    /// RTP and volatility tuning
    #[serde(rename = "rtp")]
    pub rt: RtConfig,
    /// Line or cluster evaluation
    pub pay_mode: PayMode,
    /// Bonus feature constants
    #[serde(default)]
    pub rules: BonusRules,
    /// Symbols drawn uniformly to refill cascaded cells
    pub cascade_fill: Vec<SymbolId>,
    /// Force scatters/jackpots at the configured frequencies
    #[serde(default = "default_forcing")]
    pub outcome_forcing: bool,
}

impl GameConfig {
    /// Classic 5×3, 20 lines. Pays scaled to land near the 92% target.
    pub fn standard_5x3() -> Self {
        Self {
            name: "Standard 5x3".into(),
            grid: GridSpec::standard_5x3(),
            symbols: SymbolSet::standard().with_pay_scale(1.04),
            weights: WeightTable::standard_5_reel(),
            rt: RtConfig {
                target_rtp: 0.92,
                ..RtConfig::default()
            },
            pay_mode: PayMode::Lines {
                paylines: standard_20_paylines(),
            },
            rules: BonusRules::default(),
            cascade_fill: vec![5, 6, 7, 8],
            outcome_forcing: true,
        }
    }

    /// 6×5 cluster-pays cascade game. Pays scaled to land near the 92% target.
    pub fn cluster_6x5() -> Self {
        let symbols = SymbolSet::new(vec![
            Symbol::regular(1, "RED", &[1.0, 2.5, 10.0]),
            Symbol::regular(2, "GREEN", &[0.8, 2.0, 8.0]),
            Symbol::regular(3, "BLUE", &[0.6, 1.5, 6.0]),
            Symbol::regular(4, "PURPLE", &[0.5, 1.0, 4.0]),
            Symbol::regular(5, "YELLOW", &[0.4, 0.8, 3.0]),
            Symbol::wild(11, "WILD"),
            Symbol::scatter(12, "SCATTER"),
        ])
        .with_pay_scale(0.79);
        let weights = WeightTable::new(6)
            .with_uniform(1, 6)
            .with_uniform(2, 7)
            .with_uniform(3, 8)
            .with_uniform(4, 9)
            .with_uniform(5, 10)
            .with_uniform(11, 1)
            .with_uniform(12, 1);

        Self {
            name: "Cluster 6x5".into(),
            grid: GridSpec { reels: 6, rows: 5 },
            symbols,
            weights,
            rt: RtConfig {
                target_rtp: 0.92,
                volatility: Volatility::High,
                ..RtConfig::default()
            },
            pay_mode: PayMode::Cluster { min_cluster: 5 },
            rules: BonusRules::default(),
            cascade_fill: vec![1, 2, 3, 4, 5],
            outcome_forcing: true,
        }
    }

    /// Reject anything the engine cannot run
    pub fn validate(&self) -> SlotResult<()> {
        self.grid.validate()?;

        if self.weights.reel_count() != self.grid.reels {
            return Err(ConfigurationError::InvalidWeightTable(format!(
                "table covers {} reels, grid has {}",
                self.weights.reel_count(),
                self.grid.reels
            ))
            .into());
        }
        self.weights.validate()?;
        self.weights.validate_symbols(&self.symbols)?;

        let scatters = self.symbols.ids_of(SymbolType::Scatter).len();
        if scatters != 1 {
            return Err(rule_error(
                "symbols",
                format!("expected exactly one scatter, found {}", scatters),
            ));
        }
        if self.symbols.wild_id().is_none() {
            return Err(rule_error("symbols", "no wild symbol defined"));
        }

        if self.cascade_fill.is_empty() {
            return Err(rule_error("cascade_fill", "fill set is empty"));
        }
        if let Some(&id) = self.cascade_fill.iter().find(|&&id| !self.symbols.contains(id)) {
            return Err(ConfigurationError::UnknownSymbol(id).into());
        }

        self.rt.validate()?;
        self.validate_pay_mode()?;
        self.rules.validate()?;
        Ok(())
    }

    fn validate_pay_mode(&self) -> SlotResult<()> {
        match &self.pay_mode {
            PayMode::Lines { paylines } => {
                if paylines.is_empty() {
                    return Err(rule_error("paylines", "no paylines defined"));
                }
                for (index, line) in paylines.iter().enumerate() {
                    if line.len() != self.grid.reels {
                        return Err(rule_error(
                            "paylines",
                            format!("line {} has {} positions", index, line.len()),
                        ));
                    }
                    if line.iter().any(|&row| row >= self.grid.rows) {
                        return Err(rule_error(
                            "paylines",
                            format!("line {} leaves the grid", index),
                        ));
                    }
                }
            }
            PayMode::Cluster { min_cluster } => {
                if *min_cluster < 2 {
                    return Err(rule_error("min_cluster", "must be at least 2"));
                }
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> SlotResult<Self> {
        let config: GameConfig = serde_json::from_str(json)
            .map_err(|e| ConfigurationError::Document(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> SlotResult<Self> {
        let config: GameConfig = serde_yml::from_str(yaml)
            .map_err(|e| ConfigurationError::Document(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> SlotResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::Document(format!("{}: {}", path.display(), e)))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&text),
            _ => Self::from_json(&text),
        }
    }

    /// Export as pretty JSON
    pub fn to_json(&self) -> SlotResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConfigurationError::Document(e.to_string()).into())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::standard_5x3()
    }
}

fn rule_error(name: &'static str, reason: impl Into<String>) -> crate::error::SlotError {
    ConfigurationError::InvalidRule {
        name,
        reason: reason.into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SlotError;

    #[test]
    fn test_presets_validate() {
        GameConfig::standard_5x3().validate().unwrap();
        GameConfig::cluster_6x5().validate().unwrap();
    }

    #[test]
    fn test_grid_spec() {
        let grid = GridSpec::standard_5x3();
        assert_eq!(grid.total_positions(), 15);
        assert!(GridSpec { reels: 0, rows: 3 }.validate().is_err());
        assert!(GridSpec { reels: 5, rows: 0 }.validate().is_err());
    }

    #[test]
    fn test_volatility_tables() {
        assert_eq!(Volatility::High.strip_scale(), 0.8);
        assert_eq!(Volatility::Medium.strip_scale(), 1.0);
        assert_eq!(Volatility::Low.strip_scale(), 1.2);
        assert_eq!(Volatility::High.rtp_adjustment(), -2.0);
        assert_eq!(Volatility::Low.rtp_adjustment(), 2.0);
    }

    #[test]
    fn test_rt_config_bounds() {
        let mut rt = RtConfig::default();
        rt.validate().unwrap();

        rt.target_rtp = 0.99;
        assert_eq!(
            rt.validate(),
            Err(SlotError::Configuration(ConfigurationError::TargetRtpOutOfRange(0.99)))
        );

        rt.target_rtp = 0.85;
        rt.validate().unwrap();
        rt.target_rtp = 0.98;
        rt.validate().unwrap();

        rt.bonus_frequency = 0.0;
        assert!(matches!(
            rt.validate(),
            Err(SlotError::Configuration(ConfigurationError::NonPositiveFrequency {
                name: "bonus_frequency",
                ..
            }))
        ));
    }

    #[test]
    fn test_weight_table_must_match_grid() {
        let mut config = GameConfig::standard_5x3();
        config.grid.reels = 6;
        assert!(matches!(
            config.validate(),
            Err(SlotError::Configuration(ConfigurationError::InvalidWeightTable(_)))
        ));
    }

    #[test]
    fn test_missing_scatter_rejected() {
        let mut config = GameConfig::standard_5x3();
        config.symbols.symbols.retain(|s| s.id != 12);
        // the weight table still references 12
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_second_scatter_rejected() {
        let mut config = GameConfig::standard_5x3();
        config.symbols.symbols.push(Symbol::scatter(20, "SCATTER2"));
        assert!(matches!(
            config.validate(),
            Err(SlotError::Configuration(ConfigurationError::InvalidRule { name: "symbols", .. }))
        ));
    }

    #[test]
    fn test_payline_outside_grid() {
        let mut config = GameConfig::standard_5x3();
        config.pay_mode = PayMode::Lines {
            paylines: vec![vec![0, 1, 3, 1, 0]],
        };
        assert!(matches!(
            config.validate(),
            Err(SlotError::Configuration(ConfigurationError::InvalidRule { name: "paylines", .. }))
        ));
    }

    #[test]
    fn test_json_roundtrip_validates() {
        let json = GameConfig::cluster_6x5().to_json().unwrap();
        let parsed = GameConfig::from_json(&json).unwrap();
        assert_eq!(parsed, GameConfig::cluster_6x5());

        let broken = json.replace("\"rows\": 5", "\"rows\": 0");
        assert!(matches!(
            GameConfig::from_json(&broken),
            Err(SlotError::Configuration(ConfigurationError::InvalidGeometry { .. }))
        ));
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            GameConfig::from_json("{ not json"),
            Err(SlotError::Configuration(ConfigurationError::Document(_)))
        ));
        assert!(matches!(
            GameConfig::from_yaml("name: [unterminated"),
            Err(SlotError::Configuration(ConfigurationError::Document(_)))
        ));
    }

    #[test]
    fn test_yaml_document() {
        let yaml = serde_yml::to_string(&GameConfig::standard_5x3()).unwrap();
        let parsed = GameConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.grid, GridSpec::standard_5x3());
        assert!(parsed.outcome_forcing);
    }
}
