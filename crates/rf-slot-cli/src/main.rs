//! rf-slot — slot math command line
//!
//! Usage:
//!   rf-slot estimate             - Theoretical RTP of a game
//!   rf-slot strips               - Print the reel strips
//!   rf-slot spin --count 20      - Play seeded spins
//!   rf-slot simulate --quick     - Measure RTP by simulation
//!   rf-slot validate <file>      - Check a game configuration
//!   rf-slot preset cluster       - Print a preset configuration

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use rf_slot_math::{FeatureStateMachine, GameConfig, SeededRandom, SpinEngine, Volatility};
use rf_slot_sim::{CancelToken, SimulationConfig, Simulator};

#[derive(Parser)]
#[command(name = "rf-slot", about = "Slot math engine tools", version)]
struct Cli {
    /// Game configuration file (.json, .yaml, .yml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Preset used when no configuration file is given
    #[arg(short, long, global = true, value_enum, default_value = "standard")]
    preset: Preset,

    /// Override the configured volatility
    #[arg(long, global = true, value_enum)]
    volatility: Option<VolatilityArg>,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the theoretical RTP estimate
    Estimate,
    /// Print the reel strips
    Strips,
    /// Play seeded spins
    Spin {
        /// Number of spins
        #[arg(short = 'n', long, default_value_t = 10)]
        count: u32,
        /// Stake per paid spin
        #[arg(short, long, default_value_t = 1.0)]
        bet: f64,
        /// Seed (random when omitted)
        #[arg(short, long)]
        seed: Option<u64>,
        /// Print full outcomes as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Measure RTP by simulation
    Simulate {
        /// Use the quick preset instead of the thorough one
        #[arg(short, long)]
        quick: bool,
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(short, long)]
        workers: Option<usize>,
        #[arg(long)]
        min_trials: Option<u64>,
        #[arg(long)]
        max_trials: Option<u64>,
        /// Target 95% interval width, as an RTP fraction
        #[arg(long)]
        target_ci: Option<f64>,
        /// Stop after this many seconds and report partial results
        #[arg(long)]
        time_limit_secs: Option<u64>,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check a configuration file
    Validate {
        file: PathBuf,
    },
    /// Print a preset configuration
    Preset {
        #[arg(value_enum)]
        name: Preset,
        /// Emit YAML instead of JSON
        #[arg(long)]
        yaml: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Standard,
    Cluster,
}

impl Preset {
    fn config(self) -> GameConfig {
        match self {
            Preset::Standard => GameConfig::standard_5x3(),
            Preset::Cluster => GameConfig::cluster_6x5(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum VolatilityArg {
    Low,
    Medium,
    High,
}

impl From<VolatilityArg> for Volatility {
    fn from(v: VolatilityArg) -> Self {
        match v {
            VolatilityArg::Low => Volatility::Low,
            VolatilityArg::Medium => Volatility::Medium,
            VolatilityArg::High => Volatility::High,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Validate { ref file } => validate(file),
        Commands::Preset { name, yaml } => print_preset(name, yaml),
        Commands::Estimate => estimate(&build_engine(&cli)?),
        Commands::Strips => print_strips(&build_engine(&cli)?),
        Commands::Spin {
            count,
            bet,
            seed,
            json,
        } => play(&build_engine(&cli)?, count, bet, seed, json),
        Commands::Simulate {
            quick,
            seed,
            workers,
            min_trials,
            max_trials,
            target_ci,
            time_limit_secs,
            json,
        } => {
            let mut config = if quick {
                SimulationConfig::quick()
            } else {
                SimulationConfig::thorough()
            };
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            if let Some(workers) = workers {
                config = config.with_workers(workers);
            }
            let min = min_trials.unwrap_or(config.min_trials);
            let max = max_trials.unwrap_or(config.max_trials.max(min));
            config = config.with_trial_limits(min, max);
            if let Some(width) = target_ci {
                config = config.with_target_ci_width(width);
            }
            simulate(build_engine(&cli)?, &config, time_limit_secs, json)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_game(path: Option<&Path>, preset: Preset) -> Result<GameConfig> {
    match path {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("Failed to load game configuration {}", path.display())),
        None => Ok(preset.config()),
    }
}

fn build_engine(cli: &Cli) -> Result<SpinEngine> {
    let game = load_game(cli.config.as_deref(), cli.preset)?;
    let mut engine = SpinEngine::new(game).context("Game configuration rejected")?;
    if let Some(volatility) = cli.volatility {
        engine.set_volatility(volatility.into());
    }
    Ok(engine)
}

fn validate(file: &Path) -> Result<()> {
    let game = GameConfig::load(file)
        .with_context(|| format!("{} is not a valid game configuration", file.display()))?;
    println!(
        "{}: OK ({} reels x {} rows, {} symbols)",
        game.name,
        game.grid.reels,
        game.grid.rows,
        game.symbols.symbols.len()
    );
    Ok(())
}

fn print_preset(preset: Preset, yaml: bool) -> Result<()> {
    let config = preset.config();
    let text = if yaml {
        serde_yml::to_string(&config).context("YAML export failed")?
    } else {
        config.to_json().context("JSON export failed")?
    };
    println!("{}", text);
    Ok(())
}

fn estimate(engine: &SpinEngine) -> Result<()> {
    let rt = &engine.config().rt;
    println!("Game:              {}", engine.config().name);
    println!("Volatility:        {:?}", rt.volatility);
    println!("Target RTP:        {:.2}%", rt.target_rtp * 100.0);
    println!("Theoretical RTP:   {:.2}%", engine.theoretical_rtp());
    Ok(())
}

fn print_strips(engine: &SpinEngine) -> Result<()> {
    let symbols = &engine.config().symbols;
    for strip in engine.strips()? {
        let names: Vec<&str> = strip
            .symbols
            .iter()
            .map(|&id| symbols.get(id).map_or("?", |s| s.name.as_str()))
            .collect();
        println!("Reel {} ({} stops): {}", strip.reel_index, strip.len(), names.join(" "));
    }
    Ok(())
}

fn play(engine: &SpinEngine, count: u32, bet: f64, seed: Option<u64>, json: bool) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => SeededRandom::new(seed),
        None => SeededRandom::from_os_rng(),
    };
    let mut session = engine.new_session();
    let mut wagered = 0.0;
    let mut won = 0.0;

    for n in 1..=count {
        let outcome = engine.spin(&mut session, bet, &mut rng)?;
        wagered += outcome.wagered;
        won += outcome.reported_win;

        if json {
            println!("{}", serde_json::to_string(&outcome)?);
            continue;
        }
        let kinds: Vec<&str> = outcome.features.iter().map(|f| f.kind()).collect();
        println!(
            "#{:<4} {} stops {:?} win {:>10.2} {}{}",
            n,
            if outcome.free_spin { "FREE" } else { "PAID" },
            outcome.stops,
            outcome.reported_win,
            if kinds.is_empty() { String::new() } else { format!("[{}]", kinds.join(", ")) },
            session_note(&session)
        );
    }

    if !json {
        let rtp = if wagered > 0.0 { won / wagered * 100.0 } else { 0.0 };
        println!("Wagered {:.2}, won {:.2} ({:.2}%)", wagered, won, rtp);
    }
    Ok(())
}

fn session_note(session: &FeatureStateMachine) -> String {
    if session.is_active() {
        format!(" ({} free spins left, x{})", session.spins_remaining(), session.win_multiplier())
    } else {
        String::new()
    }
}

fn simulate(
    engine: SpinEngine,
    config: &SimulationConfig,
    time_limit_secs: Option<u64>,
    json: bool,
) -> Result<()> {
    if time_limit_secs == Some(0) {
        bail!("--time-limit-secs must be positive");
    }

    let cancel = CancelToken::new();
    if let Some(secs) = time_limit_secs {
        let timer = cancel.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            timer.cancel();
        });
    }

    let report = Simulator::new(engine)
        .run(config, &cancel)
        .context("Simulation failed")?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report.summary());
        println!(
            "Free-spin sessions: {}, max trial return: {:.1}x, elapsed {} ms{}",
            report.stats.free_spin_sessions,
            report.stats.max_return,
            report.elapsed_ms,
            if report.cancelled { " (partial)" } else { "" }
        );
    }
    Ok(())
}
