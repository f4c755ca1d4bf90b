//! Headless PathHeroes battle simulator.
//!
//! `run` plays one battle and prints a JSON summary, optionally preceded by
//! the event trace as JSON lines. `batch` plays many seeded battles in
//! parallel and prints the win rate.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use pathheroes_core::battle::Battle;
use pathheroes_core::catalog::{hero_roster, LevelId, STARTER_HERO};
use pathheroes_core::clock::Millis;
use pathheroes_core::config::BattleConfig;
use pathheroes_core::context::{BattleStats, Encounter};
use pathheroes_core::ledger::ProgressLedger;
use pathheroes_core::state::{BattlePhase, Outcome};
use pathheroes_core::unit::UnitTemplate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pathheroes-sim", version, about = "Headless PathHeroes battle simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play one battle
    Run(RunArgs),
    /// Play many seeded battles in parallel and report the win rate
    Batch(BatchArgs),
}

/// Options shared by every mode.
#[derive(Args, Debug)]
struct BattleArgs {
    /// Island, 1 to 10
    #[arg(long, default_value_t = 1)]
    island: u8,

    /// Level on the island, 1 to 10 (10 is the boss)
    #[arg(long, default_value_t = 1)]
    level: u8,

    /// Heroes as `id:upgrade`, comma separated, at most five
    #[arg(long, value_delimiter = ',', value_parser = parse_pick)]
    heroes: Vec<(String, u8)>,

    /// JSON file with battle tuning
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the tick length in milliseconds
    #[arg(long)]
    tick_ms: Option<Millis>,

    /// Treat the win as a replay (no first-clear rewards)
    #[arg(long)]
    replay: bool,

    /// Tick cap before giving up on a battle
    #[arg(long, default_value_t = 1_000_000)]
    max_ticks: u64,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    battle: BattleArgs,

    /// Random seed; drawn at random if omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Print every battle event as a JSON line before the summary
    #[arg(long)]
    trace: bool,
}

#[derive(Args, Debug)]
struct BatchArgs {
    #[command(flatten)]
    battle: BattleArgs,

    /// Number of battles
    #[arg(long, default_value_t = 100)]
    runs: u64,

    /// Seed of the first battle; battle `i` uses `seed + i`
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn parse_pick(raw: &str) -> Result<(String, u8), String> {
    let (id, upgrade) = raw.split_once(':').unwrap_or((raw, "0"));
    let upgrade = upgrade
        .trim()
        .parse::<u8>()
        .map_err(|err| format!("bad upgrade in '{raw}': {err}"))?;
    Ok((id.trim().to_string(), upgrade))
}

/// Result of one battle.
#[derive(Debug, Serialize)]
struct RunSummary {
    level: LevelId,
    seed: u64,
    outcome: Option<Outcome>,
    elapsed_ms: Millis,
    ticks: u64,
    stats: BattleStats,
    ledger: ProgressLedger,
}

/// Aggregate of a batch.
#[derive(Debug, Serialize)]
struct BatchSummary {
    level: LevelId,
    runs: u64,
    wins: u64,
    losses: u64,
    unresolved: u64,
    win_rate: f64,
}

/// Everything needed to build identical battles from different seeds.
struct Setup {
    config: BattleConfig,
    encounter: Encounter,
    heroes: Vec<UnitTemplate>,
    max_ticks: u64,
}

impl Setup {
    fn from_args(args: &BattleArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                BattleConfig::from_json_str(&json)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => BattleConfig::default(),
        };
        if let Some(tick_ms) = args.tick_ms {
            config.tick_ms = tick_ms;
            config.validate().context("invalid --tick-ms")?;
        }

        let level = LevelId::new(args.island, args.level)?;
        let encounter = if args.replay {
            Encounter::replay(level)
        } else {
            Encounter::new(level)
        };

        let picks = if args.heroes.is_empty() {
            vec![(STARTER_HERO.to_string(), 0)]
        } else {
            args.heroes.clone()
        };
        let heroes = hero_roster(&picks)?;

        Ok(Self {
            config,
            encounter,
            heroes,
            max_ticks: args.max_ticks,
        })
    }

    fn battle(&self, seed: u64) -> Result<Battle<ProgressLedger>> {
        let mut battle =
            Battle::with_reporter(self.config.clone(), self.encounter, ProgressLedger::new())
                .with_seed(seed);
        battle.load_player_roster(&self.heroes)?;
        battle.generate_enemies()?;
        battle.start(0)?;
        Ok(battle)
    }
}

fn run(args: &RunArgs) -> Result<()> {
    let setup = Setup::from_args(&args.battle)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut battle = setup.battle(seed)?;
    info!(level = %setup.encounter.level, seed, "running battle");

    let mut outcome = None;
    for _ in 0..setup.max_ticks {
        let phase = battle.step();
        if args.trace {
            for event in battle.take_events() {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
        if let BattlePhase::Resolved(resolved) = phase {
            outcome = Some(resolved);
            break;
        }
    }

    let summary = RunSummary {
        level: setup.encounter.level,
        seed,
        outcome,
        elapsed_ms: battle.now(),
        ticks: battle.ticks(),
        stats: *battle.stats(),
        ledger: battle.into_reporter(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn batch(args: &BatchArgs) -> Result<()> {
    if args.runs == 0 {
        bail!("--runs must be at least 1");
    }
    let setup = Setup::from_args(&args.battle)?;
    info!(level = %setup.encounter.level, runs = args.runs, "running batch");

    let outcomes: Vec<Option<Outcome>> = (0..args.runs)
        .into_par_iter()
        .map(|i| {
            let seed = args.seed.wrapping_add(i);
            let mut battle = setup.battle(seed)?;
            let outcome = battle.run_until_resolved(setup.max_ticks);
            debug!(seed, ?outcome, "battle finished");
            Ok(outcome)
        })
        .collect::<Result<_>>()?;

    let wins = outcomes.iter().filter(|o| **o == Some(Outcome::Win)).count() as u64;
    let losses = outcomes.iter().filter(|o| **o == Some(Outcome::Loss)).count() as u64;
    let summary = BatchSummary {
        level: setup.encounter.level,
        runs: args.runs,
        wins,
        losses,
        unresolved: args.runs - wins - losses,
        win_rate: wins as f64 / args.runs as f64,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Run(args) => run(args),
        Command::Batch(args) => batch(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_parse_with_and_without_upgrade() {
        assert_eq!(parse_pick("geomis:7"), Ok(("geomis".to_string(), 7)));
        assert_eq!(parse_pick("bastin"), Ok(("bastin".to_string(), 0)));
        assert!(parse_pick("anubis:x").is_err());
    }

    #[test]
    fn cli_accepts_run_and_batch() {
        let cli = Cli::try_parse_from([
            "pathheroes-sim",
            "run",
            "--island",
            "4",
            "--level",
            "10",
            "--heroes",
            "geomis:10,starlord:3",
            "--seed",
            "9",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.battle.heroes.len(), 2);

        let cli = Cli::try_parse_from(["pathheroes-sim", "batch", "--runs", "3"]).unwrap();
        assert!(matches!(cli.command, Command::Batch(BatchArgs { runs: 3, .. })));
    }

    #[test]
    fn seeded_setup_is_repeatable() {
        let args = BattleArgs {
            island: 1,
            level: 10,
            heroes: vec![("executioner".to_string(), 10), ("anubis".to_string(), 10)],
            config: None,
            tick_ms: None,
            replay: false,
            max_ticks: 200_000,
        };
        let setup = Setup::from_args(&args).unwrap();
        let a = setup.battle(5).unwrap().run_until_resolved(setup.max_ticks);
        let b = setup.battle(5).unwrap().run_until_resolved(setup.max_ticks);
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_level_is_rejected() {
        let args = BattleArgs {
            island: 11,
            level: 1,
            heroes: Vec::new(),
            config: None,
            tick_ms: None,
            replay: false,
            max_ticks: 10,
        };
        assert!(Setup::from_args(&args).is_err());
    }
}
