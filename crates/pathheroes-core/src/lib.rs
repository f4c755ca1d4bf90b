//! # PathHeroes Core
//!
//! Real-time battle simulation engine for PathHeroes.
//!
//! Two rosters of up to five combatants fight on a fixed-rate simulated
//! clock. Every combatant strikes on its own cadence and carries archetype
//! abilities on independent timers; the battle resolves the moment one side
//! has no living member, and reward side effects are reported to an external
//! collaborator.
//!
//! ## Architecture
//!
//! - **Units**: templates, combatants and their ability descriptors
//! - **Scheduler**: one ordered timer table for cadences and deferred effects
//! - **Dispatcher**: per-ability actions driven by fired timers
//! - **Resolver**: damage, deaths, kill hooks and wipe detection
//! - **Outcome**: reward tables and the reporter interface
//!
//! ## Usage
//!
//! ```
//! use pathheroes_core::battle::Battle;
//! use pathheroes_core::catalog::{hero_roster, LevelId};
//! use pathheroes_core::config::BattleConfig;
//! use pathheroes_core::context::Encounter;
//! use pathheroes_core::ledger::ProgressLedger;
//!
//! let level = LevelId::new(1, 2)?;
//! let heroes = hero_roster(&[("executioner", 10), ("geomis", 10), ("anubis", 10)])?;
//!
//! let mut battle = Battle::with_reporter(
//!     BattleConfig::default(),
//!     Encounter::new(level),
//!     ProgressLedger::new(),
//! )
//! .with_seed(7);
//! battle.load_player_roster(&heroes)?;
//! battle.generate_enemies()?;
//! battle.start(0)?;
//!
//! let outcome = battle.run_until_resolved(1_000_000);
//! assert!(outcome.is_some());
//! # Ok::<(), pathheroes_core::error::SetupError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod battle;
pub mod buff;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod ledger;
pub mod outcome;
pub mod output;
pub mod resolver;
pub mod roster;
pub mod scheduler;
pub mod state;
pub mod targeting;
pub mod unit;

mod abilities;

pub use battle::Battle;
pub use config::BattleConfig;
pub use context::Encounter;
pub use error::{BattleError, ConfigError, ReportError, SetupError};
pub use outcome::{NoopReporter, OutcomeReporter};
pub use state::{BattlePhase, Outcome};

#[cfg(test)]
mod tests;
