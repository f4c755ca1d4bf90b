//! Mutable state of one battle, passed explicitly to every component.

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::buff::BuffTracker;
use crate::catalog::LevelId;
use crate::clock::{Clock, Millis};
use crate::config::BattleConfig;
use crate::outcome::{Report, RewardBundle};
use crate::output::{BattleEvent, EventLog};
use crate::roster::{AliveMask, Rosters};
use crate::state::{Outcome, StateMachine};
use crate::unit::Side;

/// Where the battle takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    /// Island and level being fought
    pub level: LevelId,
    /// Replays never count as a first completion
    pub replay: bool,
}

impl Encounter {
    /// Creates a first attempt at `level`.
    #[must_use]
    pub const fn new(level: LevelId) -> Self {
        Self {
            level,
            replay: false,
        }
    }

    /// Creates a replay of `level`.
    #[must_use]
    pub const fn replay(level: LevelId) -> Self {
        Self {
            level,
            replay: true,
        }
    }
}

/// Counters accumulated during a battle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleStats {
    /// Enemies killed by the player side
    pub kills: u32,
    /// Player combatants killed
    pub fallen: u32,
    /// Life stones granted by kill rolls
    pub bonus_life_stones: u32,
    /// Victory bundle, once granted
    pub rewards: Option<RewardBundle>,
}

/// Everything a timer action may read or mutate.
///
/// The tick loop owns one context and lends it to the dispatcher and the
/// damage resolver for each timer action.
#[derive(Debug, Clone)]
pub struct BattleContext {
    pub(crate) config: BattleConfig,
    pub(crate) encounter: Encounter,
    pub(crate) clock: Clock,
    pub(crate) rosters: Rosters,
    pub(crate) buffs: BuffTracker,
    pub(crate) machine: StateMachine,
    pub(crate) stats: BattleStats,
    pub(crate) events: EventLog,
    pub(crate) reports: Vec<Report>,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) round_start: Millis,
    pub(crate) pending_outcome: Option<Outcome>,
}

impl BattleContext {
    pub(crate) fn new(config: BattleConfig, encounter: Encounter, rng: ChaCha8Rng) -> Self {
        Self {
            clock: Clock::new(0, config.tick_ms),
            buffs: BuffTracker::new(config.abilities.buff_multiplier),
            config,
            encounter,
            rosters: Rosters::default(),
            machine: StateMachine::new(),
            stats: BattleStats::default(),
            events: EventLog::new(),
            reports: Vec::new(),
            rng,
            round_start: 0,
            pending_outcome: None,
        }
    }

    /// Returns the current simulated time.
    #[must_use]
    pub const fn now(&self) -> Millis {
        self.clock.now()
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Returns the encounter.
    #[must_use]
    pub const fn encounter(&self) -> Encounter {
        self.encounter
    }

    /// Returns both rosters.
    #[must_use]
    pub const fn rosters(&self) -> &Rosters {
        &self.rosters
    }

    /// Returns the accumulated counters.
    #[must_use]
    pub const fn stats(&self) -> &BattleStats {
        &self.stats
    }

    /// Returns the round start timestamp.
    #[must_use]
    pub const fn round_start(&self) -> Millis {
        self.round_start
    }

    pub(crate) fn emit(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub(crate) fn queue(&mut self, report: Report) {
        self.reports.push(report);
    }

    pub(crate) fn alive_mask(&self, side: Side) -> AliveMask {
        self.rosters.side(side).alive_mask()
    }

    /// Returns the first side without a living combatant, player first.
    pub(crate) fn wiped_side(&self) -> Option<Side> {
        Side::BOTH
            .into_iter()
            .find(|side| !self.rosters.side(*side).any_alive())
    }
}
