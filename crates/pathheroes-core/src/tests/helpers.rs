//! Test helper functions for setting up battles and recording outcomes.

use crate::battle::Battle;
use crate::catalog::LevelId;
use crate::clock::Millis;
use crate::config::BattleConfig;
use crate::context::Encounter;
use crate::error::ReportError;
use crate::outcome::{Currency, OutcomeReporter};
use crate::output::BattleEvent;
use crate::unit::{Archetype, Faction, Side, SlotRef, UnitTemplate};

/// Tick length that lands every default cadence on an exact tick.
pub const TEST_TICK_MS: Millis = 10;

/// Default configuration with a 10 ms tick.
pub fn test_config() -> BattleConfig {
    BattleConfig {
        tick_ms: TEST_TICK_MS,
        ..BattleConfig::default()
    }
}

/// Level used when the island has no special rules.
pub fn plain_level() -> LevelId {
    LevelId::new(1, 1).unwrap()
}

// =============================================================================
// Templates
// =============================================================================

/// Human hero template with explicit stats.
pub fn hero(id: &str, archetype: Archetype, hp: f64, atk: f64, rate: f64) -> UnitTemplate {
    UnitTemplate::new(id, id, archetype, Faction::Human, hp, atk, rate)
}

/// Plain monster template with explicit stats.
pub fn monster(id: &str, hp: f64, atk: f64, rate: f64) -> UnitTemplate {
    UnitTemplate::new(id, id, Archetype::Monster, Faction::Monster, hp, atk, rate)
}

/// A target that never dies and never fights back.
pub fn dummy(id: &str) -> UnitTemplate {
    monster(id, 1.0e9, 0.0, 0.001)
}

// =============================================================================
// Battles
// =============================================================================

/// Builds a seeded battle with the given slot assignments, not yet started.
pub fn battle_with<R: OutcomeReporter>(
    encounter: Encounter,
    reporter: R,
    player: &[(usize, UnitTemplate)],
    enemy: &[(usize, UnitTemplate)],
) -> Battle<R> {
    let mut battle = Battle::with_reporter(test_config(), encounter, reporter).with_seed(0);
    for (slot, template) in player {
        assert!(battle.place(Side::Player, *slot, template).unwrap());
    }
    for (slot, template) in enemy {
        assert!(battle.place(Side::Enemy, *slot, template).unwrap());
    }
    battle
}

/// Builds and starts a seeded battle on [`plain_level`] at round start 0.
pub fn started(player: &[(usize, UnitTemplate)], enemy: &[(usize, UnitTemplate)]) -> Battle {
    let mut battle = battle_with(
        Encounter::new(plain_level()),
        crate::outcome::NoopReporter,
        player,
        enemy,
    );
    battle.start(0).unwrap();
    battle
}

/// Steps until the clock reads at least `until` or the battle stops, and
/// returns every event emitted on the way.
pub fn run_to<R: OutcomeReporter>(battle: &mut Battle<R>, until: Millis) -> Vec<BattleEvent> {
    let mut events = Vec::new();
    while battle.now() < until && battle.phase() == crate::state::BattlePhase::Active {
        battle.step();
        events.extend(battle.take_events());
    }
    events
}

/// Returns the current health at `side`/`slot`.
pub fn health<R: OutcomeReporter>(battle: &Battle<R>, side: Side, slot: usize) -> f64 {
    battle
        .combatant(SlotRef::new(side, slot))
        .map_or(0.0, crate::unit::Combatant::health)
}

/// Returns the `(time, damage)` of every strike from `source`.
pub fn strikes_from(events: &[BattleEvent], source: SlotRef) -> Vec<(Millis, f64)> {
    events
        .iter()
        .filter_map(|event| match event {
            BattleEvent::Strike {
                at,
                source: from,
                damage,
                ..
            } if *from == source => Some((*at, *damage)),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Reporters
// =============================================================================

/// Reporter that records every call and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    /// Kills recorded
    pub kills: u32,
    /// Grants in call order
    pub grants: Vec<(Currency, u32)>,
    /// Levels marked completed in call order
    pub marked: Vec<LevelId>,
    /// Levels reported as already completed
    pub completed: Vec<LevelId>,
    /// Fail every write
    pub fail_writes: bool,
    /// Fail the completion query
    pub fail_query: bool,
    /// Calls rejected so far
    pub rejected: u32,
}

impl RecordingReporter {
    /// Total amount granted of `currency`.
    pub fn total(&self, currency: Currency) -> u32 {
        self.grants
            .iter()
            .filter(|(c, _)| *c == currency)
            .map(|(_, amount)| amount)
            .sum()
    }

    fn refuse(&mut self, operation: &'static str) -> Result<(), ReportError> {
        if self.fail_writes {
            self.rejected += 1;
            Err(ReportError::Rejected {
                operation,
                reason: "disk full".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl OutcomeReporter for RecordingReporter {
    fn record_kill(&mut self) -> Result<(), ReportError> {
        self.refuse("record_kill")?;
        self.kills += 1;
        Ok(())
    }

    fn grant(&mut self, currency: Currency, amount: u32) -> Result<(), ReportError> {
        self.refuse("grant")?;
        self.grants.push((currency, amount));
        Ok(())
    }

    fn is_level_completed(&self, level: LevelId) -> Result<bool, ReportError> {
        if self.fail_query {
            return Err(ReportError::Unavailable("save file locked".to_string()));
        }
        Ok(self.completed.contains(&level))
    }

    fn mark_level_completed(&mut self, level: LevelId) -> Result<(), ReportError> {
        self.refuse("mark_level_completed")?;
        self.marked.push(level);
        Ok(())
    }
}
