//! Damage and mortality resolution.
//!
//! Every damaging action goes through [`apply_strike`]. It computes the final
//! damage, clamps health, records deaths, runs the kill hooks and checks
//! whether the victim's side was wiped. A wipe resolves the battle
//! immediately, even in the middle of a multi-target ability.

use rand::Rng;
use tracing::{debug, info};

use crate::abilities;
use crate::catalog::regeneration_spawn_template;
use crate::context::BattleContext;
use crate::error::BattleError;
use crate::outcome::{Currency, Report};
use crate::output::{BattleEvent, StrikeKind};
use crate::scheduler::TimerTable;
use crate::state::Outcome;
use crate::unit::{AbilitySet, Side, SlotRef};

/// How much a strike hurts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Damage {
    /// `base * multiplier`, further multiplied by the attacker's buff.
    Scaled {
        /// Attack of the striker
        base: f64,
        /// Ability multiplier
        multiplier: f64,
    },
    /// A flat amount unaffected by buffs.
    Fixed(f64),
}

/// One damaging hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    /// Attacker
    pub source: SlotRef,
    /// Defender
    pub target: SlotRef,
    /// Hit flavour
    pub kind: StrikeKind,
    /// Damage rule
    pub damage: Damage,
}

/// What happened to a strike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrikeOutcome {
    /// The battle is over or the target is empty or dead.
    Discarded,
    /// The target's invulnerability window swallowed the hit.
    Shielded,
    /// Damage was applied.
    Hit {
        /// Damage dealt
        damage: f64,
    },
    /// Damage was applied and killed the target.
    Killed {
        /// Damage dealt
        damage: f64,
    },
}

/// Applies one strike.
///
/// # Errors
///
/// Returns a [`BattleError`] only if a kill hook fails to spawn a unit. The
/// damage itself has been applied by then.
pub(crate) fn apply_strike(
    ctx: &mut BattleContext,
    timers: &mut TimerTable,
    strike: Strike,
) -> Result<StrikeOutcome, BattleError> {
    if !ctx.machine.is_active() {
        return Ok(StrikeOutcome::Discarded);
    }
    let now = ctx.now();
    let amount = match strike.damage {
        Damage::Scaled { base, multiplier } => {
            base * multiplier * ctx.buffs.multiplier_for(strike.source.side, now)
        }
        Damage::Fixed(amount) => amount,
    };

    let Some(target) = ctx.rosters.get_mut(strike.target) else {
        return Ok(StrikeOutcome::Discarded);
    };
    if !target.is_alive() {
        return Ok(StrikeOutcome::Discarded);
    }
    if target.is_invulnerable(now) {
        ctx.emit(BattleEvent::Shielded {
            at: now,
            source: strike.source,
            target: strike.target,
        });
        return Ok(StrikeOutcome::Shielded);
    }

    let killed = target.take_damage(amount);
    let remaining = target.health();
    debug!(
        source = %strike.source,
        target = %strike.target,
        kind = ?strike.kind,
        damage = amount,
        remaining,
        "strike"
    );
    ctx.emit(BattleEvent::Strike {
        at: now,
        source: strike.source,
        target: strike.target,
        kind: strike.kind,
        damage: amount,
    });

    if killed {
        on_kill(ctx, timers, strike.source, strike.target)?;
        Ok(StrikeOutcome::Killed { damage: amount })
    } else {
        Ok(StrikeOutcome::Hit { damage: amount })
    }
}

fn on_kill(
    ctx: &mut BattleContext,
    timers: &mut TimerTable,
    killer: SlotRef,
    victim: SlotRef,
) -> Result<(), BattleError> {
    let now = ctx.now();
    ctx.emit(BattleEvent::Defeated {
        at: now,
        unit: victim,
        by: killer,
    });
    timers.cancel_unit(victim);

    match killer.side {
        Side::Player => {
            ctx.stats.kills += 1;
            ctx.queue(Report::Kill);
            if ctx.rng.gen::<f64>() < ctx.config.abilities.kill_reward_chance {
                ctx.stats.bonus_life_stones += 1;
                ctx.queue(Report::Grant {
                    currency: Currency::LifeStones,
                    amount: 1,
                });
            }
        }
        Side::Enemy => ctx.stats.fallen += 1,
    }

    if !ctx.rosters.side(victim.side).any_alive() {
        resolve(ctx, timers, victim.side);
        return Ok(());
    }

    let spawns_on_kill = ctx
        .rosters
        .get(killer)
        .is_some_and(|unit| unit.is_alive() && unit.has(AbilitySet::SPAWN_ON_KILL));
    let island = ctx.encounter.level.island();
    if spawns_on_kill && island == ctx.config.abilities.regeneration_island {
        abilities::spawn_random(ctx, timers, killer, &regeneration_spawn_template(island), None)?;
    }
    Ok(())
}

/// Resolves the battle because `wiped` has no living combatant.
///
/// Only the first call has any effect.
pub(crate) fn resolve(
    ctx: &mut BattleContext,
    timers: &mut TimerTable,
    wiped: Side,
) -> Option<Outcome> {
    let outcome = ctx.machine.resolve(wiped)?;
    timers.cancel_all();
    let now = ctx.now();
    info!(at = now, %outcome, wiped = %wiped, "battle resolved");
    ctx.emit(BattleEvent::Resolved { at: now, outcome });
    ctx.pending_outcome = Some(outcome);
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LevelId;
    use crate::config::BattleConfig;
    use crate::context::Encounter;
    use crate::unit::{Archetype, Combatant, Faction, UnitTemplate};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn context(enemy_health: f64) -> BattleContext {
        let mut ctx = BattleContext::new(
            BattleConfig::default(),
            Encounter::new(LevelId::new(1, 1).unwrap()),
            ChaCha8Rng::seed_from_u64(3),
        );
        let hero = UnitTemplate::new("hero", "Hero", Archetype::Striker, Faction::Human, 100.0, 10.0, 1.0);
        let foe = UnitTemplate::new("foe", "Foe", Archetype::Monster, Faction::Monster, enemy_health, 5.0, 1.0);
        let hero_at = SlotRef::new(Side::Player, 0);
        let foe_at = SlotRef::new(Side::Enemy, 0);
        ctx.rosters
            .side_mut(Side::Player)
            .place(0, Combatant::from_template(&hero, hero_at).unwrap())
            .unwrap();
        ctx.rosters
            .side_mut(Side::Enemy)
            .place(0, Combatant::from_template(&foe, foe_at).unwrap())
            .unwrap();
        ctx.machine.start().unwrap();
        ctx
    }

    fn basic(multiplier: f64) -> Strike {
        Strike {
            source: SlotRef::new(Side::Player, 0),
            target: SlotRef::new(Side::Enemy, 0),
            kind: StrikeKind::Basic,
            damage: Damage::Scaled {
                base: 10.0,
                multiplier,
            },
        }
    }

    #[test]
    fn buff_multiplies_scaled_damage() {
        let mut ctx = context(100.0);
        let mut timers = TimerTable::new();
        ctx.buffs.open(Side::Player, 0, 2000);
        let outcome = apply_strike(&mut ctx, &mut timers, basic(2.0)).unwrap();
        assert_eq!(outcome, StrikeOutcome::Hit { damage: 60.0 });
    }

    #[test]
    fn fixed_damage_ignores_buff() {
        let mut ctx = context(500.0);
        let mut timers = TimerTable::new();
        ctx.buffs.open(Side::Player, 0, 2000);
        let strike = Strike {
            damage: Damage::Fixed(300.0),
            kind: StrikeKind::Scatter,
            ..basic(1.0)
        };
        let outcome = apply_strike(&mut ctx, &mut timers, strike).unwrap();
        assert_eq!(outcome, StrikeOutcome::Hit { damage: 300.0 });
    }

    #[test]
    fn shielded_target_takes_nothing() {
        let mut ctx = context(100.0);
        let mut timers = TimerTable::new();
        ctx.rosters
            .get_mut(SlotRef::new(Side::Enemy, 0))
            .unwrap()
            .shield_until(3000);
        let outcome = apply_strike(&mut ctx, &mut timers, basic(1.0)).unwrap();
        assert_eq!(outcome, StrikeOutcome::Shielded);
        let foe = ctx.rosters.get(SlotRef::new(Side::Enemy, 0)).unwrap();
        assert_eq!(foe.health(), 100.0);
    }

    #[test]
    fn killing_blow_resolves_and_clears_timers() {
        let mut ctx = context(5.0);
        let mut timers = TimerTable::new();
        timers.schedule_repeating(
            crate::scheduler::TimerKey::Unit {
                unit: SlotRef::new(Side::Player, 0),
                ability: crate::unit::AbilityKind::BasicStrike,
            },
            0,
            1000,
        );
        let outcome = apply_strike(&mut ctx, &mut timers, basic(1.0)).unwrap();
        assert_eq!(outcome, StrikeOutcome::Killed { damage: 10.0 });
        assert_eq!(ctx.machine.outcome(), Some(Outcome::Win));
        assert_eq!(ctx.pending_outcome, Some(Outcome::Win));
        assert!(timers.is_empty());
        assert_eq!(ctx.stats.kills, 1);
        assert_eq!(ctx.reports.first(), Some(&Report::Kill));
    }

    #[test]
    fn strikes_after_resolution_are_discarded() {
        let mut ctx = context(5.0);
        let mut timers = TimerTable::new();
        apply_strike(&mut ctx, &mut timers, basic(1.0)).unwrap();
        let events = ctx.events.len();
        let outcome = apply_strike(&mut ctx, &mut timers, basic(1.0)).unwrap();
        assert_eq!(outcome, StrikeOutcome::Discarded);
        assert_eq!(ctx.events.len(), events);
        assert_eq!(resolve(&mut ctx, &mut timers, Side::Enemy), None);
    }

    #[test]
    fn empty_slot_is_discarded() {
        let mut ctx = context(100.0);
        let mut timers = TimerTable::new();
        let strike = Strike {
            target: SlotRef::new(Side::Enemy, 4),
            ..basic(1.0)
        };
        assert_eq!(
            apply_strike(&mut ctx, &mut timers, strike).unwrap(),
            StrikeOutcome::Discarded
        );
    }
}
