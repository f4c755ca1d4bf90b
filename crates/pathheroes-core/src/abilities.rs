//! Ability dispatch.
//!
//! Each fired timer is routed here. Unit timers look up the actor's
//! [`AbilitySet`] and perform the matching action; side timers pulse buff
//! windows; the transformation timer converts impostors; deferred timers
//! land projectiles. Damage always flows through the resolver.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::catalog::summoned_template;
use crate::clock::Millis;
use crate::context::BattleContext;
use crate::error::BattleError;
use crate::output::{BattleEvent, StrikeKind};
use crate::resolver::{apply_strike, Damage, Strike};
use crate::scheduler::{DeferredEffect, Firing, SideTimer, TimerKey, TimerTable};
use crate::targeting::{nearest_living, random_distinct_living, random_living};
use crate::unit::{AbilityKind, AbilitySet, Combatant, Side, SlotRef, UnitTemplate};

// =============================================================================
// Scheduling
// =============================================================================

/// Applies situational ability grants to a combatant about to join a battle.
///
/// Non-boss enemies on the regeneration island roll self-heals.
pub(crate) fn prepare(ctx: &BattleContext, unit: &mut Combatant) {
    let on_regeneration_island =
        ctx.encounter.level.island() == ctx.config.abilities.regeneration_island;
    if unit.position().side == Side::Enemy && !unit.is_boss() && on_regeneration_island {
        unit.grant_abilities(AbilitySet::SELF_HEAL);
    }
}

/// Returns the cadence of `ability` for `unit`.
fn interval_of(ctx: &BattleContext, unit: &Combatant, ability: AbilityKind) -> Millis {
    let tuning = &ctx.config.abilities;
    match ability {
        AbilityKind::BasicStrike => unit.stats().attack_interval(ctx.config.min_attack_rate),
        AbilityKind::BonusStrike => tuning.bonus_strike_interval_ms,
        AbilityKind::HeavyStrike => tuning.heavy_strike_interval_ms,
        AbilityKind::AllTargetStrike => tuning.all_target_interval_ms,
        AbilityKind::ScatterStrike => tuning.scatter_strike_interval_ms,
        AbilityKind::Summon => tuning.summon_interval_ms,
        AbilityKind::SelfHeal => tuning.self_heal_interval_ms,
    }
}

/// Registers every timed ability of the unit at `at`, anchored to `anchor`.
pub(crate) fn schedule_unit(
    ctx: &BattleContext,
    timers: &mut TimerTable,
    at: SlotRef,
    anchor: Millis,
) -> Result<(), BattleError> {
    let unit = ctx.rosters.get(at).ok_or(BattleError::EmptySlot(at))?;
    for ability in unit.abilities().timed_kinds() {
        let interval = interval_of(ctx, unit, ability);
        timers.schedule_repeating(TimerKey::Unit { unit: at, ability }, anchor, interval);
    }
    Ok(())
}

/// Starts the invulnerability window of a freshly spawned shielded unit.
pub(crate) fn shield_on_spawn(ctx: &mut BattleContext, at: SlotRef, spawned_at: Millis) {
    let window = ctx.config.abilities.spawn_shield_ms;
    if let Some(unit) = ctx.rosters.get_mut(at) {
        if unit.has(AbilitySet::SPAWN_SHIELD) {
            unit.shield_until(spawned_at.saturating_add(window));
        }
    }
}

/// Inserts `template` into a random empty slot on `by`'s side.
///
/// `reserved` excludes one slot from the draw. Returns the new slot, or
/// `None` if no slot was free.
pub(crate) fn spawn_random(
    ctx: &mut BattleContext,
    timers: &mut TimerTable,
    by: SlotRef,
    template: &UnitTemplate,
    reserved: Option<usize>,
) -> Result<Option<SlotRef>, BattleError> {
    let free: Vec<usize> = ctx
        .rosters
        .side(by.side)
        .empty_slots()
        .into_iter()
        .filter(|slot| Some(*slot) != reserved)
        .collect();
    let Some(&slot) = free.choose(&mut ctx.rng) else {
        debug!(%by, "no free slot to spawn into");
        return Ok(None);
    };

    let at = SlotRef::new(by.side, slot);
    let mut unit = Combatant::from_template(template, at).map_err(|source| BattleError::Spawn {
        side: by.side,
        source,
    })?;
    prepare(ctx, &mut unit);
    ctx.rosters.side_mut(by.side).place(slot, unit)?;

    let now = ctx.now();
    shield_on_spawn(ctx, at, now);
    schedule_unit(ctx, timers, at, now)?;
    debug!(%at, %by, id = template.id.as_str(), "unit spawned");
    ctx.emit(BattleEvent::Summoned { at: now, unit: at, by });
    Ok(Some(at))
}

// =============================================================================
// Dispatch
// =============================================================================

/// Performs the action of a fired timer.
///
/// # Errors
///
/// Returns a [`BattleError`] when the timer refers to a slot with no
/// combatant or a spawn fails. The caller logs it and moves on.
pub(crate) fn dispatch(
    ctx: &mut BattleContext,
    timers: &mut TimerTable,
    firing: Firing,
) -> Result<(), BattleError> {
    match firing.key {
        TimerKey::Side {
            side,
            kind: SideTimer::BuffPulse,
        } => {
            buff_pulse(ctx, side);
            Ok(())
        }
        TimerKey::Transform => transform(ctx, timers),
        TimerKey::Unit { unit, ability } => unit_action(ctx, timers, unit, ability),
        TimerKey::Deferred { .. } => match firing.effect {
            Some(DeferredEffect::Impact {
                source,
                target,
                base_damage,
                multiplier,
            }) => impact(ctx, timers, source, target, base_damage, multiplier),
            None => Ok(()),
        },
    }
}

fn buff_pulse(ctx: &mut BattleContext, side: Side) {
    let has_emitter = ctx
        .rosters
        .side(side)
        .occupants()
        .any(|unit| unit.is_alive() && unit.has(AbilitySet::BUFF_EMITTER));
    if !has_emitter {
        return;
    }
    let now = ctx.now();
    let until = ctx
        .buffs
        .open(side, now, ctx.config.abilities.buff_duration_ms);
    debug!(%side, until, "buff window opened");
    ctx.emit(BattleEvent::BuffOpened { at: now, side, until });
}

fn unit_action(
    ctx: &mut BattleContext,
    timers: &mut TimerTable,
    at: SlotRef,
    ability: AbilityKind,
) -> Result<(), BattleError> {
    let actor = ctx.rosters.get(at).ok_or(BattleError::EmptySlot(at))?;
    if !actor.is_alive() {
        return Ok(());
    }
    let attack = actor.stats().attack;
    let abilities = actor.abilities();
    let tuning = ctx.config.abilities.clone();
    let opponent = at.side.opponent();

    match ability {
        AbilityKind::BasicStrike if abilities.contains(AbilitySet::MULTI_HIT) => {
            let targets =
                random_distinct_living(&ctx.alive_mask(opponent), tuning.multi_hit_targets, &mut ctx.rng);
            strike_each(ctx, timers, at, &targets, StrikeKind::MultiHit, scaled(attack, 1.0))
        }
        AbilityKind::BasicStrike => {
            strike_nearest(ctx, timers, at, StrikeKind::Basic, scaled(attack, 1.0))
        }
        AbilityKind::BonusStrike => strike_nearest(
            ctx,
            timers,
            at,
            StrikeKind::Bonus,
            scaled(attack, tuning.bonus_strike_multiplier),
        ),
        AbilityKind::HeavyStrike => {
            let Some(slot) = random_living(&ctx.alive_mask(opponent), &mut ctx.rng) else {
                return Ok(());
            };
            let now = ctx.now();
            let target = SlotRef::new(opponent, slot);
            let lands_at = now.saturating_add(tuning.heavy_strike_travel_ms);
            timers.defer(
                lands_at,
                DeferredEffect::Impact {
                    source: at,
                    target,
                    base_damage: attack,
                    multiplier: tuning.heavy_strike_multiplier,
                },
            );
            ctx.emit(BattleEvent::MeteorLaunched {
                at: now,
                source: at,
                target,
                lands_at,
            });
            Ok(())
        }
        AbilityKind::AllTargetStrike => {
            let targets: Vec<usize> = ctx.rosters.side(opponent).living_slots().collect();
            strike_each(
                ctx,
                timers,
                at,
                &targets,
                StrikeKind::AllTarget,
                scaled(attack, tuning.all_target_multiplier),
            )
        }
        AbilityKind::ScatterStrike => {
            let Some(slot) = random_living(&ctx.alive_mask(opponent), &mut ctx.rng) else {
                return Ok(());
            };
            apply_strike(
                ctx,
                timers,
                Strike {
                    source: at,
                    target: SlotRef::new(opponent, slot),
                    kind: StrikeKind::Scatter,
                    damage: Damage::Fixed(tuning.scatter_strike_damage),
                },
            )
            .map(drop)
        }
        AbilityKind::Summon => {
            spawn_random(ctx, timers, at, &summoned_template(), Some(at.slot)).map(drop)
        }
        AbilityKind::SelfHeal => {
            if ctx.rng.gen::<f64>() < tuning.self_heal_chance {
                heal(ctx, at);
            }
            Ok(())
        }
    }
}

const fn scaled(base: f64, multiplier: f64) -> Damage {
    Damage::Scaled { base, multiplier }
}

fn strike_nearest(
    ctx: &mut BattleContext,
    timers: &mut TimerTable,
    at: SlotRef,
    kind: StrikeKind,
    damage: Damage,
) -> Result<(), BattleError> {
    let opponent = at.side.opponent();
    let Some(slot) = nearest_living(&ctx.alive_mask(opponent), at.slot) else {
        return Ok(());
    };
    let strike = Strike {
        source: at,
        target: SlotRef::new(opponent, slot),
        kind,
        damage,
    };
    apply_strike(ctx, timers, strike).map(drop)
}

/// Hits `targets` in order, stopping as soon as the battle resolves.
fn strike_each(
    ctx: &mut BattleContext,
    timers: &mut TimerTable,
    at: SlotRef,
    targets: &[usize],
    kind: StrikeKind,
    damage: Damage,
) -> Result<(), BattleError> {
    let opponent = at.side.opponent();
    for &slot in targets {
        if !ctx.machine.is_active() {
            break;
        }
        let strike = Strike {
            source: at,
            target: SlotRef::new(opponent, slot),
            kind,
            damage,
        };
        apply_strike(ctx, timers, strike)?;
    }
    Ok(())
}

fn heal(ctx: &mut BattleContext, at: SlotRef) {
    let now = ctx.now();
    let Some(unit) = ctx.rosters.get_mut(at) else {
        return;
    };
    let before = unit.health();
    unit.restore_full();
    let amount = unit.health() - before;
    if amount > 0.0 {
        debug!(%at, amount, "self heal");
        ctx.emit(BattleEvent::Healed {
            at: now,
            unit: at,
            amount,
        });
    }
}

fn impact(
    ctx: &mut BattleContext,
    timers: &mut TimerTable,
    source: SlotRef,
    target: SlotRef,
    base: f64,
    multiplier: f64,
) -> Result<(), BattleError> {
    let target_alive = ctx.rosters.get(target).is_some_and(Combatant::is_alive);
    if !target_alive {
        debug!(%source, %target, "projectile landed on a dead slot");
        return Ok(());
    }
    let strike = Strike {
        source,
        target,
        kind: StrikeKind::Heavy,
        damage: scaled(base, multiplier),
    };
    apply_strike(ctx, timers, strike).map(drop)
}

// =============================================================================
// Transformation
// =============================================================================

/// Turns every living impostor into a copy of its opposing same-slot unit.
///
/// The copy keeps its current health capped at the new maximum, and its
/// timers restart from now.
fn transform(ctx: &mut BattleContext, timers: &mut TimerTable) -> Result<(), BattleError> {
    let now = ctx.now();
    let multiplier = ctx.config.abilities.impostor_health_multiplier;
    let impostors: Vec<SlotRef> = ctx
        .rosters
        .occupants()
        .filter(|unit| unit.is_alive() && unit.is_impostor())
        .map(Combatant::position)
        .collect();

    for at in impostors {
        let mirror = SlotRef::new(at.side.opponent(), at.slot);
        let Some(source) = ctx.rosters.get(mirror).cloned() else {
            debug!(%at, "impostor has nothing to copy");
            continue;
        };
        let Some(mut unit) = ctx.rosters.get(at).cloned() else {
            continue;
        };
        unit.imitate(&source, multiplier);
        prepare(ctx, &mut unit);
        if let Some(slot) = ctx.rosters.get_mut(at) {
            *slot = unit;
        }

        timers.cancel_unit(at);
        schedule_unit(ctx, timers, at, now)?;
        info!(%at, into = source.id(), "impostor transformed");
        ctx.emit(BattleEvent::Transformed {
            at: now,
            unit: at,
            into: source.id().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LevelId;
    use crate::config::BattleConfig;
    use crate::context::Encounter;
    use crate::unit::{Archetype, Faction};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn context(island: u8) -> BattleContext {
        let mut ctx = BattleContext::new(
            BattleConfig::default(),
            Encounter::new(LevelId::new(island, 1).unwrap()),
            ChaCha8Rng::seed_from_u64(11),
        );
        ctx.machine.start().unwrap();
        ctx
    }

    fn put(ctx: &mut BattleContext, at: SlotRef, template: &UnitTemplate) {
        let mut unit = Combatant::from_template(template, at).unwrap();
        prepare(ctx, &mut unit);
        ctx.rosters.side_mut(at.side).place(at.slot, unit).unwrap();
    }

    fn monster(hp: f64) -> UnitTemplate {
        UnitTemplate::new("m", "Monster", Archetype::Monster, Faction::Monster, hp, 5.0, 1.0)
    }

    #[test]
    fn regeneration_island_grants_self_heal_to_non_bosses() {
        let mut ctx = context(6);
        let enemy = SlotRef::new(Side::Enemy, 0);
        let boss = SlotRef::new(Side::Enemy, 1);
        let hero = SlotRef::new(Side::Player, 0);
        put(&mut ctx, enemy, &monster(10.0));
        put(&mut ctx, boss, &monster(10.0).boss());
        put(&mut ctx, hero, &monster(10.0));

        assert!(ctx.rosters.get(enemy).unwrap().has(AbilitySet::SELF_HEAL));
        assert!(!ctx.rosters.get(boss).unwrap().has(AbilitySet::SELF_HEAL));
        assert!(!ctx.rosters.get(hero).unwrap().has(AbilitySet::SELF_HEAL));
    }

    #[test]
    fn ordinary_island_grants_nothing() {
        let mut ctx = context(2);
        let enemy = SlotRef::new(Side::Enemy, 0);
        put(&mut ctx, enemy, &monster(10.0));
        assert!(!ctx.rosters.get(enemy).unwrap().has(AbilitySet::SELF_HEAL));
    }

    #[test]
    fn schedule_unit_registers_every_timed_ability() {
        let mut ctx = context(1);
        let at = SlotRef::new(Side::Player, 0);
        let robot = UnitTemplate::new("bot", "Bot", Archetype::Geomancer, Faction::Robot, 10.0, 1.0, 2.0);
        put(&mut ctx, at, &robot);
        let mut timers = TimerTable::new();
        schedule_unit(&ctx, &mut timers, at, 100).unwrap();

        let key = |ability| TimerKey::Unit { unit: at, ability };
        assert_eq!(timers.next_fire(key(AbilityKind::BasicStrike)), Some(600));
        assert_eq!(timers.next_fire(key(AbilityKind::BonusStrike)), Some(2100));
        assert_eq!(timers.next_fire(key(AbilityKind::HeavyStrike)), Some(3100));
        assert_eq!(timers.len(), 3);
    }

    #[test]
    fn schedule_on_empty_slot_is_an_error() {
        let ctx = context(1);
        let mut timers = TimerTable::new();
        let at = SlotRef::new(Side::Enemy, 3);
        assert_eq!(
            schedule_unit(&ctx, &mut timers, at, 0),
            Err(BattleError::EmptySlot(at))
        );
    }

    #[test]
    fn buff_pulse_needs_a_living_emitter() {
        let mut ctx = context(1);
        let at = SlotRef::new(Side::Player, 0);
        let priest = UnitTemplate::new("p", "Priest", Archetype::SunPriest, Faction::Mystic, 10.0, 1.0, 1.0);
        put(&mut ctx, at, &priest);

        buff_pulse(&mut ctx, Side::Player);
        assert!(ctx.buffs.is_active(Side::Player, 0));

        ctx.buffs.clear();
        ctx.rosters.get_mut(at).unwrap().take_damage(10.0);
        buff_pulse(&mut ctx, Side::Player);
        assert!(!ctx.buffs.is_active(Side::Player, 0));
    }

    #[test]
    fn summon_skips_reserved_slot_and_tombstones() {
        let mut ctx = context(4);
        let mut timers = TimerTable::new();
        let summoner = SlotRef::new(Side::Enemy, 2);
        let cloud = UnitTemplate::new("c", "Cloud", Archetype::CloudBoss, Faction::Monster, 10.0, 1.0, 1.0).boss();
        put(&mut ctx, summoner, &cloud);
        put(&mut ctx, SlotRef::new(Side::Enemy, 0), &monster(1.0));
        ctx.rosters
            .get_mut(SlotRef::new(Side::Enemy, 0))
            .unwrap()
            .take_damage(5.0);

        let mut spawned = Vec::new();
        for _ in 0..5 {
            if let Some(at) = spawn_random(&mut ctx, &mut timers, summoner, &summoned_template(), Some(2)).unwrap() {
                spawned.push(at.slot);
            }
        }
        spawned.sort_unstable();
        assert_eq!(spawned, vec![1, 3, 4]);
    }

    #[test]
    fn transform_copies_mirror_unit() {
        let mut ctx = context(5);
        let mut timers = TimerTable::new();
        let hero_at = SlotRef::new(Side::Player, 1);
        let impostor_at = SlotRef::new(Side::Enemy, 1);
        let hero = UnitTemplate::new("geomis", "Geomis", Archetype::Geomancer, Faction::Mystic, 100.0, 20.0, 1.0);
        let impostor =
            UnitTemplate::new("imitator", "Imitator", Archetype::Impostor, Faction::Monster, 250.0, 1.0, 1.0)
                .boss()
                .impostor();
        put(&mut ctx, hero_at, &hero);
        put(&mut ctx, impostor_at, &impostor);

        transform(&mut ctx, &mut timers).unwrap();

        let copy = ctx.rosters.get(impostor_at).unwrap();
        assert_eq!(copy.id(), "imitate_geomis");
        assert_eq!(copy.max_health(), 300.0);
        assert_eq!(copy.health(), 250.0);
        assert!(copy.has(AbilitySet::HEAVY_STRIKE));
        assert!(timers.contains(TimerKey::Unit {
            unit: impostor_at,
            ability: AbilityKind::HeavyStrike
        }));
    }
}
