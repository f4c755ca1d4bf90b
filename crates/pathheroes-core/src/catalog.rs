//! Hero templates and enemy roster generation.
//!
//! Heroes are looked up by identifier and scaled by their upgrade level.
//! Enemy rosters are generated from an island/level pair: ordinary levels
//! field a growing pack of monsters, and every tenth level fields the
//! island's boss roster.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SetupError;
use crate::roster::ROSTER_SIZE;
use crate::unit::{Archetype, Faction, UnitTemplate};

/// Number of islands.
pub const ISLAND_COUNT: usize = 10;

/// Levels per island.
pub const LEVELS_PER_ISLAND: usize = 10;

/// Highest hero upgrade level.
pub const MAX_UPGRADE: u8 = 10;

/// Slot reserved for single bosses and summoners.
pub const BOSS_SLOT: usize = 2;

const BOSS_LEVEL: u8 = 10;

const FLANK_ESCORTS: &[usize] = &[1, 3];
const FULL_ESCORTS: &[usize] = &[0, 1, 3, 4];

// =============================================================================
// Levels
// =============================================================================

/// A playable island/level pair, both 1-based.
///
/// # Example
///
/// ```
/// use pathheroes_core::catalog::LevelId;
///
/// let level = LevelId::new(4, 10).unwrap();
/// assert!(level.is_boss_level());
/// assert!(LevelId::new(11, 1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawLevel")]
pub struct LevelId {
    island: u8,
    level: u8,
}

#[derive(Deserialize)]
struct RawLevel {
    island: u8,
    level: u8,
}

impl TryFrom<RawLevel> for LevelId {
    type Error = SetupError;

    fn try_from(raw: RawLevel) -> Result<Self, Self::Error> {
        Self::new(raw.island, raw.level)
    }
}

impl LevelId {
    /// Island 5 boss level, the mirror match against impostors.
    pub const MIRROR_MATCH: Self = Self {
        island: 5,
        level: 10,
    };

    /// Island 1 boss level.
    pub const FIRST_BOSS: Self = Self {
        island: 1,
        level: 10,
    };

    /// Validates and creates a level identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::UnknownLevel`] outside `1..=10` for either part.
    pub fn new(island: u8, level: u8) -> Result<Self, SetupError> {
        let in_range = |value: u8, max: usize| (1..=max).contains(&usize::from(value));
        if in_range(island, ISLAND_COUNT) && in_range(level, LEVELS_PER_ISLAND) {
            Ok(Self { island, level })
        } else {
            Err(SetupError::UnknownLevel { island, level })
        }
    }

    /// Returns the island number.
    #[must_use]
    pub const fn island(&self) -> u8 {
        self.island
    }

    /// Returns the level number within the island.
    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// Returns true for the tenth level of an island.
    #[must_use]
    pub const fn is_boss_level(&self) -> bool {
        self.level == BOSS_LEVEL
    }

    pub(crate) fn island_index(self) -> usize {
        usize::from(self.island) - 1
    }

    pub(crate) fn level_index(self) -> usize {
        usize::from(self.level) - 1
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.island, self.level)
    }
}

// =============================================================================
// Heroes
// =============================================================================

struct HeroEntry {
    id: &'static str,
    name: &'static str,
    archetype: Archetype,
    faction: Faction,
    max_health: f64,
    attack: f64,
    attack_rate: f64,
}

const HEROES: &[HeroEntry] = &[
    HeroEntry {
        id: "executioner",
        name: "Executioner",
        archetype: Archetype::Striker,
        faction: Faction::Human,
        max_health: 220.0,
        attack: 22.0,
        attack_rate: 1.0,
    },
    HeroEntry {
        id: "bastin",
        name: "Bastin",
        archetype: Archetype::Guardian,
        faction: Faction::Human,
        max_health: 320.0,
        attack: 14.0,
        attack_rate: 0.8,
    },
    HeroEntry {
        id: "anubis",
        name: "Anubis",
        archetype: Archetype::SunPriest,
        faction: Faction::Mystic,
        max_health: 180.0,
        attack: 16.0,
        attack_rate: 1.0,
    },
    HeroEntry {
        id: "geomis",
        name: "Geomis",
        archetype: Archetype::Geomancer,
        faction: Faction::Mystic,
        max_health: 170.0,
        attack: 26.0,
        attack_rate: 0.7,
    },
    HeroEntry {
        id: "starlord",
        name: "Star Lord",
        archetype: Archetype::StarLord,
        faction: Faction::Mystic,
        max_health: 200.0,
        attack: 20.0,
        attack_rate: 0.8,
    },
    HeroEntry {
        id: "sentinel",
        name: "Sentinel",
        archetype: Archetype::Striker,
        faction: Faction::Robot,
        max_health: 260.0,
        attack: 18.0,
        attack_rate: 1.1,
    },
];

/// Identifier of the hero every new player owns.
pub const STARTER_HERO: &str = "executioner";

/// Iterates the identifiers of every hero in the catalog.
pub fn hero_ids() -> impl Iterator<Item = &'static str> {
    HEROES.iter().map(|hero| hero.id)
}

/// Returns the template of hero `id` at `upgrade`.
///
/// Each upgrade level adds 50 maximum health and 5 attack.
///
/// # Errors
///
/// Returns [`SetupError::UnknownHero`] or [`SetupError::UpgradeOutOfRange`].
pub fn hero(id: &str, upgrade: u8) -> Result<UnitTemplate, SetupError> {
    if upgrade > MAX_UPGRADE {
        return Err(SetupError::UpgradeOutOfRange {
            level: upgrade,
            max: MAX_UPGRADE,
        });
    }
    let entry = HEROES
        .iter()
        .find(|hero| hero.id == id)
        .ok_or_else(|| SetupError::UnknownHero(id.to_string()))?;
    let upgrade = f64::from(upgrade);
    Ok(UnitTemplate::new(
        entry.id,
        entry.name,
        entry.archetype,
        entry.faction,
        entry.max_health + 50.0 * upgrade,
        entry.attack + 5.0 * upgrade,
        entry.attack_rate,
    ))
}

/// Builds a player roster from `(hero id, upgrade)` picks, in slot order.
///
/// # Errors
///
/// Returns [`SetupError::RosterTooLarge`] for more than five picks, or the
/// first lookup failure.
pub fn hero_roster<S: AsRef<str>>(picks: &[(S, u8)]) -> Result<Vec<UnitTemplate>, SetupError> {
    if picks.len() > ROSTER_SIZE {
        return Err(SetupError::RosterTooLarge {
            count: picks.len(),
            max: ROSTER_SIZE,
        });
    }
    picks
        .iter()
        .map(|(id, upgrade)| hero(id.as_ref(), *upgrade))
        .collect()
}

// =============================================================================
// Monsters
// =============================================================================

/// Base stats of an ordinary monster on `island` at `level`.
///
/// Health and attack grow geometrically per island and linearly per level.
/// Attack rate creeps up per island and caps at 1.5.
#[must_use]
pub fn monster_stats(island: u8, level: u8) -> (f64, f64, f64) {
    let island_step = f64::from(island.saturating_sub(1));
    let level_step = f64::from(level.saturating_sub(1));
    let max_health = (60.0 * 1.35_f64.powf(island_step) * (1.0 + 0.12 * level_step)).round();
    let attack = (6.0 * 1.3_f64.powf(island_step) * (1.0 + 0.1 * level_step)).round();
    let attack_rate = (0.8 + 0.05 * island_step).min(1.5);
    (max_health, attack, attack_rate)
}

fn monster(level: LevelId, slot: usize) -> UnitTemplate {
    let (hp, atk, rate) = monster_stats(level.island, level.level);
    UnitTemplate::new(
        &format!("m{}_{}_{}", level.island, level.level, slot),
        "Monster",
        Archetype::Monster,
        Faction::Monster,
        hp,
        atk,
        rate,
    )
}

fn escort(level: LevelId, slot: usize) -> UnitTemplate {
    let (hp, atk, rate) = monster_stats(level.island, 9);
    UnitTemplate::new(
        &format!("escort{}_{}", level.island, slot),
        "Escort",
        Archetype::Monster,
        Faction::Monster,
        hp,
        atk,
        rate,
    )
}

fn boss(level: LevelId, id: &str, name: &str, archetype: Archetype) -> UnitTemplate {
    let (hp, atk, rate) = monster_stats(level.island, BOSS_LEVEL);
    UnitTemplate::new(id, name, archetype, Faction::Monster, hp * 8.0, atk * 2.5, rate).boss()
}

/// Template inserted by a summoning boss.
#[must_use]
pub fn summoned_template() -> UnitTemplate {
    UnitTemplate::new(
        "summoned",
        "Summoned",
        Archetype::Summoned,
        Faction::Monster,
        5000.0,
        500.0,
        1.0,
    )
}

/// Template inserted when a spawn-on-kill unit scores a kill.
#[must_use]
pub fn regeneration_spawn_template(island: u8) -> UnitTemplate {
    let (hp, atk, rate) = monster_stats(island, 1);
    UnitTemplate::new("m_spawn", "Monster", Archetype::Monster, Faction::Monster, hp, atk, rate)
}

/// Generates the enemy roster of `level`, slot by slot.
///
/// # Example
///
/// ```
/// use pathheroes_core::catalog::{enemy_roster, LevelId};
///
/// let roster = enemy_roster(LevelId::new(1, 5).unwrap());
/// assert_eq!(roster.iter().flatten().count(), 4);
///
/// let cloud = enemy_roster(LevelId::new(4, 10).unwrap());
/// assert_eq!(cloud.iter().flatten().count(), 1);
/// assert!(cloud[2].is_some());
/// ```
#[must_use]
pub fn enemy_roster(level: LevelId) -> [Option<UnitTemplate>; ROSTER_SIZE] {
    let mut slots: [Option<UnitTemplate>; ROSTER_SIZE] = Default::default();

    if !level.is_boss_level() {
        let count = match level.level {
            1..=3 => 3,
            4..=6 => 4,
            _ => 5,
        };
        for (slot, entry) in slots.iter_mut().enumerate().take(count) {
            *entry = Some(monster(level, slot));
        }
        return slots;
    }

    let (boss_template, escorts) = match level.island {
        1 => (boss(level, "bossJungle", "Jungle Tyrant", Archetype::JungleBoss), FLANK_ESCORTS),
        2 => (boss(level, "bossBeach", "Tide Crusher", Archetype::BeachBoss), FLANK_ESCORTS),
        3 => (boss(level, "bossVillage", "Village Warlord", Archetype::VillageBoss), FLANK_ESCORTS),
        4 => (boss(level, "bossCloud", "Cloud Sovereign", Archetype::CloudBoss), &[][..]),
        5 => {
            let (hp, atk, rate) = monster_stats(level.island, level.level);
            for (slot, entry) in slots.iter_mut().enumerate() {
                *entry = Some(
                    UnitTemplate::new(
                        &format!("imitator{slot}"),
                        "Imitator",
                        Archetype::Impostor,
                        Faction::Monster,
                        hp * 4.0,
                        atk,
                        rate,
                    )
                    .boss()
                    .impostor(),
                );
            }
            return slots;
        }
        6 => (boss(level, "bossDungeon", "Dungeon Keeper", Archetype::DungeonBoss), FLANK_ESCORTS),
        _ => (boss(level, "bossWarden", "Warden", Archetype::Warden), FULL_ESCORTS),
    };

    slots[BOSS_SLOT] = Some(boss_template);
    for &slot in escorts {
        slots[slot] = Some(escort(level, slot));
    }
    slots
}
