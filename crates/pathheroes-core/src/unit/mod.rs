//! Combatant types for the battle engine.
//!
//! This module provides the core unit types:
//! - [`Side`] and [`SlotRef`]: stable positional identity of a combatant
//! - [`Archetype`] and [`Faction`]: tags resolved into an [`AbilitySet`]
//! - [`UnitTemplate`]: external description of a unit, possibly malformed
//! - [`Combatant`]: a live unit inside a roster slot
//!
//! # Invariants
//!
//! - `0 <= health <= max_health` at all times
//! - `alive == (health > 0)` once a damage application has been processed
//! - A dead combatant never comes back; its slot becomes a tombstone
//!
//! # Example
//!
//! ```
//! use pathheroes_core::unit::{Archetype, Combatant, Faction, Side, SlotRef, UnitTemplate};
//!
//! let template = UnitTemplate::new("knight", "Knight", Archetype::Striker, Faction::Human, 100.0, 10.0, 1.0);
//! let knight = Combatant::from_template(&template, SlotRef::new(Side::Player, 0)).unwrap();
//!
//! assert!(knight.is_alive());
//! assert_eq!(knight.health_fraction(), 1.0);
//! ```

mod ability;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use ability::{AbilityKind, AbilitySet};

use crate::clock::Millis;
use crate::error::SetupError;

// =============================================================================
// Positional identity
// =============================================================================

/// One of the two opposing rosters.
///
/// The declaration order is the scan order: player slots are processed before
/// enemy slots within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The player's heroes.
    Player,
    /// The generated monsters.
    Enemy,
}

impl Side {
    /// Both sides in scan order.
    pub const BOTH: [Self; 2] = [Self::Player, Self::Enemy];

    /// Returns the opposing side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }

    /// Returns a stable array index for per-side storage.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Player => 0,
            Self::Enemy => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Enemy => write!(f, "enemy"),
        }
    }
}

/// A slot on a specific side.
///
/// Ordering follows scan order: side first, then ascending slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    /// Owning side
    pub side: Side,
    /// Slot index within the side's roster
    pub slot: usize,
}

impl SlotRef {
    /// Creates a slot reference.
    #[must_use]
    pub const fn new(side: Side, slot: usize) -> Self {
        Self { side, slot }
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.side, self.slot)
    }
}

// =============================================================================
// Tags
// =============================================================================

/// Faction a unit belongs to.
///
/// Robots carry a bonus strike regardless of archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    /// Ordinary heroes
    #[default]
    Human,
    /// Mechanical heroes with an extra periodic strike
    Robot,
    /// Spellcasters
    Mystic,
    /// Island monsters and their bosses
    Monster,
}

/// Fixed category of a unit, deciding its special abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Plain basic-strike fighter
    Striker,
    /// Shielded for a short window after spawning
    Guardian,
    /// Pulses the side's damage buff
    SunPriest,
    /// Drops delayed meteors on random targets
    Geomancer,
    /// Periodically hits every opponent
    StarLord,
    /// Ordinary island monster
    Monster,
    /// Unit inserted mid-battle by a summoner
    Summoned,
    /// Island 1 boss
    JungleBoss,
    /// Island 2 boss, basic strike hits two targets
    BeachBoss,
    /// Island 3 boss, periodic fixed-damage strike
    VillageBoss,
    /// Island 4 boss, summons allies
    CloudBoss,
    /// Island 6 boss, spawns allies on kills
    DungeonBoss,
    /// Boss of the outer islands
    Warden,
    /// Placeholder identity until the transformation copies an opponent
    Impostor,
}

impl Archetype {
    /// Returns the ability descriptor for this archetype.
    #[must_use]
    pub const fn abilities(self) -> AbilitySet {
        match self {
            Self::Guardian => AbilitySet::SPAWN_SHIELD,
            Self::SunPriest => AbilitySet::BUFF_EMITTER,
            Self::Geomancer => AbilitySet::HEAVY_STRIKE,
            Self::StarLord => AbilitySet::ALL_TARGET_STRIKE,
            Self::BeachBoss => AbilitySet::MULTI_HIT,
            Self::VillageBoss => AbilitySet::SCATTER_STRIKE,
            Self::CloudBoss => AbilitySet::SUMMON,
            Self::DungeonBoss => AbilitySet::SPAWN_ON_KILL,
            Self::Striker
            | Self::Monster
            | Self::Summoned
            | Self::JungleBoss
            | Self::Warden
            | Self::Impostor => AbilitySet::empty(),
        }
    }
}

/// Resolves the ability set granted by an archetype and faction pair.
#[must_use]
pub fn abilities_for(archetype: Archetype, faction: Faction) -> AbilitySet {
    let mut set = archetype.abilities();
    if faction == Faction::Robot {
        set |= AbilitySet::BONUS_STRIKE;
    }
    set
}

// =============================================================================
// Templates
// =============================================================================

/// External description of a unit.
///
/// Stats are optional because templates come from collaborators that may
/// omit them. A template missing any stat is malformed and is treated as an
/// empty slot during setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTemplate {
    /// Identifier, e.g. `"geomis"` or `"bossCloud"`
    pub id: String,
    /// Display name
    pub name: String,
    /// Archetype tag
    pub archetype: Archetype,
    /// Faction tag
    #[serde(default)]
    pub faction: Faction,
    /// Maximum health
    #[serde(default)]
    pub max_health: Option<f64>,
    /// Attack power
    #[serde(default)]
    pub attack: Option<f64>,
    /// Attacks per second
    #[serde(default)]
    pub attack_rate: Option<f64>,
    /// Bosses are exempt from island regeneration
    #[serde(default)]
    pub boss: bool,
    /// Transforms into the opposing same-slot unit shortly after round start
    #[serde(default)]
    pub impostor: bool,
}

impl UnitTemplate {
    /// Creates a complete template.
    #[must_use]
    pub fn new(
        id: &str,
        name: &str,
        archetype: Archetype,
        faction: Faction,
        max_health: f64,
        attack: f64,
        attack_rate: f64,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            archetype,
            faction,
            max_health: Some(max_health),
            attack: Some(attack),
            attack_rate: Some(attack_rate),
            boss: false,
            impostor: false,
        }
    }

    /// Marks the template as a boss.
    #[must_use]
    pub fn boss(mut self) -> Self {
        self.boss = true;
        self
    }

    /// Marks the template as an impostor.
    #[must_use]
    pub fn impostor(mut self) -> Self {
        self.impostor = true;
        self
    }

    /// Extracts the stats, failing on the first missing or non-finite one.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::MalformedTemplate`] naming the missing field.
    pub fn stats(&self) -> Result<Stats, SetupError> {
        let field = |value: Option<f64>, name: &'static str| {
            value
                .filter(|v| v.is_finite() && *v >= 0.0)
                .ok_or_else(|| SetupError::MalformedTemplate {
                    id: self.id.clone(),
                    field: name,
                })
        };
        let max_health = field(self.max_health, "max_health")?;
        if max_health <= 0.0 {
            return Err(SetupError::MalformedTemplate {
                id: self.id.clone(),
                field: "max_health",
            });
        }
        Ok(Stats {
            max_health,
            attack: field(self.attack, "attack")?,
            attack_rate: field(self.attack_rate, "attack_rate")?,
        })
    }
}

/// Base stats of a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Maximum health
    pub max_health: f64,
    /// Attack power
    pub attack: f64,
    /// Attacks per second
    pub attack_rate: f64,
}

impl Stats {
    /// Returns the basic strike interval in milliseconds.
    ///
    /// The attack rate is clamped to `min_rate` first so a zero rate cannot
    /// divide by zero. The interval is never shorter than 1 ms.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn attack_interval(&self, min_rate: f64) -> Millis {
        let rate = self.attack_rate.max(min_rate).max(f64::MIN_POSITIVE);
        ((1000.0 / rate).round() as Millis).max(1)
    }
}

// =============================================================================
// Combatant
// =============================================================================

/// A unit occupying a roster slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    id: String,
    name: String,
    archetype: Archetype,
    faction: Faction,
    stats: Stats,
    health: f64,
    alive: bool,
    invulnerable_until: Option<Millis>,
    abilities: AbilitySet,
    boss: bool,
    impostor: bool,
    position: SlotRef,
}

impl Combatant {
    /// Creates a combatant at full health from a template.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::MalformedTemplate`] if the template lacks a stat.
    pub fn from_template(template: &UnitTemplate, position: SlotRef) -> Result<Self, SetupError> {
        let stats = template.stats()?;
        Ok(Self {
            id: template.id.clone(),
            name: template.name.clone(),
            archetype: template.archetype,
            faction: template.faction,
            stats,
            health: stats.max_health,
            alive: true,
            invulnerable_until: None,
            abilities: abilities_for(template.archetype, template.faction),
            boss: template.boss,
            impostor: template.impostor,
            position,
        })
    }

    /// Returns the identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the archetype tag.
    #[must_use]
    pub const fn archetype(&self) -> Archetype {
        self.archetype
    }

    /// Returns the faction tag.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Returns the base stats.
    #[must_use]
    pub const fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Returns the current health.
    #[must_use]
    pub const fn health(&self) -> f64 {
        self.health
    }

    /// Returns the maximum health.
    #[must_use]
    pub const fn max_health(&self) -> f64 {
        self.stats.max_health
    }

    /// Returns current health as a fraction of maximum health.
    #[must_use]
    pub fn health_fraction(&self) -> f64 {
        if self.stats.max_health <= 0.0 {
            0.0
        } else {
            self.health / self.stats.max_health
        }
    }

    /// Returns true while the combatant can act and be targeted.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Returns the ability descriptor.
    #[must_use]
    pub const fn abilities(&self) -> AbilitySet {
        self.abilities
    }

    /// Returns true if the combatant has every ability in `flags`.
    #[must_use]
    pub fn has(&self, flags: AbilitySet) -> bool {
        self.abilities.contains(flags)
    }

    /// Returns true for bosses.
    #[must_use]
    pub const fn is_boss(&self) -> bool {
        self.boss
    }

    /// Returns true while the transformation has not happened yet.
    #[must_use]
    pub const fn is_impostor(&self) -> bool {
        self.impostor
    }

    /// Returns the slot this combatant occupies.
    #[must_use]
    pub const fn position(&self) -> SlotRef {
        self.position
    }

    /// Returns the end of the invulnerability window, if one was granted.
    #[must_use]
    pub const fn invulnerable_until(&self) -> Option<Millis> {
        self.invulnerable_until
    }

    /// Returns true if damage aimed at this combatant is discarded at `now`.
    #[must_use]
    pub fn is_invulnerable(&self, now: Millis) -> bool {
        self.invulnerable_until.is_some_and(|until| now < until)
    }

    pub(crate) fn grant_abilities(&mut self, extra: AbilitySet) {
        self.abilities |= extra;
    }

    pub(crate) fn shield_until(&mut self, until: Millis) {
        self.invulnerable_until = Some(until);
    }

    /// Subtracts `amount`, clamping at zero. Returns true if this call killed
    /// the combatant.
    pub(crate) fn take_damage(&mut self, amount: f64) -> bool {
        if !self.alive {
            return false;
        }
        self.health = (self.health - amount.max(0.0)).clamp(0.0, self.stats.max_health);
        if self.health <= 0.0 {
            self.health = 0.0;
            self.alive = false;
            return true;
        }
        false
    }

    /// Restores full health. Dead combatants stay dead.
    pub(crate) fn restore_full(&mut self) {
        if self.alive {
            self.health = self.stats.max_health;
        }
    }

    /// Overwrites identity, stats and archetype with a copy of `source`.
    ///
    /// Maximum health becomes `source.max_health * health_multiplier`; current
    /// health is kept but capped at the new maximum.
    pub(crate) fn imitate(&mut self, source: &Combatant, health_multiplier: f64) {
        self.id = format!("imitate_{}", source.id);
        self.name = format!("Imitation: {}", source.name);
        self.archetype = source.archetype;
        self.faction = source.faction;
        self.stats = Stats {
            max_health: source.stats.max_health * health_multiplier,
            attack: source.stats.attack,
            attack_rate: source.stats.attack_rate,
        };
        self.health = self.health.min(self.stats.max_health);
        self.abilities = abilities_for(source.archetype, source.faction);
        self.impostor = false;
    }
}
