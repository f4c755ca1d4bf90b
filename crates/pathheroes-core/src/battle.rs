//! Battle driver with the fixed-rate tick loop.
//!
//! A [`Battle`] owns the [`BattleContext`], the timer table and the outcome
//! reporter. It moves through three phases:
//!
//! 1. **Setup**: rosters are placed and the encounter is fixed
//! 2. **Active**: [`Battle::step`] advances the clock one tick, checks for a
//!    wiped side, then fires every due timer in scan order
//! 3. **Resolved**: the first wipe cancels every timer, queues the victory
//!    rewards and freezes the battle
//!
//! Timer actions never abort the loop. Their errors are logged, and reports
//! to the collaborator are delivered after the actions of the tick ran.
//!
//! # Example
//!
//! ```
//! use pathheroes_core::battle::Battle;
//! use pathheroes_core::catalog::{hero, LevelId};
//! use pathheroes_core::config::BattleConfig;
//! use pathheroes_core::context::Encounter;
//! use pathheroes_core::unit::Side;
//!
//! let level = LevelId::new(1, 1).unwrap();
//! let mut battle = Battle::new(BattleConfig::default(), Encounter::new(level)).with_seed(42);
//!
//! battle.place(Side::Player, 0, &hero("geomis", 10).unwrap()).unwrap();
//! battle.generate_enemies().unwrap();
//! battle.start(0).unwrap();
//!
//! let outcome = battle.run_until_resolved(100_000);
//! assert!(outcome.is_some());
//! ```

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::abilities;
use crate::catalog::enemy_roster;
use crate::clock::Millis;
use crate::config::BattleConfig;
use crate::context::{BattleContext, BattleStats, Encounter};
use crate::error::SetupError;
use crate::outcome::{deliver, NoopReporter, OutcomeReporter, Report};
use crate::output::{BattleEvent, BattleSnapshot};
use crate::resolver;
use crate::roster::ROSTER_SIZE;
use crate::scheduler::{SideTimer, TimerKey, TimerTable};
use crate::state::{BattlePhase, Outcome};
use crate::unit::{Combatant, Side, SlotRef, UnitTemplate};

/// One battle between the player roster and an enemy roster.
#[derive(Debug)]
pub struct Battle<R: OutcomeReporter = NoopReporter> {
    ctx: BattleContext,
    timers: TimerTable,
    reporter: R,
}

impl Battle<NoopReporter> {
    /// Creates a battle whose outcomes are discarded.
    #[must_use]
    pub fn new(config: BattleConfig, encounter: Encounter) -> Self {
        Self::with_reporter(config, encounter, NoopReporter)
    }
}

impl<R: OutcomeReporter> Battle<R> {
    /// Creates a battle reporting outcomes to `reporter`.
    ///
    /// The random source is seeded from entropy; use [`Battle::with_seed`]
    /// for repeatable runs.
    pub fn with_reporter(config: BattleConfig, encounter: Encounter, reporter: R) -> Self {
        Self {
            ctx: BattleContext::new(config, encounter, ChaCha8Rng::from_entropy()),
            timers: TimerTable::new(),
            reporter,
        }
    }

    /// Replaces the random source with one seeded from `seed`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.ctx.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Places `template` into `side`'s `slot`.
    ///
    /// A malformed template leaves the slot empty and logs a warning.
    /// Returns whether a combatant was placed.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::AlreadyStarted`] after [`Battle::start`] and
    /// [`SetupError::SlotOutOfRange`] for a slot past the roster.
    pub fn place(
        &mut self,
        side: Side,
        slot: usize,
        template: &UnitTemplate,
    ) -> Result<bool, SetupError> {
        self.ensure_setup()?;
        if slot >= ROSTER_SIZE {
            return Err(SetupError::SlotOutOfRange(slot));
        }
        let at = SlotRef::new(side, slot);
        let mut unit = match Combatant::from_template(template, at) {
            Ok(unit) => unit,
            Err(err) => {
                warn!(%at, error = %err, "malformed template, slot left empty");
                self.ctx.rosters.side_mut(side).clear(slot)?;
                return Ok(false);
            }
        };
        abilities::prepare(&self.ctx, &mut unit);
        let roster = self.ctx.rosters.side_mut(side);
        roster.clear(slot)?;
        if let Err(err) = roster.place(slot, unit) {
            warn!(%at, error = %err, "could not place combatant");
            return Ok(false);
        }
        Ok(true)
    }

    /// Replaces `side`'s roster with `templates`, `None` marking an empty
    /// slot.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::RosterTooLarge`] for more than five entries and
    /// [`SetupError::AlreadyStarted`] after [`Battle::start`].
    pub fn load_roster(
        &mut self,
        side: Side,
        templates: &[Option<UnitTemplate>],
    ) -> Result<(), SetupError> {
        self.ensure_setup()?;
        if templates.len() > ROSTER_SIZE {
            return Err(SetupError::RosterTooLarge {
                count: templates.len(),
                max: ROSTER_SIZE,
            });
        }
        for slot in 0..ROSTER_SIZE {
            match templates.get(slot).and_then(Option::as_ref) {
                Some(template) => {
                    self.place(side, slot, template)?;
                }
                None => {
                    self.ctx.rosters.side_mut(side).clear(slot)?;
                }
            }
        }
        Ok(())
    }

    /// Fills the player roster from `templates` in slot order.
    ///
    /// # Errors
    ///
    /// See [`Battle::load_roster`].
    pub fn load_player_roster(&mut self, templates: &[UnitTemplate]) -> Result<(), SetupError> {
        let slots: Vec<Option<UnitTemplate>> = templates.iter().cloned().map(Some).collect();
        self.load_roster(Side::Player, &slots)
    }

    /// Generates the enemy roster for the encounter's level.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::AlreadyStarted`] after [`Battle::start`].
    pub fn generate_enemies(&mut self) -> Result<(), SetupError> {
        let slots = enemy_roster(self.ctx.encounter.level);
        self.load_roster(Side::Enemy, &slots)
    }

    /// Leaves setup and anchors every timer to `round_start`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::AlreadyStarted`] if called twice.
    pub fn start(&mut self, round_start: Millis) -> Result<(), SetupError> {
        self.ctx.machine.start()?;
        self.ctx.clock.reset_to(round_start);
        self.ctx.round_start = round_start;

        let units: Vec<SlotRef> = self
            .ctx
            .rosters
            .occupants()
            .filter(|unit| unit.is_alive())
            .map(Combatant::position)
            .collect();
        for at in &units {
            abilities::shield_on_spawn(&mut self.ctx, *at, round_start);
            if let Err(err) = abilities::schedule_unit(&self.ctx, &mut self.timers, *at, round_start) {
                warn!(%at, error = %err, "could not schedule unit");
            }
        }

        let tuning = &self.ctx.config.abilities;
        for side in Side::BOTH {
            self.timers.schedule_repeating(
                TimerKey::Side {
                    side,
                    kind: SideTimer::BuffPulse,
                },
                round_start,
                tuning.buff_interval_ms,
            );
        }
        let has_impostor = self.ctx.rosters.occupants().any(Combatant::is_impostor);
        if has_impostor {
            self.timers.schedule_once(
                TimerKey::Transform,
                round_start.saturating_add(tuning.transform_delay_ms),
            );
        }

        info!(
            level = %self.ctx.encounter.level,
            replay = self.ctx.encounter.replay,
            units = units.len(),
            round_start,
            "battle started"
        );
        Ok(())
    }

    fn ensure_setup(&self) -> Result<(), SetupError> {
        match self.ctx.machine.phase() {
            BattlePhase::Setup => Ok(()),
            _ => Err(SetupError::AlreadyStarted),
        }
    }

    // =========================================================================
    // Tick loop
    // =========================================================================

    /// Runs one tick and returns the phase afterwards.
    ///
    /// Does nothing outside the active phase.
    pub fn step(&mut self) -> BattlePhase {
        if !self.ctx.machine.is_active() {
            return self.ctx.machine.phase();
        }
        let now = self.ctx.clock.advance();

        if let Some(wiped) = self.ctx.wiped_side() {
            resolver::resolve(&mut self.ctx, &mut self.timers, wiped);
        } else {
            for key in self.timers.due(now) {
                if !self.ctx.machine.is_active() {
                    break;
                }
                let Some(firing) = self.timers.fire(key, now) else {
                    continue;
                };
                if let Err(err) = abilities::dispatch(&mut self.ctx, &mut self.timers, firing) {
                    warn!(?key, error = %err, "timer action failed");
                }
            }
        }

        if let Some(outcome) = self.ctx.pending_outcome.take() {
            self.settle(outcome);
        }
        self.flush_reports();
        self.ctx.machine.phase()
    }

    /// Steps until the battle resolves or `max_ticks` ticks have run.
    ///
    /// Returns `None` if the cap was reached first or the battle was never
    /// started.
    pub fn run_until_resolved(&mut self, max_ticks: u64) -> Option<Outcome> {
        for _ in 0..max_ticks {
            match self.step() {
                BattlePhase::Resolved(outcome) => return Some(outcome),
                BattlePhase::Setup => return None,
                BattlePhase::Active => {}
            }
        }
        self.ctx.machine.outcome()
    }

    /// Queues the victory rewards.
    fn settle(&mut self, outcome: Outcome) {
        if outcome != Outcome::Win {
            return;
        }
        let level = self.ctx.encounter.level;
        let first_clear = !self.ctx.encounter.replay
            && match self.reporter.is_level_completed(level) {
                Ok(completed) => !completed,
                Err(err) => {
                    warn!(%level, error = %err, "completion query failed, treating win as replay");
                    false
                }
            };
        let bundle = self.ctx.config.rewards.reward_for(level, first_clear);
        for (currency, amount) in bundle.grants() {
            self.ctx.queue(Report::Grant { currency, amount });
        }
        if first_clear {
            self.ctx.queue(Report::MarkCompleted(level));
        }
        info!(%level, first_clear, ?bundle, "victory rewards");
        self.ctx.stats.rewards = Some(bundle);
    }

    fn flush_reports(&mut self) {
        for report in std::mem::take(&mut self.ctx.reports) {
            if deliver(&mut self.reporter, report) {
                debug!(?report, "report delivered");
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> BattlePhase {
        self.ctx.machine.phase()
    }

    /// Returns the outcome, once resolved.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.ctx.machine.outcome()
    }

    /// Returns the current simulated time.
    #[must_use]
    pub fn now(&self) -> Millis {
        self.ctx.now()
    }

    /// Returns the number of ticks run since start.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ctx.clock.ticks()
    }

    /// Returns the combatant at `at`, living or dead.
    #[must_use]
    pub fn combatant(&self, at: SlotRef) -> Option<&Combatant> {
        self.ctx.rosters.get(at)
    }

    /// Returns the accumulated counters.
    #[must_use]
    pub fn stats(&self) -> &BattleStats {
        &self.ctx.stats
    }

    /// Returns the shared battle context.
    #[must_use]
    pub fn context(&self) -> &BattleContext {
        &self.ctx
    }

    /// Returns the pending timers.
    #[must_use]
    pub fn timers(&self) -> &TimerTable {
        &self.timers
    }

    /// Captures a renderer view of the current state.
    #[must_use]
    pub fn snapshot(&self) -> BattleSnapshot {
        let now = self.ctx.now();
        let buffed = [
            self.ctx.buffs.is_active(Side::Player, now),
            self.ctx.buffs.is_active(Side::Enemy, now),
        ];
        BattleSnapshot::capture(&self.ctx.rosters, now, self.phase(), buffed)
    }

    /// Drains the events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<BattleEvent> {
        self.ctx.events.take()
    }

    /// Returns the outcome reporter.
    #[must_use]
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Returns the outcome reporter mutably.
    pub fn reporter_mut(&mut self) -> &mut R {
        &mut self.reporter
    }

    /// Consumes the battle, returning the outcome reporter.
    pub fn into_reporter(self) -> R {
        self.reporter
    }
}
