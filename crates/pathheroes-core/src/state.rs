//! Battle lifecycle state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SetupError;
use crate::unit::Side;

/// Final result from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every enemy is dead.
    Win,
    /// Every player combatant is dead.
    Loss,
}

impl Outcome {
    /// Returns the outcome caused by `side` being wiped.
    #[must_use]
    pub const fn for_wiped(side: Side) -> Self {
        match side {
            Side::Enemy => Self::Win,
            Side::Player => Self::Loss,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Win => write!(f, "win"),
            Self::Loss => write!(f, "loss"),
        }
    }
}

/// Lifecycle phase of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BattlePhase {
    /// Rosters are being assembled.
    #[default]
    Setup,
    /// The tick loop is running.
    Active,
    /// A side was wiped. Terminal.
    Resolved(Outcome),
}

/// Guards the `Setup -> Active -> Resolved` transitions.
///
/// # Example
///
/// ```
/// use pathheroes_core::state::{BattlePhase, Outcome, StateMachine};
/// use pathheroes_core::unit::Side;
///
/// let mut machine = StateMachine::new();
/// machine.start().unwrap();
/// assert_eq!(machine.resolve(Side::Enemy), Some(Outcome::Win));
/// assert_eq!(machine.resolve(Side::Player), None);
/// assert_eq!(machine.phase(), BattlePhase::Resolved(Outcome::Win));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateMachine {
    phase: BattlePhase,
}

impl StateMachine {
    /// Creates a machine in [`BattlePhase::Setup`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> BattlePhase {
        self.phase
    }

    /// Returns true while the tick loop should run.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.phase, BattlePhase::Active)
    }

    /// Returns true once an outcome is decided.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self.phase, BattlePhase::Resolved(_))
    }

    /// Returns the outcome, if decided.
    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            BattlePhase::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Moves from setup to active.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::AlreadyStarted`] outside the setup phase.
    pub fn start(&mut self) -> Result<(), SetupError> {
        if self.phase != BattlePhase::Setup {
            return Err(SetupError::AlreadyStarted);
        }
        self.phase = BattlePhase::Active;
        Ok(())
    }

    /// Records that `wiped` has no living combatant.
    ///
    /// Returns the outcome on the first call during the active phase and
    /// `None` on every later call.
    pub fn resolve(&mut self, wiped: Side) -> Option<Outcome> {
        if !self.is_active() {
            return None;
        }
        let outcome = Outcome::for_wiped(wiped);
        self.phase = BattlePhase::Resolved(outcome);
        Some(outcome)
    }
}
