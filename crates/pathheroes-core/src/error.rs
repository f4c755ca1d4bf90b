//! Error types for the battle engine.
//!
//! Errors are grouped by the phase that produces them:
//! - [`SetupError`]: building rosters and starting a battle
//! - [`ConfigError`]: loading or validating a [`BattleConfig`](crate::config::BattleConfig)
//! - [`BattleError`]: a single timer action failed during the tick loop
//! - [`ReportError`]: the external persistence collaborator refused a call
//!
//! Only setup and configuration errors ever reach the caller. Battle and
//! report errors are logged by the tick loop and the simulation continues.

use thiserror::Error;

use crate::unit::{Side, SlotRef};

/// Errors raised while assembling or starting a battle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
    /// More units were supplied than a roster has slots.
    #[error("roster has {count} entries but only {max} slots")]
    RosterTooLarge {
        /// Number of entries supplied
        count: usize,
        /// Number of slots available
        max: usize,
    },

    /// The island/level pair does not name a playable level.
    #[error("island {island} level {level} does not exist")]
    UnknownLevel {
        /// Requested island
        island: u8,
        /// Requested level
        level: u8,
    },

    /// A unit template is missing a required stat.
    #[error("unit template '{id}' is missing {field}")]
    MalformedTemplate {
        /// Template identifier
        id: String,
        /// Name of the missing stat
        field: &'static str,
    },

    /// The hero catalog has no entry with this identifier.
    #[error("unknown hero '{0}'")]
    UnknownHero(String),

    /// A hero upgrade level above the catalog maximum.
    #[error("upgrade level {level} exceeds the maximum of {max}")]
    UpgradeOutOfRange {
        /// Requested upgrade level
        level: u8,
        /// Highest supported upgrade level
        max: u8,
    },

    /// A slot index outside `0..ROSTER_SIZE`.
    #[error("slot {0} is outside the roster")]
    SlotOutOfRange(usize),

    /// The battle has already left the setup phase.
    #[error("battle has already started")]
    AlreadyStarted,
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value the engine cannot run with.
    #[error("configuration field `{field}` must be {requirement}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Human readable requirement
        requirement: &'static str,
    },
}

/// Errors raised by a single timer action inside the tick loop.
///
/// These never abort the loop; they are logged and the next timer runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BattleError {
    /// A timer referenced a slot that holds no combatant.
    #[error("no combatant in {0}")]
    EmptySlot(SlotRef),

    /// A spawn was attempted into a slot that is already occupied.
    #[error("{0} is already occupied")]
    SlotOccupied(SlotRef),

    /// A spawned template was rejected.
    #[error("could not spawn on the {side} side: {source}")]
    Spawn {
        /// Side receiving the unit
        side: Side,
        /// Underlying template problem
        #[source]
        source: SetupError,
    },
}

/// Errors returned by an [`OutcomeReporter`](crate::outcome::OutcomeReporter).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    /// The collaborator is not reachable.
    #[error("outcome collaborator unavailable: {0}")]
    Unavailable(String),

    /// The collaborator refused a specific operation.
    #[error("outcome collaborator rejected {operation}: {reason}")]
    Rejected {
        /// Operation name
        operation: &'static str,
        /// Reason given by the collaborator
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_error_messages_name_the_problem() {
        let err = SetupError::RosterTooLarge { count: 6, max: 5 };
        assert_eq!(err.to_string(), "roster has 6 entries but only 5 slots");

        let err = SetupError::MalformedTemplate {
            id: "ghost".to_string(),
            field: "attack",
        };
        assert_eq!(err.to_string(), "unit template 'ghost' is missing attack");
    }

    #[test]
    fn config_error_wraps_parse_failures() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ConfigError::from(parse);
        assert!(err.to_string().starts_with("failed to parse configuration"));
    }

    #[test]
    fn battle_error_mentions_slot() {
        let err = BattleError::EmptySlot(SlotRef::new(Side::Enemy, 3));
        assert_eq!(err.to_string(), "no combatant in enemy#3");
    }
}
