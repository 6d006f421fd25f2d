//! Error types for the rules engine
//!
//! Every rejected player command surfaces as [`MtgError::IllegalAction`] carrying a
//! named [`IllegalAction`]. Only [`MtgError::InvariantViolation`] is fatal.

use crate::core::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MtgError {
    #[error("Illegal action: {0}")]
    IllegalAction(#[from] IllegalAction),

    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl MtgError {
    /// The illegal-action condition, if this error rejected a command
    pub fn illegal_action(&self) -> Option<&IllegalAction> {
        match self {
            MtgError::IllegalAction(action) => Some(action),
            _ => None,
        }
    }

    /// Fatal errors indicate an engine defect rather than a bad command
    pub fn is_fatal(&self) -> bool {
        matches!(self, MtgError::InvariantViolation(_))
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        self.illegal_action().map(IllegalAction::category)
    }
}

/// Coarse classes of illegal actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    Cost,
    Timing,
    State,
    Targeting,
    Protocol,
}

/// A command that the rules forbid right now. Raising one never mutates the game.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IllegalAction {
    // Cost
    #[error("Not enough mana")]
    NotEnoughMana,
    #[error("Not enough mana to pay for X={0}")]
    NotEnoughManaForX(u32),
    #[error("Not enough mana to activate ability")]
    NotEnoughManaToActivate,
    #[error("Not enough mana to pay attack tax ({0} required)")]
    AttackTaxUnpaid(u32),
    #[error("Must choose a creature to sacrifice")]
    SacrificeTargetRequired,
    #[error("Invalid sacrifice target")]
    InvalidSacrificeTarget,
    #[error("Must sacrifice a creature you control")]
    MustSacrificeOwnCreature,

    // Timing
    #[error("{0} can only be done during your turn")]
    NotYourTurn(String),
    #[error("{0} can only be done during a main phase")]
    NotMainPhase(String),
    #[error("{0} can only be done when the stack is empty")]
    StackNotEmpty(String),
    #[error("This ability can only be activated during your upkeep")]
    OnlyDuringYourUpkeep,

    // State
    #[error("Card is not playable")]
    NotPlayable,
    #[error("You have already played a land this turn")]
    LandAlreadyPlayed,
    #[error("Invalid card index: {0}")]
    InvalidCardIndex(usize),
    #[error("Invalid permanent index")]
    InvalidPermanentIndex(usize),
    #[error("Permanent has no activated ability")]
    NoActivatedAbility,
    #[error("Invalid ability index")]
    InvalidAbilityIndex(usize),
    #[error("Permanent has no mana abilities")]
    NoManaAbility,
    #[error("Permanent is already tapped")]
    AlreadyTapped,
    #[error("Creature has summoning sickness")]
    SummoningSickness,

    // Targeting
    #[error("Must choose a target")]
    TargetRequired,
    #[error("Invalid target")]
    InvalidTarget,
    #[error("Target must be a spell on the stack")]
    NotASpellOnStack,
    #[error("{name} has protection from {}", .color.name())]
    Protection { name: String, color: Color },
    #[error("{0} has shroud and can't be targeted")]
    Shroud(String),
    #[error("{0}")]
    TargetFilterMismatch(String),
    #[error("Duplicate attacker indices")]
    DuplicateAttackers,
    #[error("Invalid attacker index: {0}")]
    InvalidAttackerIndex(usize),
    #[error("Creature at index {0} must attack this combat")]
    MustAttack(usize),
    #[error("Invalid blocker index: {0}")]
    InvalidBlockerIndex(usize),
    #[error("Blocker {0} assigned too many times")]
    BlockerAssignedTooManyTimes(usize),
    #[error("Duplicate blocker-attacker pair: {0} -> {1}")]
    DuplicateBlockPair(usize, usize),
    #[error("{0} can't be blocked")]
    CantBeBlocked(String),
    #[error("{blocker} cannot block {attacker} ({reason})")]
    CantBlock {
        blocker: String,
        attacker: String,
        reason: String,
    },
    #[error("{0} can't block this turn")]
    CantBlockThisTurn(String),
    #[error("{0} can't be blocked except by two or more creatures")]
    Menace(String),
    #[error("{blocker} must block enchanted creature if able")]
    MustBlockEnchanted { blocker: String },

    // Protocol
    #[error("Awaiting input: {0}")]
    AwaitingInput(String),
    #[error("Player does not have priority")]
    NotYourPriority,
    #[error("Not awaiting {0}")]
    NotAwaiting(String),
    #[error("Not your turn to choose")]
    NotYourChoice,
    #[error("Invalid choice: {0}")]
    InvalidChoice(String),
    #[error("Game is over")]
    GameOver,
}

impl IllegalAction {
    pub fn category(&self) -> ErrorCategory {
        use IllegalAction::*;
        match self {
            NotEnoughMana
            | NotEnoughManaForX(_)
            | NotEnoughManaToActivate
            | AttackTaxUnpaid(_)
            | SacrificeTargetRequired
            | InvalidSacrificeTarget
            | MustSacrificeOwnCreature => ErrorCategory::Cost,

            NotYourTurn(_) | NotMainPhase(_) | StackNotEmpty(_) | OnlyDuringYourUpkeep => {
                ErrorCategory::Timing
            }

            NotPlayable
            | LandAlreadyPlayed
            | InvalidCardIndex(_)
            | InvalidPermanentIndex(_)
            | NoActivatedAbility
            | InvalidAbilityIndex(_)
            | NoManaAbility
            | AlreadyTapped
            | SummoningSickness => ErrorCategory::State,

            TargetRequired
            | InvalidTarget
            | NotASpellOnStack
            | Protection { .. }
            | Shroud(_)
            | TargetFilterMismatch(_)
            | DuplicateAttackers
            | InvalidAttackerIndex(_)
            | MustAttack(_)
            | InvalidBlockerIndex(_)
            | BlockerAssignedTooManyTimes(_)
            | DuplicateBlockPair(..)
            | CantBeBlocked(_)
            | CantBlock { .. }
            | CantBlockThisTurn(_)
            | Menace(_)
            | MustBlockEnchanted { .. } => ErrorCategory::Targeting,

            AwaitingInput(_) | NotYourPriority | NotAwaiting(_) | NotYourChoice
            | InvalidChoice(_) | GameOver => ErrorCategory::Protocol,
        }
    }
}

pub type Result<T> = std::result::Result<T, MtgError>;
