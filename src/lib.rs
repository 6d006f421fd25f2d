//! Vibes engine - a rules engine for a Magic-style two-player card game
//!
//! The engine owns one [`game::GameState`] per match and mutates it in
//! response to player commands: casting spells, activating abilities,
//! passing priority, declaring attackers and blockers, and answering
//! interactions. Card behavior is supplied from outside through the
//! [`core::Effect`] trait; [`effects`] holds a set of stock effects.

pub mod config;
pub mod core;
pub mod effects;
pub mod error;
pub mod game;
pub mod zones;

pub use error::{ErrorCategory, IllegalAction, MtgError, Result};
