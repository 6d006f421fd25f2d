//! The rules engine: game state, stack, turns, combat and resolution

pub mod actions;
pub mod combat;
pub mod command;
pub mod interaction;
pub mod legality;
pub mod logger;
pub mod permanent;
pub mod phase;
pub mod resolve;
pub mod sba;
pub mod stack;
pub mod state;
pub mod statics;
pub mod turn;

pub use combat::BlockerAssignment;
pub use command::{Command, PlayerCommand};
pub use interaction::{
    GraveyardDestination, Interaction, InteractionResponse, PermanentChoicePurpose,
};
pub use legality::TargetFilter;
pub use logger::{GameLogger, LogEntry, OutputFormat, OutputMode, VerbosityLevel};
pub use permanent::{Permanent, PermanentId};
pub use phase::{Phase, Step, TurnStructure};
pub use resolve::PendingEffects;
pub use stack::{StackEntry, StackEntryType};
pub use state::{GameState, TurnEffects};
