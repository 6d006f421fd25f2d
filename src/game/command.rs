//! Serializable player commands
//!
//! Hosts that receive commands over a wire (or from a file) decode them into
//! [`Command`] and hand them to [`GameState::apply_command`].

use crate::core::{PlayerId, Target};
use crate::game::{BlockerAssignment, GameState, InteractionResponse};
use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    CastSpell {
        hand_index: usize,
        #[serde(default)]
        x_value: Option<u32>,
        #[serde(default)]
        target: Option<Target>,
    },
    ActivateAbility {
        permanent_index: usize,
        #[serde(default)]
        ability_index: Option<usize>,
        #[serde(default)]
        x_value: Option<u32>,
        #[serde(default)]
        target: Option<Target>,
    },
    PlayLand {
        hand_index: usize,
    },
    TapForMana {
        permanent_index: usize,
    },
    PassPriority,
    DeclareAttackers {
        attackers: Vec<usize>,
    },
    DeclareBlockers {
        blockers: Vec<BlockerAssignment>,
    },
    Respond {
        response: InteractionResponse,
    },
}

/// A command together with the player issuing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCommand {
    pub player: PlayerId,
    #[serde(flatten)]
    pub command: Command,
}

impl GameState {
    /// Apply one command on behalf of `player`
    pub fn apply_command(&mut self, player: PlayerId, command: Command) -> Result<()> {
        match command {
            Command::CastSpell {
                hand_index,
                x_value,
                target,
            } => self.cast_spell(player, hand_index, x_value, target),
            Command::ActivateAbility {
                permanent_index,
                ability_index,
                x_value,
                target,
            } => self.activate_ability(player, permanent_index, ability_index, x_value, target),
            Command::PlayLand { hand_index } => self.play_land(player, hand_index),
            Command::TapForMana { permanent_index } => self.tap_for_mana(player, permanent_index),
            Command::PassPriority => self.pass_priority(player),
            Command::DeclareAttackers { attackers } => self.declare_attackers(player, &attackers),
            Command::DeclareBlockers { blockers } => self.declare_blockers(player, &blockers),
            Command::Respond { response } => self.respond_to_interaction(player, response),
        }
    }
}
