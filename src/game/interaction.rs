//! Out-of-band player decisions
//!
//! At most one [`Interaction`] is outstanding at a time. While one is open the
//! stack and priority are frozen; only its addressee may answer, through
//! [`GameState::respond_to_interaction`] (or the declare commands for combat).

use crate::core::{Color, EffectContext, EffectRef, PlayerId};
use crate::error::IllegalAction;
use crate::game::logger::category;
use crate::game::{GameState, PermanentId};
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};

/// Where a card chosen from a graveyard goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraveyardDestination {
    Hand,
    Battlefield,
}

/// What happens to a chosen permanent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermanentChoicePurpose {
    Sacrifice,
    Destroy,
    /// Keep the chosen legendary permanent; the other choices go to the graveyard
    KeepLegend,
}

#[derive(Debug, Clone)]
pub enum Interaction {
    AttackerDeclaration {
        player: PlayerId,
    },
    BlockerDeclaration {
        player: PlayerId,
    },
    /// "As this enters, choose a color"
    ColorChoice {
        player: PlayerId,
        permanent: PermanentId,
    },
    GraveyardChoice {
        player: PlayerId,
        valid_indices: Vec<usize>,
        destination: GraveyardDestination,
    },
    PermanentChoice {
        player: PlayerId,
        valid: Vec<PermanentId>,
        purpose: PermanentChoicePurpose,
    },
    /// "You may ..." with the effects to run on acceptance
    MayAbilityChoice {
        player: PlayerId,
        description: String,
        effects: Vec<EffectRef>,
        ctx: EffectContext,
    },
    /// Cleanup discard, one card per answer
    DiscardChoice {
        player: PlayerId,
        remaining: usize,
    },
}

/// A player's answer to an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionResponse {
    Color(Color),
    CardIndex(usize),
    Permanent(PermanentId),
    Accept(bool),
}

impl Interaction {
    /// The player who must answer
    pub fn player(&self) -> PlayerId {
        match self {
            Interaction::AttackerDeclaration { player }
            | Interaction::BlockerDeclaration { player }
            | Interaction::ColorChoice { player, .. }
            | Interaction::GraveyardChoice { player, .. }
            | Interaction::PermanentChoice { player, .. }
            | Interaction::MayAbilityChoice { player, .. }
            | Interaction::DiscardChoice { player, .. } => *player,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Interaction::AttackerDeclaration { .. } => "attacker declaration".into(),
            Interaction::BlockerDeclaration { .. } => "blocker declaration".into(),
            Interaction::ColorChoice { .. } => "color choice".into(),
            Interaction::GraveyardChoice { .. } => "graveyard choice".into(),
            Interaction::PermanentChoice { .. } => "permanent choice".into(),
            Interaction::MayAbilityChoice { .. } => "may ability choice".into(),
            Interaction::DiscardChoice { .. } => "discard choice".into(),
        }
    }
}

impl GameState {
    /// Open an interaction. Opening a second one is an engine defect.
    pub fn begin_interaction(&mut self, interaction: Interaction) -> Result<()> {
        if let Some(existing) = &self.interaction {
            return Err(MtgError::InvariantViolation(format!(
                "cannot open {} while {} is pending",
                interaction.describe(),
                existing.describe()
            )));
        }
        self.logger.log(
            crate::game::VerbosityLevel::Verbose,
            Some(category::INTERACTION),
            format!(
                "Waiting for {} ({}).",
                self.player_name(interaction.player()),
                interaction.describe()
            ),
        );
        self.interaction = Some(interaction);
        Ok(())
    }

    pub fn awaiting_input(&self) -> bool {
        self.interaction.is_some()
    }

    /// Answer the outstanding interaction
    ///
    /// The answer is validated before anything changes. Afterwards any effects
    /// held back by the interaction run, followed by state-based actions.
    pub fn respond_to_interaction(
        &mut self,
        player: PlayerId,
        response: InteractionResponse,
    ) -> Result<()> {
        self.ensure_running()?;
        let interaction = self
            .interaction
            .clone()
            .ok_or_else(|| IllegalAction::NotAwaiting("any input".into()))?;
        if interaction.player() != player {
            return Err(IllegalAction::NotYourChoice.into());
        }

        match (interaction, response) {
            (Interaction::ColorChoice { permanent, .. }, InteractionResponse::Color(color)) => {
                if color == Color::Colorless {
                    let reason = "colorless is not a color".into();
                    return Err(IllegalAction::InvalidChoice(reason).into());
                }
                self.interaction = None;
                let name = self.permanent_name(permanent);
                if let Some(p) = self.find_permanent_mut(permanent) {
                    p.chosen_color = Some(color);
                }
                self.logger.event(
                    category::INTERACTION,
                    format!("{} chooses {} for {}.", self.player_name(player), color.name(), name),
                );
            }
            (
                Interaction::GraveyardChoice {
                    valid_indices,
                    destination,
                    ..
                },
                InteractionResponse::CardIndex(index),
            ) => {
                if !valid_indices.contains(&index) {
                    return Err(IllegalAction::InvalidCardIndex(index).into());
                }
                let card_id = self
                    .get_player_zones(player)?
                    .graveyard
                    .get(index)
                    .ok_or(IllegalAction::InvalidCardIndex(index))?;
                self.interaction = None;
                self.get_player_zones_mut(player)?.graveyard.remove_at(index);
                let name = self.card_name(card_id);
                match destination {
                    GraveyardDestination::Hand => {
                        self.put_in_hand(card_id)?;
                        self.logger.event(
                            category::INTERACTION,
                            format!("{} returns {} to their hand.", self.player_name(player), name),
                        );
                    }
                    GraveyardDestination::Battlefield => {
                        let permanent = self.enter_battlefield(card_id, player, None)?;
                        self.logger.event(
                            category::INTERACTION,
                            format!(
                                "{} returns {} to the battlefield.",
                                self.player_name(player),
                                name
                            ),
                        );
                        self.on_enter_battlefield(card_id, permanent, player, None)?;
                    }
                }
            }
            (
                Interaction::PermanentChoice { valid, purpose, .. },
                InteractionResponse::Permanent(id),
            ) => {
                if !valid.contains(&id) || self.find_permanent(id).is_none() {
                    return Err(IllegalAction::InvalidTarget.into());
                }
                self.interaction = None;
                match purpose {
                    PermanentChoicePurpose::Sacrifice => {
                        let name = self.permanent_name(id);
                        self.sacrifice_permanent(id)?;
                        self.logger.event(
                            category::INTERACTION,
                            format!("{} sacrifices {}.", self.player_name(player), name),
                        );
                    }
                    PermanentChoicePurpose::Destroy => {
                        self.destroy_permanent(id, false)?;
                    }
                    PermanentChoicePurpose::KeepLegend => {
                        for other in valid.into_iter().filter(|other| *other != id) {
                            let name = self.permanent_name(other);
                            self.creature_dies(other)?;
                            self.logger.event(
                                category::STATE,
                                format!("{name} is put into the graveyard (legend rule)."),
                            );
                        }
                    }
                }
            }
            (
                Interaction::MayAbilityChoice {
                    description,
                    effects,
                    ctx,
                    ..
                },
                InteractionResponse::Accept(accepted),
            ) => {
                self.interaction = None;
                if accepted {
                    self.logger.event(
                        category::INTERACTION,
                        format!("{} accepts: {}.", self.player_name(player), description),
                    );
                    self.run_effects(effects, &ctx)?;
                } else {
                    self.logger.event(
                        category::INTERACTION,
                        format!("{} declines: {}.", self.player_name(player), description),
                    );
                }
            }
            (Interaction::DiscardChoice { remaining, .. }, InteractionResponse::CardIndex(index)) => {
                let card_id = self
                    .get_player_zones(player)?
                    .hand
                    .get(index)
                    .ok_or(IllegalAction::InvalidCardIndex(index))?;
                self.interaction = None;
                self.get_player_zones_mut(player)?.hand.remove_at(index);
                self.put_in_graveyard(card_id)?;
                self.logger.event(
                    category::TURN,
                    format!("{} discards {}.", self.player_name(player), self.card_name(card_id)),
                );
                if remaining > 1 {
                    self.begin_interaction(Interaction::DiscardChoice {
                        player,
                        remaining: remaining - 1,
                    })?;
                } else {
                    return self.finish_cleanup();
                }
                return Ok(());
            }
            (
                Interaction::AttackerDeclaration { .. } | Interaction::BlockerDeclaration { .. },
                _,
            ) => {
                return Err(IllegalAction::InvalidChoice(
                    "combat declarations are made with declare commands".into(),
                )
                .into());
            }
            (interaction, _) => {
                return Err(IllegalAction::InvalidChoice(format!(
                    "response does not answer {}",
                    interaction.describe()
                ))
                .into());
            }
        }

        self.resume_pending_effects()?;
        if self.interaction.is_none() {
            self.check_state_based_actions()?;
        }
        Ok(())
    }
}
