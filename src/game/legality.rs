//! Targeting and legality checks
//!
//! Everything here is a read-only predicate over the game. Commands call
//! these before mutating anything; resolution calls them again to decide
//! whether an entry fizzles.

use crate::core::{Card, CardType, Color, Keyword, PlayerId, Target};
use crate::error::IllegalAction;
use crate::game::{GameState, Permanent, StackEntry, Step};
use crate::Result;
use serde::{Deserialize, Serialize};

/// What a spell or ability may target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetFilter {
    Creature,
    CreatureYouControl,
    CreatureWithKeyword(Keyword),
    CreatureWithoutKeyword(Keyword),
    AttackingCreature,
    TappedCreature,
    Permanent,
    PermanentOfType(CardType),
    Player,
    /// Creature or player
    AnyTarget,
    /// A spell on the stack
    Spell,
}

impl TargetFilter {
    pub fn allows_players(&self) -> bool {
        matches!(self, TargetFilter::Player | TargetFilter::AnyTarget)
    }

    pub fn allows_permanents(&self) -> bool {
        !matches!(self, TargetFilter::Player | TargetFilter::Spell)
    }
}

fn type_name(card_type: CardType) -> &'static str {
    match card_type {
        CardType::Creature => "creature",
        CardType::Instant => "instant",
        CardType::Sorcery => "sorcery",
        CardType::Enchantment => "enchantment",
        CardType::Artifact => "artifact",
        CardType::Land => "land",
    }
}

fn mismatch(message: String) -> IllegalAction {
    IllegalAction::TargetFilterMismatch(message)
}

impl GameState {
    /// Check a permanent against a target filter from `controller`'s point of view
    pub fn check_target_filter(
        &self,
        filter: &TargetFilter,
        controller: PlayerId,
        permanent: &Permanent,
    ) -> std::result::Result<(), IllegalAction> {
        let is_creature = self.is_creature(permanent);
        match filter {
            TargetFilter::Creature | TargetFilter::AnyTarget if !is_creature => {
                Err(mismatch("Target must be a creature".into()))
            }
            TargetFilter::CreatureYouControl
                if !is_creature || permanent.controller != controller =>
            {
                Err(mismatch("Target must be a creature you control".into()))
            }
            TargetFilter::CreatureWithKeyword(kw)
                if !is_creature || !self.has_keyword(permanent, *kw) =>
            {
                Err(mismatch(format!("Target must be a creature with {kw}")))
            }
            TargetFilter::CreatureWithoutKeyword(kw)
                if !is_creature || self.has_keyword(permanent, *kw) =>
            {
                Err(mismatch(format!("Target must be a creature without {kw}")))
            }
            TargetFilter::AttackingCreature if !is_creature || !permanent.attacking => {
                Err(mismatch("Target must be an attacking creature".into()))
            }
            TargetFilter::TappedCreature if !is_creature || !permanent.tapped => {
                Err(mismatch("Target must be a tapped creature".into()))
            }
            TargetFilter::PermanentOfType(card_type) => {
                let matches = self
                    .permanent_card(permanent)
                    .map(|card| card.is_type(*card_type))
                    .unwrap_or(false);
                if matches {
                    Ok(())
                } else {
                    Err(mismatch(format!("Target must be a {}", type_name(*card_type))))
                }
            }
            TargetFilter::Player => Err(mismatch("Target must be a player".into())),
            TargetFilter::Spell => Err(IllegalAction::NotASpellOnStack),
            _ => Ok(()),
        }
    }

    /// Full target check for a spell or ability from `source`:
    /// existence, shroud, protection from the source's colors, then the filter.
    pub fn check_target(
        &self,
        source: &Card,
        controller: PlayerId,
        target: Target,
        filter: Option<&TargetFilter>,
    ) -> std::result::Result<(), IllegalAction> {
        match target {
            Target::Player(player) => {
                if !self.is_player(player) {
                    return Err(IllegalAction::InvalidTarget);
                }
                match filter {
                    Some(f) if !f.allows_players() => {
                        if *f == TargetFilter::Spell {
                            Err(IllegalAction::NotASpellOnStack)
                        } else {
                            Err(mismatch("Target must be a creature".into()))
                        }
                    }
                    _ => Ok(()),
                }
            }
            Target::Permanent(id) => {
                let permanent = self.find_permanent(id).ok_or(IllegalAction::InvalidTarget)?;
                let name = self.card_name(permanent.card);
                if self.has_keyword(permanent, Keyword::Shroud) {
                    return Err(IllegalAction::Shroud(name));
                }
                if let Some(color) = self.protected_from_any(permanent, &source.colors) {
                    return Err(IllegalAction::Protection { name, color });
                }
                match filter {
                    Some(f) => self.check_target_filter(f, controller, permanent),
                    None => Ok(()),
                }
            }
            Target::Spell(card_id) => {
                if let Some(f) = filter {
                    if *f != TargetFilter::Spell {
                        return Err(IllegalAction::InvalidTarget);
                    }
                }
                if self.is_spell_on_stack(card_id) {
                    Ok(())
                } else {
                    Err(IllegalAction::NotASpellOnStack)
                }
            }
        }
    }

    /// Re-check an entry's target at resolution. Non-targeting entries never fizzle.
    pub fn target_still_legal(&self, entry: &StackEntry) -> bool {
        if entry.non_targeting {
            return true;
        }
        let Some(target) = entry.target else {
            return true;
        };
        let Ok(source) = self.card(entry.card) else {
            return false;
        };
        self.check_target(source, entry.controller, target, entry.target_filter.as_ref())
            .is_ok()
    }

    /// Own turn, main phase, empty stack
    pub fn check_sorcery_timing(&self, player: PlayerId, what: &str) -> Result<()> {
        if self.turn.active_player != player {
            return Err(IllegalAction::NotYourTurn(what.to_string()).into());
        }
        if !self.turn.current_step.is_main() {
            return Err(IllegalAction::NotMainPhase(what.to_string()).into());
        }
        if !self.stack.is_empty() {
            return Err(IllegalAction::StackNotEmpty(what.to_string()).into());
        }
        Ok(())
    }

    pub fn check_upkeep_timing(&self, player: PlayerId) -> Result<()> {
        if self.turn.active_player != player || self.turn.current_step != Step::Upkeep {
            return Err(IllegalAction::OnlyDuringYourUpkeep.into());
        }
        Ok(())
    }

    /// Reject the command if the game is over or an interaction is pending
    pub fn ensure_no_pending_input(&self) -> Result<()> {
        self.ensure_running()?;
        if let Some(interaction) = &self.interaction {
            return Err(IllegalAction::AwaitingInput(interaction.describe()).into());
        }
        Ok(())
    }

    /// The player must hold priority and nothing may be pending
    pub fn ensure_priority(&self, player: PlayerId) -> Result<()> {
        self.ensure_no_pending_input()?;
        if self.priority_holder() != Some(player) {
            return Err(IllegalAction::NotYourPriority.into());
        }
        Ok(())
    }

    /// Can damage from a source of these colors hurt this permanent?
    pub fn damage_prevented_by_protection(
        &self,
        permanent: &Permanent,
        source_colors: &[Color],
    ) -> bool {
        self.protected_from_any(permanent, source_colors).is_some()
    }
}
