//! The stack and the priority protocol
//!
//! Priority is never stored; it is derived from the set of players who passed
//! since the last stack change. The active player holds priority unless they
//! passed, then the non-active player unless they passed. When both have
//! passed, the top entry resolves, or the step ends if the stack is empty.

use crate::core::{CardId, CardType, EffectRef, PlayerId, Target};
use crate::game::logger::category;
use crate::game::{GameState, PermanentId, TargetFilter};
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackEntryType {
    CreatureSpell,
    InstantSpell,
    SorcerySpell,
    ArtifactSpell,
    EnchantmentSpell,
    ActivatedAbility,
    TriggeredAbility,
}

impl StackEntryType {
    /// Entry type for casting a card, by its primary type
    pub fn for_card_types(types: &[CardType]) -> Option<StackEntryType> {
        if types.contains(&CardType::Creature) {
            Some(StackEntryType::CreatureSpell)
        } else if types.contains(&CardType::Instant) {
            Some(StackEntryType::InstantSpell)
        } else if types.contains(&CardType::Sorcery) {
            Some(StackEntryType::SorcerySpell)
        } else if types.contains(&CardType::Artifact) {
            Some(StackEntryType::ArtifactSpell)
        } else if types.contains(&CardType::Enchantment) {
            Some(StackEntryType::EnchantmentSpell)
        } else {
            None
        }
    }

    pub fn is_spell(&self) -> bool {
        !matches!(
            self,
            StackEntryType::ActivatedAbility | StackEntryType::TriggeredAbility
        )
    }

    /// Spells that put a permanent onto the battlefield
    pub fn is_permanent_spell(&self) -> bool {
        matches!(
            self,
            StackEntryType::CreatureSpell
                | StackEntryType::ArtifactSpell
                | StackEntryType::EnchantmentSpell
        )
    }
}

/// A spell or ability waiting to resolve
#[derive(Debug, Clone)]
pub struct StackEntry {
    pub entry_type: StackEntryType,
    /// The spell itself, or the card whose ability this is
    pub card: CardId,
    pub controller: PlayerId,
    pub target: Option<Target>,
    pub target_filter: Option<TargetFilter>,
    /// Permanent the ability came from; it may have left the battlefield since
    pub source_permanent: Option<PermanentId>,
    pub x_value: Option<u32>,
    pub effects: Vec<EffectRef>,
    /// Shown in log lines ("Shock", "Prodigal Sorcerer's ability")
    pub description: String,
    /// References its target without targeting it, so it never fizzles
    pub non_targeting: bool,
}

impl StackEntry {
    pub fn new(
        entry_type: StackEntryType,
        card: CardId,
        controller: PlayerId,
        description: impl Into<String>,
        effects: Vec<EffectRef>,
    ) -> Self {
        StackEntry {
            entry_type,
            card,
            controller,
            target: None,
            target_filter: None,
            source_permanent: None,
            x_value: None,
            effects,
            description: description.into(),
            non_targeting: false,
        }
    }

    pub fn with_target(mut self, target: Option<Target>, filter: Option<TargetFilter>) -> Self {
        self.target = target;
        self.target_filter = filter;
        self
    }

    pub fn with_source(mut self, source: PermanentId) -> Self {
        self.source_permanent = Some(source);
        self
    }

    pub fn with_x(mut self, x_value: Option<u32>) -> Self {
        self.x_value = x_value;
        self
    }

    pub fn non_targeting(mut self) -> Self {
        self.non_targeting = true;
        self
    }
}

impl GameState {
    /// Who may act right now, if anyone
    pub fn priority_holder(&self) -> Option<PlayerId> {
        if self.game_over
            || self.interaction.is_some()
            || !self.turn.current_step.grants_priority()
        {
            return None;
        }
        let active = self.turn.active_player;
        if !self.priority_passed_by.contains(&active) {
            return Some(active);
        }
        let other = self.opponent(active).ok()?;
        if !self.priority_passed_by.contains(&other) {
            return Some(other);
        }
        None
    }

    /// Put an entry on top of the stack
    ///
    /// Every push reopens priority, starting with the active player.
    pub fn push_stack(&mut self, entry: StackEntry) {
        self.logger.log(
            crate::game::VerbosityLevel::Verbose,
            Some(category::STACK),
            format!("{} is put on the stack.", entry.description),
        );
        self.stack.push(entry);
        self.priority_passed_by.clear();
    }

    pub fn top_of_stack(&self) -> Option<&StackEntry> {
        self.stack.last()
    }

    /// Is this card on the stack as a spell (not as an ability source)?
    pub fn is_spell_on_stack(&self, card_id: CardId) -> bool {
        self.stack
            .iter()
            .any(|entry| entry.card == card_id && entry.entry_type.is_spell())
    }

    /// Take a spell off the stack without resolving it
    pub fn remove_spell_from_stack(&mut self, card_id: CardId) -> Option<StackEntry> {
        let pos = self
            .stack
            .iter()
            .rposition(|entry| entry.card == card_id && entry.entry_type.is_spell())?;
        Some(self.stack.remove(pos))
    }

    /// Pass priority
    ///
    /// When both players have now passed in succession, either the top of the
    /// stack resolves or, with an empty stack, the game moves to the next step.
    pub fn pass_priority(&mut self, player: PlayerId) -> Result<()> {
        self.ensure_priority(player)?;

        self.priority_passed_by.insert(player);
        self.logger.log(
            crate::game::VerbosityLevel::Verbose,
            Some(category::PRIORITY),
            format!("{} passes priority.", self.player_name(player)),
        );

        self.check_state_based_actions()?;
        if self.game_over {
            return Ok(());
        }

        let everyone_passed = self
            .player_ids()
            .iter()
            .all(|p| self.priority_passed_by.contains(p));
        if !everyone_passed {
            return Ok(());
        }

        if self.stack.is_empty() {
            self.advance_step()
        } else {
            self.resolve_top_of_stack()
        }
    }

    /// Both players pass in turn, active player first. Convenience for hosts and tests.
    pub fn pass_both(&mut self) -> Result<()> {
        let first = self
            .priority_holder()
            .ok_or_else(|| MtgError::InvariantViolation("nobody holds priority".into()))?;
        self.pass_priority(first)?;
        if let Some(second) = self.priority_holder() {
            if second != first {
                self.pass_priority(second)?;
            }
        }
        Ok(())
    }
}
