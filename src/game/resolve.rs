//! Stack resolution
//!
//! Pops the top entry, re-checks its target, and either runs its effects or
//! lets it fizzle. A fizzled instant or sorcery still goes to its owner's
//! graveyard; only the effects are skipped.

use crate::core::{CardId, EffectContext, EffectRef, EffectSlot, PlayerId, Target};
use crate::game::logger::category;
use crate::game::{GameState, PermanentId, StackEntry, StackEntryType};
use crate::{MtgError, Result};

/// Effects of a resolving entry still to run once the open interaction is answered
#[derive(Debug, Clone)]
pub struct PendingEffects {
    pub effects: Vec<EffectRef>,
    pub ctx: EffectContext,
}

impl GameState {
    /// Resolve the top entry of the stack
    ///
    /// Resolving with an empty stack is an engine defect.
    pub fn resolve_top_of_stack(&mut self) -> Result<()> {
        let entry = self
            .stack
            .pop()
            .ok_or_else(|| MtgError::InvariantViolation("resolving an empty stack".into()))?;
        self.priority_passed_by.clear();

        match entry.entry_type {
            StackEntryType::CreatureSpell
            | StackEntryType::ArtifactSpell
            | StackEntryType::EnchantmentSpell => self.resolve_permanent_spell(entry)?,
            StackEntryType::InstantSpell
            | StackEntryType::SorcerySpell
            | StackEntryType::ActivatedAbility
            | StackEntryType::TriggeredAbility => self.resolve_spell_or_ability(entry)?,
        }

        // An open interaction holds state-based actions until it is answered
        if self.interaction.is_none() {
            self.check_state_based_actions()?;
        }
        Ok(())
    }

    fn resolve_permanent_spell(&mut self, entry: StackEntry) -> Result<()> {
        let card = self.card(entry.card)?;
        let is_aura = card.is_aura();
        let name = card.name.to_string();
        let controller_name = self.player_name(entry.controller);

        if is_aura {
            let attach_to = entry
                .target
                .and_then(|t| t.as_permanent())
                .and_then(|id| self.find_permanent(id).map(|p| (id, p.card)));
            let Some((target_id, target_card)) = attach_to else {
                self.logger.event(
                    category::STACK,
                    format!("{name} fizzles (enchanted creature no longer exists)."),
                );
                return self.put_in_graveyard(entry.card);
            };
            // Shroud, protection or a changed filter match since casting
            if !self.target_still_legal(&entry) {
                self.logger
                    .event(category::STACK, format!("{name} fizzles (illegal target)."));
                return self.put_in_graveyard(entry.card);
            }
            let attached = Some(Target::Permanent(target_id));
            let permanent = self.enter_battlefield(entry.card, entry.controller, attached)?;
            self.logger.event(
                category::STACK,
                format!(
                    "{name} enters the battlefield attached to {} under {controller_name}'s control.",
                    self.card_name(target_card)
                ),
            );
            return self.on_enter_battlefield(entry.card, permanent, entry.controller, None);
        }

        let permanent = self.enter_battlefield(entry.card, entry.controller, None)?;
        self.logger.event(
            category::STACK,
            format!("{name} enters the battlefield under {controller_name}'s control."),
        );
        self.on_enter_battlefield(entry.card, permanent, entry.controller, entry.target)
    }

    /// "As enters" replacements apply at once; enter-the-battlefield triggers go on the stack
    pub(crate) fn on_enter_battlefield(
        &mut self,
        card_id: CardId,
        permanent: PermanentId,
        controller: PlayerId,
        target: Option<Target>,
    ) -> Result<()> {
        let card = self.card(card_id)?;
        let as_enters = card.effects_for(EffectSlot::AsEntersBattlefield);
        let etb = card.effects_for(EffectSlot::OnEnterBattlefield);
        let filter = card.target_filter.clone();
        let name = card.name.to_string();

        if !as_enters.is_empty() {
            let ctx = EffectContext {
                source_card: card_id,
                source_permanent: Some(permanent),
                controller,
                target,
                x_value: 0,
                source_name: name.clone(),
            };
            self.run_effects(as_enters, &ctx)?;
        }

        if !etb.is_empty() {
            let entry = StackEntry::new(
                StackEntryType::TriggeredAbility,
                card_id,
                controller,
                format!("{name}'s enter-the-battlefield ability"),
                etb,
            )
            .with_target(target, filter)
            .with_source(permanent);
            self.push_stack(entry);
        }
        Ok(())
    }

    fn resolve_spell_or_ability(&mut self, entry: StackEntry) -> Result<()> {
        let is_spell = entry.entry_type.is_spell();

        if !self.target_still_legal(&entry) {
            self.logger.event(
                category::STACK,
                format!("{} fizzles (illegal target).", entry.description),
            );
            if is_spell {
                self.put_in_graveyard(entry.card)?;
            }
            return Ok(());
        }

        self.logger
            .event(category::STACK, format!("{} resolves.", entry.description));

        let ctx = EffectContext {
            source_card: entry.card,
            source_permanent: entry.source_permanent,
            controller: entry.controller,
            target: entry.target,
            x_value: entry.x_value.unwrap_or(0),
            source_name: self.card_name(entry.card),
        };
        let shuffles = entry
            .effects
            .iter()
            .any(|effect| effect.shuffles_source_into_library());
        self.run_effects(entry.effects, &ctx)?;

        if is_spell {
            if shuffles {
                self.put_in_library(entry.card)?;
                let owner = self.card(entry.card)?.owner;
                self.shuffle_library(owner)?;
                self.logger.event(
                    category::STACK,
                    format!("{} is shuffled into its owner's library.", ctx.source_name),
                );
            } else {
                self.put_in_graveyard(entry.card)?;
            }
        }
        Ok(())
    }

    /// Apply effects in order. If one of them opens an interaction, the rest
    /// are held until it is answered.
    pub fn run_effects(&mut self, effects: Vec<EffectRef>, ctx: &EffectContext) -> Result<()> {
        let mut remaining = effects.into_iter();
        while let Some(effect) = remaining.next() {
            effect.apply(self, ctx)?;
            if self.game_over {
                return Ok(());
            }
            if self.interaction.is_some() {
                let rest: Vec<EffectRef> = remaining.collect();
                if !rest.is_empty() {
                    self.pending_effects.push(PendingEffects {
                        effects: rest,
                        ctx: ctx.clone(),
                    });
                }
                return Ok(());
            }
        }
        Ok(())
    }

    /// Continue held effects, innermost first, until they finish or ask for input again
    pub fn resume_pending_effects(&mut self) -> Result<()> {
        while self.interaction.is_none() {
            let Some(pending) = self.pending_effects.pop() else {
                break;
            };
            self.run_effects(pending.effects, &pending.ctx)?;
        }
        Ok(())
    }

    /// Put a triggered ability on the stack
    pub fn push_trigger(
        &mut self,
        card_id: CardId,
        controller: PlayerId,
        source: Option<PermanentId>,
        effects: Vec<EffectRef>,
        description: String,
    ) {
        let mut entry = StackEntry::new(
            StackEntryType::TriggeredAbility,
            card_id,
            controller,
            description,
            effects,
        )
        .non_targeting();
        entry.source_permanent = source;
        self.push_stack(entry);
    }
}
