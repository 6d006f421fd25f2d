//! Attaching equipment and changing control

use crate::core::{ActivatedAbility, ActivationTiming, Effect, EffectContext, Target};
use crate::game::logger::category;
use crate::game::{GameState, TargetFilter};
use crate::Result;

/// Attach the source equipment to the target creature
///
/// Build the whole ability with [`Equip::ability`]: equip only works at
/// sorcery speed and targets a creature its controller controls.
#[derive(Debug, Clone, Copy, Default)]
pub struct Equip;

impl Equip {
    /// "Equip {cost}"
    pub fn ability(cost: &str) -> Result<ActivatedAbility> {
        Ok(ActivatedAbility::new(cost)?
            .targeting(TargetFilter::CreatureYouControl)
            .with_timing(ActivationTiming::SorcerySpeed)
            .with_effect(Equip))
    }
}

impl Effect for Equip {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        let Some(creature) = ctx.target.and_then(|t| t.as_permanent()) else {
            return Ok(());
        };
        let equipment = ctx
            .source_permanent
            .filter(|id| game.find_permanent(*id).is_some());
        let Some(equipment) = equipment else {
            game.logger.event(
                category::STACK,
                format!(
                    "{}'s equip ability fizzles (equipment no longer on the battlefield).",
                    ctx.source_name
                ),
            );
            return Ok(());
        };
        let creature_name = game.permanent_name(creature);
        if let Some(p) = game.find_permanent_mut(equipment) {
            p.attached_to = Some(Target::Permanent(creature));
        }
        game.logger.event(
            category::STACK,
            format!("{} is now attached to {creature_name}.", ctx.source_name),
        );
        Ok(())
    }
}

/// The controller gains control of the target permanent
#[derive(Debug, Clone, Copy, Default)]
pub struct GainControlOfTarget {
    /// Control goes back during the cleanup step
    pub until_end_of_turn: bool,
}

impl GainControlOfTarget {
    pub fn permanently() -> Self {
        GainControlOfTarget {
            until_end_of_turn: false,
        }
    }

    pub fn until_end_of_turn() -> Self {
        GainControlOfTarget {
            until_end_of_turn: true,
        }
    }
}

impl Effect for GainControlOfTarget {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        let Some(id) = ctx.target.and_then(|t| t.as_permanent()) else {
            return Ok(());
        };
        let Some(previous) = game.change_control(id, ctx.controller)? else {
            return Ok(());
        };
        if self.until_end_of_turn {
            // A second steal doesn't change who gets it back
            game.turn_effects
                .control_until_end_of_turn
                .entry(id)
                .or_insert(previous);
        } else {
            game.turn_effects.control_until_end_of_turn.remove(&id);
        }
        game.logger.event(
            category::STACK,
            format!(
                "{} gains control of {}.",
                game.player_name(ctx.controller),
                game.permanent_name(id)
            ),
        );
        Ok(())
    }
}
