//! Prevention, redirection and regeneration
//!
//! All of these set up turn-scoped state that combat and damage effects read
//! later; the end-of-turn reset clears them.

use crate::core::{Color, Effect, EffectContext, Target};
use crate::game::logger::category;
use crate::game::GameState;
use crate::Result;

/// Prevent the next N damage to the target, or to anything when untargeted
#[derive(Debug, Clone, Copy)]
pub struct PreventDamageToTarget {
    pub amount: u32,
}

impl PreventDamageToTarget {
    pub fn new(amount: u32) -> Self {
        PreventDamageToTarget { amount }
    }
}

impl Effect for PreventDamageToTarget {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        let n = self.amount;
        let recipient = match ctx.target {
            Some(Target::Player(player)) => {
                game.get_player_mut(player)?.damage_prevention_shield += n;
                game.player_name(player)
            }
            Some(Target::Permanent(id)) => {
                let name = game.permanent_name(id);
                match game.find_permanent_mut(id) {
                    Some(permanent) => permanent.damage_prevention_shield += n,
                    None => return Ok(()),
                }
                name
            }
            Some(Target::Spell(_)) => return Ok(()),
            None => {
                game.turn_effects.global_damage_prevention_shield += n;
                "any permanent or player".to_string()
            }
        };
        game.logger.event(
            category::STACK,
            format!("The next {n} damage that would be dealt to {recipient} is prevented."),
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PreventAllCombatDamage;

impl Effect for PreventAllCombatDamage {
    fn apply(&self, game: &mut GameState, _ctx: &EffectContext) -> Result<()> {
        game.turn_effects.prevent_all_combat_damage = true;
        game.logger.event(
            category::STACK,
            "All combat damage will be prevented this turn.",
        );
        Ok(())
    }
}

/// Prevent all damage from sources of a color this turn
#[derive(Debug, Clone, Copy)]
pub struct PreventDamageFromColor {
    pub color: Color,
}

impl PreventDamageFromColor {
    pub fn new(color: Color) -> Self {
        PreventDamageFromColor { color }
    }
}

impl Effect for PreventDamageFromColor {
    fn apply(&self, game: &mut GameState, _ctx: &EffectContext) -> Result<()> {
        game.turn_effects.prevent_damage_from_colors.insert(self.color);
        game.logger.event(
            category::STACK,
            format!(
                "All damage from {} sources will be prevented this turn.",
                self.color.name()
            ),
        );
        Ok(())
    }
}

/// Prevent the next `times` instances of damage of a color to the controller
#[derive(Debug, Clone, Copy)]
pub struct PreventColorDamageToController {
    pub color: Color,
    pub times: u32,
}

impl PreventColorDamageToController {
    pub fn new(color: Color, times: u32) -> Self {
        PreventColorDamageToController { color, times }
    }
}

impl Effect for PreventColorDamageToController {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        *game
            .turn_effects
            .color_damage_prevention
            .entry(ctx.controller)
            .or_default()
            .entry(self.color)
            .or_insert(0) += self.times;
        game.logger.event(
            category::STACK,
            format!(
                "The next {} {} damage dealt to {} will be prevented.",
                if self.times == 1 {
                    "instance of".to_string()
                } else {
                    format!("{} instances of", self.times)
                },
                self.color.name(),
                game.player_name(ctx.controller)
            ),
        );
        Ok(())
    }
}

/// Unblocked combat damage aimed at the controller hits the source creature instead
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectCombatDamageToSelf;

impl Effect for RedirectCombatDamageToSelf {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        let Some(id) = ctx.source_permanent.filter(|id| game.find_permanent(*id).is_some()) else {
            return Ok(());
        };
        game.turn_effects.combat_damage_redirect_target = Some(id);
        game.logger.event(
            category::STACK,
            format!(
                "Unblocked combat damage will be redirected to {} this turn.",
                game.permanent_name(id)
            ),
        );
        Ok(())
    }
}

/// Target player's draws this turn are drawn by the controller instead
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectDrawsToController;

impl Effect for RedirectDrawsToController {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        let Some(player) = ctx.target.and_then(|t| t.as_player()) else {
            return Ok(());
        };
        game.turn_effects
            .draw_replacement
            .insert(player, ctx.controller);
        game.logger.event(
            category::STACK,
            format!(
                "{}'s draws are redirected to {} this turn.",
                game.player_name(player),
                game.player_name(ctx.controller)
            ),
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegenerateSelf;

impl Effect for RegenerateSelf {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        let Some(id) = ctx.source_permanent else {
            return Ok(());
        };
        let name = game.permanent_name(id);
        if let Some(permanent) = game.find_permanent_mut(id) {
            permanent.regeneration_shield += 1;
            game.logger
                .event(category::STACK, format!("{name} gains a regeneration shield."));
        }
        Ok(())
    }
}
