//! Damage and destruction

use crate::core::{Color, Effect, EffectContext, Target};
use crate::game::logger::category;
use crate::game::GameState;
use crate::Result;
use smallvec::SmallVec;

/// Deal non-combat damage from the context's source to `target`
///
/// Color-based prevention and protection apply first. Damage to a player then
/// goes through their shields and any redirecting aura.
fn deal_damage(
    game: &mut GameState,
    ctx: &EffectContext,
    target: Target,
    amount: u32,
) -> Result<()> {
    let source = &ctx.source_name;
    let colors: SmallVec<[Color; 2]> = game.card(ctx.source_card)?.colors.clone();
    if game.damage_prevented_from_colors(&colors) {
        game.logger
            .event(category::STACK, format!("{source}'s damage is prevented."));
        return Ok(());
    }

    match target {
        Target::Permanent(id) => {
            let Some(permanent) = game.find_permanent(id) else {
                return Ok(());
            };
            let name = game.card_name(permanent.card);
            if game.damage_prevented_by_protection(permanent, &colors) {
                game.logger.event(
                    category::STACK,
                    format!("{source}'s damage to {name} is prevented."),
                );
                return Ok(());
            }
            let dealt = game
                .find_permanent_mut(id)
                .map(|p| p.deal_damage(amount))
                .unwrap_or(0);
            game.logger.event(
                category::STACK,
                format!("{source} deals {dealt} damage to {name}."),
            );
        }
        Target::Player(player) => {
            if game.consume_color_prevention(player, &colors) {
                game.logger.event(
                    category::STACK,
                    format!("{source}'s damage to {} is prevented.", game.player_name(player)),
                );
                return Ok(());
            }
            let remaining = game.prevent_player_damage(player, amount)?;
            let remaining = game.redirect_player_damage(player, remaining, false)?;
            if remaining > 0 {
                game.get_player_mut(player)?.lose_life(remaining as i32);
                game.logger.event(
                    category::STACK,
                    format!(
                        "{source} deals {remaining} damage to {}.",
                        game.player_name(player)
                    ),
                );
            }
        }
        Target::Spell(_) => {}
    }
    Ok(())
}

/// Deal a fixed amount of damage to the target
#[derive(Debug, Clone, Copy)]
pub struct DealDamageToTarget {
    pub amount: u32,
}

impl DealDamageToTarget {
    pub fn new(amount: u32) -> Self {
        DealDamageToTarget { amount }
    }
}

impl Effect for DealDamageToTarget {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        match ctx.target {
            Some(target) => deal_damage(game, ctx, target, self.amount),
            None => Ok(()),
        }
    }
}

/// Deal X damage to the target
#[derive(Debug, Clone, Copy, Default)]
pub struct DealXDamageToTarget;

impl Effect for DealXDamageToTarget {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        match ctx.target {
            Some(target) => deal_damage(game, ctx, target, ctx.x_value),
            None => Ok(()),
        }
    }
}

/// Destroy the target permanent
#[derive(Debug, Clone, Copy, Default)]
pub struct DestroyTarget {
    /// "It can't be regenerated"
    pub cant_regenerate: bool,
}

impl DestroyTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_regeneration() -> Self {
        DestroyTarget {
            cant_regenerate: true,
        }
    }
}

impl Effect for DestroyTarget {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        let Some(id) = ctx.target.and_then(|t| t.as_permanent()) else {
            return Ok(());
        };
        game.destroy_permanent(id, self.cant_regenerate)?;
        Ok(())
    }
}
