//! Life gain and card draw

use crate::core::{Effect, EffectContext};
use crate::game::logger::category;
use crate::game::GameState;
use crate::Result;

/// The controller gains life
#[derive(Debug, Clone, Copy)]
pub struct GainLife {
    pub amount: u32,
}

impl GainLife {
    pub fn new(amount: u32) -> Self {
        GainLife { amount }
    }
}

impl Effect for GainLife {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        game.get_player_mut(ctx.controller)?
            .gain_life(self.amount as i32);
        game.logger.event(
            category::STACK,
            format!(
                "{} gains {} life.",
                game.player_name(ctx.controller),
                self.amount
            ),
        );
        Ok(())
    }
}

/// The controller draws cards
#[derive(Debug, Clone, Copy)]
pub struct DrawCards {
    pub count: u32,
}

impl DrawCards {
    pub fn new(count: u32) -> Self {
        DrawCards { count }
    }
}

impl Effect for DrawCards {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        let name = game.player_name(ctx.controller);
        for _ in 0..self.count {
            if game.draw_card(ctx.controller)?.is_none() {
                game.logger
                    .event(category::STACK, format!("{name} has no cards to draw."));
                break;
            }
            game.logger
                .event(category::STACK, format!("{name} draws a card."));
        }
        Ok(())
    }
}
