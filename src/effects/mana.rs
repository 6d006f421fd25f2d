use crate::core::{Color, Effect, EffectContext};
use crate::game::logger::category;
use crate::game::{GameState, VerbosityLevel};
use crate::Result;

/// Add mana of one color to the controller's pool
#[derive(Debug, Clone, Copy)]
pub struct AddMana {
    pub color: Color,
    pub amount: u32,
}

impl AddMana {
    pub fn new(color: Color, amount: u32) -> Self {
        AddMana { color, amount }
    }
}

impl Effect for AddMana {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        game.get_player_mut(ctx.controller)?
            .mana_pool
            .add(self.color, self.amount);
        game.logger.log(
            VerbosityLevel::Verbose,
            Some(category::STACK),
            format!(
                "{} adds {} {} mana.",
                game.player_name(ctx.controller),
                self.amount,
                self.color.name()
            ),
        );
        Ok(())
    }

    fn produces_mana(&self) -> bool {
        true
    }
}
