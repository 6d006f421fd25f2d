//! Effects that ask a player to decide something

use crate::core::{Effect, EffectContext, EffectRef};
use crate::game::{GameState, Interaction};
use crate::Result;
use std::sync::Arc;

/// "As this enters, choose a color." Belongs in the `AsEntersBattlefield` slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChooseColor;

impl Effect for ChooseColor {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        let Some(permanent) = ctx.source_permanent else {
            return Ok(());
        };
        game.begin_interaction(Interaction::ColorChoice {
            player: ctx.controller,
            permanent,
        })
    }
}

/// "You may ..." - the wrapped effects run only if the controller accepts
#[derive(Debug, Clone)]
pub struct MayAbility {
    pub description: String,
    pub effects: Vec<EffectRef>,
}

impl MayAbility {
    pub fn new(description: impl Into<String>, effect: impl Effect + 'static) -> Self {
        MayAbility {
            description: description.into(),
            effects: vec![Arc::new(effect)],
        }
    }

    pub fn and_then(mut self, effect: impl Effect + 'static) -> Self {
        self.effects.push(Arc::new(effect));
        self
    }
}

impl Effect for MayAbility {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        game.begin_interaction(Interaction::MayAbilityChoice {
            player: ctx.controller,
            description: self.description.clone(),
            effects: self.effects.clone(),
            ctx: ctx.clone(),
        })
    }
}
