//! Until-end-of-turn boosts and evasion

use crate::core::{Effect, EffectContext, Keyword};
use crate::game::logger::category;
use crate::game::{GameState, PermanentId};
use crate::Result;

fn boost(game: &mut GameState, id: PermanentId, power: i32, toughness: i32) {
    let name = game.permanent_name(id);
    let Some(permanent) = game.find_permanent_mut(id) else {
        return;
    };
    permanent.power_modifier += power;
    permanent.toughness_modifier += toughness;
    game.logger.event(
        category::STACK,
        format!("{name} gets {power:+}/{toughness:+} until end of turn."),
    );
}

/// Target creature gets +P/+T until end of turn
#[derive(Debug, Clone, Copy)]
pub struct BoostTarget {
    pub power: i32,
    pub toughness: i32,
}

impl BoostTarget {
    pub fn new(power: i32, toughness: i32) -> Self {
        BoostTarget { power, toughness }
    }
}

impl Effect for BoostTarget {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        if let Some(id) = ctx.target.and_then(|t| t.as_permanent()) {
            boost(game, id, self.power, self.toughness);
        }
        Ok(())
    }
}

/// The source permanent gets +P/+T until end of turn
#[derive(Debug, Clone, Copy)]
pub struct BoostSelf {
    pub power: i32,
    pub toughness: i32,
}

impl BoostSelf {
    pub fn new(power: i32, toughness: i32) -> Self {
        BoostSelf { power, toughness }
    }
}

impl Effect for BoostSelf {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        if let Some(id) = ctx.source_permanent {
            boost(game, id, self.power, self.toughness);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GrantKeywordToTarget {
    pub keyword: Keyword,
}

impl GrantKeywordToTarget {
    pub fn new(keyword: Keyword) -> Self {
        GrantKeywordToTarget { keyword }
    }
}

impl Effect for GrantKeywordToTarget {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        let Some(id) = ctx.target.and_then(|t| t.as_permanent()) else {
            return Ok(());
        };
        let name = game.permanent_name(id);
        if let Some(permanent) = game.find_permanent_mut(id) {
            if !permanent.granted_keywords.contains(&self.keyword) {
                permanent.granted_keywords.push(self.keyword);
            }
            game.logger.event(
                category::STACK,
                format!("{name} gains {} until end of turn.", self.keyword),
            );
        }
        Ok(())
    }
}

/// Target creature can't be blocked this turn
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeTargetUnblockable;

impl Effect for MakeTargetUnblockable {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        let Some(id) = ctx.target.and_then(|t| t.as_permanent()) else {
            return Ok(());
        };
        let name = game.permanent_name(id);
        if let Some(permanent) = game.find_permanent_mut(id) {
            permanent.cant_be_blocked = true;
            game.logger
                .event(category::STACK, format!("{name} can't be blocked this turn."));
        }
        Ok(())
    }
}
