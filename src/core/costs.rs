//! Cost system for activated abilities
//!
//! Represents what a player pays to activate an ability: tapping, mana,
//! sacrificing the source, or sacrificing another creature.

use crate::core::effects::EffectRef;
use crate::core::{Effect, ManaCost};
use crate::game::TargetFilter;
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A cost that must be paid to activate an ability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cost {
    /// Tap the permanent ({T})
    Tap,

    /// Pay mana, possibly including {X}
    Mana(ManaCost),

    /// Sacrifice the permanent itself (Sac<Self>)
    SacrificeSelf,

    /// Sacrifice a creature you control, chosen through the ability's target slot (Sac<Creature>)
    SacrificeCreature,

    /// Several costs paid together
    Composite(Vec<Cost>),
}

impl Cost {
    /// Parse a cost string such as `"{T}"`, `"{2}{W}, {T}"` or `"{1}, Sac<Creature>"`
    pub fn parse(cost_str: &str) -> Result<Self> {
        let mut costs = Vec::new();

        for part in cost_str.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part {
                "Sac<Self>" | "Sac<CARDNAME>" => costs.push(Cost::SacrificeSelf),
                "Sac<Creature>" => costs.push(Cost::SacrificeCreature),
                _ if part.starts_with("Sac<") => {
                    return Err(MtgError::ParseError(format!(
                        "Unsupported sacrifice cost: {part}"
                    )))
                }
                _ => {
                    // "{2}{T}" mixes mana and tap in one component
                    let without_tap = part.replace("{T}", "");
                    if without_tap.len() != part.len() {
                        costs.push(Cost::Tap);
                    }
                    if !without_tap.trim().is_empty() {
                        costs.push(Cost::Mana(ManaCost::parse(&without_tap)?));
                    }
                }
            }
        }

        Ok(match costs.len() {
            0 => Cost::Composite(Vec::new()),
            1 => costs.remove(0),
            _ => Cost::Composite(costs),
        })
    }

    /// Flattened view of the individual costs
    pub fn components(&self) -> Vec<&Cost> {
        match self {
            Cost::Composite(costs) => costs.iter().flat_map(|c| c.components()).collect(),
            other => vec![other],
        }
    }

    pub fn mana(&self) -> Option<ManaCost> {
        self.components().into_iter().find_map(|c| match c {
            Cost::Mana(cost) => Some(*cost),
            _ => None,
        })
    }

    pub fn requires_tap(&self) -> bool {
        self.components().into_iter().any(|c| matches!(c, Cost::Tap))
    }

    pub fn sacrifices_self(&self) -> bool {
        self.components()
            .into_iter()
            .any(|c| matches!(c, Cost::SacrificeSelf))
    }

    pub fn sacrifices_creature(&self) -> bool {
        self.components()
            .into_iter()
            .any(|c| matches!(c, Cost::SacrificeCreature))
    }
}

/// When an activated ability may be activated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivationTiming {
    /// Any time the player has priority
    #[default]
    Instant,
    /// Own main phase with an empty stack
    SorcerySpeed,
    OnlyDuringYourUpkeep,
}

/// An "[Cost]: [Effect]" ability printed on a permanent
#[derive(Debug, Clone)]
pub struct ActivatedAbility {
    pub cost: Cost,
    pub effects: Vec<EffectRef>,
    pub needs_target: bool,
    pub target_filter: Option<TargetFilter>,
    pub timing: ActivationTiming,
}

impl ActivatedAbility {
    pub fn new(cost: &str) -> Result<Self> {
        Ok(ActivatedAbility {
            cost: Cost::parse(cost)?,
            effects: Vec::new(),
            needs_target: false,
            target_filter: None,
            timing: ActivationTiming::default(),
        })
    }

    pub fn with_effect(mut self, effect: impl Effect + 'static) -> Self {
        self.effects.push(Arc::new(effect));
        self
    }

    pub fn targeting(mut self, filter: TargetFilter) -> Self {
        self.needs_target = true;
        self.target_filter = Some(filter);
        self
    }

    pub fn with_timing(mut self, timing: ActivationTiming) -> Self {
        self.timing = timing;
        self
    }

    /// A mana ability doesn't target and only produces mana
    pub fn is_mana_ability(&self) -> bool {
        !self.needs_target
            && !self.cost.sacrifices_creature()
            && !self.effects.is_empty()
            && self.effects.iter().all(|e| e.produces_mana())
    }
}
