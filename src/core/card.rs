//! Card types and definitions

use crate::core::effects::{EffectRef, EffectSlot, EffectSlots, Keyword};
use crate::core::{
    ActivatedAbility, CardId, CardName, Color, Effect, GameEntity, ManaCost, PlayerId, Subtype,
};
use crate::game::TargetFilter;
use crate::Result;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

/// Card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Creature,
    Instant,
    Sorcery,
    Enchantment,
    Artifact,
    Land,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Supertype {
    Basic,
    /// Only one permanent with this name per controller
    Legendary,
}

/// Represents a card in the game
///
/// A card is the catalog-facing object: printed characteristics plus the
/// effects and activated abilities attached to it. Play state (tapped,
/// damage, combat flags) lives on the [`Permanent`](crate::game::Permanent)
/// that wraps the card while it is on the battlefield.
#[derive(Debug, Clone)]
pub struct Card {
    /// Unique ID for this card instance
    pub id: CardId,

    pub name: CardName,

    pub mana_cost: ManaCost,

    /// Card types (a card can be multiple types)
    pub types: SmallVec<[CardType; 2]>,

    pub supertypes: SmallVec<[Supertype; 1]>,

    pub subtypes: SmallVec<[Subtype; 2]>,

    pub colors: SmallVec<[Color; 2]>,

    /// Printed power (creatures only)
    pub power: Option<i32>,

    /// Printed toughness (creatures only)
    pub toughness: Option<i32>,

    pub keywords: SmallVec<[Keyword; 4]>,

    /// Player who owns the card; dead or discarded cards return to this player's zones
    pub owner: PlayerId,

    pub effects: EffectSlots,

    pub activated_abilities: Vec<ActivatedAbility>,

    /// Spell or aura that requires a target when cast
    pub needs_target: bool,

    pub target_filter: Option<TargetFilter>,
}

impl Card {
    pub fn new(id: CardId, name: impl Into<CardName>, owner: PlayerId) -> Self {
        Card {
            id,
            name: name.into(),
            mana_cost: ManaCost::new(),
            types: SmallVec::new(),
            supertypes: SmallVec::new(),
            subtypes: SmallVec::new(),
            colors: SmallVec::new(),
            power: None,
            toughness: None,
            keywords: SmallVec::new(),
            owner,
            effects: EffectSlots::new(),
            activated_abilities: Vec::new(),
            needs_target: false,
            target_filter: None,
        }
    }

    /// Set the mana cost from `{N}{COLOR}` notation. Colors follow from the cost.
    pub fn with_cost(mut self, cost: &str) -> Result<Self> {
        self.mana_cost = ManaCost::parse(cost)?;
        for color in Color::ALL {
            if color != Color::Colorless
                && self.mana_cost.colored(color) > 0
                && !self.colors.contains(&color)
            {
                self.colors.push(color);
            }
        }
        Ok(self)
    }

    /// Make this card a creature with the given base stats
    pub fn creature(mut self, power: i32, toughness: i32) -> Self {
        if !self.is_creature() {
            self.types.push(CardType::Creature);
        }
        self.power = Some(power);
        self.toughness = Some(toughness);
        self
    }

    pub fn with_type(mut self, card_type: CardType) -> Self {
        if !self.is_type(card_type) {
            self.types.push(card_type);
        }
        self
    }

    pub fn with_supertype(mut self, supertype: Supertype) -> Self {
        if !self.supertypes.contains(&supertype) {
            self.supertypes.push(supertype);
        }
        self
    }

    pub fn with_subtype(mut self, subtype: impl Into<Subtype>) -> Self {
        self.subtypes.push(subtype.into());
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        if !self.colors.contains(&color) {
            self.colors.push(color);
        }
        self
    }

    pub fn with_keyword(mut self, keyword: Keyword) -> Self {
        self.keywords.push(keyword);
        self
    }

    pub fn with_effect(mut self, slot: EffectSlot, effect: impl Effect + 'static) -> Self {
        self.effects.add(slot, Arc::new(effect));
        self
    }

    pub fn with_ability(mut self, ability: ActivatedAbility) -> Self {
        self.activated_abilities.push(ability);
        self
    }

    /// The spell needs a target matching `filter` when cast
    pub fn targeting(mut self, filter: TargetFilter) -> Self {
        self.needs_target = true;
        self.target_filter = Some(filter);
        self
    }

    pub fn is_type(&self, card_type: CardType) -> bool {
        self.types.contains(&card_type)
    }

    pub fn is_creature(&self) -> bool {
        self.is_type(CardType::Creature)
    }

    pub fn is_land(&self) -> bool {
        self.is_type(CardType::Land)
    }

    pub fn is_aura(&self) -> bool {
        self.is_type(CardType::Enchantment) && self.subtypes.contains(&Subtype::aura())
    }

    pub fn is_equipment(&self) -> bool {
        self.is_type(CardType::Artifact) && self.subtypes.contains(&Subtype::equipment())
    }

    pub fn is_legendary(&self) -> bool {
        self.supertypes.contains(&Supertype::Legendary)
    }

    pub fn has_color(&self, color: Color) -> bool {
        self.colors.contains(&color)
    }

    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.keywords.contains(&keyword)
    }

    /// Effects registered for `slot`, cloned so they can run against a mutable game
    pub fn effects_for(&self, slot: EffectSlot) -> Vec<EffectRef> {
        self.effects.get(slot).to_vec()
    }

    /// Instants may be cast whenever the caster holds priority
    pub fn has_instant_timing(&self) -> bool {
        self.is_type(CardType::Instant)
    }
}

impl GameEntity<Card> for Card {
    fn id(&self) -> CardId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}
