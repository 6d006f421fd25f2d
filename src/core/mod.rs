//! Core game types and entities

pub mod card;
pub mod costs;
pub mod effects;
pub mod entity;
pub mod mana;
pub mod player;
pub mod types;

pub use card::{Card, CardType, Supertype};
pub use costs::{ActivatedAbility, ActivationTiming, Cost};
pub use effects::{
    Effect, EffectContext, EffectRef, EffectSlot, EffectSlots, Keyword, StaticAbility, Target,
};
pub use entity::{EntityId, EntityStore, GameEntity};
pub use mana::{Color, ManaCost, ManaPool, ManaShortfall};
pub use player::Player;
pub use types::{CardName, PlayerName, Subtype};

pub type PlayerId = EntityId<Player>;
pub type CardId = EntityId<Card>;
