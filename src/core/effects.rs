//! The effect contract and the data it operates on
//!
//! The engine never knows what a concrete effect does. Cards carry ordered
//! lists of [`Effect`] trait objects keyed by [`EffectSlot`]; the resolution
//! dispatcher calls [`Effect::apply`] on each one in turn. Static abilities are
//! plain data ([`StaticAbility`]) that the characteristic and legality queries
//! read back through [`Effect::as_static`].

use crate::core::{CardId, Color, PlayerId};
use crate::game::{GameState, PermanentId};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// What a spell or ability points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    Player(PlayerId),
    Permanent(PermanentId),
    /// A spell on the stack, addressed by its card
    Spell(CardId),
}

impl Target {
    pub fn as_permanent(&self) -> Option<PermanentId> {
        match self {
            Target::Permanent(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_player(&self) -> Option<PlayerId> {
        match self {
            Target::Player(id) => Some(*id),
            _ => None,
        }
    }
}

/// Keyword abilities the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Flying,
    Reach,
    FirstStrike,
    DoubleStrike,
    Trample,
    Lifelink,
    Vigilance,
    Haste,
    Defender,
    Menace,
    Shroud,
    Indestructible,
    ProtectionFrom(Color),
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keyword::Flying => write!(f, "flying"),
            Keyword::Reach => write!(f, "reach"),
            Keyword::FirstStrike => write!(f, "first strike"),
            Keyword::DoubleStrike => write!(f, "double strike"),
            Keyword::Trample => write!(f, "trample"),
            Keyword::Lifelink => write!(f, "lifelink"),
            Keyword::Vigilance => write!(f, "vigilance"),
            Keyword::Haste => write!(f, "haste"),
            Keyword::Defender => write!(f, "defender"),
            Keyword::Menace => write!(f, "menace"),
            Keyword::Shroud => write!(f, "shroud"),
            Keyword::Indestructible => write!(f, "indestructible"),
            Keyword::ProtectionFrom(color) => write!(f, "protection from {}", color.name()),
        }
    }
}

/// When a card's effects run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectSlot {
    /// Instant/sorcery effects, run on resolution
    Spell,
    /// Continuous abilities, never applied directly
    Static,
    /// Applied as the permanent enters, without using the stack
    AsEntersBattlefield,
    OnEnterBattlefield,
    OnDeath,
    /// Mana produced by tapping the permanent
    OnTap,
    UpkeepTriggered,
    OpponentUpkeepTriggered,
    EachDrawTriggered,
    OnCombatDamageToPlayer,
    OnCombatDamageToCreature,
}

/// Everything an effect may need to know about the entry being resolved
#[derive(Debug, Clone)]
pub struct EffectContext {
    pub source_card: CardId,
    /// Permanent that produced the ability, which may have left the battlefield since
    pub source_permanent: Option<PermanentId>,
    pub controller: PlayerId,
    pub target: Option<Target>,
    pub x_value: u32,
    /// Human-readable name of the source, for log lines
    pub source_name: String,
}

/// A unit of card behavior
///
/// `apply` mutates the game and writes its own log lines. Effects that need a
/// player decision open an interaction through
/// [`GameState::begin_interaction`]; the dispatcher holds the remaining
/// effects of the entry until the decision arrives.
pub trait Effect: fmt::Debug + Send + Sync {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()>;

    /// Continuous abilities expose their data here
    fn as_static(&self) -> Option<&StaticAbility> {
        None
    }

    /// Mana abilities resolve immediately instead of using the stack
    fn produces_mana(&self) -> bool {
        false
    }

    /// The resolving card goes to its owner's library instead of the graveyard
    fn shuffles_source_into_library(&self) -> bool {
        false
    }
}

pub type EffectRef = Arc<dyn Effect>;

/// Continuous abilities, read by the characteristic, legality and combat queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaticAbility {
    // The permanent that has the ability
    MustAttack,
    CantBlock,
    CantBeBlocked,

    // The permanent this aura or equipment is attached to
    BoostAttached { power: i32, toughness: i32 },
    GrantKeywordToAttached(Keyword),
    AttachedCantAttackOrBlock,
    AttachedMustAttack,
    AttachedMustBeBlockedByAll,

    // The controller's creatures
    BoostOwnCreatures { power: i32, toughness: i32 },
    AdditionalBlocksForOwnCreatures(u32),

    // Every creature of the color chosen as this permanent entered
    BoostCreaturesOfChosenColor { power: i32, toughness: i32 },

    // The controller
    /// Creatures attacking this permanent's controller cost this much generic mana each
    AttackTax { per_creature: u32 },
    /// All damage dealt to this aura's controller is dealt to the enchanted creature instead
    RedirectDamageToAttached,
}

impl Effect for StaticAbility {
    fn apply(&self, _game: &mut GameState, _ctx: &EffectContext) -> Result<()> {
        Ok(())
    }

    fn as_static(&self) -> Option<&StaticAbility> {
        Some(self)
    }
}

/// A card's effects, grouped by slot in a deterministic order
#[derive(Debug, Clone, Default)]
pub struct EffectSlots {
    slots: BTreeMap<EffectSlot, Vec<EffectRef>>,
}

impl EffectSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, slot: EffectSlot, effect: EffectRef) {
        self.slots.entry(slot).or_default().push(effect);
    }

    pub fn get(&self, slot: EffectSlot) -> &[EffectRef] {
        self.slots.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, slot: EffectSlot) -> bool {
        !self.get(slot).is_empty()
    }

    /// Static abilities declared in the `Static` slot
    pub fn statics(&self) -> impl Iterator<Item = &StaticAbility> {
        self.get(EffectSlot::Static)
            .iter()
            .filter_map(|effect| effect.as_static())
    }
}
