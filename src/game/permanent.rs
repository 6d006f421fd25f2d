//! Permanents: cards in play

use crate::core::{CardId, Color, EntityId, Keyword, PlayerId, Target};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub type PermanentId = EntityId<Permanent>;

/// A card on the battlefield together with its play state
///
/// Every time a card enters the battlefield it becomes a new permanent with a
/// fresh id, so stale references from before a zone change never match.
/// Effective power, toughness and keywords are not stored here; see
/// [`GameState::effective_power`](crate::game::GameState::effective_power).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permanent {
    pub id: PermanentId,
    pub card: CardId,
    pub owner: PlayerId,
    pub controller: PlayerId,

    pub tapped: bool,
    pub summoning_sick: bool,

    pub attacking: bool,
    pub blocking: bool,
    /// Attackers this creature blocks (more than one only with extra-block grants)
    pub blocking_targets: SmallVec<[PermanentId; 1]>,

    pub damage_marked: u32,

    // Until end of turn
    pub power_modifier: i32,
    pub toughness_modifier: i32,
    pub granted_keywords: SmallVec<[Keyword; 2]>,
    pub damage_prevention_shield: u32,
    pub regeneration_shield: u32,
    pub cant_be_blocked: bool,
    pub cant_block_this_turn: bool,

    /// What this aura or equipment is attached to; a reference only
    pub attached_to: Option<Target>,

    pub chosen_color: Option<Color>,
    pub chosen_name: Option<String>,
}

impl Permanent {
    pub fn new(id: PermanentId, card: CardId, controller: PlayerId) -> Self {
        Permanent {
            id,
            card,
            owner: controller,
            controller,
            tapped: false,
            summoning_sick: false,
            attacking: false,
            blocking: false,
            blocking_targets: SmallVec::new(),
            damage_marked: 0,
            power_modifier: 0,
            toughness_modifier: 0,
            granted_keywords: SmallVec::new(),
            damage_prevention_shield: 0,
            regeneration_shield: 0,
            cant_be_blocked: false,
            cant_block_this_turn: false,
            attached_to: None,
            chosen_color: None,
            chosen_name: None,
        }
    }

    pub fn with_owner(mut self, owner: PlayerId) -> Self {
        self.owner = owner;
        self
    }

    pub fn tap(&mut self) {
        self.tapped = true;
    }

    pub fn untap(&mut self) {
        self.tapped = false;
    }

    pub fn is_attached_to(&self, id: PermanentId) -> bool {
        self.attached_to == Some(Target::Permanent(id))
    }

    /// Drop out of combat without leaving the battlefield
    pub fn remove_from_combat(&mut self) {
        self.attacking = false;
        self.blocking = false;
        self.blocking_targets.clear();
    }

    /// Mark damage, consuming the prevention shield first. Returns the damage actually marked.
    pub fn deal_damage(&mut self, amount: u32) -> u32 {
        let prevented = amount.min(self.damage_prevention_shield);
        self.damage_prevention_shield -= prevented;
        let dealt = amount - prevented;
        self.damage_marked += dealt;
        dealt
    }

    /// Use a regeneration shield if one is up: tap, leave combat, remove damage
    pub fn try_regenerate(&mut self) -> bool {
        if self.regeneration_shield == 0 {
            return false;
        }
        self.regeneration_shield -= 1;
        self.tapped = true;
        self.remove_from_combat();
        self.damage_marked = 0;
        true
    }

    /// Clear everything that lasts "until end of turn"
    pub fn reset_end_of_turn(&mut self) {
        self.power_modifier = 0;
        self.toughness_modifier = 0;
        self.granted_keywords.clear();
        self.damage_prevention_shield = 0;
        self.regeneration_shield = 0;
        self.cant_be_blocked = false;
        self.cant_block_this_turn = false;
        self.damage_marked = 0;
    }
}
