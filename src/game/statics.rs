//! Effective characteristics
//!
//! Power, toughness and keywords are recomputed from the board on every query
//! so that auras, anthems and color-choice boosts apply and stop applying as
//! permanents come and go.

use crate::core::{Color, Keyword, PlayerId, StaticAbility};
use crate::game::{GameState, Permanent, PermanentId};
use smallvec::SmallVec;

impl GameState {
    /// Static abilities printed on a permanent's card
    pub fn statics_of(&self, permanent: &Permanent) -> Vec<StaticAbility> {
        self.permanent_card(permanent)
            .map(|card| card.effects.statics().cloned().collect())
            .unwrap_or_default()
    }

    /// Static abilities of auras and equipment attached to `permanent`
    pub fn attached_statics(&self, permanent: &Permanent) -> Vec<StaticAbility> {
        self.all_permanents()
            .filter(|other| other.is_attached_to(permanent.id))
            .flat_map(|other| self.statics_of(other))
            .collect()
    }

    /// Static abilities of every permanent `controller` controls
    fn controlled_statics(&self, controller: PlayerId) -> Vec<StaticAbility> {
        self.battlefield(controller)
            .iter()
            .flat_map(|p| self.statics_of(p))
            .collect()
    }

    pub fn is_creature(&self, permanent: &Permanent) -> bool {
        self.permanent_card(permanent)
            .map(|card| card.is_creature())
            .unwrap_or(false)
    }

    pub fn permanent_colors(&self, permanent: &Permanent) -> SmallVec<[Color; 2]> {
        self.permanent_card(permanent)
            .map(|card| card.colors.clone())
            .unwrap_or_default()
    }

    /// Boost from every continuous effect, excluding base stats and modifiers
    fn static_boost(&self, permanent: &Permanent) -> (i32, i32) {
        let mut power = 0;
        let mut toughness = 0;

        for ability in self.attached_statics(permanent) {
            if let StaticAbility::BoostAttached {
                power: p,
                toughness: t,
            } = ability
            {
                power += p;
                toughness += t;
            }
        }

        for ability in self.controlled_statics(permanent.controller) {
            if let StaticAbility::BoostOwnCreatures {
                power: p,
                toughness: t,
            } = ability
            {
                power += p;
                toughness += t;
            }
        }

        let colors = self.permanent_colors(permanent);
        for source in self.all_permanents() {
            let Some(chosen) = source.chosen_color else {
                continue;
            };
            if !colors.contains(&chosen) {
                continue;
            }
            for ability in self.statics_of(source) {
                if let StaticAbility::BoostCreaturesOfChosenColor {
                    power: p,
                    toughness: t,
                } = ability
                {
                    power += p;
                    toughness += t;
                }
            }
        }

        (power, toughness)
    }

    pub fn effective_power(&self, permanent: &Permanent) -> i32 {
        let base = self
            .permanent_card(permanent)
            .ok()
            .and_then(|card| card.power)
            .unwrap_or(0);
        base + permanent.power_modifier + self.static_boost(permanent).0
    }

    pub fn effective_toughness(&self, permanent: &Permanent) -> i32 {
        let base = self
            .permanent_card(permanent)
            .ok()
            .and_then(|card| card.toughness)
            .unwrap_or(0);
        base + permanent.toughness_modifier + self.static_boost(permanent).1
    }

    /// Printed, granted-this-turn and aura-granted keywords
    pub fn effective_keywords(&self, permanent: &Permanent) -> SmallVec<[Keyword; 8]> {
        let mut keywords: SmallVec<[Keyword; 8]> = SmallVec::new();
        let mut push = |kw: Keyword| {
            if !keywords.contains(&kw) {
                keywords.push(kw);
            }
        };

        if let Ok(card) = self.permanent_card(permanent) {
            card.keywords.iter().copied().for_each(&mut push);
        }
        permanent.granted_keywords.iter().copied().for_each(&mut push);
        for ability in self.attached_statics(permanent) {
            if let StaticAbility::GrantKeywordToAttached(kw) = ability {
                push(kw);
            }
        }
        keywords
    }

    pub fn has_keyword(&self, permanent: &Permanent, keyword: Keyword) -> bool {
        self.effective_keywords(permanent).contains(&keyword)
    }

    /// Colors this permanent has protection from
    pub fn protection_colors(&self, permanent: &Permanent) -> SmallVec<[Color; 2]> {
        self.effective_keywords(permanent)
            .into_iter()
            .filter_map(|kw| match kw {
                Keyword::ProtectionFrom(color) => Some(color),
                _ => None,
            })
            .collect()
    }

    /// First color of `colors` the permanent is protected from
    pub fn protected_from_any(&self, permanent: &Permanent, colors: &[Color]) -> Option<Color> {
        let protection = self.protection_colors(permanent);
        colors.iter().copied().find(|c| protection.contains(c))
    }

    pub fn has_static(&self, permanent: &Permanent, ability: &StaticAbility) -> bool {
        self.statics_of(permanent).contains(ability)
    }

    fn has_attached_static(&self, permanent: &Permanent, ability: &StaticAbility) -> bool {
        self.attached_statics(permanent).contains(ability)
    }

    pub fn must_attack(&self, permanent: &Permanent) -> bool {
        self.has_static(permanent, &StaticAbility::MustAttack)
            || self.has_attached_static(permanent, &StaticAbility::AttachedMustAttack)
    }

    /// Enchanted with "enchanted creature can't attack or block"
    pub fn is_pacified(&self, permanent: &Permanent) -> bool {
        self.has_attached_static(permanent, &StaticAbility::AttachedCantAttackOrBlock)
    }

    pub fn cant_be_blocked(&self, permanent: &Permanent) -> bool {
        permanent.cant_be_blocked || self.has_static(permanent, &StaticAbility::CantBeBlocked)
    }

    pub fn must_be_blocked_by_all(&self, permanent: &Permanent) -> bool {
        self.has_attached_static(permanent, &StaticAbility::AttachedMustBeBlockedByAll)
    }

    /// How many attackers this creature may block
    pub fn max_blocks(&self, permanent: &Permanent) -> usize {
        let extra: u32 = self
            .controlled_statics(permanent.controller)
            .into_iter()
            .map(|ability| match ability {
                StaticAbility::AdditionalBlocksForOwnCreatures(n) => n,
                _ => 0,
            })
            .sum();
        1 + extra as usize
    }

    /// Generic mana per attacking creature demanded by `defender`'s permanents
    pub fn attack_tax_per_creature(&self, defender: PlayerId) -> u32 {
        self.controlled_statics(defender)
            .into_iter()
            .map(|ability| match ability {
                StaticAbility::AttackTax { per_creature } => per_creature,
                _ => 0,
            })
            .sum()
    }

    /// Creature that takes the damage `player` would be dealt, via a redirecting aura they control
    pub fn damage_redirect_aura_target(&self, player: PlayerId) -> Option<PermanentId> {
        self.battlefield(player).iter().find_map(|aura| {
            if !self.has_static(aura, &StaticAbility::RedirectDamageToAttached) {
                return None;
            }
            aura.attached_to
                .and_then(|target| target.as_permanent())
                .filter(|id| self.find_permanent(*id).is_some())
        })
    }
}
