//! Combat: declaring attackers and blockers, and combat damage
//!
//! Attacking and blocking state lives on the permanents themselves; there is
//! no separate combat index to fall out of sync. Declarations arrive by
//! battlefield index while an [`Interaction::AttackerDeclaration`] or
//! [`Interaction::BlockerDeclaration`] is open.
//!
//! Damage is dealt in up to two passes. When any combatant has first strike
//! or double strike, the first pass includes only those creatures; creatures
//! destroyed there deal no damage in the regular pass.

use crate::core::{Color, EffectSlot, Keyword, PlayerId, StaticAbility, Target};
use crate::error::IllegalAction;
use crate::game::logger::category;
use crate::game::{GameState, Interaction, Permanent, PermanentId, StackEntry, StackEntryType, Step};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One blocker blocking one attacker, both by battlefield index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockerAssignment {
    pub blocker_index: usize,
    pub attacker_index: usize,
}

impl BlockerAssignment {
    pub fn new(blocker_index: usize, attacker_index: usize) -> Self {
        BlockerAssignment {
            blocker_index,
            attacker_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DamagePass {
    FirstStrike,
    Regular,
}

/// Damage assigned during the combat damage step
#[derive(Debug, Default)]
struct CombatDamage {
    /// Damage about to be marked on creatures in the current pass
    to_creatures: BTreeMap<PermanentId, u32>,
    to_player: u32,
    to_redirect: u32,
    /// Total dealt by each source over the whole step, for lifelink
    dealt_by: BTreeMap<PermanentId, u32>,
    dealt_to_player_by: BTreeMap<PermanentId, u32>,
    /// (source, damaged creature) pairs, for damage triggers
    creature_hits: Vec<(PermanentId, PermanentId)>,
    dead: BTreeSet<PermanentId>,
}

impl GameState {
    // ---------------------------------------------------------------------
    // Eligibility

    /// Can this permanent be declared as an attacker right now?
    pub fn can_attack(&self, permanent: &Permanent) -> bool {
        self.is_creature(permanent)
            && !permanent.tapped
            && (!permanent.summoning_sick || self.has_keyword(permanent, Keyword::Haste))
            && !self.has_keyword(permanent, Keyword::Defender)
            && !self.is_pacified(permanent)
    }

    /// Battlefield indices of `player`'s creatures that could attack
    pub fn attack_candidates(&self, player: PlayerId) -> Vec<usize> {
        self.battlefield(player)
            .iter()
            .enumerate()
            .filter(|(_, p)| self.can_attack(p))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// An untapped creature with nothing permanently stopping it from blocking
    fn is_blocker_candidate(&self, permanent: &Permanent) -> bool {
        self.is_creature(permanent)
            && !permanent.tapped
            && !self.is_pacified(permanent)
            && !self.has_static(permanent, &StaticAbility::CantBlock)
    }

    /// Can this creature block at all this combat?
    pub fn can_block(&self, permanent: &Permanent) -> bool {
        self.is_blocker_candidate(permanent) && !permanent.cant_block_this_turn
    }

    /// Can `blocker` block `attacker`, given evasion and protection?
    pub fn check_block(
        &self,
        blocker: &Permanent,
        attacker: &Permanent,
    ) -> std::result::Result<(), IllegalAction> {
        let blocker_name = self.card_name(blocker.card);
        let attacker_name = self.card_name(attacker.card);
        if blocker.cant_block_this_turn {
            return Err(IllegalAction::CantBlockThisTurn(blocker_name));
        }
        if self.cant_be_blocked(attacker) {
            return Err(IllegalAction::CantBeBlocked(attacker_name));
        }
        if self.has_keyword(attacker, Keyword::Flying)
            && !self.has_keyword(blocker, Keyword::Flying)
            && !self.has_keyword(blocker, Keyword::Reach)
        {
            return Err(IllegalAction::CantBlock {
                blocker: blocker_name,
                attacker: attacker_name,
                reason: "flying".into(),
            });
        }
        if self
            .protected_from_any(attacker, &self.permanent_colors(blocker))
            .is_some()
        {
            return Err(IllegalAction::CantBlock {
                blocker: blocker_name,
                attacker: attacker_name,
                reason: "protection".into(),
            });
        }
        Ok(())
    }

    /// The creatures currently attacking
    pub fn attacking_creatures(&self) -> Vec<PermanentId> {
        self.attackers_of(self.turn.active_player)
    }

    fn attackers_of(&self, player: PlayerId) -> Vec<PermanentId> {
        self.battlefield(player)
            .iter()
            .filter(|p| p.attacking)
            .map(|p| p.id)
            .collect()
    }

    /// Blockers of an attacker, in the defending player's battlefield order
    pub fn blockers_of(&self, attacker: PermanentId) -> Vec<PermanentId> {
        self.all_permanents()
            .filter(|p| p.blocking && p.blocking_targets.contains(&attacker))
            .map(|p| p.id)
            .collect()
    }

    // ---------------------------------------------------------------------
    // Declarations

    /// Entering the declare attackers step. Without possible attackers combat is skipped.
    pub(crate) fn begin_declare_attackers(&mut self) -> Result<()> {
        let active = self.turn.active_player;
        if self.attack_candidates(active).is_empty() {
            self.logger.log(
                crate::game::VerbosityLevel::Verbose,
                Some(category::COMBAT),
                format!(
                    "{} has no creatures that can attack.",
                    self.player_name(active)
                ),
            );
            return self.enter_step(Step::EndCombat);
        }
        self.begin_interaction(Interaction::AttackerDeclaration { player: active })
    }

    fn ensure_awaiting_declaration(&self, player: PlayerId, attackers: bool) -> Result<()> {
        self.ensure_running()?;
        let what = if attackers {
            "attacker declaration"
        } else {
            "blocker declaration"
        };
        match &self.interaction {
            Some(Interaction::AttackerDeclaration { player: p }) if attackers => {
                if *p != player {
                    return Err(IllegalAction::NotYourChoice.into());
                }
                Ok(())
            }
            Some(Interaction::BlockerDeclaration { player: p }) if !attackers => {
                if *p != player {
                    return Err(IllegalAction::NotYourChoice.into());
                }
                Ok(())
            }
            Some(other) => Err(IllegalAction::AwaitingInput(other.describe()).into()),
            None => Err(IllegalAction::NotAwaiting(what.into()).into()),
        }
    }

    /// Declare attackers by battlefield index
    ///
    /// Every index must name an eligible creature. Creatures that must attack
    /// have to be included unless attacking costs mana (an attack tax), and the
    /// tax for every declared attacker is paid from the pool up front.
    pub fn declare_attackers(&mut self, player: PlayerId, indices: &[usize]) -> Result<()> {
        self.ensure_awaiting_declaration(player, true)?;

        let unique: BTreeSet<usize> = indices.iter().copied().collect();
        if unique.len() != indices.len() {
            return Err(IllegalAction::DuplicateAttackers.into());
        }
        let candidates = self.attack_candidates(player);
        if let Some(&bad) = indices.iter().find(|idx| !candidates.contains(idx)) {
            return Err(IllegalAction::InvalidAttackerIndex(bad).into());
        }

        let defender = self.opponent(player)?;
        let tax_per_creature = self.attack_tax_per_creature(defender);
        if tax_per_creature == 0 {
            let battlefield = self.battlefield(player);
            if let Some(&omitted) = candidates
                .iter()
                .find(|idx| !unique.contains(idx) && self.must_attack(&battlefield[**idx]))
            {
                return Err(IllegalAction::MustAttack(omitted).into());
            }
        }
        let tax = tax_per_creature.saturating_mul(indices.len() as u32);
        if tax > 0 && self.get_player(player)?.mana_pool.total() < tax {
            return Err(IllegalAction::AttackTaxUnpaid(tax).into());
        }

        // Validated; commit
        self.interaction = None;
        self.priority_passed_by.clear();

        if indices.is_empty() {
            self.logger.event(
                category::COMBAT,
                format!("{} declares no attackers.", self.player_name(player)),
            );
            return self.enter_step(Step::EndCombat);
        }

        if tax > 0 {
            self.get_player_mut(player)?
                .mana_pool
                .pay_generic(tax)
                .map_err(|_| IllegalAction::AttackTaxUnpaid(tax))?;
            self.logger.event(
                category::COMBAT,
                format!("{} pays {} for the attack tax.", self.player_name(player), tax),
            );
        }

        let ids: Vec<PermanentId> = indices
            .iter()
            .map(|&idx| self.battlefield(player)[idx].id)
            .collect();
        for id in ids {
            let vigilance = self
                .find_permanent(id)
                .map(|p| self.has_keyword(p, Keyword::Vigilance))
                .unwrap_or(false);
            if let Some(p) = self.find_permanent_mut(id) {
                p.attacking = true;
                if !vigilance {
                    p.tap();
                }
            }
        }

        let count = indices.len();
        self.logger.event(
            category::COMBAT,
            format!(
                "{} declares {} attacker{}.",
                self.player_name(player),
                count,
                if count == 1 { "" } else { "s" }
            ),
        );
        Ok(())
    }

    /// Entering the declare blockers step. The defender is only asked when a block is possible.
    pub(crate) fn begin_declare_blockers(&mut self) -> Result<()> {
        let defender = self.non_active_player()?;
        let attackers = self.attackers_of(self.turn.active_player);
        let any_block = self.battlefield(defender).iter().any(|blocker| {
            self.can_block(blocker)
                && attackers.iter().any(|id| {
                    self.find_permanent(*id)
                        .map(|a| self.check_block(blocker, a).is_ok())
                        .unwrap_or(false)
                })
        });
        if !any_block {
            self.logger.log(
                crate::game::VerbosityLevel::Verbose,
                Some(category::COMBAT),
                format!("{} has no creatures that can block.", self.player_name(defender)),
            );
            return Ok(());
        }
        self.begin_interaction(Interaction::BlockerDeclaration { player: defender })
    }

    /// Declare blockers as (blocker index, attacker index) pairs
    pub fn declare_blockers(
        &mut self,
        player: PlayerId,
        assignments: &[BlockerAssignment],
    ) -> Result<()> {
        self.ensure_awaiting_declaration(player, false)?;
        let attacking_player = self.turn.active_player;
        let defenders = self.battlefield(player);
        let attackers = self.battlefield(attacking_player);

        let mut usage: BTreeMap<usize, usize> = BTreeMap::new();
        let mut pairs: BTreeSet<(usize, usize)> = BTreeSet::new();
        let mut blockers_per_attacker: BTreeMap<usize, usize> = BTreeMap::new();

        for assignment in assignments {
            let BlockerAssignment {
                blocker_index,
                attacker_index,
            } = *assignment;
            let blocker = defenders
                .get(blocker_index)
                .filter(|b| self.is_blocker_candidate(b))
                .ok_or(IllegalAction::InvalidBlockerIndex(blocker_index))?;

            let used = usage.entry(blocker_index).or_insert(0);
            *used += 1;
            if *used > self.max_blocks(blocker) {
                return Err(IllegalAction::BlockerAssignedTooManyTimes(blocker_index).into());
            }
            if !pairs.insert((blocker_index, attacker_index)) {
                return Err(IllegalAction::DuplicateBlockPair(blocker_index, attacker_index).into());
            }
            let attacker = attackers
                .get(attacker_index)
                .filter(|a| a.attacking)
                .ok_or(IllegalAction::InvalidAttackerIndex(attacker_index))?;

            self.check_block(blocker, attacker)?;
            *blockers_per_attacker.entry(attacker_index).or_insert(0) += 1;
        }

        for (&attacker_index, &count) in &blockers_per_attacker {
            let attacker = &attackers[attacker_index];
            if count == 1 && self.has_keyword(attacker, Keyword::Menace) {
                return Err(IllegalAction::Menace(self.card_name(attacker.card)).into());
            }
        }

        // A creature able to block "must be blocked by all" attackers has to block
        // as many of them as its block count allows
        let lures: Vec<(usize, &Permanent)> = attackers
            .iter()
            .enumerate()
            .filter(|(_, a)| a.attacking && self.must_be_blocked_by_all(a))
            .collect();
        for (blocker_index, blocker) in defenders.iter().enumerate() {
            if lures.is_empty() || !self.can_block(blocker) {
                continue;
            }
            let blockable: Vec<usize> = lures
                .iter()
                .filter(|(_, a)| self.check_block(blocker, a).is_ok())
                .map(|(idx, _)| *idx)
                .collect();
            if blockable.is_empty() {
                continue;
            }
            let lures_blocked = blockable
                .iter()
                .filter(|idx| pairs.contains(&(blocker_index, **idx)))
                .count();
            if lures_blocked < blockable.len().min(self.max_blocks(blocker)) {
                return Err(IllegalAction::MustBlockEnchanted {
                    blocker: self.card_name(blocker.card),
                }
                .into());
            }
        }

        // Validated; commit
        let resolved: Vec<(PermanentId, PermanentId)> = assignments
            .iter()
            .map(|a| (defenders[a.blocker_index].id, attackers[a.attacker_index].id))
            .collect();
        self.interaction = None;
        self.priority_passed_by.clear();

        for (blocker, attacker) in resolved {
            if let Some(p) = self.find_permanent_mut(blocker) {
                p.blocking = true;
                p.blocking_targets.push(attacker);
            }
        }

        let count = assignments.len();
        if count == 0 {
            self.logger.event(
                category::COMBAT,
                format!("{} declares no blockers.", self.player_name(player)),
            );
        } else {
            self.logger.event(
                category::COMBAT,
                format!(
                    "{} declares {} blocker{}.",
                    self.player_name(player),
                    count,
                    if count == 1 { "" } else { "s" }
                ),
            );
        }
        Ok(())
    }

    /// Remove every creature from combat
    pub fn clear_combat(&mut self) {
        for (_, zones) in &mut self.player_zones {
            for permanent in &mut zones.battlefield {
                permanent.remove_from_combat();
            }
        }
    }

    // ---------------------------------------------------------------------
    // Damage

    fn deals_damage_in(&self, permanent: &Permanent, pass: DamagePass) -> bool {
        let first = self.has_keyword(permanent, Keyword::FirstStrike);
        let double = self.has_keyword(permanent, Keyword::DoubleStrike);
        match pass {
            DamagePass::FirstStrike => first || double,
            DamagePass::Regular => !first || double,
        }
    }

    /// Damage from this source is prevented this turn by its color
    fn damage_prevented_from(&self, source: &Permanent) -> bool {
        self.damage_prevented_from_colors(&self.permanent_colors(source))
    }

    pub fn damage_prevented_from_colors(&self, colors: &[Color]) -> bool {
        colors
            .iter()
            .any(|c| self.turn_effects.prevent_damage_from_colors.contains(c))
    }

    /// Combat damage aimed at the defending player: the redirect creature takes
    /// it first, then per-color prevention may stop it
    fn route_player_damage(
        &mut self,
        damage: &mut CombatDamage,
        source: PermanentId,
        defender: PlayerId,
        redirect: Option<PermanentId>,
        amount: u32,
    ) {
        if amount == 0 {
            return;
        }
        let colors = self
            .find_permanent(source)
            .map(|p| self.permanent_colors(p))
            .unwrap_or_default();
        if redirect.is_some() {
            damage.to_redirect += amount;
        } else if !self.consume_color_prevention(defender, &colors) {
            damage.to_player += amount;
        } else {
            return;
        }
        *damage.dealt_by.entry(source).or_insert(0) += amount;
        *damage.dealt_to_player_by.entry(source).or_insert(0) += amount;
    }

    /// Use up one per-color prevention instance of `player` matching any of `colors`
    pub(crate) fn consume_color_prevention(&mut self, player: PlayerId, colors: &[Color]) -> bool {
        let Some(shields) = self.turn_effects.color_damage_prevention.get_mut(&player) else {
            return false;
        };
        for color in colors {
            if let Some(count) = shields.get_mut(color) {
                if *count > 0 {
                    *count -= 1;
                    return true;
                }
            }
        }
        false
    }

    fn assign_creature_damage(
        &self,
        damage: &mut CombatDamage,
        source: &Permanent,
        victim: &Permanent,
        amount: u32,
    ) {
        if amount == 0
            || self.damage_prevented_by_protection(victim, &self.permanent_colors(source))
        {
            return;
        }
        *damage.to_creatures.entry(victim.id).or_insert(0) += amount;
        *damage.dealt_by.entry(source.id).or_insert(0) += amount;
        damage.creature_hits.push((source.id, victim.id));
    }

    fn run_damage_pass(
        &mut self,
        damage: &mut CombatDamage,
        pass: DamagePass,
        attackers: &[PermanentId],
        blocks: &BTreeMap<PermanentId, Vec<PermanentId>>,
        defender: PlayerId,
        redirect: Option<PermanentId>,
    ) {
        for &attacker_id in attackers {
            if damage.dead.contains(&attacker_id) {
                continue;
            }
            let Some(attacker) = self.find_permanent(attacker_id).cloned() else {
                continue;
            };
            let attacker_deals =
                self.deals_damage_in(&attacker, pass) && !self.damage_prevented_from(&attacker);
            let power = self.effective_power(&attacker).max(0) as u32;
            let blockers = blocks.get(&attacker_id).cloned().unwrap_or_default();

            if blockers.is_empty() {
                if attacker_deals {
                    self.route_player_damage(damage, attacker_id, defender, redirect, power);
                }
                continue;
            }

            let alive: Vec<Permanent> = blockers
                .iter()
                .filter(|id| !damage.dead.contains(id))
                .filter_map(|id| self.find_permanent(*id).cloned())
                .collect();

            if attacker_deals {
                let trample = self.has_keyword(&attacker, Keyword::Trample);
                let mut remaining = power;
                for (i, blocker) in alive.iter().enumerate() {
                    let pending = damage.to_creatures.get(&blocker.id).copied().unwrap_or(0);
                    let lethal = (self.effective_toughness(blocker)
                        - blocker.damage_marked as i32
                        - pending as i32)
                        .max(0) as u32;
                    let is_last = i + 1 == alive.len();
                    let assigned = if is_last && !trample {
                        remaining
                    } else {
                        remaining.min(lethal)
                    };
                    self.assign_creature_damage(damage, &attacker, blocker, assigned);
                    remaining -= assigned;
                }
                if trample && remaining > 0 {
                    self.route_player_damage(damage, attacker_id, defender, redirect, remaining);
                }
            }

            for blocker in &alive {
                if self.deals_damage_in(blocker, pass) && !self.damage_prevented_from(blocker) {
                    let blocker_power = self.effective_power(blocker).max(0) as u32;
                    self.assign_creature_damage(damage, blocker, &attacker, blocker_power);
                }
            }
        }

        // Mark the pass's damage, then find what it killed
        let marked: Vec<(PermanentId, u32)> = std::mem::take(&mut damage.to_creatures)
            .into_iter()
            .collect();
        for (id, amount) in marked {
            let Some(permanent) = self.find_permanent_mut(id) else {
                continue;
            };
            permanent.deal_damage(amount);
            let Some(permanent) = self.find_permanent(id) else {
                continue;
            };
            let lethal = permanent.damage_marked > 0
                && (permanent.damage_marked as i32) >= self.effective_toughness(permanent)
                && !self.has_keyword(permanent, Keyword::Indestructible);
            if lethal && !self.regenerate(id) {
                damage.dead.insert(id);
            }
        }
    }

    /// Deal combat damage for the current combat
    pub(crate) fn resolve_combat_damage(&mut self) -> Result<()> {
        if self.turn_effects.prevent_all_combat_damage {
            self.logger
                .event(category::COMBAT, "All combat damage is prevented.");
            return Ok(());
        }

        let active = self.turn.active_player;
        let defender = self.opponent(active)?;
        let attackers = self.attackers_of(active);
        if attackers.is_empty() {
            return Ok(());
        }
        let blocks: BTreeMap<PermanentId, Vec<PermanentId>> = attackers
            .iter()
            .map(|&id| (id, self.blockers_of(id)))
            .collect();
        let redirect = self
            .turn_effects
            .combat_damage_redirect_target
            .filter(|id| self.find_permanent(*id).is_some());

        let combatants: Vec<PermanentId> = attackers
            .iter()
            .chain(blocks.values().flatten())
            .copied()
            .collect();
        let any_first_strike = combatants.iter().any(|id| {
            self.find_permanent(*id)
                .map(|p| self.deals_damage_in(p, DamagePass::FirstStrike))
                .unwrap_or(false)
        });

        let mut damage = CombatDamage::default();
        if any_first_strike {
            self.run_damage_pass(
                &mut damage,
                DamagePass::FirstStrike,
                &attackers,
                &blocks,
                defender,
                redirect,
            );
        }
        self.run_damage_pass(
            &mut damage,
            DamagePass::Regular,
            &attackers,
            &blocks,
            defender,
            redirect,
        );

        if let Some(guard) = redirect {
            self.damage_redirect_creature(guard, damage.to_redirect, true)?;
        }

        // Lifelink is gained before dead creatures leave the battlefield
        for (&source, &amount) in &damage.dealt_by {
            let Some(permanent) = self.find_permanent(source) else {
                continue;
            };
            if amount == 0 || !self.has_keyword(permanent, Keyword::Lifelink) {
                continue;
            }
            let controller = permanent.controller;
            self.get_player_mut(controller)?.gain_life(amount as i32);
            self.logger.event(
                category::COMBAT,
                format!(
                    "{} gains {} life from lifelink.",
                    self.player_name(controller),
                    amount
                ),
            );
        }

        // Attackers first, then blockers in the order they were dealt with
        let mut dead_order: Vec<PermanentId> = Vec::new();
        for id in attackers.iter().chain(blocks.values().flatten()) {
            if damage.dead.contains(id) && !dead_order.contains(id) {
                dead_order.push(*id);
            }
        }
        let dead_names: Vec<String> = dead_order
            .iter()
            .filter_map(|id| self.find_permanent(*id))
            .map(|p| format!("{}'s {}", self.player_name(p.controller), self.card_name(p.card)))
            .collect();
        for &id in &dead_order {
            self.creature_dies(id)?;
        }

        let to_player = self.prevent_player_damage(defender, damage.to_player)?;
        let to_player = self.redirect_player_damage(defender, to_player, true)?;
        if to_player > 0 {
            self.get_player_mut(defender)?.lose_life(to_player as i32);
            self.logger.event(
                category::COMBAT,
                format!(
                    "{} takes {} combat damage.",
                    self.player_name(defender),
                    to_player
                ),
            );
        }

        if !dead_names.is_empty() {
            self.logger.event(
                category::COMBAT,
                format!("{} died in combat.", dead_names.join(", ")),
            );
        }

        self.check_state_based_actions()?;
        if self.game_over {
            return Ok(());
        }

        self.push_combat_damage_triggers(&damage, defender);
        Ok(())
    }

    /// Player prevention shield, then the global shield
    pub(crate) fn prevent_player_damage(&mut self, player: PlayerId, amount: u32) -> Result<u32> {
        let after_shield = self.get_player_mut(player)?.absorb_damage(amount);
        let global = &mut self.turn_effects.global_damage_prevention_shield;
        let prevented = after_shield.min(*global);
        *global -= prevented;
        Ok(after_shield - prevented)
    }

    /// Damage `player` would take goes to the creature enchanted by their redirecting aura
    pub(crate) fn redirect_player_damage(
        &mut self,
        player: PlayerId,
        amount: u32,
        combat: bool,
    ) -> Result<u32> {
        if amount == 0 {
            return Ok(0);
        }
        let Some(creature) = self.damage_redirect_aura_target(player) else {
            return Ok(amount);
        };
        self.damage_redirect_creature(creature, amount, combat)?;
        Ok(0)
    }

    fn damage_redirect_creature(
        &mut self,
        id: PermanentId,
        amount: u32,
        combat: bool,
    ) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let kind = if combat { "redirected combat damage" } else { "redirected damage" };
        let name = self.permanent_name(id);
        let Some(permanent) = self.find_permanent_mut(id) else {
            return Ok(());
        };
        let dealt = permanent.deal_damage(amount);
        self.logger.event(
            category::COMBAT,
            format!("{name} absorbs {dealt} {kind}."),
        );

        let Some(permanent) = self.find_permanent(id) else {
            return Ok(());
        };
        let lethal = permanent.damage_marked > 0
            && (permanent.damage_marked as i32) >= self.effective_toughness(permanent);
        if !lethal {
            return Ok(());
        }
        if self.has_keyword(permanent, Keyword::Indestructible) {
            self.logger.event(
                category::COMBAT,
                format!("{name} is indestructible and survives."),
            );
        } else if !self.regenerate(id) {
            self.creature_dies(id)?;
            self.logger.event(
                category::COMBAT,
                format!("{name} is destroyed by {kind}."),
            );
        }
        Ok(())
    }

    fn push_combat_damage_triggers(&mut self, damage: &CombatDamage, defender: PlayerId) {
        let mut entries = Vec::new();

        let mut seen = BTreeSet::new();
        for &(source, victim) in &damage.creature_hits {
            if !seen.insert((source, victim)) {
                continue;
            }
            let slot = EffectSlot::OnCombatDamageToCreature;
            if let Some(entry) = self.damage_trigger(source, slot, Target::Permanent(victim)) {
                entries.push(entry);
            }
        }
        for (&source, &amount) in &damage.dealt_to_player_by {
            if amount == 0 {
                continue;
            }
            let slot = EffectSlot::OnCombatDamageToPlayer;
            if let Some(entry) = self.damage_trigger(source, slot, Target::Player(defender)) {
                entries.push(entry);
            }
        }

        for entry in entries {
            self.logger.event(
                category::STACK,
                format!("{} triggers.", entry.description),
            );
            self.push_stack(entry);
        }
    }

    fn damage_trigger(
        &self,
        source: PermanentId,
        slot: EffectSlot,
        target: Target,
    ) -> Option<StackEntry> {
        let permanent = self.find_permanent(source)?;
        let card = self.permanent_card(permanent).ok()?;
        let effects = card.effects_for(slot);
        if effects.is_empty() {
            return None;
        }
        let mut entry = StackEntry::new(
            StackEntryType::TriggeredAbility,
            permanent.card,
            permanent.controller,
            format!("{}'s combat damage ability", card.name),
            effects,
        )
        .with_source(source)
        .non_targeting();
        entry.target = Some(target);
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, Color};

    fn setup() -> (GameState, PlayerId, PlayerId) {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        game.turn.current_step = Step::BeginCombat;
        (game, PlayerId::new(0), PlayerId::new(1))
    }

    fn creature(
        game: &mut GameState,
        owner: PlayerId,
        name: &str,
        p: i32,
        t: i32,
        keywords: &[Keyword],
    ) -> PermanentId {
        let card = game.create_card(|id| {
            let mut card = Card::new(id, name, owner).creature(p, t);
            for kw in keywords {
                card = card.with_keyword(*kw);
            }
            card
        });
        game.put_onto_battlefield(card).unwrap()
    }

    #[test]
    fn test_summoning_sick_creature_cannot_attack() {
        let (mut game, alice, _) = setup();
        let bear = creature(&mut game, alice, "Grizzly Bears", 2, 2, &[]);
        let goblin = creature(&mut game, alice, "Raging Goblin", 1, 1, &[Keyword::Haste]);
        game.find_permanent_mut(bear).unwrap().summoning_sick = true;
        game.find_permanent_mut(goblin).unwrap().summoning_sick = true;

        assert_eq!(game.attack_candidates(alice), vec![1]);
    }

    #[test]
    fn test_no_attackers_skips_to_end_of_combat() {
        let (mut game, _, _) = setup();
        game.pass_both().unwrap();
        assert_eq!(game.turn.current_step, Step::EndCombat);
        assert!(game.interaction.is_none());
    }

    #[test]
    fn test_declare_attackers_validation() {
        let (mut game, alice, bob) = setup();
        creature(&mut game, alice, "Grizzly Bears", 2, 2, &[]);
        creature(&mut game, alice, "Serra Angel", 4, 4, &[Keyword::Flying, Keyword::Vigilance]);
        game.pass_both().unwrap();
        assert!(matches!(
            game.interaction,
            Some(Interaction::AttackerDeclaration { .. })
        ));

        let err = game.declare_attackers(bob, &[0]).unwrap_err();
        assert_eq!(err.illegal_action(), Some(&IllegalAction::NotYourChoice));
        let err = game.declare_attackers(alice, &[0, 0]).unwrap_err();
        assert_eq!(err.illegal_action(), Some(&IllegalAction::DuplicateAttackers));
        let err = game.declare_attackers(alice, &[5]).unwrap_err();
        assert_eq!(err.illegal_action(), Some(&IllegalAction::InvalidAttackerIndex(5)));

        game.declare_attackers(alice, &[0, 1]).unwrap();
        let battlefield = game.battlefield(alice);
        assert!(battlefield[0].attacking && battlefield[0].tapped);
        assert!(battlefield[1].attacking && !battlefield[1].tapped);
        assert!(game.logger.contains("Alice declares 2 attackers."));
    }

    #[test]
    fn test_flying_needs_flying_or_reach_to_block() {
        let (mut game, alice, bob) = setup();
        creature(&mut game, alice, "Wind Drake", 2, 2, &[Keyword::Flying]);
        creature(&mut game, bob, "Grizzly Bears", 2, 2, &[]);
        creature(&mut game, bob, "Giant Spider", 2, 4, &[Keyword::Reach]);
        game.pass_both().unwrap();
        game.declare_attackers(alice, &[0]).unwrap();
        game.pass_both().unwrap();
        assert_eq!(game.turn.current_step, Step::DeclareBlockers);

        let err = game
            .declare_blockers(bob, &[BlockerAssignment::new(0, 0)])
            .unwrap_err();
        assert!(matches!(
            err.illegal_action(),
            Some(IllegalAction::CantBlock { reason, .. }) if reason == "flying"
        ));
        game.declare_blockers(bob, &[BlockerAssignment::new(1, 0)])
            .unwrap();
        assert!(game.battlefield(bob)[1].blocking);
    }

    #[test]
    fn test_menace_needs_two_blockers() {
        let (mut game, alice, bob) = setup();
        creature(&mut game, alice, "Goblin Heelcutter", 3, 2, &[Keyword::Menace]);
        creature(&mut game, bob, "Grizzly Bears", 2, 2, &[]);
        creature(&mut game, bob, "Runeclaw Bear", 2, 2, &[]);
        game.pass_both().unwrap();
        game.declare_attackers(alice, &[0]).unwrap();
        game.pass_both().unwrap();

        let err = game
            .declare_blockers(bob, &[BlockerAssignment::new(0, 0)])
            .unwrap_err();
        assert!(matches!(err.illegal_action(), Some(IllegalAction::Menace(_))));
        game.declare_blockers(
            bob,
            &[BlockerAssignment::new(0, 0), BlockerAssignment::new(1, 0)],
        )
        .unwrap();
    }

    #[test]
    fn test_protection_prevents_block_and_damage() {
        let (mut game, alice, bob) = setup();
        let knight = game.create_card(|id| {
            Card::new(id, "White Knight", alice)
                .with_color(Color::White)
                .creature(2, 2)
                .with_keyword(Keyword::ProtectionFrom(Color::Black))
        });
        game.put_onto_battlefield(knight).unwrap();
        let zombie = game.create_card(|id| {
            Card::new(id, "Scathe Zombies", bob)
                .with_color(Color::Black)
                .creature(2, 3)
        });
        game.put_onto_battlefield(zombie).unwrap();
        game.pass_both().unwrap();
        game.declare_attackers(alice, &[0]).unwrap();
        game.pass_both().unwrap();

        // The only possible blocker is black, so nobody is asked to block
        assert!(game.interaction.is_none());
        game.pass_both().unwrap();
        assert_eq!(game.life(bob), 18);
    }

    #[test]
    fn test_double_strike_deals_damage_twice() {
        let (mut game, alice, bob) = setup();
        creature(&mut game, alice, "Fencing Ace", 1, 1, &[Keyword::DoubleStrike]);
        game.pass_both().unwrap();
        game.declare_attackers(alice, &[0]).unwrap();
        game.pass_until_step(Step::EndCombat).unwrap();
        assert_eq!(game.life(bob), 18);
    }
}
