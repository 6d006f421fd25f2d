//! Player actions that put things on the stack or produce mana
//!
//! Every action validates completely before it touches the game: a rejected
//! action leaves life totals, pools, zones and the stack exactly as they were.

use crate::core::{ActivationTiming, CardId, EffectContext, EffectSlot, Keyword, PlayerId, Target};
use crate::error::IllegalAction;
use crate::game::logger::category;
use crate::game::{GameState, PermanentId, StackEntry, StackEntryType};
use crate::Result;

/// A validated activation, ready to commit
struct Activation {
    source: PermanentId,
    card: CardId,
    ability_index: usize,
    x_value: u32,
    target: Option<Target>,
    sacrificed: Option<PermanentId>,
}

impl GameState {
    /// Cast the card at `hand_index` in `player`'s hand
    ///
    /// `x_value` is only meaningful for costs containing {X}. Spells that
    /// need a target must be given one; others ignore it.
    pub fn cast_spell(
        &mut self,
        player: PlayerId,
        hand_index: usize,
        x_value: Option<u32>,
        target: Option<Target>,
    ) -> Result<()> {
        self.ensure_priority(player)?;

        let card_id = self
            .get_player_zones(player)?
            .hand
            .get(hand_index)
            .ok_or(IllegalAction::InvalidCardIndex(hand_index))?;
        let card = self.card(card_id)?;
        if card.is_land() {
            return Err(IllegalAction::NotPlayable.into());
        }
        let entry_type =
            StackEntryType::for_card_types(&card.types).ok_or(IllegalAction::NotPlayable)?;

        if !card.has_instant_timing() {
            self.check_sorcery_timing(player, "Casting this spell")?;
        }

        let x = if card.mana_cost.has_x() {
            x_value.unwrap_or(0)
        } else {
            0
        };
        let pool = &self.get_player(player)?.mana_pool;
        if !card.mana_cost.can_pay(pool, x) {
            if card.mana_cost.has_x() && x > 0 {
                return Err(IllegalAction::NotEnoughManaForX(x).into());
            }
            return Err(IllegalAction::NotEnoughMana.into());
        }

        let target = if card.needs_target {
            let target = target.ok_or(IllegalAction::TargetRequired)?;
            self.check_target(card, player, target, card.target_filter.as_ref())?;
            Some(target)
        } else {
            None
        };

        // Validated; commit
        let cost = card.mana_cost;
        let filter = card.target_filter.clone();
        let name = card.name.to_string();
        let effects = if entry_type.is_permanent_spell() {
            Vec::new()
        } else {
            card.effects_for(EffectSlot::Spell)
        };

        cost.pay(&mut self.get_player_mut(player)?.mana_pool, x)
            .map_err(|_| IllegalAction::NotEnoughMana)?;
        self.get_player_zones_mut(player)?.hand.remove_at(hand_index);

        let entry = StackEntry::new(entry_type, card_id, player, name.clone(), effects)
            .with_target(target, filter)
            .with_x(cost.has_x().then_some(x));
        let line = match target {
            Some(t) => format!(
                "{} casts {} targeting {}.",
                self.player_name(player),
                name,
                self.describe_target(t)
            ),
            None => format!("{} casts {}.", self.player_name(player), name),
        };
        self.logger.event(category::STACK, line);
        self.push_stack(entry);
        Ok(())
    }

    /// Activate an ability of the permanent at `permanent_index` on `player`'s battlefield
    ///
    /// Sacrifice costs are paid on the spot. Abilities that only produce mana
    /// resolve immediately; everything else goes on the stack.
    pub fn activate_ability(
        &mut self,
        player: PlayerId,
        permanent_index: usize,
        ability_index: Option<usize>,
        x_value: Option<u32>,
        target: Option<Target>,
    ) -> Result<()> {
        self.ensure_priority(player)?;
        let activation =
            self.validate_activation(player, permanent_index, ability_index, x_value, target)?;
        self.commit_activation(player, activation)
    }

    fn validate_activation(
        &self,
        player: PlayerId,
        permanent_index: usize,
        ability_index: Option<usize>,
        x_value: Option<u32>,
        target: Option<Target>,
    ) -> Result<Activation> {
        let permanent = self
            .battlefield(player)
            .get(permanent_index)
            .ok_or(IllegalAction::InvalidPermanentIndex(permanent_index))?;
        let card = self.permanent_card(permanent)?;
        if card.activated_abilities.is_empty() {
            return Err(IllegalAction::NoActivatedAbility.into());
        }
        let index = ability_index.unwrap_or(0);
        let ability = card
            .activated_abilities
            .get(index)
            .ok_or(IllegalAction::InvalidAbilityIndex(index))?;

        match ability.timing {
            ActivationTiming::Instant => {}
            ActivationTiming::SorcerySpeed => {
                self.check_sorcery_timing(player, "Activating this ability")?
            }
            ActivationTiming::OnlyDuringYourUpkeep => self.check_upkeep_timing(player)?,
        }

        if ability.cost.requires_tap() {
            if permanent.tapped {
                return Err(IllegalAction::AlreadyTapped.into());
            }
            if self.is_creature(permanent)
                && permanent.summoning_sick
                && !self.has_keyword(permanent, Keyword::Haste)
            {
                return Err(IllegalAction::SummoningSickness.into());
            }
        }

        let sacrifices_creature = ability.cost.sacrifices_creature();
        if ability.needs_target && !sacrifices_creature {
            let target = target.ok_or(IllegalAction::TargetRequired)?;
            self.check_target(card, player, target, ability.target_filter.as_ref())?;
        }

        let x = x_value.unwrap_or(0);
        if let Some(cost) = ability.cost.mana() {
            if !cost.can_pay(&self.get_player(player)?.mana_pool, x) {
                return Err(IllegalAction::NotEnoughManaToActivate.into());
            }
        }

        let sacrificed = if sacrifices_creature {
            let target = target.ok_or(IllegalAction::SacrificeTargetRequired)?;
            let id = target
                .as_permanent()
                .ok_or(IllegalAction::InvalidSacrificeTarget)?;
            let victim = self
                .find_permanent(id)
                .ok_or(IllegalAction::InvalidSacrificeTarget)?;
            if victim.controller != player || !self.is_creature(victim) {
                return Err(IllegalAction::MustSacrificeOwnCreature.into());
            }
            Some(id)
        } else {
            None
        };

        Ok(Activation {
            source: permanent.id,
            card: permanent.card,
            ability_index: index,
            x_value: x,
            target: if ability.needs_target || sacrifices_creature {
                target
            } else {
                None
            },
            sacrificed,
        })
    }

    fn commit_activation(&mut self, player: PlayerId, activation: Activation) -> Result<()> {
        let card = self.card(activation.card)?;
        let ability = card
            .activated_abilities
            .get(activation.ability_index)
            .cloned()
            .ok_or(IllegalAction::InvalidAbilityIndex(activation.ability_index))?;
        let name = card.name.to_string();

        if let Some(cost) = ability.cost.mana() {
            cost.pay(&mut self.get_player_mut(player)?.mana_pool, activation.x_value)
                .map_err(|_| IllegalAction::NotEnoughManaToActivate)?;
        }
        if ability.cost.requires_tap() {
            if let Some(p) = self.find_permanent_mut(activation.source) {
                p.tap();
            }
        }
        if let Some(victim) = activation.sacrificed {
            let victim_name = self.permanent_name(victim);
            self.sacrifice_permanent(victim)?;
            self.logger.event(
                category::STACK,
                format!("{} sacrifices {}.", self.player_name(player), victim_name),
            );
        }
        if ability.cost.sacrifices_self() {
            self.sacrifice_permanent(activation.source)?;
            self.logger.event(
                category::STACK,
                format!("{} sacrifices {}.", self.player_name(player), name),
            );
        }

        if ability.is_mana_ability() {
            self.logger.event(
                category::STACK,
                format!("{} activates {}'s mana ability.", self.player_name(player), name),
            );
            let ctx = EffectContext {
                source_card: activation.card,
                source_permanent: Some(activation.source),
                controller: player,
                target: None,
                x_value: activation.x_value,
                source_name: name,
            };
            return self.run_effects(ability.effects, &ctx);
        }

        let x_value = ability
            .cost
            .mana()
            .filter(|cost| cost.has_x())
            .map(|_| activation.x_value);
        let mut entry = StackEntry::new(
            StackEntryType::ActivatedAbility,
            activation.card,
            player,
            format!("{name}'s ability"),
            ability.effects,
        )
        .with_target(activation.target, ability.target_filter)
        .with_source(activation.source)
        .with_x(x_value);
        // The sacrificed creature is a cost, not a target
        if activation.sacrificed.is_some() {
            entry = entry.non_targeting();
        }

        let line = match activation.target.filter(|_| activation.sacrificed.is_none()) {
            Some(t) => format!(
                "{} activates {}'s ability targeting {}.",
                self.player_name(player),
                name,
                self.describe_target(t)
            ),
            None => format!("{} activates {}'s ability.", self.player_name(player), name),
        };
        self.logger.event(category::STACK, line);
        self.push_stack(entry);
        Ok(())
    }

    /// Play a land from hand. A special action: it never uses the stack.
    pub fn play_land(&mut self, player: PlayerId, hand_index: usize) -> Result<()> {
        self.ensure_priority(player)?;
        let card_id = self
            .get_player_zones(player)?
            .hand
            .get(hand_index)
            .ok_or(IllegalAction::InvalidCardIndex(hand_index))?;
        if !self.card(card_id)?.is_land() {
            return Err(IllegalAction::NotPlayable.into());
        }
        self.check_sorcery_timing(player, "Playing a land")?;
        if !self.get_player(player)?.can_play_land() {
            return Err(IllegalAction::LandAlreadyPlayed.into());
        }

        self.get_player_zones_mut(player)?.hand.remove_at(hand_index);
        self.enter_battlefield(card_id, player, None)?;
        self.get_player_mut(player)?.play_land();
        self.logger.event(
            category::STACK,
            format!("{} plays {}.", self.player_name(player), self.card_name(card_id)),
        );
        Ok(())
    }

    /// Tap a permanent for the mana its `OnTap` effects produce
    pub fn tap_for_mana(&mut self, player: PlayerId, permanent_index: usize) -> Result<()> {
        self.ensure_priority(player)?;
        let permanent = self
            .battlefield(player)
            .get(permanent_index)
            .ok_or(IllegalAction::InvalidPermanentIndex(permanent_index))?;
        let card = self.permanent_card(permanent)?;
        let effects = card.effects_for(EffectSlot::OnTap);
        if effects.is_empty() || !effects.iter().all(|e| e.produces_mana()) {
            return Err(IllegalAction::NoManaAbility.into());
        }
        if permanent.tapped {
            return Err(IllegalAction::AlreadyTapped.into());
        }
        if self.is_creature(permanent)
            && permanent.summoning_sick
            && !self.has_keyword(permanent, Keyword::Haste)
        {
            return Err(IllegalAction::SummoningSickness.into());
        }

        let id = permanent.id;
        let ctx = EffectContext {
            source_card: permanent.card,
            source_permanent: Some(id),
            controller: player,
            target: None,
            x_value: 0,
            source_name: card.name.to_string(),
        };
        if let Some(p) = self.find_permanent_mut(id) {
            p.tap();
        }
        self.logger.log(
            crate::game::VerbosityLevel::Verbose,
            Some(category::STACK),
            format!("{} taps {} for mana.", self.player_name(player), ctx.source_name),
        );
        self.run_effects(effects, &ctx)
    }

    /// Name of a target for log lines
    pub fn describe_target(&self, target: Target) -> String {
        match target {
            Target::Player(id) => self.player_name(id),
            Target::Permanent(id) => self.permanent_name(id),
            Target::Spell(card) => self.card_name(card),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ActivatedAbility, Card, CardType, Color};
    use crate::effects::{AddMana, DealDamageToTarget, DestroyTarget, GainLife};
    use crate::game::{Step, TargetFilter};

    fn setup() -> (GameState, PlayerId, PlayerId) {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        game.turn.current_step = Step::PrecombatMain;
        (game, PlayerId::new(0), PlayerId::new(1))
    }

    fn forest(game: &mut GameState, owner: PlayerId) -> CardId {
        game.create_card(|id| {
            Card::new(id, "Forest", owner)
                .with_type(CardType::Land)
                .with_effect(EffectSlot::OnTap, AddMana::new(Color::Green, 1))
        })
    }

    #[test]
    fn test_play_land_once_per_turn() {
        let (mut game, alice, _) = setup();
        let first = forest(&mut game, alice);
        let second = forest(&mut game, alice);
        game.put_in_hand(first).unwrap();
        game.put_in_hand(second).unwrap();

        game.play_land(alice, 0).unwrap();
        assert_eq!(game.battlefield(alice).len(), 1);
        assert!(game.logger.contains("Alice plays Forest."));

        let err = game.play_land(alice, 0).unwrap_err();
        assert_eq!(err.illegal_action(), Some(&IllegalAction::LandAlreadyPlayed));
        assert_eq!(game.hand_size(alice), 1);
    }

    #[test]
    fn test_tap_for_mana() {
        let (mut game, alice, _) = setup();
        let card = forest(&mut game, alice);
        game.put_onto_battlefield(card).unwrap();

        game.tap_for_mana(alice, 0).unwrap();
        assert_eq!(game.get_player(alice).unwrap().mana_pool.green, 1);
        assert!(game.battlefield(alice)[0].tapped);

        let err = game.tap_for_mana(alice, 0).unwrap_err();
        assert_eq!(err.illegal_action(), Some(&IllegalAction::AlreadyTapped));
        assert_eq!(game.get_player(alice).unwrap().mana_pool.green, 1);
    }

    #[test]
    fn test_cast_creature_pays_and_pushes() {
        let (mut game, alice, _) = setup();
        let bear = game.create_card(|id| {
            Card::new(id, "Grizzly Bears", alice)
                .with_cost("{1}{G}")
                .unwrap()
                .creature(2, 2)
        });
        game.put_in_hand(bear).unwrap();
        game.get_player_mut(alice).unwrap().mana_pool.add(Color::Green, 2);

        game.cast_spell(alice, 0, None, None).unwrap();
        assert!(game.get_player(alice).unwrap().mana_pool.is_empty());
        assert_eq!(game.stack.len(), 1);
        assert_eq!(game.stack[0].entry_type, StackEntryType::CreatureSpell);
        assert!(game.logger.contains("Alice casts Grizzly Bears."));

        game.pass_both().unwrap();
        let permanent = &game.battlefield(alice)[0];
        assert!(permanent.summoning_sick);
    }

    #[test]
    fn test_failed_cast_changes_nothing() {
        let (mut game, alice, bob) = setup();
        let shock = game.create_card(|id| {
            Card::new(id, "Shock", alice)
                .with_cost("{R}")
                .unwrap()
                .with_type(CardType::Instant)
                .targeting(TargetFilter::AnyTarget)
                .with_effect(EffectSlot::Spell, DealDamageToTarget::new(2))
        });
        game.put_in_hand(shock).unwrap();
        game.get_player_mut(alice).unwrap().mana_pool.add(Color::Green, 1);

        let err = game
            .cast_spell(alice, 0, None, Some(Target::Player(bob)))
            .unwrap_err();
        assert_eq!(err.illegal_action(), Some(&IllegalAction::NotEnoughMana));
        assert_eq!(game.get_player(alice).unwrap().mana_pool.green, 1);
        assert_eq!(game.hand_size(alice), 1);
        assert!(game.stack.is_empty());

        game.get_player_mut(alice).unwrap().mana_pool.add(Color::Red, 1);
        let err = game.cast_spell(alice, 0, None, None).unwrap_err();
        assert_eq!(err.illegal_action(), Some(&IllegalAction::TargetRequired));
        assert_eq!(game.get_player(alice).unwrap().mana_pool.total(), 2);
    }

    #[test]
    fn test_sorcery_timing() {
        let (mut game, alice, bob) = setup();
        let growth = game.create_card(|id| {
            Card::new(id, "Natural Spring", bob)
                .with_type(CardType::Sorcery)
                .with_effect(EffectSlot::Spell, GainLife::new(8))
        });
        game.put_in_hand(growth).unwrap();
        game.pass_priority(alice).unwrap();

        let err = game.cast_spell(bob, 0, None, None).unwrap_err();
        assert!(matches!(err.illegal_action(), Some(IllegalAction::NotYourTurn(_))));
    }

    #[test]
    fn test_x_ability_destroys_creature() {
        let (mut game, alice, bob) = setup();
        let altar = game.create_card(|id| {
            Card::new(id, "Altar of Judgment", alice)
                .with_type(CardType::Artifact)
                .with_ability(
                    ActivatedAbility::new("{X}{W}")
                        .unwrap()
                        .targeting(TargetFilter::Creature)
                        .with_effect(DestroyTarget::new()),
                )
        });
        game.put_onto_battlefield(altar).unwrap();
        let bear = game.create_card(|id| Card::new(id, "Grizzly Bears", bob).creature(2, 2));
        let bear_perm = game.put_onto_battlefield(bear).unwrap();
        game.get_player_mut(alice).unwrap().mana_pool.add(Color::White, 3);

        game.activate_ability(alice, 0, None, Some(2), Some(Target::Permanent(bear_perm)))
            .unwrap();
        assert!(game.get_player(alice).unwrap().mana_pool.is_empty());
        assert_eq!(game.stack[0].x_value, Some(2));
        assert_eq!(game.stack[0].entry_type, StackEntryType::ActivatedAbility);

        game.pass_both().unwrap();
        assert!(game.find_permanent(bear_perm).is_none());
        assert!(game.get_player_zones(bob).unwrap().graveyard.contains(bear));
    }

    #[test]
    fn test_tap_ability_needs_untapped_unsick_creature() {
        let (mut game, alice, bob) = setup();
        let sorcerer = game.create_card(|id| {
            Card::new(id, "Prodigal Sorcerer", alice)
                .creature(1, 1)
                .with_ability(
                    ActivatedAbility::new("{T}")
                        .unwrap()
                        .targeting(TargetFilter::AnyTarget)
                        .with_effect(DealDamageToTarget::new(1)),
                )
        });
        let perm = game.enter_battlefield(sorcerer, alice, None).unwrap();

        let err = game
            .activate_ability(alice, 0, None, None, Some(Target::Player(bob)))
            .unwrap_err();
        assert_eq!(err.illegal_action(), Some(&IllegalAction::SummoningSickness));

        game.find_permanent_mut(perm).unwrap().summoning_sick = false;
        game.activate_ability(alice, 0, None, None, Some(Target::Player(bob)))
            .unwrap();
        assert!(game.find_permanent(perm).unwrap().tapped);
        assert!(game
            .logger
            .contains("Alice activates Prodigal Sorcerer's ability targeting Bob."));
    }

    #[test]
    fn test_sacrifice_creature_cost() {
        let (mut game, alice, bob) = setup();
        let altar = game.create_card(|id| {
            Card::new(id, "Bone Altar", alice)
                .with_type(CardType::Artifact)
                .with_ability(
                    ActivatedAbility::new("Sac<Creature>")
                        .unwrap()
                        .targeting(TargetFilter::CreatureYouControl)
                        .with_effect(GainLife::new(2)),
                )
        });
        game.put_onto_battlefield(altar).unwrap();
        let bear = game.create_card(|id| Card::new(id, "Grizzly Bears", alice).creature(2, 2));
        let bear_perm = game.put_onto_battlefield(bear).unwrap();
        let their_bear = game.create_card(|id| Card::new(id, "Grizzly Bears", bob).creature(2, 2));
        let their_perm = game.put_onto_battlefield(their_bear).unwrap();

        let err = game.activate_ability(alice, 0, None, None, None).unwrap_err();
        assert_eq!(err.illegal_action(), Some(&IllegalAction::SacrificeTargetRequired));
        let err = game
            .activate_ability(alice, 0, None, None, Some(Target::Permanent(their_perm)))
            .unwrap_err();
        assert_eq!(err.illegal_action(), Some(&IllegalAction::MustSacrificeOwnCreature));

        game.activate_ability(alice, 0, None, None, Some(Target::Permanent(bear_perm)))
            .unwrap();
        // Sacrificed at once, before the ability resolves
        assert!(game.find_permanent(bear_perm).is_none());
        assert!(game.stack[0].non_targeting);

        game.pass_both().unwrap();
        assert_eq!(game.life(alice), 22);
    }

    #[test]
    fn test_mana_ability_skips_stack() {
        let (mut game, alice, _) = setup();
        let elf = game.create_card(|id| {
            Card::new(id, "Llanowar Elves", alice)
                .creature(1, 1)
                .with_ability(
                    ActivatedAbility::new("{T}")
                        .unwrap()
                        .with_effect(AddMana::new(Color::Green, 1)),
                )
        });
        game.put_onto_battlefield(elf).unwrap();

        game.activate_ability(alice, 0, None, None, None).unwrap();
        assert!(game.stack.is_empty());
        assert_eq!(game.get_player(alice).unwrap().mana_pool.green, 1);
    }
}
