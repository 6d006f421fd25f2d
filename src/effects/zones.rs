//! Effects that move cards between zones

use crate::core::{CardType, Effect, EffectContext, Target};
use crate::game::logger::category;
use crate::game::{
    GameState, GraveyardDestination, Interaction, PermanentChoicePurpose, PermanentId,
};
use crate::Result;

/// The resolving spell is shuffled into its owner's library instead of going to the graveyard
#[derive(Debug, Clone, Copy, Default)]
pub struct ShuffleIntoLibrary;

impl Effect for ShuffleIntoLibrary {
    fn apply(&self, _game: &mut GameState, _ctx: &EffectContext) -> Result<()> {
        Ok(())
    }

    fn shuffles_source_into_library(&self) -> bool {
        true
    }
}

/// The controller returns a card from their graveyard
///
/// The card is chosen through an [`Interaction::GraveyardChoice`].
#[derive(Debug, Clone, Copy)]
pub struct ReturnCardFromGraveyard {
    pub destination: GraveyardDestination,
    /// Only cards of this type qualify
    pub card_type: Option<CardType>,
}

impl ReturnCardFromGraveyard {
    pub fn to_hand() -> Self {
        ReturnCardFromGraveyard {
            destination: GraveyardDestination::Hand,
            card_type: None,
        }
    }

    pub fn to_battlefield() -> Self {
        ReturnCardFromGraveyard {
            destination: GraveyardDestination::Battlefield,
            card_type: None,
        }
    }

    pub fn of_type(mut self, card_type: CardType) -> Self {
        self.card_type = Some(card_type);
        self
    }
}

impl Effect for ReturnCardFromGraveyard {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        let player = ctx.controller;
        let graveyard = &game.get_player_zones(player)?.graveyard;
        let valid_indices: Vec<usize> = graveyard
            .cards
            .iter()
            .enumerate()
            .filter(|(_, id)| match self.card_type {
                Some(t) => game.card(**id).map(|c| c.is_type(t)).unwrap_or(false),
                None => true,
            })
            .map(|(idx, _)| idx)
            .collect();

        if valid_indices.is_empty() {
            game.logger.event(
                category::STACK,
                format!(
                    "{} has no cards in their graveyard to return.",
                    game.player_name(player)
                ),
            );
            return Ok(());
        }
        game.begin_interaction(Interaction::GraveyardChoice {
            player,
            valid_indices,
            destination: self.destination,
        })
    }
}

/// Target player sacrifices a creature of their choice
#[derive(Debug, Clone, Copy, Default)]
pub struct SacrificeCreatureEdict;

impl Effect for SacrificeCreatureEdict {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        let Some(player) = ctx.target.and_then(|t| t.as_player()) else {
            return Ok(());
        };
        let creatures: Vec<PermanentId> = game
            .battlefield(player)
            .iter()
            .filter(|p| game.is_creature(p))
            .map(|p| p.id)
            .collect();

        match creatures.as_slice() {
            [] => {
                game.logger.event(
                    category::STACK,
                    format!("{} has no creatures to sacrifice.", game.player_name(player)),
                );
                Ok(())
            }
            [only] => {
                let name = game.permanent_name(*only);
                game.sacrifice_permanent(*only)?;
                game.logger.event(
                    category::STACK,
                    format!("{} sacrifices {}.", game.player_name(player), name),
                );
                Ok(())
            }
            _ => game.begin_interaction(Interaction::PermanentChoice {
                player,
                valid: creatures,
                purpose: PermanentChoicePurpose::Sacrifice,
            }),
        }
    }
}

/// Exile the target permanent
#[derive(Debug, Clone, Copy, Default)]
pub struct ExileTarget;

impl Effect for ExileTarget {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        let Some(id) = ctx.target.and_then(|t| t.as_permanent()) else {
            return Ok(());
        };
        let name = game.permanent_name(id);
        if game.permanent_to_exile(id)?.is_some() {
            game.logger
                .event(category::STACK, format!("{name} is exiled."));
            game.remove_orphaned_attachments()?;
        }
        Ok(())
    }
}

/// Return the target permanent to its owner's hand
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnTargetToHand;

impl Effect for ReturnTargetToHand {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        let Some(id) = ctx.target.and_then(|t| t.as_permanent()) else {
            return Ok(());
        };
        let name = game.permanent_name(id);
        if game.permanent_to_hand(id)?.is_some() {
            game.logger.event(
                category::STACK,
                format!("{name} is returned to its owner's hand."),
            );
            game.remove_orphaned_attachments()?;
        }
        Ok(())
    }
}

/// Counter target spell: it leaves the stack for its owner's graveyard
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterTargetSpell;

impl Effect for CounterTargetSpell {
    fn apply(&self, game: &mut GameState, ctx: &EffectContext) -> Result<()> {
        let Some(Target::Spell(card)) = ctx.target else {
            return Ok(());
        };
        if game.remove_spell_from_stack(card).is_none() {
            return Ok(());
        }
        game.put_in_graveyard(card)?;
        game.logger.event(
            category::STACK,
            format!("{} is countered.", game.card_name(card)),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, EffectSlot, PlayerId, StaticAbility, Subtype};
    use crate::game::InteractionResponse;

    fn ctx(
        controller: PlayerId,
        card: crate::core::CardId,
        target: Option<Target>,
    ) -> EffectContext {
        EffectContext {
            source_card: card,
            source_permanent: None,
            controller,
            target,
            x_value: 0,
            source_name: "Edict".into(),
        }
    }

    #[test]
    fn test_edict_with_choice() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        let alice = PlayerId::new(0);
        let bob = PlayerId::new(1);
        let edict = game.create_card(|id| Card::new(id, "Diabolic Edict", alice));
        let a = game.create_card(|id| Card::new(id, "Grizzly Bears", bob).creature(2, 2));
        let b = game.create_card(|id| Card::new(id, "Hill Giant", bob).creature(3, 3));
        game.put_onto_battlefield(a).unwrap();
        let giant = game.put_onto_battlefield(b).unwrap();

        SacrificeCreatureEdict
            .apply(&mut game, &ctx(alice, edict, Some(Target::Player(bob))))
            .unwrap();
        assert!(matches!(
            game.interaction,
            Some(Interaction::PermanentChoice { player, .. }) if player == bob
        ));

        game.respond_to_interaction(bob, InteractionResponse::Permanent(giant))
            .unwrap();
        assert!(game.find_permanent(giant).is_none());
        assert!(game.logger.contains("Bob sacrifices Hill Giant."));
    }

    #[test]
    fn test_edict_single_creature_is_automatic() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        let alice = PlayerId::new(0);
        let bob = PlayerId::new(1);
        let edict = game.create_card(|id| Card::new(id, "Diabolic Edict", alice));
        let a = game.create_card(|id| Card::new(id, "Grizzly Bears", bob).creature(2, 2));
        let bear = game.put_onto_battlefield(a).unwrap();

        SacrificeCreatureEdict
            .apply(&mut game, &ctx(alice, edict, Some(Target::Player(bob))))
            .unwrap();
        assert!(game.interaction.is_none());
        assert!(game.find_permanent(bear).is_none());
    }

    #[test]
    fn test_exile_takes_aura_along() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        let alice = PlayerId::new(0);
        let bob = PlayerId::new(1);
        let spell = game.create_card(|id| Card::new(id, "Swords to Plowshares", alice));
        let giant = game.create_card(|id| Card::new(id, "Hill Giant", bob).creature(3, 3));
        let aura = game.create_card(|id| {
            Card::new(id, "Holy Strength", bob)
                .with_type(CardType::Enchantment)
                .with_subtype(Subtype::aura())
                .with_effect(
                    EffectSlot::Static,
                    StaticAbility::BoostAttached {
                        power: 1,
                        toughness: 2,
                    },
                )
        });
        let giant_perm = game.put_onto_battlefield(giant).unwrap();
        let aura_perm = game
            .enter_battlefield(aura, bob, Some(Target::Permanent(giant_perm)))
            .unwrap();

        ExileTarget
            .apply(&mut game, &ctx(alice, spell, Some(Target::Permanent(giant_perm))))
            .unwrap();
        let zones = game.get_player_zones(bob).unwrap();
        assert!(zones.exile.contains(giant));
        assert!(zones.graveyard.contains(aura));
        assert!(game.find_permanent(aura_perm).is_none());
        assert!(game.logger.contains("Hill Giant is exiled."));
    }

    #[test]
    fn test_bounce_returns_to_owner() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        let alice = PlayerId::new(0);
        let bob = PlayerId::new(1);
        let spell = game.create_card(|id| Card::new(id, "Unsummon", alice));
        let bear = game.create_card(|id| Card::new(id, "Grizzly Bears", bob).creature(2, 2));
        // Alice controls Bob's bear; it still goes to Bob's hand
        let bear_perm = game.enter_battlefield(bear, alice, None).unwrap();

        ReturnTargetToHand
            .apply(&mut game, &ctx(alice, spell, Some(Target::Permanent(bear_perm))))
            .unwrap();
        assert!(game.battlefield(alice).is_empty());
        assert!(game.get_player_zones(bob).unwrap().hand.contains(bear));
        assert!(game
            .logger
            .contains("Grizzly Bears is returned to its owner's hand."));

        // Already gone: nothing happens
        ReturnTargetToHand
            .apply(&mut game, &ctx(alice, spell, Some(Target::Permanent(bear_perm))))
            .unwrap();
        assert_eq!(game.hand_size(bob), 1);
    }

    #[test]
    fn test_return_only_matching_type() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        let alice = PlayerId::new(0);
        let source = game.create_card(|id| Card::new(id, "Raise Dead", alice));
        let land = game.create_card(|id| Card::new(id, "Swamp", alice).with_type(CardType::Land));
        game.put_in_graveyard(land).unwrap();

        ReturnCardFromGraveyard::to_hand()
            .of_type(CardType::Creature)
            .apply(&mut game, &ctx(alice, source, None))
            .unwrap();
        assert!(game.interaction.is_none());
        assert!(game
            .logger
            .contains("Alice has no cards in their graveyard to return."));
    }
}
