//! State-based actions and leaving the battlefield
//!
//! Checked after every resolution, every priority pass and combat damage,
//! repeated until nothing changes.

use crate::core::{EffectSlot, Keyword, PlayerId, Target};
use crate::game::logger::category;
use crate::game::{GameState, Interaction, PermanentChoicePurpose, PermanentId};
use crate::Result;
use std::collections::BTreeMap;

impl GameState {
    /// Run state-based actions until the board is stable or the game ends
    pub fn check_state_based_actions(&mut self) -> Result<()> {
        loop {
            if self.game_over {
                return Ok(());
            }
            let mut changed = false;

            let zero_toughness: Vec<PermanentId> = self
                .all_permanents()
                .filter(|p| self.is_creature(p) && self.effective_toughness(p) <= 0)
                .map(|p| p.id)
                .collect();
            for id in zero_toughness {
                let name = self.permanent_name(id);
                self.creature_dies(id)?;
                self.logger.event(
                    category::STATE,
                    format!("{name} is put into the graveyard (0 toughness)."),
                );
                changed = true;
            }

            let lethal: Vec<PermanentId> = self
                .all_permanents()
                .filter(|p| {
                    self.is_creature(p)
                        && p.damage_marked > 0
                        && (p.damage_marked as i32) >= self.effective_toughness(p)
                        && !self.has_keyword(p, Keyword::Indestructible)
                })
                .map(|p| p.id)
                .collect();
            for id in lethal {
                let name = self.permanent_name(id);
                if self.regenerate(id) {
                    continue;
                }
                self.creature_dies(id)?;
                self.logger.event(
                    category::STATE,
                    format!("{name} is destroyed (lethal damage)."),
                );
                changed = true;
            }

            changed |= self.remove_orphaned_attachments()?;

            if self.check_win_condition() {
                return Ok(());
            }
            // The rest waits for the player's choice
            if self.check_legend_rule()? {
                return Ok(());
            }
            if !changed {
                return Ok(());
            }
        }
    }

    /// Use a regeneration shield, logging it. Returns true if the permanent regenerated.
    pub(crate) fn regenerate(&mut self, id: PermanentId) -> bool {
        let regenerated = self
            .find_permanent_mut(id)
            .map(|p| p.try_regenerate())
            .unwrap_or(false);
        if regenerated {
            let name = self.permanent_name(id);
            self.logger
                .event(category::STATE, format!("{name} regenerates."));
        }
        regenerated
    }

    /// Destroy a permanent. Indestructible permanents survive, and so do
    /// regenerating ones unless `cant_regenerate` is set.
    ///
    /// Returns true if the permanent left the battlefield.
    pub fn destroy_permanent(&mut self, id: PermanentId, cant_regenerate: bool) -> Result<bool> {
        let Some(permanent) = self.find_permanent(id) else {
            return Ok(false);
        };
        let name = self.card_name(permanent.card);
        if self.has_keyword(permanent, Keyword::Indestructible) {
            self.logger
                .event(category::STATE, format!("{name} is indestructible."));
            return Ok(false);
        }
        if !cant_regenerate && self.regenerate(id) {
            return Ok(false);
        }
        self.creature_dies(id)?;
        self.logger
            .event(category::STATE, format!("{name} is destroyed."));
        self.remove_orphaned_attachments()?;
        Ok(true)
    }

    /// Sacrifice a permanent. Sacrifice ignores indestructible and regeneration.
    pub fn sacrifice_permanent(&mut self, id: PermanentId) -> Result<()> {
        self.creature_dies(id)?;
        self.remove_orphaned_attachments()?;
        Ok(())
    }

    /// Put a permanent into its owner's graveyard. Creatures trigger their
    /// death abilities, which remember the permanent they came from.
    pub(crate) fn creature_dies(&mut self, id: PermanentId) -> Result<()> {
        let Some(permanent) = self.permanent_to_graveyard(id)? else {
            return Ok(());
        };
        let card = self.card(permanent.card)?;
        if !card.is_creature() {
            return Ok(());
        }
        let on_death = card.effects_for(EffectSlot::OnDeath);
        if on_death.is_empty() {
            return Ok(());
        }
        let description = format!("{}'s death trigger", card.name);
        self.push_trigger(
            permanent.card,
            permanent.controller,
            Some(permanent.id),
            on_death,
            description,
        );
        Ok(())
    }

    /// Auras whose permanent left go to the graveyard; equipment just falls off.
    /// Returns true if anything changed.
    pub(crate) fn remove_orphaned_attachments(&mut self) -> Result<bool> {
        let orphaned: Vec<(PermanentId, bool)> = self
            .all_permanents()
            .filter_map(|p| match p.attached_to {
                Some(Target::Permanent(host)) if self.find_permanent(host).is_none() => {
                    let is_equipment = self
                        .permanent_card(p)
                        .map(|card| card.is_equipment())
                        .unwrap_or(false);
                    Some((p.id, is_equipment))
                }
                _ => None,
            })
            .collect();

        for &(id, is_equipment) in &orphaned {
            let name = self.permanent_name(id);
            if is_equipment {
                if let Some(p) = self.find_permanent_mut(id) {
                    p.attached_to = None;
                }
                self.logger.event(
                    category::STATE,
                    format!("{name} becomes unattached (equipped creature left the battlefield)."),
                );
            } else {
                self.permanent_to_graveyard(id)?;
                self.logger.event(
                    category::STATE,
                    format!("{name} is put into the graveyard (enchanted creature left the battlefield)."),
                );
            }
        }
        Ok(!orphaned.is_empty())
    }

    /// A player controlling two or more legendary permanents with the same
    /// name keeps one of them; the rest go to the graveyard once they choose.
    /// Returns true if a choice was opened.
    fn check_legend_rule(&mut self) -> Result<bool> {
        if self.interaction.is_some() {
            return Ok(false);
        }
        for player in self.player_ids() {
            let mut by_name: BTreeMap<String, Vec<PermanentId>> = BTreeMap::new();
            for permanent in self.battlefield(player) {
                let Ok(card) = self.permanent_card(permanent) else {
                    continue;
                };
                if card.is_legendary() {
                    by_name
                        .entry(card.name.to_string())
                        .or_default()
                        .push(permanent.id);
                }
            }
            let Some((name, copies)) = by_name.into_iter().find(|(_, ids)| ids.len() > 1) else {
                continue;
            };
            self.logger.event(
                category::STATE,
                format!(
                    "{} controls more than one {name} and chooses one to keep.",
                    self.player_name(player)
                ),
            );
            self.begin_interaction(Interaction::PermanentChoice {
                player,
                valid: copies,
                purpose: PermanentChoicePurpose::KeepLegend,
            })?;
            return Ok(true);
        }
        Ok(false)
    }

    /// A player at 0 or less life loses. Returns true once the game is over.
    pub fn check_win_condition(&mut self) -> bool {
        if self.game_over {
            return true;
        }
        let losers: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| p.has_lost || p.life <= 0)
            .map(|p| p.id)
            .collect();
        if losers.is_empty() {
            return false;
        }

        for player in &mut self.players {
            if losers.contains(&player.id) {
                player.has_lost = true;
            }
        }
        self.game_over = true;

        if losers.len() > 1 {
            self.logger
                .minimal("All players have been defeated. The game is a draw.");
            return true;
        }
        let loser = losers[0];
        self.winner = self.opponent(loser).ok();
        let winner_name = self
            .winner
            .map(|w| self.player_name(w))
            .unwrap_or_default();
        self.logger.minimal(format!(
            "{} has been defeated! {} wins!",
            self.player_name(loser),
            winner_name
        ));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, CardType, StaticAbility, Subtype, Supertype};
    use crate::effects::GainLife;
    use crate::game::InteractionResponse;

    fn setup() -> (GameState, PlayerId, PlayerId) {
        (
            GameState::new_two_player("Alice", "Bob", 20),
            PlayerId::new(0),
            PlayerId::new(1),
        )
    }

    #[test]
    fn test_zero_toughness_dies() {
        let (mut game, alice, _) = setup();
        let card = game.create_card(|id| Card::new(id, "Walking Corpse", alice).creature(2, 2));
        let perm = game.put_onto_battlefield(card).unwrap();
        game.find_permanent_mut(perm).unwrap().toughness_modifier = -2;

        game.check_state_based_actions().unwrap();
        assert!(game.find_permanent(perm).is_none());
        assert!(game.get_player_zones(alice).unwrap().graveyard.contains(card));
        assert!(game
            .logger
            .contains("Walking Corpse is put into the graveyard (0 toughness)."));
    }

    #[test]
    fn test_lethal_damage_respects_indestructible_and_regeneration() {
        let (mut game, alice, _) = setup();
        let golem = game.create_card(|id| {
            Card::new(id, "Darksteel Golem", alice)
                .creature(2, 2)
                .with_keyword(Keyword::Indestructible)
        });
        let troll = game.create_card(|id| Card::new(id, "River Troll", alice).creature(2, 2));
        let golem_perm = game.put_onto_battlefield(golem).unwrap();
        let troll_perm = game.put_onto_battlefield(troll).unwrap();

        game.find_permanent_mut(golem_perm).unwrap().damage_marked = 5;
        let troll_p = game.find_permanent_mut(troll_perm).unwrap();
        troll_p.damage_marked = 3;
        troll_p.regeneration_shield = 1;

        game.check_state_based_actions().unwrap();
        assert!(game.find_permanent(golem_perm).is_some());
        let troll_p = game.find_permanent(troll_perm).unwrap();
        assert!(troll_p.tapped);
        assert_eq!(troll_p.damage_marked, 0);
        assert!(game.logger.contains("River Troll regenerates."));
    }

    #[test]
    fn test_orphaned_aura_goes_to_graveyard() {
        let (mut game, alice, _) = setup();
        let bear = game.create_card(|id| Card::new(id, "Grizzly Bears", alice).creature(2, 2));
        let aura = game.create_card(|id| {
            Card::new(id, "Holy Strength", alice)
                .with_type(CardType::Enchantment)
                .with_subtype("Aura")
                .with_effect(
                    EffectSlot::Static,
                    StaticAbility::BoostAttached {
                        power: 1,
                        toughness: 2,
                    },
                )
        });
        let bear_perm = game.put_onto_battlefield(bear).unwrap();
        let aura_perm = game
            .enter_battlefield(aura, alice, Some(Target::Permanent(bear_perm)))
            .unwrap();

        assert!(game.destroy_permanent(bear_perm, false).unwrap());
        assert!(game.find_permanent(aura_perm).is_none());
        let graveyard = &game.get_player_zones(alice).unwrap().graveyard;
        assert!(graveyard.contains(bear));
        assert!(graveyard.contains(aura));
    }

    #[test]
    fn test_death_trigger_goes_on_stack() {
        let (mut game, alice, _) = setup();
        let card = game.create_card(|id| {
            Card::new(id, "Dying Wish Bear", alice)
                .creature(2, 2)
                .with_effect(EffectSlot::OnDeath, GainLife::new(3))
        });
        let perm = game.put_onto_battlefield(card).unwrap();
        game.sacrifice_permanent(perm).unwrap();

        let top = game.top_of_stack().unwrap();
        assert_eq!(top.source_permanent, Some(perm));
        assert!(top.non_targeting);
        assert_eq!(top.description, "Dying Wish Bear's death trigger");
    }

    #[test]
    fn test_unattached_equipment_stays() {
        let (mut game, alice, _) = setup();
        let bear = game.create_card(|id| Card::new(id, "Grizzly Bears", alice).creature(2, 2));
        let sword = game.create_card(|id| {
            Card::new(id, "Bonesplitter", alice)
                .with_type(CardType::Artifact)
                .with_subtype(Subtype::equipment())
        });
        let bear_perm = game.put_onto_battlefield(bear).unwrap();
        let sword_perm = game
            .enter_battlefield(sword, alice, Some(Target::Permanent(bear_perm)))
            .unwrap();

        game.sacrifice_permanent(bear_perm).unwrap();
        assert_eq!(game.find_permanent(sword_perm).unwrap().attached_to, None);
        assert!(game
            .logger
            .contains("Bonesplitter becomes unattached (equipped creature left the battlefield)."));
    }

    #[test]
    fn test_legend_rule_keeps_chosen_copy() {
        let (mut game, alice, bob) = setup();
        let legend = |game: &mut GameState, owner| {
            let card = game.create_card(|id| {
                Card::new(id, "Jaya Ballard", owner)
                    .with_supertype(Supertype::Legendary)
                    .creature(2, 2)
            });
            game.put_onto_battlefield(card).unwrap()
        };
        let first = legend(&mut game, alice);
        let bobs = legend(&mut game, bob);
        game.check_state_based_actions().unwrap();
        // Different controllers may each have one
        assert!(game.interaction.is_none());

        let second = legend(&mut game, alice);
        game.check_state_based_actions().unwrap();
        assert!(matches!(
            &game.interaction,
            Some(Interaction::PermanentChoice {
                player,
                valid,
                purpose: PermanentChoicePurpose::KeepLegend,
            }) if *player == alice && valid == &vec![first, second]
        ));

        game.respond_to_interaction(alice, InteractionResponse::Permanent(second))
            .unwrap();
        assert!(game.find_permanent(first).is_none());
        assert!(game.find_permanent(second).is_some());
        assert!(game.find_permanent(bobs).is_some());
        assert_eq!(game.get_player_zones(alice).unwrap().graveyard.len(), 1);
        assert!(game
            .logger
            .contains("Jaya Ballard is put into the graveyard (legend rule)."));
    }

    #[test]
    fn test_win_check() {
        let (mut game, alice, bob) = setup();
        game.get_player_mut(bob).unwrap().lose_life(20);
        game.check_state_based_actions().unwrap();

        assert!(game.is_game_over());
        assert_eq!(game.get_winner(), Some(alice));
        assert!(game.get_player(bob).unwrap().has_lost);
        assert!(game.logger.contains("Bob has been defeated! Alice wins!"));
    }
}
