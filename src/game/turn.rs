//! Turn sequencing
//!
//! Steps run in the fixed order of [`Step::next`]. Entering a step performs
//! its turn-based actions (untap, draw, combat damage, cleanup) and puts its
//! triggers on the stack before anyone gets priority.

use crate::core::{EffectSlot, PlayerId, Target};
use crate::game::logger::category;
use crate::game::{GameState, Interaction, StackEntry, StackEntryType, Step, VerbosityLevel};
use crate::{MtgError, Result};

impl GameState {
    /// Begin the first turn. The starting player untaps and moves to their upkeep.
    pub fn start_game(&mut self) -> Result<()> {
        self.ensure_running()?;
        self.turn.current_step = Step::Untap;
        self.begin_turn()?;
        self.advance_step()
    }

    /// Leave the current step and enter the next one
    ///
    /// Priority passes are cleared and every mana pool empties.
    pub fn advance_step(&mut self) -> Result<()> {
        if self.game_over {
            return Ok(());
        }
        self.priority_passed_by.clear();
        self.drain_mana_pools();

        match self.turn.current_step.next() {
            Some(next) => self.enter_step(next),
            None => self.advance_turn(),
        }
    }

    pub(crate) fn enter_step(&mut self, step: Step) -> Result<()> {
        self.turn.current_step = step;
        self.logger.log(
            VerbosityLevel::Verbose,
            Some(category::TURN),
            format!("{step} step."),
        );

        match step {
            Step::Untap => self.begin_turn(),
            Step::Upkeep => {
                self.push_upkeep_triggers();
                Ok(())
            }
            Step::Draw => self.draw_step(),
            Step::DeclareAttackers => self.begin_declare_attackers(),
            Step::DeclareBlockers => self.begin_declare_blockers(),
            Step::CombatDamage => self.resolve_combat_damage(),
            Step::EndCombat => {
                self.clear_combat();
                Ok(())
            }
            Step::Cleanup => self.cleanup_step(),
            Step::PrecombatMain | Step::BeginCombat | Step::PostcombatMain | Step::EndStep => {
                Ok(())
            }
        }
    }

    /// Hand the turn to the other player and run their untap step
    pub fn advance_turn(&mut self) -> Result<()> {
        let next = self.opponent(self.turn.active_player)?;
        self.turn.next_turn(next);
        self.priority_passed_by.clear();
        self.drain_mana_pools();
        self.begin_turn()?;
        self.advance_step()
    }

    /// Untap step actions for the active player
    fn begin_turn(&mut self) -> Result<()> {
        let active = self.turn.active_player;
        self.logger.event(
            category::TURN,
            format!(
                "Turn {} begins. {}'s turn.",
                self.turn.turn_number,
                self.player_name(active)
            ),
        );

        for permanent in &mut self.get_player_zones_mut(active)?.battlefield {
            permanent.untap();
            permanent.summoning_sick = false;
        }
        self.get_player_mut(active)?.reset_lands_played();
        self.logger.event(
            category::TURN,
            format!("{} untaps their permanents.", self.player_name(active)),
        );
        Ok(())
    }

    fn push_upkeep_triggers(&mut self) {
        let active = self.turn.active_player;
        let mut triggers = Vec::new();
        for (controller, zones) in &self.player_zones {
            let slot = if *controller == active {
                EffectSlot::UpkeepTriggered
            } else {
                EffectSlot::OpponentUpkeepTriggered
            };
            for permanent in &zones.battlefield {
                let Ok(card) = self.permanent_card(permanent) else {
                    continue;
                };
                let effects = card.effects_for(slot);
                if !effects.is_empty() {
                    triggers.push((
                        permanent.card,
                        *controller,
                        permanent.id,
                        effects,
                        card.name.to_string(),
                    ));
                }
            }
        }

        for (card, controller, source, effects, name) in triggers {
            self.logger
                .event(category::STACK, format!("{name}'s upkeep ability triggers."));
            let mut entry = StackEntry::new(
                StackEntryType::TriggeredAbility,
                card,
                controller,
                format!("{name}'s upkeep ability"),
                effects,
            )
            .with_source(source)
            .non_targeting();
            // Upkeep triggers refer to the active player
            entry.target = Some(Target::Player(active));
            self.push_stack(entry);
        }
    }

    fn draw_step(&mut self) -> Result<()> {
        let active = self.turn.active_player;
        if self.turn.turn_number == 1 && active == self.turn.starting_player {
            self.logger.log(
                VerbosityLevel::Verbose,
                Some(category::TURN),
                format!("{} skips the draw on the first turn.", self.player_name(active)),
            );
            return Ok(());
        }

        let drawer = self
            .turn_effects
            .draw_replacement
            .get(&active)
            .copied()
            .unwrap_or(active);
        if drawer != active {
            self.logger.event(
                category::TURN,
                format!(
                    "{}'s draw is redirected — {} draws a card instead.",
                    self.player_name(active),
                    self.player_name(drawer)
                ),
            );
        }

        match self.draw_card(drawer)? {
            Some(_) => self.logger.event(
                category::TURN,
                format!("{} draws a card.", self.player_name(drawer)),
            ),
            None => {
                self.logger.event(
                    category::TURN,
                    format!("{} has no cards to draw.", self.player_name(drawer)),
                );
                return Ok(());
            }
        }

        self.push_draw_triggers(drawer);
        Ok(())
    }

    /// "Whenever a player draws a card" abilities, pointed at the drawing player
    fn push_draw_triggers(&mut self, drawer: PlayerId) {
        let triggers: Vec<_> = self
            .all_permanents()
            .filter_map(|p| {
                let card = self.permanent_card(p).ok()?;
                let effects = card.effects_for(EffectSlot::EachDrawTriggered);
                (!effects.is_empty())
                    .then(|| (p.card, p.controller, p.id, effects, card.name.to_string()))
            })
            .collect();

        for (card, controller, source, effects, name) in triggers {
            let mut entry = StackEntry::new(
                StackEntryType::TriggeredAbility,
                card,
                controller,
                format!("{name}'s draw trigger"),
                effects,
            )
            .with_source(source)
            .non_targeting();
            entry.target = Some(Target::Player(drawer));
            self.push_stack(entry);
        }
    }

    fn cleanup_step(&mut self) -> Result<()> {
        let active = self.turn.active_player;
        let excess = self
            .hand_size(active)
            .saturating_sub(self.config.max_hand_size);
        if excess == 0 {
            return self.finish_cleanup();
        }
        self.logger.event(
            category::TURN,
            format!(
                "{} must discard {} card{}.",
                self.player_name(active),
                excess,
                if excess == 1 { "" } else { "s" }
            ),
        );
        self.begin_interaction(Interaction::DiscardChoice {
            player: active,
            remaining: excess,
        })
    }

    /// End-of-turn reset, then the next turn begins
    pub fn finish_cleanup(&mut self) -> Result<()> {
        self.end_temporary_control()?;
        self.reset_end_of_turn();
        self.advance_turn()
    }

    /// Permanents borrowed "until end of turn" go back to their controllers
    fn end_temporary_control(&mut self) -> Result<()> {
        let borrowed = std::mem::take(&mut self.turn_effects.control_until_end_of_turn);
        for (id, controller) in borrowed {
            if self.change_control(id, controller)?.is_some() {
                self.logger.event(
                    category::TURN,
                    format!(
                        "{} returns to {}'s control.",
                        self.permanent_name(id),
                        self.player_name(controller)
                    ),
                );
            }
        }
        Ok(())
    }

    /// Clear everything that lasts "until end of turn"
    pub fn reset_end_of_turn(&mut self) {
        for (_, zones) in &mut self.player_zones {
            for permanent in &mut zones.battlefield {
                permanent.reset_end_of_turn();
            }
        }
        for player in &mut self.players {
            player.damage_prevention_shield = 0;
        }
        self.turn_effects = Default::default();
    }

    fn drain_mana_pools(&mut self) {
        for player in &mut self.players {
            player.empty_mana_pool();
        }
    }

    /// Pass priority for whoever holds it until `step` is reached
    ///
    /// Stops early with an error if an interaction needs an answer.
    pub fn pass_until_step(&mut self, step: Step) -> Result<()> {
        // Two full turns is more than any step is ever away
        for _ in 0..64 {
            if self.turn.current_step == step || self.game_over {
                return Ok(());
            }
            self.ensure_no_pending_input()?;
            let holder = self.priority_holder().ok_or_else(|| {
                MtgError::InvariantViolation(format!(
                    "nobody holds priority in the {} step",
                    self.turn.current_step
                ))
            })?;
            self.pass_priority(holder)?;
        }
        Err(MtgError::InvariantViolation(format!("{step} step never reached")))
    }
}
