//! Main game state structure

use crate::config::GameConfig;
use crate::core::{Card, CardId, Color, EntityId, EntityStore, Player, PlayerId, PlayerName};
use crate::error::IllegalAction;
use crate::game::{
    GameLogger, Interaction, PendingEffects, Permanent, PermanentId, StackEntry, TurnStructure,
};
use crate::zones::PlayerZones;
use crate::{MtgError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Game-wide effects that last until the end of the turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEffects {
    /// Damage from any source still to be prevented this turn
    pub global_damage_prevention_shield: u32,
    pub prevent_all_combat_damage: bool,
    /// Damage from sources of these colors is prevented
    pub prevent_damage_from_colors: BTreeSet<Color>,
    /// Creature that absorbs unblocked combat damage aimed at its controller
    pub combat_damage_redirect_target: Option<PermanentId>,
    /// Per player: instances of damage of a color still to be prevented
    pub color_damage_prevention: BTreeMap<PlayerId, BTreeMap<Color, u32>>,
    /// Drawing player -> player who draws instead
    pub draw_replacement: BTreeMap<PlayerId, PlayerId>,
    /// Permanent -> controller it goes back to at cleanup
    pub control_until_end_of_turn: BTreeMap<PermanentId, PlayerId>,
}

/// Complete game state
///
/// The single mutable aggregate every engine operation works on. One instance
/// per match; nothing in it is shared between games.
#[derive(Debug, Clone)]
pub struct GameState {
    /// All cards in the game, whatever zone they are in
    pub cards: EntityStore<Card>,

    /// Both players, in turn order
    pub players: Vec<Player>,

    pub player_zones: Vec<(PlayerId, PlayerZones)>,

    /// The stack; the top is the last element
    pub stack: Vec<StackEntry>,

    pub turn: TurnStructure,

    /// Players who passed priority since the last stack change
    pub priority_passed_by: BTreeSet<PlayerId>,

    /// The one outstanding player decision, if any
    pub interaction: Option<Interaction>,

    /// Effects of a resolving entry held back while an interaction is open
    pub pending_effects: Vec<PendingEffects>,

    pub turn_effects: TurnEffects,

    pub winner: Option<PlayerId>,
    pub game_over: bool,

    pub config: GameConfig,

    /// Random number generator for library shuffles
    pub rng: ChaCha12Rng,

    /// Unified entity ID generator (shared across all entity types)
    next_entity_id: u32,

    pub logger: GameLogger,
}

impl GameState {
    /// Create a new game with two players and default settings
    pub fn new_two_player(
        player1_name: impl Into<PlayerName>,
        player2_name: impl Into<PlayerName>,
        starting_life: i32,
    ) -> Self {
        let config = GameConfig {
            starting_life,
            ..GameConfig::default()
        };
        Self::with_config(player1_name, player2_name, config)
    }

    /// Create a new game with two players; the first player takes the first turn
    pub fn with_config(
        player1_name: impl Into<PlayerName>,
        player2_name: impl Into<PlayerName>,
        config: GameConfig,
    ) -> Self {
        let p1_id = PlayerId::new(0);
        let p2_id = PlayerId::new(1);

        let players = vec![
            Player::new(p1_id, player1_name, config.starting_life),
            Player::new(p2_id, player2_name, config.starting_life),
        ];
        let player_zones = vec![
            (p1_id, PlayerZones::new(p1_id)),
            (p2_id, PlayerZones::new(p2_id)),
        ];

        let mut logger = GameLogger::with_verbosity(config.verbosity);
        logger.set_output_mode(config.output_mode);
        logger.set_output_format(config.output_format);

        GameState {
            cards: EntityStore::new(),
            players,
            player_zones,
            stack: Vec::new(),
            turn: TurnStructure::new(p1_id),
            priority_passed_by: BTreeSet::new(),
            interaction: None,
            pending_effects: Vec::new(),
            turn_effects: TurnEffects::default(),
            winner: None,
            game_over: false,
            rng: ChaCha12Rng::seed_from_u64(config.seed),
            config,
            next_entity_id: 2,
            logger,
        }
    }

    /// Get next entity ID (unified across all entity types)
    pub fn next_id<T>(&mut self) -> EntityId<T> {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    // ---------------------------------------------------------------------
    // Players

    pub fn get_player(&self, id: PlayerId) -> Result<&Player> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn get_player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    pub fn is_player(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    /// Display name for log lines
    pub fn player_name(&self, id: PlayerId) -> String {
        self.get_player(id)
            .map(|p| p.name.to_string())
            .unwrap_or_else(|_| format!("Player {id}"))
    }

    pub fn opponent(&self, id: PlayerId) -> Result<PlayerId> {
        self.players
            .iter()
            .find(|p| p.id != id)
            .map(|p| p.id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn active_player(&self) -> PlayerId {
        self.turn.active_player
    }

    pub fn non_active_player(&self) -> Result<PlayerId> {
        self.opponent(self.turn.active_player)
    }

    pub fn life(&self, id: PlayerId) -> i32 {
        self.get_player(id).map(|p| p.life).unwrap_or(0)
    }

    // ---------------------------------------------------------------------
    // Zones

    pub fn get_player_zones(&self, player_id: PlayerId) -> Result<&PlayerZones> {
        self.player_zones
            .iter()
            .find(|(id, _)| *id == player_id)
            .map(|(_, zones)| zones)
            .ok_or(MtgError::EntityNotFound(player_id.as_u32()))
    }

    pub fn get_player_zones_mut(&mut self, player_id: PlayerId) -> Result<&mut PlayerZones> {
        self.player_zones
            .iter_mut()
            .find(|(id, _)| *id == player_id)
            .map(|(_, zones)| zones)
            .ok_or(MtgError::EntityNotFound(player_id.as_u32()))
    }

    /// Permanents controlled by `player_id`, in the order they entered
    pub fn battlefield(&self, player_id: PlayerId) -> &[Permanent] {
        self.get_player_zones(player_id)
            .map(|zones| zones.battlefield.as_slice())
            .unwrap_or(&[])
    }

    /// Every permanent on the battlefield, player by player
    pub fn all_permanents(&self) -> impl Iterator<Item = &Permanent> {
        self.player_zones
            .iter()
            .flat_map(|(_, zones)| zones.battlefield.iter())
    }

    pub fn find_permanent(&self, id: PermanentId) -> Option<&Permanent> {
        self.all_permanents().find(|p| p.id == id)
    }

    pub fn find_permanent_mut(&mut self, id: PermanentId) -> Option<&mut Permanent> {
        self.player_zones
            .iter_mut()
            .flat_map(|(_, zones)| zones.battlefield.iter_mut())
            .find(|p| p.id == id)
    }

    /// Look up a permanent by its position in its controller's battlefield
    pub fn permanent_at(&self, player_id: PlayerId, index: usize) -> Result<&Permanent> {
        self.battlefield(player_id)
            .get(index)
            .ok_or_else(|| IllegalAction::InvalidPermanentIndex(index).into())
    }

    pub fn permanent_index(&self, id: PermanentId) -> Option<(PlayerId, usize)> {
        self.player_zones.iter().find_map(|(player, zones)| {
            zones
                .battlefield
                .iter()
                .position(|p| p.id == id)
                .map(|idx| (*player, idx))
        })
    }

    pub fn hand_size(&self, player_id: PlayerId) -> usize {
        self.get_player_zones(player_id)
            .map(|z| z.hand.len())
            .unwrap_or(0)
    }

    // ---------------------------------------------------------------------
    // Cards

    pub fn card(&self, id: CardId) -> Result<&Card> {
        self.cards.get(id)
    }

    pub fn card_name(&self, id: CardId) -> String {
        self.cards
            .get(id)
            .map(|c| c.name.to_string())
            .unwrap_or_else(|_| format!("Card {id}"))
    }

    /// Card of a permanent on the battlefield
    pub fn permanent_card(&self, permanent: &Permanent) -> Result<&Card> {
        self.cards.get(permanent.card)
    }

    pub fn permanent_name(&self, id: PermanentId) -> String {
        self.find_permanent(id)
            .map(|p| self.card_name(p.card))
            .unwrap_or_else(|| format!("Permanent {id}"))
    }

    /// Register a new card. The builder receives the card's fresh id.
    pub fn create_card(&mut self, build: impl FnOnce(CardId) -> Card) -> CardId {
        let id = self.next_id();
        let mut card = build(id);
        card.id = id;
        self.cards.insert(id, card);
        id
    }

    fn card_owner(&self, card_id: CardId) -> Result<PlayerId> {
        Ok(self.cards.get(card_id)?.owner)
    }

    pub fn put_in_hand(&mut self, card_id: CardId) -> Result<()> {
        let owner = self.card_owner(card_id)?;
        self.get_player_zones_mut(owner)?.hand.add(card_id);
        Ok(())
    }

    /// Put a card on top of its owner's library
    pub fn put_in_library(&mut self, card_id: CardId) -> Result<()> {
        let owner = self.card_owner(card_id)?;
        self.get_player_zones_mut(owner)?.library.add(card_id);
        Ok(())
    }

    pub fn put_in_graveyard(&mut self, card_id: CardId) -> Result<()> {
        let owner = self.card_owner(card_id)?;
        self.get_player_zones_mut(owner)?.graveyard.add(card_id);
        Ok(())
    }

    /// Put a card directly onto the battlefield under its owner's control.
    /// The permanent is ready to attack and tap right away.
    pub fn put_onto_battlefield(&mut self, card_id: CardId) -> Result<PermanentId> {
        let owner = self.card_owner(card_id)?;
        let id = self.enter_battlefield(card_id, owner, None)?;
        if let Some(permanent) = self.find_permanent_mut(id) {
            permanent.summoning_sick = false;
        }
        Ok(id)
    }

    /// Create the permanent for a card entering the battlefield.
    /// Creatures enter summoning sick.
    pub fn enter_battlefield(
        &mut self,
        card_id: CardId,
        controller: PlayerId,
        attached_to: Option<crate::core::Target>,
    ) -> Result<PermanentId> {
        let card = self.cards.get(card_id)?;
        let owner = card.owner;
        let is_creature = card.is_creature();

        let id = self.next_id();
        let mut permanent = Permanent::new(id, card_id, controller).with_owner(owner);
        permanent.summoning_sick = is_creature;
        permanent.attached_to = attached_to;
        self.get_player_zones_mut(controller)?
            .battlefield
            .push(permanent);
        Ok(id)
    }

    /// Take a permanent off the battlefield. The card goes nowhere yet.
    pub fn remove_permanent(&mut self, id: PermanentId) -> Option<Permanent> {
        self.player_zones
            .iter_mut()
            .find_map(|(_, zones)| zones.remove_permanent(id))
    }

    /// Move a permanent's card to its owner's graveyard
    pub fn permanent_to_graveyard(&mut self, id: PermanentId) -> Result<Option<Permanent>> {
        match self.remove_permanent(id) {
            Some(permanent) => {
                self.put_in_graveyard(permanent.card)?;
                Ok(Some(permanent))
            }
            None => Ok(None),
        }
    }

    pub fn put_in_exile(&mut self, card_id: CardId) -> Result<()> {
        let owner = self.card_owner(card_id)?;
        self.get_player_zones_mut(owner)?.exile.add(card_id);
        Ok(())
    }

    /// Move a permanent's card to its owner's exile
    pub fn permanent_to_exile(&mut self, id: PermanentId) -> Result<Option<Permanent>> {
        match self.remove_permanent(id) {
            Some(permanent) => {
                self.put_in_exile(permanent.card)?;
                Ok(Some(permanent))
            }
            None => Ok(None),
        }
    }

    /// Move a permanent's card to its owner's hand
    pub fn permanent_to_hand(&mut self, id: PermanentId) -> Result<Option<Permanent>> {
        match self.remove_permanent(id) {
            Some(permanent) => {
                self.put_in_hand(permanent.card)?;
                Ok(Some(permanent))
            }
            None => Ok(None),
        }
    }

    /// Move a permanent to another player's battlefield
    ///
    /// The permanent keeps its id and attachments, leaves combat and is
    /// summoning sick under its new controller. Returns the previous
    /// controller, or `None` if nothing changed.
    pub fn change_control(
        &mut self,
        id: PermanentId,
        new_controller: PlayerId,
    ) -> Result<Option<PlayerId>> {
        if !self.is_player(new_controller) {
            return Err(MtgError::EntityNotFound(new_controller.as_u32()));
        }
        match self.find_permanent(id) {
            Some(p) if p.controller != new_controller => {}
            _ => return Ok(None),
        }
        let Some(mut permanent) = self.remove_permanent(id) else {
            return Ok(None);
        };
        let previous = permanent.controller;
        permanent.controller = new_controller;
        permanent.summoning_sick = true;
        permanent.remove_from_combat();
        self.get_player_zones_mut(new_controller)?
            .battlefield
            .push(permanent);
        Ok(Some(previous))
    }

    pub fn shuffle_library(&mut self, player_id: PlayerId) -> Result<()> {
        use rand::seq::SliceRandom;
        let zones = self
            .player_zones
            .iter_mut()
            .find(|(id, _)| *id == player_id)
            .map(|(_, z)| z)
            .ok_or(MtgError::EntityNotFound(player_id.as_u32()))?;
        zones.library.cards.shuffle(&mut self.rng);
        Ok(())
    }

    /// Draw the top card of a library into the same player's hand
    pub fn draw_card(&mut self, player_id: PlayerId) -> Result<Option<CardId>> {
        let zones = self.get_player_zones_mut(player_id)?;
        let drawn = zones.library.draw_top();
        if let Some(card_id) = drawn {
            zones.hand.add(card_id);
        }
        Ok(drawn)
    }

    // ---------------------------------------------------------------------
    // Game status

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn get_winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Commands are refused once the game has ended
    pub fn ensure_running(&self) -> Result<()> {
        if self.game_over {
            return Err(IllegalAction::GameOver.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_creation() {
        let game = GameState::new_two_player("Alice", "Bob", 20);

        assert_eq!(game.players.len(), 2);
        assert_eq!(game.life(PlayerId::new(0)), 20);
        assert_eq!(game.player_name(PlayerId::new(1)), "Bob");
        assert_eq!(game.active_player(), PlayerId::new(0));
        assert_eq!(game.non_active_player().unwrap(), PlayerId::new(1));
        assert!(game.stack.is_empty());
        assert!(game.interaction.is_none());
    }

    #[test]
    fn test_ids_are_unique_across_kinds() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        let alice = PlayerId::new(0);
        let card = game.create_card(|id| Card::new(id, "Grizzly Bears", alice).creature(2, 2));
        let permanent = game.put_onto_battlefield(card).unwrap();

        assert_ne!(card.as_u32(), alice.as_u32());
        assert_ne!(permanent.as_u32(), card.as_u32());
        assert_eq!(game.battlefield(alice).len(), 1);
        assert!(!game.battlefield(alice)[0].summoning_sick);
    }

    #[test]
    fn test_draw_card() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        let alice = PlayerId::new(0);
        let card = game.create_card(|id| Card::new(id, "Forest", alice));
        game.put_in_library(card).unwrap();

        assert_eq!(game.draw_card(alice).unwrap(), Some(card));
        assert_eq!(game.hand_size(alice), 1);
        assert_eq!(game.draw_card(alice).unwrap(), None);
    }

    #[test]
    fn test_permanent_to_graveyard_goes_to_owner() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        let alice = PlayerId::new(0);
        let bob = PlayerId::new(1);
        let card = game.create_card(|id| Card::new(id, "Grizzly Bears", alice).creature(2, 2));
        let perm = game.enter_battlefield(card, bob, None).unwrap();

        assert_eq!(game.battlefield(bob).len(), 1);
        assert!(game.battlefield(bob)[0].summoning_sick);
        game.permanent_to_graveyard(perm).unwrap();
        assert!(game.battlefield(bob).is_empty());
        assert!(game.get_player_zones(alice).unwrap().graveyard.contains(card));
    }

    #[test]
    fn test_change_control_moves_battlefields() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        let alice = PlayerId::new(0);
        let bob = PlayerId::new(1);
        let card = game.create_card(|id| Card::new(id, "Hill Giant", bob).creature(3, 3));
        let perm = game.put_onto_battlefield(card).unwrap();

        assert_eq!(game.change_control(perm, alice).unwrap(), Some(bob));
        assert!(game.battlefield(bob).is_empty());
        let stolen = &game.battlefield(alice)[0];
        assert_eq!(stolen.id, perm);
        assert_eq!(stolen.owner, bob);
        assert!(stolen.summoning_sick);

        // Already controlled: nothing to do
        assert_eq!(game.change_control(perm, alice).unwrap(), None);
        assert!(game.change_control(perm, PlayerId::new(42)).is_err());
    }

    #[test]
    fn test_exile_and_bounce_use_owner_zones() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        let alice = PlayerId::new(0);
        let bob = PlayerId::new(1);
        let giant = game.create_card(|id| Card::new(id, "Hill Giant", alice).creature(3, 3));
        let bear = game.create_card(|id| Card::new(id, "Grizzly Bears", alice).creature(2, 2));
        let giant_perm = game.enter_battlefield(giant, bob, None).unwrap();
        let bear_perm = game.enter_battlefield(bear, bob, None).unwrap();

        game.permanent_to_exile(giant_perm).unwrap();
        game.permanent_to_hand(bear_perm).unwrap();
        let zones = game.get_player_zones(alice).unwrap();
        assert!(zones.exile.contains(giant));
        assert!(zones.hand.contains(bear));
        assert!(game.battlefield(bob).is_empty());
        assert!(game.permanent_to_exile(giant_perm).unwrap().is_none());
    }

    #[test]
    fn test_game_over_refuses_commands() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        assert!(game.ensure_running().is_ok());
        game.game_over = true;
        let err = game.ensure_running().unwrap_err();
        assert_eq!(err.illegal_action(), Some(&IllegalAction::GameOver));
    }
}
