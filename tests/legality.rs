//! Rejected commands: the right error, and no change to the game

use vibes_engine::core::{
    ActivatedAbility, Card, CardType, Color, EffectSlot, Keyword, PlayerId, Target,
};
use vibes_engine::effects::{AddMana, DealDamageToTarget, DealXDamageToTarget, DestroyTarget};
use vibes_engine::game::{GameState, PermanentId, Step, TargetFilter};
use vibes_engine::{ErrorCategory, IllegalAction};

fn setup() -> (GameState, PlayerId, PlayerId) {
    let mut game = GameState::new_two_player("Alice", "Bob", 20);
    game.turn.current_step = Step::PrecombatMain;
    (game, PlayerId::new(0), PlayerId::new(1))
}

fn creature(
    game: &mut GameState,
    owner: PlayerId,
    name: &str,
    keywords: &[Keyword],
) -> PermanentId {
    let card = game.create_card(|id| {
        let mut card = Card::new(id, name, owner).creature(2, 2);
        for keyword in keywords {
            card = card.with_keyword(*keyword);
        }
        card
    });
    game.put_onto_battlefield(card).unwrap()
}

fn lightning_bolt(game: &mut GameState, owner: PlayerId) {
    let card = game.create_card(|id| {
        Card::new(id, "Lightning Bolt", owner)
            .with_type(CardType::Instant)
            .with_cost("{R}")
            .unwrap()
            .with_effect(EffectSlot::Spell, DealDamageToTarget::new(3))
            .targeting(TargetFilter::AnyTarget)
    });
    game.put_in_hand(card).unwrap();
}

fn plains(game: &mut GameState, owner: PlayerId) {
    let card = game.create_card(|id| {
        Card::new(id, "Plains", owner)
            .with_type(CardType::Land)
            .with_effect(EffectSlot::OnTap, AddMana::new(Color::White, 1))
    });
    game.put_onto_battlefield(card).unwrap();
}

/// Observable state a rejected command must not touch
fn snapshot(game: &GameState) -> (Vec<usize>, Vec<u32>, usize, usize, Vec<bool>) {
    let players = [PlayerId::new(0), PlayerId::new(1)];
    (
        players.iter().map(|p| game.hand_size(*p)).collect(),
        players
            .iter()
            .map(|p| game.get_player(*p).unwrap().mana_pool.total())
            .collect(),
        game.stack.len(),
        game.logger.len(),
        game.all_permanents().map(|p| p.tapped).collect(),
    )
}

#[test]
fn test_not_enough_mana_leaves_state_unchanged() {
    let (mut game, alice, bob) = setup();
    lightning_bolt(&mut game, alice);
    game.get_player_mut(alice)
        .unwrap()
        .mana_pool
        .add(Color::Green, 1);
    let before = snapshot(&game);

    let err = game
        .cast_spell(alice, 0, None, Some(Target::Player(bob)))
        .unwrap_err();
    assert_eq!(err.illegal_action(), Some(&IllegalAction::NotEnoughMana));
    assert_eq!(err.category(), Some(ErrorCategory::Cost));
    assert_eq!(snapshot(&game), before);
}

#[test]
fn test_enormous_x_is_rejected_not_paid() {
    let (mut game, alice, bob) = setup();
    let fireball = game.create_card(|id| {
        Card::new(id, "Fireball", alice)
            .with_type(CardType::Sorcery)
            .with_cost("{1}{X}{R}")
            .unwrap()
            .with_effect(EffectSlot::Spell, DealXDamageToTarget)
            .targeting(TargetFilter::AnyTarget)
    });
    game.put_in_hand(fireball).unwrap();
    game.get_player_mut(alice)
        .unwrap()
        .mana_pool
        .add(Color::Red, 3);
    let before = snapshot(&game);

    let err = game
        .cast_spell(alice, 0, Some(u32::MAX), Some(Target::Player(bob)))
        .unwrap_err();
    assert_eq!(
        err.illegal_action(),
        Some(&IllegalAction::NotEnoughManaForX(u32::MAX))
    );
    assert_eq!(snapshot(&game), before);

    game.cast_spell(alice, 0, Some(1), Some(Target::Player(bob)))
        .unwrap();
    game.pass_both().unwrap();
    assert_eq!(game.life(bob), 19);
}

#[test]
fn test_target_errors() {
    let (mut game, alice, bob) = setup();
    lightning_bolt(&mut game, alice);
    let troll = creature(&mut game, bob, "Troll Ascetic", &[Keyword::Shroud]);
    let knight = creature(
        &mut game,
        bob,
        "Silver Knight",
        &[Keyword::ProtectionFrom(Color::Red)],
    );
    game.get_player_mut(alice)
        .unwrap()
        .mana_pool
        .add(Color::Red, 1);
    let before = snapshot(&game);

    let err = game.cast_spell(alice, 0, None, None).unwrap_err();
    assert_eq!(err.illegal_action(), Some(&IllegalAction::TargetRequired));

    let err = game
        .cast_spell(alice, 0, None, Some(Target::Permanent(troll)))
        .unwrap_err();
    assert_eq!(
        err.illegal_action(),
        Some(&IllegalAction::Shroud("Troll Ascetic".into()))
    );

    let err = game
        .cast_spell(alice, 0, None, Some(Target::Permanent(knight)))
        .unwrap_err();
    assert_eq!(
        err.illegal_action(),
        Some(&IllegalAction::Protection {
            name: "Silver Knight".into(),
            color: Color::Red
        })
    );
    assert_eq!(err.category(), Some(ErrorCategory::Targeting));
    assert_eq!(snapshot(&game), before);
}

#[test]
fn test_sorcery_speed_timing() {
    let (mut game, alice, bob) = setup();
    let sorcery = game.create_card(|id| {
        Card::new(id, "Flame Slash", alice)
            .with_type(CardType::Sorcery)
            .with_cost("{R}")
            .unwrap()
            .with_effect(EffectSlot::Spell, DealDamageToTarget::new(4))
            .targeting(TargetFilter::Creature)
    });
    game.put_in_hand(sorcery).unwrap();
    lightning_bolt(&mut game, alice);
    let bear = creature(&mut game, bob, "Grizzly Bears", &[]);
    game.get_player_mut(alice)
        .unwrap()
        .mana_pool
        .add(Color::Red, 2);

    // Instants are fine with a spell on the stack; sorceries are not
    game.cast_spell(alice, 1, None, Some(Target::Player(bob)))
        .unwrap();
    let err = game
        .cast_spell(alice, 0, None, Some(Target::Permanent(bear)))
        .unwrap_err();
    assert_eq!(
        err.illegal_action(),
        Some(&IllegalAction::StackNotEmpty("Casting this spell".into()))
    );
    assert_eq!(err.category(), Some(ErrorCategory::Timing));
    game.pass_both().unwrap();

    game.turn.current_step = Step::BeginCombat;
    let err = game
        .cast_spell(alice, 0, None, Some(Target::Permanent(bear)))
        .unwrap_err();
    assert_eq!(
        err.illegal_action(),
        Some(&IllegalAction::NotMainPhase("Casting this spell".into()))
    );
}

#[test]
fn test_lands_are_played_not_cast() {
    let (mut game, alice, _) = setup();
    for _ in 0..2 {
        let card = game.create_card(|id| Card::new(id, "Forest", alice).with_type(CardType::Land));
        game.put_in_hand(card).unwrap();
    }

    let err = game.cast_spell(alice, 0, None, None).unwrap_err();
    assert_eq!(err.illegal_action(), Some(&IllegalAction::NotPlayable));

    game.play_land(alice, 0).unwrap();
    let err = game.play_land(alice, 0).unwrap_err();
    assert_eq!(err.illegal_action(), Some(&IllegalAction::LandAlreadyPlayed));
    assert_eq!(game.hand_size(alice), 1);
    assert_eq!(game.battlefield(alice).len(), 1);

    let err = game.play_land(alice, 7).unwrap_err();
    assert_eq!(err.illegal_action(), Some(&IllegalAction::InvalidCardIndex(7)));
}

#[test]
fn test_tap_for_mana_errors() {
    let (mut game, alice, _) = setup();
    plains(&mut game, alice);
    creature(&mut game, alice, "Grizzly Bears", &[]);

    game.tap_for_mana(alice, 0).unwrap();
    let err = game.tap_for_mana(alice, 0).unwrap_err();
    assert_eq!(err.illegal_action(), Some(&IllegalAction::AlreadyTapped));
    let err = game.tap_for_mana(alice, 1).unwrap_err();
    assert_eq!(err.illegal_action(), Some(&IllegalAction::NoManaAbility));
    let err = game.tap_for_mana(alice, 9).unwrap_err();
    assert_eq!(err.illegal_action(), Some(&IllegalAction::InvalidPermanentIndex(9)));
    assert_eq!(game.get_player(alice).unwrap().mana_pool.get(Color::White), 1);
}

#[test]
fn test_x_ability_destroys_creature_and_x_shortfall() {
    let (mut game, alice, bob) = setup();
    for _ in 0..3 {
        plains(&mut game, alice);
    }
    let rod = game.create_card(|id| {
        Card::new(id, "Crackling Rod", alice)
            .with_type(CardType::Artifact)
            .with_ability(
                ActivatedAbility::new("{X}{W}")
                    .unwrap()
                    .targeting(TargetFilter::Creature)
                    .with_effect(DealXDamageToTarget),
            )
    });
    game.put_onto_battlefield(rod).unwrap();
    let bear = creature(&mut game, bob, "Grizzly Bears", &[]);
    for index in 0..3 {
        game.tap_for_mana(alice, index).unwrap();
    }

    let before = snapshot(&game);
    let err = game
        .activate_ability(alice, 3, None, Some(3), Some(Target::Permanent(bear)))
        .unwrap_err();
    assert_eq!(err.illegal_action(), Some(&IllegalAction::NotEnoughManaToActivate));
    assert_eq!(snapshot(&game), before);

    game.activate_ability(alice, 3, None, Some(2), Some(Target::Permanent(bear)))
        .unwrap();
    assert_eq!(game.get_player(alice).unwrap().mana_pool.total(), 0);
    assert!(game
        .logger
        .contains("Alice activates Crackling Rod's ability targeting Grizzly Bears."));
    game.pass_both().unwrap();

    assert!(game.logger.contains("Crackling Rod deals 2 damage to Grizzly Bears."));
    assert!(game.find_permanent(bear).is_none());
    assert_eq!(game.get_player_zones(bob).unwrap().graveyard.len(), 1);
}

#[test]
fn test_activation_errors() {
    let (mut game, alice, bob) = setup();
    let angel = creature(&mut game, alice, "Serra Angel", &[]);
    let sniper = game.create_card(|id| {
        Card::new(id, "Prodigal Sorcerer", alice)
            .creature(1, 1)
            .with_ability(
                ActivatedAbility::new("{T}")
                    .unwrap()
                    .targeting(TargetFilter::AnyTarget)
                    .with_effect(DealDamageToTarget::new(1)),
            )
    });
    let sorcerer = game.put_onto_battlefield(sniper).unwrap();
    let destroyer = game.create_card(|id| {
        Card::new(id, "Executioner's Rack", alice)
            .with_type(CardType::Artifact)
            .with_ability(
                ActivatedAbility::new("{2}")
                    .unwrap()
                    .targeting(TargetFilter::Creature)
                    .with_effect(DestroyTarget::new()),
            )
    });
    game.put_onto_battlefield(destroyer).unwrap();

    let err = game
        .activate_ability(alice, 0, None, None, Some(Target::Player(bob)))
        .unwrap_err();
    assert_eq!(err.illegal_action(), Some(&IllegalAction::NoActivatedAbility));
    let err = game
        .activate_ability(alice, 1, Some(1), None, Some(Target::Player(bob)))
        .unwrap_err();
    assert_eq!(err.illegal_action(), Some(&IllegalAction::InvalidAbilityIndex(1)));

    game.find_permanent_mut(sorcerer).unwrap().summoning_sick = true;
    let err = game
        .activate_ability(alice, 1, None, None, Some(Target::Player(bob)))
        .unwrap_err();
    assert_eq!(err.illegal_action(), Some(&IllegalAction::SummoningSickness));
    game.find_permanent_mut(sorcerer).unwrap().summoning_sick = false;

    let err = game
        .activate_ability(alice, 2, None, None, Some(Target::Permanent(angel)))
        .unwrap_err();
    assert_eq!(err.illegal_action(), Some(&IllegalAction::NotEnoughManaToActivate));

    game.activate_ability(alice, 1, None, None, Some(Target::Player(bob)))
        .unwrap();
    let err = game
        .activate_ability(alice, 1, None, None, Some(Target::Player(bob)))
        .unwrap_err();
    assert_eq!(err.illegal_action(), Some(&IllegalAction::AlreadyTapped));
    game.pass_both().unwrap();
    assert_eq!(game.life(bob), 19);
}
