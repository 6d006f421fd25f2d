//! Driving a game from a JSON command list

use vibes_engine::core::{Card, CardType, Color, EffectSlot, PlayerId};
use vibes_engine::effects::AddMana;
use vibes_engine::game::{BlockerAssignment, Command, GameState, PlayerCommand, Step};
use vibes_engine::{ErrorCategory, IllegalAction};

fn board() -> GameState {
    let mut game = GameState::new_two_player("Alice", "Bob", 20);
    let alice = PlayerId::new(0);
    let bob = PlayerId::new(1);
    for _ in 0..2 {
        let forest = game.create_card(|id| {
            Card::new(id, "Forest", alice)
                .with_type(CardType::Land)
                .with_effect(EffectSlot::OnTap, AddMana::new(Color::Green, 1))
        });
        game.put_onto_battlefield(forest).unwrap();
    }
    let bears = game.create_card(|id| {
        Card::new(id, "Grizzly Bears", alice)
            .with_cost("{1}{G}")
            .unwrap()
            .creature(2, 2)
    });
    game.put_in_hand(bears).unwrap();
    let wall = game.create_card(|id| Card::new(id, "Wall of Wood", bob).creature(0, 3));
    game.put_onto_battlefield(wall).unwrap();
    game
}

fn run(game: &mut GameState, json: &str) -> Vec<Option<ErrorCategory>> {
    let commands: Vec<PlayerCommand> = serde_json::from_str(json).unwrap();
    commands
        .into_iter()
        .map(|PlayerCommand { player, command }| {
            game.apply_command(player, command)
                .err()
                .map(|err| err.category().unwrap())
        })
        .filter(Option::is_some)
        .collect()
}

#[test]
fn test_scripted_main_phase() {
    let mut game = board();
    game.start_game().unwrap();
    game.pass_until_step(Step::PrecombatMain).unwrap();

    let rejected = run(
        &mut game,
        r#"[
            {"player": 0, "type": "cast_spell", "hand_index": 0},
            {"player": 0, "type": "tap_for_mana", "permanent_index": 0},
            {"player": 0, "type": "tap_for_mana", "permanent_index": 1},
            {"player": 1, "type": "pass_priority"},
            {"player": 0, "type": "cast_spell", "hand_index": 0},
            {"player": 0, "type": "pass_priority"},
            {"player": 1, "type": "pass_priority"}
        ]"#,
    );

    assert_eq!(
        rejected,
        vec![Some(ErrorCategory::Cost), Some(ErrorCategory::Protocol)]
    );
    let alice = PlayerId::new(0);
    assert_eq!(game.battlefield(alice).len(), 3);
    assert!(game.battlefield(alice)[2].summoning_sick);
    assert!(game
        .logger
        .contains("Grizzly Bears enters the battlefield under Alice's control."));
}

#[test]
fn test_scripted_combat() {
    let mut game = board();
    let alice = PlayerId::new(0);
    let bob = PlayerId::new(1);
    let bear = game.create_card(|id| Card::new(id, "Runeclaw Bear", alice).creature(2, 2));
    game.put_onto_battlefield(bear).unwrap();
    game.start_game().unwrap();
    game.pass_until_step(Step::BeginCombat).unwrap();

    let rejected = run(
        &mut game,
        r#"[
            {"player": 0, "type": "pass_priority"},
            {"player": 1, "type": "pass_priority"},
            {"player": 0, "type": "declare_attackers", "attackers": [0]},
            {"player": 0, "type": "declare_attackers", "attackers": [2]},
            {"player": 0, "type": "pass_priority"},
            {"player": 1, "type": "pass_priority"},
            {"player": 1, "type": "declare_blockers", "blockers": [{"blocker_index": 0, "attacker_index": 2}]},
            {"player": 0, "type": "pass_priority"},
            {"player": 1, "type": "pass_priority"}
        ]"#,
    );

    assert_eq!(rejected, vec![Some(ErrorCategory::Targeting)]);
    assert_eq!(game.turn.current_step, Step::CombatDamage);
    assert_eq!(game.life(bob), 20);
    let wall = &game.battlefield(bob)[0];
    assert_eq!(wall.damage_marked, 2);
}

#[test]
fn test_respond_command_shape() {
    let json = r#"{"player": 0, "type": "respond", "response": {"CardIndex": 3}}"#;
    let parsed: PlayerCommand = serde_json::from_str(json).unwrap();
    assert_eq!(parsed.player, PlayerId::new(0));
    assert!(matches!(parsed.command, Command::Respond { .. }));

    let declare = Command::DeclareBlockers {
        blockers: vec![BlockerAssignment::new(1, 0)],
    };
    let json = serde_json::to_value(&declare).unwrap();
    assert_eq!(json["type"], "declare_blockers");
    assert_eq!(json["blockers"][0]["blocker_index"], 1);

    let mut game = board();
    let err = game
        .apply_command(PlayerId::new(0), parsed.command)
        .unwrap_err();
    assert!(matches!(
        err.illegal_action(),
        Some(IllegalAction::NotAwaiting(_))
    ));
}
