//! Vibes engine - command-line driver
//!
//! Runs a scripted demonstration game, or replays a JSON list of commands
//! against the same starting board, and prints the game log.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vibes_engine::{
    config::GameConfig,
    core::{
        ActivatedAbility, Card, CardId, CardType, Color, EffectSlot, Keyword, ManaCost, PlayerId,
        Supertype, Target,
    },
    effects::{AddMana, DealXDamageToTarget},
    game::{
        GameState, OutputFormat, OutputMode, PlayerCommand, Step, TargetFilter, VerbosityLevel,
    },
};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "vibes")]
#[command(about = "Vibes - a rules engine for a two-player card game", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file; command-line flags override it
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed for library shuffles
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Verbosity level (0=silent, 1=minimal, 2=normal, 3=verbose)
    #[arg(long, short = 'v', global = true)]
    verbosity: Option<VerbosityLevel>,

    /// Log output format
    #[arg(long, value_enum, global = true)]
    format: Option<FormatArg>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the scripted demonstration game
    Demo,

    /// Replay a JSON array of commands against the demo board
    Commands {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(level) = cli.verbosity {
        config.verbosity = level;
    }
    match cli.format {
        Some(FormatArg::Text) => config.output_format = OutputFormat::Text,
        Some(FormatArg::Json) => config.output_format = OutputFormat::Json,
        None => {}
    }
    config.output_mode = OutputMode::Both;

    let mut game = demo_board(config)?;
    game.start_game()?;

    match cli.command {
        Commands::Demo => run_demo(&mut game)?,
        Commands::Commands { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let commands: Vec<PlayerCommand> =
                serde_json::from_str(&text).context("parsing command list")?;
            replay(&mut game, commands);
        }
    }

    if let Some(winner) = game.get_winner() {
        println!("Winner: {}", game.player_name(winner));
    }
    Ok(())
}

/// Alice has lands, an angel and a rod that deals X damage; Bob has a bear
fn demo_board(config: GameConfig) -> vibes_engine::Result<GameState> {
    let mut game = GameState::with_config("Alice", "Bob", config);
    let alice = PlayerId::new(0);
    let bob = PlayerId::new(1);

    for _ in 0..3 {
        let plains = game.create_card(|id| basic_land(id, "Plains", alice, Color::White));
        game.put_onto_battlefield(plains)?;
    }
    for _ in 0..2 {
        let forest = game.create_card(|id| basic_land(id, "Forest", alice, Color::Green));
        game.put_onto_battlefield(forest)?;
    }
    let rod_ability = ActivatedAbility::new("{X}{W}")?
        .targeting(TargetFilter::Creature)
        .with_effect(DealXDamageToTarget);
    let rod = game.create_card(|id| {
        Card::new(id, "Crackling Rod", alice)
            .with_type(CardType::Artifact)
            .with_ability(rod_ability)
    });
    game.put_onto_battlefield(rod)?;
    let angel = game.create_card(|id| {
        Card::new(id, "Serra Angel", alice)
            .with_color(Color::White)
            .creature(4, 4)
            .with_keyword(Keyword::Flying)
            .with_keyword(Keyword::Vigilance)
    });
    game.put_onto_battlefield(angel)?;

    let forest = game.create_card(|id| basic_land(id, "Forest", alice, Color::Green));
    game.put_in_hand(forest)?;
    let bears_cost = ManaCost::parse("{1}{G}")?;
    let bears = game.create_card(|id| {
        let mut card = Card::new(id, "Grizzly Bears", alice)
            .with_color(Color::Green)
            .creature(2, 2);
        card.mana_cost = bears_cost;
        card
    });
    game.put_in_hand(bears)?;

    let their_bears = game.create_card(|id| {
        Card::new(id, "Grizzly Bears", bob)
            .with_color(Color::Green)
            .creature(2, 2)
    });
    game.put_onto_battlefield(their_bears)?;
    for _ in 0..5 {
        let forest = game.create_card(|id| basic_land(id, "Forest", bob, Color::Green));
        game.put_in_library(forest)?;
    }
    game.shuffle_library(bob)?;

    Ok(game)
}

fn basic_land(id: CardId, name: &str, owner: PlayerId, color: Color) -> Card {
    Card::new(id, name, owner)
        .with_supertype(Supertype::Basic)
        .with_type(CardType::Land)
        .with_effect(EffectSlot::OnTap, AddMana::new(color, 1))
}

fn run_demo(game: &mut GameState) -> anyhow::Result<()> {
    let alice = PlayerId::new(0);
    let bob = PlayerId::new(1);

    game.pass_until_step(Step::PrecombatMain)?;
    game.play_land(alice, 0)?;

    // {X}{W} with X=2 at Bob's bear
    for plains in 0..3 {
        game.tap_for_mana(alice, plains)?;
    }
    let target = game
        .battlefield(bob)
        .first()
        .map(|p| Target::Permanent(p.id))
        .context("Bob has no creature")?;
    game.activate_ability(alice, 5, None, Some(2), Some(target))?;
    game.pass_both()?;

    game.tap_for_mana(alice, 3)?;
    game.tap_for_mana(alice, 4)?;
    game.cast_spell(alice, 0, None, None)?;
    game.pass_both()?;

    game.pass_until_step(Step::DeclareAttackers)?;
    if !game.awaiting_input() {
        bail!("expected to be asked for attackers");
    }
    let angel = game
        .battlefield(alice)
        .iter()
        .position(|p| game.card_name(p.card) == "Serra Angel")
        .context("Serra Angel is missing")?;
    game.declare_attackers(alice, &[angel])?;
    game.pass_until_step(Step::EndCombat)?;
    game.pass_until_step(Step::Upkeep)?;
    Ok(())
}

fn replay(game: &mut GameState, commands: Vec<PlayerCommand>) {
    for PlayerCommand { player, command } in commands {
        if let Err(err) = game.apply_command(player, command.clone()) {
            match err.category() {
                Some(category) => println!("Rejected {command:?}: {err} ({category:?})"),
                None => println!("Failed {command:?}: {err}"),
            }
        }
        if game.is_game_over() {
            break;
        }
    }
}
