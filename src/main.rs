use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use slide_2048::config::GameConfig;
use slide_2048::engine::Move;
use slide_2048::game::Game;
use slide_2048::policy::{Policy, PreferencePolicy, RandomPolicy};
use slide_2048::trace::{self, Run};

#[derive(Parser, Debug)]
#[command(name = "slide-2048", version, about = "Play, script and replay 2048 games")]
struct Cli {
    /// Optional TOML file with game settings
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    /// Board side length (overrides the config file)
    #[arg(long, global = true)]
    size: Option<usize>,
    /// Seed for the game (overrides the config file)
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Let a policy play until game over
    Play {
        #[arg(long, value_enum, default_value_t = PolicyKind::Preference)]
        policy: PolicyKind,
        /// Stop after this many moves
        #[arg(long)]
        max_moves: Option<u64>,
        /// Only print the final board
        #[arg(long)]
        quiet: bool,
        /// Write a trace of the game to this path
        #[arg(long, value_name = "FILE")]
        trace_out: Option<PathBuf>,
    },
    /// Apply a scripted sequence of w/a/s/d keys
    Keys {
        /// Keys to apply, e.g. "wasdd"
        keys: String,
    },
    /// Verify a recorded trace and print its final board
    Replay {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PolicyKind {
    Random,
    Preference,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => GameConfig::from_toml(path)?,
        None => GameConfig::default(),
    };
    if let Some(size) = cli.size {
        config.size = size;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    match cli.cmd {
        Command::Play { policy, max_moves, quiet, trace_out } => {
            play(&config, policy, max_moves, quiet, trace_out)
        }
        Command::Keys { keys } => run_keys(&config, &keys),
        Command::Replay { path } => {
            let run = trace::parse_run_file(&path)?;
            let game = trace::replay(&run)?;
            println!("{}", game.board());
            println!(
                "Replay ok: seed {}, moves {}, score {}, highest tile {}",
                run.meta.seed,
                run.meta.steps,
                game.score(),
                game.highest_tile()
            );
            Ok(())
        }
    }
}

fn play(
    config: &GameConfig,
    kind: PolicyKind,
    max_moves: Option<u64>,
    quiet: bool,
    trace_out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let start_wall = trace::now_unix_seconds();
    let mut game = Game::new(config)?;
    let mut policy: Box<dyn Policy> = match kind {
        PolicyKind::Random => Box::new(RandomPolicy::new(ChaCha8Rng::seed_from_u64(game.seed()))),
        PolicyKind::Preference => Box::new(PreferencePolicy::default()),
    };
    if !quiet {
        println!("{}", game.board());
    }
    let mut move_count = 0u64;
    while !game.is_terminal() {
        if max_moves.is_some_and(|cap| move_count >= cap) {
            break;
        }
        let Some(dir) = policy.choose(game.board()) else { break };
        if !game.make_move(dir).changed {
            log::debug!("policy chose {dir}, which left the board unchanged");
            break;
        }
        move_count += 1;
        if !quiet {
            println!("{}\n{}", dir, game.board());
        }
    }
    if quiet {
        println!("{}", game.board());
    }
    if game.is_terminal() {
        println!("Game over!");
    }
    println!(
        "Seed: {}, moves: {}, score: {}, highest tile: {}",
        game.seed(),
        move_count,
        game.score(),
        game.highest_tile()
    );
    if let Some(path) = trace_out {
        let run = Run::from_game(&game, start_wall, start.elapsed().as_secs_f32())?;
        trace::write_run_to_path(&path, &run)?;
        println!("Trace written to {}", path.display());
    }
    Ok(())
}

fn run_keys(config: &GameConfig, keys: &str) -> anyhow::Result<()> {
    // Reject the whole script before touching the game.
    let moves = Move::parse_keys(keys)?;
    let mut game = Game::new(config)?;
    println!("{}", game.board());
    for dir in moves {
        if game.make_move(dir).changed {
            println!("{}\n{}", dir, game.board());
        }
        if game.is_terminal() {
            println!("Game over!");
            break;
        }
    }
    println!("Seed: {}, score: {}", game.seed(), game.score());
    Ok(())
}
