use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;

use slide_2048::config::GameConfig;
use slide_2048::engine::{Score, Tile};
use slide_2048::game::{Game, SpawnStats};
use slide_2048::policy::{play_out, RandomPolicy};
use slide_2048::trace::{self, Run};

#[derive(Parser, Debug)]
#[command(name = "simulate", version, about = "Play many random 2048 games in parallel and summarize them")]
struct Args {
    /// Number of games to play
    #[arg(short = 'n', long, default_value_t = 1000)]
    games: u64,
    /// Seed of the first game; game i uses base_seed + i
    #[arg(long, default_value_t = 0)]
    base_seed: u64,
    /// Optional TOML file with game settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Worker threads (defaults to all cores)
    #[arg(long)]
    threads: Option<usize>,
    /// Write the JSON summary here instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    out: Option<PathBuf>,
    /// Directory to store a trace of every game
    #[arg(long, value_name = "DIR")]
    trace_dir: Option<PathBuf>,
    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

struct GameResult {
    score: Score,
    highest_tile: Tile,
    moves: u64,
    spawns: SpawnStats,
}

#[derive(Debug, Serialize)]
struct Summary {
    games: u64,
    size: usize,
    mean_score: f64,
    max_score: Score,
    mean_moves: f64,
    highest_tiles: BTreeMap<Tile, u64>,
    spawned_twos: u64,
    spawned_fours: u64,
    four_fraction: f64,
    elapsed_s: f64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => GameConfig::from_toml(path)?,
        None => GameConfig::default(),
    };
    config.validate()?;
    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new().num_threads(n).build_global()?;
    }
    if let Some(dir) = &args.trace_dir {
        fs::create_dir_all(dir)?;
    }

    let pb = if args.quiet { ProgressBar::hidden() } else { ProgressBar::new(args.games) };
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} games ({eta})")?
            .progress_chars("=>-"),
    );

    let start = Instant::now();
    let results: Vec<GameResult> = (0..args.games)
        .into_par_iter()
        .map(|i| {
            let r = play_one(&config, args.base_seed.wrapping_add(i), args.trace_dir.as_ref());
            pb.inc(1);
            r
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    pb.finish_and_clear();

    let summary = summarize(&results, config.size, start.elapsed().as_secs_f64());
    let json = serde_json::to_string_pretty(&summary)?;
    match &args.out {
        Some(path) => fs::write(path, json)?,
        None => println!("{}", json),
    }
    Ok(())
}

fn play_one(config: &GameConfig, seed: u64, trace_dir: Option<&PathBuf>) -> anyhow::Result<GameResult> {
    let start = Instant::now();
    let start_wall = trace::now_unix_seconds();
    let mut game = Game::new(&GameConfig { seed: Some(seed), ..config.clone() })?;
    // Offset so the policy stream differs from the spawn stream.
    let mut policy = RandomPolicy::new(ChaCha8Rng::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15));
    let moves = play_out(&mut game, &mut policy, None);
    if let Some(dir) = trace_dir {
        let run = Run::from_game(&game, start_wall, start.elapsed().as_secs_f32())?;
        trace::write_run_to_path(dir.join(format!("game-{seed}.s2r")), &run)?;
    }
    Ok(GameResult { score: game.score(), highest_tile: game.highest_tile(), moves, spawns: game.spawns() })
}

fn summarize(results: &[GameResult], size: usize, elapsed_s: f64) -> Summary {
    let games = results.len() as u64;
    let denom = games.max(1) as f64;
    let mut highest_tiles = BTreeMap::new();
    let mut spawns = SpawnStats::default();
    for r in results {
        *highest_tiles.entry(r.highest_tile).or_insert(0) += 1;
        spawns.twos += r.spawns.twos;
        spawns.fours += r.spawns.fours;
    }
    Summary {
        games,
        size,
        mean_score: results.iter().map(|r| r.score as f64).sum::<f64>() / denom,
        max_score: results.iter().map(|r| r.score).max().unwrap_or(0),
        mean_moves: results.iter().map(|r| r.moves as f64).sum::<f64>() / denom,
        highest_tiles,
        spawned_twos: spawns.twos,
        spawned_fours: spawns.fours,
        four_fraction: spawns.fours as f64 / spawns.total().max(1) as f64,
        elapsed_s,
    }
}
