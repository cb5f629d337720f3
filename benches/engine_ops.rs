use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use slide_2048::config::GameConfig;
use slide_2048::engine::{Board, Move};
use slide_2048::game::Game;
use slide_2048::policy::{play_out, PreferencePolicy, RandomPolicy};
use std::hint::black_box;

fn corpus() -> Vec<Board> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut boards = Vec::new();
    let mut b = Board::new(4, &mut rng).unwrap();
    boards.push(b.clone());
    // Derive a variety of densities deterministically
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..40 {
        if b.shift(seq[i % seq.len()]).changed {
            b.spawn_tile(&mut rng);
        }
        boards.push(b.clone());
    }
    boards
}

fn bench_shift(c: &mut Criterion) {
    for dir in Move::ALL {
        c.bench_function(&format!("shift/{dir}"), |bch| {
            let boards = corpus();
            bch.iter_batched(
                || boards.clone(),
                |mut boards| {
                    let mut changed = 0u32;
                    for bd in boards.iter_mut() {
                        changed += bd.shift(dir).changed as u32;
                    }
                    black_box(changed)
                },
                BatchSize::SmallInput,
            )
        });
    }
}

fn bench_queries(c: &mut Criterion) {
    let boards = corpus();
    c.bench_function("is_terminal", |bch| {
        bch.iter(|| boards.iter().filter(|b| black_box(b).is_terminal()).count())
    });
    c.bench_function("can_move/all", |bch| {
        bch.iter(|| {
            boards
                .iter()
                .map(|b| Move::ALL.iter().filter(|&&d| black_box(b).can_move(d)).count())
                .sum::<usize>()
        })
    });
}

fn bench_full_game(c: &mut Criterion) {
    c.bench_function("game/preference_policy", |bch| {
        bch.iter_batched(
            || Game::new(&GameConfig { seed: Some(7), ..GameConfig::default() }).unwrap(),
            |mut game| black_box(play_out(&mut game, &mut PreferencePolicy::default(), None)),
            BatchSize::SmallInput,
        )
    });
    c.bench_function("game/random_policy", |bch| {
        bch.iter_batched(
            || Game::new(&GameConfig { seed: Some(7), ..GameConfig::default() }).unwrap(),
            |mut game| {
                let mut policy = RandomPolicy::new(ChaCha8Rng::seed_from_u64(7));
                black_box(play_out(&mut game, &mut policy, None))
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(engine_ops, bench_shift, bench_queries, bench_full_game);
criterion_main!(engine_ops);
