use proptest::prelude::*;
use slide_2048::config::GameConfig;
use slide_2048::engine::{compress_row, is_valid_tile, merge_row, Board, Move, Tile};
use slide_2048::game::Game;

fn tile() -> impl Strategy<Value = Tile> {
    prop_oneof![3 => Just(0u64), 5 => (1u32..=11).prop_map(|e| 1u64 << e)]
}

fn board(size: usize) -> impl Strategy<Value = Board> {
    prop::collection::vec(tile(), size * size).prop_map(move |cells| Board::from_cells(size, cells).unwrap())
}

/// Boards from 2x2 up to 9x9.
fn any_board() -> impl Strategy<Value = Board> {
    (2usize..=9).prop_flat_map(board)
}

fn any_move() -> impl Strategy<Value = Move> {
    prop::sample::select(Move::ALL.to_vec())
}

proptest! {
    #[test]
    fn shift_keeps_sum_and_powers_of_two(b in any_board(), dir in any_move()) {
        let mut after = b.clone();
        let out = after.shift(dir);
        prop_assert_eq!(after.tile_sum(), b.tile_sum());
        prop_assert!(after.cells().iter().all(|&t| is_valid_tile(t)));
        prop_assert_eq!(out.changed, after != b);
        prop_assert_eq!(out.changed, b.can_move(dir));
    }

    #[test]
    fn unchanged_shift_is_identity(b in any_board(), dir in any_move()) {
        let mut after = b.clone();
        if !after.shift(dir).changed {
            prop_assert_eq!(after, b);
        }
    }

    #[test]
    fn repeated_shift_settles(b in any_board(), dir in any_move()) {
        let mut once = b.clone();
        let first = once.shift(dir);
        let mut twice = once.clone();
        let second = twice.shift(dir);
        if !second.changed {
            prop_assert_eq!(twice, once);
        }
        prop_assert!(first.score % 4 == 0);
    }

    #[test]
    fn left_shift_packs_every_row(b in any_board()) {
        let mut after = b.clone();
        after.shift(Move::Left);
        let n = after.size();
        for row in after.cells().chunks(n) {
            let filled = row.iter().take_while(|&&t| t != 0).count();
            prop_assert!(row[filled..].iter().all(|&t| t == 0));
        }
        for (before, now) in b.cells().chunks(n).zip(after.cells().chunks(n)) {
            prop_assert_eq!(before.iter().sum::<Tile>(), now.iter().sum::<Tile>());
        }
    }

    #[test]
    fn compress_preserves_order(row in prop::collection::vec(tile(), 2..8)) {
        let mut compressed = row.clone();
        compress_row(&mut compressed);
        let expect: Vec<Tile> = row.iter().copied().filter(|&t| t != 0).collect();
        prop_assert_eq!(&compressed[..expect.len()], &expect[..]);
        prop_assert!(compressed[expect.len()..].iter().all(|&t| t == 0));
    }

    #[test]
    fn merge_never_cascades(exp in 1u32..10, len in 2usize..8) {
        let v = 1u64 << exp;
        let mut row = vec![v; len];
        let out = merge_row(&mut row);
        compress_row(&mut row);
        prop_assert_eq!(row.iter().filter(|&&t| t == 2 * v).count(), len / 2);
        prop_assert_eq!(out.score, 2 * v * (len / 2) as u64);
    }

    #[test]
    fn game_moves_add_exactly_one_tile(
        size in 2usize..=7,
        seed in any::<u64>(),
        dirs in prop::collection::vec(any_move(), 1..40),
    ) {
        let mut game = Game::new(&GameConfig { size, seed: Some(seed), ..GameConfig::default() }).unwrap();
        prop_assert_eq!(game.board().size(), size);
        for dir in dirs {
            let before = game.board().clone();
            let out = game.make_move(dir);
            let after = game.board();
            if out.changed {
                let added = after.tile_sum() - before.tile_sum();
                prop_assert!(added == 2 || added == 4);
            } else {
                prop_assert_eq!(after, &before);
            }
        }
    }
}
