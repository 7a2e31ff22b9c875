use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chessbot::game_state::board_state::BoardState;
use chessbot::game_state::game_state::GameState;
use chessbot::move_generation::legal_move_generator::legal_moves;
use chessbot::move_generation::move_validator::validate;
use chessbot::move_generation::perft::perft;
use chessbot::moves::chess_move::Move;

#[derive(Clone, Copy)]
struct BenchCase {
    name: &'static str,
    fen: &'static str,
    expected_nodes: &'static [u64],
}

const CASES: &[BenchCase] = &[
    BenchCase {
        name: "start",
        fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        expected_nodes: &[20, 400, 8902],
    },
    BenchCase {
        name: "kiwipete",
        fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        expected_nodes: &[48, 2039],
    },
    BenchCase {
        name: "endgame",
        fen: "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        expected_nodes: &[14, 191, 2812],
    },
];

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(4));
    group.sample_size(20);

    for case in CASES {
        let board = BoardState::from_fen(case.fen).expect("benchmark FEN should parse");

        for (depth_idx, expected_nodes) in case.expected_nodes.iter().enumerate() {
            let depth = (depth_idx + 1) as u8;

            // Correctness guard before benchmarking.
            assert_eq!(
                perft(&board, depth).nodes,
                *expected_nodes,
                "node mismatch for {} depth {}",
                case.name,
                depth
            );

            group.throughput(Throughput::Elements(*expected_nodes));
            group.bench_with_input(
                BenchmarkId::from_parameter(format!("{}_d{}", case.name, depth)),
                expected_nodes,
                |b, expected| {
                    b.iter(|| {
                        let counts = perft(black_box(&board), black_box(depth));
                        assert_eq!(counts.nodes, *expected);
                        black_box(counts.nodes)
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    for case in CASES {
        let game = GameState::from_fen(case.fen).expect("benchmark FEN should parse");
        let side = game.side_to_move();
        let candidates: Vec<Move> = legal_moves(&game).iter().map(|legal| legal.mv()).collect();

        group.throughput(Throughput::Elements(candidates.len() as u64));
        group.bench_function(BenchmarkId::new("all_legal", case.name), |b| {
            b.iter(|| {
                for &mv in &candidates {
                    black_box(validate(black_box(&game), side, mv).is_ok());
                }
            });
        });

        // Every from/to pair, most of them illegal.
        let grid: Vec<Move> = (0..64u8)
            .flat_map(|from| (0..64u8).map(move |to| Move::new(from, to)))
            .collect();
        group.throughput(Throughput::Elements(grid.len() as u64));
        group.bench_function(BenchmarkId::new("square_grid", case.name), |b| {
            b.iter(|| {
                let accepted = grid
                    .iter()
                    .filter(|&&mv| validate(black_box(&game), side, mv).is_ok())
                    .count();
                black_box(accepted)
            });
        });
    }

    group.finish();
}

criterion_group!(validation_benches, bench_perft, bench_validate);
criterion_main!(validation_benches);
