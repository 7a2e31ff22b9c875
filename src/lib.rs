//! Crate root module declarations for the chessbot coordination core.
//!
//! Exposes the board state store, move validation, the turn coordinator,
//! arm command dispatch, persistence, controller registration, configuration
//! and utility helpers so the console binary, benches and tests share stable
//! module paths.

pub mod errors;

pub mod game_state {
    pub mod board_state;
    pub mod chess_rules;
    pub mod chess_types;
    pub mod game_state;
    pub mod game_status;
    pub mod position;
    pub mod zobrist;
}

pub mod moves {
    pub mod chess_move;
    pub mod leaper_attacks;
    pub mod slider_attacks;
}

pub mod move_generation {
    pub mod legal_move_apply;
    pub mod legal_move_checks;
    pub mod legal_move_generator;
    pub mod legal_move_shared;
    pub mod legal_moves_king;
    pub mod legal_moves_knight;
    pub mod legal_moves_pawn;
    pub mod legal_moves_sliding;
    pub mod move_validator;
    pub mod perft;
}

pub mod coordinator {
    pub mod actuation_policy;
    pub mod game_clock;
    pub mod game_session;
    pub mod turn_coordinator;
    pub mod turn_phase;
}

pub mod actuation {
    pub mod actuation_command;
    pub mod actuator;
    pub mod command_dispatcher;
    pub mod simulated_arm;
}

pub mod persistence {
    pub mod snapshot;
}

pub mod controllers {
    pub mod controller_registry;
}

pub mod config {
    pub mod settings;
}

pub mod console {
    pub mod console_top;
}

pub mod utils {
    pub mod algebraic;
    pub mod fen_generator;
    pub mod fen_parser;
    pub mod logging;
    pub mod long_algebraic;
    pub mod pgn;
    pub mod render_game_state;
}
