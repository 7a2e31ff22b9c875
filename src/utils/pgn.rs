//! PGN export and import of game records.
//!
//! Movetext is written in long algebraic notation so a record can be replayed
//! through the validator without a SAN resolver.

use std::collections::BTreeMap;

use crate::errors::{ParseError, ReplayError};
use crate::game_state::chess_rules::STARTING_POSITION_FEN;
use crate::game_state::game_state::GameState;
use crate::game_state::game_status::GameResult;
use crate::utils::long_algebraic::parse_move_text;

#[derive(Debug, Clone)]
pub struct PgnGame {
    pub headers: BTreeMap<String, String>,
    pub game: GameState,
    pub result: String,
}

pub fn write_pgn(game: &GameState, result: Option<GameResult>) -> String {
    let result_text = result.map(GameResult::pgn_result).unwrap_or("*");
    let date = game
        .history()
        .first()
        .map(|entry| entry.played_at.format("%Y.%m.%d").to_string())
        .unwrap_or_else(|| "????.??.??".to_owned());

    let mut headers = BTreeMap::<String, String>::new();
    headers.insert("Event".to_owned(), "Assisted Chess Game".to_owned());
    headers.insert("Site".to_owned(), "Local".to_owned());
    headers.insert("Date".to_owned(), date);
    headers.insert("Round".to_owned(), "-".to_owned());
    headers.insert("White".to_owned(), "White".to_owned());
    headers.insert("Black".to_owned(), "Black".to_owned());
    headers.insert("Result".to_owned(), result_text.to_owned());
    if game.initial_fen() != STARTING_POSITION_FEN {
        headers.insert("SetUp".to_owned(), "1".to_owned());
        headers.insert("FEN".to_owned(), game.initial_fen().to_owned());
    }

    let mut out = String::new();
    for (key, value) in &headers {
        out.push_str(&format!("[{} \"{}\"]\n", key, value.replace('"', "\\\"")));
    }
    out.push('\n');

    // Move numbers continue from the initial FEN, which may start with black.
    let initial_fen = game.initial_fen();
    let first_is_dark = initial_fen.split_whitespace().nth(1) == Some("b");
    let first_number: usize = initial_fen
        .split_whitespace()
        .nth(5)
        .and_then(|field| field.parse().ok())
        .unwrap_or(1);

    let mut parts = Vec::<String>::with_capacity(game.history().len() + 2);
    for (ply, entry) in game.history().iter().enumerate() {
        let offset = ply + usize::from(first_is_dark);
        let number = first_number + offset / 2;
        if offset % 2 == 0 {
            parts.push(format!("{number}. {}", entry.lan));
        } else if ply == 0 {
            parts.push(format!("{number}... {}", entry.lan));
        } else {
            parts.push(entry.lan.clone());
        }
    }
    parts.push(result_text.to_owned());
    out.push_str(&parts.join(" "));
    out.push('\n');
    out
}

pub fn read_pgn(pgn: &str) -> Result<PgnGame, ParseError> {
    let mut headers = BTreeMap::<String, String>::new();
    let mut movetext_lines = Vec::<&str>::new();

    for line in pgn.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('[') {
            let (key, value) = parse_header_line(trimmed)?;
            headers.insert(key, value);
        } else {
            movetext_lines.push(trimmed);
        }
    }

    let initial_fen = match headers.get("SetUp").map(String::as_str) {
        Some("1") => headers
            .get("FEN")
            .cloned()
            .ok_or_else(|| ParseError::Pgn("SetUp is 1 but the FEN header is missing".to_owned()))?,
        _ => STARTING_POSITION_FEN.to_owned(),
    };

    let start_side = GameState::from_fen(&initial_fen)?.side_to_move();
    let mut result = "*".to_owned();
    let mut moves = Vec::new();

    let movetext = strip_comments_and_variations(&movetext_lines.join(" "));
    for token in movetext.split_whitespace() {
        if is_move_number_token(token) {
            continue;
        }
        let cleaned = token.trim_end_matches(|c: char| matches!(c, '+' | '#' | '!' | '?'));
        if is_result_token(cleaned) {
            result = cleaned.to_owned();
            break;
        }
        // Castling text needs the mover's color.
        let side = if moves.len() % 2 == 0 {
            start_side
        } else {
            start_side.opposite()
        };
        moves.push(parse_move_text(cleaned, side)?);
    }

    let game = GameState::replay(&initial_fen, &moves).map_err(|err| match err {
        ReplayError::Fen(parse) => parse,
        other => ParseError::Pgn(other.to_string()),
    })?;

    if let Some(header_result) = headers.get("Result").filter(|value| is_result_token(value)) {
        result = header_result.clone();
    }

    Ok(PgnGame { headers, game, result })
}

fn parse_header_line(line: &str) -> Result<(String, String), ParseError> {
    let invalid = || ParseError::Pgn(format!("invalid header line: {line}"));

    let inner = line
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(invalid)?;
    let (key, value_raw) = inner.split_once(' ').ok_or_else(invalid)?;
    let value = value_raw
        .trim()
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(invalid)?;

    Ok((key.trim().to_owned(), value.replace("\\\"", "\"")))
}

fn strip_comments_and_variations(text: &str) -> String {
    let mut out = String::new();
    let mut brace_depth = 0usize;
    let mut paren_depth = 0usize;

    for ch in text.chars() {
        match ch {
            '{' => brace_depth += 1,
            '}' => brace_depth = brace_depth.saturating_sub(1),
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            _ if brace_depth == 0 && paren_depth == 0 => out.push(ch),
            _ => {}
        }
    }

    out
}

fn is_move_number_token(token: &str) -> bool {
    let digits = token.trim_end_matches('.');
    digits.len() < token.len() && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_result_token(token: &str) -> bool {
    matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*")
}
