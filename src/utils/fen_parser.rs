//! FEN-to-BoardState parser.
//!
//! Board text arrives from operators, the console and persisted snapshots, so
//! every field is checked and reported with a `ParseError::Fen` that names the
//! offending field. Four-field FEN (without clocks) is accepted with the
//! clocks defaulting to `0 1`.

use crate::errors::ParseError;
use crate::game_state::chess_types::*;
use crate::utils::algebraic::algebraic_to_square;

fn fen_error(message: impl Into<String>) -> ParseError {
    ParseError::Fen(message.into())
}

pub fn parse_fen(fen: &str) -> Result<BoardState, ParseError> {
    let mut parts = fen.split_whitespace();

    let board_part = parts.next().ok_or_else(|| fen_error("missing board layout"))?;
    let side_part = parts.next().ok_or_else(|| fen_error("missing side to move"))?;
    let castling_part = parts.next().ok_or_else(|| fen_error("missing castling rights"))?;
    let en_passant_part = parts.next().ok_or_else(|| fen_error("missing en-passant square"))?;
    let halfmove_part = parts.next().unwrap_or("0");
    let fullmove_part = parts.next().unwrap_or("1");

    if parts.next().is_some() {
        return Err(fen_error("extra trailing fields"));
    }

    let side_to_move = parse_side_to_move(side_part)?;
    let en_passant_square = parse_en_passant_square(en_passant_part, side_to_move)?;
    let halfmove_clock = halfmove_part
        .parse::<u16>()
        .map_err(|_| fen_error(format!("invalid halfmove clock '{halfmove_part}'")))?;
    let fullmove_number = fullmove_part
        .parse::<u16>()
        .map_err(|_| fen_error(format!("invalid fullmove number '{fullmove_part}'")))?
        .max(1);

    Ok(BoardState {
        position: parse_placement_field(board_part)?,
        side_to_move,
        castling_rights: parse_castling_rights(castling_part)?,
        en_passant_square,
        halfmove_clock,
        fullmove_number,
    })
}

pub fn parse_placement_field(board_part: &str) -> Result<Position, ParseError> {
    let ranks: Vec<&str> = board_part.split('/').collect();
    if ranks.len() != 8 {
        return Err(fen_error("board layout must contain 8 ranks"));
    }

    let mut position = Position::empty();
    for (fen_rank_idx, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - fen_rank_idx as u8;
        let mut file = 0u8;

        for ch in rank_str.chars() {
            if let Some(empty_count) = ch.to_digit(10) {
                if !(1..=8).contains(&empty_count) {
                    return Err(fen_error(format!("invalid empty-square count '{ch}'")));
                }
                file += empty_count as u8;
            } else {
                let piece = Piece::from_fen_char(ch)
                    .ok_or_else(|| fen_error(format!("invalid piece character '{ch}'")))?;
                if file >= 8 {
                    return Err(fen_error(format!("rank {} has too many files", rank + 1)));
                }
                position.set(square_at(file, rank), Some(piece));
                file += 1;
            }

            if file > 8 {
                return Err(fen_error(format!("rank {} has too many files", rank + 1)));
            }
        }

        if file != 8 {
            return Err(fen_error(format!("rank {} does not sum to 8 files", rank + 1)));
        }
    }

    Ok(position)
}

fn parse_side_to_move(side_part: &str) -> Result<Color, ParseError> {
    match side_part {
        "w" => Ok(Color::Light),
        "b" => Ok(Color::Dark),
        _ => Err(fen_error(format!("invalid side to move '{side_part}'"))),
    }
}

fn parse_castling_rights(castling_part: &str) -> Result<CastlingRights, ParseError> {
    let mut rights = CastlingRights::NONE;
    if castling_part == "-" {
        return Ok(rights);
    }

    for ch in castling_part.chars() {
        match ch {
            'K' => rights.light_kingside = true,
            'Q' => rights.light_queenside = true,
            'k' => rights.dark_kingside = true,
            'q' => rights.dark_queenside = true,
            _ => return Err(fen_error(format!("invalid castling character '{ch}'"))),
        }
    }

    Ok(rights)
}

/// The target must sit on the rank a double push by the opponent passes over.
fn parse_en_passant_square(en_passant_part: &str, side_to_move: Color) -> Result<Option<Square>, ParseError> {
    if en_passant_part == "-" {
        return Ok(None);
    }

    let square = algebraic_to_square(en_passant_part)
        .map_err(|_| fen_error(format!("invalid en-passant square '{en_passant_part}'")))?;
    let expected_rank = match side_to_move {
        Color::Light => 5,
        Color::Dark => 2,
    };
    if rank_of(square) != expected_rank {
        return Err(fen_error(format!(
            "en-passant square '{en_passant_part}' is not on the expected rank"
        )));
    }

    Ok(Some(square))
}

#[cfg(test)]
mod tests {
    use super::parse_fen;
    use crate::errors::ParseError;
    use crate::game_state::chess_rules::STARTING_POSITION_FEN;
    use crate::game_state::chess_types::{CastlingRights, Color, Piece, PieceKind};

    #[test]
    fn parses_starting_position() {
        let board = parse_fen(STARTING_POSITION_FEN).expect("starting FEN should parse");
        assert_eq!(board.side_to_move, Color::Light);
        assert_eq!(board.castling_rights, CastlingRights::ALL);
        assert_eq!(board.fullmove_number, 1);
        assert_eq!(board.halfmove_clock, 0);
        assert_eq!(board.position.piece_at(4), Some(Piece::new(Color::Light, PieceKind::King)));
        assert_eq!(board.position.piece_at(59), Some(Piece::new(Color::Dark, PieceKind::Queen)));
    }

    #[test]
    fn clocks_are_optional() {
        let board = parse_fen("4k3/8/8/8/8/8/8/4K3 b - -").expect("four-field FEN should parse");
        assert_eq!(board.side_to_move, Color::Dark);
        assert_eq!((board.halfmove_clock, board.fullmove_number), (0, 1));
    }

    #[test]
    fn rejects_malformed_fields() {
        let bad = [
            "",
            "8/8/8/8/8/8/8 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K4 w - - 0 1",
            "4k3/8/8/8/8/8/8/4X3 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K3 x - - 0 1",
            "4k3/8/8/8/8/8/8/4K3 w KX - 0 1",
            "4k3/8/8/8/8/8/8/4K3 w - e4 0 1",
            "4k3/8/8/8/8/8/8/4K3 w - - x 1",
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1 extra",
        ];
        for fen in bad {
            assert!(
                matches!(parse_fen(fen), Err(ParseError::Fen(_))),
                "'{fen}' should be rejected"
            );
        }
    }
}
