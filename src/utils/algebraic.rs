//! Square conversions for algebraic coordinates.
//!
//! Converts between human-readable coordinates (e.g., `e4`) and internal
//! square indices reused by FEN, LAN, PGN and the arm command log.

use crate::errors::ParseError;
use crate::game_state::chess_types::{file_of, rank_of, square_at, Square};

/// Convert algebraic notation (for example: "e4") to a square index.
#[inline]
pub fn algebraic_to_square(square: &str) -> Result<Square, ParseError> {
    let bytes = square.as_bytes();
    if bytes.len() != 2 {
        return Err(ParseError::Square(square.to_owned()));
    }

    let file = bytes[0].to_ascii_lowercase();
    let rank = bytes[1];

    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return Err(ParseError::Square(square.to_owned()));
    }

    Ok(square_at(file - b'a', rank - b'1'))
}

/// Convert a square index (`0..=63`) to algebraic notation (for example: "e4").
#[inline]
pub fn square_to_algebraic(square: Square) -> Result<String, ParseError> {
    if square > 63 {
        return Err(ParseError::Square(square.to_string()));
    }
    Ok(square_name(square))
}

/// Algebraic name of an in-range square. Out-of-range indices wrap.
pub fn square_name(square: Square) -> String {
    let square = square & 63;
    let file_char = char::from(b'a' + file_of(square));
    let rank_char = char::from(b'1' + rank_of(square));
    format!("{file_char}{rank_char}")
}

#[cfg(test)]
mod tests {
    use super::{algebraic_to_square, square_name, square_to_algebraic};

    #[test]
    fn round_trip_square_conversions() {
        assert_eq!(algebraic_to_square("a1").expect("a1 should parse"), 0);
        assert_eq!(algebraic_to_square("h8").expect("h8 should parse"), 63);
        assert_eq!(algebraic_to_square("E4").expect("upper-case file should parse"), 28);
        assert_eq!(square_to_algebraic(0).expect("0 should convert"), "a1");
        assert_eq!(square_name(63), "h8");
    }

    #[test]
    fn rejects_off_board_coordinates() {
        assert!(algebraic_to_square("i1").is_err());
        assert!(algebraic_to_square("a9").is_err());
        assert!(algebraic_to_square("a").is_err());
        assert!(square_to_algebraic(64).is_err());
    }
}
