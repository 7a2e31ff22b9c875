//! Terminal board renderer for the operator console and test diagnostics.

use crate::game_state::chess_types::*;

/// Render the board to a Unicode string, rank 8 at the top.
pub fn render_position(position: &Position) -> String {
    let mut out = String::new();
    out.push_str("  a b c d e f g h\n");

    for rank in (0..8u8).rev() {
        let label = char::from(b'1' + rank);
        out.push(label);
        out.push(' ');

        let cells: Vec<String> = (0..8u8)
            .map(|file| match position.piece_at(square_at(file, rank)) {
                Some(piece) => piece_to_unicode(piece).to_string(),
                None => '·'.to_string(),
            })
            .collect();
        out.push_str(&cells.join(" "));

        out.push(' ');
        out.push(label);
        out.push('\n');
    }

    out.push_str("  a b c d e f g h");
    out
}

fn piece_to_unicode(piece: Piece) -> char {
    match (piece.color, piece.kind) {
        (Color::Light, PieceKind::Pawn) => '♙',
        (Color::Light, PieceKind::Knight) => '♘',
        (Color::Light, PieceKind::Bishop) => '♗',
        (Color::Light, PieceKind::Rook) => '♖',
        (Color::Light, PieceKind::Queen) => '♕',
        (Color::Light, PieceKind::King) => '♔',
        (Color::Dark, PieceKind::Pawn) => '♟',
        (Color::Dark, PieceKind::Knight) => '♞',
        (Color::Dark, PieceKind::Bishop) => '♝',
        (Color::Dark, PieceKind::Rook) => '♜',
        (Color::Dark, PieceKind::Queen) => '♛',
        (Color::Dark, PieceKind::King) => '♚',
    }
}
