use crate::game_state::chess_types::*;
use crate::utils::algebraic::square_name;

pub fn generate_fen(board: &BoardState) -> String {
    let en_passant = board
        .en_passant_square
        .map(square_name)
        .unwrap_or_else(|| "-".to_owned());

    format!(
        "{} {} {} {} {} {}",
        generate_placement_field(&board.position),
        board.side_to_move.fen_char(),
        generate_castling_field(board.castling_rights),
        en_passant,
        board.halfmove_clock,
        board.fullmove_number
    )
}

pub fn generate_placement_field(position: &Position) -> String {
    let mut out = String::with_capacity(72);

    for rank in (0..8u8).rev() {
        let mut empty_count = 0u8;

        for file in 0..8u8 {
            match position.piece_at(square_at(file, rank)) {
                Some(piece) => {
                    if empty_count > 0 {
                        out.push(char::from(b'0' + empty_count));
                        empty_count = 0;
                    }
                    out.push(piece.fen_char());
                }
                None => empty_count += 1,
            }
        }

        if empty_count > 0 {
            out.push(char::from(b'0' + empty_count));
        }
        if rank > 0 {
            out.push('/');
        }
    }

    out
}

fn generate_castling_field(rights: CastlingRights) -> String {
    let flags = [
        (rights.light_kingside, 'K'),
        (rights.light_queenside, 'Q'),
        (rights.dark_kingside, 'k'),
        (rights.dark_queenside, 'q'),
    ];
    let out: String = flags
        .into_iter()
        .filter_map(|(held, ch)| held.then_some(ch))
        .collect();

    if out.is_empty() {
        "-".to_owned()
    } else {
        out
    }
}
