//! Precomputed leaper attack tables (knights, kings, pawns).

use once_cell::sync::Lazy;

use crate::board::types::{Bitboard, Color, Square};

pub(crate) static KNIGHT_ATTACKS: Lazy<[Bitboard; 64]> = Lazy::new(|| {
    let mut table = [Bitboard::EMPTY; 64];
    for (idx, slot) in table.iter_mut().enumerate() {
        let bit = Bitboard::from_square(Square::from_index(idx));
        *slot = bit.shift_up_up_left()
            | bit.shift_up_up_right()
            | bit.shift_up_left_left()
            | bit.shift_up_right_right()
            | bit.shift_down_left_left()
            | bit.shift_down_right_right()
            | bit.shift_down_down_left()
            | bit.shift_down_down_right();
    }
    table
});

pub(crate) static KING_ATTACKS: Lazy<[Bitboard; 64]> = Lazy::new(|| {
    let mut table = [Bitboard::EMPTY; 64];
    for (idx, slot) in table.iter_mut().enumerate() {
        let bit = Bitboard::from_square(Square::from_index(idx));
        *slot = bit.shift_up()
            | bit.shift_down()
            | bit.shift_left()
            | bit.shift_right()
            | bit.shift_up_left()
            | bit.shift_up_right()
            | bit.shift_down_left()
            | bit.shift_down_right();
    }
    table
});

// Indexed [color][square]; ranks 1 and 8 included, en passant is not
// synthesized here.
pub(crate) static PAWN_ATTACKS: Lazy<[[Bitboard; 64]; 2]> = Lazy::new(|| {
    let mut table = [[Bitboard::EMPTY; 64]; 2];
    for idx in 0..64 {
        let bit = Bitboard::from_square(Square::from_index(idx));
        table[Color::Black.index()][idx] = bit.shift_down_left() | bit.shift_down_right();
        table[Color::White.index()][idx] = bit.shift_up_left() | bit.shift_up_right();
    }
    table
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knight_center_and_corner() {
        let e4: Square = "e4".parse().unwrap();
        assert_eq!(KNIGHT_ATTACKS[e4.index()].popcount(), 8);
        assert_eq!(KNIGHT_ATTACKS[Square::A1.index()].popcount(), 2);
        assert!(KNIGHT_ATTACKS[Square::A1.index()].contains("b3".parse().unwrap()));
        assert!(KNIGHT_ATTACKS[Square::A1.index()].contains("c2".parse().unwrap()));
    }

    #[test]
    fn test_king_center_and_corner() {
        let e4: Square = "e4".parse().unwrap();
        assert_eq!(KING_ATTACKS[e4.index()].popcount(), 8);
        assert_eq!(KING_ATTACKS[Square::H8.index()].popcount(), 3);
    }

    #[test]
    fn test_pawn_attacks() {
        let e4: Square = "e4".parse().unwrap();
        let white = PAWN_ATTACKS[Color::White.index()][e4.index()];
        assert!(white.contains("d5".parse().unwrap()));
        assert!(white.contains("f5".parse().unwrap()));
        assert_eq!(white.popcount(), 2);

        let black = PAWN_ATTACKS[Color::Black.index()][e4.index()];
        assert!(black.contains("d3".parse().unwrap()));
        assert!(black.contains("f3".parse().unwrap()));

        // edge files attack one square only
        let a4: Square = "a4".parse().unwrap();
        assert_eq!(PAWN_ATTACKS[Color::White.index()][a4.index()].popcount(), 1);

        // first and last ranks still produce attacks
        assert_eq!(PAWN_ATTACKS[Color::Black.index()][Square::E1.index()], Bitboard::EMPTY);
        assert_eq!(PAWN_ATTACKS[Color::White.index()][Square::E1.index()].popcount(), 2);
    }
}
