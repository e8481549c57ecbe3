//! Zobrist keys for incremental position hashing.
//!
//! 793 64-bit constants drawn from a fixed-seed JSF64 stream: 768
//! piece-square entries, one side-to-move flip value, 16 entries for the
//! castling-rights nibble, and 8 en-passant file entries. The derivation is
//! deterministic, so keys are stable across builds and platforms.

use once_cell::sync::Lazy;

use crate::board::{CastlingRooks, Color, Piece, Square};
use crate::util::rng::Jsf64Rng;

const SEED: u64 = 0xD06C_6599_54EC_904A;

const PIECE_SQUARES: usize = 12 * 64;
const COLOR: usize = 1;
const CASTLING: usize = 16;
const EN_PASSANT: usize = 8;
const TOTAL: usize = PIECE_SQUARES + COLOR + CASTLING + EN_PASSANT;

const COLOR_OFFSET: usize = PIECE_SQUARES;
const CASTLING_OFFSET: usize = COLOR_OFFSET + COLOR;
const EN_PASSANT_OFFSET: usize = CASTLING_OFFSET + CASTLING;

static KEYS: Lazy<[u64; TOTAL]> = Lazy::new(|| {
    let mut keys = [0u64; TOTAL];
    let mut rng = Jsf64Rng::new(SEED);

    for key in &mut keys {
        *key = rng.next_u64();
    }

    keys
});

/// Force key generation; called from `engine::init`.
pub(crate) fn init() {
    Lazy::force(&KEYS);
}

/// Key contribution of a piece standing on a square.
#[inline]
#[must_use]
pub fn piece_square(piece: Piece, square: Square) -> u64 {
    KEYS[square.index() * 12 + piece.index()]
}

/// The value XORed on every side-to-move flip.
#[inline]
#[must_use]
pub fn color_flip() -> u64 {
    KEYS[COLOR_OFFSET]
}

/// Side-to-move contribution for an absolute color.
#[inline]
#[must_use]
pub fn color(c: Color) -> u64 {
    match c {
        Color::White => 0,
        Color::Black => color_flip(),
    }
}

/// Contribution of the current castling-rights nibble.
#[inline]
#[must_use]
pub fn castling(rooks: &CastlingRooks) -> u64 {
    KEYS[CASTLING_OFFSET + rooks.flags()]
}

/// Contribution of an en-passant target file.
#[inline]
#[must_use]
pub fn en_passant_file(file: usize) -> u64 {
    KEYS[EN_PASSANT_OFFSET + file]
}

/// Contribution of an optional en-passant square.
#[inline]
#[must_use]
pub fn en_passant(square: Option<Square>) -> u64 {
    match square {
        Some(sq) => en_passant_file(sq.file()),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_deterministic() {
        // same seed, same stream
        let mut rng = Jsf64Rng::new(SEED);
        assert_eq!(KEYS[0], rng.next_u64());
        assert_eq!(KEYS[1], rng.next_u64());
    }

    #[test]
    fn test_keys_mostly_distinct() {
        let mut sorted = KEYS.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), TOTAL);
    }

    #[test]
    fn test_piece_square_indexing() {
        let a = piece_square(Piece::WHITE_PAWN, Square::A1);
        let b = piece_square(Piece::BLACK_PAWN, Square::A1);
        let c = piece_square(Piece::WHITE_PAWN, Square::H8);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_castling_nibble() {
        let all = CastlingRooks::startpos();
        let none = CastlingRooks::default();
        assert_ne!(castling(&all), castling(&none));

        let mut partial = all;
        partial.color_mut(Color::White).clear();
        assert_ne!(castling(&partial), castling(&all));
        assert_ne!(castling(&partial), castling(&none));
    }

    #[test]
    fn test_en_passant_by_file() {
        assert_eq!(en_passant(None), 0);
        let d6: Square = "d6".parse().unwrap();
        let d3: Square = "d3".parse().unwrap();
        // only the file matters
        assert_eq!(en_passant(Some(d6)), en_passant(Some(d3)));
        assert_eq!(en_passant(Some(d6)), en_passant_file(3));
    }
}
