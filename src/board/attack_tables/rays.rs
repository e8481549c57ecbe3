//! Ray tables over ordered square pairs: between, intersecting, past.
//!
//! These feed pin detection, check-evasion masks, and castling emptiness
//! checks.

use once_cell::sync::Lazy;

use super::util::{
    bishop_attacks_slow, rook_attacks_slow, EMPTY_BOARD_BISHOPS, EMPTY_BOARD_ROOKS,
};
use crate::board::types::{Bitboard, Square};

type RayTable = Vec<[Bitboard; 64]>;

fn build(combine: fn(Square, Square) -> Bitboard) -> RayTable {
    let mut table = vec![[Bitboard::EMPTY; 64]; 64];

    for from in 0..64 {
        let src = Square::from_index(from);

        for to in 0..64 {
            if from == to {
                continue;
            }

            let dst = Square::from_index(to);

            if EMPTY_BOARD_ROOKS[from].contains(dst) || EMPTY_BOARD_BISHOPS[from].contains(dst) {
                table[from][to] = combine(src, dst);
            }
        }
    }

    table
}

fn slider_for(src: Square, dst: Square) -> fn(Square, Bitboard) -> Bitboard {
    if EMPTY_BOARD_ROOKS[src.index()].contains(dst) {
        rook_attacks_slow
    } else {
        bishop_attacks_slow
    }
}

static BETWEEN: Lazy<RayTable> = Lazy::new(|| {
    build(|src, dst| {
        let attacks = slider_for(src, dst);
        attacks(src, Bitboard::from_square(dst)) & attacks(dst, Bitboard::from_square(src))
    })
});

static INTERSECTING: Lazy<RayTable> = Lazy::new(|| {
    build(|src, dst| {
        let attacks = slider_for(src, dst);
        (Bitboard::from_square(src) | attacks(src, Bitboard::EMPTY))
            & (Bitboard::from_square(dst) | attacks(dst, Bitboard::EMPTY))
    })
});

static PAST: Lazy<RayTable> = Lazy::new(|| {
    build(|src, dst| {
        let attacks = slider_for(src, dst);
        attacks(src, Bitboard::EMPTY)
            & (attacks(dst, Bitboard::from_square(src)) | Bitboard::from_square(dst))
    })
});

pub(crate) fn init() {
    Lazy::force(&BETWEEN);
    Lazy::force(&INTERSECTING);
    Lazy::force(&PAST);
}

/// Squares strictly between two collinear squares, else empty.
#[inline]
#[must_use]
pub fn ray_between(a: Square, b: Square) -> Bitboard {
    BETWEEN[a.index()][b.index()]
}

/// The full line through two collinear squares, including both, else empty.
#[inline]
#[must_use]
pub fn ray_intersecting(a: Square, b: Square) -> Bitboard {
    INTERSECTING[a.index()][b.index()]
}

/// Squares beyond `target` along the ray from `src` through `target`.
#[inline]
#[must_use]
pub fn ray_past(src: Square, target: Square) -> Bitboard {
    PAST[src.index()][target.index()]
}
