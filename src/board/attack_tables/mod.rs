//! Precomputed attack lookups.
//!
//! Leapers are plain 64-entry tables; sliders go through PEXT/PDEP indexing
//! when the build enables BMI2 and black-magic multiplication otherwise.

mod leapers;
mod rays;
mod util;

#[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
mod pext;
#[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
use pext as sliders;

#[cfg(not(all(target_arch = "x86_64", target_feature = "bmi2")))]
mod magics;
#[cfg(not(all(target_arch = "x86_64", target_feature = "bmi2")))]
use magics as sliders;

pub use rays::{ray_between, ray_intersecting, ray_past};

use super::types::{Bitboard, Color, PieceType, Square};

/// Populate every table; called from `engine::init` before search starts.
pub(crate) fn init() {
    once_cell::sync::Lazy::force(&leapers::KNIGHT_ATTACKS);
    once_cell::sync::Lazy::force(&leapers::KING_ATTACKS);
    once_cell::sync::Lazy::force(&leapers::PAWN_ATTACKS);
    sliders::init();
    rays::init();
}

#[inline]
#[must_use]
pub fn knight_attacks(sq: Square) -> Bitboard {
    leapers::KNIGHT_ATTACKS[sq.index()]
}

#[inline]
#[must_use]
pub fn king_attacks(sq: Square) -> Bitboard {
    leapers::KING_ATTACKS[sq.index()]
}

/// Squares a pawn of `color` on `sq` attacks.
#[inline]
#[must_use]
pub fn pawn_attacks(sq: Square, color: Color) -> Bitboard {
    leapers::PAWN_ATTACKS[color.index()][sq.index()]
}

#[inline]
#[must_use]
pub fn rook_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    sliders::rook_attacks(sq, occupancy)
}

#[inline]
#[must_use]
pub fn bishop_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    sliders::bishop_attacks(sq, occupancy)
}

#[inline]
#[must_use]
pub fn queen_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    rook_attacks(sq, occupancy) | bishop_attacks(sq, occupancy)
}

/// Attacks of a non-pawn piece type from a square.
#[inline]
#[must_use]
pub fn piece_attacks(piece_type: PieceType, sq: Square, occupancy: Bitboard) -> Bitboard {
    match piece_type {
        PieceType::Knight => knight_attacks(sq),
        PieceType::Bishop => bishop_attacks(sq, occupancy),
        PieceType::Rook => rook_attacks(sq, occupancy),
        PieceType::Queen => queen_attacks(sq, occupancy),
        PieceType::King => king_attacks(sq),
        PieceType::Pawn => Bitboard::EMPTY,
    }
}
