//! PEXT/PDEP indexed slider attack tables, used when BMI2 is available.
//!
//! Rook rows are stored pext-packed in 16 bits and re-deposited into the
//! destination mask on lookup; bishop rows fit comfortably as full
//! bitboards.

use once_cell::sync::Lazy;

use super::util::{
    bishop_attacks_slow, relevant_mask, rook_attacks_slow, BISHOP_DIRS, ROOK_DIRS,
};
use crate::board::types::{Bitboard, Square};

#[inline]
fn pext(val: u64, mask: u64) -> u64 {
    unsafe { std::arch::x86_64::_pext_u64(val, mask) }
}

#[inline]
fn pdep(val: u64, mask: u64) -> u64 {
    unsafe { std::arch::x86_64::_pdep_u64(val, mask) }
}

struct RookSquareData {
    /// Interior ray squares; the pext source
    src_mask: u64,
    /// Full empty-board attack set; the pdep destination
    dst_mask: u64,
    offset: usize,
}

struct RookTables {
    squares: Vec<RookSquareData>,
    table: Vec<u16>,
}

struct BishopSquareData {
    mask: u64,
    offset: usize,
}

struct BishopTables {
    squares: Vec<BishopSquareData>,
    table: Vec<Bitboard>,
}

static ROOK_DATA: Lazy<RookTables> = Lazy::new(|| {
    let mut squares = Vec::with_capacity(64);
    let mut table_size = 0usize;

    for idx in 0..64 {
        let sq = Square::from_index(idx);
        let src_mask = relevant_mask(sq, &ROOK_DIRS).0;
        let dst_mask = rook_attacks_slow(sq, Bitboard::EMPTY).0;

        squares.push(RookSquareData {
            src_mask,
            dst_mask,
            offset: table_size,
        });
        table_size += 1 << src_mask.count_ones();
    }

    let mut table = vec![0u16; table_size];

    for idx in 0..64 {
        let sq = Square::from_index(idx);
        let data = &squares[idx];
        let subsets = 1u64 << data.src_mask.count_ones();

        for i in 0..subsets {
            let occupancy = Bitboard(pdep(i, data.src_mask));
            let attacks = rook_attacks_slow(sq, occupancy);
            table[data.offset + i as usize] = pext(attacks.0, data.dst_mask) as u16;
        }
    }

    RookTables { squares, table }
});

static BISHOP_DATA: Lazy<BishopTables> = Lazy::new(|| {
    let mut squares = Vec::with_capacity(64);
    let mut table_size = 0usize;

    for idx in 0..64 {
        let mask = relevant_mask(Square::from_index(idx), &BISHOP_DIRS).0;
        squares.push(BishopSquareData {
            mask,
            offset: table_size,
        });
        table_size += 1 << mask.count_ones();
    }

    let mut table = vec![Bitboard::EMPTY; table_size];

    for idx in 0..64 {
        let sq = Square::from_index(idx);
        let data = &squares[idx];
        let subsets = 1u64 << data.mask.count_ones();

        for i in 0..subsets {
            let occupancy = Bitboard(pdep(i, data.mask));
            table[data.offset + i as usize] = bishop_attacks_slow(sq, occupancy);
        }
    }

    BishopTables { squares, table }
});

pub(crate) fn init() {
    Lazy::force(&ROOK_DATA);
    Lazy::force(&BISHOP_DATA);
}

#[inline]
pub(crate) fn rook_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    let data = &ROOK_DATA.squares[sq.index()];
    let idx = pext(occupancy.0, data.src_mask) as usize;
    Bitboard(pdep(
        u64::from(ROOK_DATA.table[data.offset + idx]),
        data.dst_mask,
    ))
}

#[inline]
pub(crate) fn bishop_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    let data = &BISHOP_DATA.squares[sq.index()];
    let idx = pext(occupancy.0, data.mask) as usize;
    BISHOP_DATA.table[data.offset + idx]
}
