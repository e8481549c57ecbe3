//! Black-magic indexed slider attack tables.
//!
//! The per-square index is `((occupancy | inv_mask) * magic) >> shift` where
//! `inv_mask` is the complement of the relevant-occupancy mask. Table
//! construction enumerates every occupancy subset and asserts the mapping is
//! collision-free.

use once_cell::sync::Lazy;

use super::util::{
    bishop_attacks_slow, deposit_bits, relevant_mask, rook_attacks_slow, BISHOP_DIRS, ROOK_DIRS,
};
use crate::board::types::{Bitboard, Square};

#[rustfmt::skip]
const ROOK_SHIFTS: [u32; 64] = [
    52, 53, 53, 53, 53, 53, 53, 52,
    53, 54, 54, 54, 54, 54, 54, 53,
    53, 54, 54, 54, 54, 54, 54, 53,
    53, 54, 54, 54, 54, 54, 54, 53,
    53, 54, 54, 54, 54, 54, 54, 53,
    53, 54, 54, 54, 54, 54, 54, 53,
    53, 54, 54, 54, 54, 54, 54, 53,
    52, 53, 53, 53, 53, 53, 53, 52,
];

#[rustfmt::skip]
const BISHOP_SHIFTS: [u32; 64] = [
    59, 60, 59, 59, 59, 59, 60, 58,
    60, 60, 59, 59, 59, 59, 60, 60,
    59, 59, 57, 57, 57, 57, 59, 59,
    59, 59, 57, 55, 55, 57, 59, 59,
    59, 59, 57, 55, 55, 57, 59, 59,
    59, 59, 57, 57, 57, 57, 59, 60,
    60, 60, 59, 59, 59, 59, 60, 60,
    59, 60, 59, 59, 59, 59, 60, 58,
];

#[rustfmt::skip]
const ROOK_MAGICS: [u64; 64] = [
    0x2080002040068490, 0x06C0021001200C40, 0x288009300280A000, 0x0100089521003000,
    0x6100040801003082, 0x65FFEBC5FFEEE7F0, 0x0400080C10219112, 0x0200014434060003,
    0x96CD8008C00379D9, 0x2A06002101FF81CF, 0x7BCA0020802E0641, 0xDAE2FFEFFD0020BA,
    0x62E20005E0D200AA, 0x2302000830DA0044, 0xE81C002CE40A3028, 0xC829FFFAFD8BBC06,
    0x12C57E800740089D, 0xA574FDFFE13A81FD, 0xF331B1FFE0BF79FE, 0x0000A1003001010A,
    0x7CD4E2000600264F, 0x0299010004000228, 0xA36CEBFFAE0FA825, 0x9A87E9FFF4408405,
    0x0BAEC0007FF8EB82, 0xF81909BDFFE18205, 0x0391AF45001FFF01, 0xD000900100290021,
    0x2058480080040080, 0x6DCDFFA2002C38D0, 0xC709C80C00951002, 0xB70EE5420008FF84,
    0x6E254003897FFCE6, 0xD91D21FE7E003901, 0xA0D1EFFF857FE001, 0x7C45FFC022001893,
    0x8180818800800400, 0x2146001CB20018B0, 0x843C20E7DBFF8FEE, 0x09283C127A00083F,
    0x01465F8CC0078000, 0xA30A50075FFD3FFF, 0x39593D8231FE0020, 0x8129FE58405E000F,
    0x1140850008010011, 0x2302000830DA0044, 0xD706971819F400B0, 0xA0B2A3BC86E20004,
    0x10FFF67AD3B88200, 0x10FFF67AD3B88200, 0x5076D15DBDF97E00, 0xD861C0D1FFC8DE00,
    0x5CA002003B305E00, 0x84FFFFCF19605740, 0xD26F0FA80A28AC00, 0x342F7E87013BFA00,
    0x63BB9E8FBF01FE7A, 0x260ADF40007B9101, 0x2013CEFF6000BEF7, 0x13AD6200060EBFE6,
    0x2D4DFFFF28F4D9FA, 0x766200004B3A92F6, 0xB6AE6FF7FE8A070C, 0xD065F4839BFC4B02,
];

#[rustfmt::skip]
const BISHOP_MAGICS: [u64; 64] = [
    0x69906270549A3405, 0xE846197A0E88067F, 0x54D7C7FB06DE5827, 0xF4380209C8E966FE,
    0xDF33F39ECD91FCF6, 0xC580F3DFFCC85DB4, 0xC6A89809B600286C, 0xC1DE00D4289BFFC0,
    0x7BDA249AC632C811, 0x83534631B40CA406, 0x6EA35817F035775C, 0x6DB23BEF4DF5645E,
    0x5555D3FB9F934CD3, 0xE6766DFD0FC609F8, 0xFC2EB0C6C58C8021, 0x6786D25EACCFDF72,
    0x86E8324A02CA8AEF, 0xF91A13391D2D97F1, 0x131810CFFD99BE90, 0x8537F35C05EFA08B,
    0x5D598243FF5FD71A, 0x1D09FFBF00FAD72B, 0xD16A319977FC05FD, 0x8D6601E599347F90,
    0x4404409F5EC1F3DB, 0x25A7EC287E0BB817, 0x22F9F7FF5AF54401, 0x00200302080070E0,
    0x3D1900D006FFC014, 0x3958E700A5FEBEFB, 0xD48AA0E6BBFC0214, 0x56BBF68FC6CD5C13,
    0xD4CFE69F216FF3C9, 0xE46CEF960C704413, 0x7985CEB00428057B, 0x4900220082080080,
    0x028422C010040100, 0x119377F9FFF6BEEB, 0x2787B8DA98AC0221, 0xCF340AB7795DFC80,
    0x5F4D27A008D84FE9, 0x4339FF0FE25ED893, 0x88F477A178045010, 0x7B293EDFD1015806,
    0x1F61DFF2047F5BFF, 0xE2E1B97D1A009100, 0x9C9F7BCC878F1A08, 0xABFFCA859DA3CDFE,
    0x1CD806CBB423E49B, 0x5EE7FB86BD527D9B, 0xBB0A8BC1EAB02192, 0xB75E295A3FCE452C,
    0x911D2E51E6060430, 0x133E017175D1FB87, 0xD7C00065234350D1, 0x220029F586970AD8,
    0xA6F001938E193FDB, 0xDF725BF4FA4505B6, 0xE5DE50FA3FDC8C72, 0x3CE77ED6760FC3D0,
    0x4CAD71659E41C408, 0xE6766DFD0FC609F8, 0x45D7FEA873649EA8, 0xA8806CA2E576C9E4,
];

struct SquareData {
    /// Complement of the relevant-occupancy mask
    inv_mask: u64,
    offset: usize,
}

struct SliderData {
    squares: Vec<SquareData>,
    table: Vec<Bitboard>,
}

fn build(
    dirs: &[(i32, i32)],
    magics: &[u64; 64],
    shifts: &[u32; 64],
    attacks_slow: fn(Square, Bitboard) -> Bitboard,
) -> SliderData {
    let mut squares = Vec::with_capacity(64);
    let mut table_size = 0usize;

    for idx in 0..64 {
        let interior = relevant_mask(Square::from_index(idx), dirs);
        squares.push(SquareData {
            inv_mask: !interior.0,
            offset: table_size,
        });
        table_size += 1 << (64 - shifts[idx]);
    }

    let mut table = vec![Bitboard::EMPTY; table_size];

    for idx in 0..64 {
        let sq = Square::from_index(idx);
        let data = &squares[idx];
        let interior = !data.inv_mask;
        let subsets = 1u64 << interior.count_ones();

        for i in 0..subsets {
            let occupancy = Bitboard(deposit_bits(i, interior));
            let attacks = attacks_slow(sq, occupancy);

            let slot =
                data.offset + magic_index(occupancy, data.inv_mask, magics[idx], shifts[idx]);

            // the magics are collision-free: a slot is either unused or
            // already holds the identical attack set
            debug_assert!(table[slot].is_empty() || table[slot] == attacks);
            table[slot] = attacks;
        }
    }

    SliderData { squares, table }
}

#[inline]
fn magic_index(occupancy: Bitboard, inv_mask: u64, magic: u64, shift: u32) -> usize {
    (((occupancy.0 | inv_mask).wrapping_mul(magic)) >> shift) as usize
}

static ROOK_DATA: Lazy<SliderData> =
    Lazy::new(|| build(&ROOK_DIRS, &ROOK_MAGICS, &ROOK_SHIFTS, rook_attacks_slow));

static BISHOP_DATA: Lazy<SliderData> = Lazy::new(|| {
    build(
        &BISHOP_DIRS,
        &BISHOP_MAGICS,
        &BISHOP_SHIFTS,
        bishop_attacks_slow,
    )
});

pub(crate) fn init() {
    Lazy::force(&ROOK_DATA);
    Lazy::force(&BISHOP_DATA);
}

#[inline]
pub(crate) fn rook_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    let idx = sq.index();
    let data = &ROOK_DATA.squares[idx];
    ROOK_DATA.table
        [data.offset + magic_index(occupancy, data.inv_mask, ROOK_MAGICS[idx], ROOK_SHIFTS[idx])]
}

#[inline]
pub(crate) fn bishop_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    let idx = sq.index();
    let data = &BISHOP_DATA.squares[idx];
    BISHOP_DATA.table[data.offset
        + magic_index(occupancy, data.inv_mask, BISHOP_MAGICS[idx], BISHOP_SHIFTS[idx])]
}
