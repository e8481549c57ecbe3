//! Upcoming-repetition detection via a cuckoo table of reversible moves.
//!
//! Every single-piece reversible move (all non-pawn pieces, every ordered
//! square pair one leap or slide apart on an empty board) is keyed by the
//! XOR of its two piece-square keys and the side-to-move flip value, and
//! installed into an 8192-slot double-hashed table. During search the key
//! difference between the current position and a prior one inside the
//! irreversible window identifies a move that would complete a cycle.

use once_cell::sync::Lazy;

use super::attack_tables::{self, ray_between};
use super::state::Position;
use super::types::{Bitboard, Move, Piece, Square, NULL_MOVE};
use crate::zobrist;

const TABLE_SIZE: usize = 8192;

#[inline]
const fn h1(key: u64) -> usize {
    (key & 0x1FFF) as usize
}

#[inline]
const fn h2(key: u64) -> usize {
    ((key >> 16) & 0x1FFF) as usize
}

struct CuckooTable {
    keys: Box<[u64; TABLE_SIZE]>,
    moves: Box<[Move; TABLE_SIZE]>,
    count: u32,
}

static CUCKOO: Lazy<CuckooTable> = Lazy::new(|| {
    let mut keys = Box::new([0u64; TABLE_SIZE]);
    let mut moves = Box::new([NULL_MOVE; TABLE_SIZE]);
    let mut count = 0u32;

    // pawn moves are never reversible; everything else is
    for piece_idx in Piece::BLACK_KNIGHT.index()..Piece::COUNT {
        let piece = Piece::from_index(piece_idx);

        for s0 in 0..64 {
            let sq0 = Square::from_index(s0);

            for s1 in s0 + 1..64 {
                let sq1 = Square::from_index(s1);

                if !attack_tables::piece_attacks(piece.piece_type(), sq0, Bitboard::EMPTY)
                    .contains(sq1)
                {
                    continue;
                }

                let mut mv = Move::standard(sq0, sq1);
                let mut key = zobrist::piece_square(piece, sq0)
                    ^ zobrist::piece_square(piece, sq1)
                    ^ zobrist::color_flip();

                let mut slot = h1(key);

                loop {
                    std::mem::swap(&mut keys[slot], &mut key);
                    std::mem::swap(&mut moves[slot], &mut mv);

                    if mv.is_null() {
                        break;
                    }

                    // evicted; reinsert at its other slot
                    slot = if slot == h1(key) { h2(key) } else { h1(key) };
                }

                count += 1;
            }
        }
    }

    debug_assert_eq!(count, 3668);

    CuckooTable { keys, moves, count }
});

/// Force table construction; called from `engine::init`.
pub(crate) fn init() {
    Lazy::force(&CUCKOO);
}

#[cfg(test)]
pub(crate) fn entry_count() -> u32 {
    CUCKOO.count
}

impl Position {
    /// Whether some reversible move from here leads to a position already
    /// seen inside the irreversible window, i.e. the line can force a
    /// repetition before the opponent can deviate.
    ///
    /// `ply` is the distance from the search root; cycles that close beyond
    /// the root additionally require the cycling side to be the one to move.
    #[must_use]
    pub fn has_upcoming_repetition(&self, ply: usize) -> bool {
        let len = self.states.len();
        let window = (self.halfmove() as usize).min(len - 1);

        if window < 3 {
            return false;
        }

        let occupancy = self.occupancy_all();
        let original_key = self.key();

        let key_at = |dist: usize| self.states[len - 1 - dist].key;

        // running xor of consecutive move deltas; zero when the piece-square
        // contributions at distance d cancel against ours
        let mut other = original_key ^ key_at(1) ^ zobrist::color_flip();

        let mut dist = 3;
        while dist <= window {
            let key = key_at(dist);

            other ^= key_at(dist - 1) ^ key ^ zobrist::color_flip();

            if other == 0 {
                let diff = original_key ^ key;

                let mut slot = h1(diff);
                if CUCKOO.keys[slot] != diff {
                    slot = h2(diff);
                }

                if CUCKOO.keys[slot] == diff {
                    let mv = CUCKOO.moves[slot];

                    if (occupancy & ray_between(mv.src(), mv.dst())).is_empty() {
                        if ply > dist {
                            return true;
                        }

                        let piece = self
                            .piece_at(mv.src())
                            .or_else(|| self.piece_at(mv.dst()));

                        if let Some(piece) = piece {
                            return piece.color() == self.side_to_move();
                        }
                    }
                }
            }

            dist += 2;
        }

        false
    }
}
