//! Self-check helpers comparing incremental state against rederivation.

use super::state::Position;
use super::types::{Bitboard, Square};

impl Position {
    /// Panics if any incrementally maintained field disagrees with a
    /// from-scratch rederivation, or if the mailbox and boards diverge.
    /// Test and debug aid; never called on the hot path.
    #[track_caller]
    pub fn assert_fully_consistent(&self) {
        // mailbox <-> boards agreement
        for idx in 0..64 {
            let sq = Square::from_index(idx);
            match self.piece_at(sq) {
                Some(piece) => {
                    assert!(
                        self.board(piece).contains(sq),
                        "mailbox has {piece:?} on {sq} but its board does not"
                    );
                }
                None => {
                    let occupied = self
                        .boards()
                        .iter()
                        .fold(Bitboard::EMPTY, |acc, &b| acc | b);
                    assert!(
                        !occupied.contains(sq),
                        "mailbox empty on {sq} but a board bit is set"
                    );
                }
            }
        }

        let mut regened = self.clone();
        regened.regen();

        assert_eq!(self.boards(), regened.boards(), "piece boards diverged");
        assert_eq!(self.black_occ, regened.black_occ, "black occupancy diverged");
        assert_eq!(self.white_occ, regened.white_occ, "white occupancy diverged");
        assert_eq!(self.king_pair(), regened.king_pair(), "king cache diverged");
        assert_eq!(self.key(), regened.key(), "key diverged");
        assert_eq!(self.pawn_key(), regened.pawn_key(), "pawn key diverged");
        assert_eq!(self.material(), regened.material(), "material diverged");
        assert_eq!(self.curr().phase, regened.curr().phase, "phase diverged");
        assert_eq!(self.checkers(), regened.checkers(), "checkers diverged");
    }
}
