//! Board representation and move machinery.
//!
//! Bitboard-based position state with a per-ply history stack, staged
//! pseudo-legal move generation, and Chess960-aware castling.
//!
//! # Example
//! ```
//! use hematite::board::{Position, ScoredMoveList};
//!
//! let pos = Position::starting();
//! let mut moves = ScoredMoveList::new();
//! pos.generate_all(&mut moves);
//! assert_eq!(moves.len(), 20);
//! ```

pub mod attack_tables;

mod debug;
mod error;
mod fen;
mod make_unmake;
mod material;
mod movegen;
mod repetition;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use error::FenError;
pub use fen::STARTPOS_FEN;
pub use state::{BoardState, Position};
pub use types::{
    Bitboard, BitboardIter, CastlingRooks, Color, Move, MoveKind, Piece, PieceType, RookPair,
    Score, ScoredMove, ScoredMoveList, Square, SquareParseError, TaperedScore, MAX_DEPTH,
    NULL_MOVE, SCORE_INF, SCORE_MATE, SCORE_NONE, SCORE_TB_WIN, SCORE_WIN,
};

pub(crate) use repetition::init as init_cuckoo;
