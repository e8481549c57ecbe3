//! Error types for board operations.

use std::fmt;

/// Error type for FEN parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    /// A required field is missing
    MissingField { field: &'static str },
    /// More than six whitespace-separated fields
    ExcessFields,
    /// More than eight ranks in the placement field
    TooManyRanks,
    /// A rank describes more than eight files
    TooManyFiles { rank: usize },
    /// A rank describes fewer than eight files
    NotEnoughFiles { rank: usize },
    /// Invalid piece character in the placement field
    InvalidPiece { ch: char },
    /// Invalid side to move (must be 'w' or 'b')
    InvalidSideToMove { found: String },
    /// Invalid castling availability field
    InvalidCastling { ch: char },
    /// Invalid en passant target
    InvalidEnPassant { found: String },
    /// Invalid halfmove clock
    InvalidHalfmove { found: String },
    /// Invalid fullmove number
    InvalidFullmove { found: String },
    /// Placement has no king for one side
    MissingKing,
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::MissingField { field } => write!(f, "missing {field} in FEN"),
            FenError::ExcessFields => write!(f, "excess fields after fullmove number in FEN"),
            FenError::TooManyRanks => write!(f, "too many ranks in FEN"),
            FenError::TooManyFiles { rank } => write!(f, "too many files in rank {rank}"),
            FenError::NotEnoughFiles { rank } => write!(f, "not enough files in rank {rank}"),
            FenError::InvalidPiece { ch } => write!(f, "invalid piece character '{ch}' in FEN"),
            FenError::InvalidSideToMove { found } => {
                write!(f, "invalid side to move '{found}', expected 'w' or 'b'")
            }
            FenError::InvalidCastling { ch } => {
                write!(f, "invalid castling availability character '{ch}'")
            }
            FenError::InvalidEnPassant { found } => {
                write!(f, "invalid en passant square '{found}'")
            }
            FenError::InvalidHalfmove { found } => write!(f, "invalid halfmove clock '{found}'"),
            FenError::InvalidFullmove { found } => write!(f, "invalid fullmove number '{found}'"),
            FenError::MissingKing => write!(f, "position is missing a king"),
        }
    }
}

impl std::error::Error for FenError {}
