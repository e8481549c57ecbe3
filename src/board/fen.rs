//! FEN parsing and emission, plus UCI move conversion.

use super::error::FenError;
use super::state::Position;
use super::types::{Color, Move, MoveKind, Piece, PieceType, Square, NULL_MOVE};

/// The canonical standard opening.
pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Position {
    /// Parse a standard-chess FEN. The existing position is untouched on
    /// failure.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        match Self::from_fen_internal(fen, false) {
            Ok(position) => Ok(position),
            Err(e) => {
                log::warn!("rejected FEN '{fen}': {e}");
                Err(e)
            }
        }
    }

    /// Parse a FEN with Chess960 castling semantics: the castling field may
    /// name rook files (`A`..`H` / `a`..`h`) in addition to `KQkq`.
    pub fn from_fen_chess960(fen: &str) -> Result<Self, FenError> {
        match Self::from_fen_internal(fen, true) {
            Ok(position) => Ok(position),
            Err(e) => {
                log::warn!("rejected FEN '{fen}': {e}");
                Err(e)
            }
        }
    }

    fn from_fen_internal(fen: &str, chess960: bool) -> Result<Self, FenError> {
        let tokens: Vec<&str> = fen.split_whitespace().collect();

        if tokens.len() > 6 {
            return Err(FenError::ExcessFields);
        }

        let field_names = [
            "ranks",
            "side to move",
            "castling availability",
            "en passant square",
            "halfmove clock",
            "fullmove number",
        ];
        if tokens.len() < 6 {
            return Err(FenError::MissingField {
                field: field_names[tokens.len()],
            });
        }

        let mut position = Position::new_empty();
        position.chess960 = chess960;

        // piece placement, ranks 8 down to 1
        for (rank_idx, rank_str) in tokens[0].split('/').enumerate() {
            if rank_idx >= 8 {
                return Err(FenError::TooManyRanks);
            }

            let rank = 7 - rank_idx;
            let mut file = 0usize;

            for ch in rank_str.chars() {
                if let Some(run) = ch.to_digit(10) {
                    file += run as usize;
                } else {
                    let piece =
                        Piece::from_char(ch).ok_or(FenError::InvalidPiece { ch })?;
                    if file >= 8 {
                        return Err(FenError::TooManyFiles { rank: rank_idx });
                    }
                    position.curr_mut().mailbox[Square::new(rank, file).index()] = Some(piece);
                    file += 1;
                }
            }

            match file {
                0..=7 => return Err(FenError::NotEnoughFiles { rank: rank_idx }),
                8 => {}
                _ => return Err(FenError::TooManyFiles { rank: rank_idx }),
            }
        }

        if position.curr().mailbox.iter().flatten().filter(|p| **p == Piece::BLACK_KING).count() != 1
            || position
                .curr()
                .mailbox
                .iter()
                .flatten()
                .filter(|p| **p == Piece::WHITE_KING)
                .count()
                != 1
        {
            return Err(FenError::MissingKing);
        }

        match tokens[1] {
            "w" => position.black_to_move = false,
            "b" => position.black_to_move = true,
            other => {
                return Err(FenError::InvalidSideToMove {
                    found: other.to_string(),
                })
            }
        }

        // king squares are needed to resolve 960 castling flags
        for idx in 0..64 {
            match position.curr().mailbox[idx] {
                Some(Piece::BLACK_KING) => position.curr_mut().black_king = Square::from_index(idx),
                Some(Piece::WHITE_KING) => position.curr_mut().white_king = Square::from_index(idx),
                _ => {}
            }
        }

        position.parse_castling(tokens[2])?;

        if tokens[3] != "-" {
            let sq: Square = tokens[3].parse().map_err(|_| FenError::InvalidEnPassant {
                found: tokens[3].to_string(),
            })?;
            position.curr_mut().en_passant = Some(sq);
        }

        position.curr_mut().halfmove =
            tokens[4].parse().map_err(|_| FenError::InvalidHalfmove {
                found: tokens[4].to_string(),
            })?;

        position.fullmove = tokens[5].parse().map_err(|_| FenError::InvalidFullmove {
            found: tokens[5].to_string(),
        })?;

        position.regen();

        Ok(position)
    }

    fn parse_castling(&mut self, field: &str) -> Result<(), FenError> {
        if field == "-" {
            return Ok(());
        }

        if field.len() > 4 {
            return Err(FenError::InvalidCastling {
                ch: field.chars().nth(4).unwrap_or('?'),
            });
        }

        let black_king = self.curr().black_king;
        let white_king = self.curr().white_king;

        for ch in field.chars() {
            if self.chess960 {
                match ch {
                    'a'..='h' => {
                        let file = ch as usize - 'a' as usize;
                        if file == black_king.file() {
                            return Err(FenError::InvalidCastling { ch });
                        }
                        let sq = Square::new(7, file);
                        let rooks = &mut self.curr_mut().castling_rooks;
                        if file < black_king.file() {
                            rooks.black.queenside = Some(sq);
                        } else {
                            rooks.black.kingside = Some(sq);
                        }
                    }
                    'A'..='H' => {
                        let file = ch as usize - 'A' as usize;
                        if file == white_king.file() {
                            return Err(FenError::InvalidCastling { ch });
                        }
                        let sq = Square::new(0, file);
                        let rooks = &mut self.curr_mut().castling_rooks;
                        if file < white_king.file() {
                            rooks.white.queenside = Some(sq);
                        } else {
                            rooks.white.kingside = Some(sq);
                        }
                    }
                    // X-FEN flags: scan outward from the king for the rook
                    'k' => self.scan_outer_rook(Color::Black, true),
                    'K' => self.scan_outer_rook(Color::White, true),
                    'q' => self.scan_outer_rook(Color::Black, false),
                    'Q' => self.scan_outer_rook(Color::White, false),
                    _ => return Err(FenError::InvalidCastling { ch }),
                }
            } else {
                let rooks = &mut self.curr_mut().castling_rooks;
                match ch {
                    'K' => rooks.white.kingside = Some(Square::H1),
                    'Q' => rooks.white.queenside = Some(Square::A1),
                    'k' => rooks.black.kingside = Some(Square::H8),
                    'q' => rooks.black.queenside = Some(Square::A8),
                    _ => return Err(FenError::InvalidCastling { ch }),
                }
            }
        }

        Ok(())
    }

    fn scan_outer_rook(&mut self, color: Color, kingside: bool) {
        let king = match color {
            Color::Black => self.curr().black_king,
            Color::White => self.curr().white_king,
        };
        let rook = Piece::new(PieceType::Rook, color);
        let rank = king.rank();

        let files: Box<dyn Iterator<Item = usize>> = if kingside {
            Box::new(king.file() + 1..8)
        } else {
            Box::new((0..king.file()).rev())
        };

        for file in files {
            let sq = Square::new(rank, file);
            if self.curr().mailbox[sq.index()] == Some(rook) {
                let pair = self.curr_mut().castling_rooks.color_mut(color);
                if kingside {
                    pair.kingside = Some(sq);
                } else {
                    pair.queenside = Some(sq);
                }
                break;
            }
        }
    }

    /// Emit the position as a FEN string.
    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();

        for rank in (0..8).rev() {
            let mut empty = 0;

            for file in 0..8 {
                match self.piece_at(Square::new(rank, file)) {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push(char::from_digit(empty, 10).unwrap());
                            empty = 0;
                        }
                        fen.push(piece.to_char());
                    }
                    None => empty += 1,
                }
            }

            if empty > 0 {
                fen.push(char::from_digit(empty, 10).unwrap());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.black_to_move { 'b' } else { 'w' });
        fen.push(' ');

        let rooks = self.castling_rooks();
        if !rooks.any() {
            fen.push('-');
        } else if self.chess960 {
            if let Some(sq) = rooks.white.kingside {
                fen.push((b'A' + sq.file() as u8) as char);
            }
            if let Some(sq) = rooks.white.queenside {
                fen.push((b'A' + sq.file() as u8) as char);
            }
            if let Some(sq) = rooks.black.kingside {
                fen.push((b'a' + sq.file() as u8) as char);
            }
            if let Some(sq) = rooks.black.queenside {
                fen.push((b'a' + sq.file() as u8) as char);
            }
        } else {
            if rooks.white.kingside.is_some() {
                fen.push('K');
            }
            if rooks.white.queenside.is_some() {
                fen.push('Q');
            }
            if rooks.black.kingside.is_some() {
                fen.push('k');
            }
            if rooks.black.queenside.is_some() {
                fen.push('q');
            }
        }

        match self.en_passant() {
            Some(sq) => {
                fen.push(' ');
                fen.push_str(&sq.to_string());
            }
            None => fen.push_str(" -"),
        }

        fen.push_str(&format!(" {} {}", self.halfmove(), self.fullmove()));

        fen
    }

    /// Parse a UCI move (`e2e4`, `e7e8q`) against the current position.
    ///
    /// Returns the null-move sentinel when the string cannot name a move
    /// here; the caller decides how to react. In Chess960 mode castling is
    /// accepted both as king-moves-two and as king-takes-own-rook.
    #[must_use]
    pub fn move_from_uci(&self, uci: &str) -> Move {
        if !uci.is_ascii() || uci.len() < 4 || uci.len() > 5 {
            return NULL_MOVE;
        }

        let Ok(src) = uci[0..2].parse::<Square>() else {
            return NULL_MOVE;
        };
        let Ok(dst) = uci[2..4].parse::<Square>() else {
            return NULL_MOVE;
        };

        if uci.len() == 5 {
            let target = match uci.as_bytes()[4] {
                b'n' => PieceType::Knight,
                b'b' => PieceType::Bishop,
                b'r' => PieceType::Rook,
                b'q' => PieceType::Queen,
                _ => return NULL_MOVE,
            };
            return Move::promotion(src, dst, target);
        }

        let Some(src_piece) = self.piece_at(src) else {
            return Move::standard(src, dst);
        };

        if src_piece.piece_type() == PieceType::King {
            if self.chess960 {
                if self.piece_at(dst) == Some(Piece::new(PieceType::Rook, src_piece.color())) {
                    return Move::castling(src, dst);
                }
                return Move::standard(src, dst);
            }

            if src.file().abs_diff(dst.file()) == 2 {
                let rook_file = if src.file() < dst.file() { 7 } else { 0 };
                return Move::castling(src, Square::new(src.rank(), rook_file));
            }
        }

        if src_piece.piece_type() == PieceType::Pawn && self.en_passant() == Some(dst) {
            return Move::en_passant(src, dst);
        }

        Move::standard(src, dst)
    }

    /// Emit a move in UCI notation, accounting for the castling encoding.
    #[must_use]
    pub fn move_to_uci(&self, mv: Move) -> String {
        if mv.is_null() {
            return "0000".to_string();
        }

        if mv.kind() == MoveKind::Castling && !self.chess960 {
            // internally king-takes-rook; classical output is king-moves-two
            let src = mv.src();
            let king_file = if mv.dst().file() > src.file() { 6 } else { 2 };
            return format!("{}{}", src, Square::new(src.rank(), king_file));
        }

        mv.to_string()
    }
}
