//! Move application and retraction.
//!
//! `apply_move_unchecked` pushes the current frame and mutates in place;
//! `pop_move` restores by popping. All incremental state (boards, mailbox,
//! occupancy, kings, keys, material, phase) is maintained here.

use super::attack_tables;
use super::material;
use super::types::{
    Bitboard, Color, Move, MoveKind, Piece, PieceType, ScoredMoveList, Square,
};
use crate::transposition_table::TranspositionTable;
use crate::zobrist;

use super::state::Position;

impl Position {
    #[inline]
    fn occ_mut(&mut self, color: Color) -> &mut Bitboard {
        match color {
            Color::Black => &mut self.black_occ,
            Color::White => &mut self.white_occ,
        }
    }

    /// Place `piece` on `sq`, removing and returning whatever stood there.
    fn set_piece(&mut self, sq: Square, piece: Piece) -> Option<Piece> {
        let captured = self.curr().mailbox[sq.index()];
        let bit = Bitboard::from_square(sq);

        if let Some(captured) = captured {
            let state = self.curr_mut();
            state.boards[captured.index()] ^= bit;
            state.phase -= material::phase_weight(captured.piece_type());
            state.material -= material::piece_square_value(captured, sq);

            let hash = zobrist::piece_square(captured, sq);
            state.key ^= hash;
            if captured.piece_type() == PieceType::Pawn {
                state.pawn_key ^= hash;
            }

            *self.occ_mut(captured.color()) ^= bit;
        }

        let state = self.curr_mut();
        state.mailbox[sq.index()] = Some(piece);
        state.boards[piece.index()] |= bit;

        if piece == Piece::BLACK_KING {
            state.black_king = sq;
        } else if piece == Piece::WHITE_KING {
            state.white_king = sq;
        }

        state.phase += material::phase_weight(piece.piece_type());
        state.material += material::piece_square_value(piece, sq);

        let hash = zobrist::piece_square(piece, sq);
        state.key ^= hash;
        if piece.piece_type() == PieceType::Pawn {
            state.pawn_key ^= hash;
        }

        *self.occ_mut(piece.color()) |= bit;

        captured
    }

    /// Remove and return the piece on `sq`.
    fn remove_piece(&mut self, sq: Square) -> Option<Piece> {
        let piece = self.curr().mailbox[sq.index()]?;
        let bit = Bitboard::from_square(sq);

        let state = self.curr_mut();
        state.mailbox[sq.index()] = None;
        state.boards[piece.index()] ^= bit;
        state.phase -= material::phase_weight(piece.piece_type());
        state.material -= material::piece_square_value(piece, sq);

        let hash = zobrist::piece_square(piece, sq);
        state.key ^= hash;
        if piece.piece_type() == PieceType::Pawn {
            state.pawn_key ^= hash;
        }

        *self.occ_mut(piece.color()) ^= bit;

        Some(piece)
    }

    /// Move the piece on `src` to `dst`, returning any captured piece.
    fn move_piece(&mut self, src: Square, dst: Square) -> Option<Piece> {
        let piece = self.curr().mailbox[src.index()].expect("move from empty square");
        let captured = self.curr().mailbox[dst.index()];

        if let Some(captured) = captured {
            let bit = Bitboard::from_square(dst);
            let state = self.curr_mut();
            state.boards[captured.index()] ^= bit;
            state.phase -= material::phase_weight(captured.piece_type());
            state.material -= material::piece_square_value(captured, dst);

            let hash = zobrist::piece_square(captured, dst);
            state.key ^= hash;
            if captured.piece_type() == PieceType::Pawn {
                state.pawn_key ^= hash;
            }

            *self.occ_mut(captured.color()) ^= bit;
        }

        let mask = Bitboard::from_square(src) | Bitboard::from_square(dst);

        let state = self.curr_mut();
        state.mailbox[src.index()] = None;
        state.mailbox[dst.index()] = Some(piece);
        state.boards[piece.index()] ^= mask;

        if piece == Piece::BLACK_KING {
            state.black_king = dst;
        } else if piece == Piece::WHITE_KING {
            state.white_king = dst;
        }

        state.material += material::piece_square_value(piece, dst)
            - material::piece_square_value(piece, src);

        let hash = zobrist::piece_square(piece, src) ^ zobrist::piece_square(piece, dst);
        state.key ^= hash;
        if piece.piece_type() == PieceType::Pawn {
            state.pawn_key ^= hash;
        }

        *self.occ_mut(piece.color()) ^= mask;

        captured
    }

    /// Advance the pawn on `src` to `dst` as `target`, returning any capture.
    fn promote_pawn(&mut self, src: Square, dst: Square, target: PieceType) -> Option<Piece> {
        let pawn = self.curr().mailbox[src.index()].expect("promotion from empty square");
        let color = pawn.color();
        let promoted = Piece::new(target, color);

        let captured = self.curr().mailbox[dst.index()];

        if let Some(captured) = captured {
            let bit = Bitboard::from_square(dst);
            let state = self.curr_mut();
            state.boards[captured.index()] ^= bit;
            state.phase -= material::phase_weight(captured.piece_type());
            state.material -= material::piece_square_value(captured, dst);

            // a pawn can never be captured on the promotion rank
            state.key ^= zobrist::piece_square(captured, dst);

            *self.occ_mut(captured.color()) ^= bit;
        }

        let mask = Bitboard::from_square(src) | Bitboard::from_square(dst);

        let state = self.curr_mut();
        state.mailbox[src.index()] = None;
        state.mailbox[dst.index()] = Some(promoted);
        state.boards[pawn.index()] ^= Bitboard::from_square(src);
        state.boards[promoted.index()] |= Bitboard::from_square(dst);

        state.phase += material::phase_weight(target);

        state.material += material::piece_square_value(promoted, dst)
            - material::piece_square_value(pawn, src);

        let pawn_hash = zobrist::piece_square(pawn, src);
        state.key ^= pawn_hash ^ zobrist::piece_square(promoted, dst);
        state.pawn_key ^= pawn_hash;

        *self.occ_mut(color) ^= mask;

        captured
    }

    /// Castle with the king on `king_src` and the rook on `rook_src`.
    ///
    /// Destinations are g/f for kingside and c/d for queenside on the shared
    /// back rank; in Chess960 king and rook may start anywhere on it,
    /// including on each other's destination squares.
    fn castle(&mut self, king_src: Square, rook_src: Square) {
        let rank = king_src.rank();

        let (king_dst, rook_dst) = if king_src.file() < rook_src.file() {
            (Square::new(rank, 6), Square::new(rank, 5))
        } else {
            (Square::new(rank, 2), Square::new(rank, 3))
        };

        if self.chess960 {
            let rook = self.remove_piece(rook_src).expect("castling without rook");

            if king_src != king_dst {
                self.move_piece(king_src, king_dst);
            }

            self.set_piece(rook_dst, rook);
        } else {
            self.move_piece(king_src, king_dst);
            self.move_piece(rook_src, rook_dst);
        }
    }

    /// Capture en passant: the attacker lands on `dst`, the victim stands
    /// one rank behind it.
    fn en_passant_capture(&mut self, src: Square, dst: Square) -> Piece {
        let pawn = self.curr().mailbox[src.index()].expect("en passant from empty square");
        let color = pawn.color();

        let mask = Bitboard::from_square(src) | Bitboard::from_square(dst);

        let state = self.curr_mut();
        state.mailbox[src.index()] = None;
        state.mailbox[dst.index()] = Some(pawn);
        state.boards[pawn.index()] ^= mask;

        state.material += material::piece_square_value(pawn, dst)
            - material::piece_square_value(pawn, src);

        let hash = zobrist::piece_square(pawn, src) ^ zobrist::piece_square(pawn, dst);
        state.key ^= hash;
        state.pawn_key ^= hash;

        *self.occ_mut(color) ^= mask;

        let victim_rank = if dst.rank() == 2 { 3 } else { 4 };
        let victim_sq = Square::new(victim_rank, dst.file());

        let victim = self.curr().mailbox[victim_sq.index()].expect("en passant without victim");
        let victim_bit = Bitboard::from_square(victim_sq);

        let state = self.curr_mut();
        state.mailbox[victim_sq.index()] = None;
        state.boards[victim.index()] ^= victim_bit;

        // pawns do not affect game phase

        state.material -= material::piece_square_value(victim, victim_sq);

        let victim_hash = zobrist::piece_square(victim, victim_sq);
        state.key ^= victim_hash;
        state.pawn_key ^= victim_hash;

        *self.occ_mut(victim.color()) ^= victim_bit;

        victim
    }

    /// Apply a move known to be pseudo-legal, pushing the prior frame.
    ///
    /// A null move flips the side to move and clears the en-passant square.
    /// `prefetch` issues a best-effort TT cache hint for the resulting key.
    pub fn apply_move_unchecked(&mut self, mv: Move, prefetch: Option<&TranspositionTable>) {
        self.curr_mut().last_move = mv;
        let next = self.curr().clone();
        self.states.push(next);

        self.black_to_move = !self.black_to_move;

        {
            let state = self.curr_mut();
            state.key ^= zobrist::color_flip();
            state.pawn_key ^= zobrist::color_flip();

            if let Some(ep) = state.en_passant.take() {
                state.key ^= zobrist::en_passant_file(ep.file());
            }
        }

        if mv.is_null() {
            self.curr_mut().halfmove += 1;
            let checkers = self.calc_checkers();
            self.curr_mut().checkers = checkers;
            return;
        }

        let src = mv.src();
        let dst = mv.dst();

        let moving = self.piece_at(src).expect("corrupt board state");
        let mover = moving.color();

        if mover == Color::Black {
            self.fullmove += 1;
        }

        let mut new_rooks = self.curr().castling_rooks;

        if moving.piece_type() == PieceType::Rook {
            new_rooks.color_mut(mover).unset(src);
        } else if moving.piece_type() == PieceType::King {
            new_rooks.color_mut(mover).clear();
        } else if moving == Piece::BLACK_PAWN && src.rank() == 6 && dst.rank() == 4 {
            let ep = Square::new(5, src.file());
            let state = self.curr_mut();
            state.en_passant = Some(ep);
            state.key ^= zobrist::en_passant_file(ep.file());
        } else if moving == Piece::WHITE_PAWN && src.rank() == 1 && dst.rank() == 3 {
            let ep = Square::new(2, src.file());
            let state = self.curr_mut();
            state.en_passant = Some(ep);
            state.key ^= zobrist::en_passant_file(ep.file());
        }

        let captured = match mv.kind() {
            MoveKind::Standard => self.move_piece(src, dst),
            MoveKind::Promotion => self.promote_pawn(src, dst, mv.promo_target()),
            MoveKind::Castling => {
                self.castle(src, dst);
                None
            }
            MoveKind::EnPassant => Some(self.en_passant_capture(src, dst)),
        };

        let prev = self.states.len() - 2;
        self.states[prev].captured = captured;

        if let Some(captured) = captured {
            if captured.piece_type() == PieceType::Rook {
                new_rooks.color_mut(captured.color()).unset(dst);
            }
        }

        if new_rooks != self.curr().castling_rooks {
            let state = self.curr_mut();
            state.key ^=
                zobrist::castling(&new_rooks) ^ zobrist::castling(&state.castling_rooks);
            state.castling_rooks = new_rooks;
        }

        {
            let reset = moving.piece_type() == PieceType::Pawn || captured.is_some();
            let state = self.curr_mut();
            state.halfmove = if reset { 0 } else { state.halfmove + 1 };
        }

        if let Some(tt) = prefetch {
            tt.prefetch(self.curr().key);
        }

        let checkers = self.calc_checkers();
        self.curr_mut().checkers = checkers;
    }

    /// Apply a pseudo-legal move without a TT prefetch.
    #[inline]
    pub fn apply_move(&mut self, mv: Move) {
        self.apply_move_unchecked(mv, None);
    }

    /// Pass the move to the opponent; undone by `pop_move` like any move.
    #[inline]
    pub fn apply_null_move(&mut self) {
        self.apply_move_unchecked(Move::default(), None);
    }

    /// Undo the last applied move.
    pub fn pop_move(&mut self) {
        debug_assert!(self.states.len() > 1, "pop_move with no previous move");

        self.states.pop();
        self.black_to_move = !self.black_to_move;

        if self.curr().last_move.is_null() {
            return;
        }

        self.black_occ = self.color_union(Color::Black);
        self.white_occ = self.color_union(Color::White);

        if self.side_to_move() == Color::Black {
            self.fullmove -= 1;
        }
    }

    /// Validate a hash-table or killer move against the current position.
    ///
    /// Standard moves are checked directly (piece present, motion geometry,
    /// no self-capture, no king capture, pawn direction and blocker rules,
    /// en-passant file match); the rarer kinds fall back to full generation.
    #[must_use]
    pub fn is_pseudo_legal(&self, mv: Move) -> bool {
        if mv.is_null() {
            return false;
        }

        let us = self.side_to_move();

        let src = mv.src();
        let Some(src_piece) = self.piece_at(src) else {
            return false;
        };

        if src_piece.color() != us {
            return false;
        }

        let dst = mv.dst();
        let dst_piece = self.piece_at(dst);

        if let Some(dp) = dst_piece {
            // no self-captures except the king taking its own castling
            // rook, and no king captures ever
            let own_rook_castle =
                mv.kind() == MoveKind::Castling && dp == Piece::new(PieceType::Rook, us);
            if (dp.color() == us && !own_rook_castle) || dp.piece_type() == PieceType::King {
                return false;
            }
        }

        if mv.kind() != MoveKind::Standard {
            let mut moves = ScoredMoveList::new();
            self.generate_all(&mut moves);
            return moves.contains(mv);
        }

        let them = us.flip();
        let occupancy = self.occupancy_all();

        if src_piece.piece_type() == PieceType::Pawn {
            let src_rank = src.rank() as i32;
            let dst_rank = dst.rank() as i32;

            // backwards move
            if (us == Color::Black && dst_rank >= src_rank)
                || (us == Color::White && dst_rank <= src_rank)
            {
                return false;
            }

            // non-promotion move to the back rank
            if dst.relative_rank(us) == 7 {
                return false;
            }

            if src.file() != dst.file() {
                // diagonal moves must capture something, possibly en passant
                let ep_bit = self
                    .en_passant()
                    .map_or(Bitboard::EMPTY, Bitboard::from_square);

                if !(attack_tables::pawn_attacks(src, us) & (self.occupancy(them) | ep_bit))
                    .contains(dst)
                {
                    return false;
                }
            } else if dst_piece.is_some() {
                return false;
            }

            let delta = (dst_rank - src_rank).abs();

            let start_rank = if us == Color::Black { 6 } else { 1 };
            let max_delta = if src_rank == start_rank { 2 } else { 1 };

            if delta > max_delta {
                return false;
            }

            // double pushes must clear the intermediate square
            if delta == 2 {
                let skipped = dst.offset(if us == Color::White { -8 } else { 8 });
                if occupancy.contains(skipped) {
                    return false;
                }
            }
        } else if !attack_tables::piece_attacks(src_piece.piece_type(), src, occupancy)
            .contains(dst)
        {
            return false;
        }

        true
    }
}
