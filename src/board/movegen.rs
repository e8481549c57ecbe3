//! Staged pseudo-legal move generation.
//!
//! The same core routines serve three entry points by varying the
//! destination mask: `generate_noisy` (captures, en passant, queen
//! promotions), `generate_quiet` (non-captures, underpromotions, castling),
//! and `generate_all` (their union, for perft and legality validation).
//! Legality proper (pins, moving into check) is the caller's business.

use super::attack_tables::{self, ray_between};
use super::state::Position;
use super::types::{Bitboard, Color, Move, PieceType, ScoredMoveList, Square};

/// Forward shift offset for the side to move.
#[inline]
const fn up_offset(color: Color) -> i32 {
    match color {
        Color::Black => -8,
        Color::White => 8,
    }
}

#[inline]
const fn up_left_offset(color: Color) -> i32 {
    match color {
        Color::Black => -9,
        Color::White => 7,
    }
}

#[inline]
const fn up_right_offset(color: Color) -> i32 {
    match color {
        Color::Black => -7,
        Color::White => 9,
    }
}

fn push_standards_offset(dst: &mut ScoredMoveList, offset: i32, mut board: Bitboard) {
    while !board.is_empty() {
        let to = board.pop_lowest_square();
        dst.push(Move::standard(to.offset(-offset), to));
    }
}

fn push_standards_from(dst: &mut ScoredMoveList, src: Square, mut board: Bitboard) {
    while !board.is_empty() {
        let to = board.pop_lowest_square();
        dst.push(Move::standard(src, to));
    }
}

fn push_queen_promotions(noisy: &mut ScoredMoveList, offset: i32, mut board: Bitboard) {
    while !board.is_empty() {
        let to = board.pop_lowest_square();
        noisy.push(Move::promotion(to.offset(-offset), to, PieceType::Queen));
    }
}

fn push_underpromotions(quiet: &mut ScoredMoveList, offset: i32, mut board: Bitboard) {
    while !board.is_empty() {
        let to = board.pop_lowest_square();
        let from = to.offset(-offset);
        quiet.push(Move::promotion(from, to, PieceType::Knight));
        quiet.push(Move::promotion(from, to, PieceType::Rook));
        quiet.push(Move::promotion(from, to, PieceType::Bishop));
    }
}

fn push_en_passants(noisy: &mut ScoredMoveList, offset: i32, mut board: Bitboard) {
    while !board.is_empty() {
        let to = board.pop_lowest_square();
        noisy.push(Move::en_passant(to.offset(-offset), to));
    }
}

fn generate_pawns_noisy(noisy: &mut ScoredMoveList, pos: &Position, dst_mask: Bitboard) {
    let us = pos.side_to_move();
    let them = pos.opponent();

    let promo_rank = Bitboard::promotion_rank(us);

    let forward = up_offset(us);
    let left = up_left_offset(us);
    let right = up_right_offset(us);

    let theirs = pos.occupancy(them);

    let forward_dst_mask = dst_mask & promo_rank & !theirs;

    let pawns = pos.pawns(us);

    let left_attacks = pawns.shift_up_left_relative(us) & dst_mask;
    let right_attacks = pawns.shift_up_right_relative(us) & dst_mask;

    push_queen_promotions(noisy, left, left_attacks & theirs & promo_rank);
    push_queen_promotions(noisy, right, right_attacks & theirs & promo_rank);

    let forwards = pawns.shift_up_relative(us) & forward_dst_mask;
    push_queen_promotions(noisy, forward, forwards);

    push_standards_offset(noisy, left, left_attacks & theirs & !promo_rank);
    push_standards_offset(noisy, right, right_attacks & theirs & !promo_rank);

    if let Some(ep) = pos.en_passant() {
        let ep_mask = Bitboard::from_square(ep);
        push_en_passants(noisy, left, left_attacks & ep_mask);
        push_en_passants(noisy, right, right_attacks & ep_mask);
    }
}

fn generate_pawns_quiet(
    quiet: &mut ScoredMoveList,
    pos: &Position,
    dst_mask: Bitboard,
    occupancy: Bitboard,
) {
    let us = pos.side_to_move();
    let them = pos.opponent();

    let promo_rank = Bitboard::promotion_rank(us);
    let third_rank = Bitboard::relative_rank(us, 2);

    let forward = up_offset(us);
    let double = forward * 2;

    let left = up_left_offset(us);
    let right = up_right_offset(us);

    let theirs = pos.occupancy(them);

    let forward_dst_mask = dst_mask & !theirs;

    let pawns = pos.pawns(us);

    let left_attacks = pawns.shift_up_left_relative(us) & dst_mask;
    let right_attacks = pawns.shift_up_right_relative(us) & dst_mask;

    push_underpromotions(quiet, left, left_attacks & theirs & promo_rank);
    push_underpromotions(quiet, right, right_attacks & theirs & promo_rank);

    let mut forwards = pawns.shift_up_relative(us) & !occupancy;

    let mut singles = forwards & forward_dst_mask;
    push_underpromotions(quiet, forward, singles & promo_rank);
    singles &= !promo_rank;

    forwards &= third_rank;
    let doubles = forwards.shift_up_relative(us) & forward_dst_mask;

    push_standards_offset(quiet, double, doubles);
    push_standards_offset(quiet, forward, singles);
}

fn generate_knights(dst: &mut ScoredMoveList, pos: &Position, dst_mask: Bitboard) {
    let mut knights = pos.knights(pos.side_to_move());
    while !knights.is_empty() {
        let src = knights.pop_lowest_square();
        push_standards_from(dst, src, attack_tables::knight_attacks(src) & dst_mask);
    }
}

fn generate_sliders(dst: &mut ScoredMoveList, pos: &Position, dst_mask: Bitboard) {
    let us = pos.side_to_move();
    let occupancy = pos.occupancy_all();

    let queens = pos.queens(us);

    let mut rooks = queens | pos.rooks(us);
    let mut bishops = queens | pos.bishops(us);

    while !rooks.is_empty() {
        let src = rooks.pop_lowest_square();
        push_standards_from(dst, src, attack_tables::rook_attacks(src, occupancy) & dst_mask);
    }

    while !bishops.is_empty() {
        let src = bishops.pop_lowest_square();
        push_standards_from(
            dst,
            src,
            attack_tables::bishop_attacks(src, occupancy) & dst_mask,
        );
    }
}

/// Chess960 castling: both cleared paths must be empty ignoring the king and
/// rook themselves, and the king's travel line including the destination
/// must be safe.
#[allow(clippy::too_many_arguments)]
fn generate_frc_castling(
    dst: &mut ScoredMoveList,
    pos: &Position,
    occupancy: Bitboard,
    king: Square,
    king_dst: Square,
    rook: Square,
    rook_dst: Square,
) {
    let to_king_dst = ray_between(king, king_dst);
    let to_rook = ray_between(king, rook);

    let occ = occupancy ^ Bitboard::from_square(king) ^ Bitboard::from_square(rook);

    if (occ
        & (to_king_dst | to_rook | Bitboard::from_square(king_dst) | Bitboard::from_square(rook_dst)))
    .is_empty()
        && !pos.any_attacked(
            to_king_dst | Bitboard::from_square(king_dst),
            pos.opponent(),
        )
    {
        dst.push(Move::castling(king, rook));
    }
}

fn generate_kings(dst: &mut ScoredMoveList, pos: &Position, dst_mask: Bitboard, castling: bool) {
    let us = pos.side_to_move();

    push_standards_from(
        dst,
        pos.king(us),
        attack_tables::king_attacks(pos.king(us)) & dst_mask,
    );

    if !castling || pos.is_check() {
        return;
    }

    let rooks = *pos.castling_rooks();
    let occupancy = pos.occupancy_all();

    if pos.is_chess960() {
        let (king, back) = match us {
            Color::Black => (pos.king(us), 7),
            Color::White => (pos.king(us), 0),
        };

        if let Some(rook) = rooks.color(us).kingside {
            generate_frc_castling(
                dst,
                pos,
                occupancy,
                king,
                Square::new(back, 6),
                rook,
                Square::new(back, 5),
            );
        }
        if let Some(rook) = rooks.color(us).queenside {
            generate_frc_castling(
                dst,
                pos,
                occupancy,
                king,
                Square::new(back, 2),
                rook,
                Square::new(back, 3),
            );
        }
    } else {
        match us {
            Color::Black => {
                if let Some(rook) = rooks.black.kingside {
                    if (occupancy & Bitboard(0x6000_0000_0000_0000)).is_empty()
                        && !pos.is_attacked(Square::F8, Color::White)
                    {
                        dst.push(Move::castling(pos.king(us), rook));
                    }
                }
                if let Some(rook) = rooks.black.queenside {
                    if (occupancy & Bitboard(0x0E00_0000_0000_0000)).is_empty()
                        && !pos.is_attacked(Square::D8, Color::White)
                    {
                        dst.push(Move::castling(pos.king(us), rook));
                    }
                }
            }
            Color::White => {
                if let Some(rook) = rooks.white.kingside {
                    if (occupancy & Bitboard(0x0000_0000_0000_0060)).is_empty()
                        && !pos.is_attacked(Square::F1, Color::Black)
                    {
                        dst.push(Move::castling(pos.king(us), rook));
                    }
                }
                if let Some(rook) = rooks.white.queenside {
                    if (occupancy & Bitboard(0x0000_0000_0000_000E)).is_empty()
                        && !pos.is_attacked(Square::D1, Color::Black)
                    {
                        dst.push(Move::castling(pos.king(us), rook));
                    }
                }
            }
        }
    }
}

impl Position {
    /// Captures, en passant, and queen promotions.
    pub fn generate_noisy(&self, noisy: &mut ScoredMoveList) {
        let us = self.side_to_move();
        let them = self.opponent();

        let ours = self.occupancy(us);

        let king_dst_mask = self.occupancy(them);
        let mut dst_mask = king_dst_mask;

        let mut ep_mask = Bitboard::EMPTY;
        let mut ep_pawn = Bitboard::EMPTY;

        if let Some(ep) = self.en_passant() {
            ep_mask = Bitboard::from_square(ep);
            ep_pawn = ep_mask.shift_down_relative(us);
        }

        // queen promotions are noisy even without a capture
        let promos = !ours & Bitboard::promotion_rank(us);

        let mut pawn_dst_mask = king_dst_mask | ep_mask | promos;

        if self.is_check() {
            if self.checkers().multiple() {
                generate_kings(noisy, self, king_dst_mask, false);
                return;
            }

            dst_mask = self.checkers();

            pawn_dst_mask = king_dst_mask
                | (promos & ray_between(self.king(us), self.checkers().lowest_square()));

            // the pawn that just double-pushed is the checker
            if !(self.checkers() & ep_pawn).is_empty() {
                pawn_dst_mask |= ep_mask;
            }
        }

        generate_sliders(noisy, self, dst_mask);
        generate_pawns_noisy(noisy, self, pawn_dst_mask);
        generate_knights(noisy, self, dst_mask);
        generate_kings(noisy, self, king_dst_mask, false);
    }

    /// Non-captures, underpromotions, and castling.
    pub fn generate_quiet(&self, quiet: &mut ScoredMoveList) {
        let us = self.side_to_move();
        let them = self.opponent();

        let ours = self.occupancy(us);
        let theirs = self.occupancy(them);

        let king_dst_mask = !(ours | theirs);
        let mut dst_mask = king_dst_mask;
        // underpromotions may land on the blocking squares
        let mut pawn_dst_mask;

        if self.is_check() {
            if self.checkers().multiple() {
                generate_kings(quiet, self, king_dst_mask, false);
                return;
            }

            dst_mask = ray_between(self.king(us), self.checkers().lowest_square());
            pawn_dst_mask = dst_mask | (self.checkers() & Bitboard::promotion_rank(us));
        } else {
            pawn_dst_mask = king_dst_mask | Bitboard::promotion_rank(us);
        }

        generate_sliders(quiet, self, dst_mask);
        generate_pawns_quiet(quiet, self, pawn_dst_mask, ours | theirs);
        generate_knights(quiet, self, dst_mask);
        generate_kings(quiet, self, king_dst_mask, true);
    }

    /// Every pseudo-legal move; the union of the noisy and quiet stages.
    pub fn generate_all(&self, dst: &mut ScoredMoveList) {
        let us = self.side_to_move();

        let king_dst_mask = !self.occupancy(us);
        let mut dst_mask = king_dst_mask;

        let mut ep_mask = Bitboard::EMPTY;
        let mut ep_pawn = Bitboard::EMPTY;

        if let Some(ep) = self.en_passant() {
            ep_mask = Bitboard::from_square(ep);
            ep_pawn = ep_mask.shift_down_relative(us);
        }

        let mut pawn_dst_mask = king_dst_mask;

        if self.is_check() {
            if self.checkers().multiple() {
                generate_kings(dst, self, king_dst_mask, false);
                return;
            }

            dst_mask = self.checkers()
                | ray_between(self.king(us), self.checkers().lowest_square());
            pawn_dst_mask = dst_mask;

            if !(self.checkers() & ep_pawn).is_empty() {
                pawn_dst_mask |= ep_mask;
            }
        }

        generate_sliders(dst, self, dst_mask);
        generate_pawns_noisy(dst, self, pawn_dst_mask);
        generate_pawns_quiet(dst, self, dst_mask, self.occupancy_all());
        generate_knights(dst, self, dst_mask);
        generate_kings(dst, self, king_dst_mask, true);
    }
}
