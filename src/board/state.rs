//! Position state: the per-ply frame stack and read-only queries.

use super::attack_tables;
use super::material;
use super::types::{
    Bitboard, CastlingRooks, Color, Move, MoveKind, Piece, PieceType, Score, Square, TaperedScore,
    NULL_MOVE,
};

/// Everything that changes per ply; one frame per applied move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardState {
    pub(crate) boards: [Bitboard; 12],
    pub(crate) mailbox: [Option<Piece>; 64],

    pub(crate) key: u64,
    pub(crate) pawn_key: u64,

    pub(crate) material: TaperedScore,

    pub(crate) checkers: Bitboard,

    pub(crate) phase: i32,

    pub(crate) castling_rooks: CastlingRooks,

    pub(crate) last_move: Move,

    pub(crate) halfmove: u16,

    pub(crate) captured: Option<Piece>,

    pub(crate) en_passant: Option<Square>,

    pub(crate) black_king: Square,
    pub(crate) white_king: Square,
}

impl Default for BoardState {
    fn default() -> Self {
        BoardState {
            boards: [Bitboard::EMPTY; 12],
            mailbox: [None; 64],
            key: 0,
            pawn_key: 0,
            material: TaperedScore::default(),
            checkers: Bitboard::EMPTY,
            phase: 0,
            castling_rooks: CastlingRooks::default(),
            last_move: NULL_MOVE,
            halfmove: 0,
            captured: None,
            en_passant: None,
            black_king: Square::A1,
            white_king: Square::A1,
        }
    }
}

/// A chess position with its history stack.
///
/// Each applied move pushes the current frame; `pop_move` restores it in
/// O(1). Every search worker owns its own `Position`.
#[derive(Clone, Debug)]
pub struct Position {
    pub(crate) black_occ: Bitboard,
    pub(crate) white_occ: Bitboard,

    pub(crate) black_to_move: bool,

    pub(crate) fullmove: u32,

    pub(crate) chess960: bool,

    pub(crate) states: Vec<BoardState>,
}

impl Position {
    pub(crate) fn new_empty() -> Self {
        let mut states = Vec::with_capacity(256);
        states.push(BoardState::default());

        Position {
            black_occ: Bitboard::EMPTY,
            white_occ: Bitboard::EMPTY,
            black_to_move: false,
            fullmove: 1,
            chess960: false,
            states,
        }
    }

    /// The standard starting position.
    #[must_use]
    pub fn starting() -> Self {
        let mut position = Position::new_empty();

        {
            let state = position.curr_mut();

            let back_rank = [
                PieceType::Rook,
                PieceType::Knight,
                PieceType::Bishop,
                PieceType::Queen,
                PieceType::King,
                PieceType::Bishop,
                PieceType::Knight,
                PieceType::Rook,
            ];

            for (file, &pt) in back_rank.iter().enumerate() {
                state.mailbox[Square::new(0, file).index()] = Some(Piece::new(pt, Color::White));
                state.mailbox[Square::new(7, file).index()] = Some(Piece::new(pt, Color::Black));
                state.mailbox[Square::new(1, file).index()] = Some(Piece::WHITE_PAWN);
                state.mailbox[Square::new(6, file).index()] = Some(Piece::BLACK_PAWN);
            }

            state.castling_rooks = CastlingRooks::startpos();
        }

        position.regen();
        position
    }

    #[inline]
    pub(crate) fn curr(&self) -> &BoardState {
        self.states.last().expect("state stack is never empty")
    }

    #[inline]
    pub(crate) fn curr_mut(&mut self) -> &mut BoardState {
        self.states.last_mut().expect("state stack is never empty")
    }

    /// Enable or disable Chess960 castling semantics.
    pub fn set_chess960(&mut self, enabled: bool) {
        self.chess960 = enabled;
    }

    #[inline]
    #[must_use]
    pub fn is_chess960(&self) -> bool {
        self.chess960
    }

    #[inline]
    #[must_use]
    pub fn side_to_move(&self) -> Color {
        if self.black_to_move {
            Color::Black
        } else {
            Color::White
        }
    }

    #[inline]
    #[must_use]
    pub fn opponent(&self) -> Color {
        self.side_to_move().flip()
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> u64 {
        self.curr().key
    }

    #[inline]
    #[must_use]
    pub fn pawn_key(&self) -> u64 {
        self.curr().pawn_key
    }

    #[inline]
    #[must_use]
    pub fn material(&self) -> TaperedScore {
        self.curr().material
    }

    /// Game phase clamped to [0, 24].
    #[inline]
    #[must_use]
    pub fn phase(&self) -> i32 {
        self.curr().phase.clamp(0, 24)
    }

    /// Blend a tapered score by the current phase.
    #[inline]
    #[must_use]
    pub fn interp_score(&self, score: TaperedScore) -> Score {
        score.interp(self.phase())
    }

    #[inline]
    #[must_use]
    pub fn halfmove(&self) -> u16 {
        self.curr().halfmove
    }

    #[inline]
    #[must_use]
    pub fn fullmove(&self) -> u32 {
        self.fullmove
    }

    #[inline]
    #[must_use]
    pub fn en_passant(&self) -> Option<Square> {
        self.curr().en_passant
    }

    #[inline]
    #[must_use]
    pub fn castling_rooks(&self) -> &CastlingRooks {
        &self.curr().castling_rooks
    }

    #[inline]
    #[must_use]
    pub fn checkers(&self) -> Bitboard {
        self.curr().checkers
    }

    #[inline]
    #[must_use]
    pub fn is_check(&self) -> bool {
        !self.curr().checkers.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn king(&self, color: Color) -> Square {
        match color {
            Color::Black => self.curr().black_king,
            Color::White => self.curr().white_king,
        }
    }

    #[inline]
    #[must_use]
    pub fn king_pair(&self) -> (Square, Square) {
        (self.curr().black_king, self.curr().white_king)
    }

    /// The full per-piece bitboard set, indexed by `Piece::index`.
    #[inline]
    #[must_use]
    pub fn boards(&self) -> &[Bitboard; 12] {
        &self.curr().boards
    }

    /// The redundant square-indexed mailbox.
    #[inline]
    #[must_use]
    pub fn mailbox(&self) -> &[Option<Piece>; 64] {
        &self.curr().mailbox
    }

    #[inline]
    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.curr().mailbox[sq.index()]
    }

    #[inline]
    #[must_use]
    pub fn board(&self, piece: Piece) -> Bitboard {
        self.curr().boards[piece.index()]
    }

    #[inline]
    #[must_use]
    pub fn colored(&self, piece_type: PieceType, color: Color) -> Bitboard {
        self.board(Piece::new(piece_type, color))
    }

    #[inline]
    #[must_use]
    pub fn occupancy(&self, color: Color) -> Bitboard {
        match color {
            Color::Black => self.black_occ,
            Color::White => self.white_occ,
        }
    }

    #[inline]
    #[must_use]
    pub fn occupancy_all(&self) -> Bitboard {
        self.black_occ | self.white_occ
    }

    #[inline]
    #[must_use]
    pub fn pawns(&self, color: Color) -> Bitboard {
        self.colored(PieceType::Pawn, color)
    }

    #[inline]
    #[must_use]
    pub fn knights(&self, color: Color) -> Bitboard {
        self.colored(PieceType::Knight, color)
    }

    #[inline]
    #[must_use]
    pub fn bishops(&self, color: Color) -> Bitboard {
        self.colored(PieceType::Bishop, color)
    }

    #[inline]
    #[must_use]
    pub fn rooks(&self, color: Color) -> Bitboard {
        self.colored(PieceType::Rook, color)
    }

    #[inline]
    #[must_use]
    pub fn queens(&self, color: Color) -> Bitboard {
        self.colored(PieceType::Queen, color)
    }

    #[inline]
    #[must_use]
    pub fn kings(&self, color: Color) -> Bitboard {
        self.colored(PieceType::King, color)
    }

    #[inline]
    #[must_use]
    pub fn minors(&self, color: Color) -> Bitboard {
        self.knights(color) | self.bishops(color)
    }

    #[inline]
    #[must_use]
    pub fn majors(&self, color: Color) -> Bitboard {
        self.rooks(color) | self.queens(color)
    }

    /// Everything except pawns and the king
    #[inline]
    #[must_use]
    pub fn non_pk(&self, color: Color) -> Bitboard {
        self.minors(color) | self.majors(color)
    }

    /// Union of `attacker`'s pieces attacking `sq` under the current
    /// occupancy.
    #[must_use]
    pub fn attackers_to(&self, sq: Square, attacker: Color) -> Bitboard {
        let occupancy = self.occupancy_all();

        let queens = self.queens(attacker);

        let mut attackers =
            (queens | self.rooks(attacker)) & attack_tables::rook_attacks(sq, occupancy);

        attackers |= (queens | self.bishops(attacker)) & attack_tables::bishop_attacks(sq, occupancy);

        attackers |= self.pawns(attacker) & attack_tables::pawn_attacks(sq, attacker.flip());

        attackers |= self.knights(attacker) & attack_tables::knight_attacks(sq);

        attackers |= self.kings(attacker) & attack_tables::king_attacks(sq);

        attackers
    }

    /// Union of pieces of both colors attacking `sq` under an arbitrary
    /// occupancy; used by SEE-style scans.
    #[must_use]
    pub fn all_attackers_to(&self, sq: Square, occupancy: Bitboard) -> Bitboard {
        let queens = self.queens(Color::Black) | self.queens(Color::White);

        let rooks = queens | self.rooks(Color::Black) | self.rooks(Color::White);
        let mut attackers = rooks & attack_tables::rook_attacks(sq, occupancy);

        let bishops = queens | self.bishops(Color::Black) | self.bishops(Color::White);
        attackers |= bishops & attack_tables::bishop_attacks(sq, occupancy);

        attackers |= self.pawns(Color::Black) & attack_tables::pawn_attacks(sq, Color::White);
        attackers |= self.pawns(Color::White) & attack_tables::pawn_attacks(sq, Color::Black);

        let knights = self.knights(Color::Black) | self.knights(Color::White);
        attackers |= knights & attack_tables::knight_attacks(sq);

        let kings = self.kings(Color::Black) | self.kings(Color::White);
        attackers |= kings & attack_tables::king_attacks(sq);

        attackers
    }

    /// Cheaper attack test that short-circuits per piece group.
    #[must_use]
    pub fn is_attacked(&self, sq: Square, attacker: Color) -> bool {
        let occupancy = self.occupancy_all();

        if !(self.knights(attacker) & attack_tables::knight_attacks(sq)).is_empty() {
            return true;
        }

        if !(self.pawns(attacker) & attack_tables::pawn_attacks(sq, attacker.flip())).is_empty() {
            return true;
        }

        if !(self.kings(attacker) & attack_tables::king_attacks(sq)).is_empty() {
            return true;
        }

        let queens = self.queens(attacker);

        if !((queens | self.bishops(attacker)) & attack_tables::bishop_attacks(sq, occupancy))
            .is_empty()
        {
            return true;
        }

        if !((queens | self.rooks(attacker)) & attack_tables::rook_attacks(sq, occupancy))
            .is_empty()
        {
            return true;
        }

        false
    }

    /// Whether any square in `squares` is attacked by `attacker`.
    #[must_use]
    pub fn any_attacked(&self, squares: Bitboard, attacker: Color) -> bool {
        squares.iter().any(|sq| self.is_attacked(sq, attacker))
    }

    #[inline]
    pub(crate) fn calc_checkers(&self) -> Bitboard {
        let us = self.side_to_move();
        self.attackers_to(self.king(us), us.flip())
    }

    /// The last move applied, or null at the root.
    #[inline]
    #[must_use]
    pub fn last_move(&self) -> Move {
        if self.states.len() < 2 {
            NULL_MOVE
        } else {
            self.states[self.states.len() - 2].last_move
        }
    }

    /// The piece a move would capture, if any.
    #[must_use]
    pub fn capture_target(&self, mv: Move) -> Option<Piece> {
        match mv.kind() {
            MoveKind::Castling => None,
            MoveKind::EnPassant => self.piece_at(mv.src()).map(Piece::flip_color),
            _ => self.piece_at(mv.dst()),
        }
    }

    /// Captures, en passant, and queen promotions.
    #[must_use]
    pub fn is_noisy(&self, mv: Move) -> bool {
        match mv.kind() {
            MoveKind::Castling => false,
            MoveKind::EnPassant => true,
            MoveKind::Promotion => {
                mv.promo_target() == PieceType::Queen || self.piece_at(mv.dst()).is_some()
            }
            MoveKind::Standard => self.piece_at(mv.dst()).is_some(),
        }
    }

    /// Draw by the 50-move rule, repetition, or insufficient material.
    ///
    /// `ply` is the distance from the search root; a single repetition that
    /// occurs inside the current search line already counts as a draw, while
    /// repetitions spanning the game history require the full three-fold.
    #[must_use]
    pub fn is_drawn(&self, ply: usize) -> bool {
        let state = self.curr();

        if state.halfmove >= 100 {
            return true;
        }

        let len = self.states.len();
        let window = (state.halfmove as usize).min(len - 1);

        let mut repetitions = 0;
        let mut dist = 4;
        while dist <= window {
            if self.states[len - 1 - dist].key == state.key {
                if ply > dist {
                    return true;
                }
                repetitions += 1;
                if repetitions == 2 {
                    return true;
                }
            }
            dist += 2;
        }

        self.is_insufficient_material()
    }

    fn is_insufficient_material(&self) -> bool {
        if !self.pawns(Color::Black).is_empty()
            || !self.pawns(Color::White).is_empty()
            || !self.majors(Color::Black).is_empty()
            || !self.majors(Color::White).is_empty()
        {
            return false;
        }

        let black_np = self.non_pk(Color::Black);
        let white_np = self.non_pk(Color::White);

        // KvK
        if black_np.is_empty() && white_np.is_empty() {
            return true;
        }

        // KNvK or KBvK
        if (black_np.is_empty() && !white_np.multiple())
            || (white_np.is_empty() && !black_np.multiple())
        {
            return true;
        }

        // KBvKB with bishops on opposite square colors
        let black_bishops = self.bishops(Color::Black);
        let white_bishops = self.bishops(Color::White);

        if black_np == black_bishops
            && white_np == white_bishops
            && !black_bishops.multiple()
            && !white_bishops.multiple()
        {
            let black_light = !(black_bishops & Bitboard::LIGHT_SQUARES).is_empty();
            let white_light = !(white_bishops & Bitboard::LIGHT_SQUARES).is_empty();
            return black_light != white_light;
        }

        false
    }

    /// Material configurations that are drawn in practice but not forced:
    /// lone minors, KNNvK, KBBvKB.
    #[must_use]
    pub fn is_likely_drawn(&self) -> bool {
        if !self.pawns(Color::Black).is_empty()
            || !self.pawns(Color::White).is_empty()
            || !self.majors(Color::Black).is_empty()
            || !self.majors(Color::White).is_empty()
        {
            return false;
        }

        let black_np = self.non_pk(Color::Black);
        let white_np = self.non_pk(Color::White);

        // KNK or KNNK
        if (black_np.is_empty()
            && white_np == self.knights(Color::White)
            && white_np.popcount() < 3)
            || (white_np.is_empty()
                && black_np == self.knights(Color::Black)
                && black_np.popcount() < 3)
        {
            return true;
        }

        if !black_np.is_empty() && !white_np.is_empty() {
            // minor versus minor
            if !self.minors(Color::Black).multiple() && !self.minors(Color::White).multiple() {
                return true;
            }

            // KBBvKB
            let black_bishops = self.bishops(Color::Black);
            let white_bishops = self.bishops(Color::White);

            if black_np == black_bishops
                && white_np == white_bishops
                && ((white_bishops.popcount() < 3 && !black_bishops.multiple())
                    || (black_bishops.popcount() < 3 && !white_bishops.multiple()))
            {
                return true;
            }
        }

        false
    }

    /// Rebuild boards, occupancy, kings, phase, material, and both keys from
    /// the mailbox. Used after FEN setup and by the debug self-checks.
    pub(crate) fn regen(&mut self) {
        let state = self.curr_mut();

        state.boards = [Bitboard::EMPTY; 12];
        state.phase = 0;
        state.key = 0;
        state.pawn_key = 0;
        state.material = TaperedScore::default();

        for idx in 0..64 {
            let Some(piece) = state.mailbox[idx] else {
                continue;
            };
            let sq = Square::from_index(idx);

            state.boards[piece.index()] |= Bitboard::from_square(sq);

            if piece == Piece::BLACK_KING {
                state.black_king = sq;
            } else if piece == Piece::WHITE_KING {
                state.white_king = sq;
            }

            state.phase += material::phase_weight(piece.piece_type());
            state.material += material::piece_square_value(piece, sq);

            let hash = crate::zobrist::piece_square(piece, sq);
            state.key ^= hash;
            if piece.piece_type() == PieceType::Pawn {
                state.pawn_key ^= hash;
            }
        }

        let color_hash = crate::zobrist::color(self.side_to_move());
        let state = self.curr_mut();
        state.key ^= color_hash;
        state.pawn_key ^= color_hash;

        state.key ^= crate::zobrist::castling(&state.castling_rooks);
        state.key ^= crate::zobrist::en_passant(state.en_passant);

        self.black_occ = self.color_union(Color::Black);
        self.white_occ = self.color_union(Color::White);

        let checkers = self.calc_checkers();
        self.curr_mut().checkers = checkers;
    }

    pub(crate) fn color_union(&self, color: Color) -> Bitboard {
        self.pawns(color)
            | self.knights(color)
            | self.bishops(color)
            | self.rooks(color)
            | self.queens(color)
            | self.kings(color)
    }

    /// Full state comparison for round-trip tests; `==` compares only the
    /// fields everything else is derived from.
    #[must_use]
    pub fn deep_equals(&self, other: &Position) -> bool {
        self == other
            && self.curr().mailbox == other.curr().mailbox
            && self.black_occ == other.black_occ
            && self.white_occ == other.white_occ
            && self.curr().black_king == other.curr().black_king
            && self.curr().white_king == other.curr().white_king
            && self.curr().checkers == other.curr().checkers
            && self.curr().phase == other.curr().phase
            && self.curr().material == other.curr().material
            && self.curr().key == other.curr().key
            && self.curr().pawn_key == other.curr().pawn_key
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        let ours = self.curr();
        let theirs = other.curr();

        ours.boards == theirs.boards
            && ours.castling_rooks == theirs.castling_rooks
            && ours.en_passant == theirs.en_passant
            && ours.halfmove == theirs.halfmove
            && self.black_to_move == other.black_to_move
            && self.fullmove == other.fullmove
    }
}

impl Eq for Position {}
