//! Staged move generation tests.

use super::legal_moves;
use crate::board::{Move, PieceType, Position, ScoredMoveList, Square, STARTPOS_FEN};

fn collect(list: &ScoredMoveList) -> Vec<Move> {
    list.iter().map(|sm| sm.mv).collect()
}

fn sorted_raw(moves: &[Move]) -> Vec<u16> {
    let mut raw: Vec<u16> = moves.iter().map(|mv| mv.as_u16()).collect();
    raw.sort_unstable();
    raw
}

#[test]
fn test_startpos_counts() {
    let pos = Position::starting();

    let mut all = ScoredMoveList::new();
    pos.generate_all(&mut all);
    assert_eq!(all.len(), 20);

    let mut noisy = ScoredMoveList::new();
    pos.generate_noisy(&mut noisy);
    assert!(noisy.is_empty());

    let mut quiet = ScoredMoveList::new();
    pos.generate_quiet(&mut quiet);
    assert_eq!(quiet.len(), 20);
}

#[test]
fn test_noisy_and_quiet_partition_all_outside_check() {
    let fens = [
        STARTPOS_FEN,
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
        "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1",
        "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1",
    ];

    for fen in fens {
        let pos = Position::from_fen(fen).unwrap();
        assert!(!pos.is_check());

        let mut all = ScoredMoveList::new();
        pos.generate_all(&mut all);

        let mut staged = ScoredMoveList::new();
        pos.generate_noisy(&mut staged);
        pos.generate_quiet(&mut staged);

        assert_eq!(
            sorted_raw(&collect(&all)),
            sorted_raw(&collect(&staged)),
            "stage mismatch in {fen}"
        );
    }
}

#[test]
fn test_staged_legal_sets_match_in_check() {
    // the noisy stage may over-generate pawn captures while in check; after
    // legality filtering the staged union and generate_all must agree
    let fens = [
        // single checker, blockable
        "rnbqkbnr/ppp2ppp/8/1B1pp3/4P3/8/PPPP1PPP/RNBQK1NR b KQkq - 1 3",
        // knight check
        "rnbqkb1r/pppppppp/8/8/8/5n2/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    ];

    for fen in fens {
        let mut pos = Position::from_fen(fen).unwrap();
        assert!(pos.is_check());

        let from_all = legal_moves(&mut pos);

        let mut staged = ScoredMoveList::new();
        pos.generate_noisy(&mut staged);
        pos.generate_quiet(&mut staged);

        let mover = pos.side_to_move();
        let mut staged_legal = Vec::new();
        for idx in 0..staged.len() {
            let mv = staged[idx].mv;
            pos.apply_move(mv);
            if !pos.is_attacked(pos.king(mover), pos.side_to_move()) {
                staged_legal.push(mv);
            }
            pos.pop_move();
        }

        // the staged union may contain duplicates across stages only for
        // promotions that are both capture and queening; there are none here
        assert_eq!(
            sorted_raw(&from_all),
            sorted_raw(&staged_legal),
            "legal sets differ in {fen}"
        );
    }
}

#[test]
fn test_double_check_allows_only_king_moves() {
    // rook on e8 and bishop on h4 both check the king on e1
    let pos = Position::from_fen("4r1k1/8/8/8/7b/8/8/4K3 w - - 0 1").unwrap();
    assert!(pos.checkers().multiple());

    let mut all = ScoredMoveList::new();
    pos.generate_all(&mut all);

    assert!(!all.is_empty());
    for sm in all.iter() {
        assert_eq!(sm.mv.src(), Square::E1, "non-king move under double check");
    }
}

#[test]
fn test_single_check_moves_capture_or_block() {
    // bishop b5 checks the king on e8 along b5-c6-d7
    let pos =
        Position::from_fen("rnbqkbnr/ppp2ppp/8/1B1pp3/4P3/8/PPPP1PPP/RNBQK1NR b KQkq - 1 3")
            .unwrap();
    assert!(pos.checkers().one());

    let checker = pos.checkers().lowest_square();
    let block_mask = crate::board::attack_tables::ray_between(
        pos.king(crate::board::Color::Black),
        checker,
    );

    let mut all = ScoredMoveList::new();
    pos.generate_all(&mut all);

    for sm in all.iter() {
        let mv = sm.mv;
        if mv.src() == pos.king(crate::board::Color::Black) {
            continue;
        }
        assert!(
            mv.dst() == checker || block_mask.contains(mv.dst()),
            "{mv} neither captures the checker nor blocks"
        );
    }
}

#[test]
fn test_promotion_staging() {
    let pos = Position::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();

    let a7: Square = "a7".parse().unwrap();
    let a8: Square = "a8".parse().unwrap();

    let mut noisy = ScoredMoveList::new();
    pos.generate_noisy(&mut noisy);
    assert!(noisy.contains(Move::promotion(a7, a8, PieceType::Queen)));
    assert!(!noisy.contains(Move::promotion(a7, a8, PieceType::Knight)));

    let mut quiet = ScoredMoveList::new();
    pos.generate_quiet(&mut quiet);
    assert!(quiet.contains(Move::promotion(a7, a8, PieceType::Knight)));
    assert!(quiet.contains(Move::promotion(a7, a8, PieceType::Rook)));
    assert!(quiet.contains(Move::promotion(a7, a8, PieceType::Bishop)));
    assert!(!quiet.contains(Move::promotion(a7, a8, PieceType::Queen)));
}

#[test]
fn test_en_passant_generated_as_noisy() {
    let pos =
        Position::from_fen("rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3")
            .unwrap();

    let e5: Square = "e5".parse().unwrap();
    let d6: Square = "d6".parse().unwrap();

    let mut noisy = ScoredMoveList::new();
    pos.generate_noisy(&mut noisy);
    assert!(noisy.contains(Move::en_passant(e5, d6)));
}

#[test]
fn test_castling_generation_and_blocking() {
    let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();

    let mut quiet = ScoredMoveList::new();
    pos.generate_quiet(&mut quiet);
    assert!(quiet.contains(Move::castling(Square::E1, Square::H1)));
    assert!(quiet.contains(Move::castling(Square::E1, Square::A1)));

    // an enemy rook eyeing f1 forbids kingside castling only
    let attacked =
        Position::from_fen("r3k2r/8/8/8/8/5r2/8/R3K2R w KQq - 0 1").unwrap();
    let mut quiet = ScoredMoveList::new();
    attacked.generate_quiet(&mut quiet);
    assert!(!quiet.contains(Move::castling(Square::E1, Square::H1)));
    assert!(quiet.contains(Move::castling(Square::E1, Square::A1)));

    // a piece between king and rook forbids it too
    let blocked = Position::from_fen("r3k2r/8/8/8/8/8/8/R3KB1R w KQkq - 0 1").unwrap();
    let mut quiet = ScoredMoveList::new();
    blocked.generate_quiet(&mut quiet);
    assert!(!quiet.contains(Move::castling(Square::E1, Square::H1)));
    assert!(quiet.contains(Move::castling(Square::E1, Square::A1)));
}

#[test]
fn test_chess960_castling_with_inner_rooks() {
    // king e1, rooks b1 and g1; X-FEN flags resolve the outer rooks
    let mut pos =
        Position::from_fen_chess960("4k3/8/8/8/8/8/8/1R2K1R1 w KQ - 0 1").unwrap();

    assert_eq!(pos.castling_rooks().white.kingside, Some(Square::G1));
    assert_eq!(pos.castling_rooks().white.queenside, Some(Square::new(0, 1)));

    let kingside = Move::castling(Square::E1, Square::G1);
    let queenside = Move::castling(Square::E1, Square::new(0, 1));

    let legal = legal_moves(&mut pos);
    assert!(legal.contains(&kingside));
    assert!(legal.contains(&queenside));

    pos.apply_move(kingside);
    assert_eq!(pos.king(crate::board::Color::White), Square::G1);
    assert_eq!(
        pos.piece_at(Square::F1),
        Some(crate::board::Piece::WHITE_ROOK)
    );
    pos.assert_fully_consistent();
    pos.pop_move();

    pos.apply_move(queenside);
    assert_eq!(pos.king(crate::board::Color::White), Square::C1);
    assert_eq!(
        pos.piece_at(Square::D1),
        Some(crate::board::Piece::WHITE_ROOK)
    );
    pos.assert_fully_consistent();
}

#[test]
fn test_all_generated_moves_are_pseudo_legal() {
    let fens = [
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    ];

    for fen in fens {
        let pos = Position::from_fen(fen).unwrap();
        let mut all = ScoredMoveList::new();
        pos.generate_all(&mut all);

        for sm in all.iter() {
            assert!(pos.is_pseudo_legal(sm.mv), "{} in {fen}", sm.mv);
        }
    }
}
