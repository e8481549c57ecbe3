//! Make/unmake round-trip and scenario tests.

use super::{find_move, legal_moves};
use crate::board::{Color, MoveKind, Piece, Position, Square, STARTPOS_FEN};
use rand::prelude::*;

#[test]
fn test_opening_sequence_counters_and_ep() {
    let mut pos = Position::starting();
    let initial = pos.clone();

    let e2e4 = find_move(&mut pos, "e2e4");
    pos.apply_move(e2e4);
    assert_eq!(pos.en_passant(), Some("e3".parse().unwrap()));
    assert_eq!(pos.halfmove(), 0);
    assert_eq!(pos.fullmove(), 1);

    let key_after_e4 = pos.key();

    let e7e5 = find_move(&mut pos, "e7e5");
    pos.apply_move(e7e5);
    assert_eq!(pos.en_passant(), Some("e6".parse().unwrap()));
    assert_eq!(pos.halfmove(), 0);
    assert_eq!(pos.fullmove(), 2);
    assert_ne!(pos.key(), key_after_e4);

    let g1f3 = find_move(&mut pos, "g1f3");
    pos.apply_move(g1f3);
    assert_eq!(pos.en_passant(), None);
    assert_eq!(pos.halfmove(), 1);
    assert_eq!(pos.fullmove(), 2);
    assert_ne!(pos.key(), initial.key());

    pos.pop_move();
    pos.pop_move();
    pos.pop_move();

    assert!(pos.deep_equals(&initial));
    assert_eq!(pos.fullmove(), 1);
}

#[test]
fn test_castling_scenario() {
    let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
    let mut pos = Position::from_fen(fen).unwrap();

    let mv = pos.move_from_uci("e1g1");
    assert_eq!(mv.kind(), MoveKind::Castling);
    assert_eq!(mv.dst(), Square::H1);

    // in 960 mode the same castle parses as king-takes-rook
    let mut frc = Position::from_fen_chess960(fen).unwrap();
    assert_eq!(frc.move_from_uci("e1h1"), mv);
    assert!(legal_moves(&mut frc).contains(&mv));

    pos.apply_move(mv);

    assert_eq!(pos.piece_at(Square::G1), Some(Piece::WHITE_KING));
    assert_eq!(pos.piece_at(Square::F1), Some(Piece::WHITE_ROOK));
    assert_eq!(pos.piece_at(Square::E1), None);
    assert_eq!(pos.piece_at(Square::H1), None);
    assert_eq!(pos.king(Color::White), Square::G1);

    let rooks = pos.castling_rooks();
    assert!(rooks.white.kingside.is_none());
    assert!(rooks.white.queenside.is_none());
    assert!(rooks.black.kingside.is_some());

    assert_eq!(pos.move_to_uci(mv), "e1g1");
    pos.assert_fully_consistent();

    pos.pop_move();
    assert_eq!(pos.piece_at(Square::E1), Some(Piece::WHITE_KING));
    assert_eq!(pos.piece_at(Square::H1), Some(Piece::WHITE_ROOK));
    assert_eq!(pos.castling_rooks().flags(), 0xF);
}

#[test]
fn test_en_passant_scenario() {
    let mut pos =
        Position::from_fen("rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3")
            .unwrap();
    let initial = pos.clone();

    let mv = pos.move_from_uci("e5d6");
    assert_eq!(mv.kind(), MoveKind::EnPassant);

    pos.apply_move(mv);

    let d5: Square = "d5".parse().unwrap();
    let d6: Square = "d6".parse().unwrap();
    assert_eq!(pos.piece_at(d5), None, "captured pawn must be removed");
    assert_eq!(pos.piece_at(d6), Some(Piece::WHITE_PAWN));
    assert_eq!(pos.en_passant(), None);

    // the key must match a fresh parse of the resulting position, which
    // shows the d-file en passant contribution was cleared
    let expected =
        Position::from_fen("rnbqkbnr/ppp1pppp/3P4/8/8/8/PPPP1PPP/RNBQKBNR b KQkq - 0 3").unwrap();
    assert_eq!(pos.key(), expected.key());
    assert_eq!(pos.pawn_key(), expected.pawn_key());

    pos.pop_move();
    assert!(pos.deep_equals(&initial));
}

#[test]
fn test_promotion_round_trip() {
    let mut pos = Position::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
    let initial = pos.clone();

    let mv = pos.move_from_uci("a7a8q");
    pos.apply_move(mv);

    let a8: Square = "a8".parse().unwrap();
    assert_eq!(pos.piece_at(a8), Some(Piece::WHITE_QUEEN));
    pos.assert_fully_consistent();

    pos.pop_move();
    assert!(pos.deep_equals(&initial));
    assert_eq!(
        pos.piece_at("a7".parse().unwrap()),
        Some(Piece::WHITE_PAWN)
    );
}

#[test]
fn test_capturing_castling_rook_drops_right() {
    let mut pos =
        Position::from_fen("r3k2r/8/8/8/8/8/6N1/R3K2R w KQkq - 0 1").unwrap();

    // knight takes the h8 rook
    let mv = find_move(&mut pos, "g2h4");
    pos.apply_move(mv);
    let mv = find_move(&mut pos, "a8b8");
    pos.apply_move(mv);
    let mv = find_move(&mut pos, "h4g6");
    pos.apply_move(mv);
    let mv = find_move(&mut pos, "b8a8");
    pos.apply_move(mv);
    let mv = find_move(&mut pos, "g6h8");
    pos.apply_move(mv);

    assert!(pos.castling_rooks().black.kingside.is_none());
    // queenside right was lost when the rook left a8
    assert!(pos.castling_rooks().black.queenside.is_none());
    assert!(pos.castling_rooks().white.kingside.is_some());
    pos.assert_fully_consistent();
}

#[test]
fn test_null_move_round_trip() {
    let mut pos =
        Position::from_fen("rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3")
            .unwrap();
    let initial = pos.clone();

    pos.apply_null_move();
    assert_eq!(pos.side_to_move(), Color::Black);
    assert_eq!(pos.en_passant(), None);
    assert_ne!(pos.key(), initial.key());

    pos.pop_move();
    assert!(pos.deep_equals(&initial));
    assert_eq!(pos.side_to_move(), Color::White);
}

#[test]
fn test_random_walk_restores_everything() {
    let mut pos = Position::starting();
    let initial = pos.clone();
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);

    let mut applied = 0;
    for _ in 0..120 {
        let moves = legal_moves(&mut pos);
        if moves.is_empty() {
            break;
        }
        let mv = moves[rng.gen_range(0..moves.len())];
        pos.apply_move(mv);
        applied += 1;

        // incremental state must match a from-scratch rederivation
        pos.assert_fully_consistent();
    }

    for _ in 0..applied {
        pos.pop_move();
    }

    assert!(pos.deep_equals(&initial));
    assert_eq!(pos.to_fen(), initial.to_fen());
}

#[test]
fn test_fen_round_trip_startpos() {
    let pos = Position::starting();
    assert_eq!(pos.to_fen(), STARTPOS_FEN);

    let reparsed = Position::from_fen(&pos.to_fen()).unwrap();
    assert!(reparsed.deep_equals(&pos));
}

#[test]
fn test_is_pseudo_legal_accepts_generated_moves() {
    let fens = [
        STARTPOS_FEN,
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    ];

    for fen in fens {
        let mut pos = Position::from_fen(fen).unwrap();
        for mv in legal_moves(&mut pos) {
            assert!(pos.is_pseudo_legal(mv), "{mv} rejected in {fen}");
        }
    }
}

#[test]
fn test_is_pseudo_legal_rejects_foreign_moves() {
    use crate::board::Move;

    let pos = Position::starting();

    // moving from an empty square
    let e4: Square = "e4".parse().unwrap();
    let e5: Square = "e5".parse().unwrap();
    assert!(!pos.is_pseudo_legal(Move::standard(e4, e5)));

    // moving an enemy piece
    let e7: Square = "e7".parse().unwrap();
    let e6: Square = "e6".parse().unwrap();
    assert!(!pos.is_pseudo_legal(Move::standard(e7, e6)));

    // self-capture
    let d1: Square = "d1".parse().unwrap();
    let d2: Square = "d2".parse().unwrap();
    assert!(!pos.is_pseudo_legal(Move::standard(d1, d2)));

    // blocked sliders and wrong geometry
    let a1 = Square::A1;
    let a3: Square = "a3".parse().unwrap();
    assert!(!pos.is_pseudo_legal(Move::standard(a1, a3)));

    let g1 = Square::G1;
    let g3: Square = "g3".parse().unwrap();
    assert!(!pos.is_pseudo_legal(Move::standard(g1, g3)));

    // pawn double push through a blocker
    let mut blocked =
        Position::from_fen("rnbqkbnr/pppppppp/8/8/8/4n3/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
    let e2: Square = "e2".parse().unwrap();
    assert!(!blocked.is_pseudo_legal(Move::standard(e2, e4)));
    // while a sideways capture of the blocker's neighbour stays illegal
    let d3: Square = "d3".parse().unwrap();
    assert!(!blocked.is_pseudo_legal(Move::standard(e2, d3)));
}
