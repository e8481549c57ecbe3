//! Board-level test suite.

mod make_unmake;
mod movegen;
mod repetition;

use super::{Move, Position, ScoredMoveList};

/// All strictly legal moves, by generate-then-filter.
pub(crate) fn legal_moves(pos: &mut Position) -> Vec<Move> {
    let mut list = ScoredMoveList::new();
    pos.generate_all(&mut list);

    let mover = pos.side_to_move();
    let mut legal = Vec::new();

    for idx in 0..list.len() {
        let mv = list[idx].mv;
        pos.apply_move(mv);
        if !pos.is_attacked(pos.king(mover), pos.side_to_move()) {
            legal.push(mv);
        }
        pos.pop_move();
    }

    legal
}

/// Find the generated legal move matching a UCI string.
pub(crate) fn find_move(pos: &mut Position, uci: &str) -> Move {
    let parsed = pos.move_from_uci(uci);
    assert!(!parsed.is_null(), "unparseable move {uci}");
    let found = legal_moves(pos).into_iter().find(|&mv| mv == parsed);
    found.unwrap_or_else(|| panic!("move {uci} not legal here"))
}
