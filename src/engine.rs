//! Engine-wide one-time initialisation.

use crate::board;
use crate::zobrist;

/// Populate every global table, in dependency order: attack and ray tables,
/// then zobrist keys, then the cuckoo table.
///
/// All tables are lazily initialised and safe to touch from any thread, but
/// calling this before spawning search workers keeps first-use cost out of
/// the search. Transposition table allocation and NUMA binding belong to
/// the caller, which owns those resources.
pub fn init() {
    board::attack_tables::init();
    zobrist::init();
    board::init_cuckoo();
}
