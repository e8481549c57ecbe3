//! Shared transposition table.
//!
//! A flat array of 64-byte clusters, four entries each. Probes and stores
//! are lock-free and deliberately racy: entries are a pair of relaxed
//! atomic words, readers validate the 16-bit key tag against their query,
//! and a torn or stale entry is simply a miss. Exclusive phases (resize,
//! clear, new_search) take `&mut self`.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::board::{Move, Score, MAX_DEPTH, SCORE_WIN};
use crate::util::aligned::AlignedBuf;

const ENTRIES_PER_CLUSTER: usize = 4;

const AGE_CYCLE: u8 = 1 << 5;
const AGE_MASK: u8 = AGE_CYCLE - 1;

/// Bound type of a stored score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TtFlag {
    None = 0,
    /// Fail-low: the score is an upper bound
    Upper = 1,
    /// Fail-high: the score is a lower bound
    Lower = 2,
    Exact = 3,
}

impl TtFlag {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => TtFlag::None,
            1 => TtFlag::Upper,
            2 => TtFlag::Lower,
            _ => TtFlag::Exact,
        }
    }
}

/// Payload returned by a successful probe.
#[derive(Clone, Copy, Debug)]
pub struct ProbedEntry {
    pub score: Score,
    pub static_eval: Score,
    pub depth: i32,
    pub mv: Move,
    pub flag: TtFlag,
    pub was_pv: bool,
}

/// Unpacked entry; the visible layout is two packed words.
///
/// word `data`: key 16 | move 16 | score 16 | static_eval 16
/// word `meta`: depth 8 | (age 5 | pv 1 | flag 2) 8
#[derive(Clone, Copy, PartialEq, Eq)]
struct EntryData {
    key: u16,
    mv: Move,
    score: i16,
    static_eval: i16,
    depth: u8,
    age_pv_flag: u8,
}

impl EntryData {
    fn unpack(data: u64, meta: u64) -> Self {
        EntryData {
            key: data as u16,
            mv: Move::from_u16((data >> 16) as u16),
            score: (data >> 32) as u16 as i16,
            static_eval: (data >> 48) as u16 as i16,
            depth: meta as u8,
            age_pv_flag: (meta >> 8) as u8,
        }
    }

    fn pack(self) -> (u64, u64) {
        let data = u64::from(self.key)
            | (u64::from(self.mv.as_u16()) << 16)
            | (u64::from(self.score as u16) << 32)
            | (u64::from(self.static_eval as u16) << 48);
        let meta = u64::from(self.depth) | (u64::from(self.age_pv_flag) << 8);
        (data, meta)
    }

    fn age(self) -> u8 {
        self.age_pv_flag >> 3
    }

    fn was_pv(self) -> bool {
        self.age_pv_flag & 0x4 != 0
    }

    fn flag(self) -> TtFlag {
        TtFlag::from_bits(self.age_pv_flag)
    }

    fn filled(self) -> bool {
        self.flag() != TtFlag::None
    }

    fn set_age_pv_flag(&mut self, age: u8, pv: bool, flag: TtFlag) {
        self.age_pv_flag = (age << 3) | (u8::from(pv) << 2) | flag as u8;
    }
}

#[repr(C)]
struct Entry {
    data: AtomicU64,
    meta: AtomicU64,
}

impl Entry {
    fn load(&self) -> EntryData {
        EntryData::unpack(
            self.data.load(Ordering::Relaxed),
            self.meta.load(Ordering::Relaxed),
        )
    }

    fn store(&self, entry: EntryData) {
        let (data, meta) = entry.pack();
        self.data.store(data, Ordering::Relaxed);
        self.meta.store(meta, Ordering::Relaxed);
    }
}

#[repr(C, align(64))]
struct Cluster {
    entries: [Entry; ENTRIES_PER_CLUSTER],
}

/// Mate and tablebase scores are stored relative to the probing node, not
/// the root.
fn score_to_tt(score: Score, ply: i32) -> Score {
    if score < -SCORE_WIN {
        score - ply
    } else if score > SCORE_WIN {
        score + ply
    } else {
        score
    }
}

fn score_from_tt(score: Score, ply: i32) -> Score {
    if score < -SCORE_WIN {
        score + ply
    } else if score > SCORE_WIN {
        score - ply
    } else {
        score
    }
}

pub struct TranspositionTable {
    clusters: Option<AlignedBuf<Cluster>>,
    cluster_count: usize,
    age: u8,
    pending_init: bool,
}

impl TranspositionTable {
    /// A table of roughly `mib` mebibytes, allocated immediately.
    #[must_use]
    pub fn new(mib: usize) -> Self {
        let mut tt = TranspositionTable {
            clusters: None,
            cluster_count: 0,
            age: 0,
            pending_init: false,
        };
        tt.resize(mib);
        tt.finalize();
        tt
    }

    /// Request a new size. Allocation is deferred to the next `finalize`
    /// call so a UCI `setoption` sequence only reallocates once.
    pub fn resize(&mut self, mib: usize) {
        let bytes = mib * 1024 * 1024;
        let capacity = bytes / std::mem::size_of::<Cluster>();

        if self.cluster_count != capacity {
            self.clusters = None;
            self.cluster_count = capacity;
        }

        self.pending_init = true;
    }

    /// Apply a pending resize. Returns whether any work was done.
    ///
    /// Allocation failure is fatal: it is reported and the process aborts.
    pub fn finalize(&mut self) -> bool {
        if !self.pending_init {
            return false;
        }

        self.pending_init = false;

        if self.clusters.is_none() {
            // zero bit pattern is a valid (empty) cluster of atomics
            match unsafe { AlignedBuf::<Cluster>::zeroed(self.cluster_count.max(1)) } {
                Some(buf) => {
                    self.cluster_count = buf.len();
                    self.clusters = Some(buf);
                }
                None => {
                    log::error!("failed to allocate transposition table - out of memory?");
                    eprintln!("info string failed to allocate transposition table");
                    std::process::abort();
                }
            }
        }

        self.clear();

        true
    }

    #[inline]
    fn buf(&self) -> &AlignedBuf<Cluster> {
        self.clusters
            .as_ref()
            .expect("transposition table used before finalize")
    }

    /// Cluster index by multiply-high, using the full key width.
    #[inline]
    fn index(&self, key: u64) -> usize {
        ((u128::from(key) * self.cluster_count as u128) >> 64) as usize
    }

    /// Look up `key`, de-normalising any mate-distance score by `ply`.
    #[must_use]
    pub fn probe(&self, key: u64, ply: i32) -> Option<ProbedEntry> {
        let packed_key = key as u16;
        let cluster = &self.buf()[self.index(key)];

        for entry in &cluster.entries {
            let entry = entry.load();

            if entry.filled() && entry.key == packed_key {
                return Some(ProbedEntry {
                    score: score_from_tt(Score::from(entry.score), ply),
                    static_eval: Score::from(entry.static_eval),
                    depth: i32::from(entry.depth),
                    mv: entry.mv,
                    flag: entry.flag(),
                    was_pv: entry.was_pv(),
                });
            }
        }

        None
    }

    /// Store a search result.
    #[allow(clippy::too_many_arguments)]
    pub fn put(
        &self,
        key: u64,
        score: Score,
        static_eval: Score,
        mv: Move,
        depth: i32,
        ply: i32,
        flag: TtFlag,
        pv: bool,
    ) {
        debug_assert!((0..=MAX_DEPTH).contains(&depth));

        let new_key = key as u16;
        let cluster = &self.buf()[self.index(key)];

        // replacement weight decays with age distance from the current
        // generation
        let entry_value = |entry: EntryData| {
            let relative_age = i32::from((AGE_CYCLE + self.age - entry.age()) & AGE_MASK);
            i32::from(entry.depth) - relative_age * 2
        };

        let mut slot = &cluster.entries[0];
        let mut candidate = slot.load();
        let mut min_value = i32::MAX;

        for entry in &cluster.entries {
            let loaded = entry.load();

            // always take an empty entry, or the one for this position
            if loaded.key == new_key || !loaded.filled() {
                slot = entry;
                candidate = loaded;
                break;
            }

            let value = entry_value(loaded);
            if value < min_value {
                slot = entry;
                candidate = loaded;
                min_value = value;
            }
        }

        let mut entry = candidate;

        // keep a same-key entry of this generation when the new data is
        // both shallower and inexact
        if flag != TtFlag::Exact
            && new_key == entry.key
            && entry.age() == self.age
            && depth + 4 + 2 * i32::from(pv) <= i32::from(entry.depth)
        {
            return;
        }

        // an empty move never overwrites a known best move for the same key
        if !mv.is_null() || entry.key != new_key {
            entry.mv = mv;
        }

        entry.key = new_key;
        entry.score = score_to_tt(score, ply) as i16;
        entry.static_eval = static_eval as i16;
        entry.depth = depth as u8;
        entry.set_age_pv_flag(self.age, pv, flag);

        slot.store(entry);
    }

    /// Zero the whole table in parallel and reset the age.
    pub fn clear(&mut self) {
        self.age = 0;

        let Some(buf) = self.clusters.as_mut() else {
            return;
        };

        let threads = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        let chunk_size = buf.len().div_ceil(threads).max(1);

        std::thread::scope(|scope| {
            for chunk in buf.chunks_mut(chunk_size) {
                scope.spawn(move || unsafe {
                    // exclusive access; plain memset is fine over atomics
                    std::ptr::write_bytes(chunk.as_mut_ptr(), 0, chunk.len());
                });
            }
        });
    }

    /// Advance the generation; old entries stay probeable but lose
    /// replacement weight.
    pub fn new_search(&mut self) {
        self.age = (self.age + 1) & AGE_MASK;
    }

    /// Per-mille fill rate of current-generation entries, for UCI
    /// `hashfull`; samples the first 1000 clusters.
    #[must_use]
    pub fn full(&self) -> u32 {
        let buf = self.buf();
        let mut filled = 0u32;

        for cluster in buf.iter().take(1000) {
            for entry in &cluster.entries {
                let entry = entry.load();
                if entry.filled() && entry.age() == self.age {
                    filled += 1;
                }
            }
        }

        filled / ENTRIES_PER_CLUSTER as u32
    }

    /// Best-effort cache hint for an upcoming probe.
    #[inline]
    pub fn prefetch(&self, key: u64) {
        #[cfg(target_arch = "x86_64")]
        if let Some(buf) = self.clusters.as_ref() {
            unsafe {
                let ptr = buf.as_ptr().add(self.index(key)).cast::<i8>();
                std::arch::x86_64::_mm_prefetch::<{ std::arch::x86_64::_MM_HINT_T0 }>(ptr);
            }
        }

        #[cfg(not(target_arch = "x86_64"))]
        let _ = key;
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Square, SCORE_MATE};

    fn sample_move() -> Move {
        Move::standard(Square::new(1, 4), Square::new(3, 4))
    }

    #[test]
    fn test_cluster_is_one_cache_line() {
        assert_eq!(std::mem::size_of::<Cluster>(), 64);
        assert_eq!(std::mem::align_of::<Cluster>(), 64);
    }

    #[test]
    fn test_put_probe_round_trip() {
        let tt = TranspositionTable::new(1);
        let key = 0xABCD_EF01_2345_6789;

        tt.put(key, 120, 95, sample_move(), 9, 4, TtFlag::Exact, true);

        let probed = tt.probe(key, 4).expect("entry should be present");
        assert_eq!(probed.score, 120);
        assert_eq!(probed.static_eval, 95);
        assert_eq!(probed.depth, 9);
        assert_eq!(probed.mv, sample_move());
        assert_eq!(probed.flag, TtFlag::Exact);
        assert!(probed.was_pv);

        assert!(tt.probe(key ^ 0xFFFF, 4).is_none());
    }

    #[test]
    fn test_mate_score_ply_normalisation() {
        let tt = TranspositionTable::new(1);
        let key = 0x1234_5678_9ABC_DEF0;

        // mate in 3 plies seen at ply 5
        let score = SCORE_MATE - 8;
        tt.put(key, score, 0, sample_move(), 12, 5, TtFlag::Exact, false);

        // from the same ply the score round-trips
        assert_eq!(tt.probe(key, 5).unwrap().score, score);

        // from a shallower ply the mate is further away
        assert_eq!(tt.probe(key, 3).unwrap().score, score - 2);
    }

    #[test]
    fn test_move_preserved_when_new_record_has_none() {
        let tt = TranspositionTable::new(1);
        let key = 0x0F0F_F0F0_1234_4321;

        tt.put(key, 50, 10, sample_move(), 6, 0, TtFlag::Lower, false);
        tt.put(key, 60, 10, Move::default(), 8, 0, TtFlag::Lower, false);

        let probed = tt.probe(key, 0).unwrap();
        assert_eq!(probed.depth, 8);
        assert_eq!(probed.mv, sample_move());
    }

    #[test]
    fn test_shallow_inexact_same_key_preserved() {
        let tt = TranspositionTable::new(1);
        let key = 0x5555_AAAA_5555_AAAA;

        tt.put(key, 80, 0, sample_move(), 20, 0, TtFlag::Lower, false);
        // much shallower non-exact write for the same key is dropped
        tt.put(key, -30, 0, Move::default(), 2, 0, TtFlag::Upper, false);

        let probed = tt.probe(key, 0).unwrap();
        assert_eq!(probed.depth, 20);
        assert_eq!(probed.score, 80);

        // an exact write always lands
        tt.put(key, -30, 0, Move::default(), 2, 0, TtFlag::Exact, false);
        assert_eq!(tt.probe(key, 0).unwrap().depth, 2);
    }

    #[test]
    fn test_aged_entries_probe_but_lose_replacement_weight() {
        let mut tt = TranspositionTable::new(1);
        let key = 0x1111_2222_3333_4444;

        tt.put(key, 40, 0, sample_move(), 3, 0, TtFlag::Exact, false);
        tt.new_search();

        // still readable after the generation bump
        assert!(tt.probe(key, 0).is_some());

        // find three other keys landing in the same cluster and fill it;
        // the aged entry must be the eviction victim
        let target = tt.index(key);
        let mut fillers = Vec::new();
        let mut candidate = key.wrapping_add(1);
        while fillers.len() < ENTRIES_PER_CLUSTER - 1 {
            if tt.index(candidate) == target && candidate as u16 != key as u16 {
                fillers.push(candidate);
            }
            candidate = candidate.wrapping_add(1);
        }

        for &filler in &fillers {
            tt.put(filler, 10, 0, Move::default(), 5, 0, TtFlag::Exact, false);
        }

        // cluster now holds the aged entry plus three fresh ones; one more
        // fresh key replaces the aged entry, not a fresh one
        let mut last = candidate;
        loop {
            if tt.index(last) == target
                && last as u16 != key as u16
                && fillers.iter().all(|&f| f as u16 != last as u16)
            {
                break;
            }
            last = last.wrapping_add(1);
        }

        tt.put(last, 10, 0, Move::default(), 5, 0, TtFlag::Exact, false);

        assert!(tt.probe(key, 0).is_none(), "aged entry should be evicted");
        for &filler in &fillers {
            assert!(tt.probe(filler, 0).is_some());
        }
        assert!(tt.probe(last, 0).is_some());
    }

    #[test]
    fn test_resize_finalize_clear_yields_empty_table() {
        let mut tt = TranspositionTable::new(1);
        tt.put(0xDEAD_BEEF, 1, 0, sample_move(), 1, 0, TtFlag::Exact, false);

        tt.resize(2);
        assert!(tt.finalize());
        assert!(!tt.finalize(), "no pending work after finalize");

        tt.clear();
        assert_eq!(tt.full(), 0);
    }

    #[test]
    fn test_full_reports_fill_rate() {
        let mut tt = TranspositionTable::new(1);
        assert_eq!(tt.full(), 0);

        let mut rng = crate::util::rng::Jsf64Rng::new(7);
        for _ in 0..20_000 {
            tt.put(rng.next_u64(), 0, 0, Move::default(), 1, 0, TtFlag::Exact, false);
        }

        let filled = tt.full();
        assert!(filled > 0);
        assert!(filled <= 1000);

        // entries from an older generation no longer count
        tt.new_search();
        assert!(tt.full() < filled);
    }

    #[test]
    fn test_shared_access_is_sync() {
        fn assert_sync<T: Sync>() {}
        assert_sync::<TranspositionTable>();
    }
}
