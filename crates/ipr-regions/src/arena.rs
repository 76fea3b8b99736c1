//! Per-frame block arena for tile object lists.
//!
//! Every per-tile list is a chain of fixed-capacity blocks carved out of one
//! bump arena. Individual entries are never freed; `reset` rewinds the whole
//! arena between frames and keeps the backing allocation. Each block starts
//! with one header word holding the handle of the previously allocated block
//! of the same list, so a list can be walked oldest-block-first to recover
//! original insertion order.
//!
//! Two block sizes share the arena: large blocks for the opaque-family lists
//! and small blocks for translucent face-set lists. 48 is a multiple of 3,
//! so mixed allocations pack without cross-class fragmentation.

/// Entries per large (opaque-family) block.
pub const LARGE_ENTRIES: u32 = 48;

/// Entries per small (face-set) block.
pub const SMALL_ENTRIES: u32 = 3;

/// Arena growth quantum in words.
const CHUNK_WORDS: usize = 4096;

/// Upper bound on blocks chained into one list. Every list is plane-budgeted
/// at insertion time and every entry carries at least one plane, so even a
/// small-block chain tops out at 320 blocks.
const MAX_CHAIN: usize = 512;

/// Block size class.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockClass {
    Large,
    Small,
}

impl BlockClass {
    #[inline(always)]
    pub fn entries(self) -> u32 {
        match self {
            BlockClass::Large => LARGE_ENTRIES,
            BlockClass::Small => SMALL_ENTRIES,
        }
    }
}

/// Handle of a block: word offset of its header within the arena.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BlockHandle(u32);

impl BlockHandle {
    pub const NONE: BlockHandle = BlockHandle(u32::MAX);

    #[inline(always)]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// Bump arena of 32-bit words, grown in chunk quanta.
pub struct BlockArena {
    words: Vec<u32>,
}

impl BlockArena {
    /// Create an arena primed with one chunk, so the first frame never hits
    /// the empty-allocator path.
    pub fn new() -> Self {
        Self {
            words: Vec::with_capacity(CHUNK_WORDS),
        }
    }

    /// Rewind the arena for the next frame. Keeps the backing allocation.
    pub fn reset(&mut self) {
        self.words.clear();
    }

    /// Words currently in use (diagnostics).
    pub fn words_used(&self) -> usize {
        self.words.len()
    }

    fn alloc_block(&mut self, class: BlockClass, prev: BlockHandle) -> BlockHandle {
        let need = 1 + class.entries() as usize;
        if self.words.capacity() - self.words.len() < need {
            self.words.reserve(CHUNK_WORDS);
        }
        let handle = BlockHandle(self.words.len() as u32);
        self.words.push(prev.0);
        self.words.resize(self.words.len() + class.entries() as usize, 0);
        handle
    }

    #[inline(always)]
    fn word(&self, index: u32) -> u32 {
        self.words[index as usize]
    }

    #[inline(always)]
    fn set_word(&mut self, index: u32, value: u32) {
        self.words[index as usize] = value;
    }
}

impl Default for BlockArena {
    fn default() -> Self {
        Self::new()
    }
}

/// One block-chained list: explicit tail handle and fill counts instead of
/// the address-encodes-occupancy convention the hardware driver used.
#[derive(Clone, Copy, Debug)]
pub struct BlockList {
    tail: BlockHandle,
    tail_len: u8,
    total: u32,
}

impl Default for BlockList {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockList {
    pub fn new() -> Self {
        Self {
            tail: BlockHandle::NONE,
            tail_len: 0,
            total: 0,
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Total entries appended since the last reset.
    #[inline(always)]
    pub fn len(&self) -> u32 {
        self.total
    }

    /// True when the next push will allocate a new block.
    #[inline(always)]
    pub fn tail_is_full(&self, class: BlockClass) -> bool {
        self.tail.is_none() || self.tail_len as u32 == class.entries()
    }

    /// Append one entry, allocating a new tail block when the current one is
    /// full. O(1) amortized; never fails (arena growth aborts only on OOM).
    pub fn push(&mut self, arena: &mut BlockArena, class: BlockClass, entry: u32) {
        if self.tail_is_full(class) {
            self.tail = arena.alloc_block(class, self.tail);
            self.tail_len = 0;
        }
        arena.set_word(self.tail.0 + 1 + self.tail_len as u32, entry);
        self.tail_len += 1;
        self.total += 1;
    }

    /// Most recently pushed entry, if any.
    pub fn last_entry(&self, arena: &BlockArena) -> Option<u32> {
        if self.total == 0 {
            return None;
        }
        Some(arena.word(self.tail.0 + self.tail_len as u32))
    }

    /// Overwrite the most recently pushed entry. The list must be non-empty.
    pub fn set_last_entry(&mut self, arena: &mut BlockArena, entry: u32) {
        debug_assert!(self.total > 0);
        arena.set_word(self.tail.0 + self.tail_len as u32, entry);
    }

    /// Visit entries in original insertion order (oldest block first).
    pub fn for_each(&self, arena: &BlockArena, class: BlockClass, f: &mut dyn FnMut(u32)) {
        if self.total == 0 {
            return;
        }
        let mut chain: heapless::Vec<u32, MAX_CHAIN> = heapless::Vec::new();
        let mut block = self.tail;
        while !block.is_none() {
            let pushed = chain.push(block.0).is_ok();
            debug_assert!(pushed, "block chain exceeds MAX_CHAIN");
            if !pushed {
                break;
            }
            block = BlockHandle(arena.word(block.0));
        }
        for (i, &header) in chain.iter().rev().enumerate() {
            // Only the newest block (chain[0]) is partially filled.
            let count = if i + 1 == chain.len() {
                self.tail_len as u32
            } else {
                class.entries()
            };
            for slot in 0..count {
                f(arena.word(header + 1 + slot));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list() {
        let arena = BlockArena::new();
        let list = BlockList::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.last_entry(&arena), None);
    }

    #[test]
    fn test_fill_level_tracks_appends() {
        let mut arena = BlockArena::new();
        let mut list = BlockList::new();
        for i in 0..LARGE_ENTRIES {
            assert_eq!(list.len(), i);
            list.push(&mut arena, BlockClass::Large, i);
        }
        assert_eq!(list.len(), LARGE_ENTRIES);
        assert!(list.tail_is_full(BlockClass::Large));
        list.push(&mut arena, BlockClass::Large, 99);
        assert_eq!(list.len(), LARGE_ENTRIES + 1);
        assert!(!list.tail_is_full(BlockClass::Large));
    }

    #[test]
    fn test_insertion_order_across_blocks() {
        let mut arena = BlockArena::new();
        let mut list = BlockList::new();
        let n = SMALL_ENTRIES * 4 + 1;
        for i in 0..n {
            list.push(&mut arena, BlockClass::Small, 1000 + i);
        }
        let mut seen = Vec::new();
        list.for_each(&arena, BlockClass::Small, &mut |e| seen.push(e));
        let expected: Vec<u32> = (0..n).map(|i| 1000 + i).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_set_last_entry() {
        let mut arena = BlockArena::new();
        let mut list = BlockList::new();
        list.push(&mut arena, BlockClass::Large, 1);
        list.push(&mut arena, BlockClass::Large, 2);
        list.set_last_entry(&mut arena, 42);
        assert_eq!(list.last_entry(&arena), Some(42));
        let mut seen = Vec::new();
        list.for_each(&arena, BlockClass::Large, &mut |e| seen.push(e));
        assert_eq!(seen, vec![1, 42]);
    }

    #[test]
    fn test_interleaved_classes_share_arena() {
        let mut arena = BlockArena::new();
        let mut large = BlockList::new();
        let mut small = BlockList::new();
        for i in 0..10 {
            large.push(&mut arena, BlockClass::Large, i);
            small.push(&mut arena, BlockClass::Small, 100 + i);
        }
        let mut seen = Vec::new();
        small.for_each(&arena, BlockClass::Small, &mut |e| seen.push(e));
        assert_eq!(seen, (100..110).collect::<Vec<u32>>());
        seen.clear();
        large.for_each(&arena, BlockClass::Large, &mut |e| seen.push(e));
        assert_eq!(seen, (0..10).collect::<Vec<u32>>());
    }

    #[test]
    fn test_reset_rewinds_without_freeing() {
        let mut arena = BlockArena::new();
        let mut list = BlockList::new();
        for i in 0..200 {
            list.push(&mut arena, BlockClass::Large, i);
        }
        let used = arena.words_used();
        assert!(used > 0);
        arena.reset();
        assert_eq!(arena.words_used(), 0);
        // Fresh lists allocate from the rewound cursor.
        let mut list2 = BlockList::new();
        list2.push(&mut arena, BlockClass::Large, 7);
        assert_eq!(list2.last_entry(&arena), Some(7));
    }
}
