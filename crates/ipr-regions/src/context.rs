//! Frame lifecycle: the context owning all binning state.

use ipr_words::BoundsWord;

use crate::arena::BlockArena;
use crate::faceset::{FaceSetArena, FaceSetId, SortPolicy};
use crate::generate::FrameStats;
use crate::limits::TILE_WIDTH_PX;
use crate::strips::{StripTable, TilingPolicy};

/// Addresses of the pre-packed dummy planes in the caller's ISP plane
/// buffer. The generator references these for pass markers and padding; the
/// caller writes the actual plane data there once at startup.
#[derive(Clone, Copy, Debug)]
pub struct DummyObjects {
    /// Single-plane padding object.
    pub pad_addr: u32,
    /// Large padding object used by the vignette fix
    /// ([`LARGE_DUMMY_PLANES`](crate::limits::LARGE_DUMMY_PLANES) planes).
    pub large_pad_addr: u32,
    /// Begin-translucency marker object.
    pub begin_trans_addr: u32,
    /// Pass-flushing marker object.
    pub flush_addr: u32,
}

impl Default for DummyObjects {
    /// The conventional layout: the four dummies packed at the start of the
    /// plane buffer.
    fn default() -> Self {
        Self {
            pad_addr: 0,
            begin_trans_addr: 3,
            flush_addr: 6,
            large_pad_addr: 9,
        }
    }
}

/// Translucent set polarity: front-facing and back-facing sets carry
/// distinct id streams so the two never merge into one face set.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Polarity {
    Front,
    Back,
}

impl Polarity {
    #[inline(always)]
    fn index(self) -> usize {
        self as usize
    }
}

/// Everything configurable about a binning context.
#[derive(Clone, Copy, Debug)]
pub struct RegionConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    /// Double-wide tiles (64 px instead of 32).
    pub double_wide: bool,
    pub tiling: TilingPolicy,
    pub sort: SortPolicy,
    /// Pad the opaque pass so translucent passes never straddle the
    /// internal plane-cache boundary.
    pub vignette_fix: bool,
    /// Translucent hardware passes per tile before the deepest sets are
    /// packed together.
    pub max_pass_count: u32,
    pub dummies: DummyObjects,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            screen_width: 640,
            screen_height: 480,
            double_wide: false,
            tiling: TilingPolicy::default(),
            sort: SortPolicy::Sorted,
            vignette_fix: true,
            max_pass_count: 8,
            dummies: DummyObjects::default(),
        }
    }
}

/// The binning engine. Owns strips, regions, arenas and counters for one
/// render target; independent instances are fully isolated. All methods
/// take `&mut self` — one frame in flight at a time, single-threaded by
/// construction.
pub struct RegionContext {
    pub(crate) config: RegionConfig,
    pub(crate) strips: StripTable,
    pub(crate) arena: BlockArena,
    pub(crate) face_sets: FaceSetArena,
    /// Monotonic per-frame object id for run-length merge adjacency.
    /// Starts at 1; 0 in a region means "nothing inserted yet".
    pub(crate) next_obj_id: u32,
    /// Next set id per polarity. Front ids are even, back ids odd, so the
    /// two streams are immediately distinguishable.
    next_set_id: [u32; 2],
    pub(crate) stats: FrameStats,
    pub(crate) sorted_scratch: Vec<FaceSetId>,
}

impl RegionContext {
    /// Build a context ready for the first frame: full strip layout, one
    /// primed arena chunk.
    pub fn new(config: RegionConfig) -> Self {
        let strips = StripTable::new(
            config.screen_width,
            config.screen_height,
            config.double_wide,
            &config.tiling,
        );
        Self {
            config,
            strips,
            arena: BlockArena::new(),
            face_sets: FaceSetArena::new(),
            next_obj_id: 1,
            next_set_id: [0, 1],
            stats: FrameStats::default(),
            sorted_scratch: Vec::new(),
        }
    }

    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// Start a new frame: re-lay strips (forced = back to the nominal
    /// layout, otherwise the load-driven resize heuristic runs), rewind the
    /// arenas and reseed the id counters.
    pub fn reset_frame(&mut self, force: bool) {
        self.strips.reset_all(&self.config.tiling, force);
        self.arena.reset();
        self.face_sets.reset();
        self.next_obj_id = 1;
        self.next_set_id = [0, 1];
        self.stats = FrameStats::default();
    }

    /// Claim a fresh translucent set id for the given polarity. Objects
    /// submitted under one id must not overlap on screen.
    pub fn alloc_set_id(&mut self, polarity: Polarity) -> u32 {
        let id = self.next_set_id[polarity.index()];
        self.next_set_id[polarity.index()] += 2;
        id
    }

    /// Widest tile the current configuration produces, in pixels.
    pub fn max_region_width(&self) -> u32 {
        TILE_WIDTH_PX << self.config.double_wide as u32
    }

    /// Tallest strip the tiling policy allows, in scanlines.
    pub fn max_region_height(&self) -> u32 {
        if self.config.tiling.dynamic {
            self.config.tiling.max_height
        } else {
            self.config.tiling.nominal_height
        }
    }

    /// Statistics accumulated since the last `reset_frame`.
    pub fn frame_stats(&self) -> FrameStats {
        self.stats
    }

    /// Inclusive tile range covering the whole screen, for generation.
    pub fn screen_bounds(&self) -> BoundsWord {
        let x1 = self.config.screen_width.div_ceil(TILE_WIDTH_PX) - 1;
        let y1 = self.strips.rows() - 1;
        BoundsWord::new(0, 0, x1, y1)
    }

    /// Strip table access for diagnostics and tests.
    pub fn strips(&self) -> &StripTable {
        &self.strips
    }
}
