//! Object-pointer stream generation.
//!
//! Flattens every tile's accumulated lists into the flat word stream the
//! rasterizer consumes. Strips are walked top-to-bottom, tiles within a
//! strip in descending column order. Each emitted tile is one descriptor
//! word followed by its passes: the opaque pass (opaque + light-volume +
//! shadow lists, padded to the hardware minimum and closed by a flush
//! marker), then optional opaque-translucent / highlight / fog passes, then
//! the depth-ordered translucent passes, each wrapped in begin/flush
//! markers and re-including the tile's light-volume and shadow lists.
//!
//! Capacity handling is lossy by design: categories over their safety
//! margin are trimmed from the tail, and when the destination buffer fills
//! up the partially emitted tile is rolled back and generation stops. The
//! caller sees both through [`FrameStats`], never as an error.

use ipr_words::{is_tile_word, ObjectWord, TileWord};

use crate::arena::{BlockArena, BlockClass, BlockList};
use crate::context::{DummyObjects, RegionContext};
use crate::faceset::{collect_sorted, FaceSetArena, FaceSetId};
use crate::limits::{
    CACHE_HALF_BOUNDARY, DUMMY_PLANES, LARGE_DUMMY_PLANES, PLANE_BUDGET, REGION_PLANE_LIM,
    REGION_PLANE_MIN, TILE_WIDTH_PX,
};
use crate::region::{Category, Region};
use crate::strips::StripLoad;

/// Destination buffer for the generated stream. Mirrors the hardware
/// parameter memory: a hard word limit and a write cursor that only moves
/// forward within a frame.
pub struct ParamBuffer {
    words: Vec<u32>,
    limit: usize,
}

impl ParamBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            words: Vec::new(),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    fn try_push(&mut self, word: u32) -> bool {
        if self.words.len() >= self.limit {
            return false;
        }
        self.words.push(word);
        true
    }

    fn pop(&mut self) -> Option<u32> {
        self.words.pop()
    }

    fn truncate_to(&mut self, len: usize) {
        self.words.truncate(len);
    }

    fn or_last(&mut self, bits: u32) {
        if let Some(word) = self.words.last_mut() {
            debug_assert!(!is_tile_word(*word));
            *word |= bits;
        }
    }
}

/// Per-frame outcome of stream generation.
#[derive(Clone, Copy, Default, Debug)]
pub struct FrameStats {
    /// Tiles emitted into the stream.
    pub regions_rendered: u32,
    /// Words written by the last generation call.
    pub words_written: u32,
    /// Planes dropped by generation-time trimming.
    pub planes_discarded: u32,
    /// Whole objects rejected at insertion time for the per-tile budget.
    pub objects_rejected: u32,
    /// The destination buffer filled up and the stream is incomplete.
    pub truncated: bool,
}

/// Populated extent of one strip, for partial-screen compositing.
#[derive(Clone, Copy, Debug)]
pub struct StripExtent {
    pub y_base: u32,
    pub height: u32,
    /// Horizontal pixel range covered by the strip's non-empty tiles.
    pub x_min_px: u32,
    pub x_max_px: u32,
    /// Buffer word offsets of the strip's first descriptor and one past its
    /// last word.
    pub first_word: u32,
    pub last_word: u32,
}

/// Emission state for one tile.
struct TileEmitter<'a> {
    out: &'a mut ParamBuffer,
    arena: &'a BlockArena,
    face_sets: &'a FaceSetArena,
    dummies: DummyObjects,
    vignette_fix: bool,
    max_pass_count: u32,
    total_planes: u32,
    discarded: u32,
    ok: bool,
}

impl TileEmitter<'_> {
    fn push(&mut self, word: u32) {
        if self.ok && !self.out.try_push(word) {
            self.ok = false;
        }
    }

    /// Copy a list into the stream in insertion order, returning its plane
    /// total.
    fn emit_list(&mut self, list: &BlockList, class: BlockClass) -> u32 {
        let arena = self.arena;
        let out = &mut *self.out;
        let mut ok = self.ok;
        let mut planes = 0;
        list.for_each(arena, class, &mut |entry| {
            if ok && !out.try_push(entry) {
                ok = false;
            }
            planes += ObjectWord::from_raw(entry).planes();
        });
        self.ok = ok;
        planes
    }

    /// Drop entries from the tail of the current pass until `planes` fits
    /// the budget, tallying what went.
    fn trim_to_budget(&mut self, pass_start: usize, planes: &mut u32, budget: u32) {
        while *planes > budget && self.out.len() > pass_start {
            let word = self.out.pop().unwrap_or_default();
            let dropped = ObjectWord::from_raw(word).planes();
            *planes -= dropped;
            self.discarded += dropped;
        }
    }

    /// The tile's first pass: opaque, light-volume and shadow lists, trimmed
    /// to budget, padded to the hardware minimum, optionally padded further
    /// past the cache boundary (vignette fix), closed with a flush marker.
    ///
    /// `trans_total` is the pre-counted plane cost of every later
    /// translucent-family pass of this tile.
    fn emit_opaque_pass(&mut self, region: &Region, trans_total: u32) {
        let start = self.out.len();
        let mut planes = 0;
        for cat in [Category::Opaque, Category::LightVol, Category::Shadow] {
            planes += self.emit_list(&region.cats[cat.index()].list, BlockClass::Large);
        }
        if self.ok {
            self.trim_to_budget(start, &mut planes, PLANE_BUDGET);
        }
        while planes < REGION_PLANE_MIN {
            self.push(ObjectWord::new(self.dummies.pad_addr, DUMMY_PLANES).to_raw());
            planes += DUMMY_PLANES;
        }
        if self.vignette_fix
            && trans_total > 0
            && planes <= CACHE_HALF_BOUNDARY
            && planes + trans_total > CACHE_HALF_BOUNDARY
        {
            // Pad the opaque pass clear of the cache line so no translucent
            // pass straddles it.
            let needed = CACHE_HALF_BOUNDARY + 1 - planes;
            let pads = needed.div_ceil(LARGE_DUMMY_PLANES);
            if planes + pads * LARGE_DUMMY_PLANES + trans_total <= REGION_PLANE_LIM {
                for _ in 0..pads {
                    self.push(
                        ObjectWord::new(self.dummies.large_pad_addr, LARGE_DUMMY_PLANES).to_raw(),
                    );
                }
                planes += pads * LARGE_DUMMY_PLANES;
            }
        }
        self.push(
            ObjectWord::new(self.dummies.flush_addr, DUMMY_PLANES)
                .with_flush()
                .to_raw(),
        );
        planes += DUMMY_PLANES;
        self.total_planes += planes;
    }

    /// One begin/flush-wrapped pass from a single category list. Skipped
    /// entirely when the safety margin has no room left.
    fn emit_marked_pass(&mut self, list: BlockList, planes_hint: u32) {
        if list.is_empty() {
            return;
        }
        let overhead = 2 * DUMMY_PLANES;
        if self.total_planes + overhead >= PLANE_BUDGET {
            self.discarded += planes_hint;
            return;
        }
        let start = self.out.len();
        self.push(
            ObjectWord::new(self.dummies.begin_trans_addr, DUMMY_PLANES)
                .with_begin()
                .to_raw(),
        );
        let mut planes = self.emit_list(&list, BlockClass::Large);
        let budget = PLANE_BUDGET - self.total_planes - overhead;
        if self.ok {
            self.trim_to_budget(start + 1, &mut planes, budget);
        }
        if planes == 0 {
            // Nothing survived the trim; retract the begin marker.
            self.out.truncate_to(start);
            return;
        }
        while planes + overhead < REGION_PLANE_MIN {
            self.push(ObjectWord::new(self.dummies.pad_addr, DUMMY_PLANES).to_raw());
            planes += DUMMY_PLANES;
        }
        self.push(
            ObjectWord::new(self.dummies.flush_addr, DUMMY_PLANES)
                .with_flush()
                .to_raw(),
        );
        self.total_planes += planes + overhead;
    }

    /// Emit the depth-ordered translucent passes. Every pass re-includes the
    /// tile's light-volume and shadow lists, so volumes modify translucent
    /// geometry the same way they modify the opaque pass. When more face
    /// sets exist than `max_pass_count`, the deepest `m - max + 1` sets
    /// share the first hardware pass.
    fn emit_translucent(&mut self, region: &Region, sorted: &[FaceSetId]) {
        if sorted.is_empty() {
            return;
        }
        let m = sorted.len() as u32;
        let merged_first = if m > self.max_pass_count {
            (m - self.max_pass_count + 1) as usize
        } else {
            1
        };
        let overhead = 2 * DUMMY_PLANES;
        let mut idx = 0;
        let mut first_pass = true;
        while idx < sorted.len() {
            let group_len = if first_pass { merged_first } else { 1 };
            let end = (idx + group_len).min(sorted.len());
            if self.total_planes + overhead >= PLANE_BUDGET {
                for &id in &sorted[idx..] {
                    self.discarded += self.face_sets.get(id).planes;
                }
                return;
            }
            let start = self.out.len();
            self.push(
                ObjectWord::new(self.dummies.begin_trans_addr, DUMMY_PLANES)
                    .with_begin()
                    .to_raw(),
            );
            let mut planes = 0;
            for &id in &sorted[idx..end] {
                let list = self.face_sets.get(id).list;
                planes += self.emit_list(&list, BlockClass::Small);
            }
            for cat in [Category::LightVol, Category::Shadow] {
                planes += self.emit_list(&region.cats[cat.index()].list, BlockClass::Large);
            }
            let budget = PLANE_BUDGET - self.total_planes - overhead;
            if self.ok {
                self.trim_to_budget(start + 1, &mut planes, budget);
            }
            if planes == 0 {
                self.out.truncate_to(start);
                for &id in &sorted[idx..] {
                    self.discarded += self.face_sets.get(id).planes;
                }
                return;
            }
            while planes + overhead < REGION_PLANE_MIN {
                self.push(ObjectWord::new(self.dummies.pad_addr, DUMMY_PLANES).to_raw());
                planes += DUMMY_PLANES;
            }
            self.push(
                ObjectWord::new(self.dummies.flush_addr, DUMMY_PLANES)
                    .with_flush()
                    .to_raw(),
            );
            self.total_planes += planes + overhead;
            idx = end;
            first_pass = false;
        }
    }
}

impl RegionContext {
    /// Serialize every tile inside `rect` (inclusive tile range) into `out`.
    /// Returns the frame statistics; truncation shows up there, not as an
    /// error. With `render_all` even empty tiles are emitted (debug and
    /// benchmark modes).
    pub fn generate_object_ptrs(
        &mut self,
        rect: ipr_words::BoundsWord,
        render_all: bool,
        out: &mut ParamBuffer,
    ) -> FrameStats {
        self.generate_inner(rect, render_all, out, None)
    }

    /// Like [`generate_object_ptrs`](Self::generate_object_ptrs), but also
    /// records the populated extent of every strip for partial-screen
    /// compositing.
    pub fn generate_object_ptrs_strips(
        &mut self,
        rect: ipr_words::BoundsWord,
        render_all: bool,
        out: &mut ParamBuffer,
        extents: &mut Vec<StripExtent>,
    ) -> FrameStats {
        extents.clear();
        self.generate_inner(rect, render_all, out, Some(extents))
    }

    fn generate_inner(
        &mut self,
        rect: ipr_words::BoundsWord,
        render_all: bool,
        out: &mut ParamBuffer,
        mut extents: Option<&mut Vec<StripExtent>>,
    ) -> FrameStats {
        let RegionContext {
            strips: table,
            arena,
            face_sets,
            config,
            stats,
            sorted_scratch,
            ..
        } = self;
        let (rx0, ry0, rx1, ry1) = rect.decode();
        let col0 = rx0 >> table.width_shift;
        let col1 = (rx1 >> table.width_shift).min(table.region_cols - 1);
        let tile_px = TILE_WIDTH_PX << table.width_shift;
        // A rect covering only part of a strip's columns measures a partial
        // load; keep those out of the resize heuristic.
        let full_span = col0 == 0 && col1 == table.region_cols - 1;
        let start_len = out.len();

        'strips: for strip in table.strips.iter_mut() {
            if strip.guard {
                continue;
            }
            if strip.row_start > ry1 || strip.row_start + strip.rows <= ry0 {
                continue;
            }
            let mut busiest = 0u32;
            let mut strip_discarded = 0u32;
            let mut strip_first: Option<u32> = None;
            let mut strip_last = 0u32;
            let mut x_min = u32::MAX;
            let mut x_max = 0u32;

            for col in (col0..=col1).rev() {
                let region = &mut strip.regions[col as usize];
                if !region.has_content() && !render_all {
                    continue;
                }
                let tile_start = out.len();
                collect_sorted(region, face_sets, config.sort, sorted_scratch);

                // Pre-count the translucent-family plane cost for the
                // vignette fix before anything is committed.
                let mut trans_total = 0;
                for cat in [Category::OpaqueTrans, Category::Highlight, Category::Fog] {
                    let c = &region.cats[cat.index()];
                    if !c.list.is_empty() {
                        trans_total += c.planes + 2 * DUMMY_PLANES;
                    }
                }
                if !sorted_scratch.is_empty() {
                    let passes = (sorted_scratch.len() as u32).min(config.max_pass_count);
                    // Each pass re-includes the light-volume and shadow
                    // lists on top of its marker overhead.
                    let relists = region.cats[Category::LightVol.index()].planes
                        + region.cats[Category::Shadow.index()].planes;
                    trans_total += sorted_scratch
                        .iter()
                        .map(|&id| face_sets.get(id).planes)
                        .sum::<u32>()
                        + passes * (2 * DUMMY_PLANES + relists);
                }

                let mut em = TileEmitter {
                    out: &mut *out,
                    arena,
                    face_sets,
                    dummies: config.dummies,
                    vignette_fix: config.vignette_fix,
                    max_pass_count: config.max_pass_count,
                    total_planes: 0,
                    discarded: 0,
                    ok: true,
                };
                em.push(strip.desc_y_raw | (col & TileWord::X_POS_MASK));
                em.emit_opaque_pass(region, trans_total);
                let atmos = region.cats[Category::OpaqueTrans.index()];
                em.emit_marked_pass(atmos.list, atmos.planes);
                let highlight = region.cats[Category::Highlight.index()];
                em.emit_marked_pass(highlight.list, highlight.planes);
                let fog = region.cats[Category::Fog.index()];
                em.emit_marked_pass(fog.list, fog.planes);
                em.emit_translucent(region, sorted_scratch);

                let tile_planes = em.total_planes;
                let tile_discarded = em.discarded;
                let ok = em.ok;

                if !ok {
                    out.truncate_to(tile_start);
                    stats.truncated = true;
                    log::warn!(
                        "object-pointer buffer full after {} words, stream truncated",
                        out.len()
                    );
                    break 'strips;
                }
                stats.regions_rendered += 1;
                strip_discarded += tile_discarded;
                busiest = busiest.max(tile_planes);
                if strip_first.is_none() {
                    strip_first = Some(tile_start as u32);
                }
                strip_last = out.len() as u32;
                x_min = x_min.min(col * tile_px);
                x_max = x_max.max(((col + 1) * tile_px).min(table.screen_w));
            }

            if full_span {
                strip.load = StripLoad {
                    busiest,
                    discarded: strip.load.discarded + strip_discarded,
                    valid: true,
                };
            } else {
                strip.load.discarded += strip_discarded;
            }
            stats.planes_discarded += strip_discarded;
            if let (Some(exts), Some(first)) = (extents.as_deref_mut(), strip_first) {
                exts.push(StripExtent {
                    y_base: strip.y_base,
                    height: strip.height,
                    x_min_px: x_min,
                    x_max_px: x_max,
                    first_word: first,
                    last_word: strip_last,
                });
            }
        }

        if out.len() > start_len {
            out.or_last(ObjectWord::LAST_BIT);
        }
        stats.words_written = (out.len() - start_len) as u32;
        log::debug!(
            "generated {} words for {} regions ({} planes discarded)",
            stats.words_written,
            stats.regions_rendered,
            stats.planes_discarded
        );
        *stats
    }
}
