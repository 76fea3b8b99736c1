//! Object insertion: binning primitives into every tile their bounding box
//! touches.
//!
//! All entry points share one skeleton: decode the packed bounds, jump
//! strip-to-strip down the screen via the row lookup table, then visit each
//! touched tile in the strip. What happens per tile depends on the category:
//! opaque-family objects run-length-merge with the previous entry when their
//! plane data is address-contiguous, translucent objects extend or open a
//! face set, extra highlight/fog planes go to their own lists. Every path is
//! budgeted: an object that would push its tile past the plane budget is
//! dropped from that tile and tallied, which also bounds every block chain.

use bitflags::bitflags;
use ipr_words::{BoundsWord, ObjectWord};

use crate::arena::BlockClass;
use crate::context::RegionContext;
use crate::faceset::DepthPlane;
use crate::limits::{PLANE_BUDGET, PLANE_WORDS, TILE_WIDTH_PX};
use crate::region::Category;

bitflags! {
    /// Per-object feature flags that demand extra planes.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct ObjectFlags: u32 {
        /// Object carries a smooth-highlight plane after its ISP planes.
        const SMOOTH_HIGHLIGHT = 1 << 0;
        /// Object carries a vertex-fog plane after its ISP planes (and after
        /// the highlight plane when both are present).
        const VERTEX_FOG = 1 << 1;
    }
}

/// One packed object reference for the batched entry points.
#[derive(Clone, Copy, Debug)]
pub struct ObjectRef {
    pub bounds: BoundsWord,
    /// Word address of the object's planes in the ISP plane buffer.
    pub addr: u32,
    pub planes: u32,
    pub flags: ObjectFlags,
}

impl RegionContext {
    /// Bin an opaque object into every tile its bounds touch.
    pub fn add_region_solid(&mut self, bounds: BoundsWord, planes: u32, addr: u32) {
        self.insert_merged(bounds, planes, addr, Category::Opaque);
    }

    /// Bin an opaque-translucent (atmospheric) object: rendered in its own
    /// pass right after the opaque pass, without depth sorting.
    pub fn add_region_atmos(&mut self, bounds: BoundsWord, planes: u32, addr: u32) {
        self.insert_merged(bounds, planes, addr, Category::OpaqueTrans);
    }

    /// Bin a shadow volume object.
    pub fn add_region_shadow(&mut self, bounds: BoundsWord, planes: u32, addr: u32) {
        self.insert_budgeted(bounds, planes, addr, Category::Shadow);
    }

    /// Bin a light volume object.
    pub fn add_region_light_vol(&mut self, bounds: BoundsWord, planes: u32, addr: u32) {
        self.insert_budgeted(bounds, planes, addr, Category::LightVol);
    }

    /// Bin a translucent object into the face set identified by `set_id`
    /// (obtained from [`RegionContext::alloc_set_id`]). A tile opens a new
    /// face set when the id differs from its currently open set of the same
    /// polarity; otherwise the object extends the open set and the set's
    /// representative depth rises to the nearest sample seen. Objects over
    /// the tile's translucent plane budget are dropped from that tile and
    /// tallied.
    pub fn add_region_see_thru(
        &mut self,
        bounds: BoundsWord,
        set_id: u32,
        planes: u32,
        addr: u32,
        depth: DepthPlane,
    ) {
        debug_assert!(planes >= 1 && planes <= ObjectWord::MAX_PLANES);
        let entry = ObjectWord::new(addr, planes).to_raw();
        let polarity = (set_id & 1) as usize;
        let RegionContext {
            strips: table,
            arena,
            face_sets,
            stats,
            ..
        } = self;
        let (x0, y0, x1, y1) = bounds.decode();
        debug_assert!(y1 < table.rows && x1 < table.region_cols << table.width_shift);
        let col0 = x0 >> table.width_shift;
        let col1 = (x1 >> table.width_shift).min(table.region_cols - 1);
        let mut row = y0;
        while row <= y1 {
            let si = table.strip_of_row(row);
            let strip = &mut table.strips[si];
            let y_px = strip.y_base as f32;
            for col in col0..=col1 {
                let x_px = ((col << table.width_shift) * TILE_WIDTH_PX) as f32;
                let sample = depth.sample(x_px, y_px);
                let region = &mut strip.regions[col as usize];
                if region.trans_planes + planes > PLANE_BUDGET {
                    stats.objects_rejected += 1;
                    strip.load.discarded += planes;
                    continue;
                }
                region.trans_planes += planes;
                if region.open_set_id[polarity] == set_id {
                    let set = face_sets.get_mut(region.open_set[polarity]);
                    set.list.push(arena, BlockClass::Small, entry);
                    set.planes += planes;
                    set.depth = set.depth.max(sample);
                } else {
                    let id = face_sets.alloc(set_id, sample);
                    let set = face_sets.get_mut(id);
                    set.list.push(arena, BlockClass::Small, entry);
                    set.planes = planes;
                    if region.chain_head[polarity].is_none() {
                        region.chain_head[polarity] = id;
                    } else {
                        face_sets.get_mut(region.chain_tail[polarity]).next = id;
                    }
                    region.chain_tail[polarity] = id;
                    region.open_set_id[polarity] = set_id;
                    region.open_set[polarity] = id;
                    region.pass_count += 1;
                }
            }
            row = strip.row_start + strip.rows;
        }
    }

    /// Batched opaque insertion. Runs of objects with identical bounds
    /// (under the significant-Y mask) and contiguous plane addresses are
    /// combined into one entry before binning.
    pub fn add_region_objects(&mut self, objects: &[ObjectRef]) {
        let mask = self.strips.y_sig_mask;
        let mut i = 0;
        while i < objects.len() {
            let first = objects[i];
            let key = first.bounds.to_raw() & mask;
            let mut planes = first.planes;
            let mut j = i + 1;
            while j < objects.len()
                && objects[j].bounds.to_raw() & mask == key
                && objects[j].addr == first.addr + planes * PLANE_WORDS
                && planes + objects[j].planes <= ObjectWord::MAX_PLANES
            {
                planes += objects[j].planes;
                j += 1;
            }
            self.insert_merged(first.bounds, planes, first.addr, Category::Opaque);
            i = j;
        }
    }

    /// Batched opaque insertion with extra highlight/fog planes. Objects
    /// carrying flags are never combined: their extra planes sit between
    /// consecutive objects' ISP planes, breaking address contiguity.
    pub fn add_region_objects_extra(&mut self, objects: &[ObjectRef]) {
        let mask = self.strips.y_sig_mask;
        let mut i = 0;
        while i < objects.len() {
            let first = objects[i];
            if !first.flags.is_empty() {
                self.insert_merged(first.bounds, first.planes, first.addr, Category::Opaque);
                let mut extra_addr = first.addr + first.planes * PLANE_WORDS;
                if first.flags.contains(ObjectFlags::SMOOTH_HIGHLIGHT) {
                    self.insert_budgeted(first.bounds, 1, extra_addr, Category::Highlight);
                    extra_addr += PLANE_WORDS;
                }
                if first.flags.contains(ObjectFlags::VERTEX_FOG) {
                    self.insert_budgeted(first.bounds, 1, extra_addr, Category::Fog);
                }
                i += 1;
                continue;
            }
            let key = first.bounds.to_raw() & mask;
            let mut planes = first.planes;
            let mut j = i + 1;
            while j < objects.len()
                && objects[j].flags.is_empty()
                && objects[j].bounds.to_raw() & mask == key
                && objects[j].addr == first.addr + planes * PLANE_WORDS
                && planes + objects[j].planes <= ObjectWord::MAX_PLANES
            {
                planes += objects[j].planes;
                j += 1;
            }
            self.insert_merged(first.bounds, planes, first.addr, Category::Opaque);
            i = j;
        }
    }

    /// Opaque-family insertion with run-length merging and the per-tile
    /// plane budget. An insertion that would overflow the budget drops the
    /// object from that tile only, silently, tallied for the resize policy.
    fn insert_merged(&mut self, bounds: BoundsWord, planes: u32, addr: u32, cat: Category) {
        debug_assert!(planes >= 1 && planes <= ObjectWord::MAX_PLANES);
        let obj_id = self.next_obj_id;
        self.next_obj_id += 1;
        let RegionContext {
            strips: table,
            arena,
            stats,
            ..
        } = self;
        let (x0, y0, x1, y1) = bounds.decode();
        debug_assert!(y1 < table.rows && x1 < table.region_cols << table.width_shift);
        let col0 = x0 >> table.width_shift;
        let col1 = (x1 >> table.width_shift).min(table.region_cols - 1);
        let mut row = y0;
        while row <= y1 {
            let si = table.strip_of_row(row);
            let strip = &mut table.strips[si];
            for col in col0..=col1 {
                let region = &mut strip.regions[col as usize];
                let entry = &mut region.cats[cat.index()];
                if entry.planes + planes > PLANE_BUDGET {
                    stats.objects_rejected += 1;
                    strip.load.discarded += planes;
                    continue;
                }
                let contiguous = region.last_obj_id != 0
                    && region.last_obj_id + 1 == obj_id
                    && region.last_cat == cat as u8
                    && region.last_addr + region.last_planes * PLANE_WORDS == addr
                    && region.last_planes + planes <= ObjectWord::MAX_PLANES;
                if contiguous {
                    let merged = region.last_planes + planes;
                    let mut word =
                        ObjectWord::from_raw(entry.list.last_entry(arena).unwrap_or_default());
                    word.set_planes(merged);
                    entry.list.set_last_entry(arena, word.to_raw());
                    entry.planes += planes;
                    region.last_obj_id = obj_id;
                    region.last_planes = merged;
                } else {
                    entry
                        .list
                        .push(arena, BlockClass::Large, ObjectWord::new(addr, planes).to_raw());
                    entry.planes += planes;
                    region.last_obj_id = obj_id;
                    region.last_cat = cat as u8;
                    region.last_addr = addr;
                    region.last_planes = planes;
                }
            }
            row = strip.row_start + strip.rows;
        }
    }

    /// Insertion without run-length merging (shadow, light-volume and extra
    /// plane lists), budgeted against the category's own plane count. The
    /// combined first pass may still exceed the budget; generation trims it
    /// from the tail.
    fn insert_budgeted(&mut self, bounds: BoundsWord, planes: u32, addr: u32, cat: Category) {
        debug_assert!(planes >= 1 && planes <= ObjectWord::MAX_PLANES);
        let RegionContext {
            strips: table,
            arena,
            stats,
            ..
        } = self;
        let (x0, y0, x1, y1) = bounds.decode();
        debug_assert!(y1 < table.rows && x1 < table.region_cols << table.width_shift);
        let col0 = x0 >> table.width_shift;
        let col1 = (x1 >> table.width_shift).min(table.region_cols - 1);
        let entry = ObjectWord::new(addr, planes).to_raw();
        let mut row = y0;
        while row <= y1 {
            let si = table.strip_of_row(row);
            let strip = &mut table.strips[si];
            for col in col0..=col1 {
                let region = &mut strip.regions[col as usize];
                let list = &mut region.cats[cat.index()];
                if list.planes + planes > PLANE_BUDGET {
                    stats.objects_rejected += 1;
                    strip.load.discarded += planes;
                    continue;
                }
                list.list.push(arena, BlockClass::Large, entry);
                list.planes += planes;
            }
            row = strip.row_start + strip.rows;
        }
    }
}
