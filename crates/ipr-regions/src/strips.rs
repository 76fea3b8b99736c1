//! Screen partitioning into horizontal strips of tiles.
//!
//! A strip is one row of tiles sharing a height in scanlines. Strip heights
//! adapt between frames: a strip whose busiest tile ran near the plane limit
//! is split, two adjacent lightly-loaded strips of equal height are merged.
//! Total vertical coverage is preserved exactly, including an irregular
//! bottom strip when the screen height is not a multiple of the nominal tile
//! height, plus a one-line guard strip past the bottom that only ever emits
//! the sentinel descriptor.
//!
//! Row coordinates (as carried by `BoundsWord`) are in units of the
//! configured minimum strip height, so they stay valid across resizes.

use ipr_words::{BoundsWord, TileWord};

use crate::limits::{REGION_PLANE_LIM, TILE_WIDTH_PX};
use crate::region::Region;

/// Strip-height policy. Heights are scanlines; `min_height` must divide
/// `nominal_height`, and `max_height` bounds merging.
#[derive(Clone, Copy, Debug)]
pub struct TilingPolicy {
    pub nominal_height: u32,
    pub min_height: u32,
    pub max_height: u32,
    /// Disable to pin all strips at the nominal height (some hardware
    /// generations have no use for adaptive sizing).
    pub dynamic: bool,
}

impl Default for TilingPolicy {
    fn default() -> Self {
        Self {
            nominal_height: 32,
            min_height: 8,
            max_height: 64,
            dynamic: true,
        }
    }
}

/// Per-strip load statistic gathered during stream generation.
#[derive(Clone, Copy, Default, Debug)]
pub struct StripLoad {
    /// Plane count of the busiest tile in the strip.
    pub busiest: u32,
    /// Planes trimmed or rejected across the strip.
    pub discarded: u32,
    /// Set once a generation pass has measured this strip; resize decisions
    /// only act on measured strips.
    pub valid: bool,
}

/// One horizontal band of tiles.
#[derive(Debug)]
pub struct Strip {
    /// First scanline covered.
    pub y_base: u32,
    /// Height in scanlines. The bottom strip may be irregular.
    pub height: u32,
    /// First row (min-height units) covered.
    pub row_start: u32,
    /// Rows covered, rounded up for the irregular bottom strip.
    pub rows: u32,
    pub guard: bool,
    /// Precomputed descriptor word with the Y fields filled in; the emitter
    /// ORs in the per-tile X fields.
    pub desc_y_raw: u32,
    pub load: StripLoad,
    pub regions: Vec<Region>,
}

/// The full screen layout: strips top-to-bottom plus a row lookup table for
/// strip-to-strip iteration during insertion.
pub struct StripTable {
    pub(crate) strips: Vec<Strip>,
    pub(crate) row_lookup: Vec<u16>,
    /// Total rows covering the screen (guard excluded).
    pub(crate) rows: u32,
    pub(crate) region_cols: u32,
    pub(crate) width_shift: u32,
    pub(crate) screen_w: u32,
    pub(crate) screen_h: u32,
    pub(crate) min_height: u32,
    /// AND-mask over raw bounds words that clears Y bits insignificant at
    /// the current strip granularity; bounds equal under this mask touch
    /// the same strips.
    pub(crate) y_sig_mask: u32,
}

impl StripTable {
    pub fn new(screen_w: u32, screen_h: u32, double_wide: bool, policy: &TilingPolicy) -> Self {
        debug_assert!(screen_w > 0 && screen_h > 0);
        debug_assert!(policy.min_height > 0);
        debug_assert!(policy.nominal_height % policy.min_height == 0);
        let width_shift = double_wide as u32;
        let width_tiles = screen_w.div_ceil(TILE_WIDTH_PX);
        let region_cols = width_tiles.div_ceil(1 << width_shift);
        let rows = screen_h.div_ceil(policy.min_height);
        let mut table = Self {
            strips: Vec::new(),
            row_lookup: Vec::new(),
            rows,
            region_cols,
            width_shift,
            screen_w,
            screen_h,
            min_height: policy.min_height,
            y_sig_mask: !0,
        };
        table.full_layout(policy);
        table
    }

    /// Reset all strips for a new frame. With `force` (or when adaptive
    /// sizing is off) the nominal layout is rebuilt; otherwise each strip's
    /// load statistic from the previous frame drives the split/merge
    /// heuristic.
    pub fn reset_all(&mut self, policy: &TilingPolicy, force: bool) {
        if force || !policy.dynamic {
            self.full_layout(policy);
        } else {
            let spans = self.resize_spans(policy);
            self.rebuild(&spans);
        }
    }

    /// Nominal layout: full-height strips, irregular remainder at the
    /// bottom.
    fn full_layout(&mut self, policy: &TilingPolicy) {
        let mut spans = Vec::new();
        let mut y = 0;
        while y < self.screen_h {
            spans.push(policy.nominal_height.min(self.screen_h - y));
            y += policy.nominal_height;
        }
        self.rebuild(&spans);
    }

    /// Next frame's strip heights from this frame's loads.
    fn resize_spans(&self, policy: &TilingPolicy) -> Vec<u32> {
        let split_at = REGION_PLANE_LIM * 9 / 10;
        let merge_below = REGION_PLANE_LIM / 8;
        let mut spans = Vec::with_capacity(self.strips.len());
        let body = &self.strips[..self.strips.len() - 1]; // guard excluded
        let mut i = 0;
        while i < body.len() {
            let s = &body[i];
            let load = s.load.busiest + s.load.discarded;
            if s.load.valid && load >= split_at && s.rows > 1 && s.height > policy.min_height {
                // Overloaded: split proportionally, the last piece absorbing
                // any irregular line remainder.
                let shift = if load >= REGION_PLANE_LIM { 2 } else { 1 };
                let pieces = (1u32 << shift).min(s.rows);
                let base = s.rows / pieces;
                let extra = s.rows % pieces;
                let mut consumed = 0;
                for p in 0..pieces {
                    let h = if p + 1 == pieces {
                        s.height - consumed
                    } else {
                        (base + (p < extra) as u32) * self.min_height
                    };
                    spans.push(h);
                    consumed += h;
                }
                log::debug!(
                    "strip y={} h={} load={} split into {} pieces",
                    s.y_base,
                    s.height,
                    load,
                    pieces
                );
                i += 1;
                continue;
            }
            if s.load.valid && load < merge_below && i + 1 < body.len() {
                let t = &body[i + 1];
                let t_load = t.load.busiest + t.load.discarded;
                let both_regular = s.height == s.rows * self.min_height
                    && t.height == t.rows * self.min_height;
                if t.height == s.height
                    && t.load.valid
                    && t_load < merge_below
                    && s.height * 2 <= policy.max_height
                    && both_regular
                {
                    log::debug!(
                        "strips y={},{} h={} merged (loads {} {})",
                        s.y_base,
                        t.y_base,
                        s.height,
                        load,
                        t_load
                    );
                    spans.push(s.height * 2);
                    i += 2;
                    continue;
                }
            }
            spans.push(s.height);
            i += 1;
        }
        spans
    }

    /// Re-describe the table for the given strip heights, reusing region
    /// allocations, and zero every region for the new frame.
    fn rebuild(&mut self, spans: &[u32]) {
        debug_assert_eq!(spans.iter().sum::<u32>(), self.screen_h);
        let mut pool: Vec<Vec<Region>> = self.strips.drain(..).map(|s| s.regions).collect();
        let mut y = 0;
        let mut row = 0;
        for &height in spans {
            let mut regions = pool.pop().unwrap_or_default();
            regions.clear();
            regions.resize_with(self.region_cols as usize, Region::default);
            let rows = height.div_ceil(self.min_height);
            self.strips.push(Strip {
                y_base: y,
                height,
                row_start: row,
                rows,
                guard: false,
                desc_y_raw: TileWord::new(0, self.width_shift != 0, y, height).to_raw(),
                load: StripLoad::default(),
                regions,
            });
            y += height;
            row += rows;
        }
        debug_assert_eq!(y, self.screen_h);
        debug_assert_eq!(row, self.rows);
        // Guard band: one line past the bottom, sentinel descriptor only.
        self.strips.push(Strip {
            y_base: y,
            height: 1,
            row_start: row,
            rows: 0,
            guard: true,
            desc_y_raw: TileWord::sentinel().to_raw(),
            load: StripLoad::default(),
            regions: Vec::new(),
        });

        self.row_lookup.clear();
        self.row_lookup.resize(self.rows as usize, 0);
        for (si, strip) in self.strips.iter().enumerate() {
            if strip.guard {
                continue;
            }
            for r in strip.row_start..strip.row_start + strip.rows {
                self.row_lookup[r as usize] = si as u16;
            }
        }
        self.recompute_y_sig_mask();
    }

    /// Recompute the significant-Y-bits mask: when every strip starts and
    /// spans a multiple of 2^k rows, the low k row bits never affect which
    /// strip a row falls in.
    fn recompute_y_sig_mask(&mut self) {
        let mut g = 0u32;
        for strip in &self.strips {
            if !strip.guard {
                g |= strip.row_start | strip.rows;
            }
        }
        let shift = if g == 0 { 0 } else { g.trailing_zeros() };
        let low = (1u32 << shift) - 1;
        self.y_sig_mask =
            !((low << BoundsWord::Y0_OFFSET) | (low << BoundsWord::Y1_OFFSET));
    }

    /// Strip index covering the given row.
    #[inline(always)]
    pub(crate) fn strip_of_row(&self, row: u32) -> usize {
        self.row_lookup[row as usize] as usize
    }

    pub fn region_cols(&self) -> u32 {
        self.region_cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Strips including the trailing guard strip.
    pub fn strips(&self) -> &[Strip] {
        &self.strips
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coverage_ok(table: &StripTable) {
        let mut y = 0;
        let mut row = 0;
        for strip in &table.strips {
            if strip.guard {
                assert_eq!(strip.y_base, table.screen_h);
                assert!(TileWord::from_raw(strip.desc_y_raw).is_sentinel());
                continue;
            }
            assert_eq!(strip.y_base, y);
            assert_eq!(strip.row_start, row);
            y += strip.height;
            row += strip.rows;
        }
        assert_eq!(y, table.screen_h);
        assert_eq!(row, table.rows);
        for r in 0..table.rows {
            let si = table.strip_of_row(r);
            let s = &table.strips[si];
            assert!(r >= s.row_start && r < s.row_start + s.rows);
        }
    }

    #[test]
    fn test_nominal_layout_even_screen() {
        let table = StripTable::new(640, 480, false, &TilingPolicy::default());
        coverage_ok(&table);
        // 480 / 32 = 15 strips + guard.
        assert_eq!(table.strips.len(), 16);
        assert_eq!(table.region_cols(), 20);
        assert!(table.strips[..15].iter().all(|s| s.height == 32));
    }

    #[test]
    fn test_irregular_bottom_strip() {
        let table = StripTable::new(640, 470, false, &TilingPolicy::default());
        coverage_ok(&table);
        let last_body = &table.strips[table.strips.len() - 2];
        assert_eq!(last_body.height, 470 - 14 * 32);
        let desc = TileWord::from_raw(last_body.desc_y_raw);
        assert_eq!(desc.y_size(), last_body.height);
    }

    #[test]
    fn test_double_wide_halves_columns() {
        let table = StripTable::new(640, 480, true, &TilingPolicy::default());
        assert_eq!(table.region_cols(), 10);
        assert!(TileWord::from_raw(table.strips[0].desc_y_raw | 1).x_double());
    }

    #[test]
    fn test_reset_idempotent_without_measured_load() {
        let policy = TilingPolicy::default();
        let mut table = StripTable::new(640, 480, false, &policy);
        let heights: Vec<u32> = table.strips.iter().map(|s| s.height).collect();
        for _ in 0..5 {
            table.reset_all(&policy, false);
            coverage_ok(&table);
        }
        // No generation pass measured any strip, so no resize happens.
        let after: Vec<u32> = table.strips.iter().map(|s| s.height).collect();
        assert_eq!(heights, after);
    }

    #[test]
    fn test_overloaded_strip_splits() {
        let policy = TilingPolicy::default();
        let mut table = StripTable::new(64, 64, false, &policy);
        // Two 32-line strips; overload the first.
        table.strips[0].load = StripLoad {
            busiest: REGION_PLANE_LIM,
            discarded: 0,
            valid: true,
        };
        // A medium load keeps the second from merging or splitting.
        table.strips[1].load = StripLoad {
            busiest: 400,
            discarded: 0,
            valid: true,
        };
        table.reset_all(&policy, false);
        coverage_ok(&table);
        // Split into 4 pieces of 8 lines (proportional to hard overload).
        assert_eq!(table.strips[0].height, 8);
        assert_eq!(table.strips[1].height, 8);
        assert_eq!(table.strips[4].height, 32);
    }

    fn mark_all_idle(table: &mut StripTable) {
        for strip in &mut table.strips {
            if !strip.guard {
                strip.load = StripLoad {
                    busiest: 0,
                    discarded: 0,
                    valid: true,
                };
            }
        }
    }

    #[test]
    fn test_idle_siblings_merge() {
        let policy = TilingPolicy::default();
        let mut table = StripTable::new(64, 128, false, &policy);
        // Four 32-line strips, all measured idle: expect two 64-line strips.
        mark_all_idle(&mut table);
        table.reset_all(&policy, false);
        coverage_ok(&table);
        let heights: Vec<u32> = table
            .strips
            .iter()
            .filter(|s| !s.guard)
            .map(|s| s.height)
            .collect();
        assert_eq!(heights, vec![64, 64]);
        // At max_height no further merging happens.
        table.reset_all(&policy, false);
        let heights: Vec<u32> = table
            .strips
            .iter()
            .filter(|s| !s.guard)
            .map(|s| s.height)
            .collect();
        assert_eq!(heights, vec![64, 64]);
    }

    #[test]
    fn test_dynamic_disabled_pins_layout() {
        let policy = TilingPolicy {
            dynamic: false,
            ..TilingPolicy::default()
        };
        let mut table = StripTable::new(64, 64, false, &policy);
        table.strips[0].load.busiest = REGION_PLANE_LIM;
        table.reset_all(&policy, false);
        assert!(table.strips[..2].iter().all(|s| s.height == 32));
    }

    #[test]
    fn test_y_sig_mask_tracks_granularity() {
        let policy = TilingPolicy::default();
        let mut table = StripTable::new(64, 64, false, &policy);
        // Nominal: strips span 4 rows each, so 2 low row bits are masked.
        let low2 = 0x3u32;
        let expected = !((low2 << BoundsWord::Y0_OFFSET) | (low2 << BoundsWord::Y1_OFFSET));
        assert_eq!(table.y_sig_mask, expected);
        // After a split down to min height every row bit is significant.
        table.strips[0].load = StripLoad {
            busiest: REGION_PLANE_LIM,
            discarded: 0,
            valid: true,
        };
        table.strips[1].load = StripLoad {
            busiest: 400,
            discarded: 0,
            valid: true,
        };
        table.reset_all(&policy, false);
        assert_eq!(table.y_sig_mask, !0);
    }
}
