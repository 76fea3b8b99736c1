//! Tests for object insertion: binning, run-length merging and the
//! per-tile plane budget.

use ipr_regions::{
    BoundsWord, DepthPlane, ObjectFlags, ObjectRef, ObjectWord, ParamBuffer, Polarity,
    RegionConfig, RegionContext,
};

fn ctx_64x64() -> RegionContext {
    let mut ctx = RegionContext::new(RegionConfig {
        screen_width: 64,
        screen_height: 64,
        ..RegionConfig::default()
    });
    ctx.reset_frame(true);
    ctx
}

fn generate(ctx: &mut RegionContext) -> Vec<u32> {
    let mut out = ParamBuffer::new(64 * 1024);
    ctx.generate_object_ptrs(ctx.screen_bounds(), false, &mut out);
    out.words().to_vec()
}

/// Object words of the first pass of the first tile, pad dummies excluded.
fn opaque_pass(words: &[u32]) -> Vec<ObjectWord> {
    assert!(ipr_regions::words::is_tile_word(words[0]));
    let mut pass = Vec::new();
    for &raw in &words[1..] {
        let w = ObjectWord::from_raw(raw & !ObjectWord::LAST_BIT);
        if w.flush() {
            break;
        }
        if w.addr() != 0 {
            pass.push(w);
        }
    }
    pass
}

mod run_length_merge {
    use super::*;

    #[test]
    fn contiguous_objects_merge() {
        let mut ctx = ctx_64x64();
        let bounds = BoundsWord::new(0, 0, 0, 3);
        ctx.add_region_solid(bounds, 3, 100);
        // 100 + 3 * 3 = 109: plane data follows on directly.
        ctx.add_region_solid(bounds, 2, 109);
        let words = generate(&mut ctx);
        let pass = opaque_pass(&words);
        assert_eq!(pass.len(), 1);
        assert_eq!(pass[0].addr(), 100);
        assert_eq!(pass[0].planes(), 5);
    }

    #[test]
    fn address_gap_breaks_merge() {
        let mut ctx = ctx_64x64();
        let bounds = BoundsWord::new(0, 0, 0, 3);
        ctx.add_region_solid(bounds, 3, 100);
        ctx.add_region_solid(bounds, 2, 200);
        let pass = opaque_pass(&generate(&mut ctx));
        assert_eq!(pass.len(), 2);
        assert_eq!(pass[0].addr(), 100);
        assert_eq!(pass[1].addr(), 200);
    }

    #[test]
    fn intervening_object_breaks_merge() {
        let mut ctx = ctx_64x64();
        let bounds = BoundsWord::new(0, 0, 0, 3);
        ctx.add_region_solid(bounds, 3, 100);
        // A different tile in between bumps the object id past adjacency.
        ctx.add_region_solid(BoundsWord::new(1, 4, 1, 7), 1, 500);
        ctx.add_region_solid(bounds, 2, 109);
        let pass = opaque_pass(&generate(&mut ctx));
        assert_eq!(pass.len(), 2);
    }

    #[test]
    fn category_mismatch_breaks_merge() {
        let mut ctx = ctx_64x64();
        let bounds = BoundsWord::new(0, 0, 0, 3);
        ctx.add_region_solid(bounds, 3, 100);
        ctx.add_region_atmos(bounds, 2, 109);
        let pass = opaque_pass(&generate(&mut ctx));
        assert_eq!(pass.len(), 1);
        assert_eq!(pass[0].planes(), 3);
    }

    #[test]
    fn first_object_never_merges_with_fresh_state() {
        // A fresh tile has zeroed merge state; an object at address 0 must
        // not look contiguous with it.
        let mut ctx = ctx_64x64();
        ctx.add_region_solid(BoundsWord::new(0, 0, 0, 3), 1, 0);
        let words = generate(&mut ctx);
        let w = ObjectWord::from_raw(words[1]);
        assert_eq!(w.addr(), 0);
        assert_eq!(w.planes(), 1);
    }

    #[test]
    fn merge_stops_at_plane_field_limit() {
        let mut ctx = ctx_64x64();
        let bounds = BoundsWord::new(0, 0, 0, 3);
        ctx.add_region_solid(bounds, 400, 100);
        // 400 + 400 exceeds the 511-plane field, so no merge.
        ctx.add_region_solid(bounds, 400, 100 + 400 * 3);
        let pass = opaque_pass(&generate(&mut ctx));
        assert_eq!(pass.len(), 2);
    }
}

mod plane_budget {
    use super::*;

    #[test]
    fn insertion_over_budget_is_rejected() {
        let mut ctx = ctx_64x64();
        let bounds = BoundsWord::new(0, 0, 0, 3);
        ctx.add_region_solid(bounds, 500, 100);
        // 500 + 500 > 960: dropped from the tile, tallied in stats.
        ctx.add_region_solid(bounds, 500, 5000);
        assert_eq!(ctx.frame_stats().objects_rejected, 1);
        let pass = opaque_pass(&generate(&mut ctx));
        assert_eq!(pass.len(), 1);
        assert_eq!(pass[0].addr(), 100);
    }

    #[test]
    fn translucent_insertion_over_budget_is_rejected() {
        let mut ctx = ctx_64x64();
        let bounds = BoundsWord::new(0, 0, 0, 3);
        let set = ctx.alloc_set_id(Polarity::Front);
        // Far more one-plane objects than the tile can hold; the overflow
        // is dropped at insertion, never blowing up generation.
        for i in 0..1600 {
            ctx.add_region_see_thru(bounds, set, 1, 16 + i * 3, DepthPlane::flat(1.0));
        }
        assert_eq!(ctx.frame_stats().objects_rejected, 1600 - 960);
        let words = generate(&mut ctx);
        assert!(!words.is_empty());
        assert!(!ctx.frame_stats().truncated);
    }

    #[test]
    fn shadow_insertion_over_budget_is_rejected() {
        let mut ctx = ctx_64x64();
        let bounds = BoundsWord::new(0, 0, 0, 3);
        ctx.add_region_shadow(bounds, 500, 100);
        ctx.add_region_shadow(bounds, 500, 5000);
        assert_eq!(ctx.frame_stats().objects_rejected, 1);
    }

    #[test]
    fn rejection_is_per_tile() {
        let mut ctx = ctx_64x64();
        // Fill only the left tile of the top strip.
        ctx.add_region_solid(BoundsWord::new(0, 0, 0, 3), 500, 100);
        // Spans both columns: rejected on the left, accepted on the right.
        ctx.add_region_solid(BoundsWord::new(0, 0, 1, 3), 500, 5000);
        assert_eq!(ctx.frame_stats().objects_rejected, 1);
        let words = generate(&mut ctx);
        let tiles = words
            .iter()
            .filter(|&&w| ipr_regions::words::is_tile_word(w))
            .count();
        assert_eq!(tiles, 2);
    }
}

mod coverage {
    use super::*;

    #[test]
    fn bounds_reach_every_touched_tile() {
        let mut ctx = ctx_64x64();
        // Full screen: 2 columns by 2 strips.
        ctx.add_region_solid(BoundsWord::new(0, 0, 1, 7), 3, 100);
        let words = generate(&mut ctx);
        let hits = words
            .iter()
            .filter(|&&w| {
                !ipr_regions::words::is_tile_word(w)
                    && ObjectWord::from_raw(w & !ObjectWord::LAST_BIT).addr() == 100
            })
            .count();
        assert_eq!(hits, 4);
    }

    #[test]
    fn bounds_confined_to_one_strip() {
        let mut ctx = ctx_64x64();
        // Rows 0..=3 are the top 32-line strip only.
        ctx.add_region_solid(BoundsWord::new(0, 0, 0, 3), 3, 100);
        let words = generate(&mut ctx);
        let tiles = words
            .iter()
            .filter(|&&w| ipr_regions::words::is_tile_word(w))
            .count();
        assert_eq!(tiles, 1);
    }
}

mod batched {
    use super::*;

    fn obj(bounds: BoundsWord, planes: u32, addr: u32) -> ObjectRef {
        ObjectRef {
            bounds,
            addr,
            planes,
            flags: ObjectFlags::empty(),
        }
    }

    #[test]
    fn contiguous_batch_combines_before_binning() {
        let mut ctx = ctx_64x64();
        let bounds = BoundsWord::new(0, 0, 0, 3);
        ctx.add_region_objects(&[
            obj(bounds, 2, 100),
            obj(bounds, 2, 106),
            obj(bounds, 2, 112),
        ]);
        let pass = opaque_pass(&generate(&mut ctx));
        assert_eq!(pass.len(), 1);
        assert_eq!(pass[0].addr(), 100);
        assert_eq!(pass[0].planes(), 6);
    }

    #[test]
    fn differing_bounds_split_the_batch() {
        let mut ctx = ctx_64x64();
        ctx.add_region_objects(&[
            obj(BoundsWord::new(0, 0, 0, 3), 2, 100),
            obj(BoundsWord::new(0, 0, 1, 3), 2, 106),
        ]);
        let pass = opaque_pass(&generate(&mut ctx));
        assert_eq!(pass.len(), 2);
    }

    #[test]
    fn extra_planes_follow_the_isp_planes() {
        let mut ctx = ctx_64x64();
        let bounds = BoundsWord::new(0, 0, 0, 3);
        ctx.add_region_objects_extra(&[ObjectRef {
            bounds,
            addr: 100,
            planes: 4,
            flags: ObjectFlags::SMOOTH_HIGHLIGHT | ObjectFlags::VERTEX_FOG,
        }]);
        let words = generate(&mut ctx);
        // Highlight plane sits right after the 4 ISP planes (3 words each),
        // the fog plane right after that.
        let passes = marked_passes(&words);
        assert_eq!(passes.len(), 2);
        assert_eq!(passes[0][0].addr(), 100 + 4 * 3);
        assert_eq!(passes[0][0].planes(), 1);
        assert_eq!(passes[1][0].addr(), 100 + 4 * 3 + 3);
    }

    #[test]
    fn flagged_objects_are_not_combined() {
        let mut ctx = ctx_64x64();
        let bounds = BoundsWord::new(0, 0, 0, 3);
        ctx.add_region_objects_extra(&[
            ObjectRef {
                bounds,
                addr: 100,
                planes: 2,
                flags: ObjectFlags::SMOOTH_HIGHLIGHT,
            },
            // Contiguous with the highlight plane, not with object 0's ISP
            // planes, so it must stay separate.
            obj(bounds, 2, 109),
        ]);
        let pass = opaque_pass(&generate(&mut ctx));
        assert_eq!(pass.len(), 2);
    }
}

/// Begin/flush-wrapped passes in emission order, marker words excluded.
fn marked_passes(words: &[u32]) -> Vec<Vec<ObjectWord>> {
    let mut passes = Vec::new();
    let mut cur: Option<Vec<ObjectWord>> = None;
    for &raw in words {
        if ipr_regions::words::is_tile_word(raw) {
            continue;
        }
        let w = ObjectWord::from_raw(raw & !ObjectWord::LAST_BIT);
        if w.begin() {
            cur = Some(Vec::new());
        } else if w.flush() {
            if let Some(p) = cur.take() {
                passes.push(p);
            }
        } else if let Some(p) = cur.as_mut() {
            p.push(w);
        }
    }
    passes
}
