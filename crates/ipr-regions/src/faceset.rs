//! Translucent face sets and the per-tile pass ordering.
//!
//! A face set groups translucent objects within one tile that are known not
//! to overlap on screen, so the whole set renders as a single hardware pass.
//! Sets carry one representative depth; at generation time each tile's sets
//! are ordered deepest-first.
//!
//! Depth convention: NearestZ, numerically smaller means further from the
//! camera. Deepest-first therefore means ascending depth values.

use crate::arena::BlockList;
use crate::region::Region;

/// Handle into the per-frame face-set arena.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FaceSetId(pub(crate) u32);

impl FaceSetId {
    pub const NONE: FaceSetId = FaceSetId(u32::MAX);

    #[inline(always)]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// One translucent pass group within a tile.
#[derive(Clone, Debug)]
pub struct FaceSet {
    pub set_id: u32,
    /// Representative depth: the nearest (largest) sample seen so far.
    pub depth: f32,
    pub planes: u32,
    pub list: BlockList,
    /// Next set in the same polarity chain of the owning tile.
    pub next: FaceSetId,
}

/// Bump allocator for face sets, rewound each frame.
#[derive(Default)]
pub struct FaceSetArena {
    sets: Vec<FaceSet>,
}

impl FaceSetArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.sets.clear();
    }

    pub fn alloc(&mut self, set_id: u32, depth: f32) -> FaceSetId {
        let id = FaceSetId(self.sets.len() as u32);
        self.sets.push(FaceSet {
            set_id,
            depth,
            planes: 0,
            list: BlockList::new(),
            next: FaceSetId::NONE,
        });
        id
    }

    #[inline(always)]
    pub fn get(&self, id: FaceSetId) -> &FaceSet {
        &self.sets[id.0 as usize]
    }

    #[inline(always)]
    pub fn get_mut(&mut self, id: FaceSetId) -> &mut FaceSet {
        &mut self.sets[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// How a tile's face sets are ordered into passes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SortPolicy {
    /// Deepest-first by representative depth (the normal mode).
    Sorted,
    /// Keep submission order. Escape hatch for callers that already submit
    /// back-to-front; trades correctness risk for speed.
    ForwardOrder,
    /// Reverse of submission order.
    ReverseOrder,
}

/// Linear depth sampler for a translucent object: `base + dx*x + dy*y` at
/// screen pixel coordinates.
#[derive(Clone, Copy, Debug)]
pub struct DepthPlane {
    pub base: f32,
    pub dx: f32,
    pub dy: f32,
}

impl DepthPlane {
    /// Constant depth across the object.
    pub fn flat(depth: f32) -> Self {
        Self {
            base: depth,
            dx: 0.0,
            dy: 0.0,
        }
    }

    #[inline(always)]
    pub fn sample(&self, x_px: f32, y_px: f32) -> f32 {
        self.base + self.dx * x_px + self.dy * y_px
    }
}

/// Collect a tile's face sets in pass order: front-polarity chain, then
/// back-polarity chain, then the policy ordering. With `Sorted` this is a
/// stable sort ascending by depth, so deepest sets come first and equal
/// depths keep their submission order.
///
/// Call once per tile per frame, at generation time.
pub fn collect_sorted(
    region: &Region,
    arena: &FaceSetArena,
    policy: SortPolicy,
    out: &mut Vec<FaceSetId>,
) {
    out.clear();
    for polarity in 0..2 {
        let mut id = region.chain_head[polarity];
        while !id.is_none() {
            out.push(id);
            id = arena.get(id).next;
        }
    }
    match policy {
        SortPolicy::Sorted => {
            out.sort_by(|&a, &b| {
                arena
                    .get(a)
                    .depth
                    .partial_cmp(&arena.get(b).depth)
                    .unwrap_or(core::cmp::Ordering::Equal)
            });
        }
        SortPolicy::ForwardOrder => {}
        SortPolicy::ReverseOrder => out.reverse(),
    }
}
