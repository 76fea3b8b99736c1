//! Per-tile object list state.

use crate::arena::BlockList;
use crate::faceset::FaceSetId;

/// Object list categories a tile keeps separately. Opaque, light-volume and
/// shadow lists merge into the tile's first pass; the rest become their own
/// passes in the generated stream.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Category {
    Opaque = 0,
    /// Translucent objects rendered in a single dedicated pass right after
    /// the opaque pass (no depth sorting against other translucency).
    OpaqueTrans = 1,
    LightVol = 2,
    Shadow = 3,
    /// Extra smooth-highlight planes (one per flagged object).
    Highlight = 4,
    /// Extra vertex-fog planes (one per flagged object).
    Fog = 5,
}

pub const CATEGORY_COUNT: usize = 6;

impl Category {
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One category's list plus its running plane count.
#[derive(Clone, Copy, Default, Debug)]
pub struct CategoryList {
    pub list: BlockList,
    pub planes: u32,
}

/// Sentinel for "no translucent set open" per polarity.
pub const OPEN_NONE: u32 = u32::MAX;

/// One screen tile's accumulated binning state for the current frame.
#[derive(Clone, Debug)]
pub struct Region {
    pub cats: [CategoryList; CATEGORY_COUNT],
    /// Currently open translucent set id, per front/back polarity.
    pub open_set_id: [u32; 2],
    /// Face set the open set id maps to, per polarity.
    pub open_set: [FaceSetId; 2],
    /// Head/tail of the face-set chain, per polarity.
    pub chain_head: [FaceSetId; 2],
    pub chain_tail: [FaceSetId; 2],
    /// Translucent planes binned across all of this tile's face sets, for
    /// the per-tile budget.
    pub trans_planes: u32,
    /// Translucent passes accumulated (one per face set).
    pub pass_count: u32,
    /// Id of the last object inserted into this tile, for run-length merging
    /// of address-contiguous objects. Zero when none this frame.
    pub last_obj_id: u32,
    pub last_cat: u8,
    pub last_addr: u32,
    pub last_planes: u32,
}

impl Default for Region {
    fn default() -> Self {
        Self {
            cats: [CategoryList::default(); CATEGORY_COUNT],
            open_set_id: [OPEN_NONE; 2],
            open_set: [FaceSetId::NONE; 2],
            chain_head: [FaceSetId::NONE; 2],
            chain_tail: [FaceSetId::NONE; 2],
            trans_planes: 0,
            pass_count: 0,
            last_obj_id: 0,
            last_cat: 0,
            last_addr: 0,
            last_planes: 0,
        }
    }
}

impl Region {
    /// Zero all per-frame state. Called from the strip reset; list contents
    /// need no unlinking because the block arena is rewound wholesale.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when the tile has anything to emit.
    pub fn has_content(&self) -> bool {
        self.pass_count > 0 || self.cats.iter().any(|c| !c.list.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_region_is_empty() {
        let region = Region::default();
        assert!(!region.has_content());
        assert_eq!(region.open_set_id, [OPEN_NONE; 2]);
    }

    #[test]
    fn test_pass_count_is_content() {
        let mut region = Region::default();
        region.pass_count = 1;
        assert!(region.has_content());
        region.clear();
        assert!(!region.has_content());
    }
}
