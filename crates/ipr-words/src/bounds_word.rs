//! Input word: packed tile-range bounding box.

/// Packed screen-space bounding box in tile units.
///
/// Callers pre-clip primitives and hand the binning engine one of these per
/// object (or batch): inclusive first/last tile column and first/last tile
/// row. Columns are 32-pixel tiles; rows are in units of the configured
/// minimum strip height so the encoding survives dynamic strip resizing.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct BoundsWord(u32);

impl core::default::Default for BoundsWord {
    fn default() -> Self {
        Self(0)
    }
}

impl BoundsWord {
    pub const X0_OFFSET: usize = 0;
    pub const X0_MASK: u32 = 0x7F;

    pub const X1_OFFSET: usize = 7;
    pub const X1_MASK: u32 = 0x7F;

    pub const Y0_OFFSET: usize = 14;
    pub const Y0_MASK: u32 = 0x1FF;

    pub const Y1_OFFSET: usize = 23;
    pub const Y1_MASK: u32 = 0x1FF;

    /// Pack an inclusive tile range. `x0 <= x1` and `y0 <= y1` are caller
    /// contracts, checked only in debug builds.
    #[must_use]
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        debug_assert!(x0 <= x1 && x1 <= Self::X1_MASK);
        debug_assert!(y0 <= y1 && y1 <= Self::Y1_MASK);
        Self(
            ((x0 & Self::X0_MASK) << Self::X0_OFFSET)
                | ((x1 & Self::X1_MASK) << Self::X1_OFFSET)
                | ((y0 & Self::Y0_MASK) << Self::Y0_OFFSET)
                | ((y1 & Self::Y1_MASK) << Self::Y1_OFFSET),
        )
    }

    #[must_use]
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn to_raw(self) -> u32 {
        self.0
    }

    /// First tile column (inclusive).
    #[inline(always)]
    #[must_use]
    pub fn x0(&self) -> u32 {
        (self.0 >> Self::X0_OFFSET) & Self::X0_MASK
    }

    /// Last tile column (inclusive).
    #[inline(always)]
    #[must_use]
    pub fn x1(&self) -> u32 {
        (self.0 >> Self::X1_OFFSET) & Self::X1_MASK
    }

    /// First tile row (inclusive).
    #[inline(always)]
    #[must_use]
    pub fn y0(&self) -> u32 {
        (self.0 >> Self::Y0_OFFSET) & Self::Y0_MASK
    }

    /// Last tile row (inclusive).
    #[inline(always)]
    #[must_use]
    pub fn y1(&self) -> u32 {
        (self.0 >> Self::Y1_OFFSET) & Self::Y1_MASK
    }

    /// Unpack to `(x0, y0, x1, y1)`.
    #[inline(always)]
    #[must_use]
    pub fn decode(&self) -> (u32, u32, u32, u32) {
        (self.x0(), self.y0(), self.x1(), self.y1())
    }
}

impl core::fmt::Debug for BoundsWord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BoundsWord")
            .field("x0", &self.x0())
            .field("y0", &self.y0())
            .field("x1", &self.x1())
            .field("y1", &self.y1())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_tile() {
        let b = BoundsWord::new(0, 0, 0, 0);
        assert_eq!(b.decode(), (0, 0, 0, 0));
    }

    #[test]
    fn test_field_isolation() {
        let b = BoundsWord::new(0x7F, 0, 0x7F, 0x1FF);
        assert_eq!(b.x0(), 0x7F);
        assert_eq!(b.x1(), 0x7F);
        assert_eq!(b.y0(), 0);
        assert_eq!(b.y1(), 0x1FF);
    }

    #[test]
    fn test_round_trip() {
        let b = BoundsWord::new(3, 7, 12, 20);
        let again = BoundsWord::from_raw(b.to_raw());
        assert_eq!(again.decode(), (3, 7, 12, 20));
    }
}
