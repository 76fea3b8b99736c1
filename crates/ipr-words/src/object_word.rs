//! Stream word: object pointer.

/// Object-pointer word.
///
/// References a run of ISP planes in the separate plane-data buffer:
/// `addr` is a word address into that buffer, `planes` the number of
/// half-space planes the rasterizer loads from it (1..=511).
///
/// Three marker bits steer the per-tile pipeline:
/// - `begin` opens a translucent pass (the referenced object is the
///   begin-translucency dummy plane),
/// - `flush` closes a pass (flushing dummy plane),
/// - `last` is carried by exactly the final word of a non-empty stream.
///
/// Bit 31 is always clear; a set bit 31 is a tile descriptor instead.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct ObjectWord(u32);

impl core::default::Default for ObjectWord {
    fn default() -> Self {
        Self(0)
    }
}

impl ObjectWord {
    pub const ADDR_OFFSET: usize = 0;
    pub const ADDR_WIDTH: usize = 19;
    pub const ADDR_MASK: u32 = 0x7_FFFF;

    pub const PLANES_OFFSET: usize = 19;
    pub const PLANES_WIDTH: usize = 9;
    pub const PLANES_MASK: u32 = 0x1FF;

    pub const FLUSH_BIT: u32 = 1 << 28;
    pub const BEGIN_BIT: u32 = 1 << 29;
    pub const LAST_BIT: u32 = 1 << 30;

    /// Largest plane count one object-pointer word can carry.
    pub const MAX_PLANES: u32 = Self::PLANES_MASK;

    /// Construct a plain object pointer (no marker bits).
    #[must_use]
    pub fn new(addr: u32, planes: u32) -> Self {
        debug_assert!(addr <= Self::ADDR_MASK);
        debug_assert!(planes >= 1 && planes <= Self::MAX_PLANES);
        Self(
            ((addr & Self::ADDR_MASK) << Self::ADDR_OFFSET)
                | ((planes & Self::PLANES_MASK) << Self::PLANES_OFFSET),
        )
    }

    #[must_use]
    pub fn from_raw(raw: u32) -> Self {
        debug_assert!(raw & 0x8000_0000 == 0);
        Self(raw)
    }

    #[must_use]
    pub fn to_raw(self) -> u32 {
        self.0
    }

    /// Word address into the ISP plane-data buffer.
    #[inline(always)]
    #[must_use]
    pub fn addr(&self) -> u32 {
        (self.0 >> Self::ADDR_OFFSET) & Self::ADDR_MASK
    }

    /// Number of planes the rasterizer loads for this object.
    #[inline(always)]
    #[must_use]
    pub fn planes(&self) -> u32 {
        (self.0 >> Self::PLANES_OFFSET) & Self::PLANES_MASK
    }

    /// Replace the plane count, keeping address and marker bits.
    #[inline(always)]
    pub fn set_planes(&mut self, planes: u32) {
        debug_assert!(planes >= 1 && planes <= Self::MAX_PLANES);
        self.0 = (self.0 & !(Self::PLANES_MASK << Self::PLANES_OFFSET))
            | ((planes & Self::PLANES_MASK) << Self::PLANES_OFFSET);
    }

    #[inline(always)]
    #[must_use]
    pub fn flush(&self) -> bool {
        self.0 & Self::FLUSH_BIT != 0
    }

    #[inline(always)]
    #[must_use]
    pub fn begin(&self) -> bool {
        self.0 & Self::BEGIN_BIT != 0
    }

    #[inline(always)]
    #[must_use]
    pub fn last(&self) -> bool {
        self.0 & Self::LAST_BIT != 0
    }

    /// Mark as a pass-flush object.
    #[must_use]
    pub fn with_flush(self) -> Self {
        Self(self.0 | Self::FLUSH_BIT)
    }

    /// Mark as a pass-begin object.
    #[must_use]
    pub fn with_begin(self) -> Self {
        Self(self.0 | Self::BEGIN_BIT)
    }

    /// Mark as the very last pointer of the stream.
    #[must_use]
    pub fn with_last(self) -> Self {
        Self(self.0 | Self::LAST_BIT)
    }
}

impl core::fmt::Debug for ObjectWord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObjectWord")
            .field("addr", &self.addr())
            .field("planes", &self.planes())
            .field("flush", &self.flush())
            .field("begin", &self.begin())
            .field("last", &self.last())
            .finish()
    }
}
