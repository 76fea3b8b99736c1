//! Stream word: tile descriptor.

/// Tile descriptor word.
///
/// Announces the tile that the object pointers following it belong to.
/// Bit 31 is always set to distinguish it from object-pointer words.
/// X position is in tile units (tiles are 32 pixels wide), Y position and
/// size are in scanlines because strip heights vary at runtime. The guard
/// strip past the bottom of the screen emits the sentinel encoding with
/// `y_size == 0`.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct TileWord(u32);

impl core::default::Default for TileWord {
    fn default() -> Self {
        Self(Self::TAG_BIT)
    }
}

impl TileWord {
    /// Bit 31: identifies a tile descriptor in the stream.
    pub const TAG_BIT: u32 = 0x8000_0000;

    pub const X_POS_OFFSET: usize = 0;
    pub const X_POS_WIDTH: usize = 7;
    pub const X_POS_MASK: u32 = 0x7F;

    pub const X_DOUBLE_OFFSET: usize = 7;
    pub const X_DOUBLE_MASK: u32 = 0x1;

    pub const Y_POS_OFFSET: usize = 8;
    pub const Y_POS_WIDTH: usize = 11;
    pub const Y_POS_MASK: u32 = 0x7FF;

    pub const Y_SIZE_OFFSET: usize = 19;
    pub const Y_SIZE_WIDTH: usize = 11;
    pub const Y_SIZE_MASK: u32 = 0x7FF;

    /// Construct a descriptor for an in-bounds tile.
    #[must_use]
    pub fn new(x_pos: u32, x_double: bool, y_pos: u32, y_size: u32) -> Self {
        debug_assert!(x_pos <= Self::X_POS_MASK);
        debug_assert!(y_pos <= Self::Y_POS_MASK);
        debug_assert!(y_size <= Self::Y_SIZE_MASK);
        Self(
            Self::TAG_BIT
                | ((x_pos & Self::X_POS_MASK) << Self::X_POS_OFFSET)
                | ((x_double as u32) << Self::X_DOUBLE_OFFSET)
                | ((y_pos & Self::Y_POS_MASK) << Self::Y_POS_OFFSET)
                | ((y_size & Self::Y_SIZE_MASK) << Self::Y_SIZE_OFFSET),
        )
    }

    /// Sentinel descriptor emitted for the guard strip past the screen bottom.
    #[must_use]
    pub fn sentinel() -> Self {
        Self(Self::TAG_BIT)
    }

    #[must_use]
    pub fn from_raw(raw: u32) -> Self {
        debug_assert!(raw & Self::TAG_BIT != 0);
        Self(raw)
    }

    #[must_use]
    pub fn to_raw(self) -> u32 {
        self.0
    }

    /// X position in tile units.
    #[inline(always)]
    #[must_use]
    pub fn x_pos(&self) -> u32 {
        (self.0 >> Self::X_POS_OFFSET) & Self::X_POS_MASK
    }

    /// Double-wide tile flag (tile covers 64 pixels instead of 32).
    #[inline(always)]
    #[must_use]
    pub fn x_double(&self) -> bool {
        (self.0 >> Self::X_DOUBLE_OFFSET) & Self::X_DOUBLE_MASK != 0
    }

    /// Y position of the tile's first scanline.
    #[inline(always)]
    #[must_use]
    pub fn y_pos(&self) -> u32 {
        (self.0 >> Self::Y_POS_OFFSET) & Self::Y_POS_MASK
    }

    /// Tile height in scanlines. Zero marks the guard-strip sentinel.
    #[inline(always)]
    #[must_use]
    pub fn y_size(&self) -> u32 {
        (self.0 >> Self::Y_SIZE_OFFSET) & Self::Y_SIZE_MASK
    }

    /// True for the guard-strip sentinel encoding.
    #[inline(always)]
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.y_size() == 0
    }
}

impl core::fmt::Debug for TileWord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TileWord")
            .field("x_pos", &self.x_pos())
            .field("x_double", &self.x_double())
            .field("y_pos", &self.y_pos())
            .field("y_size", &self.y_size())
            .finish()
    }
}
