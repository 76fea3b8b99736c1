//! Bit-exact word formats for the IPR tile renderer parameter stream.
//!
//! The region binning engine produces a flat stream of 32-bit words that the
//! rasterizer consumes: tile descriptor words interleaved with object-pointer
//! words. Its input bounding boxes arrive as packed tile-range words. All
//! three layouts live here as pure encode/decode types so the list and sort
//! logic elsewhere never touches raw bit positions.
//!
//! Bit 31 distinguishes the two stream word kinds: 1 = tile descriptor,
//! 0 = object pointer.

#![no_std]

pub mod bounds_word;
pub mod object_word;
pub mod tile_word;

pub use bounds_word::BoundsWord;
pub use object_word::ObjectWord;
pub use tile_word::TileWord;

/// Returns true if a raw stream word is a tile descriptor (bit 31 set).
#[inline(always)]
#[must_use]
pub fn is_tile_word(raw: u32) -> bool {
    raw & 0x8000_0000 != 0
}
