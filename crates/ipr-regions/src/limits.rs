//! Hardware plane-budget constants for the IPR tile pipeline.
//!
//! Every tile owns a fixed on-chip parameter store of [`REGION_PLANE_LIM`]
//! planes. The binning engine keeps each tile's object lists inside that
//! budget minus a safety margin reserved for pass markers and padding; the
//! stream generator trims anything that still spills over.

/// Tile width in pixels (doubled for double-wide strips).
pub const TILE_WIDTH_PX: u32 = 32;

/// On-chip plane store per tile.
pub const REGION_PLANE_LIM: u32 = 1024;

/// Reserve for begin/flush markers, minimum-plane padding and the
/// vignette-fix padding.
pub const SAFETY_MARGIN: u32 = 64;

/// Usable per-tile plane budget for object contents.
pub const PLANE_BUDGET: u32 = REGION_PLANE_LIM - SAFETY_MARGIN;

/// The pipeline stalls on passes shorter than this; shorter passes are
/// padded with dummy objects.
pub const REGION_PLANE_MIN: u32 = 4;

/// Internal plane-cache line. A translucent pass straddling this position
/// renders with a visible vignetting artifact; the generator pads the
/// opaque pass past it when enabled.
pub const CACHE_HALF_BOUNDARY: u32 = 0x200;

/// Words per ISP plane in the plane-data buffer. Two objects are
/// address-contiguous when the second starts `planes * PLANE_WORDS` words
/// after the first.
pub const PLANE_WORDS: u32 = 3;

/// Planes carried by the small padding dummy object.
pub const DUMMY_PLANES: u32 = 1;

/// Planes carried by the large dummy object used for vignette-fix padding.
pub const LARGE_DUMMY_PLANES: u32 = 32;
