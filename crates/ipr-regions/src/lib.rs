//! Region binning and object-pointer stream generation for the IPR tile
//! renderer.
//!
//! The rasterizer renders the screen one tile at a time from a flat
//! parameter stream. This crate builds that stream: callers bin each
//! primitive into every tile its bounding box touches
//! ([`RegionContext::add_region_solid`] and friends), then flatten the
//! accumulated per-tile lists into the hardware word format
//! ([`RegionContext::generate_object_ptrs`]). Translucent objects are
//! grouped into non-overlapping face sets and ordered deepest-first per
//! tile before emission.
//!
//! Typical frame:
//!
//! ```
//! use ipr_regions::{BoundsWord, ParamBuffer, RegionConfig, RegionContext};
//!
//! let mut ctx = RegionContext::new(RegionConfig::default());
//! ctx.reset_frame(false);
//! ctx.add_region_solid(BoundsWord::new(0, 0, 1, 3), 5, 100);
//! let mut out = ParamBuffer::new(64 * 1024);
//! let stats = ctx.generate_object_ptrs(ctx.screen_bounds(), false, &mut out);
//! assert!(!stats.truncated);
//! ```
//!
//! Capacity overload is lossy by design: objects over a tile's plane budget
//! are dropped from that tile and a full destination buffer truncates the
//! stream, both reported through [`FrameStats`] rather than errors.

pub mod arena;
pub mod context;
pub mod faceset;
pub mod generate;
pub mod insert;
pub mod limits;
pub mod region;
pub mod strips;

pub use context::{DummyObjects, Polarity, RegionConfig, RegionContext};
pub use faceset::{DepthPlane, SortPolicy};
pub use generate::{FrameStats, ParamBuffer, StripExtent};
pub use insert::{ObjectFlags, ObjectRef};
pub use strips::TilingPolicy;

pub use ipr_words::{BoundsWord, ObjectWord, TileWord};

/// Re-export of the word-format crate for consumers that decode streams.
pub use ipr_words as words;
