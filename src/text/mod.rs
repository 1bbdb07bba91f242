//! Text layout pipeline
//!
//! Everything between styled spans and a positioned `TextBlock`:
//!
//! - [`bidi`]: embedding levels, visual runs, per-line permutation maps
//! - [`segment`]: break-opportunity segmentation
//! - [`shape`]: per-run shaping with per-cluster font fallback
//! - [`pipeline`]: the layout driver (accumulation, wrapping, lines)
//! - [`block`]: the output data model
//! - [`cursor`]: byte offset ↔ visual position queries

pub mod bidi;
pub mod block;
pub mod cursor;
pub mod pipeline;
pub mod segment;
pub mod shape;

pub use bidi::{Direction, LineBidiMaps};
pub use block::{
  CursorInfo, HitResult, Line, PositionedElement, PositionedGlyph, PositionedImage, TextBlock,
  VisualRun,
};
