//! # sdftext
//!
//! A styled text layout and rendering core for interactive applications:
//! given styled spans and a paragraph style, it produces a fully
//! positioned, line-broken, bidirectionally ordered [`TextBlock`] suitable
//! for GPU rendering, cursor navigation, and hit testing.
//!
//! The engine owns a font registry with per-font fallback chains and an
//! LRU glyph cache backed by shelf-packed SDF atlas pages. Shaping uses
//! rustybuzz, bidi resolution unicode-bidi, and break opportunities
//! unicode-segmentation; rasterization fills ttf-parser outlines with
//! tiny-skia and post-processes them into signed distance fields.
//!
//! ```no_run
//! use sdftext::{CharacterStyle, ParagraphStyle, TextEngine, TextSpan};
//!
//! let mut engine = TextEngine::new();
//! let font = engine.load_font("fonts/NotoSans-Regular.ttf", 0)?;
//!
//! let paragraph = ParagraphStyle {
//!   wrap_width: 480.0,
//!   default_style: CharacterStyle::sized(Some(font), 16.0),
//!   ..Default::default()
//! };
//! let block = engine.layout(
//!   &[TextSpan::new("Hello, world!", CharacterStyle::sized(Some(font), 16.0))],
//!   &paragraph,
//! );
//!
//! let draw_list = engine.build_batches(&block);
//! let cursor = engine.cursor_info(&block, 5, true);
//! # let _ = (draw_list, cursor);
//! # Ok::<(), sdftext::Error>(())
//! ```
//!
//! Layout never fails: invalid fonts, unmappable codepoints, and oversized
//! glyphs degrade to documented sentinels with a logged warning. The
//! fallible surface is font loading and nothing else.
//!
//! Engines are single-threaded values; a `TextBlock` is a plain value the
//! caller owns and may copy freely.

pub mod atlas;
pub mod cache;
pub mod draw;
pub mod engine;
pub mod error;
pub mod font;
pub mod geometry;
pub mod raster;
pub mod style;
pub mod text;

pub use atlas::{NullTextureBackend, TextureBackend, TextureId};
pub use cache::{CachedGlyph, GlyphKey, GlyphRenderInfo};
pub use draw::{BatchState, DrawBatch, DrawList, GlyphQuad, ImageQuad};
pub use engine::TextEngine;
pub use error::{Error, FontError, Result};
pub use font::{FontId, FontProperties, ScaledFontMetrics};
pub use geometry::{Point, Rect, Size};
pub use style::{
  BaseDirection, CharacterStyle, Color, FillStyle, GlowEffect, GradientStop, HorizontalAlignment,
  ImageVAlign, InlineImage, InnerEffect, LineBreakStrategy, LineHeight, OutlineEffect,
  ParagraphStyle, ShadowEffect, TabAlignment, TabStop, TextSpan,
};
pub use text::{
  CursorInfo, Direction, HitResult, Line, LineBidiMaps, PositionedElement, PositionedGlyph,
  PositionedImage, TextBlock, VisualRun,
};
