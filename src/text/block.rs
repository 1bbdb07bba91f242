//! Layout results
//!
//! The output side of the pipeline: positioned elements (glyphs and inline
//! images in one ordered array), line records with their visual runs and
//! bidi maps, and the `TextBlock` that owns them all.
//!
//! A `TextBlock` is a value: the caller owns it, copies it freely, and the
//! engine retains no reference. Glyph render info points at atlas textures
//! by opaque handle, which stay valid until the glyph cache is cleared.

use crate::cache::GlyphRenderInfo;
use crate::font::FontId;
use crate::geometry::{Point, Rect};
use crate::style::{CharacterStyle, InlineImage, ParagraphStyle, TextSpan};
use crate::text::bidi::{Direction, LineBidiMaps};

/// A glyph placed on a line. Pen position is relative to the line box with
/// the baseline at y = 0; alignment and indent are already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedGlyph {
  pub glyph_id: u32,
  /// The font that actually produced the glyph (post-fallback).
  pub font: FontId,
  pub font_size: f32,
  pub position: Point,
  pub x_advance: f32,
  pub y_advance: f32,
  /// Shaping offsets, already folded into `position`; kept for edge math.
  pub x_offset: f32,
  pub y_offset: f32,
  pub render: GlyphRenderInfo,
  /// Index of the source span this glyph came from.
  pub span_index: usize,
  /// Byte offset of the cluster within that span's text.
  pub byte_offset: usize,
  /// Byte length of the cluster within that span's text.
  pub byte_len: usize,
  pub style: CharacterStyle,
  /// Ink ascent at `font_size` (above baseline, positive).
  pub ascent: f32,
  /// Ink descent at `font_size` (below baseline, positive).
  pub descent: f32,
  /// Left edge of the ink box relative to the pen position.
  pub visual_left: f32,
  /// Right edge of the ink box relative to the pen position.
  pub visual_right: f32,
  /// Direction of the visual run that shaped this glyph.
  pub direction: Direction,
}

/// An inline image placed on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedImage {
  /// Top-left of the image relative to the line box, baseline at y = 0.
  pub position: Point,
  pub width: f32,
  pub height: f32,
  pub x_advance: f32,
  pub image: InlineImage,
  pub span_index: usize,
  pub byte_offset: usize,
  pub byte_len: usize,
  pub ascent: f32,
  pub descent: f32,
}

/// A positioned element: glyphs and images share the element array because
/// accumulation, alignment, and hit testing treat them uniformly.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionedElement {
  Glyph(PositionedGlyph),
  Image(PositionedImage),
}

impl PositionedElement {
  pub fn position(&self) -> Point {
    match self {
      PositionedElement::Glyph(g) => g.position,
      PositionedElement::Image(i) => i.position,
    }
  }

  pub fn x_advance(&self) -> f32 {
    match self {
      PositionedElement::Glyph(g) => g.x_advance,
      PositionedElement::Image(i) => i.x_advance,
    }
  }

  pub fn ascent(&self) -> f32 {
    match self {
      PositionedElement::Glyph(g) => g.ascent,
      PositionedElement::Image(i) => i.ascent,
    }
  }

  pub fn descent(&self) -> f32 {
    match self {
      PositionedElement::Glyph(g) => g.descent,
      PositionedElement::Image(i) => i.descent,
    }
  }

  pub fn span_index(&self) -> usize {
    match self {
      PositionedElement::Glyph(g) => g.span_index,
      PositionedElement::Image(i) => i.span_index,
    }
  }

  pub fn byte_offset(&self) -> usize {
    match self {
      PositionedElement::Glyph(g) => g.byte_offset,
      PositionedElement::Image(i) => i.byte_offset,
    }
  }

  pub fn byte_len(&self) -> usize {
    match self {
      PositionedElement::Glyph(g) => g.byte_len,
      PositionedElement::Image(i) => i.byte_len,
    }
  }

  /// Direction hint; images are direction-neutral.
  pub fn direction(&self) -> Option<Direction> {
    match self {
      PositionedElement::Glyph(g) => Some(g.direction),
      PositionedElement::Image(_) => None,
    }
  }

  pub fn is_image(&self) -> bool {
    matches!(self, PositionedElement::Image(_))
  }

  pub(crate) fn shift_x(&mut self, dx: f32) {
    match self {
      PositionedElement::Glyph(g) => g.position.x += dx,
      PositionedElement::Image(i) => i.position.x += dx,
    }
  }
}

/// A contiguous span of a line's elements sharing direction, font, size,
/// script, and language.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualRun {
  /// First element index, local to the line.
  pub start: usize,
  pub len: usize,
  /// `None` for image runs.
  pub direction: Option<Direction>,
  pub font: Option<FontId>,
  pub font_size: f32,
  pub script: String,
  pub language: String,
  /// Sum of element advances in the run.
  pub advance: f32,
}

/// One laid-out line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Line {
  /// Index of the line's first element in the block's element array.
  pub first_element: usize,
  pub element_count: usize,
  /// Top of the line box in block coordinates.
  pub box_y: f32,
  /// Baseline position within the box (distance from box top).
  pub baseline: f32,
  /// Sum of element advances, without indent or alignment shift.
  pub width: f32,
  pub box_height: f32,
  /// Tallest content ascent on the line.
  pub max_ascent: f32,
  /// Deepest content descent on the line.
  pub max_descent: f32,
  /// Byte range of this line in the block's concatenated text. The end of
  /// a hard-broken line includes its newline byte(s).
  pub byte_start: usize,
  pub byte_end: usize,
  pub visual_runs: Vec<VisualRun>,
  /// Visual↔logical maps over this line's UTF-16 code units.
  pub bidi: LineBidiMaps,
}

impl Line {
  pub fn baseline_y(&self) -> f32 {
    self.box_y + self.baseline
  }

  pub fn element_range(&self) -> std::ops::Range<usize> {
    self.first_element..self.first_element + self.element_count
  }

  pub fn contains_byte(&self, offset: usize) -> bool {
    offset >= self.byte_start && offset < self.byte_end
  }
}

/// A fully laid-out paragraph of styled text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextBlock {
  /// All positioned elements, line by line, visual order within each line.
  pub elements: Vec<PositionedElement>,
  pub lines: Vec<Line>,
  /// Bounding rectangle of the laid-out content.
  pub bounds: Rect,
  /// The paragraph style the layout used.
  pub paragraph: ParagraphStyle,
  /// Concatenated UTF-8 source text (with U+FFFC image placeholders).
  pub text: String,
  /// Copies of the input spans, for provenance resolution.
  pub spans: Vec<TextSpan>,
  /// Byte offset of each span's text within `text`.
  pub span_starts: Vec<usize>,
}

impl TextBlock {
  /// Absolute byte offset of an element's cluster in the concatenated
  /// text.
  pub fn element_byte_start(&self, element: &PositionedElement) -> usize {
    let span_start = self
      .span_starts
      .get(element.span_index())
      .copied()
      .unwrap_or(0);
    span_start + element.byte_offset()
  }

  /// Whether a line starts a paragraph (first line, or preceded by a hard
  /// newline), which is when the first-line indent applies.
  pub fn line_starts_paragraph(&self, line: &Line) -> bool {
    line.byte_start == 0
      || self
        .text
        .as_bytes()
        .get(line.byte_start.wrapping_sub(1))
        .is_some_and(|b| *b == b'\n')
  }

  pub fn line_elements(&self, line: &Line) -> &[PositionedElement] {
    &self.elements[line.element_range()]
  }
}

/// Cursor geometry resolved from a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CursorInfo {
  /// Visual position of the cursor: x at the chosen edge, y at the
  /// baseline, block coordinates.
  pub position: Point,
  pub ascent: f32,
  pub descent: f32,
  pub height: f32,
  /// The (clamped) byte offset the cursor represents.
  pub byte_offset: usize,
  pub line_index: usize,
  /// The offset sits at the logical end of its line.
  pub at_line_end: bool,
  /// The cursor was resolved to a trailing edge.
  pub trailing_edge: bool,
}

/// Result of a visual-position hit test.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HitResult {
  pub byte_offset: usize,
  /// The hit landed on the trailing half of its element.
  pub trailing_edge: bool,
  /// Horizontal distance from the query point to the chosen edge.
  pub distance: f32,
}
