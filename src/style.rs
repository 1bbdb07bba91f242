//! Character and paragraph styling
//!
//! Value types describing how spans of text look (fill, effects, font
//! selection) and how paragraphs lay out (alignment, line height, wrapping,
//! base direction). These are plain copyable records; the layout pipeline
//! snapshots them into positioned elements so a `TextBlock` stays valid when
//! the caller mutates its styles afterwards.

use crate::font::FontId;
use crate::geometry::Point;

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

impl Color {
  pub const BLACK: Self = Self::rgb(0, 0, 0);
  pub const WHITE: Self = Self::rgb(255, 255, 255);
  pub const TRANSPARENT: Self = Self {
    r: 0,
    g: 0,
    b: 0,
    a: 0,
  };

  pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
    Self { r, g, b, a: 255 }
  }

  pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
    Self { r, g, b, a }
  }
}

impl Default for Color {
  fn default() -> Self {
    Color::BLACK
  }
}

/// A stop in a linear gradient, `position` in `[0, 1]` along the axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
  pub color: Color,
  pub position: f32,
}

/// How glyph bodies are filled.
///
/// Gradient geometry is expressed in unit space over the glyph run; the
/// renderer maps it to device space.
#[derive(Debug, Clone, PartialEq)]
pub enum FillStyle {
  Solid(Color),
  LinearGradient {
    start: Point,
    end: Point,
    stops: Vec<GradientStop>,
  },
}

impl Default for FillStyle {
  fn default() -> Self {
    FillStyle::Solid(Color::BLACK)
  }
}

/// SDF outline effect parameters. `width` is in SDF distance units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineEffect {
  pub enabled: bool,
  pub color: Color,
  pub width: f32,
}

impl Default for OutlineEffect {
  fn default() -> Self {
    Self {
      enabled: false,
      color: Color::BLACK,
      width: 0.05,
    }
  }
}

/// SDF glow effect parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowEffect {
  pub enabled: bool,
  pub color: Color,
  pub range: f32,
  pub intensity: f32,
}

impl Default for GlowEffect {
  fn default() -> Self {
    Self {
      enabled: false,
      color: Color::BLACK,
      range: 0.15,
      intensity: 0.7,
    }
  }
}

/// Drop-shadow effect parameters. `offset` is in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowEffect {
  pub enabled: bool,
  pub color: Color,
  pub offset: Point,
  pub spread: f32,
}

impl Default for ShadowEffect {
  fn default() -> Self {
    Self {
      enabled: false,
      color: Color::BLACK,
      offset: Point::new(2.0, 2.0),
      spread: 0.1,
    }
  }
}

/// Inner shadow / inner glow effect parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InnerEffect {
  pub enabled: bool,
  pub color: Color,
  pub range: f32,
  pub is_shadow: bool,
}

impl Default for InnerEffect {
  fn default() -> Self {
    Self {
      enabled: false,
      color: Color::BLACK,
      range: 0.05,
      is_shadow: true,
    }
  }
}

/// Vertical alignment of an inline image against its line.
///
/// `LineTop` and `LineBottom` cannot be resolved until the line box height
/// is known; they are laid out as `Baseline` at emission time and fixed up
/// during line finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageVAlign {
  #[default]
  Baseline,
  MiddleOfText,
  TextTop,
  TextBottom,
  LineTop,
  LineBottom,
}

/// An inline image carried by a span.
///
/// `texture` is an opaque host-owned handle; the engine never dereferences
/// it, only threads it through to draw batches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InlineImage {
  pub texture: u64,
  pub width: f32,
  pub height: f32,
  pub valign: ImageVAlign,
}

/// Character-level style applied to a span of source text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CharacterStyle {
  /// Font to use; `None` falls through to the paragraph default, then the
  /// engine default.
  pub font: Option<FontId>,
  /// Font size in pixels. Values <= 0 fall back to the paragraph default.
  pub font_size: f32,
  pub fill: FillStyle,
  pub bold: bool,
  pub italic: bool,
  /// ISO 15924 script tag (e.g. "Arab"). Empty enables shaper detection.
  pub script: String,
  /// BCP 47 language tag (e.g. "ar"). Empty means unspecified.
  pub language: String,
  pub outline: OutlineEffect,
  pub glow: GlowEffect,
  pub shadow: ShadowEffect,
  pub inner: InnerEffect,
  /// When set, the span lays out as an inline image; empty span text is
  /// replaced with U+FFFC during normalization.
  pub image: Option<InlineImage>,
}

impl CharacterStyle {
  pub fn sized(font: Option<FontId>, font_size: f32) -> Self {
    Self {
      font,
      font_size,
      ..Default::default()
    }
  }
}

/// A maximal run of source text sharing one character style.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextSpan {
  pub text: String,
  pub style: CharacterStyle,
}

impl TextSpan {
  pub fn new(text: impl Into<String>, style: CharacterStyle) -> Self {
    Self {
      text: text.into(),
      style,
    }
  }
}

/// Horizontal alignment of lines inside the wrap width.
///
/// `Justify` is accepted but laid out as `Left`; proper justification is
/// future work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizontalAlignment {
  #[default]
  Left,
  Center,
  Right,
  Justify,
}

/// Line-box height policy.
///
/// Every policy result is clamped so a line never clips its own content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineHeight {
  /// Factor over the default font's recommended line height.
  MetricsScaled(f32),
  /// Factor over the paragraph's default font size.
  FontSizeScaled(f32),
  /// Absolute height in pixels.
  Absolute(f32),
  /// Factor over the line's own content extent (ascent + descent).
  ContentScaled(f32),
}

impl Default for LineHeight {
  fn default() -> Self {
    LineHeight::MetricsScaled(1.2)
  }
}

/// Base paragraph direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseDirection {
  /// Detect from the first strong character, preferring LTR.
  #[default]
  Auto,
  Ltr,
  Rtl,
}

/// Granularity of break opportunities for line wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineBreakStrategy {
  /// Break anywhere width demands it (grapheme granularity).
  ByWidth,
  /// Break at UAX-29 word boundaries.
  #[default]
  WordBoundary,
  /// Break at grapheme cluster boundaries.
  GraphemeBoundary,
}

/// Alignment of text at a tab stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TabAlignment {
  #[default]
  Left,
  Right,
  Center,
  Decimal,
}

/// A custom tab stop at an absolute position from the line start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabStop {
  pub position: f32,
  pub alignment: TabAlignment,
}

/// Paragraph-level layout style.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphStyle {
  pub alignment: HorizontalAlignment,
  pub line_height: LineHeight,
  /// Extra indent applied to the first line of the paragraph.
  pub first_line_indent: f32,
  /// Maximum line-content width; 0 disables wrapping.
  pub wrap_width: f32,
  pub base_direction: BaseDirection,
  pub line_break: LineBreakStrategy,
  /// Custom tab stops, carried for the host; tabs lay out as whitespace.
  pub tab_stops: Vec<TabStop>,
  /// Default tab interval as a factor of the default font size.
  pub default_tab_width_factor: f32,
  /// Style used where spans do not specify one, and for empty paragraphs.
  pub default_style: CharacterStyle,
}

impl Default for ParagraphStyle {
  fn default() -> Self {
    Self {
      alignment: HorizontalAlignment::Left,
      line_height: LineHeight::default(),
      first_line_indent: 0.0,
      wrap_width: 0.0,
      base_direction: BaseDirection::Auto,
      line_break: LineBreakStrategy::WordBoundary,
      tab_stops: Vec::new(),
      default_tab_width_factor: 4.0,
      default_style: CharacterStyle {
        font_size: 16.0,
        ..Default::default()
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fill_style_equality_covers_gradient_stops() {
    let a = FillStyle::LinearGradient {
      start: Point::ZERO,
      end: Point::new(0.0, 1.0),
      stops: vec![GradientStop {
        color: Color::BLACK,
        position: 0.0,
      }],
    };
    let mut b = a.clone();
    assert_eq!(a, b);
    if let FillStyle::LinearGradient { stops, .. } = &mut b {
      stops[0].position = 0.5;
    }
    assert_ne!(a, b);
  }

  #[test]
  fn paragraph_defaults_match_engine_conventions() {
    let p = ParagraphStyle::default();
    assert_eq!(p.wrap_width, 0.0);
    assert_eq!(p.default_style.font_size, 16.0);
    assert_eq!(p.line_height, LineHeight::MetricsScaled(1.2));
  }
}
