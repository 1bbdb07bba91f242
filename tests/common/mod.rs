//! Shared fixtures for the integration tests.
//!
//! The fonts are generated box-glyph subsets (see tools/gen_test_fonts.py):
//! `latin` covers printable ASCII, `arabic` a handful of Arabic letters,
//! `cjk` a few ideographs plus U+3000. Narrow coverage is the point: it
//! exercises the fallback ladder.

#![allow(dead_code)]

use sdftext::{CharacterStyle, FontId, ParagraphStyle, TextEngine, TextSpan};

pub const LATIN: &[u8] = include_bytes!("../fixtures/fonts/latin.ttf");
pub const ARABIC: &[u8] = include_bytes!("../fixtures/fonts/arabic.ttf");
pub const CJK: &[u8] = include_bytes!("../fixtures/fonts/cjk.ttf");

pub fn engine_with_latin() -> (TextEngine, FontId) {
  let mut engine = TextEngine::new();
  let font = engine
    .load_font_from_bytes(LATIN.to_vec(), 0)
    .expect("latin fixture loads");
  (engine, font)
}

pub fn paragraph(font: FontId, size: f32) -> ParagraphStyle {
  ParagraphStyle {
    default_style: CharacterStyle::sized(Some(font), size),
    ..Default::default()
  }
}

pub fn span(text: &str, font: FontId, size: f32) -> TextSpan {
  TextSpan::new(text, CharacterStyle::sized(Some(font), size))
}

/// Advance of one box glyph at `size` px in the latin fixture (600/1000 em,
/// space 500/1000).
pub fn letter_advance(size: f32) -> f32 {
  size * 0.6
}

pub fn space_advance(size: f32) -> f32 {
  size * 0.5
}
