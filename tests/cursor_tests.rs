//! Cursor navigation and hit-testing round trips, including across
//! bidirectional lines.

mod common;

use common::*;
use sdftext::{CharacterStyle, Point, TextSpan};

#[test]
fn s6_cursor_right_through_rtl_moves_left() {
  let mut engine = sdftext::TextEngine::new();
  let arabic = engine.load_font_from_bytes(ARABIC.to_vec(), 0).unwrap();
  let style = paragraph(arabic, 16.0);

  // Four 2-byte codepoints; logical forward is visual leftward in RTL.
  let block = engine.layout(&[span("طويل", arabic, 16.0)], &style);
  assert_eq!(block.elements.len(), 4);

  let offsets = [0usize, 2, 4, 6, 8];
  let xs: Vec<f32> = offsets
    .iter()
    .map(|&o| engine.cursor_info(&block, o, true).position.x)
    .collect();
  for pair in xs.windows(2) {
    assert!(
      pair[0] > pair[1],
      "cursor X must decrease stepping right through RTL: {:?}",
      xs
    );
  }
}

#[test]
fn round_trip_offsets_in_uniform_ltr() {
  let (mut engine, font) = engine_with_latin();
  let style = paragraph(font, 16.0);
  let block = engine.layout(&[span("hello world", font, 16.0)], &style);

  for offset in 0..=block.text.len() {
    let info = engine.cursor_info(&block, offset, true);
    let hit = engine.byte_offset_at(&block, info.position);
    assert_eq!(hit.byte_offset, offset, "offset {}", offset);
  }
}

#[test]
fn round_trip_offsets_in_mixed_bidi() {
  let mut engine = sdftext::TextEngine::new();
  let latin = engine.load_font_from_bytes(LATIN.to_vec(), 0).unwrap();
  let arabic = engine.load_font_from_bytes(ARABIC.to_vec(), 0).unwrap();
  let style = paragraph(latin, 16.0);
  let block = engine.layout(
    &[span("abc ", latin, 16.0), span("طويل", arabic, 16.0)],
    &style,
  );

  // Offset 4 (the LTR/RTL seam) is legitimately ambiguous; every other
  // character boundary must round trip exactly.
  for offset in [0usize, 1, 2, 3, 6, 8, 10, 12] {
    let info = engine.cursor_info(&block, offset, true);
    let hit = engine.byte_offset_at(&block, info.position);
    assert_eq!(hit.byte_offset, offset, "offset {}", offset);
  }
}

#[test]
fn cursor_round_trip_across_wrapped_lines() {
  let (mut engine, font) = engine_with_latin();
  let mut style = paragraph(font, 16.0);
  style.wrap_width = 100.0;
  let block = engine.layout(&[span("hello world hello", font, 16.0)], &style);
  assert!(block.lines.len() >= 2);

  for offset in 0..=block.text.len() {
    let info = engine.cursor_info(&block, offset, true);
    let hit = engine.byte_offset_at(&block, info.position);
    assert_eq!(hit.byte_offset, offset, "offset {}", offset);
  }
}

#[test]
fn soft_wrap_boundary_prefers_next_line() {
  let (mut engine, font) = engine_with_latin();
  let mut style = paragraph(font, 16.0);
  style.wrap_width = 100.0;
  let block = engine.layout(&[span("hello world hello", font, 16.0)], &style);

  let boundary = block.lines[0].byte_end;
  let info = engine.cursor_info(&block, boundary, true);
  assert_eq!(info.line_index, 1, "wrap-boundary offset starts line 2");
}

#[test]
fn cursor_heights_come_from_elements_then_line_then_paragraph() {
  let (mut engine, font) = engine_with_latin();
  let style = paragraph(font, 16.0);
  let block = engine.layout(
    &[
      span("ab ", font, 16.0),
      TextSpan::new("CD", CharacterStyle::sized(Some(font), 32.0)),
    ],
    &style,
  );

  let small = engine.cursor_info(&block, 0, true);
  let large = engine.cursor_info(&block, 3, true);
  assert!(large.ascent > small.ascent);
  assert!(large.height > small.height);
  assert!(small.height >= 1.0);
}

#[test]
fn selection_rects_split_under_bidi() {
  let mut engine = sdftext::TextEngine::new();
  let latin = engine.load_font_from_bytes(LATIN.to_vec(), 0).unwrap();
  let arabic = engine.load_font_from_bytes(ARABIC.to_vec(), 0).unwrap();
  let style = paragraph(latin, 16.0);
  let block = engine.layout(
    &[span("abc ", latin, 16.0), span("طويل", arabic, 16.0)],
    &style,
  );

  // A logical range crossing the direction seam covers two visual spans.
  let rects = engine.range_bounds(&block, 0, 6);
  assert_eq!(rects.len(), 2, "rects: {:?}", rects);
  assert!(rects[0].x < rects[1].x, "left-to-right order");

  // The whole Arabic word is visually contiguous.
  let rects = engine.range_bounds(&block, 4, 12);
  assert_eq!(rects.len(), 1);
  assert!(rects[0].width > 0.0);
}

#[test]
fn selection_rects_span_multiple_lines() {
  let (mut engine, font) = engine_with_latin();
  let style = paragraph(font, 16.0);
  let block = engine.layout(&[span("ab\ncd", font, 16.0)], &style);

  let rects = engine.range_bounds(&block, 1, 4);
  assert_eq!(rects.len(), 2);
  assert!(rects[1].y > rects[0].y);
}

#[test]
fn nearest_line_is_used_for_out_of_bounds_y() {
  let (mut engine, font) = engine_with_latin();
  let style = paragraph(font, 16.0);
  let block = engine.layout(&[span("ab\ncd", font, 16.0)], &style);

  let above = engine.byte_offset_at(&block, Point::new(0.0, -100.0));
  assert!(above.byte_offset <= block.lines[0].byte_end);

  let below = engine.byte_offset_at(&block, Point::new(0.0, 10_000.0));
  assert!(below.byte_offset >= block.lines[1].byte_start);
}

#[test]
fn clamped_offsets_resolve_to_last_line_end() {
  let (mut engine, font) = engine_with_latin();
  let style = paragraph(font, 16.0);
  let block = engine.layout(&[span("abc", font, 16.0)], &style);

  let info = engine.cursor_info(&block, 9_999, true);
  assert_eq!(info.byte_offset, 3);
  assert_eq!(info.line_index, 0);
  assert!(info.at_line_end);
}
