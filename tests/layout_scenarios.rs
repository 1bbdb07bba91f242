//! Boundary scenarios for the layout pipeline: wrapping, hard breaks,
//! mixed-direction lines, inline images, and font fallback.

mod common;

use common::*;
use sdftext::{
  CharacterStyle, Direction, ImageVAlign, InlineImage, PositionedElement, TextSpan,
};

#[test]
fn s1_ltr_simple_wrap() {
  let (mut engine, font) = engine_with_latin();
  let mut style = paragraph(font, 16.0);
  style.wrap_width = 100.0;

  let block = engine.layout(&[span("hello world hello", font, 16.0)], &style);

  assert!(block.lines.len() >= 2, "expected a wrap, got 1 line");
  // The first line breaks after a word + the space that follows it.
  let first_text = &block.text[block.lines[0].byte_start..block.lines[0].byte_end];
  assert!(
    first_text.ends_with(' '),
    "line 1 should end at a space, got {:?}",
    first_text
  );
  // No element's right edge exceeds the wrap width.
  for line in &block.lines {
    for element in block.line_elements(line) {
      let right = element.position().x + element.x_advance();
      assert!(right <= 100.0 + 0.5, "element right edge {} > wrap", right);
    }
  }
}

#[test]
fn s2_hard_newline() {
  let (mut engine, font) = engine_with_latin();
  let style = paragraph(font, 16.0);

  let block = engine.layout(&[span("ab\ncd", font, 16.0)], &style);

  assert_eq!(block.lines.len(), 2);
  assert_eq!(block.lines[0].byte_start, 0);
  assert_eq!(block.lines[0].byte_end, 3, "newline belongs to line 1");
  assert_eq!(block.lines[1].byte_start, 3);
  assert_eq!(block.lines[1].byte_end, 5);

  let cursor = engine.cursor_info(&block, 3, true);
  assert_eq!(cursor.line_index, 1);
  assert_eq!(cursor.position.y, block.lines[1].baseline_y());
}

#[test]
fn s3_mixed_bidi_runs_and_hit() {
  let mut engine = sdftext::TextEngine::new();
  let latin = engine.load_font_from_bytes(LATIN.to_vec(), 0).unwrap();
  let arabic = engine.load_font_from_bytes(ARABIC.to_vec(), 0).unwrap();

  let mut arabic_style = CharacterStyle::sized(Some(arabic), 16.0);
  arabic_style.script = "Arab".to_string();
  arabic_style.language = "ar".to_string();

  let style = paragraph(latin, 16.0);
  let block = engine.layout(
    &[
      span("abc ", latin, 16.0),
      TextSpan::new("طويل", arabic_style),
    ],
    &style,
  );

  assert_eq!(block.lines.len(), 1);
  let line = &block.lines[0];
  let runs = &line.visual_runs;
  assert_eq!(runs.len(), 2, "expected LTR then RTL run, got {:?}", runs);
  assert_eq!(runs[0].direction, Some(Direction::Ltr));
  assert_eq!(runs[1].direction, Some(Direction::Rtl));
  assert_eq!(runs[0].len, 4);
  assert_eq!(runs[1].len, 4);

  // RTL glyphs run right-to-left: the first element of the RTL run (the
  // visual leftmost) maps to the logically last codepoint.
  let rtl_first = &block.line_elements(line)[runs[1].start];
  let logical_start = block.element_byte_start(rtl_first);
  assert_eq!(logical_start, block.text.len() - 2, "leftmost = last letter");

  // Hitting the visual-left half of the leftmost Arabic glyph yields the
  // offset after the word: that is its logical start in RTL reading order.
  let probe = sdftext::Point::new(
    rtl_first.position().x + rtl_first.x_advance() * 0.25,
    line.baseline_y(),
  );
  let hit = engine.byte_offset_at(&block, probe);
  assert_eq!(hit.byte_offset, block.text.len());
}

#[test]
fn s4_inline_image_baseline() {
  let (mut engine, font) = engine_with_latin();
  let style = paragraph(font, 18.0);

  let mut image_style = CharacterStyle::sized(Some(font), 18.0);
  image_style.image = Some(InlineImage {
    texture: 42,
    width: 32.0,
    height: 32.0,
    valign: ImageVAlign::Baseline,
  });

  let block = engine.layout(
    &[
      span("ab", font, 18.0),
      TextSpan::new("", image_style),
      span("cd", font, 18.0),
    ],
    &style,
  );

  assert_eq!(block.lines.len(), 1);
  let line = &block.lines[0];
  let image = block
    .elements
    .iter()
    .find_map(|e| match e {
      PositionedElement::Image(i) => Some(i),
      _ => None,
    })
    .expect("image element present");

  assert_eq!(image.position.y, -32.0);
  assert_eq!(image.ascent, 32.0);
  assert_eq!(image.descent, 0.0);

  let text_descent = engine.scaled_metrics(font, 18.0).descent;
  let floor = (32.0 + text_descent).max(engine.scaled_metrics(font, 18.0).recommended_line_height);
  assert!(
    line.box_height >= floor - 0.01,
    "box {} < {}",
    line.box_height,
    floor
  );
}

#[test]
fn s5_font_fallback_chain() {
  let mut engine = sdftext::TextEngine::new();
  let latin = engine.load_font_from_bytes(LATIN.to_vec(), 0).unwrap();
  let cjk = engine.load_font_from_bytes(CJK.to_vec(), 0).unwrap();
  engine.set_fallback_chain(latin, &[cjk]);

  let style = paragraph(latin, 16.0);
  let block = engine.layout(&[span("a中b", latin, 16.0)], &style);

  let fonts: Vec<_> = block
    .elements
    .iter()
    .filter_map(|e| match e {
      PositionedElement::Glyph(g) => Some(g.font),
      _ => None,
    })
    .collect();
  assert_eq!(fonts, vec![latin, cjk, latin]);
  // The fallback glyph is a real glyph, not .notdef.
  if let PositionedElement::Glyph(g) = &block.elements[1] {
    assert_ne!(g.glyph_id, 0);
  }
}

#[test]
fn coverage_query_agrees_with_layout() {
  // is-codepoint-available(f, cp, true) implies a layout of that codepoint
  // produces one glyph whose source font covers it.
  let mut engine = sdftext::TextEngine::new();
  let latin = engine.load_font_from_bytes(LATIN.to_vec(), 0).unwrap();
  let cjk = engine.load_font_from_bytes(CJK.to_vec(), 0).unwrap();
  engine.set_fallback_chain(latin, &[cjk]);

  for cp in ['a', '中'] {
    assert!(engine.is_codepoint_available(latin, cp, true));
    let style = paragraph(latin, 16.0);
    let block = engine.layout(&[span(&cp.to_string(), latin, 16.0)], &style);
    assert_eq!(block.elements.len(), 1);
    if let PositionedElement::Glyph(g) = &block.elements[0] {
      assert!(engine.is_codepoint_available(g.font, cp, false));
      assert_ne!(g.glyph_id, 0);
    } else {
      panic!("expected a glyph");
    }
  }
}

#[test]
fn element_positions_non_decreasing_within_lines() {
  let mut engine = sdftext::TextEngine::new();
  let latin = engine.load_font_from_bytes(LATIN.to_vec(), 0).unwrap();
  let arabic = engine.load_font_from_bytes(ARABIC.to_vec(), 0).unwrap();

  let mut arabic_style = CharacterStyle::sized(Some(arabic), 16.0);
  arabic_style.script = "Arab".to_string();

  let mut style = paragraph(latin, 16.0);
  style.wrap_width = 120.0;
  let block = engine.layout(
    &[
      span("one two ", latin, 16.0),
      TextSpan::new("طويل", arabic_style),
      span(" three four five", latin, 16.0),
    ],
    &style,
  );

  for line in &block.lines {
    let xs: Vec<f32> = block
      .line_elements(line)
      .iter()
      .map(|e| e.position().x)
      .collect();
    for pair in xs.windows(2) {
      assert!(
        pair[0] <= pair[1] + 0.001,
        "visual order not monotone: {:?}",
        xs
      );
    }
  }
}

#[test]
fn lines_partition_elements_and_bytes() {
  let (mut engine, font) = engine_with_latin();
  let mut style = paragraph(font, 16.0);
  style.wrap_width = 80.0;
  let block = engine.layout(
    &[span("alpha beta gamma\ndelta epsilon", font, 16.0)],
    &style,
  );

  let mut element_total = 0;
  let mut byte_pos = 0;
  let mut last_bottom = 0.0f32;
  for line in &block.lines {
    assert_eq!(line.first_element, element_total);
    element_total += line.element_count;
    assert_eq!(line.byte_start, byte_pos);
    byte_pos = line.byte_end;
    assert!(line.box_y >= last_bottom - 0.001, "lines overlap");
    last_bottom = line.box_y + line.box_height;
  }
  assert_eq!(element_total, block.elements.len());
  assert_eq!(byte_pos, block.text.len());
}

#[test]
fn utf16_round_trip_over_block_text() {
  let mut engine = sdftext::TextEngine::new();
  let latin = engine.load_font_from_bytes(LATIN.to_vec(), 0).unwrap();
  let arabic = engine.load_font_from_bytes(ARABIC.to_vec(), 0).unwrap();
  let style = paragraph(latin, 16.0);
  let block = engine.layout(
    &[span("mix ", latin, 16.0), span("طويل", arabic, 16.0)],
    &style,
  );

  let units: Vec<u16> = block.text.encode_utf16().collect();
  assert_eq!(String::from_utf16(&units).unwrap(), block.text);

  for line in &block.lines {
    let n = line.bidi.visual_to_logical.len();
    assert_eq!(line.bidi.logical_to_visual.len(), n);
    for l in 0..n {
      let v = line.bidi.logical_to_visual[l] as usize;
      assert_eq!(line.bidi.visual_to_logical[v] as usize, l);
    }
  }
}

#[test]
fn oversized_segment_gets_its_own_line() {
  let (mut engine, font) = engine_with_latin();
  let mut style = paragraph(font, 16.0);
  style.wrap_width = 30.0; // narrower than one word
  let block = engine.layout(&[span("abcdefgh ab", font, 16.0)], &style);

  // The long word is not split; it overflows on its own line.
  assert!(block.lines.len() >= 2);
  assert!(block.lines[0].width > 30.0);
}

#[test]
fn draw_list_batches_by_style() {
  let (mut engine, font) = engine_with_latin();
  let style = paragraph(font, 16.0);
  let mut bold = CharacterStyle::sized(Some(font), 16.0);
  bold.bold = true;
  let block = engine.layout(
    &[span("ab ", font, 16.0), TextSpan::new("cd", bold)],
    &style,
  );

  let list = engine.build_batches(&block);
  assert_eq!(list.batches.len(), 2);
  assert!(list.batches.iter().all(|b| !b.quads.is_empty()));
  let smoothness = list.batches[0].state.smoothness;
  assert!((0.001..=0.1).contains(&smoothness));
}
