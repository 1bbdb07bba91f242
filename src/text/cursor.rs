//! Hit testing and cursor geometry
//!
//! Round-trips between source byte offsets and visual positions over a
//! laid-out `TextBlock`, including across mixed-direction lines. All of
//! these queries read the per-line bidi maps computed at layout time:
//! cursor motion is logical, rendering is visual, and the maps are the
//! bridge.
//!
//! Coordinates are block-local (same space as element positions).

use crate::font::{FontRegistry, ScaledFontMetrics};
use crate::geometry::{Point, Rect};
use crate::text::bidi::Direction;
use crate::text::block::{CursorInfo, HitResult, Line, PositionedElement, TextBlock};
use crate::text::pipeline::alignment_shift;

/// UTF-16 length of a UTF-8 string.
pub(crate) fn utf16_len(s: &str) -> usize {
  s.chars().map(char::len_utf16).sum()
}

/// Byte offset of the character boundary at (or right after) a UTF-16
/// index.
pub(crate) fn utf16_index_to_utf8(s: &str, target: usize) -> usize {
  let mut u16_pos = 0;
  for (byte_idx, c) in s.char_indices() {
    if u16_pos >= target {
      return byte_idx;
    }
    u16_pos += c.len_utf16();
  }
  s.len()
}

/// X coordinate where a line's content begins: first-line indent plus
/// alignment shift.
fn line_origin_x(block: &TextBlock, line: &Line) -> f32 {
  let indent = if block.line_starts_paragraph(line) {
    block.paragraph.first_line_indent
  } else {
    0.0
  };
  indent + alignment_shift(&block.paragraph, indent + line.width)
}

fn default_metrics(registry: &FontRegistry, block: &TextBlock) -> ScaledFontMetrics {
  let size = if block.paragraph.default_style.font_size > 0.0 {
    block.paragraph.default_style.font_size
  } else {
    16.0
  };
  let font = block
    .paragraph
    .default_style
    .font
    .filter(|f| registry.is_valid(*f))
    .or_else(|| registry.default_font());
  match font {
    Some(f) => registry.scaled_metrics(f, size),
    None => ScaledFontMetrics::fallback(size),
  }
}

/// Index of the line owning a byte offset.
///
/// An offset equal to a line's end belongs to that line only when the next
/// line does not exist or does not contain it; this makes hard and soft
/// wraps behave uniformly.
fn line_for_offset(block: &TextBlock, offset: usize) -> usize {
  let last = block.lines.len() - 1;
  for (i, line) in block.lines.iter().enumerate() {
    if line.contains_byte(offset) {
      return i;
    }
    if offset == line.byte_end {
      let next_contains = block
        .lines
        .get(i + 1)
        .is_some_and(|n| offset >= n.byte_start);
      if !next_contains {
        return i;
      }
    }
    if offset == block.text.len() && i == last {
      return i;
    }
  }
  last
}

/// Resolves a byte offset to cursor geometry.
pub fn cursor_info(
  registry: &FontRegistry,
  block: &TextBlock,
  byte_offset: usize,
  prefer_leading_edge: bool,
) -> CursorInfo {
  let metrics = default_metrics(registry, block);
  let mut info = CursorInfo {
    byte_offset: byte_offset.min(block.text.len()),
    ..Default::default()
  };

  if block.lines.is_empty() {
    info.position = Point::new(block.paragraph.first_line_indent, metrics.ascent);
    info.ascent = metrics.ascent;
    info.descent = metrics.descent;
    info.height = metrics.content_height();
    info.at_line_end = true;
    info.trailing_edge = true;
    return info;
  }

  let line_index = line_for_offset(block, info.byte_offset);
  let line = &block.lines[line_index];
  info.line_index = line_index;
  info.position.y = line.baseline_y();
  info.at_line_end = info.byte_offset == line.byte_end;

  let origin_x = line_origin_x(block, line);

  let mut found = false;
  for element in block.line_elements(line) {
    let el_start = block.element_byte_start(element);
    let el_len = element.byte_len();
    if info.byte_offset < el_start || info.byte_offset > el_start + el_len {
      continue;
    }

    info.ascent = positive_or(element.ascent(), positive_or(line.max_ascent, metrics.ascent));
    info.descent = positive_or(
      element.descent(),
      positive_or(line.max_descent, metrics.descent),
    );

    let at_start = info.byte_offset == el_start;
    let leading = (at_start && prefer_leading_edge)
      || (info.byte_offset as f32) < el_start as f32 + el_len as f32 / 2.0;

    let direction = element.direction().unwrap_or(Direction::Ltr);
    let left = element.position().x;
    let right = left + element.x_advance();
    info.position.x = match (direction, leading) {
      (Direction::Ltr, true) | (Direction::Rtl, false) => left,
      (Direction::Ltr, false) | (Direction::Rtl, true) => right,
    };
    info.trailing_edge = !leading;
    found = true;
    break;
  }

  if !found {
    if line.element_count == 0 {
      info.position.x = origin_x;
      info.trailing_edge = !prefer_leading_edge;
    } else {
      // Past every element: the visual end of the line.
      info.position.x = origin_x + line.width;
      info.trailing_edge = true;
    }
    info.ascent = positive_or(line.max_ascent, metrics.ascent);
    info.descent = positive_or(line.max_descent, metrics.descent);
  }

  info.height = info.ascent + info.descent;
  if info.height < 1.0 {
    info.height = if metrics.recommended_line_height > 0.0 {
      metrics.recommended_line_height
    } else {
      16.0
    };
    info.ascent = info.height * 0.75;
    info.descent = info.height * 0.25;
  }
  info
}

fn positive_or(value: f32, fallback: f32) -> f32 {
  if value > 0.001 {
    value
  } else {
    fallback
  }
}

/// Resolves a block-local point to the byte offset of the nearest cursor
/// stop.
pub fn byte_offset_at(block: &TextBlock, position: Point) -> HitResult {
  if block.lines.is_empty() {
    return HitResult {
      byte_offset: 0,
      trailing_edge: position.x > 0.0,
      distance: position.x.abs(),
    };
  }

  // Pick the line whose Y range holds the point, else the nearest center.
  let mut line_index = 0;
  let mut best_dy = f32::INFINITY;
  for (i, line) in block.lines.iter().enumerate() {
    if position.y >= line.box_y && position.y < line.box_y + line.box_height {
      line_index = i;
      best_dy = 0.0;
      break;
    }
    let dy = (position.y - (line.box_y + line.box_height / 2.0)).abs();
    if dy < best_dy {
      best_dy = dy;
      line_index = i;
    }
  }
  let line = &block.lines[line_index];
  let line_text = &block.text[line.byte_start..line.byte_end];
  let origin_x = line_origin_x(block, line);

  if line.element_count == 0 || line_text.is_empty() {
    let trailing = position.x > origin_x + line.width / 2.0;
    let edge = origin_x + if trailing { line.width } else { 0.0 };
    return HitResult {
      byte_offset: line.byte_start,
      trailing_edge: trailing,
      distance: (position.x - edge).abs(),
    };
  }

  // Left of all content: the line's first visual position, converted back
  // to a logical offset through the bidi map.
  if position.x < origin_x {
    let logical = line
      .bidi
      .visual_to_logical
      .first()
      .copied()
      .unwrap_or(0) as usize;
    return HitResult {
      byte_offset: line.byte_start + utf16_index_to_utf8(line_text, logical),
      trailing_edge: false,
      distance: origin_x - position.x,
    };
  }

  // Prefer the element whose span contains the point; otherwise fall back
  // to the element whose nearer edge is closest. Containment matters at
  // run boundaries, where two elements share an edge coordinate.
  let mut best: Option<(&PositionedElement, bool, f32)> = None;
  let mut containing: Option<(&PositionedElement, bool, f32)> = None;
  for element in block.line_elements(line) {
    let left = element.position().x;
    let right = left + element.x_advance();
    let mid = (left + right) / 2.0;
    let left_half = position.x < mid;
    let edge = if left_half { left } else { right };
    let dist = (position.x - edge).abs();
    if containing.is_none() && position.x >= left && position.x < right {
      containing = Some((element, left_half, dist));
    }
    if best.map(|(_, _, d)| dist < d).unwrap_or(true) {
      best = Some((element, left_half, dist));
    }
  }
  let best = containing.or(best);
  let Some((element, left_half, distance)) = best else {
    return HitResult {
      byte_offset: line.byte_start,
      trailing_edge: false,
      distance: 0.0,
    };
  };

  // Element provenance → the line's local UTF-16 coordinates.
  let el_start_in_line = block.element_byte_start(element) - line.byte_start;
  let el_end_in_line = (el_start_in_line + element.byte_len()).min(line_text.len());
  let logical_start = utf16_len(&line_text[..el_start_in_line]);
  let mut logical_len = utf16_len(&line_text[el_start_in_line..el_end_in_line]);
  if logical_len == 0 && element.byte_len() > 0 {
    logical_len = 1;
  }

  let direction = element.direction().unwrap_or(Direction::Ltr);
  let (logical, trailing) = match (direction, left_half) {
    (Direction::Ltr, true) => (logical_start, false),
    (Direction::Ltr, false) => (logical_start + logical_len, true),
    (Direction::Rtl, true) => (logical_start + logical_len, true),
    (Direction::Rtl, false) => (logical_start, false),
  };
  let logical = logical.min(utf16_len(line_text));

  HitResult {
    byte_offset: line.byte_start + utf16_index_to_utf8(line_text, logical),
    trailing_edge: trailing,
    distance,
  }
}

/// Visual bounding rectangles of a byte range, one or more per line it
/// touches. Under bidi a logical range can split into several visual runs;
/// rectangles come back in line order, left to right within a line.
pub fn range_bounds(block: &TextBlock, byte_start: usize, byte_end: usize) -> Vec<Rect> {
  let mut rects = Vec::new();
  if byte_start >= byte_end || block.lines.is_empty() {
    return rects;
  }

  for line in &block.lines {
    let range_start = byte_start.max(line.byte_start);
    let range_end = byte_end.min(line.byte_end);
    if range_start >= range_end {
      continue;
    }
    let baseline_y = line.baseline_y();

    let mut run: Option<(f32, f32, f32, f32)> = None; // min_x, max_x, asc, desc
    let flush = |run: &mut Option<(f32, f32, f32, f32)>, rects: &mut Vec<Rect>| {
      if let Some((min_x, max_x, asc, desc)) = run.take() {
        rects.push(Rect::new(min_x, baseline_y - asc, max_x - min_x, asc + desc));
      }
    };

    for element in block.line_elements(line) {
      let el_start = block.element_byte_start(element);
      let el_end = el_start + element.byte_len();
      let inside = el_end > range_start && el_start < range_end;
      if inside {
        let left = element.position().x;
        let right = left + element.x_advance();
        run = Some(match run {
          Some((min_x, max_x, asc, desc)) => (
            min_x.min(left),
            max_x.max(right),
            asc.max(element.ascent()),
            desc.max(element.descent()),
          ),
          None => (left, right, element.ascent(), element.descent()),
        });
      } else {
        flush(&mut run, &mut rects);
      }
    }
    flush(&mut run, &mut rects);
  }
  rects
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::atlas::NullTextureBackend;
  use crate::cache::GlyphCache;
  use crate::style::{CharacterStyle, ParagraphStyle, TextSpan};
  use crate::text::pipeline;

  const LATIN: &[u8] = include_bytes!("../../tests/fixtures/fonts/latin.ttf");

  fn laid_out(text: &str) -> (FontRegistry, TextBlock) {
    let mut registry = FontRegistry::new();
    let font = registry.load_font_from_bytes(LATIN.to_vec(), 0).unwrap();
    let mut cache = GlyphCache::new(Box::<NullTextureBackend>::default());
    let style = ParagraphStyle {
      default_style: CharacterStyle::sized(Some(font), 16.0),
      ..Default::default()
    };
    let spans = [TextSpan::new(text, CharacterStyle::sized(Some(font), 16.0))];
    let block = pipeline::layout(&registry, &mut cache, &spans, &style);
    (registry, block)
  }

  #[test]
  fn utf16_helpers_round_trip() {
    let s = "a中b𝄞c";
    assert_eq!(utf16_len(s), 6); // 1 + 1 + 1 + 2 + 1
    assert_eq!(utf16_index_to_utf8(s, 0), 0);
    assert_eq!(utf16_index_to_utf8(s, 1), 1);
    assert_eq!(utf16_index_to_utf8(s, 2), 4);
    assert_eq!(utf16_index_to_utf8(s, 3), 5);
    assert_eq!(utf16_index_to_utf8(s, 5), 9);
    assert_eq!(utf16_index_to_utf8(s, 6), 10);
  }

  #[test]
  fn cursor_x_advances_with_offset() {
    let (registry, block) = laid_out("abc");
    let x0 = cursor_info(&registry, &block, 0, true).position.x;
    let x1 = cursor_info(&registry, &block, 1, true).position.x;
    let x3 = cursor_info(&registry, &block, 3, true).position.x;
    assert!(x0 < x1 && x1 < x3, "{} {} {}", x0, x1, x3);
  }

  #[test]
  fn cursor_offset_round_trips_through_position() {
    let (registry, block) = laid_out("hello");
    for offset in 0..=5 {
      let info = cursor_info(&registry, &block, offset, true);
      let hit = byte_offset_at(&block, info.position);
      assert_eq!(hit.byte_offset, offset, "offset {}", offset);
    }
  }

  #[test]
  fn hit_left_of_content_returns_line_start() {
    let (_registry, block) = laid_out("hello");
    let hit = byte_offset_at(&block, Point::new(-20.0, 5.0));
    assert_eq!(hit.byte_offset, 0);
    assert!(!hit.trailing_edge);
  }

  #[test]
  fn hit_far_right_returns_line_end() {
    let (_registry, block) = laid_out("hi");
    let hit = byte_offset_at(&block, Point::new(10_000.0, 5.0));
    assert_eq!(hit.byte_offset, 2);
    assert!(hit.trailing_edge);
  }

  #[test]
  fn range_bounds_cover_selection() {
    let (_registry, block) = laid_out("hello");
    let rects = range_bounds(&block, 1, 4);
    assert_eq!(rects.len(), 1);
    let r = rects[0];
    assert!(r.width > 0.0 && r.height > 0.0);
    // Selection of [1,4) starts after the first glyph.
    let first = &block.elements[0];
    assert!(r.x >= first.position().x + first.x_advance() - 0.5);
  }

  #[test]
  fn range_bounds_empty_for_degenerate_range() {
    let (_registry, block) = laid_out("hello");
    assert!(range_bounds(&block, 3, 3).is_empty());
    assert!(range_bounds(&block, 4, 2).is_empty());
  }

  #[test]
  fn cursor_lands_on_second_line_after_hard_break() {
    let (registry, block) = laid_out("ab\ncd");
    let info = cursor_info(&registry, &block, 3, true);
    assert_eq!(info.line_index, 1);
    assert_eq!(info.position.y, block.lines[1].baseline_y());
  }

  #[test]
  fn empty_block_queries_never_panic() {
    let registry = FontRegistry::new();
    let block = TextBlock::default();
    let info = cursor_info(&registry, &block, 0, true);
    assert_eq!(info.byte_offset, 0);
    let hit = byte_offset_at(&block, Point::ZERO);
    assert_eq!(hit.byte_offset, 0);
    assert!(range_bounds(&block, 0, 1).is_empty());
  }
}
