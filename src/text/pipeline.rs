//! Paragraph layout pipeline
//!
//! Coordinates normalization, bidi analysis, segmentation, shaping, line
//! accumulation, and line finalization into a `TextBlock`.
//!
//! # Architecture
//!
//! ```text
//! spans ── concat + span map ──► T (UTF-8)
//!   T ── paragraph bidi ──► embedding level
//!   T ── break iterator ──► segments
//!   segment ── bidi at paragraph level ──► visual runs ── shaping ──► elements
//!   elements ── accumulation (wrap, hard breaks) ──► pending lines
//!   pending line ── finalization ──► Line (box, baseline, runs, bidi maps)
//! ```
//!
//! Layout is a pure function of its inputs plus registry state; the only
//! side effects are glyph-cache fills. It never fails: soft problems
//! degrade to sentinels or skipped runs with a warning.

use crate::cache::GlyphCache;
use crate::font::{FontId, FontRegistry, ScaledFontMetrics};
use crate::geometry::{Point, Rect};
use crate::style::{
  CharacterStyle, HorizontalAlignment, ImageVAlign, LineHeight, ParagraphStyle, TextSpan,
};
use crate::text::bidi::{self, Direction};
use crate::text::block::{
  Line, PositionedElement, PositionedGlyph, PositionedImage, TextBlock, VisualRun,
};
use crate::text::segment::{self, Segment};
use crate::text::shape;
use log::warn;
use unicode_bidi::Level;

/// Per-span location inside the concatenated text.
#[derive(Debug, Clone, Copy)]
struct SpanMapEntry {
  u8_start: usize,
  u8_len: usize,
  span_index: usize,
}

/// Line being accumulated.
struct PendingLine {
  elements: Vec<PositionedElement>,
  width: f32,
  max_ascent: f32,
  max_descent: f32,
  byte_start: usize,
}

impl PendingLine {
  fn start_at(byte_start: usize, para_metrics: &ScaledFontMetrics) -> Self {
    Self {
      elements: Vec::new(),
      width: 0.0,
      // Lines never get shorter than the paragraph's default text would
      // make them.
      max_ascent: para_metrics.ascent,
      max_descent: para_metrics.descent,
      byte_start,
    }
  }
}

/// Shaped output of one segment, positions relative to the segment start.
#[derive(Default)]
struct SegmentLayout {
  elements: Vec<PositionedElement>,
  width: f32,
  max_ascent: f32,
  max_descent: f32,
}

/// Lays out styled spans under a paragraph style.
pub fn layout(
  registry: &FontRegistry,
  cache: &mut GlyphCache,
  spans: &[TextSpan],
  paragraph: &ParagraphStyle,
) -> TextBlock {
  let para_font = paragraph
    .default_style
    .font
    .filter(|f| registry.is_valid(*f))
    .or_else(|| registry.default_font());
  let para_size = if paragraph.default_style.font_size > 0.0 {
    paragraph.default_style.font_size
  } else {
    16.0
  };
  let para_metrics = match para_font {
    Some(f) => registry.scaled_metrics(f, para_size),
    None => ScaledFontMetrics::fallback(para_size),
  };

  let mut block = TextBlock {
    paragraph: paragraph.clone(),
    spans: spans.to_vec(),
    ..Default::default()
  };

  // Input normalization: concatenate span texts, substituting U+FFFC for
  // empty-text image spans, and record where each span landed.
  let mut span_map: Vec<SpanMapEntry> = Vec::with_capacity(spans.len());
  for (i, span) in spans.iter().enumerate() {
    let piece: &str = if span.style.image.is_some() && span.text.is_empty() {
      "\u{FFFC}"
    } else {
      span.text.as_str()
    };
    span_map.push(SpanMapEntry {
      u8_start: block.text.len(),
      u8_len: piece.len(),
      span_index: i,
    });
    block.span_starts.push(block.text.len());
    block.text.push_str(piece);
  }

  let para_level = bidi::paragraph_level(&block.text, paragraph.base_direction);

  let mut top_y = 0.0f32;
  let mut overall_max_width = 0.0f32;
  let mut pending = PendingLine::start_at(0, &para_metrics);

  for seg in segment::segments(&block.text, paragraph.line_break) {
    let shaped = shape_segment(
      registry,
      cache,
      &block.text,
      &seg,
      &span_map,
      spans,
      para_level,
      para_font,
      para_size,
    );

    // Wrap before committing a segment that would overflow a non-empty
    // line. Oversized segments still get a line of their own.
    if paragraph.wrap_width > 0.0
      && !pending.elements.is_empty()
      && shaped.width > 0.001
      && line_indent(&block.text, pending.byte_start, paragraph) + pending.width + shaped.width
        > paragraph.wrap_width
    {
      finalize_line(
        &mut block,
        &mut pending,
        seg.range.start,
        &mut top_y,
        &mut overall_max_width,
        paragraph,
        &para_metrics,
        para_size,
        para_level,
      );
      pending = PendingLine::start_at(seg.range.start, &para_metrics);
    }

    if !shaped.elements.is_empty() {
      let base_x =
        line_indent(&block.text, pending.byte_start, paragraph) + pending.width;
      for mut element in shaped.elements {
        element.shift_x(base_x);
        pending.elements.push(element);
      }
      pending.width += shaped.width;
      pending.max_ascent = pending.max_ascent.max(shaped.max_ascent);
      pending.max_descent = pending.max_descent.max(shaped.max_descent);
    }

    if seg.hard_break {
      let next_start = seg.end_with_break();
      finalize_line(
        &mut block,
        &mut pending,
        next_start,
        &mut top_y,
        &mut overall_max_width,
        paragraph,
        &para_metrics,
        para_size,
        para_level,
      );
      pending = PendingLine::start_at(next_start, &para_metrics);
    }
  }

  if !pending.elements.is_empty() || block.lines.is_empty() {
    let end = block.text.len();
    finalize_line(
      &mut block,
      &mut pending,
      end,
      &mut top_y,
      &mut overall_max_width,
      paragraph,
      &para_metrics,
      para_size,
      para_level,
    );
  }

  let width = if block.elements.is_empty() {
    overall_max_width.max(paragraph.first_line_indent)
  } else {
    overall_max_width
  };
  block.bounds = Rect::new(0.0, 0.0, width, top_y);
  block
}

/// Indent in effect for the line starting at `byte_start`: the paragraph's
/// first-line indent when the line opens the text or follows a hard
/// newline.
fn line_indent(text: &str, byte_start: usize, paragraph: &ParagraphStyle) -> f32 {
  let first = byte_start == 0
    || text
      .as_bytes()
      .get(byte_start.wrapping_sub(1))
      .is_some_and(|b| *b == b'\n');
  if first {
    paragraph.first_line_indent
  } else {
    0.0
  }
}

/// Shapes one segment into positioned elements, pen starting at x = 0.
#[allow(clippy::too_many_arguments)]
fn shape_segment(
  registry: &FontRegistry,
  cache: &mut GlyphCache,
  text: &str,
  seg: &Segment,
  span_map: &[SpanMapEntry],
  spans: &[TextSpan],
  para_level: Level,
  para_font: Option<FontId>,
  para_size: f32,
) -> SegmentLayout {
  let mut out = SegmentLayout::default();
  let seg_text = &text[seg.range.clone()];
  if seg_text.is_empty() {
    return out;
  }

  let mut pen_x = 0.0f32;
  let mut pen_y = 0.0f32;

  for run in bidi::visual_runs(seg_text, para_level) {
    let run_text = &seg_text[run.range.clone()];
    let run_abs_start = seg.range.start + run.range.start;

    let (style, span_for_style) = match span_at(span_map, run_abs_start, text.len()) {
      Some(e) => (spans[e.span_index].style.clone(), e.span_index),
      None => (CharacterStyle::default(), 0),
    };

    let run_font = style
      .font
      .filter(|f| registry.is_valid(*f))
      .or(para_font);
    let Some(run_font) = run_font else {
      warn!("no usable font for run at byte {}, skipping", run_abs_start);
      continue;
    };
    let run_size = if style.font_size > 0.0 {
      style.font_size
    } else {
      para_size
    };
    let run_metrics = registry.scaled_metrics(run_font, run_size);

    let glyphs = shape::shape_run(
      registry,
      run_font,
      run_text,
      run_size,
      run.direction,
      &style.script,
      &style.language,
    );
    let extents = shape::cluster_extents(&glyphs, run_text.len());

    for (g, cluster_end) in glyphs.iter().zip(extents.iter()) {
      let cluster_abs = run_abs_start + g.cluster;
      let leading = text[cluster_abs..].chars().next().unwrap_or('\u{FFFD}');

      if leading == '\u{FFFC}' {
        if let Some(owner) = span_at(span_map, cluster_abs, text.len()) {
          if let Some(image) = spans[owner.span_index].style.image {
            let element = place_image(
              image,
              &run_metrics,
              run_size,
              pen_x + g.x_offset,
              owner.span_index,
              cluster_abs - owner.u8_start,
            );
            out.max_ascent = out.max_ascent.max(element.ascent);
            out.max_descent = out.max_descent.max(element.descent);
            pen_x += element.x_advance;
            out.elements.push(PositionedElement::Image(element));
            continue;
          }
        }
      }

      let record = registry.record(g.font);
      let sdf_px = record.map(|r| r.sdf_px()).unwrap_or(crate::font::DEFAULT_SDF_PX);
      let cached = cache.get_or_create(registry, g.font, g.glyph_id, sdf_px);
      let metric_scale = if sdf_px > 0 { run_size / sdf_px as f32 } else { 1.0 };
      let ascent = cached.ascent * metric_scale;
      let descent = cached.descent * metric_scale;

      let (visual_left, visual_right) = record
        .and_then(|r| {
          let bbox = r
            .face()
            .glyph_bounding_box(ttf_parser::GlyphId(g.glyph_id as u16))?;
          let em_scale = run_size / r.properties().units_per_em as f32;
          Some((bbox.x_min as f32 * em_scale, bbox.x_max as f32 * em_scale))
        })
        .unwrap_or((0.0, g.x_advance));

      let owner = span_at(span_map, cluster_abs, text.len());
      let (span_index, byte_offset) = match owner {
        Some(e) => (e.span_index, cluster_abs - e.u8_start),
        None => (span_for_style, 0),
      };

      let element = PositionedGlyph {
        glyph_id: g.glyph_id,
        font: g.font,
        font_size: run_size,
        position: Point::new(pen_x + g.x_offset, pen_y - g.y_offset),
        x_advance: g.x_advance,
        y_advance: g.y_advance,
        x_offset: g.x_offset,
        y_offset: g.y_offset,
        render: cached.render,
        span_index,
        byte_offset,
        byte_len: cluster_end - g.cluster,
        style: style.clone(),
        ascent,
        descent,
        visual_left,
        visual_right,
        direction: run.direction,
      };

      out.max_ascent = out.max_ascent.max(ascent + g.y_offset);
      out.max_descent = out.max_descent.max(descent - g.y_offset);
      pen_x += g.x_advance;
      pen_y += g.y_advance;
      out.elements.push(PositionedElement::Glyph(element));
    }
  }

  out.width = pen_x;
  out
}

/// Resolves an inline image's vertical placement against its run metrics.
/// Line-relative modes are placed as baseline here and fixed up when the
/// line box is known.
fn place_image(
  image: crate::style::InlineImage,
  run_metrics: &ScaledFontMetrics,
  run_size: f32,
  pen_x: f32,
  span_index: usize,
  byte_offset: usize,
) -> PositionedImage {
  let width = if image.width > 0.0 { image.width } else { run_size };
  let height = if image.height > 0.0 { image.height } else { run_size };

  let (y, ascent, descent) = match image.valign {
    ImageVAlign::Baseline | ImageVAlign::LineTop | ImageVAlign::LineBottom => {
      (-height, height, 0.0)
    }
    ImageVAlign::MiddleOfText => {
      let mid = if run_metrics.x_height > 0.01 {
        run_metrics.x_height / 2.0
      } else {
        (run_metrics.ascent - run_metrics.descent) / 2.0
      };
      (
        -(mid + height / 2.0),
        (mid + height / 2.0).max(0.0),
        (height / 2.0 - mid).max(0.0),
      )
    }
    ImageVAlign::TextTop => (
      -run_metrics.ascent,
      run_metrics.ascent,
      (height - run_metrics.ascent).max(0.0),
    ),
    ImageVAlign::TextBottom => (
      run_metrics.descent - height,
      (height - run_metrics.descent).max(0.0),
      run_metrics.descent,
    ),
  };

  PositionedImage {
    position: Point::new(pen_x, y),
    width,
    height,
    x_advance: width,
    image,
    span_index,
    byte_offset,
    byte_len: '\u{FFFC}'.len_utf8(),
    ascent: ascent.max(0.0),
    descent: descent.max(0.0),
  }
}

/// Finds the span covering a byte offset; the final span claims the
/// end-of-text offset.
fn span_at(span_map: &[SpanMapEntry], byte: usize, text_len: usize) -> Option<&SpanMapEntry> {
  span_map
    .iter()
    .find(|e| byte >= e.u8_start && byte < e.u8_start + e.u8_len)
    .or_else(|| {
      if byte == text_len {
        span_map.last()
      } else {
        None
      }
    })
}

/// Computes the line-box height for the paragraph's policy, never clipping
/// content.
fn line_box_height(
  paragraph: &ParagraphStyle,
  default_metrics: &ScaledFontMetrics,
  max_ascent: f32,
  max_descent: f32,
  para_size: f32,
) -> f32 {
  let mut content = max_ascent + max_descent;
  if content < 0.001 {
    content = if default_metrics.content_height() > 0.001 {
      default_metrics.content_height()
    } else {
      para_size * 1.2
    };
  }
  let computed = match paragraph.line_height {
    LineHeight::MetricsScaled(f) => default_metrics.recommended_line_height * f,
    LineHeight::FontSizeScaled(f) => para_size * f,
    LineHeight::Absolute(v) => v,
    LineHeight::ContentScaled(f) => content * f,
  };
  computed.max(content)
}

/// Alignment shift for a line of the given visual width (indent included).
pub(crate) fn alignment_shift(paragraph: &ParagraphStyle, visual_width: f32) -> f32 {
  let mut effective = if paragraph.wrap_width > 0.0 {
    paragraph.wrap_width
  } else {
    visual_width
  };
  if effective < 0.01 && visual_width > 0.01 {
    effective = visual_width;
  }
  match paragraph.alignment {
    HorizontalAlignment::Right if visual_width < effective => effective - visual_width,
    HorizontalAlignment::Center if visual_width < effective => (effective - visual_width) / 2.0,
    // Justify lays out as Left.
    _ => 0.0,
  }
}

#[allow(clippy::too_many_arguments)]
fn finalize_line(
  block: &mut TextBlock,
  pending: &mut PendingLine,
  byte_end: usize,
  top_y: &mut f32,
  overall_max_width: &mut f32,
  paragraph: &ParagraphStyle,
  para_metrics: &ScaledFontMetrics,
  para_size: f32,
  para_level: Level,
) {
  let mut line = Line {
    first_element: block.elements.len(),
    element_count: pending.elements.len(),
    width: pending.width,
    max_ascent: pending.max_ascent,
    max_descent: pending.max_descent,
    byte_start: pending.byte_start,
    byte_end,
    ..Default::default()
  };

  let indent = line_indent(&block.text, pending.byte_start, paragraph);
  let visual_width = indent + line.width;
  let shift = alignment_shift(paragraph, visual_width);
  if shift.abs() > 0.001 {
    for element in &mut pending.elements {
      element.shift_x(shift);
    }
  }
  *overall_max_width = (*overall_max_width).max(visual_width + shift.max(0.0));

  line.box_height = line_box_height(
    paragraph,
    para_metrics,
    line.max_ascent,
    line.max_descent,
    para_size,
  );
  line.baseline = line.max_ascent;
  let content = line.max_ascent + line.max_descent;
  let content_scaled = matches!(paragraph.line_height, LineHeight::ContentScaled(_));
  if line.box_height > content + 0.001 && !content_scaled {
    // Distribute slack evenly above and below the content.
    line.baseline += (line.box_height - content) / 2.0;
  }
  line.box_y = *top_y;
  *top_y += line.box_height;

  // Image modes that needed the finished line box.
  for element in &mut pending.elements {
    if let PositionedElement::Image(img) = element {
      match img.image.valign {
        ImageVAlign::LineTop => {
          img.position.y = -line.baseline;
          img.ascent = line.baseline;
          img.descent = (img.height - img.ascent).max(0.0);
        }
        ImageVAlign::LineBottom => {
          img.position.y = (line.box_height - line.baseline) - img.height;
          img.descent = line.box_height - line.baseline;
          img.ascent = (img.height - img.descent).max(0.0);
        }
        _ => {}
      }
    }
  }

  line.visual_runs = build_visual_runs(&pending.elements, para_size);

  let units: Vec<u16> = block.text[line.byte_start..line.byte_end]
    .encode_utf16()
    .collect();
  line.bidi = bidi::line_maps(&units, para_level);

  block.elements.append(&mut pending.elements);
  block.lines.push(line);
  pending.width = 0.0;
}

/// Splits a line's elements into visual runs: direction, font, size
/// (> 0.1 px), script, language, or glyph/image boundary changes all force
/// a new run.
fn build_visual_runs(elements: &[PositionedElement], para_size: f32) -> Vec<VisualRun> {
  #[derive(PartialEq)]
  struct Key<'a> {
    is_image: bool,
    direction: Option<Direction>,
    font: Option<FontId>,
    script: &'a str,
    language: &'a str,
  }

  fn key_of(element: &PositionedElement) -> (Key<'_>, f32) {
    match element {
      PositionedElement::Glyph(g) => (
        Key {
          is_image: false,
          direction: Some(g.direction),
          font: Some(g.font),
          script: &g.style.script,
          language: &g.style.language,
        },
        g.font_size,
      ),
      PositionedElement::Image(_) => (
        Key {
          is_image: true,
          direction: None,
          font: None,
          script: "",
          language: "",
        },
        0.0,
      ),
    }
  }

  let mut runs = Vec::new();
  if elements.is_empty() {
    return runs;
  }

  let mut run_start = 0usize;
  let (mut run_key, mut run_size) = key_of(&elements[0]);
  if run_key.is_image {
    run_size = para_size;
  }

  let flush = |runs: &mut Vec<VisualRun>, start: usize, end: usize, key: &Key, size: f32| {
    let advance: f32 = elements[start..end].iter().map(|e| e.x_advance()).sum();
    runs.push(VisualRun {
      start,
      len: end - start,
      direction: key.direction,
      font: key.font,
      font_size: size,
      script: key.script.to_string(),
      language: key.language.to_string(),
      advance,
    });
  };

  for i in 1..elements.len() {
    let (key, size) = key_of(&elements[i]);
    let size = if key.is_image { run_size } else { size };
    let split = key != run_key || (!key.is_image && (size - run_size).abs() > 0.1);
    if split {
      flush(&mut runs, run_start, i, &run_key, run_size);
      run_start = i;
      run_key = key;
      run_size = if run_key.is_image { para_size } else { size };
    }
  }
  flush(&mut runs, run_start, elements.len(), &run_key, run_size);
  runs
}
