//! Per-run text shaping
//!
//! Shapes one uniform-direction run of text with rustybuzz and applies
//! per-cluster font fallback: clusters the primary font maps entirely to
//! `.notdef` are re-shaped whole against the first chain font covering
//! their leading codepoint. Each output glyph records the font that
//! actually produced it.

use crate::font::{FontId, FontRegistry};
use crate::text::bidi::Direction;
use log::warn;
use std::str::FromStr;

/// Codepoints whose `.notdef` mapping is acceptable rather than a fallback
/// trigger.
pub fn is_layout_whitespace(c: char) -> bool {
  matches!(c, ' ' | '\t' | '\n' | '\u{3000}')
}

/// One shaped glyph, positions scaled to the requested font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapedGlyph {
  pub glyph_id: u32,
  /// Font that produced this glyph (differs from the requested font when
  /// fallback kicked in).
  pub font: FontId,
  /// Byte offset of the glyph's cluster within the run text.
  pub cluster: usize,
  pub x_advance: f32,
  pub y_advance: f32,
  pub x_offset: f32,
  pub y_offset: f32,
}

/// Shapes `text` with `font`, falling back per cluster where the font has
/// no coverage. Returns glyphs in visual order. An empty result means the
/// font was unusable.
pub fn shape_run(
  registry: &FontRegistry,
  font: FontId,
  text: &str,
  font_size: f32,
  direction: Direction,
  script: &str,
  language: &str,
) -> Vec<ShapedGlyph> {
  if text.is_empty() {
    return Vec::new();
  }
  let glyphs = match shape_with_font(registry, font, text, font_size, direction, script, language)
  {
    Some(g) => g,
    None => {
      warn!("shaping failed for {} over {:?} bytes", font, text.len());
      return Vec::new();
    }
  };

  // Fallback pass: contiguous glyph spans sharing a cluster that came back
  // all-.notdef get one re-shape against a covering font.
  let mut out: Vec<ShapedGlyph> = Vec::with_capacity(glyphs.len());
  let cluster_ends = cluster_extents(&glyphs, text.len());
  let mut i = 0;
  while i < glyphs.len() {
    let cluster = glyphs[i].cluster;
    let mut j = i + 1;
    while j < glyphs.len() && glyphs[j].cluster == cluster {
      j += 1;
    }

    let all_notdef = glyphs[i..j].iter().all(|g| g.glyph_id == 0);
    let fallback_char = text[cluster..]
      .chars()
      .next()
      .filter(|c| !is_layout_whitespace(*c) && *c != '\u{FFFC}');

    if let (true, Some(c)) = (all_notdef, fallback_char) {
      match registry.resolve_codepoint(font, c, true) {
        Some(fb) if fb != font => {
          let cluster_end = cluster_ends[i];
          let cluster_text = &text[cluster..cluster_end];
          if let Some(replacement) =
            shape_with_font(registry, fb, cluster_text, font_size, direction, script, language)
          {
            out.extend(replacement.into_iter().map(|mut g| {
              g.cluster += cluster;
              g
            }));
            i = j;
            continue;
          }
        }
        _ => {}
      }
    }

    out.extend_from_slice(&glyphs[i..j]);
    i = j;
  }

  out
}

/// Shapes `text` against a single font, no fallback.
fn shape_with_font(
  registry: &FontRegistry,
  font: FontId,
  text: &str,
  font_size: f32,
  direction: Direction,
  script: &str,
  language: &str,
) -> Option<Vec<ShapedGlyph>> {
  let record = registry.record(font)?;
  let face = record.shaper();
  let upem = face.units_per_em() as f32;
  if upem <= 0.0 {
    return None;
  }
  let scale = font_size / upem;

  let mut buffer = rustybuzz::UnicodeBuffer::new();
  buffer.push_str(text);
  buffer.set_direction(direction.to_harfbuzz());
  // Script and language stay unset unless the style names them; the shaper
  // then detects them from the text itself.
  if let Some(s) = script_from_tag(script) {
    buffer.set_script(s);
  }
  if !language.is_empty() {
    if let Ok(lang) = rustybuzz::Language::from_str(language) {
      buffer.set_language(lang);
    }
  }

  let output = rustybuzz::shape(face, &[], buffer);
  let infos = output.glyph_infos();
  let positions = output.glyph_positions();

  let mut glyphs = Vec::with_capacity(infos.len());
  for (info, pos) in infos.iter().zip(positions.iter()) {
    glyphs.push(ShapedGlyph {
      glyph_id: info.glyph_id,
      font,
      cluster: info.cluster as usize,
      x_advance: pos.x_advance as f32 * scale,
      y_advance: pos.y_advance as f32 * scale,
      x_offset: pos.x_offset as f32 * scale,
      y_offset: pos.y_offset as f32 * scale,
    });
  }
  Some(glyphs)
}

/// ISO 15924 tag string → rustybuzz script. Tags shorter than four bytes
/// are space padded; unknown or empty tags yield `None` (shaper guesses).
fn script_from_tag(tag: &str) -> Option<rustybuzz::Script> {
  if tag.is_empty() {
    return None;
  }
  let bytes = tag.as_bytes();
  let mut padded = [b' '; 4];
  for (i, b) in bytes.iter().take(4).enumerate() {
    padded[i] = *b;
  }
  rustybuzz::Script::from_iso15924_tag(ttf_parser::Tag::from_bytes(&padded))
}

/// For each glyph, the byte offset one past its cluster in logical order.
///
/// Clusters are monotone per HarfBuzz contract (ascending for LTR output,
/// descending for RTL), so each glyph's cluster end is the smallest cluster
/// offset greater than its own, or the run length.
pub(crate) fn cluster_extents(glyphs: &[ShapedGlyph], text_len: usize) -> Vec<usize> {
  let mut starts: Vec<usize> = glyphs.iter().map(|g| g.cluster).collect();
  starts.sort_unstable();
  starts.dedup();
  glyphs
    .iter()
    .map(|g| {
      match starts.binary_search(&g.cluster) {
        Ok(i) if i + 1 < starts.len() => starts[i + 1],
        _ => text_len,
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  const LATIN: &[u8] = include_bytes!("../../tests/fixtures/fonts/latin.ttf");
  const CJK: &[u8] = include_bytes!("../../tests/fixtures/fonts/cjk.ttf");

  fn registry_with_latin() -> (FontRegistry, FontId) {
    let mut reg = FontRegistry::new();
    let id = reg.load_font_from_bytes(LATIN.to_vec(), 0).unwrap();
    (reg, id)
  }

  #[test]
  fn shapes_simple_latin() {
    let (reg, font) = registry_with_latin();
    let glyphs = shape_run(&reg, font, "ab", 16.0, Direction::Ltr, "", "");
    assert_eq!(glyphs.len(), 2);
    assert!(glyphs.iter().all(|g| g.glyph_id != 0));
    assert!(glyphs.iter().all(|g| g.x_advance > 0.0));
    assert_eq!(glyphs[0].cluster, 0);
    assert_eq!(glyphs[1].cluster, 1);
  }

  #[test]
  fn fallback_reshapes_uncovered_cluster() {
    let (mut reg, latin) = registry_with_latin();
    let cjk = reg.load_font_from_bytes(CJK.to_vec(), 0).unwrap();
    reg.set_fallback_chain(latin, &[cjk]);

    let glyphs = shape_run(&reg, latin, "a中b", 16.0, Direction::Ltr, "", "");
    assert_eq!(glyphs.len(), 3);
    assert_eq!(glyphs[0].font, latin);
    assert_eq!(glyphs[1].font, cjk);
    assert_ne!(glyphs[1].glyph_id, 0);
    assert_eq!(glyphs[2].font, latin);
  }

  #[test]
  fn uncovered_without_chain_stays_notdef() {
    let (reg, latin) = registry_with_latin();
    let glyphs = shape_run(&reg, latin, "中", 16.0, Direction::Ltr, "", "");
    assert_eq!(glyphs.len(), 1);
    assert_eq!(glyphs[0].glyph_id, 0);
    assert_eq!(glyphs[0].font, latin);
  }

  #[test]
  fn whitespace_never_triggers_fallback() {
    let (mut reg, latin) = registry_with_latin();
    let cjk = reg.load_font_from_bytes(CJK.to_vec(), 0).unwrap();
    reg.set_fallback_chain(latin, &[cjk]);
    let glyphs = shape_run(&reg, latin, " ", 16.0, Direction::Ltr, "", "");
    assert_eq!(glyphs.len(), 1);
    assert_eq!(glyphs[0].font, latin);
  }

  #[test]
  fn cluster_extents_cover_multibyte() {
    let glyphs = vec![
      ShapedGlyph {
        glyph_id: 1,
        font: FontId::from_raw_for_tests(0),
        cluster: 0,
        x_advance: 1.0,
        y_advance: 0.0,
        x_offset: 0.0,
        y_offset: 0.0,
      },
      ShapedGlyph {
        glyph_id: 2,
        font: FontId::from_raw_for_tests(0),
        cluster: 3,
        x_advance: 1.0,
        y_advance: 0.0,
        x_offset: 0.0,
        y_offset: 0.0,
      },
    ];
    assert_eq!(cluster_extents(&glyphs, 5), vec![3, 5]);
  }
}
