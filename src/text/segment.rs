//! Break-opportunity segmentation
//!
//! Splits paragraph text into atomic layout segments: the pieces line
//! accumulation may place but never split. Word granularity uses UAX-29
//! word boundaries, grapheme granularity uses extended grapheme clusters.
//! Hard newlines split their segment; the newline byte itself is consumed
//! by the break rather than shaped.

use crate::style::LineBreakStrategy;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// One atomic candidate for layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
  /// Byte range of the shapeable text (newline excluded).
  pub range: Range<usize>,
  /// A mandatory line break follows this segment. The break consumes
  /// `newline_len` bytes after `range.end`.
  pub hard_break: bool,
  /// Byte length of the consumed newline sequence (0 without a break).
  pub newline_len: usize,
}

impl Segment {
  /// Byte offset at which the next line starts when `hard_break` is set.
  pub fn end_with_break(&self) -> usize {
    self.range.end + self.newline_len
  }
}

/// Computes the segment list for `text` under the paragraph's break
/// strategy. Break opportunities are computed once for the whole paragraph.
pub fn segments(text: &str, strategy: LineBreakStrategy) -> Vec<Segment> {
  let mut out = Vec::new();
  match strategy {
    LineBreakStrategy::WordBoundary => {
      for (start, word) in text.split_word_bound_indices() {
        push_split_at_newlines(&mut out, start, word);
      }
    }
    LineBreakStrategy::ByWidth | LineBreakStrategy::GraphemeBoundary => {
      for (start, grapheme) in text.grapheme_indices(true) {
        push_split_at_newlines(&mut out, start, grapheme);
      }
    }
  }
  out
}

/// Pushes `piece` as segments, splitting at hard newlines. A `\r\n` pair
/// counts as a single consumed break.
fn push_split_at_newlines(out: &mut Vec<Segment>, piece_start: usize, piece: &str) {
  let mut cursor = 0;
  while let Some(nl) = piece[cursor..].find('\n') {
    let nl = cursor + nl;
    // Fold a preceding carriage return into the break.
    let (shape_end, newline_start) = if nl > cursor && piece.as_bytes()[nl - 1] == b'\r' {
      (nl - 1, nl - 1)
    } else {
      (nl, nl)
    };
    out.push(Segment {
      range: piece_start + cursor..piece_start + shape_end,
      hard_break: true,
      newline_len: nl + 1 - newline_start,
    });
    cursor = nl + 1;
  }
  if cursor < piece.len() || piece.is_empty() {
    out.push(Segment {
      range: piece_start + cursor..piece_start + piece.len(),
      hard_break: false,
      newline_len: 0,
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn seg_texts<'a>(text: &'a str, strategy: LineBreakStrategy) -> Vec<&'a str> {
    segments(text, strategy)
      .iter()
      .map(|s| &text[s.range.clone()])
      .collect()
  }

  #[test]
  fn word_bounds_keep_words_and_spaces_apart() {
    let texts = seg_texts("hello world", LineBreakStrategy::WordBoundary);
    assert_eq!(texts, vec!["hello", " ", "world"]);
  }

  #[test]
  fn grapheme_bounds_split_everywhere() {
    let texts = seg_texts("ab c", LineBreakStrategy::GraphemeBoundary);
    assert_eq!(texts, vec!["a", "b", " ", "c"]);
  }

  #[test]
  fn hard_newline_splits_segment() {
    let segs = segments("ab\ncd", LineBreakStrategy::WordBoundary);
    let breaks: Vec<&Segment> = segs.iter().filter(|s| s.hard_break).collect();
    assert_eq!(breaks.len(), 1);
    let b = breaks[0];
    assert_eq!(b.newline_len, 1);
    assert_eq!(b.end_with_break(), 3);
  }

  #[test]
  fn crlf_is_one_break() {
    let segs = segments("ab\r\ncd", LineBreakStrategy::WordBoundary);
    let b = segs.iter().find(|s| s.hard_break).unwrap();
    assert_eq!(&"ab\r\ncd"[b.range.clone()], "ab");
    assert_eq!(b.newline_len, 2);
    assert_eq!(b.end_with_break(), 4);
  }

  #[test]
  fn trailing_newline_still_breaks() {
    let segs = segments("ab\n", LineBreakStrategy::WordBoundary);
    let b = segs.iter().find(|s| s.hard_break).unwrap();
    assert!(b.range.is_empty());
    assert_eq!(b.end_with_break(), 3);
  }

  #[test]
  fn segments_cover_text_in_order() {
    let text = "hello world hello";
    let segs = segments(text, LineBreakStrategy::WordBoundary);
    let mut pos = 0;
    for s in &segs {
      assert_eq!(s.range.start, pos);
      pos = s.end_with_break();
    }
    assert_eq!(pos, text.len());
  }
}
