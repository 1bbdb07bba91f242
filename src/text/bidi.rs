//! Bidirectional text analysis (UAX #9)
//!
//! Thin wrappers over the `unicode-bidi` crate used at the engine's two
//! bidi scales:
//!
//! - **Paragraph/segment scale**: resolve the paragraph embedding level and
//!   split each layout segment into visual runs ordered left-to-right, so
//!   shaping sees uniform-direction text.
//! - **Line scale**: after a line is fixed, re-run the algorithm over the
//!   line's UTF-16 code units to produce the visual↔logical permutation
//!   maps cursor motion and selection need. Line breaks change the
//!   mapping, which is why the paragraph-level analysis cannot be reused.

use crate::style::BaseDirection;
use std::ops::Range;
use unicode_bidi::{BidiInfo, Level};

/// Resolved direction of a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
  #[default]
  Ltr,
  Rtl,
}

impl Direction {
  pub fn is_ltr(self) -> bool {
    self == Direction::Ltr
  }

  pub fn is_rtl(self) -> bool {
    self == Direction::Rtl
  }

  pub fn from_level(level: Level) -> Self {
    if level.is_rtl() {
      Direction::Rtl
    } else {
      Direction::Ltr
    }
  }

  pub fn to_harfbuzz(self) -> rustybuzz::Direction {
    match self {
      Direction::Ltr => rustybuzz::Direction::LeftToRight,
      Direction::Rtl => rustybuzz::Direction::RightToLeft,
    }
  }
}

/// Resolves the paragraph embedding level for `text` under the requested
/// base direction. `Auto` detects from the first strong character and
/// prefers LTR when the text has none.
pub fn paragraph_level(text: &str, base: BaseDirection) -> Level {
  match base {
    BaseDirection::Ltr => Level::ltr(),
    BaseDirection::Rtl => Level::rtl(),
    BaseDirection::Auto => {
      if text.is_empty() {
        return Level::ltr();
      }
      let info = BidiInfo::new(text, None);
      info
        .paragraphs
        .first()
        .map(|p| p.level)
        .unwrap_or_else(Level::ltr)
    }
  }
}

/// A uniform-direction slice of a segment, in visual order.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRun {
  /// Byte range into the segment's text.
  pub range: Range<usize>,
  pub direction: Direction,
}

/// Splits `text` into visual runs (ordered left-to-right) at the given
/// paragraph level.
pub fn visual_runs(text: &str, level: Level) -> Vec<SegmentRun> {
  if text.is_empty() {
    return Vec::new();
  }
  let info = BidiInfo::new(text, Some(level));
  let Some(para) = info.paragraphs.first() else {
    return Vec::new();
  };
  let (levels, runs) = info.visual_runs(para, para.range.clone());
  runs
    .into_iter()
    .filter(|r| !r.is_empty())
    .map(|r| {
      let direction = Direction::from_level(levels[r.start]);
      SegmentRun {
        range: r,
        direction,
      }
    })
    .collect()
}

/// Visual↔logical permutation maps over a line's UTF-16 code units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineBidiMaps {
  /// `visual_to_logical[v]` = logical UTF-16 index at visual position `v`.
  pub visual_to_logical: Vec<u32>,
  /// `logical_to_visual[l]` = visual position of logical UTF-16 index `l`.
  pub logical_to_visual: Vec<u32>,
}

/// Runs the bidi algorithm over one line's UTF-16 code units at the
/// resolved paragraph level and derives both permutation maps.
pub fn line_maps(units: &[u16], level: Level) -> LineBidiMaps {
  if units.is_empty() {
    return LineBidiMaps::default();
  }
  let info = unicode_bidi::utf16::BidiInfo::new(units, Some(level));
  let Some(para) = info.paragraphs.first() else {
    return LineBidiMaps::default();
  };
  let (levels, runs) = info.visual_runs(para, para.range.clone());

  let mut visual_to_logical = Vec::with_capacity(units.len());
  for run in runs {
    if levels[run.start].is_rtl() {
      visual_to_logical.extend(run.rev().map(|i| i as u32));
    } else {
      visual_to_logical.extend(run.map(|i| i as u32));
    }
  }

  let mut logical_to_visual = vec![0u32; visual_to_logical.len()];
  for (visual, &logical) in visual_to_logical.iter().enumerate() {
    logical_to_visual[logical as usize] = visual as u32;
  }

  LineBidiMaps {
    visual_to_logical,
    logical_to_visual,
  }
}
