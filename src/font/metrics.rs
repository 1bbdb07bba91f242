//! Font metrics extraction
//!
//! Pulls dimensional information out of a parsed face and scales it to a
//! pixel size. All stored values are in font design units (typically 1000
//! or 2048 per em); `FontProperties::scale` converts to pixels.
//!
//! # Font tables used
//!
//! - **head**: units per em
//! - **hhea**: ascender, descender, line gap
//! - **OS/2**: typographic metrics, x-height, cap height, strikeout
//! - **post**: underline position and thickness
//!
//! Typographic (OS/2) vertical metrics are preferred when the table is
//! present; hhea is the fallback, matching common rasterizer behavior.

/// Font-wide properties in design units, captured at load time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontProperties {
  pub units_per_em: u16,
  /// True when the face carries an OS/2 table with typographic metrics.
  pub has_typo_metrics: bool,
  pub typo_ascender: i16,
  pub typo_descender: i16,
  pub typo_line_gap: i16,
  pub hhea_ascender: i16,
  pub hhea_descender: i16,
  pub hhea_line_gap: i16,
  pub cap_height: Option<i16>,
  pub x_height: Option<i16>,
  pub underline_position: i16,
  pub underline_thickness: i16,
  pub strikeout_position: i16,
  pub strikeout_thickness: i16,
}

impl Default for FontProperties {
  fn default() -> Self {
    Self {
      units_per_em: 1000,
      has_typo_metrics: false,
      typo_ascender: 0,
      typo_descender: 0,
      typo_line_gap: 0,
      hhea_ascender: 0,
      hhea_descender: 0,
      hhea_line_gap: 0,
      cap_height: None,
      x_height: None,
      underline_position: 0,
      underline_thickness: 0,
      strikeout_position: 0,
      strikeout_thickness: 0,
    }
  }
}

impl FontProperties {
  /// Extracts properties from a parsed face.
  pub fn from_face(face: &ttf_parser::Face<'_>) -> Self {
    let units_per_em = match face.units_per_em() {
      0 => 1000,
      upem => upem,
    };
    let hhea_ascender = face.tables().hhea.ascender;
    let hhea_descender = face.tables().hhea.descender;
    let hhea_line_gap = face.tables().hhea.line_gap;

    let os2 = face.tables().os2;
    let has_typo_metrics = os2.is_some();
    let (typo_ascender, typo_descender, typo_line_gap) = match os2 {
      Some(t) => (
        t.typographic_ascender(),
        t.typographic_descender(),
        t.typographic_line_gap(),
      ),
      None => (0, 0, 0),
    };

    // Strikeout comes from OS/2; without the table, approximate the way
    // legacy rasterizers do (2/5 of the ascender, 1/20 em thick).
    let (strikeout_position, strikeout_thickness) = match face.strikeout_metrics() {
      Some(m) => (m.position, m.thickness),
      None => {
        let thickness = match face.underline_metrics() {
          Some(u) if u.thickness > 0 => u.thickness,
          _ => (units_per_em / 20) as i16,
        };
        ((hhea_ascender as i32 * 2 / 5) as i16, thickness)
      }
    };

    let (underline_position, underline_thickness) = match face.underline_metrics() {
      Some(m) => (m.position, m.thickness),
      None => (0, 0),
    };

    Self {
      units_per_em,
      has_typo_metrics,
      typo_ascender,
      typo_descender,
      typo_line_gap,
      hhea_ascender,
      hhea_descender,
      hhea_line_gap,
      cap_height: face.capital_height().filter(|&v| v != 0),
      x_height: face.x_height().filter(|&v| v != 0),
      underline_position,
      underline_thickness,
      strikeout_position,
      strikeout_thickness,
    }
  }

  /// Scales these properties to a pixel size.
  pub fn scale(&self, font_size: f32) -> ScaledFontMetrics {
    let scale = if self.units_per_em > 0 {
      font_size / self.units_per_em as f32
    } else {
      1.0
    };

    let (ascent, descent, line_gap) = if self.has_typo_metrics {
      (
        self.typo_ascender as f32 * scale,
        -(self.typo_descender as f32) * scale,
        self.typo_line_gap as f32 * scale,
      )
    } else {
      (
        self.hhea_ascender as f32 * scale,
        -(self.hhea_descender as f32) * scale,
        self.hhea_line_gap as f32 * scale,
      )
    };

    let recommended_line_height = (ascent + descent + line_gap).max(font_size * 1.2);

    let cap_height = match self.cap_height {
      Some(v) => v as f32 * scale,
      None => ascent * 0.7,
    };
    let x_height = match self.x_height {
      Some(v) => v as f32 * scale,
      None => ascent * 0.45,
    };

    let clamp_thickness = |t: f32| if t > 0.0 && t < 1.0 { 1.0 } else { t };

    ScaledFontMetrics {
      scale,
      ascent,
      descent,
      line_gap,
      recommended_line_height,
      cap_height,
      x_height,
      underline_position: self.underline_position as f32 * scale,
      underline_thickness: clamp_thickness(self.underline_thickness as f32 * scale),
      strikeout_position: self.strikeout_position as f32 * scale,
      strikeout_thickness: clamp_thickness(self.strikeout_thickness as f32 * scale),
    }
  }
}

/// Font metrics scaled to a concrete pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScaledFontMetrics {
  /// Design-units-to-pixels factor used to derive the rest.
  pub scale: f32,
  /// Height above the baseline (positive).
  pub ascent: f32,
  /// Depth below the baseline (positive).
  pub descent: f32,
  pub line_gap: f32,
  /// `ascent + descent + line_gap`, never less than 1.2 × font size.
  pub recommended_line_height: f32,
  pub cap_height: f32,
  pub x_height: f32,
  pub underline_position: f32,
  pub underline_thickness: f32,
  pub strikeout_position: f32,
  pub strikeout_thickness: f32,
}

impl ScaledFontMetrics {
  /// Sentinel metrics for invalid fonts or sizes: a 3:1 ascent/descent
  /// split of the requested size.
  pub fn fallback(font_size: f32) -> Self {
    let size = if font_size > 0.0 { font_size } else { 16.0 };
    let ascent = size * 0.75;
    let descent = size * 0.25;
    Self {
      scale: 1.0,
      ascent,
      descent,
      line_gap: 0.0,
      recommended_line_height: size * 1.2,
      cap_height: ascent * 0.7,
      x_height: ascent * 0.45,
      underline_position: -descent * 0.5,
      underline_thickness: 1.0,
      strikeout_position: ascent * 0.3,
      strikeout_thickness: 1.0,
    }
  }

  /// Content extent of a line containing only this font's text.
  pub fn content_height(&self) -> f32 {
    self.ascent + self.descent
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn props_1000_upem() -> FontProperties {
    FontProperties {
      units_per_em: 1000,
      has_typo_metrics: true,
      typo_ascender: 800,
      typo_descender: -200,
      typo_line_gap: 90,
      hhea_ascender: 1000,
      hhea_descender: -250,
      hhea_line_gap: 0,
      ..Default::default()
    }
  }

  #[test]
  fn prefers_typographic_metrics() {
    let m = props_1000_upem().scale(20.0);
    assert!((m.ascent - 16.0).abs() < 1e-4);
    assert!((m.descent - 4.0).abs() < 1e-4);
    assert!((m.line_gap - 1.8).abs() < 1e-4);
  }

  #[test]
  fn falls_back_to_hhea_without_os2() {
    let mut p = props_1000_upem();
    p.has_typo_metrics = false;
    let m = p.scale(20.0);
    assert!((m.ascent - 20.0).abs() < 1e-4);
    assert!((m.descent - 5.0).abs() < 1e-4);
  }

  #[test]
  fn recommended_height_floor_is_1_2_em() {
    let mut p = props_1000_upem();
    p.typo_ascender = 500;
    p.typo_descender = -100;
    p.typo_line_gap = 0;
    let m = p.scale(20.0);
    assert!((m.recommended_line_height - 24.0).abs() < 1e-4);
  }

  #[test]
  fn derived_cap_and_x_heights() {
    let m = props_1000_upem().scale(20.0);
    assert!((m.cap_height - 16.0 * 0.7).abs() < 1e-4);
    assert!((m.x_height - 16.0 * 0.45).abs() < 1e-4);
  }

  #[test]
  fn thin_lines_clamp_to_one_pixel() {
    let mut p = props_1000_upem();
    p.underline_thickness = 10;
    let m = p.scale(10.0);
    assert_eq!(m.underline_thickness, 1.0);
  }

  #[test]
  fn fallback_metrics_split_three_to_one() {
    let m = ScaledFontMetrics::fallback(16.0);
    assert_eq!(m.ascent, 12.0);
    assert_eq!(m.descent, 4.0);
    assert_eq!(m.recommended_line_height, 16.0 * 1.2);
  }
}
