//! Glyph rasterization
//!
//! Converts glyph outlines into grayscale bitmaps at a fixed pixel size,
//! optionally post-processing the coverage into a signed distance field.
//!
//! # Overview
//!
//! ```text
//! ttf-parser outline → tiny-skia path → coverage bitmap → (SDF transform)
//! ```
//!
//! SDF output encodes distance to the outline in 8 bits with the edge at
//! 128/255 and a spread of [`SDF_SPREAD`] pixels, so a bilinear sample plus
//! smoothstep reconstructs a scale-stable edge. Metrics (advance, bearing)
//! are captured at the raster size; consumers rescale them to the requested
//! font size.

use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

/// Distance-field spread in pixels at the raster size. Distances beyond the
/// spread clamp to full black/white.
pub const SDF_SPREAD: f32 = 8.0;

/// Normalized SDF value of the glyph edge (128/255).
pub const SDF_EDGE: f32 = 128.0 / 255.0;

/// A rasterized glyph bitmap plus its metrics at the raster pixel size.
///
/// `width == 0` marks a blank glyph (whitespace, empty outline): no pixels,
/// but the metrics are still meaningful.
#[derive(Debug, Clone, Default)]
pub struct RasterizedGlyph {
  pub width: u32,
  pub height: u32,
  /// Grayscale pixels, row-major, `width * height` bytes.
  pub pixels: Vec<u8>,
  /// Horizontal offset from the pen position to the bitmap's left edge.
  pub left: f32,
  /// Distance from the baseline up to the bitmap's top edge.
  pub top: f32,
  pub advance: f32,
  /// Extent above the baseline of the glyph's ink box.
  pub ascent: f32,
  /// Extent below the baseline of the glyph's ink box.
  pub descent: f32,
}

impl RasterizedGlyph {
  pub fn is_blank(&self) -> bool {
    self.width == 0 || self.height == 0
  }
}

/// Builds a tiny-skia path from ttf-parser outline callbacks.
///
/// Paths are recorded in font design units (y-up); the rasterizer applies
/// the scale-and-flip transform.
struct OutlinePathBuilder {
  builder: PathBuilder,
}

impl OutlinePathBuilder {
  fn new() -> Self {
    Self {
      builder: PathBuilder::new(),
    }
  }

  fn finish(self) -> Option<tiny_skia::Path> {
    self.builder.finish()
  }
}

impl ttf_parser::OutlineBuilder for OutlinePathBuilder {
  fn move_to(&mut self, x: f32, y: f32) {
    self.builder.move_to(x, y);
  }

  fn line_to(&mut self, x: f32, y: f32) {
    self.builder.line_to(x, y);
  }

  fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
    self.builder.quad_to(x1, y1, x, y);
  }

  fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
    self.builder.cubic_to(x1, y1, x2, y2, x, y);
  }

  fn close(&mut self) {
    self.builder.close();
  }
}

/// Rasterizes one glyph at `px` pixels per em.
///
/// Returns `None` only when rasterization genuinely fails; glyphs without
/// an outline come back as a blank [`RasterizedGlyph`] carrying metrics.
pub fn rasterize(
  face: &ttf_parser::Face<'_>,
  glyph_id: u16,
  px: u32,
  sdf: bool,
) -> Option<RasterizedGlyph> {
  let upem = face.units_per_em();
  if upem == 0 || px == 0 {
    return None;
  }
  let scale = px as f32 / upem as f32;
  let gid = ttf_parser::GlyphId(glyph_id);

  let advance = face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale;

  let mut outline = OutlinePathBuilder::new();
  let bbox = match face.outline_glyph(gid, &mut outline) {
    Some(bbox) => bbox,
    None => {
      // Whitespace and other ink-free glyphs.
      return Some(RasterizedGlyph {
        advance,
        ..Default::default()
      });
    }
  };
  let path = outline.finish()?;

  let ascent = bbox.y_max as f32 * scale;
  let descent = -(bbox.y_min as f32) * scale;

  let pad = if sdf { SDF_SPREAD as i32 } else { 1 };
  let left = (bbox.x_min as f32 * scale).floor() as i32 - pad;
  let top = (bbox.y_max as f32 * scale).ceil() as i32 + pad;
  let right = (bbox.x_max as f32 * scale).ceil() as i32 + pad;
  let bottom = (bbox.y_min as f32 * scale).floor() as i32 - pad;
  let width = (right - left).max(1) as u32;
  let height = (top - bottom).max(1) as u32;

  let mut pixmap = Pixmap::new(width, height)?;
  let mut paint = Paint::default();
  paint.set_color_rgba8(255, 255, 255, 255);
  paint.anti_alias = true;

  // Design units → bitmap pixels: scale, flip Y, translate the ink box
  // (with padding) to the origin.
  let transform = Transform::from_row(scale, 0.0, 0.0, -scale, -left as f32, top as f32);
  pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);

  let mut coverage = Vec::with_capacity((width * height) as usize);
  for px_rgba in pixmap.data().chunks_exact(4) {
    coverage.push(px_rgba[3]);
  }

  let pixels = if sdf {
    distance_field(&coverage, width as usize, height as usize)
  } else {
    coverage
  };

  Some(RasterizedGlyph {
    width,
    height,
    pixels,
    left: left as f32,
    top: top as f32,
    advance,
    ascent,
    descent,
  })
}

const FAR: (i32, i32) = (1 << 14, 1 << 14);

#[inline]
fn sq_len(v: (i32, i32)) -> i64 {
  v.0 as i64 * v.0 as i64 + v.1 as i64 * v.1 as i64
}

/// Dead-reckoning signed distance transform (8SSEDT) over a coverage
/// bitmap. The edge (coverage 50%) maps to 128; each pixel of distance
/// moves the value by `127 / SDF_SPREAD`, saturating at the spread.
fn distance_field(coverage: &[u8], width: usize, height: usize) -> Vec<u8> {
  let inside: Vec<bool> = coverage.iter().map(|&c| c >= 128).collect();

  // Two grids of offsets to the nearest opposite-class pixel: one seeded
  // from inside pixels, one from outside.
  let mut to_inside = vec![FAR; width * height];
  let mut to_outside = vec![FAR; width * height];
  for i in 0..width * height {
    if inside[i] {
      to_inside[i] = (0, 0);
    } else {
      to_outside[i] = (0, 0);
    }
  }
  sweep(&mut to_inside, width, height);
  sweep(&mut to_outside, width, height);

  let scale = 127.0 / SDF_SPREAD;
  let mut out = Vec::with_capacity(width * height);
  for i in 0..width * height {
    let d_in = (sq_len(to_inside[i]) as f64).sqrt() as f32;
    let d_out = (sq_len(to_outside[i]) as f64).sqrt() as f32;
    // Positive inside the outline, negative outside. Sub-pixel coverage
    // nudges pixels straddling the edge so the 128 iso-line lands on the
    // anti-aliased contour instead of the pixel grid.
    let signed = if inside[i] {
      (d_out - 0.5).max(0.0) + (coverage[i] as f32 - 128.0) / 255.0
    } else {
      -((d_in - 0.5).max(0.0)) + (coverage[i] as f32 - 128.0) / 255.0
    };
    let v = 128.0 + signed * scale;
    out.push(v.clamp(0.0, 255.0) as u8);
  }
  out
}

/// Propagates nearest-seed offsets with the classic two-pass 8-neighbor
/// scan.
fn sweep(grid: &mut [(i32, i32)], width: usize, height: usize) {
  let w = width as i32;
  let h = height as i32;
  let idx = |x: i32, y: i32| (y * w + x) as usize;

  let relax = |grid: &mut [(i32, i32)], x: i32, y: i32, dx: i32, dy: i32| {
    let (nx, ny) = (x + dx, y + dy);
    if nx < 0 || ny < 0 || nx >= w || ny >= h {
      return;
    }
    let mut other = grid[idx(nx, ny)];
    other.0 += dx;
    other.1 += dy;
    if sq_len(other) < sq_len(grid[idx(x, y)]) {
      grid[idx(x, y)] = other;
    }
  };

  for y in 0..h {
    for x in 0..w {
      relax(grid, x, y, -1, 0);
      relax(grid, x, y, 0, -1);
      relax(grid, x, y, -1, -1);
      relax(grid, x, y, 1, -1);
    }
    for x in (0..w).rev() {
      relax(grid, x, y, 1, 0);
    }
  }
  for y in (0..h).rev() {
    for x in (0..w).rev() {
      relax(grid, x, y, 1, 0);
      relax(grid, x, y, 0, 1);
      relax(grid, x, y, 1, 1);
      relax(grid, x, y, -1, 1);
    }
    for x in 0..w {
      relax(grid, x, y, -1, 0);
    }
  }
}
