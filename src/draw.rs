//! Draw orchestration (renderer boundary)
//!
//! Walks a `TextBlock` in paint order and groups consecutive glyphs into
//! batches the host renderer can submit with a single shader. A new batch
//! starts whenever any piece of state the shader distinguishes changes:
//! atlas texture, fill (including gradient stops), basic style bits, any
//! effect block, or the computed SDF smoothness.
//!
//! The engine does not own a GPU pipeline; [`DrawBatch`] carries uniform
//! values under the names of the single-shader contract (`sdfEdgeValue`,
//! `sdfSmoothness`, outline/glow/shadow/inner blocks) and pre-positioned
//! quads. Inline images come back on a separate list in paint order.

use crate::atlas::TextureId;
use crate::font::FontRegistry;
use crate::geometry::Rect;
use crate::raster::SDF_EDGE;
use crate::style::{FillStyle, GlowEffect, InnerEffect, OutlineEffect, ShadowEffect};
use crate::text::block::{PositionedElement, TextBlock};

/// Computes the SDF smoothness uniform for a glyph rendered at
/// `font_size` from a bitmap cached at `cached_px`. Downscaling sharpens
/// the transition; `bias` is the engine-wide tuning knob.
pub fn smoothness_for_scale(font_size: f32, cached_px: u32, bias: f32) -> f32 {
  let ratio = if cached_px > 0 {
    (font_size / cached_px as f32).max(0.25)
  } else {
    1.0
  };
  let value = 0.02 / ratio.sqrt().max(0.5) + bias;
  value.clamp(0.001, 0.1)
}

/// Render state shared by every glyph in a batch. Equality decides batch
/// boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchState {
  pub texture: TextureId,
  pub is_sdf: bool,
  pub fill: FillStyle,
  pub bold: bool,
  pub italic: bool,
  pub outline: OutlineEffect,
  pub glow: GlowEffect,
  pub shadow: ShadowEffect,
  pub inner: InnerEffect,
  /// `sdfSmoothness` uniform value.
  pub smoothness: f32,
  /// `sdfEdgeValue` uniform value (constant for the current rasterizer).
  pub edge_value: f32,
}

/// One textured quad: where to draw (`dest`, block coordinates) and what
/// part of the atlas page to sample (`src`, pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphQuad {
  pub dest: Rect,
  pub src: Rect,
}

/// A run of quads sharing one shader state.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawBatch {
  pub state: BatchState,
  pub quads: Vec<GlyphQuad>,
}

/// An inline image to draw, in paint order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageQuad {
  /// Host-owned texture handle from the span's image descriptor.
  pub texture: u64,
  pub dest: Rect,
}

/// Everything the renderer needs for one block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
  pub batches: Vec<DrawBatch>,
  pub images: Vec<ImageQuad>,
}

/// Builds the batched draw list for a block.
///
/// Quads are emitted line by line in visual order; consecutive glyphs fold
/// into the open batch while their state matches. Sentinel render infos
/// (whitespace, unpacked glyphs) produce no quad.
pub fn build_batches(registry: &FontRegistry, block: &TextBlock, smoothness_bias: f32) -> DrawList {
  let mut list = DrawList::default();
  let mut open: Option<DrawBatch> = None;

  for line in &block.lines {
    let baseline_y = line.baseline_y();
    for element in block.line_elements(line) {
      match element {
        PositionedElement::Image(img) => {
          list.images.push(ImageQuad {
            texture: img.image.texture,
            dest: Rect::new(
              img.position.x,
              baseline_y + img.position.y,
              img.width,
              img.height,
            ),
          });
        }
        PositionedElement::Glyph(glyph) => {
          let Some(texture) = glyph.render.texture.filter(|_| glyph.render.is_renderable())
          else {
            continue;
          };
          let cached_px = registry
            .record(glyph.font)
            .map(|r| r.sdf_px())
            .unwrap_or(crate::font::DEFAULT_SDF_PX);
          let scale = if cached_px > 0 {
            glyph.font_size / cached_px as f32
          } else {
            1.0
          };

          let state = BatchState {
            texture,
            is_sdf: glyph.render.is_sdf,
            fill: glyph.style.fill.clone(),
            bold: glyph.style.bold,
            italic: glyph.style.italic,
            outline: glyph.style.outline,
            glow: glyph.style.glow,
            shadow: glyph.style.shadow,
            inner: glyph.style.inner,
            smoothness: smoothness_for_scale(glyph.font_size, cached_px, smoothness_bias),
            edge_value: SDF_EDGE,
          };

          let quad = GlyphQuad {
            dest: Rect::new(
              glyph.position.x + glyph.render.draw_offset.x * scale,
              baseline_y + glyph.position.y + glyph.render.draw_offset.y * scale,
              glyph.render.atlas_rect.width * scale,
              glyph.render.atlas_rect.height * scale,
            ),
            src: glyph.render.atlas_rect,
          };

          match open.take() {
            Some(mut batch) if batch.state == state => {
              batch.quads.push(quad);
              open = Some(batch);
            }
            prev => {
              if let Some(done) = prev {
                list.batches.push(done);
              }
              open = Some(DrawBatch {
                state,
                quads: vec![quad],
              });
            }
          }
        }
      }
    }
  }
  if let Some(done) = open.take() {
    list.batches.push(done);
  }
  list
}
