//! Glyph cache
//!
//! Maps (font, glyph index, pixel size, mode) to a packed atlas location
//! plus metrics captured at the raster size, with LRU eviction at a bounded
//! capacity. Eviction drops cache entries only; atlas rectangles are never
//! reclaimed (see `atlas`), which is what keeps render info copied into
//! long-lived `TextBlock`s valid until `clear`.
//!
//! Keys use the font that actually produced the glyph (post-fallback), so
//! shared fallback targets hit the same entries regardless of the requested
//! font.

use crate::atlas::{AtlasStore, TextureBackend, TextureId, DEFAULT_PAGE_SIZE};
use crate::font::{FontId, FontRegistry};
use crate::geometry::{Point, Rect};
use crate::raster;
use log::warn;
use lru::LruCache;
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::num::NonZeroUsize;

/// Default bound on the number of cached glyphs.
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Identity of a cached glyph bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlyphKey {
  pub font: FontId,
  pub glyph_id: u32,
  /// Pixel size the bitmap was generated at.
  pub px: u32,
  /// SDF or plain alpha coverage.
  pub sdf: bool,
}

/// Where and how a cached glyph renders.
///
/// `texture == None` is the sentinel for glyphs with no ink (whitespace) or
/// glyphs that could not be packed; layout still proceeds with correct
/// metrics, the renderer just skips the quad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphRenderInfo {
  pub texture: Option<TextureId>,
  /// Atlas page index, meaningful when `texture` is set.
  pub page: usize,
  /// Pixel rectangle inside the page.
  pub atlas_rect: Rect,
  /// Offset from the pen position (baseline origin, y-down) to the
  /// bitmap's top-left corner, at the cached pixel size.
  pub draw_offset: Point,
  pub is_sdf: bool,
}

impl GlyphRenderInfo {
  pub fn sentinel(sdf: bool) -> Self {
    Self {
      texture: None,
      page: 0,
      atlas_rect: Rect::ZERO,
      draw_offset: Point::ZERO,
      is_sdf: sdf,
    }
  }

  pub fn is_renderable(&self) -> bool {
    self.texture.is_some() && !self.atlas_rect.is_empty()
  }
}

/// A cache entry: render info plus metrics at the cached pixel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedGlyph {
  pub render: GlyphRenderInfo,
  /// Horizontal advance at the cached pixel size.
  pub advance: f32,
  /// Ink extent above the baseline at the cached pixel size.
  pub ascent: f32,
  /// Ink extent below the baseline at the cached pixel size.
  pub descent: f32,
}

impl CachedGlyph {
  fn sentinel(sdf: bool) -> Self {
    Self {
      render: GlyphRenderInfo::sentinel(sdf),
      advance: 0.0,
      ascent: 0.0,
      descent: 0.0,
    }
  }
}

type CacheHasher = BuildHasherDefault<FxHasher>;

/// LRU glyph cache over an atlas store.
pub struct GlyphCache {
  entries: LruCache<GlyphKey, CachedGlyph, CacheHasher>,
  atlas: AtlasStore,
  sdf_mode: bool,
}

impl GlyphCache {
  pub fn new(backend: Box<dyn TextureBackend>) -> Self {
    Self::with_options(
      backend,
      DEFAULT_CACHE_CAPACITY,
      DEFAULT_PAGE_SIZE,
      DEFAULT_PAGE_SIZE,
      true,
    )
  }

  pub fn with_options(
    backend: Box<dyn TextureBackend>,
    capacity: usize,
    page_width: u32,
    page_height: u32,
    sdf_mode: bool,
  ) -> Self {
    let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
    Self {
      entries: LruCache::with_hasher(capacity, CacheHasher::default()),
      atlas: AtlasStore::new(backend, page_width, page_height),
      sdf_mode,
    }
  }

  /// Whether new glyphs rasterize as SDFs or plain coverage.
  pub fn sdf_mode(&self) -> bool {
    self.sdf_mode
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn capacity(&self) -> usize {
    self.entries.cap().get()
  }

  pub fn atlas(&self) -> &AtlasStore {
    &self.atlas
  }

  /// Returns the cached entry for a glyph, rasterizing and packing it on a
  /// miss. Never fails for fonts present in the registry: rasterization
  /// failures walk `.notdef`, then the default font's `.notdef`, and bottom
  /// out at a sentinel entry.
  pub fn get_or_create(
    &mut self,
    registry: &FontRegistry,
    font: FontId,
    glyph_id: u32,
    px: u32,
  ) -> CachedGlyph {
    let key = GlyphKey {
      font,
      glyph_id,
      px,
      sdf: self.sdf_mode,
    };
    if let Some(entry) = self.entries.get(&key) {
      return *entry;
    }

    let entry = self.rasterize_entry(registry, font, glyph_id, px);
    // `put` evicts the least-recently-used entry when at capacity; its
    // atlas slot intentionally stays allocated.
    self.entries.put(key, entry);
    entry
  }

  fn rasterize_entry(
    &mut self,
    registry: &FontRegistry,
    font: FontId,
    glyph_id: u32,
    px: u32,
  ) -> CachedGlyph {
    let sdf = self.sdf_mode;

    let mut attempts: Vec<(FontId, u32)> = vec![(font, glyph_id)];
    if glyph_id != 0 {
      attempts.push((font, 0));
    }
    match registry.default_font() {
      Some(d) if d != font => attempts.push((d, 0)),
      _ => {}
    }

    for (attempt_font, attempt_gid) in attempts {
      let Some(record) = registry.record(attempt_font) else {
        continue;
      };
      let Ok(gid16) = u16::try_from(attempt_gid) else {
        continue;
      };
      let Some(bitmap) = raster::rasterize(record.face(), gid16, px, sdf) else {
        warn!(
          "rasterization failed for glyph {} of {} at {}px",
          attempt_gid, attempt_font, px
        );
        continue;
      };

      let render = if bitmap.is_blank() {
        GlyphRenderInfo::sentinel(sdf)
      } else {
        match self.atlas.pack(bitmap.width, bitmap.height, &bitmap.pixels) {
          Some(packed) => GlyphRenderInfo {
            texture: Some(packed.texture),
            page: packed.page,
            atlas_rect: packed.rect,
            draw_offset: Point::new(bitmap.left, -bitmap.top),
            is_sdf: sdf,
          },
          // Oversized for a page: unrenderable, metrics still valid.
          None => GlyphRenderInfo::sentinel(sdf),
        }
      };

      return CachedGlyph {
        render,
        advance: bitmap.advance,
        ascent: bitmap.ascent,
        descent: bitmap.descent,
      };
    }

    warn!(
      "no usable rendition for glyph {} of {}, caching sentinel",
      glyph_id, font
    );
    CachedGlyph::sentinel(sdf)
  }

  /// Drops every cache entry belonging to `font`. Atlas slots stay
  /// allocated until `clear`.
  pub fn evict_font(&mut self, font: FontId) {
    let doomed: Vec<GlyphKey> = self
      .entries
      .iter()
      .filter(|(k, _)| k.font == font)
      .map(|(k, _)| *k)
      .collect();
    for key in doomed {
      self.entries.pop(&key);
    }
  }

  /// Destroys all cache entries, atlas pages, and their GPU textures.
  pub fn clear(&mut self) {
    self.entries.clear();
    self.atlas.clear();
  }

  /// Applies new atlas options. Changing page dimensions or the bitmap
  /// mode clears the cache (existing rectangles would be invalid or
  /// unreachable); changing only the capacity trims the LRU tail.
  pub fn set_options(&mut self, capacity: usize, page_width: u32, page_height: u32, sdf_mode: bool) {
    let dims_changed =
      page_width != self.atlas.page_width() || page_height != self.atlas.page_height();
    if dims_changed {
      self.clear();
      self.atlas.set_page_size(page_width, page_height);
    }
    if sdf_mode != self.sdf_mode {
      self.clear();
      self.sdf_mode = sdf_mode;
    }
    let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
    if capacity != self.entries.cap() {
      self.entries.resize(capacity);
    }
  }
}

impl std::fmt::Debug for GlyphCache {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("GlyphCache")
      .field("entries", &self.entries.len())
      .field("capacity", &self.entries.cap())
      .field("sdf_mode", &self.sdf_mode)
      .field("atlas", &self.atlas)
      .finish()
  }
}
