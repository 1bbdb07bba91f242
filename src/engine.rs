//! Engine facade
//!
//! `TextEngine` owns the font registry, the glyph cache with its atlas
//! pages, and the engine-wide configuration, and exposes the public
//! surface: font management, layout, hit testing, and draw-list building.
//!
//! An engine instance is single-threaded by contract: atlas updates touch
//! GPU textures, so every call must come from the thread owning the GPU
//! context. Separate instances on separate threads are independent.

use crate::atlas::{NullTextureBackend, TextureBackend};
use crate::cache::GlyphCache;
use crate::draw::{self, DrawList};
use crate::error::Result;
use crate::font::{FontId, FontProperties, FontRegistry, ScaledFontMetrics};
use crate::geometry::{Point, Rect};
use crate::style::{ParagraphStyle, TextSpan};
use crate::text::block::{CursorInfo, HitResult, TextBlock};
use crate::text::{cursor, pipeline};
use std::path::Path;

/// The styled text layout and rendering engine.
pub struct TextEngine {
  registry: FontRegistry,
  cache: GlyphCache,
  smoothness_bias: f32,
}

impl TextEngine {
  /// Creates a headless engine (no GPU mirroring). Always succeeds.
  pub fn new() -> Self {
    Self::with_backend(Box::<NullTextureBackend>::default())
  }

  /// Creates an engine whose atlas pages mirror into textures created by
  /// `backend`.
  pub fn with_backend(backend: Box<dyn TextureBackend>) -> Self {
    Self {
      registry: FontRegistry::new(),
      cache: GlyphCache::new(backend),
      smoothness_bias: 0.0,
    }
  }

  // --- Font management ---

  /// Loads a font file. The first loaded font becomes the default.
  pub fn load_font(&mut self, path: impl AsRef<Path>, face_index: u32) -> Result<FontId> {
    self.registry.load_font(path, face_index)
  }

  /// Loads a font from an in-memory buffer.
  pub fn load_font_from_bytes(
    &mut self,
    bytes: impl Into<Vec<u8>>,
    face_index: u32,
  ) -> Result<FontId> {
    self.registry.load_font_from_bytes(bytes, face_index)
  }

  /// Unloads a font, evicting its cached glyphs and removing it from
  /// every fallback chain.
  pub fn unload_font(&mut self, id: FontId) {
    self.cache.evict_font(id);
    self.registry.unload_font(id);
  }

  pub fn is_font_valid(&self, id: FontId) -> bool {
    self.registry.is_valid(id)
  }

  pub fn default_font(&self) -> Option<FontId> {
    self.registry.default_font()
  }

  pub fn set_default_font(&mut self, id: Option<FontId>) {
    self.registry.set_default_font(id);
  }

  pub fn set_fallback_chain(&mut self, primary: FontId, chain: &[FontId]) {
    self.registry.set_fallback_chain(primary, chain);
  }

  pub fn fallback_chain(&self, primary: FontId) -> &[FontId] {
    self.registry.fallback_chain(primary)
  }

  pub fn is_codepoint_available(&self, font: FontId, cp: char, include_fallback: bool) -> bool {
    self.registry.is_codepoint_available(font, cp, include_fallback)
  }

  pub fn font_properties(&self, id: FontId) -> FontProperties {
    self.registry.properties(id)
  }

  pub fn scaled_metrics(&self, id: FontId, font_size: f32) -> ScaledFontMetrics {
    self.registry.scaled_metrics(id, font_size)
  }

  /// Overrides the pixel size at which a font's glyphs are cached.
  pub fn set_sdf_px_hint(&mut self, id: FontId, px: u32) {
    self.registry.set_sdf_px_hint(id, px);
  }

  pub fn registry(&self) -> &FontRegistry {
    &self.registry
  }

  // --- Layout ---

  /// Lays out styled spans under a paragraph style. Never fails: soft
  /// problems degrade to sentinels, and the returned block is a
  /// self-contained value.
  pub fn layout(&mut self, spans: &[TextSpan], paragraph: &ParagraphStyle) -> TextBlock {
    pipeline::layout(&self.registry, &mut self.cache, spans, paragraph)
  }

  // --- Cursor and hit testing ---

  /// Cursor geometry for a byte offset into the block's concatenated
  /// text.
  pub fn cursor_info(
    &self,
    block: &TextBlock,
    byte_offset: usize,
    prefer_leading_edge: bool,
  ) -> CursorInfo {
    cursor::cursor_info(&self.registry, block, byte_offset, prefer_leading_edge)
  }

  /// Byte offset nearest to a block-local point.
  pub fn byte_offset_at(&self, block: &TextBlock, position: Point) -> HitResult {
    cursor::byte_offset_at(block, position)
  }

  /// Visual rectangles covering a byte range (for selection highlights).
  pub fn range_bounds(&self, block: &TextBlock, byte_start: usize, byte_end: usize) -> Vec<Rect> {
    cursor::range_bounds(block, byte_start, byte_end)
  }

  // --- Drawing ---

  /// Builds the batched draw list for a block.
  pub fn build_batches(&self, block: &TextBlock) -> DrawList {
    draw::build_batches(&self.registry, block, self.smoothness_bias)
  }

  // --- Glyph cache ---

  /// Destroys all cached glyphs, atlas pages, and their textures. Render
  /// info held by existing blocks becomes stale.
  pub fn clear_glyph_cache(&mut self) {
    self.cache.clear();
  }

  /// Reconfigures the cache and atlas. Changing page dimensions or the
  /// bitmap mode clears the cache.
  pub fn set_atlas_options(&mut self, capacity: usize, width: u32, height: u32, sdf_mode: bool) {
    self.cache.set_options(capacity, width, height, sdf_mode);
  }

  pub fn glyph_cache_len(&self) -> usize {
    self.cache.len()
  }

  pub fn glyph_cache_capacity(&self) -> usize {
    self.cache.capacity()
  }

  pub fn atlas_page_count(&self) -> usize {
    self.cache.atlas().page_count()
  }

  /// CPU-side view of an atlas page, for debugging and tooling.
  pub fn atlas_page_image(&self, index: usize) -> Option<&[u8]> {
    self.cache.atlas().page(index).map(|p| p.image())
  }

  /// Process-independent SDF smoothing adjustment added to every batch's
  /// computed smoothness.
  pub fn smoothness_bias(&self) -> f32 {
    self.smoothness_bias
  }

  pub fn set_smoothness_bias(&mut self, bias: f32) {
    self.smoothness_bias = bias;
  }
}

impl Default for TextEngine {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::style::CharacterStyle;

  const LATIN: &[u8] = include_bytes!("../tests/fixtures/fonts/latin.ttf");

  #[test]
  fn first_font_becomes_default() {
    let mut engine = TextEngine::new();
    assert_eq!(engine.default_font(), None);
    let font = engine.load_font_from_bytes(LATIN.to_vec(), 0).unwrap();
    assert_eq!(engine.default_font(), Some(font));
  }

  #[test]
  fn unload_evicts_cached_glyphs_and_chains() {
    let mut engine = TextEngine::new();
    let a = engine.load_font_from_bytes(LATIN.to_vec(), 0).unwrap();
    let b = engine.load_font_from_bytes(LATIN.to_vec(), 0).unwrap();
    engine.set_fallback_chain(a, &[b]);

    let paragraph = ParagraphStyle {
      default_style: CharacterStyle::sized(Some(b), 16.0),
      ..Default::default()
    };
    engine.layout(
      &[TextSpan::new("abc", CharacterStyle::sized(Some(b), 16.0))],
      &paragraph,
    );
    assert!(engine.glyph_cache_len() > 0);

    engine.unload_font(b);
    assert!(!engine.is_font_valid(b));
    assert_eq!(engine.glyph_cache_len(), 0);
    assert!(engine.fallback_chain(a).is_empty());
    assert_eq!(engine.default_font(), Some(a));
  }

  #[test]
  fn atlas_option_dimension_change_clears_cache() {
    let mut engine = TextEngine::new();
    let font = engine.load_font_from_bytes(LATIN.to_vec(), 0).unwrap();
    let paragraph = ParagraphStyle {
      default_style: CharacterStyle::sized(Some(font), 16.0),
      ..Default::default()
    };
    engine.layout(
      &[TextSpan::new("abc", CharacterStyle::sized(Some(font), 16.0))],
      &paragraph,
    );
    assert!(engine.glyph_cache_len() > 0);
    engine.set_atlas_options(512, 2048, 2048, true);
    assert_eq!(engine.glyph_cache_len(), 0);
  }

  #[test]
  fn face_index_out_of_range_is_an_error() {
    let mut engine = TextEngine::new();
    assert!(engine.load_font_from_bytes(LATIN.to_vec(), 3).is_err());
    assert!(engine.load_font_from_bytes(vec![0u8; 16], 0).is_err());
  }
}
