//! Font registry
//!
//! Owns font buffers and exposes face handles, scaled metrics, per-font
//! fallback chains, and codepoint-coverage queries.
//!
//! # Overview
//!
//! Fonts load from a path or a byte buffer into a [`FontRecord`]: the raw
//! bytes behind an `Arc`, a parsed `ttf-parser` face for metrics and
//! outlines, and a `rustybuzz` face for shaping. Ids are allocated
//! monotonically and never reused; unloading a font removes it from every
//! fallback chain so chains only ever name live fonts.
//!
//! The registry performs no font discovery: callers hand it files, it hands
//! back ids.

pub mod metrics;

pub use metrics::{FontProperties, ScaledFontMetrics};

use crate::error::{FontError, Result};
use log::{debug, warn};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Default pixel size at which glyph bitmaps/SDFs are generated and cached.
pub const DEFAULT_SDF_PX: u32 = 64;

/// Opaque handle to a loaded font. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontId(u32);

impl FontId {
  pub fn raw(self) -> u32 {
    self.0
  }

  #[cfg(test)]
  pub(crate) fn from_raw_for_tests(raw: u32) -> Self {
    FontId(raw)
  }
}

impl fmt::Display for FontId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "font#{}", self.0)
  }
}

/// A loaded font: owned bytes plus parsed face handles and properties.
pub struct FontRecord {
  data: Arc<Vec<u8>>,
  face: ttf_parser::Face<'static>,
  shaper: rustybuzz::Face<'static>,
  properties: FontProperties,
  sdf_px: u32,
}

impl FontRecord {
  fn parse(data: Arc<Vec<u8>>, face_index: u32) -> Result<Self> {
    // SAFETY: the Arc keeps the font bytes alive for as long as this record
    // (and therefore both faces) exists; the record never leaks the
    // 'static lifetime to callers.
    let static_data: &'static [u8] = unsafe { std::mem::transmute::<&[u8], &'static [u8]>(&*data) };

    let face = ttf_parser::Face::parse(static_data, face_index).map_err(|e| {
      FontError::ParseFailed {
        reason: e.to_string(),
      }
    })?;
    let shaper = rustybuzz::Face::from_slice(static_data, face_index).ok_or_else(|| {
      FontError::ShaperInitFailed {
        reason: "face rejected by rustybuzz".to_string(),
      }
    })?;
    let properties = FontProperties::from_face(&face);

    Ok(Self {
      data,
      face,
      shaper,
      properties,
      sdf_px: DEFAULT_SDF_PX,
    })
  }

  pub fn face(&self) -> &ttf_parser::Face<'static> {
    &self.face
  }

  pub fn shaper(&self) -> &rustybuzz::Face<'static> {
    &self.shaper
  }

  pub fn data(&self) -> Arc<Vec<u8>> {
    Arc::clone(&self.data)
  }

  pub fn properties(&self) -> &FontProperties {
    &self.properties
  }

  /// Pixel size used when rasterizing this font's glyphs into the cache.
  pub fn sdf_px(&self) -> u32 {
    self.sdf_px
  }

  pub fn glyph_index(&self, c: char) -> Option<u16> {
    self.face.glyph_index(c).map(|g| g.0)
  }

  pub fn has_glyph(&self, c: char) -> bool {
    self.face.glyph_index(c).is_some()
  }
}

impl fmt::Debug for FontRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FontRecord")
      .field("bytes", &self.data.len())
      .field("glyphs", &self.face.number_of_glyphs())
      .field("sdf_px", &self.sdf_px)
      .finish()
  }
}

/// The font registry: id allocation, records, fallback chains, default font.
#[derive(Default)]
pub struct FontRegistry {
  fonts: BTreeMap<FontId, FontRecord>,
  fallback_chains: FxHashMap<FontId, Vec<FontId>>,
  default_font: Option<FontId>,
  next_id: u32,
}

impl FontRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Loads a font file from disk. `face_index` selects a face within a
  /// collection; indices past the end of the file are rejected.
  ///
  /// The first successfully loaded font becomes the default font.
  pub fn load_font(&mut self, path: impl AsRef<Path>, face_index: u32) -> Result<FontId> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let id = self.load_font_from_bytes(bytes, face_index)?;
    debug!("loaded font {} from {}", id, path.display());
    Ok(id)
  }

  /// Loads a font from an in-memory buffer.
  pub fn load_font_from_bytes(&mut self, bytes: impl Into<Vec<u8>>, face_index: u32) -> Result<FontId> {
    let data = Arc::new(bytes.into());

    let face_count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);
    if face_index >= face_count {
      return Err(
        FontError::FaceIndexOutOfRange {
          index: face_index,
        }
        .into(),
      );
    }

    let record = FontRecord::parse(data, face_index)?;
    let id = FontId(self.next_id);
    self.next_id += 1;
    self.fonts.insert(id, record);
    if self.default_font.is_none() {
      self.default_font = Some(id);
    }
    Ok(id)
  }

  /// Unloads a font, removing it from every fallback chain. The caller is
  /// responsible for evicting its cached glyphs (the engine facade does).
  pub fn unload_font(&mut self, id: FontId) {
    if self.fonts.remove(&id).is_none() {
      return;
    }
    self.fallback_chains.remove(&id);
    for chain in self.fallback_chains.values_mut() {
      chain.retain(|f| *f != id);
    }
    if self.default_font == Some(id) {
      self.default_font = self.fonts.keys().next().copied();
    }
    debug!("unloaded {}", id);
  }

  pub fn is_valid(&self, id: FontId) -> bool {
    self.fonts.contains_key(&id)
  }

  pub fn record(&self, id: FontId) -> Option<&FontRecord> {
    self.fonts.get(&id)
  }

  pub fn default_font(&self) -> Option<FontId> {
    self.default_font
  }

  /// Sets the default font. `None` clears it; an unknown id is ignored with
  /// a warning.
  pub fn set_default_font(&mut self, id: Option<FontId>) {
    match id {
      Some(f) if !self.is_valid(f) => warn!("set_default_font: unknown {}", f),
      other => self.default_font = other,
    }
  }

  /// Sets the ordered fallback chain consulted when `primary` lacks a
  /// glyph. Unknown fonts in the chain are skipped with a warning.
  pub fn set_fallback_chain(&mut self, primary: FontId, chain: &[FontId]) {
    if !self.is_valid(primary) {
      warn!("set_fallback_chain: unknown primary {}", primary);
      return;
    }
    let valid: Vec<FontId> = chain
      .iter()
      .copied()
      .filter(|f| {
        let ok = self.is_valid(*f);
        if !ok {
          warn!("set_fallback_chain: skipping unknown {} for {}", f, primary);
        }
        ok
      })
      .collect();
    self.fallback_chains.insert(primary, valid);
  }

  pub fn fallback_chain(&self, primary: FontId) -> &[FontId] {
    self
      .fallback_chains
      .get(&primary)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  /// Whether `font` (optionally including its fallback chain and the engine
  /// default) maps `cp` to a real glyph.
  pub fn is_codepoint_available(&self, font: FontId, cp: char, include_fallback: bool) -> bool {
    self.resolve_codepoint(font, cp, include_fallback).is_some()
  }

  /// Returns the first font in the `font` → chain → default ladder that
  /// covers `cp`.
  pub fn resolve_codepoint(
    &self,
    font: FontId,
    cp: char,
    include_fallback: bool,
  ) -> Option<FontId> {
    if let Some(record) = self.fonts.get(&font) {
      if record.has_glyph(cp) {
        return Some(font);
      }
    }
    let mut default_in_chain = false;
    if include_fallback {
      for fb in self.fallback_chain(font) {
        if Some(*fb) == self.default_font {
          default_in_chain = true;
        }
        if let Some(record) = self.fonts.get(fb) {
          if record.has_glyph(cp) {
            return Some(*fb);
          }
        }
      }
    }
    match self.default_font {
      Some(d) if d != font && !default_in_chain => {
        self.fonts.get(&d).filter(|r| r.has_glyph(cp)).map(|_| d)
      }
      _ => None,
    }
  }

  /// Font-wide properties, or defaults for an unknown id.
  pub fn properties(&self, id: FontId) -> FontProperties {
    match self.fonts.get(&id) {
      Some(r) => *r.properties(),
      None => {
        warn!("properties: unknown {}", id);
        FontProperties::default()
      }
    }
  }

  /// Metrics scaled to `font_size`. An unknown font or non-positive size
  /// yields sentinel metrics rather than an error.
  pub fn scaled_metrics(&self, id: FontId, font_size: f32) -> ScaledFontMetrics {
    if font_size <= 0.0 {
      warn!("scaled_metrics: non-positive size {} for {}", font_size, id);
      return ScaledFontMetrics::fallback(font_size);
    }
    match self.fonts.get(&id) {
      Some(r) => r.properties().scale(font_size),
      None => ScaledFontMetrics::fallback(font_size),
    }
  }

  /// Overrides the pixel size used when caching this font's glyph bitmaps.
  pub fn set_sdf_px_hint(&mut self, id: FontId, px: u32) {
    match self.fonts.get_mut(&id) {
      Some(r) if px > 0 => r.sdf_px = px,
      Some(_) => warn!("set_sdf_px_hint: ignoring zero hint for {}", id),
      None => warn!("set_sdf_px_hint: unknown {}", id),
    }
  }

  /// Ids of all loaded fonts, in load order.
  pub fn font_ids(&self) -> impl Iterator<Item = FontId> + '_ {
    self.fonts.keys().copied()
  }

  pub fn len(&self) -> usize {
    self.fonts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.fonts.is_empty()
  }
}

impl fmt::Debug for FontRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FontRegistry")
      .field("fonts", &self.fonts.len())
      .field("default", &self.default_font)
      .finish()
  }
}
