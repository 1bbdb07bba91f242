//! Glyph atlas pages and shelf packing
//!
//! An atlas page is a grayscale CPU image mirrored by a GPU texture; glyphs
//! pack into it with a shelf algorithm (advance a pen along the current
//! row, wrap to a new row when the glyph does not fit, append a page when
//! the row does not fit either). Packed rectangles are never reclaimed or
//! repacked: that keeps render info stable for the lifetime of the page, at
//! the cost of fragmentation. `clear` is the only operation that frees
//! pages.
//!
//! GPU texture creation and sub-region uploads go through the
//! [`TextureBackend`] seam so the engine core stays independent of the
//! graphics API; [`NullTextureBackend`] serves headless use and tests.

use crate::geometry::Rect;
use log::warn;

/// Default atlas page dimensions.
pub const DEFAULT_PAGE_SIZE: u32 = 1024;

/// Opaque handle to a GPU texture owned by the engine's backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// The GPU seam: texture lifecycle and sub-region uploads.
///
/// Uploaded glyph textures must be sampled with bilinear filtering; SDF
/// reconstruction depends on it.
pub trait TextureBackend {
  /// Creates a grayscale (single channel) texture of the given size.
  fn create_texture(&mut self, width: u32, height: u32) -> TextureId;

  /// Uploads `pixels` (row-major, `width * height` bytes) into the
  /// sub-region at (`x`, `y`).
  fn upload(&mut self, texture: TextureId, x: u32, y: u32, width: u32, height: u32, pixels: &[u8]);

  /// Destroys a texture previously created by this backend.
  fn destroy_texture(&mut self, texture: TextureId);
}

/// Backend that allocates ids but talks to no GPU. Used headless.
#[derive(Debug, Default)]
pub struct NullTextureBackend {
  next: u64,
}

impl TextureBackend for NullTextureBackend {
  fn create_texture(&mut self, _width: u32, _height: u32) -> TextureId {
    self.next += 1;
    TextureId(self.next)
  }

  fn upload(&mut self, _t: TextureId, _x: u32, _y: u32, _w: u32, _h: u32, _p: &[u8]) {}

  fn destroy_texture(&mut self, _t: TextureId) {}
}

/// One atlas page: CPU image plus its GPU mirror.
pub struct AtlasPage {
  texture: TextureId,
  image: Vec<u8>,
  width: u32,
  height: u32,
}

impl AtlasPage {
  pub fn texture(&self) -> TextureId {
    self.texture
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  /// The CPU-side grayscale image, row-major.
  pub fn image(&self) -> &[u8] {
    &self.image
  }

  fn blit(&mut self, x: u32, y: u32, w: u32, h: u32, pixels: &[u8]) {
    for row in 0..h {
      let dst_start = ((y + row) * self.width + x) as usize;
      let src_start = (row * w) as usize;
      self.image[dst_start..dst_start + w as usize]
        .copy_from_slice(&pixels[src_start..src_start + w as usize]);
    }
  }
}

/// Where a packed glyph landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackedRect {
  pub page: usize,
  pub texture: TextureId,
  pub rect: Rect,
}

/// Shelf packer across an ordered list of atlas pages.
pub struct AtlasStore {
  backend: Box<dyn TextureBackend>,
  pages: Vec<AtlasPage>,
  pen_x: u32,
  pen_y: u32,
  row_height: u32,
  page_width: u32,
  page_height: u32,
}

impl AtlasStore {
  pub fn new(backend: Box<dyn TextureBackend>, page_width: u32, page_height: u32) -> Self {
    Self {
      backend,
      pages: Vec::new(),
      pen_x: 0,
      pen_y: 0,
      row_height: 0,
      page_width: page_width.max(1),
      page_height: page_height.max(1),
    }
  }

  pub fn page_width(&self) -> u32 {
    self.page_width
  }

  pub fn page_height(&self) -> u32 {
    self.page_height
  }

  pub fn page_count(&self) -> usize {
    self.pages.len()
  }

  pub fn page(&self, index: usize) -> Option<&AtlasPage> {
    self.pages.get(index)
  }

  /// Packs a bitmap into the atlas, copying it into both the CPU image and
  /// the GPU texture. Returns `None` (with a warning) for bitmaps larger
  /// than a page in either dimension.
  pub fn pack(&mut self, width: u32, height: u32, pixels: &[u8]) -> Option<PackedRect> {
    if width == 0 || height == 0 {
      return None;
    }
    if width > self.page_width || height > self.page_height {
      warn!(
        "glyph bitmap {}x{} exceeds atlas page {}x{}, dropping",
        width, height, self.page_width, self.page_height
      );
      return None;
    }

    if self.pages.is_empty() {
      self.push_page();
    } else if self.pen_x + width > self.page_width || self.pen_y + height > self.page_height {
      // Does not fit at the pen: wrap to the next shelf row, or append a
      // page when the row would fall off the bottom.
      if self.pen_y + self.row_height + height <= self.page_height {
        self.pen_x = 0;
        self.pen_y += self.row_height;
        self.row_height = 0;
      } else {
        self.push_page();
      }
    }

    let page_index = self.pages.len() - 1;
    let x = self.pen_x;
    let y = self.pen_y;
    let page = &mut self.pages[page_index];
    page.blit(x, y, width, height, pixels);
    let texture = page.texture();
    self
      .backend
      .upload(texture, x, y, width, height, pixels);

    self.pen_x += width;
    self.row_height = self.row_height.max(height);

    Some(PackedRect {
      page: page_index,
      texture,
      rect: Rect::new(x as f32, y as f32, width as f32, height as f32),
    })
  }

  fn push_page(&mut self) {
    let texture = self.backend.create_texture(self.page_width, self.page_height);
    self.pages.push(AtlasPage {
      texture,
      image: vec![0; (self.page_width * self.page_height) as usize],
      width: self.page_width,
      height: self.page_height,
    });
    self.pen_x = 0;
    self.pen_y = 0;
    self.row_height = 0;
  }

  /// Destroys every page and its GPU texture.
  pub fn clear(&mut self) {
    for page in self.pages.drain(..) {
      self.backend.destroy_texture(page.texture);
    }
    self.pen_x = 0;
    self.pen_y = 0;
    self.row_height = 0;
  }

  /// Changes page dimensions. The caller clears the cache first; existing
  /// pages are destroyed here.
  pub fn set_page_size(&mut self, width: u32, height: u32) {
    self.clear();
    self.page_width = width.max(1);
    self.page_height = height.max(1);
  }
}

impl std::fmt::Debug for AtlasStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AtlasStore")
      .field("pages", &self.pages.len())
      .field("page_size", &(self.page_width, self.page_height))
      .field("pen", &(self.pen_x, self.pen_y))
      .finish()
  }
}
