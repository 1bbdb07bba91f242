//! Error types for the text engine
//!
//! The layout entry points never fail: soft failures (missing glyphs,
//! oversized bitmaps, unmappable codepoints) produce sentinels and a
//! `log::warn!`, per the engine's best-effort contract. The fallible surface
//! is font loading and engine construction, covered by the types here.
//!
//! All errors use the `thiserror` crate for minimal boilerplate and proper
//! error trait implementations.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
  /// Font loading or parsing error.
  #[error("Font error: {0}")]
  Font(#[from] FontError),

  /// I/O error (reading a font file).
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

/// Errors that occur while loading fonts.
///
/// A font that fails to load leaves no partially-initialized record behind.
#[derive(Error, Debug)]
pub enum FontError {
  /// The font data could not be parsed as a face.
  #[error("Failed to parse font face: {reason}")]
  ParseFailed { reason: String },

  /// The requested face index does not exist in the font file.
  ///
  /// Face 0 is tolerated for single-face files even when a larger index was
  /// requested by mistake; any other out-of-range index is an error.
  #[error("Face index {index} out of range")]
  FaceIndexOutOfRange { index: u32 },

  /// The shaper rejected the face (a face ttf-parser accepts but the
  /// shaping backend cannot use).
  #[error("Failed to initialize shaper face: {reason}")]
  ShaperInitFailed { reason: String },
}
