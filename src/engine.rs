//! The consumed interface of the external text-layout engine.
//!
//! The subsystem never shapes or rasterizes text itself. A host player
//! installs one engine instance into the [`Library`](crate::Library) and the
//! ASS backend drives it through these traits: one [`RasterizerSession`] and
//! one [`TextTrack`] per subtitle stream, both created from the shared
//! instance and torn down together with the renderer.

use thiserror::Error;

/// An engine-side failure, opaque to the subsystem beyond its message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Glyph hinting mode forwarded to the engine's rasterizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FontHinting {
    #[default]
    None,
    Light,
    Normal,
    Native,
}

/// One solid-color layer produced by the engine for a frame.
///
/// The engine encodes a single packed color per image and varies only the
/// per-pixel coverage, so `bitmap` holds one coverage byte per pixel, laid
/// out in `stride`-sized rows of which the first `width` bytes are used.
#[derive(Debug, Clone)]
pub struct EngineImage {
    /// Destination offset inside the frame, in pixels.
    pub dst_x: i32,
    pub dst_y: i32,
    pub width: u32,
    pub height: u32,
    /// Row stride of `bitmap` in bytes, at least `width`.
    pub stride: usize,
    /// Packed `0xRRGGBBAA` color where the alpha byte is *transparency*:
    /// 0x00 is fully opaque.
    pub color: u32,
    pub bitmap: Vec<u8>,
}

impl EngineImage {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The used portion of coverage row `y`.
    pub fn coverage_row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.bitmap[start..start + self.width as usize]
    }
}

/// The engine's output for one queried timestamp.
pub struct RenderedFrame {
    pub images: Vec<EngineImage>,
    /// Whether the visible rendering differs from the previous query.
    /// When false the caller reuses its previously composited output.
    pub changed: bool,
}

/// A process-wide engine instance, shared between all renderers created
/// from one [`Library`](crate::Library).
pub trait LayoutEngine {
    type Session: RasterizerSession<Track = Self::Track>;
    type Track: TextTrack;

    fn create_session(&self) -> Result<Self::Session, EngineError>;

    fn create_track(&self) -> Result<Self::Track, EngineError>;

    /// Registers an embedded font as an addressable font source.
    fn register_font(&self, filename: &str, data: &[u8]) -> Result<(), EngineError>;
}

/// A configured rasterizer bound to one video's dimensions.
///
/// Dropping the session releases the engine-side resources.
pub trait RasterizerSession {
    type Track: TextTrack;

    /// Sets the coded frame size used for storage-resolution effects.
    fn set_storage_size(&mut self, width: u32, height: u32);

    /// Sets the display size subsequent frames are laid out against.
    /// Distinct from the storage size to support anamorphic or scaled
    /// output.
    fn set_frame_size(&mut self, width: u32, height: u32);

    fn set_default_font(&mut self, family: &str);

    fn set_hinting(&mut self, hinting: FontHinting);

    /// Renders the track at `now_ms` and reports whether anything changed
    /// since the previous call.
    fn render_frame(&mut self, track: &mut Self::Track, now_ms: i64) -> RenderedFrame;
}

/// The engine's accumulated subtitle events and styling for one stream.
///
/// Ingestion order is: header once, then chunks in presentation order.
pub trait TextTrack {
    /// Feeds the stream's out-of-band styling header.
    fn process_header(&mut self, header: &[u8]) -> Result<(), EngineError>;

    /// Feeds one timed markup chunk spanning `[start_ms, end_ms)`.
    fn process_chunk(&mut self, markup: &str, start_ms: i64, end_ms: i64);
}
