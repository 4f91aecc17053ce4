//! The consumed surface of the external texture atlas.
//!
//! The atlas owns texture allocation, packing and growth; this subsystem
//! only clears it and feeds it positioned RGBA items whenever the engine
//! reports a changed frame.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

/// A reusable RGBA8 staging buffer for converted engine images.
///
/// [`resize`](Self::resize) reallocates only when the dimensions actually
/// change, so converting a run of equally-sized images touches the
/// allocator once.
#[derive(Debug, Default)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(width as usize * height as usize * 4, 0);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel row `y` as RGBA byte quads.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let stride = self.width as usize * 4;
        let start = y as usize * stride;
        &mut self.data[start..start + stride]
    }
}

/// Interface of the atlas the playback loop hands to
/// [`SubtitleRenderer::get_data`](crate::renderer::SubtitleRenderer::get_data).
pub trait TextureAtlas {
    /// Discards all current items. Called once per changed frame before
    /// re-adding the frame's images.
    fn clear_content(&mut self);

    /// Ensures the backing texture is large enough for the items about to
    /// be added, growing and repacking it if needed.
    fn check_texture_size(&mut self);

    /// Copies one converted image into the atlas at `target`.
    fn add_item(&mut self, pixels: &PixelBuffer, target: Rect);
}
