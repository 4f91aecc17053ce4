//! Backend-agnostic subtitle renderer lifecycle.
//!
//! A [`SubtitleRenderer`] is the one handle the playback session owns per
//! active subtitle stream. It dispatches the four-operation contract
//! (`run`, `get_data`, `set_size`, `close`) to whichever backend variant
//! it was constructed with; backends are added as [`Backend`] variants
//! rather than as a function-pointer table.

use std::sync::Arc;

use crate::{
    ass::AssRenderer,
    atlas::{PixelBuffer, Rect, TextureAtlas},
    decoder::{Decoder, SubtitlePayload},
    engine::LayoutEngine,
};

/// What [`SubtitleRenderer::get_data`] did to the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum AtlasStatus {
    /// Nothing changed since the previous query (or the decoder lock was
    /// contended); the atlas and the previously uploaded texture remain
    /// valid as-is.
    Unchanged,
    /// The atlas was cleared and repopulated and needs re-upload.
    Updated,
}

/// A rendered result packet for backends that return their output to the
/// caller instead of ingesting into internal track state.
///
/// The ASS backend never produces one; callers of [`SubtitleRenderer::run`]
/// must tolerate `None`.
#[derive(Debug)]
pub struct SubtitlePacket {
    pub start_pts: f64,
    pub end_pts: f64,
    pub target: Rect,
    pub pixels: PixelBuffer,
}

pub(crate) enum Backend<E: LayoutEngine> {
    Ass(AssRenderer<E>),
}

/// One subtitle stream's renderer, owned exclusively by the playback
/// session for the lifetime of that stream's playback.
pub struct SubtitleRenderer<E: LayoutEngine> {
    decoder: Arc<dyn Decoder>,
    backend: Backend<E>,
}

impl<E: LayoutEngine> SubtitleRenderer<E> {
    pub(crate) fn new(decoder: Arc<dyn Decoder>, backend: Backend<E>) -> Self {
        Self { decoder, backend }
    }

    /// Feeds one decoded payload to the backend.
    ///
    /// `pts` is the payload's display-relative start offset, `start` and
    /// `end` its absolute stream times in seconds. Ingestion is
    /// opportunistic: if the decoder's output lock is contended this call
    /// is a no-op and the decoder re-delivers the payload on a later
    /// frame.
    pub fn run(
        &mut self,
        payload: &SubtitlePayload,
        pts: f64,
        start: f64,
        end: f64,
    ) -> Option<SubtitlePacket> {
        match &mut self.backend {
            Backend::Ass(ass) => {
                ass.render(&*self.decoder, payload, pts, start, end);
                None
            }
        }
    }

    /// Rasterizes the stream at `current_pts` seconds into `atlas`.
    ///
    /// Returns [`AtlasStatus::Unchanged`] without touching the atlas when
    /// the engine reports no visible change, which is the common case and
    /// the primary performance guard.
    pub fn get_data(&mut self, atlas: &mut dyn TextureAtlas, current_pts: f64) -> AtlasStatus {
        match &mut self.backend {
            Backend::Ass(ass) => ass.get_data(&*self.decoder, atlas, current_pts),
        }
    }

    /// Updates the display size subsequent frames are laid out against.
    pub fn set_size(&mut self, width: u32, height: u32) {
        match &mut self.backend {
            Backend::Ass(ass) => ass.set_size(width, height),
        }
    }

    /// Releases all backend resources.
    ///
    /// Consuming the handle makes double-close unrepresentable; backend
    /// state drops in declaration order, releasing the engine track before
    /// its session.
    pub fn close(self) {}
}
