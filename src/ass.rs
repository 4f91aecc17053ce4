//! The layout-engine-backed (ASS) renderer variant.
//!
//! Wraps one engine rasterizer session and one text track per stream.
//! Payload markup is ingested into the track under the decoder's output
//! lock; rasterization asks the engine for the frame's image list and only
//! touches the atlas when the engine reports a change.

use std::sync::Arc;

use log::{debug, info, warning};

use crate::{
    atlas::{PixelBuffer, Rect, TextureAtlas},
    decoder::{Decoder, SubtitlePayload},
    engine::{EngineImage, LayoutEngine, RasterizerSession, TextTrack},
    error::{self, RendererError},
    renderer::{AtlasStatus, Backend, SubtitleRenderer},
    Library,
};

/// Backend state for one ASS stream.
///
/// Field order is load-bearing: the track must be released before the
/// session it renders through.
pub(crate) struct AssRenderer<E: LayoutEngine> {
    track: E::Track,
    session: E::Session,
}

impl<E: LayoutEngine> SubtitleRenderer<E> {
    /// Creates an ASS subtitle renderer for `decoder`'s subtitle stream.
    ///
    /// `video_width`/`video_height` is the coded frame size, used as the
    /// engine's storage size; `screen_width`/`screen_height` is the
    /// display size frames are laid out against. Requires a layout engine
    /// to have been installed into `library`.
    ///
    /// On failure every engine resource acquired so far is released, the
    /// error is recorded in the thread's last-error slot and no handle is
    /// returned.
    pub fn ass(
        library: &Library<E>,
        decoder: Arc<dyn Decoder>,
        video_width: u32,
        video_height: u32,
        screen_width: u32,
        screen_height: u32,
    ) -> Result<Self, RendererError> {
        if library.should_log_version() {
            info!(
                library,
                concat!("subplate version ", env!("CARGO_PKG_VERSION"))
            );
        }

        let Some(engine) = library.engine() else {
            return error::fail(RendererError::NotInitialized);
        };

        let mut session = match engine.create_session() {
            Ok(session) => session,
            Err(source) => {
                return error::fail(RendererError::BackendInit {
                    what: "rasterizer session",
                    source,
                })
            }
        };

        // Embedded fonts travel as attachment streams; registration is
        // best-effort and a bad font must not abort construction.
        for stream in decoder.streams() {
            if !stream.is_font_attachment() {
                continue;
            }
            let Some(filename) = stream.filename.as_deref() else {
                continue;
            };
            if let Err(err) = engine.register_font(filename, &stream.extradata) {
                warning!(library, "failed to register embedded font {filename:?}: {err}");
            }
        }

        session.set_default_font("sans-serif");
        session.set_storage_size(video_width, video_height);
        session.set_frame_size(screen_width, screen_height);
        session.set_hinting(library.font_hinting());

        let mut track = match engine.create_track() {
            Ok(track) => track,
            Err(source) => {
                // `session` unwinds here; the session/track pair is never
                // half-live.
                return error::fail(RendererError::BackendInit {
                    what: "text track",
                    source,
                });
            }
        };

        // The header carries the stream's styling and must precede any
        // payload chunk.
        if let Some(header) = decoder.subtitle_header() {
            if let Err(source) = track.process_header(header) {
                return error::fail(RendererError::BackendInit {
                    what: "track header",
                    source,
                });
            }
        }

        debug!(
            library,
            "created ASS subtitle renderer \
             (storage {video_width}x{video_height}, frame {screen_width}x{screen_height})"
        );

        Ok(SubtitleRenderer::new(
            decoder,
            Backend::Ass(AssRenderer { track, session }),
        ))
    }
}

impl<E: LayoutEngine> AssRenderer<E> {
    pub(crate) fn render(
        &mut self,
        decoder: &dyn Decoder,
        payload: &SubtitlePayload,
        pts: f64,
        start: f64,
        end: f64,
    ) {
        let start_ms = ((start + pts) * 1000.0) as i64;
        let end_ms = (end * 1000.0) as i64;

        let Some(_guard) = decoder.output_lock().try_guard() else {
            // Contended: the decoder re-delivers this payload later.
            return;
        };

        for region in &payload.regions {
            if let Some(markup) = region.markup() {
                self.track.process_chunk(markup, start_ms, end_ms);
            }
        }
    }

    pub(crate) fn get_data(
        &mut self,
        decoder: &dyn Decoder,
        atlas: &mut dyn TextureAtlas,
        current_pts: f64,
    ) -> AtlasStatus {
        let now = (current_pts * 1000.0) as i64;

        {
            let Some(_guard) = decoder.output_lock().try_guard() else {
                return AtlasStatus::Unchanged;
            };

            let frame = self.session.render_frame(&mut self.track, now);
            if !frame.changed {
                return AtlasStatus::Unchanged;
            }

            atlas.clear_content();
            atlas.check_texture_size();

            let mut staging = PixelBuffer::new();
            for image in &frame.images {
                if image.is_empty() {
                    continue;
                }

                staging.resize(image.width, image.height);
                convert_coverage(image, &mut staging);
                atlas.add_item(
                    &staging,
                    Rect {
                        x: image.dst_x,
                        y: image.dst_y,
                        w: image.width,
                        h: image.height,
                    },
                );
            }
        }

        decoder.set_clock_position(current_pts);
        AtlasStatus::Updated
    }

    pub(crate) fn set_size(&mut self, width: u32, height: u32) {
        self.session.set_frame_size(width, height);
    }
}

/// Expands an engine coverage bitmap into premultiplied RGBA.
///
/// The color channels are constant across the whole image; the packed
/// alpha byte is transparency, so base alpha is its complement and each
/// pixel's final alpha is `base * coverage / 255`.
fn convert_coverage(image: &EngineImage, dst: &mut PixelBuffer) {
    let r = ((image.color >> 24) & 0xFF) as u8;
    let g = ((image.color >> 16) & 0xFF) as u8;
    let b = ((image.color >> 8) & 0xFF) as u8;
    let base_alpha = 0xFF - (image.color & 0xFF) as u16;

    for y in 0..image.height {
        let src = image.coverage_row(y);
        let row = dst.row_mut(y);
        for (coverage, pixel) in src.iter().zip(row.chunks_exact_mut(4)) {
            pixel[0] = r;
            pixel[1] = g;
            pixel[2] = b;
            pixel[3] = ((base_alpha * *coverage as u16) / 255) as u8;
        }
    }
}
