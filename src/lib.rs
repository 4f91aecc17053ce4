//! A pluggable subtitle-compositing subsystem for media-playback
//! pipelines.
//!
//! The playback loop feeds decoded subtitle payloads into a
//! [`SubtitleRenderer`] once per delivered packet ([`SubtitleRenderer::run`])
//! and asks it once per displayed frame to (re)composite the stream's
//! glyph bitmaps into a shared texture atlas
//! ([`SubtitleRenderer::get_data`]). Text shaping and rasterization are
//! delegated to an external layout engine consumed through the
//! [`engine`] traits; the demuxer/decoder and the atlas are likewise
//! external and consumed through [`decoder`] and [`atlas`].

use std::{cell::Cell, sync::Arc};

mod ass;
pub mod atlas;
pub mod decoder;
pub mod engine;
mod error;
pub mod renderer;

pub use error::{last_error, take_last_error, RendererError};
pub use renderer::{AtlasStatus, SubtitlePacket, SubtitleRenderer};

use engine::FontHinting;

/// Library initialization flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitFlags {
    /// Initialize network protocol support in the host's demuxer.
    pub network: bool,
    /// Register the host demuxer's container formats.
    pub formats: bool,
}

/// The library handle: process-wide configuration plus the shared layout
/// engine instance, created at library init and passed by reference into
/// renderer construction.
///
/// This replaces the usual global configuration singleton; nothing in the
/// subsystem reaches for implicit global state.
pub struct Library<E> {
    logger: log::RootLogger,
    did_log_version: Cell<bool>,
    init_flags: InitFlags,
    font_hinting: FontHinting,
    thread_count: u32,
    video_buf_frames: u32,
    audio_buf_frames: u32,
    subtitle_buf_frames: u32,
    engine: Option<Arc<E>>,
}

impl<E> Library<E> {
    /// Creates an engine-less handle with the default tunables.
    ///
    /// Subtitle renderers cannot be constructed until an engine is
    /// [installed](Self::install_engine).
    pub fn init(flags: InitFlags) -> Self {
        Self {
            logger: log::RootLogger::new(),
            did_log_version: Cell::new(false),
            init_flags: flags,
            font_hinting: FontHinting::default(),
            thread_count: 1,
            video_buf_frames: 3,
            audio_buf_frames: 64,
            subtitle_buf_frames: 64,
            engine: None,
        }
    }

    /// Installs the shared layout engine instance used by all subsequently
    /// created renderers.
    pub fn install_engine(&mut self, engine: E) {
        self.engine = Some(Arc::new(engine));
    }

    pub fn engine(&self) -> Option<&Arc<E>> {
        self.engine.as_ref()
    }

    pub fn init_flags(&self) -> InitFlags {
        self.init_flags
    }

    pub fn font_hinting(&self) -> FontHinting {
        self.font_hinting
    }

    /// Sets the hinting mode applied to sessions created afterwards.
    pub fn set_font_hinting(&mut self, hinting: FontHinting) {
        self.font_hinting = hinting;
    }

    pub fn thread_count(&self) -> u32 {
        self.thread_count
    }

    pub fn set_thread_count(&mut self, count: u32) {
        self.thread_count = count.max(1);
    }

    pub fn video_buf_frames(&self) -> u32 {
        self.video_buf_frames
    }

    pub fn audio_buf_frames(&self) -> u32 {
        self.audio_buf_frames
    }

    pub fn subtitle_buf_frames(&self) -> u32 {
        self.subtitle_buf_frames
    }

    /// Sets the frame-buffer depths used by the host pipeline's queues.
    /// Zero depths are clamped to one.
    pub fn set_buffer_depths(&mut self, video: u32, audio: u32, subtitle: u32) {
        self.video_buf_frames = video.max(1);
        self.audio_buf_frames = audio.max(1);
        self.subtitle_buf_frames = subtitle.max(1);
    }

    /// Routes log messages into the host player instead of stderr.
    pub fn set_log_callback(&mut self, callback: log::HostLogCallback) {
        self.logger
            .set_message_callback(log::MessageCallback::Host(callback));
    }

    /// True exactly once, for the one-time version log line.
    pub(crate) fn should_log_version(&self) -> bool {
        !self.did_log_version.replace(true)
    }
}

impl<E> log::AsLogger for Library<E> {
    fn as_logger(&self) -> &impl log::Logger {
        &self.logger
    }
}
