//! The consumed interface of the external demuxer/decoder.
//!
//! The decoder owns the queue of decoded subtitle payloads and the mutex
//! guarding it. Renderers only ever touch the engine track while holding
//! that lock, and only try-acquire it: a contended frame simply keeps the
//! previous subtitle content on screen.

use std::sync::{Mutex, MutexGuard};

use crate::atlas::Rect;

/// The mutual-exclusion lock over the decoder's output region.
///
/// Acquisition is non-blocking by design; the absent guard is a normal
/// control-flow branch, not an error.
#[derive(Debug, Default)]
pub struct OutputLock {
    inner: Mutex<()>,
}

impl OutputLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_guard(&self) -> Option<OutputLockGuard<'_>> {
        self.inner.try_lock().ok().map(OutputLockGuard)
    }
}

/// Held for the duration of one ingestion or rasterization critical
/// section; released on drop on every exit path.
pub struct OutputLockGuard<'a>(#[allow(dead_code)] MutexGuard<'a, ()>);

/// Interface the playback pipeline's decoder exposes to this subsystem.
pub trait Decoder {
    fn output_lock(&self) -> &OutputLock;

    /// The demuxed stream table, used to find embedded font attachments.
    fn streams(&self) -> &[StreamInfo] {
        &[]
    }

    /// Format-specific out-of-band styling header, fed to the engine track
    /// once before any payload.
    fn subtitle_header(&self) -> Option<&[u8]> {
        None
    }

    /// Records the renderer's last-known clock position, read back by the
    /// playback loop for drift detection.
    fn set_clock_position(&self, pts: f64);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    Attachment,
    Other,
}

/// Per-stream codec metadata, the subset of the demuxer's stream table
/// this subsystem inspects.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub kind: StreamKind,
    /// Media type of the stream's data, e.g. `font/ttf` for attachments.
    pub media_type: Option<String>,
    /// The `filename` metadata tag, present on file attachments.
    pub filename: Option<String>,
    /// Codec extradata; for attachments this is the embedded file itself.
    pub extradata: Box<[u8]>,
}

const FONT_MEDIA_TYPES: &[&str] = &[
    "font/ttf",
    "font/otf",
    "font/sfnt",
    "font/woff",
    "font/woff2",
    "application/x-font",
    "application/x-font-ttf",
    "application/x-font-truetype",
    "application/x-truetype-font",
    "application/x-font-opentype",
    "application/font-sfnt",
    "application/font-woff",
    "application/vnd.ms-opentype",
];

const FONT_EXTENSIONS: &[&str] = &[".ttf", ".otf", ".ttc"];

impl StreamInfo {
    /// Whether this is an attachment stream carrying an embedded font,
    /// recognized by media type or by the filename tag's extension.
    pub fn is_font_attachment(&self) -> bool {
        if self.kind != StreamKind::Attachment {
            return false;
        }
        if let Some(media_type) = self.media_type.as_deref() {
            if FONT_MEDIA_TYPES
                .iter()
                .any(|t| media_type.eq_ignore_ascii_case(t))
            {
                return true;
            }
        }
        if let Some(filename) = self.filename.as_deref() {
            let filename = filename.to_ascii_lowercase();
            return FONT_EXTENSIONS.iter().any(|ext| filename.ends_with(ext));
        }
        false
    }
}

/// One decoded subtitle payload, a set of regions sharing a presentation
/// window. Owned by the decoder; renderers read it only inside the output
/// lock's critical section and never retain references past it.
#[derive(Debug, Clone, Default)]
pub struct SubtitlePayload {
    pub regions: Vec<SubtitleRegion>,
}

/// A single region of a payload.
///
/// The variant declares which backend can ingest it: the ASS backend only
/// consumes [`Markup`](SubtitleRegion::Markup) regions and ignores the
/// rest.
#[derive(Debug, Clone)]
pub enum SubtitleRegion {
    /// Engine-native markup text.
    Markup { text: String },
    /// A pre-rendered bitmap region, for bitmap-subtitle backends.
    Bitmap { target: Rect, pixels: Vec<u8> },
}

impl SubtitleRegion {
    pub fn markup(&self) -> Option<&str> {
        match self {
            SubtitleRegion::Markup { text } => Some(text),
            SubtitleRegion::Bitmap { .. } => None,
        }
    }
}
