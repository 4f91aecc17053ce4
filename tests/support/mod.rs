//! Fake collaborators for driving the renderer without a real engine,
//! demuxer or GPU atlas.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use subplate::{
    atlas::{PixelBuffer, Rect, TextureAtlas},
    decoder::{Decoder, OutputLock, StreamInfo, SubtitlePayload, SubtitleRegion},
    engine::{
        EngineError, EngineImage, FontHinting, LayoutEngine, RasterizerSession, RenderedFrame,
        TextTrack,
    },
};

/// Shared observable state of a [`FakeEngine`], kept by the test while the
/// engine itself is moved into the library.
#[derive(Default)]
pub struct EngineState {
    pub live_sessions: AtomicUsize,
    pub live_tracks: AtomicUsize,
    /// Engine-side release order, "track" / "session" entries.
    pub drop_log: Mutex<Vec<&'static str>>,
    /// Filenames of registered embedded fonts.
    pub fonts: Mutex<Vec<String>>,
    /// Track ingestion log: "header" and "chunk" entries in call order.
    pub track_log: Mutex<Vec<String>>,
    /// Setter values of the most recently configured session.
    pub session_config: Mutex<SessionConfig>,

    pub fail_create_session: AtomicBool,
    pub fail_create_track: AtomicBool,
    pub fail_process_header: AtomicBool,
    pub fail_register_font: AtomicBool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SessionConfig {
    pub storage_size: (u32, u32),
    pub frame_size: (u32, u32),
    pub default_font: String,
    pub hinting: FontHinting,
}

pub struct FakeEngine {
    pub state: Arc<EngineState>,
}

impl FakeEngine {
    pub fn new() -> (Self, Arc<EngineState>) {
        let state = Arc::new(EngineState::default());
        (
            Self {
                state: state.clone(),
            },
            state,
        )
    }
}

impl LayoutEngine for FakeEngine {
    type Session = FakeSession;
    type Track = FakeTrack;

    fn create_session(&self) -> Result<FakeSession, EngineError> {
        if self.state.fail_create_session.load(Ordering::Relaxed) {
            return Err(EngineError::new("session init refused"));
        }
        self.state.live_sessions.fetch_add(1, Ordering::Relaxed);
        Ok(FakeSession {
            state: self.state.clone(),
            frame_size: (0, 0),
            last_signature: None,
        })
    }

    fn create_track(&self) -> Result<FakeTrack, EngineError> {
        if self.state.fail_create_track.load(Ordering::Relaxed) {
            return Err(EngineError::new("track init refused"));
        }
        self.state.live_tracks.fetch_add(1, Ordering::Relaxed);
        Ok(FakeTrack {
            state: self.state.clone(),
            chunks: Vec::new(),
        })
    }

    fn register_font(&self, filename: &str, data: &[u8]) -> Result<(), EngineError> {
        if self.state.fail_register_font.load(Ordering::Relaxed) {
            return Err(EngineError::new("font rejected"));
        }
        assert!(!data.is_empty(), "font registered without data");
        self.state.fonts.lock().unwrap().push(filename.to_string());
        Ok(())
    }
}

pub struct FakeSession {
    state: Arc<EngineState>,
    frame_size: (u32, u32),
    /// Visible content + frame size of the previous query, for the
    /// changed flag.
    last_signature: Option<(Vec<String>, (u32, u32))>,
}

impl RasterizerSession for FakeSession {
    type Track = FakeTrack;

    fn set_storage_size(&mut self, width: u32, height: u32) {
        self.state.session_config.lock().unwrap().storage_size = (width, height);
    }

    fn set_frame_size(&mut self, width: u32, height: u32) {
        self.frame_size = (width, height);
        self.state.session_config.lock().unwrap().frame_size = (width, height);
    }

    fn set_default_font(&mut self, family: &str) {
        self.state.session_config.lock().unwrap().default_font = family.to_string();
    }

    fn set_hinting(&mut self, hinting: FontHinting) {
        self.state.session_config.lock().unwrap().hinting = hinting;
    }

    fn render_frame(&mut self, track: &mut FakeTrack, now_ms: i64) -> RenderedFrame {
        let active: Vec<String> = track
            .chunks
            .iter()
            .filter(|c| c.start_ms <= now_ms && now_ms < c.end_ms)
            .map(|c| c.text.clone())
            .collect();

        let signature = (active.clone(), self.frame_size);
        let changed = self.last_signature.as_ref() != Some(&signature);
        self.last_signature = Some(signature);

        let (frame_w, frame_h) = self.frame_size;
        let images = active
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let width = (text.len() as u32 * 4).max(1);
                let height = 4;
                EngineImage {
                    dst_x: (frame_w / 2) as i32,
                    dst_y: frame_h as i32 - 20 * (i as i32 + 1),
                    width,
                    height,
                    stride: width as usize,
                    color: 0xFFFFFF00,
                    bitmap: vec![255; (width * height) as usize],
                }
            })
            .collect();

        RenderedFrame { images, changed }
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.state.live_sessions.fetch_sub(1, Ordering::Relaxed);
        self.state.drop_log.lock().unwrap().push("session");
    }
}

struct Chunk {
    text: String,
    start_ms: i64,
    end_ms: i64,
}

pub struct FakeTrack {
    state: Arc<EngineState>,
    chunks: Vec<Chunk>,
}

impl TextTrack for FakeTrack {
    fn process_header(&mut self, header: &[u8]) -> Result<(), EngineError> {
        if self.state.fail_process_header.load(Ordering::Relaxed) {
            return Err(EngineError::new("bad subtitle header"));
        }
        assert!(
            self.chunks.is_empty(),
            "header must precede all payload chunks"
        );
        self.state
            .track_log
            .lock()
            .unwrap()
            .push(format!("header {} bytes", header.len()));
        Ok(())
    }

    fn process_chunk(&mut self, markup: &str, start_ms: i64, end_ms: i64) {
        self.state
            .track_log
            .lock()
            .unwrap()
            .push(format!("chunk {markup:?} [{start_ms}, {end_ms})"));
        self.chunks.push(Chunk {
            text: markup.to_string(),
            start_ms,
            end_ms,
        });
    }
}

impl Drop for FakeTrack {
    fn drop(&mut self) {
        self.state.live_tracks.fetch_sub(1, Ordering::Relaxed);
        self.state.drop_log.lock().unwrap().push("track");
    }
}

#[derive(Default)]
pub struct FakeDecoder {
    pub lock: OutputLock,
    pub streams: Vec<StreamInfo>,
    pub header: Option<Vec<u8>>,
    pub clock: Mutex<Option<f64>>,
}

impl FakeDecoder {
    pub fn clock_position(&self) -> Option<f64> {
        *self.clock.lock().unwrap()
    }
}

impl Decoder for FakeDecoder {
    fn output_lock(&self) -> &OutputLock {
        &self.lock
    }

    fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    fn subtitle_header(&self) -> Option<&[u8]> {
        self.header.as_deref()
    }

    fn set_clock_position(&self, pts: f64) {
        *self.clock.lock().unwrap() = Some(pts);
    }
}

/// Records every atlas interaction so tests can assert the atlas was (or
/// was not) touched.
#[derive(Default)]
pub struct RecordingAtlas {
    pub clears: usize,
    pub size_checks: usize,
    pub items: Vec<(Rect, Vec<u8>)>,
}

impl TextureAtlas for RecordingAtlas {
    fn clear_content(&mut self) {
        self.clears += 1;
        self.items.clear();
    }

    fn check_texture_size(&mut self) {
        self.size_checks += 1;
    }

    fn add_item(&mut self, pixels: &PixelBuffer, target: Rect) {
        assert_eq!(pixels.width(), target.w);
        assert_eq!(pixels.height(), target.h);
        self.items.push((target, pixels.data().to_vec()));
    }
}

pub fn markup_payload(text: &str) -> SubtitlePayload {
    SubtitlePayload {
        regions: vec![SubtitleRegion::Markup {
            text: text.to_string(),
        }],
    }
}
