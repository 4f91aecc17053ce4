use std::cell::RefCell;

use thiserror::Error;

use crate::engine::EngineError;

/// Failures that can occur while constructing a subtitle renderer.
///
/// Runtime ingestion and rasterization are deliberately infallible from the
/// caller's point of view: a contended decoder lock or an engine hiccup
/// degrades to a frame of stale subtitles, never to an error. Lock
/// contention is therefore not represented here at all, it is the
/// [`AtlasStatus::Unchanged`](crate::renderer::AtlasStatus) branch.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Out of memory while allocating subtitle renderer state")]
    Allocation,
    #[error("Layout engine has not been installed into the library")]
    NotInitialized,
    #[error("Failed to initialize layout engine {what}")]
    BackendInit {
        what: &'static str,
        #[source]
        source: EngineError,
    },
}

struct LastError {
    message: String,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<LastError>> = const { RefCell::new(None) };
}

/// Returns the message recorded by the most recent failure on this thread,
/// if any, without clearing it.
pub fn last_error() -> Option<String> {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map(|e| e.message.clone()))
}

/// Takes the message recorded by the most recent failure on this thread.
pub fn take_last_error() -> Option<String> {
    LAST_ERROR.with(|slot| slot.borrow_mut().take().map(|e| e.message))
}

fn fill_last_error(error: &RendererError) {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(LastError { message }));
}

/// Records `error` in the thread's last-error slot and returns it, so
/// construction failure paths read as `return fail(...)`.
pub(crate) fn fail<T>(error: RendererError) -> Result<T, RendererError> {
    fill_last_error(&error);
    Err(error)
}
