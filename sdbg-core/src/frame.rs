//! Owned frame snapshots and the trace events the host reports against them.
//!
//! The engine never borrows a live interpreter frame past the callback that
//! produced it: a blocked controller's suspension latch must outlive the
//! host's stack frame, which a borrowed reference cannot do. Instead every
//! observed activation is captured once, immutably, into a [`FrameSnapshot`]
//! linked to its caller, with a synthetic [`FrameId`] standing in for host
//! frame-object identity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic token identifying one call activation, assigned by the host
/// adapter at the `call` event and carried forward on later events for the
/// same activation. Stands in for host frame-object identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

/// Process-wide allocator for [`FrameId`] values. Lives here (not per-host)
/// so that frame identity stays globally unambiguous even if the host
/// adapter manages multiple interpreter instances, one per debuggee thread.
static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

impl FrameId {
    /// Allocate a fresh, never-reused token.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// An immutable, owned snapshot of one call activation.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub id: FrameId,
    pub file_path: Arc<str>,
    pub line: u32,
    pub parent: Option<Arc<FrameSnapshot>>,
}

impl FrameSnapshot {
    #[must_use]
    pub fn new(id: FrameId, file_path: impl Into<Arc<str>>, line: u32, parent: Option<Arc<FrameSnapshot>>) -> Self {
        Self {
            id,
            file_path: file_path.into(),
            line,
            parent,
        }
    }

    /// Basename of `file_path`, used for engine-ignore-set comparisons and
    /// for `stack()`'s `(basename, line)` pairs.
    #[must_use]
    pub fn basename(&self) -> &str {
        self.file_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.file_path)
    }
}

/// The trace events the host interpreter reports. Mirrors the classic
/// four-event trace model (`call`/`line`/`return`/`exception`); any other
/// host-native event is filtered out by the caller before reaching the
/// engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    Call,
    Line,
    Return,
    Exception,
}

/// What the engine tells the host to do with the trace hook going forward,
/// returned from `on_trace`/`on_trace_root`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceDisposition {
    /// Keep invoking the trace hook for subsequent events on this thread.
    Continue,
    /// Stop invoking the trace hook for this thread (it has terminated).
    Disable,
}
