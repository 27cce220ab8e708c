//! Session-level coordinator: owns the breakpoint registry, the message
//! bus, and the table of per-thread controllers (C5).

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{info, instrument, warn};

use crate::breakpoints::{BreakpointRegistry, BreakpointSnapshot};
use crate::bus::MessageBus;
use crate::controller::{ThreadController, ThreadId, ThreadState};
use crate::error::{EngineError, Result};
use crate::frame::{FrameSnapshot, TraceDisposition, TraceEvent};
use crate::host::EvalSink;
use crate::message::Message;

/// Session-wide lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initialized,
    Running,
    Paused,
    Terminated,
}

/// Basenames of this engine's own sources and of the host interpreter's
/// threading primitive, whose `call` events must never be traced.
///
/// The distilled source this engine is modeled on built this list with a
/// missing separator that accidentally concatenated two entries into one;
/// they are kept distinct here.
#[must_use]
pub fn default_engine_ignore_set() -> HashSet<String> {
    [
        "threading.rs",
        "process.rs",
        "engine.rs",
        "serialize.rs",
        "weakref.rs",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Multiplexes trace events across threads and drives the session's
/// overall lifecycle.
pub struct SessionCoordinator {
    pub source_path: PathBuf,
    controllers: DashMap<ThreadId, Arc<ThreadController>>,
    message_bus: Arc<MessageBus>,
    breakpoints: Arc<BreakpointRegistry>,
    ignore_set: Arc<HashSet<String>>,
    state: RwLock<SessionState>,
    terminated: AtomicBool,
}

impl SessionCoordinator {
    #[must_use]
    pub fn new(source_path: impl Into<PathBuf>) -> Arc<Self> {
        Self::with_ignore_set(source_path, default_engine_ignore_set())
    }

    #[must_use]
    pub fn with_ignore_set(source_path: impl Into<PathBuf>, ignore_set: HashSet<String>) -> Arc<Self> {
        Arc::new(Self {
            source_path: source_path.into(),
            controllers: DashMap::new(),
            message_bus: Arc::new(MessageBus::new()),
            breakpoints: Arc::new(BreakpointRegistry::new()),
            ignore_set: Arc::new(ignore_set),
            state: RwLock::new(SessionState::Initialized),
            terminated: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// Idempotent from `Initialized`/`Paused`.
    pub fn start(&self) {
        let mut state = self.state.write();
        if *state != SessionState::Terminated {
            *state = SessionState::Running;
        }
    }

    pub fn resume(&self) {
        {
            let mut state = self.state.write();
            if *state != SessionState::Terminated {
                *state = SessionState::Running;
            }
        }
        for entry in &self.controllers {
            entry.value().resume();
        }
    }

    /// Fire-and-forget: transitions every controller to `Terminated` and
    /// does not wait for in-flight evaluations to finish.
    pub fn stop(&self) {
        *self.state.write() = SessionState::Terminated;
        self.terminated.store(true, Ordering::SeqCst);
        for entry in &self.controllers {
            entry.value().stop();
        }
    }

    /// # Errors
    /// Returns [`EngineError::InvalidArgument`] for an empty path or a
    /// non-positive line number.
    pub fn set_breakpoint(&self, file: &str, line: u32) -> Result<BreakpointSnapshot> {
        self.breakpoints.add(file, line)?;
        Ok(self.breakpoints.snapshot())
    }

    #[must_use]
    pub fn is_breakpoint(&self, file: &str, line: u32) -> bool {
        self.breakpoints.contains(file, line)
    }

    #[must_use]
    pub fn get_messages(&self) -> Vec<Message> {
        self.message_bus.drain()
    }

    /// # Errors
    /// Returns [`EngineError::UnknownThread`] if no controller exists for
    /// `id`.
    pub fn get_thread(&self, id: ThreadId) -> Result<Arc<ThreadController>> {
        self.controllers
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(EngineError::UnknownThread { thread_id: id })
    }

    #[must_use]
    pub fn list_threads(&self) -> Vec<(ThreadId, String, ThreadState)> {
        self.controllers
            .iter()
            .map(|entry| {
                let controller = entry.value();
                (controller.id, controller.name.clone(), controller.state())
            })
            .collect()
    }

    #[must_use]
    pub fn controllers_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// The single entry point the host adapter's trace hook calls for
    /// every event on every thread.
    ///
    /// `current_thread` supplies the host's notion of "which debuggee
    /// thread is this" (id, human-readable name) since the engine has no
    /// portable way to ask the host directly.
    #[instrument(skip(self, frame, eval_sink))]
    pub fn on_trace_root(
        &self,
        current_thread: (ThreadId, &str),
        frame: Arc<FrameSnapshot>,
        event: TraceEvent,
        eval_sink: &dyn EvalSink,
    ) -> TraceDisposition {
        if self.state() == SessionState::Terminated {
            return TraceDisposition::Disable;
        }

        if event == TraceEvent::Call && self.ignore_set.contains(frame.basename()) {
            return TraceDisposition::Disable;
        }

        let (tid, tname) = current_thread;
        let controller = self
            .controllers
            .entry(tid)
            .or_insert_with(|| {
                ThreadController::new(
                    tid,
                    tname.to_string(),
                    frame.clone(),
                    self.message_bus.clone(),
                    self.breakpoints.clone(),
                    self.ignore_set.clone(),
                )
            })
            .clone();

        let disposition = controller.on_trace(frame, event, eval_sink);

        if disposition == TraceDisposition::Disable {
            self.controllers.remove(&tid);
            if self.controllers.is_empty() && self.state() != SessionState::Terminated {
                info!("all controllers terminated, session draining");
            }
        }

        disposition
    }

    /// True once every controller created during this session has
    /// terminated and the session itself has been asked to stop or the
    /// target has run to completion.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.controllers.is_empty()
    }

    #[must_use]
    pub fn breakpoints(&self) -> &BreakpointRegistry {
        &self.breakpoints
    }

    #[must_use]
    pub fn message_bus(&self) -> &MessageBus {
        &self.message_bus
    }
}

/// Absolute path to the directory containing `source_path`, for prepending
/// to the host's module search path (§4.4's session driver).
#[must_use]
pub fn source_directory(source_path: &Path) -> PathBuf {
    source_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
