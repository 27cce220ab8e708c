//! The per-thread trace state machine (C4).

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::breakpoints::BreakpointRegistry;
use crate::bus::MessageBus;
use crate::error::{EngineError, Result};
use crate::frame::{FrameSnapshot, TraceDisposition, TraceEvent};
use crate::host::{EvalOutcome, EvalRequest, EvalSink};
use crate::message::Message;

/// Host thread identifier. Stable for the controller's lifetime.
pub type ThreadId = u64;

/// What a controller is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreadState {
    Running,
    Paused,
    Terminated,
}

/// The stepping command currently in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepCommand {
    Run,
    StepOver,
    StepInto,
    StepOut,
}

struct Inner {
    origin_frame: Option<Arc<FrameSnapshot>>,
    current_frame: Option<Arc<FrameSnapshot>>,
    stop_frame: Option<Arc<FrameSnapshot>>,
    command: StepCommand,
    state: ThreadState,
    pending_eval: Option<EvalRequest>,
    eval_result: Option<EvalOutcome>,
}

/// Drives the stepping state machine for one debuggee thread and holds the
/// suspension latch that parks that thread while paused.
pub struct ThreadController {
    pub id: ThreadId,
    pub name: String,
    inner: Mutex<Inner>,
    latch: Condvar,
    message_bus: Arc<MessageBus>,
    breakpoints: Arc<BreakpointRegistry>,
    ignore_set: Arc<HashSet<String>>,
}

impl ThreadController {
    /// Create a controller for a thread first observed in `origin_frame`,
    /// publishing `ThreadStarted`.
    pub fn new(
        id: ThreadId,
        name: String,
        origin_frame: Arc<FrameSnapshot>,
        message_bus: Arc<MessageBus>,
        breakpoints: Arc<BreakpointRegistry>,
        ignore_set: Arc<HashSet<String>>,
    ) -> Arc<Self> {
        let controller = Arc::new(Self {
            id,
            name,
            inner: Mutex::new(Inner {
                origin_frame: Some(origin_frame.clone()),
                current_frame: Some(origin_frame),
                stop_frame: None,
                command: StepCommand::Run,
                state: ThreadState::Running,
                pending_eval: None,
                eval_result: None,
            }),
            latch: Condvar::new(),
            message_bus,
            breakpoints,
            ignore_set,
        });
        controller.message_bus.publish(Message::ThreadStarted { thread_id: id });
        controller
    }

    #[must_use]
    pub fn state(&self) -> ThreadState {
        self.inner.lock().state
    }

    pub fn resume(&self) {
        let mut inner = self.inner.lock();
        inner.stop_frame = None;
        inner.command = StepCommand::Run;
        inner.state = ThreadState::Running;
        self.latch.notify_all();
    }

    pub fn step_over(&self) {
        let mut inner = self.inner.lock();
        inner.stop_frame = inner.current_frame.clone();
        inner.command = StepCommand::StepOver;
        inner.state = ThreadState::Running;
        self.latch.notify_all();
    }

    pub fn step_into(&self) {
        let mut inner = self.inner.lock();
        inner.stop_frame = None;
        inner.command = StepCommand::StepInto;
        inner.state = ThreadState::Running;
        self.latch.notify_all();
    }

    pub fn step_out(&self) {
        let mut inner = self.inner.lock();
        inner.stop_frame = inner.current_frame.clone();
        inner.command = StepCommand::StepOut;
        inner.state = ThreadState::Running;
        self.latch.notify_all();
    }

    /// Idempotent. Publishes `ThreadEnded` the first time it's called.
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        if inner.state == ThreadState::Terminated {
            return;
        }
        inner.origin_frame = None;
        inner.current_frame = None;
        inner.stop_frame = None;
        inner.state = ThreadState::Terminated;
        self.latch.notify_all();
        drop(inner);
        self.message_bus.publish(Message::ThreadEnded { thread_id: self.id });
    }

    /// Outermost frame first, filtered against the engine-ignore set.
    ///
    /// # Errors
    /// Returns [`EngineError::NotSuspended`] unless the controller is
    /// currently `Paused`.
    pub fn stack(&self) -> Result<Vec<(String, u32)>> {
        let inner = self.inner.lock();
        if inner.state != ThreadState::Paused {
            return Err(EngineError::NotSuspended { thread_id: self.id });
        }
        let mut frames = Vec::new();
        let mut cursor = inner.current_frame.clone();
        while let Some(frame) = cursor {
            if !self.ignore_set.contains(frame.basename()) {
                frames.push((frame.basename().to_string(), frame.line));
            }
            cursor = frame.parent.clone();
        }
        frames.reverse();
        Ok(frames)
    }

    /// Evaluate a read-only expression in the suspended frame's bindings.
    ///
    /// # Errors
    /// Returns [`EngineError::NotSuspended`] unless currently `Paused`.
    pub fn evaluate(&self, expression: &str) -> Result<EvalOutcome> {
        self.run_eval_request(EvalRequest::Evaluate(expression.to_string()))
    }

    /// Execute statements in the suspended frame's bindings.
    ///
    /// # Errors
    /// Returns [`EngineError::NotSuspended`] unless currently `Paused`.
    pub fn execute(&self, statements: &str) -> Result<EvalOutcome> {
        self.run_eval_request(EvalRequest::Execute(statements.to_string()))
    }

    fn run_eval_request(&self, request: EvalRequest) -> Result<EvalOutcome> {
        let mut inner = self.inner.lock();
        if inner.state != ThreadState::Paused {
            return Err(EngineError::NotSuspended { thread_id: self.id });
        }
        inner.pending_eval = Some(request);
        self.latch.notify_all();
        self.latch
            .wait_while(&mut inner, |inner| inner.pending_eval.is_some());
        Ok(inner
            .eval_result
            .take()
            .unwrap_or(EvalOutcome::Error("no result produced".into())))
    }

    /// Invoked by the host adapter for every trace event on an activation
    /// already owned by this controller.
    ///
    /// `eval_sink` is a closure backed by the host adapter's live
    /// interpreter handle for the duration of this call; it is invoked from
    /// *within* the suspension wait below to answer `evaluate`/`execute`
    /// requests issued by another thread, since only the thread currently
    /// inside this call has a live binding to evaluate against.
    #[instrument(skip(self, eval_sink), fields(thread_id = self.id))]
    pub fn on_trace(
        &self,
        frame: Arc<FrameSnapshot>,
        event: TraceEvent,
        eval_sink: &dyn EvalSink,
    ) -> TraceDisposition {
        let mut inner = self.inner.lock();

        let at_origin = event == TraceEvent::Return
            && inner
                .origin_frame
                .as_ref()
                .is_some_and(|origin| origin.id == frame.id);
        if at_origin {
            drop(inner);
            self.stop();
            return TraceDisposition::Disable;
        }

        if inner.state == ThreadState::Terminated {
            return TraceDisposition::Disable;
        }

        inner.current_frame = Some(frame.clone());

        let mut target: Option<Arc<FrameSnapshot>> = None;
        match event {
            TraceEvent::Return => {
                let same_scope = inner
                    .stop_frame
                    .as_ref()
                    .is_some_and(|stop| stop.id == frame.id);
                if inner.command == StepCommand::StepInto {
                    target = frame.parent.clone();
                } else if matches!(inner.command, StepCommand::StepOver | StepCommand::StepOut)
                    && same_scope
                {
                    target = frame.parent.clone();
                }
                if target.is_some() {
                    inner.current_frame = target.clone();
                }
                if target.is_none() && self.breakpoints.contains(&frame.file_path, frame.line) {
                    target = Some(frame.clone());
                }
            }
            TraceEvent::Line => {
                let same_scope = inner
                    .stop_frame
                    .as_ref()
                    .is_some_and(|stop| stop.id == frame.id);
                if inner.command == StepCommand::StepInto {
                    target = Some(frame.clone());
                } else if inner.command == StepCommand::StepOver && same_scope {
                    target = Some(frame.clone());
                }
                if target.is_none() && self.breakpoints.contains(&frame.file_path, frame.line) {
                    target = Some(frame.clone());
                }
            }
            TraceEvent::Call | TraceEvent::Exception => {}
        }

        let Some(target) = target else {
            return TraceDisposition::Continue;
        };

        inner.state = ThreadState::Paused;
        drop(inner);
        debug!(file = %target.file_path, line = target.line, "thread suspended");
        self.message_bus.publish(Message::ThreadSuspended {
            thread_id: self.id,
            file_path: target.file_path.to_string(),
            line_number: target.line,
        });

        let mut inner = self.inner.lock();
        loop {
            if let Some(request) = inner.pending_eval.take() {
                drop(inner);
                trace!("servicing evaluation request while suspended");
                let outcome = eval_sink(&request);
                inner = self.inner.lock();
                inner.eval_result = Some(outcome);
                self.latch.notify_all();
                continue;
            }
            if inner.state != ThreadState::Paused {
                break;
            }
            self.latch.wait(&mut inner);
        }

        if inner.state == ThreadState::Terminated {
            TraceDisposition::Disable
        } else {
            TraceDisposition::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameId;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn frame(file: &str, line: u32, parent: Option<Arc<FrameSnapshot>>) -> Arc<FrameSnapshot> {
        Arc::new(FrameSnapshot::new(FrameId::next(), file, line, parent))
    }

    fn new_controller() -> (Arc<ThreadController>, Arc<MessageBus>, Arc<BreakpointRegistry>) {
        let bus = Arc::new(MessageBus::new());
        let breakpoints = Arc::new(BreakpointRegistry::new());
        let ignore = Arc::new(HashSet::new());
        let origin = frame("prog.lua", 1, None);
        let controller = ThreadController::new(1, "main".into(), origin, bus.clone(), breakpoints.clone(), ignore);
        (controller, bus, breakpoints)
    }

    fn noop_sink(_req: &EvalRequest) -> EvalOutcome {
        EvalOutcome::Error("unused".into())
    }

    #[test]
    fn return_at_origin_frame_stops_and_disables() {
        let (controller, bus, _bp) = new_controller();
        let origin = controller.inner.lock().origin_frame.clone().unwrap();
        let disposition = controller.on_trace(origin, TraceEvent::Return, &noop_sink);
        assert_eq!(disposition, TraceDisposition::Disable);
        assert_eq!(controller.state(), ThreadState::Terminated);
        let drained = bus.drain();
        assert!(drained.contains(&Message::ThreadEnded { thread_id: 1 }));
    }

    #[test]
    fn breakpoint_hit_suspends_and_resume_continues() {
        let (controller, bus, breakpoints) = new_controller();
        breakpoints.add("prog.lua", 2).unwrap();
        let origin = controller.inner.lock().origin_frame.clone().unwrap();
        let line_frame = frame("prog.lua", 2, origin.parent.clone());

        let controller2 = controller.clone();
        let handle = std::thread::spawn(move || {
            controller2.on_trace(line_frame, TraceEvent::Line, &noop_sink)
        });

        // Wait for suspension to be published, then resume.
        loop {
            if bus
                .drain()
                .into_iter()
                .any(|m| matches!(m, Message::ThreadSuspended { .. }))
            {
                break;
            }
            std::thread::yield_now();
        }
        assert_eq!(controller.state(), ThreadState::Paused);
        controller.resume();
        assert_eq!(handle.join().unwrap(), TraceDisposition::Continue);
    }

    #[test]
    fn stack_fails_when_not_suspended() {
        let (controller, _bus, _bp) = new_controller();
        assert!(matches!(controller.stack(), Err(EngineError::NotSuspended { .. })));
    }
}
