//! RPC-facing operations (C6): an explicit dispatch surface, not a
//! name-prefix convention.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::breakpoints::BreakpointSnapshot;
use crate::controller::{ThreadId, ThreadState};
use crate::error::Result;
use crate::host::EvalOutcome;
use crate::message::Message;
use crate::session::SessionCoordinator;

/// One remote method call, as deserialized off the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum Command {
    Ping,
    Start,
    Stop,
    Resume { thread_id: ThreadId },
    ResumeAll,
    StepOver { thread_id: ThreadId },
    StepInto { thread_id: ThreadId },
    StepOut { thread_id: ThreadId },
    GetStack { thread_id: ThreadId },
    SetBreakpoint { file: String, line: u32 },
    Evaluate { thread_id: ThreadId, expression: String },
    Execute { thread_id: ThreadId, statements: String },
    ListThreads,
    GetMessages,
}

/// The successful result of a [`Command`]. Shaped to stay primitive,
/// list-of-primitive, or mapping, per §4.5.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CommandResult {
    Ok(String),
    ThreadId(ThreadId),
    Stack(Vec<(String, u32)>),
    Breakpoints(BreakpointSnapshot),
    Value(serde_json::Value),
    Threads(Vec<(ThreadId, String, ThreadState)>),
    Messages(Vec<Message>),
}

/// The crate's own version string, returned by `ping`.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exposes the §6 RPC surface against a [`SessionCoordinator`]. Does not
/// itself own a socket: a transport crate deserializes a [`Command`] off
/// the wire, calls [`CommandInterface::dispatch`], and serializes the
/// result or error back.
pub struct CommandInterface {
    session: Arc<SessionCoordinator>,
}

impl CommandInterface {
    #[must_use]
    pub fn new(session: Arc<SessionCoordinator>) -> Self {
        Self { session }
    }

    /// # Errors
    /// Propagates [`crate::error::EngineError`] from the underlying
    /// session/controller operation.
    pub fn dispatch(&self, command: Command) -> Result<CommandResult> {
        match command {
            Command::Ping => Ok(CommandResult::Ok(PROTOCOL_VERSION.to_string())),
            Command::Start => {
                self.session.start();
                Ok(CommandResult::Ok("OK".into()))
            }
            Command::Stop => {
                self.session.stop();
                Ok(CommandResult::Ok("OK".into()))
            }
            Command::Resume { thread_id } => {
                self.session.get_thread(thread_id)?.resume();
                Ok(CommandResult::ThreadId(thread_id))
            }
            Command::ResumeAll => {
                self.session.resume();
                Ok(CommandResult::Ok("OK".into()))
            }
            Command::StepOver { thread_id } => {
                self.session.get_thread(thread_id)?.step_over();
                Ok(CommandResult::ThreadId(thread_id))
            }
            Command::StepInto { thread_id } => {
                self.session.get_thread(thread_id)?.step_into();
                Ok(CommandResult::ThreadId(thread_id))
            }
            Command::StepOut { thread_id } => {
                self.session.get_thread(thread_id)?.step_out();
                Ok(CommandResult::ThreadId(thread_id))
            }
            Command::GetStack { thread_id } => {
                let stack = self.session.get_thread(thread_id)?.stack()?;
                Ok(CommandResult::Stack(stack))
            }
            Command::SetBreakpoint { file, line } => {
                let snapshot = self.session.set_breakpoint(&file, line)?;
                Ok(CommandResult::Breakpoints(snapshot))
            }
            Command::Evaluate { thread_id, expression } => {
                let outcome = self.session.get_thread(thread_id)?.evaluate(&expression)?;
                Ok(CommandResult::Value(outcome_to_json(outcome)))
            }
            Command::Execute { thread_id, statements } => {
                let outcome = self.session.get_thread(thread_id)?.execute(&statements)?;
                Ok(CommandResult::Value(outcome_to_json(outcome)))
            }
            Command::ListThreads => Ok(CommandResult::Threads(self.session.list_threads())),
            Command::GetMessages => Ok(CommandResult::Messages(self.session.get_messages())),
        }
    }
}

fn outcome_to_json(outcome: EvalOutcome) -> serde_json::Value {
    match outcome {
        EvalOutcome::Value(value) => serde_json::json!({ "ok": true, "value": value }),
        EvalOutcome::Error(message) => serde_json::json!({ "ok": false, "error": message }),
    }
}
