//! Debug execution engine: trace state machine, session coordinator,
//! breakpoint registry, and message bus for a remote source-level debugger.
//!
//! This crate is transport- and interpreter-agnostic: it never calls into
//! a concrete scripting engine or RPC library directly. A host adapter
//! crate (e.g. one binding against an embedded Lua interpreter) implements
//! [`host::CodeExecutor`]/[`host::SymbolFinder`] and drives
//! [`SessionCoordinator::on_trace_root`] from its own trace-hook callback.

pub mod breakpoints;
pub mod bus;
pub mod command;
pub mod controller;
pub mod error;
pub mod frame;
pub mod host;
pub mod message;
pub mod session;

pub use breakpoints::{BreakpointRegistry, BreakpointSnapshot};
pub use bus::MessageBus;
pub use command::CommandInterface;
pub use controller::{ThreadController, ThreadId, ThreadState};
pub use error::{EngineError, Result};
pub use frame::{FrameId, FrameSnapshot, TraceDisposition, TraceEvent};
pub use host::{CodeExecutor, EvalOutcome, EvalRequest, EvalSink, Symbol, SymbolFinder};
pub use message::Message;
pub use session::{SessionCoordinator, SessionState};
