//! Named external collaborators (§4.7): the engine depends on these only
//! through narrow traits, never on a concrete interpreter.

use serde_json::Value as JsonValue;

/// A request to run code in a suspended frame's bindings, marshalled from
/// the RPC thread to the debuggee thread that owns the live interpreter
/// state (see [`crate::controller::ThreadController::on_trace`]).
#[derive(Debug, Clone)]
pub enum EvalRequest {
    /// Evaluate a read-only expression.
    Evaluate(String),
    /// Execute one or more statements.
    Execute(String),
}

/// The result of an [`EvalRequest`], already run through the serializer
/// collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalOutcome {
    /// Evaluation/execution completed; payload is the serialized value
    /// (the empty JSON value `null` for a successful `execute`).
    Value(JsonValue),
    /// A syntax or runtime error occurred; returned in-band, never as an
    /// engine-level error (§7: `EvaluationFailure` is data, not an RPC
    /// error).
    Error(String),
}

/// Runs an [`EvalRequest`] against the live interpreter state of whichever
/// frame the blocked controller is currently suspended in.
///
/// Implemented as a closure captured by the host adapter's trace-hook
/// invocation: only that call frame has a live handle to the interpreter,
/// so the request/response must be marshalled through the blocked thread
/// rather than reached into from another thread.
pub trait EvalSink: Fn(&EvalRequest) -> EvalOutcome {}
impl<F> EvalSink for F where F: Fn(&EvalRequest) -> EvalOutcome {}

/// Loads and runs the target program in a fresh top-level namespace.
/// Out of scope for deep implementation (§1); the engine only needs the
/// shape of this contract to drive `SessionCoordinator::run`.
pub trait CodeExecutor {
    /// Load and run the program at `path`. Returns on normal completion;
    /// interpreter-level errors propagate as `Err`.
    ///
    /// # Errors
    /// Returns an error if the program fails to load or raises
    /// unhandled during execution.
    fn run(&self, path: &std::path::Path) -> Result<(), String>;
}

/// Maps `(file, line, column)` to a lexical name. Orthogonal to the trace
/// engine; available to the client independently of a running session.
pub trait SymbolFinder {
    /// Parse `path`'s contents up front.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    fn load(path: &std::path::Path) -> Result<Self, String>
    where
        Self: Sized;

    /// Return the syntactic name at `(line, column)`, if any.
    fn get(&self, line: u32, column: u32) -> Option<Symbol>;
}

/// A symbol located by a [`SymbolFinder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub expression: String,
    pub line: u32,
    pub column: u32,
    pub size: u32,
}
