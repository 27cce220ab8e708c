//! Translates `mlua`'s debug-hook events into the engine's `TraceEvent`/
//! `Frame` model and drives `SessionCoordinator::on_trace_root` (§10.3).
//!
//! Lua's `Lua::set_hook` installs exactly one hook per VM instance — there
//! is no per-frame local-trace-function swap the way a `sys.settrace`-style
//! host offers. Each debuggee thread therefore gets its own `mlua::Lua`
//! instance and its own `LuaTraceBridge`, and every event on that VM is
//! routed straight through one root-dispatch call.
//!
//! Frame identity across events is maintained with a small activation stack
//! local to this bridge: a `call` pushes a fresh [`FrameId`], a `line`
//! rewrites the top entry's line in place, and a `return` pops it. This is
//! the concrete realization of the engine's synthetic-activation-token
//! design for a host whose frame handles do not outlive the hook call that
//! produced them.

use std::sync::Arc;

use mlua::{Debug, DebugEvent, HookTriggers, Lua};
use parking_lot::Mutex;
use tracing::warn;

use sdbg_core::{
    EvalOutcome, EvalRequest, FrameId, FrameSnapshot, SessionCoordinator, ThreadId, TraceDisposition,
    TraceEvent,
};

use crate::serializer::lua_to_json;

/// Installs and removes the engine's root dispatch as this VM's debug hook.
pub struct LuaTraceBridge {
    session: Arc<SessionCoordinator>,
    thread_id: ThreadId,
    thread_name: String,
    activations: Arc<Mutex<Vec<Arc<FrameSnapshot>>>>,
}

impl LuaTraceBridge {
    #[must_use]
    pub fn new(session: Arc<SessionCoordinator>, thread_id: ThreadId, thread_name: impl Into<String>) -> Self {
        Self {
            session,
            thread_id,
            thread_name: thread_name.into(),
            activations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// # Errors
    /// Propagates any error `mlua` raises while registering the hook.
    pub fn install(&self, lua: &Lua) -> mlua::Result<()> {
        let session = self.session.clone();
        let thread_id = self.thread_id;
        let thread_name = self.thread_name.clone();
        let activations = self.activations.clone();

        lua.set_hook(
            HookTriggers {
                on_calls: true,
                on_returns: true,
                every_line: true,
                ..Default::default()
            },
            move |lua, ar| {
                let disposition = dispatch_event(&session, thread_id, &thread_name, &activations, lua, &ar);
                if disposition == TraceDisposition::Disable {
                    lua.remove_hook();
                }
                Ok(())
            },
        );
        Ok(())
    }

    pub fn uninstall(&self, lua: &Lua) {
        lua.remove_hook();
    }
}

fn dispatch_event(
    session: &Arc<SessionCoordinator>,
    thread_id: ThreadId,
    thread_name: &str,
    activations: &Arc<Mutex<Vec<Arc<FrameSnapshot>>>>,
    lua: &Lua,
    ar: &Debug,
) -> TraceDisposition {
    let Some((event, frame)) = observe(activations, ar) else {
        return TraceDisposition::Continue;
    };

    let eval_sink = |request: &EvalRequest| -> EvalOutcome { run_eval(lua, request) };
    session.on_trace_root((thread_id, thread_name), frame, event, &eval_sink)
}

/// Updates the activation stack for one raw hook invocation and returns the
/// engine-facing event/frame pair, or `None` for an event this engine
/// doesn't model (e.g. an instruction-count tick).
fn observe(activations: &Arc<Mutex<Vec<Arc<FrameSnapshot>>>>, ar: &Debug) -> Option<(TraceEvent, Arc<FrameSnapshot>)> {
    let file_path = source_name(ar);
    let line = u32::try_from(ar.curr_line().max(0)).unwrap_or(0);
    let mut stack = activations.lock();

    match ar.event() {
        DebugEvent::Call | DebugEvent::TailCall => {
            let parent = stack.last().cloned();
            let frame = Arc::new(FrameSnapshot::new(FrameId::next(), file_path, line, parent));
            stack.push(frame.clone());
            Some((TraceEvent::Call, frame))
        }
        DebugEvent::Ret => {
            let popped = stack.pop();
            let (id, parent) = popped.map_or_else(|| (FrameId::next(), None), |f| (f.id, f.parent.clone()));
            let frame = Arc::new(FrameSnapshot::new(id, file_path, line, parent));
            Some((TraceEvent::Return, frame))
        }
        _ if ar.curr_line() > 0 => {
            let (id, parent) = stack
                .last()
                .map_or_else(|| (FrameId::next(), None), |f| (f.id, f.parent.clone()));
            let frame = Arc::new(FrameSnapshot::new(id, file_path, line, parent));
            if let Some(top) = stack.last_mut() {
                *top = frame.clone();
            } else {
                stack.push(frame.clone());
            }
            Some((TraceEvent::Line, frame))
        }
        _ => {
            warn!("unhandled lua debug event, ignoring");
            None
        }
    }
}

fn source_name(ar: &Debug) -> String {
    ar.source()
        .source
        .as_deref()
        .unwrap_or("<unknown>")
        .trim_start_matches('@')
        .to_string()
}

/// Runs against the VM's global table. Lua, unlike the interpreter this
/// engine's stepping model was distilled from, has no supported way to
/// splice an arbitrary expression into a suspended call's local scope from
/// outside that call; evaluation here sees globals and whatever upvalues
/// the chunk closes over, not the paused frame's locals.
fn run_eval(lua: &Lua, request: &EvalRequest) -> EvalOutcome {
    match request {
        EvalRequest::Evaluate(expr) => match lua.load(expr.as_str()).set_name("<evaluate>").eval::<mlua::Value>() {
            Ok(value) => EvalOutcome::Value(lua_to_json(&value)),
            Err(e) => EvalOutcome::Error(e.to_string()),
        },
        EvalRequest::Execute(statements) => match lua.load(statements.as_str()).set_name("<execute>").exec() {
            Ok(()) => EvalOutcome::Value(serde_json::Value::Null),
            Err(e) => EvalOutcome::Error(e.to_string()),
        },
    }
}
