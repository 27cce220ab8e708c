//! Adapter-level tests against a real embedded `mlua::Lua`, exercising the
//! handful of behaviors the fake host in `sdbg-core`'s own scenario tests
//! cannot stand in for: actual hook firing order and actual evaluation
//! against interpreter globals.

use std::io::Write;
use std::thread;

use sdbg_core::{CodeExecutor, Message, SessionCoordinator};
use sdbg_lua::{LuaCodeExecutor, LuaTraceBridge};

fn script(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::with_suffix(".lua").unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn drain_until_suspended(session: &SessionCoordinator, thread_id: u64) -> (String, u32) {
    loop {
        for message in session.get_messages() {
            if let Message::ThreadSuspended {
                thread_id: id,
                file_path,
                line_number,
            } = message
            {
                if id == thread_id {
                    return (file_path, line_number);
                }
            }
        }
        thread::yield_now();
    }
}

fn drain_until_ended(session: &SessionCoordinator, thread_id: u64) {
    loop {
        for message in session.get_messages() {
            if matches!(message, Message::ThreadEnded { thread_id: id } if id == thread_id) {
                return;
            }
        }
        thread::yield_now();
    }
}

#[test]
fn breakpoint_suspends_a_real_lua_script() {
    let file = script("local x = 1\nlocal y = 2\nprint(x + y)\n");
    let path = file.path().to_path_buf();

    let session = SessionCoordinator::new(path.clone());
    session.start();
    session.set_breakpoint(path.to_str().unwrap(), 2).unwrap();

    let session_bg = session.clone();
    let handle = thread::spawn(move || {
        let executor = LuaCodeExecutor::new();
        let bridge = LuaTraceBridge::new(session_bg, 1, "main");
        bridge.install(executor.lua()).unwrap();
        executor.run(&path)
    });

    let (_, line) = drain_until_suspended(&session, 1);
    assert_eq!(line, 2);

    session.get_thread(1).unwrap().resume();
    drain_until_ended(&session, 1);
    assert!(handle.join().unwrap().is_ok());
}

#[test]
fn evaluate_runs_in_the_blocked_interpreter_thread() {
    let file = script("local x = 41\nlocal y = x + 1\nprint(y)\n");
    let path = file.path().to_path_buf();

    let session = SessionCoordinator::new(path.clone());
    session.start();
    session.set_breakpoint(path.to_str().unwrap(), 2).unwrap();

    let session_bg = session.clone();
    let handle = thread::spawn(move || {
        let executor = LuaCodeExecutor::new();
        let bridge = LuaTraceBridge::new(session_bg, 1, "main");
        bridge.install(executor.lua()).unwrap();
        executor.run(&path)
    });

    drain_until_suspended(&session, 1);
    let controller = session.get_thread(1).unwrap();
    let outcome = controller.evaluate("1 + 1").unwrap();
    assert_eq!(outcome, sdbg_core::EvalOutcome::Value(serde_json::json!(2)));

    controller.resume();
    drain_until_ended(&session, 1);
    handle.join().unwrap().unwrap();
}
